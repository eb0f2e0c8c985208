/// Greedy word-wrap of `text` into lines no wider than `max_width` according to `measure`.
///
/// Words are separated by single spaces; runs of whitespace in the input collapse. A word is
/// moved to a new line only when the current line already holds at least one word, so a single
/// word wider than `max_width` is returned on its own line. Empty input yields one empty line.
pub fn wrap(text: &str, max_width: f32, mut measure: impl FnMut(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }

        let candidate_len = line.len() + 1 + word.len();
        let mut candidate = String::with_capacity(candidate_len);
        candidate.push_str(&line);
        candidate.push(' ');
        candidate.push_str(word);

        if measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut line, word.to_owned()));
        } else {
            line = candidate;
        }
    }

    lines.push(line);
    lines
}

#[cfg(test)]
#[path = "../../tests/unit/text/wrap.rs"]
mod tests;
