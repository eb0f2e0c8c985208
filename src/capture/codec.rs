use crate::capture::host::CaptureHost;
use crate::foundation::error::{ReelError, ReelResult};

/// Mime type of the output container.
pub const CONTAINER_MIME: &str = "video/webm";

/// Video codec requested from the capture host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecChoice {
    /// VP9 in WebM.
    Vp9,
    /// VP8 in WebM.
    Vp8,
    /// Whatever the host picks for WebM.
    ContainerDefault,
}

impl CodecChoice {
    /// Mime type probed against the host.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Vp9 => "video/webm;codecs=vp9",
            Self::Vp8 => "video/webm;codecs=vp8",
            Self::ContainerDefault => CONTAINER_MIME,
        }
    }

    /// VP9, then VP8, then the container default.
    pub fn default_preference() -> Vec<Self> {
        vec![Self::Vp9, Self::Vp8, Self::ContainerDefault]
    }
}

impl std::fmt::Display for CodecChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Pick the first codec in `preference` the host supports.
///
/// The container default is always tried last even when `preference` omits it. Fails with
/// [`ReelError::CaptureUnsupported`] when the host cannot produce the container at all.
pub fn negotiate_codec(host: &dyn CaptureHost, preference: &[CodecChoice]) -> ReelResult<CodecChoice> {
    let fallback = [CodecChoice::ContainerDefault];
    let candidates = preference
        .iter()
        .chain(fallback.iter().filter(|c| !preference.contains(c)));

    for &codec in candidates {
        if host.is_type_supported(codec.mime_type()) {
            tracing::info!(host = host.name(), codec = %codec, "capture codec selected");
            return Ok(codec);
        }
        tracing::debug!(host = host.name(), codec = %codec, "capture codec unsupported");
    }
    Err(ReelError::capture_unsupported(format!(
        "capture host '{}' supports none of {:?} for {CONTAINER_MIME}",
        host.name(),
        preference
    )))
}

#[cfg(test)]
#[path = "../../tests/unit/capture/codec.rs"]
mod tests;
