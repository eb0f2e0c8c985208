use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::assets::loader::ImageSource;
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::scene::{AudioSource, SceneSource};

/// JSON scene list consumed by the command-line renderer.
///
/// Relative paths are resolved against the manifest's directory.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneManifest {
    /// Scenes in playback order.
    pub scenes: Vec<ManifestScene>,
}

/// One manifest entry.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestScene {
    /// Narration text.
    pub text: String,
    /// Image file; omitted when generation failed.
    #[serde(default)]
    pub image: Option<PathBuf>,
    /// Narration audio file (WAV or raw s16le speech PCM).
    #[serde(default)]
    pub audio: Option<PathBuf>,
}

impl SceneManifest {
    /// Read and parse a manifest file.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("read manifest '{}'", path.display()))?;
        Self::from_json_bytes(&bytes)
    }

    /// Parse manifest JSON.
    pub fn from_json_bytes(bytes: &[u8]) -> ReelResult<Self> {
        let manifest: Self = serde_json::from_slice(bytes).context("parse manifest JSON")?;
        if manifest.scenes.is_empty() {
            return Err(ReelError::EmptyTimeline);
        }
        Ok(manifest)
    }

    /// Convert into scene sources. Audio files are read eagerly; images are loaded per scene
    /// during rendering. An unreadable audio file leaves its scene silent.
    pub fn into_sources(self, base_dir: &Path) -> Vec<SceneSource> {
        self.scenes
            .into_iter()
            .enumerate()
            .map(|(index, s)| {
                let audio = s.audio.and_then(|rel| {
                    let p = base_dir.join(rel);
                    match std::fs::read(&p) {
                        Ok(bytes) => Some(AudioSource::Encoded(Arc::new(bytes))),
                        Err(e) => {
                            tracing::warn!(scene = index, path = %p.display(), error = %e, "narration audio unreadable, scene is silent");
                            None
                        }
                    }
                });
                SceneSource {
                    text: s.text,
                    image: s.image.map(|rel| ImageSource::File(base_dir.join(rel))),
                    audio,
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/manifest.rs"]
mod tests;
