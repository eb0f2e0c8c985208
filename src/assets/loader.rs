use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt as _;
use futures::future::BoxFuture;

use crate::assets::image::{PreparedImage, decode_image};
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};

/// Where a scene's still image comes from.
#[derive(Clone, Debug)]
pub enum ImageSource {
    /// Already decoded pixels.
    Decoded(PreparedImage),
    /// Encoded image bytes (PNG, JPEG, ...).
    Encoded(Arc<Vec<u8>>),
    /// Encoded image file on disk.
    File(PathBuf),
    /// Upstream generation failed; draw the dark placeholder.
    Placeholder,
}

/// Asynchronously turns an [`ImageSource`] into drawable pixels.
///
/// Loads are awaited by the orchestrator under a fixed ceiling, so an implementation may be
/// slow but must not be relied upon to ever finish.
pub trait ImageLoader: Send + Sync {
    /// Load and decode one image.
    fn load<'a>(
        &'a self,
        source: &'a ImageSource,
        canvas: Canvas,
    ) -> BoxFuture<'a, ReelResult<PreparedImage>>;
}

/// Default loader: reads files with `tokio::fs` and decodes with the `image` crate on the
/// blocking pool, so a large image never stalls the runtime workers.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodingLoader;

impl ImageLoader for DecodingLoader {
    fn load<'a>(
        &'a self,
        source: &'a ImageSource,
        canvas: Canvas,
    ) -> BoxFuture<'a, ReelResult<PreparedImage>> {
        async move {
            match source {
                ImageSource::Decoded(img) => {
                    img.validate()?;
                    Ok(img.clone())
                }
                ImageSource::Encoded(bytes) => decode_blocking(bytes.clone()).await,
                ImageSource::File(path) => {
                    let bytes = tokio::fs::read(path).await.map_err(|e| {
                        ReelError::asset_decode(format!(
                            "failed to read image '{}': {e}",
                            path.display()
                        ))
                    })?;
                    decode_blocking(Arc::new(bytes)).await
                }
                ImageSource::Placeholder => Ok(PreparedImage::placeholder(canvas)),
            }
        }
        .boxed()
    }
}

async fn decode_blocking(bytes: Arc<Vec<u8>>) -> ReelResult<PreparedImage> {
    tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| ReelError::asset_decode(format!("image decode task failed: {e}")))?
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
