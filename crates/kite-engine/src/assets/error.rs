use thiserror::Error;

/// Failure to produce an image asset.
///
/// Load failures stay on the asset boundary: they are reported through
/// [`AssetEvent::Failed`](super::AssetEvent::Failed) and never abort a frame.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read asset '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: ::image::ImageError,
    },

    #[error("image buffer of {len} bytes does not match {width}x{height} RGBA8")]
    InvalidDimensions { width: u32, height: u32, len: usize },
}
