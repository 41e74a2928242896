use std::sync::atomic::{AtomicU64, Ordering};

use crate::coords::Vec2;

use super::AssetError;

/// Process-unique identity of a decoded image.
///
/// Renderers key their GPU texture caches on this.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ImageId(u64);

impl ImageId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Decoded RGBA8 image (sRGB, straight alpha), row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    id: ImageId,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Image {
    /// Wraps raw RGBA8 pixels. `pixels.len()` must equal `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, AssetError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(AssetError::InvalidDimensions {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            id: ImageId::next(),
            width,
            height,
            pixels,
        })
    }

    /// Single-colour image, handy for placeholders and tests.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, AssetError> {
        let count = width as usize * height as usize;
        let pixels = rgba.iter().copied().cycle().take(count * 4).collect();
        Self::from_rgba8(width, height, pixels)
    }

    /// Decodes any format enabled on the `image` dependency.
    pub fn decode(label: &str, bytes: &[u8]) -> Result<Self, AssetError> {
        let decoded = ::image::load_from_memory(bytes).map_err(|source| AssetError::Decode {
            path: label.to_string(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw())
    }

    #[inline]
    pub fn id(&self) -> ImageId {
        self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Natural size in logical units (one texel per unit).
    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_fills_every_pixel() {
        let img = Image::solid(2, 3, [1, 2, 3, 4]).unwrap();
        assert_eq!(img.pixels().len(), 24);
        assert!(img.pixels().chunks(4).all(|p| p == [1, 2, 3, 4]));
        assert_eq!(img.size(), Vec2::new(2.0, 3.0));
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let err = Image::from_rgba8(4, 4, vec![0; 10]).unwrap_err();
        assert!(matches!(err, AssetError::InvalidDimensions { len: 10, .. }));
    }

    #[test]
    fn ids_are_unique() {
        let a = Image::solid(1, 1, [0; 4]).unwrap();
        let b = Image::solid(1, 1, [0; 4]).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = Image::decode("junk.png", b"definitely not a png").unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }
}
