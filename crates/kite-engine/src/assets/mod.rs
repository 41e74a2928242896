//! Image asset store.
//!
//! Loads are fire-and-forget: decoding runs off the frame thread and results are
//! applied when the owner calls [`AssetStore::poll`] at a frame boundary. Game code
//! looks images up by path or alias and must tolerate `None` while a load is in
//! flight.

mod error;
mod image;
mod store;

pub use error::AssetError;
pub use image::{Image, ImageId};
pub use store::{AssetEvent, AssetStore, LoadState};
