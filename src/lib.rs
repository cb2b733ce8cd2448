//! Image load queue for the comic reader frontend.
//!
//! Pages are fetched over HTTP while the user reads; rapid page navigation
//! would otherwise fire the same requests over and over. The [`ImageLoader`]
//! queue bounds how many fetches run at once, dispatches in priority order,
//! and guarantees at most one in-flight or completed fetch per address.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod loader;
pub mod prelude;

pub use config::LoaderConfig;
pub use error::LoadError;
pub use fetcher::{HttpImageFetcher, ImageFetcher};
pub use loader::{ImageLoader, LoadHandle};
