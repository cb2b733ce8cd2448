// std
pub use std::collections::HashSet;
pub use std::sync::{Arc, Mutex};

// external crates
pub use log::{debug, warn};

// crate modules
pub use crate::{
    config::{DEFAULT_MAX_CONCURRENT, LoaderConfig},
    error::LoadError,
    fetcher::{HttpImageFetcher, ImageFetcher},
    loader::{ImageLoader, LoadHandle},
};
