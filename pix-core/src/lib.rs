//! pix-core: error taxonomy and configuration shared by the pix crates.

pub mod config;
pub mod errors;

pub use config::{PixConfig, PixConfigSnapshot, ENV_PREFIX};
pub use errors::{ErrorKind, PixError, PixResult};
