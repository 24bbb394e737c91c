pub mod config;
pub mod error;
pub mod types;

pub use config::PolybotConfig;
pub use error::{PolybotError, Result};
pub use types::{IncomingMessage, PhotoRef};
