//! Object-detection collaborators: the prediction backend, the object store
//! photos are uploaded to, and persistence of prediction summaries.

pub mod aws;
pub mod client;
pub mod db;
pub mod error;
pub mod storage;
pub mod store;
pub mod types;

pub use client::{DetectionBackend, HttpDetectionBackend};
pub use error::DetectError;
pub use storage::{ObjectStore, S3ObjectStore};
pub use store::{PredictionStore, SqlitePredictionStore};
pub use types::{count_objects, format_counts, Label, PredictionSummary};
