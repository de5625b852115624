// Platter image ingestion library
//
// Untrusted uploads flow validation -> transcode -> pipeline; config, logging
// and metrics are shared by all three.

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod transcode;
pub mod validation;

pub use config::UploadConfig;
pub use error::{ErrorKind, UploadError};
pub use pipeline::{AssetCategory, OptimizedPublicResult, UploadPipeline, UploadRequest};
pub use validation::{ImageFormat, Rejection, ValidationOutcome, Validator};
