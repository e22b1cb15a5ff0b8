//! HTTP adapters for the trend engine's external collaborators.

pub mod client;
pub mod error;
pub mod narrative;
pub(crate) mod retry;
pub mod video_source;

pub use client::{ApiClient, HttpSettings};
pub use error::ClientError;
pub use narrative::HttpNarrativeClient;
pub use video_source::HttpVideoSource;
