//! Concrete [`Transform`](crate::transform::Transform) implementations.
//!
//! Three independent variants share the scheduling/checkpointing engine:
//! download (source URL → local audio file), embed (local audio file →
//! aggregate embedding vector), and upload (local file → remote URL).
//! Each talks to the outside world only through an injected capability.

pub mod download;
pub mod embed;
pub mod upload;

pub use download::{AudioFetcher, DownloadTransform, FetchError, YtDlpFetcher};
pub use embed::{EmbedTransform, embed_query};
pub use upload::{UploadError, UploadTransform, Uploader};
