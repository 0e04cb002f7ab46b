//! Recording export module
//!
//! This module turns a finished recording into a downloaded file.

pub mod blob;
pub mod download;
pub mod types;

pub use blob::{Blob, ObjectUrl, ObjectUrlRegistry};
pub use download::{ArtifactExporter, DirectorySink, DownloadRequest, DownloadSink};
pub use types::{DownloadOutcome, ExportError, ExportOptions, ExportResult, SavedFile};
