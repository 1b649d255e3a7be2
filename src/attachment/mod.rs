// Public API - what other modules can use
pub use models::{AttachmentDownload, AttachmentModel};
pub use service::{AttachmentService, CommitAttachmentRequest, MAX_ATTACHMENT_BYTES};

// Internal modules
pub mod blob;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
