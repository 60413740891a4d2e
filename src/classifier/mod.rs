//! Complaint classifier service: the external ML service that labels each
//! uploaded text row as complaint / non-complaint.
//!
//! The service is a black box behind HTTP; this module only wraps its REST
//! surface in typed calls ([`client`]) and types ([`types`]).

pub mod client;
pub mod types;

pub use client::{ClassifierApi, ClassifierClient};
pub use types::{AnalysisSummary, AnalyzeResponse, ModelState, ModelStatus, UploadResponse};
