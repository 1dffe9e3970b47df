//! # Drive Provider
//!
//! Google Drive API v3 and Drive Activity API v2 clients for the gateway.
//!
//! ## Overview
//!
//! This crate provides:
//! - a per-request [`DriveSession`] orchestrating authorization and lazily
//!   connected sub-clients
//! - file listing with optional name filtering
//! - streaming downloads and format-converting exports with a single-outcome
//!   completion contract
//! - recent change-activity queries

pub mod activity;
pub mod error;
pub mod files;
pub mod session;
pub mod transfer;
pub mod types;

pub use activity::DriveActivityClient;
pub use error::{DriveError, Result};
pub use files::{DriveFilesClient, PDF_MIME};
pub use session::DriveSession;
pub use types::{ActivityRecord, DriveFile};
