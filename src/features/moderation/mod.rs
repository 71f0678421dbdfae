//! Review queue for community submissions.
//!
//! Pending films are approved or rejected by users whose profile carries
//! the moderator flag. Both outcomes are terminal.

pub mod models;
pub mod services;

pub use models::{PendingSubmission, Submitter};
pub use services::ModerationService;
