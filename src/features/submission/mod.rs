//! Submission workflow: draft state, validation, and the commit path that
//! turns a confirmed map location plus form fields into a pending film.

pub mod workflow;

pub use workflow::{ImageAttachment, SubmissionForm, SubmissionWorkflow};
