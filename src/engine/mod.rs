//! Submission engine.

pub mod submitter;

pub use submitter::{BetSubmitter, FailedSubmission, SubmissionReport};
