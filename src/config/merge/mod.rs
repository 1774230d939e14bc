//! Config merge: source ordering and defaults.

pub mod policy;
pub mod service;

pub use service::MergeService;
