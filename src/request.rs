//! Read queue parameter files submitted by operators

/// Read, validate and deserialise a parameter file into a JobRequest
pub mod message;
/// Bundled JSON schema for parameter files
pub mod schema;
