//! Stage job scripts for a PBS queue and submit them

/// Parameters for one job, read from a queue parameter file
pub mod job_request;

/// Render the job template and write the script to its launch directory
pub mod job;

/// Hand a staged script to qsub
pub mod submit;
