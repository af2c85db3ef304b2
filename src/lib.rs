//! Render PBS job submission scripts from `$${name}` templates

pub mod template;
pub mod request;
pub mod pbs;
pub mod cli;
