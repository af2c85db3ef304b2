use std::fmt;
use std::io;
use std::process::Command;

use log::{info, warn};

use crate::pbs::job::JobPath;

/// Default queue submission command, looked up on PATH
pub const QSUB: &str = "qsub";

#[derive(Debug)]
pub enum SubmitError {
    /// The submission command couldn't be started
    Spawn(io::Error),
    /// The queue system refused the job
    Rejected { status: Option<i32>, stderr: String },
    /// qsub exited 0 but printed no job id
    EmptyJobId,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Spawn(err) => write!(f, "Can't run submission command: {err}"),
            SubmitError::Rejected { status: Some(code), stderr } => {
                write!(f, "Submission failed with exit code {code}: {stderr}")
            }
            SubmitError::Rejected { status: None, stderr } => {
                write!(f, "Submission terminated by signal: {stderr}")
            }
            SubmitError::EmptyJobId => write!(f, "Submission command printed no job id"),
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmitError::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

impl JobPath {
    /// Hand the script to the queue system and return the job id it prints
    ///
    /// The command runs from the script's directory so PBS log files land beside it. There is no
    /// retry: resubmitting is up to the operator.
    pub fn submit(&self, qsub: &str) -> Result<String, SubmitError> {
        let mut cmd = Command::new(qsub);
        // qsub runs from the script's directory, so it only gets the file name
        match (self.path.parent().filter(|p| !p.as_os_str().is_empty()), self.path.file_name()) {
            (Some(wd), Some(name)) => cmd.current_dir(wd).arg(name),
            _ => cmd.arg(&self.path),
        };

        info!("Running {} process", qsub);
        info!("{:?}", &cmd);
        let output = cmd.output().map_err(SubmitError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("{} rejected {}: {}", qsub, self.path.display(), stderr);
            return Err(SubmitError::Rejected { status: output.status.code(), stderr });
        }

        let job_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        match job_id.is_empty() {
            true => Err(SubmitError::EmptyJobId),
            false => {
                info!("PBS job id: {job_id}");
                Ok(job_id)
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use crate::pbs::job::SCRIPT_NAME;

    use super::*;

    fn staged() -> (tempfile::TempDir, JobPath) {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SCRIPT_NAME);
        fs::write(&path, "#!/bin/bash\n").unwrap();
        (dir, JobPath { path })
    }

    #[test]
    fn returns_trimmed_stdout_as_job_id() {
        let (_dir, job) = staged();
        // echo stands in for qsub: it prints its argument, like qsub prints the job id
        let job_id = job.submit("echo").unwrap();
        assert_eq!(job_id, SCRIPT_NAME);
    }

    #[test]
    fn submits_script_staged_in_relative_directory() {
        let base = tempfile::tempdir_in(".").unwrap();
        let dir = base.path().join("run");
        assert!(dir.is_relative());

        let template = crate::template::Template::new("#PBS -N $${job_name}\n").unwrap();
        let request: crate::pbs::job_request::JobRequest =
            serde_json::from_value(serde_json::json!({ "job_name": "relax" })).unwrap();
        let job = request.create(&template, &dir).unwrap();
        assert!(job.path.is_relative());

        // cat prints the script only if it can find it from the launch directory
        assert_eq!(job.submit("cat").unwrap(), "#PBS -N relax");
    }

    #[test]
    fn non_zero_exit_is_rejected() {
        let (_dir, job) = staged();
        match job.submit("false") {
            Err(SubmitError::Rejected { status, .. }) => assert_eq!(status, Some(1)),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn missing_command_fails_to_spawn() {
        let (_dir, job) = staged();
        assert!(matches!(job.submit("qsub-does-not-exist-here"), Err(SubmitError::Spawn(_))));
    }

    #[test]
    fn silent_command_has_no_job_id() {
        let (_dir, job) = staged();
        assert!(matches!(job.submit("true"), Err(SubmitError::EmptyJobId)));
    }
}
