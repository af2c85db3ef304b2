use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use log::{info, warn};

use crate::pbs::job_request::JobRequest;
use crate::template::Template;

/// File name of the rendered script inside the launch directory
pub const SCRIPT_NAME: &str = "FW_submit.script";

/// included PBS job script template
static PBS_TEMPLATE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/pbs.txt"));

/// A JobPath is the path to a rendered job script that's submitted to PBS via qsub
///
/// The script writes its logs (`FW_job.out`, `FW_job.error`) next to itself, so the directory
/// is the job's working directory too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPath {
    pub path: PathBuf,
}

/// Rendered job script content, not yet on disk
struct JobScript {
    content: String,
}

impl JobScript {
    fn write(&self, out_path: &Path) -> Result<(), io::Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(out_path)?;
        file.write_all(self.content.as_bytes())
    }
}

/// The PBS template shipped with the binary
pub fn bundled_template() -> Result<Template> {
    Template::new(PBS_TEMPLATE).context("Bundled PBS template is malformed")
}

/// Load a template from disk, falling back to the bundled one
pub fn load_template(path: Option<&Path>) -> Result<Template> {
    match path {
        Some(path) => {
            info!("Reading template {}", path.display());
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Can't read template {}", path.display()))?;
            Template::new(raw).with_context(|| format!("Invalid template {}", path.display()))
        }
        None => {
            info!("Using bundled PBS template");
            bundled_template()
        }
    }
}

impl JobRequest {
    /// Render the job script without touching the filesystem
    pub fn render(&self, template: &Template) -> Result<String> {
        let context = self.to_context()?;
        info!("Rendering template with {} parameters", context.len());
        Ok(template.render(&context)?)
    }

    /// Render the job script and write it into `dir`
    ///
    /// Nothing is written when rendering fails.
    pub fn create(&self, template: &Template, dir: &Path) -> Result<JobPath> {
        let script = JobScript { content: self.render(template)? };
        let name = self.job_name().unwrap_or("unnamed");
        info!("Creating job {} in directory {}", name, dir.display());

        if !dir.exists() {
            info!("Creating launch directory {}", dir.display());
            fs::create_dir_all(dir)
                .with_context(|| format!("Can't create launch directory {}", dir.display()))?;
        }

        let path = dir.join(SCRIPT_NAME);
        if path.exists() {
            warn!("Job script {} already exists and will be overwritten", path.display());
        }
        script
            .write(&path)
            .with_context(|| format!("Can't write job script {}", path.display()))?;

        Ok(JobPath { path })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use crate::template::TemplateError;

    use super::*;

    fn complete_request() -> JobRequest {
        serde_json::from_value(json!({
            "_fw_name": "CommonAdapter",
            "nnodes": 4,
            "ppnode": 16,
            "walltime": "48:00:00",
            "pmem": "8gb",
            "queue": "open",
            "account": "open",
            "group_name": "dfttk",
            "job_name": "relax_Fe",
            "launch_dir": "/scratch/relax_Fe",
            "rocket_launch": "rlaunch -c /home/me/config singleshot",
            "post_rocket": null
        }))
        .unwrap()
    }

    #[test]
    fn bundled_template_has_queue_placeholders() {
        let template = bundled_template().unwrap();
        for name in [
            "nnodes", "ppnode", "walltime", "pmem", "queue", "account", "group_name", "job_name",
            "launch_dir", "rocket_launch", "post_rocket",
        ] {
            assert!(template.placeholders().contains(name), "missing {name}");
        }
        assert_eq!(template.placeholders().len(), 11);
    }

    #[test]
    fn writes_rendered_script() {
        let dir = tempdir().unwrap();
        let launch = dir.path().join("relax_Fe");
        let template = bundled_template().unwrap();

        let job = complete_request().create(&template, &launch).unwrap();
        assert_eq!(job.path, launch.join(SCRIPT_NAME));

        let script = fs::read_to_string(&job.path).unwrap();
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("#PBS -l nodes=4:ppn=16\n"));
        assert!(script.contains("#PBS -l walltime=48:00:00\n"));
        assert!(script.contains("#PBS -o FW_job.out\n#PBS -e FW_job.error\n"));
        assert!(script.contains("cd /scratch/relax_Fe\nrlaunch -c /home/me/config singleshot\n"));
        assert!(!script.contains("$${"));
    }

    #[test]
    fn overwrites_existing_script() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SCRIPT_NAME), "old contents that are much longer than the new ones").unwrap();
        let template = Template::new("#PBS -N $${job_name}\n").unwrap();

        let job = complete_request().create(&template, dir.path()).unwrap();
        assert_eq!(fs::read_to_string(job.path).unwrap(), "#PBS -N relax_Fe\n");
    }

    #[test]
    fn nothing_written_when_parameters_are_missing() {
        let dir = tempdir().unwrap();
        let launch = dir.path().join("job");
        let mut request = complete_request();
        request.params.remove("walltime");

        let err = request.create(&bundled_template().unwrap(), &launch).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TemplateError>(),
            Some(&TemplateError::MissingPlaceholder("walltime".to_string()))
        );
        assert!(!launch.exists());
    }

    #[test]
    fn loads_template_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.txt");
        fs::write(&path, "#PBS -q $${queue}\n").unwrap();
        let template = load_template(Some(&path)).unwrap();
        assert_eq!(template.raw(), "#PBS -q $${queue}\n");

        fs::write(&path, "#PBS -q $${queue\n").unwrap();
        let err = load_template(Some(&path)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TemplateError>(),
            Some(TemplateError::MalformedTemplate { line: 1, column: 9 })
        ));
    }
}
