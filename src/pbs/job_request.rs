use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::template::{Context, TemplateError};

/// Keys with this prefix configure the adapter itself and are never placeholders
pub const META_PREFIX: &str = "_fw_";

/// Parameters for one job submission
///
/// Holds every key of the parameter file. Well-known keys (`launch_dir`, `job_name`,
/// `_fw_template_file`) have accessors, everything else is passed through to the template.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct JobRequest {
    pub params: Map<String, Value>,
    /// directory of the parameter file, relative template paths resolve against it
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// A `key=value` override given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub key: String,
    pub value: String,
}

impl FromStr for Override {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => Ok(Override {
                key: key.trim().to_string(),
                value: value.to_string(),
            }),
            _ => Err(format!("expected KEY=VALUE, got '{s}'")),
        }
    }
}

/// Merge command line values into raw parameters, replacing what the file set
///
/// Runs before schema validation so overridden values are checked like file values.
pub fn apply_overrides(params: &mut Map<String, Value>, overrides: &[Override]) {
    for o in overrides {
        params.insert(o.key.clone(), Value::String(o.value.clone()));
    }
}

impl JobRequest {
    pub fn new(params: Map<String, Value>) -> JobRequest {
        JobRequest { params, base_dir: None }
    }

    pub fn with_base_dir(mut self, dir: Option<&Path>) -> JobRequest {
        self.base_dir = dir.map(Path::to_path_buf);
        self
    }

    /// Template selected by `_fw_template_file`, resolved against the parameter file's directory
    pub fn template_file(&self) -> Option<PathBuf> {
        let path = Path::new(self.non_empty("_fw_template_file")?);
        match (&self.base_dir, path.is_relative()) {
            (Some(base), true) => Some(base.join(path)),
            _ => Some(path.to_path_buf()),
        }
    }

    pub fn launch_dir(&self) -> Option<&str> {
        self.non_empty("launch_dir")
    }

    pub fn job_name(&self) -> Option<&str> {
        self.non_empty("job_name")
    }

    /// Substitution context from every non-meta parameter
    pub fn to_context(&self) -> Result<Context, TemplateError> {
        let values: Map<String, Value> = self
            .params
            .iter()
            .filter(|(key, _)| !key.starts_with(META_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Context::from_json(&values)
    }

    fn non_empty(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}
