use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use log::{info, warn};
use serde_json::Value;

use crate::pbs::job_request::{apply_overrides, JobRequest, Override};
use crate::request::schema::load_schema;

#[derive(Debug)]
pub enum MessageError {
    MessageReadError(String),
    DecodeError(String),
    ValidationError(Vec<String>),
    DeserialisationError(String),
    UnsupportedFormat(PathBuf),
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::MessageReadError(msg) => write!(f, "Can't read parameter file: {msg}"),
            MessageError::DecodeError(msg) => write!(f, "Can't decode parameter file: {msg}"),
            MessageError::ValidationError(errors) => {
                write!(f, "Parameter file fails validation: {}", errors.join("; "))
            }
            MessageError::DeserialisationError(msg) => write!(f, "Can't deserialise parameters: {msg}"),
            MessageError::UnsupportedFormat(path) => {
                write!(f, "Unsupported parameter file {} (expected .yaml, .yml or .json)", path.display())
            }
        }
    }
}

impl std::error::Error for MessageError {}

/// Parameter file formats, picked by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Format> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// A parameter file on disk, e.g. `my_qadapter.yaml`
pub struct Message {
    pub path: PathBuf,
    pub compiled_schema: JSONSchema,
}

impl Message {
    pub fn new(path: impl Into<PathBuf>) -> Message {
        Message { path: path.into(), compiled_schema: load_schema() }
    }

    pub fn read(&self) -> Result<JobRequest, MessageError> {
        self.read_with_overrides(&[])
    }

    /// Read the file, merge command line overrides and validate the result
    pub fn read_with_overrides(&self, overrides: &[Override]) -> Result<JobRequest, MessageError> {
        let mut json: Value = self.parse_untyped()?;
        if let Value::Object(params) = &mut json {
            apply_overrides(params, overrides);
        }

        match self.validate(&json) {
            Ok(_) => {
                info!("Parameter file is valid");
                self.parse_json(json)
            }
            Err(err) => {
                warn!("Parameter file fails validation");
                Err(err)
            }
        }
    }

    fn validate(&self, json: &Value) -> Result<(), MessageError> {
        info!("Validating parameters against JSON schema");
        self.compiled_schema.validate(json).map_err(|errors| {
            let messages = errors
                .map(|err| format!("{} (at '{}')", err, err.instance_path))
                .collect();
            MessageError::ValidationError(messages)
        })
    }

    fn read_file(&self) -> Result<String, MessageError> {
        let path: &Path = self.path.as_path();
        info!("Reading parameters at {}", path.display());
        fs::read_to_string(path).map_err(|err| {
            warn!("Can't read parameter file at path {}: {}", path.display(), err);
            MessageError::MessageReadError(format!("{}: {}", path.display(), err))
        })
    }

    fn parse_json(&self, value: Value) -> Result<JobRequest, MessageError> {
        info!("Deserialising valid parameters into a job request");
        let request = serde_json::from_value::<JobRequest>(value)
            .map_err(|err| MessageError::DeserialisationError(err.to_string()))?;
        Ok(request.with_base_dir(self.path.parent()))
    }

    fn parse_untyped(&self) -> Result<Value, MessageError> {
        let format = Format::from_path(&self.path)
            .ok_or_else(|| MessageError::UnsupportedFormat(self.path.clone()))?;
        let contents = self.read_file()?;

        info!("Parsing {:?} into untyped structure", format);
        match format {
            Format::Json => serde_json::from_str::<Value>(&contents)
                .map_err(|err| MessageError::DecodeError(err.to_string())),
            // serde_yaml can deserialise straight into a JSON value, which is what the schema needs
            Format::Yaml => serde_yaml::from_str::<Value>(&contents)
                .map_err(|err| MessageError::DecodeError(err.to_string())),
        }
    }
}
