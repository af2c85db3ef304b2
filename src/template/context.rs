use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::template::error::TemplateError;

/// Substitution context: placeholder name -> replacement text
///
/// Keys are case-sensitive. A context may carry keys that a template never references, these are
/// ignored at render time so one set of cluster parameters can be used with several templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    values: HashMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, returning the previous one if the name was already present
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Build a context from the scalar members of a JSON object
    ///
    /// Strings are used verbatim, numbers and booleans as their JSON text and `null` becomes an
    /// empty string (an explicitly blank value, e.g. `post_rocket: null`). Arrays and objects
    /// can't be placed into a shell script and are rejected.
    pub fn from_json(object: &Map<String, Value>) -> Result<Context, TemplateError> {
        let mut context = Context::new();
        for (key, value) in object {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(TemplateError::UnsupportedValue(key.clone()))
                }
            };
            context.insert(key.clone(), text);
        }
        Ok(context)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Context::new();
        context.extend(iter);
        context
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Context {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl From<HashMap<String, String>> for Context {
    fn from(values: HashMap<String, String>) -> Self {
        Context { values }
    }
}
