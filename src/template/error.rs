use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template references a name the context doesn't supply
    MissingPlaceholder(String),
    /// A placeholder token is unterminated, spans a line break or has an empty name
    /// (1-based position of the opening `$${`)
    MalformedTemplate { line: usize, column: usize },
    /// A context value couldn't be converted to text (arrays, objects)
    UnsupportedValue(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::MissingPlaceholder(name) => {
                write!(f, "no value supplied for placeholder '{name}'")
            }
            TemplateError::MalformedTemplate { line, column } => {
                write!(f, "malformed placeholder at line {line}, column {column}")
            }
            TemplateError::UnsupportedValue(key) => {
                write!(f, "value of '{key}' must be a string, number, boolean or null")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

#[cfg(test)]
mod tests {
    use crate::template::Template;

    #[test]
    fn malformed_message_covers_every_cause() {
        for raw in ["cd $${launch_dir", "cd $${}", "cd $${launch\n_dir}"] {
            let err = Template::new(raw).unwrap_err();
            assert_eq!(err.to_string(), "malformed placeholder at line 1, column 4");
        }
    }
}
