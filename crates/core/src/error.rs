use clinidoc_types::MeasurementError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("missing required field: {field}")]
    MissingRequiredField { field: &'static str },

    #[error("malformed trigger for optional section field {field}: expected {expected}, found {found}")]
    MalformedOptionalTrigger {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("unresolved placeholders in template {template}: {}", .tokens.join(", "))]
    UnresolvedPlaceholder {
        template: String,
        tokens: Vec<String>,
    },

    #[error("invalid measurement for {field}: {source}")]
    InvalidMeasurement {
        field: &'static str,
        #[source]
        source: MeasurementError,
    },

    #[error("invalid template {name}: {reason}")]
    InvalidTemplate { name: String, reason: String },

    #[error("failed to read template {}: {source}", .path.display())]
    TemplateRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("field {0} supplied more than once")]
    DuplicateField(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to deserialize JSON request: {0}")]
    JsonDeserialization(serde_json::Error),
    #[error("failed to deserialize YAML request: {0}")]
    YamlDeserialization(serde_yaml::Error),
}

impl RenderError {
    /// Whether the error was caused by the request contents rather than by the engine or its
    /// templates. Callers use this to tell "fix the record" apart from "fix the deployment".
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            RenderError::MissingRequiredField { .. }
                | RenderError::MalformedOptionalTrigger { .. }
                | RenderError::InvalidMeasurement { .. }
                | RenderError::InvalidInput(_)
                | RenderError::JsonDeserialization(_)
                | RenderError::YamlDeserialization(_)
        )
    }
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;
