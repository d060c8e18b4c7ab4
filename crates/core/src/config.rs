//! Rendering configuration.
//!
//! Configuration is resolved once at process startup and handed to the assembler. Nothing in
//! the render path reads environment variables, so concurrent renders always see the same
//! settings.

use crate::constants::{DEFAULT_CLINIC_NAME, DEFAULT_NOT_RECORDED_TEXT, DOCUMENT_TEMPLATE_FILENAME};
use crate::{RenderError, RenderResult};
use std::path::{Path, PathBuf};

/// Settings resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    clinic_name: String,
    not_recorded_text: String,
    template_dir: Option<PathBuf>,
    strict_placeholders: bool,
}

impl RenderConfig {
    /// Create a new `RenderConfig`.
    ///
    /// # Arguments
    ///
    /// * `clinic_name` - Name printed in the document header and used as the logo alt text
    /// * `not_recorded_text` - Text shown for optional fields without a value
    /// * `template_dir` - Directory with template overrides, or `None` for the built-in set
    /// * `strict_placeholders` - Fail renders that would leave a placeholder unresolved
    ///
    /// # Returns
    ///
    /// Returns the configuration with both texts trimmed, or `RenderError::InvalidInput` if
    /// either text is blank.
    pub fn new(
        clinic_name: impl AsRef<str>,
        not_recorded_text: impl AsRef<str>,
        template_dir: Option<PathBuf>,
        strict_placeholders: bool,
    ) -> RenderResult<Self> {
        let clinic_name = clinic_name.as_ref().trim();
        if clinic_name.is_empty() {
            return Err(RenderError::InvalidInput(
                "clinic_name cannot be empty".into(),
            ));
        }

        let not_recorded_text = not_recorded_text.as_ref().trim();
        if not_recorded_text.is_empty() {
            return Err(RenderError::InvalidInput(
                "not_recorded_text cannot be empty".into(),
            ));
        }

        Ok(Self {
            clinic_name: clinic_name.to_string(),
            not_recorded_text: not_recorded_text.to_string(),
            template_dir,
            strict_placeholders,
        })
    }

    /// Clinic name shown in the document header.
    pub fn clinic_name(&self) -> &str {
        &self.clinic_name
    }

    /// Fallback text for optional fields without a value (`No registrado` by default).
    pub fn not_recorded_text(&self) -> &str {
        &self.not_recorded_text
    }

    pub fn template_dir(&self) -> Option<&Path> {
        self.template_dir.as_deref()
    }

    /// Whether an unresolved placeholder fails the render instead of leaving a marker.
    pub fn strict_placeholders(&self) -> bool {
        self.strict_placeholders
    }

    /// Replaces the template override directory.
    pub fn with_template_dir(mut self, template_dir: Option<PathBuf>) -> Self {
        self.template_dir = template_dir;
        self
    }

    pub fn with_strict_placeholders(mut self, strict: bool) -> Self {
        self.strict_placeholders = strict;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clinic_name: DEFAULT_CLINIC_NAME.to_string(),
            not_recorded_text: DEFAULT_NOT_RECORDED_TEXT.to_string(),
            template_dir: None,
            strict_placeholders: true,
        }
    }
}

/// Resolve an optional template directory override.
///
/// `None` (or a blank value) keeps the built-in templates. A supplied directory must exist and
/// contain the document template.
pub fn resolve_template_dir(override_dir: Option<String>) -> RenderResult<Option<PathBuf>> {
    let Some(raw) = override_dir.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let dir = PathBuf::from(raw);
    if dir.is_dir() && dir.join(DOCUMENT_TEMPLATE_FILENAME).is_file() {
        return Ok(Some(dir));
    }

    Err(RenderError::InvalidInput(format!(
        "template directory override is not valid (must contain {}): {}",
        DOCUMENT_TEMPLATE_FILENAME,
        dir.display()
    )))
}

/// Parse the strict-placeholder setting from an optional string value.
///
/// If `value` is `None` or empty/whitespace, strict mode is on.
pub fn strict_from_env_value(value: Option<String>) -> RenderResult<bool> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        None => Ok(true),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(RenderError::InvalidInput(format!(
            "invalid strict placeholder setting: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_and_rejects_blank_texts() {
        let cfg = RenderConfig::new("  Clínica Norte ", "Sin dato", None, true).expect("config");
        assert_eq!(cfg.clinic_name(), "Clínica Norte");

        let err = RenderConfig::new(" ", "Sin dato", None, true).unwrap_err();
        assert!(matches!(err, RenderError::InvalidInput(msg) if msg.contains("clinic_name")));

        let err = RenderConfig::new("Clínica", "", None, true).unwrap_err();
        assert!(matches!(err, RenderError::InvalidInput(msg) if msg.contains("not_recorded_text")));
    }

    #[test]
    fn default_is_strict_with_builtin_templates() {
        let cfg = RenderConfig::default();
        assert!(cfg.strict_placeholders());
        assert!(cfg.template_dir().is_none());
        assert_eq!(cfg.not_recorded_text(), "No registrado");
    }

    #[test]
    fn strict_from_env_value_parses_flags() {
        assert!(strict_from_env_value(None).expect("default"));
        assert!(strict_from_env_value(Some("  ".into())).expect("blank"));
        assert!(strict_from_env_value(Some("TRUE".into())).expect("true"));
        assert!(!strict_from_env_value(Some("off".into())).expect("off"));
        assert!(strict_from_env_value(Some("maybe".into())).is_err());
    }

    #[test]
    fn resolve_template_dir_requires_document_template() {
        assert_eq!(resolve_template_dir(None).expect("none"), None);

        let dir = tempfile::tempdir().expect("tempdir");
        let raw = dir.path().display().to_string();
        assert!(resolve_template_dir(Some(raw.clone())).is_err());

        std::fs::write(dir.path().join(DOCUMENT_TEMPLATE_FILENAME), "x").expect("write");
        assert_eq!(
            resolve_template_dir(Some(raw)).expect("valid"),
            Some(dir.path().to_path_buf())
        );
    }
}
