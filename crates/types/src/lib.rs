//! Validated primitive types shared across the clinidoc crates.
//!
//! These wrappers move basic checks (non-blank text, numeric readings) into the type system so
//! that the rendering engine never has to re-validate a value it has already accepted.

use std::fmt;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-blank content.
///
/// Clinical text is laid out by whoever wrote it, so the value is kept exactly as entered:
/// leading indentation, line breaks and trailing whitespace all survive. Only the blank check
/// looks at the trimmed form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` holding the untouched input if it has at least one
    /// non-whitespace character, or `Err(TextError::Empty)` otherwise.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let input = input.as_ref();
        if input.trim().is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(input.to_owned()))
    }

    /// Builds a `NonEmptyText` from an optional raw value.
    ///
    /// `None`, empty and whitespace-only input all map to `None`, which is how optional record
    /// fields distinguish "supplied" from "not supplied".
    pub fn from_optional(input: Option<&str>) -> Option<Self> {
        input.and_then(|raw| Self::new(raw).ok())
    }

    /// Returns the text as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing a [`Measurement`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MeasurementError {
    #[error("measurement cannot be empty")]
    Empty,
    #[error("measurement is not a number: {0}")]
    NotANumber(String),
    #[error("measurement must be finite: {0}")]
    NotFinite(String),
    /// The reading arrived as something other than a number or a string.
    #[error("measurement must be a number or a numeric string, found {0}")]
    WrongType(String),
}

/// A numeric clinical reading (weight, temperature, heart rate).
///
/// The reading keeps the decimal text it was entered with, so `"38.50"` and `"38,5"` are
/// displayed as typed rather than re-formatted through a float.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement(String);

impl Measurement {
    /// Parses a reading such as `"38.5"`, `"38,5"` or `" 72 "`.
    ///
    /// Surrounding whitespace is dropped. A decimal comma is accepted for the numeric check
    /// only; the stored text keeps the comma.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, MeasurementError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(MeasurementError::Empty);
        }

        let value: f64 = trimmed
            .replace(',', ".")
            .parse()
            .map_err(|_| MeasurementError::NotANumber(trimmed.to_owned()))?;
        if !value.is_finite() {
            return Err(MeasurementError::NotFinite(trimmed.to_owned()));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// The reading as originally entered (after trimming).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_keeps_input_and_rejects_blank() {
        assert_eq!(NonEmptyText::new("  Luna ").unwrap().as_str(), "  Luna ");
        assert_eq!(
            NonEmptyText::new("\n  - Otitis\n").unwrap().into_inner(),
            "\n  - Otitis\n"
        );
        assert_eq!(NonEmptyText::new(" \n\t ").unwrap_err(), TextError::Empty);
    }

    #[test]
    fn non_empty_text_from_optional_treats_blank_as_absent() {
        assert!(NonEmptyText::from_optional(None).is_none());
        assert!(NonEmptyText::from_optional(Some("   ")).is_none());
        assert_eq!(
            NonEmptyText::from_optional(Some("tos seca")).map(NonEmptyText::into_inner),
            Some("tos seca".to_string())
        );
    }

    #[test]
    fn measurement_keeps_entered_text() {
        let m = Measurement::parse(" 38.50 ").expect("parse");
        assert_eq!(m.as_str(), "38.50");
        assert_eq!(m.to_string(), "38.50");
    }

    #[test]
    fn measurement_accepts_decimal_comma() {
        let m = Measurement::parse("12,3").expect("parse");
        assert_eq!(m.as_str(), "12,3");
    }

    #[test]
    fn measurement_rejects_non_numeric_and_non_finite() {
        assert_eq!(
            Measurement::parse("febril").unwrap_err(),
            MeasurementError::NotANumber("febril".into())
        );
        assert_eq!(
            Measurement::parse("38,5,1").unwrap_err(),
            MeasurementError::NotANumber("38,5,1".into())
        );
        assert!(matches!(
            Measurement::parse("inf").unwrap_err(),
            MeasurementError::NotFinite(_)
        ));
        assert_eq!(Measurement::parse("").unwrap_err(), MeasurementError::Empty);
    }

    #[test]
    fn wrong_type_names_the_type() {
        assert_eq!(
            MeasurementError::WrongType("boolean".into()).to_string(),
            "measurement must be a number or a numeric string, found boolean"
        );
    }
}
