//! Display formatting for record fields.
//!
//! Every value that reaches the document goes through here, so the not-recorded fallback is
//! applied in one place and `None`/blank values never reach the template as empty text.

use crate::constants::{HEART_RATE_UNIT, TEMPERATURE_UNIT, WEIGHT_UNIT};
use crate::{RenderError, RenderResult};
use chrono::{Datelike, NaiveDate, NaiveTime};
use clinidoc_types::{Measurement, NonEmptyText};

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Vital signs with a fixed display unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VitalKind {
    Weight,
    Temperature,
    HeartRate,
}

impl VitalKind {
    pub fn unit(self) -> &'static str {
        match self {
            VitalKind::Weight => WEIGHT_UNIT,
            VitalKind::Temperature => TEMPERATURE_UNIT,
            VitalKind::HeartRate => HEART_RATE_UNIT,
        }
    }

    pub fn field_name(self) -> &'static str {
        match self {
            VitalKind::Weight => "weight",
            VitalKind::Temperature => "temperature",
            VitalKind::HeartRate => "heart_rate",
        }
    }
}

/// Clinical content that a document cannot be issued without.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequiredField {
    PatientName,
    VeterinarianName,
    Diagnosis,
    Treatment,
}

impl RequiredField {
    pub const ALL: [RequiredField; 4] = [
        RequiredField::PatientName,
        RequiredField::VeterinarianName,
        RequiredField::Diagnosis,
        RequiredField::Treatment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequiredField::PatientName => "patient_name",
            RequiredField::VeterinarianName => "veterinarian_name",
            RequiredField::Diagnosis => "diagnosis",
            RequiredField::Treatment => "treatment",
        }
    }
}

/// A raw field value tagged with how it should be displayed.
#[derive(Clone, Copy, Debug)]
pub enum FieldValue<'a> {
    Vital(VitalKind, Option<&'a Measurement>),
    LongDate(Option<NaiveDate>),
    ShortTime(Option<NaiveTime>),
    Text(Option<&'a str>),
}

#[derive(Clone, Debug)]
pub struct Formatter {
    not_recorded: String,
}

impl Formatter {
    pub fn new(not_recorded: impl Into<String>) -> Self {
        Self {
            not_recorded: not_recorded.into(),
        }
    }

    pub fn not_recorded(&self) -> &str {
        &self.not_recorded
    }

    /// Formats `value` for display, substituting the not-recorded text when it is missing.
    ///
    /// The result is plain text; HTML escaping is left to the caller.
    pub fn format(&self, value: FieldValue<'_>) -> String {
        match value {
            FieldValue::Vital(kind, Some(reading)) => format!("{} {}", reading, kind.unit()),
            FieldValue::LongDate(Some(date)) => long_date(date),
            FieldValue::ShortTime(Some(time)) => short_time(time),
            FieldValue::Text(Some(text)) if !text.trim().is_empty() => text.to_string(),
            _ => self.not_recorded.clone(),
        }
    }

    /// Validates a mandatory field.
    ///
    /// The returned text is the caller's value untouched; only the blank check ignores
    /// surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::MissingRequiredField` when `raw` is `None`, empty or whitespace.
    pub fn required(&self, field: RequiredField, raw: Option<&str>) -> RenderResult<NonEmptyText> {
        NonEmptyText::from_optional(raw).ok_or(RenderError::MissingRequiredField {
            field: field.as_str(),
        })
    }
}

/// Long Spanish date, e.g. `15 de marzo de 2024`.
pub fn long_date(date: NaiveDate) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        MONTHS_ES[date.month0() as usize],
        date.year()
    )
}

/// 24-hour clock time, e.g. `09:05`.
pub fn short_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Escapes text for use in HTML element content and quoted attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
