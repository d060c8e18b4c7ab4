//! Render requests.
//!
//! [`RenderRequest`] is the typed input to the assembler. [`RenderRequestWire`] is the loosely
//! typed form received from the front-end as JSON or YAML (camelCase keys, numbers and strings
//! mixed freely); converting it is where wrongly typed trigger data is rejected instead of being
//! coerced.

use crate::{RenderError, RenderResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use clinidoc_types::{Measurement, MeasurementError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Medical record data for a single document render.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    pub record_id: Option<String>,
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub owner_name: Option<String>,
    pub visit_date: Option<NaiveDateTime>,
    pub weight: Option<Measurement>,
    pub temperature: Option<Measurement>,
    pub heart_rate: Option<Measurement>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    pub veterinarian_name: Option<String>,
    /// When the document was generated. Supplied by the caller so that renders are repeatable.
    pub generated_at: NaiveDateTime,
    /// Logo image reference (URL or data URI).
    pub logo_src: Option<String>,
}

impl RenderRequest {
    /// Parses a wire request from JSON and converts it.
    pub fn from_json(input: &str) -> RenderResult<Self> {
        let wire: RenderRequestWire =
            serde_json::from_str(input).map_err(RenderError::JsonDeserialization)?;
        Self::try_from(wire)
    }

    /// Parses a wire request from YAML and converts it.
    pub fn from_yaml(input: &str) -> RenderResult<Self> {
        let wire: RenderRequestWire =
            serde_yaml::from_str(input).map_err(RenderError::YamlDeserialization)?;
        Self::try_from(wire)
    }
}

/// Wire form of a render request, as produced by the clinic front-end.
///
/// Unknown keys are ignored so that a full medical-record entity can be posted unchanged.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequestWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_required: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veterinarian_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl RenderRequestWire {
    /// A fully populated example request.
    pub fn sample() -> Self {
        Self {
            record_id: Some(Value::from(1042)),
            patient_name: Some("Luna".into()),
            patient_id: Some(Value::from("PAC-0381")),
            species: Some("Canino".into()),
            breed: Some("Labrador retriever".into()),
            owner_name: Some("María Fernández".into()),
            visit_date: Some("2024-03-15T10:30:00".into()),
            weight: Some(Value::from("28.4")),
            temperature: Some(Value::from(38.5)),
            heart_rate: Some(Value::from(96)),
            diagnosis: Some("Otitis externa bilateral".into()),
            treatment: Some("Limpieza auricular y gotas óticas cada 12 horas durante 7 días".into()),
            symptoms: Some(Value::from("Sacude la cabeza y se rasca las orejas")),
            notes: Some(Value::from("Evitar baños durante el tratamiento")),
            follow_up_required: Some(Value::Bool(true)),
            follow_up_date: Some(Value::from("2024-03-22")),
            veterinarian_name: Some("Dra. Ana Ruiz".into()),
            generated_date: Some("2024-03-15T11:00:00".into()),
            logo: Some("https://clinica.example/logo.png".into()),
        }
    }
}

impl TryFrom<RenderRequestWire> for RenderRequest {
    type Error = RenderError;

    fn try_from(wire: RenderRequestWire) -> RenderResult<Self> {
        let generated_date = wire.generated_date.ok_or_else(|| {
            RenderError::InvalidInput("generatedDate is required".to_string())
        })?;

        Ok(Self {
            record_id: identifier("recordId", wire.record_id)?,
            patient_name: wire.patient_name,
            patient_id: identifier("patientId", wire.patient_id)?,
            species: wire.species,
            breed: wire.breed,
            owner_name: wire.owner_name,
            visit_date: wire
                .visit_date
                .map(|raw| parse_timestamp("visitDate", &raw))
                .transpose()?,
            weight: measurement("weight", wire.weight)?,
            temperature: measurement("temperature", wire.temperature)?,
            heart_rate: measurement("heartRate", wire.heart_rate)?,
            diagnosis: wire.diagnosis,
            treatment: wire.treatment,
            symptoms: optional_text_trigger("symptoms", wire.symptoms)?,
            notes: optional_text_trigger("notes", wire.notes)?,
            follow_up_required: follow_up_flag(wire.follow_up_required)?,
            follow_up_date: follow_up_date(wire.follow_up_date)?,
            veterinarian_name: wire.veterinarian_name,
            generated_at: parse_timestamp("generatedDate", &generated_date)?,
            logo_src: wire.logo,
        })
    }
}

fn type_name(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}

fn identifier(field: &'static str, value: Option<Value>) -> RenderResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(RenderError::InvalidInput(format!(
            "{} must be a string or number, found {}",
            field,
            type_name(&other)
        ))),
    }
}

fn measurement(field: &'static str, value: Option<Value>) -> RenderResult<Option<Measurement>> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => Measurement::parse(&s),
        Some(Value::Number(n)) => Measurement::parse(n.to_string()),
        Some(other) => Err(MeasurementError::WrongType(type_name(&other))),
    };
    parsed
        .map(Some)
        .map_err(|source| RenderError::InvalidMeasurement { field, source })
}

fn optional_text_trigger(field: &'static str, value: Option<Value>) -> RenderResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(RenderError::MalformedOptionalTrigger {
            field,
            expected: "string",
            found: type_name(&other),
        }),
    }
}

fn follow_up_flag(value: Option<Value>) -> RenderResult<bool> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(flag),
        Some(other) => Err(RenderError::MalformedOptionalTrigger {
            field: "followUpRequired",
            expected: "boolean",
            found: type_name(&other),
        }),
    }
}

fn follow_up_date(value: Option<Value>) -> RenderResult<Option<NaiveDate>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_timestamp("followUpDate", &s)
            .map(|timestamp| Some(timestamp.date()))
            .map_err(|_| RenderError::MalformedOptionalTrigger {
                field: "followUpDate",
                expected: "date",
                found: format!("{:?}", s),
            }),
        Some(other) => Err(RenderError::MalformedOptionalTrigger {
            field: "followUpDate",
            expected: "date",
            found: type_name(&other),
        }),
    }
}

/// Parses an RFC 3339 timestamp (keeping its local wall-clock time), a naive ISO 8601
/// date-time, or a bare `YYYY-MM-DD` date (taken as midnight).
fn parse_timestamp(field: &'static str, raw: &str) -> RenderResult<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.naive_local());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Ok(timestamp);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }

    Err(RenderError::InvalidInput(format!(
        "{} is not a valid date or timestamp: {:?}",
        field, raw
    )))
}
