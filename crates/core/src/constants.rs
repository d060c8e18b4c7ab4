//! Constants used throughout the clinidoc core crate.
//!
//! Placeholder names live here so that the assembler, the section builder and template
//! validation all agree on the same token vocabulary.

/// Default clinic name shown in the document header.
pub const DEFAULT_CLINIC_NAME: &str = "Clínica Veterinaria";

/// Display text used wherever a field has no renderable value.
pub const DEFAULT_NOT_RECORDED_TEXT: &str = "No registrado";

/// Filename of the top-level document template.
pub const DOCUMENT_TEMPLATE_FILENAME: &str = "medical_record.html";

/// Upper bound for a single template file loaded from disk.
pub const MAX_TEMPLATE_BYTES: u64 = 256 * 1024;

/// Fixed print width of the rendered document, in CSS pixels (A4 at 96 dpi).
pub const PRINT_WIDTH_PX: u32 = 794;

/// Prefix of the diagnostic marker left in place of an unresolved placeholder.
pub const UNRESOLVED_MARKER_PREFIX: &str = "[[unresolved:";

/// Reference prefixes accepted for the clinic logo `src`, compared case-insensitively.
pub const LOGO_SOURCE_PREFIXES: [&str; 3] = ["https://", "http://", "data:image/"];

/// Placeholder names.
pub mod tokens {
    pub const CLINIC_NAME: &str = "clinic_name";
    pub const RECORD_ID: &str = "record_id";
    pub const PATIENT_NAME: &str = "patient_name";
    pub const PATIENT_ID: &str = "patient_id";
    pub const SPECIES: &str = "species";
    pub const BREED: &str = "breed";
    pub const OWNER_NAME: &str = "owner_name";
    pub const VISIT_DATE: &str = "visit_date";
    pub const VISIT_TIME: &str = "visit_time";
    pub const WEIGHT: &str = "weight";
    pub const TEMPERATURE: &str = "temperature";
    pub const HEART_RATE: &str = "heart_rate";
    pub const DIAGNOSIS: &str = "diagnosis";
    pub const TREATMENT: &str = "treatment";
    pub const VETERINARIAN_NAME: &str = "veterinarian_name";
    pub const GENERATED_DATE: &str = "generated_date";
    pub const GENERATED_TIME: &str = "generated_time";

    // Only present when the matching optional datum is supplied.
    pub const SYMPTOMS: &str = "symptoms";
    pub const NOTES: &str = "notes";
    pub const FOLLOW_UP_DATE: &str = "follow_up_date";
    pub const LOGO_SRC: &str = "logo_src";

    pub const LOGO_SECTION: &str = "logo_section";
    pub const SYMPTOMS_SECTION: &str = "symptoms_section";
    pub const NOTES_SECTION: &str = "notes_section";
    pub const FOLLOW_UP_BANNER_SECTION: &str = "follow_up_banner_section";
    pub const FOLLOW_UP_DATE_SECTION: &str = "follow_up_date_section";
}

/// Scalar tokens the assembler always supplies to the document template.
pub const DOCUMENT_SCALAR_TOKENS: &[&str] = &[
    tokens::CLINIC_NAME,
    tokens::RECORD_ID,
    tokens::PATIENT_NAME,
    tokens::PATIENT_ID,
    tokens::SPECIES,
    tokens::BREED,
    tokens::OWNER_NAME,
    tokens::VISIT_DATE,
    tokens::VISIT_TIME,
    tokens::WEIGHT,
    tokens::TEMPERATURE,
    tokens::HEART_RATE,
    tokens::DIAGNOSIS,
    tokens::TREATMENT,
    tokens::VETERINARIAN_NAME,
    tokens::GENERATED_DATE,
    tokens::GENERATED_TIME,
];

/// Unit suffixes for vital signs.
pub const WEIGHT_UNIT: &str = "kg";
pub const TEMPERATURE_UNIT: &str = "°C";
pub const HEART_RATE_UNIT: &str = "lpm";
