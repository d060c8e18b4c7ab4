//! Medical record document assembly.
//!
//! The assembler is the only entry point callers need: it validates the mandatory clinical
//! content, formats and escapes every value, builds the optional sections, and substitutes the
//! result into the document template in a single pass.

use crate::config::RenderConfig;
use crate::constants::tokens;
use crate::formatter::{escape_html, FieldValue, Formatter, RequiredField, VitalKind};
use crate::request::RenderRequest;
use crate::sections::{logo_source, Section, SectionBuilder};
use crate::substitution::{render_template, FieldSet};
use crate::template::TemplateStore;
use crate::RenderResult;
use clinidoc_types::NonEmptyText;

/// Renders medical records into self-contained HTML documents.
///
/// Immutable after construction; share one instance (for example behind an `Arc`) between
/// concurrent callers.
#[derive(Clone, Debug)]
pub struct DocumentAssembler {
    config: RenderConfig,
    store: TemplateStore,
    formatter: Formatter,
}

impl DocumentAssembler {
    /// Creates an assembler over an already validated template store.
    ///
    /// # Arguments
    ///
    /// * `config` - Clinic name, fallback text and placeholder policy
    /// * `store` - Templates to render with; see [`TemplateStore::load`]
    pub fn new(config: RenderConfig, store: TemplateStore) -> Self {
        let formatter = Formatter::new(config.not_recorded_text());
        Self {
            config,
            store,
            formatter,
        }
    }

    /// Builds an assembler, loading templates from the configured directory or the built-in set.
    pub fn from_config(config: RenderConfig) -> RenderResult<Self> {
        let store = match config.template_dir() {
            Some(dir) => TemplateStore::load(dir)?,
            None => TemplateStore::builtin()?,
        };
        Ok(Self::new(config, store))
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Renders `request` into the final HTML document.
    ///
    /// # Errors
    ///
    /// - `RenderError::MissingRequiredField` if patient name, veterinarian name, diagnosis or
    ///   treatment is missing or blank.
    /// - `RenderError::UnresolvedPlaceholder` in strict mode, if a template references a token
    ///   for which no value was produced.
    pub fn render(&self, request: &RenderRequest) -> RenderResult<String> {
        let strict = self.config.strict_placeholders();
        let values = self.values(request)?;

        let document = self.store.document();
        let mut fields = values.project(document);
        let builder = SectionBuilder::new(&self.store, strict);
        for section in Section::ALL {
            let built = builder.build(section, request, &values)?;
            fields.insert(section.slot(), built.into_html())?;
        }

        let html = render_template(document, &fields, strict)?;
        tracing::debug!(
            record_id = request.record_id.as_deref().unwrap_or("-"),
            bytes = html.len(),
            "rendered medical record"
        );
        Ok(html)
    }

    /// Formats and escapes every record value the templates may reference.
    ///
    /// Mandatory fields are checked first so that an invalid request fails before any
    /// formatting work is done.
    fn values(&self, request: &RenderRequest) -> RenderResult<FieldSet> {
        let f = &self.formatter;
        let patient_name =
            f.required(RequiredField::PatientName, request.patient_name.as_deref())?;
        let veterinarian_name = f.required(
            RequiredField::VeterinarianName,
            request.veterinarian_name.as_deref(),
        )?;
        let diagnosis = f.required(RequiredField::Diagnosis, request.diagnosis.as_deref())?;
        let treatment = f.required(RequiredField::Treatment, request.treatment.as_deref())?;

        let visit_date = request.visit_date.map(|timestamp| timestamp.date());
        let visit_time = request.visit_date.map(|timestamp| timestamp.time());

        let scalars = [
            (tokens::CLINIC_NAME, self.config.clinic_name().to_string()),
            (tokens::PATIENT_NAME, patient_name.into_inner()),
            (tokens::VETERINARIAN_NAME, veterinarian_name.into_inner()),
            (tokens::DIAGNOSIS, diagnosis.into_inner()),
            (tokens::TREATMENT, treatment.into_inner()),
            (
                tokens::RECORD_ID,
                f.format(FieldValue::Text(request.record_id.as_deref())),
            ),
            (
                tokens::PATIENT_ID,
                f.format(FieldValue::Text(request.patient_id.as_deref())),
            ),
            (
                tokens::SPECIES,
                f.format(FieldValue::Text(request.species.as_deref())),
            ),
            (
                tokens::BREED,
                f.format(FieldValue::Text(request.breed.as_deref())),
            ),
            (
                tokens::OWNER_NAME,
                f.format(FieldValue::Text(request.owner_name.as_deref())),
            ),
            (tokens::VISIT_DATE, f.format(FieldValue::LongDate(visit_date))),
            (tokens::VISIT_TIME, f.format(FieldValue::ShortTime(visit_time))),
            (
                tokens::WEIGHT,
                f.format(FieldValue::Vital(VitalKind::Weight, request.weight.as_ref())),
            ),
            (
                tokens::TEMPERATURE,
                f.format(FieldValue::Vital(
                    VitalKind::Temperature,
                    request.temperature.as_ref(),
                )),
            ),
            (
                tokens::HEART_RATE,
                f.format(FieldValue::Vital(
                    VitalKind::HeartRate,
                    request.heart_rate.as_ref(),
                )),
            ),
            (
                tokens::GENERATED_DATE,
                f.format(FieldValue::LongDate(Some(request.generated_at.date()))),
            ),
            (
                tokens::GENERATED_TIME,
                f.format(FieldValue::ShortTime(Some(request.generated_at.time()))),
            ),
        ];

        let mut values = FieldSet::new();
        for (token, value) in scalars {
            values.insert(token, escape_html(&value))?;
        }

        // Section-only values; absent data leaves the token out and the section untriggered.
        if let Some(symptoms) = NonEmptyText::from_optional(request.symptoms.as_deref()) {
            values.insert(tokens::SYMPTOMS, escape_html(symptoms.as_str()))?;
        }
        if let Some(notes) = NonEmptyText::from_optional(request.notes.as_deref()) {
            values.insert(tokens::NOTES, escape_html(notes.as_str()))?;
        }
        if let Some(date) = request.follow_up_date {
            values.insert(
                tokens::FOLLOW_UP_DATE,
                escape_html(&f.format(FieldValue::LongDate(Some(date)))),
            )?;
        }
        match logo_source(request.logo_src.as_deref()) {
            Some(src) => values.insert(tokens::LOGO_SRC, escape_html(src))?,
            None if NonEmptyText::from_optional(request.logo_src.as_deref()).is_some() => {
                tracing::warn!("logo reference dropped: unsupported scheme");
            }
            None => {}
        }

        Ok(values)
    }
}
