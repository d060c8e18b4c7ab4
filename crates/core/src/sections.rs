//! Conditional document sections.
//!
//! Each optional concern of the medical record (clinic logo, symptoms, clinical notes, the
//! follow-up banner and the follow-up date) is rendered from its own sub-template through the
//! same substitution engine as the document, or omitted entirely.
//!
//! Trigger rules:
//!
//! | Section          | Present when                                      |
//! |------------------|---------------------------------------------------|
//! | logo             | an http(s) or `data:image/` logo reference is set |
//! | symptoms         | symptoms text is non-blank                        |
//! | notes            | notes text is non-blank                           |
//! | follow-up banner | the follow-up flag is set                         |
//! | follow-up date   | the follow-up flag is set and a date is supplied  |
//!
//! The banner and the date block have different triggers on purpose: a follow-up can be flagged
//! before a date has been scheduled, in which case only the banner is shown.

use crate::constants::{tokens, LOGO_SOURCE_PREFIXES};
use crate::request::RenderRequest;
use crate::substitution::{render_template, FieldSet};
use crate::template::TemplateStore;
use crate::RenderResult;
use clinidoc_types::NonEmptyText;

/// The optional sections of a medical record document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Logo,
    Symptoms,
    Notes,
    FollowUpBanner,
    FollowUpDate,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Logo,
        Section::Symptoms,
        Section::Notes,
        Section::FollowUpBanner,
        Section::FollowUpDate,
    ];

    /// The document placeholder the rendered fragment is substituted into.
    pub fn slot(self) -> &'static str {
        match self {
            Section::Logo => tokens::LOGO_SECTION,
            Section::Symptoms => tokens::SYMPTOMS_SECTION,
            Section::Notes => tokens::NOTES_SECTION,
            Section::FollowUpBanner => tokens::FOLLOW_UP_BANNER_SECTION,
            Section::FollowUpDate => tokens::FOLLOW_UP_DATE_SECTION,
        }
    }

    /// File name of the sub-template, inside a template directory.
    pub fn template_file(self) -> &'static str {
        match self {
            Section::Logo => "logo.html",
            Section::Symptoms => "symptoms.html",
            Section::Notes => "notes.html",
            Section::FollowUpBanner => "follow_up_banner.html",
            Section::FollowUpDate => "follow_up_date.html",
        }
    }

    /// Tokens the sub-template is allowed to reference.
    pub fn inputs(self) -> &'static [&'static str] {
        match self {
            Section::Logo => &[tokens::LOGO_SRC, tokens::CLINIC_NAME],
            Section::Symptoms => &[tokens::SYMPTOMS, tokens::PATIENT_NAME],
            Section::Notes => &[tokens::NOTES, tokens::PATIENT_NAME],
            Section::FollowUpBanner => &[tokens::PATIENT_NAME, tokens::VETERINARIAN_NAME],
            Section::FollowUpDate => &[
                tokens::FOLLOW_UP_DATE,
                tokens::PATIENT_NAME,
                tokens::VETERINARIAN_NAME,
            ],
        }
    }

    pub fn is_triggered(self, request: &RenderRequest) -> bool {
        match self {
            Section::Logo => logo_source(request.logo_src.as_deref()).is_some(),
            Section::Symptoms => {
                NonEmptyText::from_optional(request.symptoms.as_deref()).is_some()
            }
            Section::Notes => NonEmptyText::from_optional(request.notes.as_deref()).is_some(),
            Section::FollowUpBanner => request.follow_up_required,
            Section::FollowUpDate => {
                request.follow_up_required && request.follow_up_date.is_some()
            }
        }
    }
}

/// The logo reference to place in the document, if any.
///
/// Surrounding whitespace is dropped. Blank references and any scheme outside
/// [`LOGO_SOURCE_PREFIXES`] (`javascript:`, `file:`, bare paths) count as no logo.
pub fn logo_source(raw: Option<&str>) -> Option<&str> {
    let src = raw?.trim();
    LOGO_SOURCE_PREFIXES
        .iter()
        .any(|prefix| {
            src.get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        })
        .then_some(src)
}

/// A conditionally included document fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionalSection {
    Present(String),
    Absent,
}

impl OptionalSection {
    pub fn is_present(&self) -> bool {
        matches!(self, OptionalSection::Present(_))
    }

    /// The fragment HTML, or the empty string when absent.
    pub fn as_html(&self) -> &str {
        match self {
            OptionalSection::Present(html) => html,
            OptionalSection::Absent => "",
        }
    }

    pub fn into_html(self) -> String {
        match self {
            OptionalSection::Present(html) => html,
            OptionalSection::Absent => String::new(),
        }
    }
}

/// Renders optional sections from the store's sub-templates.
#[derive(Clone, Copy, Debug)]
pub struct SectionBuilder<'a> {
    store: &'a TemplateStore,
    strict: bool,
}

impl<'a> SectionBuilder<'a> {
    pub fn new(store: &'a TemplateStore, strict: bool) -> Self {
        Self { store, strict }
    }

    /// Builds one section for `request`.
    ///
    /// `values` holds the already formatted and escaped record values; only the tokens the
    /// section's sub-template declares are taken from it.
    ///
    /// # Errors
    ///
    /// In strict mode, returns `RenderError::UnresolvedPlaceholder` when the sub-template needs
    /// a value that `values` does not carry.
    pub fn build(
        &self,
        section: Section,
        request: &RenderRequest,
        values: &FieldSet,
    ) -> RenderResult<OptionalSection> {
        if !section.is_triggered(request) {
            tracing::debug!(section = ?section, "section absent");
            return Ok(OptionalSection::Absent);
        }

        let template = self.store.section(section);
        let fields = values.project(template);
        let html = render_template(template, &fields, self.strict)?;
        Ok(OptionalSection::Present(html.trim_end().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::tests::minimal_request;
    use crate::RenderError;
    use chrono::NaiveDate;

    fn values() -> FieldSet {
        let mut values = FieldSet::new();
        values.insert(tokens::PATIENT_NAME, "Luna").expect("insert");
        values.insert(tokens::VETERINARIAN_NAME, "Dra. Ruiz").expect("insert");
        values.insert(tokens::SYMPTOMS, "Vómitos").expect("insert");
        values.insert(tokens::NOTES, "Dieta blanda").expect("insert");
        values
            .insert(tokens::FOLLOW_UP_DATE, "1 de abril de 2024")
            .expect("insert");
        values.insert(tokens::LOGO_SRC, "logo.png").expect("insert");
        values.insert(tokens::CLINIC_NAME, "Clínica").expect("insert");
        values
    }

    #[test]
    fn blank_text_does_not_trigger() {
        let mut request = minimal_request();
        request.symptoms = Some("   ".into());
        request.notes = Some(String::new());
        request.logo_src = Some("\n".into());
        assert!(!Section::Symptoms.is_triggered(&request));
        assert!(!Section::Notes.is_triggered(&request));
        assert!(!Section::Logo.is_triggered(&request));
    }

    #[test]
    fn logo_requires_web_or_image_data_reference() {
        assert_eq!(
            logo_source(Some(" https://clinica.example/logo.png ")),
            Some("https://clinica.example/logo.png")
        );
        assert_eq!(
            logo_source(Some("HTTP://clinica.example/logo.png")),
            Some("HTTP://clinica.example/logo.png")
        );
        assert!(logo_source(Some("data:image/png;base64,iVBORw0KGgo=")).is_some());
        assert_eq!(logo_source(Some("javascript:alert(1)")), None);
        assert_eq!(logo_source(Some("data:text/html,<script>")), None);
        assert_eq!(logo_source(Some("logo.png")), None);
        assert_eq!(logo_source(Some("ñ")), None);
        assert_eq!(logo_source(None), None);

        let mut request = minimal_request();
        request.logo_src = Some("javascript:alert(1)".into());
        assert!(!Section::Logo.is_triggered(&request));
    }

    #[test]
    fn follow_up_banner_and_date_have_independent_triggers() {
        let mut request = minimal_request();
        request.follow_up_required = true;
        assert!(Section::FollowUpBanner.is_triggered(&request));
        assert!(!Section::FollowUpDate.is_triggered(&request));

        request.follow_up_date = NaiveDate::from_ymd_opt(2024, 4, 1);
        assert!(Section::FollowUpDate.is_triggered(&request));

        request.follow_up_required = false;
        assert!(!Section::FollowUpBanner.is_triggered(&request));
        assert!(!Section::FollowUpDate.is_triggered(&request));
    }

    #[test]
    fn absent_section_renders_empty() {
        let store = TemplateStore::builtin().expect("store");
        let builder = SectionBuilder::new(&store, true);
        let section = builder
            .build(Section::Symptoms, &minimal_request(), &values())
            .expect("build");
        assert_eq!(section, OptionalSection::Absent);
        assert_eq!(section.as_html(), "");
    }

    #[test]
    fn present_section_uses_sub_template() {
        let store = TemplateStore::builtin().expect("store");
        let builder = SectionBuilder::new(&store, true);
        let mut request = minimal_request();
        request.symptoms = Some("Vómitos".into());

        let section = builder
            .build(Section::Symptoms, &request, &values())
            .expect("build");
        assert!(section.is_present());
        assert!(section.as_html().contains("Síntomas"));
        assert!(section.as_html().contains("Vómitos"));
        assert!(!section.as_html().contains("{{"));
    }

    #[test]
    fn strict_mode_reports_missing_section_value() {
        let store = TemplateStore::builtin().expect("store");
        let builder = SectionBuilder::new(&store, true);
        let mut request = minimal_request();
        request.notes = Some("Dieta".into());

        let err = builder
            .build(Section::Notes, &request, &FieldSet::new())
            .unwrap_err();
        assert!(
            matches!(err, RenderError::UnresolvedPlaceholder { template, tokens } if template == "notes.html" && tokens == vec!["notes".to_string()])
        );
    }
}
