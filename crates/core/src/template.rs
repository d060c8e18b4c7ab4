//! Document templates and the template store.
//!
//! A [`Template`] is parsed once into literal and placeholder segments, so substitution never
//! has to scan text again. The [`TemplateStore`] owns the document skeleton and one
//! sub-template per optional section; it is built once at startup and is read-only afterwards.

use crate::constants::{
    DOCUMENT_SCALAR_TOKENS, DOCUMENT_TEMPLATE_FILENAME, MAX_TEMPLATE_BYTES,
};
use crate::sections::Section;
use crate::{RenderError, RenderResult};
use std::collections::BTreeSet;
use std::path::Path;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

const BUILTIN_DOCUMENT: &str = include_str!("../templates/medical_record.html");
const BUILTIN_LOGO: &str = include_str!("../templates/logo.html");
const BUILTIN_SYMPTOMS: &str = include_str!("../templates/symptoms.html");
const BUILTIN_NOTES: &str = include_str!("../templates/notes.html");
const BUILTIN_FOLLOW_UP_BANNER: &str = include_str!("../templates/follow_up_banner.html");
const BUILTIN_FOLLOW_UP_DATE: &str = include_str!("../templates/follow_up_date.html");

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Token(String),
}

/// An immutable template with `{{name}}` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
    tokens: BTreeSet<String>,
}

impl Template {
    /// Parses `source` into a template.
    ///
    /// Placeholder names must match `[A-Za-z_][A-Za-z0-9_]*`; whitespace just inside the braces
    /// is ignored. Text outside `{{ }}` pairs, including single braces, is kept literally.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::InvalidTemplate` for an unterminated `{{` or an invalid name.
    pub fn parse(name: impl Into<String>, source: &str) -> RenderResult<Self> {
        let name = name.into();
        let mut segments = Vec::new();
        let mut tokens = BTreeSet::new();
        let mut rest = source;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }

            let after_open = &rest[start + OPEN.len()..];
            let end = after_open.find(CLOSE).ok_or_else(|| RenderError::InvalidTemplate {
                name: name.clone(),
                reason: format!(
                    "unterminated placeholder at byte {}",
                    source.len() - rest.len() + start
                ),
            })?;

            let token = after_open[..end].trim();
            if !is_valid_token_name(token) {
                return Err(RenderError::InvalidTemplate {
                    name,
                    reason: format!("invalid placeholder name {:?}", token),
                });
            }

            tokens.insert(token.to_string());
            segments.push(Segment::Token(token.to_string()));
            rest = &after_open[end + CLOSE.len()..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            name,
            segments,
            tokens,
        })
    }

    /// File name the template was loaded as, used in errors and logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every placeholder name the template references, each listed once.
    pub fn tokens(&self) -> &BTreeSet<String> {
        &self.tokens
    }

    /// Returns true if the template references `token` at least once.
    pub fn declares(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// Returns true if `name` is usable as a placeholder name.
pub fn is_valid_token_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Holds the document template and every section sub-template.
#[derive(Clone, Debug)]
pub struct TemplateStore {
    document: Template,
    logo: Template,
    symptoms: Template,
    notes: Template,
    follow_up_banner: Template,
    follow_up_date: Template,
}

impl TemplateStore {
    /// Builds the store from the templates compiled into the crate.
    pub fn builtin() -> RenderResult<Self> {
        Self::from_sources(|_| Ok(None))
    }

    /// Loads templates from `dir`, falling back to the built-in version of any file that is not
    /// present.
    ///
    /// # Errors
    ///
    /// Fails if `dir` is not a directory, if a template file is a symlink, exceeds
    /// `MAX_TEMPLATE_BYTES` or cannot be read, or if any template fails validation.
    pub fn load(dir: &Path) -> RenderResult<Self> {
        if !dir.is_dir() {
            return Err(RenderError::InvalidInput(format!(
                "template directory does not exist: {}",
                dir.display()
            )));
        }

        let store = Self::from_sources(|filename| read_template_file(dir, filename))?;
        tracing::info!("loaded templates from {}", dir.display());
        Ok(store)
    }

    fn from_sources<F>(mut source_for: F) -> RenderResult<Self>
    where
        F: FnMut(&str) -> RenderResult<Option<String>>,
    {
        let mut parse = |filename: &str, builtin: &str| -> RenderResult<Template> {
            match source_for(filename)? {
                Some(source) => Template::parse(filename, &source),
                None => Template::parse(filename, builtin),
            }
        };

        let store = Self {
            document: parse(DOCUMENT_TEMPLATE_FILENAME, BUILTIN_DOCUMENT)?,
            logo: parse(Section::Logo.template_file(), BUILTIN_LOGO)?,
            symptoms: parse(Section::Symptoms.template_file(), BUILTIN_SYMPTOMS)?,
            notes: parse(Section::Notes.template_file(), BUILTIN_NOTES)?,
            follow_up_banner: parse(
                Section::FollowUpBanner.template_file(),
                BUILTIN_FOLLOW_UP_BANNER,
            )?,
            follow_up_date: parse(
                Section::FollowUpDate.template_file(),
                BUILTIN_FOLLOW_UP_DATE,
            )?,
        };
        store.validate()?;
        Ok(store)
    }

    /// The document skeleton (`medical_record.html`).
    pub fn document(&self) -> &Template {
        &self.document
    }

    /// The sub-template rendered for `section`.
    pub fn section(&self, section: Section) -> &Template {
        match section {
            Section::Logo => &self.logo,
            Section::Symptoms => &self.symptoms,
            Section::Notes => &self.notes,
            Section::FollowUpBanner => &self.follow_up_banner,
            Section::FollowUpDate => &self.follow_up_date,
        }
    }

    /// Checks the templates against the tokens the assembler and section builder supply.
    ///
    /// The document must declare every section slot and may only use scalar tokens or slots.
    /// A section template may only use the tokens its builder provides.
    fn validate(&self) -> RenderResult<()> {
        for section in Section::ALL {
            if !self.document.declares(section.slot()) {
                return Err(RenderError::InvalidTemplate {
                    name: self.document.name().to_string(),
                    reason: format!("missing section slot {{{{{}}}}}", section.slot()),
                });
            }
        }

        let unknown: Vec<&str> = self
            .document
            .tokens()
            .iter()
            .map(String::as_str)
            .filter(|token| {
                !DOCUMENT_SCALAR_TOKENS.contains(token)
                    && !Section::ALL.iter().any(|section| section.slot() == *token)
            })
            .collect();
        if !unknown.is_empty() {
            return Err(RenderError::InvalidTemplate {
                name: self.document.name().to_string(),
                reason: format!("unknown placeholders: {}", unknown.join(", ")),
            });
        }

        for section in Section::ALL {
            let template = self.section(section);
            let unknown: Vec<&str> = template
                .tokens()
                .iter()
                .map(String::as_str)
                .filter(|token| !section.inputs().contains(token))
                .collect();
            if !unknown.is_empty() {
                return Err(RenderError::InvalidTemplate {
                    name: template.name().to_string(),
                    reason: format!("unknown placeholders: {}", unknown.join(", ")),
                });
            }
        }

        Ok(())
    }
}

fn read_template_file(dir: &Path, filename: &str) -> RenderResult<Option<String>> {
    let path = dir.join(filename);
    let metadata = match std::fs::symlink_metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(RenderError::TemplateRead { path, source }),
    };

    if metadata.file_type().is_symlink() {
        return Err(RenderError::InvalidTemplate {
            name: filename.to_string(),
            reason: "template files must not be symlinks".into(),
        });
    }
    if !metadata.is_file() {
        return Err(RenderError::InvalidTemplate {
            name: filename.to_string(),
            reason: "not a regular file".into(),
        });
    }
    if metadata.len() > MAX_TEMPLATE_BYTES {
        return Err(RenderError::InvalidTemplate {
            name: filename.to_string(),
            reason: format!("exceeds maximum size of {} bytes", MAX_TEMPLATE_BYTES),
        });
    }

    std::fs::read_to_string(&path)
        .map(Some)
        .map_err(|source| RenderError::TemplateRead { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::tokens;

    #[test]
    fn parses_literals_and_tokens() {
        let template = Template::parse("t", "<p>{{a}} and {{ b }}</p>{{a}}").expect("parse");
        assert_eq!(
            template.segments(),
            &[
                Segment::Literal("<p>".into()),
                Segment::Token("a".into()),
                Segment::Literal(" and ".into()),
                Segment::Token("b".into()),
                Segment::Literal("</p>".into()),
                Segment::Token("a".into()),
            ]
        );
        assert_eq!(
            template.tokens().iter().cloned().collect::<Vec<_>>(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn single_braces_are_literal() {
        let template = Template::parse("css", "a { color: red; } {b}").expect("parse");
        assert!(template.tokens().is_empty());
        assert_eq!(
            template.segments(),
            &[Segment::Literal("a { color: red; } {b}".into())]
        );
    }

    #[test]
    fn rejects_unterminated_placeholder() {
        let err = Template::parse("t", "<p>{{name</p>").unwrap_err();
        assert!(
            matches!(err, RenderError::InvalidTemplate { reason, .. } if reason.contains("unterminated"))
        );
    }

    #[test]
    fn rejects_invalid_placeholder_name() {
        for source in ["{{}}", "{{1abc}}", "{{a-b}}", "{{a b}}"] {
            let err = Template::parse("t", source).unwrap_err();
            assert!(
                matches!(err, RenderError::InvalidTemplate { ref reason, .. } if reason.contains("invalid placeholder")),
                "{source} should be rejected"
            );
        }
    }

    #[test]
    fn builtin_store_is_valid_and_declares_every_slot() {
        let store = TemplateStore::builtin().expect("builtin templates");
        for section in Section::ALL {
            assert!(store.document().declares(section.slot()));
        }
        for token in DOCUMENT_SCALAR_TOKENS {
            assert!(store.document().declares(token), "{token} not used");
        }
        assert!(store.section(Section::Symptoms).declares(tokens::SYMPTOMS));
    }

    #[test]
    fn load_falls_back_to_builtin_for_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("notes.html"),
            "<aside>{{notes}}</aside>",
        )
        .expect("write");

        let store = TemplateStore::load(dir.path()).expect("load");
        assert_eq!(store.section(Section::Notes).segments().len(), 3);
        assert_eq!(
            store.document(),
            TemplateStore::builtin().expect("builtin").document()
        );
    }

    #[test]
    fn load_rejects_section_template_with_foreign_tokens() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("notes.html"), "{{notes}} {{diagnosis}}").expect("write");

        let err = TemplateStore::load(dir.path()).unwrap_err();
        assert!(
            matches!(err, RenderError::InvalidTemplate { name, reason } if name == "notes.html" && reason.contains("diagnosis"))
        );
    }

    #[test]
    fn load_rejects_document_without_section_slot() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(DOCUMENT_TEMPLATE_FILENAME),
            "<html>{{patient_name}}</html>",
        )
        .expect("write");

        let err = TemplateStore::load(dir.path()).unwrap_err();
        assert!(
            matches!(err, RenderError::InvalidTemplate { reason, .. } if reason.contains("missing section slot"))
        );
    }

    #[test]
    fn load_rejects_oversized_template() {
        let dir = tempfile::tempdir().expect("tempdir");
        let big = "x".repeat(MAX_TEMPLATE_BYTES as usize + 1);
        std::fs::write(dir.path().join("logo.html"), big).expect("write");

        let err = TemplateStore::load(dir.path()).unwrap_err();
        assert!(
            matches!(err, RenderError::InvalidTemplate { reason, .. } if reason.contains("maximum size"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn load_rejects_symlinked_template() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("elsewhere.html");
        std::fs::write(&target, "<p>{{notes}}</p>").expect("write");
        std::os::unix::fs::symlink(&target, dir.path().join("notes.html")).expect("symlink");

        let err = TemplateStore::load(dir.path()).unwrap_err();
        assert!(
            matches!(err, RenderError::InvalidTemplate { name, reason } if name == "notes.html" && reason.contains("symlink"))
        );
    }

    #[test]
    fn load_rejects_directory_in_place_of_template() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("symptoms.html")).expect("mkdir");

        let err = TemplateStore::load(dir.path()).unwrap_err();
        assert!(
            matches!(err, RenderError::InvalidTemplate { name, .. } if name == "symptoms.html")
        );
    }

    #[test]
    fn load_rejects_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = TemplateStore::load(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, RenderError::InvalidInput(_)));
    }
}
