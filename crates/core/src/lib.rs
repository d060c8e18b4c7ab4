//! # Clinidoc Core
//!
//! Rendering engine for clinical documents.
//!
//! Turns a veterinary medical record into a self-contained HTML document ready for an
//! HTML-to-PDF step:
//! - field formatting with an explicit not-recorded fallback,
//! - optional sections rendered from their own sub-templates,
//! - single-pass placeholder substitution against a closed field set.
//!
//! Rendering is synchronous and pure: the same request always produces the same bytes.
//!
//! **No transport concerns**: fetching the record, PDF rasterisation, HTTP and command-line
//! handling live in the binaries.
//!
//! ```no_run
//! use clinidoc_core::{DocumentAssembler, RenderConfig, RenderRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let assembler = DocumentAssembler::from_config(RenderConfig::default())?;
//! let request = RenderRequest::from_json(&std::fs::read_to_string("record.json")?)?;
//! let html = assembler.render(&request)?;
//! # let _ = html;
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod config;
pub mod constants;
pub mod error;
pub mod formatter;
pub mod request;
pub mod sections;
pub mod substitution;
pub mod template;

pub use assembler::DocumentAssembler;
pub use config::RenderConfig;
pub use error::{RenderError, RenderResult};
pub use formatter::{escape_html, FieldValue, Formatter, RequiredField, VitalKind};
pub use request::{RenderRequest, RenderRequestWire};
pub use sections::{OptionalSection, Section, SectionBuilder};
pub use substitution::{substitute, FieldSet, Substitution};
pub use template::{Template, TemplateStore};

pub use clinidoc_types::{Measurement, NonEmptyText};
