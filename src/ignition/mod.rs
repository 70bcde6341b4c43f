//! Container Linux Config to Ignition conversion
//!
//! Conversion runs in two stages, each followed by a [`Policy`] check:
//! parsing (syntax plus structural validation) and translation. Reports from
//! both stages are concatenated on success.

pub mod dataurl;
mod merge;
pub mod schema;
mod translate;
mod types;

pub use merge::merge;
pub use translate::{parse_mode, translate};
pub use types::*;

use thiserror::Error;

use crate::diagnostics::{Policy, Report};
use crate::dialect;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("empty Container Linux Config")]
    Empty,

    #[error("error parsing Container Linux Config: {0}")]
    Parse(Report),

    #[error("error converting to Ignition: {0}")]
    Translate(Report),
}

impl ConvertError {
    /// Diagnostics that caused the failure, if any
    pub fn report(&self) -> Option<&Report> {
        match self {
            ConvertError::Empty => None,
            ConvertError::Parse(report) | ConvertError::Translate(report) => Some(report),
        }
    }
}

/// Convert Container Linux Config text into an Ignition config
pub fn convert(text: &str, strict: bool) -> Result<(Config, Report), ConvertError> {
    if text.trim().is_empty() {
        return Err(ConvertError::Empty);
    }
    let policy = Policy::from_strict(strict);

    let document = dialect::parse(text)
        .map_err(|errors| ConvertError::Parse(Report::from_dialect_errors(text, &errors)))?;
    let mut report = policy
        .check(schema::check(text, &document))
        .map_err(ConvertError::Parse)?;

    let (config, translated) = translate(text, &document);
    let translated = policy.check(translated).map_err(ConvertError::Translate)?;

    tracing::debug!(
        files = config.files().len(),
        units = config.units().len(),
        diagnostics = report.len() + translated.len(),
        strict,
        "converted Container Linux Config"
    );

    report.merge(translated);
    Ok((config, report))
}
