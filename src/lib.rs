//! Bootstrap Ignition - kubeadm bootstrap data for Ignition-booted hosts
//!
//! This library renders a [`BootstrapDescriptor`] into Container Linux Config
//! text, converts that text (plus an optional caller fragment) into Ignition
//! JSON, and converts the kubeadm bootstrap resources between API
//! generations.
//!
//! # Example
//!
//! ```rust
//! use bootstrap_ignition::api::v1alpha4::ContainerLinuxConfig;
//! use bootstrap_ignition::{render_ignition, BootstrapDescriptor, RenderConfig};
//!
//! let descriptor = BootstrapDescriptor::default();
//! let clc = ContainerLinuxConfig::default();
//! let rendered = render_ignition(Some(&descriptor), Some(&clc), &RenderConfig::default()).unwrap();
//! assert!(rendered.json().contains("\"version\":\"2.3.0\""));
//! ```

pub mod api;
pub mod conversion;
pub mod descriptor;
pub mod diagnostics;
pub mod dialect;
pub mod error;
pub mod ignition;
pub mod template;

pub use descriptor::BootstrapDescriptor;
pub use diagnostics::{Policy, Report, Severity};
pub use error::DialectError;
pub use ignition::{convert, merge, Config, ConvertError};
pub use template::{render, RenderConfig, RenderError, Renderer, Skeleton};

use thiserror::Error;

use api::v1alpha4::ContainerLinuxConfig;

/// Errors that can occur during the bootstrap data pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("empty base user data")]
    MissingDescriptor,

    #[error("get empty CLC config")]
    MissingClcSpec,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("converting generated CLC to Ignition: {0}")]
    Base(ConvertError),

    #[error("converting additional CLC to Ignition: {0}")]
    Additional(ConvertError),

    #[error("marshaling generated Ignition config into JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Ignition JSON plus the non-fatal diagnostics of the caller's fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub ignition: Vec<u8>,
    pub warnings: String,
}

impl Rendered {
    pub fn json(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.ignition)
    }
}

/// Convert generated CLC text, merge the caller's fragment and serialize
///
/// The generated text is always converted strictly. The fragment uses its own
/// strict flag and only its diagnostics are returned as warnings.
pub fn build_ignition(
    base_clc: &str,
    clc: &ContainerLinuxConfig,
) -> Result<Rendered, PipelineError> {
    let (base, _) = ignition::convert(base_clc, true).map_err(PipelineError::Base)?;

    let (config, report) = ignition::merge(base, Report::new(), &clc.additional_config, clc.strict)
        .map_err(PipelineError::Additional)?;
    if !report.is_empty() {
        tracing::warn!(diagnostics = report.len(), "additional CLC produced warnings");
    }

    let ignition = config.to_json()?;
    tracing::debug!(bytes = ignition.len(), "serialized Ignition config");

    Ok(Rendered {
        ignition,
        warnings: report.to_string(),
    })
}

/// Render `descriptor` and turn it into Ignition JSON
///
/// # Example
///
/// ```rust
/// use bootstrap_ignition::api::v1alpha4::ContainerLinuxConfig;
/// use bootstrap_ignition::{render_ignition, PipelineError, RenderConfig};
///
/// let clc = ContainerLinuxConfig::default();
/// let err = render_ignition(None, Some(&clc), &RenderConfig::default()).unwrap_err();
/// assert!(matches!(err, PipelineError::MissingDescriptor));
/// ```
pub fn render_ignition(
    descriptor: Option<&BootstrapDescriptor>,
    clc: Option<&ContainerLinuxConfig>,
    config: &RenderConfig,
) -> Result<Rendered, PipelineError> {
    let clc = clc.ok_or(PipelineError::MissingClcSpec)?;
    let descriptor = descriptor.ok_or(PipelineError::MissingDescriptor)?;

    let base_clc = template::render(descriptor, config)?;
    build_ignition(&base_clc, clc)
}
