//! Configuration for Container Linux Config rendering

use serde::{Deserialize, Serialize};

/// Column of the `inline:` key under a file entry
pub(crate) const INLINE_KEY_COLUMN: usize = 6;

/// Smallest indent that still nests file contents under `inline: |`
pub const MIN_CONTENT_INDENT: usize = INLINE_KEY_COLUMN + 1;

/// Largest indent a single-digit `|N` indentation indicator can express
pub const MAX_CONTENT_INDENT: usize = INLINE_KEY_COLUMN + 9;

/// Fixed part of the rendered config
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Skeleton {
    /// One `kubeadm.service` running `/etc/kubeadm.sh`
    #[default]
    Minimal,
    /// Waits for `coreos-metadata.service` and substitutes its environment
    /// into the kubeadm configuration
    CoreosMetadata,
}

impl Skeleton {
    /// Where the rendered kubeadm configuration is written
    pub fn kubeadm_config_path(self) -> &'static str {
        match self {
            Skeleton::Minimal => "/etc/kubeadm.yml",
            Skeleton::CoreosMetadata => "/etc/kubeadm.yml.tmpl",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub skeleton: Skeleton,

    /// Spaces prepended to each line of file contents
    pub content_indent: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            skeleton: Skeleton::Minimal,
            content_indent: 8,
        }
    }
}

impl RenderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skeleton(mut self, skeleton: Skeleton) -> Self {
        self.skeleton = skeleton;
        self
    }

    pub fn with_content_indent(mut self, indent: usize) -> Self {
        self.content_indent = indent;
        self
    }

    /// Indentation indicator written after `inline: |`, relative to the key
    pub(crate) fn indentation_indicator(&self) -> usize {
        self.content_indent.saturating_sub(INLINE_KEY_COLUMN)
    }
}
