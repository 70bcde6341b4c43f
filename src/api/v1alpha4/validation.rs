//! Admission checks for [`KubeadmConfigSpec`]

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use super::bootstrap::{Format, KubeadmConfigSpec};

/// A rejected field, addressed by its JSON path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid KubeadmConfig spec: {}", join(.0))]
pub struct ValidationError(pub Vec<FieldError>);

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

struct Collector(Vec<FieldError>);

impl Collector {
    fn reject(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            path: path.into(),
            message: message.into(),
        });
    }
}

impl KubeadmConfigSpec {
    /// Check the cross-field rules a stored object must satisfy
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Collector(Vec::new());
        let mut seen = HashSet::new();

        for (i, file) in self.files.iter().enumerate() {
            let at = format!("spec.files[{}]", i);
            if let Some(source) = &file.content_from {
                if !file.content.is_empty() {
                    errors.reject(
                        format!("{}.content", at),
                        "content and contentFrom are mutually exclusive",
                    );
                }
                if source.secret.name.is_empty() {
                    errors.reject(format!("{}.contentFrom.secret.name", at), "required");
                }
                if source.secret.key.is_empty() {
                    errors.reject(format!("{}.contentFrom.secret.key", at), "required");
                }
            }
            if !seen.insert(file.path.as_str()) {
                errors.reject(
                    format!("{}.path", at),
                    format!("duplicate file path {:?}", file.path),
                );
            }
        }

        match self.format {
            Format::Ignition => {
                if self.ignition.is_none() {
                    errors.reject("spec.ignition", "required when format is ignition");
                }
                if self.disk_setup.is_some() {
                    errors.reject("spec.diskSetup", "not supported when format is ignition");
                }
                if !self.mounts.is_empty() {
                    errors.reject("spec.mounts", "not supported when format is ignition");
                }
                if !self.users.is_empty() {
                    errors.reject("spec.users", "not supported when format is ignition");
                }
                if self.ntp.is_some() {
                    errors.reject("spec.ntp", "not supported when format is ignition");
                }
                if self.use_experimental_retry_join {
                    errors.reject(
                        "spec.useExperimentalRetryJoin",
                        "not supported when format is ignition",
                    );
                }
            }
            Format::CloudConfig => {
                if self.ignition.is_some() {
                    errors.reject("spec.ignition", "allowed only when format is ignition");
                }
            }
        }

        if errors.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(errors.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v1alpha4::{
        ContainerLinuxConfig, File, FileSource, IgnitionSpec, Ntp, SecretFileSource, User,
    };
    use pretty_assertions::assert_eq;

    fn paths(spec: &KubeadmConfigSpec) -> Vec<String> {
        match spec.validate() {
            Ok(()) => Vec::new(),
            Err(err) => err.errors().iter().map(|e| e.path.clone()).collect(),
        }
    }

    fn ignition_spec() -> KubeadmConfigSpec {
        KubeadmConfigSpec {
            format: Format::Ignition,
            ignition: Some(IgnitionSpec {
                container_linux_config: Some(ContainerLinuxConfig::default()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_content_and_content_from_conflict() {
        let spec = KubeadmConfigSpec {
            files: vec![File {
                path: "/etc/secret".into(),
                content: "inline".into(),
                content_from: Some(FileSource {
                    secret: SecretFileSource {
                        name: "creds".into(),
                        key: "token".into(),
                    },
                }),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(paths(&spec), vec!["spec.files[0].content"]);
    }

    #[test]
    fn test_content_from_needs_name_and_key() {
        let spec = KubeadmConfigSpec {
            files: vec![File {
                path: "/etc/secret".into(),
                content_from: Some(FileSource::default()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            paths(&spec),
            vec![
                "spec.files[0].contentFrom.secret.name",
                "spec.files[0].contentFrom.secret.key"
            ]
        );
    }

    #[test]
    fn test_duplicate_paths_rejected() {
        let file = File {
            path: "/etc/motd".into(),
            content: "hi".into(),
            ..Default::default()
        };
        let spec = KubeadmConfigSpec {
            files: vec![file.clone(), file],
            ..Default::default()
        };
        assert_eq!(paths(&spec), vec!["spec.files[1].path"]);
    }

    #[test]
    fn test_ignition_requires_matching_format() {
        let spec = KubeadmConfigSpec {
            ignition: Some(IgnitionSpec::default()),
            ..Default::default()
        };
        assert_eq!(paths(&spec), vec!["spec.ignition"]);

        let spec = KubeadmConfigSpec {
            format: Format::Ignition,
            ..Default::default()
        };
        assert_eq!(paths(&spec), vec!["spec.ignition"]);
    }

    #[test]
    fn test_ignition_format_rejects_cloud_init_only_fields() {
        let spec = KubeadmConfigSpec {
            users: vec![User {
                name: "core".into(),
                ..Default::default()
            }],
            ntp: Some(Ntp::default()),
            use_experimental_retry_join: true,
            ..ignition_spec()
        };
        assert_eq!(
            paths(&spec),
            vec!["spec.users", "spec.ntp", "spec.useExperimentalRetryJoin"]
        );
    }

    #[test]
    fn test_valid_ignition_spec() {
        assert!(ignition_spec().validate().is_ok());
        assert!(KubeadmConfigSpec::default().validate().is_ok());
    }

    #[test]
    fn test_error_message_lists_fields() {
        let spec = KubeadmConfigSpec {
            format: Format::Ignition,
            ..Default::default()
        };
        let err = spec.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid KubeadmConfig spec: spec.ignition: required when format is ignition"
        );
    }
}
