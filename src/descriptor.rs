//! Bootstrap descriptor: everything a node needs written before kubeadm runs
//!
//! Descriptors are usually built in code, but can also be loaded from TOML:
//!
//! ```toml
//! pre_kubeadm_commands = ["hostnamectl set-hostname node-1"]
//!
//! [[write_files]]
//! path = "/etc/motd"
//! permissions = "0644"
//! content = "welcome\n"
//!
//! [kubeadm]
//! action = "join"
//! join_configuration = "kind: JoinConfiguration\n"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory kubeadm reads its PKI from
pub const PKI_DIR: &str = "/etc/kubernetes/pki";

#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Failed to read descriptor file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse descriptor TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// How a file's content is stored in [`WriteFile::content`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "plain")]
    Plain,
    #[serde(rename = "base64")]
    Base64,
    #[serde(rename = "gzip+base64")]
    GzipBase64,
}

/// A file written to the node before kubeadm runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteFile {
    pub path: String,
    /// Octal mode as written, e.g. `"0644"`. Empty means unset.
    #[serde(default)]
    pub permissions: String,
    /// Embedded as a literal block, so line breaks read back as `\n` and a
    /// `\r\n` pair becomes `\n`. Use [`Encoding::Base64`] to keep exact bytes.
    #[serde(default)]
    pub content: String,
    /// `user` or `user:group`. Empty means unset.
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub encoding: Encoding,
}

impl WriteFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_permissions(mut self, permissions: impl Into<String>) -> Self {
        self.permissions = permissions.into();
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Owner split into user and optional group
    pub fn owner_parts(&self) -> Option<(&str, Option<&str>)> {
        if self.owner.is_empty() {
            return None;
        }
        match self.owner.split_once(':') {
            Some((user, group)) => Some((user, Some(group).filter(|g| !g.is_empty()))),
            None => Some((&self.owner, None)),
        }
    }
}

/// Role a certificate plays in the cluster PKI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CertificatePurpose {
    ClusterCa,
    EtcdCa,
    FrontProxyCa,
    ServiceAccount,
}

impl CertificatePurpose {
    /// Paths of the public part and the private key
    pub fn paths(self) -> (String, String) {
        let (public, key) = match self {
            CertificatePurpose::ClusterCa => ("ca.crt", "ca.key"),
            CertificatePurpose::EtcdCa => ("etcd/ca.crt", "etcd/ca.key"),
            CertificatePurpose::FrontProxyCa => ("front-proxy-ca.crt", "front-proxy-ca.key"),
            CertificatePurpose::ServiceAccount => ("sa.pub", "sa.key"),
        };
        (format!("{}/{}", PKI_DIR, public), format!("{}/{}", PKI_DIR, key))
    }
}

/// PEM encoded key pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub purpose: CertificatePurpose,
    #[serde(default)]
    pub cert: String,
    #[serde(default)]
    pub key: String,
}

impl Certificate {
    /// Files for this key pair; empty when key material is missing
    pub fn as_files(&self) -> Vec<WriteFile> {
        if self.cert.is_empty() || self.key.is_empty() {
            return Vec::new();
        }
        let (cert_path, key_path) = self.purpose.paths();
        vec![
            WriteFile::new(cert_path, self.cert.clone())
                .with_permissions("0640")
                .with_owner("root:root"),
            WriteFile::new(key_path, self.key.clone())
                .with_permissions("0600")
                .with_owner("root:root"),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub ssh_authorized_keys: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub home_dir: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
}

/// kubeadm configuration documents, inserted verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum KubeadmPayload {
    Init {
        #[serde(default)]
        cluster_configuration: String,
        #[serde(default)]
        init_configuration: String,
    },
    Join {
        #[serde(default)]
        join_configuration: String,
    },
}

impl Default for KubeadmPayload {
    fn default() -> Self {
        KubeadmPayload::Join {
            join_configuration: String::new(),
        }
    }
}

impl KubeadmPayload {
    /// `init` or `join`
    pub fn action(&self) -> &'static str {
        match self {
            KubeadmPayload::Init { .. } => "init",
            KubeadmPayload::Join { .. } => "join",
        }
    }

    /// Configuration documents in the order kubeadm expects them
    pub fn documents(&self) -> Vec<&str> {
        match self {
            KubeadmPayload::Init {
                cluster_configuration,
                init_configuration,
            } => vec![cluster_configuration.as_str(), init_configuration.as_str()],
            KubeadmPayload::Join { join_configuration } => vec![join_configuration.as_str()],
        }
    }

    /// Documents joined into one YAML stream
    pub fn to_yaml(&self) -> String {
        self.documents()
            .iter()
            .map(|doc| doc.trim_end_matches('\n'))
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

/// Input to the template renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapDescriptor {
    pub write_files: Vec<WriteFile>,
    pub certificates: Vec<Certificate>,
    pub pre_kubeadm_commands: Vec<String>,
    pub post_kubeadm_commands: Vec<String>,
    pub users: Vec<User>,
    pub kubeadm: KubeadmPayload,
    /// `--v` level passed to kubeadm
    pub verbosity: Option<u32>,
}

impl BootstrapDescriptor {
    pub fn from_file(path: &Path) -> Result<Self, DescriptorError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, DescriptorError> {
        Ok(toml::from_str(content)?)
    }

    /// Caller files followed by the certificate files
    pub fn files(&self) -> Vec<WriteFile> {
        self.write_files
            .iter()
            .cloned()
            .chain(self.certificates.iter().flat_map(Certificate::as_files))
            .collect()
    }

    /// The kubeadm invocation for `config_path`
    pub fn kubeadm_command(&self, config_path: &str) -> String {
        let mut command = format!("kubeadm {} --config {}", self.kubeadm.action(), config_path);
        if let Some(level) = self.verbosity {
            command.push_str(&format!(" --v={}", level));
        }
        command
    }
}
