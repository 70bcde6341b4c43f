//! Canonical Ignition 2.3 configuration
//!
//! Values are produced by the translator and are read-only afterwards. The
//! only way to combine two configs is [`Config::append`].

use serde::{Deserialize, Serialize};

/// Ignition spec version emitted in the header
pub const IGNITION_VERSION: &str = "2.3.0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub(crate) ignition: Header,
    #[serde(default)]
    pub(crate) passwd: Passwd,
    #[serde(default)]
    pub(crate) storage: Storage,
    #[serde(default)]
    pub(crate) systemd: Systemd,
}

impl Config {
    pub fn version(&self) -> &str {
        &self.ignition.version
    }

    pub fn files(&self) -> &[File] {
        &self.storage.files
    }

    pub fn directories(&self) -> &[Directory] {
        &self.storage.directories
    }

    pub fn links(&self) -> &[Link] {
        &self.storage.links
    }

    pub fn units(&self) -> &[Unit] {
        &self.systemd.units
    }

    pub fn users(&self) -> &[User] {
        &self.passwd.users
    }

    /// Section-wise concatenation, `self` first. Nothing is de-duplicated.
    pub fn append(mut self, other: Config) -> Config {
        self.storage.files.extend(other.storage.files);
        self.storage.directories.extend(other.storage.directories);
        self.storage.links.extend(other.storage.links);
        self.systemd.units.extend(other.systemd.units);
        self.passwd.users.extend(other.passwd.users);
        self
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub(crate) config: Empty,
    #[serde(default)]
    pub(crate) security: Security,
    #[serde(default)]
    pub(crate) timeouts: Empty,
    pub(crate) version: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            config: Empty {},
            security: Security::default(),
            timeouts: Empty {},
            version: IGNITION_VERSION.to_string(),
        }
    }
}

/// Serializes as `{}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Security {
    #[serde(default)]
    pub(crate) tls: Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) directories: Vec<Directory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) files: Vec<File>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) links: Vec<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Systemd {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) units: Vec<Unit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Passwd {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) users: Vec<User>,
}

/// Owner of a filesystem node, by id or by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeOwner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
}

impl NodeOwner {
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub(crate) filesystem: String,
    pub(crate) path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) user: Option<NodeOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) group: Option<NodeOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) overwrite: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) append: bool,
    pub(crate) contents: FileContents,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) mode: Option<u32>,
}

impl File {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn filesystem(&self) -> &str {
        &self.filesystem
    }

    pub fn mode(&self) -> Option<u32> {
        self.mode
    }

    pub fn contents(&self) -> &FileContents {
        &self.contents
    }

    pub fn user(&self) -> Option<&NodeOwner> {
        self.user.as_ref()
    }

    pub fn group(&self) -> Option<&NodeOwner> {
        self.group.as_ref()
    }

    pub fn is_append(&self) -> bool {
        self.append
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileContents {
    #[serde(default)]
    pub(crate) compression: String,
    #[serde(default)]
    pub(crate) source: String,
    #[serde(default)]
    pub(crate) verification: Verification,
}

impl FileContents {
    /// `data:` URL for inline contents, or the remote URL
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn compression(&self) -> &str {
        &self.compression
    }

    /// `<function>-<sum>` when verification is requested
    pub fn hash(&self) -> Option<&str> {
        self.verification.hash.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    pub(crate) filesystem: String,
    pub(crate) path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) user: Option<NodeOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) group: Option<NodeOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) overwrite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) mode: Option<u32>,
}

impl Directory {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mode(&self) -> Option<u32> {
        self.mode
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub(crate) filesystem: String,
    pub(crate) path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) user: Option<NodeOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) group: Option<NodeOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) overwrite: Option<bool>,
    pub(crate) target: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) hard: bool,
}

impl Link {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_hard(&self) -> bool {
        self.hard
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) contents: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) dropins: Vec<Dropin>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) enable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) mask: bool,
}

impl Unit {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    pub fn dropins(&self) -> &[Dropin] {
        &self.dropins
    }

    /// `enabled`, falling back to the deprecated `enable` flag
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(self.enable)
    }

    pub fn is_masked(&self) -> bool {
        self.mask
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dropin {
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) contents: Option<String>,
}

impl Dropin {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) ssh_authorized_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) home_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) gecos: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) shell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) uid: Option<i64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) system: bool,
}

impl User {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn ssh_authorized_keys(&self) -> &[String] {
        &self.ssh_authorized_keys
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn home_dir(&self) -> Option<&str> {
        self.home_dir.as_deref()
    }

    pub fn shell(&self) -> Option<&str> {
        self.shell.as_deref()
    }
}
