//! Kubeadm bootstrap resources, older generation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::meta::{Condition, ListMeta, ObjectMeta};
use crate::api::v1alpha4::{DiskSetup, File, MountPoints, Ntp, User};

/// Only cloud-config output exists in this generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    #[default]
    #[serde(rename = "cloud-config")]
    CloudConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmConfigSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_configuration: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_configuration: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_configuration: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<File>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_setup: Option<DiskSetup>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<MountPoints>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_kubeadm_commands: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_kubeadm_commands: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ntp: Option<Ntp>,
    pub format: Format,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<i32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub use_experimental_retry_join: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmConfigStatus {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_secret_name: Option<String>,
    /// Deprecated, superseded by `data_secret_name`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_data: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub failure_reason: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub failure_message: String,
    pub observed_generation: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmConfig {
    pub metadata: ObjectMeta,
    pub spec: KubeadmConfigSpec,
    pub status: KubeadmConfigStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmConfigList {
    pub metadata: ListMeta,
    pub items: Vec<KubeadmConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmConfigTemplateResource {
    pub spec: KubeadmConfigSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmConfigTemplateSpec {
    pub template: KubeadmConfigTemplateResource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmConfigTemplate {
    pub metadata: ObjectMeta,
    pub spec: KubeadmConfigTemplateSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmConfigTemplateList {
    pub metadata: ListMeta,
    pub items: Vec<KubeadmConfigTemplate>,
}
