//! Kubeadm control plane resources, older generation

use serde::{Deserialize, Serialize};

use super::bootstrap::KubeadmConfigSpec;
use crate::api::meta::{Condition, ListMeta, ObjectMeta, ObjectReference};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmControlPlaneSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    pub version: String,
    pub infrastructure_template: ObjectReference,
    pub kubeadm_config_spec: KubeadmConfigSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_drain_timeout: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmControlPlaneStatus {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub selector: String,
    pub replicas: i32,
    pub updated_replicas: i32,
    pub ready_replicas: i32,
    pub unavailable_replicas: i32,
    pub initialized: bool,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    pub observed_generation: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmControlPlane {
    pub metadata: ObjectMeta,
    pub spec: KubeadmControlPlaneSpec,
    pub status: KubeadmControlPlaneStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmControlPlaneList {
    pub metadata: ListMeta,
    pub items: Vec<KubeadmControlPlane>,
}
