//! Kubeadm control plane resources

use serde::{Deserialize, Serialize};

use super::bootstrap::KubeadmConfigSpec;
use crate::api::meta::{Condition, IntOrString, ListMeta, ObjectMeta, ObjectReference};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmControlPlaneMachineTemplate {
    pub infrastructure_ref: ObjectReference,
    /// Go duration string, e.g. `10m`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_drain_timeout: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RolloutStrategyType {
    #[default]
    RollingUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RollingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_surge: Option<IntOrString>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RolloutStrategy {
    #[serde(rename = "type")]
    pub kind: RolloutStrategyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolling_update: Option<RollingUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmControlPlaneSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    pub version: String,
    pub machine_template: KubeadmControlPlaneMachineTemplate,
    pub kubeadm_config_spec: KubeadmConfigSpec,
    /// RFC 3339 timestamp after which machines are rolled out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollout_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollout_strategy: Option<RolloutStrategy>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeadmControlPlaneStatus {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub selector: String,
    pub replicas: i32,
    /// Lowest Kubernetes version among the owned machines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
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
