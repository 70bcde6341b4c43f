//! Field correspondence between this generation and the hub
//!
//! The `From` impls are the structural mapping and never touch the snapshot.
//! `Convertible` layers the snapshot on top for single objects; lists only
//! use the structural mapping.

use super::bootstrap::*;
use super::controlplane::*;
use crate::api::v1alpha4 as hub;
use crate::conversion::{
    marshal_data, unmarshal_data, ConversionError, Convertible, SnapshotPolicy,
};

pub const KUBEADM_CONFIG_SNAPSHOT: SnapshotPolicy =
    SnapshotPolicy::excluding(&["/metadata", "/status/renderWarnings"]);

pub const TEMPLATE_SNAPSHOT: SnapshotPolicy = SnapshotPolicy::excluding(&["/metadata"]);

/// Observed status is recomputed by the controller and never restored
pub const CONTROL_PLANE_SNAPSHOT: SnapshotPolicy =
    SnapshotPolicy::excluding(&["/metadata", "/status/version"]);

impl From<Format> for hub::Format {
    fn from(format: Format) -> Self {
        match format {
            Format::CloudConfig => hub::Format::CloudConfig,
        }
    }
}

impl From<hub::Format> for Format {
    fn from(format: hub::Format) -> Self {
        match format {
            hub::Format::CloudConfig | hub::Format::Ignition => Format::CloudConfig,
        }
    }
}

impl From<&KubeadmConfigSpec> for hub::KubeadmConfigSpec {
    fn from(src: &KubeadmConfigSpec) -> Self {
        Self {
            cluster_configuration: src.cluster_configuration.clone(),
            init_configuration: src.init_configuration.clone(),
            join_configuration: src.join_configuration.clone(),
            files: src.files.clone(),
            disk_setup: src.disk_setup.clone(),
            mounts: src.mounts.clone(),
            pre_kubeadm_commands: src.pre_kubeadm_commands.clone(),
            post_kubeadm_commands: src.post_kubeadm_commands.clone(),
            users: src.users.clone(),
            ntp: src.ntp.clone(),
            format: src.format.into(),
            verbosity: src.verbosity,
            use_experimental_retry_join: src.use_experimental_retry_join,
            ignition: None,
        }
    }
}

impl From<&hub::KubeadmConfigSpec> for KubeadmConfigSpec {
    fn from(src: &hub::KubeadmConfigSpec) -> Self {
        Self {
            cluster_configuration: src.cluster_configuration.clone(),
            init_configuration: src.init_configuration.clone(),
            join_configuration: src.join_configuration.clone(),
            files: src.files.clone(),
            disk_setup: src.disk_setup.clone(),
            mounts: src.mounts.clone(),
            pre_kubeadm_commands: src.pre_kubeadm_commands.clone(),
            post_kubeadm_commands: src.post_kubeadm_commands.clone(),
            users: src.users.clone(),
            ntp: src.ntp.clone(),
            format: src.format.into(),
            verbosity: src.verbosity,
            use_experimental_retry_join: src.use_experimental_retry_join,
        }
    }
}

/// Put back the hub-only parts of a bootstrap spec
fn restore_spec(dest: &mut hub::KubeadmConfigSpec, restored: hub::KubeadmConfigSpec) {
    dest.format = restored.format;
    dest.ignition = restored.ignition;
}

impl From<&KubeadmConfigStatus> for hub::KubeadmConfigStatus {
    fn from(src: &KubeadmConfigStatus) -> Self {
        Self {
            ready: src.ready,
            data_secret_name: src.data_secret_name.clone(),
            failure_reason: src.failure_reason.clone(),
            failure_message: src.failure_message.clone(),
            observed_generation: src.observed_generation,
            conditions: src.conditions.clone(),
            render_warnings: None,
        }
    }
}

impl From<&hub::KubeadmConfigStatus> for KubeadmConfigStatus {
    fn from(src: &hub::KubeadmConfigStatus) -> Self {
        Self {
            ready: src.ready,
            data_secret_name: src.data_secret_name.clone(),
            bootstrap_data: None,
            failure_reason: src.failure_reason.clone(),
            failure_message: src.failure_message.clone(),
            observed_generation: src.observed_generation,
            conditions: src.conditions.clone(),
        }
    }
}

impl From<&KubeadmConfig> for hub::KubeadmConfig {
    fn from(src: &KubeadmConfig) -> Self {
        Self {
            metadata: src.metadata.clone(),
            spec: (&src.spec).into(),
            status: (&src.status).into(),
        }
    }
}

impl From<&hub::KubeadmConfig> for KubeadmConfig {
    fn from(src: &hub::KubeadmConfig) -> Self {
        Self {
            metadata: src.metadata.clone(),
            spec: (&src.spec).into(),
            status: (&src.status).into(),
        }
    }
}

impl Convertible<hub::KubeadmConfig> for KubeadmConfig {
    fn convert_to(&self) -> hub::KubeadmConfig {
        let mut dest = hub::KubeadmConfig::from(self);
        if let Some(restored) = unmarshal_data::<hub::KubeadmConfig, _>(&mut dest.metadata) {
            restore_spec(&mut dest.spec, restored.spec);
        }
        dest
    }

    fn convert_from(src: &hub::KubeadmConfig) -> Result<Self, ConversionError> {
        let mut dest = Self::from(src);
        marshal_data(src, &KUBEADM_CONFIG_SNAPSHOT, &mut dest.metadata)?;
        Ok(dest)
    }
}

impl From<&KubeadmConfigTemplate> for hub::KubeadmConfigTemplate {
    fn from(src: &KubeadmConfigTemplate) -> Self {
        Self {
            metadata: src.metadata.clone(),
            spec: hub::KubeadmConfigTemplateSpec {
                template: hub::KubeadmConfigTemplateResource {
                    spec: (&src.spec.template.spec).into(),
                },
            },
        }
    }
}

impl From<&hub::KubeadmConfigTemplate> for KubeadmConfigTemplate {
    fn from(src: &hub::KubeadmConfigTemplate) -> Self {
        Self {
            metadata: src.metadata.clone(),
            spec: KubeadmConfigTemplateSpec {
                template: KubeadmConfigTemplateResource {
                    spec: (&src.spec.template.spec).into(),
                },
            },
        }
    }
}

impl Convertible<hub::KubeadmConfigTemplate> for KubeadmConfigTemplate {
    fn convert_to(&self) -> hub::KubeadmConfigTemplate {
        let mut dest = hub::KubeadmConfigTemplate::from(self);
        if let Some(restored) =
            unmarshal_data::<hub::KubeadmConfigTemplate, _>(&mut dest.metadata)
        {
            restore_spec(&mut dest.spec.template.spec, restored.spec.template.spec);
        }
        dest
    }

    fn convert_from(src: &hub::KubeadmConfigTemplate) -> Result<Self, ConversionError> {
        let mut dest = Self::from(src);
        marshal_data(src, &TEMPLATE_SNAPSHOT, &mut dest.metadata)?;
        Ok(dest)
    }
}

impl From<&KubeadmControlPlaneSpec> for hub::KubeadmControlPlaneSpec {
    fn from(src: &KubeadmControlPlaneSpec) -> Self {
        Self {
            replicas: src.replicas,
            version: src.version.clone(),
            machine_template: hub::KubeadmControlPlaneMachineTemplate {
                infrastructure_ref: src.infrastructure_template.clone(),
                node_drain_timeout: src.node_drain_timeout.clone(),
            },
            kubeadm_config_spec: (&src.kubeadm_config_spec).into(),
            rollout_after: src.upgrade_after.clone(),
            rollout_strategy: None,
        }
    }
}

impl From<&hub::KubeadmControlPlaneSpec> for KubeadmControlPlaneSpec {
    fn from(src: &hub::KubeadmControlPlaneSpec) -> Self {
        Self {
            replicas: src.replicas,
            version: src.version.clone(),
            infrastructure_template: src.machine_template.infrastructure_ref.clone(),
            kubeadm_config_spec: (&src.kubeadm_config_spec).into(),
            upgrade_after: src.rollout_after.clone(),
            node_drain_timeout: src.machine_template.node_drain_timeout.clone(),
        }
    }
}

impl From<&KubeadmControlPlaneStatus> for hub::KubeadmControlPlaneStatus {
    fn from(src: &KubeadmControlPlaneStatus) -> Self {
        Self {
            selector: src.selector.clone(),
            replicas: src.replicas,
            version: None,
            updated_replicas: src.updated_replicas,
            ready_replicas: src.ready_replicas,
            unavailable_replicas: src.unavailable_replicas,
            initialized: src.initialized,
            ready: src.ready,
            failure_reason: src.failure_reason.clone(),
            failure_message: src.failure_message.clone(),
            observed_generation: src.observed_generation,
            conditions: src.conditions.clone(),
        }
    }
}

impl From<&hub::KubeadmControlPlaneStatus> for KubeadmControlPlaneStatus {
    fn from(src: &hub::KubeadmControlPlaneStatus) -> Self {
        Self {
            selector: src.selector.clone(),
            replicas: src.replicas,
            updated_replicas: src.updated_replicas,
            ready_replicas: src.ready_replicas,
            unavailable_replicas: src.unavailable_replicas,
            initialized: src.initialized,
            ready: src.ready,
            failure_reason: src.failure_reason.clone(),
            failure_message: src.failure_message.clone(),
            observed_generation: src.observed_generation,
            conditions: src.conditions.clone(),
        }
    }
}

impl From<&KubeadmControlPlane> for hub::KubeadmControlPlane {
    fn from(src: &KubeadmControlPlane) -> Self {
        Self {
            metadata: src.metadata.clone(),
            spec: (&src.spec).into(),
            status: (&src.status).into(),
        }
    }
}

impl From<&hub::KubeadmControlPlane> for KubeadmControlPlane {
    fn from(src: &hub::KubeadmControlPlane) -> Self {
        Self {
            metadata: src.metadata.clone(),
            spec: (&src.spec).into(),
            status: (&src.status).into(),
        }
    }
}

impl Convertible<hub::KubeadmControlPlane> for KubeadmControlPlane {
    fn convert_to(&self) -> hub::KubeadmControlPlane {
        let mut dest = hub::KubeadmControlPlane::from(self);
        if let Some(restored) = unmarshal_data::<hub::KubeadmControlPlane, _>(&mut dest.metadata)
        {
            restore_spec(
                &mut dest.spec.kubeadm_config_spec,
                restored.spec.kubeadm_config_spec,
            );
            dest.spec.rollout_strategy = restored.spec.rollout_strategy;
        }
        dest
    }

    fn convert_from(src: &hub::KubeadmControlPlane) -> Result<Self, ConversionError> {
        let mut dest = Self::from(src);
        marshal_data(src, &CONTROL_PLANE_SNAPSHOT, &mut dest.metadata)?;
        Ok(dest)
    }
}

/// Lists map element by element through the structural conversion
macro_rules! list_conversion {
    ($list:ident, $item:ident) => {
        impl From<&$list> for hub::$list {
            fn from(src: &$list) -> Self {
                Self {
                    metadata: src.metadata.clone(),
                    items: src.items.iter().map(hub::$item::from).collect(),
                }
            }
        }

        impl From<&hub::$list> for $list {
            fn from(src: &hub::$list) -> Self {
                Self {
                    metadata: src.metadata.clone(),
                    items: src.items.iter().map($item::from).collect(),
                }
            }
        }

        impl Convertible<hub::$list> for $list {
            fn convert_to(&self) -> hub::$list {
                hub::$list::from(self)
            }

            fn convert_from(src: &hub::$list) -> Result<Self, ConversionError> {
                Ok(Self::from(src))
            }
        }
    };
}

list_conversion!(KubeadmConfigList, KubeadmConfig);
list_conversion!(KubeadmConfigTemplateList, KubeadmConfigTemplate);
list_conversion!(KubeadmControlPlaneList, KubeadmControlPlane);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::DATA_ANNOTATION;
    use pretty_assertions::assert_eq;

    fn ignition_spec() -> hub::KubeadmConfigSpec {
        hub::KubeadmConfigSpec {
            format: hub::Format::Ignition,
            ignition: Some(hub::IgnitionSpec {
                container_linux_config: Some(hub::ContainerLinuxConfig {
                    additional_config: "storage: {}\n".into(),
                    strict: true,
                }),
            }),
            pre_kubeadm_commands: vec!["echo pre".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_ignition_format_flattens_to_cloud_config() {
        let spoke = KubeadmConfigSpec::from(&ignition_spec());
        assert_eq!(spoke.format, Format::CloudConfig);
        assert_eq!(spoke.pre_kubeadm_commands, vec!["echo pre"]);
    }

    #[test]
    fn test_structural_up_conversion_has_no_ignition() {
        let spoke = KubeadmConfigSpec::from(&ignition_spec());
        let up = hub::KubeadmConfigSpec::from(&spoke);
        assert_eq!(up.format, hub::Format::CloudConfig);
        assert!(up.ignition.is_none());
    }

    #[test]
    fn test_snapshot_restores_ignition() {
        let original = hub::KubeadmConfig {
            spec: ignition_spec(),
            ..Default::default()
        };
        let spoke = KubeadmConfig::convert_from(&original).expect("down");
        assert!(spoke.metadata.annotations.contains_key(DATA_ANNOTATION));

        let restored = spoke.convert_to();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_bootstrap_data_dropped_on_up() {
        let spoke = KubeadmConfig {
            status: KubeadmConfigStatus {
                ready: true,
                bootstrap_data: Some("I2Nsb3VkLWNvbmZpZwo=".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let up = spoke.convert_to();
        assert!(up.status.ready);
        assert_eq!(KubeadmConfig::from(&up).status.bootstrap_data, None);
    }

    #[test]
    fn test_control_plane_fields_move() {
        let original = hub::KubeadmControlPlane {
            spec: hub::KubeadmControlPlaneSpec {
                version: "v1.21.2".into(),
                machine_template: hub::KubeadmControlPlaneMachineTemplate {
                    infrastructure_ref: crate::api::meta::ObjectReference {
                        kind: "DockerMachineTemplate".into(),
                        name: "cp".into(),
                        ..Default::default()
                    },
                    node_drain_timeout: Some("10m".into()),
                },
                rollout_after: Some("2021-06-01T00:00:00Z".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let spoke = KubeadmControlPlane::from(&original);
        assert_eq!(spoke.spec.infrastructure_template.name, "cp");
        assert_eq!(spoke.spec.node_drain_timeout.as_deref(), Some("10m"));
        assert_eq!(spoke.spec.upgrade_after.as_deref(), Some("2021-06-01T00:00:00Z"));
        assert_eq!(hub::KubeadmControlPlane::from(&spoke), original);
    }

    #[test]
    fn test_list_items_carry_no_snapshot() {
        let list = hub::KubeadmConfigList {
            items: vec![hub::KubeadmConfig {
                spec: ignition_spec(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let spoke = KubeadmConfigList::convert_from(&list).expect("down");
        assert!(spoke.items[0].metadata.annotations.is_empty());
        assert!(spoke.convert_to().items[0].spec.ignition.is_none());
    }
}
