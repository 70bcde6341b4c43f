//! Round trips between the v1alpha3 resources and the v1alpha4 hub

use std::collections::BTreeMap;

use bootstrap_ignition::api::meta::{
    Condition, ConditionSeverity, ConditionStatus, IntOrString, ListMeta, ObjectMeta,
    ObjectReference,
};
use bootstrap_ignition::api::{v1alpha3, v1alpha4};
use bootstrap_ignition::conversion::{Convertible, DATA_ANNOTATION};
use pretty_assertions::assert_eq;
use serde_json::json;

fn metadata(name: &str) -> ObjectMeta {
    ObjectMeta {
        name: name.into(),
        namespace: "default".into(),
        uid: "5b1e1c4e-0f3c-4c55-9d6e-6b8b8f0c1a2d".into(),
        resource_version: "4242".into(),
        generation: 3,
        labels: BTreeMap::from([(
            "cluster.x-k8s.io/cluster-name".to_string(),
            "prod".to_string(),
        )]),
        annotations: BTreeMap::from([("team".to_string(), "platform".to_string())]),
    }
}

fn hub_spec(variant: usize) -> v1alpha4::KubeadmConfigSpec {
    let mut spec = v1alpha4::KubeadmConfigSpec {
        cluster_configuration: Some(json!({"kind": "ClusterConfiguration", "clusterName": "prod"})),
        join_configuration: Some(json!({"kind": "JoinConfiguration"})),
        files: vec![
            v1alpha4::File {
                path: "/etc/motd".into(),
                owner: "root:root".into(),
                permissions: "0644".into(),
                content: "hello".into(),
                ..Default::default()
            },
            v1alpha4::File {
                path: "/etc/token".into(),
                content_from: Some(v1alpha4::FileSource {
                    secret: v1alpha4::SecretFileSource {
                        name: "bootstrap-token".into(),
                        key: "token".into(),
                    },
                }),
                encoding: Some(v1alpha4::Encoding::Base64),
                ..Default::default()
            },
        ],
        pre_kubeadm_commands: vec!["modprobe overlay".into()],
        post_kubeadm_commands: vec!["touch /run/done".into()],
        verbosity: Some(4),
        ..Default::default()
    };

    match variant {
        0 => {
            spec.format = v1alpha4::Format::Ignition;
            spec.ignition = Some(v1alpha4::IgnitionSpec {
                container_linux_config: Some(v1alpha4::ContainerLinuxConfig {
                    additional_config: "systemd:\n  units:\n  - name: extra.service\n".into(),
                    strict: true,
                }),
            });
        }
        1 => {
            spec.users = vec![v1alpha4::User {
                name: "core".into(),
                sudo: Some("ALL=(ALL) NOPASSWD:ALL".into()),
                ssh_authorized_keys: vec!["ssh-ed25519 AAAA core".into()],
                ..Default::default()
            }];
            spec.ntp = Some(v1alpha4::Ntp {
                servers: vec!["time.example.com".into()],
                enabled: Some(true),
            });
            spec.mounts = vec![vec!["/dev/sdb1".into(), "/var/lib/etcd".into()]];
            spec.disk_setup = Some(v1alpha4::DiskSetup {
                partitions: vec![v1alpha4::Partition {
                    device: "/dev/sdb".into(),
                    layout: true,
                    ..Default::default()
                }],
                filesystems: vec![v1alpha4::Filesystem {
                    device: "/dev/sdb1".into(),
                    filesystem: "ext4".into(),
                    label: "etcd".into(),
                    ..Default::default()
                }],
            });
            spec.use_experimental_retry_join = true;
        }
        _ => {
            spec.format = v1alpha4::Format::Ignition;
            spec.ignition = Some(v1alpha4::IgnitionSpec::default());
        }
    }
    spec
}

fn condition() -> Condition {
    Condition {
        kind: "Ready".into(),
        status: ConditionStatus::True,
        severity: ConditionSeverity::None,
        last_transition_time: Some("2021-06-01T12:00:00Z".into()),
        ..Default::default()
    }
}

fn hub_config(variant: usize) -> v1alpha4::KubeadmConfig {
    v1alpha4::KubeadmConfig {
        metadata: metadata("worker-0"),
        spec: hub_spec(variant),
        status: v1alpha4::KubeadmConfigStatus {
            ready: true,
            data_secret_name: Some("worker-0-bootstrap".into()),
            observed_generation: 3,
            conditions: vec![condition()],
            render_warnings: Some("warning at line 1, column 1\nfoo\n".into()),
            ..Default::default()
        },
    }
}

fn hub_control_plane(variant: usize) -> v1alpha4::KubeadmControlPlane {
    v1alpha4::KubeadmControlPlane {
        metadata: metadata("prod-cp"),
        spec: v1alpha4::KubeadmControlPlaneSpec {
            replicas: Some(3),
            version: "v1.21.2".into(),
            machine_template: v1alpha4::KubeadmControlPlaneMachineTemplate {
                infrastructure_ref: ObjectReference {
                    api_version: "infrastructure.cluster.x-k8s.io/v1alpha4".into(),
                    kind: "AWSMachineTemplate".into(),
                    name: "prod-cp".into(),
                    ..Default::default()
                },
                node_drain_timeout: Some("5m".into()),
            },
            kubeadm_config_spec: hub_spec(variant),
            rollout_after: Some("2021-07-01T00:00:00Z".into()),
            rollout_strategy: Some(v1alpha4::RolloutStrategy {
                rolling_update: Some(v1alpha4::RollingUpdate {
                    max_surge: Some(IntOrString::Int(1)),
                }),
                ..Default::default()
            }),
        },
        status: v1alpha4::KubeadmControlPlaneStatus {
            selector: "cluster.x-k8s.io/cluster-name=prod".into(),
            replicas: 3,
            version: Some("v1.21.2".into()),
            ready_replicas: 3,
            updated_replicas: 3,
            initialized: true,
            ready: true,
            observed_generation: 3,
            conditions: vec![condition()],
            ..Default::default()
        },
    }
}

#[test]
fn test_kubeadm_config_round_trip_fidelity() {
    assert_eq!(
        v1alpha3::KUBEADM_CONFIG_SNAPSHOT.excluded(),
        &["/metadata", "/status/renderWarnings"]
    );

    for variant in 0..3 {
        let original = hub_config(variant);
        let older = v1alpha3::KubeadmConfig::convert_from(&original).expect("down");
        let restored = older.convert_to();

        // Non-restorable: render warnings have no home in v1alpha3
        assert_eq!(restored.status.render_warnings, None);

        let mut expected = original.clone();
        expected.status.render_warnings = None;
        assert_eq!(restored, expected, "variant {}", variant);
    }
}

#[test]
fn test_template_round_trip_fidelity() {
    assert_eq!(v1alpha3::TEMPLATE_SNAPSHOT.excluded(), &["/metadata"]);

    for variant in 0..3 {
        let original = v1alpha4::KubeadmConfigTemplate {
            metadata: metadata("workers"),
            spec: v1alpha4::KubeadmConfigTemplateSpec {
                template: v1alpha4::KubeadmConfigTemplateResource {
                    spec: hub_spec(variant),
                },
            },
        };
        let older = v1alpha3::KubeadmConfigTemplate::convert_from(&original).expect("down");
        assert_eq!(older.convert_to(), original, "variant {}", variant);
    }
}

#[test]
fn test_control_plane_round_trip_fidelity() {
    assert_eq!(
        v1alpha3::CONTROL_PLANE_SNAPSHOT.excluded(),
        &["/metadata", "/status/version"]
    );

    for variant in 0..3 {
        let original = hub_control_plane(variant);
        let older = v1alpha3::KubeadmControlPlane::convert_from(&original).expect("down");
        let restored = older.convert_to();

        assert_eq!(restored.status.version, None);

        let mut expected = original.clone();
        expected.status.version = None;
        assert_eq!(restored, expected, "variant {}", variant);
    }
}

#[test]
fn test_older_round_trip_only_adds_snapshot() {
    let older = v1alpha3::KubeadmConfig {
        metadata: metadata("worker-1"),
        spec: v1alpha3::KubeadmConfigSpec {
            files: hub_spec(1).files,
            users: hub_spec(1).users,
            pre_kubeadm_commands: vec!["echo hi".into()],
            ..Default::default()
        },
        status: v1alpha3::KubeadmConfigStatus {
            ready: true,
            data_secret_name: Some("worker-1-bootstrap".into()),
            ..Default::default()
        },
    };

    let hub = older.convert_to();
    let mut back = v1alpha3::KubeadmConfig::convert_from(&hub).expect("down");
    assert!(back.metadata.annotations.remove(DATA_ANNOTATION).is_some());
    assert_eq!(back, older);
}

#[test]
fn test_missing_snapshot_maps_structurally() {
    let older = v1alpha3::KubeadmConfig {
        metadata: metadata("worker-2"),
        spec: v1alpha3::KubeadmConfigSpec {
            pre_kubeadm_commands: vec!["echo hi".into()],
            verbosity: Some(2),
            ..Default::default()
        },
        status: v1alpha3::KubeadmConfigStatus {
            ready: true,
            bootstrap_data: Some("I2Nsb3VkLWNvbmZpZw==".into()),
            ..Default::default()
        },
    };

    let hub = older.convert_to();
    assert_eq!(hub.metadata, older.metadata);
    assert_eq!(hub.spec.format, v1alpha4::Format::CloudConfig);
    assert_eq!(hub.spec.ignition, None);
    assert_eq!(hub.spec.pre_kubeadm_commands, vec!["echo hi"]);
    assert_eq!(hub.spec.verbosity, Some(2));
    assert!(hub.status.ready);
    assert_eq!(hub.status.render_warnings, None);

    let control_plane = v1alpha3::KubeadmControlPlane {
        spec: v1alpha3::KubeadmControlPlaneSpec {
            version: "v1.20.7".into(),
            upgrade_after: Some("2021-05-01T00:00:00Z".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    let hub = control_plane.convert_to();
    assert_eq!(hub.spec.rollout_after.as_deref(), Some("2021-05-01T00:00:00Z"));
    assert_eq!(hub.spec.rollout_strategy, None);
}

#[test]
fn test_malformed_snapshot_is_ignored() {
    let mut older = v1alpha3::KubeadmConfig::convert_from(&hub_config(0)).expect("down");
    older
        .metadata
        .annotations
        .insert(DATA_ANNOTATION.into(), "{\"spec\": [".into());

    let hub = older.convert_to();
    assert_eq!(hub.spec.ignition, None);
    assert_eq!(hub.spec.format, v1alpha4::Format::CloudConfig);
    assert!(!hub.metadata.annotations.contains_key(DATA_ANNOTATION));
    assert_eq!(hub.metadata.annotations.get("team").map(String::as_str), Some("platform"));
}

#[test]
fn test_lists_convert_element_wise() {
    let list = v1alpha4::KubeadmControlPlaneList {
        metadata: ListMeta {
            resource_version: "77".into(),
            ..Default::default()
        },
        items: vec![hub_control_plane(0), hub_control_plane(1)],
    };

    let older = v1alpha3::KubeadmControlPlaneList::convert_from(&list).expect("down");
    assert_eq!(older.metadata.resource_version, "77");
    assert_eq!(older.items.len(), 2);
    assert!(older
        .items
        .iter()
        .all(|item| !item.metadata.annotations.contains_key(DATA_ANNOTATION)));
    assert_eq!(older.items[1].spec.infrastructure_template.kind, "AWSMachineTemplate");

    let back = older.convert_to();
    assert_eq!(back.items[0].spec.kubeadm_config_spec.ignition, None);
    assert_eq!(back.items[1].spec.kubeadm_config_spec, hub_spec(1));
}

#[test]
fn test_snapshot_is_json_in_annotation() {
    let older = v1alpha3::KubeadmConfig::convert_from(&hub_config(0)).expect("down");
    let data: serde_json::Value =
        serde_json::from_str(&older.metadata.annotations[DATA_ANNOTATION]).expect("json");
    assert_eq!(data["spec"]["format"], "ignition");
    assert_eq!(
        data["spec"]["ignition"]["containerLinuxConfig"]["strict"],
        true
    );
    assert!(data.get("metadata").is_none());
}
