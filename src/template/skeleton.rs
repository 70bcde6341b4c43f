//! Template sources for the rendered Container Linux Config
//!
//! Every line emitted from a loop starts with its own newline and each tag
//! trims the whitespace before it, so the output has no stray blank lines.

use super::config::Skeleton;
use crate::descriptor::BootstrapDescriptor;

pub const FILES: &str = r#"
{%- for file in files %}
  - path: {{ file.path | yaml_quote }}
{%- if file.mode %}
    mode: {{ file.mode }}
{%- endif %}
{%- if file.user %}
    user:
      name: {{ file.user | yaml_quote }}
{%- endif %}
{%- if file.group %}
    group:
      name: {{ file.group | yaml_quote }}
{%- endif %}
    contents:
{%- if file.remote %}
      remote:
        url: {{ file.remote | yaml_quote }}
{%- if file.compression %}
        compression: {{ file.compression }}
{%- endif %}
{%- else %}
      inline: |{{ indicator }}
{{ file.content | yaml_indent(width=indent) }}
{%- endif %}
{%- endfor %}"#;

pub const USERS: &str = r#"
{%- if users %}
passwd:
  users:
{%- for user in users %}
  - name: {{ user.name | yaml_quote }}
{%- if user.password_hash %}
    password_hash: {{ user.password_hash | yaml_quote }}
{%- endif %}
{%- if user.ssh_authorized_keys %}
    ssh_authorized_keys:
{%- for key in user.ssh_authorized_keys %}
    - {{ key | yaml_quote }}
{%- endfor %}
{%- endif %}
{%- if user.groups %}
    groups:
{%- for group in user.groups %}
    - {{ group | yaml_quote }}
{%- endfor %}
{%- endif %}
{%- if user.home_dir %}
    home_dir: {{ user.home_dir | yaml_quote }}
{%- endif %}
{%- if user.shell %}
    shell: {{ user.shell | yaml_quote }}
{%- endif %}
{%- endfor %}
{%- endif %}"#;

pub const MINIMAL: &str = r#"---
systemd:
  units:
  - name: kubeadm.service
    enabled: true
    contents: |
      [Unit]
      Description=kubeadm
      [Service]
      # Oneshot, so the unit is not restarted when kubeadm exits
      Type=oneshot
      ExecStart=/etc/kubeadm.sh
      [Install]
      WantedBy=multi-user.target
storage:
  files:
{%- include "files.clc" %}
{%- include "users.clc" %}
"#;

pub const COREOS_METADATA: &str = r#"---
systemd:
  units:
  - name: coreos-metadata.service
    enabled: true
    dropins:
    - name: 00-fix-enable.conf
      contents: |
        [Service]
        RemainAfterExit=true
        [Install]
        WantedBy=multi-user.target
  - name: kubeadm.service
    enabled: true
    contents: |
      [Unit]
      Description=kubeadm
      Requires=coreos-metadata.service
      After=coreos-metadata.service
      [Service]
      Type=oneshot
      RemainAfterExit=true
      Environment=PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/opt/bin
      EnvironmentFile=/run/metadata/*
      ExecStart=/etc/kubeadm.sh
      [Install]
      WantedBy=multi-user.target
storage:
  links:
  - path: /etc/systemd/system/multi-user.target.wants/coreos-metadata.service
    target: /usr/lib/systemd/system/coreos-metadata.service
  - path: /etc/systemd/system/multi-user.target.wants/kubeadm.service
    target: /etc/systemd/system/kubeadm.service
  files:
{%- include "files.clc" %}
{%- include "users.clc" %}
"#;

impl Skeleton {
    /// Name the skeleton is registered under
    pub fn template_name(self) -> &'static str {
        match self {
            Skeleton::Minimal => "minimal.clc",
            Skeleton::CoreosMetadata => "coreos-metadata.clc",
        }
    }

    /// Contents of `/etc/kubeadm.sh`
    pub fn kubeadm_script(self, descriptor: &BootstrapDescriptor) -> String {
        let mut lines: Vec<String> = vec!["#!/bin/bash".into(), "set -e".into()];
        lines.extend(descriptor.pre_kubeadm_commands.iter().cloned());

        match self {
            Skeleton::Minimal => {
                lines.push(descriptor.kubeadm_command("/etc/kubeadm.yml"));
                lines.push("mv /etc/kubeadm.yml /tmp/".into());
            }
            Skeleton::CoreosMetadata => {
                lines.push("cat /etc/kubeadm.yml.tmpl | envsubst > /etc/kubeadm.yml".into());
                lines.push(descriptor.kubeadm_command("/etc/kubeadm.yml"));
                lines.push("rm /etc/kubeadm.yml /etc/kubeadm.yml.tmpl".into());
            }
        }

        lines.extend(descriptor.post_kubeadm_commands.iter().cloned());
        lines.join("\n")
    }
}
