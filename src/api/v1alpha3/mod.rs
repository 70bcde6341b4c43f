//! Older resource generation, converted through [`crate::api::v1alpha4`]

mod bootstrap;
mod controlplane;
mod conversion;

pub use bootstrap::*;
pub use controlplane::*;
pub use conversion::{CONTROL_PLANE_SNAPSHOT, KUBEADM_CONFIG_SNAPSHOT, TEMPLATE_SNAPSHOT};
