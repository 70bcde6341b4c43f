//! Versioned kubeadm bootstrap and control plane resources

pub mod meta;
pub mod v1alpha3;
pub mod v1alpha4;
