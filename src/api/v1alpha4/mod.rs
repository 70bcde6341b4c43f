//! Newest resource generation, the conversion hub

mod bootstrap;
mod controlplane;
mod validation;

pub use bootstrap::*;
pub use controlplane::*;
pub use validation::{FieldError, ValidationError};

use crate::conversion::Hub;

impl Hub for KubeadmConfig {}
impl Hub for KubeadmConfigList {}
impl Hub for KubeadmConfigTemplate {}
impl Hub for KubeadmConfigTemplateList {}
impl Hub for KubeadmControlPlane {}
impl Hub for KubeadmControlPlaneList {}
