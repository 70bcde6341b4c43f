//! Hub-and-spoke conversion between resource generations
//!
//! Every older generation converts to and from the hub only. Hub fields with
//! no home in an older generation survive a down-and-up trip through a
//! snapshot of the hub object, stored under [`DATA_ANNOTATION`] on the
//! down-converted object.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::api::meta::ObjectMeta;

/// Annotation carrying the serialized hub snapshot
pub const DATA_ANNOTATION: &str = "cluster.x-k8s.io/conversion-data";

/// Marker for the generation every other one converts through
pub trait Hub: Serialize + DeserializeOwned {}

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("failed to encode conversion snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// An older generation that converts through hub `H`
pub trait Convertible<H: Hub>: Sized {
    /// Convert up to the hub, restoring hub-only fields from the snapshot
    fn convert_to(&self) -> H;

    /// Convert down from the hub, recording a snapshot of `hub` on the result
    fn convert_from(hub: &H) -> Result<Self, ConversionError>;
}

/// Side-channel storage attached to a converted object
pub trait SnapshotStore {
    fn snapshot(&self, key: &str) -> Option<&str>;
    fn set_snapshot(&mut self, key: &str, data: String);
    fn remove_snapshot(&mut self, key: &str);
}

impl SnapshotStore for BTreeMap<String, String> {
    fn snapshot(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }

    fn set_snapshot(&mut self, key: &str, data: String) {
        self.insert(key.to_string(), data);
    }

    fn remove_snapshot(&mut self, key: &str) {
        self.remove(key);
    }
}

impl SnapshotStore for ObjectMeta {
    fn snapshot(&self, key: &str) -> Option<&str> {
        self.annotations.snapshot(key)
    }

    fn set_snapshot(&mut self, key: &str, data: String) {
        self.annotations.set_snapshot(key, data);
    }

    fn remove_snapshot(&mut self, key: &str) {
        self.annotations.remove_snapshot(key);
    }
}

/// JSON pointers left out of a kind's snapshot
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPolicy {
    excluded: &'static [&'static str],
}

impl SnapshotPolicy {
    pub const fn excluding(excluded: &'static [&'static str]) -> Self {
        Self { excluded }
    }

    pub fn excluded(&self) -> &'static [&'static str] {
        self.excluded
    }

    fn strip(&self, value: &mut Value) {
        for pointer in self.excluded {
            remove_pointer(value, pointer);
        }
    }
}

fn remove_pointer(value: &mut Value, pointer: &str) -> Option<Value> {
    let (parent, last) = pointer.rsplit_once('/')?;
    let parent = if parent.is_empty() {
        value
    } else {
        value.pointer_mut(parent)?
    };
    let key = last.replace("~1", "/").replace("~0", "~");
    parent.as_object_mut()?.remove(&key)
}

/// Serialize `hub` minus the policy's exclusions into `store`
pub fn marshal_data<H, S>(
    hub: &H,
    policy: &SnapshotPolicy,
    store: &mut S,
) -> Result<(), ConversionError>
where
    H: Hub,
    S: SnapshotStore,
{
    let mut value = serde_json::to_value(hub)?;
    policy.strip(&mut value);
    store.set_snapshot(DATA_ANNOTATION, serde_json::to_string(&value)?);
    Ok(())
}

/// Take the snapshot out of `store` and decode it
///
/// The snapshot is removed whether or not it decodes. A malformed snapshot is
/// logged and treated as absent.
pub fn unmarshal_data<H, S>(store: &mut S) -> Option<H>
where
    H: Hub,
    S: SnapshotStore,
{
    let data = store.snapshot(DATA_ANNOTATION)?.to_string();
    store.remove_snapshot(DATA_ANNOTATION);
    match serde_json::from_str(&data) {
        Ok(hub) => Some(hub),
        Err(err) => {
            tracing::warn!(error = %err, "ignoring malformed conversion snapshot");
            None
        }
    }
}
