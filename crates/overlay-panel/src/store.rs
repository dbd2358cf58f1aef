//! Layer store seam.
//!
//! The store is owned by the surrounding application and injected into
//! the panel; the dispatcher is the only code path that mutates it, so
//! every mutation is followed by exactly one refresh broadcast.

use overlay_common::{Layer, StoreError};
use std::sync::{Arc, Mutex};

/// The mutable ordered collection of layers the panel edits.
///
/// `add`/`remove`/`modify` receive the positional arguments carried in
/// the inbound message's `args` field, verbatim.
pub trait LayerStore: Send {
    /// Current layers, in insertion order.
    fn layers(&self) -> Vec<Layer>;

    /// Append a layer. `args[0]` is the layer value.
    fn add(&mut self, args: &[serde_json::Value]) -> Result<(), StoreError>;

    /// Drop a layer. `args[0]` is the layer id.
    fn remove(&mut self, args: &[serde_json::Value]) -> Result<(), StoreError>;

    /// Patch a layer. `args[0]` is the layer id, `args[1]` the patch object.
    fn modify(&mut self, args: &[serde_json::Value]) -> Result<(), StoreError>;
}

/// Store handle shared between the application and the dispatcher. The
/// dispatcher is the single writer; the mutex only satisfies the
/// compiler about cross-task access.
pub type SharedStore = Arc<Mutex<dyn LayerStore>>;

/// Wrap a store implementation into a [`SharedStore`].
pub fn shared<S: LayerStore + 'static>(store: S) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// In-memory reference store backing the demo app and tests.
#[derive(Debug, Default)]
pub struct MemoryLayerStore {
    layers: Vec<Layer>,
}

impl MemoryLayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl LayerStore for MemoryLayerStore {
    fn layers(&self) -> Vec<Layer> {
        self.layers.clone()
    }

    fn add(&mut self, args: &[serde_json::Value]) -> Result<(), StoreError> {
        let value = args
            .first()
            .ok_or(StoreError::MissingArgument("layer"))?;
        if !value.is_object() {
            return Err(StoreError::InvalidArgument(format!(
                "layer must be an object, got {value}"
            )));
        }
        self.layers.push(Layer::new(value.clone()));
        Ok(())
    }

    fn remove(&mut self, args: &[serde_json::Value]) -> Result<(), StoreError> {
        let id = args.first().ok_or(StoreError::MissingArgument("id"))?;
        let before = self.layers.len();
        self.layers.retain(|layer| layer.id() != Some(id));
        if self.layers.len() == before {
            return Err(StoreError::UnknownLayer(id.to_string()));
        }
        Ok(())
    }

    fn modify(&mut self, args: &[serde_json::Value]) -> Result<(), StoreError> {
        let id = args.first().ok_or(StoreError::MissingArgument("id"))?;
        let patch = args
            .get(1)
            .ok_or(StoreError::MissingArgument("patch"))?
            .as_object()
            .ok_or_else(|| StoreError::InvalidArgument("patch must be an object".into()))?
            .clone();

        let layer = self
            .layers
            .iter_mut()
            .find(|layer| layer.id() == Some(id))
            .ok_or_else(|| StoreError::UnknownLayer(id.to_string()))?;

        let target = layer
            .as_value_mut()
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidArgument("layer is not an object".into()))?;
        for (key, value) in patch {
            target.insert(key, value);
        }
        Ok(())
    }
}
