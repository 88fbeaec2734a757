//! Graphics instance.
//!
//! The [`GraphicsInstance`] is the top-level entry point for the graphics system.
//! It owns the GPU backend and manages the [`GraphicsDevice`]s created on it.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::backend::{self, BackendType, GpuBackend};
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;

/// The graphics instance manages the backend and its devices.
///
/// # Thread Safety
///
/// `GraphicsInstance` is `Send + Sync` and can be safely shared across threads.
///
/// # Example
///
/// ```ignore
/// let instance = GraphicsInstance::new()?;
/// let device = instance.create_device()?;
/// ```
pub struct GraphicsInstance {
    /// Weak self-reference for creating devices.
    self_ref: RwLock<Weak<GraphicsInstance>>,
    /// Devices created by this instance.
    devices: RwLock<Vec<Arc<GraphicsDevice>>>,
    /// GPU backend for this instance.
    backend: Arc<dyn GpuBackend>,
}

impl GraphicsInstance {
    /// Create a new graphics instance on the best available backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the graphics system cannot be initialized.
    pub fn new() -> Result<Arc<Self>, GraphicsError> {
        Self::with_backend_type(BackendType::Auto)
    }

    /// Create a new graphics instance on a specific backend.
    pub fn with_backend_type(backend_type: BackendType) -> Result<Arc<Self>, GraphicsError> {
        log::info!("Creating GraphicsInstance ({backend_type:?})");
        let backend = backend::create_backend(backend_type)?;
        Ok(Self::with_backend(backend))
    }

    /// Create a graphics instance around an existing backend.
    ///
    /// Tests use this to keep a typed handle to the
    /// [`DummyBackend`](crate::backend::dummy::DummyBackend) they inspect.
    pub fn with_backend(backend: Arc<dyn GpuBackend>) -> Arc<Self> {
        log::info!("Using GPU backend: {}", backend.name());

        let instance = Arc::new(Self {
            self_ref: RwLock::new(Weak::new()),
            devices: RwLock::new(Vec::new()),
            backend,
        });
        *instance.self_ref.write() = Arc::downgrade(&instance);
        instance
    }

    /// Get the GPU backend.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    /// Get the strong self-reference.
    fn arc_self(&self) -> Option<Arc<GraphicsInstance>> {
        self.self_ref.read().upgrade()
    }

    /// Create a graphics device.
    ///
    /// # Errors
    ///
    /// Returns an error if device creation fails.
    pub fn create_device(&self) -> Result<Arc<GraphicsDevice>, GraphicsError> {
        let instance = self.arc_self().ok_or_else(|| {
            GraphicsError::ResourceCreationFailed("instance has been dropped".to_string())
        })?;
        log::info!("Creating device on backend: {}", self.backend.name());

        let device = Arc::new(GraphicsDevice::new(
            instance,
            self.backend.name().to_string(),
        ));
        self.devices.write().push(device.clone());
        Ok(device)
    }

    /// Get all devices created by this instance.
    pub fn devices(&self) -> Vec<Arc<GraphicsDevice>> {
        self.devices.read().clone()
    }

    /// Get the number of devices created by this instance.
    pub fn device_count(&self) -> usize {
        self.devices.read().len()
    }
}

impl std::fmt::Debug for GraphicsInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsInstance")
            .field("backend", &self.backend.name())
            .field("device_count", &self.device_count())
            .finish()
    }
}

// Ensure GraphicsInstance is Send + Sync
static_assertions::assert_impl_all!(GraphicsInstance: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;

    #[test]
    fn test_instance_creation() {
        let instance = GraphicsInstance::with_backend_type(BackendType::Dummy).unwrap();
        assert_eq!(instance.device_count(), 0);
        assert_eq!(instance.backend().name(), "Dummy Backend");
    }

    #[test]
    fn test_create_device() {
        let instance = GraphicsInstance::with_backend(Arc::new(DummyBackend::new()));
        let device = instance.create_device().unwrap();
        assert_eq!(device.name(), "Dummy Backend");
        assert_eq!(instance.device_count(), 1);
    }

    #[test]
    fn test_device_has_instance_reference() {
        let instance = GraphicsInstance::new().unwrap();
        let device = instance.create_device().unwrap();
        // Device holds a strong reference to instance
        assert!(Arc::ptr_eq(device.instance(), &instance));
    }
}
