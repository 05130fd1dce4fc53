//! Device and queue acquisition.

use std::sync::{Arc, Mutex};

use crate::error::FieldError;

/// Adapter, device and queue shared by the engine and the front end.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    /// First error raised outside any error scope, waiting for [`check`](Self::check).
    uncaptured: Arc<Mutex<Option<String>>>,
}

impl GpuContext {
    /// Create the wgpu instance used for both surfaces and adapters.
    ///
    /// `debug` turns on the backend validation layers; their messages reach
    /// the `log` facade through `wgpu_hal`.
    pub fn create_instance(debug: bool) -> wgpu::Instance {
        let flags = if debug {
            wgpu::InstanceFlags::debugging()
        } else {
            wgpu::InstanceFlags::empty()
        };
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags,
            ..Default::default()
        })
    }

    /// Pick an adapter (compatible with `surface` when given) and open a device on it.
    pub async fn new(
        instance: wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<Self, FieldError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(FieldError::NoAdapter)?;

        log::info!("Using GPU: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Field Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let uncaptured = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&uncaptured);
        device.on_uncaptured_error(Box::new(move |error| {
            log::error!("GPU uncaptured error: {error}");
            if let Ok(mut slot) = sink.lock() {
                slot.get_or_insert_with(|| error.to_string());
            }
        }));

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
            uncaptured,
        })
    }

    /// Device without any presentation surface, for tests and offscreen use.
    pub fn headless() -> Result<Self, FieldError> {
        pollster::block_on(Self::new(Self::create_instance(false), None))
    }

    /// Return the first uncaptured GPU error since the last call, if any.
    ///
    /// # Errors
    ///
    /// [`FieldError::Backend`] carrying the backend message.
    pub fn check(&self) -> Result<(), FieldError> {
        let pending = match self.uncaptured.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match pending {
            Some(message) => Err(FieldError::Backend(message)),
            None => Ok(()),
        }
    }
}
