//! Window surface creation over `ash-window`

use ash::extensions::khr::Surface;
use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::core::{AshesError, AshesResult};

use super::instance::VkInstance;

/// A presentable surface and its loader
pub struct VkSurface {
    loader: Surface,
    surface: vk::SurfaceKHR,
}

impl VkSurface {
    /// Create a surface for a window
    ///
    /// # Safety
    ///
    /// The handles must refer to a live window that outlives the surface,
    /// and `instance` must have been created with the extensions reported
    /// by `ash_window::enumerate_required_extensions` for this display.
    pub unsafe fn new(
        instance: &VkInstance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> AshesResult<Self> {
        let surface = ash_window::create_surface(
            instance.entry(),
            instance.raw(),
            display,
            window,
            None,
        )
        .map_err(|e| AshesError::Initialization(format!("failed to create surface: {e}")))?;
        let loader = Surface::new(instance.entry(), instance.raw());
        Ok(Self { loader, surface })
    }

    /// The surface loader
    pub fn loader(&self) -> &Surface {
        &self.loader
    }

    /// The raw surface
    pub fn raw(&self) -> vk::SurfaceKHR {
        self.surface
    }
}

impl Drop for VkSurface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
    }
}
