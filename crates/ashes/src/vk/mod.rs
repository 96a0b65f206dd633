//! Vulkan backend
//!
//! A thin pass-through: recordings are re-encoded onto native command
//! buffers at submit and the driver does the rest. Validation beyond what
//! the core model already checks is delegated to the validation layers,
//! enabled through [`crate::config::VkConfig`].
//!
//! Everything here except instance creation requires a live device, and
//! most entry points are unsafe at the FFI boundary internally; the
//! public surface stays safe by keeping raw handles inside the arenas.

mod convert;
mod device;
mod instance;
mod queue;
mod surface;
mod swapchain;

pub use device::VkDevice;
pub use instance::VkInstance;
pub use queue::VkQueue;
pub use surface::VkSurface;
pub use swapchain::VkSwapchain;
