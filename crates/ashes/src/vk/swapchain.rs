//! Swapchain creation, acquisition, and presentation
//!
//! Swapchain image views are registered in the device's view arena so
//! framebuffer creation works uniformly over swapchain and offscreen
//! targets. The swapchain owns those views: it removes and destroys them
//! on recreation and drop.

use std::cell::RefCell;
use std::rc::Rc;

use ash::extensions::khr::Swapchain;
use ash::vk;
use log::debug;

use crate::core::{AshesError, AshesResult, Extent2D, Format, ImageViewHandle, SemaphoreHandle};

use super::device::{VkDevice, VkDeviceState, VkImageView};
use super::instance::VkInstance;
use super::surface::VkSurface;

fn backend(what: &str, e: vk::Result) -> AshesError {
    AshesError::Backend(format!("{what}: {e}"))
}

fn core_format(format: vk::Format) -> Option<Format> {
    match format {
        vk::Format::B8G8R8A8_SRGB => Some(Format::Bgra8Srgb),
        vk::Format::B8G8R8A8_UNORM => Some(Format::Bgra8Unorm),
        vk::Format::R8G8B8A8_SRGB => Some(Format::Rgba8Srgb),
        vk::Format::R8G8B8A8_UNORM => Some(Format::Rgba8Unorm),
        _ => None,
    }
}

/// The presentation target for a window surface
pub struct VkSwapchain {
    state: Rc<RefCell<VkDeviceState>>,
    loader: Swapchain,
    swapchain: vk::SwapchainKHR,
    format: Format,
    extent: Extent2D,
    views: Vec<ImageViewHandle>,
    vsync: bool,
}

impl VkSwapchain {
    /// Create a swapchain for `surface`
    ///
    /// Prefers a BGRA sRGB surface format and, when `vsync` is off, the
    /// mailbox present mode; FIFO is the fallback either way.
    pub fn new(
        instance: &VkInstance,
        device: &VkDevice,
        surface: &VkSurface,
        extent: Extent2D,
        vsync: bool,
    ) -> AshesResult<Self> {
        let state = device.state();
        let loader = Swapchain::new(instance.raw(), &state.borrow().device);
        let mut swapchain = Self {
            state,
            loader,
            swapchain: vk::SwapchainKHR::null(),
            format: Format::Bgra8Srgb,
            extent,
            views: Vec::new(),
            vsync,
        };
        swapchain.build(surface, extent)?;
        Ok(swapchain)
    }

    /// The image views, indexed by acquired image index
    pub fn views(&self) -> &[ImageViewHandle] {
        &self.views
    }

    /// The surface format negotiated at creation
    pub fn format(&self) -> Format {
        self.format
    }

    /// The current image extent
    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    /// Acquire the next presentable image, blocking until one is ready
    ///
    /// The optional semaphore is signaled when the image is actually
    /// available for rendering.
    pub fn acquire_next_image(&self, signal: Option<SemaphoreHandle>) -> AshesResult<u32> {
        let state = self.state.borrow();
        let semaphore = match signal {
            Some(signal) => *state
                .semaphores
                .get(signal)
                .ok_or(AshesError::ResourceLost { what: "semaphore" })?,
            None => vk::Semaphore::null(),
        };
        let (index, _suboptimal) = unsafe {
            self.loader
                .acquire_next_image(self.swapchain, u64::MAX, semaphore, vk::Fence::null())
                .map_err(|e| backend("failed to acquire swapchain image", e))?
        };
        Ok(index)
    }

    /// Queue the image for presentation after `waits` signal
    pub fn present(&self, waits: &[SemaphoreHandle], image_index: u32) -> AshesResult<()> {
        let state = self.state.borrow();
        let mut wait_semaphores = Vec::with_capacity(waits.len());
        for &wait in waits {
            wait_semaphores.push(*state.semaphores.get(wait).ok_or(
                AshesError::ResourceLost { what: "semaphore" },
            )?);
        }
        let swapchains = [self.swapchain];
        let indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&indices);
        unsafe {
            self.loader
                .queue_present(state.queue, &present_info)
                .map_err(|e| backend("presentation failed", e))?;
        }
        Ok(())
    }

    /// Rebuild the swapchain after a window resize
    ///
    /// Framebuffers created over the old views must be recreated by the
    /// caller; the old view handles become stale.
    pub fn recreate(&mut self, surface: &VkSurface, extent: Extent2D) -> AshesResult<()> {
        {
            let state = self.state.borrow();
            unsafe {
                state
                    .device
                    .device_wait_idle()
                    .map_err(|e| backend("device wait failed", e))?;
            }
        }
        self.destroy_views();
        self.build(surface, extent)
    }

    fn build(&mut self, surface: &VkSurface, extent: Extent2D) -> AshesResult<()> {
        let mut state = self.state.borrow_mut();
        let physical_device = state.physical_device;

        let capabilities = unsafe {
            surface
                .loader()
                .get_physical_device_surface_capabilities(physical_device, surface.raw())
                .map_err(|e| backend("failed to query surface capabilities", e))?
        };
        let formats = unsafe {
            surface
                .loader()
                .get_physical_device_surface_formats(physical_device, surface.raw())
                .map_err(|e| backend("failed to query surface formats", e))?
        };
        let present_modes = unsafe {
            surface
                .loader()
                .get_physical_device_surface_present_modes(physical_device, surface.raw())
                .map_err(|e| backend("failed to query present modes", e))?
        };

        let surface_format = formats
            .iter()
            .find(|f| {
                f.format == vk::Format::B8G8R8A8_SRGB
                    && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
            })
            .or_else(|| formats.iter().find(|f| core_format(f.format).is_some()))
            .copied()
            .ok_or_else(|| {
                AshesError::Backend("surface offers no supported 8-bit format".into())
            })?;
        let format = core_format(surface_format.format).ok_or_else(|| {
            AshesError::Backend("surface offers no supported 8-bit format".into())
        })?;

        let present_mode = if !self.vsync
            && present_modes.contains(&vk::PresentModeKHR::MAILBOX)
        {
            vk::PresentModeKHR::MAILBOX
        } else {
            vk::PresentModeKHR::FIFO
        };

        let extent = if capabilities.current_extent.width != u32::MAX {
            Extent2D::new(
                capabilities.current_extent.width,
                capabilities.current_extent.height,
            )
        } else {
            Extent2D::new(
                extent.width.clamp(
                    capabilities.min_image_extent.width,
                    capabilities.max_image_extent.width,
                ),
                extent.height.clamp(
                    capabilities.min_image_extent.height,
                    capabilities.max_image_extent.height,
                ),
            )
        };

        let mut image_count = capabilities.min_image_count + 1;
        if capabilities.max_image_count > 0 {
            image_count = image_count.min(capabilities.max_image_count);
        }

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.raw())
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(vk::Extent2D {
                width: extent.width,
                height: extent.height,
            })
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(self.swapchain);
        let swapchain = unsafe {
            self.loader
                .create_swapchain(&create_info, None)
                .map_err(|e| backend("failed to create swapchain", e))?
        };
        if self.swapchain != vk::SwapchainKHR::null() {
            unsafe { self.loader.destroy_swapchain(self.swapchain, None) };
        }
        self.swapchain = swapchain;

        let images = unsafe {
            self.loader
                .get_swapchain_images(swapchain)
                .map_err(|e| backend("failed to get swapchain images", e))?
        };
        for image in images {
            let view_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(surface_format.format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            let view = unsafe {
                state
                    .device
                    .create_image_view(&view_info, None)
                    .map_err(|e| backend("failed to create swapchain image view", e))?
            };
            self.views.push(state.views.insert(VkImageView {
                view,
                format,
                extent,
                owned: false,
            }));
        }

        self.format = format;
        self.extent = extent;
        debug!(
            "swapchain: {} images, {:?}, {:?}, {}x{}",
            self.views.len(),
            surface_format.format,
            present_mode,
            extent.width,
            extent.height
        );
        Ok(())
    }

    fn destroy_views(&mut self) {
        let mut state = self.state.borrow_mut();
        for handle in self.views.drain(..) {
            if let Some(entry) = state.views.remove(handle) {
                unsafe { state.device.destroy_image_view(entry.view, None) };
            }
        }
    }
}

impl Drop for VkSwapchain {
    fn drop(&mut self) {
        {
            let state = self.state.borrow();
            unsafe {
                let _ = state.device.device_wait_idle();
            }
        }
        self.destroy_views();
        unsafe {
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}
