//! Presentation over the context's default framebuffer
//!
//! GL has no image acquisition protocol: the default framebuffer is always
//! the current back buffer, so `acquire_next_image` returns immediately
//! and `present` swaps buffers through the context.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{AshesError, AshesResult, Framebuffer, SemaphoreHandle};

use super::device::GlDeviceState;

/// The GL presentation target
///
/// Wraps framebuffer name 0. There is a single image, so the acquired
/// index is always 0 and acquisition never blocks.
pub struct GlSwapchain {
    state: Rc<RefCell<GlDeviceState>>,
    framebuffer: Framebuffer,
}

impl GlSwapchain {
    pub(crate) fn new(state: Rc<RefCell<GlDeviceState>>, framebuffer: Framebuffer) -> Self {
        Self { state, framebuffer }
    }

    /// The framebuffer to pass to `begin_render_pass`
    pub fn framebuffer(&self) -> Framebuffer {
        self.framebuffer
    }

    /// Acquire the next image; on GL this is immediate
    ///
    /// The optional semaphore is signaled right away so submission code
    /// written against the acquire/submit/present pattern works unchanged.
    pub fn acquire_next_image(&self, signal: Option<SemaphoreHandle>) -> AshesResult<u32> {
        if let Some(signal) = signal {
            let mut state = self.state.borrow_mut();
            state
                .semaphores
                .get_mut(signal)
                .ok_or(AshesError::ResourceLost { what: "semaphore" })?
                .signaled = true;
        }
        Ok(0)
    }

    /// Swap the back buffer to the screen
    ///
    /// `waits` are consumed for host-side ordering, matching queue
    /// submission semantics.
    pub fn present(&self, waits: &[SemaphoreHandle]) -> AshesResult<()> {
        let mut state = self.state.borrow_mut();
        for &wait in waits {
            state
                .semaphores
                .get_mut(wait)
                .ok_or(AshesError::ResourceLost { what: "semaphore" })?
                .signaled = false;
        }
        state.ctx.swap_buffers();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        AttachmentDescription, AttachmentReference, Extent2D, Format, ImageLayout,
        RenderPassCreateInfo, SubpassDescription,
    };
    use crate::gl::{CaptureContext, GlCall, GlDevice};

    fn present_pass(device: &GlDevice) -> crate::core::RenderPassHandle {
        device
            .create_render_pass(RenderPassCreateInfo {
                attachments: vec![AttachmentDescription::color_clear_store(
                    Format::Rgba8Unorm,
                    ImageLayout::PresentSrc,
                )],
                subpasses: vec![SubpassDescription {
                    color_attachments: vec![AttachmentReference::color(0)],
                    ..Default::default()
                }],
                dependencies: vec![],
            })
            .unwrap()
    }

    #[test]
    fn acquire_is_immediate_and_signals() {
        let device = GlDevice::new(Rc::new(CaptureContext::new())).unwrap();
        let pass = present_pass(&device);
        let swapchain = device.create_swapchain(pass, Extent2D::new(8, 8)).unwrap();
        let acquired = device.create_semaphore();
        assert_eq!(swapchain.acquire_next_image(Some(acquired)).unwrap(), 0);
        let state = device.state();
        assert!(state.borrow().semaphores[acquired].signaled);
    }

    #[test]
    fn present_swaps_buffers() {
        let ctx = CaptureContext::new();
        let log = ctx.log();
        let device = GlDevice::new(Rc::new(ctx)).unwrap();
        let pass = present_pass(&device);
        let swapchain = device.create_swapchain(pass, Extent2D::new(8, 8)).unwrap();
        swapchain.present(&[]).unwrap();
        assert!(log.position(|c| matches!(c, GlCall::SwapBuffers)).is_some());
    }
}
