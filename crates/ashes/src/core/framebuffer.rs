//! Framebuffers: concrete bindings of render-pass attachment slots
//!
//! Devices create framebuffers; the validation both backends must agree on
//! lives here. The value returned to the application is a small `Copy`
//! descriptor so that `begin_render_pass` can check the clear-value arity
//! at record time without reaching back into the device.

use crate::core::error::{AshesError, AshesResult};
use crate::core::format::Format;
use crate::core::handles::FramebufferHandle;
use crate::core::render_pass::RenderPass;
use crate::core::types::Extent2D;

/// Format and size of a view a backend is about to bind to a slot
#[derive(Debug, Clone, Copy)]
pub struct AttachmentViewDesc {
    /// The view's pixel format
    pub format: Format,
    /// The extent of the view's mip level
    pub extent: Extent2D,
}

/// Check a view array against a render pass's attachment declarations
///
/// Fails when the counts differ, when a view's extent differs from the
/// framebuffer extent, or when a view's format is not the slot's declared
/// format.
pub fn validate_framebuffer(
    render_pass: &RenderPass,
    extent: Extent2D,
    views: &[AttachmentViewDesc],
) -> AshesResult<()> {
    if views.len() != render_pass.attachment_count() {
        return Err(AshesError::Configuration {
            reason: format!(
                "framebuffer binds {} views but the render pass declares {} attachments",
                views.len(),
                render_pass.attachment_count()
            ),
        });
    }
    for (slot, (view, declared)) in views.iter().zip(render_pass.attachments()).enumerate() {
        if view.extent != extent {
            return Err(AshesError::Configuration {
                reason: format!(
                    "attachment {slot}: view extent {}x{} differs from framebuffer extent {}x{}",
                    view.extent.width, view.extent.height, extent.width, extent.height
                ),
            });
        }
        if view.format != declared.format {
            return Err(AshesError::Configuration {
                reason: format!(
                    "attachment {slot}: view format {:?} is incompatible with declared format {:?}",
                    view.format, declared.format
                ),
            });
        }
    }
    Ok(())
}

/// A framebuffer created by a device
///
/// Recreated whenever the render-target size changes; the handle inside
/// becomes stale when the framebuffer is destroyed.
#[derive(Debug, Clone, Copy)]
pub struct Framebuffer {
    handle: FramebufferHandle,
    attachment_count: usize,
    extent: Extent2D,
}

impl Framebuffer {
    pub(crate) fn new(
        handle: FramebufferHandle,
        attachment_count: usize,
        extent: Extent2D,
    ) -> Self {
        Self {
            handle,
            attachment_count,
            extent,
        }
    }

    /// Backend handle
    pub fn handle(&self) -> FramebufferHandle {
        self.handle
    }

    /// Number of bound attachment views
    pub fn attachment_count(&self) -> usize {
        self.attachment_count
    }

    /// Fixed 2D extent
    pub fn extent(&self) -> Extent2D {
        self.extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render_pass::{
        AttachmentDescription, AttachmentReference, RenderPassCreateInfo, SubpassDescription,
    };
    use crate::core::types::ImageLayout;

    fn pass_with_color_and_depth() -> RenderPass {
        RenderPass::new(RenderPassCreateInfo {
            attachments: vec![
                AttachmentDescription::color_clear_store(
                    Format::Rgba8Unorm,
                    ImageLayout::PresentSrc,
                ),
                AttachmentDescription::depth_clear(Format::D32Sfloat),
            ],
            subpasses: vec![SubpassDescription {
                color_attachments: vec![AttachmentReference::color(0)],
                depth_stencil_attachment: Some(AttachmentReference::depth(1)),
                ..Default::default()
            }],
            dependencies: vec![],
        })
        .unwrap()
    }

    #[test]
    fn matching_views_validate() {
        let pass = pass_with_color_and_depth();
        let extent = Extent2D::new(64, 64);
        let views = [
            AttachmentViewDesc {
                format: Format::Rgba8Unorm,
                extent,
            },
            AttachmentViewDesc {
                format: Format::D32Sfloat,
                extent,
            },
        ];
        validate_framebuffer(&pass, extent, &views).unwrap();
    }

    #[test]
    fn wrong_view_count_is_rejected() {
        let pass = pass_with_color_and_depth();
        let extent = Extent2D::new(64, 64);
        let views = [AttachmentViewDesc {
            format: Format::Rgba8Unorm,
            extent,
        }];
        assert!(validate_framebuffer(&pass, extent, &views).is_err());
    }

    #[test]
    fn wrong_extent_is_rejected() {
        let pass = pass_with_color_and_depth();
        let extent = Extent2D::new(64, 64);
        let views = [
            AttachmentViewDesc {
                format: Format::Rgba8Unorm,
                extent: Extent2D::new(32, 64),
            },
            AttachmentViewDesc {
                format: Format::D32Sfloat,
                extent,
            },
        ];
        assert!(validate_framebuffer(&pass, extent, &views).is_err());
    }

    #[test]
    fn incompatible_format_is_rejected() {
        let pass = pass_with_color_and_depth();
        let extent = Extent2D::new(64, 64);
        let views = [
            AttachmentViewDesc {
                format: Format::Bgra8Unorm,
                extent,
            },
            AttachmentViewDesc {
                format: Format::D32Sfloat,
                extent,
            },
        ];
        assert!(validate_framebuffer(&pass, extent, &views).is_err());
    }
}
