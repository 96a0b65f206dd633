//! Render pass, subpass, and dependency declarations
//!
//! A render pass is fixed at construction: attachment formats and
//! load/store behavior, the subpass structure over those attachments, and
//! the inter-subpass dependencies. Construction validates every index
//! reference so that replay can trust the structure.

use crate::core::error::{AshesError, AshesResult};
use crate::core::flags::{AccessFlags, PipelineStageFlags};
use crate::core::format::Format;
use crate::core::types::{ImageLayout, SampleCount};

/// Marker for a dependency on work outside the render pass
pub const SUBPASS_EXTERNAL: u32 = u32::MAX;

/// How an attachment's previous contents are handled when a pass begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachmentLoadOp {
    /// Preserve the existing contents
    Load,
    /// Clear to the value supplied at `begin_render_pass`
    Clear,
    /// Contents are undefined; cheapest option
    #[default]
    DontCare,
}

/// Whether an attachment's contents survive the end of the pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachmentStoreOp {
    /// Keep the rendered contents
    #[default]
    Store,
    /// Contents may be discarded
    DontCare,
}

/// Declaration of one attachment slot
#[derive(Debug, Clone, Copy)]
pub struct AttachmentDescription {
    /// Pixel format a bound view must match
    pub format: Format,
    /// Sample count of the bound view
    pub samples: SampleCount,
    /// Load behavior for the color or depth component
    pub load_op: AttachmentLoadOp,
    /// Store behavior for the color or depth component
    pub store_op: AttachmentStoreOp,
    /// Load behavior for the stencil component
    pub stencil_load_op: AttachmentLoadOp,
    /// Store behavior for the stencil component
    pub stencil_store_op: AttachmentStoreOp,
    /// Layout the image is in when the pass begins
    pub initial_layout: ImageLayout,
    /// Layout the image is transitioned to when the pass ends
    pub final_layout: ImageLayout,
}

impl AttachmentDescription {
    /// Color attachment cleared on load and stored
    pub fn color_clear_store(format: Format, final_layout: ImageLayout) -> Self {
        Self {
            format,
            samples: SampleCount::X1,
            load_op: AttachmentLoadOp::Clear,
            store_op: AttachmentStoreOp::Store,
            stencil_load_op: AttachmentLoadOp::DontCare,
            stencil_store_op: AttachmentStoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout,
        }
    }

    /// Depth/stencil attachment cleared on load, discarded at the end
    pub fn depth_clear(format: Format) -> Self {
        Self {
            format,
            samples: SampleCount::X1,
            load_op: AttachmentLoadOp::Clear,
            store_op: AttachmentStoreOp::DontCare,
            stencil_load_op: AttachmentLoadOp::DontCare,
            stencil_store_op: AttachmentStoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::DepthStencilAttachmentOptimal,
        }
    }
}

/// Reference from a subpass to an attachment slot
#[derive(Debug, Clone, Copy)]
pub struct AttachmentReference {
    /// Index into the render pass's attachment list
    pub attachment: u32,
    /// Layout the attachment is in during the subpass
    pub layout: ImageLayout,
}

impl AttachmentReference {
    /// Reference a color attachment slot
    pub fn color(attachment: u32) -> Self {
        Self {
            attachment,
            layout: ImageLayout::ColorAttachmentOptimal,
        }
    }

    /// Reference a depth/stencil attachment slot
    pub fn depth(attachment: u32) -> Self {
        Self {
            attachment,
            layout: ImageLayout::DepthStencilAttachmentOptimal,
        }
    }
}

/// One rendering phase within a render pass
#[derive(Debug, Clone, Default)]
pub struct SubpassDescription {
    /// Attachments read as input attachments
    pub input_attachments: Vec<AttachmentReference>,
    /// Attachments written as color outputs
    pub color_attachments: Vec<AttachmentReference>,
    /// Multisample resolve targets, paired with `color_attachments`
    ///
    /// Either empty, or the same length as `color_attachments`.
    pub resolve_attachments: Vec<AttachmentReference>,
    /// Optional depth/stencil attachment
    pub depth_stencil_attachment: Option<AttachmentReference>,
}

/// Execution/memory dependency between two subpasses
#[derive(Debug, Clone, Copy)]
pub struct SubpassDependency {
    /// Producing subpass index, or [`SUBPASS_EXTERNAL`]
    pub src_subpass: u32,
    /// Consuming subpass index, or [`SUBPASS_EXTERNAL`]
    pub dst_subpass: u32,
    /// Stages that must complete in the producer
    pub src_stage_mask: PipelineStageFlags,
    /// Stages that wait in the consumer
    pub dst_stage_mask: PipelineStageFlags,
    /// Accesses made available by the producer
    pub src_access_mask: AccessFlags,
    /// Accesses made visible to the consumer
    pub dst_access_mask: AccessFlags,
    /// Dependency holds per-region rather than framebuffer-global
    pub by_region: bool,
}

/// Everything needed to construct a [`RenderPass`]
#[derive(Debug, Clone, Default)]
pub struct RenderPassCreateInfo {
    /// Attachment slot declarations
    pub attachments: Vec<AttachmentDescription>,
    /// Subpasses in execution order
    pub subpasses: Vec<SubpassDescription>,
    /// Inter-subpass dependencies
    pub dependencies: Vec<SubpassDependency>,
}

/// Validated render pass description
///
/// Invariants established at construction: every attachment reference is in
/// range, and every non-empty resolve list matches its color list's length.
#[derive(Debug, Clone)]
pub struct RenderPass {
    attachments: Vec<AttachmentDescription>,
    subpasses: Vec<SubpassDescription>,
    dependencies: Vec<SubpassDependency>,
}

impl RenderPass {
    /// Validate a create-info and build the pass
    pub fn new(info: RenderPassCreateInfo) -> AshesResult<Self> {
        if info.subpasses.is_empty() {
            return Err(AshesError::Configuration {
                reason: "render pass must declare at least one subpass".into(),
            });
        }

        let attachment_count = info.attachments.len() as u32;
        let check_ref = |reference: &AttachmentReference, what: &str| {
            if reference.attachment >= attachment_count {
                Err(AshesError::Configuration {
                    reason: format!(
                        "{what} references attachment {} but only {} attachments are declared",
                        reference.attachment, attachment_count
                    ),
                })
            } else {
                Ok(())
            }
        };

        for (index, subpass) in info.subpasses.iter().enumerate() {
            for reference in subpass
                .input_attachments
                .iter()
                .chain(&subpass.color_attachments)
                .chain(&subpass.resolve_attachments)
                .chain(subpass.depth_stencil_attachment.as_ref())
            {
                check_ref(reference, &format!("subpass {index}"))?;
            }
            if !subpass.resolve_attachments.is_empty()
                && subpass.resolve_attachments.len() != subpass.color_attachments.len()
            {
                return Err(AshesError::Configuration {
                    reason: format!(
                        "subpass {index} declares {} resolve attachments for {} color attachments",
                        subpass.resolve_attachments.len(),
                        subpass.color_attachments.len()
                    ),
                });
            }
        }

        let subpass_count = info.subpasses.len() as u32;
        for dependency in &info.dependencies {
            for subpass in [dependency.src_subpass, dependency.dst_subpass] {
                if subpass != SUBPASS_EXTERNAL && subpass >= subpass_count {
                    return Err(AshesError::Configuration {
                        reason: format!(
                            "dependency references subpass {subpass} but only {subpass_count} subpasses are declared"
                        ),
                    });
                }
            }
        }

        Ok(Self {
            attachments: info.attachments,
            subpasses: info.subpasses,
            dependencies: info.dependencies,
        })
    }

    /// Attachment slot declarations
    pub fn attachments(&self) -> &[AttachmentDescription] {
        &self.attachments
    }

    /// Subpasses in execution order
    pub fn subpasses(&self) -> &[SubpassDescription] {
        &self.subpasses
    }

    /// Declared dependencies (advisory on GL, enforced on Vulkan)
    pub fn dependencies(&self) -> &[SubpassDependency] {
        &self.dependencies
    }

    /// Number of attachment slots
    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_attachment() -> AttachmentDescription {
        AttachmentDescription::color_clear_store(Format::Rgba8Unorm, ImageLayout::PresentSrc)
    }

    fn single_subpass(color: u32) -> SubpassDescription {
        SubpassDescription {
            color_attachments: vec![AttachmentReference::color(color)],
            ..Default::default()
        }
    }

    #[test]
    fn valid_pass_constructs() {
        let pass = RenderPass::new(RenderPassCreateInfo {
            attachments: vec![color_attachment()],
            subpasses: vec![single_subpass(0)],
            dependencies: vec![],
        })
        .unwrap();
        assert_eq!(pass.attachment_count(), 1);
    }

    #[test]
    fn out_of_range_attachment_reference_fails() {
        let err = RenderPass::new(RenderPassCreateInfo {
            attachments: vec![color_attachment()],
            subpasses: vec![single_subpass(1)],
            dependencies: vec![],
        })
        .unwrap_err();
        assert!(matches!(err, AshesError::Configuration { .. }));
    }

    #[test]
    fn out_of_range_depth_reference_fails() {
        let err = RenderPass::new(RenderPassCreateInfo {
            attachments: vec![color_attachment()],
            subpasses: vec![SubpassDescription {
                color_attachments: vec![AttachmentReference::color(0)],
                depth_stencil_attachment: Some(AttachmentReference::depth(3)),
                ..Default::default()
            }],
            dependencies: vec![],
        })
        .unwrap_err();
        assert!(matches!(err, AshesError::Configuration { .. }));
    }

    #[test]
    fn resolve_list_length_must_match_color_list() {
        let err = RenderPass::new(RenderPassCreateInfo {
            attachments: vec![color_attachment(), color_attachment(), color_attachment()],
            subpasses: vec![SubpassDescription {
                color_attachments: vec![
                    AttachmentReference::color(0),
                    AttachmentReference::color(1),
                ],
                resolve_attachments: vec![AttachmentReference::color(2)],
                ..Default::default()
            }],
            dependencies: vec![],
        })
        .unwrap_err();
        assert!(matches!(err, AshesError::Configuration { .. }));
    }

    #[test]
    fn empty_subpass_list_fails() {
        let err = RenderPass::new(RenderPassCreateInfo {
            attachments: vec![color_attachment()],
            subpasses: vec![],
            dependencies: vec![],
        })
        .unwrap_err();
        assert!(matches!(err, AshesError::Configuration { .. }));
    }

    #[test]
    fn dependency_subpass_indices_are_checked() {
        let dependency = SubpassDependency {
            src_subpass: SUBPASS_EXTERNAL,
            dst_subpass: 4,
            src_stage_mask: PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            dst_stage_mask: PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            src_access_mask: AccessFlags::empty(),
            dst_access_mask: AccessFlags::COLOR_ATTACHMENT_WRITE,
            by_region: false,
        };
        let err = RenderPass::new(RenderPassCreateInfo {
            attachments: vec![color_attachment()],
            subpasses: vec![single_subpass(0)],
            dependencies: vec![dependency],
        })
        .unwrap_err();
        assert!(matches!(err, AshesError::Configuration { .. }));
    }
}
