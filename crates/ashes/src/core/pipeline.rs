//! Graphics pipeline state descriptions
//!
//! A pipeline bundles shader stages with every piece of fixed-function
//! state. It is immutable once created; a `BindPipeline` command applies
//! the whole bundle atomically during replay. OpenGL has no pipeline
//! object, so the GL backend re-applies each piece of this state on every
//! bind — which is exactly why the description must be complete.

use crate::core::flags::{ColorComponentFlags, ShaderStageFlags};
use crate::core::format::Format;
use crate::core::handles::{
    DescriptorSetLayoutHandle, PipelineLayoutHandle, RenderPassHandle, ShaderModuleHandle,
};
use crate::core::types::{Rect2D, SampleCount, Viewport};

/// Per-instance or per-vertex stepping of a vertex buffer binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexInputRate {
    /// Advance per vertex
    #[default]
    Vertex,
    /// Advance per instance
    Instance,
}

/// One vertex buffer binding slot
#[derive(Debug, Clone, Copy)]
pub struct VertexInputBinding {
    /// Binding slot number, matched by `cmd_bind_vertex_buffers`
    pub binding: u32,
    /// Distance between consecutive elements in bytes
    pub stride: u32,
    /// Stepping rate
    pub input_rate: VertexInputRate,
}

/// One vertex attribute
///
/// `{location, binding, format, offset}` must match the shader's input
/// declarations; mismatches are not validated and render incorrectly.
#[derive(Debug, Clone, Copy)]
pub struct VertexInputAttribute {
    /// Shader input location
    pub location: u32,
    /// Vertex buffer binding the attribute reads from
    pub binding: u32,
    /// Attribute format
    pub format: Format,
    /// Offset from the start of the element in bytes
    pub offset: u32,
}

/// Complete vertex fetch layout
#[derive(Debug, Clone, Default)]
pub struct VertexInputState {
    /// Buffer binding slots
    pub bindings: Vec<VertexInputBinding>,
    /// Attribute descriptions
    pub attributes: Vec<VertexInputAttribute>,
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveTopology {
    /// Isolated points
    PointList,
    /// Isolated lines
    LineList,
    /// Connected lines
    LineStrip,
    /// Isolated triangles
    #[default]
    TriangleList,
    /// Connected triangles
    TriangleStrip,
    /// Triangle fan
    TriangleFan,
    /// Tessellation patches
    PatchList {
        /// Vertices per patch
        control_points: u32,
    },
}

/// Input assembly configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct InputAssemblyState {
    /// Primitive topology
    pub topology: PrimitiveTopology,
    /// Restart strips at the maximum index value
    pub primitive_restart: bool,
}

/// Triangle fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolygonMode {
    /// Filled triangles
    #[default]
    Fill,
    /// Wireframe
    Line,
    /// Vertices only
    Point,
}

/// Face culling selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    /// No culling
    #[default]
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    Back,
    /// Cull everything
    FrontAndBack,
}

/// Winding order considered front-facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontFace {
    /// Counter-clockwise
    #[default]
    CounterClockwise,
    /// Clockwise
    Clockwise,
}

/// Rasterizer configuration
#[derive(Debug, Clone, Copy)]
pub struct RasterizationState {
    /// Fill mode
    pub polygon_mode: PolygonMode,
    /// Culling
    pub cull_mode: CullMode,
    /// Front-face winding
    pub front_face: FrontFace,
    /// Clamp rather than clip depth
    pub depth_clamp: bool,
    /// Constant depth bias, with slope factor
    pub depth_bias: Option<(f32, f32)>,
    /// Rasterized line width
    pub line_width: f32,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullMode::None,
            front_face: FrontFace::CounterClockwise,
            depth_clamp: false,
            depth_bias: None,
            line_width: 1.0,
        }
    }
}

/// Depth/stencil comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum CompareOp {
    Never,
    #[default]
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Stencil update operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum StencilOp {
    #[default]
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

/// Per-face stencil configuration
#[derive(Debug, Clone, Copy)]
pub struct StencilOpState {
    /// Applied when the stencil test fails
    pub fail_op: StencilOp,
    /// Applied when both tests pass
    pub pass_op: StencilOp,
    /// Applied when the stencil test passes but the depth test fails
    pub depth_fail_op: StencilOp,
    /// Comparison function
    pub compare_op: CompareOp,
    /// Bits participating in the comparison
    pub compare_mask: u32,
    /// Bits written by updates
    pub write_mask: u32,
    /// Reference value
    pub reference: u32,
}

impl Default for StencilOpState {
    fn default() -> Self {
        Self {
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            compare_op: CompareOp::Always,
            compare_mask: u32::MAX,
            write_mask: u32::MAX,
            reference: 0,
        }
    }
}

/// Depth and stencil test configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthStencilState {
    /// Enable the depth test
    pub depth_test: bool,
    /// Enable depth writes
    pub depth_write: bool,
    /// Depth comparison
    pub depth_compare: CompareOp,
    /// Enable the stencil test
    pub stencil_test: bool,
    /// Front-face stencil state
    pub front: StencilOpState,
    /// Back-face stencil state
    pub back: StencilOpState,
}

/// Blend multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum BlendFactor {
    Zero,
    #[default]
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
}

/// Blend combiner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum BlendOp {
    #[default]
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Logical operation applied instead of blending (preserved for parity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum LogicOp {
    Clear,
    And,
    #[default]
    Copy,
    Xor,
    Or,
    Noop,
    Invert,
    Set,
}

/// Blend configuration for one color attachment
#[derive(Debug, Clone, Copy)]
pub struct ColorBlendAttachment {
    /// Enable blending for this attachment
    pub blend_enable: bool,
    /// Source color factor
    pub src_color: BlendFactor,
    /// Destination color factor
    pub dst_color: BlendFactor,
    /// Color combiner
    pub color_op: BlendOp,
    /// Source alpha factor
    pub src_alpha: BlendFactor,
    /// Destination alpha factor
    pub dst_alpha: BlendFactor,
    /// Alpha combiner
    pub alpha_op: BlendOp,
    /// Channels written
    pub color_write_mask: ColorComponentFlags,
}

impl Default for ColorBlendAttachment {
    fn default() -> Self {
        Self {
            blend_enable: false,
            src_color: BlendFactor::One,
            dst_color: BlendFactor::Zero,
            color_op: BlendOp::Add,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
            alpha_op: BlendOp::Add,
            color_write_mask: ColorComponentFlags::all(),
        }
    }
}

impl ColorBlendAttachment {
    /// Standard alpha blending
    pub fn alpha_blend() -> Self {
        Self {
            blend_enable: true,
            src_color: BlendFactor::SrcAlpha,
            dst_color: BlendFactor::OneMinusSrcAlpha,
            color_op: BlendOp::Add,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::OneMinusSrcAlpha,
            alpha_op: BlendOp::Add,
            color_write_mask: ColorComponentFlags::all(),
        }
    }
}

/// Whole-pipeline blend configuration
#[derive(Debug, Clone, Default)]
pub struct ColorBlendState {
    /// Per-attachment blend states, one per subpass color attachment
    pub attachments: Vec<ColorBlendAttachment>,
    /// Constant blend color
    pub blend_constants: [f32; 4],
    /// Logic op replacing blending, when set
    pub logic_op: Option<LogicOp>,
}

/// Multisample configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct MultisampleState {
    /// Rasterization sample count
    pub samples: SampleCount,
    /// Convert fragment alpha to a coverage mask
    pub alpha_to_coverage: bool,
}

/// Range of push-constant bytes visible to a set of stages
#[derive(Debug, Clone, Copy)]
pub struct PushConstantRange {
    /// Stages that read the range
    pub stages: ShaderStageFlags,
    /// Byte offset
    pub offset: u32,
    /// Byte size
    pub size: u32,
}

/// Everything needed to create a pipeline layout
#[derive(Debug, Clone, Default)]
pub struct PipelineLayoutCreateInfo {
    /// Descriptor set layouts, by set number
    pub set_layouts: Vec<DescriptorSetLayoutHandle>,
    /// Push constant ranges
    pub push_constant_ranges: Vec<PushConstantRange>,
}

/// Everything needed to create a graphics pipeline
#[derive(Debug, Clone)]
pub struct GraphicsPipelineCreateInfo {
    /// Shader stages (one module per stage)
    pub stages: Vec<ShaderModuleHandle>,
    /// Vertex fetch layout
    pub vertex_input: VertexInputState,
    /// Primitive assembly
    pub input_assembly: InputAssemblyState,
    /// Static viewport; `None` means set dynamically via `cmd_set_viewport`
    pub viewport: Option<Viewport>,
    /// Static scissor; `None` means set dynamically via `cmd_set_scissor`
    pub scissor: Option<Rect2D>,
    /// Rasterizer state
    pub rasterization: RasterizationState,
    /// Multisample state
    pub multisample: MultisampleState,
    /// Depth/stencil state
    pub depth_stencil: DepthStencilState,
    /// Blend state
    pub color_blend: ColorBlendState,
    /// Pipeline layout
    pub layout: PipelineLayoutHandle,
    /// Compatible render pass
    pub render_pass: RenderPassHandle,
    /// Subpass index within the render pass
    pub subpass: u32,
}
