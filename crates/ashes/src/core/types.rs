//! Small geometric and enumerated types shared across the API

/// 2D extent in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent2D {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Extent2D {
    /// Construct an extent
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// 3D extent in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent3D {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Depth in pixels (1 for 2D images)
    pub depth: u32,
}

/// 2D signed offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset2D {
    /// X offset
    pub x: i32,
    /// Y offset
    pub y: i32,
}

/// 3D signed offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset3D {
    /// X offset
    pub x: i32,
    /// Y offset
    pub y: i32,
    /// Z offset
    pub z: i32,
}

/// Offset + extent rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect2D {
    /// Rectangle origin
    pub offset: Offset2D,
    /// Rectangle size
    pub extent: Extent2D,
}

impl Rect2D {
    /// Rectangle at the origin covering `extent`
    pub fn whole(extent: Extent2D) -> Self {
        Self {
            offset: Offset2D::default(),
            extent,
        }
    }
}

/// Viewport transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// Minimum depth
    pub min_depth: f32,
    /// Maximum depth
    pub max_depth: f32,
}

impl Viewport {
    /// Full-extent viewport with the standard [0, 1] depth range
    pub fn whole(extent: Extent2D) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Color clear payload, tagged by the attachment's numeric format
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearColorValue {
    /// Normalized or floating-point formats
    Float([f32; 4]),
    /// Signed integer formats
    Int([i32; 4]),
    /// Unsigned integer formats
    Uint([u32; 4]),
}

/// One entry of the clear-value array passed to `begin_render_pass`
///
/// The array is ordered identically to the render pass's attachment
/// declarations; color and depth/stencil entries are consumed by separate
/// cursors during replay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Clear value for a color attachment
    Color(ClearColorValue),
    /// Clear value for a depth/stencil attachment
    DepthStencil {
        /// Depth clear value
        depth: f32,
        /// Stencil clear value
        stencil: u32,
    },
}

impl ClearValue {
    /// Floating-point color clear
    pub fn color(rgba: [f32; 4]) -> Self {
        Self::Color(ClearColorValue::Float(rgba))
    }

    /// Depth/stencil clear
    pub fn depth_stencil(depth: f32, stencil: u32) -> Self {
        Self::DepthStencil { depth, stencil }
    }
}

/// Image layout, preserved for backend parity
///
/// The GL backend treats layouts as advisory; the Vulkan backend forwards
/// them to the driver, which enforces the transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageLayout {
    /// Contents undefined
    #[default]
    Undefined,
    /// Any usage
    General,
    /// Color attachment write
    ColorAttachmentOptimal,
    /// Depth/stencil attachment write
    DepthStencilAttachmentOptimal,
    /// Depth/stencil read
    DepthStencilReadOnlyOptimal,
    /// Sampled in shaders
    ShaderReadOnlyOptimal,
    /// Source of a transfer
    TransferSrcOptimal,
    /// Destination of a transfer
    TransferDstOptimal,
    /// Host-initialized
    Preinitialized,
    /// Ready for presentation
    PresentSrc,
}

/// Index element width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices
    Uint16,
    /// 32-bit indices
    Uint32,
}

impl IndexType {
    /// Size of one index in bytes
    pub fn size(self) -> u64 {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }
}

/// Pipeline bind point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineBindPoint {
    /// Graphics pipeline
    Graphics,
    /// Compute pipeline
    Compute,
}

/// How a subpass's commands are provided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubpassContents {
    /// Commands are recorded inline in the same command buffer
    #[default]
    Inline,
    /// Commands come from secondary command buffers
    SecondaryCommandBuffers,
}

/// Multisample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleCount {
    /// No multisampling
    #[default]
    X1,
    /// 2x MSAA
    X2,
    /// 4x MSAA
    X4,
    /// 8x MSAA
    X8,
}

impl SampleCount {
    /// Sample count as an integer
    pub fn count(self) -> u32 {
        match self {
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
        }
    }
}
