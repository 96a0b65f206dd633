//! Core-model to GL-constant conversion tables
//!
//! Pure lookups, exhaustive over the core enums. Everything returns raw GL
//! constants (`glow`'s `u32` values) for the [`super::api::GlContext`]
//! seam.

use crate::core::{
    AccessFlags, BlendFactor, BlendOp, BufferUsageFlags, CompareOp, CullMode, Filter, Format,
    FrontFace, ImageAspectFlags, IndexType, PolygonMode, PrimitiveTopology, ShaderStageFlags,
    StencilOp, WrapMode,
};

/// GL `(internal_format, format, type)` triple for a texture format
pub fn texture_format(format: Format) -> (u32, u32, u32) {
    match format {
        Format::R8Unorm => (glow::R8, glow::RED, glow::UNSIGNED_BYTE),
        Format::Rg8Unorm => (glow::RG8, glow::RG, glow::UNSIGNED_BYTE),
        Format::Rgba8Unorm => (glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
        Format::Rgba8Srgb => (glow::SRGB8_ALPHA8, glow::RGBA, glow::UNSIGNED_BYTE),
        Format::Bgra8Unorm => (glow::RGBA8, glow::BGRA, glow::UNSIGNED_BYTE),
        Format::Bgra8Srgb => (glow::SRGB8_ALPHA8, glow::BGRA, glow::UNSIGNED_BYTE),
        Format::R16Sfloat => (glow::R16F, glow::RED, glow::HALF_FLOAT),
        Format::Rg16Sfloat => (glow::RG16F, glow::RG, glow::HALF_FLOAT),
        Format::Rgba16Sfloat => (glow::RGBA16F, glow::RGBA, glow::HALF_FLOAT),
        Format::R32Sfloat => (glow::R32F, glow::RED, glow::FLOAT),
        Format::Rg32Sfloat => (glow::RG32F, glow::RG, glow::FLOAT),
        Format::Rgb32Sfloat => (glow::RGB32F, glow::RGB, glow::FLOAT),
        Format::Rgba32Sfloat => (glow::RGBA32F, glow::RGBA, glow::FLOAT),
        Format::R8Uint => (glow::R8UI, glow::RED_INTEGER, glow::UNSIGNED_BYTE),
        Format::R32Uint => (glow::R32UI, glow::RED_INTEGER, glow::UNSIGNED_INT),
        Format::Rgba8Uint => (glow::RGBA8UI, glow::RGBA_INTEGER, glow::UNSIGNED_BYTE),
        Format::Rgba32Uint => (glow::RGBA32UI, glow::RGBA_INTEGER, glow::UNSIGNED_INT),
        Format::R32Sint => (glow::R32I, glow::RED_INTEGER, glow::INT),
        Format::Rgba32Sint => (glow::RGBA32I, glow::RGBA_INTEGER, glow::INT),
        Format::D16Unorm => (
            glow::DEPTH_COMPONENT16,
            glow::DEPTH_COMPONENT,
            glow::UNSIGNED_SHORT,
        ),
        Format::D32Sfloat => (glow::DEPTH_COMPONENT32F, glow::DEPTH_COMPONENT, glow::FLOAT),
        Format::D24UnormS8Uint => (
            glow::DEPTH24_STENCIL8,
            glow::DEPTH_STENCIL,
            glow::UNSIGNED_INT_24_8,
        ),
        Format::D32SfloatS8Uint => (
            glow::DEPTH32F_STENCIL8,
            glow::DEPTH_STENCIL,
            glow::FLOAT_32_UNSIGNED_INT_24_8_REV,
        ),
        Format::S8Uint => (glow::STENCIL_INDEX8, glow::STENCIL_INDEX, glow::UNSIGNED_BYTE),
    }
}

/// Vertex attribute layout derived from a format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeFormat {
    /// Component count passed to the pointer call
    pub components: i32,
    /// GL component type
    pub data_type: u32,
    /// Normalize fixed-point data
    pub normalized: bool,
    /// Use the integer pointer entry point
    pub integer: bool,
}

/// Vertex attribute `(size, type, normalized, integer)` for a format
///
/// Depth/stencil formats are not meaningful vertex inputs; they fall back
/// to a single float component so the table stays total.
pub fn attribute_format(format: Format) -> AttributeFormat {
    let (components, data_type, normalized, integer) = match format {
        Format::R8Unorm => (1, glow::UNSIGNED_BYTE, true, false),
        Format::Rg8Unorm => (2, glow::UNSIGNED_BYTE, true, false),
        Format::Rgba8Unorm | Format::Rgba8Srgb => (4, glow::UNSIGNED_BYTE, true, false),
        Format::Bgra8Unorm | Format::Bgra8Srgb => (4, glow::UNSIGNED_BYTE, true, false),
        Format::R16Sfloat => (1, glow::HALF_FLOAT, false, false),
        Format::Rg16Sfloat => (2, glow::HALF_FLOAT, false, false),
        Format::Rgba16Sfloat => (4, glow::HALF_FLOAT, false, false),
        Format::R32Sfloat => (1, glow::FLOAT, false, false),
        Format::Rg32Sfloat => (2, glow::FLOAT, false, false),
        Format::Rgb32Sfloat => (3, glow::FLOAT, false, false),
        Format::Rgba32Sfloat => (4, glow::FLOAT, false, false),
        Format::R8Uint => (1, glow::UNSIGNED_BYTE, false, true),
        Format::R32Uint => (1, glow::UNSIGNED_INT, false, true),
        Format::Rgba8Uint => (4, glow::UNSIGNED_BYTE, false, true),
        Format::Rgba32Uint => (4, glow::UNSIGNED_INT, false, true),
        Format::R32Sint => (1, glow::INT, false, true),
        Format::Rgba32Sint => (4, glow::INT, false, true),
        Format::D16Unorm
        | Format::D32Sfloat
        | Format::D24UnormS8Uint
        | Format::D32SfloatS8Uint
        | Format::S8Uint => (1, glow::FLOAT, false, false),
    };
    AttributeFormat {
        components,
        data_type,
        normalized,
        integer,
    }
}

/// GL primitive mode for a topology
pub fn topology(topology: PrimitiveTopology) -> u32 {
    match topology {
        PrimitiveTopology::PointList => glow::POINTS,
        PrimitiveTopology::LineList => glow::LINES,
        PrimitiveTopology::LineStrip => glow::LINE_STRIP,
        PrimitiveTopology::TriangleList => glow::TRIANGLES,
        PrimitiveTopology::TriangleStrip => glow::TRIANGLE_STRIP,
        PrimitiveTopology::TriangleFan => glow::TRIANGLE_FAN,
        PrimitiveTopology::PatchList { .. } => glow::PATCHES,
    }
}

/// GL blend factor
pub fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
        BlendFactor::ConstantColor => glow::CONSTANT_COLOR,
        BlendFactor::OneMinusConstantColor => glow::ONE_MINUS_CONSTANT_COLOR,
        BlendFactor::ConstantAlpha => glow::CONSTANT_ALPHA,
        BlendFactor::OneMinusConstantAlpha => glow::ONE_MINUS_CONSTANT_ALPHA,
    }
}

/// GL blend equation
pub fn blend_op(op: BlendOp) -> u32 {
    match op {
        BlendOp::Add => glow::FUNC_ADD,
        BlendOp::Subtract => glow::FUNC_SUBTRACT,
        BlendOp::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendOp::Min => glow::MIN,
        BlendOp::Max => glow::MAX,
    }
}

/// GL comparison function
pub fn compare_op(op: CompareOp) -> u32 {
    match op {
        CompareOp::Never => glow::NEVER,
        CompareOp::Less => glow::LESS,
        CompareOp::Equal => glow::EQUAL,
        CompareOp::LessOrEqual => glow::LEQUAL,
        CompareOp::Greater => glow::GREATER,
        CompareOp::NotEqual => glow::NOTEQUAL,
        CompareOp::GreaterOrEqual => glow::GEQUAL,
        CompareOp::Always => glow::ALWAYS,
    }
}

/// GL stencil operation
pub fn stencil_op(op: StencilOp) -> u32 {
    match op {
        StencilOp::Keep => glow::KEEP,
        StencilOp::Zero => glow::ZERO,
        StencilOp::Replace => glow::REPLACE,
        StencilOp::IncrementAndClamp => glow::INCR,
        StencilOp::DecrementAndClamp => glow::DECR,
        StencilOp::Invert => glow::INVERT,
        StencilOp::IncrementAndWrap => glow::INCR_WRAP,
        StencilOp::DecrementAndWrap => glow::DECR_WRAP,
    }
}

/// GL cull-face mode; `None` disables culling
pub fn cull_mode(mode: CullMode) -> Option<u32> {
    match mode {
        CullMode::None => None,
        CullMode::Front => Some(glow::FRONT),
        CullMode::Back => Some(glow::BACK),
        CullMode::FrontAndBack => Some(glow::FRONT_AND_BACK),
    }
}

/// GL winding order
pub fn front_face(face: FrontFace) -> u32 {
    match face {
        FrontFace::CounterClockwise => glow::CCW,
        FrontFace::Clockwise => glow::CW,
    }
}

/// GL polygon fill mode
pub fn polygon_mode(mode: PolygonMode) -> u32 {
    match mode {
        PolygonMode::Fill => glow::FILL,
        PolygonMode::Line => glow::LINE,
        PolygonMode::Point => glow::POINT,
    }
}

/// GL index element type
pub fn index_type(ty: IndexType) -> u32 {
    match ty {
        IndexType::Uint16 => glow::UNSIGNED_SHORT,
        IndexType::Uint32 => glow::UNSIGNED_INT,
    }
}

/// GL sampler filter value
pub fn filter(filter: Filter) -> i32 {
    match filter {
        Filter::Nearest => glow::NEAREST as i32,
        Filter::Linear => glow::LINEAR as i32,
    }
}

/// GL texture wrap value
pub fn wrap_mode(mode: WrapMode) -> i32 {
    match mode {
        WrapMode::Repeat => glow::REPEAT as i32,
        WrapMode::MirroredRepeat => glow::MIRRORED_REPEAT as i32,
        WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE as i32,
        WrapMode::ClampToBorder => glow::CLAMP_TO_BORDER as i32,
    }
}

/// GL shader type for a single-stage flag set
pub fn shader_type(stage: ShaderStageFlags) -> Option<u32> {
    if stage == ShaderStageFlags::VERTEX {
        Some(glow::VERTEX_SHADER)
    } else if stage == ShaderStageFlags::TESSELLATION_CONTROL {
        Some(glow::TESS_CONTROL_SHADER)
    } else if stage == ShaderStageFlags::TESSELLATION_EVALUATION {
        Some(glow::TESS_EVALUATION_SHADER)
    } else if stage == ShaderStageFlags::GEOMETRY {
        Some(glow::GEOMETRY_SHADER)
    } else if stage == ShaderStageFlags::FRAGMENT {
        Some(glow::FRAGMENT_SHADER)
    } else if stage == ShaderStageFlags::COMPUTE {
        Some(glow::COMPUTE_SHADER)
    } else {
        None
    }
}

/// Conservative `glMemoryBarrier` bitmask for a destination access mask
///
/// GL's implicit ordering already covers framebuffer and transfer traffic;
/// only the accesses with an explicit barrier bit contribute. An empty
/// result means the barrier is a no-op on GL.
pub fn barrier_bits(dst_access: AccessFlags) -> u32 {
    let mut bits = 0;
    if dst_access.contains(AccessFlags::INDIRECT_COMMAND_READ) {
        bits |= glow::COMMAND_BARRIER_BIT;
    }
    if dst_access.contains(AccessFlags::INDEX_READ) {
        bits |= glow::ELEMENT_ARRAY_BARRIER_BIT;
    }
    if dst_access.contains(AccessFlags::VERTEX_ATTRIBUTE_READ) {
        bits |= glow::VERTEX_ATTRIB_ARRAY_BARRIER_BIT;
    }
    if dst_access.contains(AccessFlags::UNIFORM_READ) {
        bits |= glow::UNIFORM_BARRIER_BIT;
    }
    if dst_access.contains(AccessFlags::SHADER_READ) {
        bits |= glow::TEXTURE_FETCH_BARRIER_BIT | glow::SHADER_STORAGE_BARRIER_BIT;
    }
    if dst_access.contains(AccessFlags::SHADER_WRITE) {
        bits |= glow::SHADER_STORAGE_BARRIER_BIT | glow::SHADER_IMAGE_ACCESS_BARRIER_BIT;
    }
    if dst_access.contains(AccessFlags::TRANSFER_READ) | dst_access.contains(AccessFlags::TRANSFER_WRITE)
    {
        bits |= glow::TEXTURE_UPDATE_BARRIER_BIT | glow::BUFFER_UPDATE_BARRIER_BIT
            | glow::PIXEL_BUFFER_BARRIER_BIT;
    }
    if dst_access.contains(AccessFlags::COLOR_ATTACHMENT_READ)
        || dst_access.contains(AccessFlags::COLOR_ATTACHMENT_WRITE)
        || dst_access.contains(AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ)
        || dst_access.contains(AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
    {
        bits |= glow::FRAMEBUFFER_BARRIER_BIT;
    }
    if dst_access.contains(AccessFlags::HOST_READ) || dst_access.contains(AccessFlags::HOST_WRITE) {
        bits |= glow::CLIENT_MAPPED_BUFFER_BARRIER_BIT | glow::BUFFER_UPDATE_BARRIER_BIT;
    }
    if dst_access.contains(AccessFlags::MEMORY_READ) || dst_access.contains(AccessFlags::MEMORY_WRITE)
    {
        bits |= glow::ALL_BARRIER_BITS;
    }
    bits
}

/// `glBlitFramebuffer` mask for a set of image aspects
pub fn blit_mask(aspects: ImageAspectFlags) -> u32 {
    let mut mask = 0;
    if aspects.contains(ImageAspectFlags::COLOR) {
        mask |= glow::COLOR_BUFFER_BIT;
    }
    if aspects.contains(ImageAspectFlags::DEPTH) {
        mask |= glow::DEPTH_BUFFER_BIT;
    }
    if aspects.contains(ImageAspectFlags::STENCIL) {
        mask |= glow::STENCIL_BUFFER_BIT;
    }
    mask
}

/// Buffer allocation hint derived from the declared usages
pub fn buffer_usage_hint(usage: BufferUsageFlags) -> u32 {
    if usage.contains(BufferUsageFlags::UNIFORM_BUFFER)
        || usage.contains(BufferUsageFlags::TRANSFER_DST)
    {
        glow::DYNAMIC_DRAW
    } else {
        glow::STATIC_DRAW
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_formats_map_to_depth_triples() {
        assert_eq!(
            texture_format(Format::D32Sfloat),
            (glow::DEPTH_COMPONENT32F, glow::DEPTH_COMPONENT, glow::FLOAT)
        );
        assert_eq!(
            texture_format(Format::D24UnormS8Uint).1,
            glow::DEPTH_STENCIL
        );
    }

    #[test]
    fn integer_formats_use_integer_attribute_path() {
        assert!(attribute_format(Format::Rgba32Uint).integer);
        assert!(!attribute_format(Format::Rgba32Sfloat).integer);
        assert!(attribute_format(Format::Rgba8Unorm).normalized);
    }

    #[test]
    fn patch_topology_maps_to_patches() {
        assert_eq!(
            topology(PrimitiveTopology::PatchList { control_points: 3 }),
            glow::PATCHES
        );
    }

    #[test]
    fn empty_access_mask_is_a_noop_barrier() {
        assert_eq!(barrier_bits(AccessFlags::empty()), 0);
        assert_ne!(barrier_bits(AccessFlags::SHADER_READ), 0);
    }

    #[test]
    fn multi_stage_flag_set_has_no_shader_type() {
        assert!(shader_type(ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT).is_none());
        assert_eq!(
            shader_type(ShaderStageFlags::FRAGMENT),
            Some(glow::FRAGMENT_SHADER)
        );
    }
}
