//! Create-infos for device resources
//!
//! The resource objects themselves live inside the backend devices; the
//! core only defines what it takes to create them and the barrier/bind
//! contracts the command stream needs.

use crate::core::flags::{BufferUsageFlags, ImageAspectFlags, ImageUsageFlags, ShaderStageFlags};
use crate::core::format::Format;
use crate::core::types::{Extent3D, SampleCount};

/// Everything needed to create a buffer
#[derive(Debug, Clone, Copy)]
pub struct BufferCreateInfo {
    /// Size in bytes
    pub size: u64,
    /// Declared usages
    pub usage: BufferUsageFlags,
}

/// Everything needed to create an image
#[derive(Debug, Clone, Copy)]
pub struct ImageCreateInfo {
    /// Pixel format
    pub format: Format,
    /// Image size
    pub extent: Extent3D,
    /// Mip level count
    pub mip_levels: u32,
    /// Sample count
    pub samples: SampleCount,
    /// Declared usages
    pub usage: ImageUsageFlags,
}

impl ImageCreateInfo {
    /// Single-sampled 2D image with one mip level
    pub fn plain_2d(format: Format, width: u32, height: u32, usage: ImageUsageFlags) -> Self {
        Self {
            format,
            extent: Extent3D {
                width,
                height,
                depth: 1,
            },
            mip_levels: 1,
            samples: SampleCount::X1,
            usage,
        }
    }
}

/// Everything needed to create an image view
#[derive(Debug, Clone, Copy)]
pub struct ImageViewCreateInfo {
    /// Viewed image handle is supplied separately to `create_image_view`
    pub format: Format,
    /// Aspects exposed by the view
    pub aspects: ImageAspectFlags,
    /// First mip level
    pub base_mip_level: u32,
    /// Number of mip levels
    pub level_count: u32,
}

impl ImageViewCreateInfo {
    /// View covering the image's base level with the format's own aspects
    pub fn whole(format: Format) -> Self {
        Self {
            format,
            aspects: format.aspects(),
            base_mip_level: 0,
            level_count: 1,
        }
    }
}

/// Texel filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// Nearest-texel sampling
    Nearest,
    /// Linear interpolation
    #[default]
    Linear,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Repeat the texture
    #[default]
    Repeat,
    /// Mirror on each repeat
    MirroredRepeat,
    /// Clamp to the edge texel
    ClampToEdge,
    /// Clamp to the border color
    ClampToBorder,
}

/// Everything needed to create a sampler
#[derive(Debug, Clone, Copy, Default)]
pub struct SamplerCreateInfo {
    /// Magnification filter
    pub mag_filter: Filter,
    /// Minification filter
    pub min_filter: Filter,
    /// U coordinate wrapping
    pub wrap_u: WrapMode,
    /// V coordinate wrapping
    pub wrap_v: WrapMode,
}

/// Shader byte code or source, supplied by an external compilation step
#[derive(Debug, Clone)]
pub enum ShaderSource {
    /// GLSL source text (GL backend)
    Glsl(String),
    /// SPIR-V words (Vulkan backend)
    SpirV(Vec<u32>),
}

/// Everything needed to create a shader module
#[derive(Debug, Clone)]
pub struct ShaderModuleCreateInfo {
    /// The single stage the module implements
    pub stage: ShaderStageFlags,
    /// Source or byte code
    pub source: ShaderSource,
}

impl ShaderModuleCreateInfo {
    /// GLSL module for one stage
    pub fn glsl(stage: ShaderStageFlags, source: impl Into<String>) -> Self {
        Self {
            stage,
            source: ShaderSource::Glsl(source.into()),
        }
    }

    /// SPIR-V module for one stage
    pub fn spirv(stage: ShaderStageFlags, words: Vec<u32>) -> Self {
        Self {
            stage,
            source: ShaderSource::SpirV(words),
        }
    }
}
