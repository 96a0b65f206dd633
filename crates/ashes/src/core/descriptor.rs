//! Descriptor set layouts and writes
//!
//! Binding numbers map one-to-one onto GL uniform-block binding points and
//! texture units, and onto Vulkan binding numbers. Shaders must declare
//! matching explicit bindings; this is a contract, not something the
//! backends can verify.

use crate::core::flags::ShaderStageFlags;
use crate::core::handles::{BufferHandle, ImageViewHandle, SamplerHandle};

/// Kind of resource a binding holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorType {
    /// Uniform buffer (or range of one)
    UniformBuffer,
    /// Storage buffer
    StorageBuffer,
    /// Sampled image together with its sampler
    CombinedImageSampler,
}

/// Declaration of one binding in a set layout
#[derive(Debug, Clone, Copy)]
pub struct DescriptorSetLayoutBinding {
    /// Binding number
    pub binding: u32,
    /// Resource kind
    pub descriptor_type: DescriptorType,
    /// Stages that access the binding
    pub stage_flags: ShaderStageFlags,
}

/// Everything needed to create a descriptor set layout
#[derive(Debug, Clone, Default)]
pub struct DescriptorSetLayoutCreateInfo {
    /// Binding declarations
    pub bindings: Vec<DescriptorSetLayoutBinding>,
}

/// One update written into an allocated descriptor set
#[derive(Debug, Clone, Copy)]
pub enum WriteDescriptorSet {
    /// Bind a buffer range as a uniform buffer
    UniformBuffer {
        /// Target binding number
        binding: u32,
        /// Buffer to bind
        buffer: BufferHandle,
        /// Byte offset into the buffer
        offset: u64,
        /// Byte size of the bound range
        range: u64,
    },
    /// Bind a buffer range as a storage buffer
    StorageBuffer {
        /// Target binding number
        binding: u32,
        /// Buffer to bind
        buffer: BufferHandle,
        /// Byte offset into the buffer
        offset: u64,
        /// Byte size of the bound range
        range: u64,
    },
    /// Bind an image view and sampler pair
    CombinedImageSampler {
        /// Target binding number (also the texture unit on GL)
        binding: u32,
        /// Sampled view
        view: ImageViewHandle,
        /// Sampler
        sampler: SamplerHandle,
    },
}

impl WriteDescriptorSet {
    /// The binding number the write targets
    pub fn binding(&self) -> u32 {
        match *self {
            Self::UniformBuffer { binding, .. }
            | Self::StorageBuffer { binding, .. }
            | Self::CombinedImageSampler { binding, .. } => binding,
        }
    }
}
