//! Explicit memory barriers
//!
//! Barriers declare resource-access transitions the way Vulkan does. The
//! Vulkan backend forwards them verbatim; the GL backend maps the
//! destination access mask onto a conservative `glMemoryBarrier` bitmask,
//! or a no-op where GL's implicit ordering already covers the transition.

use crate::core::flags::AccessFlags;
use crate::core::handles::{BufferHandle, ImageHandle};
use crate::core::types::ImageLayout;

/// Global memory barrier
#[derive(Debug, Clone, Copy)]
pub struct MemoryBarrier {
    /// Accesses made available
    pub src_access_mask: AccessFlags,
    /// Accesses made visible
    pub dst_access_mask: AccessFlags,
}

impl MemoryBarrier {
    /// Transfer write then shader read — the common upload pattern
    pub fn transfer_to_shader_read() -> Self {
        Self {
            src_access_mask: AccessFlags::TRANSFER_WRITE,
            dst_access_mask: AccessFlags::SHADER_READ,
        }
    }

    /// Host write then vertex attribute read
    pub fn host_write_to_vertex_read() -> Self {
        Self {
            src_access_mask: AccessFlags::HOST_WRITE,
            dst_access_mask: AccessFlags::VERTEX_ATTRIBUTE_READ,
        }
    }
}

/// Barrier scoped to a buffer range
#[derive(Debug, Clone, Copy)]
pub struct BufferMemoryBarrier {
    /// Buffer whose accesses are ordered
    pub buffer: BufferHandle,
    /// Accesses made available
    pub src_access_mask: AccessFlags,
    /// Accesses made visible
    pub dst_access_mask: AccessFlags,
    /// Byte offset of the range
    pub offset: u64,
    /// Byte size of the range (`u64::MAX` for the whole buffer)
    pub size: u64,
}

impl BufferMemoryBarrier {
    /// Barrier covering the whole buffer
    pub fn whole(buffer: BufferHandle, src: AccessFlags, dst: AccessFlags) -> Self {
        Self {
            buffer,
            src_access_mask: src,
            dst_access_mask: dst,
            offset: 0,
            size: u64::MAX,
        }
    }
}

/// Barrier and layout transition scoped to an image
#[derive(Debug, Clone, Copy)]
pub struct ImageMemoryBarrier {
    /// Image whose accesses are ordered
    pub image: ImageHandle,
    /// Accesses made available
    pub src_access_mask: AccessFlags,
    /// Accesses made visible
    pub dst_access_mask: AccessFlags,
    /// Layout before the barrier
    pub old_layout: ImageLayout,
    /// Layout after the barrier
    pub new_layout: ImageLayout,
}

impl ImageMemoryBarrier {
    /// Transfer-destination to shader-read transition, the texture upload tail
    pub fn transfer_dst_to_shader_read(image: ImageHandle) -> Self {
        Self {
            image,
            src_access_mask: AccessFlags::TRANSFER_WRITE,
            dst_access_mask: AccessFlags::SHADER_READ,
            old_layout: ImageLayout::TransferDstOptimal,
            new_layout: ImageLayout::ShaderReadOnlyOptimal,
        }
    }
}
