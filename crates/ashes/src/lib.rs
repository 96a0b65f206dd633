//! # Ashes
//!
//! A graphics-API abstraction that exposes a Vulkan-style interface —
//! explicit render passes, immutable pipelines, and replayable command
//! buffers — on top of two native backends:
//!
//! - **OpenGL** ([`gl`]): commands recorded into a [`core::CommandBuffer`]
//!   are deferred and replayed against the GL state machine when the queue
//!   is submitted.
//! - **Vulkan** ([`vk`]): a pass-through backend that re-encodes the
//!   recorded commands into a native command buffer.
//!
//! Recording never touches a native API. A command buffer is an ordered,
//! immutable script; submission is the execution trigger.
//!
//! ## Quick Start
//!
//! ```rust
//! use ashes::core::{CommandBuffer, CommandBufferUsageFlags};
//!
//! let mut cmd = CommandBuffer::new();
//! cmd.begin(CommandBufferUsageFlags::empty())?;
//! cmd.cmd_draw(3, 1, 0, 0)?;
//! cmd.end()?;
//! assert_eq!(cmd.commands().len(), 1);
//! # Ok::<(), ashes::core::RecordError>(())
//! ```

pub mod config;
pub mod core;
pub mod gl;
pub mod logging;
pub mod vk;

/// Common imports for crate users
pub mod prelude {
    pub use crate::config::{BackendKind, RendererConfig};
    pub use crate::core::{
        AshesError, AshesResult, ClearColorValue, ClearValue, Command, CommandBuffer,
        CommandBufferUsageFlags, CommandPool, Extent2D, Format, Framebuffer, RecordError,
        RenderPass, RenderPassCreateInfo, Viewport, WaitResult,
    };
    pub use crate::gl::{CaptureContext, GlContext, GlDevice, GlQueue};
}
