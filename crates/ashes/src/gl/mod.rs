//! OpenGL backend
//!
//! Replays recorded command buffers against OpenGL's global state machine.
//! All native access goes through the [`GlContext`] trait so the replay
//! engine can run against the real driver ([`GlowContext`]) or a headless
//! call recorder ([`CaptureContext`]) in tests.

mod api;
mod convert;
mod device;
mod glow_context;
mod queue;
mod recording;
mod swapchain;

pub use api::GlContext;
pub use device::GlDevice;
pub use glow_context::GlowContext;
pub use queue::GlQueue;
pub use recording::{CallLog, CaptureContext, GlCall};
pub use swapchain::GlSwapchain;

/// Uniform-block binding point reserved for the push-constant buffer
///
/// Shaders consuming push constants on GL must declare their block with
/// `layout(std140, binding = 15)`. Descriptor bindings must stay below it.
pub const PUSH_CONSTANT_BINDING: u32 = 15;

/// Size of the push-constant staging buffer in bytes
pub const PUSH_CONSTANT_SIZE: u32 = 256;
