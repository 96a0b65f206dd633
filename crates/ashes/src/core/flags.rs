//! Bit-flag types shared by the recording and replay layers

use bitflags::bitflags;

bitflags! {
    /// Options affecting how a command buffer may be recorded and replayed
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CommandBufferUsageFlags: u32 {
        /// The buffer will be submitted once and then re-recorded
        const ONE_TIME_SUBMIT = 1 << 0;
        /// Secondary buffer lives entirely inside a render pass
        const RENDER_PASS_CONTINUE = 1 << 1;
        /// The buffer may be resubmitted while a prior submission is pending
        const SIMULTANEOUS_USE = 1 << 2;
    }
}

bitflags! {
    /// Pipeline execution stages, used in barriers and submission waits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PipelineStageFlags: u32 {
        /// Start of the pipeline
        const TOP_OF_PIPE = 1 << 0;
        /// Indirect parameter reads
        const DRAW_INDIRECT = 1 << 1;
        /// Vertex and index buffer reads
        const VERTEX_INPUT = 1 << 2;
        /// Vertex shader execution
        const VERTEX_SHADER = 1 << 3;
        /// Fragment shader execution
        const FRAGMENT_SHADER = 1 << 4;
        /// Early per-fragment depth/stencil tests
        const EARLY_FRAGMENT_TESTS = 1 << 5;
        /// Late per-fragment depth/stencil tests
        const LATE_FRAGMENT_TESTS = 1 << 6;
        /// Color attachment writes
        const COLOR_ATTACHMENT_OUTPUT = 1 << 7;
        /// Compute shader execution
        const COMPUTE_SHADER = 1 << 8;
        /// Copy operations
        const TRANSFER = 1 << 9;
        /// End of the pipeline
        const BOTTOM_OF_PIPE = 1 << 10;
        /// Host access
        const HOST = 1 << 11;
        /// All graphics stages
        const ALL_GRAPHICS = 1 << 12;
        /// Every stage
        const ALL_COMMANDS = 1 << 13;
    }
}

bitflags! {
    /// Memory access kinds, used in barriers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AccessFlags: u32 {
        /// Indirect command reads
        const INDIRECT_COMMAND_READ = 1 << 0;
        /// Index buffer reads
        const INDEX_READ = 1 << 1;
        /// Vertex attribute reads
        const VERTEX_ATTRIBUTE_READ = 1 << 2;
        /// Uniform buffer reads
        const UNIFORM_READ = 1 << 3;
        /// Input attachment reads
        const INPUT_ATTACHMENT_READ = 1 << 4;
        /// Any shader read (sampled images, storage)
        const SHADER_READ = 1 << 5;
        /// Any shader write (storage)
        const SHADER_WRITE = 1 << 6;
        /// Color attachment reads (blending)
        const COLOR_ATTACHMENT_READ = 1 << 7;
        /// Color attachment writes
        const COLOR_ATTACHMENT_WRITE = 1 << 8;
        /// Depth/stencil reads
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 9;
        /// Depth/stencil writes
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 10;
        /// Transfer reads
        const TRANSFER_READ = 1 << 11;
        /// Transfer writes
        const TRANSFER_WRITE = 1 << 12;
        /// Host reads
        const HOST_READ = 1 << 13;
        /// Host writes
        const HOST_WRITE = 1 << 14;
        /// Any read
        const MEMORY_READ = 1 << 15;
        /// Any write
        const MEMORY_WRITE = 1 << 16;
    }
}

bitflags! {
    /// Image aspect selection
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ImageAspectFlags: u32 {
        /// Color component
        const COLOR = 1 << 0;
        /// Depth component
        const DEPTH = 1 << 1;
        /// Stencil component
        const STENCIL = 1 << 2;
    }
}

bitflags! {
    /// Declared usages of a buffer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BufferUsageFlags: u32 {
        /// Source of transfer commands
        const TRANSFER_SRC = 1 << 0;
        /// Destination of transfer commands
        const TRANSFER_DST = 1 << 1;
        /// Bound as a uniform buffer
        const UNIFORM_BUFFER = 1 << 2;
        /// Bound as a storage buffer
        const STORAGE_BUFFER = 1 << 3;
        /// Bound as an index buffer
        const INDEX_BUFFER = 1 << 4;
        /// Bound as a vertex buffer
        const VERTEX_BUFFER = 1 << 5;
    }
}

bitflags! {
    /// Declared usages of an image
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ImageUsageFlags: u32 {
        /// Source of transfer commands
        const TRANSFER_SRC = 1 << 0;
        /// Destination of transfer commands
        const TRANSFER_DST = 1 << 1;
        /// Sampled in shaders
        const SAMPLED = 1 << 2;
        /// Used as a color attachment
        const COLOR_ATTACHMENT = 1 << 3;
        /// Used as a depth/stencil attachment
        const DEPTH_STENCIL_ATTACHMENT = 1 << 4;
    }
}

bitflags! {
    /// Shader stages a resource or constant range is visible to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ShaderStageFlags: u32 {
        /// Vertex shader
        const VERTEX = 1 << 0;
        /// Tessellation control shader
        const TESSELLATION_CONTROL = 1 << 1;
        /// Tessellation evaluation shader
        const TESSELLATION_EVALUATION = 1 << 2;
        /// Geometry shader
        const GEOMETRY = 1 << 3;
        /// Fragment shader
        const FRAGMENT = 1 << 4;
        /// Compute shader
        const COMPUTE = 1 << 5;
    }
}

bitflags! {
    /// Color channels written by a pipeline's blend attachment
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ColorComponentFlags: u32 {
        /// Red channel
        const R = 1 << 0;
        /// Green channel
        const G = 1 << 1;
        /// Blue channel
        const B = 1 << 2;
        /// Alpha channel
        const A = 1 << 3;
    }
}

impl Default for ColorComponentFlags {
    fn default() -> Self {
        Self::all()
    }
}
