//! The native-call seam
//!
//! Exactly the set of GL entry points the backend uses, behind an
//! object-safe trait. Resource names are plain `u32`s issued by the
//! implementation; `0` always means "none" (unbind, detach, default
//! framebuffer). Enum-typed parameters are raw GL constants produced by
//! [`super::convert`], so an implementation is a transcription, not a
//! translation.
//!
//! Replay assumes nothing about leftover state between calls other than
//! what it set itself through this trait on the same context.

/// Native OpenGL entry points used by the backend
#[allow(clippy::missing_errors_doc)]
pub trait GlContext {
    // buffers

    /// `glGenBuffers`
    fn create_buffer(&self) -> Result<u32, String>;
    /// `glDeleteBuffers`
    fn delete_buffer(&self, buffer: u32);
    /// `glBindBuffer`; `buffer == 0` unbinds
    fn bind_buffer(&self, target: u32, buffer: u32);
    /// `glBindBufferRange`
    fn bind_buffer_range(&self, target: u32, index: u32, buffer: u32, offset: i32, size: i32);
    /// `glBufferData` with a null pointer (storage allocation)
    fn buffer_data_size(&self, target: u32, size: i32, usage: u32);
    /// `glBufferSubData`
    fn buffer_sub_data(&self, target: u32, offset: i32, data: &[u8]);
    /// `glCopyBufferSubData`
    fn copy_buffer_sub_data(
        &self,
        src_target: u32,
        dst_target: u32,
        src_offset: i32,
        dst_offset: i32,
        size: i32,
    );

    // textures and samplers

    /// `glGenTextures`
    fn create_texture(&self) -> Result<u32, String>;
    /// `glDeleteTextures`
    fn delete_texture(&self, texture: u32);
    /// `glActiveTexture`; `unit` is an index, not `GL_TEXTURE0 + i`
    fn active_texture(&self, unit: u32);
    /// `glBindTexture`; `texture == 0` unbinds
    fn bind_texture(&self, target: u32, texture: u32);
    /// `glTexStorage2D`
    fn tex_storage_2d(&self, target: u32, levels: i32, internal_format: u32, width: i32, height: i32);
    /// `glTexImage2DMultisample`
    fn tex_image_2d_multisample(
        &self,
        target: u32,
        samples: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    );
    /// `glTexSubImage2D` sourcing texels from the bound `PIXEL_UNPACK_BUFFER`
    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image_2d_from_buffer(
        &self,
        target: u32,
        level: i32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: u32,
        data_type: u32,
        buffer_offset: u32,
    );
    /// `glGenSamplers`
    fn create_sampler(&self) -> Result<u32, String>;
    /// `glDeleteSamplers`
    fn delete_sampler(&self, sampler: u32);
    /// `glBindSampler`
    fn bind_sampler(&self, unit: u32, sampler: u32);
    /// `glSamplerParameteri`
    fn sampler_parameter_i32(&self, sampler: u32, parameter: u32, value: i32);

    // shaders and programs

    /// `glCreateShader`
    fn create_shader(&self, shader_type: u32) -> Result<u32, String>;
    /// `glDeleteShader`
    fn delete_shader(&self, shader: u32);
    /// `glShaderSource`
    fn shader_source(&self, shader: u32, source: &str);
    /// `glCompileShader`
    fn compile_shader(&self, shader: u32);
    /// `glGetShaderiv(GL_COMPILE_STATUS)`
    fn get_shader_compile_status(&self, shader: u32) -> bool;
    /// `glGetShaderInfoLog`
    fn get_shader_info_log(&self, shader: u32) -> String;
    /// `glCreateProgram`
    fn create_program(&self) -> Result<u32, String>;
    /// `glDeleteProgram`
    fn delete_program(&self, program: u32);
    /// `glAttachShader`
    fn attach_shader(&self, program: u32, shader: u32);
    /// `glLinkProgram`
    fn link_program(&self, program: u32);
    /// `glGetProgramiv(GL_LINK_STATUS)`
    fn get_program_link_status(&self, program: u32) -> bool;
    /// `glGetProgramInfoLog`
    fn get_program_info_log(&self, program: u32) -> String;
    /// `glUseProgram`; `program == 0` unbinds
    fn use_program(&self, program: u32);

    // vertex arrays

    /// `glGenVertexArrays`
    fn create_vertex_array(&self) -> Result<u32, String>;
    /// `glDeleteVertexArrays`
    fn delete_vertex_array(&self, vertex_array: u32);
    /// `glBindVertexArray`
    fn bind_vertex_array(&self, vertex_array: u32);
    /// `glEnableVertexAttribArray`
    fn enable_vertex_attrib_array(&self, index: u32);
    /// `glVertexAttribPointer` (float path)
    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    /// `glVertexAttribIPointer`
    fn vertex_attrib_pointer_i32(&self, index: u32, size: i32, data_type: u32, stride: i32, offset: i32);
    /// `glVertexAttribDivisor`
    fn vertex_attrib_divisor(&self, index: u32, divisor: u32);

    // framebuffers

    /// `glGenFramebuffers`
    fn create_framebuffer(&self) -> Result<u32, String>;
    /// `glDeleteFramebuffers`
    fn delete_framebuffer(&self, framebuffer: u32);
    /// `glBindFramebuffer`; `framebuffer == 0` binds the default framebuffer
    fn bind_framebuffer(&self, target: u32, framebuffer: u32);
    /// `glFramebufferTexture2D`; `texture == 0` detaches
    fn framebuffer_texture_2d(
        &self,
        target: u32,
        attachment: u32,
        texture_target: u32,
        texture: u32,
        level: i32,
    );
    /// `glCheckFramebufferStatus`
    fn check_framebuffer_status(&self, target: u32) -> u32;
    /// `glDrawBuffers`
    fn draw_buffers(&self, buffers: &[u32]);
    /// `glReadBuffer`
    fn read_buffer(&self, src: u32);
    /// `glBlitFramebuffer`
    #[allow(clippy::too_many_arguments)]
    fn blit_framebuffer(
        &self,
        src_x0: i32,
        src_y0: i32,
        src_x1: i32,
        src_y1: i32,
        dst_x0: i32,
        dst_y0: i32,
        dst_x1: i32,
        dst_y1: i32,
        mask: u32,
        filter: u32,
    );
    /// `glInvalidateFramebuffer`
    fn invalidate_framebuffer(&self, target: u32, attachments: &[u32]);

    // clears

    /// `glClear`
    fn clear(&self, mask: u32);
    /// `glClearColor`
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    /// `glClearDepthf`
    fn clear_depth(&self, depth: f32);
    /// `glClearStencil`
    fn clear_stencil(&self, stencil: i32);
    /// `glClearBufferfv`
    fn clear_buffer_f32(&self, target: u32, draw_buffer: u32, values: &[f32]);
    /// `glClearBufferiv`
    fn clear_buffer_i32(&self, target: u32, draw_buffer: u32, values: &[i32]);
    /// `glClearBufferuiv`
    fn clear_buffer_u32(&self, target: u32, draw_buffer: u32, values: &[u32]);
    /// `glClearBufferfi`
    fn clear_buffer_depth_stencil(&self, target: u32, draw_buffer: u32, depth: f32, stencil: i32);

    // fixed-function state

    /// `glEnable`
    fn enable(&self, cap: u32);
    /// `glDisable`
    fn disable(&self, cap: u32);
    /// `glViewport`
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    /// `glScissor`
    fn scissor(&self, x: i32, y: i32, width: i32, height: i32);
    /// `glColorMask`
    fn color_mask(&self, r: bool, g: bool, b: bool, a: bool);
    /// `glDepthMask`
    fn depth_mask(&self, enabled: bool);
    /// `glDepthFunc`
    fn depth_func(&self, func: u32);
    /// `glStencilFuncSeparate`
    fn stencil_func_separate(&self, face: u32, func: u32, reference: i32, mask: u32);
    /// `glStencilOpSeparate`
    fn stencil_op_separate(&self, face: u32, fail: u32, depth_fail: u32, pass: u32);
    /// `glStencilMaskSeparate`
    fn stencil_mask_separate(&self, face: u32, mask: u32);
    /// `glBlendFuncSeparate`
    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32);
    /// `glBlendEquationSeparate`
    fn blend_equation_separate(&self, mode_rgb: u32, mode_alpha: u32);
    /// `glBlendColor`
    fn blend_color(&self, r: f32, g: f32, b: f32, a: f32);
    /// `glCullFace`
    fn cull_face(&self, mode: u32);
    /// `glFrontFace`
    fn front_face(&self, mode: u32);
    /// `glPolygonMode(GL_FRONT_AND_BACK, mode)`
    fn polygon_mode(&self, mode: u32);
    /// `glPolygonOffset`
    fn polygon_offset(&self, factor: f32, units: f32);
    /// `glLineWidth`
    fn line_width(&self, width: f32);
    /// `glPatchParameteri`
    fn patch_parameter_i32(&self, parameter: u32, value: i32);

    // draws

    /// `glDrawArrays`
    fn draw_arrays(&self, mode: u32, first: i32, count: i32);
    /// `glDrawArraysInstanced`
    fn draw_arrays_instanced(&self, mode: u32, first: i32, count: i32, instance_count: i32);
    /// `glDrawElementsBaseVertex`
    fn draw_elements_base_vertex(
        &self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        base_vertex: i32,
    );
    /// `glDrawElementsInstancedBaseVertex`
    #[allow(clippy::too_many_arguments)]
    fn draw_elements_instanced_base_vertex(
        &self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        instance_count: i32,
        base_vertex: i32,
    );

    // barriers, sync, queries

    /// `glMemoryBarrier`
    fn memory_barrier(&self, barriers: u32);
    /// `glFenceSync(GL_SYNC_GPU_COMMANDS_COMPLETE)`
    fn fence_sync(&self) -> Result<u64, String>;
    /// `glDeleteSync`
    fn delete_sync(&self, sync: u64);
    /// `glClientWaitSync`; returns the raw GL wait status
    fn client_wait_sync(&self, sync: u64, flags: u32, timeout_ns: i32) -> u32;
    /// `glGenQueries`
    fn create_query(&self) -> Result<u32, String>;
    /// `glDeleteQueries`
    fn delete_query(&self, query: u32);
    /// `glQueryCounter(GL_TIMESTAMP)`
    fn query_counter(&self, query: u32);
    /// `glGetQueryObjectuiv(GL_QUERY_RESULT)`
    fn get_query_result(&self, query: u32) -> u64;

    // presentation

    /// Swap the window's back buffer (a windowing-layer callback, not a GL call)
    fn swap_buffers(&self);
}
