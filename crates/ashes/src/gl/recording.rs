//! Headless call-recording context
//!
//! [`CaptureContext`] implements [`GlContext`] without a GPU: every call is
//! appended to a shared [`CallLog`] and resource names are handed out from
//! a counter. Replay tests assert on the log the way a golden trace would
//! be checked against a real driver.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::api::GlContext;

/// One recorded native call
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum GlCall {
    CreateBuffer { buffer: u32 },
    DeleteBuffer { buffer: u32 },
    BindBuffer { target: u32, buffer: u32 },
    BindBufferRange { target: u32, index: u32, buffer: u32, offset: i32, size: i32 },
    BufferData { target: u32, size: i32, usage: u32 },
    BufferSubData { target: u32, offset: i32, data: Vec<u8> },
    CopyBufferSubData { src_target: u32, dst_target: u32, src_offset: i32, dst_offset: i32, size: i32 },
    CreateTexture { texture: u32 },
    DeleteTexture { texture: u32 },
    ActiveTexture { unit: u32 },
    BindTexture { target: u32, texture: u32 },
    TexStorage2D { target: u32, levels: i32, internal_format: u32, width: i32, height: i32 },
    TexImage2DMultisample { target: u32, samples: i32, internal_format: u32, width: i32, height: i32 },
    TexSubImage2D { target: u32, level: i32, x: i32, y: i32, width: i32, height: i32, format: u32, data_type: u32, buffer_offset: u32 },
    CreateSampler { sampler: u32 },
    DeleteSampler { sampler: u32 },
    BindSampler { unit: u32, sampler: u32 },
    SamplerParameterI32 { sampler: u32, parameter: u32, value: i32 },
    CreateShader { shader: u32, shader_type: u32 },
    DeleteShader { shader: u32 },
    ShaderSource { shader: u32, source: String },
    CompileShader { shader: u32 },
    CreateProgram { program: u32 },
    DeleteProgram { program: u32 },
    AttachShader { program: u32, shader: u32 },
    LinkProgram { program: u32 },
    UseProgram { program: u32 },
    CreateVertexArray { vertex_array: u32 },
    DeleteVertexArray { vertex_array: u32 },
    BindVertexArray { vertex_array: u32 },
    EnableVertexAttribArray { index: u32 },
    VertexAttribPointerF32 { index: u32, size: i32, data_type: u32, normalized: bool, stride: i32, offset: i32 },
    VertexAttribPointerI32 { index: u32, size: i32, data_type: u32, stride: i32, offset: i32 },
    VertexAttribDivisor { index: u32, divisor: u32 },
    CreateFramebuffer { framebuffer: u32 },
    DeleteFramebuffer { framebuffer: u32 },
    BindFramebuffer { target: u32, framebuffer: u32 },
    FramebufferTexture2D { target: u32, attachment: u32, texture_target: u32, texture: u32, level: i32 },
    DrawBuffers { buffers: Vec<u32> },
    ReadBuffer { src: u32 },
    BlitFramebuffer { src_x0: i32, src_y0: i32, src_x1: i32, src_y1: i32, dst_x0: i32, dst_y0: i32, dst_x1: i32, dst_y1: i32, mask: u32, filter: u32 },
    InvalidateFramebuffer { target: u32, attachments: Vec<u32> },
    Clear { mask: u32 },
    ClearColor { r: f32, g: f32, b: f32, a: f32 },
    ClearDepth { depth: f32 },
    ClearStencil { stencil: i32 },
    ClearBufferF32 { target: u32, draw_buffer: u32, values: Vec<f32> },
    ClearBufferI32 { target: u32, draw_buffer: u32, values: Vec<i32> },
    ClearBufferU32 { target: u32, draw_buffer: u32, values: Vec<u32> },
    ClearBufferDepthStencil { target: u32, draw_buffer: u32, depth: f32, stencil: i32 },
    Enable { cap: u32 },
    Disable { cap: u32 },
    Viewport { x: i32, y: i32, width: i32, height: i32 },
    Scissor { x: i32, y: i32, width: i32, height: i32 },
    ColorMask { r: bool, g: bool, b: bool, a: bool },
    DepthMask { enabled: bool },
    DepthFunc { func: u32 },
    StencilFuncSeparate { face: u32, func: u32, reference: i32, mask: u32 },
    StencilOpSeparate { face: u32, fail: u32, depth_fail: u32, pass: u32 },
    StencilMaskSeparate { face: u32, mask: u32 },
    BlendFuncSeparate { src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32 },
    BlendEquationSeparate { mode_rgb: u32, mode_alpha: u32 },
    BlendColor { r: f32, g: f32, b: f32, a: f32 },
    CullFace { mode: u32 },
    FrontFace { mode: u32 },
    PolygonMode { mode: u32 },
    PolygonOffset { factor: f32, units: f32 },
    LineWidth { width: f32 },
    PatchParameterI32 { parameter: u32, value: i32 },
    DrawArrays { mode: u32, first: i32, count: i32 },
    DrawArraysInstanced { mode: u32, first: i32, count: i32, instance_count: i32 },
    DrawElementsBaseVertex { mode: u32, count: i32, element_type: u32, offset: i32, base_vertex: i32 },
    DrawElementsInstancedBaseVertex { mode: u32, count: i32, element_type: u32, offset: i32, instance_count: i32, base_vertex: i32 },
    MemoryBarrier { barriers: u32 },
    FenceSync { sync: u64 },
    DeleteSync { sync: u64 },
    ClientWaitSync { sync: u64, flags: u32, timeout_ns: i32 },
    CreateQuery { query: u32 },
    DeleteQuery { query: u32 },
    QueryCounter { query: u32 },
    GetQueryResult { query: u32 },
    SwapBuffers,
}

/// Shared, inspectable log of recorded calls
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Rc<RefCell<Vec<GlCall>>>,
}

impl CallLog {
    /// Copy of the calls recorded so far
    pub fn snapshot(&self) -> Vec<GlCall> {
        self.calls.borrow().clone()
    }

    /// Drop everything recorded so far
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Number of recorded calls
    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    /// Index of the first call matching `predicate`
    pub fn position(&self, predicate: impl FnMut(&GlCall) -> bool) -> Option<usize> {
        self.calls.borrow().iter().position(predicate)
    }

    fn push(&self, call: GlCall) {
        self.calls.borrow_mut().push(call);
    }
}

/// A [`GlContext`] that records instead of executing
///
/// Clones share the same log and name counters, so a clone can be handed
/// to the device while the test keeps inspecting the original.
#[derive(Debug, Clone)]
pub struct CaptureContext {
    log: CallLog,
    next_name: Rc<Cell<u32>>,
    next_sync: Rc<Cell<u64>>,
}

impl Default for CaptureContext {
    fn default() -> Self {
        Self {
            log: CallLog::default(),
            next_name: Rc::new(Cell::new(1)),
            next_sync: Rc::new(Cell::new(1)),
        }
    }
}

impl CaptureContext {
    /// New context with an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the shared call log
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn next_name(&self) -> u32 {
        let name = self.next_name.get();
        self.next_name.set(name + 1);
        name
    }
}

impl GlContext for CaptureContext {
    fn create_buffer(&self) -> Result<u32, String> {
        let buffer = self.next_name();
        self.log.push(GlCall::CreateBuffer { buffer });
        Ok(buffer)
    }

    fn delete_buffer(&self, buffer: u32) {
        self.log.push(GlCall::DeleteBuffer { buffer });
    }

    fn bind_buffer(&self, target: u32, buffer: u32) {
        self.log.push(GlCall::BindBuffer { target, buffer });
    }

    fn bind_buffer_range(&self, target: u32, index: u32, buffer: u32, offset: i32, size: i32) {
        self.log.push(GlCall::BindBufferRange {
            target,
            index,
            buffer,
            offset,
            size,
        });
    }

    fn buffer_data_size(&self, target: u32, size: i32, usage: u32) {
        self.log.push(GlCall::BufferData { target, size, usage });
    }

    fn buffer_sub_data(&self, target: u32, offset: i32, data: &[u8]) {
        self.log.push(GlCall::BufferSubData {
            target,
            offset,
            data: data.to_vec(),
        });
    }

    fn copy_buffer_sub_data(
        &self,
        src_target: u32,
        dst_target: u32,
        src_offset: i32,
        dst_offset: i32,
        size: i32,
    ) {
        self.log.push(GlCall::CopyBufferSubData {
            src_target,
            dst_target,
            src_offset,
            dst_offset,
            size,
        });
    }

    fn create_texture(&self) -> Result<u32, String> {
        let texture = self.next_name();
        self.log.push(GlCall::CreateTexture { texture });
        Ok(texture)
    }

    fn delete_texture(&self, texture: u32) {
        self.log.push(GlCall::DeleteTexture { texture });
    }

    fn active_texture(&self, unit: u32) {
        self.log.push(GlCall::ActiveTexture { unit });
    }

    fn bind_texture(&self, target: u32, texture: u32) {
        self.log.push(GlCall::BindTexture { target, texture });
    }

    fn tex_storage_2d(&self, target: u32, levels: i32, internal_format: u32, width: i32, height: i32) {
        self.log.push(GlCall::TexStorage2D {
            target,
            levels,
            internal_format,
            width,
            height,
        });
    }

    fn tex_image_2d_multisample(
        &self,
        target: u32,
        samples: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    ) {
        self.log.push(GlCall::TexImage2DMultisample {
            target,
            samples,
            internal_format,
            width,
            height,
        });
    }

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
    ) {
        self.log.push(GlCall::TexSubImage2D {
            target,
            level,
            x,
            y,
            width,
            height,
            format,
            data_type,
            buffer_offset,
        });
    }

    fn create_sampler(&self) -> Result<u32, String> {
        let sampler = self.next_name();
        self.log.push(GlCall::CreateSampler { sampler });
        Ok(sampler)
    }

    fn delete_sampler(&self, sampler: u32) {
        self.log.push(GlCall::DeleteSampler { sampler });
    }

    fn bind_sampler(&self, unit: u32, sampler: u32) {
        self.log.push(GlCall::BindSampler { unit, sampler });
    }

    fn sampler_parameter_i32(&self, sampler: u32, parameter: u32, value: i32) {
        self.log.push(GlCall::SamplerParameterI32 {
            sampler,
            parameter,
            value,
        });
    }

    fn create_shader(&self, shader_type: u32) -> Result<u32, String> {
        let shader = self.next_name();
        self.log.push(GlCall::CreateShader { shader, shader_type });
        Ok(shader)
    }

    fn delete_shader(&self, shader: u32) {
        self.log.push(GlCall::DeleteShader { shader });
    }

    fn shader_source(&self, shader: u32, source: &str) {
        self.log.push(GlCall::ShaderSource {
            shader,
            source: source.to_owned(),
        });
    }

    fn compile_shader(&self, shader: u32) {
        self.log.push(GlCall::CompileShader { shader });
    }

    fn get_shader_compile_status(&self, _shader: u32) -> bool {
        true
    }

    fn get_shader_info_log(&self, _shader: u32) -> String {
        String::new()
    }

    fn create_program(&self) -> Result<u32, String> {
        let program = self.next_name();
        self.log.push(GlCall::CreateProgram { program });
        Ok(program)
    }

    fn delete_program(&self, program: u32) {
        self.log.push(GlCall::DeleteProgram { program });
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.log.push(GlCall::AttachShader { program, shader });
    }

    fn link_program(&self, program: u32) {
        self.log.push(GlCall::LinkProgram { program });
    }

    fn get_program_link_status(&self, _program: u32) -> bool {
        true
    }

    fn get_program_info_log(&self, _program: u32) -> String {
        String::new()
    }

    fn use_program(&self, program: u32) {
        self.log.push(GlCall::UseProgram { program });
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let vertex_array = self.next_name();
        self.log.push(GlCall::CreateVertexArray { vertex_array });
        Ok(vertex_array)
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        self.log.push(GlCall::DeleteVertexArray { vertex_array });
    }

    fn bind_vertex_array(&self, vertex_array: u32) {
        self.log.push(GlCall::BindVertexArray { vertex_array });
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.log.push(GlCall::EnableVertexAttribArray { index });
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.log.push(GlCall::VertexAttribPointerF32 {
            index,
            size,
            data_type,
            normalized,
            stride,
            offset,
        });
    }

    fn vertex_attrib_pointer_i32(&self, index: u32, size: i32, data_type: u32, stride: i32, offset: i32) {
        self.log.push(GlCall::VertexAttribPointerI32 {
            index,
            size,
            data_type,
            stride,
            offset,
        });
    }

    fn vertex_attrib_divisor(&self, index: u32, divisor: u32) {
        self.log.push(GlCall::VertexAttribDivisor { index, divisor });
    }

    fn create_framebuffer(&self) -> Result<u32, String> {
        let framebuffer = self.next_name();
        self.log.push(GlCall::CreateFramebuffer { framebuffer });
        Ok(framebuffer)
    }

    fn delete_framebuffer(&self, framebuffer: u32) {
        self.log.push(GlCall::DeleteFramebuffer { framebuffer });
    }

    fn bind_framebuffer(&self, target: u32, framebuffer: u32) {
        self.log.push(GlCall::BindFramebuffer { target, framebuffer });
    }

    fn framebuffer_texture_2d(
        &self,
        target: u32,
        attachment: u32,
        texture_target: u32,
        texture: u32,
        level: i32,
    ) {
        self.log.push(GlCall::FramebufferTexture2D {
            target,
            attachment,
            texture_target,
            texture,
            level,
        });
    }

    fn check_framebuffer_status(&self, _target: u32) -> u32 {
        glow::FRAMEBUFFER_COMPLETE
    }

    fn draw_buffers(&self, buffers: &[u32]) {
        self.log.push(GlCall::DrawBuffers {
            buffers: buffers.to_vec(),
        });
    }

    fn read_buffer(&self, src: u32) {
        self.log.push(GlCall::ReadBuffer { src });
    }

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
    ) {
        self.log.push(GlCall::BlitFramebuffer {
            src_x0,
            src_y0,
            src_x1,
            src_y1,
            dst_x0,
            dst_y0,
            dst_x1,
            dst_y1,
            mask,
            filter,
        });
    }

    fn invalidate_framebuffer(&self, target: u32, attachments: &[u32]) {
        self.log.push(GlCall::InvalidateFramebuffer {
            target,
            attachments: attachments.to_vec(),
        });
    }

    fn clear(&self, mask: u32) {
        self.log.push(GlCall::Clear { mask });
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.log.push(GlCall::ClearColor { r, g, b, a });
    }

    fn clear_depth(&self, depth: f32) {
        self.log.push(GlCall::ClearDepth { depth });
    }

    fn clear_stencil(&self, stencil: i32) {
        self.log.push(GlCall::ClearStencil { stencil });
    }

    fn clear_buffer_f32(&self, target: u32, draw_buffer: u32, values: &[f32]) {
        self.log.push(GlCall::ClearBufferF32 {
            target,
            draw_buffer,
            values: values.to_vec(),
        });
    }

    fn clear_buffer_i32(&self, target: u32, draw_buffer: u32, values: &[i32]) {
        self.log.push(GlCall::ClearBufferI32 {
            target,
            draw_buffer,
            values: values.to_vec(),
        });
    }

    fn clear_buffer_u32(&self, target: u32, draw_buffer: u32, values: &[u32]) {
        self.log.push(GlCall::ClearBufferU32 {
            target,
            draw_buffer,
            values: values.to_vec(),
        });
    }

    fn clear_buffer_depth_stencil(&self, target: u32, draw_buffer: u32, depth: f32, stencil: i32) {
        self.log.push(GlCall::ClearBufferDepthStencil {
            target,
            draw_buffer,
            depth,
            stencil,
        });
    }

    fn enable(&self, cap: u32) {
        self.log.push(GlCall::Enable { cap });
    }

    fn disable(&self, cap: u32) {
        self.log.push(GlCall::Disable { cap });
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.log.push(GlCall::Viewport { x, y, width, height });
    }

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        self.log.push(GlCall::Scissor { x, y, width, height });
    }

    fn color_mask(&self, r: bool, g: bool, b: bool, a: bool) {
        self.log.push(GlCall::ColorMask { r, g, b, a });
    }

    fn depth_mask(&self, enabled: bool) {
        self.log.push(GlCall::DepthMask { enabled });
    }

    fn depth_func(&self, func: u32) {
        self.log.push(GlCall::DepthFunc { func });
    }

    fn stencil_func_separate(&self, face: u32, func: u32, reference: i32, mask: u32) {
        self.log.push(GlCall::StencilFuncSeparate {
            face,
            func,
            reference,
            mask,
        });
    }

    fn stencil_op_separate(&self, face: u32, fail: u32, depth_fail: u32, pass: u32) {
        self.log.push(GlCall::StencilOpSeparate {
            face,
            fail,
            depth_fail,
            pass,
        });
    }

    fn stencil_mask_separate(&self, face: u32, mask: u32) {
        self.log.push(GlCall::StencilMaskSeparate { face, mask });
    }

    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        self.log.push(GlCall::BlendFuncSeparate {
            src_rgb,
            dst_rgb,
            src_alpha,
            dst_alpha,
        });
    }

    fn blend_equation_separate(&self, mode_rgb: u32, mode_alpha: u32) {
        self.log.push(GlCall::BlendEquationSeparate { mode_rgb, mode_alpha });
    }

    fn blend_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.log.push(GlCall::BlendColor { r, g, b, a });
    }

    fn cull_face(&self, mode: u32) {
        self.log.push(GlCall::CullFace { mode });
    }

    fn front_face(&self, mode: u32) {
        self.log.push(GlCall::FrontFace { mode });
    }

    fn polygon_mode(&self, mode: u32) {
        self.log.push(GlCall::PolygonMode { mode });
    }

    fn polygon_offset(&self, factor: f32, units: f32) {
        self.log.push(GlCall::PolygonOffset { factor, units });
    }

    fn line_width(&self, width: f32) {
        self.log.push(GlCall::LineWidth { width });
    }

    fn patch_parameter_i32(&self, parameter: u32, value: i32) {
        self.log.push(GlCall::PatchParameterI32 { parameter, value });
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        self.log.push(GlCall::DrawArrays { mode, first, count });
    }

    fn draw_arrays_instanced(&self, mode: u32, first: i32, count: i32, instance_count: i32) {
        self.log.push(GlCall::DrawArraysInstanced {
            mode,
            first,
            count,
            instance_count,
        });
    }

    fn draw_elements_base_vertex(
        &self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        base_vertex: i32,
    ) {
        self.log.push(GlCall::DrawElementsBaseVertex {
            mode,
            count,
            element_type,
            offset,
            base_vertex,
        });
    }

    fn draw_elements_instanced_base_vertex(
        &self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        instance_count: i32,
        base_vertex: i32,
    ) {
        self.log.push(GlCall::DrawElementsInstancedBaseVertex {
            mode,
            count,
            element_type,
            offset,
            instance_count,
            base_vertex,
        });
    }

    fn memory_barrier(&self, barriers: u32) {
        self.log.push(GlCall::MemoryBarrier { barriers });
    }

    fn fence_sync(&self) -> Result<u64, String> {
        let sync = self.next_sync.get();
        self.next_sync.set(sync + 1);
        self.log.push(GlCall::FenceSync { sync });
        Ok(sync)
    }

    fn delete_sync(&self, sync: u64) {
        self.log.push(GlCall::DeleteSync { sync });
    }

    fn client_wait_sync(&self, sync: u64, flags: u32, timeout_ns: i32) -> u32 {
        self.log.push(GlCall::ClientWaitSync {
            sync,
            flags,
            timeout_ns,
        });
        glow::CONDITION_SATISFIED
    }

    fn create_query(&self) -> Result<u32, String> {
        let query = self.next_name();
        self.log.push(GlCall::CreateQuery { query });
        Ok(query)
    }

    fn delete_query(&self, query: u32) {
        self.log.push(GlCall::DeleteQuery { query });
    }

    fn query_counter(&self, query: u32) {
        self.log.push(GlCall::QueryCounter { query });
    }

    fn get_query_result(&self, query: u32) -> u64 {
        self.log.push(GlCall::GetQueryResult { query });
        0
    }

    fn swap_buffers(&self) {
        self.log.push(GlCall::SwapBuffers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_across_kinds() {
        let ctx = CaptureContext::new();
        let a = ctx.create_buffer().unwrap();
        let b = ctx.create_texture().unwrap();
        let c = ctx.create_program().unwrap();
        assert!(a != b && b != c && a != c);
    }

    #[test]
    fn clones_share_the_log() {
        let ctx = CaptureContext::new();
        let clone = ctx.clone();
        clone.clear(glow::COLOR_BUFFER_BIT);
        assert_eq!(
            ctx.log().snapshot(),
            vec![GlCall::Clear {
                mask: glow::COLOR_BUFFER_BIT
            }]
        );
    }
}
