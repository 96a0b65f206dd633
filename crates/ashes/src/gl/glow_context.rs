//! Real OpenGL context over `glow`
//!
//! Wraps a `glow::Context` obtained from a loader function and maps the
//! seam's `u32` names onto glow's opaque native objects. Presentation is a
//! callback supplied by the windowing layer, keeping this crate free of a
//! window-system dependency.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::c_void;

use glow::{HasContext, PixelUnpackData};

use super::api::GlContext;

/// Callback invoked by `swap_buffers`
pub type PresentFn = Box<dyn Fn()>;

/// [`GlContext`] implementation over a live OpenGL context
pub struct GlowContext {
    gl: glow::Context,
    present: Option<PresentFn>,
    next_name: Cell<u32>,
    next_sync: Cell<u64>,
    buffers: RefCell<HashMap<u32, glow::NativeBuffer>>,
    textures: RefCell<HashMap<u32, glow::NativeTexture>>,
    samplers: RefCell<HashMap<u32, glow::NativeSampler>>,
    shaders: RefCell<HashMap<u32, glow::NativeShader>>,
    programs: RefCell<HashMap<u32, glow::NativeProgram>>,
    vertex_arrays: RefCell<HashMap<u32, glow::NativeVertexArray>>,
    framebuffers: RefCell<HashMap<u32, glow::NativeFramebuffer>>,
    fences: RefCell<HashMap<u64, glow::NativeFence>>,
    queries: RefCell<HashMap<u32, glow::NativeQuery>>,
}

impl GlowContext {
    /// Build a context from a symbol loader and an optional present callback
    ///
    /// The loader is the usual windowing-layer function resolver
    /// (`glfwGetProcAddress`, `eglGetProcAddress`, ...). The GL context must
    /// be current on this thread and stay current for the object's lifetime.
    ///
    /// # Safety
    ///
    /// The loader must return valid pointers for the current context.
    pub unsafe fn from_loader_function(
        loader: impl FnMut(&str) -> *const c_void,
        present: Option<PresentFn>,
    ) -> Self {
        Self {
            gl: glow::Context::from_loader_function(loader),
            present,
            next_name: Cell::new(1),
            next_sync: Cell::new(1),
            buffers: RefCell::default(),
            textures: RefCell::default(),
            samplers: RefCell::default(),
            shaders: RefCell::default(),
            programs: RefCell::default(),
            vertex_arrays: RefCell::default(),
            framebuffers: RefCell::default(),
            fences: RefCell::default(),
            queries: RefCell::default(),
        }
    }

    fn issue_name(&self) -> u32 {
        let name = self.next_name.get();
        self.next_name.set(name + 1);
        name
    }

    fn buffer(&self, name: u32) -> Option<glow::NativeBuffer> {
        self.buffers.borrow().get(&name).copied()
    }

    fn texture(&self, name: u32) -> Option<glow::NativeTexture> {
        self.textures.borrow().get(&name).copied()
    }
}

impl GlContext for GlowContext {
    fn create_buffer(&self) -> Result<u32, String> {
        let buffer = unsafe { self.gl.create_buffer()? };
        let name = self.issue_name();
        self.buffers.borrow_mut().insert(name, buffer);
        Ok(name)
    }

    fn delete_buffer(&self, buffer: u32) {
        if let Some(native) = self.buffers.borrow_mut().remove(&buffer) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn bind_buffer(&self, target: u32, buffer: u32) {
        unsafe { self.gl.bind_buffer(target, self.buffer(buffer)) };
    }

    fn bind_buffer_range(&self, target: u32, index: u32, buffer: u32, offset: i32, size: i32) {
        unsafe {
            self.gl
                .bind_buffer_range(target, index, self.buffer(buffer), offset, size);
        }
    }

    fn buffer_data_size(&self, target: u32, size: i32, usage: u32) {
        unsafe { self.gl.buffer_data_size(target, size, usage) };
    }

    fn buffer_sub_data(&self, target: u32, offset: i32, data: &[u8]) {
        unsafe { self.gl.buffer_sub_data_u8_slice(target, offset, data) };
    }

    fn copy_buffer_sub_data(
        &self,
        src_target: u32,
        dst_target: u32,
        src_offset: i32,
        dst_offset: i32,
        size: i32,
    ) {
        unsafe {
            self.gl
                .copy_buffer_sub_data(src_target, dst_target, src_offset, dst_offset, size);
        }
    }

    fn create_texture(&self) -> Result<u32, String> {
        let texture = unsafe { self.gl.create_texture()? };
        let name = self.issue_name();
        self.textures.borrow_mut().insert(name, texture);
        Ok(name)
    }

    fn delete_texture(&self, texture: u32) {
        if let Some(native) = self.textures.borrow_mut().remove(&texture) {
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) };
    }

    fn bind_texture(&self, target: u32, texture: u32) {
        unsafe { self.gl.bind_texture(target, self.texture(texture)) };
    }

    fn tex_storage_2d(&self, target: u32, levels: i32, internal_format: u32, width: i32, height: i32) {
        unsafe {
            self.gl
                .tex_storage_2d(target, levels, internal_format, width, height);
        }
    }

    fn tex_image_2d_multisample(
        &self,
        target: u32,
        samples: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    ) {
        unsafe {
            self.gl
                .tex_image_2d_multisample(target, samples, internal_format as i32, width, height, true);
        }
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
        unsafe {
            self.gl.tex_sub_image_2d(
                target,
                level,
                x,
                y,
                width,
                height,
                format,
                data_type,
                PixelUnpackData::BufferOffset(buffer_offset),
            );
        }
    }

    fn create_sampler(&self) -> Result<u32, String> {
        let sampler = unsafe { self.gl.create_sampler()? };
        let name = self.issue_name();
        self.samplers.borrow_mut().insert(name, sampler);
        Ok(name)
    }

    fn delete_sampler(&self, sampler: u32) {
        if let Some(native) = self.samplers.borrow_mut().remove(&sampler) {
            unsafe { self.gl.delete_sampler(native) };
        }
    }

    fn bind_sampler(&self, unit: u32, sampler: u32) {
        unsafe {
            self.gl
                .bind_sampler(unit, self.samplers.borrow().get(&sampler).copied());
        }
    }

    fn sampler_parameter_i32(&self, sampler: u32, parameter: u32, value: i32) {
        if let Some(native) = self.samplers.borrow().get(&sampler).copied() {
            unsafe { self.gl.sampler_parameter_i32(native, parameter, value) };
        }
    }

    fn create_shader(&self, shader_type: u32) -> Result<u32, String> {
        let shader = unsafe { self.gl.create_shader(shader_type)? };
        let name = self.issue_name();
        self.shaders.borrow_mut().insert(name, shader);
        Ok(name)
    }

    fn delete_shader(&self, shader: u32) {
        if let Some(native) = self.shaders.borrow_mut().remove(&shader) {
            unsafe { self.gl.delete_shader(native) };
        }
    }

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(native) = self.shaders.borrow().get(&shader).copied() {
            unsafe { self.gl.shader_source(native, source) };
        }
    }

    fn compile_shader(&self, shader: u32) {
        if let Some(native) = self.shaders.borrow().get(&shader).copied() {
            unsafe { self.gl.compile_shader(native) };
        }
    }

    fn get_shader_compile_status(&self, shader: u32) -> bool {
        match self.shaders.borrow().get(&shader).copied() {
            Some(native) => unsafe { self.gl.get_shader_compile_status(native) },
            None => false,
        }
    }

    fn get_shader_info_log(&self, shader: u32) -> String {
        match self.shaders.borrow().get(&shader).copied() {
            Some(native) => unsafe { self.gl.get_shader_info_log(native) },
            None => String::new(),
        }
    }

    fn create_program(&self) -> Result<u32, String> {
        let program = unsafe { self.gl.create_program()? };
        let name = self.issue_name();
        self.programs.borrow_mut().insert(name, program);
        Ok(name)
    }

    fn delete_program(&self, program: u32) {
        if let Some(native) = self.programs.borrow_mut().remove(&program) {
            unsafe { self.gl.delete_program(native) };
        }
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let programs = self.programs.borrow();
        let shaders = self.shaders.borrow();
        if let (Some(&program), Some(&shader)) = (programs.get(&program), shaders.get(&shader)) {
            unsafe { self.gl.attach_shader(program, shader) };
        }
    }

    fn link_program(&self, program: u32) {
        if let Some(native) = self.programs.borrow().get(&program).copied() {
            unsafe { self.gl.link_program(native) };
        }
    }

    fn get_program_link_status(&self, program: u32) -> bool {
        match self.programs.borrow().get(&program).copied() {
            Some(native) => unsafe { self.gl.get_program_link_status(native) },
            None => false,
        }
    }

    fn get_program_info_log(&self, program: u32) -> String {
        match self.programs.borrow().get(&program).copied() {
            Some(native) => unsafe { self.gl.get_program_info_log(native) },
            None => String::new(),
        }
    }

    fn use_program(&self, program: u32) {
        unsafe {
            self.gl
                .use_program(self.programs.borrow().get(&program).copied());
        }
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let vertex_array = unsafe { self.gl.create_vertex_array()? };
        let name = self.issue_name();
        self.vertex_arrays.borrow_mut().insert(name, vertex_array);
        Ok(name)
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        if let Some(native) = self.vertex_arrays.borrow_mut().remove(&vertex_array) {
            unsafe { self.gl.delete_vertex_array(native) };
        }
    }

    fn bind_vertex_array(&self, vertex_array: u32) {
        unsafe {
            self.gl
                .bind_vertex_array(self.vertex_arrays.borrow().get(&vertex_array).copied());
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) };
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
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, data_type, normalized, stride, offset);
        }
    }

    fn vertex_attrib_pointer_i32(&self, index: u32, size: i32, data_type: u32, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_i32(index, size, data_type, stride, offset);
        }
    }

    fn vertex_attrib_divisor(&self, index: u32, divisor: u32) {
        unsafe { self.gl.vertex_attrib_divisor(index, divisor) };
    }

    fn create_framebuffer(&self) -> Result<u32, String> {
        let framebuffer = unsafe { self.gl.create_framebuffer()? };
        let name = self.issue_name();
        self.framebuffers.borrow_mut().insert(name, framebuffer);
        Ok(name)
    }

    fn delete_framebuffer(&self, framebuffer: u32) {
        if let Some(native) = self.framebuffers.borrow_mut().remove(&framebuffer) {
            unsafe { self.gl.delete_framebuffer(native) };
        }
    }

    fn bind_framebuffer(&self, target: u32, framebuffer: u32) {
        unsafe {
            self.gl
                .bind_framebuffer(target, self.framebuffers.borrow().get(&framebuffer).copied());
        }
    }

    fn framebuffer_texture_2d(
        &self,
        target: u32,
        attachment: u32,
        texture_target: u32,
        texture: u32,
        level: i32,
    ) {
        unsafe {
            self.gl.framebuffer_texture_2d(
                target,
                attachment,
                texture_target,
                self.texture(texture),
                level,
            );
        }
    }

    fn check_framebuffer_status(&self, target: u32) -> u32 {
        unsafe { self.gl.check_framebuffer_status(target) }
    }

    fn draw_buffers(&self, buffers: &[u32]) {
        unsafe { self.gl.draw_buffers(buffers) };
    }

    fn read_buffer(&self, src: u32) {
        unsafe { self.gl.read_buffer(src) };
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
        unsafe {
            self.gl.blit_framebuffer(
                src_x0, src_y0, src_x1, src_y1, dst_x0, dst_y0, dst_x1, dst_y1, mask, filter,
            );
        }
    }

    fn invalidate_framebuffer(&self, target: u32, attachments: &[u32]) {
        unsafe { self.gl.invalidate_framebuffer(target, attachments) };
    }

    fn clear(&self, mask: u32) {
        unsafe { self.gl.clear(mask) };
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.clear_color(r, g, b, a) };
    }

    fn clear_depth(&self, depth: f32) {
        unsafe { self.gl.clear_depth_f32(depth) };
    }

    fn clear_stencil(&self, stencil: i32) {
        unsafe { self.gl.clear_stencil(stencil) };
    }

    fn clear_buffer_f32(&self, target: u32, draw_buffer: u32, values: &[f32]) {
        unsafe { self.gl.clear_buffer_f32_slice(target, draw_buffer, values) };
    }

    fn clear_buffer_i32(&self, target: u32, draw_buffer: u32, values: &[i32]) {
        unsafe { self.gl.clear_buffer_i32_slice(target, draw_buffer, values) };
    }

    fn clear_buffer_u32(&self, target: u32, draw_buffer: u32, values: &[u32]) {
        unsafe { self.gl.clear_buffer_u32_slice(target, draw_buffer, values) };
    }

    fn clear_buffer_depth_stencil(&self, target: u32, draw_buffer: u32, depth: f32, stencil: i32) {
        unsafe {
            self.gl
                .clear_buffer_depth_stencil(target, draw_buffer, depth, stencil);
        }
    }

    fn enable(&self, cap: u32) {
        unsafe { self.gl.enable(cap) };
    }

    fn disable(&self, cap: u32) {
        unsafe { self.gl.disable(cap) };
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.scissor(x, y, width, height) };
    }

    fn color_mask(&self, r: bool, g: bool, b: bool, a: bool) {
        unsafe { self.gl.color_mask(r, g, b, a) };
    }

    fn depth_mask(&self, enabled: bool) {
        unsafe { self.gl.depth_mask(enabled) };
    }

    fn depth_func(&self, func: u32) {
        unsafe { self.gl.depth_func(func) };
    }

    fn stencil_func_separate(&self, face: u32, func: u32, reference: i32, mask: u32) {
        unsafe { self.gl.stencil_func_separate(face, func, reference, mask) };
    }

    fn stencil_op_separate(&self, face: u32, fail: u32, depth_fail: u32, pass: u32) {
        unsafe { self.gl.stencil_op_separate(face, fail, depth_fail, pass) };
    }

    fn stencil_mask_separate(&self, face: u32, mask: u32) {
        unsafe { self.gl.stencil_mask_separate(face, mask) };
    }

    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        unsafe {
            self.gl
                .blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha);
        }
    }

    fn blend_equation_separate(&self, mode_rgb: u32, mode_alpha: u32) {
        unsafe { self.gl.blend_equation_separate(mode_rgb, mode_alpha) };
    }

    fn blend_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.blend_color(r, g, b, a) };
    }

    fn cull_face(&self, mode: u32) {
        unsafe { self.gl.cull_face(mode) };
    }

    fn front_face(&self, mode: u32) {
        unsafe { self.gl.front_face(mode) };
    }

    fn polygon_mode(&self, mode: u32) {
        unsafe { self.gl.polygon_mode(glow::FRONT_AND_BACK, mode) };
    }

    fn polygon_offset(&self, factor: f32, units: f32) {
        unsafe { self.gl.polygon_offset(factor, units) };
    }

    fn line_width(&self, width: f32) {
        unsafe { self.gl.line_width(width) };
    }

    fn patch_parameter_i32(&self, parameter: u32, value: i32) {
        unsafe { self.gl.patch_parameter_i32(parameter, value) };
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(mode, first, count) };
    }

    fn draw_arrays_instanced(&self, mode: u32, first: i32, count: i32, instance_count: i32) {
        unsafe {
            self.gl
                .draw_arrays_instanced(mode, first, count, instance_count);
        }
    }

    fn draw_elements_base_vertex(
        &self,
        mode: u32,
        count: i32,
        element_type: u32,
        offset: i32,
        base_vertex: i32,
    ) {
        unsafe {
            self.gl
                .draw_elements_base_vertex(mode, count, element_type, offset, base_vertex);
        }
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
        unsafe {
            self.gl.draw_elements_instanced_base_vertex(
                mode,
                count,
                element_type,
                offset,
                instance_count,
                base_vertex,
            );
        }
    }

    fn memory_barrier(&self, barriers: u32) {
        unsafe { self.gl.memory_barrier(barriers) };
    }

    fn fence_sync(&self) -> Result<u64, String> {
        let fence = unsafe { self.gl.fence_sync(glow::SYNC_GPU_COMMANDS_COMPLETE, 0)? };
        let id = self.next_sync.get();
        self.next_sync.set(id + 1);
        self.fences.borrow_mut().insert(id, fence);
        Ok(id)
    }

    fn delete_sync(&self, sync: u64) {
        if let Some(native) = self.fences.borrow_mut().remove(&sync) {
            unsafe { self.gl.delete_sync(native) };
        }
    }

    fn client_wait_sync(&self, sync: u64, flags: u32, timeout_ns: i32) -> u32 {
        match self.fences.borrow().get(&sync).copied() {
            Some(native) => unsafe { self.gl.client_wait_sync(native, flags, timeout_ns) },
            None => glow::WAIT_FAILED,
        }
    }

    fn create_query(&self) -> Result<u32, String> {
        let query = unsafe { self.gl.create_query()? };
        let name = self.issue_name();
        self.queries.borrow_mut().insert(name, query);
        Ok(name)
    }

    fn delete_query(&self, query: u32) {
        if let Some(native) = self.queries.borrow_mut().remove(&query) {
            unsafe { self.gl.delete_query(native) };
        }
    }

    fn query_counter(&self, query: u32) {
        if let Some(native) = self.queries.borrow().get(&query).copied() {
            unsafe { self.gl.query_counter(native, glow::TIMESTAMP) };
        }
    }

    fn get_query_result(&self, query: u32) -> u64 {
        // 32-bit readback; timestamp deltas at frame scale fit comfortably.
        match self.queries.borrow().get(&query).copied() {
            Some(native) => unsafe {
                u64::from(self.gl.get_query_parameter_u32(native, glow::QUERY_RESULT))
            },
            None => 0,
        }
    }

    fn swap_buffers(&self) {
        if let Some(present) = &self.present {
            present();
        }
    }
}
