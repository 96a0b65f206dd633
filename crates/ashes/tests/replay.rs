//! End-to-end recording and replay over the capture context
//!
//! These tests drive the public API the way an application would: build
//! resources, record a command buffer, submit it, and inspect the native
//! calls the GL backend emitted.

use std::rc::Rc;

use ashes::core::{
    AshesError, AttachmentDescription, AttachmentReference, BufferCopy, BufferCreateInfo,
    BufferUsageFlags, ClearValue, ColorBlendAttachment, ColorBlendState, CommandBuffer,
    CommandBufferUsageFlags, DepthStencilState, Extent2D, Format, GraphicsPipelineCreateInfo,
    ImageLayout, InputAssemblyState, MultisampleState, PipelineBindPoint,
    PipelineLayoutCreateInfo, PipelineHandle, RasterizationState, Rect2D, RenderPassCreateInfo,
    RenderPassHandle, ShaderModuleCreateInfo, ShaderStageFlags, SubpassContents,
    SubpassDescription, VertexInputState, Viewport, WaitResult,
};
use ashes::gl::{CallLog, CaptureContext, GlCall, GlDevice};

const EXTENT: Extent2D = Extent2D {
    width: 32,
    height: 32,
};

fn device_with_log() -> (GlDevice, CallLog) {
    let ctx = CaptureContext::new();
    let log = ctx.log();
    let device = GlDevice::new(Rc::new(ctx)).unwrap();
    (device, log)
}

fn present_pass(device: &GlDevice) -> RenderPassHandle {
    device
        .create_render_pass(RenderPassCreateInfo {
            attachments: vec![AttachmentDescription::color_clear_store(
                Format::Rgba8Unorm,
                ImageLayout::PresentSrc,
            )],
            subpasses: vec![SubpassDescription {
                color_attachments: vec![AttachmentReference::color(0)],
                ..Default::default()
            }],
            dependencies: vec![],
        })
        .unwrap()
}

fn triangle_pipeline(device: &GlDevice, pass: RenderPassHandle) -> PipelineHandle {
    let vertex = device
        .create_shader_module(&ShaderModuleCreateInfo::glsl(
            ShaderStageFlags::VERTEX,
            "#version 450\nvoid main() { gl_Position = vec4(0.0); }",
        ))
        .unwrap();
    let fragment = device
        .create_shader_module(&ShaderModuleCreateInfo::glsl(
            ShaderStageFlags::FRAGMENT,
            "#version 450\nout vec4 color;\nvoid main() { color = vec4(1.0); }",
        ))
        .unwrap();
    let layout = device
        .create_pipeline_layout(PipelineLayoutCreateInfo::default())
        .unwrap();
    device
        .create_graphics_pipeline(GraphicsPipelineCreateInfo {
            stages: vec![vertex, fragment],
            vertex_input: VertexInputState::default(),
            input_assembly: InputAssemblyState::default(),
            viewport: Some(Viewport::whole(EXTENT)),
            scissor: Some(Rect2D::whole(EXTENT)),
            rasterization: RasterizationState::default(),
            multisample: MultisampleState::default(),
            depth_stencil: DepthStencilState::default(),
            color_blend: ColorBlendState {
                attachments: vec![ColorBlendAttachment::default()],
                ..Default::default()
            },
            layout,
            render_pass: pass,
            subpass: 0,
        })
        .unwrap()
}

#[test]
fn clear_and_draw_translate_in_order() {
    let (device, log) = device_with_log();
    let pass = present_pass(&device);
    let swapchain = device.create_swapchain(pass, EXTENT).unwrap();
    let pipeline = triangle_pipeline(&device, pass);

    let mut cmd = CommandBuffer::new();
    cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
    cmd.begin_render_pass(
        pass,
        &swapchain.framebuffer(),
        vec![ClearValue::color([1.0, 0.0, 0.0, 1.0])],
        SubpassContents::Inline,
    )
    .unwrap();
    cmd.bind_pipeline(pipeline, PipelineBindPoint::Graphics)
        .unwrap();
    cmd.cmd_draw(3, 1, 0, 0).unwrap();
    cmd.end_render_pass().unwrap();
    cmd.end().unwrap();

    log.clear();
    device.queue().submit(&[&cmd], &[], &[], None).unwrap();

    let clear_color = log
        .position(|c| matches!(c, GlCall::ClearColor { r, .. } if *r == 1.0))
        .expect("clear color set");
    let clear = log
        .position(|c| matches!(c, GlCall::Clear { .. }))
        .expect("clear issued");
    let draw = log
        .position(|c| matches!(c, GlCall::DrawArrays { count: 3, .. }))
        .expect("draw issued");
    let use_program = log
        .position(|c| matches!(c, GlCall::UseProgram { program } if *program != 0))
        .expect("program bound");
    assert!(clear_color < clear);
    assert!(clear < draw);
    assert!(use_program < draw);
}

#[test]
fn replay_is_deterministic_across_submits() {
    let (device, log) = device_with_log();
    let pass = present_pass(&device);
    let swapchain = device.create_swapchain(pass, EXTENT).unwrap();
    let pipeline = triangle_pipeline(&device, pass);

    let mut cmd = CommandBuffer::new();
    cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
    cmd.begin_render_pass(
        pass,
        &swapchain.framebuffer(),
        vec![ClearValue::color([0.0, 0.0, 0.0, 1.0])],
        SubpassContents::Inline,
    )
    .unwrap();
    cmd.bind_pipeline(pipeline, PipelineBindPoint::Graphics)
        .unwrap();
    cmd.cmd_draw(6, 1, 0, 0).unwrap();
    cmd.end_render_pass().unwrap();
    cmd.end().unwrap();

    let queue = device.queue();
    log.clear();
    queue.submit(&[&cmd], &[], &[], None).unwrap();
    let first = log.snapshot();
    log.clear();
    queue.submit(&[&cmd], &[], &[], None).unwrap();
    let second = log.snapshot();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn reset_recording_replays_nothing() {
    let (device, log) = device_with_log();
    let pass = present_pass(&device);
    let swapchain = device.create_swapchain(pass, EXTENT).unwrap();

    let mut cmd = CommandBuffer::new();
    cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
    cmd.begin_render_pass(
        pass,
        &swapchain.framebuffer(),
        vec![ClearValue::color([0.0, 1.0, 0.0, 1.0])],
        SubpassContents::Inline,
    )
    .unwrap();
    cmd.end_render_pass().unwrap();
    cmd.end().unwrap();

    cmd.reset();
    cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
    cmd.end().unwrap();

    log.clear();
    device.queue().submit(&[&cmd], &[], &[], None).unwrap();
    assert!(log.is_empty());
}

#[test]
fn unsubmitted_fence_never_signals() {
    let (device, _log) = device_with_log();
    let fence = device.create_fence();
    assert_eq!(
        device.wait_for_fence(fence, 1_000_000).unwrap(),
        WaitResult::TimedOut
    );
    assert_eq!(
        device.wait_for_fence(fence, u64::MAX).unwrap(),
        WaitResult::Error
    );
}

#[test]
fn submit_rejects_an_unfinished_recording() {
    let (device, _log) = device_with_log();
    let mut cmd = CommandBuffer::new();
    cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
    let err = device.queue().submit(&[&cmd], &[], &[], None).unwrap_err();
    assert!(matches!(err, AshesError::InvalidCommandBufferState { .. }));
}

#[test]
fn one_time_submit_cannot_be_replayed() {
    let (device, _log) = device_with_log();
    let mut cmd = CommandBuffer::new();
    cmd.begin(CommandBufferUsageFlags::ONE_TIME_SUBMIT).unwrap();
    cmd.end().unwrap();

    let queue = device.queue();
    queue.submit(&[&cmd], &[], &[], None).unwrap();
    let err = queue.submit(&[&cmd], &[], &[], None).unwrap_err();
    assert!(matches!(err, AshesError::InvalidCommandBufferState { .. }));
}

#[test]
fn buffer_copies_replay_outside_render_passes() {
    let (device, log) = device_with_log();
    let src = device
        .create_buffer(&BufferCreateInfo {
            size: 128,
            usage: BufferUsageFlags::TRANSFER_SRC,
        })
        .unwrap();
    let dst = device
        .create_buffer(&BufferCreateInfo {
            size: 128,
            usage: BufferUsageFlags::TRANSFER_DST,
        })
        .unwrap();

    let mut cmd = CommandBuffer::new();
    cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
    cmd.copy_buffer(
        src,
        dst,
        vec![BufferCopy {
            src_offset: 0,
            dst_offset: 32,
            size: 64,
        }],
    )
    .unwrap();
    cmd.end().unwrap();

    log.clear();
    device.queue().submit(&[&cmd], &[], &[], None).unwrap();
    assert!(log
        .position(|c| matches!(
            c,
            GlCall::CopyBufferSubData {
                dst_offset: 32,
                size: 64,
                ..
            }
        ))
        .is_some());
}
