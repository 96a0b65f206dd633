//! Vulkan device: resource creation and ownership
//!
//! Resources live in slotmap arenas keyed by the core handles, mirroring
//! the GL backend, so stale handles surface as `ResourceLost` on either
//! backend. Memory management is deliberately simple: one allocation per
//! buffer or image, host-visible for buffers and device-local for images.

use std::cell::RefCell;
use std::ffi::CString;
use std::rc::Rc;

use ash::extensions::khr::Swapchain;
use ash::vk;
use log::{debug, warn};

use crate::core::{
    validate_framebuffer, AshesError, AshesResult, AttachmentViewDesc, BufferCreateInfo,
    BufferHandle, DescriptorSetHandle, DescriptorSetLayoutCreateInfo, DescriptorSetLayoutHandle,
    Extent2D, FenceHandle, Format, Framebuffer, FramebufferHandle, GraphicsPipelineCreateInfo,
    ImageCreateInfo, ImageHandle, ImageViewCreateInfo, ImageViewHandle, PipelineHandle,
    PipelineLayoutCreateInfo, PipelineLayoutHandle, PrimitiveTopology, QueryPoolHandle,
    RenderPass, RenderPassCreateInfo, RenderPassHandle, SamplerCreateInfo, SamplerHandle,
    SemaphoreHandle, ShaderModuleCreateInfo, ShaderModuleHandle, ShaderSource, ShaderStageFlags,
    Viewport, WaitResult, WriteDescriptorSet,
};

use super::convert;
use super::instance::VkInstance;
use super::queue::VkQueue;
use super::surface::VkSurface;

fn backend(what: &str, e: vk::Result) -> AshesError {
    AshesError::Backend(format!("{what}: {e}"))
}

pub(crate) struct VkBuffer {
    pub buffer: vk::Buffer,
    pub memory: vk::DeviceMemory,
    pub size: u64,
}

pub(crate) struct VkImage {
    pub image: vk::Image,
    pub memory: vk::DeviceMemory,
    pub format: Format,
    pub extent: Extent2D,
}

pub(crate) struct VkImageView {
    pub view: vk::ImageView,
    pub format: Format,
    pub extent: Extent2D,
    /// Swapchain-owned views are destroyed by the swapchain, not the arena
    pub owned: bool,
}

pub(crate) struct VkShaderModule {
    pub module: vk::ShaderModule,
    pub stage: ShaderStageFlags,
}

pub(crate) struct VkRenderPass {
    pub raw: vk::RenderPass,
    pub pass: RenderPass,
}

pub(crate) struct VkFramebufferEntry {
    pub raw: vk::Framebuffer,
    pub extent: Extent2D,
}

pub(crate) struct VkSetLayout {
    pub raw: vk::DescriptorSetLayout,
}

pub(crate) struct VkDeviceState {
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub queue: vk::Queue,
    pub queue_family_index: u32,
    pub command_pool: vk::CommandPool,
    pub descriptor_pool: vk::DescriptorPool,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub buffers: slotmap::SlotMap<BufferHandle, VkBuffer>,
    pub images: slotmap::SlotMap<ImageHandle, VkImage>,
    pub views: slotmap::SlotMap<ImageViewHandle, VkImageView>,
    pub samplers: slotmap::SlotMap<SamplerHandle, vk::Sampler>,
    pub shader_modules: slotmap::SlotMap<ShaderModuleHandle, VkShaderModule>,
    pub render_passes: slotmap::SlotMap<RenderPassHandle, VkRenderPass>,
    pub framebuffers: slotmap::SlotMap<FramebufferHandle, VkFramebufferEntry>,
    pub set_layouts: slotmap::SlotMap<DescriptorSetLayoutHandle, VkSetLayout>,
    pub descriptor_sets: slotmap::SlotMap<DescriptorSetHandle, vk::DescriptorSet>,
    pub pipeline_layouts: slotmap::SlotMap<PipelineLayoutHandle, vk::PipelineLayout>,
    pub pipelines: slotmap::SlotMap<PipelineHandle, vk::Pipeline>,
    pub fences: slotmap::SlotMap<FenceHandle, vk::Fence>,
    pub semaphores: slotmap::SlotMap<SemaphoreHandle, vk::Semaphore>,
    pub query_pools: slotmap::SlotMap<QueryPoolHandle, vk::QueryPool>,
    /// Native command buffers recorded by past submits, freed on wait_idle
    pub pending: Vec<vk::CommandBuffer>,
}

impl VkDeviceState {
    pub(crate) fn find_memory_type(
        &self,
        type_filter: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> AshesResult<u32> {
        for i in 0..self.memory_properties.memory_type_count {
            if (type_filter & (1 << i)) != 0
                && self.memory_properties.memory_types[i as usize]
                    .property_flags
                    .contains(properties)
            {
                return Ok(i);
            }
        }
        Err(AshesError::Backend(format!(
            "no memory type matches filter {type_filter:#x} with {properties:?}"
        )))
    }
}

impl Drop for VkDeviceState {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            if !self.pending.is_empty() {
                self.device
                    .free_command_buffers(self.command_pool, &self.pending);
            }
            for (_, entry) in self.pipelines.drain() {
                self.device.destroy_pipeline(entry, None);
            }
            for (_, entry) in self.pipeline_layouts.drain() {
                self.device.destroy_pipeline_layout(entry, None);
            }
            for (_, entry) in self.set_layouts.drain() {
                self.device.destroy_descriptor_set_layout(entry.raw, None);
            }
            for (_, entry) in self.framebuffers.drain() {
                self.device.destroy_framebuffer(entry.raw, None);
            }
            for (_, entry) in self.render_passes.drain() {
                self.device.destroy_render_pass(entry.raw, None);
            }
            for (_, entry) in self.shader_modules.drain() {
                self.device.destroy_shader_module(entry.module, None);
            }
            for (_, entry) in self.views.drain() {
                if entry.owned {
                    self.device.destroy_image_view(entry.view, None);
                }
            }
            for (_, entry) in self.images.drain() {
                self.device.destroy_image(entry.image, None);
                self.device.free_memory(entry.memory, None);
            }
            for (_, entry) in self.buffers.drain() {
                self.device.destroy_buffer(entry.buffer, None);
                self.device.free_memory(entry.memory, None);
            }
            for (_, entry) in self.samplers.drain() {
                self.device.destroy_sampler(entry, None);
            }
            for (_, entry) in self.fences.drain() {
                self.device.destroy_fence(entry, None);
            }
            for (_, entry) in self.semaphores.drain() {
                self.device.destroy_semaphore(entry, None);
            }
            for (_, entry) in self.query_pools.drain() {
                self.device.destroy_query_pool(entry, None);
            }
            self.device.destroy_descriptor_pool(self.descriptor_pool, None);
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_device(None);
        }
    }
}

/// The Vulkan device
///
/// The `VkInstance` it was created from must outlive it.
pub struct VkDevice {
    state: Rc<RefCell<VkDeviceState>>,
}

impl VkDevice {
    /// Select a physical device and create the logical device
    ///
    /// Picks the first physical device with a queue family supporting both
    /// graphics and presentation to `surface`.
    pub fn new(instance: &VkInstance, surface: &VkSurface) -> AshesResult<Self> {
        let raw = instance.raw();
        let physical_devices = unsafe {
            raw.enumerate_physical_devices()
                .map_err(|e| backend("failed to enumerate physical devices", e))?
        };

        let mut selected = None;
        'devices: for &physical_device in &physical_devices {
            let families =
                unsafe { raw.get_physical_device_queue_family_properties(physical_device) };
            for (index, family) in families.iter().enumerate() {
                let graphics = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
                let present = unsafe {
                    surface
                        .loader()
                        .get_physical_device_surface_support(
                            physical_device,
                            index as u32,
                            surface.raw(),
                        )
                        .unwrap_or(false)
                };
                if graphics && present {
                    selected = Some((physical_device, index as u32));
                    break 'devices;
                }
            }
        }
        let (physical_device, queue_family_index) =
            selected.ok_or_else(|| AshesError::Initialization(
                "no physical device with a graphics + present queue family".into(),
            ))?;

        let queue_priorities = [1.0f32];
        let queue_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(queue_family_index)
            .queue_priorities(&queue_priorities);
        let device_extensions = [Swapchain::name().as_ptr()];
        let device_create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(std::slice::from_ref(&queue_info))
            .enabled_extension_names(&device_extensions);
        let device = unsafe {
            raw.create_device(physical_device, &device_create_info, None)
                .map_err(|e| backend("failed to create logical device", e))?
        };
        let queue = unsafe { device.get_device_queue(queue_family_index, 0) };

        let pool_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(queue_family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let command_pool = unsafe {
            device
                .create_command_pool(&pool_info, None)
                .map_err(|e| backend("failed to create command pool", e))?
        };

        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: 256,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::STORAGE_BUFFER,
                descriptor_count: 256,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: 256,
            },
        ];
        let descriptor_pool_info = vk::DescriptorPoolCreateInfo::builder()
            .pool_sizes(&pool_sizes)
            .max_sets(256)
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET);
        let descriptor_pool = unsafe {
            device
                .create_descriptor_pool(&descriptor_pool_info, None)
                .map_err(|e| backend("failed to create descriptor pool", e))?
        };

        let memory_properties =
            unsafe { raw.get_physical_device_memory_properties(physical_device) };

        debug!("selected queue family {queue_family_index}");
        Ok(Self {
            state: Rc::new(RefCell::new(VkDeviceState {
                physical_device,
                device,
                queue,
                queue_family_index,
                command_pool,
                descriptor_pool,
                memory_properties,
                buffers: slotmap::SlotMap::with_key(),
                images: slotmap::SlotMap::with_key(),
                views: slotmap::SlotMap::with_key(),
                samplers: slotmap::SlotMap::with_key(),
                shader_modules: slotmap::SlotMap::with_key(),
                render_passes: slotmap::SlotMap::with_key(),
                framebuffers: slotmap::SlotMap::with_key(),
                set_layouts: slotmap::SlotMap::with_key(),
                descriptor_sets: slotmap::SlotMap::with_key(),
                pipeline_layouts: slotmap::SlotMap::with_key(),
                pipelines: slotmap::SlotMap::with_key(),
                fences: slotmap::SlotMap::with_key(),
                semaphores: slotmap::SlotMap::with_key(),
                query_pools: slotmap::SlotMap::with_key(),
                pending: Vec::new(),
            })),
        })
    }

    /// The device's graphics queue
    pub fn queue(&self) -> VkQueue {
        VkQueue::new(Rc::clone(&self.state))
    }

    /// Create a host-visible buffer
    pub fn create_buffer(&self, info: &BufferCreateInfo) -> AshesResult<BufferHandle> {
        let mut state = self.state.borrow_mut();
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(info.size)
            .usage(convert::buffer_usage(info.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer = unsafe {
            state
                .device
                .create_buffer(&buffer_info, None)
                .map_err(|e| backend("failed to create buffer", e))?
        };
        let requirements = unsafe { state.device.get_buffer_memory_requirements(buffer) };
        let memory_type = state.find_memory_type(
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);
        let memory = unsafe {
            state
                .device
                .allocate_memory(&alloc_info, None)
                .map_err(|e| backend("failed to allocate buffer memory", e))?
        };
        unsafe {
            state
                .device
                .bind_buffer_memory(buffer, memory, 0)
                .map_err(|e| backend("failed to bind buffer memory", e))?;
        }
        Ok(state.buffers.insert(VkBuffer {
            buffer,
            memory,
            size: info.size,
        }))
    }

    /// Write bytes into a buffer at `offset`
    pub fn upload_buffer(&self, buffer: BufferHandle, offset: u64, data: &[u8]) -> AshesResult<()> {
        let state = self.state.borrow();
        let entry = state
            .buffers
            .get(buffer)
            .ok_or(AshesError::ResourceLost { what: "buffer" })?;
        unsafe {
            let mapped = state
                .device
                .map_memory(
                    entry.memory,
                    offset,
                    data.len() as u64,
                    vk::MemoryMapFlags::empty(),
                )
                .map_err(|e| backend("failed to map buffer memory", e))?;
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.cast(), data.len());
            state.device.unmap_memory(entry.memory);
        }
        Ok(())
    }

    /// Destroy a buffer; the handle becomes stale
    pub fn destroy_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.buffers.remove(buffer) {
            unsafe {
                state.device.destroy_buffer(entry.buffer, None);
                state.device.free_memory(entry.memory, None);
            }
        }
    }

    /// Create a device-local 2D image
    pub fn create_image(&self, info: &ImageCreateInfo) -> AshesResult<ImageHandle> {
        let mut state = self.state.borrow_mut();
        let image_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: info.extent.width,
                height: info.extent.height,
                depth: info.extent.depth,
            })
            .mip_levels(info.mip_levels)
            .array_layers(1)
            .format(convert::format(info.format))
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(convert::image_usage(info.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(convert::sample_count(info.samples));
        let image = unsafe {
            state
                .device
                .create_image(&image_info, None)
                .map_err(|e| backend("failed to create image", e))?
        };
        let requirements = unsafe { state.device.get_image_memory_requirements(image) };
        let memory_type = state.find_memory_type(
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;
        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);
        let memory = unsafe {
            state
                .device
                .allocate_memory(&alloc_info, None)
                .map_err(|e| backend("failed to allocate image memory", e))?
        };
        unsafe {
            state
                .device
                .bind_image_memory(image, memory, 0)
                .map_err(|e| backend("failed to bind image memory", e))?;
        }
        Ok(state.images.insert(VkImage {
            image,
            memory,
            format: info.format,
            extent: Extent2D::new(info.extent.width, info.extent.height),
        }))
    }

    /// Destroy an image; views over it must already be gone
    pub fn destroy_image(&self, image: ImageHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.images.remove(image) {
            unsafe {
                state.device.destroy_image(entry.image, None);
                state.device.free_memory(entry.memory, None);
            }
        }
    }

    /// Create a view over an image's mip range
    pub fn create_image_view(
        &self,
        image: ImageHandle,
        info: &ImageViewCreateInfo,
    ) -> AshesResult<ImageViewHandle> {
        let mut state = self.state.borrow_mut();
        let entry = state
            .images
            .get(image)
            .ok_or(AshesError::ResourceLost { what: "image" })?;
        let extent = Extent2D::new(
            (entry.extent.width >> info.base_mip_level).max(1),
            (entry.extent.height >> info.base_mip_level).max(1),
        );
        let view_info = vk::ImageViewCreateInfo::builder()
            .image(entry.image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(convert::format(info.format))
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: convert::aspect_flags(info.aspects),
                base_mip_level: info.base_mip_level,
                level_count: info.level_count,
                base_array_layer: 0,
                layer_count: 1,
            });
        let view = unsafe {
            state
                .device
                .create_image_view(&view_info, None)
                .map_err(|e| backend("failed to create image view", e))?
        };
        Ok(state.views.insert(VkImageView {
            view,
            format: info.format,
            extent,
            owned: true,
        }))
    }

    /// Create a sampler
    pub fn create_sampler(&self, info: &SamplerCreateInfo) -> AshesResult<SamplerHandle> {
        let mut state = self.state.borrow_mut();
        let sampler_info = vk::SamplerCreateInfo::builder()
            .mag_filter(convert::filter(info.mag_filter))
            .min_filter(convert::filter(info.min_filter))
            .address_mode_u(convert::address_mode(info.wrap_u))
            .address_mode_v(convert::address_mode(info.wrap_v))
            .address_mode_w(vk::SamplerAddressMode::REPEAT);
        let sampler = unsafe {
            state
                .device
                .create_sampler(&sampler_info, None)
                .map_err(|e| backend("failed to create sampler", e))?
        };
        Ok(state.samplers.insert(sampler))
    }

    /// Create a shader module from SPIR-V words
    ///
    /// GLSL source is rejected; on Vulkan the crate consumes SPIR-V.
    pub fn create_shader_module(
        &self,
        info: &ShaderModuleCreateInfo,
    ) -> AshesResult<ShaderModuleHandle> {
        let words = match &info.source {
            ShaderSource::SpirV(words) => words,
            ShaderSource::Glsl(_) => {
                return Err(AshesError::Backend(
                    "the Vulkan backend consumes SPIR-V words; GLSL requires the GL backend"
                        .into(),
                ))
            }
        };
        if info.stage.bits().count_ones() != 1 {
            return Err(AshesError::Configuration {
                reason: format!(
                    "shader module must declare exactly one stage, got {:?}",
                    info.stage
                ),
            });
        }
        let mut state = self.state.borrow_mut();
        let module_info = vk::ShaderModuleCreateInfo::builder().code(words);
        let module = unsafe {
            state
                .device
                .create_shader_module(&module_info, None)
                .map_err(|e| backend("failed to create shader module", e))?
        };
        Ok(state.shader_modules.insert(VkShaderModule {
            module,
            stage: info.stage,
        }))
    }

    /// Validate and create a render pass
    pub fn create_render_pass(&self, info: RenderPassCreateInfo) -> AshesResult<RenderPassHandle> {
        let pass = RenderPass::new(info)?;

        let attachments: Vec<vk::AttachmentDescription> = pass
            .attachments()
            .iter()
            .map(|a| {
                vk::AttachmentDescription::builder()
                    .format(convert::format(a.format))
                    .samples(convert::sample_count(a.samples))
                    .load_op(convert::load_op(a.load_op))
                    .store_op(convert::store_op(a.store_op))
                    .stencil_load_op(convert::load_op(a.stencil_load_op))
                    .stencil_store_op(convert::store_op(a.stencil_store_op))
                    .initial_layout(convert::image_layout(a.initial_layout))
                    .final_layout(convert::image_layout(a.final_layout))
                    .build()
            })
            .collect();

        let reference = |r: &crate::core::AttachmentReference| vk::AttachmentReference {
            attachment: r.attachment,
            layout: convert::image_layout(r.layout),
        };
        struct SubpassRefs {
            inputs: Vec<vk::AttachmentReference>,
            colors: Vec<vk::AttachmentReference>,
            resolves: Vec<vk::AttachmentReference>,
            depth: Option<vk::AttachmentReference>,
        }
        let refs: Vec<SubpassRefs> = pass
            .subpasses()
            .iter()
            .map(|s| SubpassRefs {
                inputs: s.input_attachments.iter().map(reference).collect(),
                colors: s.color_attachments.iter().map(reference).collect(),
                resolves: s.resolve_attachments.iter().map(reference).collect(),
                depth: s.depth_stencil_attachment.as_ref().map(reference),
            })
            .collect();
        let subpasses: Vec<vk::SubpassDescription> = refs
            .iter()
            .map(|r| {
                let mut builder = vk::SubpassDescription::builder()
                    .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                    .input_attachments(&r.inputs)
                    .color_attachments(&r.colors);
                if !r.resolves.is_empty() {
                    builder = builder.resolve_attachments(&r.resolves);
                }
                if let Some(depth) = r.depth.as_ref() {
                    builder = builder.depth_stencil_attachment(depth);
                }
                builder.build()
            })
            .collect();

        let dependencies: Vec<vk::SubpassDependency> = pass
            .dependencies()
            .iter()
            .map(|d| {
                vk::SubpassDependency::builder()
                    .src_subpass(if d.src_subpass == crate::core::SUBPASS_EXTERNAL {
                        vk::SUBPASS_EXTERNAL
                    } else {
                        d.src_subpass
                    })
                    .dst_subpass(if d.dst_subpass == crate::core::SUBPASS_EXTERNAL {
                        vk::SUBPASS_EXTERNAL
                    } else {
                        d.dst_subpass
                    })
                    .src_stage_mask(convert::pipeline_stages(d.src_stage_mask))
                    .dst_stage_mask(convert::pipeline_stages(d.dst_stage_mask))
                    .src_access_mask(convert::access_flags(d.src_access_mask))
                    .dst_access_mask(convert::access_flags(d.dst_access_mask))
                    .dependency_flags(if d.by_region {
                        vk::DependencyFlags::BY_REGION
                    } else {
                        vk::DependencyFlags::empty()
                    })
                    .build()
            })
            .collect();

        let render_pass_info = vk::RenderPassCreateInfo::builder()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);
        let mut state = self.state.borrow_mut();
        let raw = unsafe {
            state
                .device
                .create_render_pass(&render_pass_info, None)
                .map_err(|e| backend("failed to create render pass", e))?
        };
        Ok(state.render_passes.insert(VkRenderPass { raw, pass }))
    }

    /// Register a descriptor set layout
    pub fn create_descriptor_set_layout(
        &self,
        info: DescriptorSetLayoutCreateInfo,
    ) -> AshesResult<DescriptorSetLayoutHandle> {
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = info
            .bindings
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::builder()
                    .binding(b.binding)
                    .descriptor_type(convert::descriptor_type(b.descriptor_type))
                    .descriptor_count(1)
                    .stage_flags(convert::shader_stages(b.stage_flags))
                    .build()
            })
            .collect();
        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&bindings);
        let mut state = self.state.borrow_mut();
        let raw = unsafe {
            state
                .device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(|e| backend("failed to create descriptor set layout", e))?
        };
        Ok(state.set_layouts.insert(VkSetLayout { raw }))
    }

    /// Allocate a descriptor set against a layout
    pub fn allocate_descriptor_set(
        &self,
        layout: DescriptorSetLayoutHandle,
    ) -> AshesResult<DescriptorSetHandle> {
        let mut state = self.state.borrow_mut();
        let raw_layout = state
            .set_layouts
            .get(layout)
            .ok_or(AshesError::ResourceLost {
                what: "descriptor set layout",
            })?
            .raw;
        let layouts = [raw_layout];
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(state.descriptor_pool)
            .set_layouts(&layouts);
        let sets = unsafe {
            state
                .device
                .allocate_descriptor_sets(&alloc_info)
                .map_err(|e| backend("failed to allocate descriptor set", e))?
        };
        Ok(state.descriptor_sets.insert(sets[0]))
    }

    /// Write bindings into an allocated descriptor set
    pub fn update_descriptor_set(
        &self,
        set: DescriptorSetHandle,
        writes: &[WriteDescriptorSet],
    ) -> AshesResult<()> {
        let state = self.state.borrow();
        let raw_set = *state
            .descriptor_sets
            .get(set)
            .ok_or(AshesError::ResourceLost {
                what: "descriptor set",
            })?;
        for write in writes {
            match *write {
                WriteDescriptorSet::UniformBuffer {
                    binding,
                    buffer,
                    offset,
                    range,
                }
                | WriteDescriptorSet::StorageBuffer {
                    binding,
                    buffer,
                    offset,
                    range,
                } => {
                    let entry = state
                        .buffers
                        .get(buffer)
                        .ok_or(AshesError::ResourceLost { what: "buffer" })?;
                    let descriptor_type = if matches!(write, WriteDescriptorSet::UniformBuffer { .. })
                    {
                        vk::DescriptorType::UNIFORM_BUFFER
                    } else {
                        vk::DescriptorType::STORAGE_BUFFER
                    };
                    let buffer_info = [vk::DescriptorBufferInfo {
                        buffer: entry.buffer,
                        offset,
                        range,
                    }];
                    let native = vk::WriteDescriptorSet::builder()
                        .dst_set(raw_set)
                        .dst_binding(binding)
                        .descriptor_type(descriptor_type)
                        .buffer_info(&buffer_info)
                        .build();
                    unsafe { state.device.update_descriptor_sets(&[native], &[]) };
                }
                WriteDescriptorSet::CombinedImageSampler {
                    binding,
                    view,
                    sampler,
                } => {
                    let view = state
                        .views
                        .get(view)
                        .ok_or(AshesError::ResourceLost { what: "image view" })?;
                    let sampler = *state
                        .samplers
                        .get(sampler)
                        .ok_or(AshesError::ResourceLost { what: "sampler" })?;
                    let image_info = [vk::DescriptorImageInfo {
                        sampler,
                        image_view: view.view,
                        image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                    }];
                    let native = vk::WriteDescriptorSet::builder()
                        .dst_set(raw_set)
                        .dst_binding(binding)
                        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                        .image_info(&image_info)
                        .build();
                    unsafe { state.device.update_descriptor_sets(&[native], &[]) };
                }
            }
        }
        Ok(())
    }

    /// Create a pipeline layout
    pub fn create_pipeline_layout(
        &self,
        info: PipelineLayoutCreateInfo,
    ) -> AshesResult<PipelineLayoutHandle> {
        let mut state = self.state.borrow_mut();
        let mut set_layouts = Vec::with_capacity(info.set_layouts.len());
        for &layout in &info.set_layouts {
            set_layouts.push(
                state
                    .set_layouts
                    .get(layout)
                    .ok_or(AshesError::ResourceLost {
                        what: "descriptor set layout",
                    })?
                    .raw,
            );
        }
        let push_constant_ranges: Vec<vk::PushConstantRange> = info
            .push_constant_ranges
            .iter()
            .map(|r| {
                vk::PushConstantRange::builder()
                    .stage_flags(convert::shader_stages(r.stages))
                    .offset(r.offset)
                    .size(r.size)
                    .build()
            })
            .collect();
        let layout_info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);
        let layout = unsafe {
            state
                .device
                .create_pipeline_layout(&layout_info, None)
                .map_err(|e| backend("failed to create pipeline layout", e))?
        };
        Ok(state.pipeline_layouts.insert(layout))
    }

    /// Create a graphics pipeline from the complete state bundle
    pub fn create_graphics_pipeline(
        &self,
        info: GraphicsPipelineCreateInfo,
    ) -> AshesResult<PipelineHandle> {
        let mut state = self.state.borrow_mut();

        let entry_point = CString::new("main").expect("static string");
        let mut stages = Vec::with_capacity(info.stages.len());
        for &module in &info.stages {
            let entry = state
                .shader_modules
                .get(module)
                .ok_or(AshesError::ResourceLost {
                    what: "shader module",
                })?;
            stages.push(
                vk::PipelineShaderStageCreateInfo::builder()
                    .stage(convert::shader_stages(entry.stage))
                    .module(entry.module)
                    .name(&entry_point)
                    .build(),
            );
        }

        let bindings: Vec<vk::VertexInputBindingDescription> = info
            .vertex_input
            .bindings
            .iter()
            .map(|b| vk::VertexInputBindingDescription {
                binding: b.binding,
                stride: b.stride,
                input_rate: match b.input_rate {
                    crate::core::VertexInputRate::Vertex => vk::VertexInputRate::VERTEX,
                    crate::core::VertexInputRate::Instance => vk::VertexInputRate::INSTANCE,
                },
            })
            .collect();
        let attributes: Vec<vk::VertexInputAttributeDescription> = info
            .vertex_input
            .attributes
            .iter()
            .map(|a| vk::VertexInputAttributeDescription {
                location: a.location,
                binding: a.binding,
                format: convert::format(a.format),
                offset: a.offset,
            })
            .collect();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(convert::topology(info.input_assembly.topology))
            .primitive_restart_enable(info.input_assembly.primitive_restart);

        let static_viewport = info
            .viewport
            .unwrap_or_else(|| Viewport::whole(Extent2D::new(1, 1)));
        let viewports = [convert::viewport(static_viewport)];
        let scissors = [convert::rect_2d(
            info.scissor
                .unwrap_or_else(|| crate::core::Rect2D::whole(Extent2D::new(1, 1))),
        )];
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewports(&viewports)
            .scissors(&scissors);
        let mut dynamic_states = Vec::new();
        if info.viewport.is_none() {
            dynamic_states.push(vk::DynamicState::VIEWPORT);
        }
        if info.scissor.is_none() {
            dynamic_states.push(vk::DynamicState::SCISSOR);
        }
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        let raster = &info.rasterization;
        let (bias_constant, bias_slope) = raster.depth_bias.unwrap_or((0.0, 0.0));
        let rasterization = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(raster.depth_clamp)
            .rasterizer_discard_enable(false)
            .polygon_mode(convert::polygon_mode(raster.polygon_mode))
            .cull_mode(convert::cull_mode(raster.cull_mode))
            .front_face(convert::front_face(raster.front_face))
            .depth_bias_enable(raster.depth_bias.is_some())
            .depth_bias_constant_factor(bias_constant)
            .depth_bias_slope_factor(bias_slope)
            .line_width(raster.line_width);

        let multisample = vk::PipelineMultisampleStateCreateInfo::builder()
            .rasterization_samples(convert::sample_count(info.multisample.samples))
            .alpha_to_coverage_enable(info.multisample.alpha_to_coverage);

        let ds = &info.depth_stencil;
        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(ds.depth_test)
            .depth_write_enable(ds.depth_write)
            .depth_compare_op(convert::compare_op(ds.depth_compare))
            .stencil_test_enable(ds.stencil_test)
            .front(convert::stencil_op_state(&ds.front))
            .back(convert::stencil_op_state(&ds.back));

        let blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> = info
            .color_blend
            .attachments
            .iter()
            .map(|a| {
                vk::PipelineColorBlendAttachmentState::builder()
                    .blend_enable(a.blend_enable)
                    .src_color_blend_factor(convert::blend_factor(a.src_color))
                    .dst_color_blend_factor(convert::blend_factor(a.dst_color))
                    .color_blend_op(convert::blend_op(a.color_op))
                    .src_alpha_blend_factor(convert::blend_factor(a.src_alpha))
                    .dst_alpha_blend_factor(convert::blend_factor(a.dst_alpha))
                    .alpha_blend_op(convert::blend_op(a.alpha_op))
                    .color_write_mask(convert::color_components(a.color_write_mask))
                    .build()
            })
            .collect();
        let mut color_blend = vk::PipelineColorBlendStateCreateInfo::builder()
            .attachments(&blend_attachments)
            .blend_constants(info.color_blend.blend_constants);
        if let Some(op) = info.color_blend.logic_op {
            color_blend = color_blend
                .logic_op_enable(true)
                .logic_op(convert::logic_op(op));
        }

        let layout = *state
            .pipeline_layouts
            .get(info.layout)
            .ok_or(AshesError::ResourceLost {
                what: "pipeline layout",
            })?;
        let render_pass = state
            .render_passes
            .get(info.render_pass)
            .ok_or(AshesError::ResourceLost { what: "render pass" })?
            .raw;

        let mut pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(info.subpass);
        let tessellation;
        if let PrimitiveTopology::PatchList { control_points } = info.input_assembly.topology {
            tessellation = vk::PipelineTessellationStateCreateInfo::builder()
                .patch_control_points(control_points)
                .build();
            pipeline_info = pipeline_info.tessellation_state(&tessellation);
        }

        let pipelines = unsafe {
            state
                .device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info.build()], None)
                .map_err(|(_, e)| backend("failed to create graphics pipeline", e))?
        };
        Ok(state.pipelines.insert(pipelines[0]))
    }

    /// Destroy a pipeline; the handle becomes stale
    pub fn destroy_pipeline(&self, pipeline: PipelineHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.pipelines.remove(pipeline) {
            unsafe { state.device.destroy_pipeline(entry, None) };
        }
    }

    /// Bind views to a render pass's attachment slots
    pub fn create_framebuffer(
        &self,
        render_pass: RenderPassHandle,
        views: &[ImageViewHandle],
        extent: Extent2D,
    ) -> AshesResult<Framebuffer> {
        let mut state = self.state.borrow_mut();
        let entry = state
            .render_passes
            .get(render_pass)
            .ok_or(AshesError::ResourceLost { what: "render pass" })?;

        let mut descs = Vec::with_capacity(views.len());
        let mut raw_views = Vec::with_capacity(views.len());
        for &view in views {
            let view = state
                .views
                .get(view)
                .ok_or(AshesError::ResourceLost { what: "image view" })?;
            descs.push(AttachmentViewDesc {
                format: view.format,
                extent: view.extent,
            });
            raw_views.push(view.view);
        }
        validate_framebuffer(&entry.pass, extent, &descs)?;

        let framebuffer_info = vk::FramebufferCreateInfo::builder()
            .render_pass(entry.raw)
            .attachments(&raw_views)
            .width(extent.width)
            .height(extent.height)
            .layers(1);
        let raw = unsafe {
            state
                .device
                .create_framebuffer(&framebuffer_info, None)
                .map_err(|e| backend("failed to create framebuffer", e))?
        };
        let handle = state
            .framebuffers
            .insert(VkFramebufferEntry { raw, extent });
        Ok(Framebuffer::new(handle, views.len(), extent))
    }

    /// Destroy a framebuffer; its handle becomes stale
    pub fn destroy_framebuffer(&self, framebuffer: &Framebuffer) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.framebuffers.remove(framebuffer.handle()) {
            unsafe { state.device.destroy_framebuffer(entry.raw, None) };
        }
    }

    /// Create an unsignaled fence
    pub fn create_fence(&self) -> AshesResult<FenceHandle> {
        let mut state = self.state.borrow_mut();
        let fence = unsafe {
            state
                .device
                .create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(|e| backend("failed to create fence", e))?
        };
        Ok(state.fences.insert(fence))
    }

    /// Return a fence to the unsignaled state
    pub fn reset_fence(&self, fence: FenceHandle) -> AshesResult<()> {
        let state = self.state.borrow();
        let raw = *state
            .fences
            .get(fence)
            .ok_or(AshesError::ResourceLost { what: "fence" })?;
        unsafe {
            state
                .device
                .reset_fences(&[raw])
                .map_err(|e| backend("failed to reset fence", e))
        }
    }

    /// Block until the fence signals or `timeout_ns` elapses
    pub fn wait_for_fence(&self, fence: FenceHandle, timeout_ns: u64) -> AshesResult<WaitResult> {
        let state = self.state.borrow();
        let raw = *state
            .fences
            .get(fence)
            .ok_or(AshesError::ResourceLost { what: "fence" })?;
        match unsafe { state.device.wait_for_fences(&[raw], true, timeout_ns) } {
            Ok(()) => Ok(WaitResult::Success),
            Err(vk::Result::TIMEOUT) => Ok(WaitResult::TimedOut),
            Err(e) => {
                warn!("fence wait failed: {e}");
                Ok(WaitResult::Error)
            }
        }
    }

    /// Create a semaphore
    pub fn create_semaphore(&self) -> AshesResult<SemaphoreHandle> {
        let mut state = self.state.borrow_mut();
        let semaphore = unsafe {
            state
                .device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| backend("failed to create semaphore", e))?
        };
        Ok(state.semaphores.insert(semaphore))
    }

    /// Create a pool of `count` timestamp queries
    pub fn create_query_pool(&self, count: u32) -> AshesResult<QueryPoolHandle> {
        let mut state = self.state.borrow_mut();
        let pool_info = vk::QueryPoolCreateInfo::builder()
            .query_type(vk::QueryType::TIMESTAMP)
            .query_count(count);
        let pool = unsafe {
            state
                .device
                .create_query_pool(&pool_info, None)
                .map_err(|e| backend("failed to create query pool", e))?
        };
        Ok(state.query_pools.insert(pool))
    }

    /// Read back one query's timestamp, waiting for availability
    pub fn get_query_result(&self, pool: QueryPoolHandle, query: u32) -> AshesResult<u64> {
        let state = self.state.borrow();
        let raw = *state
            .query_pools
            .get(pool)
            .ok_or(AshesError::ResourceLost { what: "query pool" })?;
        let mut results = [0u64];
        unsafe {
            state
                .device
                .get_query_pool_results(
                    raw,
                    query,
                    1,
                    &mut results,
                    vk::QueryResultFlags::TYPE_64 | vk::QueryResultFlags::WAIT,
                )
                .map_err(|e| backend("failed to read query result", e))?;
        }
        Ok(results[0])
    }

    /// Block until the device is idle and release retired command buffers
    pub fn wait_idle(&self) -> AshesResult<()> {
        let mut state = self.state.borrow_mut();
        unsafe {
            state
                .device
                .device_wait_idle()
                .map_err(|e| backend("device wait failed", e))?;
        }
        let pending = std::mem::take(&mut state.pending);
        if !pending.is_empty() {
            unsafe {
                state
                    .device
                    .free_command_buffers(state.command_pool, &pending);
            }
        }
        Ok(())
    }

    pub(crate) fn state(&self) -> Rc<RefCell<VkDeviceState>> {
        Rc::clone(&self.state)
    }
}
