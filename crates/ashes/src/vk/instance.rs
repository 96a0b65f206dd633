//! Vulkan entry, instance, and optional debug messenger

use std::ffi::{c_void, CStr, CString};

use ash::extensions::ext::DebugUtils;
use ash::{vk, Entry};
use log::{debug, error, warn};

use crate::config::VkConfig;
use crate::core::{AshesError, AshesResult};

const VALIDATION_LAYER: &CStr =
    unsafe { CStr::from_bytes_with_nul_unchecked(b"VK_LAYER_KHRONOS_validation\0") };

/// Loaded Vulkan library plus one instance
///
/// Must outlive every [`super::VkDevice`] and surface created from it.
pub struct VkInstance {
    entry: Entry,
    instance: ash::Instance,
    debug: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    let message = unsafe {
        if data.is_null() || (*data).p_message.is_null() {
            return vk::FALSE;
        }
        CStr::from_ptr((*data).p_message).to_string_lossy()
    };
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        error!("vulkan: {message}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        warn!("vulkan: {message}");
    } else {
        debug!("vulkan: {message}");
    }
    vk::FALSE
}

impl VkInstance {
    /// Load Vulkan and create an instance
    ///
    /// `extensions` are the window system's required instance extensions
    /// (from `ash_window::enumerate_required_extensions`); pass an empty
    /// slice for headless use. Validation layers and the debug messenger
    /// are enabled per `config.validation` when the layer is installed.
    pub fn new(config: &VkConfig, extensions: &[*const i8]) -> AshesResult<Self> {
        let entry = unsafe {
            Entry::load().map_err(|e| {
                AshesError::Initialization(format!("failed to load Vulkan library: {e}"))
            })?
        };

        let app_name = CString::new(config.app_name.as_str()).map_err(|_| {
            AshesError::Configuration {
                reason: "application name contains a NUL byte".into(),
            }
        })?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(0)
            .engine_name(&app_name)
            .engine_version(0)
            .api_version(vk::API_VERSION_1_0);

        let validation = config.validation && Self::validation_layer_available(&entry);
        if config.validation && !validation {
            warn!("validation requested but VK_LAYER_KHRONOS_validation is not installed");
        }

        let mut enabled_extensions = extensions.to_vec();
        if validation {
            enabled_extensions.push(DebugUtils::name().as_ptr());
        }
        let layers = if validation {
            vec![VALIDATION_LAYER.as_ptr()]
        } else {
            Vec::new()
        };

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&enabled_extensions)
            .enabled_layer_names(&layers);
        let instance = unsafe {
            entry.create_instance(&create_info, None).map_err(|e| {
                AshesError::Initialization(format!("failed to create Vulkan instance: {e}"))
            })?
        };

        let debug = if validation {
            let loader = DebugUtils::new(&entry, &instance);
            let messenger_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
                .message_severity(
                    vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                        | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                )
                .message_type(
                    vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                )
                .pfn_user_callback(Some(debug_callback));
            let messenger = unsafe {
                loader
                    .create_debug_utils_messenger(&messenger_info, None)
                    .map_err(|e| {
                        AshesError::Initialization(format!("failed to create debug messenger: {e}"))
                    })?
            };
            Some((loader, messenger))
        } else {
            None
        };

        Ok(Self {
            entry,
            instance,
            debug,
        })
    }

    fn validation_layer_available(entry: &Entry) -> bool {
        let Ok(layers) = entry.enumerate_instance_layer_properties() else {
            return false;
        };
        layers.iter().any(|layer| {
            let name = unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) };
            name == VALIDATION_LAYER
        })
    }

    /// The loaded entry points
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// The raw instance
    pub fn raw(&self) -> &ash::Instance {
        &self.instance
    }
}

impl Drop for VkInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((loader, messenger)) = self.debug.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}
