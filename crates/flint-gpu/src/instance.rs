//! Vulkan instance creation and device selection.

use crate::error::{GpuError, Result};
use ash::vk;
use std::ffi::{CStr, CString};

/// Required instance extensions for windowed rendering.
pub fn required_instance_extensions() -> Vec<&'static CStr> {
    let extensions = vec![
        ash::khr::surface::NAME,
        #[cfg(target_os = "windows")]
        ash::khr::win32_surface::NAME,
        #[cfg(target_os = "linux")]
        ash::khr::xlib_surface::NAME,
        #[cfg(target_os = "linux")]
        ash::khr::wayland_surface::NAME,
        #[cfg(target_os = "macos")]
        ash::ext::metal_surface::NAME,
        #[cfg(target_os = "macos")]
        ash::khr::portability_enumeration::NAME,
    ];

    extensions
}

/// Validation layers to enable when requested.
pub fn validation_layers() -> Vec<&'static CStr> {
    vec![c"VK_LAYER_KHRONOS_validation"]
}

/// Create a Vulkan instance.
///
/// # Safety
/// The entry must be a valid Vulkan entry point.
pub unsafe fn create_instance(
    entry: &ash::Entry,
    app_name: &str,
    enable_validation: bool,
) -> Result<ash::Instance> {
    let app_name = CString::new(app_name)
        .map_err(|_| GpuError::Other("Application name contains a NUL byte".to_string()))?;
    let engine_name = c"Flint";

    // The pipeline layer only uses core 1.0 functionality
    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .engine_name(engine_name)
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_0);

    let extension_names: Vec<*const i8> = required_instance_extensions()
        .iter()
        .map(|ext| ext.as_ptr())
        .collect();

    let mut layers = if enable_validation {
        validation_layers()
    } else {
        vec![]
    };

    // Requesting an unknown layer fails instance creation; drop it instead
    let available_layers = entry.enumerate_instance_layer_properties()?;
    retain_available_layers(&mut layers, &available_layers);

    let layer_names: Vec<*const i8> = layers.iter().map(|l| l.as_ptr()).collect();

    // Required for MoltenVK on macOS
    #[cfg(target_os = "macos")]
    let create_flags = vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
    #[cfg(not(target_os = "macos"))]
    let create_flags = vk::InstanceCreateFlags::empty();

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extension_names)
        .enabled_layer_names(&layer_names)
        .flags(create_flags);

    let instance = entry.create_instance(&create_info, None)?;

    Ok(instance)
}

/// Drop requested layers the loader does not provide, warning for each.
fn retain_available_layers(requested: &mut Vec<&'static CStr>, available: &[vk::LayerProperties]) {
    requested.retain(|layer| {
        let found = available
            .iter()
            .any(|props| props.layer_name_as_c_str().is_ok_and(|name| name == *layer));
        if !found {
            tracing::warn!("Validation layer {:?} not available, skipping", layer);
        }
        found
    });
}

/// Select the best physical device.
///
/// # Safety
/// The instance must be valid.
pub unsafe fn select_physical_device(instance: &ash::Instance) -> Result<vk::PhysicalDevice> {
    let devices = instance.enumerate_physical_devices()?;

    if devices.is_empty() {
        return Err(GpuError::NoSuitableDevice);
    }

    // Any enumerated device is acceptable; scoring only orders them
    let mut best_device = None;
    let mut best_score = -1i32;

    for device in devices {
        let score = score_physical_device(instance, device);
        if score > best_score {
            best_score = score;
            best_device = Some(device);
        }
    }

    best_device.ok_or(GpuError::NoSuitableDevice)
}

/// Score a physical device for selection.
unsafe fn score_physical_device(instance: &ash::Instance, device: vk::PhysicalDevice) -> i32 {
    let properties = instance.get_physical_device_properties(device);

    let mut score = 0;

    // Prefer discrete GPUs
    match properties.device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => score += 1000,
        vk::PhysicalDeviceType::INTEGRATED_GPU => score += 100,
        vk::PhysicalDeviceType::VIRTUAL_GPU => score += 50,
        _ => {}
    }

    // Prefer more VRAM
    let memory = instance.get_physical_device_memory_properties(device);
    let vram_mb: u64 = memory
        .memory_heaps
        .iter()
        .take(memory.memory_heap_count as usize)
        .filter(|h| h.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
        .map(|h| h.size / (1024 * 1024))
        .sum();
    score += (vram_mb / 1024) as i32; // +1 per GB

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::c_char;

    fn layer(name: &CStr) -> vk::LayerProperties {
        let mut props = vk::LayerProperties::default();
        for (dst, byte) in props.layer_name.iter_mut().zip(name.to_bytes_with_nul()) {
            *dst = *byte as c_char;
        }
        props
    }

    #[test]
    fn unavailable_layers_are_dropped_from_the_request() {
        let available = [layer(c"VK_LAYER_KHRONOS_validation")];
        let mut requested = vec![c"VK_LAYER_KHRONOS_validation", c"VK_LAYER_not_installed"];

        retain_available_layers(&mut requested, &available);

        assert_eq!(requested, vec![c"VK_LAYER_KHRONOS_validation"]);
    }

    #[test]
    fn empty_availability_clears_every_request() {
        let mut requested = validation_layers();
        retain_available_layers(&mut requested, &[]);
        assert!(requested.is_empty());
    }
}
