//! Vulkan 后端
//!
//! 基于 `ash` 直接调用 Vulkan API，绑定到宿主窗口。
//!
//! # 初始化流程
//!
//! 1. 加载 Vulkan 加载器（找不到即"驱动不可用"）
//! 2. 按交换链来源启用对应的表面扩展并创建实例
//! 3. 创建窗口表面
//! 4. 选择同时支持图形与呈现的物理设备（优先独立显卡）
//! 5. 创建逻辑设备和队列
//! 6. 创建交换链与深度缓冲

use std::ffi::{c_char, c_void, CStr};
use ash::extensions::{khr, mvk};
use ash::vk;
use tracing::{debug, info, warn};

use super::options::{CoordinateConventions, GraphicsDeviceOptions, PixelFormat, SwapchainDescription};
use super::swapchain::SwapchainSource;
use crate::core::error::BackendError;
use crate::shader::ShaderArtifact;

/// Vulkan 设备
pub struct VulkanDevice {
    _entry: ash::Entry,
    instance: ash::Instance,
    surface_loader: khr::Surface,
    surface: vk::SurfaceKHR,
    device: ash::Device,
    queue_family_index: u32,
    queue: vk::Queue,
    swapchain_loader: khr::Swapchain,
    swapchain: vk::SwapchainKHR,
    surface_format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    depth: Option<DepthTarget>,
    conventions: CoordinateConventions,
    extent: vk::Extent2D,
    device_name: String,
}

impl VulkanDevice {
    /// 创建 Vulkan 设备与交换链
    ///
    /// 任何一步失败都会释放已创建的对象并返回错误。
    pub fn new(desc: &SwapchainDescription, options: &GraphicsDeviceOptions) -> Result<Self, BackendError> {
        let entry = unsafe { ash::Entry::load() }
            .map_err(|e| BackendError::DriverUnavailable(format!("Vulkan loader not found: {}", e)))?;

        let instance = create_instance(&entry, &desc.source)?;
        debug!(subsystem = desc.source.subsystem(), "Vulkan instance created");

        let surface = match unsafe { create_surface(&entry, &instance, &desc.source) } {
            Ok(surface) => surface,
            Err(e) => {
                unsafe { instance.destroy_instance(None) };
                return Err(e);
            }
        };
        let surface_loader = khr::Surface::new(&entry, &instance);

        match unsafe { Self::create_device(&instance, &surface_loader, surface, desc, options) } {
            Ok(parts) => {
                info!(
                    device = %parts.device_name,
                    width = parts.extent.width,
                    height = parts.extent.height,
                    format = ?parts.surface_format.format,
                    present_mode = ?parts.present_mode,
                    depth_format = ?parts.depth.as_ref().map(|d| d.format),
                    negative_viewport = !parts.conventions.clip_space_y_inverted,
                    "Vulkan device created"
                );
                Ok(Self {
                    _entry: entry,
                    instance,
                    surface_loader,
                    surface,
                    device: parts.device,
                    queue_family_index: parts.queue_family_index,
                    queue: parts.queue,
                    swapchain_loader: parts.swapchain_loader,
                    swapchain: parts.swapchain,
                    surface_format: parts.surface_format,
                    present_mode: parts.present_mode,
                    depth: parts.depth,
                    conventions: parts.conventions,
                    extent: parts.extent,
                    device_name: parts.device_name,
                })
            }
            Err(e) => {
                unsafe {
                    surface_loader.destroy_surface(surface, None);
                    instance.destroy_instance(None);
                }
                Err(e)
            }
        }
    }

    unsafe fn create_device(
        instance: &ash::Instance,
        surface_loader: &khr::Surface,
        surface: vk::SurfaceKHR,
        desc: &SwapchainDescription,
        options: &GraphicsDeviceOptions,
    ) -> Result<DeviceParts, BackendError> {
        let (physical_device, queue_family_index) = pick_physical_device(instance, surface_loader, surface)?;

        let properties = instance.get_physical_device_properties(physical_device);
        let device_name = CStr::from_ptr(properties.device_name.as_ptr())
            .to_string_lossy()
            .into_owned();

        let depth_format = match desc.depth_format {
            Some(format) => Some(check_depth_format(instance, physical_device, format)?),
            None => None,
        };

        // 负高度视口需要 VK_KHR_maintenance1，缺失时保留 Vulkan 原生的 Y 向下
        let negative_viewport = options.prefer_standard_clip_space_y_direction
            && device_extension_supported(instance, physical_device, vk::KhrMaintenance1Fn::name());

        let priorities = [1.0f32];
        let queue_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(queue_family_index)
            .queue_priorities(&priorities)
            .build();
        let queue_infos = [queue_info];

        let mut extension_names = vec![khr::Swapchain::name().as_ptr()];
        if negative_viewport {
            extension_names.push(vk::KhrMaintenance1Fn::name().as_ptr());
        }
        if matches!(desc.source, SwapchainSource::Cocoa { .. }) {
            extension_names.push(vk::KhrPortabilitySubsetFn::name().as_ptr());
        }

        let device_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_names);

        let device = instance
            .create_device(physical_device, &device_info, None)
            .map_err(|e| BackendError::Native(format!("vkCreateDevice failed: {}", e)))?;
        let queue = device.get_device_queue(queue_family_index, 0);

        let swapchain_loader = khr::Swapchain::new(instance, &device);
        let swapchain = match create_swapchain(surface_loader, &swapchain_loader, physical_device, surface, desc) {
            Ok(swapchain) => swapchain,
            Err(e) => {
                device.destroy_device(None);
                return Err(e);
            }
        };

        let depth = match depth_format {
            Some((format, aspect)) => {
                match DepthTarget::new(instance, physical_device, &device, format, aspect, swapchain.extent) {
                    Ok(depth) => Some(depth),
                    Err(e) => {
                        swapchain_loader.destroy_swapchain(swapchain.handle, None);
                        device.destroy_device(None);
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        Ok(DeviceParts {
            device,
            queue_family_index,
            queue,
            swapchain_loader,
            swapchain: swapchain.handle,
            surface_format: swapchain.format,
            present_mode: swapchain.present_mode,
            depth,
            conventions: CoordinateConventions {
                clip_space_y_inverted: !negative_viewport,
                depth_range_zero_to_one: true,
            },
            extent: swapchain.extent,
            device_name,
        })
    }

    /// 由 SPIR-V 创建着色器模块
    pub fn create_shaders(&self, vertex: &ShaderArtifact, fragment: &ShaderArtifact) -> Result<VulkanShaders, BackendError> {
        let vertex_module = self.create_shader_module(vertex)?;
        let fragment_module = match self.create_shader_module(fragment) {
            Ok(module) => module,
            Err(e) => {
                unsafe { self.device.destroy_shader_module(vertex_module, None) };
                return Err(e);
            }
        };
        debug!("Vulkan shader modules created");

        Ok(VulkanShaders {
            device: self.device.clone(),
            vertex: vertex_module,
            fragment: fragment_module,
        })
    }

    fn create_shader_module(&self, artifact: &ShaderArtifact) -> Result<vk::ShaderModule, BackendError> {
        let bytes = artifact.spirv().ok_or_else(|| {
            BackendError::Native(format!("Vulkan needs SPIR-V for the {} stage", artifact.stage.name()))
        })?;
        let words = spirv_words(bytes)?;
        let info = vk::ShaderModuleCreateInfo::builder().code(&words);
        unsafe { self.device.create_shader_module(&info, None) }
            .map_err(|e| BackendError::Native(format!("vkCreateShaderModule failed: {}", e)))
    }

    /// 实际采用的坐标约定
    pub fn conventions(&self) -> CoordinateConventions {
        self.conventions
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn swapchain_size(&self) -> (u32, u32) {
        (self.extent.width, self.extent.height)
    }

    pub fn surface_format(&self) -> vk::Format {
        self.surface_format.format
    }

    pub fn depth_format(&self) -> Option<vk::Format> {
        self.depth.as_ref().map(|d| d.format)
    }

    /// 深度缓冲视图
    pub fn depth_view(&self) -> Option<vk::ImageView> {
        self.depth.as_ref().map(|d| d.view)
    }

    pub fn queue(&self) -> (vk::Queue, u32) {
        (self.queue, self.queue_family_index)
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                warn!("vkDeviceWaitIdle failed during teardown: {}", e);
            }
            if let Some(depth) = self.depth.take() {
                depth.destroy(&self.device);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
            self.instance.destroy_instance(None);
        }
        debug!("Vulkan device destroyed");
    }
}

struct DeviceParts {
    device: ash::Device,
    queue_family_index: u32,
    queue: vk::Queue,
    swapchain_loader: khr::Swapchain,
    swapchain: vk::SwapchainKHR,
    surface_format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    depth: Option<DepthTarget>,
    conventions: CoordinateConventions,
    extent: vk::Extent2D,
    device_name: String,
}

/// 交换链尺寸的深度/模板缓冲
struct DepthTarget {
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
    format: vk::Format,
}

impl DepthTarget {
    unsafe fn new(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: &ash::Device,
        format: vk::Format,
        aspect: vk::ImageAspectFlags,
        extent: vk::Extent2D,
    ) -> Result<Self, BackendError> {
        let native = |call: &str, e: vk::Result| BackendError::Native(format!("{} failed: {}", call, e));

        let image_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D { width: extent.width, height: extent.height, depth: 1 })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);
        let image = device.create_image(&image_info, None).map_err(|e| native("vkCreateImage", e))?;

        let requirements = device.get_image_memory_requirements(image);
        let memory_properties = instance.get_physical_device_memory_properties(physical_device);
        let Some(memory_type) = find_memory_type(
            &memory_properties,
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        ) else {
            device.destroy_image(image, None);
            return Err(BackendError::Native("No device-local memory for the depth buffer".to_string()));
        };

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);
        let memory = match device.allocate_memory(&alloc_info, None) {
            Ok(memory) => memory,
            Err(e) => {
                device.destroy_image(image, None);
                return Err(native("vkAllocateMemory", e));
            }
        };
        if let Err(e) = device.bind_image_memory(image, memory, 0) {
            device.free_memory(memory, None);
            device.destroy_image(image, None);
            return Err(native("vkBindImageMemory", e));
        }

        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        let view = match device.create_image_view(&view_info, None) {
            Ok(view) => view,
            Err(e) => {
                device.free_memory(memory, None);
                device.destroy_image(image, None);
                return Err(native("vkCreateImageView", e));
            }
        };

        Ok(Self { image, memory, view, format })
    }

    unsafe fn destroy(self, device: &ash::Device) {
        device.destroy_image_view(self.view, None);
        device.destroy_image(self.image, None);
        device.free_memory(self.memory, None);
    }
}

/// 一对 Vulkan 着色器模块
///
/// 持有设备函数表的副本，必须在 `VulkanDevice` 之前释放。
pub struct VulkanShaders {
    device: ash::Device,
    vertex: vk::ShaderModule,
    fragment: vk::ShaderModule,
}

impl VulkanShaders {
    /// (顶点, 片段) 着色器模块
    pub fn modules(&self) -> (vk::ShaderModule, vk::ShaderModule) {
        (self.vertex, self.fragment)
    }
}

impl Drop for VulkanShaders {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.vertex, None);
            self.device.destroy_shader_module(self.fragment, None);
        }
    }
}

struct SwapchainParts {
    handle: vk::SwapchainKHR,
    format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    extent: vk::Extent2D,
}

/// 交换链来源需要的实例扩展
fn required_instance_extensions(source: &SwapchainSource) -> Vec<&'static CStr> {
    let platform = match source {
        SwapchainSource::Win32 { .. } => khr::Win32Surface::name(),
        SwapchainSource::Xlib { .. } => khr::XlibSurface::name(),
        SwapchainSource::Wayland { .. } => khr::WaylandSurface::name(),
        SwapchainSource::Cocoa { .. } => mvk::MacOSSurface::name(),
    };

    let mut extensions = vec![khr::Surface::name(), platform];
    if matches!(source, SwapchainSource::Cocoa { .. }) {
        extensions.push(vk::KhrPortabilityEnumerationFn::name());
    }
    extensions
}

fn create_instance(entry: &ash::Entry, source: &SwapchainSource) -> Result<ash::Instance, BackendError> {
    let app_name = CStr::from_bytes_with_nul(b"Prism\0").unwrap_or_default();
    let app_info = vk::ApplicationInfo::builder()
        .application_name(app_name)
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .engine_name(app_name)
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_0);

    let extension_names: Vec<*const c_char> = required_instance_extensions(source)
        .iter()
        .map(|name| name.as_ptr())
        .collect();

    let flags = if matches!(source, SwapchainSource::Cocoa { .. }) {
        vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
    } else {
        vk::InstanceCreateFlags::empty()
    };

    let create_info = vk::InstanceCreateInfo::builder()
        .flags(flags)
        .application_info(&app_info)
        .enabled_extension_names(&extension_names);

    unsafe { entry.create_instance(&create_info, None) }.map_err(|e| match e {
        vk::Result::ERROR_EXTENSION_NOT_PRESENT | vk::Result::ERROR_INCOMPATIBLE_DRIVER => {
            BackendError::DriverUnavailable(format!("vkCreateInstance failed: {}", e))
        }
        _ => BackendError::Native(format!("vkCreateInstance failed: {}", e)),
    })
}

unsafe fn create_surface(
    entry: &ash::Entry,
    instance: &ash::Instance,
    source: &SwapchainSource,
) -> Result<vk::SurfaceKHR, BackendError> {
    let result = match *source {
        SwapchainSource::Win32 { hwnd, hinstance } => {
            let info = vk::Win32SurfaceCreateInfoKHR {
                hinstance: hinstance as vk::HINSTANCE,
                hwnd: hwnd as vk::HWND,
                ..Default::default()
            };
            khr::Win32Surface::new(entry, instance).create_win32_surface(&info, None)
        }
        SwapchainSource::Xlib { display, window } => {
            let info = vk::XlibSurfaceCreateInfoKHR {
                dpy: display as *mut vk::Display,
                window: window as vk::Window,
                ..Default::default()
            };
            khr::XlibSurface::new(entry, instance).create_xlib_surface(&info, None)
        }
        SwapchainSource::Wayland { display, surface } => {
            let info = vk::WaylandSurfaceCreateInfoKHR {
                display: display as *mut vk::wl_display,
                surface: surface as *mut vk::wl_surface,
                ..Default::default()
            };
            khr::WaylandSurface::new(entry, instance).create_wayland_surface(&info, None)
        }
        SwapchainSource::Cocoa { ns_view } => {
            let info = vk::MacOSSurfaceCreateInfoMVK {
                p_view: ns_view as *const c_void,
                ..Default::default()
            };
            mvk::MacOSSurface::new(entry, instance).create_mac_os_surface(&info, None)
        }
    };

    result.map_err(|e| BackendError::Native(format!("Failed to create {} surface: {}", source.subsystem(), e)))
}

unsafe fn pick_physical_device(
    instance: &ash::Instance,
    surface_loader: &khr::Surface,
    surface: vk::SurfaceKHR,
) -> Result<(vk::PhysicalDevice, u32), BackendError> {
    let devices = instance
        .enumerate_physical_devices()
        .map_err(|e| BackendError::Native(format!("vkEnumeratePhysicalDevices failed: {}", e)))?;

    let mut candidates = Vec::new();
    for device in devices {
        if !device_extension_supported(instance, device, khr::Swapchain::name()) {
            continue;
        }

        let families = instance.get_physical_device_queue_family_properties(device);
        let family = families.iter().enumerate().position(|(index, family)| {
            family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                && surface_loader
                    .get_physical_device_surface_support(device, index as u32, surface)
                    .unwrap_or(false)
        });

        if let Some(index) = family {
            let device_type = instance.get_physical_device_properties(device).device_type;
            candidates.push((device, index as u32, device_type));
        }
    }

    candidates
        .iter()
        .min_by_key(|(_, _, device_type)| device_type_rank(*device_type))
        .map(|&(device, index, _)| (device, index))
        .ok_or_else(|| BackendError::DriverUnavailable("No Vulkan device can present to this window".to_string()))
}

fn device_type_rank(device_type: vk::PhysicalDeviceType) -> u32 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 0,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 1,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
        vk::PhysicalDeviceType::CPU => 3,
        _ => 4,
    }
}

unsafe fn device_extension_supported(instance: &ash::Instance, device: vk::PhysicalDevice, name: &CStr) -> bool {
    let Ok(extensions) = instance.enumerate_device_extension_properties(device) else {
        return false;
    };
    extensions
        .iter()
        .any(|ext| CStr::from_ptr(ext.extension_name.as_ptr()) == name)
}

fn find_memory_type(
    properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    flags: vk::MemoryPropertyFlags,
) -> Option<u32> {
    (0..properties.memory_type_count).find(|&index| {
        type_bits & (1 << index) != 0
            && properties.memory_types[index as usize].property_flags.contains(flags)
    })
}

fn depth_aspect_mask(format: PixelFormat) -> vk::ImageAspectFlags {
    if format.has_stencil() {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    } else {
        vk::ImageAspectFlags::DEPTH
    }
}

/// SPIR-V 字节转为 32 位字，校验长度与魔数
fn spirv_words(bytes: &[u8]) -> Result<Vec<u32>, BackendError> {
    ash::util::read_spv(&mut std::io::Cursor::new(bytes))
        .map_err(|e| BackendError::Native(format!("Invalid SPIR-V: {}", e)))
}

unsafe fn check_depth_format(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    format: PixelFormat,
) -> Result<(vk::Format, vk::ImageAspectFlags), BackendError> {
    let vk_format = to_vk_depth_format(format);
    let properties = instance.get_physical_device_format_properties(device, vk_format);
    if properties
        .optimal_tiling_features
        .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
    {
        Ok((vk_format, depth_aspect_mask(format)))
    } else {
        Err(BackendError::Native(format!("Depth format {:?} is not supported", vk_format)))
    }
}

unsafe fn create_swapchain(
    surface_loader: &khr::Surface,
    swapchain_loader: &khr::Swapchain,
    physical_device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    desc: &SwapchainDescription,
) -> Result<SwapchainParts, BackendError> {
    let native = |call: &str, e: vk::Result| BackendError::Native(format!("{} failed: {}", call, e));

    let capabilities = surface_loader
        .get_physical_device_surface_capabilities(physical_device, surface)
        .map_err(|e| native("vkGetPhysicalDeviceSurfaceCapabilitiesKHR", e))?;
    let formats = surface_loader
        .get_physical_device_surface_formats(physical_device, surface)
        .map_err(|e| native("vkGetPhysicalDeviceSurfaceFormatsKHR", e))?;
    let present_modes = surface_loader
        .get_physical_device_surface_present_modes(physical_device, surface)
        .map_err(|e| native("vkGetPhysicalDeviceSurfacePresentModesKHR", e))?;

    let format = choose_surface_format(&formats, desc.srgb)
        .ok_or_else(|| BackendError::Native("Surface reports no formats".to_string()))?;
    let present_mode = choose_present_mode(&present_modes, desc.sync_to_vertical_blank);
    let extent = choose_extent(&capabilities, desc.width, desc.height);

    let mut image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        image_count = image_count.min(capabilities.max_image_count);
    }

    let create_info = vk::SwapchainCreateInfoKHR::builder()
        .surface(surface)
        .min_image_count(image_count)
        .image_format(format.format)
        .image_color_space(format.color_space)
        .image_extent(extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        .pre_transform(capabilities.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode)
        .clipped(true);

    let handle = swapchain_loader
        .create_swapchain(&create_info, None)
        .map_err(|e| native("vkCreateSwapchainKHR", e))?;

    Ok(SwapchainParts { handle, format, present_mode, extent })
}

fn choose_surface_format(formats: &[vk::SurfaceFormatKHR], srgb: bool) -> Option<vk::SurfaceFormatKHR> {
    let wanted = if srgb { vk::Format::B8G8R8A8_SRGB } else { vk::Format::B8G8R8A8_UNORM };

    // 只返回一个 UNDEFINED 表示任意格式都可以
    if let [only] = formats {
        if only.format == vk::Format::UNDEFINED {
            return Some(vk::SurfaceFormatKHR {
                format: wanted,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            });
        }
    }

    formats
        .iter()
        .find(|f| f.format == wanted)
        .or_else(|| formats.first())
        .copied()
}

fn choose_present_mode(modes: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE]
        .into_iter()
        .find(|mode| modes.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
        height: height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
    }
}

fn to_vk_depth_format(format: PixelFormat) -> vk::Format {
    match format {
        PixelFormat::D24UNormS8UInt => vk::Format::D24_UNORM_S8_UINT,
        PixelFormat::D32Float => vk::Format::D32_SFLOAT,
        PixelFormat::D32FloatS8UInt => vk::Format::D32_SFLOAT_S8_UINT,
        PixelFormat::R16UNorm => vk::Format::D16_UNORM,
    }
}
