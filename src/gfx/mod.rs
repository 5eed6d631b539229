//! 图形后端模块
//!
//! 本模块负责选择图形后端并创建绑定到宿主窗口的设备：
//! - Direct3D11：Windows 平台
//! - OpenGL：包装宿主已有的 GL 上下文
//! - Vulkan：基于 `ash` 的跨平台实现
//!
//! 设备创建由 `device::create_graphics_device` 编排，
//! 具体的原生调用通过 `DeviceFactory` trait 注入。

pub mod backend;
pub mod options;
pub mod swapchain;
pub mod host;
pub mod device;
pub mod factory;
pub mod d3d11;
pub mod opengl;
pub mod vulkan;

pub use backend::{resolve_backend, GraphicsBackend, HostOs};
pub use options::{CoordinateConventions, GraphicsDeviceOptions, PixelFormat, SwapchainDescription};
pub use swapchain::SwapchainSource;
pub use host::HostWindow;
pub use device::{create_graphics_device, DeviceFactory, DeviceSelection, DeviceShaders, GraphicsDevice};
pub use factory::NativeDeviceFactory;
pub use opengl::OpenGlPlatformInfo;
