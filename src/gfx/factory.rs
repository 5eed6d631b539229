//! 原生设备工厂
//!
//! `DeviceFactory` 的生产实现：提取交换链来源后调用对应后端的原生创建函数。

use tracing::debug;

use super::d3d11::D3D11Device;
use super::device::{DeviceFactory, GraphicsDevice};
use super::host::HostWindow;
use super::opengl::OpenGlDevice;
use super::options::{GraphicsDeviceOptions, SwapchainDescription};
use super::swapchain::SwapchainSource;
use super::vulkan::VulkanDevice;
use crate::core::error::BackendError;

/// 调用原生图形库创建设备
#[derive(Debug, Default)]
pub struct NativeDeviceFactory;

impl NativeDeviceFactory {
    fn swapchain_description(
        host: &dyn HostWindow,
        options: &GraphicsDeviceOptions,
    ) -> Result<SwapchainDescription, BackendError> {
        let source = SwapchainSource::from_host(host)?;
        debug!(subsystem = source.subsystem(), "Swapchain source extracted");
        Ok(SwapchainDescription::new(source, host.client_size(), options))
    }
}

impl DeviceFactory for NativeDeviceFactory {
    type Device = GraphicsDevice;

    fn create_d3d11(&mut self, host: &dyn HostWindow, options: &GraphicsDeviceOptions) -> Result<GraphicsDevice, BackendError> {
        let desc = Self::swapchain_description(host, options)?;
        D3D11Device::new(&desc, options).map(GraphicsDevice::Direct3D11)
    }

    fn create_opengl(&mut self, host: &dyn HostWindow, options: &GraphicsDeviceOptions) -> Result<GraphicsDevice, BackendError> {
        let platform = host.opengl_platform().ok_or_else(|| {
            BackendError::DriverUnavailable("Host window does not expose an OpenGL context".to_string())
        })?;
        OpenGlDevice::new(platform, host.client_size(), options).map(GraphicsDevice::OpenGL)
    }

    fn create_vulkan(&mut self, host: &dyn HostWindow, options: &GraphicsDeviceOptions) -> Result<GraphicsDevice, BackendError> {
        let desc = Self::swapchain_description(host, options)?;
        VulkanDevice::new(&desc, options).map(GraphicsDevice::Vulkan)
    }
}
