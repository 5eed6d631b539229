//! 插件生命周期
//!
//! 宿主加载插件时创建图形设备，设备在整个进程生命周期内由 `Plugin` 持有。
//! 找不到可用的后端是致命错误，宿主应中止启动。

use std::path::Path;

use tracing::{debug, info};

use crate::core::error::{PrismError, Result};
use crate::core::{log, Config};
use crate::gfx::{
    create_graphics_device, CoordinateConventions, DeviceSelection, DeviceShaders, GraphicsBackend, GraphicsDevice,
    HostWindow, NativeDeviceFactory,
};
use crate::native::{stage_and_load, NativeLibrary};
use crate::shader::{CompiledShaders, ShaderCompiler, ShaderDescription};

/// 已初始化的插件
///
/// 字段按释放顺序排列：着色器对象先于设备释放，原生库最后卸载。
pub struct Plugin {
    shaders: Option<DeviceShaders>,
    device: GraphicsDevice,
    libraries: Vec<NativeLibrary>,
    config: Config,
}

impl Plugin {
    /// 为宿主窗口创建图形设备
    ///
    /// 所有后端都失败时返回 `PrismError::PlatformNotSupported`。
    pub fn new(host: &dyn HostWindow, config: &Config) -> Result<Self> {
        let selection = DeviceSelection::from_config(config);
        let mut sink = |message: &str| log::log_sink(message);

        let device = create_graphics_device(
            &mut NativeDeviceFactory,
            host,
            config.device_options(),
            &selection,
            Some(&mut sink),
        )
        .ok_or_else(|| PrismError::PlatformNotSupported("Failed to initialize graphics device.".to_string()))?;

        let (width, height) = device.swapchain_size();
        info!(backend = %device.backend(), width, height, "Graphics device created");

        Ok(Self {
            shaders: None,
            device,
            libraries: Vec::new(),
            config: config.clone(),
        })
    }

    /// 部署并加载原生依赖，编译内置着色器并在设备上创建着色器对象
    ///
    /// 相对的 `library_root` 按工作目录解析，库也部署到工作目录。
    pub fn load(&mut self) -> Result<CompiledShaders> {
        let work_dir = std::env::current_dir()?;
        let (libraries, compiled) = prepare(&self.config, self.device.backend(), &work_dir)?;
        self.libraries = libraries;

        self.shaders = Some(self.device.create_shaders(&compiled)?);
        info!(backend = %self.device.backend(), "Built-in shaders uploaded to device");
        Ok(compiled)
    }

    pub fn device(&self) -> &GraphicsDevice {
        &self.device
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 设备端着色器对象，`load` 之前为 `None`
    pub fn shaders(&self) -> Option<&DeviceShaders> {
        self.shaders.as_ref()
    }

    pub fn libraries(&self) -> &[NativeLibrary] {
        &self.libraries
    }

    /// 设备创建时实际生效的坐标约定
    pub fn conventions(&self) -> CoordinateConventions {
        self.device.conventions()
    }
}

fn prepare(config: &Config, backend: GraphicsBackend, work_dir: &Path) -> Result<(Vec<NativeLibrary>, CompiledShaders)> {
    let libraries = match &config.native.library_root {
        Some(root) => stage_and_load(&work_dir.join(root), &config.native.libraries, work_dir)?,
        None => Vec::new(),
    };

    let (vertex, fragment) = ShaderDescription::builtin_pair();
    debug!(stage = vertex.stage.name(), source = %String::from_utf8_lossy(&vertex.source), "Vertex shader source");
    debug!(stage = fragment.stage.name(), source = %String::from_utf8_lossy(&fragment.source), "Fragment shader source");

    let shaders = ShaderCompiler::new().compile_pair(backend, &vertex, &fragment)?;
    info!(backend = %backend, "Built-in shaders compiled");
    Ok((libraries, shaders))
}
