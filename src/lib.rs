//! Prism - 游戏插件的图形后端引导层
//!
//! 在运行时选择原生图形 API（Direct3D11、OpenGL 或 Vulkan），
//! 创建绑定到宿主窗口的图形设备，并把内置 GLSL 着色器编译为后端可用的形式。
//!
//! # 模块结构
//!
//! - `core`: 基础设施（日志、配置、错误处理）
//! - `gfx`: 后端选择、交换链来源提取与设备创建编排
//! - `shader`: GLSL → SPIR-V → HLSL/GLSL 着色器管线
//! - `native`: 原生依赖库部署
//! - `plugin`: 插件生命周期
//!
//! # 使用示例
//!
//! ```no_run
//! use prism::core::Config;
//! use prism::plugin::Plugin;
//!
//! # fn run(window: &winit::window::Window) -> prism::core::Result<()> {
//! let mut config = Config::from_file_or_default("prism.toml");
//! config.apply_env(|key| std::env::var(key).ok());
//!
//! let mut plugin = Plugin::new(window, &config)?;
//! let shaders = plugin.load()?;
//! println!("{:?} vertex shader ready", shaders.vertex.stage);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod gfx;
pub mod native;
pub mod plugin;
pub mod shader;
