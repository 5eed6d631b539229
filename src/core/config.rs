//! 配置管理模块
//!
//! 提供引导层配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，环境变量与命令行参数覆盖。
//! 所有外部输入只在启动时读取一次，之后以 `Config` 值显式传递。
//!
//! # 配置文件格式 (prism.toml)
//!
//! ```toml
//! [graphics]
//! backend = "vulkan"        # direct3d11 / opengl / vulkan，可省略
//! deduplicate_fallbacks = false
//! prefer_standard_clip_space_y_direction = true
//! prefer_depth_range_zero_to_one = true
//! depth_format = "d24_unorm_s8_uint"
//! vsync = false
//! srgb = false
//!
//! [window]
//! width = 1280
//! height = 720
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//!
//! [native]
//! library_root = "lib/native"
//! libraries = ["libveldrid-spirv"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};
use crate::gfx::{GraphicsBackend, GraphicsDeviceOptions, PixelFormat};

/// 强制指定图形驱动的环境变量（宿主通过 `/gldevice:%s` 设置）
pub const FORCE_DRIVER_ENV: &str = "FNA3D_FORCE_DRIVER";

/// 引导层配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 窗口配置（仅探测程序使用，插件模式下窗口由宿主拥有）
    #[serde(default)]
    pub window: WindowConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,

    /// 原生依赖配置
    #[serde(default)]
    pub native: NativeConfig,
}

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 强制使用的后端；为空时由优先级策略决定
    #[serde(default)]
    pub backend: Option<GraphicsBackend>,

    /// 回退序列中跳过已失败的首选后端
    #[serde(default)]
    pub deduplicate_fallbacks: bool,

    /// 优先使用标准裁剪空间 Y 方向
    #[serde(default = "default_true")]
    pub prefer_standard_clip_space_y_direction: bool,

    /// 优先使用 [0, 1] 深度范围
    #[serde(default = "default_true")]
    pub prefer_depth_range_zero_to_one: bool,

    /// 交换链深度/模板格式
    #[serde(default)]
    pub depth_format: Option<PixelFormat>,

    /// 垂直同步
    #[serde(default)]
    pub vsync: bool,

    /// sRGB 交换链格式
    #[serde(default)]
    pub srgb: bool,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 原生依赖配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeConfig {
    /// 按 `{platform}-{bitness}` 分目录存放原生库的根目录，相对路径按工作目录解析；
    /// 为 `None` 时不做提取
    #[serde(default = "default_library_root")]
    pub library_root: Option<PathBuf>,

    /// 需要提取到工作目录的库（不带扩展名）
    #[serde(default = "default_libraries")]
    pub libraries: Vec<String>,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_true() -> bool { true }
fn default_width() -> u32 { 1280 }
fn default_height() -> u32 { 720 }
fn default_title() -> String { "Prism".to_string() }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_log_file() -> String { "prism.log".to_string() }
fn default_library_root() -> Option<PathBuf> { Some(PathBuf::from("lib/native")) }
fn default_libraries() -> Vec<String> { vec!["libveldrid-spirv".to_string()] }

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            backend: None,
            deduplicate_fallbacks: false,
            prefer_standard_clip_space_y_direction: default_true(),
            prefer_depth_range_zero_to_one: default_true(),
            depth_format: None,
            vsync: false,
            srgb: false,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_file: default_log_file(),
        }
    }
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            library_root: default_library_root(),
            libraries: default_libraries(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在或无法解析则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 应用环境变量覆盖
    ///
    /// 只识别 `FNA3D_FORCE_DRIVER` 的三个取值（`D3D11`、`OpenGL`、`Vulkan`）。
    /// 其他取值与未设置等价，不覆盖已有配置。
    ///
    /// # 参数
    ///
    /// * `lookup` - 环境变量查询函数，生产环境传入 `|k| std::env::var(k).ok()`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(FORCE_DRIVER_ENV) {
            match GraphicsBackend::from_override_token(&token) {
                Some(backend) => self.graphics.backend = Some(backend),
                None => tracing::debug!(
                    token = %token,
                    "Ignoring unrecognized {}", FORCE_DRIVER_ENV
                ),
            }
        }
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--d3d11` / `--opengl` / `--vulkan`: 强制使用对应后端
    /// - `--width <value>`: 设置窗口宽度
    /// - `--height <value>`: 设置窗口高度
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        for arg in &args {
            let backend = match arg.as_str() {
                "--d3d11" => GraphicsBackend::Direct3D11,
                "--opengl" => GraphicsBackend::OpenGL,
                "--vulkan" => GraphicsBackend::Vulkan,
                _ => continue,
            };
            self.graphics.backend = Some(backend);
        }

        if let Some(idx) = args.iter().position(|a| a == "--width") {
            if let Some(width) = args.get(idx + 1).and_then(|s| s.parse().ok()) {
                self.window.width = width;
            }
        }

        if let Some(idx) = args.iter().position(|a| a == "--height") {
            if let Some(height) = args.get(idx + 1).and_then(|s| s.parse().ok()) {
                self.window.height = height;
            }
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Window dimensions must be greater than 0".to_string(),
            }.into());
        }

        if let Some(name) = self.native.libraries.iter().find(|l| l.is_empty() || l.contains(['/', '\\'])) {
            return Err(ConfigError::InvalidValue {
                field: "native.libraries".to_string(),
                reason: format!("'{}' must be a bare library name", name),
            }.into());
        }

        Ok(())
    }

    /// 由图形配置构建设备创建选项
    pub fn device_options(&self) -> GraphicsDeviceOptions {
        GraphicsDeviceOptions {
            prefer_standard_clip_space_y_direction: self.graphics.prefer_standard_clip_space_y_direction,
            prefer_depth_range_zero_to_one: self.graphics.prefer_depth_range_zero_to_one,
            swapchain_depth_format: self.graphics.depth_format,
            sync_to_vertical_blank: self.graphics.vsync,
            swapchain_srgb_format: self.graphics.srgb,
        }
    }
}
