//! 错误处理模块
//!
//! 定义了引导层使用的统一错误类型。
//!
//! # 错误分类
//!
//! - `ConfigError`：配置文件读取、解析与校验
//! - `BackendError`：单个图形后端的设备创建失败（会被设备编排器吞掉并尝试下一个后端）
//! - `SwapchainSourceError`：宿主窗口句柄无法转换为交换链描述
//! - `ShaderError`：着色器前端编译与交叉编译失败
//! - `PrismError`：向插件边界传播的顶层错误（含原生库加载失败）

use std::fmt;

/// 引导层统一的 Result 类型
pub type Result<T> = std::result::Result<T, PrismError>;

/// 顶层错误类型
#[derive(Debug)]
pub enum PrismError {
    /// 配置错误
    Config(ConfigError),

    /// 图形设备错误
    Graphics(BackendError),

    /// 着色器错误
    Shader(ShaderError),

    /// IO 错误
    Io(std::io::Error),

    /// 原生库无法加载
    NativeLibrary(String),

    /// 平台不受支持（所有后端都无法创建设备）
    PlatformNotSupported(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 单个后端设备创建失败的原因
///
/// 设备编排器对所有变体一视同仁：记录日志后尝试下一个后端。
/// 区分变体只是为了让日志与调用方能够分辨失败类型。
#[derive(Debug)]
pub enum BackendError {
    /// 驱动或原生库不可用（缺少驱动、硬件不支持、当前平台没有该 API）
    DriverUnavailable(String),

    /// 窗口子系统不受支持，整个平台无法提供交换链
    PlatformNotSupported(SwapchainSourceError),

    /// 原生图形库调用失败
    Native(String),
}

/// 交换链来源提取错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapchainSourceError {
    /// 宿主窗口属于无法识别的窗口子系统
    UnsupportedSubsystem(String),

    /// 宿主无法提供窗口或显示句柄
    HandleUnavailable(String),
}

/// 着色器编译相关的错误
#[derive(Debug)]
pub enum ShaderError {
    /// 前端编译失败（GLSL 语法或语义错误）
    Compilation { stage: String, message: String },

    /// 交叉编译失败
    CrossCompilation(String),

    /// 目标后端不支持交叉编译
    UnsupportedBackend(String),
}

impl fmt::Display for PrismError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrismError::Config(e) => write!(f, "Configuration error: {}", e),
            PrismError::Graphics(e) => write!(f, "Graphics error: {}", e),
            PrismError::Shader(e) => write!(f, "Shader error: {}", e),
            PrismError::Io(e) => write!(f, "IO error: {}", e),
            PrismError::NativeLibrary(msg) => write!(f, "Failed to load native library: {}", msg),
            PrismError::PlatformNotSupported(msg) => write!(f, "Platform not supported: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::DriverUnavailable(msg) => write!(f, "Driver unavailable: {}", msg),
            BackendError::PlatformNotSupported(e) => write!(f, "Platform not supported: {}", e),
            BackendError::Native(msg) => write!(f, "Native graphics call failed: {}", msg),
        }
    }
}

impl fmt::Display for SwapchainSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapchainSourceError::UnsupportedSubsystem(name) => {
                write!(f, "Unsupported window subsystem: {}", name)
            }
            SwapchainSourceError::HandleUnavailable(msg) => {
                write!(f, "Window handle unavailable: {}", msg)
            }
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Compilation { stage, message } => {
                write!(f, "Failed to compile {} shader: {}", stage, message)
            }
            ShaderError::CrossCompilation(msg) => write!(f, "Cross-compilation failed: {}", msg),
            ShaderError::UnsupportedBackend(name) => {
                write!(f, "Unsupported graphics backend: {}", name)
            }
        }
    }
}

impl std::error::Error for PrismError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrismError::Config(e) => Some(e),
            PrismError::Graphics(e) => Some(e),
            PrismError::Shader(e) => Some(e),
            PrismError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for ShaderError {}
impl std::error::Error for SwapchainSourceError {}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::PlatformNotSupported(e) => Some(e),
            _ => None,
        }
    }
}

impl BackendError {
    /// 是否为平台不受支持（区别于驱动不可用）
    pub fn is_platform_not_supported(&self) -> bool {
        matches!(self, BackendError::PlatformNotSupported(_))
    }
}

// 实现 From trait 以便于错误转换
impl From<std::io::Error> for PrismError {
    fn from(err: std::io::Error) -> Self {
        PrismError::Io(err)
    }
}

impl From<ConfigError> for PrismError {
    fn from(err: ConfigError) -> Self {
        PrismError::Config(err)
    }
}

impl From<BackendError> for PrismError {
    fn from(err: BackendError) -> Self {
        PrismError::Graphics(err)
    }
}

impl From<ShaderError> for PrismError {
    fn from(err: ShaderError) -> Self {
        PrismError::Shader(err)
    }
}

impl From<SwapchainSourceError> for BackendError {
    fn from(err: SwapchainSourceError) -> Self {
        BackendError::PlatformNotSupported(err)
    }
}
