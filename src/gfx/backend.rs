//! 图形后端选择
//!
//! 后端集合是封闭的：Direct3D11、OpenGL、Vulkan。
//! 选择逻辑是纯函数：相同的覆盖值与宿主系统总是得到相同的后端。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 图形后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsBackend {
    /// Direct3D 11（仅 Windows）
    Direct3D11,
    /// OpenGL（借用宿主已有的 GL 上下文）
    OpenGL,
    /// Vulkan
    Vulkan,
}

/// 回退序列，按优先级降序
pub const FALLBACK_ORDER: [GraphicsBackend; 3] = [
    GraphicsBackend::Direct3D11,
    GraphicsBackend::OpenGL,
    GraphicsBackend::Vulkan,
];

/// 宿主操作系统
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl HostOs {
    /// 当前编译目标的操作系统
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            HostOs::Windows
        } else if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else if cfg!(target_os = "linux") {
            HostOs::Linux
        } else {
            HostOs::Other
        }
    }
}

impl GraphicsBackend {
    /// 解析 `FNA3D_FORCE_DRIVER` 的取值
    ///
    /// 只精确匹配 `D3D11`、`OpenGL`、`Vulkan`，其余取值视为未覆盖。
    pub fn from_override_token(token: &str) -> Option<Self> {
        match token {
            "D3D11" => Some(GraphicsBackend::Direct3D11),
            "OpenGL" => Some(GraphicsBackend::OpenGL),
            "Vulkan" => Some(GraphicsBackend::Vulkan),
            _ => None,
        }
    }

    /// 获取后端名称
    pub fn name(&self) -> &'static str {
        match self {
            GraphicsBackend::Direct3D11 => "Direct3D11",
            GraphicsBackend::OpenGL => "OpenGL",
            GraphicsBackend::Vulkan => "Vulkan",
        }
    }
}

impl fmt::Display for GraphicsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 决定目标后端
///
/// 有覆盖值时直接采用；否则 Windows 优先 Direct3D11，其他平台优先 OpenGL。
/// Vulkan 只能通过覆盖值或设备编排器的回退序列到达。
pub fn resolve_backend(override_backend: Option<GraphicsBackend>, host_os: HostOs) -> GraphicsBackend {
    if let Some(backend) = override_backend {
        return backend;
    }

    match host_os {
        HostOs::Windows => GraphicsBackend::Direct3D11,
        _ => GraphicsBackend::OpenGL,
    }
}
