//! 设备创建选项与交换链描述

use serde::{Deserialize, Serialize};

use super::swapchain::SwapchainSource;

/// 交换链深度/模板格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    #[serde(rename = "d24_unorm_s8_uint")]
    D24UNormS8UInt,
    #[serde(rename = "d32_float")]
    D32Float,
    #[serde(rename = "d32_float_s8_uint")]
    D32FloatS8UInt,
    #[serde(rename = "r16_unorm")]
    R16UNorm,
}

impl PixelFormat {
    /// 是否带模板分量
    pub fn has_stencil(&self) -> bool {
        matches!(self, PixelFormat::D24UNormS8UInt | PixelFormat::D32FloatS8UInt)
    }
}

/// 设备创建选项
///
/// 按值传入设备创建，创建后不再修改。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphicsDeviceOptions {
    /// 优先使用标准裁剪空间 Y 方向（Y 轴向上）
    pub prefer_standard_clip_space_y_direction: bool,
    /// 优先使用 [0, 1] 深度范围
    pub prefer_depth_range_zero_to_one: bool,
    /// 交换链深度/模板格式，`None` 表示不创建深度缓冲
    pub swapchain_depth_format: Option<PixelFormat>,
    /// 垂直同步
    pub sync_to_vertical_blank: bool,
    /// sRGB 交换链格式
    pub swapchain_srgb_format: bool,
}

/// 设备实际采用的坐标约定
///
/// 由设备创建过程决定，而不是由选项直接推出：
/// 偏好只有在后端支持对应功能时才会生效。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateConventions {
    /// 裁剪空间 Y 轴是否向下
    pub clip_space_y_inverted: bool,
    /// 深度范围是否为 [0, 1]
    pub depth_range_zero_to_one: bool,
}

/// 交换链描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainDescription {
    pub source: SwapchainSource,
    pub width: u32,
    pub height: u32,
    pub depth_format: Option<PixelFormat>,
    pub sync_to_vertical_blank: bool,
    pub srgb: bool,
}

impl SwapchainDescription {
    /// 由交换链来源、宿主客户区尺寸和设备选项构建
    pub fn new(source: SwapchainSource, (width, height): (u32, u32), options: &GraphicsDeviceOptions) -> Self {
        Self {
            source,
            width,
            height,
            depth_format: options.swapchain_depth_format,
            sync_to_vertical_blank: options.sync_to_vertical_blank,
            srgb: options.swapchain_srgb_format,
        }
    }
}
