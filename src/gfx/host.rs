//! 宿主窗口抽象
//!
//! 引导层从不创建或拥有窗口，只消费宿主提供的句柄。

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use super::opengl::OpenGlPlatformInfo;

/// 宿主窗口
///
/// 宿主（游戏或探测程序）实现此 trait，把已有窗口交给设备编排器。
pub trait HostWindow: HasWindowHandle + HasDisplayHandle {
    /// 客户区尺寸（像素）
    fn client_size(&self) -> (u32, u32);

    /// 宿主当前的 OpenGL 上下文
    ///
    /// OpenGL 后端只包装宿主已有的上下文，没有上下文时返回 `None`，
    /// OpenGL 设备创建会以"驱动不可用"失败。
    fn opengl_platform(&self) -> Option<OpenGlPlatformInfo> {
        None
    }
}

impl HostWindow for winit::window::Window {
    fn client_size(&self) -> (u32, u32) {
        let size = self.inner_size();
        (size.width, size.height)
    }
}
