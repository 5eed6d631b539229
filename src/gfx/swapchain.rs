//! 交换链来源提取
//!
//! 把宿主窗口的原生句柄转换为后端创建交换链所需的描述。
//! 支持四种窗口子系统：Win32、X11（Xlib）、Wayland、Cocoa。
//! 其他子系统意味着整个平台不受支持，与"驱动不可用"是不同的错误。

use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use super::host::HostWindow;
use crate::core::error::SwapchainSourceError;

/// 交换链来源
///
/// 句柄以指针宽度的整数保存，本类型不拥有任何句柄。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainSource {
    /// Win32：窗口句柄 + 模块实例句柄
    Win32 { hwnd: isize, hinstance: isize },
    /// X11：Display 指针 + Window XID
    Xlib { display: usize, window: u64 },
    /// Wayland：wl_display + wl_surface
    Wayland { display: usize, surface: usize },
    /// Cocoa：NSView
    Cocoa { ns_view: usize },
}

impl SwapchainSource {
    /// 从宿主窗口提取
    pub fn from_host(host: &dyn HostWindow) -> Result<Self, SwapchainSourceError> {
        let window = host
            .window_handle()
            .map_err(|e| SwapchainSourceError::HandleUnavailable(e.to_string()))?;
        let display = host
            .display_handle()
            .map_err(|e| SwapchainSourceError::HandleUnavailable(e.to_string()))?;

        Self::from_raw(window.as_raw(), display.as_raw())
    }

    /// 从原始句柄提取
    pub fn from_raw(
        window: RawWindowHandle,
        display: RawDisplayHandle,
    ) -> Result<Self, SwapchainSourceError> {
        match window {
            RawWindowHandle::Win32(handle) => Ok(SwapchainSource::Win32 {
                hwnd: handle.hwnd.get(),
                hinstance: handle.hinstance.map(|h| h.get()).unwrap_or(0),
            }),
            RawWindowHandle::Xlib(handle) => {
                let display = match display {
                    RawDisplayHandle::Xlib(d) => d.display.map(|p| p.as_ptr() as usize),
                    _ => None,
                }
                .ok_or_else(|| {
                    SwapchainSourceError::HandleUnavailable("X11 window without an Xlib display".to_string())
                })?;

                Ok(SwapchainSource::Xlib {
                    display,
                    window: handle.window as u64,
                })
            }
            RawWindowHandle::Wayland(handle) => match display {
                RawDisplayHandle::Wayland(d) => Ok(SwapchainSource::Wayland {
                    display: d.display.as_ptr() as usize,
                    surface: handle.surface.as_ptr() as usize,
                }),
                _ => Err(SwapchainSourceError::HandleUnavailable(
                    "Wayland surface without a Wayland display".to_string(),
                )),
            },
            RawWindowHandle::AppKit(handle) => Ok(SwapchainSource::Cocoa {
                ns_view: handle.ns_view.as_ptr() as usize,
            }),
            other => Err(SwapchainSourceError::UnsupportedSubsystem(
                subsystem_name(&other).to_string(),
            )),
        }
    }

    /// 窗口子系统名称
    pub fn subsystem(&self) -> &'static str {
        match self {
            SwapchainSource::Win32 { .. } => "Win32",
            SwapchainSource::Xlib { .. } => "Xlib",
            SwapchainSource::Wayland { .. } => "Wayland",
            SwapchainSource::Cocoa { .. } => "Cocoa",
        }
    }
}

fn subsystem_name(handle: &RawWindowHandle) -> &'static str {
    match handle {
        RawWindowHandle::UiKit(_) => "UiKit",
        RawWindowHandle::AppKit(_) => "AppKit",
        RawWindowHandle::Orbital(_) => "Orbital",
        RawWindowHandle::Xlib(_) => "Xlib",
        RawWindowHandle::Xcb(_) => "Xcb",
        RawWindowHandle::Wayland(_) => "Wayland",
        RawWindowHandle::Drm(_) => "Drm",
        RawWindowHandle::Gbm(_) => "Gbm",
        RawWindowHandle::Win32(_) => "Win32",
        RawWindowHandle::WinRt(_) => "WinRt",
        RawWindowHandle::Web(_) => "Web",
        RawWindowHandle::WebCanvas(_) => "WebCanvas",
        RawWindowHandle::WebOffscreenCanvas(_) => "WebOffscreenCanvas",
        RawWindowHandle::AndroidNdk(_) => "AndroidNdk",
        RawWindowHandle::Haiku(_) => "Haiku",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raw_window_handle::{
        AppKitWindowHandle, DrmDisplayHandle, DrmWindowHandle, WaylandDisplayHandle,
        WaylandWindowHandle, Win32WindowHandle, WindowsDisplayHandle, XcbDisplayHandle,
        XcbWindowHandle, XlibDisplayHandle, XlibWindowHandle,
    };
    use std::num::{NonZeroIsize, NonZeroU32};
    use std::ptr::NonNull;

    fn non_null(addr: usize) -> NonNull<std::ffi::c_void> {
        NonNull::new(addr as *mut std::ffi::c_void).unwrap()
    }

    #[test]
    fn test_win32_source() {
        let mut handle = Win32WindowHandle::new(NonZeroIsize::new(0x1234).unwrap());
        handle.hinstance = NonZeroIsize::new(0x40_0000);

        let source = SwapchainSource::from_raw(
            RawWindowHandle::Win32(handle),
            RawDisplayHandle::Windows(WindowsDisplayHandle::new()),
        )
        .unwrap();

        assert_eq!(source, SwapchainSource::Win32 { hwnd: 0x1234, hinstance: 0x40_0000 });
        assert_eq!(source.subsystem(), "Win32");
    }

    #[test]
    fn test_xlib_source() {
        let source = SwapchainSource::from_raw(
            RawWindowHandle::Xlib(XlibWindowHandle::new(77)),
            RawDisplayHandle::Xlib(XlibDisplayHandle::new(Some(non_null(0x5000)), 0)),
        )
        .unwrap();

        assert_eq!(source, SwapchainSource::Xlib { display: 0x5000, window: 77 });
    }

    #[test]
    fn test_xlib_without_display_is_unavailable() {
        let err = SwapchainSource::from_raw(
            RawWindowHandle::Xlib(XlibWindowHandle::new(77)),
            RawDisplayHandle::Xlib(XlibDisplayHandle::new(None, 0)),
        )
        .unwrap_err();

        assert!(matches!(err, SwapchainSourceError::HandleUnavailable(_)));
    }

    #[test]
    fn test_wayland_source() {
        let source = SwapchainSource::from_raw(
            RawWindowHandle::Wayland(WaylandWindowHandle::new(non_null(0x2000))),
            RawDisplayHandle::Wayland(WaylandDisplayHandle::new(non_null(0x3000))),
        )
        .unwrap();

        assert_eq!(source, SwapchainSource::Wayland { display: 0x3000, surface: 0x2000 });
    }

    #[test]
    fn test_cocoa_source() {
        let source = SwapchainSource::from_raw(
            RawWindowHandle::AppKit(AppKitWindowHandle::new(non_null(0x9000))),
            RawDisplayHandle::AppKit(raw_window_handle::AppKitDisplayHandle::new()),
        )
        .unwrap();

        assert_eq!(source, SwapchainSource::Cocoa { ns_view: 0x9000 });
    }

    #[test]
    fn test_unrecognized_subsystem_is_platform_error() {
        let err = SwapchainSource::from_raw(
            RawWindowHandle::Xcb(XcbWindowHandle::new(NonZeroU32::new(5).unwrap())),
            RawDisplayHandle::Xcb(XcbDisplayHandle::new(None, 0)),
        )
        .unwrap_err();
        assert_eq!(err, SwapchainSourceError::UnsupportedSubsystem("Xcb".to_string()));

        let err = SwapchainSource::from_raw(
            RawWindowHandle::Drm(DrmWindowHandle::new(1)),
            RawDisplayHandle::Drm(DrmDisplayHandle::new(3)),
        )
        .unwrap_err();
        assert_eq!(err, SwapchainSourceError::UnsupportedSubsystem("Drm".to_string()));
    }
}
