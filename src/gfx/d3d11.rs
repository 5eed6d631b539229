//! Direct3D 11 后端
//!
//! 仅在 Windows 上可用，其他平台创建时返回"驱动不可用"。

use super::options::{CoordinateConventions, GraphicsDeviceOptions, SwapchainDescription};
use crate::core::error::BackendError;
use crate::shader::ShaderArtifact;

#[cfg(target_os = "windows")]
pub use imp::{D3D11Device, D3D11Shaders};

#[cfg(not(target_os = "windows"))]
pub use unsupported::{D3D11Device, D3D11Shaders};

#[cfg(target_os = "windows")]
mod imp {
    use std::ffi::CString;

    use tracing::{debug, info};
    use windows::core::PCSTR;
    use windows::Win32::Foundation::{HMODULE, HWND};
    use windows::Win32::Graphics::Direct3D::Fxc::D3DCompile;
    use windows::Win32::Graphics::Direct3D::{
        ID3DBlob, D3D_DRIVER_TYPE_HARDWARE, D3D_FEATURE_LEVEL, D3D_FEATURE_LEVEL_10_0, D3D_FEATURE_LEVEL_10_1,
        D3D_FEATURE_LEVEL_11_0,
    };
    use windows::Win32::Graphics::Direct3D11::{
        D3D11CreateDeviceAndSwapChain, ID3D11DepthStencilView, ID3D11Device, ID3D11DeviceContext,
        ID3D11PixelShader, ID3D11Texture2D, ID3D11VertexShader, D3D11_BIND_DEPTH_STENCIL,
        D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_CREATE_DEVICE_DEBUG, D3D11_SDK_VERSION, D3D11_TEXTURE2D_DESC,
        D3D11_USAGE_DEFAULT,
    };
    use windows::Win32::Graphics::Dxgi::Common::{
        DXGI_FORMAT, DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_FORMAT_B8G8R8A8_UNORM_SRGB, DXGI_FORMAT_D16_UNORM,
        DXGI_FORMAT_D24_UNORM_S8_UINT, DXGI_FORMAT_D32_FLOAT, DXGI_FORMAT_D32_FLOAT_S8X24_UINT, DXGI_MODE_DESC,
        DXGI_SAMPLE_DESC,
    };
    use windows::Win32::Graphics::Dxgi::{
        IDXGISwapChain, DXGI_SWAP_CHAIN_DESC, DXGI_SWAP_EFFECT_DISCARD, DXGI_USAGE_RENDER_TARGET_OUTPUT,
    };

    use super::*;
    use crate::gfx::options::PixelFormat;
    use crate::gfx::swapchain::SwapchainSource;

    /// Direct3D 的裁剪空间 Y 轴向上，深度范围固定为 [0, 1]
    const D3D11_CONVENTIONS: CoordinateConventions = CoordinateConventions {
        clip_space_y_inverted: false,
        depth_range_zero_to_one: true,
    };

    /// Direct3D 11 设备
    pub struct D3D11Device {
        pub device: ID3D11Device,
        pub context: ID3D11DeviceContext,
        pub swap_chain: IDXGISwapChain,
        pub feature_level: D3D_FEATURE_LEVEL,
        depth: Option<DepthStencil>,
        sync_interval: u32,
        width: u32,
        height: u32,
    }

    impl D3D11Device {
        /// 创建设备与交换链
        pub fn new(desc: &SwapchainDescription, _options: &GraphicsDeviceOptions) -> Result<Self, BackendError> {
            let hwnd = match desc.source {
                SwapchainSource::Win32 { hwnd, .. } => HWND(hwnd as *mut core::ffi::c_void),
                other => {
                    return Err(BackendError::DriverUnavailable(format!(
                        "Direct3D11 requires a Win32 window, got {}",
                        other.subsystem()
                    )))
                }
            };

            let format: DXGI_FORMAT = if desc.srgb {
                DXGI_FORMAT_B8G8R8A8_UNORM_SRGB
            } else {
                DXGI_FORMAT_B8G8R8A8_UNORM
            };

            let swap_chain_desc = DXGI_SWAP_CHAIN_DESC {
                BufferDesc: DXGI_MODE_DESC {
                    Width: desc.width,
                    Height: desc.height,
                    Format: format,
                    ..Default::default()
                },
                SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
                BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
                BufferCount: 2,
                OutputWindow: hwnd,
                Windowed: true.into(),
                SwapEffect: DXGI_SWAP_EFFECT_DISCARD,
                Flags: 0,
            };

            let mut flags = D3D11_CREATE_DEVICE_BGRA_SUPPORT;
            if cfg!(debug_assertions) {
                flags |= D3D11_CREATE_DEVICE_DEBUG;
            }
            let feature_levels = [D3D_FEATURE_LEVEL_11_0, D3D_FEATURE_LEVEL_10_1, D3D_FEATURE_LEVEL_10_0];

            let mut swap_chain: Option<IDXGISwapChain> = None;
            let mut device: Option<ID3D11Device> = None;
            let mut context: Option<ID3D11DeviceContext> = None;
            let mut feature_level = D3D_FEATURE_LEVEL::default();

            let mut create = |flags| unsafe {
                D3D11CreateDeviceAndSwapChain(
                    None,
                    D3D_DRIVER_TYPE_HARDWARE,
                    HMODULE::default(),
                    flags,
                    Some(&feature_levels),
                    D3D11_SDK_VERSION,
                    Some(&swap_chain_desc as *const _),
                    Some(&mut swap_chain as *mut _),
                    Some(&mut device as *mut _),
                    Some(&mut feature_level as *mut _),
                    Some(&mut context as *mut _),
                )
            };

            // 调试层未安装时去掉调试标志重试
            let result = match create(flags) {
                Err(_) if flags.contains(D3D11_CREATE_DEVICE_DEBUG) => create(D3D11_CREATE_DEVICE_BGRA_SUPPORT),
                other => other,
            };
            result.map_err(|e| BackendError::Native(format!("D3D11CreateDeviceAndSwapChain failed: {}", e)))?;

            let (Some(device), Some(context), Some(swap_chain)) = (device, context, swap_chain) else {
                return Err(BackendError::DriverUnavailable(
                    "D3D11CreateDeviceAndSwapChain returned no device".to_string(),
                ));
            };

            let depth = match desc.depth_format {
                Some(format) => Some(DepthStencil::new(&device, format, desc.width, desc.height)?),
                None => None,
            };

            info!(
                width = desc.width,
                height = desc.height,
                feature_level = feature_level.0,
                depth_format = ?desc.depth_format,
                "Direct3D11 device created"
            );

            Ok(Self {
                device,
                context,
                swap_chain,
                feature_level,
                depth,
                sync_interval: u32::from(desc.sync_to_vertical_blank),
                width: desc.width,
                height: desc.height,
            })
        }

        pub fn swapchain_size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        pub fn conventions(&self) -> CoordinateConventions {
            D3D11_CONVENTIONS
        }

        /// 深度/模板视图
        pub fn depth_stencil_view(&self) -> Option<&ID3D11DepthStencilView> {
            self.depth.as_ref().map(|d| &d.view)
        }

        /// 编译 HLSL 并创建顶点/像素着色器
        pub fn create_shaders(
            &self,
            vertex: &ShaderArtifact,
            fragment: &ShaderArtifact,
        ) -> Result<D3D11Shaders, BackendError> {
            let vs_blob = compile_hlsl(vertex, windows::core::s!("vs_5_0"))?;
            let ps_blob = compile_hlsl(fragment, windows::core::s!("ps_5_0"))?;

            let mut vertex_shader = None;
            let mut pixel_shader = None;
            unsafe {
                self.device
                    .CreateVertexShader(blob_bytes(&vs_blob), None, Some(&mut vertex_shader))
                    .map_err(|e| BackendError::Native(format!("CreateVertexShader failed: {}", e)))?;
                self.device
                    .CreatePixelShader(blob_bytes(&ps_blob), None, Some(&mut pixel_shader))
                    .map_err(|e| BackendError::Native(format!("CreatePixelShader failed: {}", e)))?;
            }

            let (Some(vertex), Some(pixel)) = (vertex_shader, pixel_shader) else {
                return Err(BackendError::Native("Direct3D11 returned no shader object".to_string()));
            };
            debug!("Direct3D11 shaders created");
            Ok(D3D11Shaders { vertex, pixel })
        }

        /// 呈现一帧
        pub fn present(&self) -> Result<(), BackendError> {
            unsafe { self.swap_chain.Present(self.sync_interval, Default::default()) }
                .ok()
                .map_err(|e| BackendError::Native(format!("IDXGISwapChain::Present failed: {}", e)))
        }
    }

    /// 交换链尺寸的深度/模板纹理及其视图
    struct DepthStencil {
        _texture: ID3D11Texture2D,
        view: ID3D11DepthStencilView,
    }

    impl DepthStencil {
        fn new(device: &ID3D11Device, format: PixelFormat, width: u32, height: u32) -> Result<Self, BackendError> {
            let desc = D3D11_TEXTURE2D_DESC {
                Width: width,
                Height: height,
                MipLevels: 1,
                ArraySize: 1,
                Format: to_dxgi_depth_format(format),
                SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
                Usage: D3D11_USAGE_DEFAULT,
                BindFlags: D3D11_BIND_DEPTH_STENCIL.0 as u32,
                CPUAccessFlags: 0,
                MiscFlags: 0,
            };

            let mut texture: Option<ID3D11Texture2D> = None;
            let mut view: Option<ID3D11DepthStencilView> = None;
            unsafe {
                device
                    .CreateTexture2D(&desc, None, Some(&mut texture))
                    .map_err(|e| BackendError::Native(format!("CreateTexture2D (depth) failed: {}", e)))?;
                let Some(texture) = texture else {
                    return Err(BackendError::Native("CreateTexture2D returned no texture".to_string()));
                };
                device
                    .CreateDepthStencilView(&texture, None, Some(&mut view))
                    .map_err(|e| BackendError::Native(format!("CreateDepthStencilView failed: {}", e)))?;
                let Some(view) = view else {
                    return Err(BackendError::Native("CreateDepthStencilView returned no view".to_string()));
                };
                Ok(Self { _texture: texture, view })
            }
        }
    }

    /// 一对 Direct3D 11 着色器对象
    pub struct D3D11Shaders {
        pub vertex: ID3D11VertexShader,
        pub pixel: ID3D11PixelShader,
    }

    fn to_dxgi_depth_format(format: PixelFormat) -> DXGI_FORMAT {
        match format {
            PixelFormat::D24UNormS8UInt => DXGI_FORMAT_D24_UNORM_S8_UINT,
            PixelFormat::D32Float => DXGI_FORMAT_D32_FLOAT,
            PixelFormat::D32FloatS8UInt => DXGI_FORMAT_D32_FLOAT_S8X24_UINT,
            PixelFormat::R16UNorm => DXGI_FORMAT_D16_UNORM,
        }
    }

    fn compile_hlsl(artifact: &ShaderArtifact, target: PCSTR) -> Result<ID3DBlob, BackendError> {
        let stage = artifact.stage.name();
        let source = artifact.text().ok_or_else(|| {
            BackendError::Native(format!("Direct3D11 needs HLSL source for the {} stage", stage))
        })?;
        let entry_point = CString::new(artifact.entry_point.as_str())
            .map_err(|_| BackendError::Native(format!("Invalid {} entry point name", stage)))?;

        let mut blob = None;
        let mut error_blob = None;
        let result = unsafe {
            D3DCompile(
                source.as_ptr() as _,
                source.len(),
                None,
                None,
                None,
                PCSTR(entry_point.as_ptr() as *const u8),
                target,
                0,
                0,
                &mut blob,
                Some(&mut error_blob),
            )
        };

        if let Err(e) = result {
            let message = match error_blob {
                Some(error) => String::from_utf8_lossy(unsafe { blob_bytes(&error) }).into_owned(),
                None => e.to_string(),
            };
            return Err(BackendError::Native(format!("D3DCompile failed for the {} stage: {}", stage, message)));
        }
        blob.ok_or_else(|| BackendError::Native(format!("D3DCompile returned no bytecode for the {} stage", stage)))
    }

    unsafe fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
        std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::gfx::GraphicsBackend;
        use crate::shader::{ShaderCompiler, ShaderDescription};

        #[test]
        fn test_depth_format_mapping() {
            assert_eq!(to_dxgi_depth_format(PixelFormat::D32FloatS8UInt), DXGI_FORMAT_D32_FLOAT_S8X24_UINT);
            assert_eq!(to_dxgi_depth_format(PixelFormat::R16UNorm), DXGI_FORMAT_D16_UNORM);
        }

        #[test]
        fn test_cross_compiled_hlsl_builds_with_fxc() {
            let (vs, fs) = ShaderDescription::builtin_pair();
            let compiled = ShaderCompiler::new()
                .compile_pair(GraphicsBackend::Direct3D11, &vs, &fs)
                .unwrap();

            let vs_blob = compile_hlsl(&compiled.vertex, windows::core::s!("vs_5_0")).unwrap();
            let ps_blob = compile_hlsl(&compiled.fragment, windows::core::s!("ps_5_0")).unwrap();
            assert!(unsafe { !blob_bytes(&vs_blob).is_empty() && !blob_bytes(&ps_blob).is_empty() });
        }
    }
}

#[cfg(not(target_os = "windows"))]
mod unsupported {
    use super::*;

    /// Direct3D 11 设备（当前平台不可构造）
    pub enum D3D11Device {}

    impl D3D11Device {
        pub fn new(_desc: &SwapchainDescription, _options: &GraphicsDeviceOptions) -> Result<Self, BackendError> {
            Err(BackendError::DriverUnavailable(
                "Direct3D11 is only available on Windows".to_string(),
            ))
        }

        pub fn swapchain_size(&self) -> (u32, u32) {
            match *self {}
        }

        pub fn present(&self) -> Result<(), BackendError> {
            match *self {}
        }

        pub fn conventions(&self) -> CoordinateConventions {
            match *self {}
        }

        pub fn create_shaders(
            &self,
            _vertex: &ShaderArtifact,
            _fragment: &ShaderArtifact,
        ) -> Result<D3D11Shaders, BackendError> {
            match *self {}
        }
    }

    /// Direct3D 11 着色器（当前平台不可构造）
    pub enum D3D11Shaders {}

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::gfx::swapchain::SwapchainSource;

        #[test]
        fn test_unavailable_off_windows() {
            let desc = SwapchainDescription::new(
                SwapchainSource::Xlib { display: 1, window: 2 },
                (640, 480),
                &GraphicsDeviceOptions::default(),
            );
            let err = D3D11Device::new(&desc, &GraphicsDeviceOptions::default()).err().unwrap();
            assert!(matches!(err, BackendError::DriverUnavailable(_)));
        }
    }
}
