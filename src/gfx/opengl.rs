//! OpenGL 后端
//!
//! OpenGL 设备不创建上下文，而是包装宿主当前的 GL 上下文。
//! 宿主通过 `OpenGlPlatformInfo` 提供上下文句柄以及一组回调
//! （函数地址查询、切换当前上下文、交换缓冲、设置交换间隔等）。

use std::ffi::{c_char, c_void, CStr};
use tracing::{debug, info, warn};

use super::options::{CoordinateConventions, GraphicsDeviceOptions};
use crate::core::error::BackendError;
use crate::shader::ShaderArtifact;

const GL_VENDOR: u32 = 0x1F00;
const GL_RENDERER: u32 = 0x1F01;
const GL_VERSION: u32 = 0x1F02;
const GL_LOWER_LEFT: u32 = 0x8CA1;
const GL_ZERO_TO_ONE: u32 = 0x935F;
const GL_FRAGMENT_SHADER: u32 = 0x8B30;
const GL_VERTEX_SHADER: u32 = 0x8B31;
const GL_COMPILE_STATUS: u32 = 0x8B81;
const GL_INFO_LOG_LENGTH: u32 = 0x8B84;

type GlGetString = unsafe extern "system" fn(name: u32) -> *const u8;
type GlClipControl = unsafe extern "system" fn(origin: u32, depth: u32);
type GlCreateShader = unsafe extern "system" fn(kind: u32) -> u32;
type GlShaderSource =
    unsafe extern "system" fn(shader: u32, count: i32, strings: *const *const c_char, lengths: *const i32);
type GlCompileShader = unsafe extern "system" fn(shader: u32);
type GlGetShaderiv = unsafe extern "system" fn(shader: u32, pname: u32, params: *mut i32);
type GlGetShaderInfoLog =
    unsafe extern "system" fn(shader: u32, max_length: i32, length: *mut i32, info_log: *mut c_char);
type GlDeleteShader = unsafe extern "system" fn(shader: u32);

/// 宿主提供的 OpenGL 平台信息
pub struct OpenGlPlatformInfo {
    /// 宿主 GL 上下文句柄
    pub context: usize,
    /// 按名称查询 GL 函数地址
    pub get_proc_address: Box<dyn Fn(&str) -> *const c_void>,
    /// 把指定上下文设为当前
    pub make_current: Box<dyn Fn(usize)>,
    /// 查询当前上下文
    pub get_current_context: Box<dyn Fn() -> usize>,
    /// 清除当前上下文
    pub clear_current_context: Box<dyn Fn()>,
    /// 销毁上下文
    pub delete_context: Box<dyn Fn(usize)>,
    /// 交换前后缓冲
    pub swap_buffers: Box<dyn Fn()>,
    /// 设置垂直同步
    pub set_sync_to_vertical_blank: Box<dyn Fn(bool)>,
}

/// OpenGL 设备
pub struct OpenGlDevice {
    platform: OpenGlPlatformInfo,
    version: String,
    renderer: String,
    vendor: String,
    conventions: CoordinateConventions,
    width: u32,
    height: u32,
}

impl OpenGlDevice {
    /// 包装宿主的 GL 上下文
    ///
    /// # 参数
    ///
    /// * `platform` - 宿主 GL 平台信息，设备销毁时调用其 `delete_context`
    /// * `size` - 宿主窗口客户区尺寸
    /// * `options` - 设备创建选项
    pub fn new(
        platform: OpenGlPlatformInfo,
        (width, height): (u32, u32),
        options: &GraphicsDeviceOptions,
    ) -> Result<Self, BackendError> {
        if platform.context == 0 {
            return Err(BackendError::DriverUnavailable(
                "Host has no current OpenGL context".to_string(),
            ));
        }

        if (platform.get_current_context)() != platform.context {
            (platform.make_current)(platform.context);
        }

        // SAFETY: 宿主保证返回的地址是当前上下文中同名函数的入口
        let get_string: GlGetString = unsafe { load_function(&platform, "glGetString") }.ok_or_else(|| {
            BackendError::DriverUnavailable("glGetString could not be resolved".to_string())
        })?;

        let version = query_string(get_string, GL_VERSION)
            .ok_or_else(|| BackendError::Native("glGetString(GL_VERSION) returned null".to_string()))?;
        let renderer = query_string(get_string, GL_RENDERER).unwrap_or_default();
        let vendor = query_string(get_string, GL_VENDOR).unwrap_or_default();

        (platform.set_sync_to_vertical_blank)(options.sync_to_vertical_blank);

        let depth_range_zero_to_one = options.prefer_depth_range_zero_to_one && apply_clip_control(&platform);
        let conventions = CoordinateConventions {
            clip_space_y_inverted: false,
            depth_range_zero_to_one,
        };

        info!(
            version = %version,
            renderer = %renderer,
            vendor = %vendor,
            depth_range_zero_to_one,
            "OpenGL device created"
        );

        Ok(Self {
            platform,
            version,
            renderer,
            vendor,
            conventions,
            width,
            height,
        })
    }

    /// 实际采用的坐标约定
    pub fn conventions(&self) -> CoordinateConventions {
        self.conventions
    }

    /// 在宿主上下文中编译一对 GLSL 着色器
    pub fn create_shaders(&self, vertex: &ShaderArtifact, fragment: &ShaderArtifact) -> Result<GlShaders, BackendError> {
        let functions = GlShaderFunctions::load(&self.platform)?;
        let vertex = functions.compile(GL_VERTEX_SHADER, glsl_source(vertex)?)?;
        let fragment = match functions.compile(GL_FRAGMENT_SHADER, glsl_source(fragment)?) {
            Ok(shader) => shader,
            Err(e) => {
                unsafe { (functions.delete_shader)(vertex) };
                return Err(e);
            }
        };
        debug!(vertex, fragment, "OpenGL shaders compiled");

        Ok(GlShaders {
            vertex,
            fragment,
            delete_shader: functions.delete_shader,
        })
    }

    /// GL_VERSION 字符串
    pub fn version(&self) -> &str {
        &self.version
    }

    /// GL_RENDERER 字符串
    pub fn renderer(&self) -> &str {
        &self.renderer
    }

    /// GL_VENDOR 字符串
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn swapchain_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 呈现一帧
    pub fn swap_buffers(&self) {
        (self.platform.swap_buffers)();
    }

    /// 调整垂直同步
    pub fn set_sync_to_vertical_blank(&self, enabled: bool) {
        (self.platform.set_sync_to_vertical_blank)(enabled);
    }
}

impl Drop for OpenGlDevice {
    fn drop(&mut self) {
        debug!("Releasing OpenGL context");
        (self.platform.clear_current_context)();
        (self.platform.delete_context)(self.platform.context);
    }
}

/// 按名称解析 GL 函数，地址为空时返回 `None`
///
/// # Safety
///
/// `F` 必须是该函数的正确签名。
unsafe fn load_function<F: Copy>(platform: &OpenGlPlatformInfo, name: &str) -> Option<F> {
    let address = (platform.get_proc_address)(name);
    if address.is_null() {
        return None;
    }
    Some(std::mem::transmute_copy::<*const c_void, F>(&address))
}

/// 把深度范围切换到 [0, 1]，驱动不提供 glClipControl 时返回 `false`
fn apply_clip_control(platform: &OpenGlPlatformInfo) -> bool {
    // SAFETY: glClipControl(GLenum, GLenum)
    match unsafe { load_function::<GlClipControl>(platform, "glClipControl") } {
        Some(clip_control) => {
            unsafe { clip_control(GL_LOWER_LEFT, GL_ZERO_TO_ONE) };
            true
        }
        None => {
            warn!("glClipControl unavailable, keeping [-1, 1] depth range");
            false
        }
    }
}

fn glsl_source(artifact: &ShaderArtifact) -> Result<&str, BackendError> {
    artifact.text().ok_or_else(|| {
        BackendError::Native(format!("OpenGL needs GLSL source for the {} stage", artifact.stage.name()))
    })
}

struct GlShaderFunctions {
    create_shader: GlCreateShader,
    shader_source: GlShaderSource,
    compile_shader: GlCompileShader,
    get_shader_iv: GlGetShaderiv,
    get_shader_info_log: GlGetShaderInfoLog,
    delete_shader: GlDeleteShader,
}

impl GlShaderFunctions {
    fn load(platform: &OpenGlPlatformInfo) -> Result<Self, BackendError> {
        fn missing(name: &str) -> BackendError {
            BackendError::Native(format!("{} could not be resolved", name))
        }
        // SAFETY: 签名与 GL 2.0 规范一致
        unsafe {
            Ok(Self {
                create_shader: load_function(platform, "glCreateShader").ok_or_else(|| missing("glCreateShader"))?,
                shader_source: load_function(platform, "glShaderSource").ok_or_else(|| missing("glShaderSource"))?,
                compile_shader: load_function(platform, "glCompileShader").ok_or_else(|| missing("glCompileShader"))?,
                get_shader_iv: load_function(platform, "glGetShaderiv").ok_or_else(|| missing("glGetShaderiv"))?,
                get_shader_info_log: load_function(platform, "glGetShaderInfoLog")
                    .ok_or_else(|| missing("glGetShaderInfoLog"))?,
                delete_shader: load_function(platform, "glDeleteShader").ok_or_else(|| missing("glDeleteShader"))?,
            })
        }
    }

    fn compile(&self, kind: u32, source: &str) -> Result<u32, BackendError> {
        let length = i32::try_from(source.len())
            .map_err(|_| BackendError::Native("Shader source is too large".to_string()))?;

        unsafe {
            let shader = (self.create_shader)(kind);
            if shader == 0 {
                return Err(BackendError::Native("glCreateShader returned 0".to_string()));
            }

            let strings = [source.as_ptr() as *const c_char];
            (self.shader_source)(shader, 1, strings.as_ptr(), &length);
            (self.compile_shader)(shader);

            let mut status = 0;
            (self.get_shader_iv)(shader, GL_COMPILE_STATUS, &mut status);
            if status != 0 {
                return Ok(shader);
            }

            let message = self.info_log(shader);
            (self.delete_shader)(shader);
            Err(BackendError::Native(format!("GLSL compilation failed: {}", message)))
        }
    }

    unsafe fn info_log(&self, shader: u32) -> String {
        let mut capacity = 0;
        (self.get_shader_iv)(shader, GL_INFO_LOG_LENGTH, &mut capacity);
        let mut buffer = vec![0u8; capacity.max(1) as usize];
        let mut written = 0;
        (self.get_shader_info_log)(shader, buffer.len() as i32, &mut written, buffer.as_mut_ptr().cast());
        buffer.truncate(written.clamp(0, buffer.len() as i32) as usize);
        String::from_utf8_lossy(&buffer).trim_end().to_string()
    }
}

/// 宿主上下文中的一对着色器对象
///
/// 必须在 `OpenGlDevice` 之前释放。
pub struct GlShaders {
    vertex: u32,
    fragment: u32,
    delete_shader: GlDeleteShader,
}

impl GlShaders {
    /// (顶点, 片段) 着色器对象名
    pub fn names(&self) -> (u32, u32) {
        (self.vertex, self.fragment)
    }
}

impl Drop for GlShaders {
    fn drop(&mut self) {
        unsafe {
            (self.delete_shader)(self.vertex);
            (self.delete_shader)(self.fragment);
        }
    }
}

fn query_string(get_string: GlGetString, name: u32) -> Option<String> {
    // SAFETY: 上下文已是当前上下文，返回值为 NUL 结尾的静态字符串或空指针
    let ptr = unsafe { get_string(name) };
    if ptr.is_null() {
        return None;
    }
    let value = unsafe { CStr::from_ptr(ptr.cast()) };
    Some(value.to_string_lossy().into_owned())
}
