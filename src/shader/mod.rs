//! 着色器编译管线
//!
//! 同一份 GLSL 源码在三个后端上通用：
//!
//! ```text
//! GLSL ──前端编译──> SPIR-V ──┬── Vulkan：直接使用
//!                             ├── Direct3D11：交叉编译为 HLSL（翻转顶点输出 Y）
//!                             └── OpenGL：交叉编译为 GLSL 330
//! ```
//!
//! 两个阶段都先完成前端编译，再进入交叉编译；前端失败时不会调用交叉编译器。
//! 前端与交叉编译器通过 trait 注入，生产实现基于 `naga`。

pub mod frontend;
pub mod cross;

use tracing::debug;

use crate::core::error::ShaderError;
use crate::gfx::GraphicsBackend;

pub use cross::NagaCrossCompiler;
pub use frontend::NagaFrontend;

/// 内置着色器源码
pub mod sources {
    pub const VERTEX: &str = include_str!("shaders/vertex.glsl");
    pub const FRAGMENT: &str = include_str!("shaders/fragment.glsl");
}

/// 着色器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn name(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }

    pub(crate) fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

/// 单个阶段的着色器输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDescription {
    pub stage: ShaderStage,
    /// UTF-8 编码的 GLSL 源码
    pub source: Vec<u8>,
    pub entry_point: String,
}

impl ShaderDescription {
    pub fn new(stage: ShaderStage, source: impl Into<Vec<u8>>, entry_point: &str) -> Self {
        Self {
            stage,
            source: source.into(),
            entry_point: entry_point.to_string(),
        }
    }

    /// 内置的顶点/片段着色器
    pub fn builtin_pair() -> (Self, Self) {
        (
            Self::new(ShaderStage::Vertex, sources::VERTEX, "main"),
            Self::new(ShaderStage::Fragment, sources::FRAGMENT, "main"),
        )
    }
}

/// 编译产物的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderCode {
    /// SPIR-V 二进制（小端字节序）
    SpirV(Vec<u8>),
    /// 目标后端的着色器语言源码
    Text(String),
}

impl ShaderCode {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ShaderCode::SpirV(bytes) => bytes,
            ShaderCode::Text(text) => text.as_bytes(),
        }
    }
}

/// 编译产物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderArtifact {
    pub stage: ShaderStage,
    pub entry_point: String,
    pub code: ShaderCode,
}

impl ShaderArtifact {
    /// SPIR-V 字节，文本产物返回 `None`
    pub fn spirv(&self) -> Option<&[u8]> {
        match &self.code {
            ShaderCode::SpirV(bytes) => Some(bytes),
            ShaderCode::Text(_) => None,
        }
    }

    /// 源码文本，SPIR-V 产物返回 `None`
    pub fn text(&self) -> Option<&str> {
        match &self.code {
            ShaderCode::Text(text) => Some(text),
            ShaderCode::SpirV(_) => None,
        }
    }
}

/// 交叉编译的目标语言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossCompileTarget {
    /// HLSL（Direct3D11，shader model 5.0）
    Hlsl,
    /// GLSL 330 core（OpenGL）
    Glsl,
}

impl CrossCompileTarget {
    /// 后端需要的交叉编译目标，Vulkan 直接消费 SPIR-V 返回 `None`
    pub fn for_backend(backend: GraphicsBackend) -> Option<Self> {
        match backend {
            GraphicsBackend::Direct3D11 => Some(CrossCompileTarget::Hlsl),
            GraphicsBackend::OpenGL => Some(CrossCompileTarget::Glsl),
            GraphicsBackend::Vulkan => None,
        }
    }
}

/// 交叉编译选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossCompileOptions {
    pub target: CrossCompileTarget,
    /// 翻转顶点输出的 Y 轴（HLSL 的裁剪空间约定）
    pub invert_vertex_output_y: bool,
    /// 让两个阶段中绑定位置相同的资源使用同一个名字
    pub normalize_resource_names: bool,
}

impl CrossCompileOptions {
    pub fn for_backend(backend: GraphicsBackend) -> Option<Self> {
        CrossCompileTarget::for_backend(backend).map(|target| Self {
            target,
            invert_vertex_output_y: target == CrossCompileTarget::Hlsl,
            normalize_resource_names: true,
        })
    }
}

/// 按名称解析目标后端
///
/// 接受 `Direct3D11`/`D3D11`、`OpenGL`、`Vulkan`（不区分大小写）。
pub fn parse_target_backend(name: &str) -> Result<GraphicsBackend, ShaderError> {
    match name.to_ascii_lowercase().as_str() {
        "direct3d11" | "d3d11" => Ok(GraphicsBackend::Direct3D11),
        "opengl" | "gl" => Ok(GraphicsBackend::OpenGL),
        "vulkan" | "vk" => Ok(GraphicsBackend::Vulkan),
        _ => Err(ShaderError::UnsupportedBackend(name.to_string())),
    }
}

/// 着色器前端：GLSL → SPIR-V
pub trait ShaderFrontend {
    fn compile(&self, desc: &ShaderDescription) -> Result<Vec<u8>, ShaderError>;
}

/// 单个阶段的交叉编译结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossCompiledSource {
    pub source: String,
    /// 生成源码中的入口函数名（GLSL 总是 `main`）
    pub entry_point: String,
}

/// 交叉编译器：成对的 SPIR-V → 目标语言源码
///
/// 需要同时拿到两个阶段，才能统一跨阶段的资源命名。
pub trait CrossCompiler {
    fn cross_compile(
        &self,
        vertex: &[u8],
        fragment: &[u8],
        options: &CrossCompileOptions,
    ) -> Result<(CrossCompiledSource, CrossCompiledSource), ShaderError>;
}

/// 编译后的一对着色器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledShaders {
    pub vertex: ShaderArtifact,
    pub fragment: ShaderArtifact,
    /// 交叉编译时使用的选项；Vulkan 不做交叉编译，为 `None`
    pub cross_compile: Option<CrossCompileOptions>,
}

/// 着色器编译器
pub struct ShaderCompiler<F = NagaFrontend, C = NagaCrossCompiler> {
    frontend: F,
    cross_compiler: C,
}

impl ShaderCompiler {
    pub fn new() -> Self {
        Self::with_parts(NagaFrontend, NagaCrossCompiler)
    }
}

impl Default for ShaderCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ShaderFrontend, C: CrossCompiler> ShaderCompiler<F, C> {
    pub fn with_parts(frontend: F, cross_compiler: C) -> Self {
        Self { frontend, cross_compiler }
    }

    /// 为目标后端编译顶点/片段着色器
    pub fn compile_pair(
        &self,
        backend: GraphicsBackend,
        vertex: &ShaderDescription,
        fragment: &ShaderDescription,
    ) -> Result<CompiledShaders, ShaderError> {
        let vertex_spirv = self.frontend.compile(vertex)?;
        let fragment_spirv = self.frontend.compile(fragment)?;
        debug!(
            vertex_bytes = vertex_spirv.len(),
            fragment_bytes = fragment_spirv.len(),
            "Compiled shaders to SPIR-V"
        );

        let Some(options) = CrossCompileOptions::for_backend(backend) else {
            return Ok(CompiledShaders {
                vertex: artifact(vertex, ShaderCode::SpirV(vertex_spirv)),
                fragment: artifact(fragment, ShaderCode::SpirV(fragment_spirv)),
                cross_compile: None,
            });
        };

        let (vertex_out, fragment_out) =
            self.cross_compiler.cross_compile(&vertex_spirv, &fragment_spirv, &options)?;
        debug!(backend = %backend, target = ?options.target, "Cross-compiled shaders");

        Ok(CompiledShaders {
            vertex: translated(vertex, vertex_out),
            fragment: translated(fragment, fragment_out),
            cross_compile: Some(options),
        })
    }
}

fn artifact(desc: &ShaderDescription, code: ShaderCode) -> ShaderArtifact {
    ShaderArtifact {
        stage: desc.stage,
        entry_point: desc.entry_point.clone(),
        code,
    }
}

fn translated(desc: &ShaderDescription, out: CrossCompiledSource) -> ShaderArtifact {
    ShaderArtifact {
        stage: desc.stage,
        entry_point: out.entry_point,
        code: ShaderCode::Text(out.source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// 记录调用的交叉编译器
    #[derive(Default)]
    struct RecordingCrossCompiler {
        calls: Cell<usize>,
        options: RefCell<Vec<CrossCompileOptions>>,
    }

    impl CrossCompiler for RecordingCrossCompiler {
        fn cross_compile(
            &self,
            vertex: &[u8],
            fragment: &[u8],
            options: &CrossCompileOptions,
        ) -> Result<(CrossCompiledSource, CrossCompiledSource), ShaderError> {
            self.calls.set(self.calls.get() + 1);
            self.options.borrow_mut().push(*options);
            NagaCrossCompiler.cross_compile(vertex, fragment, options)
        }
    }

    fn recording_compiler() -> ShaderCompiler<NagaFrontend, RecordingCrossCompiler> {
        ShaderCompiler::with_parts(NagaFrontend, RecordingCrossCompiler::default())
    }

    fn spirv_magic(bytes: &[u8]) -> u32 {
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[test]
    fn test_vulkan_returns_spirv_without_cross_compiling() {
        let compiler = recording_compiler();
        let (vs, fs) = ShaderDescription::builtin_pair();

        let shaders = compiler.compile_pair(GraphicsBackend::Vulkan, &vs, &fs).unwrap();

        assert_eq!(compiler.cross_compiler.calls.get(), 0);
        assert!(shaders.cross_compile.is_none());
        for artifact in [&shaders.vertex, &shaders.fragment] {
            let ShaderCode::SpirV(bytes) = &artifact.code else {
                panic!("expected SPIR-V for {:?}", artifact.stage);
            };
            assert_eq!(bytes.len() % 4, 0);
            assert_eq!(spirv_magic(bytes), 0x0723_0203);
            assert_eq!(artifact.entry_point, "main");
        }

        // Vulkan 的产物就是前端的原始输出
        assert_eq!(shaders.vertex.code, ShaderCode::SpirV(NagaFrontend.compile(&vs).unwrap()));
    }

    #[test]
    fn test_d3d11_produces_hlsl_with_y_flip() {
        let compiler = recording_compiler();
        let (vs, fs) = ShaderDescription::builtin_pair();

        let shaders = compiler.compile_pair(GraphicsBackend::Direct3D11, &vs, &fs).unwrap();

        assert_eq!(compiler.cross_compiler.calls.get(), 1);
        let options = compiler.cross_compiler.options.borrow()[0];
        assert_eq!(options.target, CrossCompileTarget::Hlsl);
        assert!(options.invert_vertex_output_y);
        assert!(options.normalize_resource_names);
        assert_eq!(shaders.cross_compile, Some(options));

        let ShaderCode::Text(vertex) = &shaders.vertex.code else { panic!("expected HLSL text") };
        assert!(vertex.contains("SV_Position"));
        assert!(matches!(shaders.fragment.code, ShaderCode::Text(_)));
    }

    #[test]
    fn test_opengl_produces_glsl_without_y_flip() {
        let compiler = recording_compiler();
        let (vs, fs) = ShaderDescription::builtin_pair();

        let shaders = compiler.compile_pair(GraphicsBackend::OpenGL, &vs, &fs).unwrap();

        let options = compiler.cross_compiler.options.borrow()[0];
        assert_eq!(options.target, CrossCompileTarget::Glsl);
        assert!(!options.invert_vertex_output_y);

        let ShaderCode::Text(vertex) = &shaders.vertex.code else { panic!("expected GLSL text") };
        let ShaderCode::Text(fragment) = &shaders.fragment.code else { panic!("expected GLSL text") };
        assert!(vertex.starts_with("#version 330 core"));
        assert!(fragment.starts_with("#version 330 core"));
        assert!(vertex.contains("gl_Position"));
        assert_eq!(shaders.vertex.entry_point, "main");
        assert_eq!(shaders.fragment.text(), Some(fragment.as_str()));
        assert!(shaders.vertex.spirv().is_none());
    }

    #[test]
    fn test_malformed_source_fails_before_cross_compiling() {
        let compiler = recording_compiler();
        let (vs, _) = ShaderDescription::builtin_pair();
        let broken = ShaderDescription::new(
            ShaderStage::Fragment,
            "#version 450\nvoid main() { fsout_Color = ; }",
            "main",
        );

        let err = compiler.compile_pair(GraphicsBackend::Direct3D11, &vs, &broken).unwrap_err();

        assert!(matches!(err, ShaderError::Compilation { ref stage, .. } if stage == "fragment"));
        assert_eq!(compiler.cross_compiler.calls.get(), 0);
    }

    #[test]
    fn test_cross_compile_options_per_backend() {
        assert!(CrossCompileOptions::for_backend(GraphicsBackend::Vulkan).is_none());
        assert!(CrossCompileOptions::for_backend(GraphicsBackend::Direct3D11).unwrap().invert_vertex_output_y);
        assert!(!CrossCompileOptions::for_backend(GraphicsBackend::OpenGL).unwrap().invert_vertex_output_y);
    }

    #[test]
    fn test_parse_target_backend() {
        assert_eq!(parse_target_backend("D3D11").unwrap(), GraphicsBackend::Direct3D11);
        assert_eq!(parse_target_backend("opengl").unwrap(), GraphicsBackend::OpenGL);
        assert_eq!(parse_target_backend("Vulkan").unwrap(), GraphicsBackend::Vulkan);
        assert!(matches!(
            parse_target_backend("Metal"),
            Err(ShaderError::UnsupportedBackend(name)) if name == "Metal"
        ));
    }
}
