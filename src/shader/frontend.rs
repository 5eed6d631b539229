//! GLSL 前端：把 GLSL 源码编译为经过校验的 SPIR-V

use naga::back::spv;
use naga::front::glsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::{ShaderDescription, ShaderFrontend};
use crate::core::error::ShaderError;

/// 基于 naga 的 GLSL → SPIR-V 前端
#[derive(Debug, Clone, Copy, Default)]
pub struct NagaFrontend;

impl ShaderFrontend for NagaFrontend {
    fn compile(&self, desc: &ShaderDescription) -> Result<Vec<u8>, ShaderError> {
        let stage = desc.stage.name().to_string();
        let failed = |message: String| ShaderError::Compilation { stage: stage.clone(), message };

        let source = std::str::from_utf8(&desc.source)
            .map_err(|e| failed(format!("source is not valid UTF-8: {}", e)))?;

        let module = glsl::Frontend::default()
            .parse(&glsl::Options::from(desc.stage.to_naga()), source)
            .map_err(|e| failed(format!("{:?}", e)))?;

        let info = Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .map_err(|e| failed(format!("{:?}", e)))?;

        let pipeline = spv::PipelineOptions {
            shader_stage: desc.stage.to_naga(),
            entry_point: desc.entry_point.clone(),
        };
        // 保持源码的裁剪空间约定，Y 翻转留给交叉编译阶段
        let mut options = spv::Options::default();
        options.flags.remove(spv::WriterFlags::ADJUST_COORDINATE_SPACE);
        let words = spv::write_vec(&module, &info, &options, Some(&pipeline))
            .map_err(|e| failed(e.to_string()))?;

        Ok(bytemuck::cast_slice(&words).to_vec())
    }
}
