//! SPIR-V 交叉编译：生成 HLSL 或 GLSL 源码

use std::collections::HashMap;

use naga::back::{glsl, hlsl};
use naga::front::spv;
use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use naga::{Module, ResourceBinding};

use super::{CrossCompileOptions, CrossCompileTarget, CrossCompiledSource, CrossCompiler};
use crate::core::error::ShaderError;

/// 基于 naga 的交叉编译器
#[derive(Debug, Clone, Copy, Default)]
pub struct NagaCrossCompiler;

impl CrossCompiler for NagaCrossCompiler {
    fn cross_compile(
        &self,
        vertex: &[u8],
        fragment: &[u8],
        options: &CrossCompileOptions,
    ) -> Result<(CrossCompiledSource, CrossCompiledSource), ShaderError> {
        // Y 翻转只作用于顶点输出位置，片段阶段不受影响
        let vertex_module = parse_spirv(vertex, options.invert_vertex_output_y)?;
        let mut fragment_module = parse_spirv(fragment, false)?;

        if options.normalize_resource_names {
            normalize_resource_names(&vertex_module, &mut fragment_module);
        }

        let vertex_info = validate(&vertex_module)?;
        let fragment_info = validate(&fragment_module)?;

        match options.target {
            CrossCompileTarget::Hlsl => Ok((
                write_hlsl(&vertex_module, &vertex_info)?,
                write_hlsl(&fragment_module, &fragment_info)?,
            )),
            CrossCompileTarget::Glsl => Ok((
                write_glsl(&vertex_module, &vertex_info, naga::ShaderStage::Vertex)?,
                write_glsl(&fragment_module, &fragment_info, naga::ShaderStage::Fragment)?,
            )),
        }
    }
}

fn parse_spirv(bytes: &[u8], adjust_coordinate_space: bool) -> Result<Module, ShaderError> {
    let options = spv::Options {
        adjust_coordinate_space,
        ..Default::default()
    };
    spv::parse_u8_slice(bytes, &options)
        .map_err(|e| ShaderError::CrossCompilation(format!("invalid SPIR-V: {:?}", e)))
}

fn validate(module: &Module) -> Result<ModuleInfo, ShaderError> {
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(module)
        .map_err(|e| ShaderError::CrossCompilation(format!("{:?}", e)))
}

/// 片段阶段中与顶点阶段共享 (set, binding) 的资源改用顶点阶段的名字
///
/// 生成的源码里同一资源在两个阶段同名，按名字绑定的后端（GLSL）才能把它们对上。
pub(crate) fn normalize_resource_names(vertex: &Module, fragment: &mut Module) {
    let names: HashMap<ResourceBinding, String> = vertex
        .global_variables
        .iter()
        .filter_map(|(_, var)| Some((var.binding.clone()?, var.name.clone()?)))
        .collect();

    for (_, var) in fragment.global_variables.iter_mut() {
        let Some(binding) = var.binding.as_ref() else { continue };
        if let Some(name) = names.get(binding) {
            var.name = Some(name.clone());
        }
    }
}

fn write_hlsl(module: &Module, info: &ModuleInfo) -> Result<CrossCompiledSource, ShaderError> {
    let options = hlsl::Options {
        shader_model: hlsl::ShaderModel::V5_0,
        fake_missing_bindings: true,
        ..Default::default()
    };
    let mut out = String::new();
    let reflection = hlsl::Writer::new(&mut out, &options)
        .write(module, info)
        .map_err(|e| ShaderError::CrossCompilation(format!("HLSL: {}", e)))?;

    // 生成的 HLSL 可能为避开保留字而改名，D3DCompile 需要实际的函数名
    let entry_point = reflection
        .entry_point_names
        .into_iter()
        .next()
        .ok_or_else(|| ShaderError::CrossCompilation("no entry point in SPIR-V module".to_string()))?
        .map_err(|e| ShaderError::CrossCompilation(format!("HLSL: {}", e)))?;

    Ok(CrossCompiledSource { source: out, entry_point })
}

fn write_glsl(module: &Module, info: &ModuleInfo, stage: naga::ShaderStage) -> Result<CrossCompiledSource, ShaderError> {
    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage)
        .map(|ep| ep.name.clone())
        .ok_or_else(|| {
            ShaderError::CrossCompilation(format!("no {:?} entry point in SPIR-V module", stage))
        })?;

    let options = glsl::Options {
        version: glsl::Version::Desktop(330),
        writer_flags: glsl::WriterFlags::empty(),
        ..Default::default()
    };
    let pipeline = glsl::PipelineOptions {
        shader_stage: stage,
        entry_point,
        multiview: None,
    };

    let mut out = String::new();
    glsl::Writer::new(
        &mut out,
        module,
        info,
        &options,
        &pipeline,
        naga::proc::BoundsCheckPolicies::default(),
    )
    .and_then(|mut writer| writer.write())
    .map_err(|e| ShaderError::CrossCompilation(format!("GLSL: {}", e)))?;

    Ok(CrossCompiledSource {
        source: out,
        entry_point: "main".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{NagaFrontend, ShaderDescription, ShaderFrontend};
    use naga::front::glsl as glsl_in;

    fn parse_glsl(stage: naga::ShaderStage, source: &str) -> Module {
        glsl_in::Frontend::default()
            .parse(&glsl_in::Options::from(stage), source)
            .unwrap()
    }

    fn name_at(module: &Module, group: u32, binding: u32) -> Option<String> {
        module
            .global_variables
            .iter()
            .find(|(_, var)| var.binding == Some(ResourceBinding { group, binding }))
            .and_then(|(_, var)| var.name.clone())
    }

    #[test]
    fn test_shared_binding_takes_vertex_name() {
        let vertex = parse_glsl(
            naga::ShaderStage::Vertex,
            "#version 450\n\
             layout(set = 0, binding = 0) uniform texture2D SurfaceTexture;\n\
             void main() { gl_Position = vec4(0.0); }\n",
        );
        let mut fragment = parse_glsl(
            naga::ShaderStage::Fragment,
            "#version 450\n\
             layout(set = 0, binding = 0) uniform texture2D Tex;\n\
             layout(set = 0, binding = 1) uniform sampler Samp;\n\
             layout(location = 0) out vec4 color;\n\
             void main() { color = vec4(1.0); }\n",
        );

        normalize_resource_names(&vertex, &mut fragment);

        assert!(name_at(&vertex, 0, 0).is_some());
        assert_eq!(name_at(&fragment, 0, 0), name_at(&vertex, 0, 0));
        // 只在片段阶段出现的资源保持原名
        assert_eq!(name_at(&fragment, 0, 1).as_deref(), Some("Samp"));
    }

    fn builtin_spirv() -> (Vec<u8>, Vec<u8>) {
        let (vs, fs) = ShaderDescription::builtin_pair();
        (NagaFrontend.compile(&vs).unwrap(), NagaFrontend.compile(&fs).unwrap())
    }

    fn options(target: CrossCompileTarget, invert_vertex_output_y: bool) -> CrossCompileOptions {
        CrossCompileOptions { target, invert_vertex_output_y, normalize_resource_names: true }
    }

    #[test]
    fn test_hlsl_vertex_output_y_is_negated_only_when_requested() {
        let (vertex, fragment) = builtin_spirv();

        let (flipped, flipped_fs) = NagaCrossCompiler
            .cross_compile(&vertex, &fragment, &options(CrossCompileTarget::Hlsl, true))
            .unwrap();
        let (plain, _) = NagaCrossCompiler
            .cross_compile(&vertex, &fragment, &options(CrossCompileTarget::Hlsl, false))
            .unwrap();

        assert!(flipped.source.contains(".y = -("), "{}", flipped.source);
        assert!(!plain.source.contains(".y = -("), "{}", plain.source);
        // 片段阶段不受翻转影响
        assert!(!flipped_fs.source.contains(".y = -("));
        assert!(!flipped.entry_point.is_empty());
        assert!(flipped.source.contains(&flipped.entry_point));
    }

    #[test]
    fn test_glsl_output_keeps_source_y_direction() {
        let (vertex, fragment) = builtin_spirv();

        let (vs, fs) = NagaCrossCompiler
            .cross_compile(&vertex, &fragment, &options(CrossCompileTarget::Glsl, false))
            .unwrap();

        assert!(!vs.source.contains(".y = -("), "{}", vs.source);
        assert!(vs.source.starts_with("#version 330 core"));
        assert_eq!(vs.entry_point, "main");
        assert_eq!(fs.entry_point, "main");
    }

    #[test]
    fn test_rejects_garbage_spirv() {
        let options = CrossCompileOptions {
            target: CrossCompileTarget::Glsl,
            invert_vertex_output_y: false,
            normalize_resource_names: true,
        };
        let err = NagaCrossCompiler.cross_compile(&[1, 2, 3, 4], &[5, 6, 7, 8], &options).unwrap_err();
        assert!(matches!(err, ShaderError::CrossCompilation(_)));
    }
}
