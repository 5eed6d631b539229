//! Prism 宿主探测程序
//!
//! 用一个 winit 窗口代替宿主游戏窗口，完整走一遍插件生命周期：
//! 选择后端、创建设备、部署原生依赖、编译内置着色器。
//!
//! # 使用方法
//!
//! ```bash
//! # 按平台默认策略选择后端
//! cargo run
//!
//! # 强制使用 Vulkan（等价于 FNA3D_FORCE_DRIVER=Vulkan）
//! cargo run -- --vulkan
//!
//! # 不创建设备，只打印某个后端的着色器编译结果
//! cargo run -- --dump-shaders d3d11
//! ```

use anyhow::{Context, Result};
use tracing::{debug, info};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use prism::core::{log, Config};
use prism::plugin::Plugin;
use prism::shader::{parse_target_backend, CompiledShaders, ShaderCode, ShaderCompiler, ShaderDescription};

/// 初始化流程
///
/// 1. 加载配置文件（prism.toml），不存在时使用默认配置
/// 2. 应用 `FNA3D_FORCE_DRIVER` 与命令行参数覆盖
/// 3. 验证配置并初始化日志系统
/// 4. 创建窗口与插件，进入事件循环
fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut config = Config::from_file_or_default("prism.toml");
    config.apply_env(|key| std::env::var(key).ok());
    config.apply_args(&args);
    config.validate().context("Invalid configuration")?;

    let log_file = config.logging.file_output.then_some(config.logging.log_file.as_str());
    log::init_logger(config.logging.level, config.logging.file_output, log_file);
    info!(version = env!("CARGO_PKG_VERSION"), "Prism starting...");

    if let Some(idx) = args.iter().position(|a| a == "--dump-shaders") {
        let name = args
            .get(idx + 1)
            .context("--dump-shaders requires a backend name")?;
        return dump_shaders(name);
    }

    info!(
        backend = ?config.graphics.backend,
        width = config.window.width,
        height = config.window.height,
        "Graphics configuration"
    );

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(config.window.title.as_str())
        .with_inner_size(PhysicalSize::new(config.window.width, config.window.height))
        .build(&event_loop)?;

    let mut plugin = Plugin::new(&window, &config)?;
    let shaders = plugin.load()?;
    info!(
        backend = %plugin.device().backend(),
        conventions = ?plugin.conventions(),
        vertex_bytes = shaders.vertex.code.as_bytes().len(),
        fragment_bytes = shaders.fragment.code.as_bytes().len(),
        "Plugin loaded"
    );

    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop.run(move |event, elwt| {
        if let Event::WindowEvent { event, .. } = event {
            match event {
                WindowEvent::CloseRequested => {
                    info!("Close requested, shutting down...");
                    elwt.exit();
                }
                WindowEvent::Resized(size) => {
                    debug!(width = size.width, height = size.height, "Window resized");
                }
                _ => (),
            }
        }
    })?;

    // 设备在插件析构时释放
    drop(plugin);
    Ok(())
}

/// 编译内置着色器并输出到标准输出
fn dump_shaders(name: &str) -> Result<()> {
    let backend = parse_target_backend(name)?;
    let (vertex, fragment) = ShaderDescription::builtin_pair();
    let shaders = ShaderCompiler::new().compile_pair(backend, &vertex, &fragment)?;
    print_shaders(&shaders);
    Ok(())
}

fn print_shaders(shaders: &CompiledShaders) {
    for artifact in [&shaders.vertex, &shaders.fragment] {
        println!("// {} ({})", artifact.stage.name(), artifact.entry_point);
        match &artifact.code {
            ShaderCode::Text(text) => println!("{}", text),
            ShaderCode::SpirV(bytes) => println!("<SPIR-V, {} bytes>", bytes.len()),
        }
    }
}
