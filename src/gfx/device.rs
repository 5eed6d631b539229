//! 图形设备与设备创建编排
//!
//! 编排器先尝试首选后端，失败后按固定顺序 Direct3D11 → OpenGL → Vulkan 依次回退，
//! 返回第一个成功创建的设备。所有尝试都失败时返回 `None`，由调用方决定如何升级为致命错误。
//!
//! 首选后端如果出现在固定序列里会被再尝试一次。这是既有行为，默认保留；
//! `DeviceSelection::deduplicate_fallbacks` 可以关闭这次重复尝试。

use tracing::debug;

use super::backend::{resolve_backend, GraphicsBackend, HostOs, FALLBACK_ORDER};
use super::d3d11::{D3D11Device, D3D11Shaders};
use super::host::HostWindow;
use super::opengl::{GlShaders, OpenGlDevice};
use super::options::{CoordinateConventions, GraphicsDeviceOptions};
use super::vulkan::{VulkanDevice, VulkanShaders};
use crate::core::error::BackendError;
use crate::core::Config;
use crate::shader::CompiledShaders;

/// 图形设备
///
/// 由编排器按值返回，调用方独占持有。
pub enum GraphicsDevice {
    Direct3D11(D3D11Device),
    OpenGL(OpenGlDevice),
    Vulkan(VulkanDevice),
}

impl GraphicsDevice {
    /// 设备所属后端
    pub fn backend(&self) -> GraphicsBackend {
        match self {
            GraphicsDevice::Direct3D11(_) => GraphicsBackend::Direct3D11,
            GraphicsDevice::OpenGL(_) => GraphicsBackend::OpenGL,
            GraphicsDevice::Vulkan(_) => GraphicsBackend::Vulkan,
        }
    }

    /// 交换链尺寸
    pub fn swapchain_size(&self) -> (u32, u32) {
        match self {
            GraphicsDevice::Direct3D11(d) => d.swapchain_size(),
            GraphicsDevice::OpenGL(d) => d.swapchain_size(),
            GraphicsDevice::Vulkan(d) => d.swapchain_size(),
        }
    }

    /// 设备创建时实际生效的裁剪空间与深度范围约定
    pub fn conventions(&self) -> CoordinateConventions {
        match self {
            GraphicsDevice::Direct3D11(d) => d.conventions(),
            GraphicsDevice::OpenGL(d) => d.conventions(),
            GraphicsDevice::Vulkan(d) => d.conventions(),
        }
    }

    /// 用编译好的着色器创建设备端着色器对象
    ///
    /// 着色器必须是为本设备后端编译的：Vulkan 需要 SPIR-V，其他后端需要源码。
    pub fn create_shaders(&self, shaders: &CompiledShaders) -> Result<DeviceShaders, BackendError> {
        let (vertex, fragment) = (&shaders.vertex, &shaders.fragment);
        let created = match self {
            GraphicsDevice::Direct3D11(d) => DeviceShaders::Direct3D11(d.create_shaders(vertex, fragment)?),
            GraphicsDevice::OpenGL(d) => DeviceShaders::OpenGL(d.create_shaders(vertex, fragment)?),
            GraphicsDevice::Vulkan(d) => DeviceShaders::Vulkan(d.create_shaders(vertex, fragment)?),
        };
        debug!(backend = %self.backend(), "Device shaders created");
        Ok(created)
    }
}

/// 设备端着色器对象
///
/// 引用创建它的设备，必须先于 `GraphicsDevice` 释放。
pub enum DeviceShaders {
    Direct3D11(D3D11Shaders),
    OpenGL(GlShaders),
    Vulkan(VulkanShaders),
}

/// 单个后端的设备创建
///
/// 每个方法都是一次独立的尝试，失败以 `Err` 返回，由编排器决定是否继续。
pub trait DeviceFactory {
    type Device;

    fn create_d3d11(&mut self, host: &dyn HostWindow, options: &GraphicsDeviceOptions) -> Result<Self::Device, BackendError>;

    fn create_opengl(&mut self, host: &dyn HostWindow, options: &GraphicsDeviceOptions) -> Result<Self::Device, BackendError>;

    fn create_vulkan(&mut self, host: &dyn HostWindow, options: &GraphicsDeviceOptions) -> Result<Self::Device, BackendError>;

    /// 按后端分派
    fn create(
        &mut self,
        backend: GraphicsBackend,
        host: &dyn HostWindow,
        options: &GraphicsDeviceOptions,
    ) -> Result<Self::Device, BackendError> {
        match backend {
            GraphicsBackend::Direct3D11 => self.create_d3d11(host, options),
            GraphicsBackend::OpenGL => self.create_opengl(host, options),
            GraphicsBackend::Vulkan => self.create_vulkan(host, options),
        }
    }
}

/// 后端选择参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSelection {
    /// 来自 `FNA3D_FORCE_DRIVER` 或配置文件的强制后端
    pub forced_backend: Option<GraphicsBackend>,
    /// 宿主操作系统
    pub host_os: HostOs,
    /// 回退序列中跳过首选后端
    pub deduplicate_fallbacks: bool,
}

impl DeviceSelection {
    pub fn from_config(config: &Config) -> Self {
        Self {
            forced_backend: config.graphics.backend,
            host_os: HostOs::current(),
            deduplicate_fallbacks: config.graphics.deduplicate_fallbacks,
        }
    }

    /// 首选后端
    pub fn preferred(&self) -> GraphicsBackend {
        resolve_backend(self.forced_backend, self.host_os)
    }

    /// 首选后端失败后的回退序列
    ///
    /// 固定为 Direct3D11 → OpenGL → Vulkan；开启去重时跳过首选后端。
    pub fn fallbacks(&self) -> impl Iterator<Item = GraphicsBackend> {
        let skip = self.deduplicate_fallbacks.then(|| self.preferred());
        FALLBACK_ORDER.into_iter().filter(move |b| Some(*b) != skip)
    }
}

/// 创建绑定到宿主窗口的图形设备
///
/// # 参数
///
/// * `factory` - 各后端的设备创建实现
/// * `host` - 宿主窗口
/// * `options` - 设备创建选项
/// * `selection` - 后端选择参数
/// * `log` - 可选的进度回调，只用于观察
///
/// # 返回值
///
/// 第一个成功创建的设备；全部失败时返回 `None`
pub fn create_graphics_device<F: DeviceFactory>(
    factory: &mut F,
    host: &dyn HostWindow,
    options: GraphicsDeviceOptions,
    selection: &DeviceSelection,
    mut log: Option<&mut dyn FnMut(&str)>,
) -> Option<F::Device> {
    // 有回调时只交给回调，否则落到 debug 日志
    let mut emit = |message: &str| match log.as_deref_mut() {
        Some(log) => log(message),
        None => debug!(target: "prism::device", "{}", message),
    };

    let preferred = selection.preferred();
    emit(&format!("Got [preferred] backend: {}", preferred));

    match factory.create(preferred, host, &options) {
        Ok(device) => return Some(device),
        Err(e) => emit(&format!("Failed to create [preferred] graphics device: {}", e)),
    }

    // 按优先级降序手动回退
    for backend in selection.fallbacks() {
        emit(&format!("Trying {} device...", backend));
        match factory.create(backend, host, &options) {
            Ok(device) => return Some(device),
            Err(e) => emit(&format!("Failed to create {} device: {}", backend, e)),
        }
    }

    emit("Failed to create any graphics device.");
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gfx::host::tests::FakeHost;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// 按脚本返回结果并记录尝试顺序的工厂
    pub(crate) struct ScriptedFactory {
        pub succeeds: Vec<GraphicsBackend>,
        pub attempts: Vec<GraphicsBackend>,
    }

    impl ScriptedFactory {
        pub(crate) fn new(succeeds: &[GraphicsBackend]) -> Self {
            Self { succeeds: succeeds.to_vec(), attempts: Vec::new() }
        }

        fn attempt(&mut self, backend: GraphicsBackend) -> Result<GraphicsBackend, BackendError> {
            self.attempts.push(backend);
            if self.succeeds.contains(&backend) {
                Ok(backend)
            } else {
                Err(BackendError::DriverUnavailable(format!("no {} driver", backend)))
            }
        }
    }

    impl DeviceFactory for ScriptedFactory {
        type Device = GraphicsBackend;

        fn create_d3d11(&mut self, _: &dyn HostWindow, _: &GraphicsDeviceOptions) -> Result<GraphicsBackend, BackendError> {
            self.attempt(GraphicsBackend::Direct3D11)
        }

        fn create_opengl(&mut self, _: &dyn HostWindow, _: &GraphicsDeviceOptions) -> Result<GraphicsBackend, BackendError> {
            self.attempt(GraphicsBackend::OpenGL)
        }

        fn create_vulkan(&mut self, _: &dyn HostWindow, _: &GraphicsDeviceOptions) -> Result<GraphicsBackend, BackendError> {
            self.attempt(GraphicsBackend::Vulkan)
        }
    }

    fn selection(forced: Option<GraphicsBackend>, host_os: HostOs) -> DeviceSelection {
        DeviceSelection { forced_backend: forced, host_os, deduplicate_fallbacks: false }
    }

    #[test]
    fn test_preferred_success_short_circuits() {
        let mut factory = ScriptedFactory::new(&[GraphicsBackend::Vulkan]);
        let device = create_graphics_device(
            &mut factory,
            &FakeHost::xlib(),
            GraphicsDeviceOptions::default(),
            &selection(Some(GraphicsBackend::Vulkan), HostOs::Linux),
            None,
        );

        assert_eq!(device, Some(GraphicsBackend::Vulkan));
        assert_eq!(factory.attempts, vec![GraphicsBackend::Vulkan]);
    }

    #[test]
    fn test_first_successful_fallback_wins() {
        let mut factory = ScriptedFactory::new(&[GraphicsBackend::OpenGL]);
        let device = create_graphics_device(
            &mut factory,
            &FakeHost::xlib(),
            GraphicsDeviceOptions::default(),
            &selection(Some(GraphicsBackend::Vulkan), HostOs::Linux),
            None,
        );

        assert_eq!(device, Some(GraphicsBackend::OpenGL));
        // Vulkan 失败后从 Direct3D11 开始回退，OpenGL 成功后不再尝试 Vulkan
        assert_eq!(
            factory.attempts,
            vec![GraphicsBackend::Vulkan, GraphicsBackend::Direct3D11, GraphicsBackend::OpenGL]
        );
    }

    #[test]
    fn test_exhaustion_logs_every_attempt_once_in_order() {
        let mut factory = ScriptedFactory::new(&[]);
        let mut messages = Vec::new();
        let mut sink = |m: &str| messages.push(m.to_string());

        let device = create_graphics_device(
            &mut factory,
            &FakeHost::xlib(),
            GraphicsDeviceOptions::default(),
            &selection(None, HostOs::Linux),
            Some(&mut sink),
        );

        assert_eq!(device, None);
        assert_eq!(
            factory.attempts,
            vec![
                GraphicsBackend::OpenGL,
                GraphicsBackend::Direct3D11,
                GraphicsBackend::OpenGL,
                GraphicsBackend::Vulkan,
            ]
        );

        let failures: Vec<&String> = messages.iter().filter(|m| m.starts_with("Failed to create")).collect();
        assert_eq!(failures.len(), 5);
        assert!(failures[0].starts_with("Failed to create [preferred] graphics device: "));
        assert!(failures[1].starts_with("Failed to create Direct3D11 device: "));
        assert!(failures[2].starts_with("Failed to create OpenGL device: "));
        assert!(failures[3].starts_with("Failed to create Vulkan device: "));
        assert_eq!(failures[4], "Failed to create any graphics device.");

        assert_eq!(messages[0], "Got [preferred] backend: OpenGL");
        let trying: Vec<&String> = messages.iter().filter(|m| m.starts_with("Trying")).collect();
        assert_eq!(trying, vec!["Trying Direct3D11 device...", "Trying OpenGL device...", "Trying Vulkan device..."]);
    }

    #[test]
    fn test_windows_prefers_d3d11() {
        let mut factory = ScriptedFactory::new(&[GraphicsBackend::Direct3D11]);
        let device = create_graphics_device(
            &mut factory,
            &FakeHost::xlib(),
            GraphicsDeviceOptions::default(),
            &selection(None, HostOs::Windows),
            None,
        );
        assert_eq!(device, Some(GraphicsBackend::Direct3D11));
        assert_eq!(factory.attempts, vec![GraphicsBackend::Direct3D11]);
    }

    #[test]
    fn test_deduplicate_skips_failed_preferred() {
        let mut factory = ScriptedFactory::new(&[]);
        let selection = DeviceSelection {
            forced_backend: Some(GraphicsBackend::OpenGL),
            host_os: HostOs::Linux,
            deduplicate_fallbacks: true,
        };

        let device = create_graphics_device(
            &mut factory,
            &FakeHost::xlib(),
            GraphicsDeviceOptions::default(),
            &selection,
            None,
        );

        assert_eq!(device, None);
        assert_eq!(
            factory.attempts,
            vec![GraphicsBackend::OpenGL, GraphicsBackend::Direct3D11, GraphicsBackend::Vulkan]
        );
    }

    /// 统计 `prism::device` 目标下的 tracing 事件
    struct DeviceEventCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for DeviceEventCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().target() == "prism::device" {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn count_device_events(run: impl FnOnce()) -> usize {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(DeviceEventCounter(count.clone()));
        tracing::subscriber::with_default(subscriber, run);
        count.load(Ordering::SeqCst)
    }

    #[test]
    fn test_messages_take_a_single_path() {
        let select = selection(Some(GraphicsBackend::Vulkan), HostOs::Linux);

        // 有回调时消息只进入回调
        let mut messages = Vec::new();
        let traced = count_device_events(|| {
            let mut sink = |m: &str| messages.push(m.to_string());
            let mut factory = ScriptedFactory::new(&[GraphicsBackend::Direct3D11]);
            create_graphics_device(&mut factory, &FakeHost::xlib(), GraphicsDeviceOptions::default(), &select, Some(&mut sink));
        });
        assert_eq!(traced, 0);
        assert_eq!(messages.len(), 3);

        // 没有回调时每条消息记录一次
        let traced = count_device_events(|| {
            let mut factory = ScriptedFactory::new(&[GraphicsBackend::Direct3D11]);
            create_graphics_device(&mut factory, &FakeHost::xlib(), GraphicsDeviceOptions::default(), &select, None);
        });
        assert_eq!(traced, 3);
    }

    #[test]
    fn test_fallback_sequence() {
        let fallbacks: Vec<_> = selection(Some(GraphicsBackend::Direct3D11), HostOs::Windows).fallbacks().collect();
        assert_eq!(
            fallbacks,
            vec![GraphicsBackend::Direct3D11, GraphicsBackend::OpenGL, GraphicsBackend::Vulkan]
        );

        let deduplicated = DeviceSelection {
            forced_backend: Some(GraphicsBackend::OpenGL),
            host_os: HostOs::Linux,
            deduplicate_fallbacks: true,
        };
        assert_eq!(
            deduplicated.fallbacks().collect::<Vec<_>>(),
            vec![GraphicsBackend::Direct3D11, GraphicsBackend::Vulkan]
        );
    }
}
