//! 原生依赖库部署
//!
//! 插件资源目录按 `{平台}-{位数}/{文件名}` 存放原生库，例如
//! `win-x64/libveldrid-spirv.dll`、`linux-x64/libveldrid-spirv.so`、`osx/libveldrid-spirv.dylib`。
//! 启动时把当前平台对应的文件复制到工作目录，再从工作目录加载。

use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::{debug, info};

use crate::core::error::{PrismError, Result};

/// 原生库目标平台
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativePlatform {
    Windows,
    Linux,
    MacOs,
}

impl NativePlatform {
    /// 当前编译目标平台，其他平台返回 `None`
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "windows") {
            Some(NativePlatform::Windows)
        } else if cfg!(target_os = "linux") {
            Some(NativePlatform::Linux)
        } else if cfg!(target_os = "macos") {
            Some(NativePlatform::MacOs)
        } else {
            None
        }
    }

    /// 资源目录名
    ///
    /// macOS 只有一个目录，不区分位数。
    pub fn directory_key(&self, is_64bit: bool) -> &'static str {
        match (self, is_64bit) {
            (NativePlatform::Windows, true) => "win-x64",
            (NativePlatform::Windows, false) => "win-x32",
            (NativePlatform::Linux, true) => "linux-x64",
            (NativePlatform::Linux, false) => "linux-x32",
            (NativePlatform::MacOs, _) => "osx",
        }
    }

    /// 平台动态库文件名
    pub fn library_file_name(&self, stem: &str) -> String {
        let extension = match self {
            NativePlatform::Windows => "dll",
            NativePlatform::Linux => "so",
            NativePlatform::MacOs => "dylib",
        };
        format!("{}.{}", stem, extension)
    }
}

/// 把当前平台的原生库复制到目标目录
///
/// 目标文件已存在时先删除再复制。不支持并发调用，只在启动时执行一次。
///
/// # 返回
///
/// 复制后的文件路径
pub fn stage_native_library(resource_root: &Path, stem: &str, dest_dir: &Path) -> Result<PathBuf> {
    let platform = NativePlatform::current().ok_or_else(|| {
        PrismError::PlatformNotSupported(format!("No native libraries for {}", std::env::consts::OS))
    })?;
    stage_for_platform(platform, cfg!(target_pointer_width = "64"), resource_root, stem, dest_dir)
}

fn stage_for_platform(
    platform: NativePlatform,
    is_64bit: bool,
    resource_root: &Path,
    stem: &str,
    dest_dir: &Path,
) -> Result<PathBuf> {
    let file_name = platform.library_file_name(stem);
    let source = resource_root.join(platform.directory_key(is_64bit)).join(&file_name);
    let dest = dest_dir.join(&file_name);

    if dest.exists() {
        debug!(path = %dest.display(), "Removing previously staged library");
        std::fs::remove_file(&dest)?;
    }

    std::fs::copy(&source, &dest)?;
    info!(source = %source.display(), dest = %dest.display(), "Staged native library");
    Ok(dest)
}

/// 已加载的原生库
///
/// 析构时卸载，进程内由 `Plugin` 持有。
pub struct NativeLibrary {
    path: PathBuf,
    handle: usize,
    _library: Library,
}

impl NativeLibrary {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 平台加载器返回的模块句柄
    pub fn handle(&self) -> usize {
        self.handle
    }
}

impl std::fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .field("handle", &format_args!("{:#x}", self.handle))
            .finish()
    }
}

/// 加载已部署的原生库
///
/// 库的初始化代码会在加载时执行，只应加载随插件发布的库。
pub fn load_native_library(path: &Path) -> Result<NativeLibrary> {
    let library = unsafe { Library::new(path) }
        .map_err(|e| PrismError::NativeLibrary(format!("{}: {}", path.display(), e)))?;
    let (library, handle) = with_raw_handle(library);

    info!("Loaded {} @ {:#x}", path.display(), handle);
    Ok(NativeLibrary { path: path.to_path_buf(), handle, _library: library })
}

#[cfg(unix)]
fn with_raw_handle(library: Library) -> (Library, usize) {
    use libloading::os::unix;

    let raw = unix::Library::from(library).into_raw();
    let library = unsafe { unix::Library::from_raw(raw) };
    (library.into(), raw as usize)
}

#[cfg(windows)]
fn with_raw_handle(library: Library) -> (Library, usize) {
    use libloading::os::windows;

    let raw = windows::Library::from(library).into_raw();
    let library = unsafe { windows::Library::from_raw(raw) };
    (library.into(), raw as usize)
}

/// 部署并加载配置中的全部原生库
///
/// `resource_root` 不存在时跳过并给出警告；目录存在但缺少文件视为错误。
pub fn stage_and_load(resource_root: &Path, stems: &[String], dest_dir: &Path) -> Result<Vec<NativeLibrary>> {
    if !resource_root.is_dir() {
        tracing::warn!(root = %resource_root.display(), "Native library root not found, nothing staged");
        return Ok(Vec::new());
    }

    stems
        .iter()
        .map(|stem| {
            let staged = stage_native_library(resource_root, stem, dest_dir)?;
            load_native_library(&staged)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("prism-native-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_directory_keys() {
        assert_eq!(NativePlatform::Windows.directory_key(true), "win-x64");
        assert_eq!(NativePlatform::Windows.directory_key(false), "win-x32");
        assert_eq!(NativePlatform::Linux.directory_key(true), "linux-x64");
        assert_eq!(NativePlatform::Linux.directory_key(false), "linux-x32");
        assert_eq!(NativePlatform::MacOs.directory_key(true), "osx");
        assert_eq!(NativePlatform::MacOs.directory_key(false), "osx");
    }

    #[test]
    fn test_library_file_names() {
        assert_eq!(NativePlatform::Windows.library_file_name("libveldrid-spirv"), "libveldrid-spirv.dll");
        assert_eq!(NativePlatform::Linux.library_file_name("libveldrid-spirv"), "libveldrid-spirv.so");
        assert_eq!(NativePlatform::MacOs.library_file_name("libveldrid-spirv"), "libveldrid-spirv.dylib");
    }

    #[test]
    fn test_stage_overwrites_existing_file() {
        let root = scratch_dir("overwrite");
        let resources = root.join("resources");
        let dest_dir = root.join("work");
        std::fs::create_dir_all(resources.join("linux-x64")).unwrap();
        std::fs::create_dir_all(&dest_dir).unwrap();
        std::fs::write(resources.join("linux-x64/libfoo.so"), b"fresh").unwrap();
        std::fs::write(dest_dir.join("libfoo.so"), b"stale library").unwrap();

        let staged = stage_for_platform(NativePlatform::Linux, true, &resources, "libfoo", &dest_dir).unwrap();

        assert_eq!(staged, dest_dir.join("libfoo.so"));
        assert_eq!(std::fs::read(&staged).unwrap(), b"fresh");
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_stage_missing_source_is_io_error() {
        let root = scratch_dir("missing");

        let err = stage_for_platform(NativePlatform::MacOs, true, &root, "libfoo", &root).unwrap_err();

        assert!(matches!(err, PrismError::Io(_)));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_load_rejects_non_library_file() {
        let root = scratch_dir("garbage");
        let path = root.join(NativePlatform::current().unwrap().library_file_name("libgarbage"));
        std::fs::write(&path, b"not a shared object").unwrap();

        let err = load_native_library(&path).unwrap_err();

        assert!(matches!(err, PrismError::NativeLibrary(_)));
        std::fs::remove_dir_all(&root).unwrap();
    }

    /// 进程已映射的某个共享库，重复加载只增加引用计数
    #[cfg(target_os = "linux")]
    fn mapped_shared_object() -> PathBuf {
        let maps = std::fs::read_to_string("/proc/self/maps").unwrap();
        maps.lines()
            .filter_map(|line| line.split_whitespace().nth(5))
            .find(|path| path.starts_with('/') && path.contains(".so"))
            .map(PathBuf::from)
            .unwrap()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_load_reports_module_handle() {
        let path = mapped_shared_object();

        let library = load_native_library(&path).unwrap();

        assert_eq!(library.path(), path.as_path());
        assert_ne!(library.handle(), 0);
        assert!(format!("{:?}", library).contains("0x"));
    }

    #[test]
    fn test_stage_and_load_skips_missing_root() {
        let root = scratch_dir("no-root");

        let loaded = stage_and_load(&root.join("absent"), &["libfoo".to_string()], &root).unwrap();

        assert!(loaded.is_empty());
        std::fs::remove_dir_all(&root).unwrap();
    }
}
