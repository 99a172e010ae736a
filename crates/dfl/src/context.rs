//! 设备发现上下文
//!
//! [`DflContext`] 持有注册表会话（相当于一条 udev 连接）。会话在第一次使用时创建，
//! [`DflContext::finalize()`] 释放后下一次使用会重新创建。
//!
//! 创建/释放会话、打开设备句柄、扫描注册表都在一把可重入锁内进行；
//! 已打开句柄上的属性读写和祖先遍历不加锁。句柄持有自己的后端引用，
//! 所以 `finalize` 之后仍然存活的设备记录不会悬空。

use core::cell::RefCell;
use core::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sync::{ReentrantSpinLock, ReentrantSpinLockGuard};

use crate::DflError;
use crate::config::SYSFS_ROOT;
use crate::registry::{Registry, RegistryDevice, SysfsRegistry};

type Session = RefCell<Option<Arc<dyn Registry>>>;

/// 会话的来源
enum Source {
    /// 读取以该目录为根的 sysfs 树
    Sysfs(PathBuf),
    /// 调用者注入的注册表
    Injected(Arc<dyn Registry>),
}

/// 设备发现上下文
pub struct DflContext {
    source: Source,
    session: ReentrantSpinLock<Session>,
}

impl DflContext {
    /// 使用默认 sysfs 挂载点 `/sys` 的上下文
    pub fn new() -> Self {
        Self::with_sysfs_root(SYSFS_ROOT)
    }

    /// 使用以 `root` 为根的 sysfs 树
    pub fn with_sysfs_root(root: impl Into<PathBuf>) -> Self {
        Self::from_source(Source::Sysfs(root.into()))
    }

    /// 使用自定义注册表
    pub fn with_registry(registry: Arc<dyn Registry>) -> Self {
        Self::from_source(Source::Injected(registry))
    }

    fn from_source(source: Source) -> Self {
        Self {
            source,
            session: ReentrantSpinLock::new(RefCell::new(None)),
        }
    }

    /// 创建注册表会话（已存在时什么也不做）
    pub fn initialize(&self) -> Result<(), DflError> {
        self.locked(|_| Ok(()))
    }

    /// 释放注册表会话
    pub fn finalize(&self) {
        let guard = self.lock();
        if guard.borrow_mut().take().is_some() {
            log::debug!("dfl: registry session closed");
        }
    }

    /// 会话是否已创建
    pub fn is_initialized(&self) -> bool {
        self.lock().borrow().is_some()
    }

    /// 获取上下文锁，锁被其他线程持有时记录一条 trace 日志后等待
    fn lock(&self) -> ReentrantSpinLockGuard<'_, Session> {
        match self.session.try_lock() {
            Some(guard) => guard,
            None => {
                log::trace!("dfl: context lock contended, waiting");
                self.session.lock()
            }
        }
    }

    /// 在上下文锁内以当前会话执行 `f`，必要时先创建会话
    ///
    /// 锁可重入，`f` 内部可以再次调用需要加锁的操作。
    pub(crate) fn locked<R>(
        &self,
        f: impl FnOnce(&dyn Registry) -> Result<R, DflError>,
    ) -> Result<R, DflError> {
        let guard = self.lock();
        let registry = self.session_of(&guard)?;
        f(registry.as_ref())
    }

    fn session_of(&self, session: &Session) -> Result<Arc<dyn Registry>, DflError> {
        if let Some(registry) = session.borrow().as_ref() {
            return Ok(Arc::clone(registry));
        }
        let registry: Arc<dyn Registry> = match &self.source {
            Source::Sysfs(root) => Arc::new(SysfsRegistry::new(root)?),
            Source::Injected(registry) => Arc::clone(registry),
        };
        log::debug!("dfl: registry session opened");
        *session.borrow_mut() = Some(Arc::clone(&registry));
        Ok(registry)
    }

    /// 在锁内打开设备句柄，失败统一为 [`DflError::NotFound`]
    pub(crate) fn open_handle(&self, path: &Path) -> Result<Arc<dyn RegistryDevice>, DflError> {
        self.locked(|registry| registry.device_from_syspath(path))
            .map_err(|e| {
                log::error!("dfl: error opening {}: {}", path.display(), e);
                DflError::NotFound
            })
    }
}

impl Default for DflContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DflContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            Source::Sysfs(root) => root.display().to_string(),
            Source::Injected(_) => "<injected>".to_string(),
        };
        f.debug_struct("DflContext")
            .field("source", &source)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::SysfsFixture;

    #[test]
    fn test_session_is_lazy() {
        let fx = SysfsFixture::new().unwrap();
        let ctx = DflContext::with_sysfs_root(fx.root());
        assert!(!ctx.is_initialized());
        ctx.initialize().unwrap();
        assert!(ctx.is_initialized());
        // 重复初始化无副作用
        ctx.initialize().unwrap();
        ctx.finalize();
        assert!(!ctx.is_initialized());
        ctx.finalize();
    }

    #[test]
    fn test_missing_root() {
        let ctx = DflContext::with_sysfs_root("/nonexistent/dfl-sysfs-root");
        assert_eq!(ctx.initialize(), Err(DflError::NotFound));
        assert!(!ctx.is_initialized());
        assert_eq!(
            ctx.open_handle(Path::new("/nonexistent/dfl-sysfs-root/x"))
                .unwrap_err(),
            DflError::NotFound
        );
    }

    #[test]
    fn test_lock_is_reentrant() {
        let fx = SysfsFixture::new().unwrap();
        let dev = fx.add_device("devices/foo.0").unwrap();
        let ctx = DflContext::with_sysfs_root(fx.root());
        let sysname = ctx
            .locked(|_| {
                let handle = ctx.open_handle(&dev)?;
                Ok(handle.sysname().to_string())
            })
            .unwrap();
        assert_eq!(sysname, "foo.0");
    }

    #[test]
    fn test_handle_outlives_session() {
        let fx = SysfsFixture::new().unwrap();
        let dev = fx.add_device("devices/foo.0").unwrap();
        fx.write_attr(&dev, "value", "1\n").unwrap();
        let ctx = DflContext::with_sysfs_root(fx.root());
        let handle = ctx.open_handle(&dev).unwrap();
        ctx.finalize();
        assert_eq!(handle.sysattr_value("value").as_deref(), Some("1"));
    }

    #[test]
    fn test_injected_registry() {
        let fx = SysfsFixture::new().unwrap();
        let registry = Arc::new(SysfsRegistry::new(fx.root()).unwrap());
        let ctx = DflContext::with_registry(registry);
        ctx.initialize().unwrap();
        ctx.finalize();
        ctx.initialize().unwrap();
        assert!(format!("{:?}", ctx).contains("<injected>"));
    }
}
