//! 设备/属性注册表接口
//!
//! 此模块定义了设备发现需要的外部依赖接口（相当于一条 udev 连接），
//! 通过 trait 抽象与具体后端解耦。默认后端 [`SysfsRegistry`] 直接读取 sysfs 树。
//!
//! 句柄的释放即 `Drop`：[`RegistryDevice`] 以 `Arc` 共享，最后一个引用消失时释放。

mod sysfs;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::DflError;

pub use sysfs::{SysfsDevice, SysfsRegistry};

/// 已打开的设备句柄
pub trait RegistryDevice: fmt::Debug + Send + Sync {
    /// 设备在 sysfs 中的绝对路径
    fn syspath(&self) -> &Path;

    /// 设备名（路径最后一段）
    fn sysname(&self) -> &str;

    /// 所属子系统
    fn subsystem(&self) -> Option<&str>;

    /// 绑定的驱动
    fn driver(&self) -> Option<&str>;

    /// 设备号，没有设备节点时为 0
    fn devnum(&self) -> u64;

    /// 最近的父设备
    fn parent(&self) -> Option<Arc<dyn RegistryDevice>>;

    /// 读取属性（优先返回缓存值），属性不存在时返回 `None`
    fn sysattr_value(&self, name: &str) -> Option<String>;

    /// 写属性并更新缓存
    fn set_sysattr_value(&self, name: &str, value: &str) -> Result<(), DflError>;

    /// 列出所有属性名，属性组内的属性以 `group/name` 表示
    fn sysattr_names(&self) -> Result<Vec<String>, DflError>;
}

/// 注册表会话
pub trait Registry: Send + Sync {
    /// 由 sysfs 路径打开设备句柄
    fn device_from_syspath(&self, path: &Path) -> Result<Arc<dyn RegistryDevice>, DflError>;

    /// 扫描属性 `key` 等于 `values` 之一的所有设备
    fn scan_property(&self, key: &str, values: &[&str]) -> Result<Vec<PathBuf>, DflError>;

    /// 扫描属于 `subsystem` 的所有设备
    fn scan_subsystem(&self, subsystem: &str) -> Result<Vec<PathBuf>, DflError>;
}
