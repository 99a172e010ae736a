//! sysfs 注册表后端
//!
//! 以 udev 看待 sysfs 的方式读取一棵 sysfs 树：
//!
//! - 带 `uevent` 文件的目录是设备；父设备是最近的带 `uevent` 的祖先目录
//! - `driver` / `subsystem` 符号链接的目标名即驱动名 / 子系统名
//! - 设备目录下的普通文件是属性；不是子设备的子目录是属性组
//! - 子设备目录同时带 `uevent` 文件和 `subsystem` 符号链接
//! - 扫描结果按 syspath 排序去重

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sync::SpinLock;

use super::{Registry, RegistryDevice};
use crate::DflError;
use crate::config::{DRIVER_PROPERTY, PAGE_SIZE, attr};
use crate::devno::{makedev, parse_dev};

const SUBSYSTEM_PROPERTY: &str = "SUBSYSTEM";

/// 读取时返回链接目标名的符号链接属性
const LINK_ATTRS: [&str; 3] = ["driver", "subsystem", "module"];

/// 以某个目录为根的 sysfs 注册表
#[derive(Debug)]
pub struct SysfsRegistry {
    root: PathBuf,
}

impl SysfsRegistry {
    /// 打开以 `root` 为根的 sysfs 树
    pub fn new(root: impl AsRef<Path>) -> Result<Self, DflError> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root).map_err(|e| {
            log::error!("dfl: cannot open sysfs root {}: {}", root.display(), e);
            DflError::NotFound
        })?;
        if !canonical.is_dir() {
            log::error!("dfl: sysfs root {} is not a directory", root.display());
            return Err(DflError::NotFound);
        }
        Ok(Self { root: canonical })
    }

    /// 规范化后的根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 打开设备，返回具体类型的句柄
    pub fn open(&self, path: &Path) -> Result<SysfsDevice, DflError> {
        SysfsDevice::open(&self.root, path)
    }

    /// 读取 `dirs` 中所有条目并规范化，排序去重
    fn collect_entries(dirs: &[PathBuf]) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = dirs
            .iter()
            .flat_map(|dir| list_dir(dir))
            .filter_map(|entry| fs::canonicalize(entry).ok())
            .collect();
        found.sort();
        found.dedup();
        found
    }
}

impl Registry for SysfsRegistry {
    fn device_from_syspath(&self, path: &Path) -> Result<Arc<dyn RegistryDevice>, DflError> {
        Ok(Arc::new(self.open(path)?))
    }

    fn scan_property(&self, key: &str, values: &[&str]) -> Result<Vec<PathBuf>, DflError> {
        let mut dirs: Vec<PathBuf> = list_dir(&self.root.join("bus"))
            .into_iter()
            .map(|bus| bus.join("devices"))
            .collect();
        dirs.extend(list_dir(&self.root.join("class")));

        let matched = Self::collect_entries(&dirs)
            .into_iter()
            .filter(|path| match self.open(path) {
                Ok(dev) => dev
                    .property(key)
                    .is_some_and(|v| values.contains(&v.as_str())),
                Err(_) => false,
            })
            .collect();
        Ok(matched)
    }

    fn scan_subsystem(&self, subsystem: &str) -> Result<Vec<PathBuf>, DflError> {
        let dirs = [
            self.root.join("class").join(subsystem),
            self.root.join("bus").join(subsystem).join("devices"),
        ];
        let matched = Self::collect_entries(&dirs)
            .into_iter()
            .filter(|path| self.open(path).is_ok())
            .collect();
        Ok(matched)
    }
}

/// sysfs 设备句柄
///
/// 属性值在第一次读取后缓存在句柄内；写属性时同步更新缓存。
#[derive(Debug)]
pub struct SysfsDevice {
    root: PathBuf,
    syspath: PathBuf,
    sysname: String,
    subsystem: Option<String>,
    driver: Option<String>,
    devnum: u64,
    cache: SpinLock<BTreeMap<String, String>>,
}

impl SysfsDevice {
    fn open(root: &Path, path: &Path) -> Result<Self, DflError> {
        let syspath = fs::canonicalize(path).map_err(|_| DflError::NotFound)?;
        if !syspath.starts_with(root) || !syspath.join(attr::UEVENT).is_file() {
            return Err(DflError::NotFound);
        }
        let sysname = file_name(&syspath).ok_or(DflError::NotFound)?;
        let subsystem = link_name(&syspath.join("subsystem"));
        let driver = link_name(&syspath.join("driver"));
        let devnum = read_attr_file(&syspath.join(attr::DEV))
            .and_then(|dev| parse_dev(&dev))
            .or_else(|| uevent_devnum(&syspath))
            .unwrap_or(0);

        Ok(Self {
            root: root.to_path_buf(),
            syspath,
            sysname,
            subsystem,
            driver,
            devnum,
            cache: SpinLock::new(BTreeMap::new()),
        })
    }

    /// 读取设备属性（`DRIVER`、`SUBSYSTEM` 或 `uevent` 中的键值）
    pub fn property(&self, key: &str) -> Option<String> {
        match key {
            DRIVER_PROPERTY => self.driver.clone(),
            SUBSYSTEM_PROPERTY => self.subsystem.clone(),
            _ => read_uevent(&self.syspath)
                .into_iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
        }
    }
}

impl RegistryDevice for SysfsDevice {
    fn syspath(&self) -> &Path {
        &self.syspath
    }

    fn sysname(&self) -> &str {
        &self.sysname
    }

    fn subsystem(&self) -> Option<&str> {
        self.subsystem.as_deref()
    }

    fn driver(&self) -> Option<&str> {
        self.driver.as_deref()
    }

    fn devnum(&self) -> u64 {
        self.devnum
    }

    fn parent(&self) -> Option<Arc<dyn RegistryDevice>> {
        let mut dir = self.syspath.parent();
        while let Some(candidate) = dir {
            if candidate == self.root || !candidate.starts_with(&self.root) {
                return None;
            }
            if candidate.join(attr::UEVENT).is_file() {
                return SysfsDevice::open(&self.root, candidate)
                    .ok()
                    .map(|dev| Arc::new(dev) as Arc<dyn RegistryDevice>);
            }
            dir = candidate.parent();
        }
        None
    }

    fn sysattr_value(&self, name: &str) -> Option<String> {
        if let Some(value) = self.cache.lock().get(name) {
            return Some(value.clone());
        }
        let value = read_sysattr(&self.syspath, name)?;
        self.cache.lock().insert(name.to_string(), value.clone());
        Some(value)
    }

    fn set_sysattr_value(&self, name: &str, value: &str) -> Result<(), DflError> {
        let path = self.syspath.join(name);
        let meta = fs::symlink_metadata(&path).map_err(|e| io_error(&path, e))?;
        if !meta.is_file() {
            log::error!("dfl: {} is not an attribute file", path.display());
            return Err(DflError::InvalidParam);
        }
        let mut file = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| io_error(&path, e))?;
        file.write_all(value.as_bytes())
            .map_err(|e| io_error(&path, e))?;

        self.cache
            .lock()
            .insert(name.to_string(), value.trim_end().to_string());
        Ok(())
    }

    fn sysattr_names(&self) -> Result<Vec<String>, DflError> {
        let entries = sorted_entries(&self.syspath).map_err(|e| io_error(&self.syspath, e))?;
        let mut names = Vec::new();
        for (name, path, file_type) in entries {
            if file_type.is_file() {
                names.push(name);
            } else if file_type.is_dir() && !is_child_device(&path) {
                // 属性组只展开一层
                for (leaf, _, leaf_type) in sorted_entries(&path).unwrap_or_default() {
                    if leaf_type.is_file() {
                        names.push(format!("{}/{}", name, leaf));
                    }
                }
            }
        }
        Ok(names)
    }
}

/// 属性组里也可能有名为 `uevent` 的属性，只凭它不能判定子设备
fn is_child_device(dir: &Path) -> bool {
    dir.join(attr::UEVENT).is_file()
        && fs::symlink_metadata(dir.join("subsystem")).is_ok_and(|m| m.file_type().is_symlink())
}

fn io_error(path: &Path, err: io::Error) -> DflError {
    log::error!("dfl: {}: {}", path.display(), err);
    match err.kind() {
        io::ErrorKind::NotFound => DflError::NotFound,
        _ => DflError::Exception,
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn link_name(link: &Path) -> Option<String> {
    file_name(&fs::read_link(link).ok()?)
}

fn list_dir(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(entries) => entries.flatten().map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<(String, PathBuf, fs::FileType)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        entries.push((
            entry.file_name().to_string_lossy().into_owned(),
            entry.path(),
            file_type,
        ));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// 读取一个属性文件（最多一页），去掉结尾空白
fn read_attr_file(path: &Path) -> Option<String> {
    let file = fs::File::open(path).ok()?;
    let mut buf = Vec::new();
    file.take(PAGE_SIZE as u64).read_to_end(&mut buf).ok()?;
    Some(String::from_utf8_lossy(&buf).trim_end().to_string())
}

fn read_sysattr(syspath: &Path, name: &str) -> Option<String> {
    let path = syspath.join(name);
    let meta = fs::symlink_metadata(&path).ok()?;
    if meta.file_type().is_symlink() {
        return if LINK_ATTRS.contains(&name) {
            link_name(&path)
        } else {
            None
        };
    }
    if !meta.is_file() {
        return None;
    }
    read_attr_file(&path)
}

fn read_uevent(syspath: &Path) -> Vec<(String, String)> {
    read_attr_file(&syspath.join(attr::UEVENT))
        .map(|text| {
            text.lines()
                .filter_map(|line| line.split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn uevent_devnum(syspath: &Path) -> Option<u64> {
    let props = read_uevent(syspath);
    let get = |key: &str| {
        props
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.parse::<u32>().ok())
    };
    Some(makedev(get("MAJOR")?, get("MINOR")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::SysfsFixture;

    fn fixture_with_device() -> (SysfsFixture, PathBuf) {
        let fx = SysfsFixture::new().unwrap();
        let dev = fx.add_device("devices/platform/foo.0").unwrap();
        (fx, dev)
    }

    #[test]
    fn test_open_requires_uevent() {
        let (fx, _dev) = fixture_with_device();
        let registry = SysfsRegistry::new(fx.root()).unwrap();
        // devices/platform 没有 uevent，不是设备
        assert_eq!(
            registry.open(&fx.path("devices/platform")).unwrap_err(),
            DflError::NotFound
        );
        assert_eq!(
            registry.open(&fx.path("devices/missing")).unwrap_err(),
            DflError::NotFound
        );
    }

    #[test]
    fn test_open_outside_root_is_not_found() {
        let (fx, _dev) = fixture_with_device();
        let other = SysfsFixture::new().unwrap();
        let foreign = other.add_device("devices/bar.0").unwrap();
        let registry = SysfsRegistry::new(fx.root()).unwrap();
        assert_eq!(registry.open(&foreign).unwrap_err(), DflError::NotFound);
    }

    #[test]
    fn test_driver_subsystem_and_devnum() {
        let (fx, dev) = fixture_with_device();
        fx.bind_driver(&dev, "platform", "foo-drv").unwrap();
        fx.write_attr(&dev, "dev", "240:7\n").unwrap();
        let registry = SysfsRegistry::new(fx.root()).unwrap();
        let handle = registry.open(&dev).unwrap();
        assert_eq!(handle.sysname(), "foo.0");
        assert_eq!(handle.driver(), Some("foo-drv"));
        assert_eq!(handle.subsystem(), Some("platform"));
        assert_eq!(handle.devnum(), makedev(240, 7));
        assert_eq!(handle.property("DRIVER").as_deref(), Some("foo-drv"));
        assert_eq!(handle.sysattr_value("driver").as_deref(), Some("foo-drv"));
    }

    #[test]
    fn test_devnum_from_uevent() {
        let (fx, dev) = fixture_with_device();
        fx.write_attr(&dev, "uevent", "MAJOR=10\nMINOR=135\n").unwrap();
        let registry = SysfsRegistry::new(fx.root()).unwrap();
        let handle = registry.open(&dev).unwrap();
        assert_eq!(handle.devnum(), makedev(10, 135));
        assert_eq!(handle.property("MINOR").as_deref(), Some("135"));
    }

    #[test]
    fn test_parent_skips_plain_directories() {
        let fx = SysfsFixture::new().unwrap();
        let top = fx.add_device("devices/top").unwrap();
        let child = fx.add_device("devices/top/group/inner/child").unwrap();
        let registry = SysfsRegistry::new(fx.root()).unwrap();
        let handle = registry.open(&child).unwrap();
        let parent = handle.parent().unwrap();
        assert_eq!(parent.syspath(), top.as_path());
        assert!(parent.parent().is_none());
    }

    #[test]
    fn test_sysattr_cache_and_set() {
        let (fx, dev) = fixture_with_device();
        fx.write_attr(&dev, "value", "1\n").unwrap();
        let registry = SysfsRegistry::new(fx.root()).unwrap();
        let handle = registry.open(&dev).unwrap();
        assert_eq!(handle.sysattr_value("value").as_deref(), Some("1"));

        // 文件被外部修改后，缓存值保持不变
        fx.write_attr(&dev, "value", "2\n").unwrap();
        assert_eq!(handle.sysattr_value("value").as_deref(), Some("1"));

        handle.set_sysattr_value("value", "3\n").unwrap();
        assert_eq!(handle.sysattr_value("value").as_deref(), Some("3"));
        assert_eq!(fs::read_to_string(dev.join("value")).unwrap(), "3\n");
    }

    #[test]
    fn test_set_missing_attr_fails() {
        let (fx, dev) = fixture_with_device();
        let registry = SysfsRegistry::new(fx.root()).unwrap();
        let handle = registry.open(&dev).unwrap();
        assert_eq!(
            handle.set_sysattr_value("nope", "1"),
            Err(DflError::NotFound)
        );
        assert!(handle.sysattr_value("nope").is_none());
    }

    #[test]
    fn test_sysattr_names_expand_groups_once() {
        let (fx, dev) = fixture_with_device();
        fx.write_attr(&dev, "b_attr", "1").unwrap();
        fx.write_attr(&dev, "a_attr", "1").unwrap();
        fx.write_attr(&dev, "errors/first", "0").unwrap();
        fx.write_attr(&dev, "errors/deep/nested", "0").unwrap();
        let child = fx.add_device("devices/platform/foo.0/child.0").unwrap();
        fx.join_class(&child, "widget").unwrap();
        fx.bind_driver(&dev, "platform", "foo-drv").unwrap();

        let registry = SysfsRegistry::new(fx.root()).unwrap();
        let names = registry.open(&dev).unwrap().sysattr_names().unwrap();
        assert_eq!(names, ["a_attr", "b_attr", "errors/first", "uevent"]);
    }

    #[test]
    fn test_group_with_uevent_leaf_is_listed() {
        let (fx, dev) = fixture_with_device();
        for leaf in ["clear", "overflow", "uevent", "fatal"] {
            fx.write_attr(&dev, &format!("errors/{}", leaf), "0").unwrap();
        }
        // 只有 uevent 没有 subsystem 链接的目录仍是属性组
        fx.add_device("devices/platform/foo.0/region.0").unwrap();

        let registry = SysfsRegistry::new(fx.root()).unwrap();
        let names = registry.open(&dev).unwrap().sysattr_names().unwrap();
        assert_eq!(
            names,
            [
                "errors/clear",
                "errors/fatal",
                "errors/overflow",
                "errors/uevent",
                "region.0/uevent",
                "uevent",
            ]
        );
    }

    #[test]
    fn test_scan_property_and_subsystem() {
        let fx = SysfsFixture::new().unwrap();
        let a = fx.add_device("devices/a.0").unwrap();
        let b = fx.add_device("devices/b.0").unwrap();
        let c = fx.add_device("devices/c.0").unwrap();
        fx.bind_driver(&a, "platform", "drv-a").unwrap();
        fx.bind_driver(&b, "platform", "drv-b").unwrap();
        fx.join_class(&c, "widget").unwrap();

        let registry = SysfsRegistry::new(fx.root()).unwrap();
        let found = registry
            .scan_property("DRIVER", &["drv-b", "drv-a"])
            .unwrap();
        assert_eq!(found, [a, b]);
        assert_eq!(registry.scan_subsystem("widget").unwrap(), [c]);
        assert!(registry.scan_subsystem("none").unwrap().is_empty());
        assert!(registry.scan_property("DRIVER", &["drv-x"]).unwrap().is_empty());
    }
}
