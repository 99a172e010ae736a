//! 临时目录中的 sysfs Mock 树
//!
//! 目录布局遵循 Linux sysfs 约定：
//!
//! - `devices/...` 下每个设备是一个带 `uevent` 文件的目录
//! - 属性是设备目录下的普通文件，属性组是不带 `uevent` 的子目录
//! - `driver` / `subsystem` 是指向 `bus/<bus>/drivers/<drv>` / `bus/<bus>` 或 `class/<class>` 的符号链接
//! - `bus/<bus>/devices/<name>` 与 `class/<class>/<name>` 是指回设备目录的符号链接

use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_FIXTURE: AtomicUsize = AtomicUsize::new(0);

/// 一棵临时 sysfs 树，Drop 时删除整个目录
pub struct SysfsFixture {
    root: PathBuf,
}

impl SysfsFixture {
    /// 在系统临时目录下创建一棵空的 sysfs 树
    pub fn new() -> io::Result<Self> {
        let seq = NEXT_FIXTURE.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "dfl-sysfs-{}-{}",
            std::process::id(),
            seq
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(dir.join("devices"))?;
        fs::create_dir_all(dir.join("bus"))?;
        fs::create_dir_all(dir.join("class"))?;
        // 规范化一次，保证与后端 canonicalize 后的路径可以直接比较
        let root = fs::canonicalize(&dir)?;
        Ok(Self { root })
    }

    /// sysfs 根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 相对根目录的路径
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel.trim_start_matches('/'))
    }

    /// 创建设备目录（含 `uevent`），返回其绝对路径
    pub fn add_device(&self, rel: &str) -> io::Result<PathBuf> {
        let dev = self.path(rel);
        fs::create_dir_all(&dev)?;
        let uevent = dev.join("uevent");
        if !uevent.exists() {
            let name = dev
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            fs::write(uevent, format!("OF_NAME={}\n", name))?;
        }
        Ok(dev)
    }

    /// 写属性文件，`name` 可以带一级属性组前缀（如 `errors/overflow`）
    pub fn write_attr(&self, dev: &Path, name: &str, value: &str) -> io::Result<()> {
        let path = dev.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, value)
    }

    /// 删除属性文件
    pub fn remove_attr(&self, dev: &Path, name: &str) -> io::Result<()> {
        fs::remove_file(dev.join(name))
    }

    /// 将设备绑定到 `bus` 总线上的 `driver` 驱动，同时设置 subsystem 并登记到总线设备列表
    pub fn bind_driver(&self, dev: &Path, bus: &str, driver: &str) -> io::Result<()> {
        let drv_dir = self.path(&format!("bus/{}/drivers/{}", bus, driver));
        fs::create_dir_all(&drv_dir)?;
        replace_symlink(&drv_dir, &dev.join("driver"))?;
        self.join_bus(dev, bus)
    }

    /// 设置 subsystem 为总线 `bus`，并在 `bus/<bus>/devices/` 下登记
    pub fn join_bus(&self, dev: &Path, bus: &str) -> io::Result<()> {
        let bus_dir = self.path(&format!("bus/{}", bus));
        let devices = bus_dir.join("devices");
        fs::create_dir_all(&devices)?;
        replace_symlink(&bus_dir, &dev.join("subsystem"))?;
        replace_symlink(dev, &devices.join(sysname(dev)))
    }

    /// 设置 subsystem 为设备类 `class`，并在 `class/<class>/` 下登记
    pub fn join_class(&self, dev: &Path, class: &str) -> io::Result<()> {
        let class_dir = self.path(&format!("class/{}", class));
        fs::create_dir_all(&class_dir)?;
        replace_symlink(&class_dir, &dev.join("subsystem"))?;
        replace_symlink(dev, &class_dir.join(sysname(dev)))
    }
}

impl Drop for SysfsFixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn sysname(dev: &Path) -> String {
    dev.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn replace_symlink(target: &Path, link: &Path) -> io::Result<()> {
    if fs::symlink_metadata(link).is_ok() {
        fs::remove_file(link)?;
    }
    symlink(target, link)
}
