//! DFL 设备记录
//!
//! [`DflDevice`] 由一个 sysfs 路径构造：分类设备名、查找 PCI 与 region 祖先、
//! 解析 PCI 地址与 vendor/device id、读取 NUMA 节点、列出错误属性、计算对象 id。
//! 任何一步失败都不会返回部分构造的记录，已打开的句柄随之释放。

use std::path::Path;
use std::sync::Arc;

use crate::DflError;
use crate::attr::{direct_read_attr, read_attr32, read_attr64, write_attr64};
use crate::config::{attr, sysname};
use crate::context::DflContext;
use crate::devno;
use crate::error_attrs::list_errors;
use crate::pci::PciAddress;
use crate::registry::RegistryDevice;
use crate::topology::{Ancestry, find_sibling_fme, resolve_ancestry};

/// 设备类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// FPGA 管理引擎，卡片的根设备（`dfl-fme.*`）
    Fme,
    /// 加速器端口（`dfl-port.*`）
    Port,
}

impl DeviceKind {
    /// 由设备名判断类型
    pub fn from_sysname(name: &str) -> Option<Self> {
        if name.starts_with(sysname::FME_PREFIX) {
            Some(DeviceKind::Fme)
        } else if name.starts_with(sysname::PORT_PREFIX) {
            Some(DeviceKind::Port)
        } else {
            None
        }
    }
}

/// 一个已发现的 DFL 设备
#[derive(Debug)]
pub struct DflDevice {
    kind: DeviceKind,
    pci_address: PciAddress,
    vendor_id: u16,
    device_id: u16,
    numa_node: u32,
    object_id: u32,
    errors: Vec<String>,
    dev: Arc<dyn RegistryDevice>,
    pci: Arc<dyn RegistryDevice>,
    region: Arc<dyn RegistryDevice>,
}

impl DflContext {
    /// 由 sysfs 路径构造设备记录
    pub fn open_device(&self, path: impl AsRef<Path>) -> Result<DflDevice, DflError> {
        let handle = self.open_handle(path.as_ref())?;
        DflDevice::from_handle(handle)
    }
}

impl DflDevice {
    /// 由已打开的句柄构造设备记录
    pub fn from_handle(dev: Arc<dyn RegistryDevice>) -> Result<Self, DflError> {
        let Some(kind) = DeviceKind::from_sysname(dev.sysname()) else {
            log::error!("dfl: unrecognized object type: {}", dev.sysname());
            return Err(DflError::UnrecognizedDevice);
        };

        let Ancestry { pci, region } = resolve_ancestry(dev.as_ref())?;
        let pci_address = PciAddress::parse(pci.sysname())?;

        let vendor_id = read_id(pci.as_ref(), attr::VENDOR, dev.as_ref())?;
        let device_id = read_id(pci.as_ref(), attr::DEVICE, dev.as_ref())?;

        let numa_node = read_attr32(dev.as_ref(), attr::NUMA_NODE).map_err(|e| {
            log::error!(
                "dfl: {}: error determining NUMA node: {}",
                dev.syspath().display(),
                e
            );
            DflError::Parse
        })?;

        let errors = list_errors(dev.as_ref()).map_err(|e| {
            log::error!(
                "dfl: {}: error parsing error information: {}",
                dev.syspath().display(),
                e
            );
            DflError::Resource
        })?;

        let object_id = devno::object_id(dev.devnum());

        Ok(Self {
            kind,
            pci_address,
            vendor_id,
            device_id,
            numa_node,
            object_id,
            errors,
            dev,
            pci,
            region,
        })
    }

    /// 从同一路径重新构造一份记录，反映注册表的当前状态
    pub fn try_clone(&self, ctx: &DflContext) -> Result<Self, DflError> {
        ctx.open_device(self.syspath())
    }

    /// 同一 region 下的根设备
    ///
    /// 根设备没有父设备；加速器取 region 目录中第一个 `dfl-fme.*` 条目。
    /// 该条目无法构造成设备记录时记录日志并返回 `None`。
    pub fn parent(&self, ctx: &DflContext) -> Result<Option<DflDevice>, DflError> {
        if self.kind == DeviceKind::Fme {
            return Ok(None);
        }
        let Some(path) = find_sibling_fme(self.region_path()) else {
            return Ok(None);
        };
        match ctx.open_device(&path) {
            Ok(fme) => Ok(Some(fme)),
            Err(e) => {
                log::error!(
                    "dfl: {}: cannot build parent {}: {}",
                    self.syspath().display(),
                    path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// 设备类型
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// 所在 PCI 设备的地址
    pub fn pci_address(&self) -> PciAddress {
        self.pci_address
    }

    /// PCI 设备名，如 `0000:3b:00.0`
    pub fn pci_address_string(&self) -> &str {
        self.pci.sysname()
    }

    /// PCI vendor id
    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    /// PCI device id
    pub fn device_id(&self) -> u16 {
        self.device_id
    }

    /// NUMA 节点（内核的 `-1` 读作 `u32::MAX`）
    pub fn numa_node(&self) -> u32 {
        self.numa_node
    }

    /// 由设备号计算的对象 id
    pub fn object_id(&self) -> u32 {
        self.object_id
    }

    /// 错误指示属性名
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// 错误指示属性数量
    pub fn num_errors(&self) -> usize {
        self.errors.len()
    }

    /// 设备句柄
    pub fn handle(&self) -> &dyn RegistryDevice {
        self.dev.as_ref()
    }

    /// 设备路径
    pub fn syspath(&self) -> &Path {
        self.dev.syspath()
    }

    /// PCI 祖先路径
    pub fn pci_path(&self) -> &Path {
        self.pci.syspath()
    }

    /// region 祖先路径
    pub fn region_path(&self) -> &Path {
        self.region.syspath()
    }

    /// 设备号
    pub fn devnum(&self) -> u64 {
        self.dev.devnum()
    }

    /// 读取原始属性值
    pub fn attr(&self, name: &str) -> Option<String> {
        self.dev.sysattr_value(name)
    }

    /// 写原始属性值
    pub fn set_attr(&self, name: &str, value: &str) -> Result<(), DflError> {
        self.dev.set_sysattr_value(name, value)
    }

    /// 读取 64 位数值属性
    pub fn read_attr64(&self, name: &str) -> Result<u64, DflError> {
        read_attr64(self.dev.as_ref(), name)
    }

    /// 以 `0x<hex>\n` 格式写入 64 位数值属性
    pub fn write_attr64(&self, name: &str, value: u64) -> Result<(), DflError> {
        write_attr64(self.dev.as_ref(), name, value)
    }

    /// 绕过缓存直接读取属性文件
    pub fn direct_read_attr(&self, name: &str) -> Result<String, DflError> {
        direct_read_attr(self.dev.as_ref(), name)
    }

    /// 根设备下的端口数量
    pub fn ports_num(&self) -> Result<u32, DflError> {
        self.require(DeviceKind::Fme, attr::PORTS_NUM)?;
        read_attr32(self.dev.as_ref(), attr::PORTS_NUM)
    }

    /// 根设备的 bitstream id
    pub fn bitstream_id(&self) -> Result<u64, DflError> {
        self.require(DeviceKind::Fme, attr::BITSTREAM_ID)?;
        read_attr64(self.dev.as_ref(), attr::BITSTREAM_ID)
    }

    pub(crate) fn require(&self, kind: DeviceKind, what: &str) -> Result<(), DflError> {
        if self.kind != kind {
            log::error!(
                "dfl: {} requires a {:?} device, {} is {:?}",
                what,
                kind,
                self.dev.sysname(),
                self.kind
            );
            return Err(DflError::InvalidParam);
        }
        Ok(())
    }
}

/// 读取 PCI 设备的 16 位 id
fn read_id(
    pci: &dyn RegistryDevice,
    name: &str,
    dev: &dyn RegistryDevice,
) -> Result<u16, DflError> {
    read_attr32(pci, name).map(|v| v as u16).map_err(|e| {
        log::error!(
            "dfl: error parsing {} for device {}: {}",
            name,
            dev.syspath().display(),
            e
        );
        DflError::Parse
    })
}
