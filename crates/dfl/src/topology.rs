//! 拓扑解析
//!
//! 沿父设备链向上查找设备所在的 PCI 设备和 FPGA region，
//! 以及在 region 目录中查找与加速器同属一个 region 的根设备。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::DflError;
use crate::config::{FPGA_REGION_SUBSYSTEM, driver, sysname};
use crate::registry::RegistryDevice;

/// 设备的 PCI 祖先与 region 祖先
pub(crate) struct Ancestry {
    pub pci: Arc<dyn RegistryDevice>,
    pub region: Arc<dyn RegistryDevice>,
}

/// 向上遍历父设备链
///
/// region 取最近的 `fpga_region*` 子系统祖先；遇到第一个驱动为 `dfl-pci*` 的祖先即停止。
pub(crate) fn resolve_ancestry(dev: &dyn RegistryDevice) -> Result<Ancestry, DflError> {
    let mut region = None;
    let mut pci = None;
    let mut cursor = dev.parent();
    while let Some(node) = cursor {
        if node
            .subsystem()
            .is_some_and(|s| s.starts_with(FPGA_REGION_SUBSYSTEM))
        {
            region.get_or_insert_with(|| Arc::clone(&node));
        } else if node.driver().is_some_and(|d| d.starts_with(driver::DFL_PCI)) {
            pci = Some(node);
            break;
        }
        cursor = node.parent();
    }

    match (pci, region) {
        (Some(pci), Some(region)) => Ok(Ancestry { pci, region }),
        _ => {
            log::error!(
                "dfl: {}: cannot find PCI device or region",
                dev.syspath().display()
            );
            Err(DflError::Topology)
        }
    }
}

/// 在 region 目录中查找第一个根设备条目
///
/// 按目录读取顺序取第一个匹配项；目录无法读取时记录日志并返回 `None`。
pub(crate) fn find_sibling_fme(region: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(region) {
        Ok(entries) => entries,
        Err(e) => {
            log::error!("dfl: could not open '{}': {}", region.display(), e);
            return None;
        }
    };
    entries
        .flatten()
        .find(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(sysname::FME_PREFIX))
        })
        .map(|entry| entry.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SysfsRegistry;
    use test_support::{SysfsFixture, build_card};

    #[test]
    fn test_resolve_port_ancestry() {
        let fx = SysfsFixture::new().unwrap();
        let card = build_card(&fx, 0, "0000:3b:00.0", 1).unwrap();
        let registry = SysfsRegistry::new(fx.root()).unwrap();
        let port = registry.open(&card.ports[0]).unwrap();

        let ancestry = resolve_ancestry(&port).unwrap();
        assert_eq!(ancestry.pci.syspath(), card.pci.as_path());
        assert_eq!(ancestry.region.syspath(), card.region.as_path());
    }

    #[test]
    fn test_missing_pci_is_topology_error() {
        let fx = SysfsFixture::new().unwrap();
        let region = fx.add_device("devices/platform/region0").unwrap();
        fx.join_class(&region, "fpga_region").unwrap();
        let fme = fx.add_device("devices/platform/region0/dfl-fme.0").unwrap();
        let registry = SysfsRegistry::new(fx.root()).unwrap();
        let handle = registry.open(&fme).unwrap();
        assert_eq!(
            resolve_ancestry(&handle).err(),
            Some(DflError::Topology)
        );
    }

    #[test]
    fn test_missing_region_is_topology_error() {
        let fx = SysfsFixture::new().unwrap();
        let pci = fx.add_device("devices/pci0000:00/0000:3b:00.0").unwrap();
        fx.bind_driver(&pci, "pci", "dfl-pci").unwrap();
        let fme = fx
            .add_device("devices/pci0000:00/0000:3b:00.0/dfl-fme.0")
            .unwrap();
        let registry = SysfsRegistry::new(fx.root()).unwrap();
        let handle = registry.open(&fme).unwrap();
        assert_eq!(
            resolve_ancestry(&handle).err(),
            Some(DflError::Topology)
        );
    }

    #[test]
    fn test_find_sibling_fme() {
        let fx = SysfsFixture::new().unwrap();
        let card = build_card(&fx, 0, "0000:3b:00.0", 2).unwrap();
        assert_eq!(find_sibling_fme(&card.region), Some(card.fme));
        assert_eq!(find_sibling_fme(&card.pci), None);
        assert_eq!(find_sibling_fme(&fx.path("devices/missing")), None);
    }
}
