//! 设备标识
//!
//! 根设备的标识是静态区域的 `compat_id`，位于 PCI 设备下另一个 fpga_region 上；
//! 加速器的标识是其自身的 `afu_id`。

use crate::DflError;
use crate::config::{FPGA_REGION_SUBSYSTEM, attr};
use crate::context::DflContext;
use crate::device::{DeviceKind, DflDevice};
use crate::guid::Guid;

impl DflDevice {
    /// 根设备的 compat id
    ///
    /// 在 `fpga_region` 子系统中查找第一个位于本设备 PCI 路径之下、
    /// 且不是本设备 region 的设备，解析其 `compat_id` 属性。
    pub fn compat_id(&self, ctx: &DflContext) -> Result<Guid, DflError> {
        self.require(DeviceKind::Fme, attr::COMPAT_ID)?;
        let pci_path = self.pci_path();
        let this_region = self.region_path();

        ctx.locked(|registry| {
            let candidates = registry.scan_subsystem(FPGA_REGION_SUBSYSTEM)?;
            let Some(path) = candidates.iter().find(|p| {
                p.as_path() != this_region && p.as_path() != pci_path && p.starts_with(pci_path)
            }) else {
                log::debug!("dfl: no static region below {}", pci_path.display());
                return Err(DflError::NotFound);
            };

            let region = registry.device_from_syspath(path)?;
            let Some(text) = region.sysattr_value(attr::COMPAT_ID) else {
                log::debug!("dfl: {} has no {}", path.display(), attr::COMPAT_ID);
                return Err(DflError::NotFound);
            };
            text.parse()
        })
    }

    /// 加速器的 afu id
    pub fn afu_id(&self) -> Result<Guid, DflError> {
        self.require(DeviceKind::Port, attr::AFU_ID)?;
        let Some(text) = self.attr(attr::AFU_ID) else {
            log::debug!("dfl: {} has no {}", self.syspath().display(), attr::AFU_ID);
            return Err(DflError::NotFound);
        };
        text.parse()
    }

    /// 按设备类型取 compat id 或 afu id
    pub fn guid(&self, ctx: &DflContext) -> Result<Guid, DflError> {
        match self.kind() {
            DeviceKind::Fme => self.compat_id(ctx),
            DeviceKind::Port => self.afu_id(),
        }
    }

    /// 设备标识是否等于 `expected`
    ///
    /// 无法取得标识时视为不相等。
    pub fn guid_matches(&self, ctx: &DflContext, expected: &Guid) -> bool {
        match self.guid(ctx) {
            Ok(guid) => guid == *expected,
            Err(e) => {
                log::debug!(
                    "dfl: {}: cannot resolve identity: {}",
                    self.syspath().display(),
                    e
                );
                false
            }
        }
    }
}
