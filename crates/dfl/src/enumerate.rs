//! 设备枚举

use crate::DflError;
use crate::config::{DRIVER_PROPERTY, driver};
use crate::context::DflContext;
use crate::device::DflDevice;

impl DflContext {
    /// 枚举所有驱动为 `dfl-fme` 或 `dfl-port` 的设备
    ///
    /// 扫描与构造在上下文锁内完成。任何一个设备构造失败时，已构造的记录全部丢弃并返回该错误。
    /// 结果顺序即注册表的扫描顺序。
    pub fn enumerate(&self) -> Result<Vec<DflDevice>, DflError> {
        self.locked(|registry| {
            let paths =
                registry.scan_property(DRIVER_PROPERTY, &[driver::DFL_FME, driver::DFL_PORT])?;

            let mut devices = Vec::new();
            devices.try_reserve_exact(paths.len())?;
            for path in &paths {
                match self.open_device(path) {
                    Ok(dev) => devices.push(dev),
                    Err(e) => {
                        log::error!(
                            "dfl: enumeration aborted at {}: {}",
                            path.display(),
                            e
                        );
                        return Err(e);
                    }
                }
            }

            log::debug!("dfl: enumerated {} devices", devices.len());
            Ok(devices)
        })
    }
}
