//! FPGA DFL 设备发现
//!
//! 此 crate 通过 sysfs 发现 Linux DFL（Device Feature List）框架下的 FPGA 设备，
//! 并为每个设备构造包含标识、拓扑与元数据的记录，包括：
//!
//! - [`DflContext`] - 持有注册表会话的上下文，提供枚举与按路径构造设备
//! - [`DflDevice`] - 设备记录（根设备 FME 或加速器端口）
//! - [`PciAddress`] - PCI 地址解析
//! - [`Guid`] - `compat_id` / `afu_id` 的 16 字节 GUID
//! - [`list_errors`] - 错误指示属性枚举
//!
//! # 注册表解耦
//!
//! 设备与属性的访问通过 [`Registry`] / [`RegistryDevice`] trait 完成，
//! 默认实现 [`SysfsRegistry`] 直接读取 sysfs 树。
//!
//! # 示例
//! ```no_run
//! let ctx = dfl::DflContext::new();
//! for dev in ctx.enumerate()? {
//!     println!("{:?} {} numa={}", dev.kind(), dev.pci_address(), dev.numa_node());
//! }
//! ctx.finalize();
//! # Ok::<(), dfl::DflError>(())
//! ```

pub mod attr;
pub mod config;
pub mod devno;
pub mod error;
pub mod registry;

mod context;
mod device;
mod enumerate;
mod error_attrs;
mod guid;
mod identity;
mod pci;
mod topology;

// Re-export error
pub use error::DflError;

// Re-export context
pub use context::DflContext;

// Re-export device
pub use device::{DeviceKind, DflDevice};

// Re-export registry
pub use registry::{Registry, RegistryDevice, SysfsDevice, SysfsRegistry};

// Re-export parsers
pub use guid::{GUID_LEN, Guid, parse_guid};
pub use pci::PciAddress;

pub use error_attrs::list_errors;
