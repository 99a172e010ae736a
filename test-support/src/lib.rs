//! 测试支持 crate
//!
//! 提供 sysfs Mock 树和 FPGA 卡片布局，用于在主机上测试设备发现逻辑

pub mod mock;

pub use mock::card::{build_card, CardLayout};
pub use mock::sysfs::SysfsFixture;
