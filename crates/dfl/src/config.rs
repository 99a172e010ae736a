//! 设备发现配置常量
//!
//! 驱动名、设备命名前缀、属性名等均与内核 DFL 驱动在 sysfs 中呈现的布局一致。

/// sysfs 默认挂载点
pub const SYSFS_ROOT: &str = "/sys";

/// 直接读取属性文件时的读取上限
///
/// 固定为 4 KiB，不随主机页大小变化。
pub const PAGE_SIZE: usize = 4096;

/// 按驱动筛选设备时使用的属性名
pub const DRIVER_PROPERTY: &str = "DRIVER";

/// 设备驱动名
pub mod driver {
    /// FPGA 管理引擎（根设备）驱动
    pub const DFL_FME: &str = "dfl-fme";
    /// 加速器端口驱动
    pub const DFL_PORT: &str = "dfl-port";
    /// FPGA 卡片所在 PCI 设备的驱动（按前缀匹配）
    pub const DFL_PCI: &str = "dfl-pci";
}

/// 设备名前缀（`dfl-fme.*` / `dfl-port.*`）
pub mod sysname {
    /// 根设备名前缀
    pub const FME_PREFIX: &str = "dfl-fme.";
    /// 加速器设备名前缀
    pub const PORT_PREFIX: &str = "dfl-port.";
}

/// FPGA region 所属子系统（按前缀匹配）
pub const FPGA_REGION_SUBSYSTEM: &str = "fpga_region";

/// 属性名
pub mod attr {
    /// 根设备静态区域的 GUID
    pub const COMPAT_ID: &str = "compat_id";
    /// 加速器中 AFU 的 GUID
    pub const AFU_ID: &str = "afu_id";
    /// 根设备的 bitstream id
    pub const BITSTREAM_ID: &str = "bitstream_id";
    /// 根设备下的端口数量
    pub const PORTS_NUM: &str = "ports_num";
    /// NUMA 节点
    pub const NUMA_NODE: &str = "numa_node";
    /// PCI vendor id
    pub const VENDOR: &str = "vendor";
    /// PCI device id
    pub const DEVICE: &str = "device";
    /// 设备号 `MAJOR:MINOR`
    pub const DEV: &str = "dev";
    /// 设备事件描述文件，同时作为“此目录是设备”的标记
    pub const UEVENT: &str = "uevent";
}

/// 错误指示属性所在的属性组
pub const ERRORS_GROUP: &str = "errors";

/// `errors/` 下不是错误指示的属性
pub const RESERVED_ERROR_ATTRS: [&str; 4] = ["clear", "revision", "uevent", "power"];
