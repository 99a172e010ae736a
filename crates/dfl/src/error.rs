//! 设备发现错误类型
//!
//! 可通过 [`DflError::to_fpga_result()`] 转换为 OPAE 的 `fpga_result` 数值。

use core::fmt;
use std::collections::TryReserveError;

/// 设备发现错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DflError {
    /// 参数无效，或对错误类型的设备调用了操作
    InvalidParam,
    /// 属性、兄弟设备、父设备或路径不存在
    NotFound,
    /// 整数、GUID 或 PCI 地址文本格式错误
    Parse,
    /// 内存分配失败
    Resource,
    /// 找不到 PCI 或 region 祖先设备
    Topology,
    /// 设备名既不是根设备也不是加速器
    UnrecognizedDevice,
    /// 其他意外失败（I/O 错误、写属性失败等）
    Exception,
}

impl DflError {
    /// 转换为 OPAE `fpga_result` 数值
    ///
    /// 解析、拓扑和设备类型错误在 OPAE 中没有单独的结果码，统一为 `FPGA_EXCEPTION`。
    pub fn to_fpga_result(&self) -> i32 {
        match self {
            DflError::InvalidParam => 1,
            DflError::Exception => 3,
            DflError::Parse => 3,
            DflError::Topology => 3,
            DflError::UnrecognizedDevice => 3,
            DflError::NotFound => 4,
            DflError::Resource => 5,
        }
    }
}

impl fmt::Display for DflError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DflError::InvalidParam => "invalid parameter",
            DflError::NotFound => "not found",
            DflError::Parse => "parse error",
            DflError::Resource => "out of memory",
            DflError::Topology => "missing PCI or region ancestor",
            DflError::UnrecognizedDevice => "unrecognized device",
            DflError::Exception => "unexpected failure",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for DflError {}

impl From<TryReserveError> for DflError {
    fn from(_: TryReserveError) -> Self {
        DflError::Resource
    }
}
