//! PCI 地址解析
//!
//! 设备名形如 `SSSS:BB:DD.F`：4 位十六进制 segment、2 位十六进制 bus、
//! 2 位十六进制 device、1 位十进制 function。十六进制不区分大小写，
//! 取名字中第一个符合该形式的子串。

use core::fmt;

use crate::DflError;

/// `SSSS:BB:DD.F` 的长度
const BDF_LEN: usize = 12;

/// PCI 地址（segment:bus:device.function）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PciAddress {
    /// PCI segment（domain）
    pub segment: u16,
    /// 总线号
    pub bus: u8,
    /// 设备号，5 位
    pub device: u8,
    /// 功能号，3 位
    pub function: u8,
}

impl PciAddress {
    /// device 字段的最大值
    pub const MAX_DEVICE: u8 = 0x1f;
    /// function 字段的最大值
    pub const MAX_FUNCTION: u8 = 0x7;

    /// 从设备名解析 PCI 地址
    ///
    /// 名字中没有 `SSSS:BB:DD.F` 形式的子串，或 device/function 超出位宽时返回
    /// [`DflError::Parse`]。
    pub fn parse(name: &str) -> Result<Self, DflError> {
        let Some(fields) = name.as_bytes().windows(BDF_LEN).find_map(match_bdf) else {
            log::error!("dfl: no PCI address in '{}'", name);
            return Err(DflError::Parse);
        };
        let (segment, bus, device, function) = fields;
        if device > Self::MAX_DEVICE || function > Self::MAX_FUNCTION {
            log::error!("dfl: PCI address out of range in '{}'", name);
            return Err(DflError::Parse);
        }
        Ok(Self {
            segment,
            bus,
            device,
            function,
        })
    }
}

impl fmt::Display for PciAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{}",
            self.segment, self.bus, self.device, self.function
        )
    }
}

fn match_bdf(w: &[u8]) -> Option<(u16, u8, u8, u8)> {
    if w[4] != b':' || w[7] != b':' || w[10] != b'.' {
        return None;
    }
    let segment = hex(&w[0..4])?;
    let bus = hex(&w[5..7])?;
    let device = hex(&w[8..10])?;
    let function = (w[11] as char).to_digit(10)?;
    Some((segment, bus as u8, device as u8, function as u8))
}

fn hex(digits: &[u8]) -> Option<u16> {
    digits.iter().try_fold(0u16, |acc, &c| {
        let d = (c as char).to_digit(16)?;
        Some((acc << 4) | d as u16)
    })
}
