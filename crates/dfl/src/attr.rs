//! 数值属性读写
//!
//! 读取时优先使用句柄缓存的属性值；缓存中没有或为空时直接读取属性文件（最多一页）。
//! 数值按 `0x`/`0X` 前缀自动识别十六进制，否则为十进制，去掉首尾空白后必须整体可解析。

use std::fs::File;
use std::io::Read;

use crate::DflError;
use crate::config::PAGE_SIZE;
use crate::registry::RegistryDevice;

/// 解析整数文本
///
/// 允许一个 `+`/`-` 符号，负数按 64 位补码回绕（`-1` 即 `u64::MAX`）。
pub(crate) fn parse_u64(text: &str) -> Option<u64> {
    let s = text.trim();
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let value = u64::from_str_radix(digits, radix).ok()?;
    Some(if negative { value.wrapping_neg() } else { value })
}

/// 直接读取属性文件，返回去掉结尾空白的内容
///
/// 文件不存在、读取失败或内容为空时返回 [`DflError::NotFound`]。
pub fn direct_read_attr(handle: &dyn RegistryDevice, name: &str) -> Result<String, DflError> {
    let path = handle.syspath().join(name);
    let mut buf = Vec::new();
    buf.try_reserve_exact(PAGE_SIZE).map_err(|e| {
        log::error!("dfl: cannot allocate read buffer for {}", path.display());
        DflError::from(e)
    })?;

    let file = File::open(&path).map_err(|e| {
        log::debug!("dfl: cannot open {}: {}", path.display(), e);
        DflError::NotFound
    })?;
    if let Err(e) = file.take(PAGE_SIZE as u64).read_to_end(&mut buf) {
        log::debug!("dfl: cannot read {}: {}", path.display(), e);
        return Err(DflError::NotFound);
    }
    if buf.is_empty() {
        return Err(DflError::NotFound);
    }
    Ok(String::from_utf8_lossy(&buf).trim_end().to_string())
}

/// 读取 64 位数值属性
pub fn read_attr64(handle: &dyn RegistryDevice, name: &str) -> Result<u64, DflError> {
    let cached = handle.sysattr_value(name).unwrap_or_default();
    let text = if cached.is_empty() {
        direct_read_attr(handle, name).inspect_err(|_| {
            log::debug!("dfl: {} has no attribute {}", handle.sysname(), name);
        })?
    } else {
        cached
    };
    parse_u64(&text).ok_or_else(|| {
        log::error!(
            "dfl: {}/{}: '{}' is not an integer",
            handle.sysname(),
            name,
            text
        );
        DflError::Parse
    })
}

/// 读取 32 位数值属性（按 64 位解析后截断）
pub fn read_attr32(handle: &dyn RegistryDevice, name: &str) -> Result<u32, DflError> {
    read_attr64(handle, name).map(|v| v as u32)
}

/// 以 `0x<hex>\n` 格式写入 64 位数值属性
pub fn write_attr64(handle: &dyn RegistryDevice, name: &str, value: u64) -> Result<(), DflError> {
    handle
        .set_sysattr_value(name, &format!("0x{:x}\n", value))
        .map_err(|e| {
            log::error!("dfl: failed to write {}/{}: {}", handle.sysname(), name, e);
            DflError::Exception
        })
}
