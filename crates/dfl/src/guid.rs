//! GUID 解析
//!
//! sysfs 中的 `compat_id` / `afu_id` 是 32 个十六进制字符，每两个字符对应一个字节，
//! 按出现顺序填入 16 字节。

use core::fmt;
use core::str::FromStr;

use crate::DflError;

/// GUID 字节数
pub const GUID_LEN: usize = 16;

/// 16 字节 GUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid(pub [u8; GUID_LEN]);

impl Guid {
    /// GUID 的字节表示
    pub fn as_bytes(&self) -> &[u8; GUID_LEN] {
        &self.0
    }
}

/// 解析 32 个十六进制字符
///
/// 成功时返回 GUID；失败时返回失败前已成功解析的字节数（完全失败为 0）。
/// 前 32 个字符之后的内容被忽略。
pub fn parse_guid(text: &str) -> Result<Guid, usize> {
    let bytes = text.as_bytes();
    let mut guid = [0u8; GUID_LEN];
    for (i, slot) in guid.iter_mut().enumerate() {
        let pair = bytes.get(2 * i..2 * i + 2).ok_or(i)?;
        let hi = (pair[0] as char).to_digit(16).ok_or(i)?;
        let lo = (pair[1] as char).to_digit(16).ok_or(i)?;
        *slot = ((hi << 4) | lo) as u8;
    }
    Ok(Guid(guid))
}

impl FromStr for Guid {
    type Err = DflError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_guid(s).map_err(|parsed| {
            log::error!("dfl: malformed GUID '{}' ({} bytes parsed)", s, parsed);
            DflError::Parse
        })
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AFU_ID: &str = "d8424dc4a4a3c413f89e433683f9040b";

    #[test]
    fn test_parse_guid_byte_order() {
        let guid = parse_guid(AFU_ID).unwrap();
        assert_eq!(
            guid.as_bytes(),
            &[
                0xd8, 0x42, 0x4d, 0xc4, 0xa4, 0xa3, 0xc4, 0x13, 0xf8, 0x9e, 0x43, 0x36, 0x83, 0xf9,
                0x04, 0x0b
            ]
        );
    }

    #[test]
    fn test_parse_guid_upper_case() {
        let lower = parse_guid(AFU_ID).unwrap();
        let upper = parse_guid(&AFU_ID.to_uppercase()).unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_parse_guid_short_reports_parsed_bytes() {
        // 31 个字符：前 15 字节完整，最后一个字节缺一个字符
        assert_eq!(parse_guid(&AFU_ID[..31]), Err(15));
        assert_eq!(parse_guid(""), Err(0));
    }

    #[test]
    fn test_parse_guid_non_hex() {
        assert_eq!(parse_guid("zz424dc4a4a3c413f89e433683f9040b"), Err(0));
        assert_eq!(parse_guid("d8424dc4a4a3c413f89e433683f904xb"), Err(15));
    }

    #[test]
    fn test_from_str_maps_to_parse_error() {
        assert_eq!("not-a-guid".parse::<Guid>(), Err(DflError::Parse));
        assert_eq!(AFU_ID[..31].parse::<Guid>(), Err(DflError::Parse));
    }

    #[test]
    fn test_display_is_lower_hex() {
        let guid: Guid = AFU_ID.to_uppercase().parse().unwrap();
        assert_eq!(guid.to_string(), AFU_ID);
    }
}
