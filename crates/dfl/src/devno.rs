//! 设备号编解码
//!
//! 使用 Linux (glibc) 的 64 位 `dev_t` 编码：major 为 32 位，minor 为 32 位，
//! 低 20 位交错存放以兼容旧的 16 位设备号。

/// 由 major/minor 构造设备号
pub const fn makedev(major: u32, minor: u32) -> u64 {
    let major = major as u64;
    let minor = minor as u64;
    ((major & 0xffff_f000) << 32)
        | ((major & 0x0000_0fff) << 8)
        | ((minor & 0xffff_ff00) << 12)
        | (minor & 0x0000_00ff)
}

/// 取设备号的 major 部分
pub const fn major(dev: u64) -> u32 {
    (((dev >> 32) & 0xffff_f000) | ((dev >> 8) & 0x0000_0fff)) as u32
}

/// 取设备号的 minor 部分
pub const fn minor(dev: u64) -> u32 {
    (((dev >> 12) & 0xffff_ff00) | (dev & 0x0000_00ff)) as u32
}

/// 由设备号计算对象 id：major 低 12 位在高位，minor 低 20 位在低位
pub const fn object_id(dev: u64) -> u32 {
    ((major(dev) & 0xfff) << 20) | (minor(dev) & 0xfffff)
}

/// 解析 `MAJOR:MINOR` 形式的设备号文本
pub(crate) fn parse_dev(text: &str) -> Option<u64> {
    let (maj, min) = text.trim().split_once(':')?;
    Some(makedev(maj.parse().ok()?, min.parse().ok()?))
}
