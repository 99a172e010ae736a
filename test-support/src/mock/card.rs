//! FPGA 卡片布局
//!
//! 按真实 DFL 驱动在 sysfs 中呈现的结构构造一张卡：
//!
//! ```text
//! devices/pci0000:00/0000:00:02.0/<bdf>            driver -> dfl-pci
//! └── fpga_region/region<2i>                        class fpga_region
//!     ├── dfl-fme.<i>                               driver -> dfl-fme
//!     │   └── dfl-fme-region.<i>/fpga_region/region<2i+1>   bus platform / compat_id
//!     └── dfl-port.<8i+k>                           driver -> dfl-port
//! ```

use std::io;
use std::path::PathBuf;

use super::sysfs::SysfsFixture;

/// 卡片上 FME 的 compat_id
pub const COMPAT_ID: &str = "f3c9941350fb5be6b6f3a6ab17e4c4a2";
/// 端口上加载的 AFU 的 afu_id
pub const AFU_ID: &str = "d8424dc4a4a3c413f89e433683f9040b";
/// FME 的 bitstream_id
pub const BITSTREAM_ID: &str = "0x2300011001030f";
/// PCI vendor id
pub const VENDOR_ID: u16 = 0x8086;
/// PCI device id
pub const DEVICE_ID: u16 = 0x0b30;
/// FME 字符设备 major 号
pub const FME_MAJOR: u32 = 508;
/// 端口字符设备 major 号
pub const PORT_MAJOR: u32 = 509;

/// 构造出的卡片中各设备目录的绝对路径
#[derive(Debug, Clone)]
pub struct CardLayout {
    /// PCI 设备（驱动 dfl-pci）
    pub pci: PathBuf,
    /// FME 与端口所在的 region
    pub region: PathBuf,
    /// FME 设备
    pub fme: PathBuf,
    /// FME 下带 compat_id 的静态 region
    pub fme_region: PathBuf,
    /// 端口设备，按 minor 顺序
    pub ports: Vec<PathBuf>,
}

/// 在 `fx` 中构造第 `index` 张卡，PCI 地址为 `bdf`，带 `num_ports` 个端口
pub fn build_card(
    fx: &SysfsFixture,
    index: usize,
    bdf: &str,
    num_ports: usize,
) -> io::Result<CardLayout> {
    let pci = fx.add_device(&format!("devices/pci0000:00/0000:00:02.0/{}", bdf))?;
    fx.write_attr(&pci, "vendor", &format!("0x{:04x}\n", VENDOR_ID))?;
    fx.write_attr(&pci, "device", &format!("0x{:04x}\n", DEVICE_ID))?;
    fx.write_attr(&pci, "numa_node", "0\n")?;
    fx.bind_driver(&pci, "pci", "dfl-pci")?;

    let region = fx.add_device(&format!(
        "{}/fpga_region/region{}",
        rel(fx, &pci),
        2 * index
    ))?;
    fx.join_class(&region, "fpga_region")?;

    let fme = region.join(format!("dfl-fme.{}", index));
    fx.add_device(&rel(fx, &fme))?;
    fx.bind_driver(&fme, "dfl", "dfl-fme")?;
    fx.write_attr(&fme, "dev", &format!("{}:{}\n", FME_MAJOR, index))?;
    fx.write_attr(&fme, "numa_node", "0\n")?;
    fx.write_attr(&fme, "ports_num", &format!("{}\n", num_ports))?;
    fx.write_attr(&fme, "bitstream_id", &format!("{}\n", BITSTREAM_ID))?;
    fx.write_attr(&fme, "bitstream_metadata", "0x1192023264\n")?;
    fx.write_attr(&fme, "errors/revision", "1\n")?;
    fx.write_attr(&fme, "errors/clear", "")?;
    fx.write_attr(&fme, "errors/catfatal_errors", "0x0\n")?;
    fx.write_attr(&fme, "errors/first_error", "0x0\n")?;
    fx.write_attr(&fme, "errors/nonfatal_errors", "0x0\n")?;

    let fme_region = fx.add_device(&format!(
        "{}/dfl-fme-region.{}/fpga_region/region{}",
        rel(fx, &fme),
        index,
        2 * index + 1
    ))?;
    let fme_region_dev = fx.add_device(&format!("{}/dfl-fme-region.{}", rel(fx, &fme), index))?;
    fx.join_bus(&fme_region_dev, "platform")?;
    fx.join_class(&fme_region, "fpga_region")?;
    fx.write_attr(&fme_region, "compat_id", &format!("{}\n", COMPAT_ID))?;

    let mut ports = Vec::with_capacity(num_ports);
    for k in 0..num_ports {
        let minor = 8 * index + k;
        let port = region.join(format!("dfl-port.{}", minor));
        fx.add_device(&rel(fx, &port))?;
        fx.bind_driver(&port, "dfl", "dfl-port")?;
        fx.write_attr(&port, "dev", &format!("{}:{}\n", PORT_MAJOR, minor))?;
        fx.write_attr(&port, "numa_node", "0\n")?;
        fx.write_attr(&port, "afu_id", &format!("{}\n", AFU_ID))?;
        fx.write_attr(&port, "errors/revision", "1\n")?;
        fx.write_attr(&port, "errors/clear", "")?;
        fx.write_attr(&port, "errors/errors", "0x0\n")?;
        fx.write_attr(&port, "errors/first_error", "0x0\n")?;
        fx.write_attr(&port, "errors/first_malformed_req", "0x0\n")?;
        ports.push(port);
    }

    Ok(CardLayout {
        pci,
        region,
        fme,
        fme_region,
        ports,
    })
}

fn rel(fx: &SysfsFixture, path: &std::path::Path) -> String {
    path.strip_prefix(fx.root())
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
