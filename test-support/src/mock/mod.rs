//! Mock 实现模块
//!
//! 注意：这里不直接依赖 `dfl` crate（避免循环依赖）。
//! Mock 以真实目录/文件/符号链接的形式写入临时目录，
//! `dfl` 的 sysfs 后端像读取 `/sys` 一样读取它。

pub mod card;
pub mod sysfs;
