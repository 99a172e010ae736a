//! 错误指示属性枚举

use crate::DflError;
use crate::config::{ERRORS_GROUP, RESERVED_ERROR_ATTRS};
use crate::registry::RegistryDevice;

/// 属性名是否是错误指示属性：`errors/<leaf>`，且 leaf 不是保留名
fn is_error_attr(name: &str) -> bool {
    let Some(leaf) = name
        .strip_prefix(ERRORS_GROUP)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return false;
    };
    !leaf.is_empty() && !leaf.contains('/') && !RESERVED_ERROR_ATTRS.contains(&leaf)
}

/// 列出设备的错误指示属性（完整属性名，如 `errors/overflow`），顺序与属性枚举顺序一致
///
/// 任何一项分配失败都会丢弃已收集的结果并返回 [`DflError::Resource`]。
pub fn list_errors(handle: &dyn RegistryDevice) -> Result<Vec<String>, DflError> {
    let names = handle.sysattr_names()?;
    let mut errors = Vec::new();
    for name in names.into_iter().filter(|n| is_error_attr(n)) {
        errors.try_reserve(1).map_err(|e| {
            log::error!("dfl: {}: out of memory listing errors", handle.sysname());
            DflError::from(e)
        })?;
        errors.push(name);
    }
    Ok(errors)
}
