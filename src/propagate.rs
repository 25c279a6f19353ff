use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::model::{CMDEXEC_FIELD, CopiedField, IMAGE_FIELD, IMG_DSPATH_PLACEHOLDER, name_prefix};
use crate::store::ConfigStore;

/// Forward-slash form of a dataset-relative offset.
pub fn offset_str(offset: &Path) -> String {
    offset.to_string_lossy().replace('\\', "/")
}

/// Prefix a source-relative path with the offset into the target dataset.
pub fn join_offset(offset: &str, value: &str) -> String {
    if offset.is_empty() {
        value.to_string()
    } else {
        format!("{}/{}", offset, value.trim_start_matches("./"))
    }
}

/// Rewrite one field value so it stays valid when read from the target dataset.
///
/// `cmdexec` keeps its leading placeholder (expanded at run time) and gets the
/// offset spliced in right after it; a `cmdexec` without the placeholder is
/// copied verbatim. Every other field is treated as a relative path.
pub fn offset_value(field: &str, value: &str, offset: &str) -> String {
    if field == CMDEXEC_FIELD {
        let lead = format!("{}/", IMG_DSPATH_PLACEHOLDER);
        return match value.strip_prefix(&lead) {
            Some(rest) => format!("{}{}", lead, join_offset(offset, rest)),
            None => value.to_string(),
        };
    }
    join_offset(offset, value)
}

/// Escape `s` for use inside a POSIX extended regular expression.
fn ere_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if ".[]{}()\\*+?^$|".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Key pattern selecting every field of container `name`.
pub fn fields_pattern(name: &str) -> String {
    format!("^{}", ere_escape(&name_prefix(name)))
}

/// Copy all fields of container `name` except `image` from `source` to `target`.
pub fn propagate_fields(
    name: &str,
    source: &dyn ConfigStore,
    target: &mut dyn ConfigStore,
    offset: &Path,
) -> Result<Vec<CopiedField>> {
    let prefix = name_prefix(name);
    let offset = offset_str(offset);
    let mut copied = Vec::new();

    for (key, value) in source.get_regexp(&fields_pattern(name))? {
        let Some(field) = key.strip_prefix(&prefix) else {
            continue;
        };
        if field == IMAGE_FIELD {
            continue;
        }
        let value = offset_value(field, &value, &offset);
        debug!(%key, %value, "copy field");
        target.set(&key, &value)?;
        copied.push(CopiedField { key, value });
    }

    Ok(copied)
}

#[cfg(test)]
#[path = "tests/propagate_tests.rs"]
mod tests;
