use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::feedback::tools::error::Result;

/// Writes any serializable value as pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json_string = serde_json::to_string_pretty(value)?;
    fs::write(path, json_string)?;
    Ok(())
}
