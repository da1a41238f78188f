// src/renderer.rs

use crate::error::{FlareError, Result};
use crate::model::FlareNode;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Serializes the tree as pretty JSON with a three-space indent.
pub fn write_json<W: Write>(tree: &FlareNode, mut writer: W) -> Result<()> {
    let formatter = PrettyFormatter::with_indent(b"   ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    tree.serialize(&mut serializer)?;
    writer
        .write_all(b"\n")
        .map_err(|e| FlareError::io("writing flare json", e))?;
    Ok(())
}

/// Writes the tree to `path`, creating parent directories.
pub fn write_flare(tree: &FlareNode, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| FlareError::io(format!("creating {}", parent.display()), e))?;
    }
    let file = File::create(path)
        .map_err(|e| FlareError::io(format!("creating {}", path.display()), e))?;
    let mut writer = BufWriter::new(file);
    write_json(tree, &mut writer)?;
    writer
        .flush()
        .map_err(|e| FlareError::io(format!("writing {}", path.display()), e))?;
    info!("Wrote {}", path.display());
    Ok(())
}
