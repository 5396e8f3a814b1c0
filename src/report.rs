use std::path::{Path, PathBuf};

use tracing::info;

use crate::analysis::LabeledText;
use crate::error::Error;

/// Write labeled texts to `dir/name`, creating `dir` when needed.
pub fn write_csv(dir: &Path, name: &str, rows: &[LabeledText]) -> Result<PathBuf, Error> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);

    let mut writer = csv::Writer::from_path(&path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "saved csv");
    Ok(path)
}
