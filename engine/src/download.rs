use std::{fs, path::Path};

use color_eyre::{Result, eyre::WrapErr as _};
use log::info;

/// Writes downloaded image bytes to `path`, creating missing parent dirs.
pub fn save_image(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
    info!("Saved {} bytes to {}", data.len(), path.display());
    Ok(())
}
