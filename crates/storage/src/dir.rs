use std::{env, fs, io, path::PathBuf, process};

use directories::BaseDirs;

/// Resolve and create the application data directory.
///
/// With `ephemeral`, a per-process child directory is created under the OS
/// temporary directory (or under `data_dir` when one is given).
pub fn setup_data_dir(
    app_name: &str,
    data_dir: Option<PathBuf>,
    ephemeral: bool,
) -> io::Result<PathBuf> {
    let directory = if ephemeral {
        let base = data_dir.unwrap_or_else(env::temp_dir);
        base.join(format!("{app_name}-{}", process::id()))
    } else if let Some(data_dir) = data_dir {
        data_dir
    } else {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Base directories not found"))?;
        base_dirs.data_dir().join(app_name)
    };

    if !directory.exists() {
        fs::create_dir_all(&directory)?;
    }
    Ok(directory)
}
