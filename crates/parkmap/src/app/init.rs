use cap_std::fs_utf8::{camino::Utf8PathBuf, Dir};
use miette::{Context, IntoDiagnostic, Result};
use parkmap_core::paths::{get_parkmap_dir, get_parkmap_path, open_parent_dir, LOGS_DIR_NAME};
use tracing_appender::non_blocking::WorkerGuard;

use super::config::{ParkmapConfiguration, CONFIG_ENV, CONFIG_FILE_NAME};

fn prepare_log_dir() -> Result<std::path::PathBuf> {
    let dir = get_parkmap_dir()?;
    dir.create_dir_all(LOGS_DIR_NAME)
        .into_diagnostic()
        .wrap_err("failed to create logs directory")?;
    // the rolling appender only takes a path
    Ok(get_parkmap_path()?.join(LOGS_DIR_NAME))
}

/// Logs go to the console and, when the data directory is usable, to a daily file inside it.
pub fn init_tracing() -> Option<WorkerGuard> {
    let log_dir = match prepare_log_dir() {
        Ok(path) => Some(path),
        Err(e) => {
            eprintln!("logging to console only: {e:?}");
            None
        }
    };
    parkmap_core::trace::install_tracing(log_dir.as_deref())
}

/// `--config` first, then `PARKMAP_CONFIG`, then `parkmap.toml` in the data directory.
/// Returns the directory holding the file and the file name inside it.
pub fn config_location(cli_path: Option<Utf8PathBuf>) -> Result<(Dir, String)> {
    let explicit = cli_path.or_else(|| std::env::var(CONFIG_ENV).ok().map(Utf8PathBuf::from));
    match explicit {
        Some(path) => {
            let (dir, file_name) = open_parent_dir(&path)?;
            Ok((dir, file_name.to_string()))
        }
        None => Ok((get_parkmap_dir()?, CONFIG_FILE_NAME.to_string())),
    }
}

pub fn load_configuration(cli_path: Option<Utf8PathBuf>) -> Result<ParkmapConfiguration> {
    let (dir, file_name) = config_location(cli_path)?;
    tracing::debug!(file_name, "loading configuration");
    ParkmapConfiguration::load(&dir, &file_name)
        .wrap_err(file_name)
        .wrap_err("failed to load parkmap configuration")
}
