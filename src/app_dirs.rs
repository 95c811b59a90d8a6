use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "waterquest";

/// Where the game keeps its config and log files
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    /// Falls back to the working directory when no home dir can be found
    pub fn config_path() -> PathBuf {
        match Self::project() {
            Some(dirs) => dirs.config_dir().join("config.json"),
            None => PathBuf::from(format!("{APP_NAME}_config.json")),
        }
    }

    /// XDG-style state dir, `~/.local/state/waterquest/waterquest.log`
    pub fn log_path() -> Option<PathBuf> {
        let file = format!("{APP_NAME}.log");
        match std::env::var_os("HOME") {
            Some(home) => Some(
                PathBuf::from(home)
                    .join(".local/state")
                    .join(APP_NAME)
                    .join(file),
            ),
            None => Self::project().map(|dirs| dirs.data_local_dir().join(file)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_end_with_expected_file_names() {
        assert!(AppDirs::config_path().ends_with("config.json"));
        if let Some(log) = AppDirs::log_path() {
            assert!(log.ends_with("waterquest.log"));
            assert!(log.parent().unwrap().ends_with(APP_NAME));
        }
    }
}
