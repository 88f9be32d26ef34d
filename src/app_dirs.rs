use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "typerush";

/// Where typerush keeps its files, per platform conventions
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    /// Settings live with the user's configuration
    pub fn config_path() -> Option<PathBuf> {
        Self::project().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Results and telemetry are machine-local state
    pub fn db_path() -> Option<PathBuf> {
        Self::project().map(|dirs| dirs.data_local_dir().join("stats.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_share_the_project_namespace() {
        let (Some(config), Some(db)) = (AppDirs::config_path(), AppDirs::db_path()) else {
            // no home directory to resolve against
            return;
        };
        assert!(config.ends_with("config.json"));
        assert!(db.ends_with("stats.db"));
        assert!(config.to_string_lossy().contains(APP_NAME));
        assert!(db.to_string_lossy().contains(APP_NAME));
    }
}
