use std::{
    env,
    path::{Path, PathBuf},
};

const DEFAULT_DIR_NAME: &str = ".grocery_budget";
const HOME_ENV: &str = "GROCERY_BUDGET_HOME";

/// Resolves where the tracker keeps its files.
pub struct PathResolver;

impl PathResolver {
    /// `$GROCERY_BUDGET_HOME`, else `~/.grocery_budget`.
    pub fn base_dir() -> PathBuf {
        if let Some(custom) = env::var_os(HOME_ENV) {
            return PathBuf::from(custom);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME)
    }

    /// Joins `name` onto `base` unless it is already absolute.
    pub fn resolve_in(base: &Path, name: &Path) -> PathBuf {
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            base.join(name)
        }
    }
}
