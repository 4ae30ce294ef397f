//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::BookConfig;
use crate::error::BookError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from defaults, global file, workspace file and environment.
    pub fn load(workspace_root: &Path) -> Result<BookConfig, BookError> {
        Ok(MergeService::load(workspace_root)?)
    }

    /// Load from one explicit file with the environment overlay.
    pub fn load_from_file(path: &Path) -> Result<BookConfig, BookError> {
        if !path.is_file() {
            return Err(BookError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        Ok(MergeService::load_from_file(path)?)
    }

    pub fn default() -> BookConfig {
        BookConfig::default()
    }
}
