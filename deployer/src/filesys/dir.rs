//! Directory operations

use std::path::PathBuf;

use tokio::fs;

use crate::errors::DeployerError;
use crate::models::tool::ToolName;

/// A directory wrapper with path
#[derive(Debug, Clone)]
pub struct Dir {
    path: PathBuf,
}

impl Dir {
    /// Create a new directory reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Check if the directory exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// List files in the directory with the given extension
    pub async fn list_files_with_extension(&self, extension: &str) -> Result<Vec<PathBuf>, DeployerError> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let matches = path.extension().is_some_and(|ext| ext == extension);
            if matches && entry.file_type().await?.is_file() {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Tools that have a `<tool>.yaml` component config in this directory
    pub async fn tool_configs(&self) -> Result<Vec<ToolName>, DeployerError> {
        if !self.exists().await {
            return Err(DeployerError::NotFound(format!(
                "config directory {}",
                self.path.display()
            )));
        }

        let mut tools = self
            .list_files_with_extension("yaml")
            .await?
            .iter()
            .filter_map(|path| path.file_stem())
            .map(|stem| ToolName::new(stem.to_string_lossy()))
            .collect::<Result<Vec<_>, _>>()?;
        tools.sort();
        Ok(tools)
    }
}
