//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions
            .extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Source folder does not exist
    pub fn path_not_found(path: &Path) -> Self {
        Self::new(format!("Path does not exist: {}", path.display()))
            .with_context("The folder to process was not found")
            .with_suggestions([
                format!("TRY: Check that the path exists: ls -la {}", path.display()),
                "TRY: Pass the incoming folder with --path, or set incoming_dir in the config file"
                    .to_string(),
            ])
    }

    /// Source is a file, not a folder
    pub fn not_a_directory(path: &Path) -> Self {
        Self::new(format!("Not a directory: {}", path.display()))
            .with_context("process expects a folder of MED_DATA_*.csv files")
            .with_suggestions([format!(
                "TRY: Use the parent folder: {}",
                path.parent().unwrap_or(path).display()
            )])
    }

    /// Config file could not be loaded
    pub fn bad_config(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot load config: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Check the file is valid TOML".to_string(),
                "TRY: Omit --config to run with the built-in defaults".to_string(),
            ])
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_path_not_found_display() {
        let err = HelpfulError::path_not_found(&PathBuf::from("/no/such/dir"));
        let display = err.to_string();

        assert!(display.starts_with("ERROR: Path does not exist: /no/such/dir"));
        assert!(display.contains("CONTEXT:"));
        assert!(display.contains("TRY: Check that the path exists"));
    }

    #[test]
    fn test_not_a_directory_suggests_parent() {
        let err = HelpfulError::not_a_directory(&PathBuf::from("/data/incoming/file.csv"));
        assert_eq!(err.suggestions, vec!["TRY: Use the parent folder: /data/incoming"]);
    }

    #[test]
    fn test_without_suggestions() {
        let display = HelpfulError::new("boom").to_string();
        assert_eq!(display, "ERROR: boom\n");
    }
}
