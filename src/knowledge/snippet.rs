//! Static knowledge text, fixed for the lifetime of the process.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;

/// Resolve the snippet once at startup: the file wins over inline text.
/// Blank text counts as no snippet.
pub fn load_snippet(config: &Config) -> Result<Option<String>> {
    let text = match &config.knowledge_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read knowledge file {}", path.display()))?;
            info!("Loaded knowledge snippet from {} ({} bytes)", path.display(), text.len());
            Some(text)
        }
        None => config.knowledge.clone(),
    };

    Ok(text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  Bach wrote the Goldberg Variations.  ").unwrap();

        let config = Config {
            knowledge: Some("inline".into()),
            knowledge_file: Some(file.path().to_path_buf()),
            ..Config::default()
        };
        assert_eq!(
            load_snippet(&config).unwrap().as_deref(),
            Some("Bach wrote the Goldberg Variations.")
        );
    }

    #[test]
    fn test_inline_and_blank() {
        let inline = Config {
            knowledge: Some("Vinyl spins at 33 rpm.".into()),
            ..Config::default()
        };
        assert_eq!(load_snippet(&inline).unwrap().as_deref(), Some("Vinyl spins at 33 rpm."));

        let blank = Config {
            knowledge: Some("   ".into()),
            ..Config::default()
        };
        assert!(load_snippet(&blank).unwrap().is_none());
        assert!(load_snippet(&Config::default()).unwrap().is_none());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let config = Config {
            knowledge_file: Some("/no/such/knowledge.txt".into()),
            ..Config::default()
        };
        assert!(load_snippet(&config).is_err());
    }
}
