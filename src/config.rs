use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Parser configuration. The defaults match the layout of the county
/// book-in reports the extractor was written against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Case-sensitive name matching (all-caps, as printed). Disable for
    /// sources that mix case.
    pub name_regex_strict: bool,
    /// Accept the identifier/CID/date combination split across two or
    /// three consecutive lines.
    pub allow_two_line_id_date: bool,
    /// Extra header/footer patterns skipped on top of the built-in set.
    pub header_patterns: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            name_regex_strict: true,
            allow_two_line_id_date: true,
            header_patterns: vec![
                r"^Inmates Booked In.*".to_string(),
                r"^Report Date:.*".to_string(),
                r"^Page\s+\d+.*".to_string(),
            ],
        }
    }
}

impl ParserConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_enables_strict_names_and_split_id_date() {
        let config = ParserConfig::default();
        assert!(config.name_regex_strict);
        assert!(config.allow_two_line_id_date);
        assert_eq!(config.header_patterns.len(), 3);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ParserConfig =
            serde_json::from_str(r#"{"name_regex_strict": false}"#).expect("valid config json");
        assert!(!config.name_regex_strict);
        assert!(config.allow_two_line_id_date);
    }
}
