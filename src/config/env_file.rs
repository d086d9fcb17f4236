//! `KEY=value` file parsing.
//!
//! Used for the os-release descriptor, project `.env` files, and for
//! spotting existing exports in shell startup files.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

/// Parses `KEY=value` files into variables.
///
/// # Supported Formats
///
/// - Simple: `KEY=value`
/// - Quoted: `KEY="value with spaces"` or `KEY='single quoted'`
/// - Exported: `export KEY=value`
/// - Empty: `KEY=`
/// - Comments: `# This is a comment`
/// - Values with equals signs: `URL=https://example.com?foo=bar`
///
/// # Example
///
/// ```
/// use hostprep::config::EnvFileParser;
///
/// let content = r#"
/// NAME="Ubuntu"
/// VERSION_CODENAME=noble
/// export ZMQ=1
/// "#;
///
/// let vars = EnvFileParser::parse(content);
/// assert_eq!(vars.get("NAME"), Some(&"Ubuntu".to_string()));
/// assert_eq!(vars.get("VERSION_CODENAME"), Some(&"noble".to_string()));
/// assert_eq!(vars.get("ZMQ"), Some(&"1".to_string()));
/// ```
pub struct EnvFileParser;

impl EnvFileParser {
    /// Parse content into a map; later assignments win.
    pub fn parse(content: &str) -> HashMap<String, String> {
        Self::entries(content).into_iter().collect()
    }

    /// Parse content into assignments in file order, duplicates kept.
    pub fn entries(content: &str) -> Vec<(String, String)> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(Self::parse_line)
            .collect()
    }

    /// Parse a single line.
    fn parse_line(line: &str) -> Option<(String, String)> {
        let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
        let eq_pos = line.find('=')?;
        let key = line[..eq_pos].trim().to_string();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return None;
        }
        let value = Self::unquote(line[eq_pos + 1..].trim());

        Some((key, value))
    }

    /// Remove surrounding quotes from a value.
    fn unquote(value: &str) -> String {
        let quoted = value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')));
        if quoted {
            value[1..value.len() - 1].to_string()
        } else {
            value.to_string()
        }
    }

    /// Load and parse a file.
    pub fn load(path: &Path) -> Result<HashMap<String, String>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Load and parse a file, returning an empty map if it doesn't exist.
    pub fn load_optional(path: &Path) -> Result<HashMap<String, String>> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(HashMap::new())
        }
    }
}
