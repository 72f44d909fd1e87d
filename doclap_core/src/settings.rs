use std::path::Path;

use serde::Deserialize;

use crate::epilog::EpilogFormatter;
use crate::error::{Error, Result};

/// Per parser configuration.
///
/// ```toml
/// epilog_sections = ["Notes", "Examples"]
/// epilog_formatter = "bold"
/// interpret = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Documentation sections copied into the epilog, in this order.
    pub epilog_sections: Vec<String>,
    pub epilog_formatter: EpilogFormatter,
    /// Whether documented types are interpreted by default.
    pub interpret: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        ParserSettings {
            epilog_sections: vec!["Notes".to_string(), "References".to_string()],
            epilog_formatter: EpilogFormatter::default(),
            interpret: true,
        }
    }
}

impl ParserSettings {
    pub fn from_file(path: &Path) -> Result<Self> {
        if path.extension().and_then(|s| s.to_str()) != Some("toml") {
            return Err(Error::UnsupportedFormat(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn epilog_formatter(mut self, formatter: EpilogFormatter) -> Self {
        self.epilog_formatter = formatter;
        self
    }

    pub fn epilog_sections<I, S>(mut self, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.epilog_sections = sections.into_iter().map(Into::into).collect();
        self
    }

    pub fn interpret(mut self, interpret: bool) -> Self {
        self.interpret = interpret;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = ParserSettings::from_toml_str("").unwrap();
        assert_eq!(settings.epilog_sections, vec!["Notes", "References"]);
        assert!(matches!(settings.epilog_formatter, EpilogFormatter::Heading));
        assert!(settings.interpret);
    }

    #[test]
    fn test_from_toml() {
        let settings = ParserSettings::from_toml_str(
            r#"
epilog_sections = ["Examples"]
epilog_formatter = "rubric"
interpret = false
"#,
        )
        .unwrap();
        assert_eq!(settings.epilog_sections, vec!["Examples"]);
        assert!(matches!(settings.epilog_formatter, EpilogFormatter::Rubric));
        assert!(!settings.interpret);

        let settings = ParserSettings::from_toml_str(r#"epilog_formatter = "bold-title""#).unwrap();
        assert!(matches!(settings.epilog_formatter, EpilogFormatter::Bold));
    }

    #[test]
    fn test_unknown_formatter() {
        let result = ParserSettings::from_toml_str(r#"epilog_formatter = "fancy""#);
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("doclap.toml");
        fs::write(&file_path, "epilog_formatter = \"bold\"").unwrap();
        let settings = ParserSettings::from_file(&file_path).unwrap();
        assert!(matches!(settings.epilog_formatter, EpilogFormatter::Bold));
    }

    #[test]
    fn test_from_file_unsupported_format() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("doclap.yaml");
        fs::write(&file_path, "interpret: false").unwrap();
        let result = ParserSettings::from_file(&file_path);
        match result {
            Err(e) => assert!(e.to_string().contains("unsupported settings file")),
            Ok(_) => panic!("Expected an error"),
        }
    }

    #[test]
    fn test_from_file_nonexistent() {
        let result = ParserSettings::from_file(Path::new("nonexistent.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
