use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::docstring::Docstring;

type FormatFn = dyn Fn(&str, &str) -> String + Send + Sync;

/// Renders one documentation section for the parser epilog.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpilogFormatter {
    /// `Title`, a hyphen underline, then the body.
    #[default]
    #[serde(alias = "plain")]
    Heading,
    /// `**Title**`, a blank line, then the body.
    #[serde(alias = "bold-title")]
    Bold,
    /// `.. rubric:: Title`, a blank line, then the body.
    #[serde(alias = "heading-directive")]
    Rubric,
    #[serde(skip)]
    Custom(Arc<FormatFn>),
}

impl EpilogFormatter {
    pub fn custom(format: impl Fn(&str, &str) -> String + Send + Sync + 'static) -> Self {
        EpilogFormatter::Custom(Arc::new(format))
    }

    pub fn format(&self, title: &str, body: &str) -> String {
        match self {
            EpilogFormatter::Heading => {
                format!("{title}\n{}\n{body}", "-".repeat(title.chars().count()))
            }
            EpilogFormatter::Bold => format!("**{title}**\n\n{body}"),
            EpilogFormatter::Rubric => format!(".. rubric:: {title}\n\n{body}"),
            EpilogFormatter::Custom(format) => format(title, body),
        }
    }
}

impl fmt::Debug for EpilogFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpilogFormatter::Heading => write!(f, "Heading"),
            EpilogFormatter::Bold => write!(f, "Bold"),
            EpilogFormatter::Rubric => write!(f, "Rubric"),
            EpilogFormatter::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Join the configured sections of `doc`, in configuration order.
/// Sections missing from the documentation are skipped.
pub fn assemble(doc: &Docstring, sections: &[String], formatter: &EpilogFormatter) -> String {
    sections
        .iter()
        .filter_map(|title| doc.section(title).map(|body| formatter.format(title, body)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = "should be included in the parser epilog";

    fn doc() -> Docstring {
        Docstring::parse(&format!(
            "Test function\n\nParameters\n----------\na: int\n    A parameter\n\nNotes\n-----\n{CONTENT}"
        ))
        .unwrap()
    }

    fn defaults() -> Vec<String> {
        vec!["Notes".to_string(), "References".to_string()]
    }

    #[test]
    fn test_builtin_formatters() {
        let doc = doc();
        assert_eq!(
            assemble(&doc, &defaults(), &EpilogFormatter::Heading),
            format!("Notes\n-----\n{CONTENT}")
        );
        assert_eq!(
            assemble(&doc, &defaults(), &EpilogFormatter::Bold),
            format!("**Notes**\n\n{CONTENT}")
        );
        assert_eq!(
            assemble(&doc, &defaults(), &EpilogFormatter::Rubric),
            format!(".. rubric:: Notes\n\n{CONTENT}")
        );
    }

    #[test]
    fn test_custom_formatter() {
        let formatter = EpilogFormatter::custom(|title, body| format!("{title}{body}"));
        assert_eq!(assemble(&doc(), &defaults(), &formatter), format!("Notes{CONTENT}"));
    }

    #[test]
    fn test_section_order_and_absence() {
        let doc = Docstring::parse("S\n\nReferences\n----------\nr\n\nNotes\n-----\nn").unwrap();
        let formatter = EpilogFormatter::custom(|title, _| title.to_string());
        assert_eq!(assemble(&doc, &defaults(), &formatter), "Notes\n\nReferences");
        assert_eq!(assemble(&doc, &["Examples".to_string()], &formatter), "");
    }
}
