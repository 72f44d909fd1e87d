//! Extraction of numpydoc style documentation blocks.
//!
//! A block is made of a summary paragraph, an optional extended summary and a
//! sequence of sections. A section starts with a title line followed by an
//! underline of hyphens:
//!
//! ```text
//! Add two numbers
//!
//! Parameters
//! ----------
//! a: int
//!     The first number
//! b: list of float
//!     Any other numbers
//!
//! Notes
//! -----
//! Shown in the epilog of the generated parser.
//! ```
use indexmap::IndexMap;
use thiserror::Error;

/// Sections whose entries document function parameters.
pub const PARAMETER_SECTIONS: [&str; 2] = ["Parameters", "Other Parameters"];

const MIN_UNDERLINE: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocError {
    #[error(
        "documentation is not dedented: the first line '{line}' is indented less than the lines following it"
    )]
    NotDedented { line: String },
}

/// Type and description of one documented parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamDoc {
    pub dtype: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Docstring {
    pub summary: String,
    pub extended_summary: String,
    pub sections: IndexMap<String, String>,
    pub params: IndexMap<String, ParamDoc>,
}

impl Docstring {
    pub fn parse(text: &str) -> Result<Self, DocError> {
        let text = dedent(text)?;
        let lines: Vec<&str> = text.lines().collect();
        let headers = section_headers(&lines);

        let preamble_end = headers.first().copied().unwrap_or(lines.len());
        let mut paragraphs = paragraphs(&lines[..preamble_end]).into_iter();
        let summary = paragraphs.next().unwrap_or_default();
        let extended_summary = paragraphs.collect::<Vec<_>>().join("\n\n");

        let mut sections: IndexMap<String, String> = IndexMap::new();
        for (n, &start) in headers.iter().enumerate() {
            let end = headers.get(n + 1).copied().unwrap_or(lines.len());
            let title = lines[start].trim().to_string();
            let body = strip_common_indent(&lines[start + 2..end]);
            let body = body.trim_matches('\n').trim_end().to_string();
            sections
                .entry(title)
                .and_modify(|existing| {
                    existing.push_str("\n\n");
                    existing.push_str(&body);
                })
                .or_insert(body);
        }

        let mut params = IndexMap::new();
        for title in PARAMETER_SECTIONS {
            if let Some(body) = sections.get(title) {
                parse_params(body, &mut params);
            }
        }

        Ok(Docstring {
            summary,
            extended_summary,
            sections,
            params,
        })
    }

    pub fn param(&self, name: &str) -> Option<&ParamDoc> {
        self.params.get(name)
    }

    pub fn section(&self, title: &str) -> Option<&str> {
        self.sections.get(title).map(String::as_str)
    }

    /// Summary and extended summary, separated by a blank line.
    pub fn description(&self) -> String {
        [self.summary.as_str(), self.extended_summary.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Remove the indentation shared by every line of `text`.
///
/// A leading blank line is dropped first. When the first line carries text it
/// must not be indented less than the lines after it, otherwise the block
/// cannot be dedented consistently and is rejected.
pub fn dedent(text: &str) -> Result<String, DocError> {
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.first().is_some_and(|line| is_blank(line)) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|line| is_blank(line)) {
        lines.pop();
    }
    let Some(first) = lines.first() else {
        return Ok(String::new());
    };
    let rest = lines[1..]
        .iter()
        .filter(|line| !is_blank(line))
        .map(|line| indent_of(line))
        .min();
    if let Some(rest) = rest
        && indent_of(first) < rest
    {
        return Err(DocError::NotDedented {
            line: first.trim().to_string(),
        });
    }
    Ok(strip_common_indent(&lines))
}

fn strip_common_indent(lines: &[&str]) -> String {
    let common = lines
        .iter()
        .filter(|line| !is_blank(line))
        .map(|line| indent_of(line))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| {
            if is_blank(line) {
                ""
            } else {
                line.get(common..).unwrap_or(line.trim_start()).trim_end()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_underline(line: &str) -> bool {
    let line = line.trim();
    line.len() >= MIN_UNDERLINE && line.chars().all(|c| c == '-')
}

fn section_headers(lines: &[&str]) -> Vec<usize> {
    lines
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| !is_blank(pair[0]) && !is_underline(pair[0]) && is_underline(pair[1]))
        .map(|(i, _)| i)
        .collect()
}

fn paragraphs(lines: &[&str]) -> Vec<String> {
    lines
        .split(|line| is_blank(line))
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            chunk
                .iter()
                .map(|line| line.trim())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}

fn parse_params(body: &str, params: &mut IndexMap<String, ParamDoc>) {
    let lines: Vec<&str> = body.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if is_blank(line) || indent_of(line) > 0 {
            i += 1;
            continue;
        }
        let (names, dtype) = match line.split_once(':') {
            Some((names, dtype)) => (names, Some(dtype.trim()).filter(|t| !t.is_empty())),
            None => (line, None),
        };
        let start = i + 1;
        let mut end = start;
        while end < lines.len() && (is_blank(lines[end]) || indent_of(lines[end]) > 0) {
            end += 1;
        }
        let description = strip_common_indent(&lines[start..end]).trim().to_string();
        for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            params.insert(
                name.to_string(),
                ParamDoc {
                    dtype: dtype.map(String::from),
                    description: description.clone(),
                },
            );
        }
        i = end;
    }
}
