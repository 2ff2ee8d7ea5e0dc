//! Source locations carried by yosys `src` attributes.

use std::fmt;
use std::fs;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref SRANGE_RE: Regex = Regex::new(r"^(.*):(\d+)\.(\d+)-(\d+)\.(\d+)$").unwrap();
}

/// Separator between ranges in a `src` attribute.
pub const SRC_SEPARATOR: char = '|';

/// One `file:line.col-line.col` range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub file: String,
    pub line_begin: usize,
    pub col_begin: usize,
    pub line_end: usize,
    pub col_end: usize,
}

/// All ranges a cell was generated from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLoc {
    pub ranges: Vec<SourceRange>,
}

impl SourceRange {
    pub fn parse(s: &str) -> Option<SourceRange> {
        let caps = SRANGE_RE.captures(s)?;
        Some(SourceRange {
            file: caps.get(1)?.as_str().to_string(),
            line_begin: caps.get(2)?.as_str().parse().ok()?,
            col_begin: caps.get(3)?.as_str().parse().ok()?,
            line_end: caps.get(4)?.as_str().parse().ok()?,
            col_end: caps.get(5)?.as_str().parse().ok()?,
        })
    }

    /// The range followed by the first source line and a caret marker under
    /// the covered columns.
    #[must_use]
    pub fn to_string_pretty(&self) -> String {
        let mut out = format!("{self}\n");

        let Ok(content) = fs::read_to_string(&self.file) else {
            out.push_str(&format!("(cannot open \"{}\")\n", self.file));
            return out;
        };
        let lines: Vec<&str> = content.lines().map(|l| l.trim_end_matches('\r')).collect();

        if self.line_begin == 0 || self.line_begin > lines.len() {
            out.push_str(&format!("(file has only {} lines)\n", lines.len()));
            return out;
        }

        let src = lines[self.line_begin - 1];
        let number = self.line_begin.to_string();
        out.push_str(&format!("{number} | {src}\n"));

        let mut marker = format!("{} | ", " ".repeat(number.len()));
        for i in 1..self.col_begin {
            // keep tabs so the caret lines up
            match src.chars().nth(i - 1) {
                Some('\t') => marker.push('\t'),
                _ => marker.push(' '),
            }
        }
        let width = if self.line_begin == self.line_end {
            self.col_end.saturating_sub(self.col_begin).saturating_add(1).max(1)
        } else {
            1
        };
        marker.push_str(&"^".repeat(width));
        out.push_str(&marker);
        out.push('\n');
        out
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}.{}-{}.{}",
            self.file, self.line_begin, self.col_begin, self.line_end, self.col_end
        )
    }
}

impl SourceLoc {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Parse a `|`-separated list of ranges. Any malformed range fails the
    /// whole parse.
    pub fn parse(s: &str) -> Option<SourceLoc> {
        let ranges = s
            .split(SRC_SEPARATOR)
            .filter(|t| !t.is_empty())
            .map(SourceRange::parse)
            .collect::<Option<Vec<_>>>()?;
        Some(SourceLoc { ranges })
    }

    #[must_use]
    pub fn to_string_pretty(&self) -> String {
        self.ranges
            .iter()
            .map(SourceRange::to_string_pretty)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, "{SRC_SEPARATOR}")?;
            }
            write!(f, "{r}")?;
        }
        Ok(())
    }
}
