//! `Item: Qty` stock sheets for bulk import and export.
//!
//! ```text
//! Scrap: 1,500
//! Iron Plate: 40
//! ```
//!
//! Parsing splits each line on its first `:`. Lines with no `:` are treated
//! as free text and ignored. Lines whose name is blank or whose quantity is
//! not an integer are rejected with their 1-based line number.

use serde::Serialize;
use std::fmt;

/// One parsed `Item: Qty` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetLine {
    /// 1-based line number in the source text (0 for generated sheets).
    pub line: usize,
    pub item: String,
    pub quantity: i64,
}

impl fmt::Display for SheetLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.quantity)
    }
}

/// A line that could not be parsed or applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedLine {
    pub line: usize,
    pub text: String,
    pub reason: String,
}

/// Parsed sheet: accepted lines plus the ones the parser rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockSheet {
    lines: Vec<SheetLine>,
    rejected: Vec<RejectedLine>,
}

impl StockSheet {
    /// Parse sheet text. Never fails; bad lines end up in [`Self::rejected`].
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut sheet = Self::default();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let Some((name, qty)) = raw.split_once(':') else {
                continue;
            };

            let name = name.trim();
            if name.is_empty() {
                sheet.reject(line, raw, "item name is blank".to_string());
                continue;
            }

            let digits: String = qty.trim().chars().filter(|c| *c != ',').collect();
            match digits.parse::<i64>() {
                Ok(quantity) => sheet.lines.push(SheetLine {
                    line,
                    item: name.to_string(),
                    quantity,
                }),
                Err(_) => sheet.reject(line, raw, format!("'{}' is not a whole number", qty.trim())),
            }
        }

        sheet
    }

    /// Build a sheet from `(item, quantity)` pairs, e.g. for export.
    #[must_use]
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let lines = entries
            .into_iter()
            .map(|(item, quantity)| SheetLine {
                line: 0,
                item: item.into(),
                quantity,
            })
            .collect();
        Self {
            lines,
            rejected: Vec::new(),
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[SheetLine] {
        &self.lines
    }

    #[must_use]
    pub fn rejected(&self) -> &[RejectedLine] {
        &self.rejected
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render back to `Item: Qty` text, one line per entry.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out
    }

    fn reject(&mut self, line: usize, raw: &str, reason: String) {
        self.rejected.push(RejectedLine {
            line,
            text: raw.trim().to_string(),
            reason,
        });
    }
}

/// Result of applying a sheet: how many lines landed and which did not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetOutcome {
    pub applied: usize,
    pub failures: Vec<RejectedLine>,
}

impl SheetOutcome {
    /// Start an outcome seeded with the lines the parser already rejected.
    #[must_use]
    pub fn from_rejected(sheet: &StockSheet) -> Self {
        Self {
            applied: 0,
            failures: sheet.rejected.clone(),
        }
    }
}
