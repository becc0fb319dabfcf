//! Field annotation grammar.
//!
//! ```text
//! <header>[,allowempty][,expand:(date|datetime|month|regexp(<pattern>))]
//!         [,split:<sep>][,font{size:14 bold:true color:FF0000 ...}]
//! ```
//!
//! `-` or an empty annotation excludes the field. Tokens split on commas that
//! are not nested inside `(...)` or `{...}`, so custom patterns may use
//! quantifiers such as `\d{1,2}`.

use crate::error::SchemaError;
use crate::value::CellKind;
use once_cell::sync::Lazy;
use regex::Regex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const SKIP_MARKER: &str = "-";

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static pattern"));
static DATETIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").expect("static pattern")
});
static MONTH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}$").expect("static pattern"));

/// Declared columns come from the type; expanded ones from map keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Declared = 1,
    Expanded = 2,
}

/// Inline rich-text style attached to a column's cells.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Font {
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    /// `RRGGBB`
    pub color: Option<String>,
    pub family: Option<String>,
    pub underline: Option<String>,
}

impl Font {
    fn parse(prop: &str) -> Result<Self, SchemaError> {
        let mut font = Font::default();
        for pair in prop.split_whitespace() {
            let Some((key, value)) = pair.split_once(':') else {
                return Err(SchemaError::MalformedFont {
                    prop: prop.to_string(),
                });
            };
            if value.contains(':') {
                return Err(SchemaError::MalformedFont {
                    prop: prop.to_string(),
                });
            }
            match key {
                "size" => {
                    font.size = Some(value.parse::<f64>().map_err(|_| SchemaError::FontSize {
                        size: value.to_string(),
                    })?);
                }
                "bold" => font.bold = value == "true",
                "italic" => font.italic = value == "true",
                "strike" => font.strike = value == "true",
                "color" => {
                    if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
                        return Err(SchemaError::FontColor {
                            color: value.to_string(),
                        });
                    }
                    font.color = Some(value.to_ascii_uppercase());
                }
                "family" if !value.is_empty() => font.family = Some(value.to_string()),
                "underline" if value == "single" => font.underline = Some("single".to_string()),
                _ => {}
            }
        }
        Ok(font)
    }

    /// `FFRRGGBB` form expected by xlsx writers.
    pub fn argb(&self) -> Option<String> {
        self.color.as_ref().map(|c| format!("FF{c}"))
    }
}

/// One field bound to one (or, for expand fields, several) columns.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub column: u32,
    pub field_name: String,
    pub header_name: String,
    pub skip: bool,
    pub allow_empty: bool,
    pub expand: bool,
    pub expand_pattern: Option<Regex>,
    pub level: Level,
    pub split: Option<String>,
    pub font: Option<Font>,
    pub matched: bool,
    pub kind: CellKind,
}

impl FieldDescriptor {
    /// Parse an annotation for a field declared at `column`.
    pub fn parse(tag: &str, column: u32) -> Result<Self, SchemaError> {
        let mut desc = FieldDescriptor::blank(column);
        let tag = tag.trim();
        if tag.is_empty() || tag == SKIP_MARKER {
            desc.skip = true;
            return Ok(desc);
        }

        for (idx, token) in split_tokens(tag).into_iter().enumerate() {
            let token = token.trim();
            if token == "allowempty" {
                desc.allow_empty = true;
            } else if let Some(kind) = token.strip_prefix("expand:") {
                desc.expand = true;
                desc.expand_pattern = Some(expand_pattern(kind)?);
            } else if let Some(sep) = token.strip_prefix("split:") {
                desc.split = Some(sep.to_string());
            } else if let Some(rest) = token.strip_prefix("font{") {
                let prop = rest.strip_suffix('}').ok_or_else(|| SchemaError::MalformedFont {
                    prop: rest.to_string(),
                })?;
                desc.font = Some(Font::parse(prop)?);
            } else if idx == 0 {
                desc.header_name = token.to_string();
            }
        }
        Ok(desc)
    }

    /// Level-2 descriptor for one discovered expand key of `parent`.
    pub fn expanded(parent: &FieldDescriptor, key: &str, column: u32) -> Self {
        FieldDescriptor {
            column,
            field_name: parent.field_name.clone(),
            header_name: key.to_string(),
            level: Level::Expanded,
            kind: parent.kind.clone(),
            split: parent.split.clone(),
            ..FieldDescriptor::blank(column)
        }
    }

    fn blank(column: u32) -> Self {
        FieldDescriptor {
            column,
            field_name: String::new(),
            header_name: String::new(),
            skip: false,
            allow_empty: false,
            expand: false,
            expand_pattern: None,
            level: Level::Declared,
            split: None,
            font: None,
            matched: false,
            kind: CellKind::Text,
        }
    }

    pub fn is_skip(&self) -> bool {
        self.skip
    }

    /// Whether a header cell is written for this descriptor.
    pub fn has_header_cell(&self) -> bool {
        !self.skip && !self.allow_empty && !self.expand
    }

    pub fn matches_expand(&self, header: &str) -> bool {
        self.expand
            && self
                .expand_pattern
                .as_ref()
                .is_some_and(|re| re.is_match(header))
    }
}

/// Free-function form of [`FieldDescriptor::parse`].
pub fn parse(tag: &str, column: u32) -> Result<FieldDescriptor, SchemaError> {
    FieldDescriptor::parse(tag, column)
}

fn expand_pattern(kind: &str) -> Result<Regex, SchemaError> {
    match kind {
        "date" => Ok(DATE_PATTERN.clone()),
        "datetime" => Ok(DATETIME_PATTERN.clone()),
        "month" => Ok(MONTH_PATTERN.clone()),
        _ => {
            let pattern = kind
                .strip_prefix("regexp(")
                .and_then(|p| p.strip_suffix(')'))
                .ok_or_else(|| SchemaError::ExpandKind {
                    kind: kind.to_string(),
                })?;
            Regex::new(pattern).map_err(|e| SchemaError::ExpandPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
        }
    }
}

fn split_tokens(tag: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in tag.char_indices() {
        match ch {
            '(' | '{' => depth += 1,
            ')' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                tokens.push(&tag[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    tokens.push(&tag[start..]);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_dash_skip() {
        assert!(parse("", 1).unwrap().skip);
        assert!(parse("-", 1).unwrap().skip);
        assert!(!parse("Name", 1).unwrap().skip);
    }

    #[test]
    fn header_and_directives() {
        let d = parse("Age,allowempty,split:;", 2).unwrap();
        assert_eq!(d.header_name, "Age");
        assert_eq!(d.column, 2);
        assert!(d.allow_empty);
        assert_eq!(d.split.as_deref(), Some(";"));
        assert_eq!(d.level, Level::Declared);
        assert!(!d.has_header_cell());
    }

    #[test]
    fn leading_directive_leaves_header_empty() {
        let d = parse("allowempty", 1).unwrap();
        assert!(d.allow_empty);
        assert_eq!(d.header_name, "");
    }

    #[test]
    fn expand_shapes() {
        let date = parse("Holiday,expand:date", 1).unwrap();
        assert!(date.expand);
        assert!(date.matches_expand("2022-01-27"));
        assert!(!date.matches_expand("2022-01-27 10:00:00"));

        let dt = parse("Log,expand:datetime", 1).unwrap();
        assert!(dt.matches_expand("2022-01-27 10:00:00"));
        assert!(!dt.matches_expand("2022-01-27"));

        let month = parse("Sales,expand:month", 1).unwrap();
        assert!(month.matches_expand("2022-01"));
        assert!(!month.matches_expand("2022-01-01"));
    }

    #[test]
    fn custom_pattern_keeps_nested_commas() {
        let d = parse(r"Slots,expand:regexp(^slot-\d{1,2}$),allowempty", 1).unwrap();
        assert!(d.matches_expand("slot-7"));
        assert!(d.matches_expand("slot-12"));
        assert!(!d.matches_expand("slot-123"));
        assert!(d.allow_empty);
    }

    #[test]
    fn bad_expand_is_schema_error() {
        assert!(matches!(
            parse("X,expand:week", 1),
            Err(SchemaError::ExpandKind { .. })
        ));
        assert!(matches!(
            parse("X,expand:regexp(([)", 1),
            Err(SchemaError::ExpandPattern { .. })
        ));
    }

    #[test]
    fn font_block() {
        let d = parse(
            "Height,font{size:16 bold:true color:ff0000 italic:false family:Arial strike:true underline:single}",
            3,
        )
        .unwrap();
        let font = d.font.unwrap();
        assert_eq!(font.size, Some(16.0));
        assert!(font.bold);
        assert!(!font.italic);
        assert!(font.strike);
        assert_eq!(font.color.as_deref(), Some("FF0000"));
        assert_eq!(font.argb().as_deref(), Some("FFFF0000"));
        assert_eq!(font.family.as_deref(), Some("Arial"));
        assert_eq!(font.underline.as_deref(), Some("single"));
    }

    #[test]
    fn font_errors() {
        assert!(matches!(
            parse("H,font{size16}", 1),
            Err(SchemaError::MalformedFont { .. })
        ));
        assert!(matches!(
            parse("H,font{color:FFF}", 1),
            Err(SchemaError::FontColor { .. })
        ));
        assert!(matches!(
            parse("H,font{size:big}", 1),
            Err(SchemaError::FontSize { .. })
        ));
    }

    #[test]
    fn unknown_tokens_are_ignored() {
        let d = parse("Name,whatever,font{weight:900}", 1).unwrap();
        assert_eq!(d.header_name, "Name");
        assert_eq!(d.font, Some(Font::default()));
    }
}
