//! The closed vocabulary of line-prefix attributes.
//!
//! Every line carries at most one attribute. Attributes are written as a
//! textual prefix (`## Title`, `- item`, `a. choice`) or assigned out of band
//! through an [`crate::AttributeMap`]; either way they resolve to one
//! [`Attribute`] value with a canonical string token.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A line-prefix attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Attribute {
    /// `#`
    Heading1,
    /// `##`
    Heading2,
    /// `###`
    Heading3,
    /// `#ttl`, the cover slide heading.
    Title,
    /// `#agd`, the agenda (table of contents) slide heading.
    Agenda,
    /// `#!`, the summary slide heading.
    Summary,
    /// `-`
    Dash,
    /// `*`
    Star,
    /// `N.`, or `#N.` / `##N.` / `###N.` for an item numbered within a
    /// heading level. `depth` is the number of leading `#` (0 for bare).
    Numbered { depth: u8, number: u32 },
    /// `A.` through `Z.`, always stored uppercase.
    Alpha(char),
    /// `!`, the key message of a slide.
    KeyMessage,
}

impl Attribute {
    /// Parse an exact token such as `"##"`, `"#ttl"`, `"##3."` or `"B."`.
    pub fn from_token(token: &str) -> Option<Self> {
        let attribute = match token {
            "#" => Self::Heading1,
            "##" => Self::Heading2,
            "###" => Self::Heading3,
            "#ttl" => Self::Title,
            "#agd" => Self::Agenda,
            "#!" => Self::Summary,
            "-" => Self::Dash,
            "*" => Self::Star,
            "!" => Self::KeyMessage,
            _ => return Self::from_marker_token(token),
        };
        Some(attribute)
    }

    fn from_marker_token(token: &str) -> Option<Self> {
        let body = token.strip_suffix('.')?;
        let mut chars = body.chars();
        if let (Some(letter), None) = (chars.next(), chars.next()) {
            if letter.is_ascii_alphabetic() {
                return Some(Self::Alpha(letter.to_ascii_uppercase()));
            }
        }

        let digits = body.trim_start_matches('#');
        let depth = body.len() - digits.len();
        if depth > 3 || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number = digits.parse().ok()?;
        Some(Self::Numbered {
            depth: depth as u8,
            number,
        })
    }

    /// The canonical prefix token for this attribute.
    pub fn token(&self) -> String {
        self.to_string()
    }

    /// Heading level used for slide segmentation, if this is a heading.
    ///
    /// Layout headings (`#ttl`, `#agd`, `#!`) are level 1.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            Self::Heading1 | Self::Title | Self::Agenda | Self::Summary => Some(1),
            Self::Heading2 => Some(2),
            Self::Heading3 => Some(3),
            _ => None,
        }
    }

    /// Whether this is one of the slide layout headings.
    pub fn is_layout_heading(&self) -> bool {
        matches!(self, Self::Title | Self::Agenda | Self::Summary)
    }

    /// Whether this marks a list item of any kind.
    pub fn is_list_item(&self) -> bool {
        matches!(
            self,
            Self::Dash | Self::Star | Self::Numbered { .. } | Self::Alpha(_)
        )
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heading1 => f.write_str("#"),
            Self::Heading2 => f.write_str("##"),
            Self::Heading3 => f.write_str("###"),
            Self::Title => f.write_str("#ttl"),
            Self::Agenda => f.write_str("#agd"),
            Self::Summary => f.write_str("#!"),
            Self::Dash => f.write_str("-"),
            Self::Star => f.write_str("*"),
            Self::Numbered { depth, number } => {
                for _ in 0..*depth {
                    f.write_str("#")?;
                }
                write!(f, "{number}.")
            }
            Self::Alpha(letter) => write!(f, "{letter}."),
            Self::KeyMessage => f.write_str("!"),
        }
    }
}

impl FromStr for Attribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_token(s).ok_or_else(|| Error::UnknownAttribute(s.to_string()))
    }
}

impl From<Attribute> for String {
    fn from(attribute: Attribute) -> Self {
        attribute.to_string()
    }
}

impl TryFrom<String> for Attribute {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        for token in [
            "#", "##", "###", "#ttl", "#agd", "#!", "-", "*", "!", "3.", "#1.", "##12.", "###4.",
            "A.", "Z.",
        ] {
            let attribute = Attribute::from_token(token).unwrap();
            assert_eq!(attribute.token(), token);
        }
    }

    #[test]
    fn test_alpha_token_uppercased() {
        assert_eq!(Attribute::from_token("c."), Some(Attribute::Alpha('C')));
    }

    #[test]
    fn test_unknown_tokens() {
        assert_eq!(Attribute::from_token("####"), None);
        assert_eq!(Attribute::from_token("####1."), None);
        assert_eq!(Attribute::from_token("AB."), None);
        assert_eq!(Attribute::from_token("."), None);
        assert_eq!(Attribute::from_token(""), None);
        assert!("+".parse::<Attribute>().is_err());
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(Attribute::Title.heading_level(), Some(1));
        assert_eq!(Attribute::Summary.heading_level(), Some(1));
        assert_eq!(Attribute::Heading2.heading_level(), Some(2));
        assert_eq!(Attribute::Heading3.heading_level(), Some(3));
        assert_eq!(Attribute::Dash.heading_level(), None);
        assert_eq!(
            Attribute::Numbered {
                depth: 2,
                number: 1
            }
            .heading_level(),
            None
        );
    }

    #[test]
    fn test_serde_as_token() {
        let json = serde_json::to_string(&Attribute::Numbered {
            depth: 2,
            number: 3,
        })
        .unwrap();
        assert_eq!(json, "\"##3.\"");

        let parsed: Attribute = serde_json::from_str("\"#agd\"").unwrap();
        assert_eq!(parsed, Attribute::Agenda);

        assert!(serde_json::from_str::<Attribute>("\"????\"").is_err());
    }
}
