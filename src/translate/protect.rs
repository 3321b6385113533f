//! Placeholder protection for tokens that must survive translation
//! verbatim: numbers, measurements, currency, product codes.

use regex::Regex;

use crate::error::{Error, Result};

/// Default protected patterns, tried left to right at each position.
pub const DEFAULT_PATTERNS: &[&str] = &[
    r"[€$£¥]\s?\d+(?:[.,]\d+)*",
    r"\d+(?:[.,]\d+)*(?:km|cm|mm|m²|m2|kg|mg|ml|kHz|MHz|GHz|Hz|°C|°F|%)?",
    r"[€$£¥]",
    r"\b[A-Z]{2,}[0-9]*\b",
    r"\b[A-Z][0-9]+\b",
];

const PREFIX: &str = "__PROT_";
const SUFFIX: &str = "__";

/// Replaces protected tokens with numbered placeholders.
#[derive(Debug, Clone)]
pub struct Protector {
    pattern: Option<Regex>,
}

/// Text with its protected tokens swapped out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protected {
    pub text: String,
    pub tokens: Vec<String>,
}

impl Protector {
    /// Build from a list of patterns. An empty list protects nothing.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self { pattern: None });
        }
        let joined = patterns
            .iter()
            .map(|p| format!("(?:{})", p.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&joined)
            .map_err(|e| Error::InvalidOptions(format!("Invalid protected pattern: {}", e)))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn none() -> Self {
        Self { pattern: None }
    }

    pub fn protect(&self, text: &str) -> Protected {
        let Some(pattern) = &self.pattern else {
            return Protected {
                text: text.to_string(),
                tokens: Vec::new(),
            };
        };

        let mut out = String::with_capacity(text.len());
        let mut tokens = Vec::new();
        let mut last = 0;
        for m in pattern.find_iter(text) {
            if m.as_str().is_empty() {
                continue;
            }
            out.push_str(&text[last..m.start()]);
            out.push_str(&placeholder(tokens.len()));
            tokens.push(m.as_str().to_string());
            last = m.end();
        }
        out.push_str(&text[last..]);

        Protected { text: out, tokens }
    }
}

impl Default for Protector {
    fn default() -> Self {
        // The built-in patterns are known to compile.
        Self::new(DEFAULT_PATTERNS).unwrap_or_else(|_| Self::none())
    }
}

impl Protected {
    /// Put the original tokens back into a translation.
    pub fn restore(&self, translated: &str) -> String {
        let mut out = translated.to_string();
        for (i, token) in self.tokens.iter().enumerate() {
            out = out.replace(&placeholder(i), token);
        }
        out
    }

    /// Check if nothing translatable is left outside placeholders.
    pub fn is_trivial(&self) -> bool {
        let mut rest = self.text.clone();
        for i in 0..self.tokens.len() {
            rest = rest.replace(&placeholder(i), "");
        }
        !rest.chars().any(char::is_alphabetic)
    }
}

fn placeholder(index: usize) -> String {
    format!("{}{}{}", PREFIX, index, SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protect_and_restore() {
        let protector = Protector::default();
        let protected = protector.protect("Max load 2,5kg at 230 V, see ISO 9001.");
        assert_eq!(protected.tokens, vec!["2,5kg", "230", "ISO", "9001"]);
        assert!(!protected.text.contains("230"));

        let translated = protected
            .text
            .replace("Max load", "Carga máxima")
            .replace("see", "ver");
        assert_eq!(
            protected.restore(&translated),
            "Carga máxima 2,5kg at 230 V, ver ISO 9001."
        );
    }

    #[test]
    fn test_currency_amounts_stay_whole() {
        let protected = Protector::default().protect("Only €19.99 today");
        assert_eq!(protected.tokens, vec!["€19.99"]);
    }

    #[test]
    fn test_trivial_text() {
        let protector = Protector::default();
        assert!(protector.protect("12.5%").is_trivial());
        assert!(!protector.protect("USB-C").is_trivial());
        assert!(!protector.protect("Page 3").is_trivial());
    }

    #[test]
    fn test_placeholders_do_not_collide() {
        let text = (0..12).map(|i| i.to_string()).collect::<Vec<_>>().join(" x ");
        let protected = Protector::default().protect(&text);
        assert_eq!(protected.tokens.len(), 12);
        assert_eq!(protected.restore(&protected.text), text);
    }

    #[test]
    fn test_empty_pattern_list() {
        let protector = Protector::new::<&str>(&[]).unwrap();
        let protected = protector.protect("100 mm");
        assert!(protected.tokens.is_empty());
        assert_eq!(protected.text, "100 mm");
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            Protector::new(&["(unclosed"]),
            Err(Error::InvalidOptions(_))
        ));
    }
}
