//! Text measurement and line wrapping.

use crate::model::{is_spaceless_script_char, FontDescriptor};

/// Measures the advance width of text in a font.
///
/// Implementations backed by real font metrics can replace the default
/// estimate; widths must not decrease as the size grows.
pub trait TextMeasurer: Send + Sync {
    /// Width of `text` at `size` points.
    fn width(&self, text: &str, font: &FontDescriptor, size: f32) -> f32;
}

/// Width estimate from average character advances.
#[derive(Debug, Clone, PartialEq)]
pub struct AverageWidthMeasurer {
    /// Advance of a regular character (em)
    pub char_width: f32,
    /// Advance of a wide (CJK, full-width) character (em)
    pub wide_width: f32,
    /// Advance of a space (em)
    pub space_width: f32,
}

impl Default for AverageWidthMeasurer {
    fn default() -> Self {
        Self {
            char_width: 0.5,
            wide_width: 1.0,
            space_width: 0.25,
        }
    }
}

impl TextMeasurer for AverageWidthMeasurer {
    fn width(&self, text: &str, font: &FontDescriptor, size: f32) -> f32 {
        let bold = if font.is_bold() { 1.05 } else { 1.0 };
        let ems: f32 = text
            .chars()
            .map(|c| {
                if c == ' ' {
                    self.space_width
                } else if is_wide(c) {
                    self.wide_width
                } else if c.is_control() {
                    0.0
                } else {
                    self.char_width * bold
                }
            })
            .sum();
        ems * size
    }
}

fn is_wide(c: char) -> bool {
    is_spaceless_script_char(c)
        || matches!(c as u32, 0xAC00..=0xD7AF | 0xFF01..=0xFF60 | 0xFFE0..=0xFFE6)
}

/// A breakable unit of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    /// Index of the source run
    pub source: usize,
    /// Whether a space separates it from the previous word
    pub space_before: bool,
}

/// Split text into words. Spaceless-script characters are words of their own.
pub fn split_words(text: &str, source: usize, space_before: bool, out: &mut Vec<Word>) {
    let mut pending_space = space_before;
    let mut current = String::new();

    for c in text.chars() {
        if c.is_whitespace() {
            flush_word(&mut current, &mut pending_space, source, out);
            pending_space = true;
        } else if is_spaceless_script_char(c) {
            flush_word(&mut current, &mut pending_space, source, out);
            current.push(c);
            flush_word(&mut current, &mut pending_space, source, out);
        } else {
            current.push(c);
        }
    }
    flush_word(&mut current, &mut pending_space, source, out);
}

fn flush_word(current: &mut String, pending_space: &mut bool, source: usize, out: &mut Vec<Word>) {
    if !current.is_empty() {
        out.push(Word {
            text: std::mem::take(current),
            source,
            space_before: *pending_space,
        });
        *pending_space = false;
    }
}

/// One wrapped line: a range of words.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    pub text: String,
    /// Indices of the words on the line
    pub words: std::ops::Range<usize>,
}

/// Greedy wrapping of words into lines no wider than `max_width`.
///
/// A word wider than the line is broken between characters.
pub fn wrap(words: &[Word], max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<WrappedLine> {
    let mut lines = Vec::new();
    let mut text = String::new();
    let mut start = 0;

    for (i, word) in words.iter().enumerate() {
        let candidate = if text.is_empty() {
            word.text.clone()
        } else if word.space_before {
            format!("{} {}", text, word.text)
        } else {
            format!("{}{}", text, word.text)
        };

        if measure(&candidate) <= max_width {
            text = candidate;
            continue;
        }

        if !text.is_empty() {
            lines.push(WrappedLine {
                text: std::mem::take(&mut text),
                words: start..i,
            });
            start = i;
        }

        if measure(&word.text) <= max_width {
            text = word.text.clone();
            continue;
        }

        // Break an overlong word; all pieces belong to this word.
        let mut piece = String::new();
        for c in word.text.chars() {
            piece.push(c);
            if measure(&piece) > max_width && piece.chars().count() > 1 {
                piece.pop();
                lines.push(WrappedLine {
                    text: std::mem::take(&mut piece),
                    words: i..i + 1,
                });
                piece.push(c);
            }
        }
        text = piece;
        start = i;
    }

    if !text.is_empty() {
        lines.push(WrappedLine {
            text,
            words: start..words.len(),
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> FontDescriptor {
        FontDescriptor::new("Helvetica", 10.0)
    }

    fn chars(text: &str) -> f32 {
        text.chars().count() as f32
    }

    #[test]
    fn test_average_width() {
        let m = AverageWidthMeasurer::default();
        assert_eq!(m.width("abcd", &font(), 10.0), 20.0);
        assert_eq!(m.width("ab cd", &font(), 10.0), 22.5);
        assert_eq!(m.width("日本", &font(), 10.0), 20.0);
    }

    #[test]
    fn test_width_grows_with_size() {
        let m = AverageWidthMeasurer::default();
        assert!(m.width("text", &font(), 12.0) > m.width("text", &font(), 10.0));
    }

    #[test]
    fn test_split_words() {
        let mut words = Vec::new();
        split_words("hello  world", 0, false, &mut words);
        split_words("日本語", 1, true, &mut words);
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "world", "日", "本", "語"]);
        assert!(!words[0].space_before);
        assert!(words[1].space_before);
        assert!(words[2].space_before);
        assert!(!words[3].space_before);
        assert_eq!(words[4].source, 1);
    }

    #[test]
    fn test_wrap_greedy() {
        let mut words = Vec::new();
        split_words("aaa bbb ccc dd", 0, false, &mut words);
        let lines = wrap(&words, 7.0, chars);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["aaa bbb", "ccc dd"]);
        assert_eq!(lines[1].words, 2..4);
    }

    #[test]
    fn test_wrap_breaks_long_word() {
        let mut words = Vec::new();
        split_words("ab abcdefgh", 0, false, &mut words);
        let lines = wrap(&words, 4.0, chars);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["ab", "abcd", "efgh"]);
        assert!(lines.iter().all(|l| chars(&l.text) <= 4.0));
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap(&[], 10.0, chars).is_empty());
    }
}
