//! Paragraph layout for the overview block.
//!
//! Text is split into segments at embedded newlines, each segment is broken into lines that fit
//! the box width, and every line except the last one of a segment is justified. Line breaking
//! follows CJK rules: besides breaking after whitespace, a line may break between any two
//! characters when one of them belongs to a script that does not separate words with spaces, and
//! a run without any break opportunity that is wider than the box is split between characters.
//!
//! Layout is independent of the PDF writer; widths come from a [`TextMeasure`] implementation.

use std::ops::Range;

use crate::fonts::TextMeasure;

/// Typographic parameters of a paragraph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParagraphStyle {
    pub font_size: f64,
    pub leading: f64,
    pub width: f64,
}

impl ParagraphStyle {
    pub fn new(font_size: f64, leading: f64, width: f64) -> Self {
        Self {
            font_size,
            leading,
            width,
        }
    }
}

/// A run of text placed at a horizontal offset from the left edge of the box.
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub x: f64,
}

/// One laid out line.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    /// The text of the line as it would read without justification.
    pub text: String,
    pub fragments: Vec<Fragment>,
    /// Width of the line before justification.
    pub natural_width: f64,
    pub justified: bool,
}

/// A paragraph broken into positioned lines.
#[derive(Clone, Debug, PartialEq)]
pub struct ParagraphLayout {
    pub lines: Vec<Line>,
    pub font_size: f64,
    pub leading: f64,
}

impl ParagraphLayout {
    /// Total height occupied by the paragraph.
    pub fn height(&self) -> f64 {
        self.lines.len() as f64 * self.leading
    }

    /// Baselines of every line for a paragraph whose top edge sits at `top`.
    ///
    /// The block is anchored at its top: its bottom edge lands at `top - height()`, so longer
    /// text grows downwards.
    pub fn baselines(&self, top: f64) -> Vec<f64> {
        let bottom = top - self.height();
        let first = bottom + self.height() - self.font_size;
        (0..self.lines.len())
            .map(|index| first - index as f64 * self.leading)
            .collect()
    }
}

/// Splits free text into forced-break segments.
///
/// Newlines (`\n`, `\r\n` and `\r`) separate segments. Inside a segment runs of whitespace
/// collapse to one space and the edges are trimmed. Blank segments inside the text are kept as
/// empty lines, trailing blank segments are dropped.
pub fn split_segments(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut segments: Vec<String> = normalized
        .split('\n')
        .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();

    while segments.last().map_or(false, |segment| segment.is_empty()) {
        segments.pop();
    }

    segments
}

/// Lays out `text` into lines that fit `style.width`.
pub fn layout_paragraph(
    text: &str,
    measure: &dyn TextMeasure,
    style: &ParagraphStyle,
) -> ParagraphLayout {
    let mut lines = Vec::new();

    for segment in split_segments(text) {
        let chars: Vec<char> = segment.chars().collect();
        let ranges = break_lines(&chars, measure, style.font_size, style.width);
        let count = ranges.len();

        for (index, range) in ranges.into_iter().enumerate() {
            let justify = index + 1 < count;
            lines.push(build_line(&chars[range], measure, style, justify));
        }
    }

    ParagraphLayout {
        lines,
        font_size: style.font_size,
        leading: style.leading,
    }
}

/// Returns whether `c` belongs to a script written without spaces between words.
pub fn is_wide(c: char) -> bool {
    matches!(
        c as u32,
        0x0E00..=0x0E7F      // Thai
            | 0x0E80..=0x0EFF // Lao
            | 0x1000..=0x109F // Myanmar
            | 0x1780..=0x17FF // Khmer
            | 0x1100..=0x11FF // Hangul Jamo
            | 0x2E80..=0x2FDF // CJK radicals
            | 0x3000..=0x30FF // CJK punctuation, kana
            | 0x3100..=0x31FF // Bopomofo, kana extensions
            | 0x3200..=0x4DBF // enclosed CJK, extension A
            | 0x4E00..=0x9FFF // CJK unified ideographs
            | 0xA000..=0xA4CF // Yi
            | 0xAC00..=0xD7AF // Hangul syllables
            | 0xF900..=0xFAFF // CJK compatibility ideographs
            | 0xFE30..=0xFE4F // CJK compatibility forms
            | 0xFF00..=0xFFEF // full-width forms
            | 0x20000..=0x3FFFF
    )
}

fn cannot_start_line(c: char) -> bool {
    matches!(
        c,
        ')' | ']' | '}' | '.' | ',' | ';' | ':' | '!' | '?' | '%' | '\u{2019}' | '\u{201d}'
            | '、' | '。' | '，' | '．' | '・' | '：' | '；' | '？' | '！' | '）' | '」' | '』'
            | '】' | '〕' | '〉' | '》' | '〙' | '〗' | 'ー' | '々' | 'ゝ' | 'ゞ' | 'ヽ' | 'ヾ'
            | '…'
    )
}

fn cannot_end_line(c: char) -> bool {
    matches!(
        c,
        '(' | '[' | '{' | '\u{2018}' | '\u{201c}' | '（' | '「' | '『' | '【' | '〔' | '〈' | '《'
    )
}

fn can_break_between(prev: char, next: char) -> bool {
    if prev.is_whitespace() {
        return true;
    }
    if next.is_whitespace() || cannot_start_line(next) || cannot_end_line(prev) {
        return false;
    }
    is_wide(prev) || is_wide(next)
}

fn trimmed_end(chars: &[char], start: usize, end: usize) -> usize {
    let mut end = end;
    while end > start && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    end
}

fn break_lines(
    chars: &[char],
    measure: &dyn TextMeasure,
    font_size: f64,
    width: f64,
) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut last_break: Option<usize> = None;
    let mut line_width = 0.0;
    let mut pending_space = 0.0;
    let mut index = 0;

    while index < chars.len() {
        let c = chars[index];

        if index > start && can_break_between(chars[index - 1], c) {
            last_break = Some(index);
        }

        if c.is_whitespace() {
            pending_space += measure.char_width(c, font_size);
            index += 1;
            continue;
        }

        let advance = measure.char_width(c, font_size);
        let candidate = line_width + pending_space + advance;

        if candidate > width && index > start {
            let end = match last_break {
                Some(position) if position > start => position,
                _ => index,
            };
            lines.push(start..trimmed_end(chars, start, end));

            start = end;
            while start < chars.len() && chars[start].is_whitespace() {
                start += 1;
            }
            index = start;
            last_break = None;
            line_width = 0.0;
            pending_space = 0.0;
            continue;
        }

        line_width = candidate;
        pending_space = 0.0;
        index += 1;
    }

    if start < chars.len() || lines.is_empty() {
        lines.push(start..trimmed_end(chars, start, chars.len()));
    }

    lines
}

fn build_line(
    chars: &[char],
    measure: &dyn TextMeasure,
    style: &ParagraphStyle,
    justify: bool,
) -> Line {
    let text: String = chars.iter().collect();
    let natural_width = measure.text_width(&text, style.font_size);
    let extra = style.width - natural_width;

    if !justify || extra <= 0.0 || chars.len() < 2 {
        return Line {
            fragments: vec![Fragment {
                text: text.clone(),
                x: 0.0,
            }],
            text,
            natural_width,
            justified: false,
        };
    }

    let has_spaces = chars.iter().any(|c| *c == ' ');
    let spread_over_characters = !has_spaces || chars.iter().any(|c| is_wide(*c));

    let fragments = if spread_over_characters {
        let gap = extra / (chars.len() - 1) as f64;
        let mut x = 0.0;
        chars
            .iter()
            .map(|c| {
                let fragment = Fragment {
                    text: c.to_string(),
                    x,
                };
                x += measure.char_width(*c, style.font_size) + gap;
                fragment
            })
            .filter(|fragment| fragment.text != " ")
            .collect()
    } else {
        let words: Vec<&str> = text.split(' ').collect();
        let gap = extra / (words.len() - 1) as f64;
        let space = measure.char_width(' ', style.font_size);
        let mut x = 0.0;
        words
            .into_iter()
            .map(|word| {
                let fragment = Fragment {
                    text: word.to_owned(),
                    x,
                };
                x += measure.text_width(word, style.font_size) + space + gap;
                fragment
            })
            .collect()
    };

    Line {
        text,
        fragments,
        natural_width,
        justified: true,
    }
}
