//! Advance widths of the builtin Helvetica face.
//!
//! Builtin PDF fonts are not embedded, so their metrics have to come from the Adobe font metrics
//! rather than from font data. Widths are in thousandths of the font size.

const DEFAULT_WIDTH: u16 = 556;

// Printable ASCII, starting at U+0020.
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Returns the advance width of `c` in thousandths of the font size.
pub fn char_width(c: char) -> u16 {
    match c {
        ' '..='~' => ASCII_WIDTHS[c as usize - 0x20],
        '\u{a0}' => 278,
        '\u{2018}' | '\u{2019}' | '\u{201a}' => 222,
        '\u{201c}' | '\u{201d}' | '\u{201e}' => 333,
        '\u{2013}' => 556,
        '\u{2014}' => 1000,
        '\u{2022}' => 350,
        '\u{2026}' => 1000,
        'é' | 'è' | 'ê' | 'ë' | 'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 556,
        'í' | 'ì' | 'î' | 'ï' => 278,
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ú' | 'ù' | 'û' | 'ü' | 'ñ' => 556,
        'ç' => 500,
        _ => DEFAULT_WIDTH,
    }
}
