//! Glyph widths for the two standard PDF fonts the digest uses.
//!
//! Widths are the Adobe AFM advance widths in 1/1000 em. `widths` covers ASCII
//! 0x20..=0x7E (index = code - 32) and `high` covers the WinAnsi punctuation
//! block 0x80..=0x9F (index = byte - 0x80). Anything else is measured with
//! `fallback`, which is close enough for the odd Latin-1 letter.

/// WinAnsi bytes 0x80..=0x9F and the characters they stand for
#[rustfmt::skip]
const WIN_ANSI_HIGH: &[(char, u8)] = &[
    ('\u{20AC}', 0x80), ('\u{201A}', 0x82), ('\u{0192}', 0x83), ('\u{201E}', 0x84),
    ('\u{2026}', 0x85), ('\u{2020}', 0x86), ('\u{2021}', 0x87), ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89), ('\u{0160}', 0x8A), ('\u{2039}', 0x8B), ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E), ('\u{2018}', 0x91), ('\u{2019}', 0x92), ('\u{201C}', 0x93),
    ('\u{201D}', 0x94), ('\u{2022}', 0x95), ('\u{2013}', 0x96), ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98), ('\u{2122}', 0x99), ('\u{0161}', 0x9A), ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C), ('\u{017E}', 0x9E), ('\u{0178}', 0x9F),
];

/// WinAnsiEncoding byte for `c`, if the standard fonts can show it.
pub fn win_ansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => WIN_ANSI_HIGH.iter().find(|&&(ch, _)| ch == c).map(|&(_, byte)| byte),
    }
}

/// Standard Type 1 face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
}

impl Face {
    /// PostScript name of the base-14 font
    pub fn base_font(self) -> &'static str {
        match self {
            Face::Regular => "Helvetica",
            Face::Bold => "Helvetica-Bold",
        }
    }

    /// Resource name used in page content streams
    pub fn resource_name(self) -> &'static str {
        match self {
            Face::Regular => "F1",
            Face::Bold => "F2",
        }
    }

    fn table(self) -> &'static WidthTable {
        match self {
            Face::Regular => &HELVETICA,
            Face::Bold => &HELVETICA_BOLD,
        }
    }

    /// Width of `s` in points at `size` points.
    pub fn measure(self, s: &str, size: f32) -> f32 {
        self.table().measure(s) * size / 1000.0
    }
}

struct WidthTable {
    widths: [u16; 95],
    high: [u16; 32],
    fallback: u16,
}

impl WidthTable {
    fn measure(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let width = match win_ansi_byte(c) {
                    Some(b @ 0x20..=0x7E) => self.widths[b as usize - 32],
                    Some(b @ 0x80..=0x9F) => self.high[b as usize - 0x80],
                    _ => self.fallback,
                };
                width as f32
            })
            .sum()
    }
}

#[rustfmt::skip]
static HELVETICA: WidthTable = WidthTable {
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0-9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A-Z
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a-z
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {    |    }    ~
        334, 260, 334, 584,
    ],
    high: [
        // Euro  -  quotesinglbase florin quotedblbase ellipsis dagger daggerdbl
        556, 0, 222, 556, 333, 1000, 556, 556,
        // circumflex perthousand Scaron guilsinglleft OE  -  Zcaron  -
        333, 1000, 667, 333, 1000, 0, 611, 0,
        // -  quoteleft quoteright quotedblleft quotedblright bullet endash emdash
        0, 222, 222, 333, 333, 350, 556, 1000,
        // tilde trademark scaron guilsinglright oe  -  zcaron Ydieresis
        333, 1000, 500, 333, 944, 0, 500, 667,
    ],
    fallback: 556,
};

#[rustfmt::skip]
static HELVETICA_BOLD: WidthTable = WidthTable {
    widths: [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        333, 333, 584, 584, 584, 611, 975,
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        333, 278, 333, 584, 556, 333,
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        389, 280, 389, 584,
    ],
    high: [
        556, 0, 278, 556, 500, 1000, 556, 556,
        333, 1000, 667, 333, 1000, 0, 611, 0,
        0, 278, 278, 500, 500, 350, 556, 1000,
        333, 1000, 556, 333, 944, 0, 500, 667,
    ],
    fallback: 611,
};

/// Greedy word wrap of `text` into lines no wider than `max_width` points.
///
/// Words wider than a whole line are broken by character. Empty input yields
/// a single empty line so the caller still advances the cursor.
pub fn wrap(text: &str, face: Face, size: f32, max_width: f32) -> Vec<String> {
    let space = face.measure(" ", size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in text.split_whitespace() {
        let word_width = face.measure(word, size);

        if word_width > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for piece in break_word(word, face, size, max_width) {
                current_width = face.measure(&piece, size);
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current = piece;
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + space + word_width > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_width = word_width;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += space + word_width;
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn break_word(word: &str, face: Face, size: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for c in word.chars() {
        let mut candidate = piece.clone();
        candidate.push(c);
        if !piece.is_empty() && face.measure(&candidate, size) > max_width {
            pieces.push(std::mem::take(&mut piece));
            piece.push(c);
        } else {
            piece = candidate;
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}
