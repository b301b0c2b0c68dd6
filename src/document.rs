//! Markdown-subset classifier for LLM summaries.
//!
//! The summary text is read line by line and turned into typed [`Block`]s:
//!
//! - `## Heading` becomes a [`Block::SectionTitle`]
//! - a line wrapped in `**...**` becomes a [`Block::Bold`] callout
//! - consecutive `* **...` lines group into [`Block::SpecialMentions`]
//! - consecutive `* ...` lines group into [`Block::NumberedList`]
//! - anything else is a [`Block::Paragraph`]
//!
//! Nothing here fails: unmatched markup simply falls through to a paragraph.

/// Typographic substitutions applied to all block text, in order.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("\u{201C}", "\""),
    ("\u{201D}", "\""),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{2014}", "-"),
    ("\u{2013}", "-"),
    ("\u{2026}", "..."),
    ("**", ""),
];

/// A typed layout block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    SectionTitle(String),
    Paragraph(String),
    Bold(String),
    NumberedList(Vec<String>),
    /// Quotes and notable references. Grouped separately from bullets but drawn the same way.
    SpecialMentions(Vec<String>),
}

impl Block {
    /// Items of a list block, numbered from 1
    pub fn numbered_items(&self) -> Option<Vec<String>> {
        match self {
            Block::NumberedList(items) | Block::SpecialMentions(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| format!("{}. {item}", idx + 1))
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// Parsed summary, ready for layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryDocument {
    pub blocks: Vec<Block>,
}

impl SummaryDocument {
    pub fn parse(text: &str) -> Self {
        Self {
            blocks: parse_blocks(text),
        }
    }
}

/// Replace typographic characters with ASCII equivalents, drop `**`, and trim.
pub fn sanitize(text: &str) -> String {
    let mut out = text.to_string();
    for &(from, to) in REPLACEMENTS {
        if out.contains(from) {
            out = out.replace(from, to);
        }
    }
    out.trim().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Title,
    Bold,
    SpecialMention,
    Bullet,
    Paragraph,
}

fn classify(line: &str) -> LineKind {
    if line.starts_with("##") {
        LineKind::Title
    } else if line.len() >= 4 && line.starts_with("**") && line.ends_with("**") {
        LineKind::Bold
    } else if line.starts_with("* **") {
        LineKind::SpecialMention
    } else if line.starts_with("* ") {
        LineKind::Bullet
    } else {
        LineKind::Paragraph
    }
}

/// Open list accumulation while scanning lines
#[derive(Debug, Default)]
enum Accumulation {
    #[default]
    None,
    InBullets(Vec<String>),
    InSpecialMentions(Vec<String>),
}

impl Accumulation {
    fn flush_into(&mut self, blocks: &mut Vec<Block>) {
        match std::mem::take(self) {
            Accumulation::None => {}
            Accumulation::InBullets(items) => blocks.push(Block::NumberedList(items)),
            Accumulation::InSpecialMentions(items) => blocks.push(Block::SpecialMentions(items)),
        }
    }

    fn push_bullet(&mut self, item: String, blocks: &mut Vec<Block>) {
        if !matches!(self, Accumulation::InBullets(_)) {
            self.flush_into(blocks);
            *self = Accumulation::InBullets(Vec::new());
        }
        if let Accumulation::InBullets(items) = self {
            items.push(item);
        }
    }

    fn push_special(&mut self, item: String, blocks: &mut Vec<Block>) {
        if !matches!(self, Accumulation::InSpecialMentions(_)) {
            self.flush_into(blocks);
            *self = Accumulation::InSpecialMentions(Vec::new());
        }
        if let Accumulation::InSpecialMentions(items) = self {
            items.push(item);
        }
    }
}

/// Classify every line of `text` into blocks.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut open = Accumulation::None;

    for raw in text.split('\n') {
        let line = raw.trim();

        match classify(line) {
            LineKind::Title => {
                open.flush_into(&mut blocks);
                blocks.push(Block::SectionTitle(sanitize(&line[2..])));
            }
            LineKind::Bold => {
                open.flush_into(&mut blocks);
                blocks.push(Block::Bold(sanitize(&line[2..line.len() - 2])));
            }
            LineKind::SpecialMention => {
                open.push_special(sanitize(&line[4..]), &mut blocks);
            }
            LineKind::Bullet => {
                let item = line[1..].trim();
                let item = item.strip_suffix("**").unwrap_or(item);
                open.push_bullet(sanitize(item), &mut blocks);
            }
            LineKind::Paragraph => {
                open.flush_into(&mut blocks);
                blocks.push(Block::Paragraph(sanitize(line)));
            }
        }
    }

    open.flush_into(&mut blocks);
    blocks
}
