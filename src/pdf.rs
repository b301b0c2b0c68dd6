use std::path::Path;

use eyre::{Result, WrapErr};
use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};

use crate::document::{Block, SummaryDocument};
use crate::metrics::{self, Face};

pub const DEFAULT_HEADER: &str = "NeuralBee - Podcast Summarizer";
pub const DEFAULT_CLOSING_TITLE: &str = "Generated By Neural Bee";
pub const DEFAULT_OUTPUT: &str = "podcast_summary.pdf";

const MM: f32 = 72.0 / 25.4;

// A4 portrait
const PAGE_WIDTH: f32 = 210.0 * MM;
const PAGE_HEIGHT: f32 = 297.0 * MM;

const MARGIN: f32 = 10.0 * MM;
const BREAK_MARGIN: f32 = 20.0 * MM;
const CELL_PADDING: f32 = 1.0 * MM;
const LINE_HEIGHT: f32 = 10.0 * MM;

const HEADER_GAP: f32 = 5.0 * MM;
const TITLE_GAP: f32 = 5.0 * MM;
const BLOCK_GAP: f32 = 2.0 * MM;

const HEADER_SIZE: f32 = 12.0;
const TITLE_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 12.0;

/// Fixed strings stamped onto every digest
#[derive(Debug, Clone)]
pub struct PageStyle {
    /// Running header, drawn at the top of every page
    pub header: String,
    /// Section title appended after all summary content
    pub closing_title: String,
}

impl Default for PageStyle {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            closing_title: DEFAULT_CLOSING_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

/// One line of text positioned on a page, in PDF user space (origin bottom-left)
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub face: Face,
    pub size: f32,
    pub x: f32,
    pub baseline: f32,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub runs: Vec<TextRun>,
}

impl Page {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.runs.iter().map(|r| r.text.as_str())
    }
}

struct Layout<'a> {
    style: &'a PageStyle,
    pages: Vec<Page>,
    /// Distance of the cursor from the top edge
    y: f32,
}

impl<'a> Layout<'a> {
    fn new(style: &'a PageStyle) -> Self {
        let mut layout = Self {
            style,
            pages: Vec::new(),
            y: 0.0,
        };
        layout.add_page();
        layout
    }

    fn add_page(&mut self) {
        self.pages.push(Page::default());
        self.y = MARGIN;
        let header = self.style.header.clone();
        self.cell(&header, Face::Bold, HEADER_SIZE, Align::Center);
        self.y += HEADER_GAP;
    }

    fn cell(&mut self, text: &str, face: Face, size: f32, align: Align) {
        if self.y + LINE_HEIGHT > PAGE_HEIGHT - BREAK_MARGIN {
            self.add_page();
        }

        let x = match align {
            Align::Left => MARGIN + CELL_PADDING,
            Align::Center => (PAGE_WIDTH - face.measure(text, size)) / 2.0,
        };
        let baseline = PAGE_HEIGHT - (self.y + LINE_HEIGHT / 2.0 + 0.3 * size);

        if !text.is_empty() {
            if let Some(page) = self.pages.last_mut() {
                page.runs.push(TextRun {
                    face,
                    size,
                    x,
                    baseline,
                    text: text.to_string(),
                });
            }
        }
        self.y += LINE_HEIGHT;
    }

    fn wrapped(&mut self, text: &str, face: Face, size: f32, align: Align) {
        let width = PAGE_WIDTH - 2.0 * (MARGIN + CELL_PADDING);
        for line in metrics::wrap(text, face, size, width) {
            self.cell(&line, face, size, align);
        }
    }

    fn section_title(&mut self, title: &str) {
        self.wrapped(title, Face::Bold, TITLE_SIZE, Align::Center);
        self.y += TITLE_GAP;
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::SectionTitle(title) => self.section_title(title),
            Block::Paragraph(text) => {
                self.wrapped(text, Face::Regular, BODY_SIZE, Align::Left);
                self.y += BLOCK_GAP;
            }
            Block::Bold(text) => {
                self.wrapped(text, Face::Bold, BODY_SIZE, Align::Left);
                self.y += BLOCK_GAP;
            }
            Block::NumberedList(_) | Block::SpecialMentions(_) => {
                for item in block.numbered_items().unwrap_or_default() {
                    self.wrapped(&item, Face::Regular, BODY_SIZE, Align::Left);
                }
                self.y += BLOCK_GAP;
            }
        }
    }
}

/// Lay out the summary blocks onto A4 pages.
pub fn layout(summary: &SummaryDocument, style: &PageStyle) -> Vec<Page> {
    let mut layout = Layout::new(style);
    for block in &summary.blocks {
        layout.block(block);
    }
    layout.section_title(&style.closing_title);
    layout.pages
}

/// Map text onto WinAnsiEncoding bytes. Characters with no single-byte form become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(|c| metrics::win_ansi_byte(c).unwrap_or(b'?')).collect()
}

/// Serialize laid-out pages into a PDF document.
pub fn build_document(pages: &[Page], style: &PageStyle) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Face::Regular.base_font(),
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Face::Bold.base_font(),
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            Face::Regular.resource_name() => regular_id,
            Face::Bold.resource_name() => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let mut operations = Vec::with_capacity(page.runs.len() * 5);
        for run in &page.runs {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec![run.face.resource_name().into(), run.size.into()]));
            operations.push(Operation::new("Td", vec![run.x.into(), run.baseline.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(&run.text), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(encode_win_ansi(&style.header), StringFormat::Literal),
        "Producer" => Object::string_literal(concat!("ytdigest ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    Ok(doc)
}

/// Render a summary and write the PDF to `path`.
pub fn write_pdf(summary: &SummaryDocument, style: &PageStyle, path: &Path) -> Result<()> {
    let pages = layout(summary, style);
    debug!("Laid out {} blocks on {} page(s)", summary.blocks.len(), pages.len());
    let mut doc = build_document(&pages, style)?;
    doc.save(path)
        .wrap_err_with(|| format!("failed to write PDF to {}", path.display()))?;
    Ok(())
}
