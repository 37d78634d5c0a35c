//! Export of a summary as an A4 PDF.
//!
//! Rendering happens in two steps: [`layout`] turns a summary into a flat
//! list of blocks in fixed section order, and [`render`] places those blocks
//! on pages using the built-in Helvetica faces, wrapping and paginating as it
//! goes. Keeping the layout pure lets it be tested without decoding PDF bytes.

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Pt,
};
use thiserror::Error;

use crafter_shared::constants::{DOCUMENT_AUTHOR, NOT_SPECIFIED};
use crafter_shared::summary::OutlineSection;
use crafter_shared::VideoConceptSummary;

// A4, in points
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;

const MARGIN_TOP: f32 = 50.0;
const MARGIN_BOTTOM: f32 = 50.0;
const MARGIN_LEFT: f32 = 72.0;
const MARGIN_RIGHT: f32 = 72.0;

const LINE_SPACING: f32 = 1.25;

/// Average Helvetica advance width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

const TITLE_SIZE: f32 = 24.0;
const SECTION_SIZE: f32 = 16.0;
const SUBHEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 11.0;
const OUTLINE_SIZE: f32 = 10.0;

const BULLET_INDENT: f32 = 10.0;
const OUTLINE_INDENT: f32 = 15.0;

const PLACEHOLDER_RESOLUTION: &str = "e.g., 1920x1080";
const PLACEHOLDER_ASPECT_RATIO: &str = "e.g., 16:9";
const PLACEHOLDER_DURATION: &str = "e.g., 1-2 minutes";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF rendering failed: {0}")]
    Render(String),
}

/// One layout element, in reading order.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Centred document title.
    Title(String),
    SectionTitle(String),
    Subheading(String),
    /// Bold field label, rendered with a trailing colon.
    Label(String),
    Text {
        text: String,
        size: f32,
        bold: bool,
        indent: f32,
    },
    Bullet(String),
    /// Vertical gap measured in body lines.
    Space(f32),
}

impl Block {
    fn body(text: impl Into<String>) -> Self {
        Block::Text { text: text.into(), size: BODY_SIZE, bold: false, indent: 0.0 }
    }
}

/// Document information dictionary entries.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: Vec<String>,
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        placeholder
    } else {
        trimmed
    }
}

fn section(blocks: &mut Vec<Block>, title: &str) {
    blocks.push(Block::SectionTitle(title.to_string()));
    blocks.push(Block::Space(0.5));
}

fn field(blocks: &mut Vec<Block>, label: &str, value: &str) {
    blocks.push(Block::Label(label.to_string()));
    blocks.push(Block::body(or_placeholder(value, NOT_SPECIFIED)));
    blocks.push(Block::Space(0.5));
}

fn list(blocks: &mut Vec<Block>, label: &str, items: &[String]) {
    blocks.push(Block::Label(label.to_string()));
    if items.is_empty() {
        blocks.push(Block::body(NOT_SPECIFIED));
    } else {
        for item in items {
            blocks.push(Block::Bullet(or_placeholder(item, "N/A").to_string()));
        }
    }
    blocks.push(Block::Space(0.5));
}

fn outline(blocks: &mut Vec<Block>, sections: &[OutlineSection]) {
    blocks.push(Block::Subheading("Content Structure Outline:".to_string()));
    blocks.push(Block::Space(0.5));

    if sections.is_empty() {
        blocks.push(Block::Text {
            text: NOT_SPECIFIED.to_string(),
            size: OUTLINE_SIZE,
            bold: false,
            indent: OUTLINE_INDENT,
        });
        return;
    }

    for item in sections {
        blocks.push(Block::Text {
            text: format!("Section: {}", or_placeholder(&item.section, "N/A")),
            size: OUTLINE_SIZE,
            bold: true,
            indent: 0.0,
        });
        blocks.push(Block::Text {
            text: format!("Description: {}", or_placeholder(&item.description, "N/A")),
            size: OUTLINE_SIZE,
            bold: false,
            indent: OUTLINE_INDENT,
        });
        blocks.push(Block::Space(0.3));
    }
}

/// Lay out a summary in fixed section order.
pub fn layout(summary: &VideoConceptSummary) -> Vec<Block> {
    let mut blocks = vec![
        Block::Title(summary.video_title_suggestion.trim().to_string()),
        Block::Space(2.0),
    ];

    section(&mut blocks, "Concept Overview");
    field(&mut blocks, "Core Concept", &summary.core_concept);
    field(&mut blocks, "Target Audience", &summary.target_audience.description);
    list(&mut blocks, "Key Takeaways for Audience", &summary.target_audience.key_takeaways);
    blocks.push(Block::Space(1.0));

    let visual = &summary.visual_elements;
    section(&mut blocks, "Visual Direction");
    field(&mut blocks, "Style", &visual.style);
    field(&mut blocks, "Mood & Tone", &visual.mood_tone);
    field(&mut blocks, "Color Palette", &visual.color_palette);
    list(&mut blocks, "Imagery Suggestions", &visual.imagery_suggestions);
    blocks.push(Block::Space(1.0));

    section(&mut blocks, "Key Narrative Points");
    list(&mut blocks, "Key Messages", &summary.key_messages);
    outline(&mut blocks, &summary.content_structure_outline);
    blocks.push(Block::Space(1.0));

    let tech = &summary.technical_specifications;
    section(&mut blocks, "Technical Specifications for Video Generation");
    field(&mut blocks, "Resolution", or_placeholder(&tech.resolution, PLACEHOLDER_RESOLUTION));
    field(&mut blocks, "Aspect Ratio", or_placeholder(&tech.aspect_ratio, PLACEHOLDER_ASPECT_RATIO));
    field(
        &mut blocks,
        "Target Duration(in minutes)",
        or_placeholder(&tech.target_duration, PLACEHOLDER_DURATION),
    );

    if let Some(notes) = summary.meaningful_notes() {
        blocks.push(Block::Space(1.0));
        section(&mut blocks, "Additional Notes");
        blocks.push(Block::body(notes));
    }

    blocks
}

pub fn document_info(summary: &VideoConceptSummary) -> DocumentInfo {
    let concept = summary.core_concept.trim();
    let subject_head: String = if concept.is_empty() {
        "N/A".to_string()
    } else {
        concept.chars().take(50).collect()
    };

    let mut keywords = vec!["video concept".to_string()];
    let audience = summary.target_audience.description.trim();
    if !audience.is_empty() {
        keywords.push(audience.to_string());
    }
    keywords.extend(
        summary
            .key_messages
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string),
    );

    DocumentInfo {
        title: summary.video_title_suggestion.trim().to_string(),
        author: DOCUMENT_AUTHOR.to_string(),
        subject: format!("Video Concept Summary: {subject_head}..."),
        keywords,
    }
}

/// Greedy word wrap on an estimated character budget.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(max_chars) {
                let len = line.chars().count();
                if len > 0 && len + 1 + chunk.len() > max_chars {
                    lines.push(std::mem::take(&mut line));
                }
                if !line.is_empty() {
                    line.push(' ');
                }
                line.extend(chunk.iter());
            }
        }
        lines.push(line);
    }

    lines
}

fn chars_per_line(size: f32, indent: f32) -> usize {
    let width = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT - indent;
    (width / (size * AVG_GLYPH_WIDTH)).floor() as usize
}

fn estimated_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_WIDTH
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Distance from the top edge of the current page.
    cursor: f32,
    pages: usize,
}

impl PageWriter<'_> {
    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) =
            self.doc
                .add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), format!("Page {}", self.pages));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = MARGIN_TOP;
    }

    fn line(&mut self, text: &str, size: f32, bold: bool, x: f32) {
        let height = size * LINE_SPACING;
        if self.cursor + height > PAGE_HEIGHT - MARGIN_BOTTOM {
            self.new_page();
        }
        self.cursor += height;

        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(text, size, mm(x), mm(PAGE_HEIGHT - self.cursor), font);
    }

    fn paragraph(&mut self, text: &str, size: f32, bold: bool, indent: f32) {
        for line in wrap(text, chars_per_line(size, indent)) {
            self.line(&line, size, bold, MARGIN_LEFT + indent);
        }
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Title(title) => {
                for line in wrap(title, chars_per_line(TITLE_SIZE, 0.0)) {
                    let usable = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
                    let offset = ((usable - estimated_width(&line, TITLE_SIZE)) / 2.0).max(0.0);
                    self.line(&line, TITLE_SIZE, true, MARGIN_LEFT + offset);
                }
            }
            Block::SectionTitle(title) => self.paragraph(title, SECTION_SIZE, true, 0.0),
            Block::Subheading(title) => self.paragraph(title, SUBHEADING_SIZE, true, 0.0),
            Block::Label(label) => self.paragraph(&format!("{label}:"), BODY_SIZE, true, 0.0),
            Block::Text { text, size, bold, indent } => self.paragraph(text, *size, *bold, *indent),
            Block::Bullet(item) => {
                let lines = wrap(item, chars_per_line(BODY_SIZE, BULLET_INDENT * 2.0));
                for (i, line) in lines.iter().enumerate() {
                    let text = if i == 0 { format!("- {line}") } else { line.clone() };
                    let indent = if i == 0 { BULLET_INDENT } else { BULLET_INDENT * 2.0 };
                    self.line(&text, BODY_SIZE, false, MARGIN_LEFT + indent);
                }
            }
            Block::Space(lines) => {
                self.cursor += lines * BODY_SIZE * LINE_SPACING;
            }
        }
    }
}

/// Render a summary to PDF bytes.
pub fn render(summary: &VideoConceptSummary) -> Result<Vec<u8>, PdfError> {
    let info = document_info(summary);
    let (doc, page, layer) =
        PdfDocument::new(info.title.clone(), mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Page 1");
    let doc = doc
        .with_author(info.author)
        .with_subject(info.subject)
        .with_keywords(info.keywords);

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| PdfError::Render(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| PdfError::Render(e.to_string()))?;

    let mut writer = PageWriter {
        layer: doc.get_page(page).get_layer(layer),
        doc: &doc,
        regular,
        bold,
        cursor: MARGIN_TOP,
        pages: 1,
    };
    for block in layout(summary) {
        writer.block(&block);
    }
    let pages = writer.pages;
    drop(writer);

    tracing::debug!(pages, title = %info.title, "rendered summary PDF");

    doc.save_to_bytes().map_err(|e| PdfError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crafter_shared::summary::{TargetAudience, TechnicalSpecifications};

    fn sample() -> VideoConceptSummary {
        VideoConceptSummary {
            video_title_suggestion: "Roots of Tomorrow".into(),
            core_concept: "A short film on urban tree planting and why it matters for cities".into(),
            target_audience: TargetAudience {
                description: "City dwellers aged 20-35".into(),
                key_takeaways: vec!["Trees cool streets".into(), "".into()],
            },
            key_messages: vec!["Plant one tree".into()],
            content_structure_outline: vec![OutlineSection {
                section: "Introduction".into(),
                description: "".into(),
            }],
            ..Default::default()
        }
    }

    fn titles(blocks: &[Block]) -> Vec<&str> {
        blocks
            .iter()
            .filter_map(|b| match b {
                Block::SectionTitle(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    fn contains_text(blocks: &[Block], needle: &str) -> bool {
        blocks.iter().any(|b| match b {
            Block::Text { text, .. } => text == needle,
            Block::Bullet(text) => text == needle,
            _ => false,
        })
    }

    #[test]
    fn test_section_order() {
        let blocks = layout(&sample());
        assert_eq!(blocks[0], Block::Title("Roots of Tomorrow".into()));
        assert_eq!(
            titles(&blocks),
            vec![
                "Concept Overview",
                "Visual Direction",
                "Key Narrative Points",
                "Technical Specifications for Video Generation",
            ]
        );
    }

    #[test]
    fn test_missing_values_render_placeholders() {
        let blocks = layout(&sample());
        // empty visual style
        assert!(contains_text(&blocks, NOT_SPECIFIED));
        // blank takeaway and outline description
        assert!(contains_text(&blocks, "N/A"));
        assert!(contains_text(&blocks, "Description: N/A"));
        assert!(contains_text(&blocks, PLACEHOLDER_RESOLUTION));
        assert!(contains_text(&blocks, PLACEHOLDER_DURATION));
    }

    #[test]
    fn test_technical_values_override_placeholders() {
        let mut summary = sample();
        summary.technical_specifications = TechnicalSpecifications {
            resolution: "3840x2160".into(),
            aspect_ratio: "9:16".into(),
            target_duration: "0.5".into(),
        };
        let blocks = layout(&summary);
        assert!(contains_text(&blocks, "3840x2160"));
        assert!(contains_text(&blocks, "0.5"));
        assert!(!contains_text(&blocks, PLACEHOLDER_ASPECT_RATIO));
    }

    #[test]
    fn test_additional_notes_optional() {
        let mut summary = sample();
        summary.additional_notes = "not specified".into();
        assert!(!titles(&layout(&summary)).contains(&"Additional Notes"));

        summary.additional_notes = "Shoot at golden hour".into();
        let blocks = layout(&summary);
        assert_eq!(titles(&blocks).last(), Some(&"Additional Notes"));
        assert!(contains_text(&blocks, "Shoot at golden hour"));
    }

    #[test]
    fn test_document_info() {
        let info = document_info(&sample());
        assert_eq!(info.author, "ConceptCrafterAI");
        assert_eq!(
            info.subject,
            "Video Concept Summary: A short film on urban tree planting and why it mat..."
        );
        assert_eq!(
            info.keywords,
            vec!["video concept", "City dwellers aged 20-35", "Plant one tree"]
        );
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 10), vec![""]);
        assert_eq!(wrap("a\nb", 10), vec!["a", "b"]);
    }

    #[test]
    fn test_render_produces_pdf() {
        let mut summary = sample();
        summary.key_messages = (0..120).map(|i| format!("Key message number {i}")).collect();

        let bytes = render(&summary).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
