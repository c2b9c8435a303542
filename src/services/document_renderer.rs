use serde::Serialize;

use crate::models::domain::{
    Labels, Locale, NormalizedArtifact, PlanArtifact, SheetArtifact, SummaryArtifact,
};

// Layout contract, in millimetres on an A4 portrait page.
pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN_LEFT: f32 = 12.0;
pub const RULE_END_X: f32 = 198.0;
pub const HEADER_HEIGHT: f32 = 20.0;
pub const HEADER_TITLE_Y: f32 = 13.0;
pub const FIRST_PAGE_CURSOR: f32 = 26.0;
pub const TOP_MARGIN: f32 = 20.0;
pub const BOTTOM_LIMIT: f32 = 275.0;
pub const LINE_HEIGHT: f32 = 6.0;
pub const SECTION_ADVANCE: f32 = 6.0;
pub const SECTION_LABEL_OFFSET: f32 = 2.0;
pub const SECTION_RULE_WIDTH: f32 = 0.7;
pub const BLOCK_GAP: f32 = 2.0;
pub const BULLET_X: f32 = 15.0;
pub const BULLET_Y_OFFSET: f32 = 2.3;
pub const BULLET_RADIUS: f32 = 0.8;
pub const BULLET_TEXT_X: f32 = 20.0;
pub const BULLET_TEXT_WIDTH: f32 = 176.0;
pub const PARAGRAPH_WIDTH: f32 = 186.0;

// Font sizes, in points.
pub const TITLE_FONT_SIZE: f32 = 16.0;
pub const SECTION_FONT_SIZE: f32 = 12.0;
pub const BODY_FONT_SIZE: f32 = 11.0;

/// Average Helvetica glyph advance as a fraction of the font size.
pub const AVERAGE_GLYPH_EM: f32 = 0.5;
pub const POINT_TO_MM: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const BRAND: Rgb = Rgb(37, 99, 235);
pub const WHITE: Rgb = Rgb(255, 255, 255);
pub const BLACK: Rgb = Rgb(0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Font {
    Regular,
    Bold,
}

/// One drawing instruction. Coordinates are millimetres from the top-left
/// corner; text `y` is the baseline of the first line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawOp {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        width: f32,
        color: Rgb,
    },
    Dot {
        cx: f32,
        cy: f32,
        radius: f32,
        color: Rgb,
    },
    Text {
        x: f32,
        y: f32,
        lines: Vec<String>,
        font: Font,
        size: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocument {
    pub title: String,
    pub pages: Vec<Page>,
}

/// Lays artifacts out on fixed-size pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentRenderer {
    locale: Locale,
}

impl DocumentRenderer {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn render(&self, artifact: &NormalizedArtifact) -> RenderedDocument {
        let labels = self.locale.labels();
        let document = match artifact {
            NormalizedArtifact::Summary(summary) => render_summary(summary, labels),
            NormalizedArtifact::Sheet(sheet) => render_sheet(sheet, labels),
            NormalizedArtifact::Plan(plan) => render_plan(plan, labels),
            NormalizedArtifact::Quiz(quiz) => render_sheet(&quiz.review_sheet(self.locale), labels),
        };
        log::debug!(
            "Rendered {} artifact on {} page(s)",
            artifact.mode(),
            document.pages.len()
        );
        document
    }
}

fn title_or<'a>(title: &'a str, fallback: &'a str) -> &'a str {
    if title.trim().is_empty() {
        fallback
    } else {
        title
    }
}

fn render_summary(summary: &SummaryArtifact, labels: &Labels) -> RenderedDocument {
    let mut layout = Layout::new(title_or(&summary.title, labels.summary_title));
    layout.bullet_section(labels.summary, &summary.summary);
    layout.finish()
}

fn render_sheet(sheet: &SheetArtifact, labels: &Labels) -> RenderedDocument {
    let mut layout = Layout::new(title_or(&sheet.title, labels.sheet_title));

    layout.bullet_section(labels.key_points, &sheet.key_points);

    let definitions: Vec<String> = sheet
        .definitions
        .iter()
        .map(|d| format!("{} : {}", d.term, d.definition))
        .collect();
    layout.bullet_section(labels.definitions, &definitions);

    let formulas: Vec<String> = sheet
        .formulas
        .iter()
        .map(|f| format!("{} = {}", f.label, f.value))
        .collect();
    layout.bullet_section(labels.formulas, &formulas);

    layout.bullet_section(labels.examples, &sheet.examples);

    let quiz: Vec<String> = sheet
        .quiz
        .iter()
        .enumerate()
        .map(|(i, q)| format!("Q{}. {} — {}: {}", i + 1, q.question, labels.answer, q.answer))
        .collect();
    layout.bullet_section(labels.quiz, &quiz);

    layout.finish()
}

fn render_plan(plan: &PlanArtifact, labels: &Labels) -> RenderedDocument {
    let mut layout = Layout::new(title_or(&plan.title, labels.plan_title));

    if !plan.overview.trim().is_empty() {
        layout.section(labels.overview);
        layout.paragraph(&plan.overview);
    }

    for (i, day) in plan.days.iter().enumerate() {
        let fallback = format!("{} {}", labels.day, i + 1);
        layout.section(title_or(&day.day, &fallback));
        let slots: Vec<String> = day
            .slots
            .iter()
            .map(|s| {
                if s.time.is_empty() {
                    s.task.clone()
                } else {
                    format!("{} — {}", s.time, s.task)
                }
            })
            .collect();
        layout.write_bullets(&slots);
    }

    layout.bullet_section(labels.tips, &plan.tips);
    layout.finish()
}

/// Running layout state: finished pages plus the vertical cursor on the
/// last one.
struct Layout {
    title: String,
    pages: Vec<Page>,
    y: f32,
}

impl Layout {
    fn new(title: &str) -> Self {
        let mut layout = Self {
            title: title.to_string(),
            pages: vec![Page::default()],
            y: FIRST_PAGE_CURSOR,
        };
        layout.draw_header();
        layout
    }

    fn finish(self) -> RenderedDocument {
        RenderedDocument {
            title: self.title,
            pages: self.pages,
        }
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn draw_header(&mut self) {
        self.push(DrawOp::FillRect {
            x: 0.0,
            y: 0.0,
            width: PAGE_WIDTH,
            height: HEADER_HEIGHT,
            color: BRAND,
        });
        self.push(DrawOp::Text {
            x: MARGIN_LEFT,
            y: HEADER_TITLE_Y,
            lines: vec![self.title.clone()],
            font: Font::Bold,
            size: TITLE_FONT_SIZE,
            color: WHITE,
        });
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = TOP_MARGIN;
    }

    fn at_page_top(&self) -> bool {
        self.y <= TOP_MARGIN
    }

    /// Starts a new page when `height` more millimetres would cross the
    /// bottom limit, unless the cursor already sits at the top.
    fn reserve(&mut self, height: f32) {
        if self.y + height > BOTTOM_LIMIT && !self.at_page_top() {
            self.new_page();
        }
    }

    /// Lines that fit between the top margin and the bottom limit.
    fn page_capacity() -> usize {
        ((BOTTOM_LIMIT - TOP_MARGIN) / LINE_HEIGHT).floor() as usize
    }

    fn section(&mut self, label: &str) {
        // keep a label together with at least one line of content
        self.reserve(SECTION_ADVANCE + LINE_HEIGHT);
        self.push(DrawOp::Rule {
            x1: MARGIN_LEFT,
            x2: RULE_END_X,
            y: self.y,
            width: SECTION_RULE_WIDTH,
            color: BRAND,
        });
        self.push(DrawOp::Text {
            x: MARGIN_LEFT,
            y: self.y - SECTION_LABEL_OFFSET,
            lines: vec![label.to_string()],
            font: Font::Bold,
            size: SECTION_FONT_SIZE,
            color: BLACK,
        });
        self.y += SECTION_ADVANCE;
    }

    fn bullet_section(&mut self, label: &str, items: &[String]) {
        if items.is_empty() {
            return;
        }
        self.section(label);
        self.write_bullets(items);
    }

    /// Draws each item as a wrapped bullet. An item that does not fit in the
    /// remaining space moves to a fresh page whole; only an item taller than
    /// a full page is continued over several pages.
    fn write_bullets(&mut self, items: &[String]) {
        for item in items {
            let lines = wrap_text(item, BULLET_TEXT_WIDTH, BODY_FONT_SIZE);
            self.reserve(lines.len() as f32 * LINE_HEIGHT);

            let mut first_chunk = true;
            for chunk in lines.chunks(Self::page_capacity()) {
                if !first_chunk {
                    self.new_page();
                }
                if first_chunk {
                    self.push(DrawOp::Dot {
                        cx: BULLET_X,
                        cy: self.y - BULLET_Y_OFFSET,
                        radius: BULLET_RADIUS,
                        color: BLACK,
                    });
                }
                self.push(DrawOp::Text {
                    x: BULLET_TEXT_X,
                    y: self.y,
                    lines: chunk.to_vec(),
                    font: Font::Regular,
                    size: BODY_FONT_SIZE,
                    color: BLACK,
                });
                self.y += chunk.len() as f32 * LINE_HEIGHT;
                first_chunk = false;
            }
        }
        self.y += BLOCK_GAP;
    }

    /// Unbulleted wrapped text across the full content width.
    fn paragraph(&mut self, text: &str) {
        let lines = wrap_text(text, PARAGRAPH_WIDTH, BODY_FONT_SIZE);
        self.reserve(lines.len() as f32 * LINE_HEIGHT);

        for (i, chunk) in lines.chunks(Self::page_capacity()).enumerate() {
            if i > 0 {
                self.new_page();
            }
            self.push(DrawOp::Text {
                x: MARGIN_LEFT,
                y: self.y,
                lines: chunk.to_vec(),
                font: Font::Regular,
                size: BODY_FONT_SIZE,
                color: BLACK,
            });
            self.y += chunk.len() as f32 * LINE_HEIGHT;
        }
        self.y += BLOCK_GAP;
    }
}

/// Approximate rendered width of `text` in millimetres.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * AVERAGE_GLYPH_EM * POINT_TO_MM
}

/// Greedy word wrap to `max_width` millimetres. Explicit newlines are kept;
/// words wider than a whole line are broken by character.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let max_chars = ((max_width / (font_size * AVERAGE_GLYPH_EM * POINT_TO_MM)).floor() as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split_whitespace() {
            let mut word_chars: Vec<char> = word.chars().collect();

            while word_chars.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word_chars.split_off(max_chars);
                lines.push(word_chars.iter().collect());
                word_chars = rest;
            }

            let word_len = word_chars.len();
            if word_len == 0 {
                continue;
            }
            let needed = if current_len == 0 { word_len } else { current_len + 1 + word_len };
            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word_chars);
            current_len += word_len;
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::domain::{QuizArtifact, SummaryArtifact},
        test_utils::fixtures::{sample_plan, sample_quiz, sample_sheet},
    };

    fn section_labels(document: &RenderedDocument) -> Vec<String> {
        document
            .pages
            .iter()
            .flat_map(|p| &p.ops)
            .filter_map(|op| match op {
                DrawOp::Text {
                    font: Font::Bold,
                    size,
                    lines,
                    ..
                } if *size == SECTION_FONT_SIZE => Some(lines[0].clone()),
                _ => None,
            })
            .collect()
    }

    fn bullet_texts(page: &Page) -> Vec<(f32, Vec<String>)> {
        page.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, y, lines, .. } if *x == BULLET_TEXT_X => {
                    Some((*y, lines.clone()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn wrap_text_respects_width() {
        let text = "word ".repeat(60);
        let lines = wrap_text(&text, BULLET_TEXT_WIDTH, BODY_FONT_SIZE);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, BODY_FONT_SIZE) <= BULLET_TEXT_WIDTH);
        }
        assert_eq!(lines.join(" ").split_whitespace().count(), 60);
    }

    #[test]
    fn wrap_text_keeps_newlines_and_breaks_long_words() {
        let long_word = "x".repeat(200);
        let lines = wrap_text(&format!("a\nb {}", long_word), BULLET_TEXT_WIDTH, BODY_FONT_SIZE);

        assert_eq!(lines[0], "a");
        assert_eq!(lines[1], "b");
        assert!(lines.len() >= 4);
        assert_eq!(lines[2..].concat(), long_word);
    }

    #[test]
    fn first_page_starts_with_header_band() {
        let document = DocumentRenderer::new(Locale::English)
            .render(&NormalizedArtifact::Summary(SummaryArtifact::default()));

        assert_eq!(document.pages.len(), 1);
        assert_eq!(document.title, "Summary");
        assert!(matches!(
            document.pages[0].ops[0],
            DrawOp::FillRect { color: BRAND, height, .. } if height == HEADER_HEIGHT
        ));
        match &document.pages[0].ops[1] {
            DrawOp::Text { lines, color, .. } => {
                assert_eq!(lines, &vec!["Summary".to_string()]);
                assert_eq!(*color, WHITE);
            }
            other => panic!("unexpected op: {:?}", other),
        }
    }

    #[test]
    fn overflowing_item_moves_to_next_page_whole() {
        let mut layout = Layout::new("T");
        layout.y = BOTTOM_LIMIT - LINE_HEIGHT * 2.0;

        // four wrapped lines do not fit in the two lines left
        let item = "word ".repeat(300);
        let expected_lines = wrap_text(&item, BULLET_TEXT_WIDTH, BODY_FONT_SIZE).len();
        assert!(expected_lines > 2);
        layout.write_bullets(&[item]);

        let document = layout.finish();
        assert_eq!(document.pages.len(), 2);
        assert!(bullet_texts(&document.pages[0]).is_empty());

        let on_second = bullet_texts(&document.pages[1]);
        assert_eq!(on_second.len(), 1);
        assert_eq!(on_second[0].0, TOP_MARGIN);
        assert_eq!(on_second[0].1.len(), expected_lines);
    }

    #[test]
    fn items_that_fit_stay_on_current_page() {
        let mut layout = Layout::new("T");
        let start = layout.y;
        layout.write_bullets(&["one".to_string(), "two".to_string()]);

        let document = layout.finish();
        let texts = bullet_texts(&document.pages[0]);
        assert_eq!(document.pages.len(), 1);
        assert_eq!(texts[0].0, start);
        assert_eq!(texts[1].0, start + LINE_HEIGHT);
    }

    #[test]
    fn many_bullets_paginate_without_crossing_bottom_limit() {
        let items: Vec<String> = (0..120).map(|i| format!("Point number {}", i)).collect();
        let mut layout = Layout::new("T");
        layout.write_bullets(&items);
        let document = layout.finish();

        assert!(document.pages.len() > 1);
        for page in &document.pages {
            for (y, lines) in bullet_texts(page) {
                let last_baseline = y + (lines.len() as f32 - 1.0) * LINE_HEIGHT;
                assert!(last_baseline <= BOTTOM_LIMIT);
            }
        }
        let total: usize = document
            .pages
            .iter()
            .map(|p| bullet_texts(p).len())
            .sum();
        assert_eq!(total, 120);
    }

    #[test]
    fn item_taller_than_a_page_continues_on_following_pages() {
        let capacity = Layout::page_capacity();
        let item = vec!["line"; capacity + 5].join("\n");
        let mut layout = Layout::new("T");
        layout.write_bullets(&[item]);
        let document = layout.finish();

        assert_eq!(document.pages.len(), 3);
        assert_eq!(bullet_texts(&document.pages[1])[0].1.len(), capacity);
        assert_eq!(bullet_texts(&document.pages[2])[0].1.len(), 5);
    }

    #[test]
    fn sheet_sections_follow_fixed_order() {
        let document = DocumentRenderer::new(Locale::English)
            .render(&NormalizedArtifact::Sheet(sample_sheet()));

        assert_eq!(
            section_labels(&document),
            vec!["Key points", "Definitions", "Formulas", "Examples", "Quiz"]
        );
    }

    #[test]
    fn summary_renders_summary_only() {
        let document = DocumentRenderer::new(Locale::French).render(&NormalizedArtifact::Summary(
            crate::test_utils::fixtures::sample_summary(),
        ));

        assert_eq!(section_labels(&document), vec!["Résumé"]);
        assert_eq!(document.title, "Cell biology");
    }

    #[test]
    fn plan_renders_overview_days_and_tips() {
        let document = DocumentRenderer::new(Locale::English)
            .render(&NormalizedArtifact::Plan(sample_plan()));

        assert_eq!(
            section_labels(&document),
            vec!["Overview", "Day 1", "Day 2", "Day 3", "Tips"]
        );
        let overview = document.pages[0].ops.iter().any(|op| {
            matches!(op, DrawOp::Text { x, lines, .. }
                if *x == MARGIN_LEFT && lines[0] == "Three focused days.")
        });
        assert!(overview);
        let slot = bullet_texts(&document.pages[0])
            .into_iter()
            .any(|(_, lines)| lines[0] == "18:00-18:30 — Read notes");
        assert!(slot);
    }

    #[test]
    fn quiz_is_rendered_through_review_sheet() {
        let document = DocumentRenderer::new(Locale::English)
            .render(&NormalizedArtifact::Quiz(sample_quiz(2)));

        assert_eq!(document.title, "Sample quiz (export)");
        assert_eq!(section_labels(&document), vec!["Key points", "Examples"]);
    }

    #[test]
    fn empty_quiz_still_renders_a_page() {
        let document = DocumentRenderer::new(Locale::English)
            .render(&NormalizedArtifact::Quiz(QuizArtifact::default()));
        assert_eq!(document.pages.len(), 1);
        assert_eq!(document.title, "Quiz (export)");
    }
}
