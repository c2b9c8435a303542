use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, ObjectId, Stream, StringFormat,
};

use crate::{
    errors::{AppError, AppResult},
    services::document_renderer::{
        DrawOp, Font, Page, RenderedDocument, Rgb, LINE_HEIGHT, PAGE_HEIGHT, PAGE_WIDTH,
    },
};

const MM_TO_PT: f32 = 72.0 / 25.4;

// Cubic bezier control distance for a quarter circle.
const CIRCLE_KAPPA: f32 = 0.552_284_8;

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

/// Serializes laid-out pages into a PDF file using the standard Helvetica
/// fonts, so nothing has to be embedded.
pub fn write_pdf(document: &RenderedDocument) -> AppResult<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR_FONT => regular_id,
            BOLD_FONT => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let page_id = write_page(&mut doc, pages_id, page)?;
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            real(0.0),
            real(0.0),
            real(PAGE_WIDTH * MM_TO_PT),
            real(PAGE_HEIGHT * MM_TO_PT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(encode_win_ansi(&document.title), StringFormat::Literal),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| AppError::InternalError(format!("PDF serialization error: {}", e)))?;

    log::debug!(
        "Wrote PDF '{}' ({} pages, {} bytes)",
        document.title,
        page_count,
        buffer.len()
    );
    Ok(buffer)
}

fn write_page(doc: &mut Document, pages_id: ObjectId, page: &Page) -> AppResult<ObjectId> {
    let mut operations = Vec::new();
    for op in &page.ops {
        draw(&mut operations, op);
    }

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

fn draw(operations: &mut Vec<Operation>, op: &DrawOp) {
    match op {
        DrawOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        } => {
            operations.push(fill_color(*color));
            operations.push(Operation::new(
                "re",
                vec![
                    real(to_pt(*x)),
                    real(flip_y(y + height)),
                    real(to_pt(*width)),
                    real(to_pt(*height)),
                ],
            ));
            operations.push(Operation::new("f", vec![]));
        }
        DrawOp::Rule {
            x1,
            x2,
            y,
            width,
            color,
        } => {
            let (r, g, b) = unit_rgb(*color);
            operations.push(Operation::new("RG", vec![real(r), real(g), real(b)]));
            operations.push(Operation::new("w", vec![real(to_pt(*width))]));
            operations.push(Operation::new("m", vec![real(to_pt(*x1)), real(flip_y(*y))]));
            operations.push(Operation::new("l", vec![real(to_pt(*x2)), real(flip_y(*y))]));
            operations.push(Operation::new("S", vec![]));
        }
        DrawOp::Dot {
            cx,
            cy,
            radius,
            color,
        } => {
            operations.push(fill_color(*color));
            circle(operations, to_pt(*cx), flip_y(*cy), to_pt(*radius));
            operations.push(Operation::new("f", vec![]));
        }
        DrawOp::Text {
            x,
            y,
            lines,
            font,
            size,
            color,
        } => {
            let font_name = match font {
                Font::Regular => REGULAR_FONT,
                Font::Bold => BOLD_FONT,
            };
            operations.push(Operation::new("BT", vec![]));
            operations.push(fill_color(*color));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(font_name.as_bytes().to_vec()), real(*size)],
            ));
            operations.push(Operation::new("TL", vec![real(to_pt(LINE_HEIGHT))]));
            operations.push(Operation::new("Td", vec![real(to_pt(*x)), real(flip_y(*y))]));
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    operations.push(Operation::new("T*", vec![]));
                }
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
                ));
            }
            operations.push(Operation::new("ET", vec![]));
        }
    }
}

fn circle(operations: &mut Vec<Operation>, cx: f32, cy: f32, r: f32) {
    let k = r * CIRCLE_KAPPA;
    operations.push(Operation::new("m", vec![real(cx + r), real(cy)]));
    let arcs = [
        [cx + r, cy + k, cx + k, cy + r, cx, cy + r],
        [cx - k, cy + r, cx - r, cy + k, cx - r, cy],
        [cx - r, cy - k, cx - k, cy - r, cx, cy - r],
        [cx + k, cy - r, cx + r, cy - k, cx + r, cy],
    ];
    for arc in arcs {
        operations.push(Operation::new("c", arc.iter().map(|v| real(*v)).collect()));
    }
}

fn fill_color(color: Rgb) -> Operation {
    let (r, g, b) = unit_rgb(color);
    Operation::new("rg", vec![real(r), real(g), real(b)])
}

fn unit_rgb(Rgb(r, g, b): Rgb) -> (f32, f32, f32) {
    (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

fn real(value: f32) -> Object {
    value.into()
}

fn to_pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

/// Page coordinates grow downwards; PDF user space grows upwards.
fn flip_y(mm_from_top: f32) -> f32 {
    (PAGE_HEIGHT - mm_from_top) * MM_TO_PT
}

/// Maps text onto the WinAnsi code page used by the standard fonts.
/// Characters outside it become '?'.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            'Œ' => 0x8C,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            'œ' => 0x9C,
            'Ÿ' => 0x9F,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}
