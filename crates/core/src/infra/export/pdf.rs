use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

use super::layout::{Page, PageLayout, MM_TO_PT};
use super::ExportError;

const FONT_KEY: &str = "F1";

/// 割り付け済みページを PDF バイト列に書き出す
pub fn render_pdf(pages: &[Page], layout: &PageLayout) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_KEY => font_id,
        },
    });

    let width_pt = layout.page_width_mm * MM_TO_PT;
    let height_pt = layout.page_height_mm * MM_TO_PT;
    let x_pt = layout.margin_mm * MM_TO_PT;

    let mut page_ids = Vec::with_capacity(pages.len());
    for page in pages {
        let mut operations = Vec::with_capacity(page.lines.len() * 5);
        for line in page.lines.iter().filter(|l| !l.text.is_empty()) {
            // PDF 座標は左下原点
            let y_pt = height_pt - line.y_mm * MM_TO_PT;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![
                    Object::Name(FONT_KEY.as_bytes().to_vec()),
                    Object::Real(layout.font_size_pt),
                ],
            ));
            operations.push(Operation::new(
                "Td",
                vec![Object::Real(x_pt), Object::Real(y_pt)],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(latin1_bytes(&line.text), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| ExportError::Pdf(format!("Content encode failed: {e}")))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width_pt),
                Object::Real(height_pt),
            ],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Count" => page_ids.len() as i64,
        "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ExportError::Pdf(format!("PDF write failed: {e}")))?;
    Ok(buffer)
}

/// Latin-1 範囲の文字を1バイトに落とす（範囲外は割り付け時に置換済み）
fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(c as u32).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::export::layout::paginate;

    #[test]
    fn test_render_produces_one_pdf_page_per_layout_page() {
        let layout = PageLayout::default();
        let text = vec!["FIRST INFORMATION REPORT"; 100].join("\n");
        let pages = paginate(&text, &layout);
        let bytes = render_pdf(&pages, &layout).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), pages.len());
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn test_latin1_bytes() {
        assert_eq!(latin1_bytes("Café"), vec![b'C', b'a', b'f', 0xE9]);
        assert_eq!(latin1_bytes("₹"), vec![b'?']);
    }
}
