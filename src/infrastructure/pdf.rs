//! PDF text extraction

use crate::infrastructure::traits::TextExtractor;
use async_trait::async_trait;
use di::injectable;
use lopdf::Document;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Pdf(#[from] lopdf::Error),

    #[error("extraction was interrupted: {0}")]
    Interrupted(#[from] tokio::task::JoinError),
}

#[injectable(TextExtractor)]
pub struct PdfTextExtractor;

/// Text of each page, ordered by page number.
pub fn extract_pages(document: &[u8]) -> Result<Vec<String>, lopdf::Error> {
    let document = Document::load_mem(document)?;

    document
        .get_pages()
        .keys()
        .map(|&page_number| document.extract_text(&[page_number]))
        .collect()
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, document: Vec<u8>) -> Result<String, ExtractError> {
        let pages = tokio::task::spawn_blocking(move || extract_pages(&document)).await??;

        Ok(pages.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    fn pdf_with_pages(texts: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_pages_in_order() {
        let pages = extract_pages(&pdf_with_pages(&["Syllabus", "Timetable", "Contacts"])).unwrap();

        assert_eq!(pages.len(), 3);
        assert!(pages[0].contains("Syllabus"));
        assert!(pages[1].contains("Timetable"));
        assert!(pages[2].contains("Contacts"));
    }

    #[test]
    fn test_not_a_pdf() {
        assert!(extract_pages(b"plain text, not a PDF").is_err());
    }

    #[tokio::test]
    async fn test_extract_concatenates_pages() {
        let text = PdfTextExtractor
            .extract(pdf_with_pages(&["Hello", "World"]))
            .await
            .unwrap();

        let hello = text.find("Hello").unwrap();
        let world = text.find("World").unwrap();
        assert!(hello < world);
    }

    #[tokio::test]
    async fn test_extract_reports_parse_errors() {
        let result = PdfTextExtractor.extract(b"%PDF-1.5 broken".to_vec()).await;

        assert!(matches!(result, Err(ExtractError::Pdf(_))));
    }
}
