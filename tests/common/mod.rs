#![allow(dead_code)]

use event_docs::model::Participant;
use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, Stream};

/// Builds a minimal but well-formed PDF with the given number of empty pages.
///
/// `width` ends up in the MediaBox so tests can tell the pages of different
/// fixture documents apart after merging.
pub fn tiny_pdf(page_count: usize, width: i64) -> Vec<u8> {
    build_tiny_pdf(page_count, width, false)
}

/// Like [`tiny_pdf`], but the MediaBox lives only on the page-tree root, so
/// every page relies on attribute inheritance.
pub fn tiny_pdf_inheriting(page_count: usize, width: i64) -> Vec<u8> {
    build_tiny_pdf(page_count, width, true)
}

fn build_tiny_pdf(page_count: usize, width: i64, inherit_media_box: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let media_box = vec![0.into(), 0.into(), width.into(), 842.into()];

    let mut kids = Vec::new();
    for _ in 0..page_count {
        let content = Content {
            operations: Vec::new(),
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode empty content stream"),
        ));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if !inherit_media_box {
            page.set("MediaBox", media_box.clone());
        }
        let page_id = doc.add_object(page);
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    let mut pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    if inherit_media_box {
        pages.set("MediaBox", media_box);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize fixture pdf");
    bytes
}

/// Participant fixture with profile fields derived from the name.
pub fn participant(id: u64, name: &str) -> Participant {
    Participant {
        id,
        display_name: name.to_string(),
        first_name: name.to_string(),
        last_name: "Tester".to_string(),
        birth_date: chrono::NaiveDate::from_ymd_opt(2001, 4, 2),
        organisation: Some("Test Org".to_string()),
        allergies: String::new(),
        annotation: String::new(),
    }
}
