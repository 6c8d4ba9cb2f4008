//! Test fixtures shared by unit tests.

use std::path::Path;

use lopdf::{Document, Object, Stream, dictionary};

use crate::upload::{PDF_MIME_TYPE, UploadedFile};

/// Build a one-page PDF whose media box width is `marker`.
pub fn single_page_pdf(marker: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(marker),
            Object::Integer(842),
        ],
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => Object::Integer(1),
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Media box widths of every page, in page order.
pub fn page_markers(pdf: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_dictionary(page_id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            media_box[2].as_i64().unwrap()
        })
        .collect()
}

/// Write a marked single-page PDF into `dir` and describe it as an upload.
pub fn pdf_upload(dir: &Path, name: &str, marker: i64) -> UploadedFile {
    let path = dir.join(format!("upload-{marker}"));
    let content = single_page_pdf(marker);
    std::fs::write(&path, &content).unwrap();
    UploadedFile::new(path, name, PDF_MIME_TYPE, content.len() as u64)
}
