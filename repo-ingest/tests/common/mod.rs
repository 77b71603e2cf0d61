#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::fs::write;
use tempfile::NamedTempFile;

/// One-page PDF whose only text is `line`.
pub fn single_page_pdf(line: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 11.into()]),
            Operation::new("Td", vec![50.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(line)]),
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
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
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

/// Temp file holding `contents`, named with `suffix` so the advisory filename is realistic.
pub fn upload(contents: &[u8], suffix: &str) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .prefix("requirements")
        .suffix(suffix)
        .tempfile()
        .expect("temp upload");
    write(file.path(), contents).expect("writing temp upload");
    file
}

/// Config pointing both the API and raw-content host at `base_url`.
pub fn config_for(base_url: &str) -> NamedTempFile {
    let yaml = format!(
        "github:\n  api_base_url: \"{base_url}\"\n  raw_base_url: \"{base_url}\"\nlimits:\n  request_timeout_secs: 5\n  fetch_concurrency: 2\n"
    );
    upload(yaml.as_bytes(), ".yaml")
}
