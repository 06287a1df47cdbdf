//! Text Extraction Adapter - 上传文档文本提取
//!
//! 按文件名后缀分发（大小写不敏感）：
//! - 无后缀 / .txt: 按 UTF-8 解码，忽略非法字节
//! - .pdf: 逐页提取文本，换行符拼接
//! - .docx: 逐段落提取文本，换行符拼接
//! - 其他后缀: 不支持

use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// 文本提取错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Uploaded file is empty")]
    EmptyUpload,

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// 文档解析成功但提取结果为空白
    #[error("Unable to extract text from {format}")]
    EmptyExtraction { format: &'static str },

    /// 文档字节无法解析
    #[error("Unable to extract text from {format}")]
    InvalidDocument { format: &'static str },
}

/// 从上传的文档中提取纯文本
///
/// 前置条件：`data` 非空，否则返回 EmptyUpload
pub fn extract_text(data: &[u8], declared_filename: &str) -> Result<String, ExtractionError> {
    if data.is_empty() {
        return Err(ExtractionError::EmptyUpload);
    }

    let suffix = Path::new(declared_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match suffix.as_str() {
        "" | "txt" => Ok(decode_text_ignoring_invalid(data)),
        "pdf" => extract_pdf(data),
        "docx" => extract_docx(data),
        other => Err(ExtractionError::UnsupportedFormat(format!(".{}", other))),
    }
}

/// UTF-8 解码，丢弃无法解码的字节（不替换为占位符）
fn decode_text_ignoring_invalid(data: &[u8]) -> String {
    let mut text = String::with_capacity(data.len());
    let mut rest = data;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                text.push_str(valid);
                break;
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match err.error_len() {
                    Some(len) => rest = &after[len..],
                    // 末尾截断的序列，直接丢弃
                    None => break,
                }
            }
        }
    }
    text
}

fn extract_pdf(data: &[u8]) -> Result<String, ExtractionError> {
    let doc = lopdf::Document::load_mem(data).map_err(|e| invalid_document("PDF", &e))?;

    // 逐页提取；单页提取失败视为空页
    let mut pages: Vec<String> = Vec::new();
    for (page_number, _) in doc.get_pages() {
        pages.push(doc.extract_text(&[page_number]).unwrap_or_default());
    }

    let joined = pages.join("\n");
    if joined.trim().is_empty() {
        return Err(ExtractionError::EmptyExtraction { format: "PDF" });
    }
    Ok(joined)
}

fn extract_docx(data: &[u8]) -> Result<String, ExtractionError> {
    let cursor = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor).map_err(|e| invalid_document("DOCX", &e))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| invalid_document("DOCX", &e))?
        .read_to_string(&mut xml)
        .map_err(|e| invalid_document("DOCX", &e))?;

    let joined = parse_docx_paragraphs(&xml)?.join("\n");
    if joined.trim().is_empty() {
        return Err(ExtractionError::EmptyExtraction { format: "DOCX" });
    }
    Ok(joined)
}

/// 解析 WordprocessingML，按段落（w:p）聚合文本运行（w:t）
fn parse_docx_paragraphs(xml: &str) -> Result<Vec<String>, ExtractionError> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader
            .read_event()
            .map_err(|e| invalid_document("DOCX", &e))?
        {
            Event::Start(start) => {
                if start.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Event::End(end) => match end.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Text(text) if in_text_run => {
                let unescaped = text.unescape().map_err(|e| invalid_document("DOCX", &e))?;
                current.push_str(&unescaped);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs)
}

fn invalid_document(format: &'static str, err: &dyn std::fmt::Display) -> ExtractionError {
    tracing::warn!(format, error = %err, "Failed to parse uploaded document");
    ExtractionError::InvalidDocument { format }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        use zip::write::SimpleFileOptions;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn pdf_bytes(text: &str) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

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
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
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
    fn test_empty_upload_rejected() {
        assert_eq!(extract_text(b"", "notes.txt"), Err(ExtractionError::EmptyUpload));
    }

    #[test]
    fn test_plain_text_passthrough() {
        let text = extract_text("Hello world".as_bytes(), "notes.txt").unwrap();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn test_missing_suffix_treated_as_text() {
        let text = extract_text("no extension".as_bytes(), "README").unwrap();
        assert_eq!(text, "no extension");
    }

    #[test]
    fn test_invalid_utf8_bytes_dropped() {
        let data = b"He\xff\xfello";
        assert_eq!(extract_text(data, "notes.txt").unwrap(), "Hello");
    }

    #[test]
    fn test_unsupported_suffix_rejected() {
        let err = extract_text(b"binary", "payload.EXE").unwrap_err();
        assert_eq!(err, ExtractionError::UnsupportedFormat(".exe".to_string()));
        assert_eq!(err.to_string(), "Unsupported file format: .exe");
    }

    #[test]
    fn test_docx_paragraphs_joined_with_newlines() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Hello</w:t></w:r></w:p>
    <w:p><w:r><w:t>World </w:t></w:r><w:r><w:t>again</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let text = extract_text(&docx_bytes(xml), "story.docx").unwrap();
        assert_eq!(text, "Hello\nWorld again");
    }

    #[test]
    fn test_docx_uppercase_suffix_accepted() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Hi</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(extract_text(&docx_bytes(xml), "STORY.DOCX").unwrap(), "Hi");
    }

    #[test]
    fn test_docx_whitespace_only_is_empty_extraction() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>   </w:t></w:r></w:p><w:p/></w:body></w:document>"#;
        let err = extract_text(&docx_bytes(xml), "blank.docx").unwrap_err();
        assert_eq!(err, ExtractionError::EmptyExtraction { format: "DOCX" });
        assert_eq!(err.to_string(), "Unable to extract text from DOCX");
    }

    #[test]
    fn test_docx_garbage_bytes_rejected() {
        let err = extract_text(b"not a zip archive", "broken.docx").unwrap_err();
        assert_eq!(err, ExtractionError::InvalidDocument { format: "DOCX" });
    }

    #[test]
    fn test_pdf_text_extracted() {
        let text = extract_text(&pdf_bytes("Hello World"), "doc.pdf").unwrap();
        assert!(text.contains("Hello World"), "got: {:?}", text);
    }

    #[test]
    fn test_pdf_garbage_bytes_rejected() {
        let err = extract_text(b"%PDF-???", "broken.pdf").unwrap_err();
        assert_eq!(err, ExtractionError::InvalidDocument { format: "PDF" });
        assert_eq!(err.to_string(), "Unable to extract text from PDF");
    }
}
