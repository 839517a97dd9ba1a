use anyhow::{anyhow, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

const DOCUMENT_XML: &str = "word/document.xml";

/// Body paragraphs of a DOCX file in document order.
///
/// Only paragraphs directly under `w:body` count; text in tables, text
/// boxes, headers and footers lives elsewhere and is skipped.
pub(crate) fn parse_paragraphs(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).with_context(|| "failed to read docx zip archive")?;
    let mut xml = Vec::new();
    archive
        .by_name(DOCUMENT_XML)
        .with_context(|| format!("docx is missing {}", DOCUMENT_XML))?
        .read_to_end(&mut xml)
        .with_context(|| "failed to read docx document content")?;
    paragraphs_from_xml(&xml)
}

fn paragraphs_from_xml(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(Cursor::new(xml));
    reader.trim_text(false);
    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    // w:p elements nested inside the current body paragraph (text boxes)
    let mut nested = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                match name.as_slice() {
                    b"w:p" if is_body_level(&stack) => current = Some(String::new()),
                    b"w:p" if current.is_some() => nested += 1,
                    b"w:t" if current.is_some() && nested == 0 => in_text = true,
                    _ => {}
                }
                stack.push(name);
            }
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" if is_body_level(&stack) => paragraphs.push(String::new()),
                b"w:tab" if nested == 0 && in_run(&stack) => {
                    if let Some(paragraph) = current.as_mut() {
                        paragraph.push('\t');
                    }
                }
                b"w:br" | b"w:cr" if nested == 0 && in_run(&stack) => {
                    if let Some(paragraph) = current.as_mut() {
                        paragraph.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => {
                stack.pop();
                match e.name().as_ref() {
                    b"w:t" => in_text = false,
                    b"w:p" if is_body_level(&stack) => {
                        if let Some(paragraph) = current.take() {
                            paragraphs.push(paragraph);
                        }
                    }
                    b"w:p" if current.is_some() => nested = nested.saturating_sub(1),
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if in_text {
                    if let Some(paragraph) = current.as_mut() {
                        paragraph.push_str(&e.unescape()?);
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if in_text {
                    if let Some(paragraph) = current.as_mut() {
                        let raw = e.into_inner();
                        paragraph.push_str(&String::from_utf8_lossy(raw.as_ref()));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(anyhow!(
                    "failed to parse docx xml at position {}: {}",
                    reader.buffer_position(),
                    err
                ));
            }
        }
        buf.clear();
    }
    Ok(paragraphs)
}

fn is_body_level(stack: &[Vec<u8>]) -> bool {
    stack
        .last()
        .map(|name| name.as_slice() == b"w:body")
        .unwrap_or(false)
}

fn in_run(stack: &[Vec<u8>]) -> bool {
    stack.iter().any(|name| name.as_slice() == b"w:r")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    pub(crate) fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            body
        );
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("[Content_Types].xml", FileOptions::default())
            .unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer
            .start_file(DOCUMENT_XML, FileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn joins_runs_within_a_paragraph() {
        let docx = docx_with_body(
            "<w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>world</w:t></w:r></w:p>\
             <w:p><w:r><w:t xml:space=\"preserve\">  second &amp; last</w:t></w:r></w:p>",
        );
        let paragraphs = parse_paragraphs(&docx).unwrap();
        assert_eq!(paragraphs, vec!["Hello world", "  second & last"]);
    }

    #[test]
    fn keeps_empty_paragraphs_in_order() {
        let docx = docx_with_body(
            "<w:p><w:r><w:t>one</w:t></w:r></w:p><w:p/><w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr></w:p><w:p><w:r><w:t>two</w:t></w:r></w:p>",
        );
        let paragraphs = parse_paragraphs(&docx).unwrap();
        assert_eq!(paragraphs, vec!["one", "", "", "two"]);
    }

    #[test]
    fn skips_tables() {
        let docx = docx_with_body(
            "<w:p><w:r><w:t>before</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:t>after</w:t></w:r></w:p>",
        );
        let paragraphs = parse_paragraphs(&docx).unwrap();
        assert_eq!(paragraphs, vec!["before", "after"]);
    }

    #[test]
    fn tabs_and_breaks_inside_runs() {
        let docx = docx_with_body(
            "<w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr>\
             <w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p>",
        );
        let paragraphs = parse_paragraphs(&docx).unwrap();
        assert_eq!(paragraphs, vec!["a\tb\nc"]);
    }

    #[test]
    fn text_box_paragraphs_are_not_merged_into_the_body() {
        let docx = docx_with_body(
            "<w:p><w:r><w:t>body</w:t></w:r><w:r><w:pict><w:txbxContent>\
             <w:p><w:r><w:t>boxed</w:t></w:r></w:p></w:txbxContent></w:pict></w:r></w:p>",
        );
        let paragraphs = parse_paragraphs(&docx).unwrap();
        assert_eq!(paragraphs, vec!["body"]);
    }

    #[test]
    fn rejects_non_zip_input() {
        let err = parse_paragraphs(b"plain text pretending to be docx").unwrap_err();
        assert!(err.to_string().contains("zip"));
    }

    #[test]
    fn rejects_zip_without_document_part() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", FileOptions::default())
            .unwrap();
        writer.write_all(b"<w:styles/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        let err = parse_paragraphs(&bytes).unwrap_err();
        assert!(err.to_string().contains(DOCUMENT_XML));
    }
}
