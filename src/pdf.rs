//! PDF page text.
//!
//! Only the leading pages are read. A page whose content stream fails to
//! inflate or parse ends the walk and keeps what came before it; a document
//! that cannot be opened yields no text.

use std::fmt::Display;
use std::io::Read;

use flate2::read::ZlibDecoder;
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId, Stream};

/// Why a single page could not be read.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// The page tree or a content stream object is malformed.
    #[error("malformed page: {0}")]
    Structure(#[from] lopdf::Error),
    /// A `FlateDecode` content stream does not inflate.
    #[error("content stream does not inflate: {0}")]
    Inflate(#[from] std::io::Error),
}

/// Extract text from at most `max_pages` leading pages of a PDF body.
///
/// Blocking and CPU-bound: call from `spawn_blocking`.
pub fn pdf_text(bytes: &[u8], max_pages: usize) -> String {
    let document = match Document::load_mem(bytes) {
        Ok(document) => document,
        Err(e) => {
            tracing::debug!(error = %e, "PDF could not be opened");
            return String::new();
        }
    };

    let pages: Vec<(u32, ObjectId)> = document.get_pages().into_iter().collect();
    collect_pages(
        pages
            .into_iter()
            .map(|(number, page_id)| page_text(&document, number, page_id)),
        max_pages,
    )
}

fn page_text(document: &Document, number: u32, page_id: ObjectId) -> Result<String, PageError> {
    Content::decode(&page_content(document, page_id)?)?;
    Ok(document.extract_text(&[number])?)
}

/// Concatenated, decoded content streams of one page.
///
/// lopdf tolerates streams that fail to inflate, so `FlateDecode` streams
/// are inflated here first and any error is kept.
fn page_content(document: &Document, page_id: ObjectId) -> Result<Vec<u8>, PageError> {
    let mut content = Vec::new();
    for stream_id in document.get_page_contents(page_id) {
        let stream = document.get_object(stream_id)?.as_stream()?;
        if is_flate(stream) {
            ZlibDecoder::new(stream.content.as_slice()).read_to_end(&mut Vec::new())?;
        }
        if stream.dict.has(b"Filter") {
            content.extend(stream.decompressed_content()?);
        } else {
            content.extend_from_slice(&stream.content);
        }
        content.push(b'\n');
    }
    Ok(content)
}

fn is_flate(stream: &Stream) -> bool {
    let is_flate_name = |object: &Object| matches!(object, Object::Name(name) if name.as_slice() == b"FlateDecode");
    match stream.dict.get(b"Filter") {
        Ok(Object::Array(filters)) => filters.first().is_some_and(is_flate_name),
        Ok(filter) => is_flate_name(filter),
        Err(_) => false,
    }
}

/// Join page texts in order, stopping at the first failed page or after
/// `max_pages` pages.
pub fn collect_pages<I, E>(pages: I, max_pages: usize) -> String
where
    I: IntoIterator<Item = Result<String, E>>,
    E: Display,
{
    let mut text = String::new();
    for (index, page) in pages.into_iter().take(max_pages).enumerate() {
        match page {
            Ok(page_text) => {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&page_text);
            }
            Err(e) => {
                tracing::debug!(page = index + 1, error = %e, "PDF page failed, keeping earlier pages");
                break;
            }
        }
    }
    text
}
