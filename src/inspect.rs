//! Re-reads a generated artifact with an independent PDF parser.

use lopdf::content::Content;
use lopdf::{Document as LoDocument, Object as LoObject};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfInspectErrorCode {
    PdfParseFailed,
    PdfEncryptedUnsupported,
    PdfEmptyOrNoPages,
    PdfPageCountMismatch,
    PdfIoError,
}

impl PdfInspectErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdfInspectErrorCode::PdfParseFailed => "PDF_PARSE_FAILED",
            PdfInspectErrorCode::PdfEncryptedUnsupported => "PDF_ENCRYPTED_UNSUPPORTED",
            PdfInspectErrorCode::PdfEmptyOrNoPages => "PDF_EMPTY_OR_NO_PAGES",
            PdfInspectErrorCode::PdfPageCountMismatch => "PDF_PAGE_COUNT_MISMATCH",
            PdfInspectErrorCode::PdfIoError => "PDF_IO_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInspectError {
    pub code: PdfInspectErrorCode,
    pub message: String,
}

impl std::fmt::Display for PdfInspectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for PdfInspectError {}

#[derive(Debug, Clone, PartialEq)]
pub struct PageInspect {
    pub width: f32,
    pub height: f32,
    /// Strings shown with `Tj`, decoded as Latin-1.
    pub texts: Vec<String>,
    pub image_draws: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfInspectReport {
    pub pdf_version: String,
    pub page_count: usize,
    pub encrypted: bool,
    pub file_size_bytes: usize,
    pub title: Option<String>,
    pub pages: Vec<PageInspect>,
}

fn number(obj: &LoObject) -> Option<f32> {
    match obj {
        LoObject::Integer(v) => Some(*v as f32),
        LoObject::Real(v) => Some(*v as f32),
        _ => None,
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}

fn inspect_page(pdf: &LoDocument, page_id: lopdf::ObjectId) -> PageInspect {
    let (width, height) = pdf
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"MediaBox").ok())
        .and_then(|obj| obj.as_array().ok())
        .and_then(|arr| Some((number(arr.get(2)?)?, number(arr.get(3)?)?)))
        .unwrap_or((0.0, 0.0));

    let mut texts = Vec::new();
    let mut image_draws = 0usize;
    let operations = pdf
        .get_page_content(page_id)
        .ok()
        .and_then(|bytes| Content::decode(&bytes).ok())
        .map(|content| content.operations)
        .unwrap_or_default();
    for op in operations {
        match op.operator.as_str() {
            "Tj" => {
                if let Some(LoObject::String(bytes, _)) = op.operands.first() {
                    texts.push(latin1(bytes));
                }
            }
            "Do" => image_draws += 1,
            _ => {}
        }
    }
    PageInspect {
        width,
        height,
        texts,
        image_draws,
    }
}

fn document_title(pdf: &LoDocument) -> Option<String> {
    let info = match pdf.trailer.get(b"Info").ok()? {
        LoObject::Reference(id) => pdf.get_dictionary(*id).ok()?,
        LoObject::Dictionary(dict) => dict,
        _ => return None,
    };
    match info.get(b"Title").ok()? {
        LoObject::String(bytes, _) => Some(latin1(bytes)),
        _ => None,
    }
}

pub fn inspect_pdf_bytes(bytes: &[u8]) -> Result<PdfInspectReport, PdfInspectError> {
    let pdf = LoDocument::load_mem(bytes).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfParseFailed,
        message: err.to_string(),
    })?;

    let pages: Vec<PageInspect> = pdf
        .get_pages()
        .values()
        .map(|id| inspect_page(&pdf, *id))
        .collect();
    Ok(PdfInspectReport {
        pdf_version: pdf.version.clone(),
        page_count: pages.len(),
        encrypted: pdf.is_encrypted(),
        file_size_bytes: bytes.len(),
        title: document_title(&pdf),
        pages,
    })
}

pub fn inspect_pdf_path(path: &Path) -> Result<PdfInspectReport, PdfInspectError> {
    let data = std::fs::read(path).map_err(|err| PdfInspectError {
        code: PdfInspectErrorCode::PdfIoError,
        message: err.to_string(),
    })?;
    inspect_pdf_bytes(&data)
}

/// Checks that a parsed artifact is a usable deck of `expected_pages` pages.
pub fn require_deck_integrity(
    report: &PdfInspectReport,
    expected_pages: usize,
) -> Result<(), PdfInspectError> {
    if report.encrypted {
        return Err(PdfInspectError {
            code: PdfInspectErrorCode::PdfEncryptedUnsupported,
            message: "generated pdf is unexpectedly encrypted".to_string(),
        });
    }
    if report.page_count == 0 {
        return Err(PdfInspectError {
            code: PdfInspectErrorCode::PdfEmptyOrNoPages,
            message: "pdf has no pages".to_string(),
        });
    }
    if report.page_count != expected_pages {
        return Err(PdfInspectError {
            code: PdfInspectErrorCode::PdfPageCountMismatch,
            message: format!(
                "pdf has {} pages, document had {}",
                report.page_count, expected_pages
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::pdf::{PdfOptions, document_to_pdf};
    use crate::text::FontFace;
    use crate::types::{Pt, Size};
    use std::io::Write;

    fn two_page_pdf() -> Vec<u8> {
        let mut canvas = Canvas::new(Size::letter());
        canvas.set_font(FontFace::Regular, Pt::from_i32(12));
        canvas.draw_string(Pt::from_i32(72), Pt::from_i32(72), "first (page)");
        canvas.show_page();
        canvas.draw_string(Pt::from_i32(72), Pt::from_i32(72), "caf\u{e9}");
        let options = PdfOptions {
            title: Some("Inspect me".to_string()),
            ..PdfOptions::default()
        };
        document_to_pdf(&canvas.finish(), &options).expect("pdf")
    }

    #[test]
    fn reads_pages_texts_and_title() {
        let bytes = two_page_pdf();
        let report = inspect_pdf_bytes(&bytes).expect("inspect");
        assert_eq!(report.page_count, 2);
        assert!(!report.encrypted);
        assert_eq!(report.file_size_bytes, bytes.len());
        assert_eq!(report.pdf_version, "1.7");
        assert_eq!(report.title.as_deref(), Some("Inspect me"));
        assert_eq!(report.pages[0].texts, vec!["first (page)"]);
        assert_eq!(report.pages[1].texts, vec!["caf\u{e9}"]);
        assert_eq!((report.pages[0].width, report.pages[0].height), (612.0, 792.0));
        assert!(require_deck_integrity(&report, 2).is_ok());
    }

    #[test]
    fn rejects_malformed_data() {
        let err = inspect_pdf_bytes(b"not a pdf").expect_err("invalid");
        assert_eq!(err.code, PdfInspectErrorCode::PdfParseFailed);
    }

    #[test]
    fn integrity_checks_page_count() {
        let report = inspect_pdf_bytes(&two_page_pdf()).expect("inspect");
        let err = require_deck_integrity(&report, 3).expect_err("mismatch");
        assert_eq!(err.code, PdfInspectErrorCode::PdfPageCountMismatch);

        let empty = PdfInspectReport {
            page_count: 0,
            pages: Vec::new(),
            ..report
        };
        let err = require_deck_integrity(&empty, 0).expect_err("empty");
        assert_eq!(err.code, PdfInspectErrorCode::PdfEmptyOrNoPages);
    }

    #[test]
    fn path_and_bytes_agree() {
        let bytes = two_page_pdf();
        let path = std::env::temp_dir().join(format!(
            "roastdeck_inspect_{}_{}.pdf",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        let mut f = std::fs::File::create(&path).expect("create");
        f.write_all(&bytes).expect("write");
        drop(f);

        let from_path = inspect_pdf_path(&path).expect("inspect path");
        let from_bytes = inspect_pdf_bytes(&bytes).expect("inspect bytes");
        assert_eq!(from_path, from_bytes);
        let _ = std::fs::remove_file(&path);

        let err = inspect_pdf_path(&path).expect_err("removed");
        assert_eq!(err.code, PdfInspectErrorCode::PdfIoError);
    }
}
