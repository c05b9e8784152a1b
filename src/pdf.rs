//! Serializes a finished [`Document`] into a PDF 1.7 file.
//!
//! Objects are rendered to byte bodies first and then written with a classic
//! cross-reference table. Output is a pure function of the document and the
//! options: no timestamps are embedded, and the trailer `/ID` is a SHA-256 of
//! the object bodies.

use crate::canvas::{Command, Document, Page};
use crate::color::Rgb;
use crate::debug::DebugLogger;
use crate::metrics::DeckMetrics;
use crate::text::{FontFace, winansi_byte};
use crate::types::Pt;
use fixed::types::I32F32;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{self, Write};

const PDF_CATALOG_ID: usize = 1;
const PDF_PAGES_ID: usize = 2;
const PDF_RESOURCES_ID: usize = 3;

#[derive(Debug, Clone)]
pub struct PdfOptions {
    /// Flate-compress page content streams.
    pub compress: bool,
    pub title: Option<String>,
    pub producer: String,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            compress: true,
            title: None,
            producer: "roastdeck".to_string(),
        }
    }
}

pub fn document_to_pdf(document: &Document, options: &PdfOptions) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    write_document(document, options, &mut out, None, None)?;
    Ok(out)
}

/// Like [`document_to_pdf`], also filling per-page content sizes and the total
/// byte count into `metrics`.
pub fn document_to_pdf_with_metrics(
    document: &Document,
    options: &PdfOptions,
    metrics: &mut DeckMetrics,
    debug: Option<&DebugLogger>,
) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    write_document(document, options, &mut out, Some(metrics), debug)?;
    Ok(out)
}

/// JPEG stream ready to become an image XObject.
struct JpegImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
    components: u8,
}

pub(crate) fn write_document<W: Write>(
    document: &Document,
    options: &PdfOptions,
    writer: &mut W,
    mut metrics: Option<&mut DeckMetrics>,
    debug: Option<&DebugLogger>,
) -> io::Result<usize> {
    let mut bodies: BTreeMap<usize, Vec<u8>> = BTreeMap::new();
    let mut next_id = PDF_RESOURCES_ID + 1;
    let mut alloc = || {
        let id = next_id;
        next_id += 1;
        id
    };

    let mut font_resources = Vec::new();
    for face in FontFace::ALL {
        let id = alloc();
        bodies.insert(id, font_object(face).into_bytes());
        font_resources.push((face.resource_name().to_string(), id));
    }

    // Images: one XObject per distinct JPEG payload.
    let mut image_resources = Vec::new();
    let mut image_names: HashMap<String, String> = HashMap::new();
    let mut by_digest: HashMap<[u8; 32], String> = HashMap::new();
    for key in collect_image_keys(document) {
        let Some(image) = document
            .images
            .get(&key)
            .and_then(|embedded| embedded.jpeg_bytes())
            .and_then(parse_jpeg)
        else {
            log::warn!("image '{key}' is not a usable JPEG; its draws are skipped");
            continue;
        };
        let digest: [u8; 32] = Sha256::digest(&image.data).into();
        if let Some(name) = by_digest.get(&digest) {
            image_names.insert(key, name.clone());
            continue;
        }
        let id = alloc();
        let name = format!("Im{}", image_resources.len() + 1);
        bodies.insert(id, image_object(&image));
        image_resources.push((name.clone(), id));
        by_digest.insert(digest, name.clone());
        image_names.insert(key, name);
    }

    let opacity_pairs = collect_opacity_pairs(document);
    let mut gs_resources = Vec::new();
    let mut gs_names: HashMap<(u16, u16), String> = HashMap::new();
    for (fill, stroke) in opacity_pairs {
        let id = alloc();
        let name = format!("GS{}", gs_resources.len() + 1);
        bodies.insert(
            id,
            format!(
                "<< /Type /ExtGState /ca {} /CA {} >>",
                format_milli(fill as i64),
                format_milli(stroke as i64)
            )
            .into_bytes(),
        );
        gs_resources.push((name.clone(), id));
        gs_names.insert((fill, stroke), name);
    }

    let mut resources = format!("<< /Font {}", resource_dict(&font_resources));
    if !image_resources.is_empty() {
        resources.push_str(&format!(" /XObject {}", resource_dict(&image_resources)));
    }
    if !gs_resources.is_empty() {
        resources.push_str(&format!(" /ExtGState {}", resource_dict(&gs_resources)));
    }
    resources.push_str(" >>");
    bodies.insert(PDF_RESOURCES_ID, resources.into_bytes());

    let page_height = document.page_size.height;
    let mut page_ids = Vec::with_capacity(document.pages.len());
    let mut content_sizes = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let content = render_page(page, page_height, &image_names, &gs_names);
        let page_id = alloc();
        let content_id = alloc();
        let stream = if options.compress {
            let packed = miniz_oxide::deflate::compress_to_vec_zlib(content.as_bytes(), 6);
            stream_object("/Filter /FlateDecode", &packed)
        } else {
            stream_object("", content.as_bytes())
        };
        content_sizes.push(stream.len());
        bodies.insert(content_id, stream);
        bodies.insert(
            page_id,
            format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources {} 0 R /Contents {} 0 R >>",
                PDF_PAGES_ID,
                fmt_pt(document.page_size.width),
                fmt_pt(page_height),
                PDF_RESOURCES_ID,
                content_id
            )
            .into_bytes(),
        );
        page_ids.push(page_id);
    }

    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    bodies.insert(
        PDF_PAGES_ID,
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_ids.len()).into_bytes(),
    );

    let mut catalog = format!("<< /Type /Catalog /Pages {PDF_PAGES_ID} 0 R");
    if options.title.is_some() {
        catalog.push_str(" /ViewerPreferences << /DisplayDocTitle true >>");
    }
    catalog.push_str(" >>");
    bodies.insert(PDF_CATALOG_ID, catalog.into_bytes());

    let info_id = alloc();
    bodies.insert(
        info_id,
        info_object(options.title.as_deref(), &options.producer).into_bytes(),
    );

    let mut hasher = Sha256::new();
    for body in bodies.values() {
        hasher.update(body);
    }
    let digest = hasher.finalize();
    let file_id: String = digest[..16].iter().map(|b| format!("{b:02X}")).collect();

    let mut offset = 0usize;
    let total_objects = bodies.len();
    let mut offsets = vec![0usize; total_objects + 1];
    write_bytes(writer, b"%PDF-1.7\n", &mut offset)?;
    write_bytes(writer, b"%\xE2\xE3\xCF\xD3\n", &mut offset)?;
    for (id, body) in &bodies {
        write_pdf_object(writer, &mut offset, &mut offsets, *id, body)?;
    }

    let xref_start = offset;
    write_str(writer, &format!("xref\n0 {}\n", total_objects + 1), &mut offset)?;
    write_bytes(writer, b"0000000000 65535 f \n", &mut offset)?;
    for obj_offset in offsets.iter().skip(1) {
        write_str(writer, &format!("{obj_offset:010} 00000 n \n"), &mut offset)?;
    }
    let trailer = format!(
        "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R /ID [<{}> <{}>] >>\nstartxref\n{}\n%%EOF\n",
        total_objects + 1,
        PDF_CATALOG_ID,
        info_id,
        file_id,
        file_id,
        xref_start
    );
    write_str(writer, &trailer, &mut offset)?;

    if let Some(logger) = debug {
        logger.log_event(
            "pdf.link",
            json!({
                "bytes": offset,
                "pages": page_ids.len(),
                "images": image_resources.len(),
                "extgstates": gs_resources.len(),
                "compressed": options.compress,
            }),
        );
        logger.increment("pdf.bytes", offset as u64);
    }
    if let Some(metrics) = metrics.as_deref_mut() {
        metrics.total_bytes = offset;
        for (index, size) in content_sizes.iter().enumerate() {
            if let Some(entry) = metrics.pages.get_mut(index) {
                entry.content_bytes = *size;
            }
        }
    }
    Ok(offset)
}

fn collect_image_keys(document: &Document) -> BTreeSet<String> {
    document
        .pages
        .iter()
        .flat_map(|page| page.commands.iter())
        .filter_map(|cmd| match cmd {
            Command::DrawImage { key, .. } => Some(key.clone()),
            _ => None,
        })
        .collect()
}

fn quantize_alpha(value: f32) -> u16 {
    ((value * 1000.0).round() as i32).clamp(0, 1000) as u16
}

fn collect_opacity_pairs(document: &Document) -> BTreeSet<(u16, u16)> {
    document
        .pages
        .iter()
        .flat_map(|page| page.commands.iter())
        .filter_map(|cmd| match cmd {
            Command::SetOpacity { fill, stroke } => {
                Some((quantize_alpha(*fill), quantize_alpha(*stroke)))
            }
            _ => None,
        })
        .collect()
}

/// Reads dimensions and component count from the first SOF marker.
fn parse_jpeg(data: Vec<u8>) -> Option<JpegImage> {
    if data.get(0..2)? != [0xFF, 0xD8] {
        return None;
    }
    let mut pos = 2usize;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // Standalone markers carry no length.
        if matches!(marker, 0x01 | 0xD0..=0xD9) {
            pos += 2;
            continue;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let seg = data.get(pos + 4..pos + 2 + len)?;
            let height = u16::from_be_bytes([*seg.get(1)?, *seg.get(2)?]) as u32;
            let width = u16::from_be_bytes([*seg.get(3)?, *seg.get(4)?]) as u32;
            let components = *seg.get(5)?;
            if width == 0 || height == 0 || !matches!(components, 1 | 3 | 4) {
                return None;
            }
            return Some(JpegImage {
                data,
                width,
                height,
                components,
            });
        }
        pos += 2 + len;
    }
    None
}

fn image_object(image: &JpegImage) -> Vec<u8> {
    let color_space = match image.components {
        1 => "/DeviceGray",
        4 => "/DeviceCMYK",
        _ => "/DeviceRGB",
    };
    // Adobe CMYK JPEGs are stored inverted.
    let decode = if image.components == 4 {
        " /Decode [1 0 1 0 1 0 1 0]"
    } else {
        ""
    };
    let dict = format!(
        "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode{}",
        image.width, image.height, color_space, decode
    );
    stream_object(&dict, &image.data)
}

fn stream_object(dict_entries: &str, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 64);
    let head = if dict_entries.is_empty() {
        format!("<< /Length {} >>\nstream\n", data.len())
    } else {
        format!("<< {} /Length {} >>\nstream\n", dict_entries, data.len())
    };
    out.extend_from_slice(head.as_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(b"\nendstream");
    out
}

fn font_object(face: FontFace) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        face.base_font()
    )
}

fn resource_dict(entries: &[(String, usize)]) -> String {
    let items = entries
        .iter()
        .map(|(name, id)| format!("/{name} {id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("<< {items} >>")
}

fn info_object(title: Option<&str>, producer: &str) -> String {
    let mut entries = Vec::new();
    if let Some(title) = title {
        entries.push(format!("/Title ({})", encode_winansi_pdf_string(title)));
    }
    entries.push(format!("/Producer ({})", encode_winansi_pdf_string(producer)));
    format!("<< {} >>", entries.join(" "))
}

fn render_page(
    page: &Page,
    page_height: Pt,
    image_names: &HashMap<String, String>,
    gs_names: &HashMap<(u16, u16), String>,
) -> String {
    let mut out = String::new();
    let mut font = FontFace::Regular;
    let mut font_size = Pt::from_i32(12);
    // Tf lives inside each BT block, so the font follows q/Q here.
    let mut font_stack: Vec<(FontFace, Pt)> = Vec::new();

    for cmd in &page.commands {
        match cmd {
            Command::SaveState => {
                font_stack.push((font, font_size));
                out.push_str("q\n");
            }
            Command::RestoreState => {
                if let Some((saved_font, saved_size)) = font_stack.pop() {
                    font = saved_font;
                    font_size = saved_size;
                }
                out.push_str("Q\n");
            }
            Command::Meta { .. } => {}
            Command::SetFillColor(color) => {
                out.push_str(&format!("{} rg\n", color_operands(*color)));
            }
            Command::SetStrokeColor(color) => {
                out.push_str(&format!("{} RG\n", color_operands(*color)));
            }
            Command::SetLineWidth(width) => out.push_str(&format!("{} w\n", fmt_pt(*width))),
            Command::SetLineCap(cap) => out.push_str(&format!("{cap} J\n")),
            Command::SetLineJoin(join) => out.push_str(&format!("{join} j\n")),
            Command::SetDash { pattern, phase } => {
                let items = pattern
                    .iter()
                    .map(|v| fmt_pt(*v))
                    .collect::<Vec<_>>()
                    .join(" ");
                out.push_str(&format!("[{}] {} d\n", items, fmt_pt(*phase)));
            }
            Command::SetOpacity { fill, stroke } => {
                let key = (quantize_alpha(*fill), quantize_alpha(*stroke));
                if let Some(name) = gs_names.get(&key) {
                    out.push_str(&format!("/{name} gs\n"));
                }
            }
            Command::SetFont(face) => font = *face,
            Command::SetFontSize(size) => font_size = *size,
            Command::MoveTo { x, y } => {
                out.push_str(&format!("{} {} m\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::LineTo { x, y } => {
                out.push_str(&format!("{} {} l\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} {} {} c\n",
                    fmt_pt(*x1),
                    fmt_pt(page_height - *y1),
                    fmt_pt(*x2),
                    fmt_pt(page_height - *y2),
                    fmt_pt(*x),
                    fmt_pt(page_height - *y),
                ));
            }
            Command::ClosePath => out.push_str("h\n"),
            Command::Fill => out.push_str("f\n"),
            Command::Stroke => out.push_str("S\n"),
            Command::FillStroke => out.push_str("B\n"),
            Command::DrawString { x, y, text } => {
                out.push_str("BT\n");
                out.push_str(&format!("/{} {} Tf\n", font.resource_name(), fmt_pt(font_size)));
                out.push_str(&format!(
                    "{} {} Td\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - font_size)
                ));
                out.push_str(&format!("({}) Tj\n", encode_winansi_pdf_string(text)));
                out.push_str("ET\n");
            }
            Command::DrawRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re\nf\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::DrawImage {
                x,
                y,
                width,
                height,
                key,
            } => {
                if let Some(name) = image_names.get(key) {
                    out.push_str("q\n");
                    out.push_str(&format!(
                        "{} 0 0 {} {} {} cm\n",
                        fmt_pt(*width),
                        fmt_pt(*height),
                        fmt_pt(*x),
                        fmt_pt(page_height - *y - *height)
                    ));
                    out.push_str(&format!("/{name} Do\n"));
                    out.push_str("Q\n");
                }
            }
        }
    }
    out
}

fn write_pdf_object<W: Write>(
    writer: &mut W,
    offset: &mut usize,
    offsets: &mut [usize],
    obj_id: usize,
    body: &[u8],
) -> io::Result<()> {
    if let Some(slot) = offsets.get_mut(obj_id) {
        *slot = *offset;
    }
    write_str(writer, &format!("{obj_id} 0 obj\n"), offset)?;
    write_bytes(writer, body, offset)?;
    write_bytes(writer, b"\nendobj\n", offset)?;
    Ok(())
}

fn write_bytes<W: Write>(writer: &mut W, data: &[u8], offset: &mut usize) -> io::Result<()> {
    writer.write_all(data)?;
    *offset += data.len();
    Ok(())
}

fn write_str<W: Write>(writer: &mut W, data: &str, offset: &mut usize) -> io::Result<()> {
    write_bytes(writer, data.as_bytes(), offset)
}

/// Encodes `input` as the body of a WinAnsi literal string. Code points with
/// no WinAnsi byte become `?`.
pub(crate) fn encode_winansi_pdf_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        let byte = winansi_byte(ch).unwrap_or(b'?');
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if b < 0x20 || b >= 0x7f => out.push_str(&format!("\\{b:03o}")),
            b => out.push(b as char),
        }
    }
    out
}

fn color_operands(color: Rgb) -> String {
    let [r, g, b] = color.components();
    format!("{} {} {}", fmt(r), fmt(g), fmt(b))
}

fn fmt(value: f32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let fixed = I32F32::from_num(value);
    let milli: i64 = (fixed * I32F32::from_num(1000)).round().to_num();
    format_milli(milli)
}

fn format_milli(milli: i64) -> String {
    if milli == 0 {
        return "0".to_string();
    }
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let int_part = abs / 1000;
    let frac_part = abs % 1000;
    if frac_part == 0 {
        format!("{sign}{int_part}")
    } else {
        let mut s = format!("{sign}{int_part}.{frac_part:03}");
        while s.ends_with('0') {
            s.pop();
        }
        s
    }
}

fn fmt_pt(value: Pt) -> String {
    format_milli(value.to_milli_i64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::EmbeddedImage;
    use crate::canvas::{Canvas, SurfaceCapabilities};
    use crate::metrics::PageMetrics;
    use crate::types::Size;
    use image::{ImageFormat, Rgb as PixelRgb, RgbImage};
    use std::io::Cursor;

    fn count_token(bytes: &[u8], token: &[u8]) -> usize {
        if token.is_empty() || bytes.len() < token.len() {
            return 0;
        }
        bytes.windows(token.len()).filter(|w| *w == token).count()
    }

    fn tiny_jpeg() -> EmbeddedImage {
        let img = RgbImage::from_pixel(4, 3, PixelRgb([200, 40, 40]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg).expect("encode jpeg");
        EmbeddedImage::from_jpeg(&out.into_inner(), 4, 3)
    }

    fn sample_document(transparency: bool) -> Document {
        let mut canvas = Canvas::with_capabilities(Size::a4(), SurfaceCapabilities { transparency });
        canvas.set_fill_color(Rgb::new(255, 0, 0));
        canvas.draw_rect(Pt::from_i32(10), Pt::from_i32(10), Pt::from_i32(50), Pt::from_i32(20));
        canvas.set_font(FontFace::Bold, Pt::from_i32(18));
        canvas.draw_string(Pt::from_i32(40), Pt::from_i32(60), "Roast (night) \u{2014} \u{1F525}");
        canvas.set_opacity(0.5, 0.5);
        canvas.show_page();
        let image = tiny_jpeg();
        canvas.register_image("cover", &image);
        canvas.register_image("again", &image);
        canvas.draw_image(Pt::ZERO, Pt::ZERO, Pt::from_i32(40), Pt::from_i32(30), "cover");
        canvas.draw_image(Pt::ZERO, Pt::from_i32(40), Pt::from_i32(40), Pt::from_i32(30), "again");
        canvas.draw_image(Pt::ZERO, Pt::from_i32(80), Pt::from_i32(40), Pt::from_i32(30), "missing");
        canvas.finish()
    }

    #[test]
    fn writes_parseable_pdf_with_expected_pages() {
        let doc = sample_document(true);
        let bytes = document_to_pdf(&doc, &PdfOptions::default()).expect("pdf");
        assert!(bytes.starts_with(b"%PDF-1.7"));
        let parsed = lopdf::Document::load_mem(&bytes).expect("lopdf parse");
        assert_eq!(parsed.get_pages().len(), 2);
    }

    #[test]
    fn identical_images_are_embedded_once() {
        let doc = sample_document(true);
        let bytes = document_to_pdf(
            &doc,
            &PdfOptions {
                compress: false,
                ..PdfOptions::default()
            },
        )
        .expect("pdf");
        assert_eq!(count_token(&bytes, b"/Subtype /Image"), 1);
        assert_eq!(count_token(&bytes, b"/Im1 Do"), 2);
        assert_eq!(count_token(&bytes, b"/DCTDecode"), 1);
    }

    #[test]
    fn uncompressed_content_flips_y_and_encodes_text() {
        let doc = sample_document(true);
        let bytes = document_to_pdf(
            &doc,
            &PdfOptions {
                compress: false,
                ..PdfOptions::default()
            },
        )
        .expect("pdf");
        let text = String::from_utf8_lossy(&bytes);
        // 841.89 - 10 - 20
        assert!(text.contains("10 811.89 50 20 re"));
        assert!(text.contains("/F2 18 Tf"));
        assert!(text.contains("(Roast \\(night\\) \\227 ?) Tj"));
        assert!(text.contains("/GS1 gs"));
        assert_eq!(count_token(&bytes, b"/Type /ExtGState"), 1);
    }

    #[test]
    fn restore_state_brings_back_the_outer_font() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_font(FontFace::Bold, Pt::from_i32(20));
        canvas.draw_string(Pt::from_i32(10), Pt::from_i32(10), "outer");
        canvas.save_state();
        canvas.set_font(FontFace::Oblique, Pt::from_i32(8));
        canvas.draw_string(Pt::from_i32(10), Pt::from_i32(40), "inner");
        canvas.restore_state();
        canvas.draw_string(Pt::from_i32(10), Pt::from_i32(70), "after");
        let doc = canvas.finish();
        let bytes = document_to_pdf(
            &doc,
            &PdfOptions {
                compress: false,
                ..PdfOptions::default()
            },
        )
        .expect("pdf");
        let text = String::from_utf8_lossy(&bytes);
        let after = text.find("(after) Tj").expect("after text");
        let last_tf = text[..after].rfind(" Tf").expect("font op");
        let line_start = text[..last_tf].rfind('\n').map_or(0, |i| i + 1);
        assert_eq!(&text[line_start..last_tf], "/F2 20");
        assert_eq!(count_token(&bytes, b"/F3 8 Tf"), 1);
    }

    #[test]
    fn non_latin_text_is_written_as_substitutes() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_font(FontFace::Regular, Pt::from_i32(12));
        canvas.draw_string(Pt::from_i32(10), Pt::from_i32(10), "\u{0141}ukasz \u{00E9} \u{0161}");
        let doc = canvas.finish();
        let bytes = document_to_pdf(
            &doc,
            &PdfOptions {
                compress: false,
                ..PdfOptions::default()
            },
        )
        .expect("pdf");
        assert_eq!(count_token(&bytes, b"(?ukasz \\351 \\232) Tj"), 1);
    }

    #[test]
    fn no_extgstate_without_transparency() {
        let doc = sample_document(false);
        let bytes = document_to_pdf(&doc, &PdfOptions::default()).expect("pdf");
        assert_eq!(count_token(&bytes, b"/ExtGState"), 0);
    }

    #[test]
    fn output_is_deterministic_and_carries_title() {
        let doc = sample_document(true);
        let options = PdfOptions {
            title: Some("Ana & Ben".to_string()),
            ..PdfOptions::default()
        };
        let a = document_to_pdf(&doc, &options).expect("pdf");
        let b = document_to_pdf(&doc, &options).expect("pdf");
        assert_eq!(a, b);
        assert_eq!(count_token(&a, b"/Title (Ana & Ben)"), 1);
        assert_eq!(count_token(&a, b"/ID [<"), 1);
    }

    #[test]
    fn compressed_streams_are_flate_and_smaller() {
        let doc = sample_document(true);
        let plain = document_to_pdf(
            &doc,
            &PdfOptions {
                compress: false,
                ..PdfOptions::default()
            },
        )
        .expect("pdf");
        let packed = document_to_pdf(&doc, &PdfOptions::default()).expect("pdf");
        assert_eq!(count_token(&packed, b"/FlateDecode"), 2);
        assert_eq!(count_token(&plain, b"/FlateDecode"), 0);
        let parsed = lopdf::Document::load_mem(&packed).expect("parse");
        let first = parsed.get_pages().values().copied().next().expect("page");
        let content = parsed.get_page_content(first).expect("content");
        assert!(String::from_utf8_lossy(&content).contains("re\nf"));
    }

    #[test]
    fn metrics_receive_sizes() {
        let doc = sample_document(true);
        let mut metrics = DeckMetrics {
            pages: vec![PageMetrics::default(), PageMetrics::default()],
            ..DeckMetrics::default()
        };
        let bytes =
            document_to_pdf_with_metrics(&doc, &PdfOptions::default(), &mut metrics, None).expect("pdf");
        assert_eq!(metrics.total_bytes, bytes.len());
        assert!(metrics.pages.iter().all(|p| p.content_bytes > 0));
    }

    #[test]
    fn jpeg_header_is_read() {
        let image = tiny_jpeg();
        let parsed = parse_jpeg(image.jpeg_bytes().expect("bytes")).expect("sof");
        assert_eq!((parsed.width, parsed.height, parsed.components), (4, 3, 3));
        assert!(parse_jpeg(b"\x89PNG".to_vec()).is_none());
    }

    #[test]
    fn format_milli_trims() {
        assert_eq!(format_milli(0), "0");
        assert_eq!(format_milli(1500), "1.5");
        assert_eq!(format_milli(-250), "-0.25");
        assert_eq!(format_milli(841_890), "841.89");
    }
}
