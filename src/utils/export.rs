//! Attendance report rendering to XLSX and PDF.
//!
//! Reports are built as a title block, a list of summary statistics and one
//! table; both renderers consume the same `Report`. Files go back to clients
//! as base64 `data:` URIs.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};
use serde::Serialize;
use strum_macros::EnumString;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};

/// Longest span a single export may cover.
pub const MAX_EXPORT_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ExportFormat {
    #[strum(serialize = "pdf")]
    Pdf,
    #[strum(serialize = "xlsx", serialize = "excel")]
    Xlsx,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format!("{n}"),
        }
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Number(n as f64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub title: String,
    pub subtitle: Option<String>,
    pub period: String,
    pub generated_at: String,
    pub stats: Vec<(String, String)>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportPayload {
    pub status: &'static str,
    pub file_name: String,
    pub content_type: &'static str,
    /// `data:<mime>;base64,<bytes>`
    pub content: String,
}

pub fn data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", STANDARD.encode(bytes))
}

pub fn render(report: &Report, format: ExportFormat) -> ApiResult<Vec<u8>> {
    match format {
        ExportFormat::Xlsx => render_xlsx(report).map_err(|e| ApiError::Export(e.to_string())),
        ExportFormat::Pdf => render_pdf(report).map_err(|e| ApiError::Export(e.to_string())),
    }
}

pub fn export(report: &Report, format: ExportFormat, file_stem: &str) -> ApiResult<ExportPayload> {
    let bytes = render(report, format)?;
    Ok(ExportPayload {
        status: "success",
        file_name: format!("{file_stem}.{}", format.extension()),
        content_type: format.content_type(),
        content: data_uri(format.content_type(), &bytes),
    })
}

fn render_xlsx(report: &Report) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    let mut workbook = Workbook::new();
    let title_format = Format::new().set_bold().set_font_size(16).set_align(FormatAlign::Center);
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
        .set_align(FormatAlign::Center);
    let stat_format = Format::new().set_bold().set_background_color(Color::RGB(0xD9E1F2));

    let sheet = workbook.add_worksheet();
    sheet.set_name("Attendance Report")?;

    let last_col = report.headers.len().saturating_sub(1).max(1) as u16;
    let title = match &report.subtitle {
        Some(sub) => format!("{} - {sub}", report.title),
        None => report.title.clone(),
    };
    sheet.merge_range(0, 0, 0, last_col, &title, &title_format)?;
    sheet.write_string(1, 0, format!("Period: {}", report.period))?;
    sheet.write_string(2, 0, format!("Generated on: {}", report.generated_at))?;

    let mut row: u32 = 4;
    for (label, value) in &report.stats {
        sheet.write_string_with_format(row, 0, label, &stat_format)?;
        sheet.write_string(row, 1, value)?;
        row += 1;
    }

    row += 1;
    for (col, header) in report.headers.iter().enumerate() {
        sheet.write_string_with_format(row, col as u16, header, &header_format)?;
        sheet.set_column_width(col as u16, 16)?;
    }
    for cells in &report.rows {
        row += 1;
        for (col, cell) in cells.iter().enumerate() {
            match cell {
                Cell::Text(s) => sheet.write_string(row, col as u16, s)?,
                Cell::Number(n) => sheet.write_number(row, col as u16, *n)?,
            };
        }
    }

    workbook.save_to_buffer()
}

const PAGE_W: f32 = 297.0;
const PAGE_H: f32 = 210.0;
const MARGIN: f32 = 12.0;
const LINE: f32 = 6.0;

/// Writes lines top to bottom, starting a new page when one fills up.
struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, printpdf::Error> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_H - MARGIN,
        })
    }

    fn ensure_room(&mut self) {
        if self.y < MARGIN + LINE {
            let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_H - MARGIN;
        }
    }

    fn text(&mut self, text: &str, size: f32, bold: bool) {
        self.ensure_room();
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(MARGIN), Mm(self.y), font);
        self.y -= LINE;
    }

    fn columns(&mut self, cells: &[String], bold: bool) {
        self.ensure_room();
        let width = (PAGE_W - 2.0 * MARGIN) / cells.len().max(1) as f32;
        let font = if bold { &self.bold } else { &self.regular };
        for (i, cell) in cells.iter().enumerate() {
            let x = MARGIN + width * i as f32;
            self.layer.use_text(cell.as_str(), 9.0, Mm(x), Mm(self.y), font);
        }
        self.y -= LINE;
    }

    fn gap(&mut self) {
        self.y -= LINE / 2.0;
    }

    fn finish(self) -> Result<Vec<u8>, printpdf::Error> {
        self.doc.save_to_bytes()
    }
}

fn render_pdf(report: &Report) -> Result<Vec<u8>, printpdf::Error> {
    let mut pdf = PdfWriter::new(&report.title)?;

    pdf.text(&report.title, 18.0, true);
    if let Some(sub) = &report.subtitle {
        pdf.text(sub, 13.0, false);
    }
    pdf.text(&format!("Period: {}", report.period), 10.0, false);
    pdf.text(&format!("Generated on {}", report.generated_at), 8.0, false);
    pdf.gap();

    if !report.stats.is_empty() {
        pdf.text("Summary Statistics", 12.0, true);
        for (label, value) in &report.stats {
            pdf.text(&format!("{label}: {value}"), 10.0, false);
        }
        pdf.gap();
    }

    pdf.columns(&report.headers, true);
    for cells in &report.rows {
        let line: Vec<String> = cells.iter().map(Cell::display).collect();
        pdf.columns(&line, false);
    }

    pdf.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample(rows: usize) -> Report {
        Report {
            title: "Attendance Report".into(),
            subtitle: Some("Nusrat Jahan".into()),
            period: "2026-03-01 to 2026-03-31".into(),
            generated_at: "2026-04-01 09:00:00".into(),
            stats: vec![("Present Days".into(), "20".into())],
            headers: vec!["Date".into(), "Status".into(), "Hours".into()],
            rows: (0..rows)
                .map(|i| vec![Cell::from(format!("2026-03-{:02}", i % 28 + 1)), "Present".into(), 8.5.into()])
                .collect(),
        }
    }

    #[test]
    fn format_parsing() {
        assert_eq!(ExportFormat::from_str("PDF").ok(), Some(ExportFormat::Pdf));
        assert_eq!(ExportFormat::from_str("excel").ok(), Some(ExportFormat::Xlsx));
        assert!(ExportFormat::from_str("csv").is_err());
    }

    #[test]
    fn xlsx_is_a_zip() {
        let bytes = render(&sample(5), ExportFormat::Xlsx).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn pdf_spans_pages() {
        let bytes = render(&sample(120), ExportFormat::Pdf).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn payload_is_data_uri() {
        let payload = export(&sample(1), ExportFormat::Pdf, "attendance_report_7").unwrap();
        assert_eq!(payload.file_name, "attendance_report_7.pdf");
        assert!(payload.content.starts_with("data:application/pdf;base64,"));
    }
}
