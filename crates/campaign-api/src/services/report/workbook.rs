use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::domain::report::REPORT_COLUMNS;
use crate::domain::{DomainError, ReportKind, ReportRow};

const HEADER_FILL: u32 = 0x1F4E78;

struct Styles {
    header: Format,
    text: Format,
    date: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin),
            text: Format::new().set_border(FormatBorder::Thin),
            date: Format::new()
                .set_border(FormatBorder::Thin)
                .set_num_format("dd/mm/yyyy hh:mm"),
        }
    }
}

/// Renders the rows into an in-memory `.xlsx` file.
pub fn build(kind: ReportKind, rows: &[ReportRow]) -> Result<Vec<u8>, DomainError> {
    render(kind, rows).map_err(|e| DomainError::Report(e.to_string()))
}

fn write_optional(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<&str>,
    format: &Format,
) -> Result<(), XlsxError> {
    match value {
        Some(value) => sheet.write_string_with_format(row, col, value, format)?,
        None => sheet.write_blank(row, col, format)?,
    };
    Ok(())
}

fn render(kind: ReportKind, rows: &[ReportRow]) -> Result<Vec<u8>, XlsxError> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(kind.sheet_name())?;

    for (col, title) in REPORT_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &styles.header)?;
    }

    for (i, record) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string_with_format(r, 0, &record.file_number, &styles.text)?;
        sheet.write_string_with_format(r, 1, &record.lot_name, &styles.text)?;
        sheet.write_datetime_with_format(r, 2, &record.recorded_at, &styles.date)?;
        sheet.write_string_with_format(r, 3, &record.customer_name, &styles.text)?;
        sheet.write_string_with_format(r, 4, &record.address, &styles.text)?;
        write_optional(sheet, r, 5, record.old_meter.as_deref(), &styles.text)?;
        write_optional(sheet, r, 6, record.new_meter.as_deref(), &styles.text)?;
        sheet.write_string_with_format(r, 7, &record.technician_name, &styles.text)?;
        write_optional(sheet, r, 8, record.last_user.as_deref(), &styles.text)?;
    }

    sheet.set_freeze_panes(1, 0)?;
    sheet.autofit();

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn builds_zip_container_for_rows_with_gaps() {
        let row = ReportRow {
            file_number: "P-01".into(),
            lot_name: "Lote 1".into(),
            recorded_at: NaiveDate::from_ymd_opt(2024, 2, 1)
                .unwrap()
                .and_hms_opt(8, 15, 0)
                .unwrap(),
            customer_name: "Ana Quispe".into(),
            address: String::new(),
            old_meter: None,
            new_meter: None,
            technician_name: "Luis Ramos".into(),
            last_user: None,
        };
        let bytes = build(ReportKind::PreCatastrals, &[row]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
