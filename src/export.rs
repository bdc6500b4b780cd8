//! Report writers: quoted CSV text and an Excel workbook with one sheet per
//! task set.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use rust_xlsxwriter::{
    ColNum, Format, FormatAlign, RowNum, Table, TableColumn, TableStyle, Workbook, Worksheet,
    XlsxError,
};

use crate::error::ExportError;
use crate::fields::OutputFormat;
use crate::report::{Cell, ReportRow, HEADER};

const CSV_DELIM: &str = ",";
const CSV_EOL: &str = "\r\n";

/// Write the open and closed rows to `path` in the given format.
///
/// Returns the number of data rows written.
pub fn write_report(
    path: &Path,
    format: OutputFormat,
    open: &[ReportRow],
    closed: &[ReportRow],
    today: NaiveDate,
) -> Result<usize, ExportError> {
    match format {
        OutputFormat::Csv => write_csv(path, open, closed),
        OutputFormat::Workbook => write_workbook(path, open, closed, today),
    }
}

// ==================== CSV ====================

/// Quote a CSV value.
///
/// Quotes are doubled, carriage returns dropped, and a value starting with
/// `-` gets a leading `'` so spreadsheets do not read it as a formula.
pub fn escape_csv_field(value: &str) -> String {
    let mut escaped = value.replace('"', "\"\"").replace('\r', "");
    if escaped.starts_with('-') {
        escaped.insert(0, '\'');
    }
    format!("\"{}\"", escaped)
}

fn csv_cell(cell: Cell<'_>) -> String {
    match cell {
        Cell::Text(s) => escape_csv_field(s),
        Cell::Date(d) => escape_csv_field(&d.to_string()),
        Cell::Empty => String::new(),
    }
}

fn push_csv_line<'a>(out: &mut String, cells: impl IntoIterator<Item = Cell<'a>>) {
    let line = cells.into_iter().map(csv_cell).collect::<Vec<_>>().join(CSV_DELIM);
    out.push_str(&line);
    out.push_str(CSV_EOL);
}

/// Render the header, then open rows, then closed rows.
pub fn render_csv(open: &[ReportRow], closed: &[ReportRow]) -> String {
    let mut out = String::new();
    push_csv_line(&mut out, HEADER.iter().map(|&h| Cell::Text(h)));
    for row in open.iter().chain(closed) {
        push_csv_line(&mut out, row.cells());
    }
    out
}

pub fn write_csv(path: &Path, open: &[ReportRow], closed: &[ReportRow]) -> Result<usize, ExportError> {
    fs::write(path, render_csv(open, closed)).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(open.len() + closed.len())
}

// ==================== Workbook ====================

#[derive(Clone, Copy)]
enum ColumnStyle {
    Plain,
    Date,
    Wrap,
}

/// Width and style of columns A..H.
const COLUMN_LAYOUT: [(f64, ColumnStyle); 8] = [
    (50.0, ColumnStyle::Wrap),
    (11.0, ColumnStyle::Date),
    (15.0, ColumnStyle::Plain),
    (11.0, ColumnStyle::Date),
    (50.0, ColumnStyle::Wrap),
    (11.0, ColumnStyle::Plain),
    (11.0, ColumnStyle::Date),
    (50.0, ColumnStyle::Wrap),
];

struct SheetFormats {
    plain: Format,
    date: Format,
    wrap: Format,
}

impl SheetFormats {
    fn new() -> Self {
        SheetFormats {
            plain: Format::new().set_align(FormatAlign::Top),
            date: Format::new()
                .set_align(FormatAlign::Top)
                .set_num_format("mm/dd/yyyy"),
            wrap: Format::new().set_align(FormatAlign::Top).set_text_wrap(),
        }
    }

    fn for_style(&self, style: ColumnStyle) -> &Format {
        match style {
            ColumnStyle::Plain => &self.plain,
            ColumnStyle::Date => &self.date,
            ColumnStyle::Wrap => &self.wrap,
        }
    }
}

pub fn sheet_names(today: NaiveDate) -> (String, String) {
    (format!("Open Tasks {}", today), format!("Closed Tasks {}", today))
}

pub fn write_workbook(
    path: &Path,
    open: &[ReportRow],
    closed: &[ReportRow],
    today: NaiveDate,
) -> Result<usize, ExportError> {
    let (open_name, closed_name) = sheet_names(today);
    let formats = SheetFormats::new();
    let mut workbook = Workbook::new();
    write_sheet(workbook.add_worksheet(), &open_name, open, &formats)?;
    write_sheet(workbook.add_worksheet(), &closed_name, closed, &formats)?;
    workbook.save(path)?;
    Ok(open.len() + closed.len())
}

fn write_sheet(
    sheet: &mut Worksheet,
    name: &str,
    rows: &[ReportRow],
    formats: &SheetFormats,
) -> Result<(), XlsxError> {
    sheet.set_name(name)?;
    sheet.set_zoom(90);

    for (col, (width, style)) in COLUMN_LAYOUT.iter().enumerate() {
        let col = col as ColNum;
        sheet.set_column_width(col, *width)?;
        sheet.set_column_format(col, formats.for_style(*style))?;
    }

    for (col, header) in HEADER.iter().enumerate() {
        sheet.write_string_with_format(0, col as ColNum, *header, &formats.plain)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let row_num = (i + 1) as RowNum;
        for (col, (cell, (_, style))) in row.cells().into_iter().zip(COLUMN_LAYOUT).enumerate() {
            let col = col as ColNum;
            let format = formats.for_style(style);
            match cell {
                Cell::Text(s) => {
                    sheet.write_string_with_format(row_num, col, s, format)?;
                }
                Cell::Date(d) => {
                    sheet.write_datetime_with_format(row_num, col, &d, &formats.date)?;
                }
                Cell::Empty => {}
            }
        }
    }

    // A table needs at least one data row below the header.
    let last_row = rows.len().max(1) as RowNum;
    let columns: Vec<TableColumn> = HEADER
        .iter()
        .map(|h| TableColumn::new().set_header(*h))
        .collect();
    let table = Table::new()
        .set_style(TableStyle::Medium2)
        .set_columns(&columns);
    sheet.add_table(0, 0, last_row, (HEADER.len() - 1) as ColNum, &table)?;
    Ok(())
}
