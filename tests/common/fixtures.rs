//! Test fixture creation for workbook uploads
//!
//! Workbooks are assembled in memory so tests don't depend on binary files
//! checked into the tree. Only the parts a reader needs are written: the
//! workbook, its relationships and one worksheet per sheet, with text as
//! inline strings.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One cell of a fixture sheet
pub enum Cell {
    Text(&'static str),
    Number(f64),
    Empty,
}

/// A named sheet; the first row is the header
pub struct Sheet {
    pub name: &'static str,
    pub rows: Vec<Vec<Cell>>,
}

/// Title of a watched row the fake TMDB has never heard of
pub const UNKNOWN_TITLE: &str = "不存在的电影";

/// The watch-list workbook most upload tests use:
///
/// - 看过的电影: Inception (year typed as a number) and an unknown title
/// - 想看的电影: Breaking Bad, no year
/// - 备注: notes, not a list, ignored by the import
pub fn watchlist_workbook() -> Vec<u8> {
    build_xlsx(&[
        Sheet {
            name: "看过的电影",
            rows: vec![
                vec![Cell::Text("标题"), Cell::Text("年份"), Cell::Text("导演")],
                vec![
                    Cell::Text("Inception"),
                    Cell::Number(2010.0),
                    Cell::Text("Christopher Nolan"),
                ],
                vec![Cell::Text(UNKNOWN_TITLE), Cell::Empty, Cell::Empty],
            ],
        },
        Sheet {
            name: "想看的电影",
            rows: vec![
                vec![Cell::Text("标题"), Cell::Text("年份")],
                vec![Cell::Text("Breaking Bad"), Cell::Empty],
            ],
        },
        Sheet {
            name: "备注",
            rows: vec![vec![Cell::Text("Inception")]],
        },
    ])
}

/// Builds a minimal .xlsx file holding `sheets`.
pub fn build_xlsx(sheets: &[Sheet]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
"#,
    );
    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>
"#,
    );
    let mut workbook_rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );

    for (index, sheet) in sheets.iter().enumerate() {
        let number = index + 1;
        content_types.push_str(&format!(
            "<Override PartName=\"/xl/worksheets/sheet{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\n",
            number
        ));
        workbook.push_str(&format!(
            "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>\n",
            escape(sheet.name),
            number,
            number
        ));
        workbook_rels.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{}.xml\"/>\n",
            number, number
        ));

        zip.start_file(format!("xl/worksheets/sheet{}.xml", number), options)
            .expect("Failed to start worksheet");
        zip.write_all(worksheet(sheet).as_bytes())
            .expect("Failed to write worksheet");
    }

    content_types.push_str("</Types>\n");
    workbook.push_str("</sheets>\n</workbook>\n");
    workbook_rels.push_str("</Relationships>\n");

    let parts = [
        ("[Content_Types].xml", content_types),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>
"#
            .to_string(),
        ),
        ("xl/workbook.xml", workbook),
        ("xl/_rels/workbook.xml.rels", workbook_rels),
    ];
    for (name, content) in parts {
        zip.start_file(name, options).expect("Failed to start part");
        zip.write_all(content.as_bytes())
            .expect("Failed to write part");
    }

    zip.finish().expect("Failed to finish workbook").into_inner()
}

fn worksheet(sheet: &Sheet) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
"#,
    );
    for (row_index, row) in sheet.rows.iter().enumerate() {
        let row_number = row_index + 1;
        xml.push_str(&format!("<row r=\"{}\">", row_number));
        for (column, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_letter(column), row_number);
            match cell {
                Cell::Text(text) => xml.push_str(&format!(
                    "<c r=\"{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                    reference,
                    escape(text)
                )),
                Cell::Number(value) => {
                    xml.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", reference, value))
                }
                Cell::Empty => {}
            }
        }
        xml.push_str("</row>\n");
    }
    xml.push_str("</sheetData>\n</worksheet>\n");
    xml
}

fn column_letter(column: usize) -> char {
    (b'A' + column as u8) as char
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
