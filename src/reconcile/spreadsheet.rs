//! Reads watch-list workbooks.
//!
//! One sheet per list, first row is the header. Columns are recognized by
//! their Chinese or English header name; unknown columns and sheets are
//! ignored.

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::catalog::ListName;

/// One spreadsheet row, as typed by the user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetRow {
    pub title: String,
    pub year: Option<String>,
    pub director: String,
    pub actors: String,
    pub plot: String,
    pub posters: Vec<String>,
    pub stills: Vec<String>,
}

impl SheetRow {
    pub fn new(title: &str, year: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            year: year.map(str::to_string),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportSheet {
    pub list: ListName,
    pub rows: Vec<SheetRow>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Column {
    Title,
    Year,
    Director,
    Actors,
    Plot,
    Posters,
    Stills,
}

fn column_for_header(header: &str) -> Option<Column> {
    match header.trim().to_lowercase().as_str() {
        "标题" | "title" => Some(Column::Title),
        "年份" | "year" => Some(Column::Year),
        "导演" | "director" => Some(Column::Director),
        "主要演员" | "actors" => Some(Column::Actors),
        "剧情简介" | "plot" => Some(Column::Plot),
        "海报链接" | "posters" => Some(Column::Posters),
        "剧照链接" | "stills" => Some(Column::Stills),
        _ => None,
    }
}

/// Maps a sheet name to the list it fills.
pub fn list_for_sheet(name: &str) -> Option<ListName> {
    match name.trim() {
        "看过的电影" => Some(ListName::Watched),
        "在看的电影" => Some(ListName::Watching),
        "想看的电影" => Some(ListName::WantToWatch),
        other => other.parse().ok(),
    }
}

/// Whitespace-separated links, keeping only the ones that look like URLs.
pub fn parse_links(cell: &str) -> Vec<String> {
    cell.split_whitespace()
        .filter(|token| token.starts_with("http"))
        .map(str::to_string)
        .collect()
}

/// Turns a header row plus data rows into [`SheetRow`]s. Rows without a
/// title are dropped.
pub fn parse_sheet_rows(rows: Vec<Vec<String>>) -> Result<Vec<SheetRow>> {
    let mut rows = rows.into_iter();
    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(Vec::new()),
    };

    let columns: HashMap<Column, usize> = header
        .iter()
        .enumerate()
        .filter_map(|(index, name)| column_for_header(name).map(|column| (column, index)))
        .collect();
    if !columns.contains_key(&Column::Title) {
        bail!("No title column in header {:?}", header);
    }

    let parsed = rows
        .map(|cells| {
            let cell = |column: Column| -> &str {
                columns
                    .get(&column)
                    .and_then(|index| cells.get(*index))
                    .map(|value| value.trim())
                    .unwrap_or("")
            };
            SheetRow {
                title: cell(Column::Title).to_string(),
                year: Some(cell(Column::Year).to_string()).filter(|year| !year.is_empty()),
                director: cell(Column::Director).to_string(),
                actors: cell(Column::Actors).to_string(),
                plot: cell(Column::Plot).to_string(),
                posters: parse_links(cell(Column::Posters)),
                stills: parse_links(cell(Column::Stills)),
            }
        })
        .filter(|row| !row.title.is_empty())
        .collect();
    Ok(parsed)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string(),
    }
}

/// Reads every recognized sheet of the workbook at `path`, in list order.
///
/// Failing to open the workbook is an error. A single sheet that can't be
/// read is logged and skipped.
pub fn read_workbook(path: &Path) -> Result<Vec<ImportSheet>> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Failed to open workbook {:?}", path))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names().to_owned() {
        let list = match list_for_sheet(&name) {
            Some(list) => list,
            None => {
                debug!("Ignoring sheet '{}'", name);
                continue;
            }
        };

        let range = match workbook.worksheet_range(&name) {
            Ok(range) => range,
            Err(err) => {
                warn!("Failed to read sheet '{}': {}", name, err);
                continue;
            }
        };

        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        match parse_sheet_rows(rows) {
            Ok(rows) => {
                info!("Sheet '{}' -> {}: {} rows", name, list, rows.len());
                sheets.push(ImportSheet { list, rows });
            }
            Err(err) => warn!("Skipping sheet '{}': {}", name, err),
        }
    }

    sheets.sort_by_key(|sheet| ListName::ALL.iter().position(|list| *list == sheet.list));
    Ok(sheets)
}
