//! A small column-oriented view over HTML tables.
//!
//! Header cells become column names (blank ones are named `Unnamed: {index}`),
//! body cells become trimmed text. Rows are padded with empty strings so every
//! row has one value per column.

use crate::error::ScraperError;
use itertools::Itertools;
use lazy_regex::regex;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use std::fmt::Write;

const E: &str = "Invalid selector";
lazy_static! {
    static ref TABLE: Selector = Selector::parse("table").expect(E);
    static ref THEAD_ROW: Selector = Selector::parse("thead tr").expect(E);
    static ref TR: Selector = Selector::parse("tr").expect(E);
    static ref CELL: Selector = Selector::parse("th, td").expect(E);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Table {
        let mut table = Table { columns, rows };
        table.fill_missing();
        table
    }

    /// Parses the first `<table>` of an HTML fragment.
    pub fn parse(html: &str) -> Result<Table, ScraperError> {
        let fragment = Html::parse_fragment(html);
        let table = fragment
            .select(&TABLE)
            .next()
            .ok_or_else(|| ScraperError::MissingElement("table".to_string()))?;
        Ok(Table::from_element(table))
    }

    pub fn from_element(table: ElementRef) -> Table {
        let header = table.select(&THEAD_ROW).last().map(row_cells);

        let mut body = table
            .select(&TR)
            .filter(|tr| !is_in_thead(tr))
            .map(|tr| (is_header_row(&tr), row_cells(tr)))
            .filter(|(_, cells)| !cells.is_empty())
            .collect::<Vec<_>>();

        let header = match header {
            Some(header) => header,
            None if body.first().map(|(is_header, _)| *is_header) == Some(true) => {
                body.remove(0).1
            }
            None => {
                let width = body.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
                (0..width).map(|i| i.to_string()).collect()
            }
        };

        let columns = header
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                if name.is_empty() {
                    format!("Unnamed: {}", i)
                } else {
                    name
                }
            })
            .collect();

        let rows = body
            .into_iter()
            .filter(|(is_header, _)| !is_header)
            .map(|(_, cells)| cells)
            .collect();

        Table::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }

    /// Drops every column matching `predicate`; missing names are ignored.
    pub fn drop_columns_where<F: Fn(&str) -> bool>(&mut self, predicate: F) {
        let keep = self
            .columns
            .iter()
            .map(|c| !predicate(c.as_str()))
            .collect::<Vec<_>>();

        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));
        for row in self.rows.iter_mut() {
            let mut flags = keep.iter();
            row.retain(|_| *flags.next().unwrap_or(&true));
        }
    }

    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) {
        self.drop_columns_where(|c| names.iter().any(|n| n.as_ref() == c));
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(index) => {
                self.columns[index] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Appends a column; `values` must hold one entry per row.
    pub fn push_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> Result<(), ScraperError>
    where
        F: FnMut(&str) -> Result<String, ScraperError>,
    {
        let index = self
            .column_index(name)
            .ok_or_else(|| ScraperError::MissingColumn(name.to_string()))?;
        for row in self.rows.iter_mut() {
            row[index] = f(&row[index])?;
        }
        Ok(())
    }

    pub fn retain_rows<F: FnMut(&[String]) -> bool>(&mut self, mut f: F) {
        self.rows.retain(|row| f(row));
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from("<table class=\"dataframe\">\n<thead>\n<tr>");
        for column in &self.columns {
            let _ = write!(html, "<th>{}</th>", escape(column));
        }
        html.push_str("</tr>\n</thead>\n<tbody>\n");
        for row in &self.rows {
            let cells = row
                .iter()
                .map(|cell| format!("<td>{}</td>", escape(cell)))
                .join("");
            let _ = writeln!(html, "<tr>{}</tr>", cells);
        }
        html.push_str("</tbody>\n</table>");
        html
    }

    fn fill_missing(&mut self) {
        let width = self.columns.len();
        for row in self.rows.iter_mut() {
            row.resize(width, String::new());
        }
    }
}

fn is_in_thead(tr: &ElementRef) -> bool {
    tr.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().name() == "thead")
}

fn is_header_row(tr: &ElementRef) -> bool {
    let mut cells = tr.select(&CELL).peekable();
    cells.peek().is_some() && cells.all(|c| c.value().name() == "th")
}

fn row_cells(tr: ElementRef) -> Vec<String> {
    let mut cells = vec![];
    for cell in tr.select(&CELL) {
        let text = text_of(cell);
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        for _ in 1..span {
            cells.push(text.clone());
        }
        cells.push(text);
    }
    cells
}

/// Text content with runs of whitespace collapsed.
pub(crate) fn text_of(el: ElementRef) -> String {
    let text = el.text().collect::<String>();
    regex!(r"\s+").replace_all(&text, " ").trim().to_string()
}

pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
