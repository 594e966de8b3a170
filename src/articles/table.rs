use crate::config::{DateFormat, TeamConfig};
use crate::data::{ArticleRecord, DateRange};
use crate::error::ScraperError;
use crate::sanitize::sanitize_html;
use crate::table::Table;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

pub const DATE: &str = "Date";
pub const POSTED: &str = "Posted";
pub const TITLE: &str = "Title";
pub const HEADLINE: &str = "Headline";
pub const URL: &str = "URL";

const IGNORED_COLUMNS: [&str; 2] = ["Sport", "Category"];
const NORMALIZED_DATE: &str = "%Y-%m-%d";

const E: &str = "Invalid selector";
lazy_static! {
    static ref TABLE: Selector = Selector::parse("table").expect(E);
    static ref A: Selector = Selector::parse("a[href]").expect(E);
}

/// Articles listed in a table, newest first, restricted to `range`.
pub fn scan_table(
    team: &TeamConfig,
    table: ElementRef,
    range: &DateRange,
) -> Result<Vec<ArticleRecord>, ScraperError> {
    let mut table = normalize_table(team, table)?;
    filter_by_date(&mut table, range)?;
    to_records(&table)
}

/// Sanitizes the listing table and reshapes it into `Date`, `Headline` and
/// `URL` columns (plus whatever else the site shows). Dates become ISO dates.
pub fn normalize_table(team: &TeamConfig, table: ElementRef) -> Result<Table, ScraperError> {
    let sanitized = Html::parse_fragment(&sanitize_html(&table.html()));
    let table = sanitized
        .select(&TABLE)
        .next()
        .ok_or_else(|| ScraperError::MissingElement("table".to_string()))?;

    let links = table
        .select(&A)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.trim() != "#")
        .map(|href| team.resolve(href))
        .collect::<Result<Vec<_>, _>>()?;

    let mut table = Table::from_element(table);
    table.drop_columns(&IGNORED_COLUMNS);
    table.drop_columns_where(|c| c.to_lowercase().contains("unnamed"));

    if links.len() != table.len() {
        return Err(ScraperError::LinkRowMismatch {
            links: links.len(),
            rows: table.len(),
        });
    }
    table.push_column(URL, links);

    if table.has_column(POSTED) {
        let format = team.date_format;
        table.map_column(POSTED, |value| normalize_date(format, value))?;
        table.drop_columns(&[DATE]);
        table.rename_column(POSTED, DATE);
    } else if table.has_column(DATE) {
        table.map_column(DATE, |value| {
            normalize_date(DateFormat::LongMonthDayYear, value)
        })?;
    }

    table.rename_column(TITLE, HEADLINE);
    Ok(table)
}

pub fn filter_by_date(table: &mut Table, range: &DateRange) -> Result<(), ScraperError> {
    let index = table
        .column_index(DATE)
        .ok_or_else(|| ScraperError::MissingColumn(DATE.to_string()))?;
    table.retain_rows(|row| {
        NaiveDate::parse_from_str(&row[index], NORMALIZED_DATE)
            .map(|date| range.contains(date))
            .unwrap_or(false)
    });
    Ok(())
}

pub fn to_records(table: &Table) -> Result<Vec<ArticleRecord>, ScraperError> {
    for column in [DATE, HEADLINE, URL] {
        if !table.has_column(column) {
            return Err(ScraperError::MissingColumn(column.to_string()));
        }
    }

    (0..table.len())
        .map(|row| {
            let cell = |column: &str| table.cell(row, column).unwrap_or_default();
            let date = NaiveDate::parse_from_str(cell(DATE), NORMALIZED_DATE).map_err(|_| {
                ScraperError::DateParse {
                    value: cell(DATE).to_string(),
                    format: NORMALIZED_DATE,
                }
            })?;
            Ok(ArticleRecord {
                date,
                headline: cell(HEADLINE).to_string(),
                url: cell(URL).to_string(),
            })
        })
        .collect()
}

fn normalize_date(format: DateFormat, value: &str) -> Result<String, ScraperError> {
    Ok(format.parse(value)?.format(NORMALIZED_DATE).to_string())
}
