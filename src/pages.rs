//! Roster and schedule pages, rebuilt from their tables and rendered to PDF.

use crate::browser::Browser;
use crate::config::{ScheduleLayout, TeamConfig};
use crate::error::ScraperError;
use crate::output::OutputSink;
use crate::render::{page_document, tables_document, PdfRenderer};
use crate::sanitize::{sanitize_document, sanitize_html};
use crate::table::Table;
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use tracing::info;

const E: &str = "Invalid selector";
lazy_static! {
    static ref TABLE: Selector = Selector::parse("table").expect(E);
    static ref THEAD: Selector = Selector::parse("thead").expect(E);
    static ref TITLE: Selector = Selector::parse("title").expect(E);
    static ref BODY: Selector = Selector::parse("body").expect(E);
}

pub async fn download_roster<B: Browser, R: PdfRenderer + ?Sized>(
    browser: &mut B,
    renderer: &R,
    team: &TeamConfig,
    sink: &mut OutputSink,
) -> Result<(), ScraperError> {
    info!("Downloading {}'s roster...", team.name);
    let file_name = format!("{} Roster.pdf", team.abbreviation);
    download_tables(
        browser,
        renderer,
        &team.roster_url,
        &team.roster_ignored_columns,
        &file_name,
        sink,
    )
    .await?;
    info!("Finished downloading {}'s roster!", team.name);
    Ok(())
}

pub async fn download_schedule<B: Browser, R: PdfRenderer + ?Sized>(
    browser: &mut B,
    renderer: &R,
    team: &TeamConfig,
    sink: &mut OutputSink,
) -> Result<(), ScraperError> {
    info!("Downloading {}'s schedule...", team.name);
    let file_name = format!("{} Schedule.pdf", team.abbreviation);
    match team.schedule_layout {
        ScheduleLayout::Tables => {
            download_tables(
                browser,
                renderer,
                &team.schedule_url,
                &team.schedule_ignored_columns,
                &file_name,
                sink,
            )
            .await?
        }
        ScheduleLayout::Page => {
            let page = browser.open(&team.schedule_url, "body").await?;
            let html = {
                let doc = sanitize_document(&page.html);
                let body = doc
                    .select(&BODY)
                    .next()
                    .map(|body| body.inner_html())
                    .unwrap_or_default();
                page_document(&page_title(&doc), &team.base_url(), &body)
            };
            let pdf = renderer.render(&html).await?;
            sink.write(&file_name, &pdf)?;
        }
    }
    info!("Finished downloading {}'s schedule!", team.name);
    Ok(())
}

async fn download_tables<B: Browser, R: PdfRenderer + ?Sized>(
    browser: &mut B,
    renderer: &R,
    url: &str,
    ignored_columns: &[String],
    file_name: &str,
    sink: &mut OutputSink,
) -> Result<(), ScraperError> {
    let page = browser.open(url, "table").await?;
    let html = {
        let doc = page.document();
        let tables = extract_tables(&doc, ignored_columns);
        tables_document(&page_title(&doc), &tables)
    };

    let pdf = renderer.render(&html).await?;
    sink.write(file_name, &pdf)
}

/// Every headed table of the page as clean HTML, minus `ignored_columns`.
pub fn extract_tables(doc: &Html, ignored_columns: &[String]) -> Vec<String> {
    doc.select(&TABLE)
        .filter(|table| table.select(&THEAD).next().is_some())
        .filter_map(|table| Table::parse(&sanitize_html(&table.html())).ok())
        .map(|mut table| {
            table.drop_columns(ignored_columns);
            table.to_html()
        })
        .collect()
}

fn page_title(doc: &Html) -> String {
    doc.select(&TITLE)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}
