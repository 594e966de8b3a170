mod list;
mod table;

pub use list::scan_list;
pub use table::{filter_by_date, normalize_table, scan_table, to_records};

use crate::browser::{host_of, Browser, Page};
use crate::config::{DisplayType, TeamConfig};
use crate::data::{ArticleRecord, DateRange, DownloadOutcome};
use crate::error::ScraperError;
use crate::output::OutputSink;
use crate::render::{article_document, PdfRenderer};
use crate::sanitize::sanitize_html;
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use tracing::{info, warn};

const TABLE_LISTING: &str = "table";
const LIST_LISTING: &str = "div.vue-archives-stories ul";

const E: &str = "Invalid selector";
lazy_static! {
    static ref TABLE: Selector = Selector::parse(TABLE_LISTING).expect(E);
    static ref LIST: Selector = Selector::parse(LIST_LISTING).expect(E);
}

fn listing_selector(display_type: DisplayType) -> &'static str {
    match display_type {
        DisplayType::Table => TABLE_LISTING,
        DisplayType::List => LIST_LISTING,
    }
}

/// Picks the scanner matching the team's listing layout.
pub fn scan_listing(
    team: &TeamConfig,
    doc: &Html,
    range: &DateRange,
) -> Result<Vec<ArticleRecord>, ScraperError> {
    match team.article_display_type {
        DisplayType::Table => {
            let table = doc
                .select(&TABLE)
                .next()
                .ok_or_else(|| ScraperError::MissingElement(TABLE_LISTING.to_string()))?;
            scan_table(team, table, range)
        }
        DisplayType::List => {
            let list = doc
                .select(&LIST)
                .next()
                .ok_or_else(|| ScraperError::MissingElement(LIST_LISTING.to_string()))?;
            scan_list(team, list, range)
        }
    }
}

pub async fn fetch_articles<B: Browser>(
    browser: &mut B,
    team: &TeamConfig,
    range: &DateRange,
) -> Result<Vec<ArticleRecord>, ScraperError> {
    info!("Fetching {}'s articles...", team.name);

    let page = browser
        .open(&team.articles_url, listing_selector(team.article_display_type))
        .await?;

    let records = {
        let doc = page.document();
        scan_listing(team, &doc, range)?
    };

    info!(
        "Finished fetching {}'s articles, {} found",
        team.name,
        records.len()
    );
    Ok(records)
}

/// Renders every record to `{headline}.pdf`.
///
/// Each page is given the configured timeout to show the story body. Records
/// whose page lands outside the team's site are set aside as undownloaded;
/// any other per-record failure is logged and skipped.
pub async fn download_articles<B: Browser, R: PdfRenderer + ?Sized>(
    browser: &mut B,
    renderer: &R,
    team: &TeamConfig,
    records: Vec<ArticleRecord>,
    sink: &mut OutputSink,
) -> Result<DownloadOutcome, ScraperError> {
    info!("Downloading {} selected articles...", records.len());

    let story_body = team.story_body()?;
    let mut outcome = DownloadOutcome::default();

    for record in records {
        let opened = browser.open(&record.url, &team.story_body_selector).await;

        // A page that never shows a story body may still have left the site.
        let landing_url = match &opened {
            Ok(page) => page.url.clone(),
            Err(ScraperError::PageNotReady { .. }) => match browser.current_url().await {
                Ok(url) => url,
                Err(e) => {
                    warn!("{} failed: {}", record.headline, e);
                    continue;
                }
            },
            Err(e) => {
                warn!("{} failed: {}", record.headline, e);
                continue;
            }
        };

        let on_site = host_of(&landing_url)
            .map(|host| team.owns_host(&host))
            .unwrap_or(false);
        if !on_site {
            info!(
                "{} redirected to {}, leaving it for manual download",
                record.headline, landing_url
            );
            outcome.undownloaded.push(record);
            continue;
        }

        let page = match opened {
            Ok(page) => page,
            Err(e) => {
                warn!("{} failed: {}", record.headline, e);
                continue;
            }
        };

        match render_story(renderer, &page, &story_body, &record, sink).await {
            Ok(()) => {
                info!("{}.pdf downloaded", record.headline);
                outcome.downloaded.push(record);
            }
            Err(e) => warn!("{} failed: {}", record.headline, e),
        }
    }

    info!(
        "Finished downloading selected articles, {} undownloaded",
        outcome.undownloaded.len()
    );
    Ok(outcome)
}

async fn render_story<R: PdfRenderer + ?Sized>(
    renderer: &R,
    page: &Page,
    story_body: &Selector,
    record: &ArticleRecord,
    sink: &mut OutputSink,
) -> Result<(), ScraperError> {
    let content = {
        let doc = page.document();
        let body = doc
            .select(story_body)
            .next()
            .ok_or_else(|| ScraperError::MissingElement("story body".to_string()))?;
        sanitize_html(&body.html())
    };

    let html = article_document(&record.headline, &content);
    let pdf = renderer.render(&html).await?;
    sink.write(&format!("{}.pdf", record.headline), &pdf)
}
