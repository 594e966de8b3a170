//! One scraping request, from the chosen categories to the written artifacts.

use crate::articles::{download_articles, fetch_articles};
use crate::box_scores::{clamp_count, download_box_scores};
use crate::browser::{Browser, BrowserOptions, WebDriverBrowser};
use crate::config::TeamConfig;
use crate::data::{ArticleRecord, DateRange, DownloadOutcome};
use crate::error::ScraperError;
use crate::output::OutputSink;
use crate::pages::{download_roster, download_schedule};
use crate::render::PdfRenderer;
use crate::stats::download_stats;
use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use std::fmt;
use tracing::{info, warn};

pub const DEFAULT_BOX_SCORES: usize = 5;

/// Season starts on this day of August.
const SEASON_START_DAY: u32 = 1;

/// Declared in the order a request runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum Category {
    Roster,
    Schedule,
    BoxScores,
    Stats,
    Articles,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Roster,
        Category::Schedule,
        Category::BoxScores,
        Category::Stats,
        Category::Articles,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Roster => "Roster",
            Category::Schedule => "Schedule",
            Category::BoxScores => "Box Scores",
            Category::Stats => "Stats",
            Category::Articles => "Articles",
        };
        f.write_str(label)
    }
}

/// Which of the fetched articles get rendered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArticleSelection {
    /// List only.
    #[default]
    None,
    All,
    /// Positions in the fetched list.
    Indexes(Vec<usize>),
}

impl ArticleSelection {
    pub fn select(&self, records: &[ArticleRecord]) -> Vec<ArticleRecord> {
        match self {
            ArticleSelection::None => vec![],
            ArticleSelection::All => records.to_vec(),
            ArticleSelection::Indexes(indexes) => indexes
                .iter()
                .unique()
                .filter_map(|&i| {
                    let record = records.get(i).cloned();
                    if record.is_none() {
                        warn!("No article at index {}, {} were found", i, records.len());
                    }
                    record
                })
                .collect(),
        }
    }
}

/// Everything a run needs to know, decided up front.
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub team: TeamConfig,
    pub categories: Vec<Category>,
    pub years: Vec<u16>,
    pub box_score_count: usize,
    pub date_range: DateRange,
    pub articles: ArticleSelection,
}

impl ScrapeRequest {
    /// A request with the current season's defaults.
    pub fn new(team: TeamConfig, categories: &[Category], today: NaiveDate) -> ScrapeRequest {
        ScrapeRequest {
            team,
            categories: categories.iter().copied().sorted().dedup().collect(),
            years: default_years(today),
            box_score_count: DEFAULT_BOX_SCORES,
            date_range: DateRange::new(season_start(today), today),
            articles: ArticleSelection::None,
        }
    }

    pub fn with_years(mut self, years: Vec<u16>) -> Self {
        if !years.is_empty() {
            self.years = years;
        }
        self
    }

    pub fn with_box_score_count(mut self, count: usize) -> Self {
        self.box_score_count = clamp_count(count);
        self
    }

    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        if let Some(start) = start {
            self.date_range.start = start;
        }
        if let Some(end) = end {
            self.date_range.end = end;
        }
        self
    }

    pub fn with_articles(mut self, articles: ArticleSelection) -> Self {
        self.articles = articles;
        self
    }
}

/// Fall seasons: before August, the season in progress started last year.
pub fn season_year(today: NaiveDate) -> i32 {
    if today.month() >= 8 {
        today.year()
    } else {
        today.year() - 1
    }
}

pub fn season_start(today: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(season_year(today), 8, SEASON_START_DAY).unwrap_or(today)
}

/// The current season and the one before it.
pub fn default_years(today: NaiveDate) -> Vec<u16> {
    let year = season_year(today);
    [year, year - 1]
        .into_iter()
        .filter_map(|year| u16::try_from(year).ok())
        .collect()
}

#[derive(Debug, Default)]
pub struct Report {
    pub completed: Vec<Category>,
    pub failed: Vec<(Category, String)>,
    /// Every article found in the date range, selected or not.
    pub articles: Vec<ArticleRecord>,
    pub outcome: DownloadOutcome,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Completed       : {}",
            if self.completed.is_empty() {
                "None".to_string()
            } else {
                self.completed.iter().join(", ")
            }
        )?;
        for (category, error) in &self.failed {
            writeln!(f, "Failed          : {} ({})", category, error)?;
        }
        Ok(())
    }
}

/// Runs a category against an already open browser.
///
/// Articles are fetched, narrowed to the request's selection and rendered
/// with the same browser.
pub async fn run_category<B: Browser, R: PdfRenderer + ?Sized>(
    browser: &mut B,
    renderer: &R,
    client: &reqwest::Client,
    request: &ScrapeRequest,
    category: Category,
    sink: &mut OutputSink,
    report: &mut Report,
) -> Result<(), ScraperError> {
    let team = &request.team;
    match category {
        Category::Roster => download_roster(browser, renderer, team, sink).await?,
        Category::Schedule => download_schedule(browser, renderer, team, sink).await?,
        Category::BoxScores => {
            download_box_scores(browser, client, team, request.box_score_count, sink).await?;
        }
        Category::Stats => {
            download_stats(browser, client, team, &request.years, sink).await?;
        }
        Category::Articles => {
            let records = fetch_articles(browser, team, &request.date_range).await?;
            download_selected(browser, renderer, request, records, sink, report).await?;
        }
    }
    Ok(())
}

async fn download_selected<B: Browser, R: PdfRenderer + ?Sized>(
    browser: &mut B,
    renderer: &R,
    request: &ScrapeRequest,
    records: Vec<ArticleRecord>,
    sink: &mut OutputSink,
    report: &mut Report,
) -> Result<(), ScraperError> {
    let selected = request.articles.select(&records);
    report.articles = records;
    if !selected.is_empty() {
        report.outcome = download_articles(browser, renderer, &request.team, selected, sink).await?;
    }
    Ok(())
}

/// Drives ChromeDriver sessions for a request. Every category gets its own
/// session, closed once the category is done whatever its result.
pub struct Scraper {
    options: BrowserOptions,
    renderer: Box<dyn PdfRenderer>,
    client: reqwest::Client,
}

impl Scraper {
    pub fn new(options: BrowserOptions, renderer: Box<dyn PdfRenderer>) -> Scraper {
        Scraper {
            options,
            renderer,
            client: reqwest::Client::new(),
        }
    }

    pub async fn run(
        &self,
        request: &ScrapeRequest,
        sink: &mut OutputSink,
    ) -> Result<Report, ScraperError> {
        info!(
            "Scraping {} for {}",
            request.categories.iter().join(", "),
            request.team.name
        );

        let mut report = Report::default();
        for &category in &request.categories {
            let result = match category {
                Category::Articles => self.run_articles(request, sink, &mut report).await,
                _ => self.run_in_session(request, category, sink, &mut report).await,
            };
            match result {
                Ok(()) => report.completed.push(category),
                Err(e) => {
                    warn!("{} failed: {}", category, e);
                    report.failed.push((category, e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Fetches the article list on its own, without rendering anything.
    pub async fn fetch_articles(
        &self,
        team: &TeamConfig,
        range: &DateRange,
    ) -> Result<Vec<ArticleRecord>, ScraperError> {
        let mut browser = WebDriverBrowser::launch(&self.options).await?;
        let result = fetch_articles(&mut browser, team, range).await;
        close_session(browser, result).await
    }

    async fn run_in_session(
        &self,
        request: &ScrapeRequest,
        category: Category,
        sink: &mut OutputSink,
        report: &mut Report,
    ) -> Result<(), ScraperError> {
        let mut browser = WebDriverBrowser::launch(&self.options).await?;
        let result = run_category(
            &mut browser,
            self.renderer.as_ref(),
            &self.client,
            request,
            category,
            sink,
            report,
        )
        .await;
        close_session(browser, result).await
    }

    async fn run_articles(
        &self,
        request: &ScrapeRequest,
        sink: &mut OutputSink,
        report: &mut Report,
    ) -> Result<(), ScraperError> {
        let records = self.fetch_articles(&request.team, &request.date_range).await?;
        if request.articles == ArticleSelection::None {
            report.articles = records;
            return Ok(());
        }

        let mut browser = WebDriverBrowser::launch(&self.options).await?;
        let result = download_selected(
            &mut browser,
            self.renderer.as_ref(),
            request,
            records,
            sink,
            report,
        )
        .await;
        close_session(browser, result).await
    }
}

async fn close_session<T>(
    mut browser: WebDriverBrowser,
    result: Result<T, ScraperError>,
) -> Result<T, ScraperError> {
    if let Err(e) = browser.close().await {
        warn!("Failed to close the browser session: {}", e);
    }
    result
}
