pub mod articles;
pub mod box_scores;
pub mod browser;
pub mod config;
pub mod output;
pub mod pages;
pub mod render;
pub mod sanitize;
pub mod scrape;
pub mod stats;
pub mod table;

mod data;
mod error;
mod utils;

pub use browser::{Browser, BrowserOptions, Page, WebDriverBrowser};
pub use config::{TeamConfig, TeamDirectory};
pub use data::{ArticleRecord, DateRange, DownloadOutcome, MatchRecord};
pub use error::ScraperError;
pub use output::OutputSink;
pub use render::{PdfRenderer, Wkhtmltopdf};
pub use scrape::{ArticleSelection, Category, Report, ScrapeRequest, Scraper};
pub use table::Table;
