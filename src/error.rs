#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid team configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    #[error("Browser session is already closed")]
    SessionClosed,

    #[error("Page {url} was not ready after {timeout_secs}s (waiting for `{selector}`)")]
    PageNotReady {
        url: String,
        selector: String,
        timeout_secs: u64,
    },

    #[error("Invalid CSS selector `{0}`")]
    InvalidSelector(String),

    #[error("Expected element `{0}` was not found")]
    MissingElement(String),

    #[error("Expected column `{0}` was not found")]
    MissingColumn(String),

    #[error("Found {links} article links for {rows} table rows")]
    LinkRowMismatch { links: usize, rows: usize },

    #[error("Could not parse date `{value}` with format `{format}`")]
    DateParse { value: String, format: &'static str },

    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}
