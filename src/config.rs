use crate::error::ScraperError;
use crate::utils::resolve_against;
use chrono::NaiveDate;
use scraper::Selector;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayType {
    Table,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `3/1/2024`
    #[default]
    MonthDayYear,
    /// `3/1/24`
    MonthDayShortYear,
    /// `March 1, 2024`
    LongMonthDayYear,
}

impl DateFormat {
    pub fn pattern(&self) -> &'static str {
        match self {
            DateFormat::MonthDayYear => "%m/%d/%Y",
            DateFormat::MonthDayShortYear => "%m/%d/%y",
            DateFormat::LongMonthDayYear => "%B %d, %Y",
        }
    }

    pub fn parse(&self, value: &str) -> Result<NaiveDate, ScraperError> {
        let value = value.trim();
        NaiveDate::parse_from_str(value, self.pattern()).map_err(|_| ScraperError::DateParse {
            value: value.to_string(),
            format: self.pattern(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleLayout {
    /// Rebuild the page from its `<table>`s.
    #[default]
    Tables,
    /// Render the whole sanitized page.
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfLocation {
    /// `<embed src="...">`
    Embed,
    /// `<object data="...">`
    Object,
    /// The stats URL is the PDF itself.
    Direct,
}

impl PdfLocation {
    /// Selector for the element carrying the PDF URL, and the attribute holding it.
    pub fn element(&self) -> Option<(&'static str, &'static str)> {
        match self {
            PdfLocation::Embed => Some(("embed[src]", "src")),
            PdfLocation::Object => Some(("object[data]", "data")),
            PdfLocation::Direct => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StatsUrl {
    /// A URL with a `{year}` placeholder.
    Template(String),
    PerYear(BTreeMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatsConfig {
    pub url: StatsUrl,
    pub pdf_location: PdfLocation,
}

impl StatsConfig {
    pub fn url_for(&self, year: u16) -> Option<String> {
        match &self.url {
            StatsUrl::Template(template) => Some(template.replace("{year}", &year.to_string())),
            StatsUrl::PerYear(urls) => urls.get(&year.to_string()).cloned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConferenceProvider {
    Boost,
    Sidearm,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConferenceConfig {
    pub provider: ConferenceProvider,
    pub base_url: String,
    /// How the conference site spells the team, when it differs from `name`.
    #[serde(default)]
    pub team_name: Option<String>,
}

impl ConferenceConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn default_story_body_selector() -> String {
    "div#storyPageContentBody".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    pub abbreviation: String,
    pub hostname: String,
    #[serde(default)]
    pub base_url: Option<String>,
    pub articles_url: String,
    pub article_display_type: DisplayType,
    /// Format of the `Posted` column on table listings.
    #[serde(default)]
    pub date_format: DateFormat,
    pub roster_url: String,
    pub schedule_url: String,
    #[serde(default)]
    pub schedule_layout: ScheduleLayout,
    #[serde(default)]
    pub roster_ignored_columns: Vec<String>,
    #[serde(default)]
    pub schedule_ignored_columns: Vec<String>,
    #[serde(default)]
    pub stats: Option<StatsConfig>,
    #[serde(default)]
    pub conference: Option<ConferenceConfig>,
    #[serde(default = "default_story_body_selector")]
    pub story_body_selector: String,
}

impl TeamConfig {
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(base_url) => base_url.trim_end_matches('/').to_string(),
            None => format!("https://{}", self.hostname),
        }
    }

    /// Resolves a (possibly relative) link found on one of the team's pages.
    pub fn resolve(&self, href: &str) -> Result<String, ScraperError> {
        resolve_against(&self.base_url(), href)
    }

    pub fn owns_host(&self, host: &str) -> bool {
        host.contains(self.hostname.as_str())
    }

    pub fn story_body(&self) -> Result<Selector, ScraperError> {
        parse_selector(&self.story_body_selector)
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|_| ScraperError::InvalidSelector(selector.to_string()))
}

/// Every configured team, keyed by display name.
#[derive(Debug, Default)]
pub struct TeamDirectory {
    teams: BTreeMap<String, TeamConfig>,
}

impl TeamDirectory {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TeamDirectory, ScraperError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let directory = Self::from_json(&json)?;
        debug!(
            "Loaded {} teams from {}",
            directory.teams.len(),
            path.as_ref().display()
        );
        Ok(directory)
    }

    pub fn from_json(json: &str) -> Result<TeamDirectory, ScraperError> {
        let teams: BTreeMap<String, TeamConfig> = serde_json::from_str(json)?;
        for team in teams.values() {
            team.story_body()?;
        }
        Ok(TeamDirectory { teams })
    }

    pub fn get(&self, name: &str) -> Result<&TeamConfig, ScraperError> {
        self.teams
            .get(name)
            .ok_or_else(|| ScraperError::UnknownTeam(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.teams.keys().map(String::as_str)
    }

    pub fn teams(&self) -> impl Iterator<Item = &TeamConfig> {
        self.teams.values()
    }
}

#[cfg(test)]
pub(crate) fn sample_team() -> TeamConfig {
    TeamConfig {
        name: "Northwestern".to_string(),
        abbreviation: "NU".to_string(),
        hostname: "nusports.com".to_string(),
        base_url: None,
        articles_url: "https://nusports.com/sports/mens-soccer/archives".to_string(),
        article_display_type: DisplayType::Table,
        date_format: DateFormat::MonthDayYear,
        roster_url: "https://nusports.com/sports/mens-soccer/roster".to_string(),
        schedule_url: "https://nusports.com/sports/mens-soccer/schedule".to_string(),
        schedule_layout: ScheduleLayout::Tables,
        roster_ignored_columns: vec!["Social".to_string()],
        schedule_ignored_columns: vec![],
        stats: Some(StatsConfig {
            url: StatsUrl::Template(
                "https://nusports.com/sports/mens-soccer/stats/{year}".to_string(),
            ),
            pdf_location: PdfLocation::Embed,
        }),
        conference: Some(ConferenceConfig {
            provider: ConferenceProvider::Boost,
            base_url: "https://bigten.org".to_string(),
            team_name: None,
        }),
        story_body_selector: default_story_body_selector(),
    }
}
