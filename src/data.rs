use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub date: NaiveDate,
    pub headline: String,
    pub url: String,
}

impl fmt::Display for ArticleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}  <{}>",
            self.date.format("%m/%d/%Y"),
            self.headline,
            self.url
        )
    }
}

/// Inclusive range of publication dates. `start <= end` is assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn starts_after(&self, date: NaiveDate) -> bool {
        date < self.start
    }

    pub fn ends_before(&self, date: NaiveDate) -> bool {
        date > self.end
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub downloaded: Vec<ArticleRecord>,
    pub undownloaded: Vec<ArticleRecord>,
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Downloaded      : {}", self.downloaded.len())?;
        if self.undownloaded.is_empty() {
            return writeln!(f, "Undownloaded    : None");
        }
        writeln!(f, "Undownloaded    : {}", self.undownloaded.len())?;
        for record in &self.undownloaded {
            writeln!(f, "> {}", record)?;
        }
        Ok(())
    }
}

/// A conference-calendar match involving the team, with its box score page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub home: String,
    pub away: String,
    /// Caption date with `/` replaced by `_`, e.g. `9_14_2024`.
    pub date: String,
    pub box_score_url: String,
}

impl MatchRecord {
    pub fn file_name(&self) -> String {
        format!("{} vs {} {}.pdf", self.home, self.away, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("Invalid date")
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let range = DateRange::new(date(2024, 3, 10), date(2024, 3, 31));
        assert!(range.contains(date(2024, 3, 10)));
        assert!(range.contains(date(2024, 3, 31)));
        assert!(!range.contains(date(2024, 3, 9)));
        assert!(!range.contains(date(2024, 4, 1)));
        assert!(range.starts_after(date(2024, 3, 9)));
        assert!(range.ends_before(date(2024, 4, 1)));
    }

    #[test]
    fn test_outcome_lists_undownloaded_records() {
        let outcome = DownloadOutcome {
            downloaded: vec![],
            undownloaded: vec![ArticleRecord {
                date: date(2024, 9, 1),
                headline: "Wildcats Win Opener".to_string(),
                url: "https://otherhost.com/x".to_string(),
            }],
        };
        let text = outcome.to_string();
        assert!(text.contains("Undownloaded    : 1"));
        assert!(text.contains("09/01/2024  Wildcats Win Opener  <https://otherhost.com/x>"));
    }
}
