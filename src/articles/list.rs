use crate::config::{DateFormat, TeamConfig};
use crate::data::{ArticleRecord, DateRange};
use crate::error::ScraperError;
use crate::sanitize::sanitize_html;
use crate::table::text_of;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

const DATE_PREFIX: &str = "Date: ";

const E: &str = "Invalid selector";
lazy_static! {
    static ref ITEM: Selector = Selector::parse("li.vue-archives-item").expect(E);
    static ref SPAN: Selector = Selector::parse("span").expect(E);
    static ref A: Selector = Selector::parse("a[href]").expect(E);
}

/// Articles of an archive list, newest first, restricted to `range`.
///
/// Items are published newest first: those newer than the range are skipped
/// and the scan stops at the first item older than its start.
pub fn scan_list(
    team: &TeamConfig,
    list: ElementRef,
    range: &DateRange,
) -> Result<Vec<ArticleRecord>, ScraperError> {
    let list = Html::parse_fragment(&sanitize_html(&list.html()));

    let mut records = vec![];
    for item in list.select(&ITEM) {
        let label = item
            .select(&SPAN)
            .next()
            .ok_or_else(|| ScraperError::MissingElement("li.vue-archives-item span".to_string()))?;
        let label = text_of(label);
        let label = label.strip_prefix(DATE_PREFIX).unwrap_or(&label);
        let date = DateFormat::LongMonthDayYear.parse(label)?;

        if range.ends_before(date) {
            continue;
        }
        if range.starts_after(date) {
            debug!("Reached {} which is before {}, stop scanning", date, range.start);
            break;
        }

        let a = item
            .select(&A)
            .next()
            .ok_or_else(|| ScraperError::MissingElement("li.vue-archives-item a".to_string()))?;
        let href = a.value().attr("href").unwrap_or_default();

        records.push(ArticleRecord {
            date,
            headline: text_of(a),
            url: team.resolve(href)?,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{sample_team, DisplayType};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::fs;

    lazy_static! {
        static ref UL: Selector = Selector::parse("div.vue-archives-stories ul").expect(E);
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("Invalid date")
    }

    fn list_team() -> TeamConfig {
        let mut team = sample_team();
        team.hostname = "gopsusports.com".to_string();
        team.article_display_type = DisplayType::List;
        team
    }

    fn list_of(labels: &[&str]) -> String {
        let mut html = String::from(r#"<div class="vue-archives-stories"><ul>"#);
        for (i, label) in labels.iter().enumerate() {
            html.push_str(&format!(
                r#"<li class="vue-archives-item flex"><span>Date: {}</span><a href="/news/{}">Story {}</a></li>"#,
                label, i, i
            ));
        }
        html.push_str("</ul></div>");
        html
    }

    fn scan(html: &str, range: &DateRange) -> Result<Vec<ArticleRecord>, ScraperError> {
        let doc = Html::parse_fragment(html);
        let ul = doc.select(&UL).next().expect("Missing list");
        scan_list(&list_team(), ul, range)
    }

    #[test]
    fn test_scan_stops_at_first_older_item() {
        // The item after Apr 1 is unparseable, so reaching it would fail the scan.
        let html = list_of(&["April 10, 2024", "April 5, 2024", "April 1, 2024", "Sometime"]);
        let range = DateRange::new(date(2024, 4, 3), date(2024, 4, 12));

        let records = scan(&html, &range).expect("Scan failed");
        assert_eq!(
            records.iter().map(|r| r.date).collect::<Vec<_>>(),
            vec![date(2024, 4, 10), date(2024, 4, 5)]
        );
        assert_eq!(records[0].headline, "Story 0");
        assert_eq!(records[0].url, "https://gopsusports.com/news/0");
    }

    #[test]
    fn test_newer_items_are_skipped() {
        let html = list_of(&["May 2, 2024", "April 20, 2024", "April 10, 2024"]);
        let range = DateRange::new(date(2024, 4, 3), date(2024, 4, 12));

        let records = scan(&html, &range).expect("Scan failed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, date(2024, 4, 10));
        assert_eq!(records[0].headline, "Story 2");
    }

    #[test]
    fn test_unparseable_date_in_range_is_reported() {
        let html = list_of(&["April 10, 2024", "Yesterday"]);
        let range = DateRange::new(date(2024, 4, 3), date(2024, 4, 12));

        assert!(matches!(
            scan(&html, &range),
            Err(ScraperError::DateParse { .. })
        ));
    }

    #[test]
    fn test_fixture_list() {
        let html = fs::read_to_string("tests/htmls/articles_list.html").expect("Invalid file url");
        let doc = Html::parse_document(&html);
        let ul = doc.select(&UL).next().expect("Missing list");
        let range = DateRange::new(date(2024, 8, 22), date(2024, 9, 10));

        let records = scan_list(&list_team(), ul, &range).expect("Scan failed");
        assert_eq!(
            records,
            vec![
                ArticleRecord {
                    date: date(2024, 9, 8),
                    headline: "Nittany Lions Blank Rutgers at Home".to_string(),
                    url: "https://gopsusports.com/news/2024/09/08/nittany-lions-blank-rutgers".to_string(),
                },
                ArticleRecord {
                    date: date(2024, 8, 22),
                    headline: "Season Opens Thursday Night".to_string(),
                    url: "https://gopsusports.com/news/2024/08/22/season-opens".to_string(),
                },
            ]
        );
    }
}
