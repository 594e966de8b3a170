//! Box score PDFs published on the conference site.

use crate::browser::Browser;
use crate::config::{ConferenceConfig, ConferenceProvider, TeamConfig};
use crate::data::MatchRecord;
use crate::error::ScraperError;
use crate::output::{is_pdf_name, OutputSink};
use crate::table::text_of;
use crate::utils::{download_pdf, last_segment, resolve_against};
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

pub const MAX_BOX_SCORES: usize = 10;

const BOX_SCORE: &str = "Box Score";
const PRINT_BAR: &str = "div#print-bar a";
const PREVIEW: &str = "object[data]";

const E: &str = "Invalid selector";
lazy_static! {
    static ref TABLE: Selector = Selector::parse("table").expect(E);
    static ref TBODY_ROW: Selector = Selector::parse("tbody tr").expect(E);
    static ref LINK: Selector = Selector::parse("a[href]").expect(E);
    static ref AWAY: Selector = Selector::parse(r#"td[class*="sidearm-team-away"]"#).expect(E);
    static ref HOME: Selector = Selector::parse(r#"td[class*="sidearm-team-home"]"#).expect(E);
    static ref TEAM_TITLE: Selector =
        Selector::parse("span.sidearm-calendar-list-group-list-game-team-title").expect(E);
    static ref TEAM_TITLE_TEXT: Selector = Selector::parse("a, span").expect(E);
    static ref CAPTION_DATE: Selector =
        Selector::parse("caption span.hide-on-medium.sidearm-calendar-list-group-heading-date")
            .expect(E);
    static ref PRINT_LINK: Selector = Selector::parse(PRINT_BAR).expect(E);
    static ref PREVIEW_OBJECT: Selector = Selector::parse(PREVIEW).expect(E);
}

/// Keeps a requested box score count within `1..=MAX_BOX_SCORES`.
pub fn clamp_count(count: usize) -> usize {
    count.clamp(1, MAX_BOX_SCORES)
}

/// Downloads the team's newest `count` box scores. Returns how many were written.
pub async fn download_box_scores<B: Browser>(
    browser: &mut B,
    client: &reqwest::Client,
    team: &TeamConfig,
    count: usize,
    sink: &mut OutputSink,
) -> Result<usize, ScraperError> {
    let Some(conference) = team.conference.as_ref() else {
        warn!("No conference site is configured for {}", team.name);
        return Ok(0);
    };
    let count = clamp_count(count);

    info!("Downloading {}'s box scores...", team.name);
    let downloaded = match conference.provider {
        ConferenceProvider::Boost => {
            download_boost(browser, client, team, conference, count, sink).await?
        }
        ConferenceProvider::Sidearm => {
            download_sidearm(browser, client, team, conference, count, sink).await?
        }
    };
    info!("Finished downloading {}'s box scores!", team.name);
    Ok(downloaded)
}

async fn download_boost<B: Browser>(
    browser: &mut B,
    client: &reqwest::Client,
    team: &TeamConfig,
    conference: &ConferenceConfig,
    count: usize,
    sink: &mut OutputSink,
) -> Result<usize, ScraperError> {
    let url = format!(
        "{}/msoc/schedule/?teamFilter={}",
        conference.base_url(),
        team.abbreviation
    );
    let page = browser.open(&url, "table").await?;
    let pdf_urls = boost_box_score_urls(&page.document(), &page.url, count)?;

    let mut downloaded = 0;
    for pdf_url in pdf_urls {
        let mut file_name = last_segment(&pdf_url).to_string();
        if !is_pdf_name(&file_name) {
            file_name.push_str(".pdf");
        }
        match download_pdf(client, &pdf_url, &file_name, sink).await {
            Ok(true) => downloaded += 1,
            Ok(false) => {}
            Err(e) => warn!("{} failed: {}", file_name, e),
        }
    }
    Ok(downloaded)
}

/// The last `count` box score links of the first schedule table.
pub fn boost_box_score_urls(
    doc: &Html,
    page_url: &str,
    count: usize,
) -> Result<Vec<String>, ScraperError> {
    let table = doc
        .select(&TABLE)
        .next()
        .ok_or_else(|| ScraperError::MissingElement("table".to_string()))?;

    let hrefs = table
        .select(&LINK)
        .filter(|a| text_of(*a) == BOX_SCORE)
        .filter_map(|a| a.value().attr("href"))
        .collect::<Vec<_>>();
    debug!("Found {} box scores", hrefs.len());

    hrefs
        .iter()
        .skip(hrefs.len().saturating_sub(count))
        .map(|href| resolve_against(page_url, href))
        .collect()
}

async fn download_sidearm<B: Browser>(
    browser: &mut B,
    client: &reqwest::Client,
    team: &TeamConfig,
    conference: &ConferenceConfig,
    count: usize,
    sink: &mut OutputSink,
) -> Result<usize, ScraperError> {
    let url = format!("{}/calendar.aspx?path=msoc", conference.base_url());
    let page = browser.open(&url, "table").await?;
    let team_name = conference.team_name.as_deref().unwrap_or(&team.name);
    let matches = sidearm_matches(&page.document(), team_name, &page.url)?;
    debug!("Found {} matches involving {}", matches.len(), team_name);

    let mut downloaded = 0;
    for record in matches.iter().skip(matches.len().saturating_sub(count)) {
        let file_name = record.file_name();
        let pdf_url = match sidearm_pdf_url(browser, conference, record).await {
            Ok(Some(pdf_url)) => pdf_url,
            Ok(None) => {
                warn!("{} failed: could not find the PDF url", file_name);
                continue;
            }
            Err(e) => {
                warn!("{} failed: {}", file_name, e);
                continue;
            }
        };

        match download_pdf(client, &pdf_url, &file_name, sink).await {
            Ok(true) => downloaded += 1,
            Ok(false) => {}
            Err(e) => warn!("{} failed: {}", file_name, e),
        }
    }
    Ok(downloaded)
}

/// Every calendar match involving `team_name` that has a box score, oldest first.
pub fn sidearm_matches(
    doc: &Html,
    team_name: &str,
    page_url: &str,
) -> Result<Vec<MatchRecord>, ScraperError> {
    let mut matches = vec![];
    for table in doc.select(&TABLE) {
        let date = table
            .select(&CAPTION_DATE)
            .next()
            .map(|span| text_of(span).replace('/', "_"));

        for tr in table.select(&TBODY_ROW) {
            let (Some(away), Some(home)) = (team_title(tr, &AWAY), team_title(tr, &HOME)) else {
                continue;
            };
            if away != team_name && home != team_name {
                continue;
            }

            let Some(date) = date.as_ref() else {
                warn!("{} vs {} has no date, skipping", home, away);
                continue;
            };
            let Some(href) = tr
                .select(&LINK)
                .find(|a| text_of(*a) == BOX_SCORE)
                .and_then(|a| a.value().attr("href"))
            else {
                debug!("{} vs {} {} has no box score yet", home, away, date);
                continue;
            };

            matches.push(MatchRecord {
                home,
                away,
                date: date.clone(),
                box_score_url: resolve_against(page_url, href)?,
            });
        }
    }
    Ok(matches)
}

fn team_title(tr: ElementRef, side: &Selector) -> Option<String> {
    let title = tr.select(side).next()?.select(&TEAM_TITLE).next()?;
    title.select(&TEAM_TITLE_TEXT).next().map(text_of)
}

async fn sidearm_pdf_url<B: Browser>(
    browser: &mut B,
    conference: &ConferenceConfig,
    record: &MatchRecord,
) -> Result<Option<String>, ScraperError> {
    let page = browser.open(&record.box_score_url, PRINT_BAR).await?;
    let preview = page
        .document()
        .select(&PRINT_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(ToString::to_string);
    let Some(preview) = preview else {
        return Ok(None);
    };

    let preview_url = resolve_against(conference.base_url(), &preview)?;
    let page = browser.open(&preview_url, PREVIEW).await?;
    let data = page
        .document()
        .select(&PREVIEW_OBJECT)
        .next()
        .and_then(|object| object.value().attr("data"))
        .map(ToString::to_string);

    data.map(|data| resolve_against(&page.url, &data)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::StaticBrowser;
    use crate::config::sample_team;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const BOOST_SCHEDULE: &str = "https://bigten.org/msoc/schedule/?teamFilter=NU";
    const SIDEARM_CALENDAR: &str = "https://bigten.org/calendar.aspx?path=msoc";

    fn sidearm_team() -> TeamConfig {
        let mut team = sample_team();
        if let Some(conference) = team.conference.as_mut() {
            conference.provider = ConferenceProvider::Sidearm;
        }
        team
    }

    #[test]
    fn test_count_is_clamped() {
        assert_eq!(clamp_count(0), 1);
        assert_eq!(clamp_count(4), 4);
        assert_eq!(clamp_count(25), MAX_BOX_SCORES);
    }

    #[test]
    fn test_boost_keeps_last_links() {
        let html = fs::read_to_string("tests/htmls/boost_schedule.html").expect("Invalid file url");
        let doc = Html::parse_document(&html);

        assert_eq!(
            boost_box_score_urls(&doc, BOOST_SCHEDULE, 2).expect("Missing table"),
            vec![
                "https://bigten.org/documents/2024/9/14/NU_MICH.pdf".to_string(),
                "https://bigten.org/documents/2024/9/21/IU_NU.pdf".to_string(),
            ]
        );
        assert_eq!(
            boost_box_score_urls(&doc, BOOST_SCHEDULE, 10)
                .expect("Missing table")
                .len(),
            3
        );
    }

    #[test]
    fn test_sidearm_skips_other_teams() {
        let html =
            fs::read_to_string("tests/htmls/sidearm_calendar.html").expect("Invalid file url");
        let doc = Html::parse_document(&html);

        let matches = sidearm_matches(&doc, "Northwestern", SIDEARM_CALENDAR).expect("Invalid calendar");
        assert_eq!(
            matches,
            vec![
                MatchRecord {
                    home: "Northwestern".to_string(),
                    away: "Michigan".to_string(),
                    date: "9_14_2024".to_string(),
                    box_score_url: "https://bigten.org/boxscore.aspx?id=101&path=msoc".to_string(),
                },
                MatchRecord {
                    home: "Indiana".to_string(),
                    away: "Northwestern".to_string(),
                    date: "9_21_2024".to_string(),
                    box_score_url: "https://bigten.org/boxscore.aspx?id=104&path=msoc".to_string(),
                },
            ]
        );
        assert_eq!(matches[0].file_name(), "Northwestern vs Michigan 9_14_2024.pdf");
    }

    #[tokio::test]
    async fn test_download_boost_box_scores() {
        let server = MockServer::start_async().await;
        let pdf = server
            .mock_async(|when, then| {
                when.method(GET).path("/documents/2024/9/21/IU_NU.pdf");
                then.status(200).body("%PDF-1.4 box score");
            })
            .await;

        let mut team = sample_team();
        if let Some(conference) = team.conference.as_mut() {
            conference.base_url = server.base_url();
        }
        let html = fs::read_to_string("tests/htmls/boost_schedule.html").expect("Invalid file url");
        let schedule_url = server.url("/msoc/schedule/?teamFilter=NU");
        let mut browser = StaticBrowser::default().with_page(&schedule_url, &html);
        let mut sink = OutputSink::archive("NU.zip");

        let downloaded = download_box_scores(
            &mut browser,
            &reqwest::Client::new(),
            &team,
            1,
            &mut sink,
        )
        .await
        .expect("Download failed");

        pdf.assert_async().await;
        assert_eq!(downloaded, 1);
        assert_eq!(sink.written(), &["IU_NU.pdf".to_string()]);
        assert_eq!(browser.visited, vec![schedule_url]);
    }

    #[tokio::test]
    async fn test_download_sidearm_box_scores() {
        let server = MockServer::start_async().await;
        let pdf = server
            .mock_async(|when, then| {
                when.method(GET).path("/pdfs/msoc/104.pdf");
                then.status(200).body("%PDF-1.4 box score");
            })
            .await;

        let mut team = sidearm_team();
        if let Some(conference) = team.conference.as_mut() {
            conference.base_url = server.base_url();
        }
        let calendar_url = server.url("/calendar.aspx?path=msoc");
        let box_score_url = server.url("/boxscore.aspx?id=104&path=msoc");
        let preview_url = server.url("/boxscore.aspx?id=104&path=msoc&print=pdf");
        let calendar =
            fs::read_to_string("tests/htmls/sidearm_calendar.html").expect("Invalid file url");
        let mut browser = StaticBrowser::default()
            .with_page(&calendar_url, &calendar)
            .with_page(
                &box_score_url,
                r#"<html><body><div id="print-bar"><a href="/boxscore.aspx?id=104&amp;path=msoc&amp;print=pdf">Print</a></div></body></html>"#,
            )
            .with_page(
                &preview_url,
                r#"<html><body><object data="/pdfs/msoc/104.pdf" type="application/pdf"></object></body></html>"#,
            );
        let mut sink = OutputSink::archive("NU.zip");

        let downloaded = download_box_scores(
            &mut browser,
            &reqwest::Client::new(),
            &team,
            1,
            &mut sink,
        )
        .await
        .expect("Download failed");

        pdf.assert_async().await;
        assert_eq!(downloaded, 1);
        assert_eq!(
            sink.written(),
            &["Indiana vs Northwestern 9_21_2024.pdf".to_string()]
        );
        assert_eq!(browser.visited, vec![calendar_url, box_score_url, preview_url]);
    }

    #[tokio::test]
    async fn test_team_without_conference() {
        let mut team = sample_team();
        team.conference = None;
        let mut browser = StaticBrowser::default();
        let mut sink = OutputSink::archive("NU.zip");

        let downloaded = download_box_scores(
            &mut browser,
            &reqwest::Client::new(),
            &team,
            3,
            &mut sink,
        )
        .await
        .expect("Download failed");

        assert_eq!(downloaded, 0);
        assert!(browser.visited.is_empty());
    }
}
