use crate::browser::Browser;
use crate::config::{parse_selector, StatsConfig, TeamConfig};
use crate::error::ScraperError;
use crate::output::OutputSink;
use crate::utils::{download_pdf, resolve_against};
use tracing::{info, warn};

/// Downloads `{abbreviation} {year} Stats.pdf` for each year.
///
/// A year whose page times out, has no PDF link or whose PDF is gone is
/// reported and skipped. Returns how many files were written.
pub async fn download_stats<B: Browser>(
    browser: &mut B,
    client: &reqwest::Client,
    team: &TeamConfig,
    years: &[u16],
    sink: &mut OutputSink,
) -> Result<usize, ScraperError> {
    let Some(stats) = team.stats.as_ref() else {
        warn!("No stats are configured for {}", team.name);
        return Ok(0);
    };

    info!("Downloading {}'s stats...", team.name);

    let mut downloaded = 0;
    for &year in years {
        let file_name = format!("{} {} Stats.pdf", team.abbreviation, year);

        let pdf_url = match stats_pdf_url(browser, stats, year).await {
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

    info!("Finished downloading {}'s stats!", team.name);
    Ok(downloaded)
}

async fn stats_pdf_url<B: Browser>(
    browser: &mut B,
    stats: &StatsConfig,
    year: u16,
) -> Result<Option<String>, ScraperError> {
    let Some(url) = stats.url_for(year) else {
        return Ok(None);
    };
    let Some((element, attr)) = stats.pdf_location.element() else {
        return Ok(Some(url));
    };

    let page = browser.open(&url, element).await?;
    let selector = parse_selector(element)?;
    let src = page
        .document()
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(ToString::to_string);

    match src {
        Some(src) => resolve_against(&page.url, &src).map(Some),
        None => Ok(None),
    }
}
