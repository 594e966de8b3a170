use crate::error::ScraperError;
use crate::output::OutputSink;
use reqwest::StatusCode;
use tracing::{debug, info, warn};
use url::Url;

/// Downloads an already-published PDF into `sink`.
///
/// A 404 is reported and skipped (`Ok(false)`); any other failure is an error.
pub(crate) async fn download_pdf(
    client: &reqwest::Client,
    pdf_url: &str,
    file_name: &str,
    sink: &mut OutputSink,
) -> Result<bool, ScraperError> {
    debug!("Download {}", pdf_url);
    let response = client.get(pdf_url).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        warn!(
            "{} failed: found a PDF URL, but it doesn't link to an existing file ({})",
            file_name, pdf_url
        );
        return Ok(false);
    }

    let bytes = response.error_for_status()?.bytes().await?;
    sink.write(file_name, &bytes)?;
    info!("{} downloaded", file_name);
    Ok(true)
}

/// Resolves a link found on the page at `page_url`.
pub(crate) fn resolve_against(page_url: &str, href: &str) -> Result<String, ScraperError> {
    let base = Url::parse(page_url).map_err(|source| ScraperError::InvalidUrl {
        url: page_url.to_string(),
        source,
    })?;
    base.join(href.trim())
        .map(String::from)
        .map_err(|source| ScraperError::InvalidUrl {
            url: href.to_string(),
            source,
        })
}

/// Last path segment of a URL, without any query string.
pub(crate) fn last_segment(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_last_segment() {
        assert_eq!(
            last_segment("https://bigten.org/documents/2024/9/1/NU_IU.pdf?v=3"),
            "NU_IU.pdf"
        );
        assert_eq!(last_segment("https://bigten.org/boxscore/"), "boxscore");
    }

    #[test]
    fn test_resolve_against_page() {
        assert_eq!(
            resolve_against("https://nusports.com/sports/mens-soccer/stats/2024", "/documents/cume.pdf")
                .expect("Invalid url"),
            "https://nusports.com/documents/cume.pdf"
        );
    }

    #[tokio::test]
    async fn test_download_pdf() {
        let server = MockServer::start_async().await;
        let found = server
            .mock_async(|when, then| {
                when.method(GET).path("/stats/2024.pdf");
                then.status(200).body("%PDF-1.4 stats");
            })
            .await;
        let missing = server
            .mock_async(|when, then| {
                when.method(GET).path("/stats/2023.pdf");
                then.status(404);
            })
            .await;

        let dir = tempfile::tempdir().expect("Invalid temp dir");
        let mut sink = OutputSink::folder(dir.path()).expect("Invalid folder");
        let client = reqwest::Client::new();

        let saved = download_pdf(&client, &server.url("/stats/2024.pdf"), "NU 2024 Stats.pdf", &mut sink)
            .await
            .expect("Download failed");
        let skipped = download_pdf(&client, &server.url("/stats/2023.pdf"), "NU 2023 Stats.pdf", &mut sink)
            .await
            .expect("Download failed");

        found.assert_async().await;
        missing.assert_async().await;
        assert!(saved);
        assert!(!skipped);
        assert_eq!(sink.written(), &["NU 2024 Stats.pdf".to_string()]);
        assert_eq!(
            std::fs::read(dir.path().join("NU 2024 Stats.pdf")).expect("Missing file"),
            b"%PDF-1.4 stats"
        );
    }
}
