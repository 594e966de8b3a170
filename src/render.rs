use crate::error::ScraperError;
use crate::table::escape;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[async_trait::async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<Vec<u8>, ScraperError>;
}

/// Renders HTML by piping it through the `wkhtmltopdf` binary.
#[derive(Debug, Clone)]
pub struct Wkhtmltopdf {
    binary: PathBuf,
}

impl Wkhtmltopdf {
    pub fn new<P: Into<PathBuf>>(binary: P) -> Self {
        Wkhtmltopdf {
            binary: binary.into(),
        }
    }
}

impl Default for Wkhtmltopdf {
    fn default() -> Self {
        Wkhtmltopdf::new("wkhtmltopdf")
    }
}

#[async_trait::async_trait]
impl PdfRenderer for Wkhtmltopdf {
    async fn render(&self, html: &str) -> Result<Vec<u8>, ScraperError> {
        let mut child = Command::new(&self.binary)
            .args(["--quiet", "--encoding", "utf-8", "-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ScraperError::Render("stdin is not available".to_string()))?;
        let html = html.to_string();
        let writer = tokio::spawn(async move {
            stdin.write_all(html.as_bytes()).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(ScraperError::Render(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        writer
            .await
            .map_err(|e| ScraperError::Render(e.to_string()))??;

        debug!("Rendered {} bytes of PDF", output.stdout.len());
        Ok(output.stdout)
    }
}

const TABLE_STYLE: &str = r#"
        table { width: 100%; border-collapse: collapse; }
        thead { display: table-row-group; }
        th, td { font-size: 12px; border: 1px solid #ddd; padding: 8px; text-align: left; }
        th { background-color: #f4f4f4; }"#;

fn skeleton(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>{head_extra}
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape(title),
        head_extra = head_extra,
        body = body,
    )
}

/// A story page: the headline followed by the sanitized story body.
pub fn article_document(headline: &str, content: &str) -> String {
    let body = format!("    <h1>{}</h1>\n{}", escape(headline), content);
    skeleton(headline, "", &body)
}

/// A page rebuilt from its tables, each preceded by an empty `div` separator.
pub fn tables_document(title: &str, tables: &[String]) -> String {
    let mut main = format!("<main>\n    <h1>{}</h1>\n", escape(title));
    for table in tables {
        main.push_str("    <div></div>\n");
        main.push_str(table);
        main.push('\n');
    }
    main.push_str("</main>");
    skeleton(title, &format!("\n    <style>{}\n    </style>", TABLE_STYLE), &main)
}

/// A whole sanitized page; `<base>` keeps its relative assets loadable.
pub fn page_document(title: &str, base_url: &str, body: &str) -> String {
    let head = format!("\n    <base href=\"{}/\">", escape(base_url));
    skeleton(title, &head, body)
}


#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_article_document() {
        let html = article_document("Wildcats Win 2-1 at Michigan", "<p>Story</p>");
        let doc = Html::parse_document(&html);

        let title = Selector::parse("title").expect("Invalid selector");
        let h1 = Selector::parse("h1").expect("Invalid selector");
        assert_eq!(
            doc.select(&title).next().map(|t| t.inner_html()),
            Some("Wildcats Win 2-1 at Michigan".to_string())
        );
        assert_eq!(doc.select(&h1).count(), 1);
        assert!(html.contains("<p>Story</p>"));
    }

    #[test]
    fn test_tables_document() {
        let tables = vec!["<table><tr><td>1</td></tr></table>".to_string(); 2];
        let html = tables_document("2024 Men's Soccer Roster", &tables);
        let doc = Html::parse_document(&html);

        let table = Selector::parse("main table").expect("Invalid selector");
        assert_eq!(doc.select(&table).count(), 2);
        assert!(html.contains("border-collapse"));
        assert!(html.contains("<title>2024 Men's Soccer Roster</title>"));
    }

    #[test]
    fn test_page_document_sets_base() {
        let html = page_document("Schedule", "https://nusports.com", "<p>x</p>");
        assert!(html.contains(r#"<base href="https://nusports.com/">"#));
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let renderer = Wkhtmltopdf::new("/nonexistent/wkhtmltopdf");
        assert!(matches!(
            renderer.render("<p>x</p>").await,
            Err(ScraperError::Io(_))
        ));
    }
}
