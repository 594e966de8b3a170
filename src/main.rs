use athletics_pdf_scraper::browser::BrowserOptions;
use athletics_pdf_scraper::config::{TeamConfig, TeamDirectory};
use athletics_pdf_scraper::output::OutputSink;
use athletics_pdf_scraper::render::Wkhtmltopdf;
use athletics_pdf_scraper::scrape::{ArticleSelection, Category, Report, ScrapeRequest, Scraper};
use athletics_pdf_scraper::{ArticleRecord, DateRange};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

/// Turns a team's athletics site into a bundle of PDFs.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Team configuration file.
    #[arg(long, global = true, default_value = "teams.json")]
    teams: PathBuf,

    /// ChromeDriver endpoint.
    #[arg(long, global = true, default_value = "http://localhost:9515")]
    webdriver: String,

    #[arg(long, global = true, default_value = "wkhtmltopdf")]
    wkhtmltopdf: PathBuf,

    /// Seconds to wait for a page to become ready.
    #[arg(long, global = true, default_value_t = 15)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the configured teams.
    Teams,
    /// List a team's articles, and render the selected ones.
    Articles {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    Roster {
        #[command(flatten)]
        target: Target,
    },
    Schedule {
        #[command(flatten)]
        target: Target,
    },
    Stats {
        #[command(flatten)]
        target: Target,
        /// Seasons to download, defaults to this season and the one before.
        #[arg(long, value_delimiter = ',')]
        years: Vec<u16>,
    },
    BoxScores {
        #[command(flatten)]
        target: Target,
        /// Newest box scores to download (1-10).
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
    /// Run several categories in one go.
    Scrape {
        #[command(flatten)]
        target: Target,
        /// Defaults to every category.
        #[arg(long, value_enum, value_delimiter = ',')]
        categories: Vec<Category>,
        #[arg(long, value_delimiter = ',')]
        years: Vec<u16>,
        #[arg(long, default_value_t = 5)]
        count: usize,
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        selection: SelectionArgs,
    },
}

#[derive(Debug, Args)]
struct Target {
    /// Team name as written in the configuration file.
    team: String,

    /// Folder to write the PDFs to.
    #[arg(long, short, default_value = "output", conflicts_with = "archive")]
    output: PathBuf,

    /// Bundle the PDFs into this zip file instead.
    #[arg(long)]
    archive: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RangeArgs {
    /// First publication date (YYYY-MM-DD), defaults to the season start.
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last publication date (YYYY-MM-DD), defaults to today.
    #[arg(long)]
    to: Option<NaiveDate>,
}

#[derive(Debug, Args)]
struct SelectionArgs {
    /// Indexes of the listed articles to render, e.g. `0,2,5`.
    #[arg(long, value_delimiter = ',', conflicts_with = "all")]
    select: Vec<usize>,
    /// Render every listed article.
    #[arg(long)]
    all: bool,
}

impl SelectionArgs {
    fn selection(&self) -> ArticleSelection {
        if self.all {
            ArticleSelection::All
        } else if self.select.is_empty() {
            ArticleSelection::None
        } else {
            ArticleSelection::Indexes(self.select.clone())
        }
    }
}

impl Target {
    fn sink(&self, team: &TeamConfig) -> Result<OutputSink, Box<dyn std::error::Error>> {
        match &self.archive {
            Some(archive) => Ok(OutputSink::archive(archive)),
            None => Ok(OutputSink::folder(self.output.join(&team.name))?),
        }
    }
}

fn print_articles(articles: &[ArticleRecord], range: &DateRange) {
    if articles.is_empty() {
        println!("No articles between {} and {}", range.start, range.end);
        return;
    }
    for (i, record) in articles.iter().enumerate() {
        println!("[{:>3}] {}", i, record);
    }
}

fn print_report(report: &Report, request: &ScrapeRequest) {
    if request.categories.contains(&Category::Articles) {
        print_articles(&report.articles, &request.date_range);
        if request.articles != ArticleSelection::None {
            print!("{}", report.outcome);
        }
    }
    print!("{}", report);
}

async fn scrape(
    cli: &Cli,
    directory: &TeamDirectory,
    target: &Target,
    build: impl FnOnce(ScrapeRequest) -> ScrapeRequest,
    categories: &[Category],
) -> Result<(), Box<dyn std::error::Error>> {
    let team = directory.get(&target.team)?;
    let today = Local::now().date_naive();
    let request = build(ScrapeRequest::new(team.clone(), categories, today));

    let scraper = Scraper::new(
        BrowserOptions {
            webdriver_url: cli.webdriver.clone(),
            timeout: Duration::from_secs(cli.timeout),
        },
        Box::new(Wkhtmltopdf::new(&cli.wkhtmltopdf)),
    );

    let mut sink = target.sink(team)?;
    let report = scraper.run(&request, &mut sink).await?;
    let written = sink.written().len();
    let path = sink.finish()?;
    info!("{} files written to {}", written, path.display());

    print_report(&report, &request);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let cli = Cli::parse();
    let directory = TeamDirectory::load(&cli.teams)?;

    match &cli.command {
        Command::Teams => {
            for team in directory.teams() {
                println!("{:<20} {:<6} {}", team.name, team.abbreviation, team.hostname);
            }
        }
        Command::Articles {
            target,
            range,
            selection,
        } => {
            scrape(
                &cli,
                &directory,
                target,
                |request| {
                    request
                        .with_date_range(range.from, range.to)
                        .with_articles(selection.selection())
                },
                &[Category::Articles],
            )
            .await?
        }
        Command::Roster { target } => {
            scrape(&cli, &directory, target, |r| r, &[Category::Roster]).await?
        }
        Command::Schedule { target } => {
            scrape(&cli, &directory, target, |r| r, &[Category::Schedule]).await?
        }
        Command::Stats { target, years } => {
            scrape(
                &cli,
                &directory,
                target,
                |request| request.with_years(years.clone()),
                &[Category::Stats],
            )
            .await?
        }
        Command::BoxScores { target, count } => {
            scrape(
                &cli,
                &directory,
                target,
                |request| request.with_box_score_count(*count),
                &[Category::BoxScores],
            )
            .await?
        }
        Command::Scrape {
            target,
            categories,
            years,
            count,
            range,
            selection,
        } => {
            let categories = if categories.is_empty() {
                Category::ALL.to_vec()
            } else {
                categories.clone()
            };
            scrape(
                &cli,
                &directory,
                target,
                |request| {
                    request
                        .with_years(years.clone())
                        .with_box_score_count(*count)
                        .with_date_range(range.from, range.to)
                        .with_articles(selection.selection())
                },
                &categories,
            )
            .await?
        }
    }

    Ok(())
}
