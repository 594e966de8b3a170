use athletics_pdf_scraper::config::{TeamConfig, TeamDirectory};
use url::Url;

fn problems(team: &TeamConfig) -> Vec<String> {
    let mut problems = vec![];
    for (field, url) in [
        ("articles_url", &team.articles_url),
        ("roster_url", &team.roster_url),
        ("schedule_url", &team.schedule_url),
    ] {
        match Url::parse(url) {
            Ok(url) if url.host_str().map(|h| team.owns_host(h)) != Some(true) => {
                problems.push(format!("{} is not on {}", field, team.hostname))
            }
            Ok(_) => {}
            Err(e) => problems.push(format!("{} is invalid: {}", field, e)),
        }
    }
    if team.stats.is_none() {
        problems.push("no stats configured".to_string());
    }
    if team.conference.is_none() {
        problems.push("no conference site configured".to_string());
    }
    problems
}

fn check_teams(path: &str) -> Result<usize, Box<dyn std::error::Error>> {
    let directory = TeamDirectory::load(path)?;
    let mut i = 0;
    for team in directory.teams() {
        let problems = problems(team);
        if problems.is_empty() {
            println!("OK   {}", team.name);
        } else {
            i += 1;
            println!("WARN {}: {}", team.name, problems.join(", "));
        }
    }
    Ok(i)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "teams.json".to_string());
    let warned = check_teams(&path)?;
    println!("{} teams with warnings", warned);
    Ok(())
}
