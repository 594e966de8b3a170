use crate::error::ScraperError;
use lazy_regex::regex;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Where finished PDFs go: straight into a folder, or into a zip bundle
/// that is written once every artifact has been added.
pub enum OutputSink {
    Folder {
        path: PathBuf,
        written: Vec<String>,
    },
    Archive {
        path: PathBuf,
        zip: ZipWriter<Cursor<Vec<u8>>>,
        written: Vec<String>,
    },
}

impl OutputSink {
    pub fn folder<P: Into<PathBuf>>(path: P) -> Result<OutputSink, ScraperError> {
        let path = path.into();
        std::fs::create_dir_all(&path)?;
        Ok(OutputSink::Folder {
            path,
            written: vec![],
        })
    }

    pub fn archive<P: Into<PathBuf>>(path: P) -> OutputSink {
        OutputSink::Archive {
            path: path.into(),
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            written: vec![],
        }
    }

    /// Adds one artifact. A name already written in this run gets a
    /// ` (2)`, ` (3)`, ... suffix so neither artifact is lost.
    pub fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), ScraperError> {
        let name = unique_name(self.written(), safe_file_name(name));
        match self {
            OutputSink::Folder { path, written } => {
                std::fs::write(path.join(&name), bytes)?;
                written.push(name);
            }
            OutputSink::Archive { zip, written, .. } => {
                zip.start_file(name.as_str(), SimpleFileOptions::default())?;
                zip.write_all(bytes)?;
                written.push(name);
            }
        }
        Ok(())
    }

    pub fn written(&self) -> &[String] {
        match self {
            OutputSink::Folder { written, .. } | OutputSink::Archive { written, .. } => written,
        }
    }

    /// Flushes the bundle to disk. Returns where the artifacts ended up.
    pub fn finish(self) -> Result<PathBuf, ScraperError> {
        match self {
            OutputSink::Folder { path, written } => {
                info!("Wrote {} files to {}", written.len(), path.display());
                Ok(path)
            }
            OutputSink::Archive { path, zip, written } => {
                let cursor = zip.finish()?;
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, cursor.into_inner())?;
                info!("Bundled {} files into {}", written.len(), path.display());
                Ok(path)
            }
        }
    }
}

/// Makes a headline or remote file name usable as a file name.
pub fn safe_file_name(name: &str) -> String {
    let name = regex!(r#"[/\\:*?"<>|\x00-\x1f]"#).replace_all(name.trim(), "-");
    let name = regex!(r"\s+").replace_all(&name, " ");
    name.trim_matches(|c: char| c == '.' || c.is_whitespace()).to_string()
}

fn unique_name(written: &[String], name: String) -> String {
    if !written.contains(&name) {
        return name;
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{}", ext)),
        _ => (name.as_str(), String::new()),
    };
    let renamed = (2..)
        .map(|n| format!("{} ({}){}", stem, n, ext))
        .find(|candidate| !written.contains(candidate))
        .unwrap_or_else(|| name.clone());
    info!("{} was already written, saving as {}", name, renamed);
    renamed
}

pub fn is_pdf_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Read;

    #[test]
    fn test_safe_file_name() {
        assert_eq!(
            safe_file_name("Wildcats Top Michigan 2/1: Recap?.pdf"),
            "Wildcats Top Michigan 2-1- Recap-.pdf"
        );
        assert_eq!(safe_file_name("  Northwestern   vs  Indiana  "), "Northwestern vs Indiana");
        assert!(is_pdf_name("NU 2024 Stats.PDF"));
        assert!(!is_pdf_name("cume"));
    }

    #[test]
    fn test_folder_sink() {
        let dir = tempfile::tempdir().expect("Invalid temp dir");
        let mut sink = OutputSink::folder(dir.path().join("NU")).expect("Invalid folder");
        sink.write("NU Roster.pdf", b"%PDF-1.4").expect("Write failed");

        assert_eq!(sink.written(), &["NU Roster.pdf".to_string()]);
        let path = sink.finish().expect("Finish failed");
        assert_eq!(
            std::fs::read(path.join("NU Roster.pdf")).expect("Missing file"),
            b"%PDF-1.4"
        );
    }

    #[test]
    fn test_duplicate_names_get_a_suffix() {
        let dir = tempfile::tempdir().expect("Invalid temp dir");
        let mut folder = OutputSink::folder(dir.path().join("NU")).expect("Invalid folder");
        let mut archive = OutputSink::archive(dir.path().join("NU.zip"));
        for sink in [&mut folder, &mut archive] {
            sink.write("Match Recap.pdf", b"first").expect("Write failed");
            sink.write("Match Recap.pdf", b"second").expect("Write failed");
            sink.write("Match Recap.pdf", b"third").expect("Write failed");
            assert_eq!(
                sink.written(),
                &[
                    "Match Recap.pdf".to_string(),
                    "Match Recap (2).pdf".to_string(),
                    "Match Recap (3).pdf".to_string(),
                ]
            );
        }

        let path = folder.finish().expect("Finish failed");
        assert_eq!(
            std::fs::read(path.join("Match Recap.pdf")).expect("Missing file"),
            b"first"
        );
        assert_eq!(
            std::fs::read(path.join("Match Recap (2).pdf")).expect("Missing file"),
            b"second"
        );

        let path = archive.finish().expect("Finish failed");
        let file = std::fs::File::open(path).expect("Missing archive");
        let archive = zip::ZipArchive::new(file).expect("Invalid archive");
        assert_eq!(archive.len(), 3);
    }

    #[test]
    fn test_archive_sink() {
        let dir = tempfile::tempdir().expect("Invalid temp dir");
        let mut sink = OutputSink::archive(dir.path().join("Northwestern.zip"));
        sink.write("NU Roster.pdf", b"roster").expect("Write failed");
        sink.write("NU Schedule.pdf", b"schedule").expect("Write failed");
        let path = sink.finish().expect("Finish failed");

        let file = std::fs::File::open(path).expect("Missing archive");
        let mut archive = zip::ZipArchive::new(file).expect("Invalid archive");
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("NU Schedule.pdf")
            .expect("Missing entry")
            .read_to_string(&mut content)
            .expect("Invalid entry");
        assert_eq!(content, "schedule");
    }
}
