//! Survival-round score records: appended as human-readable blocks to a
//! scores file (XDG config or ~/.config/tiletui).

use crate::engine::RoundOutcome;
use anyhow::Result;
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

const FILENAME: &str = "scores.txt";

/// One finished survival round, ready to persist.
#[derive(Debug, Clone)]
pub struct ScoreEntry {
    pub outcome: RoundOutcome,
    pub whites_clicked: u32,
    pub seconds_survived: f64,
    pub name: String,
}

/// Consumes a finished round's outcome. The engine never waits on this; the
/// app hands the entry over after the round has already terminated.
pub trait ResultSink {
    fn record(&mut self, entry: &ScoreEntry) -> Result<()>;
}

/// Header label for the block; the footer's dash run matches its length.
fn outcome_label(outcome: RoundOutcome) -> &'static str {
    match outcome {
        // Advance never reaches the sink; only survival outcomes are recorded.
        RoundOutcome::Win | RoundOutcome::Advance(_) => "WINNER",
        RoundOutcome::FailBlackTile => "LOSER - BLACK TILE",
        RoundOutcome::FailTimeout => "LOSER - OUT OF TIME",
    }
}

/// Render one score block:
///
/// ```text
///
///
/// <-> ----- LOSER - OUT OF TIME ----- <->
/// NAME: Tyler Procko
/// WHITE TILES CLICKED: 15
/// TIME SURVIVED: 15.05 seconds
/// <-> ------------------------------- <->
/// ```
///
/// Two leading blank lines separate consecutive blocks; the footer carries
/// one dash per header-label character plus the fixed six on each side.
pub fn format_block(entry: &ScoreEntry) -> String {
    let label = outcome_label(entry.outcome);
    let mut block = String::new();
    block.push('\n');
    block.push('\n');
    let _ = writeln!(block, "<-> ----- {label} ----- <->");
    let _ = writeln!(block, "NAME: {}", entry.name);
    let _ = writeln!(block, "WHITE TILES CLICKED: {}", entry.whites_clicked);
    let _ = writeln!(block, "TIME SURVIVED: {:.2} seconds", entry.seconds_survived);
    let _ = write!(block, "<-> ------{}------ <->", "-".repeat(label.len()));
    block
}

/// Default scores path: config dir / tiletui / scores.txt.
fn default_path() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if xdg.is_empty() {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".config")
        } else {
            PathBuf::from(xdg)
        }
    } else {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from("."))
    };
    base.join("tiletui").join(FILENAME)
}

/// Appends score blocks to a file. Write failures are the caller's to log
/// and swallow; a lost score never fails the round.
#[derive(Debug, Clone)]
pub struct FileScores {
    path: PathBuf,
}

impl FileScores {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.unwrap_or_else(default_path),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ResultSink for FileScores {
    fn record(&mut self, entry: &ScoreEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format_block(entry).as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(outcome: RoundOutcome) -> ScoreEntry {
        ScoreEntry {
            outcome,
            whites_clicked: 15,
            seconds_survived: 15.051,
            name: "Tyler Procko".to_string(),
        }
    }

    #[test]
    fn block_fields_in_order() {
        let block = format_block(&entry(RoundOutcome::FailTimeout));
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "<-> ----- LOSER - OUT OF TIME ----- <->");
        assert_eq!(lines[3], "NAME: Tyler Procko");
        assert_eq!(lines[4], "WHITE TILES CLICKED: 15");
        assert_eq!(lines[5], "TIME SURVIVED: 15.05 seconds");
        assert_eq!(lines[6], "<-> ------------------------------- <->");
    }

    #[test]
    fn footer_dashes_track_label_length() {
        for outcome in [
            RoundOutcome::Win,
            RoundOutcome::FailBlackTile,
            RoundOutcome::FailTimeout,
        ] {
            let block = format_block(&entry(outcome));
            let lines: Vec<&str> = block.lines().collect();
            let header = lines[2];
            let footer = lines[6];
            assert_eq!(header.len(), footer.len());
            let dashes = footer.trim_start_matches("<-> ").trim_end_matches(" <->");
            assert!(dashes.chars().all(|c| c == '-'));
            assert_eq!(dashes.len(), outcome_label(outcome).len() + 12);
        }
    }

    #[test]
    fn win_label() {
        let block = format_block(&entry(RoundOutcome::Win));
        assert!(block.contains("<-> ----- WINNER ----- <->"));
    }

    #[test]
    fn file_sink_appends_blocks() {
        let path = std::env::temp_dir().join(format!("tiletui-scores-{}", std::process::id()));
        let _ = fs::remove_file(&path);
        let mut sink = FileScores::new(Some(path.clone()));
        sink.record(&entry(RoundOutcome::Win)).unwrap();
        sink.record(&entry(RoundOutcome::FailBlackTile)).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("WINNER"));
        assert!(contents.contains("LOSER - BLACK TILE"));
        assert_eq!(contents.matches("NAME: Tyler Procko").count(), 2);
        let _ = fs::remove_file(&path);
    }
}
