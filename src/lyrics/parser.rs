//! Lyrics text parsers.
//!
//! All parsers are pure: they never fail, unmatched input is skipped.
//!
//! Musixmatch subtitles look like:
//! [00:12.34] Hello world
//! [00:15.00]
//!
//! Standard LRC (LRCLIB) may also carry metadata tags and repeated
//! timestamps:
//! [ti:Title]
//! [00:12.34][01:12.34]Chorus

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Shown for an empty synced line (instrumental gap).
pub const INSTRUMENTAL_PLACEHOLDER: &str = " ♫";

static MUSIXMATCH_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(\d+):(\d{2})\.(\d{2})\](.*)$").expect("valid musixmatch line regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncType {
    LineSynced,
    Unsynced,
}

/// One display line. Timestamps are decimal strings, the shape the player
/// UI consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsLine {
    pub start_time_ms: String,
    pub end_time_ms: String,
    pub words: String,
    pub syllables: Vec<String>,
}

impl LyricsLine {
    fn new(start_ms: u64, words: String) -> Self {
        Self {
            start_time_ms: start_ms.to_string(),
            end_time_ms: "0".to_string(),
            words,
            syllables: Vec::new(),
        }
    }

    pub fn start_ms(&self) -> u64 {
        self.start_time_ms.parse().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lyrics {
    pub sync_type: SyncType,
    pub lines: Vec<LyricsLine>,
}

impl Lyrics {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_synced(&self) -> bool {
        self.sync_type == SyncType::LineSynced
    }
}

/// Parses a Musixmatch `subtitle_body`.
///
/// The fraction field is added as-is (`[01:02.03]` is 62003 ms, not 62030).
/// Stored timings already depend on this, so it is kept.
pub fn parse_musixmatch_lyrics(data: &str) -> Lyrics {
    let lines = data
        .lines()
        .filter_map(|line| {
            let caps = MUSIXMATCH_LINE.captures(line.trim_end_matches('\r'))?;
            let minutes: u64 = caps[1].parse().ok()?;
            let seconds: u64 = caps[2].parse().ok()?;
            let fraction: u64 = caps[3].parse().ok()?;
            let start = timestamp_ms(minutes, seconds, fraction)?;

            let text = &caps[4];
            let words = if text == " " {
                INSTRUMENTAL_PLACEHOLDER.to_string()
            } else {
                // Musixmatch separates the timestamp from the text with one space.
                text.strip_prefix(' ').unwrap_or(text).to_string()
            };
            Some(LyricsLine::new(start, words))
        })
        .collect();

    Lyrics {
        sync_type: SyncType::LineSynced,
        lines,
    }
}

/// Every input line, blank ones included, becomes an untimed line.
pub fn parse_unsynced_lyrics(data: &str) -> Lyrics {
    Lyrics {
        sync_type: SyncType::Unsynced,
        lines: data
            .lines()
            .map(|l| LyricsLine::new(0, l.to_string()))
            .collect(),
    }
}

/// Parses standard LRC as served by LRCLIB. Lines are sorted by timestamp;
/// metadata tags and untimed lines are skipped.
pub fn parse_lrc(content: &str) -> Lyrics {
    let mut timed: Vec<(u64, String)> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && parse_metadata(l).is_none())
        .filter_map(parse_timed_line)
        .flatten()
        .collect();

    // stable: equal timestamps keep document order
    timed.sort_by_key(|(ms, _)| *ms);

    Lyrics {
        sync_type: SyncType::LineSynced,
        lines: timed
            .into_iter()
            .map(|(ms, text)| LyricsLine::new(ms, text))
            .collect(),
    }
}

/// Parse metadata tag like [ti:Title]
fn parse_metadata(line: &str) -> Option<(&str, &str)> {
    let inner = line.strip_prefix('[')?;
    let end = inner.find(']')?;
    let (tag, value) = inner[..end].split_once(':')?;

    // Metadata tags are short alphabetic keys, timestamps start with digits.
    if !tag.is_empty() && tag.len() <= 6 && tag.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some((tag, value.trim()));
    }
    None
}

/// Parse a timed line like [00:12.34]Lyrics or [00:12.34][00:15.00]Lyrics
fn parse_timed_line(line: &str) -> Option<Vec<(u64, String)>> {
    let mut timestamps = Vec::new();
    let mut rest = line;

    while let Some(inner) = rest.strip_prefix('[') {
        let Some(end) = inner.find(']') else { break };
        let Some(ms) = parse_timestamp(&inner[..end]) else { break };
        timestamps.push(ms);
        rest = &inner[end + 1..];
    }

    if timestamps.is_empty() {
        return None;
    }

    let text = rest.trim();
    let text = if text.is_empty() {
        INSTRUMENTAL_PLACEHOLDER.trim_start()
    } else {
        text
    };
    Some(
        timestamps
            .into_iter()
            .map(|ts| (ts, text.to_string()))
            .collect(),
    )
}

/// Parse timestamp string like "00:12.34" or "00:12:34" to milliseconds
fn parse_timestamp(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.split([':', '.']).collect();

    match parts.as_slice() {
        [min, sec] => timestamp_ms(min.parse().ok()?, sec.parse().ok()?, 0),
        [min, sec, frac] => {
            // "3" tenths, "34" centiseconds, "340" milliseconds
            let ms: u64 = match frac.len() {
                1 => frac.parse::<u64>().ok()? * 100,
                2 => frac.parse::<u64>().ok()? * 10,
                3 => frac.parse().ok()?,
                _ => return None,
            };
            timestamp_ms(min.parse().ok()?, sec.parse().ok()?, ms)
        }
        _ => None,
    }
}

/// `None` on overflow; the line is then skipped.
fn timestamp_ms(minutes: u64, seconds: u64, ms: u64) -> Option<u64> {
    minutes
        .checked_mul(60_000)?
        .checked_add(seconds.checked_mul(1_000)?)?
        .checked_add(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn musixmatch_timestamp_adds_fraction_raw() {
        let lyrics = parse_musixmatch_lyrics("[01:02.03]Hello");
        assert_eq!(lyrics.sync_type, SyncType::LineSynced);
        assert_eq!(lyrics.lines.len(), 1);
        assert_eq!(lyrics.lines[0].start_time_ms, "62003");
        assert_eq!(lyrics.lines[0].end_time_ms, "0");
        assert_eq!(lyrics.lines[0].words, "Hello");
        assert!(lyrics.lines[0].syllables.is_empty());
    }

    #[test]
    fn musixmatch_strips_separator_and_marks_gaps() {
        let body = "[00:10.50] First line\n[00:12.00] \nnot a lyric\n[00:15.99] Second\r\n";
        let lyrics = parse_musixmatch_lyrics(body);
        let words: Vec<&str> = lyrics.lines.iter().map(|l| l.words.as_str()).collect();
        assert_eq!(words, ["First line", " ♫", "Second"]);
        assert_eq!(lyrics.lines[0].start_ms(), 10_050);
        assert_eq!(lyrics.lines[2].start_ms(), 15_099);
    }

    #[test]
    fn musixmatch_garbage_is_empty() {
        assert!(parse_musixmatch_lyrics("").is_empty());
        assert!(parse_musixmatch_lyrics("no timestamps here\n[1:2]x").is_empty());
    }

    #[test]
    fn oversized_timestamps_are_skipped() {
        let lyrics = parse_musixmatch_lyrics("[99999999999999999:00.00] x\n[00:01.00] ok");
        assert_eq!(lyrics.lines.len(), 1);
        assert_eq!(lyrics.lines[0].words, "ok");
        assert_eq!(lyrics.lines[0].start_ms(), 1000);

        // fits in u64 as a number, overflows once scaled to milliseconds
        assert!(parse_musixmatch_lyrics("[18446744073709551:00.00] x").is_empty());

        let lrc = parse_lrc("[99999999999999999:00.00]x\n[00:02.00]y");
        assert_eq!(lrc.lines.len(), 1);
        assert_eq!(lrc.lines[0].start_ms(), 2000);
        assert_eq!(parse_timestamp("18446744073709551:00"), None);
    }

    #[test]
    fn unsynced_keeps_every_line() {
        let lyrics = parse_unsynced_lyrics("one\n\ntwo\n   \nthree");
        assert_eq!(lyrics.sync_type, SyncType::Unsynced);
        let words: Vec<&str> = lyrics.lines.iter().map(|l| l.words.as_str()).collect();
        assert_eq!(words, ["one", "", "two", "   ", "three"]);
        assert!(lyrics
            .lines
            .iter()
            .all(|l| l.start_time_ms == "0" && l.end_time_ms == "0"));
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:12"), Some(12000));
        assert_eq!(parse_timestamp("01:30"), Some(90000));
        assert_eq!(parse_timestamp("00:12.34"), Some(12340));
        assert_eq!(parse_timestamp("00:12.340"), Some(12340));
        assert_eq!(parse_timestamp("00:12:34"), Some(12340));
        assert_eq!(parse_timestamp("ti:Title"), None);
    }

    #[test]
    fn test_parse_lrc() {
        let lrc = r#"
[ti:Test Song]
[ar:Test Artist]
[00:15.00]Second line
[00:12.34]First line
[00:20.00][00:30.00]Chorus
"#;
        let parsed = parse_lrc(lrc);
        assert!(parsed.is_synced());
        let lines: Vec<(u64, &str)> = parsed
            .lines
            .iter()
            .map(|l| (l.start_ms(), l.words.as_str()))
            .collect();
        assert_eq!(
            lines,
            [
                (12340, "First line"),
                (15000, "Second line"),
                (20000, "Chorus"),
                (30000, "Chorus")
            ]
        );
    }

    #[test]
    fn lyrics_json_shape() {
        let v = serde_json::to_value(parse_musixmatch_lyrics("[00:01.00] a")).unwrap();
        assert_eq!(v["syncType"], "LINE_SYNCED");
        assert_eq!(v["lines"][0]["startTimeMs"], "1000");
        assert_eq!(v["lines"][0]["words"], "a");
    }
}
