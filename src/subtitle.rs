use serde::{Deserialize, Serialize};
use tracing::debug;

/// One caption block of an SRT file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    /// Display order as written in the file; may repeat or skip
    pub index: i64,
    /// Timecode line, kept verbatim
    pub timing: String,
    /// Caption text, lines joined with '\n'
    pub text: String,
}

/// Decode raw upload bytes, dropping any invalid UTF-8 sequences.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut content = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        content.push_str(chunk.valid());
    }

    match content.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => content,
    }
}

/// Parse SRT bytes into entries, in file order.
///
/// Blocks without a numeric index line, without a timing line, or without
/// any non-blank caption text are skipped.
pub fn parse_srt(bytes: &[u8]) -> Vec<SubtitleEntry> {
    let content = decode_lossy(bytes)
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    let mut subtitles = Vec::new();

    for block in content.trim().split("\n\n") {
        let lines: Vec<&str> = block.trim().split('\n').collect();
        if lines.len() < 3 {
            continue;
        }

        let Ok(index) = lines[0].trim().parse::<i64>() else {
            debug!("Skipping block with non-numeric index: {:?}", lines[0]);
            continue;
        };

        let text = lines[2..]
            .iter()
            .map(|line| line.trim())
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            continue;
        }

        subtitles.push(SubtitleEntry {
            index,
            timing: lines[1].trim().to_string(),
            text,
        });
    }

    subtitles
}

/// Render entries back to SRT text with '\n' line endings.
pub fn build_srt(subtitles: &[SubtitleEntry]) -> String {
    let mut srt_content = String::new();

    for sub in subtitles {
        srt_content.push_str(&format!("{}\n{}\n{}\n\n", sub.index, sub.timing, sub.text));
    }

    srt_content.trim().to_string()
}
