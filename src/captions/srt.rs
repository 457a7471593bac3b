//! SRT serialization
//!
//! Sequential caption index, `HH:MM:SS,mmm --> HH:MM:SS,mmm` timestamp
//! line, caption text, blank line separator.

use super::Caption;

/// Serialize captions to SRT, sorted by start time
pub fn to_srt(captions: &[Caption]) -> String {
    let mut sorted: Vec<&Caption> = captions.iter().collect();
    sorted.sort_by_key(|c| c.start_ms);

    let mut out = String::new();
    for (index, caption) in sorted.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_timestamp(caption.start_ms),
            format_timestamp(caption.end_ms),
            caption.text
        ));
    }
    out
}

fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}
