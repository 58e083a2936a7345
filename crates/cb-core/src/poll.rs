//! Poll option parsing

use crate::{Error, Result};

/// Regional-indicator markers, one per option in order
pub const OPTION_MARKERS: [&str; 20] = [
    "🇦", "🇧", "🇨", "🇩", "🇪", "🇫", "🇬", "🇭", "🇮", "🇯", "🇰", "🇱", "🇲", "🇳", "🇴", "🇵", "🇶",
    "🇷", "🇸", "🇹",
];

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = OPTION_MARKERS.len();

/// Split comma-separated options, trimming and dropping blanks
pub fn parse_options(raw: &str) -> Result<Vec<String>> {
    let options: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(str::to_string)
        .collect();

    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
        return Err(Error::PollOptionCount(options.len()));
    }
    Ok(options)
}

/// Options paired with their reaction markers
pub fn with_markers(options: &[String]) -> impl Iterator<Item = (&'static str, &str)> {
    OPTION_MARKERS
        .iter()
        .copied()
        .zip(options.iter().map(String::as_str))
}
