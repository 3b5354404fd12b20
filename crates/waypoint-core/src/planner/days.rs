//! Trip duration parsing.
//!
//! Free-text durations ("3박4일", "일주일", "5일", "3") are resolved by an
//! ordered rule table. The first rule that yields a positive count wins;
//! anything else falls back to a single day.

/// Day count used when the text is empty or no rule applies.
pub const DEFAULT_TRAVEL_DAYS: u32 = 1;

const WEEK_DAYS: u32 = 7;

type Rule = fn(&str) -> Option<u32>;

/// Rules in evaluation order. Night/day compounds come before bare day
/// counts.
const RULES: &[(&str, Rule)] = &[
    ("nights_and_days", nights_and_days),
    ("week", week),
    ("days_suffix", days_suffix),
    ("bare_integer", bare_integer),
];

/// "<N>박<M>일" -> M.
fn nights_and_days(text: &str) -> Option<u32> {
    if !(text.contains('박') && text.contains('일')) {
        return None;
    }
    let before_days = text.split('일').next()?;
    before_days.rsplit('박').next()?.parse().ok()
}

/// "일주일", "1주", "one week" -> 7.
fn week(text: &str) -> Option<u32> {
    (text.contains('주') || text.contains("week")).then_some(WEEK_DAYS)
}

/// "<N>일" -> N.
fn days_suffix(text: &str) -> Option<u32> {
    if !text.contains('일') {
        return None;
    }
    text.replace('일', "").parse().ok()
}

fn bare_integer(text: &str) -> Option<u32> {
    text.parse().ok()
}

/// Resolve a free-text duration to a positive day count. Never fails.
pub fn parse_travel_days(text: &str) -> u32 {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    if compact.is_empty() {
        return DEFAULT_TRAVEL_DAYS;
    }

    RULES
        .iter()
        .find_map(|(_, rule)| rule(&compact).filter(|&days| days > 0))
        .unwrap_or(DEFAULT_TRAVEL_DAYS)
}
