//! Price field extraction: pair, direction + entry, stop loss, take profits.
//!
//! Every extractor is an ordered cascade of patterns. The first pattern that
//! matches *and* yields well-formed numbers wins; a malformed number only
//! skips that pattern.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::Direction;

/// Loose numeric token: digits with `.` and thousands `,` separators.
const NUM_TOKEN: &str = r"[\d.,]+";
const NUM: &str = r"([\d.,]+)";
/// One comma-list entry. Starts and ends on a digit so a separator comma is
/// never swallowed; inner commas are thousands separators.
const LIST_ITEM: &str = r"\d(?:[\d.,]*\d)?";

static PAIR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]{3,})/([A-Z]{3,})").unwrap());

/// Direction + entry rules in priority order. Each has `kw` and `price` groups.
static ENTRY_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i)\b(?P<kw>buy|sell)\s+at\s*(?P<price>{NUM_TOKEN})"),
        format!(r"(?i)\b(?P<kw>entry|long|short)\s*:?\s*(?P<price>{NUM_TOKEN})"),
        format!(r"(?i)(?P<price>{NUM_TOKEN})\s*(?P<kw>buy|sell)\b"),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

const STOP_KEYWORDS: &[&str] = &[r"sl", r"stop\s+loss", r"stoploss"];

/// Every `at`-qualified keyword first, then the bare forms.
static STOP_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let qualified = STOP_KEYWORDS
        .iter()
        .map(|kw| format!(r"(?i)\b{kw}\s*at\s*{NUM}"));
    let bare = STOP_KEYWORDS
        .iter()
        .map(|kw| format!(r"(?i)\b{kw}\s*:?\s*{NUM}"));
    qualified
        .chain(bare)
        .map(|p| Regex::new(&p).unwrap())
        .collect()
});

#[derive(Debug, Clone, Copy)]
enum TpRule {
    /// Every `TP<n> at <number>`.
    EachAt,
    /// Every `TP<n> <number>` / `TP<n>: <number>`.
    EachBare,
    /// One `TP(s): a, b, c` list.
    CommaList,
    /// One `TP at <number>` / `TP <number>`.
    Single,
}

static TP_RULES: LazyLock<Vec<(Regex, TpRule)>> = LazyLock::new(|| {
    vec![
        (Regex::new(&format!(r"(?i)\btp\d*\s*at\s*{NUM}")).unwrap(), TpRule::EachAt),
        (
            Regex::new(&format!(r"(?i)\btp(?:\d+\s*:?\s*|\s+){NUM}")).unwrap(),
            TpRule::EachBare,
        ),
        (
            Regex::new(&format!(r"(?i)\btps?\s*:\s*({LIST_ITEM}(?:[ \t]*,[ \t]+{LIST_ITEM})*)"))
                .unwrap(),
            TpRule::CommaList,
        ),
        (
            Regex::new(&format!(r"(?i)\btp(?:\s*at\s*|\s*:\s*|\s+){NUM}")).unwrap(),
            TpRule::Single,
        ),
    ]
});

static LIST_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]*,[ \t]+").unwrap());

/// Parses a loose price token. Thousands commas and a trailing sentence
/// period are dropped. Anything that is not a finite positive number is `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim_end_matches('.');
    let value: f64 = cleaned.parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

pub fn extract_pair(text: &str) -> Option<String> {
    PAIR_REGEX
        .captures(text)
        .map(|caps| format!("{}/{}", &caps[1], &caps[2]).to_uppercase())
}

pub fn extract_entry(text: &str) -> Option<(Direction, f64)> {
    ENTRY_RULES.iter().find_map(|rule| {
        let caps = rule.captures(text)?;
        let direction = Direction::from_keyword(caps.name("kw")?.as_str())?;
        let price = parse_number(caps.name("price")?.as_str())?;
        Some((direction, price))
    })
}

pub fn extract_stop_loss(text: &str) -> Option<f64> {
    STOP_RULES
        .iter()
        .find_map(|rule| parse_number(rule.captures(text)?.get(1)?.as_str()))
}

pub fn extract_take_profits(text: &str) -> Option<Vec<f64>> {
    TP_RULES.iter().find_map(|(rule, kind)| {
        let levels = match kind {
            TpRule::EachAt | TpRule::EachBare => rule
                .captures_iter(text)
                .map(|caps| parse_number(&caps[1]))
                .collect::<Option<Vec<f64>>>()?,
            TpRule::CommaList => split_list(rule.captures(text)?.get(1)?.as_str())?,
            TpRule::Single => vec![parse_number(rule.captures(text)?.get(1)?.as_str())?],
        };
        (!levels.is_empty()).then_some(levels)
    })
}

/// `125, 130, 135` and `1,250, 1,300` split on comma + whitespace. A comma
/// with no whitespace after it is a thousands separator, so `35,500` is one
/// level.
fn split_list(raw: &str) -> Option<Vec<f64>> {
    LIST_SEPARATOR
        .split(raw.trim())
        .map(parse_number)
        .collect::<Option<Vec<f64>>>()
        .filter(|levels| !levels.is_empty())
}
