//! Extracts tip candidates from raw generated text.

use tracing::debug;

pub const MIN_TIP_CHARS: usize = 15;
pub const MAX_TIP_CHARS: usize = 120;
pub const DEFAULT_MAX_TIPS: usize = 12;

const HEADING_WORDS: [&str; 2] = ["tips", "wisdom"];

/// Pictographic and symbol blocks a tip may start with.
const EMOJI_RANGES: [(u32, u32); 4] = [
    (0x1F300, 0x1F9FF), // misc symbols & pictographs, emoticons, transport, supplemental
    (0x2600, 0x27BF),   // misc symbols, dingbats
    (0x1F100, 0x1F1FF), // enclosed alphanumeric supplement
    (0x1F200, 0x1F2FF), // enclosed ideographic supplement
];

pub fn is_emoji(c: char) -> bool {
    let cp = c as u32;
    EMOJI_RANGES.iter().any(|&(lo, hi)| cp >= lo && cp <= hi)
}

/// Presentation selectors, joiners and skin tones that ride along with an emoji.
fn is_emoji_modifier(c: char) -> bool {
    matches!(c as u32, 0xFE0E | 0xFE0F | 0x200D | 0x1F3FB..=0x1F3FF)
}

fn starts_with_single_emoji(line: &str) -> bool {
    let mut chars = line.chars();
    match chars.next() {
        Some(first) if is_emoji(first) => {}
        _ => return false,
    }
    loop {
        match chars.next() {
            // a joined pictograph is part of the same glyph
            Some('\u{200D}') => {
                chars.next();
            }
            Some(c) if is_emoji_modifier(c) => {}
            Some(c) => return !is_emoji(c),
            None => return false,
        }
    }
}

/// `1.`, `12)` and similar list numbering. `2.6kg` is a number, not a marker.
fn is_numbered(text: &str) -> bool {
    let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return false;
    }
    let mut rest = text[digits..].chars();
    match rest.next() {
        Some('.') | Some(')') => rest.next().map_or(true, char::is_whitespace),
        _ => false,
    }
}

fn has_numbering(line: &str) -> bool {
    if is_numbered(line) {
        return true;
    }
    // "🌱 1. ..." still counts as a numbered list entry
    let body = line
        .trim_start_matches(|c: char| is_emoji(c) || is_emoji_modifier(c))
        .trim_start();
    is_numbered(body)
}

fn has_heading_word(line: &str) -> bool {
    let lower = line.to_lowercase();
    HEADING_WORDS.iter().any(|w| lower.contains(w))
}

fn strip_bullet(line: &str) -> &str {
    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest.trim_start();
        }
    }
    line
}

/// Whether a single trimmed line is an acceptable tip.
pub fn is_valid_tip(line: &str) -> bool {
    let len = line.chars().count();
    starts_with_single_emoji(line)
        && (MIN_TIP_CHARS..=MAX_TIP_CHARS).contains(&len)
        && !has_numbering(line)
        && !has_heading_word(line)
}

/// Split raw text into lines and keep at most `max_tips` valid tips, in order.
pub fn parse_tips(raw: &str, max_tips: usize) -> Vec<String> {
    let tips: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(strip_bullet)
        .filter(|line| is_valid_tip(line))
        .take(max_tips)
        .map(str::to_string)
        .collect();

    debug!("✅ Validated {} tips", tips.len());
    tips
}
