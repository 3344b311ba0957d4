// src/watchlist/fuzzy.rs
//! Rust renditions of the PostgreSQL `fuzzystrmatch` functions used by the
//! lookup query, so the in-memory store answers the same way the database does.

use super::query::MAX_EDIT_DISTANCE;

const SOUNDEX_LEN: usize = 4;
const SOUNDEX_TABLE: &[u8; 26] = b"01230120022455012623010202";

fn soundex_code(c: char) -> char {
    let up = c.to_ascii_uppercase();
    if up.is_ascii_uppercase() {
        SOUNDEX_TABLE[(up as u8 - b'A') as usize] as char
    } else {
        up
    }
}

/// Four-character soundex code. Leading non-letters are skipped; an input
/// without ASCII letters yields an empty string.
pub fn soundex(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let Some(start) = chars.iter().position(|c| c.is_ascii_alphabetic()) else {
        return String::new();
    };

    let mut out = String::with_capacity(SOUNDEX_LEN);
    out.push(chars[start].to_ascii_uppercase());

    let mut i = start + 1;
    while i < chars.len() && out.len() < SOUNDEX_LEN {
        let c = chars[i];
        // Compared against the raw previous char, letter or not.
        if c.is_ascii_alphabetic() && soundex_code(c) != soundex_code(chars[i - 1]) {
            let code = soundex_code(c);
            if code != '0' {
                out.push(code);
            }
        }
        i += 1;
    }

    while out.len() < SOUNDEX_LEN {
        out.push('0');
    }
    out
}

/// Levenshtein distance capped at `max + 1`: any value above `max` only says
/// "too far".
pub fn levenshtein_less_equal(a: &str, b: &str, max: usize) -> usize {
    strsim::levenshtein(a, b).min(max + 1)
}

/// The lookup predicate: phonetic equality OR edit distance within bound,
/// both on lower-cased values.
pub fn fuzzy_match(entity: &str, term: &str) -> bool {
    let entity = entity.to_lowercase();
    let term = term.to_lowercase();
    soundex(&entity) == soundex(&term)
        || levenshtein_less_equal(&entity, &term, MAX_EDIT_DISTANCE) <= MAX_EDIT_DISTANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soundex_reference_values() {
        assert_eq!(soundex("Robert"), "R163");
        assert_eq!(soundex("Rupert"), "R163");
        assert_eq!(soundex("Tymczak"), "T522");
        assert_eq!(soundex("Pfister"), "P236");
        assert_eq!(soundex("skywalker"), "S426");
        assert_eq!(soundex("droid"), "D630");
    }

    #[test]
    fn soundex_skips_leading_non_letters_and_pads() {
        assert_eq!(soundex("  42lee"), "L000");
        assert_eq!(soundex("a"), "A000");
        assert_eq!(soundex("123"), "");
        assert_eq!(soundex(""), "");
    }

    #[test]
    fn bounded_distance_caps_above_max() {
        assert_eq!(levenshtein_less_equal("skywalker", "skywlker", 2), 1);
        assert_eq!(levenshtein_less_equal("kitten", "sitting", 2), 3);
        assert_eq!(levenshtein_less_equal("jedi", "jedi", 2), 0);
    }

    #[test]
    fn matches_by_edit_distance_only() {
        // Different soundex (D630 vs D620) but one edit apart.
        assert_ne!(soundex("droid"), soundex("droix"));
        assert!(fuzzy_match("Droid", "droix"));
    }

    #[test]
    fn matches_by_soundex_only() {
        // Far apart in spelling, same sound code.
        assert_eq!(soundex("tymczak"), soundex("tim-sack"));
        assert!(levenshtein_less_equal("tymczak", "tim-sack", 2) > 2);
        assert!(fuzzy_match("Tymczak", "tim-sack"));
    }

    #[test]
    fn unrelated_words_do_not_match() {
        assert!(!fuzzy_match("Luke Skywalker", "luke"));
        assert!(!fuzzy_match("Droid", "jedi"));
    }
}
