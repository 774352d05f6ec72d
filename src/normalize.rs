//! Text normalization for counter names scraped from prose.
//!
//! The wiki lists counters as free text ("Archers, Skirmishers, and
//! Camels"). After splitting on `", "` each phrase still carries a
//! leading connective and a plural tail; this module reduces a phrase to
//! the singular, capitalized form the dataset stores.

/// Plural → singular for words the suffix rules get wrong.
const IRREGULAR: &[(&str, &str)] = &[
    ("geese", "goose"),
    ("mice", "mouse"),
    ("oxen", "ox"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("children", "child"),
    ("people", "person"),
];

/// Words that look plural (or are mass nouns) but must not be clipped.
const UNINFLECTED: &[&str] = &[
    "cavalry", "infantry", "archery", "siege", "fish", "sheep", "series", "species",
];

/// Reduce an English noun to its singular form.
///
/// Returns `None` when the word is not recognized as a plural, so callers
/// can fall back to the original spelling. Rules are suffix-based with a
/// small irregulars table; anything unmatched fails closed.
pub fn singularize(word: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with `word` for the
    // suffix slices below.
    let lower = word.to_ascii_lowercase();

    if UNINFLECTED.contains(&lower.as_str()) {
        return None;
    }

    for (plural, singular) in IRREGULAR {
        if lower == *plural {
            return Some(match_case(singular, word));
        }
    }

    // Spearmen -> Spearman, Pikemen -> Pikeman
    if lower.len() > 3 && lower.ends_with("men") {
        return Some(format!("{}man", &word[..word.len() - 3]));
    }

    // Galleries -> Gallery (consonant + "ies")
    if lower.len() > 4 && lower.ends_with("ies") {
        let before = lower.as_bytes()[lower.len() - 4];
        if !matches!(before, b'a' | b'e' | b'i' | b'o' | b'u') {
            return Some(format!("{}y", &word[..word.len() - 3]));
        }
    }

    // Wolves -> Wolf
    if lower.len() > 4 && lower.ends_with("ves") {
        return Some(format!("{}f", &word[..word.len() - 3]));
    }

    // Fortresses -> Fortress, Foxes -> Fox, Churches -> Church
    if lower.len() > 3
        && (lower.ends_with("sses")
            || lower.ends_with("xes")
            || lower.ends_with("zes")
            || lower.ends_with("ches")
            || lower.ends_with("shes"))
    {
        return Some(word[..word.len() - 2].to_string());
    }

    // Plain -s plural; leave -ss, -us, -is words alone (Huss, status, axis)
    if lower.len() > 2
        && lower.ends_with('s')
        && !lower.ends_with("ss")
        && !lower.ends_with("us")
        && !lower.ends_with("is")
    {
        return Some(word[..word.len() - 1].to_string());
    }

    None
}

/// Normalize one counter phrase: strip a leading `"and "`, singularize
/// the trailing word, capitalize the first letter. Deterministic and
/// total; unrecognized words pass through unchanged.
pub fn normalize_phrase(raw: &str) -> String {
    let phrase = raw.trim();
    let phrase = phrase.strip_prefix("and ").unwrap_or(phrase).trim_start();
    if phrase.is_empty() {
        return String::new();
    }

    let singular = match phrase.rsplit_once(' ') {
        Some((head, tail)) => match singularize(tail) {
            Some(s) => format!("{} {}", head, s),
            None => phrase.to_string(),
        },
        None => singularize(phrase).unwrap_or_else(|| phrase.to_string()),
    };

    capitalize(&singular)
}

/// Uppercase the first letter, leaving the rest of the string as-is.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Carry the casing of `original`'s first letter over to `replacement`.
fn match_case(replacement: &str, original: &str) -> String {
    if original.chars().next().is_some_and(|c| c.is_uppercase()) {
        capitalize(replacement)
    } else {
        replacement.to_string()
    }
}
