//! Keyword lists and whole-word phrase matching.

/// Titles that make a posting a UX role outright.
pub const STRONG_TITLE_KEYWORDS: &[&str] = &[
    "ux",
    "ui",
    "user experience",
    "user interface",
    "product designer",
    "product design",
    "interaction designer",
    "interaction design",
    "experience designer",
    "visual designer",
    "ux researcher",
    "ux engineer",
];

/// Weaker signals, counted in both title and description.
pub const LOOSE_KEYWORDS: &[&str] = &[
    "design",
    "designer",
    "figma",
    "sketch",
    "adobe xd",
    "prototype",
    "prototyping",
    "wireframe",
    "wireframes",
    "usability",
    "user research",
    "interface",
    "accessibility",
    "design system",
    "design systems",
    "user flows",
    "journey map",
    "personas",
];

pub const INTERN_KEYWORDS: &[&str] = &["intern", "interns", "internship", "co-op", "coop"];

pub const ENTRY_KEYWORDS: &[&str] = &[
    "entry level",
    "entry-level",
    "junior",
    "jr",
    "associate",
    "new grad",
    "new graduate",
    "recent graduate",
    "early career",
    "apprentice",
    "apprenticeship",
];

pub const SENIOR_KEYWORDS: &[&str] = &[
    "senior",
    "sr",
    "staff",
    "lead",
    "principal",
    "director",
    "manager",
    "head of",
    "vp",
    "president",
    "expert",
];

pub fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// Whether `phrase` occurs in `text` on word boundaries.
///
/// Both sides are expected to be lowercased already. "intern" matches
/// "ux intern" and "intern," but not "internal".
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }

    let mut start = 0;
    while let Some(pos) = text[start..].find(phrase) {
        let begin = start + pos;
        let end = begin + phrase.len();

        let before_ok = text[..begin].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = text[end..].chars().next().map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok {
            return true;
        }

        // Advance past the first char of this hit.
        start = begin + text[begin..].chars().next().map_or(1, char::len_utf8);
    }

    false
}

/// Number of distinct keywords present in `text`.
pub fn count_matches(text: &str, keywords: &[String]) -> usize {
    keywords.iter().filter(|k| contains_phrase(text, k)).count()
}

pub fn any_match(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| contains_phrase(text, k))
}
