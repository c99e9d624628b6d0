//! Experience-duration patterns ("3+ years", "0-1 years", "minimum of five
//! years of experience").

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // a-b years; evaluated first and blanked out so the upper bound is not
    // read again as a standalone requirement
    static ref RANGE_REGEX: Regex = Regex::new(
        r"\b(\d{1,2})\s*(?:-|–|—|to)\s*(\d{1,2})\s*\+?\s*(?:years?|yrs?)\b"
    ).unwrap();

    // N+ years, tolerating the escaped "5\+ years" markdown produces
    static ref PLUS_REGEX: Regex = Regex::new(
        r"\b(\d{1,2}|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\s*\\?\+\s*(?:years?|yrs?)\b"
    ).unwrap();

    // at least / minimum (of) N years
    static ref MINIMUM_REGEX: Regex = Regex::new(
        r"\b(?:at least|minimum(?: of)?|min\.?)\s+(\d{1,2}|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\s*\\?\+?\s*(?:years?|yrs?)\b"
    ).unwrap();

    // N years (of) (professional) experience
    static ref PLAIN_REGEX: Regex = Regex::new(
        r"\b(\d{1,2}|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve)\s*(?:years?|yrs?)(?:\s+of)?(?:\s+(?:professional|relevant|industry|related|work|hands-on|design))?\s+experience\b"
    ).unwrap();

    static ref NO_EXPERIENCE_REGEX: Regex = Regex::new(
        r"\bno (?:prior |previous )?experience\b|\b0\s*(?:years?|yrs?)\b"
    ).unwrap();
}

fn parse_count(token: &str) -> Option<u32> {
    let value = match token {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        digits => return digits.parse().ok(),
    };
    Some(value)
}

/// What the text says about required experience.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExperienceScan {
    /// Largest minimum requirement found (`3+ years` → 3, `3-5 years` → 3).
    pub highest_minimum: Option<u32>,
    /// Some phrasing an entry-level candidate satisfies (`0-1 years`,
    /// `1 year of experience`, `no experience`).
    pub entry_friendly: bool,
}

impl ExperienceScan {
    pub fn exceeds(&self, max_entry_years: u32) -> bool {
        self.highest_minimum.map_or(false, |n| n > max_entry_years)
    }
}

fn note_minimum(scan: &mut ExperienceScan, years: u32) {
    scan.highest_minimum = Some(scan.highest_minimum.map_or(years, |m| m.max(years)));
}

/// Scan lowercased text for experience requirements.
pub fn scan_experience(text: &str, max_entry_years: u32) -> ExperienceScan {
    let mut scan = ExperienceScan::default();

    for caps in RANGE_REGEX.captures_iter(text) {
        let low = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
        let high = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        if let (Some(low), Some(high)) = (low, high) {
            if high <= max_entry_years {
                scan.entry_friendly = true;
            }
            note_minimum(&mut scan, low);
        }
    }

    let rest = RANGE_REGEX.replace_all(text, " ");

    for caps in PLUS_REGEX
        .captures_iter(&rest)
        .chain(MINIMUM_REGEX.captures_iter(&rest))
    {
        if let Some(n) = caps.get(1).and_then(|m| parse_count(m.as_str())) {
            if n <= 1 {
                scan.entry_friendly = true;
            }
            note_minimum(&mut scan, n);
        }
    }

    for caps in PLAIN_REGEX.captures_iter(&rest) {
        if let Some(n) = caps.get(1).and_then(|m| parse_count(m.as_str())) {
            if n <= 1 {
                scan.entry_friendly = true;
            }
            note_minimum(&mut scan, n);
        }
    }

    if NO_EXPERIENCE_REGEX.is_match(&rest) {
        scan.entry_friendly = true;
    }

    scan
}
