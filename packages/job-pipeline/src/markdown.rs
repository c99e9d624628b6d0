//! Markdown normalization for scraped job descriptions.
//!
//! Job boards export descriptions as half-escaped markdown with stray HTML
//! and unicode bullets. The cleaner makes lists and headers render and
//! squeezes whitespace; it never fails.

use lazy_static::lazy_static;
use regex::Regex;

use crate::traits::DescriptionCleaner;

lazy_static! {
    static ref HTML_TAG_REGEX: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref ORDERED_ITEM_REGEX: Regex = Regex::new(r"^\d+\.\s").unwrap();
    static ref BLANK_RUN_REGEX: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref SPACE_RUN_REGEX: Regex = Regex::new(r" {3,}").unwrap();
}

const ESCAPES: &[(&str, &str)] = &[
    ("\\-", "-"),
    ("\\*", "*"),
    ("\\+", "+"),
    ("\\_", "_"),
    ("\\#", "#"),
];

const BULLETS: &[char] = &['•', '◦', '▪', '▫', '▸', '▹'];

/// Default [`DescriptionCleaner`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownCleaner;

impl MarkdownCleaner {
    pub fn new() -> Self {
        Self
    }
}

impl DescriptionCleaner for MarkdownCleaner {
    fn clean(&self, text: &str) -> String {
        clean_markdown(text)
    }
}

fn normalize_bullet(line: &str) -> String {
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some(bullet), Some(' ')) if BULLETS.contains(&bullet) => format!("* {}", chars.as_str()),
        _ => line.to_string(),
    }
}

fn is_list_item(line: &str) -> bool {
    line.starts_with("* ")
        || line.starts_with("- ")
        || line.starts_with("+ ")
        || ORDERED_ITEM_REGEX.is_match(line)
}

/// `# Heading`, or a short line that is bold from end to end.
fn is_header(line: &str) -> bool {
    line.starts_with('#')
        || (line.len() >= 4
            && line.starts_with("**")
            && line.ends_with("**")
            && line.split_whitespace().count() <= 8)
}

fn push_separator(lines: &mut Vec<String>) {
    if lines.last().is_some_and(|last| !last.is_empty()) {
        lines.push(String::new());
    }
}

pub fn clean_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut text = text.replace("\r\n", "\n").replace('\r', "\n");
    for (escaped, plain) in ESCAPES {
        text = text.replace(escaped, plain);
    }
    let text = HTML_TAG_REGEX.replace_all(&text, "");

    let mut lines: Vec<String> = Vec::new();
    let mut prev_blank = false;
    let mut in_list = false;

    for raw in text.split('\n') {
        let stripped = raw.trim_start();
        if stripped.is_empty() {
            if !prev_blank {
                lines.push(String::new());
                prev_blank = true;
            }
            in_list = false;
            continue;
        }
        prev_blank = false;

        let line = normalize_bullet(stripped);
        let list_item = is_list_item(&line);
        let header = is_header(&line);

        if list_item && !in_list {
            push_separator(&mut lines);
            in_list = true;
        } else if !list_item {
            in_list = false;
        }

        if header {
            push_separator(&mut lines);
        }
        lines.push(line);
        if header {
            lines.push(String::new());
        }
    }

    let joined = lines.join("\n");
    let collapsed = BLANK_RUN_REGEX.replace_all(&joined, "\n\n");
    let squeezed = SPACE_RUN_REGEX.replace_all(&collapsed, " ");
    squeezed.trim().to_string()
}
