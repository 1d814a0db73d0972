//! Field, bullet and subsection extraction from section markdown.

use deck_core::Bullet;
use regex::Regex;
use std::sync::LazyLock;

static OWNER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*Project Owner:\*\*\s*(.+?)(?:\n|$)").unwrap());

static OWNER_LOOSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*Project Owner\*\*[:\s]+(.+)").unwrap());

static CLIENT_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*Client Name:\*\*\s*(.+)").unwrap());

static DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*\*Date\*\*[:\s]+(\d{4}-\d{2}-\d{2}|\w+\s+\d{4})").unwrap()
});

static DATE_COLON_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*\*Date:\*\*\s*(\d{4}-\d{2}-\d{2}|\w+\s+\d{4})").unwrap()
});

static TABLE_ROW_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|\s*\*\*(.+?)\*\*\s*\|\s*(.+?)\s*\|").unwrap());

static SOURCE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*Source.*$").unwrap());

/// `**Key:** value`
static KEY_COLON_INSIDE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^:*]+?):\*\*\s*").unwrap());

/// `**Key**: value`
static KEY_COLON_OUTSIDE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^:*]+?)\*\*:\s*").unwrap());

static RULE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*---\s*(?:\n|$)").unwrap());

static NUMBERED_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s").unwrap());

static NUMBER_PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s*").unwrap());

static SUBSECTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^###\s+(.+?)[ \t]*$").unwrap());

static BULLET_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*•]\s+").unwrap());

static HEADING_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#+\s*").unwrap());

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Client name from the requirement statement section.
pub fn client_name(section: &str) -> Option<String> {
    [&*OWNER_REGEX, &*OWNER_LOOSE_REGEX, &*CLIENT_NAME_REGEX]
        .iter()
        .find_map(|regex| regex.captures(section))
        .map(|caps| strip_bold(&caps[1]).trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Cover date: `YYYY-MM-DD` or `Month YYYY`.
pub fn cover_date(section: &str) -> Option<String> {
    DATE_REGEX
        .captures(section)
        .or_else(|| DATE_COLON_REGEX.captures(section))
        .map(|caps| caps[1].trim().to_string())
}

/// Ordered key/value pairs from a bold-key list or a two-column table.
///
/// A repeated key keeps its first position and takes the last value.
pub fn key_value_pairs(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for caps in TABLE_ROW_REGEX.captures_iter(content) {
        let key = caps[1].trim().to_string();
        let value = strip_bold(&SOURCE_REGEX.replace(&caps[2], "")).trim().to_string();
        if !key.is_empty() && !value.is_empty() {
            upsert(&mut pairs, key, value);
        }
    }
    if !pairs.is_empty() {
        return pairs;
    }

    let markers: Vec<_> = if KEY_COLON_INSIDE_REGEX.is_match(content) {
        KEY_COLON_INSIDE_REGEX.captures_iter(content).collect()
    } else {
        KEY_COLON_OUTSIDE_REGEX.captures_iter(content).collect()
    };

    for (i, caps) in markers.iter().enumerate() {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(content.len(), |m| m.start());

        let mut value = &content[whole.end()..end];
        if let Some(rule) = RULE_REGEX.find(value) {
            value = &value[..rule.start()];
        }

        let value = if NUMBERED_REGEX.is_match(value.trim()) {
            value
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            collapse_whitespace(value)
        };
        let value = strip_bold(&value).trim().to_string();

        if !value.is_empty() {
            upsert(&mut pairs, key.as_str().trim().to_string(), value);
        }
    }

    pairs
}

/// Requirement bullets for a statement slide. An `AI Modules` value becomes
/// one bullet per listed module.
pub fn requirement_bullets(pairs: &[(String, String)]) -> Vec<Bullet> {
    let mut bullets = Vec::new();

    for (key, value) in pairs {
        let lower = key.to_lowercase();
        if lower == "ai modules" || lower == "ai module" {
            let modules = value
                .lines()
                .map(|line| NUMBER_PREFIX_REGEX.replace(line.trim(), "").trim().to_string())
                .filter(|line| !line.is_empty());
            for (i, module) in modules.enumerate() {
                let text = if i == 0 {
                    format!("{key}: {module}")
                } else {
                    module
                };
                bullets.push(Bullet::new(0, text));
            }
        } else {
            bullets.push(Bullet::new(0, format!("{key}: {value}")));
        }
    }

    bullets
}

/// Bullet items listed under the header line that mentions `keyword`.
pub fn bullets_under(content: &str, keyword: &str) -> Vec<String> {
    let keyword = keyword.to_lowercase();
    let mut items = Vec::new();
    let mut in_section = false;

    for line in content.lines().map(str::trim) {
        let mentions = line.to_lowercase().contains(&keyword);
        let is_header = line.starts_with("###")
            || line.starts_with("**")
            || (line.contains(':') && !line.starts_with('-'));

        if mentions && is_header {
            in_section = true;
            continue;
        }
        if !in_section {
            continue;
        }
        if !mentions && (line.starts_with("###") || (line.starts_with("**") && line.contains(':'))) {
            in_section = false;
            continue;
        }
        if line.starts_with("---") {
            continue;
        }
        if line.starts_with(['-', '*', '•']) {
            let item = strip_bold(line.trim_start_matches(['-', '*', '•']).trim())
                .trim()
                .to_string();
            if !item.is_empty() && !item.chars().all(|c| c == '-') {
                items.push(item);
            }
        }
    }

    items
}

/// `### ` subsections in document order; a repeated name takes the last body.
pub fn subsections(content: &str) -> Vec<(String, String)> {
    let headers: Vec<_> = SUBSECTION_REGEX.captures_iter(content).collect();
    let mut sections = Vec::with_capacity(headers.len());

    for (i, caps) in headers.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(content.len(), |m| m.start());
        let body = content[whole.end()..end].trim().to_string();
        upsert(&mut sections, name.as_str().trim().to_string(), body);
    }

    sections
}

/// Bullets from free-form markdown lines.
///
/// List items indented by two or four spaces become level 1 or 2. Table
/// rows and blank lines are skipped.
pub fn format_bullets(content: &str) -> Vec<Bullet> {
    let mut bullets = Vec::new();

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('|') {
            continue;
        }

        let (level, text) = match BULLET_MARKER_REGEX.find(line) {
            Some(marker) => (indent_level(raw), &line[marker.end()..]),
            None => (0, line),
        };
        let text = HEADING_MARKER_REGEX.replace(text, "");
        let text = strip_bold(&text).trim().to_string();
        if !text.is_empty() {
            bullets.push(Bullet::new(level, text));
        }
    }

    bullets
}

fn indent_level(raw: &str) -> u8 {
    let indent: usize = raw
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum();
    match indent {
        0..=1 => 0,
        2..=3 => 1,
        _ => 2,
    }
}

pub(crate) fn strip_bold(text: &str) -> String {
    text.replace("**", "")
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text.trim(), " ").into_owned()
}

fn upsert(pairs: &mut Vec<(String, String)>, key: String, value: String) {
    match pairs.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => pairs.push((key, value)),
    }
}
