//! Architecture diagram source and description.

use log::warn;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static MERMAID_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```mermaid\s*\n(.*?)\n```").unwrap());

static MERMAID_LOOSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```mermaid\s*(.*?)```").unwrap());

static DETAIL_HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)###\s+.*(?:Description|Data Flow|Components)").unwrap());

/// Lines of the first subsection used as the diagram caption.
const DESCRIPTION_LINES: usize = 4;

/// The first fenced mermaid block in `text`.
pub fn mermaid_code(text: &str) -> Option<String> {
    MERMAID_BLOCK_REGEX
        .captures(text)
        .or_else(|| MERMAID_LOOSE_REGEX.captures(text))
        .map(|caps| caps[1].trim().to_string())
        .filter(|code| !code.is_empty())
}

/// Mermaid code from a diagram file. Missing files and files without a
/// mermaid block are logged and yield `None`.
pub fn read_diagram_file(path: &Path) -> Option<String> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Could not read diagram file {}: {e}", path.display());
            return None;
        }
    };

    let code = mermaid_code(&text);
    if code.is_none() {
        warn!("No mermaid block found in {}", path.display());
    }
    code
}

/// Short caption: the first non-table lines after the first `###` heading.
pub fn architecture_description(content: &str) -> String {
    content
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("###"))
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('|'))
        .take(DESCRIPTION_LINES)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether the section has a description, data-flow or components subsection.
pub fn has_detailed_description(content: &str) -> bool {
    DETAIL_HEADING_REGEX.is_match(content)
}
