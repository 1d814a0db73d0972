//! Proposal markdown: project name and `## ` sections.

use deck_core::Result;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+?)\s*$").unwrap());

static TECHNICAL_PROPOSAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Technical\s+Proposal.*$").unwrap());

/// `## Heading`, optionally followed by a `---` rule on the same line.
static SECTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##\s+(.+?)(?:\s*---)?[ \t]*$").unwrap());

/// A parsed proposal document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub project_name: String,
    sections: Vec<(String, String)>,
}

impl Proposal {
    /// Parse proposal text. `fallback_name` is used when there is no `# ` title.
    pub fn parse(text: &str, fallback_name: &str) -> Self {
        let project_name = TITLE_REGEX
            .captures(text)
            .map(|caps| {
                TECHNICAL_PROPOSAL_REGEX
                    .replace(caps[1].trim(), "")
                    .trim()
                    .to_string()
            })
            .unwrap_or_else(|| fallback_name.to_string());

        Self {
            project_name,
            sections: extract_sections(text),
        }
    }

    /// Read and parse a proposal file; the file stem is the fallback name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::parse(&text, &stem))
    }

    /// Section content by heading (case-insensitive); empty when absent.
    pub fn section(&self, name: &str) -> &str {
        self.sections
            .iter()
            .find(|(heading, _)| heading.eq_ignore_ascii_case(name))
            .map(|(_, content)| content.as_str())
            .unwrap_or("")
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(name, _)| name.as_str())
    }
}

fn extract_sections(text: &str) -> Vec<(String, String)> {
    let headers: Vec<_> = SECTION_REGEX.captures_iter(text).collect();
    let mut sections: Vec<(String, String)> = Vec::with_capacity(headers.len());

    for (i, caps) in headers.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());

        let content = clean_section(&text[whole.end()..end]);
        let name = name.as_str().trim().to_string();
        match sections.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = content,
            None => sections.push((name, content)),
        }
    }

    sections
}

/// Drop separator rules and blank lines.
fn clean_section(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with("---"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROPOSAL: &str = "# Site Safety Technical Proposal v2

## 1. COVER PAGE ---

**Date:** 2025-03-01

---

## 2. PROJECT REQUIREMENT STATEMENT

**Project Owner:** ACME Construction

**Project:** Tower B

## 3. SCOPE OF WORK
### viAct Responsibilities:
- Install cameras
";

    #[test]
    fn test_project_name_drops_suffix() {
        let proposal = Proposal::parse(PROPOSAL, "fallback");
        assert_eq!(proposal.project_name, "Site Safety");
    }

    #[test]
    fn test_project_name_fallback() {
        let proposal = Proposal::parse("## 1. COVER PAGE\ntext", "my_proposal");
        assert_eq!(proposal.project_name, "my_proposal");
    }

    #[test]
    fn test_sections_are_cleaned() {
        let proposal = Proposal::parse(PROPOSAL, "fallback");
        assert_eq!(proposal.section_count(), 3);
        assert_eq!(proposal.section("1. COVER PAGE"), "**Date:** 2025-03-01");
        assert_eq!(
            proposal.section("2. PROJECT REQUIREMENT STATEMENT"),
            "**Project Owner:** ACME Construction\n**Project:** Tower B"
        );
        assert!(proposal.section("3. scope of work").starts_with("### viAct"));
        assert_eq!(proposal.section("9. MISSING"), "");
    }

    #[test]
    fn test_subsection_headers_are_not_sections() {
        let proposal = Proposal::parse(PROPOSAL, "fallback");
        assert!(proposal.section_names().all(|n| !n.starts_with('#')));
    }

    #[test]
    fn test_from_path_uses_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme_proposal.md");
        std::fs::write(&path, "## 1. COVER PAGE\n**Date:** May 2025\n").unwrap();

        let proposal = Proposal::from_path(&path).unwrap();
        assert_eq!(proposal.project_name, "acme_proposal");
        assert_eq!(proposal.section("1. COVER PAGE"), "**Date:** May 2025");
    }
}
