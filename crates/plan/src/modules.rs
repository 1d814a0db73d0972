//! Proposed-module extraction and grouping.

use crate::fields::{collapse_whitespace, strip_bold};
use regex::Regex;
use std::sync::LazyLock;

static MODULE_HEADING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^###\s+Module(?:\s+\d+)?\s*:\s*(.+?)[ \t]*$").unwrap()
});

static MODULE_BOLD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*\*Module(?:\s+\d+)?\s*:\s*(.+?)\*\*").unwrap()
});

static MODULE_PLAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*Module(?:\s+Name)?\s*[:\s]\s*(.+?)[ \t]*$").unwrap()
});

static MODULE_TYPE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*\*Module Type(?::\*\*|\*\*:)\s*(.+?)[ \t]*(?:\n|$)").unwrap()
});

/// `**Field:** value`, `**Field**: value`, optionally after a list marker.
static FIELD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-•]\s*)?\*\*([^:*]+?)(?::\*\*|\*\*:)\s*(.*)$").unwrap()
});

static TRAILING_RULE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*---+\s*$").unwrap());

/// Module display group, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModuleGroup {
    PpeDetection,
    Safety,
    Operations,
    Other,
}

impl ModuleGroup {
    /// Classify by keywords in the module name.
    pub fn classify(name: &str) -> Self {
        let name = name.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| name.contains(w));

        if has(&["helmet", "vest", "glove", "boot", "ppe"]) {
            Self::PpeDetection
        } else if has(&["safety", "unsafe", "danger"]) {
            Self::Safety
        } else if has(&["count", "queue", "process"]) {
            Self::Operations
        } else {
            Self::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PpeDetection => "PPE Detection",
            Self::Safety => "Safety",
            Self::Operations => "Operations",
            Self::Other => "Other",
        }
    }
}

/// One proposed module with its description fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub module_type: String,
    pub purpose: String,
    pub alert_logic: String,
    pub preconditions: String,
    pub detection_criteria: String,
    pub data_requirements: String,
    pub image_url: String,
    pub video_url: String,
}

impl Module {
    fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            ..Self::default()
        }
    }

    /// Labels of required fields that are empty.
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("Purpose Description", &self.purpose),
            ("Alert Trigger Logic", &self.alert_logic),
            ("Preconditions", &self.preconditions),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(label, _)| label.to_string())
        .collect()
    }

    pub fn group(&self) -> ModuleGroup {
        ModuleGroup::classify(&self.name)
    }

    fn set_field(&mut self, field: &str, value: String) {
        let field = field.trim().to_lowercase();

        if field.contains("purpose description")
            || (field.contains("purpose") && field.contains("description"))
        {
            self.purpose = value;
        } else if field.contains("alert trigger logic") || field.contains("alert logic") {
            self.alert_logic = value;
        } else if field.contains("preconditions") {
            self.preconditions = value;
        } else if field.contains("detection criteria") {
            self.detection_criteria = value;
        } else if field.contains("image url") {
            if value.contains("http") {
                self.image_url = value;
            }
        } else if field.contains("video url") {
            if value.contains("http") {
                self.video_url = value;
            }
        } else if field.contains("data requirements") {
            self.data_requirements = value;
        }
    }
}

/// Modules from the proposed-modules section, in document order.
pub fn extract_modules(content: &str) -> Vec<Module> {
    let headings: Vec<_> = if MODULE_HEADING_REGEX.is_match(content) {
        MODULE_HEADING_REGEX.captures_iter(content).collect()
    } else {
        MODULE_BOLD_REGEX.captures_iter(content).collect()
    };

    if headings.is_empty() {
        // Names only; the required-field check reports these.
        return MODULE_PLAIN_REGEX
            .captures_iter(content)
            .map(|caps| Module::new(&strip_bold(&caps[1])))
            .filter(|m| !m.name.is_empty())
            .collect();
    }

    headings
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let whole = caps.get(0)?;
            let end = headings
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(content.len(), |m| m.start());
            let mut module = Module::new(&strip_bold(&caps[1]));
            parse_fields(&mut module, content.get(whole.end()..end)?);
            Some(module)
        })
        .collect()
}

/// Stable grouping: PPE detection, safety, operations, then the rest.
pub fn group_modules(mut modules: Vec<Module>) -> Vec<Module> {
    modules.sort_by_key(Module::group);
    modules
}

fn parse_fields(module: &mut Module, body: &str) {
    if let Some(caps) = MODULE_TYPE_REGEX.captures(body) {
        module.module_type = strip_bold(&caps[1]).trim().to_string();
    }

    let mut current: Option<(String, Vec<String>)> = None;
    for line in body.lines().map(str::trim) {
        if let Some(caps) = FIELD_REGEX.captures(line) {
            if let Some((field, parts)) = current.take() {
                module.set_field(&field, finish_value(&parts));
            }
            current = Some((caps[1].to_string(), vec![caps[2].to_string()]));
        } else if let Some((_, parts)) = current.as_mut() {
            if !line.is_empty() {
                parts.push(line.to_string());
            }
        }
    }
    if let Some((field, parts)) = current {
        module.set_field(&field, finish_value(&parts));
    }
}

fn finish_value(parts: &[String]) -> String {
    let value = collapse_whitespace(&parts.join(" "));
    let value = strip_bold(&value);
    TRAILING_RULE_REGEX.replace(&value, "").trim().to_string()
}
