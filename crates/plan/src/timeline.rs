//! Implementation-plan milestones.

use deck_core::Milestone;
use log::warn;
use regex::Regex;
use std::sync::LazyLock;

/// `**Phase T1: Installation**`
static PHASE_INLINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*Phase\s+(T\d+):\s*([^*\n]+?)\*\*").unwrap());

/// `**Phase T1:** Installation`
static PHASE_COLON_INSIDE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*Phase\s+(T\d+):\*\*\s*").unwrap());

/// `**Phase T1**: Installation`
static PHASE_COLON_OUTSIDE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*Phase\s+(T\d+)\*\*:\s*").unwrap());

/// `**Phase T1** Installation`
static PHASE_LOOSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*Phase\s+(T\d+)\*\*[:\s]+(.+?)(?:\n|\*\*)").unwrap());

static NEXT_PHASE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*Phase\s+T\d").unwrap());

static TOTAL_DURATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*Total\s+Duration").unwrap());

static RULE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*---\s*\n").unwrap());

static RELATIVE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"T\d+\s*\+\s*([^)\n,]+)").unwrap());

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+\s*[-–]\s*\d+|\d+)\s*(weeks?|days?|months?)").unwrap()
});

/// Milestones from the implementation-plan section, in document order.
pub fn milestones(content: &str) -> Vec<Milestone> {
    let mut found = inline_phases(content);
    if found.is_empty() {
        found = block_phases(content, &PHASE_COLON_INSIDE_REGEX, &["**phase", "**total", "---"]);
    }
    if found.is_empty() {
        found = block_phases(
            content,
            &PHASE_COLON_OUTSIDE_REGEX,
            &["\n**phase", "\n**total", "\n---"],
        );
    }
    if found.is_empty() {
        found = PHASE_LOOSE_REGEX
            .captures_iter(content)
            .map(|caps| {
                let phase = caps[1].to_uppercase();
                let event = caps[2].trim().to_string();
                (phase, event, String::new())
            })
            .collect();
    }
    if found.is_empty() {
        warn!("No timeline milestones found in implementation plan");
    }

    found
        .into_iter()
        .map(|(phase, event, detail)| {
            let date = relative_date(&phase, &format!("{event}\n{detail}"), &detail);
            if date.is_empty() {
                warn!("No relative date recognized for phase {phase}");
            }
            Milestone { phase, event, date }
        })
        .collect()
}

/// Phases with the event inside the bold marker. The detail runs to the
/// next phase, the total-duration line or a rule.
fn inline_phases(content: &str) -> Vec<(String, String, String)> {
    PHASE_INLINE_REGEX
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let rest = &content[whole.end()..];
            let end = NEXT_PHASE_REGEX
                .find(rest)
                .or_else(|| TOTAL_DURATION_REGEX.find(rest))
                .or_else(|| RULE_REGEX.find(rest))
                .map_or(rest.len(), |m| m.start());
            Some((
                caps[1].to_uppercase(),
                caps[2].trim().to_string(),
                rest[..end].trim().to_string(),
            ))
        })
        .collect()
}

/// Phases whose block runs to the first of `terminators` (lowercase). The
/// first line of the block is the event, the rest is detail.
fn block_phases(
    content: &str,
    header: &Regex,
    terminators: &[&str],
) -> Vec<(String, String, String)> {
    let lowered = content.to_lowercase();

    header
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let start = whole.end();
            let end = terminators
                .iter()
                .filter_map(|t| lowered.get(start..).and_then(|rest| rest.find(t)))
                .min()
                .map_or(content.len(), |offset| start + offset);
            let block = content.get(start..end)?.trim();
            let (event, detail) = block.split_once('\n').unwrap_or((block, ""));
            let event = event.trim();
            (!event.is_empty()).then(|| {
                (
                    caps[1].to_uppercase(),
                    event.to_string(),
                    detail.trim().to_string(),
                )
            })
        })
        .collect()
}

/// Relative date for `phase` from `text` (event plus detail). A bare
/// duration is only read from `detail`, and never for `T0`.
pub fn relative_date(phase: &str, text: &str, detail: &str) -> String {
    let previous = previous_phase(phase);

    let explicit = Regex::new(&format!(
        r"(?i){}\s*=\s*(T\d+)\s*\+\s*([^\n),.]+)",
        regex::escape(phase)
    ));
    if let Some(caps) = explicit.ok().and_then(|re| re.captures(text)) {
        return format!("{phase} = {} + {}", caps[1].to_uppercase(), caps[2].trim());
    }

    if let Some(caps) = RELATIVE_REGEX.captures(text) {
        let offset = caps[1].trim();
        if !offset.is_empty() {
            if let Some(previous) = &previous {
                return format!("{phase} = {previous} + {offset}");
            }
        }
    }

    if let Some(previous) = &previous {
        if let Some(duration) = DURATION_REGEX.find(detail) {
            return format!("{phase} = {previous} + {}", duration.as_str().trim());
        }
    }

    String::new()
}

/// `T3` -> `T2`; `None` for `T0` or anything unnumbered.
fn previous_phase(phase: &str) -> Option<String> {
    let number: u32 = phase.get(1..)?.parse().ok()?;
    number.checked_sub(1).map(|n| format!("T{n}"))
}
