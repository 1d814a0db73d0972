//! Slide plan records.
//!
//! A slide plan is the ordered, typed description of a deck's content that
//! the plan builder derives from a proposal. It is serialized as JSON for the
//! render stage.

use serde::{Deserialize, Serialize};

/// The complete slide-content plan for one proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidePlan {
    pub project_name: String,
    pub client_name: String,
    pub total_slides: usize,
    pub slides: Vec<SlideRecord>,
}

impl SlidePlan {
    /// Create a plan, numbering `total_slides` from the records.
    pub fn new(
        project_name: impl Into<String>,
        client_name: impl Into<String>,
        slides: Vec<SlideRecord>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            client_name: client_name.into(),
            total_slides: slides.len(),
            slides,
        }
    }
}

/// One slide of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideRecord {
    /// 1-based slide number.
    pub slide_number: usize,

    #[serde(flatten)]
    pub body: SlideBody,
}

impl SlideRecord {
    /// The slide title, if the slide type has one.
    pub fn title(&self) -> &str {
        match &self.body {
            SlideBody::Title { title, .. }
            | SlideBody::ContentBullets { title, .. }
            | SlideBody::TwoColumn { title, .. }
            | SlideBody::Diagram { title, .. }
            | SlideBody::Timeline { title, .. }
            | SlideBody::ModuleDescription { title, .. } => title,
        }
    }

    /// The `type` tag as written to JSON.
    pub fn kind(&self) -> &'static str {
        match self.body {
            SlideBody::Title { .. } => "title",
            SlideBody::ContentBullets { .. } => "content_bullets",
            SlideBody::TwoColumn { .. } => "two_column",
            SlideBody::Diagram { .. } => "diagram",
            SlideBody::Timeline { .. } => "timeline",
            SlideBody::ModuleDescription { .. } => "module_description",
        }
    }
}

/// Type-specific slide content, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlideBody {
    Title {
        title: String,
        date: String,
    },
    ContentBullets {
        title: String,
        content: Vec<Bullet>,
    },
    TwoColumn {
        title: String,
        left_column: Column,
        right_column: Column,
    },
    Diagram {
        title: String,
        diagram: Diagram,
    },
    Timeline {
        title: String,
        timeline: Timeline,
    },
    ModuleDescription {
        title: String,
        module_type: String,
        content: ModuleContent,
        /// Download-only media references, kept out of the rendered content.
        #[serde(rename = "_image_url")]
        image_url: String,
        #[serde(rename = "_video_url")]
        video_url: String,
    },
}

/// A bullet line with its indentation level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bullet {
    pub level: u8,
    pub text: String,
}

impl Bullet {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// One column of a two-column slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub title: String,
    pub content: Vec<String>,
}

/// Diagram slide payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
    pub description: String,
}

/// Timeline slide payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub format: String,
    pub milestones: Vec<Milestone>,
}

/// One timeline milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub phase: String,
    pub event: String,
    /// Relative date such as `T1 = T0 + 2 weeks`; empty when not recognized.
    pub date: String,
}

/// Module description slide content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleContent {
    pub purpose: String,
    pub alert_logic: String,
    pub preconditions: String,
    pub data_requirements: String,
}
