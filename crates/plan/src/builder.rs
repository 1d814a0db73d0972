//! Slide plan building from a parsed proposal.

use crate::diagram;
use crate::fields;
use crate::modules::{self, Module};
use crate::proposal::Proposal;
use crate::timeline;
use deck_core::{
    Bullet, Column, Diagram, Error, ModuleContent, Result, SlideBody, SlidePlan, SlideRecord,
    Timeline,
};
use log::{debug, warn};

pub const COVER_PAGE: &str = "1. COVER PAGE";
pub const REQUIREMENT_STATEMENT: &str = "2. PROJECT REQUIREMENT STATEMENT";
pub const SCOPE_OF_WORK: &str = "3. SCOPE OF WORK";
pub const SYSTEM_ARCHITECTURE: &str = "4. SYSTEM ARCHITECTURE";
pub const SYSTEM_REQUIREMENTS: &str = "5. SYSTEM REQUIREMENTS";
pub const IMPLEMENTATION_PLAN: &str = "6. IMPLEMENTATION PLAN (TIMELINE)";
pub const PROPOSED_MODULES: &str = "7. PROPOSED MODULES & FUNCTIONAL DESCRIPTION";
pub const USER_INTERFACE: &str = "8. USER INTERFACE & REPORTING";

/// Maximum bullets on the combined workstation slide.
const WORKSTATION_SLIDE_LIMIT: usize = 15;

const CLIENT_FIELD: &str = "Client Name (Project Owner)";

/// Subsections that are placed on the grouped requirement slides.
const GROUPED_REQUIREMENTS: &[&str] = &[
    "Network",
    "Camera",
    "AI Training",
    "AI Training Workstation",
    "AI Inference",
    "AI Inference Workstation",
    "Dashboard",
    "Dashboard Workstation",
];

/// Builds the ordered slide plan for one proposal.
pub struct SlidePlanBuilder<'a> {
    proposal: &'a Proposal,
    diagram_code: Option<String>,
    slides: Vec<SlideRecord>,
}

impl<'a> SlidePlanBuilder<'a> {
    pub fn new(proposal: &'a Proposal) -> Self {
        Self {
            proposal,
            diagram_code: None,
            slides: Vec::new(),
        }
    }

    /// Mermaid code for the architecture diagram slide.
    pub fn with_diagram(mut self, code: Option<String>) -> Self {
        self.diagram_code = code;
        self
    }

    /// Map every section to slides.
    ///
    /// Fails when the client name is absent or a module lacks a required field.
    pub fn build(mut self) -> Result<SlidePlan> {
        let client = self.client_name()?;

        self.cover_page(&client);
        self.requirement_statement();
        self.scope_of_work();
        self.system_architecture();
        self.system_requirements();
        self.implementation_plan();
        self.proposed_modules()?;
        self.user_interface();

        debug!(
            "Built slide plan for '{}' with {} slides",
            self.proposal.project_name,
            self.slides.len()
        );
        Ok(SlidePlan::new(
            self.proposal.project_name.clone(),
            client,
            self.slides,
        ))
    }

    fn push(&mut self, body: SlideBody) {
        self.slides.push(SlideRecord {
            slide_number: self.next_number(),
            body,
        });
    }

    fn next_number(&self) -> usize {
        self.slides.len() + 1
    }

    fn bullets(&mut self, title: impl Into<String>, content: Vec<Bullet>) {
        self.push(SlideBody::ContentBullets {
            title: title.into(),
            content,
        });
    }

    fn client_name(&self) -> Result<String> {
        fields::client_name(self.proposal.section(REQUIREMENT_STATEMENT)).ok_or_else(|| {
            Error::MissingField {
                field: CLIENT_FIELD.to_string(),
                location: REQUIREMENT_STATEMENT.to_string(),
            }
        })
    }

    fn cover_page(&mut self, client: &str) {
        let date = fields::cover_date(self.proposal.section(COVER_PAGE)).unwrap_or_else(|| {
            warn!("Date not found in {COVER_PAGE}");
            String::new()
        });
        self.push(SlideBody::Title {
            title: format!("Video Analytics Solution Proposal for {client}"),
            date,
        });
    }

    fn requirement_statement(&mut self) {
        let pairs = fields::key_value_pairs(self.proposal.section(REQUIREMENT_STATEMENT));
        self.bullets(
            "Project Requirement Statement",
            fields::requirement_bullets(&pairs),
        );
    }

    fn scope_of_work(&mut self) {
        let content = self.proposal.section(SCOPE_OF_WORK);
        let left = fields::bullets_under(content, "viAct");
        let right = fields::bullets_under(content, "Client");
        self.push(SlideBody::TwoColumn {
            title: "Scope of Work".to_string(),
            left_column: Column {
                title: "viAct Responsibilities".to_string(),
                content: left,
            },
            right_column: Column {
                title: "Client Responsibilities".to_string(),
                content: right,
            },
        });
    }

    fn system_architecture(&mut self) {
        let content = self.proposal.section(SYSTEM_ARCHITECTURE);
        let code = self.diagram_code.clone().unwrap_or_else(|| {
            warn!("No architecture diagram code; diagram slide left empty");
            String::new()
        });

        self.push(SlideBody::Diagram {
            title: "Proposed System Architecture".to_string(),
            diagram: Diagram {
                kind: "mermaid".to_string(),
                code,
                description: diagram::architecture_description(content),
            },
        });

        if diagram::has_detailed_description(content) {
            self.bullets(
                "System Architecture Description",
                fields::format_bullets(content),
            );
        }
    }

    fn system_requirements(&mut self) {
        let subsections = fields::subsections(self.proposal.section(SYSTEM_REQUIREMENTS));
        let find = |names: &[&str]| {
            names.iter().find_map(|name| {
                subsections
                    .iter()
                    .find(|(n, body)| n == name && !body.is_empty())
                    .map(|(_, body)| body.as_str())
            })
        };
        let group = |label: &str, body: Option<&str>| -> Vec<Bullet> {
            body.map(|body| {
                std::iter::once(Bullet::new(0, label))
                    .chain(fields::format_bullets(body))
                    .collect()
            })
            .unwrap_or_default()
        };

        let mut connectivity = group("Network", find(&["Network"]));
        connectivity.extend(group("Camera", find(&["Camera"])));

        let training = group("AI Training", find(&["AI Training", "AI Training Workstation"]));
        let inference = group(
            "AI Inference",
            find(&["AI Inference", "AI Inference Workstation"]),
        );
        let dashboard = group("Dashboard", find(&["Dashboard", "Dashboard Workstation"]));

        let remaining: Vec<(String, Vec<Bullet>)> = subsections
            .iter()
            .filter(|(name, body)| {
                !body.is_empty() && !GROUPED_REQUIREMENTS.contains(&name.as_str())
            })
            .map(|(name, body)| (name.clone(), fields::format_bullets(body)))
            .collect();

        if !connectivity.is_empty() {
            self.bullets("System Requirements", connectivity);
        }

        let total = training.len() + inference.len() + dashboard.len();
        if total > 0 && total <= WORKSTATION_SLIDE_LIMIT {
            self.bullets(
                "System Requirements",
                [training, inference, dashboard].concat(),
            );
        } else if total > 0 {
            let compute = [training, inference].concat();
            if !compute.is_empty() {
                self.bullets("System Requirements", compute);
            }
            if !dashboard.is_empty() {
                self.bullets("System Requirements", dashboard);
            }
        }

        for (name, content) in remaining {
            self.bullets(format!("System Requirements: {name}"), content);
        }
    }

    fn implementation_plan(&mut self) {
        let milestones = timeline::milestones(self.proposal.section(IMPLEMENTATION_PLAN));
        self.push(SlideBody::Timeline {
            title: "Implementation Plan".to_string(),
            timeline: Timeline {
                format: "milestones".to_string(),
                milestones,
            },
        });
    }

    fn proposed_modules(&mut self) -> Result<()> {
        let extracted = modules::extract_modules(self.proposal.section(PROPOSED_MODULES));

        for module in modules::group_modules(extracted) {
            if module.name.starts_with("Type:") {
                if module.module_type.is_empty() {
                    warn!("Module type not found for '{}'; skipped", module.name);
                }
                continue;
            }
            self.module_slide(module)?;
        }
        Ok(())
    }

    fn module_slide(&mut self, module: Module) -> Result<()> {
        let missing = module.missing_fields();
        if !missing.is_empty() {
            return Err(Error::MissingModuleFields {
                module: module.name,
                slide: self.next_number(),
                fields: missing,
            });
        }

        self.push(SlideBody::ModuleDescription {
            title: module.name,
            module_type: module.module_type,
            content: ModuleContent {
                purpose: module.purpose,
                alert_logic: module.alert_logic,
                preconditions: module.preconditions,
                data_requirements: module.data_requirements,
            },
            image_url: module.image_url,
            video_url: module.video_url,
        });
        Ok(())
    }

    fn user_interface(&mut self) {
        for (name, body) in fields::subsections(self.proposal.section(USER_INTERFACE)) {
            if !body.is_empty() {
                self.bullets(name, fields::format_bullets(&body));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROPOSAL: &str = "# Harbour Site Technical Proposal

## 1. COVER PAGE
**Date:** 2025-03-01

## 2. PROJECT REQUIREMENT STATEMENT
**Project Owner:** ACME Construction
**Site:** Tower B
**AI Modules:**
1. Helmet Detection
2. Queue Counting

## 3. SCOPE OF WORK
### viAct Responsibilities:
- Install cameras
### Client Responsibilities:
- Provide network

## 4. SYSTEM ARCHITECTURE
### Components
Edge cameras feed the AI server.

## 5. SYSTEM REQUIREMENTS
### Network
- 100 Mbps uplink
### Camera
- 1080p
### AI Inference Workstation
- RTX 4090
### Power
- UPS backup

## 6. IMPLEMENTATION PLAN (TIMELINE)
**Phase T0: Contract**
**Phase T1: Installation**
T1 = T0 + 2 weeks

## 7. PROPOSED MODULES & FUNCTIONAL DESCRIPTION
### Module 1: Queue Counting
**Module Type:** Custom
**Purpose Description:** Counts people
**Alert Trigger Logic:** More than 20 waiting
**Preconditions:** Overhead camera
### Module 2: Helmet Detection
**Module Type:** Standard
**Purpose Description:** Detects missing helmets
**Alert Trigger Logic:** No helmet for 5s
**Preconditions:** Clear view
**Image URL:** https://example.com/helmet.png

## 8. USER INTERFACE & REPORTING
### Dashboard
- Live alerts
### Reports
";

    fn build(text: &str) -> Result<SlidePlan> {
        let proposal = Proposal::parse(text, "fallback");
        SlidePlanBuilder::new(&proposal)
            .with_diagram(Some("graph TD; A-->B".to_string()))
            .build()
    }

    #[test]
    fn test_full_plan_order() {
        let plan = build(PROPOSAL).unwrap();
        let titles: Vec<_> = plan.slides.iter().map(|s| s.title()).collect();
        assert_eq!(
            titles,
            vec![
                "Video Analytics Solution Proposal for ACME Construction",
                "Project Requirement Statement",
                "Scope of Work",
                "Proposed System Architecture",
                "System Architecture Description",
                "System Requirements",
                "System Requirements",
                "System Requirements: Power",
                "Implementation Plan",
                "Helmet Detection",
                "Queue Counting",
                "Dashboard",
            ]
        );
        assert_eq!(plan.project_name, "Harbour Site");
        assert_eq!(plan.client_name, "ACME Construction");
        assert_eq!(plan.total_slides, 12);

        let numbers: Vec<_> = plan.slides.iter().map(|s| s.slide_number).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_cover_and_requirement_content() {
        let plan = build(PROPOSAL).unwrap();
        assert_eq!(
            plan.slides[0].body,
            SlideBody::Title {
                title: "Video Analytics Solution Proposal for ACME Construction".to_string(),
                date: "2025-03-01".to_string(),
            }
        );

        let SlideBody::ContentBullets { content, .. } = &plan.slides[1].body else {
            panic!("expected bullets");
        };
        let texts: Vec<_> = content.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Project Owner: ACME Construction",
                "Site: Tower B",
                "AI Modules: Helmet Detection",
                "Queue Counting",
            ]
        );
    }

    #[test]
    fn test_requirement_grouping() {
        let plan = build(PROPOSAL).unwrap();

        let SlideBody::ContentBullets { content, .. } = &plan.slides[5].body else {
            panic!("expected bullets");
        };
        assert_eq!(
            content,
            &vec![
                Bullet::new(0, "Network"),
                Bullet::new(0, "100 Mbps uplink"),
                Bullet::new(0, "Camera"),
                Bullet::new(0, "1080p"),
            ]
        );

        let SlideBody::ContentBullets { content, .. } = &plan.slides[6].body else {
            panic!("expected bullets");
        };
        assert_eq!(
            content,
            &vec![Bullet::new(0, "AI Inference"), Bullet::new(0, "RTX 4090")]
        );
    }

    #[test]
    fn test_large_workstation_groups_split() {
        let many = |prefix: &str| {
            (1..=6)
                .map(|i| format!("- {prefix} item {i}"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let section = format!(
            "### AI Training\n{}\n### AI Inference\n{}\n### Dashboard\n{}",
            many("train"),
            many("infer"),
            many("dash")
        );
        let text = PROPOSAL.replace(
            "### Network\n- 100 Mbps uplink\n### Camera\n- 1080p\n### AI Inference Workstation\n- RTX 4090\n### Power\n- UPS backup",
            &section,
        );

        let plan = build(&text).unwrap();
        let requirement_sizes: Vec<_> = plan
            .slides
            .iter()
            .filter_map(|s| match &s.body {
                SlideBody::ContentBullets { title, content } if title == "System Requirements" => {
                    Some(content.len())
                }
                _ => None,
            })
            .collect();
        assert_eq!(requirement_sizes, vec![14, 7]);
    }

    #[test]
    fn test_module_slides() {
        let plan = build(PROPOSAL).unwrap();
        let SlideBody::ModuleDescription {
            module_type,
            content,
            image_url,
            ..
        } = &plan.slides[9].body
        else {
            panic!("expected module slide");
        };
        assert_eq!(module_type, "Standard");
        assert_eq!(content.alert_logic, "No helmet for 5s");
        assert_eq!(image_url, "https://example.com/helmet.png");
    }

    #[test]
    fn test_missing_alert_logic_is_error() {
        let text = PROPOSAL.replace("**Alert Trigger Logic:** No helmet for 5s\n", "");
        match build(&text) {
            Err(Error::MissingModuleFields {
                module,
                slide,
                fields,
            }) => {
                assert_eq!(module, "Helmet Detection");
                assert_eq!(slide, 10);
                assert_eq!(fields, vec!["Alert Trigger Logic".to_string()]);
            }
            other => panic!("expected missing module fields, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_client_is_error() {
        let text = PROPOSAL.replace("**Project Owner:** ACME Construction\n", "");
        match build(&text) {
            Err(Error::MissingField { field, location }) => {
                assert_eq!(field, "Client Name (Project Owner)");
                assert_eq!(location, REQUIREMENT_STATEMENT);
            }
            other => panic!("expected missing field, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_date_and_diagram_are_empty() {
        let text = PROPOSAL.replace("**Date:** 2025-03-01\n", "");
        let proposal = Proposal::parse(&text, "fallback");
        let plan = SlidePlanBuilder::new(&proposal).build().unwrap();

        assert_eq!(
            plan.slides[0].body,
            SlideBody::Title {
                title: "Video Analytics Solution Proposal for ACME Construction".to_string(),
                date: String::new(),
            }
        );
        let SlideBody::Diagram { diagram, .. } = &plan.slides[3].body else {
            panic!("expected diagram");
        };
        assert_eq!(diagram.code, "");
        assert_eq!(diagram.description, "Edge cameras feed the AI server.");
    }
}
