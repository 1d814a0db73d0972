//! Deck assembly: which reference slides go where.
//!
//! Every copied slide is appended to the output first. Once all copies are
//! in, the final order is laid out and each relocated slide gets one
//! [`PendingMove`], resolved in a single reorder pass.

use crate::copier::{copy_slide, BackgroundSnapshot, CopyWarning};
use crate::presentation::Presentation;
use deck_core::{
    DeploymentMethod, InsertionPolicy, PendingMove, ReferenceBlock, Result, TemplateLookup,
};
use std::fmt;

/// Why an insertion step did nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The reference deck this step reads from was not provided.
    MissingReferenceDeck,
    /// No deployment method was available.
    NoDeploymentMethod,
    /// The deployment category intentionally has no template slide.
    NoTemplate(String),
    /// The deployment method matched no known category.
    UnknownDeployment(String),
    /// The template index is past the end of the architecture deck.
    TemplateMissing { index: usize, available: usize },
    /// The reference deck is too short for the whole block.
    TooFewSlides { required: usize, available: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingReferenceDeck => write!(f, "reference deck not available"),
            Self::NoDeploymentMethod => write!(f, "no deployment method"),
            Self::NoTemplate(key) => write!(f, "'{}' has no architecture template", key),
            Self::UnknownDeployment(key) => write!(f, "unknown deployment method '{}'", key),
            Self::TemplateMissing { index, available } => write!(
                f,
                "template slide {} requested but deck has {} slides",
                index + 1,
                available
            ),
            Self::TooFewSlides {
                required,
                available,
            } => write!(f, "needs {} slides, deck has {}", required, available),
        }
    }
}

/// Outcome of one insertion step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Inserted { count: usize },
    Skipped(SkipReason),
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted { count } => write!(f, "inserted {} slide(s)", count),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
        }
    }
}

/// The reference decks an assembly run can draw from.
#[derive(Debug, Default)]
pub struct ReferenceDecks {
    pub architecture: Option<Presentation>,
    pub general: Option<Presentation>,
}

/// What an assembly run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyReport {
    pub generated_slides: usize,
    pub final_slides: usize,
    pub architecture_anchor: Option<usize>,
    pub architecture: StepOutcome,
    pub early_block: StepOutcome,
    pub late_block: StepOutcome,
    pub moves_applied: usize,
    pub warnings: Vec<CopyWarning>,
}

/// Inserts reference slides into a generated deck according to an
/// [`InsertionPolicy`].
#[derive(Debug, Clone, Default)]
pub struct DeckAssembler {
    policy: InsertionPolicy,
}

impl DeckAssembler {
    pub fn new(policy: InsertionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &InsertionPolicy {
        &self.policy
    }

    /// Index of the generated slide the architecture template follows.
    ///
    /// The first slide with text containing the keyword (case-insensitive),
    /// else the policy's default position.
    pub fn find_architecture_anchor(&self, doc: &Presentation) -> Result<usize> {
        let keyword = self.policy.architecture_keyword.to_lowercase();
        for index in 0..doc.slide_count() {
            let hit = doc
                .slide_texts(index)?
                .iter()
                .any(|text| text.to_lowercase().contains(&keyword));
            if hit {
                log::debug!("Architecture slide found at {}", index + 1);
                return Ok(index);
            }
        }
        log::debug!(
            "No architecture slide found, using slide {}",
            self.policy.default_architecture_anchor + 1
        );
        Ok(self.policy.default_architecture_anchor)
    }

    /// Run all insertion steps on `output` and put every slide in place.
    pub fn assemble(
        &self,
        output: &mut Presentation,
        references: &ReferenceDecks,
        deployment: Option<&DeploymentMethod>,
    ) -> Result<AssemblyReport> {
        let generated = output.slide_count();
        log::info!("Assembling deck with {} generated slides", generated);

        let anchor = if generated > 0 {
            Some(self.find_architecture_anchor(output)?)
        } else {
            None
        };
        // Taken before anything is appended so late slides match the cover.
        let cover_background = if generated > 0 {
            BackgroundSnapshot::effective(output, 0)?
        } else {
            None
        };

        let mut warnings = Vec::new();

        let (architecture, architecture_slide) = match self.architecture_template(references, deployment) {
            Ok((deck, index)) => {
                let copied = copy_slide(deck, index, output)?;
                warnings.extend(copied.warnings);
                (StepOutcome::Inserted { count: 1 }, Some(copied.index))
            }
            Err(reason) => (StepOutcome::Skipped(reason), None),
        };

        let (early_block, early_slides) =
            self.copy_block("early", &self.policy.early_block, references, output, &mut warnings)?;

        let (late_block, late_slides) =
            self.copy_block("late", &self.policy.late_block, references, output, &mut warnings)?;
        if let Some(background) = &cover_background {
            for &index in &late_slides {
                if let Some(warning) = background.apply(output, index)? {
                    warnings.push(warning);
                }
            }
        }

        let order = final_order(generated, anchor, architecture_slide, &early_slides, &late_slides);
        let moves = pending_moves(&order, generated);
        let moves_applied = output.move_slides(&moves)?;

        let report = AssemblyReport {
            generated_slides: generated,
            final_slides: output.slide_count(),
            architecture_anchor: anchor,
            architecture,
            early_block,
            late_block,
            moves_applied,
            warnings,
        };
        log::info!(
            "Assembled {} slides ({} moves)",
            report.final_slides,
            report.moves_applied
        );
        Ok(report)
    }

    fn architecture_template<'r>(
        &self,
        references: &'r ReferenceDecks,
        deployment: Option<&DeploymentMethod>,
    ) -> std::result::Result<(&'r Presentation, usize), SkipReason> {
        let Some(method) = deployment else {
            log::warn!("No deployment method, skipping architecture slide");
            return Err(SkipReason::NoDeploymentMethod);
        };

        let index = match self.policy.architecture_table.lookup(method) {
            TemplateLookup::Slide(index) => index,
            TemplateLookup::NoTemplate => {
                log::info!("Deployment '{}' has no architecture template", method);
                return Err(SkipReason::NoTemplate(method.key().to_string()));
            }
            TemplateLookup::Unknown => {
                log::warn!("Unknown deployment method '{}', skipping architecture slide", method);
                return Err(SkipReason::UnknownDeployment(method.key().to_string()));
            }
        };

        let Some(deck) = references.architecture.as_ref() else {
            log::warn!("Architecture reference deck not available");
            return Err(SkipReason::MissingReferenceDeck);
        };
        if index >= deck.slide_count() {
            log::warn!(
                "Architecture deck has {} slides, template {} not available",
                deck.slide_count(),
                index + 1
            );
            return Err(SkipReason::TemplateMissing {
                index,
                available: deck.slide_count(),
            });
        }
        Ok((deck, index))
    }

    /// Copy a whole block of the general deck, or nothing at all.
    fn copy_block(
        &self,
        label: &str,
        block: &ReferenceBlock,
        references: &ReferenceDecks,
        output: &mut Presentation,
        warnings: &mut Vec<CopyWarning>,
    ) -> Result<(StepOutcome, Vec<usize>)> {
        let Some(deck) = references.general.as_ref() else {
            log::warn!("General reference deck not available, skipping {} block", label);
            return Ok((StepOutcome::Skipped(SkipReason::MissingReferenceDeck), Vec::new()));
        };

        let available = deck.slide_count();
        if !block.is_available(available) {
            log::warn!(
                "General deck has {} slides, {} block needs {}; skipping",
                available,
                label,
                block.required_slides()
            );
            return Ok((
                StepOutcome::Skipped(SkipReason::TooFewSlides {
                    required: block.required_slides(),
                    available,
                }),
                Vec::new(),
            ));
        }

        let mut appended = Vec::with_capacity(block.len());
        for index in block.slides.clone() {
            let copied = copy_slide(deck, index, output)?;
            warnings.extend(copied.warnings);
            appended.push(copied.index);
        }
        log::debug!("Copied {} block ({} slides)", label, appended.len());
        Ok((StepOutcome::Inserted { count: appended.len() }, appended))
    }
}

/// Current indices listed in their final order.
///
/// Generated slides keep their order; the early block follows the first
/// one, the architecture template follows the anchor (clamped to the last
/// generated slide), and the late block closes the deck. The early block
/// always holds positions 2..; with the anchor on slide 1 the template
/// comes after the block.
fn final_order(
    generated: usize,
    anchor: Option<usize>,
    architecture: Option<usize>,
    early: &[usize],
    late: &[usize],
) -> Vec<usize> {
    let mut order = Vec::with_capacity(generated + early.len() + late.len() + 1);

    if generated == 0 {
        order.extend(architecture);
        order.extend_from_slice(early);
    } else {
        let anchor = anchor.unwrap_or(0).min(generated - 1);
        for slide in 0..generated {
            order.push(slide);
            if slide == 0 {
                order.extend_from_slice(early);
            }
            if slide == anchor {
                order.extend(architecture);
            }
        }
    }

    order.extend_from_slice(late);
    order
}

/// One move per appended slide, except for a trailing run of slides that
/// already sit at their targets.
///
/// Every appended slide ahead of that run is moved, even one that happens to
/// sit at its target now: the slides moved around it would shift it.
fn pending_moves(order: &[usize], generated: usize) -> Vec<PendingMove> {
    let settled = order
        .iter()
        .enumerate()
        .rev()
        .take_while(|&(target, &current)| current == target)
        .count();
    order[..order.len() - settled]
        .iter()
        .enumerate()
        .filter(|&(_, &current)| current >= generated)
        .map(|(target, &current)| PendingMove::new(current, target))
        .collect()
}
