//! Core domain types, deployment normalization, insertion policy and
//! positional reordering for proposal deck assembly.

pub mod deployment;
pub mod error;
pub mod policy;
pub mod project_info;
pub mod reorder;
pub mod types;

pub use deployment::{DeploymentCategory, DeploymentMethod};
pub use error::{Error, Result};
pub use policy::{ArchitectureTable, InsertionPolicy, ReferenceBlock, TemplateLookup};
pub use project_info::ProjectInfo;
pub use reorder::{apply_moves, PendingMove};
pub use types::{
    Bullet, Column, Diagram, Milestone, ModuleContent, SlideBody, SlidePlan, SlideRecord, Timeline,
};
