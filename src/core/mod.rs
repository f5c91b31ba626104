pub mod checklist;
pub mod launcher;

pub use crate::domain::model::{LaunchReport, Outcome, StepKind, StepStatus};
pub use crate::domain::ports::{ProcessExecutor, Workspace};
pub use crate::utils::error::Result;
