mod approval;
mod orchestrator;
mod outcome;

pub use approval::{AlternativeApprover, AlwaysApprove, NeverApprove};
pub use orchestrator::{InstallRequest, Orchestrator};
pub use outcome::{InstallReport, ModOutcome, ModStatus, ResolvedMod, SkipCounts};
