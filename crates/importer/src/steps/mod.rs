//! Concrete pipeline steps: read-only ref safety checks and the mutating
//! clone / create-project / replicate stages.

pub mod checks;
pub mod clone;
pub mod create_project;
pub mod replicate;

pub use checks::{MetaRefCheckStep, ProtectedBranchesCheckStep, ReviewRefsCheckStep};
pub use clone::GitCloneStep;
pub use create_project::CreateProjectStep;
pub use replicate::ReplicateProjectStep;
