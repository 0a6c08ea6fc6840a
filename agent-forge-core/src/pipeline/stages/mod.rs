//! The six pipeline stages

pub mod generate;
pub mod package;
pub mod plan;
pub mod sanity;
pub mod test_suite;
pub mod validate;

pub use generate::GenerateFiles;
pub use package::PackageOutput;
pub use plan::PlanProject;
pub use sanity::SanityChecks;
pub use test_suite::GenerateTests;
pub use validate::ValidateInput;
