// Command implementations

pub mod check;
pub mod generate;
pub mod serve;
pub mod test_suite;
