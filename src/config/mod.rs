pub mod tables;
pub mod tuning;
