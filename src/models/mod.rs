pub mod config;
pub mod report;
pub mod secrets;
pub mod status;
