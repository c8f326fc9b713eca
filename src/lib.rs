pub mod client;
pub mod config;
pub mod error;
pub mod fixture;
pub mod o11y;
pub mod runner;
pub mod suites;
