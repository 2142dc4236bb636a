pub mod cancel;
pub mod conclusion;
pub mod config;
pub mod error;
pub mod inputs;
pub mod platform;
pub mod poll;
pub mod report;
pub mod runner;
