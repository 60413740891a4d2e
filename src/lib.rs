pub mod classifier;
pub mod cli;
pub mod config;
pub mod history;
pub mod ingest;
pub mod report;
pub mod web;
pub mod workflow;
