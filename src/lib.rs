pub mod api;
pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod importer;
pub mod suggest;
