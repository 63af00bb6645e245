pub mod api;
pub mod app;
pub mod cli;
pub mod completion;
pub mod config;
pub mod db;
pub mod embedding;
pub mod global;
pub mod jobs;
pub mod meeting;
