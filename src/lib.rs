//! Feed ingestion backend for a reader frontend: fetches RSS and Atom
//! feeds, fills in thin entries by scraping the article page, sanitizes
//! the HTML, and exposes the stored articles over a JSON API and a CLI.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ingest;
pub mod services;
pub mod sources;
pub mod storage;
