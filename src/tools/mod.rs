// src/tools/mod.rs

pub mod web;

pub use web::{html_to_text, ScrapingSearch, SearchEngine, SearchHit, WebSearch};
