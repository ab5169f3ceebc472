//! Folio Portfolio Service Library
//!
//! Core components for the folio investment portfolio service: the
//! single-writer portfolio actors, the quote cache and feed, the
//! acquisition publisher and the query-model store.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
