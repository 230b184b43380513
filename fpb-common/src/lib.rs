//! # FPB Common Library
//!
//! Core metadata pipeline for the Family Photo Browser:
//! - Source table loading and caching (spreadsheet-like tables in cloud storage)
//! - Multi-source unification in caller-specified order
//! - Canonical sorting and two-stage filtering (text + year threshold)
//! - Result-set navigation with a circular cursor
//! - Browse-session state shared with the UI service

pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod loader;
pub mod navigate;
pub mod session;
pub mod sort;
pub mod table;
pub mod unify;

pub use error::{Error, LoadError, QueryError, Result};
pub use session::BrowseSession;
