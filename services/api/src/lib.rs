//! services/api/src/lib.rs
//!
//! The Biblio REST backend: books, reviews, favorites and email/password
//! accounts over a Postgres store.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
