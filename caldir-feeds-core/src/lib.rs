//! Core engine for caldir-feeds.
//!
//! Mirrors the single (non-recurring) events of external ICS feeds into a
//! caldir calendar directory:
//! - `ics` splits feed text into event records and extracts fields
//! - `timezone` and `datetime` turn raw date fields into instants
//! - `candidate` classifies events and computes their identity keys
//! - `reconcile` diffs keys against persisted state and applies creates/deletes
//! - `purge` removes everything the mirror ever wrote

pub mod candidate;
pub mod config;
pub mod constants;
pub mod date_range;
pub mod datetime;
pub mod error;
pub mod fetch;
pub mod ics;
pub mod provenance;
pub mod purge;
pub mod reconcile;
pub mod state;
pub mod store;
pub mod timezone;

#[cfg(test)]
mod testing;
