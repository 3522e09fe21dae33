//! Batch surfaces of the engine: CSV seed data for the directories and a
//! JSON-lines command journal.

pub mod csv;
pub mod journal;
