//! JSON-lines command journal: one engine operation per line, one outcome
//! line per executed command.

pub mod command;
pub mod command_reader;
pub mod outcome_writer;
pub mod runner;
