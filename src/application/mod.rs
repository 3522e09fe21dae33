//! Application layer orchestrating the ledgers.
//!
//! `ReconciliationEngine` exposes the attendance, geofence, leave and payroll
//! operations over boxed storage and directory ports. Each operation is one
//! bounded unit of work; the only multi-step sequence is the leave approval
//! cascade in [`leave`].

pub mod engine;
pub mod leave;

#[cfg(test)]
pub(crate) mod testing;
