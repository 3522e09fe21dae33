//! Domain types and rules of the attendance, leave and payroll ledgers.
//!
//! Everything here is synchronous and free of I/O except the `ports`
//! traits, which describe the storage and directory collaborators.

pub mod attendance;
pub mod employee;
pub mod geofence;
pub mod leave;
pub mod payroll;
pub mod ports;
