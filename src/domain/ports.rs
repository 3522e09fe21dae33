use super::attendance::{AttendanceKey, AttendanceRecord, DayEntry, YearMonth};
use super::employee::Employee;
use super::geofence::Location;
use super::leave::{BalanceOutcome, LeaveBalance, LeaveDeduction, LeaveId, LeaveRequest};
use super::payroll::Payslip;
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Sets the entry for one day, merging it into the `(employee, month)`
    /// record. Other days of the record are never rewritten.
    async fn upsert_day(&self, employee_id: &str, date: NaiveDate, entry: DayEntry) -> Result<()>;
    async fn get(&self, key: &AttendanceKey) -> Result<Option<AttendanceRecord>>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn store(&self, request: LeaveRequest) -> Result<()>;
    async fn get(&self, id: LeaveId) -> Result<Option<LeaveRequest>>;
    /// Returns whether a request was removed.
    async fn delete(&self, id: LeaveId) -> Result<bool>;
    async fn for_employee(&self, employee_id: &str) -> Result<Vec<LeaveRequest>>;
}

#[async_trait]
pub trait PayslipStore: Send + Sync {
    /// Stores `payslip`, replacing any snapshot for the same employee and month.
    async fn store(&self, payslip: Payslip) -> Result<()>;
    async fn get(&self, employee_id: &str, month: YearMonth) -> Result<Option<Payslip>>;
}

/// Read access to employees plus the leave-balance edits this engine makes.
///
/// Each balance operation is one atomic read-modify-write on the stored
/// balance; concurrent calls for the same employee never lose an update.
/// They return `None` when the employee does not exist.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn get(&self, employee_id: &str) -> Result<Option<Employee>>;
    /// Runs [`LeaveBalance::deduct`] against the stored balance.
    async fn deduct_leave_balance(
        &self,
        employee_id: &str,
        deduction: LeaveDeduction,
    ) -> Result<Option<BalanceOutcome>>;
    /// Replaces the counters, keeping the deduction markers.
    async fn set_leave_counters(
        &self,
        employee_id: &str,
        casual: u32,
        sick: u32,
        earned: u32,
    ) -> Result<Option<LeaveBalance>>;
    /// Drops the deduction marker kept for `leave_id`.
    async fn release_leave(&self, employee_id: &str, leave_id: LeaveId) -> Result<Option<()>>;
}

#[async_trait]
pub trait LocationDirectory: Send + Sync {
    /// All registered locations in directory order.
    async fn all(&self) -> Result<Vec<Location>>;
    async fn get(&self, location_id: &str) -> Result<Option<Location>>;
}

#[async_trait]
pub trait SiteAssignmentDirectory: Send + Sync {
    /// Location id the employee is assigned to on `date`, if any.
    async fn assigned_location(&self, employee_id: &str, date: NaiveDate) -> Result<Option<String>>;
}

pub type AttendanceStoreBox = Box<dyn AttendanceStore>;
pub type LeaveStoreBox = Box<dyn LeaveStore>;
pub type PayslipStoreBox = Box<dyn PayslipStore>;
pub type EmployeeDirectoryBox = Box<dyn EmployeeDirectory>;
pub type LocationDirectoryBox = Box<dyn LocationDirectory>;
pub type SiteAssignmentDirectoryBox = Box<dyn SiteAssignmentDirectory>;

/// The ledgers owned by the engine.
pub struct Stores {
    pub attendance: AttendanceStoreBox,
    pub leaves: LeaveStoreBox,
    pub payslips: PayslipStoreBox,
}

/// External reference data consumed by the engine.
pub struct Directories {
    pub employees: EmployeeDirectoryBox,
    pub locations: LocationDirectoryBox,
    pub assignments: SiteAssignmentDirectoryBox,
}
