use crate::domain::attendance::{AttendanceKey, AttendanceRecord, DayEntry, EmployeeId, YearMonth};
use crate::domain::employee::Employee;
use crate::domain::geofence::Location;
use crate::domain::leave::{BalanceOutcome, LeaveBalance, LeaveDeduction, LeaveId, LeaveRequest};
use crate::domain::payroll::Payslip;
use crate::domain::ports::{
    AttendanceStore, EmployeeDirectory, LeaveStore, LocationDirectory, PayslipStore,
    SiteAssignmentDirectory,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory attendance ledger.
///
/// Day writes take the write lock and insert a single date into the month
/// record, so concurrent marks on different days never overwrite each other.
#[derive(Default, Clone)]
pub struct InMemoryAttendanceStore {
    records: Arc<RwLock<HashMap<AttendanceKey, AttendanceRecord>>>,
}

impl InMemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttendanceStore for InMemoryAttendanceStore {
    async fn upsert_day(&self, employee_id: &str, date: NaiveDate, entry: DayEntry) -> Result<()> {
        let key = AttendanceKey::for_date(employee_id, date);
        let mut records = self.records.write().await;
        records
            .entry(key)
            .or_insert_with(|| AttendanceRecord::new(employee_id, YearMonth::of(date)))
            .set(date, entry)
    }

    async fn get(&self, key: &AttendanceKey) -> Result<Option<AttendanceRecord>> {
        let records = self.records.read().await;
        Ok(records.get(key).cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryLeaveStore {
    requests: Arc<RwLock<HashMap<LeaveId, LeaveRequest>>>,
}

impl InMemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaveStore for InMemoryLeaveStore {
    async fn store(&self, request: LeaveRequest) -> Result<()> {
        let mut requests = self.requests.write().await;
        requests.insert(request.id, request);
        Ok(())
    }

    async fn get(&self, id: LeaveId) -> Result<Option<LeaveRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id).cloned())
    }

    async fn delete(&self, id: LeaveId) -> Result<bool> {
        let mut requests = self.requests.write().await;
        Ok(requests.remove(&id).is_some())
    }

    async fn for_employee(&self, employee_id: &str) -> Result<Vec<LeaveRequest>> {
        let requests = self.requests.read().await;
        let mut found: Vec<LeaveRequest> = requests
            .values()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.created_at);
        Ok(found)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryPayslipStore {
    payslips: Arc<RwLock<HashMap<(EmployeeId, YearMonth), Payslip>>>,
}

impl InMemoryPayslipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PayslipStore for InMemoryPayslipStore {
    async fn store(&self, payslip: Payslip) -> Result<()> {
        let mut payslips = self.payslips.write().await;
        payslips.insert((payslip.employee_id.clone(), payslip.month), payslip);
        Ok(())
    }

    async fn get(&self, employee_id: &str, month: YearMonth) -> Result<Option<Payslip>> {
        let payslips = self.payslips.read().await;
        Ok(payslips.get(&(employee_id.to_string(), month)).cloned())
    }
}

/// Employee directory held in memory, seeded by the caller.
#[derive(Default, Clone)]
pub struct InMemoryEmployeeDirectory {
    employees: Arc<RwLock<HashMap<EmployeeId, Employee>>>,
}

impl InMemoryEmployeeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_employees(employees: impl IntoIterator<Item = Employee>) -> Self {
        let employees = employees
            .into_iter()
            .map(|employee| (employee.id.clone(), employee))
            .collect();
        Self {
            employees: Arc::new(RwLock::new(employees)),
        }
    }

    pub async fn insert(&self, employee: Employee) {
        let mut employees = self.employees.write().await;
        employees.insert(employee.id.clone(), employee);
    }

    pub async fn remove(&self, employee_id: &str) -> Option<Employee> {
        let mut employees = self.employees.write().await;
        employees.remove(employee_id)
    }

    /// Runs `update` on the stored balance while holding the write lock.
    async fn update_balance<R>(
        &self,
        employee_id: &str,
        update: impl FnOnce(&mut LeaveBalance) -> R,
    ) -> Option<R> {
        let mut employees = self.employees.write().await;
        employees
            .get_mut(employee_id)
            .map(|employee| update(&mut employee.leave_balance))
    }
}

#[async_trait]
impl EmployeeDirectory for InMemoryEmployeeDirectory {
    async fn get(&self, employee_id: &str) -> Result<Option<Employee>> {
        let employees = self.employees.read().await;
        Ok(employees.get(employee_id).cloned())
    }

    async fn deduct_leave_balance(
        &self,
        employee_id: &str,
        deduction: LeaveDeduction,
    ) -> Result<Option<BalanceOutcome>> {
        Ok(self.update_balance(employee_id, |balance| balance.deduct(&deduction)).await)
    }

    async fn set_leave_counters(
        &self,
        employee_id: &str,
        casual: u32,
        sick: u32,
        earned: u32,
    ) -> Result<Option<LeaveBalance>> {
        Ok(self
            .update_balance(employee_id, |balance| {
                balance.set_counters(casual, sick, earned);
                balance.clone()
            })
            .await)
    }

    async fn release_leave(&self, employee_id: &str, leave_id: LeaveId) -> Result<Option<()>> {
        Ok(self
            .update_balance(employee_id, |balance| {
                balance.release(leave_id);
            })
            .await)
    }
}

/// Location list in registration order.
#[derive(Default, Clone)]
pub struct InMemoryLocationDirectory {
    locations: Arc<Vec<Location>>,
}

impl InMemoryLocationDirectory {
    pub fn new(locations: Vec<Location>) -> Self {
        Self {
            locations: Arc::new(locations),
        }
    }
}

#[async_trait]
impl LocationDirectory for InMemoryLocationDirectory {
    async fn all(&self) -> Result<Vec<Location>> {
        Ok(self.locations.as_ref().clone())
    }

    async fn get(&self, location_id: &str) -> Result<Option<Location>> {
        Ok(self.locations.iter().find(|l| l.id == location_id).cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemorySiteAssignments {
    assignments: Arc<RwLock<HashMap<(EmployeeId, NaiveDate), String>>>,
}

impl InMemorySiteAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the employee to one location for `date`, replacing any earlier
    /// assignment for that day.
    pub async fn assign(
        &self,
        employee_id: impl Into<EmployeeId>,
        date: NaiveDate,
        location_id: impl Into<String>,
    ) {
        let mut assignments = self.assignments.write().await;
        assignments.insert((employee_id.into(), date), location_id.into());
    }
}

#[async_trait]
impl SiteAssignmentDirectory for InMemorySiteAssignments {
    async fn assigned_location(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<String>> {
        let assignments = self.assignments.read().await;
        Ok(assignments.get(&(employee_id.to_string(), date)).cloned())
    }
}
