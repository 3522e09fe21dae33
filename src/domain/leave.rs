use crate::domain::attendance::{EmployeeId, YearMonth};
use crate::error::{ReconcileError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type LeaveId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaveType {
    Casual,
    Sick,
    Earned,
    #[serde(rename = "LOP")]
    Lop,
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaveType::Casual => write!(f, "Casual"),
            LeaveType::Sick => write!(f, "Sick"),
            LeaveType::Earned => write!(f, "Earned"),
            LeaveType::Lop => write!(f, "LOP"),
        }
    }
}

impl FromStr for LeaveType {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "casual" => Ok(LeaveType::Casual),
            "sick" => Ok(LeaveType::Sick),
            "earned" => Ok(LeaveType::Earned),
            "lop" => Ok(LeaveType::Lop),
            _ => Err(ReconcileError::validation(format!(
                "invalid leave type '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Whether moving from `self` to `next` runs the approval cascade.
    ///
    /// Any entry into `Approved` qualifies, including `Rejected -> Approved`.
    pub fn triggers_cascade(self, next: LeaveStatus) -> bool {
        self != LeaveStatus::Approved && next == LeaveStatus::Approved
    }
}

impl FromStr for LeaveStatus {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(LeaveStatus::Pending),
            "approved" => Ok(LeaveStatus::Approved),
            "rejected" => Ok(LeaveStatus::Rejected),
            _ => Err(ReconcileError::validation(format!(
                "invalid leave status '{}'",
                s
            ))),
        }
    }
}

/// An inclusive span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(ReconcileError::validation(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// `(end - start) + 1`.
    pub fn day_count(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(|d| *d <= self.end)
    }

    /// Dates of the range grouped by the month they fall in.
    pub fn by_month(&self) -> BTreeMap<YearMonth, Vec<NaiveDate>> {
        let mut months: BTreeMap<YearMonth, Vec<NaiveDate>> = BTreeMap::new();
        for date in self.dates() {
            months.entry(YearMonth::of(date)).or_default().push(date);
        }
        months
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: LeaveId,
    pub employee_id: EmployeeId,
    /// Name as it was in the directory when the request was filed.
    pub employee_name: String,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_comment: Option<String>,
    /// Qualifying approval transitions persisted so far.
    #[serde(default)]
    pub approvals: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn new(
        employee_id: impl Into<EmployeeId>,
        employee_name: impl Into<String>,
        leave_type: LeaveType,
        range: DateRange,
        reason: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            employee_id: employee_id.into(),
            employee_name: employee_name.into(),
            leave_type,
            start_date: range.start,
            end_date: range.end,
            reason: reason.into(),
            status: LeaveStatus::Pending,
            admin_comment: None,
            approvals: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn day_count(&self) -> u32 {
        self.range().day_count()
    }

    /// The balance claim of this request's `ordinal`-th approval.
    pub fn deduction(&self, ordinal: u32) -> LeaveDeduction {
        LeaveDeduction {
            leave_id: self.id,
            leave_type: self.leave_type,
            days: self.day_count(),
            ordinal,
        }
    }
}

/// Remaining leave days per type, held on the employee aggregate.
///
/// `applied` remembers, per leave request, the approval ordinal whose
/// deduction has already been taken, so replaying the same transition
/// does not deduct twice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeaveBalance {
    pub casual: u32,
    pub sick: u32,
    pub earned: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub applied: BTreeMap<LeaveId, u32>,
}

/// One approval's claim on a leave balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveDeduction {
    pub leave_id: LeaveId,
    pub leave_type: LeaveType,
    pub days: u32,
    /// Which approval of the request this is, starting at 1.
    pub ordinal: u32,
}

/// What the balance step of an approval did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BalanceOutcome {
    Deducted { before: u32, after: u32 },
    AlreadyApplied,
    NoCounter,
    Skipped { reason: String },
}

impl LeaveBalance {
    pub fn new(casual: u32, sick: u32, earned: u32) -> Self {
        Self {
            casual,
            sick,
            earned,
            applied: BTreeMap::new(),
        }
    }

    pub fn remaining(&self, leave_type: LeaveType) -> Option<u32> {
        match leave_type {
            LeaveType::Casual => Some(self.casual),
            LeaveType::Sick => Some(self.sick),
            LeaveType::Earned => Some(self.earned),
            LeaveType::Lop => None,
        }
    }

    fn counter_mut(&mut self, leave_type: LeaveType) -> Option<&mut u32> {
        match leave_type {
            LeaveType::Casual => Some(&mut self.casual),
            LeaveType::Sick => Some(&mut self.sick),
            LeaveType::Earned => Some(&mut self.earned),
            LeaveType::Lop => None,
        }
    }

    /// Whether the remaining balance covers `days`. Types without a counter
    /// are always covered.
    pub fn covers(&self, leave_type: LeaveType, days: u32) -> bool {
        self.remaining(leave_type).is_none_or(|left| left >= days)
    }

    /// Takes the deduction's days off its counter, clamping at zero.
    ///
    /// A second call with an ordinal already applied for the same leave
    /// changes nothing.
    pub fn deduct(&mut self, deduction: &LeaveDeduction) -> BalanceOutcome {
        let LeaveDeduction {
            leave_id,
            leave_type,
            days,
            ordinal,
        } = *deduction;
        if self.applied.get(&leave_id).is_some_and(|done| *done >= ordinal) {
            return BalanceOutcome::AlreadyApplied;
        }
        let Some(counter) = self.counter_mut(leave_type) else {
            return BalanceOutcome::NoCounter;
        };
        let before = *counter;
        *counter = before.saturating_sub(days);
        let after = *counter;
        self.applied.insert(leave_id, ordinal);
        BalanceOutcome::Deducted { before, after }
    }

    /// Forgets the deduction marker of a leave that no longer exists.
    pub fn release(&mut self, leave_id: LeaveId) -> bool {
        self.applied.remove(&leave_id).is_some()
    }

    /// Admin edit: replace the counters, keeping the deduction markers.
    pub fn set_counters(&mut self, casual: u32, sick: u32, earned: u32) {
        self.casual = casual;
        self.sick = sick;
        self.earned = earned;
    }
}
