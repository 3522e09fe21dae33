use crate::domain::geofence::GeoPoint;
use crate::error::{ReconcileError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of an employee as issued by the employee directory.
pub type EmployeeId = String;

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| ReconcileError::validation(format!("invalid date '{}': {}", value, e)))
}

/// A calendar month, the partition key of attendance records and payslips.
///
/// Internally anchored on the first day of the month so that every value is a
/// real, representable month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    first: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first| Self { first })
            .ok_or_else(|| {
                ReconcileError::validation(format!("invalid month {:04}-{:02}", year, month))
            })
    }

    /// The month a date falls in.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// Every calendar date of the month, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.first.iter_days().take_while(|d| self.contains(*d))
    }

    pub fn days_in_month(&self) -> u32 {
        self.days().count() as u32
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ReconcileError::validation(format!("invalid month '{}'", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = ReconcileError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(month: YearMonth) -> Self {
        month.to_string()
    }
}

/// The three attendance outcomes a day can carry.
///
/// Serialized as the single-letter codes used on attendance sheets; the full
/// names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayStatus {
    #[serde(rename = "P", alias = "present", alias = "Present")]
    Present,
    #[serde(rename = "A", alias = "absent", alias = "Absent")]
    Absent,
    #[serde(rename = "L", alias = "leave", alias = "Leave")]
    Leave,
}

impl FromStr for DayStatus {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "p" | "present" => Ok(DayStatus::Present),
            "a" | "absent" => Ok(DayStatus::Absent),
            "l" | "leave" => Ok(DayStatus::Leave),
            _ => Err(ReconcileError::validation(format!(
                "invalid day status '{}'",
                s
            ))),
        }
    }
}

/// How an attendance mark was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    Manual,
    Geofence,
    Biometric,
    LeaveCascade,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CaptureMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
}

impl CaptureMetadata {
    pub fn validate(&self) -> Result<()> {
        if let Some(point) = &self.geolocation {
            point.validate()?;
        }
        Ok(())
    }
}

/// The single stored entry for one employee on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayEntry {
    pub status: DayStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CaptureMetadata>,
}

impl DayEntry {
    pub fn new(status: DayStatus) -> Self {
        Self {
            status,
            metadata: None,
        }
    }

    pub fn with_metadata(status: DayStatus, metadata: CaptureMetadata) -> Self {
        Self {
            status,
            metadata: Some(metadata),
        }
    }
}

/// Partition key of the attendance ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttendanceKey {
    pub employee_id: EmployeeId,
    pub month: YearMonth,
}

impl AttendanceKey {
    pub fn new(employee_id: impl Into<EmployeeId>, month: YearMonth) -> Self {
        Self {
            employee_id: employee_id.into(),
            month,
        }
    }

    pub fn for_date(employee_id: impl Into<EmployeeId>, date: NaiveDate) -> Self {
        Self::new(employee_id, YearMonth::of(date))
    }
}

/// Stored attendance of one employee for one month.
///
/// Holds at most one [`DayEntry`] per date; every date belongs to `month`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub employee_id: EmployeeId,
    pub month: YearMonth,
    pub days: BTreeMap<NaiveDate, DayEntry>,
}

impl AttendanceRecord {
    pub fn new(employee_id: impl Into<EmployeeId>, month: YearMonth) -> Self {
        Self {
            employee_id: employee_id.into(),
            month,
            days: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> AttendanceKey {
        AttendanceKey::new(self.employee_id.clone(), self.month)
    }

    /// Sets or overwrites the entry for `date`.
    pub fn set(&mut self, date: NaiveDate, entry: DayEntry) -> Result<()> {
        if !self.month.contains(date) {
            return Err(ReconcileError::validation(format!(
                "date {} is outside month {}",
                date, self.month
            )));
        }
        self.days.insert(date, entry);
        Ok(())
    }

    pub fn status_on(&self, date: NaiveDate) -> Option<DayStatus> {
        self.days.get(&date).map(|entry| entry.status)
    }

    /// Number of stored `Present` entries. Synthesized defaults never count.
    pub fn present_days(&self) -> u32 {
        self.days
            .values()
            .filter(|entry| entry.status == DayStatus::Present)
            .count() as u32
    }

    pub fn summary(&self) -> AttendanceSummary {
        AttendanceSummary {
            total_days: self.month.days_in_month(),
            present_days: self.present_days(),
        }
    }

    /// Read view of the month with default-day synthesis applied.
    ///
    /// Unmarked Sundays read as `Leave`. Saturdays are working days: nothing
    /// is synthesized for them and a stored `Leave` on a Saturday is hidden.
    /// Other unmarked days are left out. The stored entries are not touched.
    pub fn month_view(&self) -> BTreeMap<NaiveDate, DayStatus> {
        let mut view = BTreeMap::new();
        for date in self.month.days() {
            let stored = self.status_on(date);
            let shown = match (date.weekday(), stored) {
                (Weekday::Sat, Some(DayStatus::Leave)) => None,
                (Weekday::Sun, None) => Some(DayStatus::Leave),
                (_, stored) => stored,
            };
            if let Some(status) = shown {
                view.insert(date, status);
            }
        }
        view
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub total_days: u32,
    pub present_days: u32,
}
