use crate::domain::attendance::{AttendanceKey, AttendanceRecord, DayEntry, YearMonth};
use crate::domain::employee::Employee;
use crate::domain::leave::{BalanceOutcome, LeaveBalance, LeaveDeduction, LeaveId, LeaveRequest};
use crate::domain::payroll::Payslip;
use crate::domain::ports::{AttendanceStore, EmployeeDirectory, LeaveStore, PayslipStore};
use crate::error::{ReconcileError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family holding one key per attendance day.
pub const CF_ATTENDANCE: &str = "attendance";
/// Column Family for leave requests keyed by id.
pub const CF_LEAVES: &str = "leaves";
/// Column Family for payslip snapshots keyed by employee and month.
pub const CF_PAYSLIPS: &str = "payslips";
/// Column Family for the employee aggregates this engine updates.
pub const CF_EMPLOYEES: &str = "employees";

const SEP: char = '\u{0}';

/// A persistent store implementation using RocksDB.
///
/// Attendance is stored one key per day (`employee \0 month \0 date`), so a
/// day mark is a single `put` and never rewrites the rest of the month.
/// Reading a month is a prefix scan over `employee \0 month \0`.
///
/// Employee rows are read, changed and written back under `employee_lock`,
/// so two balance edits for the same employee never overwrite each other.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    employee_lock: Arc<Mutex<()>>,
}

fn month_prefix(employee_id: &str, month: YearMonth) -> String {
    format!("{employee_id}{SEP}{month}{SEP}")
}

fn day_key(employee_id: &str, date: NaiveDate) -> String {
    format!("{}{}", month_prefix(employee_id, YearMonth::of(date)), date)
}

fn payslip_key(employee_id: &str, month: YearMonth) -> String {
    format!("{employee_id}{SEP}{month}")
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        ReconcileError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Serialization error: {}", e),
        )))
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        ReconcileError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Deserialization error: {}", e),
        )))
    })
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, creating
    /// the column families on first use.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_ATTENDANCE, CF_LEAVES, CF_PAYSLIPS, CF_EMPLOYEES]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, families)?;

        Ok(Self {
            db: Arc::new(db),
            employee_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            ReconcileError::InternalError(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }

    fn read<T: DeserializeOwned>(
        &self,
        family: &str,
        key: impl AsRef<[u8]>,
    ) -> Result<Option<T>> {
        let cf = self.cf(family)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, family: &str, key: impl AsRef<[u8]>, value: &T) -> Result<()> {
        let cf = self.cf(family)?;
        self.db.put_cf(cf, key, encode(value)?)?;
        Ok(())
    }

    /// Registers an employee from seed data. An already stored employee gets
    /// the seed's name and compensation but keeps the leave balance earlier
    /// runs wrote. Returns whether the employee was new.
    pub async fn register_employee(&self, employee: &Employee) -> Result<bool> {
        let _guard = self.employee_lock.lock().await;
        let stored: Option<Employee> = self.read(CF_EMPLOYEES, employee.id.as_bytes())?;
        let inserted = stored.is_none();
        let mut merged = employee.clone();
        if let Some(stored) = stored {
            merged.leave_balance = stored.leave_balance;
        }
        self.write(CF_EMPLOYEES, employee.id.as_bytes(), &merged)?;
        Ok(inserted)
    }

    /// Runs `update` on a stored leave balance and writes the employee back,
    /// holding the employee lock throughout.
    async fn update_balance<R>(
        &self,
        employee_id: &str,
        update: impl FnOnce(&mut LeaveBalance) -> R,
    ) -> Result<Option<R>> {
        let _guard = self.employee_lock.lock().await;
        let Some(mut employee) = self.read::<Employee>(CF_EMPLOYEES, employee_id.as_bytes())? else {
            return Ok(None);
        };
        let result = update(&mut employee.leave_balance);
        self.write(CF_EMPLOYEES, employee_id.as_bytes(), &employee)?;
        Ok(Some(result))
    }
}

#[async_trait]
impl AttendanceStore for RocksDBStore {
    async fn upsert_day(&self, employee_id: &str, date: NaiveDate, entry: DayEntry) -> Result<()> {
        self.write(CF_ATTENDANCE, day_key(employee_id, date), &entry)
    }

    async fn get(&self, key: &AttendanceKey) -> Result<Option<AttendanceRecord>> {
        let cf = self.cf(CF_ATTENDANCE)?;
        let prefix = month_prefix(&key.employee_id, key.month);
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix.as_bytes(), Direction::Forward));

        let mut record = AttendanceRecord::new(key.employee_id.clone(), key.month);
        for item in iter {
            let (raw_key, value) = item?;
            let Some(date) = raw_key.strip_prefix(prefix.as_bytes()) else {
                break;
            };
            let date = std::str::from_utf8(date)
                .map_err(|e| ReconcileError::InternalError(Box::new(e)))
                .and_then(crate::domain::attendance::parse_date)?;
            record.set(date, decode(&value)?)?;
        }

        if record.days.is_empty() {
            Ok(None)
        } else {
            Ok(Some(record))
        }
    }
}

#[async_trait]
impl LeaveStore for RocksDBStore {
    async fn store(&self, request: LeaveRequest) -> Result<()> {
        self.write(CF_LEAVES, request.id.as_bytes(), &request)
    }

    async fn get(&self, id: LeaveId) -> Result<Option<LeaveRequest>> {
        self.read(CF_LEAVES, id.as_bytes())
    }

    async fn delete(&self, id: LeaveId) -> Result<bool> {
        let cf = self.cf(CF_LEAVES)?;
        if self.db.get_pinned_cf(cf, id.as_bytes())?.is_none() {
            return Ok(false);
        }
        self.db.delete_cf(cf, id.as_bytes())?;
        Ok(true)
    }

    async fn for_employee(&self, employee_id: &str) -> Result<Vec<LeaveRequest>> {
        let cf = self.cf(CF_LEAVES)?;
        let mut found = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let request: LeaveRequest = decode(&value)?;
            if request.employee_id == employee_id {
                found.push(request);
            }
        }
        found.sort_by_key(|r| r.created_at);
        Ok(found)
    }
}

#[async_trait]
impl PayslipStore for RocksDBStore {
    async fn store(&self, payslip: Payslip) -> Result<()> {
        self.write(CF_PAYSLIPS, payslip_key(&payslip.employee_id, payslip.month), &payslip)
    }

    async fn get(&self, employee_id: &str, month: YearMonth) -> Result<Option<Payslip>> {
        self.read(CF_PAYSLIPS, payslip_key(employee_id, month))
    }
}

#[async_trait]
impl EmployeeDirectory for RocksDBStore {
    async fn get(&self, employee_id: &str) -> Result<Option<Employee>> {
        self.read(CF_EMPLOYEES, employee_id.as_bytes())
    }

    async fn deduct_leave_balance(
        &self,
        employee_id: &str,
        deduction: LeaveDeduction,
    ) -> Result<Option<BalanceOutcome>> {
        self.update_balance(employee_id, |balance| balance.deduct(&deduction)).await
    }

    async fn set_leave_counters(
        &self,
        employee_id: &str,
        casual: u32,
        sick: u32,
        earned: u32,
    ) -> Result<Option<LeaveBalance>> {
        self.update_balance(employee_id, |balance| {
            balance.set_counters(casual, sick, earned);
            balance.clone()
        })
        .await
    }

    async fn release_leave(&self, employee_id: &str, leave_id: LeaveId) -> Result<Option<()>> {
        self.update_balance(employee_id, |balance| {
            balance.release(leave_id);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::attendance::{DayStatus, parse_date};
    use crate::domain::employee::{Compensation, EarningsProfile};
    use crate::domain::leave::{DateRange, LeaveType};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        for name in [CF_ATTENDANCE, CF_LEAVES, CF_PAYSLIPS, CF_EMPLOYEES] {
            assert!(store.db.cf_handle(name).is_some());
        }
    }

    #[tokio::test]
    async fn test_rocksdb_attendance_month_scan() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        store
            .upsert_day("E1", date("2024-01-31"), DayEntry::new(DayStatus::Present))
            .await
            .unwrap();
        store
            .upsert_day("E1", date("2024-02-01"), DayEntry::new(DayStatus::Absent))
            .await
            .unwrap();
        store
            .upsert_day("E10", date("2024-02-02"), DayEntry::new(DayStatus::Present))
            .await
            .unwrap();

        let feb = AttendanceKey::new("E1", "2024-02".parse().unwrap());
        let record = AttendanceStore::get(&store, &feb).await.unwrap().unwrap();
        assert_eq!(record.days.len(), 1);
        assert_eq!(record.status_on(date("2024-02-01")), Some(DayStatus::Absent));

        let mar = AttendanceKey::new("E1", "2024-03".parse().unwrap());
        assert!(AttendanceStore::get(&store, &mar).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_leave_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let range = DateRange::new(date("2024-03-04"), date("2024-03-06")).unwrap();
        let request = LeaveRequest::new("E1", "Asha", LeaveType::Casual, range, "trip");
        let id = request.id;

        LeaveStore::store(&store, request.clone()).await.unwrap();
        assert_eq!(LeaveStore::get(&store, id).await.unwrap(), Some(request));
        assert_eq!(store.for_employee("E1").await.unwrap().len(), 1);

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_rocksdb_employee_registration_keeps_balances() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let employee = Employee::new("E1", "Asha").with_leave_balance(LeaveBalance::new(12, 0, 0));

        assert!(store.register_employee(&employee).await.unwrap());
        store.set_leave_counters("E1", 7, 0, 0).await.unwrap();

        let raised = Employee::new("E1", "Asha K")
            .with_compensation(Compensation {
                earnings: EarningsProfile {
                    basic: dec!(20000),
                    ..Default::default()
                },
                ..Default::default()
            })
            .with_leave_balance(LeaveBalance::new(12, 0, 0));
        assert!(!store.register_employee(&raised).await.unwrap());

        let stored = EmployeeDirectory::get(&store, "E1").await.unwrap().unwrap();
        assert_eq!(stored.leave_balance.casual, 7);
        assert_eq!(stored.name, "Asha K");
        assert_eq!(stored.compensation.earnings.basic, dec!(20000));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rocksdb_concurrent_deductions_are_all_kept() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let employee = Employee::new("E1", "Asha").with_leave_balance(LeaveBalance::new(12, 0, 0));
        store.register_employee(&employee).await.unwrap();

        let mut handles = Vec::new();
        for days in [5, 3] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let deduction = LeaveDeduction {
                    leave_id: LeaveId::new_v4(),
                    leave_type: LeaveType::Casual,
                    days,
                    ordinal: 1,
                };
                store.deduct_leave_balance("E1", deduction).await.unwrap()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }

        let stored = EmployeeDirectory::get(&store, "E1").await.unwrap().unwrap();
        assert_eq!(stored.leave_balance.casual, 4);
        assert_eq!(stored.leave_balance.applied.len(), 2);

        let leave_id = *stored.leave_balance.applied.keys().next().unwrap();
        store.release_leave("E1", leave_id).await.unwrap();
        let stored = EmployeeDirectory::get(&store, "E1").await.unwrap().unwrap();
        assert_eq!(stored.leave_balance.applied.len(), 1);
        assert!(store.release_leave("E9", leave_id).await.unwrap().is_none());
    }
}
