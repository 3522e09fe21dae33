use crate::config::EngineConfig;
use crate::domain::attendance::{
    AttendanceKey, AttendanceRecord, AttendanceSummary, CaptureMetadata, DayEntry, DayStatus,
    VerificationMethod, YearMonth,
};
use crate::domain::geofence::{self, Candidates, GeoPoint, PositionDecision};
use crate::domain::payroll::Payslip;
use crate::domain::ports::{Directories, Stores};
use crate::error::{ReconcileError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// The main entry point of the reconciliation core.
///
/// `ReconciliationEngine` owns the attendance, leave and payslip ledgers and
/// reads the employee, location and site-assignment directories. Every
/// operation takes its employee, date or month explicitly; there is no
/// selected "current" period.
pub struct ReconciliationEngine {
    pub(crate) stores: Stores,
    pub(crate) directories: Directories,
    pub(crate) config: EngineConfig,
}

pub(crate) fn require_employee_id(employee_id: &str) -> Result<()> {
    if employee_id.trim().is_empty() {
        return Err(ReconcileError::validation("employee id is required"));
    }
    Ok(())
}

impl ReconciliationEngine {
    /// Creates a new `ReconciliationEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `stores` - The ledgers written by the engine.
    /// * `directories` - Employee, location and assignment reference data.
    /// * `config` - Engine tunables.
    pub fn new(stores: Stores, directories: Directories, config: EngineConfig) -> Self {
        Self {
            stores,
            directories,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Sets or overwrites the attendance entry of one day.
    pub async fn mark_day(
        &self,
        employee_id: &str,
        date: NaiveDate,
        status: DayStatus,
        metadata: Option<CaptureMetadata>,
    ) -> Result<()> {
        require_employee_id(employee_id)?;
        if let Some(metadata) = &metadata {
            metadata.validate()?;
        }

        self.stores
            .attendance
            .upsert_day(employee_id, date, DayEntry { status, metadata })
            .await?;
        debug!(employee_id, %date, ?status, "Day marked");
        Ok(())
    }

    /// Stored attendance of a month, or an empty record when nothing is stored.
    pub async fn attendance_record(
        &self,
        employee_id: &str,
        month: YearMonth,
    ) -> Result<AttendanceRecord> {
        require_employee_id(employee_id)?;
        let key = AttendanceKey::new(employee_id, month);
        Ok(self
            .stores
            .attendance
            .get(&key)
            .await?
            .unwrap_or_else(|| AttendanceRecord::new(employee_id, month)))
    }

    /// Month view with default-day synthesis applied. Nothing is written.
    pub async fn get_month(
        &self,
        employee_id: &str,
        month: YearMonth,
    ) -> Result<BTreeMap<NaiveDate, DayStatus>> {
        Ok(self.attendance_record(employee_id, month).await?.month_view())
    }

    pub async fn attendance_summary(
        &self,
        employee_id: &str,
        month: YearMonth,
    ) -> Result<AttendanceSummary> {
        Ok(self.attendance_record(employee_id, month).await?.summary())
    }

    /// Evaluates a claimed position against the employee's site assignment
    /// for `date`, or against every registered location when unassigned.
    pub async fn evaluate_position(
        &self,
        employee_id: &str,
        date: NaiveDate,
        lat: f64,
        lon: f64,
    ) -> Result<PositionDecision> {
        require_employee_id(employee_id)?;
        let claim = GeoPoint::new(lat, lon)?;
        let radius = self.config.default_radius_m;

        let assigned = self
            .directories
            .assignments
            .assigned_location(employee_id, date)
            .await?;

        let decision = match assigned {
            Some(location_id) => {
                let location = self
                    .directories
                    .locations
                    .get(&location_id)
                    .await?
                    .ok_or_else(|| ReconcileError::not_found(format!("location {}", location_id)))?;
                geofence::evaluate(claim, Candidates::Assigned(&location), radius)
            }
            None => {
                let locations = self.directories.locations.all().await?;
                geofence::evaluate(claim, Candidates::Any(&locations), radius)
            }
        };

        debug!(
            employee_id,
            %date,
            admitted = decision.admitted,
            distance_meters = ?decision.distance_meters,
            "Position evaluated"
        );
        Ok(decision)
    }

    /// Self-service check-in: marks the day `Present` when the position is
    /// admitted by the geofence, recording where and how it was captured.
    pub async fn check_in(
        &self,
        employee_id: &str,
        date: NaiveDate,
        lat: f64,
        lon: f64,
        method: VerificationMethod,
    ) -> Result<PositionDecision> {
        let decision = self.evaluate_position(employee_id, date, lat, lon).await?;
        if !decision.admitted {
            let detail = match &decision.nearest_candidate {
                Some(nearest) => format!(
                    "nearest site '{}' is {:.0} m away",
                    nearest.site_name, nearest.distance_meters
                ),
                None => "no registered locations".to_string(),
            };
            warn!(employee_id, %date, %detail, "Check-in outside geofence");
            return Err(ReconcileError::PositionRejected(detail));
        }

        let metadata = CaptureMetadata {
            method: Some(method),
            geolocation: Some(GeoPoint { lat, lon }),
            site_name: decision.matched_site_name.clone(),
        };
        self.mark_day(employee_id, date, DayStatus::Present, Some(metadata))
            .await?;
        info!(employee_id, %date, site = ?decision.matched_site_name, "Checked in");
        Ok(decision)
    }

    /// Computes and stores the payslip snapshot for a month.
    ///
    /// The snapshot reflects attendance at the time of the call and replaces
    /// any earlier one for the same month. It is not refreshed by later
    /// attendance edits.
    pub async fn compute_payslip(&self, employee_id: &str, month: YearMonth) -> Result<Payslip> {
        require_employee_id(employee_id)?;
        let employee = self
            .directories
            .employees
            .get(employee_id)
            .await?
            .ok_or_else(|| ReconcileError::not_found(format!("employee {}", employee_id)))?;
        let summary = self.attendance_summary(employee_id, month).await?;

        let payslip = Payslip::compute(&employee, month, summary);
        self.stores.payslips.store(payslip.clone()).await?;

        info!(
            employee_id,
            %month,
            present_days = summary.present_days,
            total_days = summary.total_days,
            net_salary = %payslip.net_salary,
            "Payslip computed"
        );
        Ok(payslip)
    }

    pub async fn get_payslip(
        &self,
        employee_id: &str,
        month: YearMonth,
    ) -> Result<Option<Payslip>> {
        require_employee_id(employee_id)?;
        self.stores.payslips.get(employee_id, month).await
    }
}
