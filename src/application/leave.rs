//! Leave requests and the approval cascade.
//!
//! Entering `Approved` (from any other status) runs, in this order:
//! 1. backfill every date of the request as `Absent` in the attendance ledger,
//! 2. deduct the inclusive day count from the matching leave balance,
//! 3. persist the new status and comment.
//!
//! Steps 1 and 2 are best effort: their failures are logged and reported but
//! never stop the status write. The sequence is safe to replay; a retried
//! approval that did not get its status persisted will not deduct again.

use crate::application::engine::{ReconciliationEngine, require_employee_id};
use crate::domain::attendance::{CaptureMetadata, DayEntry, DayStatus, VerificationMethod};
use crate::domain::leave::{
    BalanceOutcome, DateRange, LeaveBalance, LeaveId, LeaveRequest, LeaveStatus, LeaveType,
};
use crate::error::{ReconcileError, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

/// Side effects of one qualifying approval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeReport {
    pub days_written: u32,
    pub days_failed: u32,
    pub balance: BalanceOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionOutcome {
    pub request: LeaveRequest,
    /// Present only when the transition ran the approval cascade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascade: Option<CascadeReport>,
}

impl ReconciliationEngine {
    /// Files a new pending leave request, snapshotting the employee's name.
    pub async fn submit_leave(
        &self,
        employee_id: &str,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: &str,
    ) -> Result<LeaveRequest> {
        require_employee_id(employee_id)?;
        let range = DateRange::new(start_date, end_date)?;
        if reason.trim().is_empty() {
            return Err(ReconcileError::validation("leave reason is required"));
        }
        let employee = self
            .directories
            .employees
            .get(employee_id)
            .await?
            .ok_or_else(|| ReconcileError::not_found(format!("employee {}", employee_id)))?;

        let request =
            LeaveRequest::new(employee_id, employee.name, leave_type, range, reason.trim());
        if !employee.leave_balance.covers(leave_type, request.day_count()) {
            warn!(
                employee_id,
                leave_type = %leave_type,
                days = request.day_count(),
                remaining = ?employee.leave_balance.remaining(leave_type),
                "Leave request exceeds remaining balance"
            );
        }

        self.stores.leaves.store(request.clone()).await?;
        info!(employee_id, leave_id = %request.id, %start_date, %end_date, "Leave submitted");
        Ok(request)
    }

    pub async fn get_leave(&self, leave_id: LeaveId) -> Result<LeaveRequest> {
        self.stores
            .leaves
            .get(leave_id)
            .await?
            .ok_or_else(|| ReconcileError::not_found(format!("leave request {}", leave_id)))
    }

    /// Requests of one employee, oldest first.
    pub async fn list_leaves(&self, employee_id: &str) -> Result<Vec<LeaveRequest>> {
        require_employee_id(employee_id)?;
        self.stores.leaves.for_employee(employee_id).await
    }

    /// Moves a request to `Approved` or `Rejected`.
    ///
    /// The cascade runs whenever the previous status was not `Approved` and
    /// the new one is, so `Rejected -> Approved` runs it too. A `None`
    /// comment keeps the existing one.
    pub async fn transition_leave(
        &self,
        leave_id: LeaveId,
        new_status: LeaveStatus,
        comment: Option<String>,
    ) -> Result<TransitionOutcome> {
        if new_status == LeaveStatus::Pending {
            return Err(ReconcileError::validation(
                "a leave request cannot be moved back to pending",
            ));
        }
        let mut request = self.get_leave(leave_id).await?;
        let previous = request.status;

        let cascade = if previous.triggers_cascade(new_status) {
            let ordinal = request.approvals + 1;
            let report = self.run_approval_cascade(&request, ordinal).await;
            request.approvals = ordinal;
            Some(report)
        } else {
            None
        };

        request.status = new_status;
        if comment.is_some() {
            request.admin_comment = comment;
        }
        request.updated_at = Utc::now();
        self.stores.leaves.store(request.clone()).await?;

        info!(
            leave_id = %request.id,
            employee_id = %request.employee_id,
            from = ?previous,
            to = ?new_status,
            "Leave transitioned"
        );
        Ok(TransitionOutcome { request, cascade })
    }

    async fn run_approval_cascade(&self, request: &LeaveRequest, ordinal: u32) -> CascadeReport {
        let mut days_written = 0;
        let mut days_failed = 0;

        for (month, dates) in request.range().by_month() {
            for date in dates {
                let entry = DayEntry::with_metadata(
                    DayStatus::Absent,
                    CaptureMetadata {
                        method: Some(VerificationMethod::LeaveCascade),
                        ..Default::default()
                    },
                );
                match self
                    .stores
                    .attendance
                    .upsert_day(&request.employee_id, date, entry)
                    .await
                {
                    Ok(()) => days_written += 1,
                    Err(e) => {
                        error!(
                            error = %e,
                            leave_id = %request.id,
                            %date,
                            "Attendance backfill failed"
                        );
                        days_failed += 1;
                    }
                }
            }
            info!(leave_id = %request.id, %month, "Attendance backfilled");
        }

        let balance = self.deduct_balance(request, ordinal).await;
        CascadeReport {
            days_written,
            days_failed,
            balance,
        }
    }

    async fn deduct_balance(&self, request: &LeaveRequest, ordinal: u32) -> BalanceOutcome {
        let employee_id = request.employee_id.as_str();
        let deduction = request.deduction(ordinal);
        let outcome = match self
            .directories
            .employees
            .deduct_leave_balance(employee_id, deduction)
            .await
        {
            Ok(Some(outcome)) => outcome,
            Ok(None) => {
                warn!(
                    employee_id,
                    leave_id = %request.id,
                    "Employee missing, balance not deducted"
                );
                return BalanceOutcome::Skipped {
                    reason: format!("employee {} not found", employee_id),
                };
            }
            Err(e) => {
                warn!(
                    error = %e,
                    employee_id,
                    leave_id = %request.id,
                    "Balance deduction failed"
                );
                return BalanceOutcome::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        if let BalanceOutcome::Deducted { before, .. } = outcome
            && before < deduction.days
        {
            warn!(
                employee_id,
                leave_id = %request.id,
                days = deduction.days,
                remaining = before,
                "Approved leave exceeds balance, clamped at zero"
            );
        }
        outcome
    }

    /// Removes a request in any status. Attendance written and balance
    /// deducted by an earlier approval stay as they are; only the deduction
    /// marker of an approved request is dropped.
    pub async fn delete_leave(&self, leave_id: LeaveId) -> Result<()> {
        let request = self.get_leave(leave_id).await?;
        if !self.stores.leaves.delete(leave_id).await? {
            return Err(ReconcileError::not_found(format!("leave request {}", leave_id)));
        }
        info!(leave_id = %leave_id, "Leave deleted");

        if request.approvals > 0
            && let Err(e) = self
                .directories
                .employees
                .release_leave(&request.employee_id, leave_id)
                .await
        {
            warn!(
                error = %e,
                employee_id = %request.employee_id,
                leave_id = %leave_id,
                "Deduction marker not released"
            );
        }
        Ok(())
    }

    /// Direct admin edit of an employee's leave counters.
    pub async fn set_leave_balance(
        &self,
        employee_id: &str,
        casual: u32,
        sick: u32,
        earned: u32,
    ) -> Result<LeaveBalance> {
        require_employee_id(employee_id)?;
        let balance = self
            .directories
            .employees
            .set_leave_counters(employee_id, casual, sick, earned)
            .await?
            .ok_or_else(|| ReconcileError::not_found(format!("employee {}", employee_id)))?;
        info!(employee_id, casual, sick, earned, "Leave balance set");
        Ok(balance)
    }
}
