use super::command::Command;
use crate::application::engine::ReconciliationEngine;
use crate::domain::attendance::{DayStatus, VerificationMethod, YearMonth, parse_date};
use crate::domain::leave::{LeaveId, LeaveStatus, LeaveType};
use crate::error::{ReconcileError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Replays journal commands against an engine.
///
/// Keeps the `ref` labels given to submitted leaves so later lines can
/// address a request without knowing its generated id.
pub struct JournalRunner<'a> {
    engine: &'a ReconciliationEngine,
    references: HashMap<String, LeaveId>,
}

impl<'a> JournalRunner<'a> {
    pub fn new(engine: &'a ReconciliationEngine) -> Self {
        Self {
            engine,
            references: HashMap::new(),
        }
    }

    fn resolve_leave(&self, leave: &str) -> Result<LeaveId> {
        if let Some(id) = self.references.get(leave) {
            return Ok(*id);
        }
        LeaveId::parse_str(leave)
            .map_err(|_| ReconcileError::not_found(format!("leave reference '{}'", leave)))
    }

    pub async fn execute(&mut self, command: Command) -> Result<Value> {
        debug!(op = command.op(), "Executing command");
        match command {
            Command::MarkDay {
                employee,
                date,
                status,
                metadata,
            } => {
                let date = parse_date(&date)?;
                let status: DayStatus = status.parse()?;
                self.engine.mark_day(&employee, date, status, metadata).await?;
                to_value(status)
            }
            Command::GetMonth { employee, month } => {
                let month: YearMonth = month.parse()?;
                to_value(self.engine.get_month(&employee, month).await?)
            }
            Command::AttendanceSummary { employee, month } => {
                let month: YearMonth = month.parse()?;
                to_value(self.engine.attendance_summary(&employee, month).await?)
            }
            Command::EvaluatePosition {
                employee,
                date,
                lat,
                lon,
            } => {
                let date = parse_date(&date)?;
                to_value(self.engine.evaluate_position(&employee, date, lat, lon).await?)
            }
            Command::CheckIn {
                employee,
                date,
                lat,
                lon,
                method,
            } => {
                let date = parse_date(&date)?;
                let method = method.unwrap_or(VerificationMethod::Geofence);
                to_value(self.engine.check_in(&employee, date, lat, lon, method).await?)
            }
            Command::SubmitLeave {
                employee,
                leave_type,
                start,
                end,
                reason,
                reference,
            } => {
                let leave_type: LeaveType = leave_type.parse()?;
                let start = parse_date(&start)?;
                let end = parse_date(&end)?;
                let request = self
                    .engine
                    .submit_leave(&employee, leave_type, start, end, &reason)
                    .await?;
                if let Some(reference) = reference {
                    self.references.insert(reference, request.id);
                }
                to_value(request)
            }
            Command::TransitionLeave {
                leave,
                status,
                comment,
            } => {
                let id = self.resolve_leave(&leave)?;
                let status: LeaveStatus = status.parse()?;
                to_value(self.engine.transition_leave(id, status, comment).await?)
            }
            Command::DeleteLeave { leave } => {
                let id = self.resolve_leave(&leave)?;
                self.engine.delete_leave(id).await?;
                Ok(Value::Null)
            }
            Command::ListLeaves { employee } => to_value(self.engine.list_leaves(&employee).await?),
            Command::SetLeaveBalance {
                employee,
                casual,
                sick,
                earned,
            } => to_value(
                self.engine
                    .set_leave_balance(&employee, casual, sick, earned)
                    .await?,
            ),
            Command::ComputePayslip { employee, month } => {
                let month: YearMonth = month.parse()?;
                to_value(self.engine.compute_payslip(&employee, month).await?)
            }
            Command::GetPayslip { employee, month } => {
                let month: YearMonth = month.parse()?;
                to_value(self.engine.get_payslip(&employee, month).await?)
            }
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{Harness, employee};

    fn command(line: &str) -> Command {
        serde_json::from_str(line).unwrap()
    }

    #[tokio::test]
    async fn test_reference_resolves_submitted_leave() {
        let h = Harness::new(vec![employee("E1", 12)]).await;
        let mut runner = JournalRunner::new(&h.engine);

        runner
            .execute(command(
                r#"{"op":"submit_leave","employee":"E1","leave_type":"casual","start":"2024-01-30","end":"2024-02-02","reason":"family visit","ref":"trip"}"#,
            ))
            .await
            .unwrap();
        let outcome = runner
            .execute(command(
                r#"{"op":"transition_leave","leave":"trip","status":"approved"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(outcome["request"]["status"], "Approved");
        assert_eq!(outcome["cascade"]["days_written"], 4);
        assert_eq!(h.casual_balance("E1").await, 8);
    }

    #[tokio::test]
    async fn test_unknown_reference_is_not_found() {
        let h = Harness::new(vec![employee("E1", 12)]).await;
        let mut runner = JournalRunner::new(&h.engine);

        let result = runner
            .execute(command(r#"{"op":"delete_leave","leave":"nope"}"#))
            .await;
        assert!(matches!(result, Err(ReconcileError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_bad_status_is_validation_error() {
        let h = Harness::new(vec![employee("E1", 12)]).await;
        let mut runner = JournalRunner::new(&h.engine);

        let result = runner
            .execute(command(
                r#"{"op":"mark_day","employee":"E1","date":"2024-03-04","status":"X"}"#,
            ))
            .await;
        assert!(matches!(result, Err(ReconcileError::ValidationError(_))));

        let result = runner
            .execute(command(
                r#"{"op":"mark_day","employee":"E1","date":"2024-02-30","status":"P"}"#,
            ))
            .await;
        assert!(matches!(result, Err(ReconcileError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_missing_payslip_is_null() {
        let h = Harness::new(vec![employee("E1", 12)]).await;
        let mut runner = JournalRunner::new(&h.engine);

        let value = runner
            .execute(command(
                r#"{"op":"get_payslip","employee":"E1","month":"2024-03"}"#,
            ))
            .await
            .unwrap();
        assert!(value.is_null());
    }
}
