use crate::domain::attendance::{CaptureMetadata, VerificationMethod};
use serde::Deserialize;

/// One journal line. Dates, months, statuses and leave types stay textual
/// here and are validated when the command is executed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    MarkDay {
        employee: String,
        date: String,
        status: String,
        #[serde(default)]
        metadata: Option<CaptureMetadata>,
    },
    GetMonth {
        employee: String,
        month: String,
    },
    AttendanceSummary {
        employee: String,
        month: String,
    },
    EvaluatePosition {
        employee: String,
        date: String,
        lat: f64,
        lon: f64,
    },
    CheckIn {
        employee: String,
        date: String,
        lat: f64,
        lon: f64,
        #[serde(default)]
        method: Option<VerificationMethod>,
    },
    SubmitLeave {
        employee: String,
        leave_type: String,
        start: String,
        end: String,
        #[serde(default)]
        reason: String,
        /// Journal-local label later lines can use instead of the generated id.
        #[serde(default, rename = "ref")]
        reference: Option<String>,
    },
    TransitionLeave {
        /// Generated id or a `ref` given at submission.
        leave: String,
        status: String,
        #[serde(default)]
        comment: Option<String>,
    },
    DeleteLeave {
        leave: String,
    },
    ListLeaves {
        employee: String,
    },
    SetLeaveBalance {
        employee: String,
        casual: u32,
        sick: u32,
        earned: u32,
    },
    ComputePayslip {
        employee: String,
        month: String,
    },
    GetPayslip {
        employee: String,
        month: String,
    },
}

impl Command {
    pub fn op(&self) -> &'static str {
        match self {
            Command::MarkDay { .. } => "mark_day",
            Command::GetMonth { .. } => "get_month",
            Command::AttendanceSummary { .. } => "attendance_summary",
            Command::EvaluatePosition { .. } => "evaluate_position",
            Command::CheckIn { .. } => "check_in",
            Command::SubmitLeave { .. } => "submit_leave",
            Command::TransitionLeave { .. } => "transition_leave",
            Command::DeleteLeave { .. } => "delete_leave",
            Command::ListLeaves { .. } => "list_leaves",
            Command::SetLeaveBalance { .. } => "set_leave_balance",
            Command::ComputePayslip { .. } => "compute_payslip",
            Command::GetPayslip { .. } => "get_payslip",
        }
    }
}
