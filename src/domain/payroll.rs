use crate::domain::attendance::{AttendanceSummary, EmployeeId, YearMonth};
use crate::domain::employee::{Compensation, EarningsProfile, Employee};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Raw payroll figures at full precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayrollFigures {
    pub monthly_gross: Decimal,
    pub pro_rated_gross: Decimal,
    pub tax_amount: Decimal,
    pub net_payable: Decimal,
}

/// Pro-rates the monthly gross by attendance and applies tax and PF.
///
/// Net payable is not floored: large PF against few present days goes
/// negative.
pub fn calculate(compensation: &Compensation, attendance: AttendanceSummary) -> PayrollFigures {
    let monthly_gross = compensation.earnings.monthly_gross();
    let pro_rated_gross = if attendance.total_days > 0 {
        monthly_gross / Decimal::from(attendance.total_days)
            * Decimal::from(attendance.present_days)
    } else {
        Decimal::ZERO
    };
    let tax_amount = pro_rated_gross * (compensation.tax_percent / Decimal::ONE_HUNDRED);
    let net_payable = pro_rated_gross - tax_amount - compensation.pf_amount;

    PayrollFigures {
        monthly_gross,
        pro_rated_gross,
        tax_amount,
        net_payable,
    }
}

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deductions {
    pub tax_percent: Decimal,
    pub tax_amount: Decimal,
    pub pf_amount: Decimal,
}

/// Payroll snapshot for one employee and month.
///
/// Frozen at `computed_at`: later attendance edits do not change it until it
/// is explicitly recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payslip {
    pub employee_id: EmployeeId,
    pub month: YearMonth,
    pub earnings: EarningsProfile,
    pub deductions: Deductions,
    pub attendance: AttendanceSummary,
    pub monthly_gross: Decimal,
    /// Pro-rated gross for the month.
    pub gross_salary: Decimal,
    pub net_salary: Decimal,
    pub computed_at: DateTime<Utc>,
}

impl Payslip {
    pub fn compute(employee: &Employee, month: YearMonth, attendance: AttendanceSummary) -> Self {
        let compensation = &employee.compensation;
        let figures = calculate(compensation, attendance);
        Self {
            employee_id: employee.id.clone(),
            month,
            earnings: compensation.earnings.clone(),
            deductions: Deductions {
                tax_percent: compensation.tax_percent,
                tax_amount: money(figures.tax_amount),
                pf_amount: money(compensation.pf_amount),
            },
            attendance,
            monthly_gross: money(figures.monthly_gross),
            gross_salary: money(figures.pro_rated_gross),
            net_salary: money(figures.net_payable),
            computed_at: Utc::now(),
        }
    }
}
