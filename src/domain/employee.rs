use crate::domain::attendance::EmployeeId;
use crate::domain::leave::LeaveBalance;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Monthly earning components of an employee's compensation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EarningsProfile {
    pub basic: Decimal,
    pub hra: Decimal,
    pub special_allowance: Decimal,
    pub travel_allowance: Decimal,
    pub other_allowances: Decimal,
    pub bonus: Decimal,
    pub instead_due: Decimal,
}

impl EarningsProfile {
    /// Sum of all earning components for a full month.
    pub fn monthly_gross(&self) -> Decimal {
        self.basic
            + self.hra
            + self.special_allowance
            + self.travel_allowance
            + self.other_allowances
            + self.bonus
            + self.instead_due
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Compensation {
    pub earnings: EarningsProfile,
    /// Flat provident fund deduction per month.
    pub pf_amount: Decimal,
    /// Income tax as a percentage of pro-rated gross, e.g. `10` for 10%.
    pub tax_percent: Decimal,
}

/// The slice of the employee aggregate this engine reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub compensation: Compensation,
    pub leave_balance: LeaveBalance,
}

impl Employee {
    pub fn new(id: impl Into<EmployeeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            compensation: Compensation::default(),
            leave_balance: LeaveBalance::default(),
        }
    }

    pub fn with_compensation(mut self, compensation: Compensation) -> Self {
        self.compensation = compensation;
        self
    }

    pub fn with_leave_balance(mut self, balance: LeaveBalance) -> Self {
        self.leave_balance = balance;
        self
    }
}
