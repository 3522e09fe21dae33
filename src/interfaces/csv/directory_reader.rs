use crate::domain::employee::{Compensation, EarningsProfile, Employee};
use crate::domain::geofence::Location;
use crate::domain::leave::LeaveBalance;
use crate::error::{ReconcileError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One row of the employee seed file.
#[derive(Debug, Deserialize)]
struct EmployeeRow {
    id: String,
    name: String,
    basic: Decimal,
    hra: Decimal,
    special_allowance: Decimal,
    travel_allowance: Decimal,
    other_allowances: Decimal,
    bonus: Decimal,
    instead_due: Decimal,
    pf_amount: Decimal,
    tax_percent: Decimal,
    casual: u32,
    sick: u32,
    earned: u32,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee::new(row.id, row.name)
            .with_compensation(Compensation {
                earnings: EarningsProfile {
                    basic: row.basic,
                    hra: row.hra,
                    special_allowance: row.special_allowance,
                    travel_allowance: row.travel_allowance,
                    other_allowances: row.other_allowances,
                    bonus: row.bonus,
                    instead_due: row.instead_due,
                },
                pf_amount: row.pf_amount,
                tax_percent: row.tax_percent,
            })
            .with_leave_balance(LeaveBalance::new(row.casual, row.sick, row.earned))
    }
}

/// One row of the site-assignment seed file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SiteAssignment {
    pub employee_id: String,
    pub date: NaiveDate,
    pub location_id: String,
}

/// Reads directory seed data (employees, locations, site assignments) from
/// CSV.
///
/// Wraps `csv::Reader` with whitespace trimming; each accessor consumes the
/// reader and lazily yields validated records.
pub struct DirectoryReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> DirectoryReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    pub fn employees(self) -> impl Iterator<Item = Result<Employee>> {
        self.reader
            .into_deserialize::<EmployeeRow>()
            .map(|row| {
                let row = row?;
                if row.id.is_empty() {
                    return Err(ReconcileError::validation("employee id is required"));
                }
                Ok(Employee::from(row))
            })
    }

    /// Locations in file order, which is the order geofence matching uses.
    pub fn locations(self) -> impl Iterator<Item = Result<Location>> {
        self.reader
            .into_deserialize::<Location>()
            .map(|location| {
                let location = location?;
                location.point().validate()?;
                if location.radius_m.is_some_and(|r| !r.is_finite() || r <= 0.0) {
                    return Err(ReconcileError::validation(format!(
                        "location {} has an invalid radius",
                        location.id
                    )));
                }
                Ok(location)
            })
    }

    pub fn assignments(self) -> impl Iterator<Item = Result<SiteAssignment>> {
        self.reader
            .into_deserialize::<SiteAssignment>()
            .map(|row| row.map_err(ReconcileError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_employees() {
        let data = "id, name, basic, hra, special_allowance, travel_allowance, other_allowances, bonus, instead_due, pf_amount, tax_percent, casual, sick, earned\n\
                    E1, Asha Rao, 15000, 6000, 4000, 1600, 1400, 1500, 500, 500, 10, 12, 6, 15";
        let employees: Vec<Result<Employee>> =
            DirectoryReader::new(data.as_bytes()).employees().collect();

        assert_eq!(employees.len(), 1);
        let employee = employees[0].as_ref().unwrap();
        assert_eq!(employee.id, "E1");
        assert_eq!(employee.name, "Asha Rao");
        assert_eq!(employee.compensation.earnings.monthly_gross(), dec!(30000));
        assert_eq!(employee.compensation.tax_percent, dec!(10));
        assert_eq!(employee.leave_balance, LeaveBalance::new(12, 6, 15));
    }

    #[test]
    fn test_reader_malformed_employee() {
        let data = "id, name, basic, hra, special_allowance, travel_allowance, other_allowances, bonus, instead_due, pf_amount, tax_percent, casual, sick, earned\n\
                    E1, Asha, lots, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0";
        let employees: Vec<Result<Employee>> =
            DirectoryReader::new(data.as_bytes()).employees().collect();
        assert!(employees[0].is_err());
    }

    #[test]
    fn test_reader_locations_keep_file_order() {
        let data = "id, name, lat, lon, radius_m\n\
                    B, Branch, 12.9, 77.5, 250\n\
                    HQ, Head Office, 12.97, 77.59,";
        let locations: Vec<Location> = DirectoryReader::new(data.as_bytes())
            .locations()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(locations[0].id, "B");
        assert_eq!(locations[0].radius_m, Some(250.0));
        assert_eq!(locations[1].id, "HQ");
        assert_eq!(locations[1].radius_m, None);
    }

    #[test]
    fn test_reader_rejects_out_of_range_location() {
        let data = "id, name, lat, lon, radius_m\nX, Nowhere, 123.0, 0.0, 100";
        let locations: Vec<Result<Location>> =
            DirectoryReader::new(data.as_bytes()).locations().collect();
        assert!(matches!(locations[0], Err(ReconcileError::ValidationError(_))));
    }

    #[test]
    fn test_reader_assignments() {
        let data = "employee_id, date, location_id\nE1, 2024-03-04, HQ";
        let assignments: Vec<SiteAssignment> = DirectoryReader::new(data.as_bytes())
            .assignments()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(assignments[0].location_id, "HQ");
        assert_eq!(
            assignments[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
        );
    }
}
