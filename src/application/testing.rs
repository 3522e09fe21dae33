use crate::application::engine::ReconciliationEngine;
use crate::config::EngineConfig;
use crate::domain::attendance::parse_date;
use crate::domain::employee::{Compensation, EarningsProfile, Employee};
use crate::domain::geofence::{EARTH_RADIUS_M, GeoPoint, Location};
use crate::domain::leave::LeaveBalance;
use crate::domain::ports::{Directories, Stores};
use crate::infrastructure::in_memory::{
    InMemoryAttendanceStore, InMemoryEmployeeDirectory, InMemoryLeaveStore,
    InMemoryLocationDirectory, InMemoryPayslipStore, InMemorySiteAssignments,
};
use chrono::NaiveDate;
use rust_decimal_macros::dec;

pub const HQ: GeoPoint = GeoPoint {
    lat: 12.9716,
    lon: 77.5946,
};

pub fn date(s: &str) -> NaiveDate {
    parse_date(s).unwrap()
}

pub fn north_of(from: GeoPoint, meters: f64) -> GeoPoint {
    GeoPoint {
        lat: from.lat + (meters / EARTH_RADIUS_M).to_degrees(),
        lon: from.lon,
    }
}

/// Employee earning 30000 a month, 10% tax, 500 PF, with `casual` days of
/// casual leave and 6 sick / 15 earned.
pub fn employee(id: &str, casual: u32) -> Employee {
    Employee::new(id, format!("Employee {}", id))
        .with_compensation(Compensation {
            earnings: EarningsProfile {
                basic: dec!(15000),
                hra: dec!(6000),
                special_allowance: dec!(4000),
                travel_allowance: dec!(1600),
                other_allowances: dec!(1400),
                bonus: dec!(1500),
                instead_due: dec!(500),
            },
            pf_amount: dec!(500),
            tax_percent: dec!(10),
        })
        .with_leave_balance(LeaveBalance::new(casual, 6, 15))
}

pub fn head_office() -> Location {
    Location {
        id: "HQ".to_string(),
        name: "Head Office".to_string(),
        lat: HQ.lat,
        lon: HQ.lon,
        radius_m: Some(100.0),
    }
}

/// An engine over in-memory ports, with handles kept for inspection.
pub struct Harness {
    pub engine: ReconciliationEngine,
    pub attendance: InMemoryAttendanceStore,
    pub leaves: InMemoryLeaveStore,
    pub employees: InMemoryEmployeeDirectory,
    pub assignments: InMemorySiteAssignments,
}

impl Harness {
    pub async fn new(employees: Vec<Employee>) -> Self {
        Self::with_locations(employees, vec![head_office()]).await
    }

    pub async fn with_locations(employees: Vec<Employee>, locations: Vec<Location>) -> Self {
        let attendance = InMemoryAttendanceStore::new();
        let leaves = InMemoryLeaveStore::new();
        let directory = InMemoryEmployeeDirectory::new();
        let assignments = InMemorySiteAssignments::new();

        for employee in employees {
            directory.insert(employee).await;
        }

        let engine = ReconciliationEngine::new(
            Stores {
                attendance: Box::new(attendance.clone()),
                leaves: Box::new(leaves.clone()),
                payslips: Box::new(InMemoryPayslipStore::new()),
            },
            Directories {
                employees: Box::new(directory.clone()),
                locations: Box::new(InMemoryLocationDirectory::new(locations)),
                assignments: Box::new(assignments.clone()),
            },
            EngineConfig::default(),
        );

        Self {
            engine,
            attendance,
            leaves,
            employees: directory,
            assignments,
        }
    }

    pub async fn casual_balance(&self, employee_id: &str) -> u32 {
        use crate::domain::ports::EmployeeDirectory;
        self.employees
            .get(employee_id)
            .await
            .unwrap()
            .unwrap()
            .leave_balance
            .casual
    }
}
