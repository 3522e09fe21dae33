#![allow(dead_code)]

use rand::seq::SliceRandom;
use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;

pub const EMPLOYEE_HEADER: &str = "id,name,basic,hra,special_allowance,travel_allowance,other_allowances,bonus,instead_due,pf_amount,tax_percent,casual,sick,earned";

/// Writes an employee CSV where every employee earns 30000 a month with a
/// 500 PF deduction and 10% tax.
pub fn write_employees(path: &Path, ids: &[&str], casual: u32) -> Result<(), Error> {
    let mut file = File::create(path)?;
    writeln!(file, "{}", EMPLOYEE_HEADER)?;
    for id in ids {
        writeln!(
            file,
            "{id},Employee {id},15000,6000,4000,1600,1400,1500,500,500,10,{casual},6,15"
        )?;
    }
    Ok(())
}

pub fn write_journal(path: &Path, lines: &[String]) -> Result<(), Error> {
    let mut file = File::create(path)?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    Ok(())
}

pub fn mark_day(employee: &str, date: &str, status: &str) -> String {
    format!(r#"{{"op":"mark_day","employee":"{employee}","date":"{date}","status":"{status}"}}"#)
}

/// Marks `present` days of June 2024 as present for each employee, in a
/// shuffled order interleaved across employees.
pub fn generate_shuffled_marks(employees: &[&str], present: u32) -> Vec<String> {
    let mut lines: Vec<String> = employees
        .iter()
        .flat_map(|employee| {
            (1..=present).map(move |day| mark_day(employee, &format!("2024-06-{:02}", day), "P"))
        })
        .collect();
    lines.shuffle(&mut rand::thread_rng());
    lines
}
