//! Synthetic user data.
//!
//! [`UserGenerator`] yields rows with the `users` schema the analyzer is
//! usually pointed at. Output is reproducible: one seed, one sequence.

use std::path::Path;

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;
use tracing::info;

use crate::error::{ReportError, Result};

/// Inclusive salary bounds.
pub const SALARY_RANGE: std::ops::RangeInclusive<u32> = 850..=3500;

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Charles", "Karen", "Daniel", "Nancy", "Matthew", "Lisa", "Anthony", "Betty",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White",
];

const CITIES: &[&str] = &[
    "Bratislava", "Kosice", "Presov", "Zilina", "Nitra", "Banska Bystrica", "Trnava", "Trencin",
    "Martin", "Poprad", "Prague", "Brno", "Vienna", "Budapest",
];

const OCCUPATIONS: &[&str] = &[
    "Software engineer", "Accountant", "Nurse", "Teacher", "Electrician", "Chef",
    "Data analyst", "Pharmacist", "Civil engineer", "Sales manager", "Graphic designer",
    "Police officer", "Architect", "Librarian", "Mechanic", "Journalist",
];

/// One generated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub occupation: String,
    pub salary: u32,
}

/// Seeded generator of [`UserRecord`]s, ids counting from 1.
///
/// ```
/// use u_report::generator::UserGenerator;
///
/// let a: Vec<_> = UserGenerator::new(7).take(3).collect();
/// let b: Vec<_> = UserGenerator::new(7).take(3).collect();
/// assert_eq!(a, b);
/// assert_eq!(a[2].id, 3);
/// ```
#[derive(Debug, Clone)]
pub struct UserGenerator {
    rng: Pcg32,
    next_id: u64,
}

impl UserGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    fn pick(&mut self, values: &[&str]) -> String {
        values.choose(&mut self.rng).copied().unwrap_or_default().to_string()
    }
}

impl Iterator for UserGenerator {
    type Item = UserRecord;

    fn next(&mut self) -> Option<UserRecord> {
        let id = self.next_id;
        self.next_id += 1;
        Some(UserRecord {
            id,
            first_name: self.pick(FIRST_NAMES),
            last_name: self.pick(LAST_NAMES),
            city: self.pick(CITIES),
            occupation: self.pick(OCCUPATIONS),
            salary: self.rng.random_range(SALARY_RANGE),
        })
    }
}

/// Writes `rows` generated users to `path` as CSV and returns the row count.
pub fn write_users_csv(path: &Path, rows: usize, seed: u64) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    if rows == 0 {
        // serde writes the header with the first record only.
        writer.write_record([
            "id",
            "first_name",
            "last_name",
            "city",
            "occupation",
            "salary",
        ])?;
    }
    for record in UserGenerator::new(seed).take(rows) {
        writer.serialize(record)?;
    }
    writer
        .flush()
        .map_err(|e| ReportError::io(path, e))?;

    info!(rows, seed, path = %path.display(), "synthetic users written");
    Ok(rows)
}
