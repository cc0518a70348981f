//! Student contact roster for the vCard generator.

use std::collections::HashMap;

use indexmap::IndexSet;
use thiserror::Error;

use crate::fields::{clean_field, split_quoted};
use crate::key::is_roll_number;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub name: String,
    /// Uppercase roll number, e.g. `24BC581`.
    pub roll: String,
    pub contact: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("roster is empty or contains no valid rows")]
    NoValidRows,
}

/// Students sorted by name, with lookup by roll number.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Roster {
    students: Vec<Student>,
    by_roll: HashMap<String, usize>,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn get(&self, roll: &str) -> Option<&Student> {
        self.by_roll.get(roll).map(|&idx| &self.students[idx])
    }
}

/// Parses `name,roll,contact` rows. Rows with a missing field or a malformed
/// roll number are skipped; a roster with no rows left is an error.
pub fn parse_roster(text: &str) -> Result<Roster, RosterError> {
    let mut students: Vec<Student> = text
        .lines()
        .filter_map(|line| {
            let fields = split_quoted(line);
            if fields.len() < 3 {
                return None;
            }
            let name = clean_field(fields[0]);
            let roll = clean_field(fields[1]).to_ascii_uppercase();
            let contact = clean_field(fields[2]);
            if name.is_empty() || contact.is_empty() || !is_roll_number(&roll) {
                return None;
            }
            Some(Student {
                name: name.to_string(),
                roll,
                contact: contact.to_string(),
            })
        })
        .collect();

    if students.is_empty() {
        return Err(RosterError::NoValidRows);
    }

    students.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    // A roll listed twice resolves to the row sorted last.
    let by_roll = students
        .iter()
        .enumerate()
        .map(|(idx, student)| (student.roll.clone(), idx))
        .collect();

    Ok(Roster { students, by_roll })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RollCheck {
    /// Matching students, once each, in first-pasted order.
    pub valid: Vec<Student>,
    pub invalid_or_not_found: IndexSet<String>,
    pub duplicate_lines: IndexSet<String>,
}

/// Classifies pasted roll numbers against the roster. Lines are trimmed and
/// uppercased before comparison.
pub fn check_pasted_rolls(text: &str, roster: &Roster) -> RollCheck {
    let mut check = RollCheck::default();
    let mut seen_lines = IndexSet::new();
    let mut seen_rolls = IndexSet::new();

    for line in text
        .lines()
        .map(|line| line.trim().to_ascii_uppercase())
        .filter(|line| !line.is_empty())
    {
        if !seen_lines.insert(line.clone()) {
            check.duplicate_lines.insert(line.clone());
        }
        match roster.get(&line).filter(|_| is_roll_number(&line)) {
            Some(student) => {
                if seen_rolls.insert(line) {
                    check.valid.push(student.clone());
                }
            }
            None => {
                check.invalid_or_not_found.insert(line);
            }
        }
    }

    check
}
