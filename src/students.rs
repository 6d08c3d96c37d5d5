//! Student records and their collection.
//!
//! On disk each record is one line `roll,name,marks` with marks printed to
//! two decimals, e.g. `12,Ada Lovelace,91.50`.

use crate::error::{Result, RosterError};
use crate::store::{FlatFile, LineCodec, Records, Rewrite, RewriteSummary};
use std::path::{Path, PathBuf};

pub const MAX_NAME_LEN: usize = 49;
pub const MIN_MARKS: f64 = 0.0;
pub const MAX_MARKS: f64 = 100.0;

/// One student entry. The roll number is fixed once the record exists.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    roll: i32,
    name: String,
    marks: f64,
}

impl StudentRecord {
    /// Build a validated record. The name is trimmed and marks are rounded
    /// to the two decimals the file keeps.
    pub fn new(roll: i32, name: &str, marks: f64) -> Result<Self> {
        Ok(Self {
            roll,
            name: validate_name(name)?,
            marks: validate_marks(marks)?,
        })
    }

    pub fn roll(&self) -> i32 {
        self.roll
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn marks(&self) -> f64 {
        self.marks
    }
}

pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RosterError::validation("name", "Name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(RosterError::validation(
            "name",
            format!("Name must be at most {} characters", MAX_NAME_LEN),
        ));
    }
    if name.contains([',', '\n', '\r']) {
        return Err(RosterError::validation(
            "name",
            "Name must not contain commas or line breaks",
        ));
    }
    Ok(name.to_string())
}

pub fn validate_marks(marks: f64) -> Result<f64> {
    if !marks.is_finite() || !(MIN_MARKS..=MAX_MARKS).contains(&marks) {
        return Err(RosterError::validation(
            "marks",
            format!("Marks must be between {} and {}", MIN_MARKS, MAX_MARKS),
        ));
    }
    Ok((marks * 100.0).round() / 100.0)
}

pub struct StudentCodec;

impl LineCodec for StudentCodec {
    type Item = StudentRecord;

    fn encode(item: &StudentRecord) -> String {
        format!("{},{},{:.2}", item.roll, item.name, item.marks)
    }

    /// Split at the first and last comma so older files whose names
    /// contain a comma still load.
    fn decode(line: &str) -> Option<StudentRecord> {
        let (roll, rest) = line.split_once(',')?;
        let (name, marks) = rest.rsplit_once(',')?;
        Some(StudentRecord {
            roll: roll.trim().parse().ok()?,
            name: name.to_string(),
            marks: marks.trim().parse().ok()?,
        })
    }
}

/// The student collection
pub struct StudentStore {
    file: FlatFile<StudentCodec>,
}

impl StudentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: FlatFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn append(&self, record: &StudentRecord) -> Result<()> {
        self.file.append(record)
    }

    pub fn list_all(&self) -> Result<Records<StudentCodec>> {
        self.file.list_all()
    }

    /// First record in storage order with this roll number
    pub fn find_by_roll(&self, roll: i32) -> Result<Option<StudentRecord>> {
        for record in self.list_all()? {
            let record = record?;
            if record.roll == roll {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    pub fn rewrite_all<F>(&self, transform: F) -> Result<RewriteSummary>
    where
        F: FnMut(StudentRecord) -> Rewrite<StudentRecord>,
    {
        self.file.rewrite_all(transform)
    }

    /// Replace the first record with `roll`. Returns whether one matched.
    pub fn replace_first(&self, roll: i32, replacement: StudentRecord) -> Result<bool> {
        let mut replacement = Some(replacement);
        let summary = self.rewrite_all(|record| match replacement.take() {
            Some(new) if record.roll == roll => Rewrite::Replace(new),
            pending => {
                replacement = pending;
                Rewrite::Keep(record)
            }
        })?;
        Ok(summary.replaced > 0)
    }

    /// Remove the first record with `roll`. Returns whether one matched.
    pub fn delete_first(&self, roll: i32) -> Result<bool> {
        let mut done = false;
        let summary = self.rewrite_all(|record| {
            if !done && record.roll == roll {
                done = true;
                Rewrite::Delete
            } else {
                Rewrite::Keep(record)
            }
        })?;
        Ok(summary.deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn record(roll: i32, name: &str, marks: f64) -> StudentRecord {
        StudentRecord::new(roll, name, marks).unwrap()
    }

    fn seeded(dir: &TempDir) -> StudentStore {
        let store = StudentStore::new(dir.path().join("students.txt"));
        store.append(&record(1, "Ada", 91.5)).unwrap();
        store.append(&record(2, "Brian", 72.25)).unwrap();
        store.append(&record(3, "Chen", 64.0)).unwrap();
        store
    }

    fn rolls(store: &StudentStore) -> Vec<i32> {
        store
            .list_all()
            .unwrap()
            .map(|r| r.unwrap().roll())
            .collect()
    }

    #[test]
    fn test_encode_two_decimals() {
        assert_eq!(StudentCodec::encode(&record(5, "A", 0.0)), "5,A,0.00");
        assert_eq!(StudentCodec::encode(&record(6, "B C", 99.5)), "6,B C,99.50");
    }

    #[test]
    fn test_decode_legacy_comma_in_name() {
        let rec = StudentCodec::decode("4,Doe, Jane,88.00").unwrap();
        assert_eq!(rec.roll(), 4);
        assert_eq!(rec.name(), "Doe, Jane");
        assert_eq!(rec.marks(), 88.0);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(StudentCodec::decode("abc").is_none());
        assert!(StudentCodec::decode("x,Name,50").is_none());
        assert!(StudentCodec::decode("1,Name").is_none());
    }

    #[test]
    fn test_marks_boundaries() {
        assert!(StudentRecord::new(5, "A", 0.0).is_ok());
        assert!(StudentRecord::new(5, "A", 100.0).is_ok());
        assert!(StudentRecord::new(5, "A", -0.01).is_err());
        assert!(StudentRecord::new(5, "A", 100.01).is_err());
        assert!(StudentRecord::new(5, "A", f64::NAN).is_err());
    }

    #[test]
    fn test_marks_rounded_to_stored_precision() {
        assert_eq!(record(1, "A", 66.666).marks(), 66.67);
    }

    #[test]
    fn test_name_validation() {
        assert!(StudentRecord::new(1, "   ", 10.0).is_err());
        assert!(StudentRecord::new(1, "Doe, Jane", 10.0).is_err());
        assert!(StudentRecord::new(1, &"x".repeat(MAX_NAME_LEN + 1), 10.0).is_err());
        assert_eq!(record(1, "  Padded  ", 10.0).name(), "Padded");
        assert!(StudentRecord::new(1, &"x".repeat(MAX_NAME_LEN), 10.0).is_ok());
    }

    #[test]
    fn test_round_trip_through_store() {
        let dir = TempDir::new().unwrap();
        let store = StudentStore::new(dir.path().join("students.txt"));
        let rec = record(42, "Grace Hopper", 97.25);
        store.append(&rec).unwrap();

        let all: Vec<_> = store.list_all().unwrap().map(|r| r.unwrap()).collect();
        assert!(all.contains(&rec));
    }

    #[test]
    fn test_append_to_hand_edited_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.txt");
        fs::write(&path, "1,Ada,91.50").unwrap();
        let store = StudentStore::new(&path);

        let rec = record(2, "Bo", 50.0);
        store.append(&rec).unwrap();

        let all: Vec<_> = store.list_all().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(all, vec![record(1, "Ada", 91.5), rec]);
    }

    #[test]
    fn test_find_by_roll_first_match() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir);
        store.append(&record(2, "Second Brian", 10.0)).unwrap();

        let found = store.find_by_roll(2).unwrap().unwrap();
        assert_eq!(found.name(), "Brian");
        assert!(store.find_by_roll(99).unwrap().is_none());
    }

    #[test]
    fn test_replace_first_targets_one_record() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir);
        let lines_before: Vec<String> = fs::read_to_string(store.path())
            .unwrap()
            .lines()
            .map(String::from)
            .collect();

        assert!(store.replace_first(2, record(2, "X", 50.0)).unwrap());

        let lines_after: Vec<String> = fs::read_to_string(store.path())
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        assert_eq!(lines_after[0], lines_before[0]);
        assert_eq!(lines_after[1], "2,X,50.00");
        assert_eq!(lines_after[2], lines_before[2]);
    }

    #[test]
    fn test_replace_first_leaves_later_duplicates() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir);
        store.append(&record(2, "Dup", 1.0)).unwrap();

        assert!(store.replace_first(2, record(2, "X", 50.0)).unwrap());

        let names: Vec<String> = store
            .list_all()
            .unwrap()
            .map(|r| r.unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["Ada", "X", "Chen", "Dup"]);
    }

    #[test]
    fn test_delete_first() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir);

        assert!(store.delete_first(2).unwrap());
        assert_eq!(rolls(&store), vec![1, 3]);
    }

    #[test]
    fn test_missing_roll_leaves_store_identical() {
        let dir = TempDir::new().unwrap();
        let store = seeded(&dir);
        let before = fs::read(store.path()).unwrap();

        assert!(!store.delete_first(9).unwrap());
        assert!(!store.replace_first(9, record(9, "Nobody", 1.0)).unwrap());
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }
}
