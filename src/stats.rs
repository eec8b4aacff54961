use std::collections::HashSet;

use crate::roster::Student;

/// Canonical order of the academic levels.
pub const LEVEL_ORDER: [&str; 7] = [
    "تمهيدي",
    "الأول",
    "الثاني",
    "الثالث",
    "الرابع",
    "الخامس",
    "السادس",
];

/// Level under which students with an empty level are counted.
pub const UNSPECIFIED_LEVEL: &str = "غير محدد";

/// Dashboard figures computed over a set of students.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterStats {
    pub total: usize,
    /// Number of distinct nationalities, the empty one included
    pub nationalities: usize,
    pub paid: usize,
    /// Number of distinct teachers, the empty one included
    pub teachers: usize,
    /// Student count per level: every level of [`LEVEL_ORDER`] first, even
    /// when empty, then the other ones in order of appearance.
    pub levels: Vec<(String, usize)>,
}

impl RosterStats {
    pub fn from_students(students: &[Student]) -> Self {
        let mut levels: Vec<(String, usize)> = LEVEL_ORDER
            .iter()
            .map(|level| (level.to_string(), 0))
            .collect();

        for student in students {
            let level = if student.level.is_empty() {
                UNSPECIFIED_LEVEL
            } else {
                student.level.as_str()
            };

            match levels.iter_mut().find(|(name, _)| name == level) {
                Some((_, count)) => *count += 1,
                None => levels.push((level.to_string(), 1)),
            }
        }

        Self {
            total: students.len(),
            nationalities: students
                .iter()
                .map(|student| student.nationality.as_str())
                .collect::<HashSet<_>>()
                .len(),
            paid: students.iter().filter(|student| student.has_paid()).count(),
            teachers: students
                .iter()
                .map(|student| student.teacher.as_str())
                .collect::<HashSet<_>>()
                .len(),
            levels,
        }
    }

    /// Count of students at the given level, if that level appears in the
    /// histogram.
    pub fn level_count(&self, level: &str) -> Option<usize> {
        self.levels
            .iter()
            .find(|(name, _)| name == level)
            .map(|(_, count)| *count)
    }
}
