use std::collections::BTreeSet;
use std::io::Read;

use chrono::{Days, NaiveDate};
use tracing::{debug, info};

use crate::decoder::Decoder;
use crate::error::{self, Error, ErrorKind, Position};
use crate::matcher::Matcher;
use crate::records::Row;
use crate::stats::RosterStats;

/// Value of the fees column for students who paid.
pub const PAID: &str = "نعم";

/// Default window, in days, of [`Roster::expiring_ids`] on the dashboard.
pub const EXPIRING_SOON_DAYS: u32 = 30;

/// Accepted formats of the ID expiry column.
const EXPIRY_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// One student, mapped positionally from a decoded row. Missing cells are
/// empty strings and extra cells are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub nationality: String,
    pub dob: String,
    pub phone: String,
    pub age: String,
    pub qualification: String,
    pub job: String,
    pub address: String,
    pub reg_date: String,
    pub level: String,
    pub part: String,
    pub national_id: String,
    pub category: String,
    pub period: String,
    pub expiry_id: String,
    pub teacher: String,
    pub fees: String,
    pub circle: String,
    pub completion: String,
}

impl Student {
    /// Number of columns a complete roster row has.
    pub const COLUMNS: usize = 20;

    pub fn from_row(row: &Row) -> Self {
        let field = |i: usize| row.get_or_empty(i).to_string();

        Self {
            id: field(0),
            name: field(1),
            nationality: field(2),
            dob: field(3),
            phone: field(4),
            age: field(5),
            qualification: field(6),
            job: field(7),
            address: field(8),
            reg_date: field(9),
            level: field(10),
            part: field(11),
            national_id: field(12),
            category: field(13),
            period: field(14),
            expiry_id: field(15),
            teacher: field(16),
            fees: field(17),
            circle: field(18),
            completion: field(19),
        }
    }

    /// The text searched by the roster's free-text filter: the searchable
    /// columns joined by single spaces.
    pub fn search_haystack(&self) -> String {
        [
            self.name.as_str(),
            &self.phone,
            &self.teacher,
            &self.circle,
            &self.national_id,
        ]
        .join(" ")
    }

    #[inline]
    pub fn has_paid(&self) -> bool {
        self.fees == PAID
    }

    /// The ID expiry date, if the column holds a `YYYY-MM-DD` or
    /// `YYYY/MM/DD` date. Blank or malformed values yield `None`.
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        let value = self.expiry_id.trim();

        if value.is_empty() {
            return None;
        }

        EXPIRY_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    }
}

/// How the first decoded row is told apart from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPolicy {
    /// Look for [`HeaderMarker`]s in the first row. This is a heuristic: a
    /// data row containing a marker will be taken for a header.
    #[default]
    Sniff,
    Present,
    Absent,
}

/// A column-name fragment identifying a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMarker {
    /// Some field contains the given text (case-sensitive).
    Contains(String),
    /// Some field is exactly the given text.
    Exact(String),
}

impl HeaderMarker {
    pub fn is_found_in(&self, row: &Row) -> bool {
        match self {
            Self::Contains(fragment) => row.iter().any(|field| field.contains(fragment.as_str())),
            Self::Exact(text) => row.iter().any(|field| field == text),
        }
    }
}

pub fn default_header_markers() -> Vec<HeaderMarker> {
    vec![
        HeaderMarker::Contains("اسم".to_string()),
        HeaderMarker::Contains("الدارس".to_string()),
        HeaderMarker::Exact("م".to_string()),
    ]
}

/// Returns whether `row` looks like a header according to `markers`.
pub fn sniff_header(row: &Row, markers: &[HeaderMarker]) -> bool {
    markers.iter().any(|marker| marker.is_found_in(row))
}

/// Builds a [`RosterLoader`] with a custom configuration.
#[derive(Debug, Clone)]
pub struct RosterLoaderBuilder {
    header: HeaderPolicy,
    markers: Vec<HeaderMarker>,
    flexible: bool,
    expected_len: Option<usize>,
}

impl Default for RosterLoaderBuilder {
    fn default() -> Self {
        Self {
            header: HeaderPolicy::default(),
            markers: default_header_markers(),
            flexible: true,
            expected_len: None,
        }
    }
}

impl RosterLoaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&mut self, policy: HeaderPolicy) -> &mut Self {
        self.header = policy;
        self
    }

    /// Markers used when the header policy is [`HeaderPolicy::Sniff`].
    pub fn markers(&mut self, markers: Vec<HeaderMarker>) -> &mut Self {
        self.markers = markers;
        self
    }

    /// Whether data rows may have any number of fields. When `false`, every
    /// non-blank data row must have the expected number of fields, which is
    /// either the one given to [`Self::expected_len`], the header's or the
    /// first data row's.
    pub fn flexible(&mut self, yes: bool) -> &mut Self {
        self.flexible = yes;
        self
    }

    pub fn expected_len(&mut self, len: Option<usize>) -> &mut Self {
        self.expected_len = len;
        self
    }

    pub fn build(&self) -> RosterLoader {
        RosterLoader {
            header: self.header,
            markers: self.markers.clone(),
            flexible: self.flexible,
            expected_len: self.expected_len,
        }
    }
}

/// Turns a CSV roster export into [`Student`]s: decodes it, sets the header
/// row aside and drops blank rows.
#[derive(Debug, Clone)]
pub struct RosterLoader {
    header: HeaderPolicy,
    markers: Vec<HeaderMarker>,
    flexible: bool,
    expected_len: Option<usize>,
}

impl Default for RosterLoader {
    fn default() -> Self {
        RosterLoaderBuilder::new().build()
    }
}

impl RosterLoader {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_header(&self, row: &Row) -> bool {
        match self.header {
            HeaderPolicy::Present => true,
            HeaderPolicy::Absent => false,
            HeaderPolicy::Sniff => sniff_header(row, &self.markers),
        }
    }

    pub fn load(&self, text: &str) -> error::Result<Roster> {
        let mut decoder = Decoder::new(text);
        let mut row = Row::new();

        let mut header: Option<Row> = None;
        let mut students = Vec::new();
        let mut expected_len = self.expected_len;
        let mut blank_rows: usize = 0;

        while decoder.read_row(&mut row) {
            if decoder.row_index() == Some(0) && self.is_header(&row) {
                expected_len.get_or_insert(row.len());
                header = Some(row.clone());
                continue;
            }

            if row.is_blank() {
                blank_rows += 1;
                continue;
            }

            if !self.flexible {
                let expected = *expected_len.get_or_insert(row.len());

                if row.len() != expected {
                    return Err(Error::new(ErrorKind::UnequalLengths {
                        expected_len: expected,
                        len: row.len(),
                        pos: decoder.row_index().map(|index| Position {
                            byte: decoder.row_position(),
                            row: index,
                        }),
                    }));
                }
            }

            students.push(Student::from_row(&row));
        }

        debug!(
            has_header = header.is_some(),
            blank_rows,
            policy = ?self.header,
            "decoded roster document"
        );
        info!(students = students.len(), "loaded roster");

        Ok(Roster { header, students })
    }

    /// Read a whole roster export from `reader`. Fails if reading fails or
    /// if the data is not valid UTF-8.
    pub fn load_reader<R: Read>(&self, mut reader: R) -> error::Result<Roster> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;

        self.load(&text)
    }
}

/// A loaded roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    header: Option<Row>,
    students: Vec<Student>,
}

impl Roster {
    pub fn header(&self) -> Option<&Row> {
        self.header.as_ref()
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn into_students(self) -> Vec<Student> {
        self.students
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.students.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Students whose search haystack matches `query` and whose level is
    /// exactly `level`. An empty query or level does not filter anything.
    pub fn filter(&self, query: &str, level: Option<&str>) -> Vec<&Student> {
        let matcher = Matcher::new(query);
        let level = level.filter(|level| !level.is_empty());
        let mut scratch = String::new();

        self.students
            .iter()
            .filter(|student| level.map_or(true, |level| student.level == level))
            .filter(|student| matcher.is_match_with(&student.search_haystack(), &mut scratch))
            .collect()
    }

    /// Sorted distinct non-blank values of a column, e.g. to offer them as
    /// filter options.
    pub fn distinct<'a, F>(&'a self, column: F) -> Vec<&'a str>
    where
        F: Fn(&'a Student) -> &'a str,
    {
        self.students
            .iter()
            .map(column)
            .filter(|value| !value.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn unpaid(&self) -> impl Iterator<Item = &Student> {
        self.students.iter().filter(|student| !student.has_paid())
    }

    fn ids_expiring_when<F>(&self, predicate: F) -> Vec<&str>
    where
        F: Fn(NaiveDate) -> bool,
    {
        let mut unparseable: usize = 0;

        let ids: Vec<&str> = self
            .students
            .iter()
            .filter(|student| match student.expiry_date() {
                Some(date) => predicate(date),
                None => {
                    if !student.expiry_id.trim().is_empty() {
                        unparseable += 1;
                    }
                    false
                }
            })
            .map(|student| student.id.as_str())
            .collect();

        if unparseable > 0 {
            debug!(unparseable, "skipped malformed ID expiry dates");
        }

        ids
    }

    /// Ids of the students whose ID document expired on or before `today`.
    /// Students with a blank or malformed expiry date are skipped.
    pub fn expired_ids(&self, today: NaiveDate) -> Vec<&str> {
        self.ids_expiring_when(|date| date <= today)
    }

    /// Ids of the students whose ID document expires after `today` but no
    /// later than `within_days` days from it. Students with a blank or
    /// malformed expiry date are skipped.
    pub fn expiring_ids(&self, today: NaiveDate, within_days: u32) -> Vec<&str> {
        let limit = today
            .checked_add_days(Days::new(within_days.into()))
            .unwrap_or(NaiveDate::MAX);

        self.ids_expiring_when(|date| today < date && date <= limit)
    }

    pub fn stats(&self) -> RosterStats {
        RosterStats::from_students(&self.students)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const ROSTER: &str = concat!(
        "\u{feff}م,اسم الدارس,الجنسية,تاريخ الميلاد,الجوال,العمر,المؤهل,الوظيفة,العنوان,تاريخ التسجيل,",
        "المستوى,الجزء,رقم الهوية,الفئة,الفترة,انتهاء الهوية,المعلم,الرسوم,الحلقة,الختم\r\n",
        "1,أَحْمَد علي,سعودي,2001-01-01,0551234567,23,ثانوي,طالب,\"الرياض, حي النسيم\",2024-09-01,",
        "الأول,عم,1010101010,رجال,مسائية,2027-01-01,الشيخ محمود,نعم,حلقة الفجر,لا\r\n",
        " , , ,\r\n",
        "2,Fatima Zahra,مصرية,,٠٥٠٩٨٧٦٥٤٣,30,جامعي,\"معلمة \"\"متطوعة\"\"\",جدة,,",
        "الثاني,,,نساء,صباحية,,الشيخة آمنة,لا,حلقة النور,\r\n",
        "\r\n",
        "3,مصطفى حسن,سعودي\r\n",
    );

    fn names<'a>(students: &[&'a Student]) -> Vec<&'a str> {
        students.iter().map(|student| student.name.as_str()).collect()
    }

    #[test]
    fn test_load() {
        let roster = RosterLoader::new().load(ROSTER).unwrap();

        let header = roster.header().unwrap();
        assert_eq!(header.len(), Student::COLUMNS);
        assert_eq!(&header[0], "م");

        assert_eq!(roster.len(), 3);

        let students = roster.students();
        assert_eq!(students[0].id, "1");
        assert_eq!(students[0].name, "أَحْمَد علي");
        assert_eq!(students[0].address, "الرياض, حي النسيم");
        assert_eq!(students[0].completion, "لا");
        assert_eq!(students[1].job, "معلمة \"متطوعة\"");
        assert_eq!(students[1].completion, "");
        assert_eq!(students[2].nationality, "سعودي");
        assert_eq!(students[2].teacher, "");
    }

    #[test]
    fn test_load_empty() {
        let roster = RosterLoader::new().load("").unwrap();

        assert!(roster.is_empty());
        assert_eq!(roster.header(), None);

        let roster = RosterLoader::new().load("\u{feff}\r\n , \n").unwrap();
        assert!(roster.is_empty());
    }

    #[test]
    fn test_header_policies() {
        let no_header = "1,محمد,سعودي\n2,خالد,يمني\n";

        let roster = RosterLoader::new().load(no_header).unwrap();
        assert_eq!(roster.header(), None);
        assert_eq!(roster.len(), 2);

        let roster = RosterLoaderBuilder::new()
            .header(HeaderPolicy::Present)
            .build()
            .load(no_header)
            .unwrap();
        assert_eq!(roster.header(), Some(&row!["1", "محمد", "سعودي"]));
        assert_eq!(roster.len(), 1);

        let roster = RosterLoaderBuilder::new()
            .header(HeaderPolicy::Absent)
            .build()
            .load(ROSTER)
            .unwrap();
        assert_eq!(roster.header(), None);
        assert_eq!(roster.len(), 4);
        assert_eq!(roster.students()[0].name, "اسم الدارس");
    }

    #[test]
    fn test_sniffing_can_misclassify_data() {
        // "باسم" contains the "اسم" marker
        let roster = RosterLoader::new().load("1,باسم سعيد\n2,خالد\n").unwrap();

        assert!(roster.header().is_some());
        assert_eq!(roster.len(), 1);

        let roster = RosterLoaderBuilder::new()
            .markers(vec![HeaderMarker::Exact("م".to_string())])
            .build()
            .load("1,باسم سعيد\n2,خالد\n")
            .unwrap();

        assert!(roster.header().is_none());
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_header_markers() {
        let row = row!["م", "اسم الدارس", "Phone"];

        assert!(HeaderMarker::Exact("م".to_string()).is_found_in(&row));
        assert!(!HeaderMarker::Exact("اسم".to_string()).is_found_in(&row));
        assert!(HeaderMarker::Contains("الدارس".to_string()).is_found_in(&row));
        assert!(!HeaderMarker::Contains("phone".to_string()).is_found_in(&row));
        assert!(sniff_header(&row, &default_header_markers()));
        assert!(!sniff_header(&row!["1", "محمد"], &default_header_markers()));
    }

    #[test]
    fn test_strict_loading() {
        let err = RosterLoaderBuilder::new()
            .flexible(false)
            .build()
            .load(ROSTER)
            .unwrap_err();

        match err.kind() {
            ErrorKind::UnequalLengths {
                expected_len,
                len,
                pos: Some(pos),
            } => {
                assert_eq!(*expected_len, Student::COLUMNS);
                assert_eq!(*len, 3);
                assert_eq!(pos.row, 4);
                assert_eq!(pos.byte, ROSTER.find("3,مصطفى").unwrap() as u64);
            }
            kind => panic!("unexpected error kind: {:?}", kind),
        }

        let roster = RosterLoaderBuilder::new()
            .flexible(false)
            .header(HeaderPolicy::Absent)
            .build()
            .load("1,محمد,سعودي\n\n2,خالد,يمني\n")
            .unwrap();
        assert_eq!(roster.len(), 2);

        let err = RosterLoaderBuilder::new()
            .flexible(false)
            .expected_len(Some(2))
            .build()
            .load("a,b\nc,d,e\n")
            .unwrap_err();
        assert!(!err.is_io_error());
    }

    #[test]
    fn test_load_reader() {
        let roster = RosterLoader::new().load_reader(ROSTER.as_bytes()).unwrap();
        assert_eq!(roster.len(), 3);

        let err = RosterLoader::new()
            .load_reader(&b"1,\xff\xfe,x\n"[..])
            .unwrap_err();
        assert!(err.is_io_error());
    }

    #[test]
    fn test_filter() {
        let roster = RosterLoader::new().load(ROSTER).unwrap();

        assert_eq!(roster.filter("", None).len(), 3);
        assert_eq!(roster.filter("  ", Some("")).len(), 3);
        assert_eq!(names(&roster.filter("احمد", None)), vec!["أَحْمَد علي"]);
        assert_eq!(names(&roster.filter("FATIMA", None)), vec!["Fatima Zahra"]);
        assert_eq!(names(&roster.filter("0509", None)), vec!["Fatima Zahra"]);
        assert_eq!(names(&roster.filter("امنه", None)), vec!["Fatima Zahra"]);
        assert_eq!(names(&roster.filter("", Some("الثاني"))), vec!["Fatima Zahra"]);
        assert_eq!(
            names(&roster.filter("حلقة", None)),
            vec!["أَحْمَد علي", "Fatima Zahra"]
        );
        assert!(roster.filter("fatima", Some("الأول")).is_empty());

        // Nationality is not part of the search haystack
        assert!(roster.filter("مصرية", None).is_empty());
    }

    #[test]
    fn test_distinct_and_unpaid() {
        let roster = RosterLoader::new().load(ROSTER).unwrap();

        assert_eq!(roster.distinct(|s| s.nationality.as_str()), vec!["سعودي", "مصرية"]);
        assert_eq!(roster.distinct(|s| s.level.as_str()), vec!["الأول", "الثاني"]);

        let unpaid: Vec<&str> = roster.unpaid().map(|s| s.id.as_str()).collect();
        assert_eq!(unpaid, vec!["2", "3"]);
    }

    fn with_expiry_dates(dates: &[(&str, &str)]) -> Roster {
        Roster {
            header: None,
            students: dates
                .iter()
                .map(|(id, expiry_id)| Student {
                    id: id.to_string(),
                    expiry_id: expiry_id.to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_expiry_date() {
        let tests = vec![
            ("2027-01-01", Some(date("2027-01-01"))),
            (" 2027/01/31 ", Some(date("2027-01-31"))),
            ("", None),
            ("   ", None),
            ("2027-02-30", None),
            ("01/02/2027", None),
            ("غير معروف", None),
        ];

        for (expiry_id, expected) in tests {
            let student = Student {
                expiry_id: expiry_id.to_string(),
                ..Default::default()
            };

            assert_eq!(student.expiry_date(), expected, "string={:?}", expiry_id);
        }
    }

    #[test]
    fn test_expired_ids() {
        let roster = with_expiry_dates(&[
            ("1", "2026-10-18"),
            ("2", "2026-10-19"),
            ("3", "2026-10-20"),
            ("4", ""),
            ("5", "not a date"),
            ("6", "2026-13-01"),
            ("7", "2019/05/04"),
        ]);

        let today = date("2026-10-19");

        assert_eq!(roster.expired_ids(today), vec!["1", "2", "7"]);
        assert_eq!(roster.expired_ids(date("2019-05-03")), Vec::<&str>::new());

        let roster = RosterLoader::new().load(ROSTER).unwrap();
        assert!(roster.expired_ids(today).is_empty());
        assert_eq!(roster.expired_ids(date("2027-01-01")), vec!["1"]);
    }

    #[test]
    fn test_expiring_ids() {
        let roster = with_expiry_dates(&[
            ("1", "2026-10-19"),
            ("2", "2026-10-20"),
            ("3", "2026-11-18"),
            ("4", "2026-11-19"),
            ("5", "2026-11-31"),
            ("6", ""),
            ("7", "2026/11/01"),
        ]);

        let today = date("2026-10-19");

        // The last day of the window is included, today is not
        assert_eq!(
            roster.expiring_ids(today, EXPIRING_SOON_DAYS),
            vec!["2", "3", "7"]
        );
        assert_eq!(roster.expiring_ids(today, 1), vec!["2"]);
        assert!(roster.expiring_ids(today, 0).is_empty());
        assert_eq!(roster.expiring_ids(today, u32::MAX), vec!["2", "3", "4", "7"]);

        let roster = RosterLoader::new().load(ROSTER).unwrap();
        assert_eq!(roster.expiring_ids(date("2026-12-10"), EXPIRING_SOON_DAYS), vec!["1"]);
        assert!(roster.expiring_ids(date("2026-12-01"), EXPIRING_SOON_DAYS).is_empty());
    }

    #[test]
    fn test_search_haystack() {
        let student = Student::from_row(&row![
            "7", "سارة", "", "", "055", "", "", "", "", "", "", "", "99", "", "", "", "أمل", "",
            "الندى"
        ]);

        assert_eq!(student.search_haystack(), "سارة 055 أمل الندى 99");
        assert!(!student.has_paid());
    }
}
