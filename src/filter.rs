use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::model::{Course, Enrollment, Faculty, FacultyStatus, Student};

/// Numeric range filter expressed as `"all"` or `"min-max"`, with an
/// open-ended top bucket when the max half is missing (`"50-"`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RangeFilter {
    #[default]
    All,
    Bounded {
        min: f64,
        max: Option<f64>,
    },
}

impl RangeFilter {
    pub fn parse(raw: &str) -> Result<RangeFilter, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(RangeFilter::All);
        }
        let Some((lo, hi)) = trimmed.split_once('-') else {
            return Err(format!("range must be 'all' or 'min-max', got '{raw}'"));
        };
        let min: f64 = lo
            .trim()
            .parse()
            .map_err(|_| format!("bad range minimum '{lo}'"))?;
        let hi = hi.trim();
        let max = if hi.is_empty() {
            None
        } else {
            Some(
                hi.parse::<f64>()
                    .map_err(|_| format!("bad range maximum '{hi}'"))?,
            )
        };
        Ok(RangeFilter::Bounded { min, max })
    }

    pub fn contains(self, value: f64) -> bool {
        match self {
            RangeFilter::All => true,
            RangeFilter::Bounded { min, max } => {
                value >= min && max.map(|m| value <= m).unwrap_or(true)
            }
        }
    }
}

impl<'de> Deserialize<'de> for RangeFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        RangeFilter::parse(&raw).map_err(D::Error::custom)
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentFilter {
    pub search: String,
    pub year: Option<i64>,
    pub course: Option<i64>,
    pub gpa_range: RangeFilter,
}

impl StudentFilter {
    /// The course predicate reads `enrolled_courses`; callers run
    /// `calc::with_derived_enrollments` first so fresh enrollments count.
    pub fn matches(&self, student: &Student) -> bool {
        let search_ok = self.search.trim().is_empty()
            || contains_ci(&student.name, self.search.trim())
            || contains_ci(&student.student_id, self.search.trim())
            || contains_ci(&student.email, self.search.trim());
        let year_ok = self.year.map(|y| student.year == Some(y)).unwrap_or(true);
        let course_ok = self
            .course
            .map(|c| student.enrolled_courses.contains(&c))
            .unwrap_or(true);
        let gpa_ok = self.gpa_range.contains(student.gpa);
        search_ok && year_ok && course_ok && gpa_ok
    }
}

pub fn filter_students(students: &[Student], filter: &StudentFilter) -> Vec<Student> {
    students
        .iter()
        .filter(|s| filter.matches(s))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseFilter {
    pub search: String,
    pub faculty: Option<i64>,
    pub credits: Option<i64>,
    pub enrollment_range: RangeFilter,
}

impl CourseFilter {
    /// `enrollment_count` on the course is expected to be the derived
    /// count; callers run `calc::with_derived_counts` first.
    pub fn matches(&self, course: &Course) -> bool {
        let search_ok = self.search.trim().is_empty()
            || contains_ci(&course.title, self.search.trim())
            || contains_ci(&course.course_code, self.search.trim());
        let faculty_ok = self
            .faculty
            .map(|f| course.faculty_id == Some(f))
            .unwrap_or(true);
        let credits_ok = self.credits.map(|c| course.credits == c).unwrap_or(true);
        let enrollment_ok = self.enrollment_range.contains(course.enrollment_count as f64);
        search_ok && faculty_ok && credits_ok && enrollment_ok
    }
}

pub fn filter_courses(courses: &[Course], filter: &CourseFilter) -> Vec<Course> {
    courses
        .iter()
        .filter(|c| filter.matches(c))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FacultyFilter {
    pub search: String,
    pub department: Option<String>,
    pub designation: Option<String>,
    /// The wire value `"all"` means no status filter.
    #[serde(deserialize_with = "status_or_all")]
    pub status: Option<FacultyStatus>,
}

fn status_or_all<'de, D>(deserializer: D) -> Result<Option<FacultyStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") | Some("all") => Ok(None),
        Some(s) => FacultyStatus::parse(s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unknown status '{s}'"))),
    }
}

impl FacultyFilter {
    pub fn matches(&self, member: &Faculty) -> bool {
        let search_ok = self.search.trim().is_empty()
            || contains_ci(&member.name, self.search.trim())
            || contains_ci(&member.faculty_id, self.search.trim())
            || contains_ci(&member.email, self.search.trim());
        let department_ok = match &self.department {
            Some(d) if !d.is_empty() => member.department.as_deref() == Some(d.as_str()),
            _ => true,
        };
        let designation_ok = match &self.designation {
            Some(d) if !d.is_empty() => member.designation.as_deref() == Some(d.as_str()),
            _ => true,
        };
        let status_ok = self.status.map(|s| member.status == s).unwrap_or(true);
        search_ok && department_ok && designation_ok && status_ok
    }
}

pub fn filter_faculty(faculty: &[Faculty], filter: &FacultyFilter) -> Vec<Faculty> {
    faculty
        .iter()
        .filter(|f| filter.matches(f))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnrollmentFilter {
    pub search: String,
    pub course_id: Option<i64>,
}

impl EnrollmentFilter {
    /// The search term matches the joined student name, student code, or
    /// course code; enrollments whose student or course is missing only
    /// match an empty search.
    pub fn matches(
        &self,
        enrollment: &Enrollment,
        student: Option<&Student>,
        course: Option<&Course>,
    ) -> bool {
        let course_ok = self
            .course_id
            .map(|c| enrollment.course_id == c)
            .unwrap_or(true);
        let term = self.search.trim();
        let search_ok = term.is_empty()
            || student
                .map(|s| contains_ci(&s.name, term) || contains_ci(&s.student_id, term))
                .unwrap_or(false)
            || course
                .map(|c| contains_ci(&c.course_code, term))
                .unwrap_or(false);
        course_ok && search_ok
    }
}
