use serde::{Deserialize, Serialize};

/// Letter grades, highest first. This is also the canonical display order
/// for distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    F,
}

impl Grade {
    pub const LADDER: [Grade; 11] = [
        Grade::A,
        Grade::AMinus,
        Grade::BPlus,
        Grade::B,
        Grade::BMinus,
        Grade::CPlus,
        Grade::C,
        Grade::CMinus,
        Grade::DPlus,
        Grade::D,
        Grade::F,
    ];

    /// Unknown strings do not parse; callers treat them like a null grade.
    pub fn parse(s: &str) -> Option<Grade> {
        match s.trim() {
            "A" => Some(Grade::A),
            "A-" => Some(Grade::AMinus),
            "B+" => Some(Grade::BPlus),
            "B" => Some(Grade::B),
            "B-" => Some(Grade::BMinus),
            "C+" => Some(Grade::CPlus),
            "C" => Some(Grade::C),
            "C-" => Some(Grade::CMinus),
            "D+" => Some(Grade::DPlus),
            "D" => Some(Grade::D),
            "F" => Some(Grade::F),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    pub fn points(self) -> f64 {
        match self {
            Grade::A => 4.0,
            Grade::AMinus => 3.7,
            Grade::BPlus => 3.3,
            Grade::B => 3.0,
            Grade::BMinus => 2.7,
            Grade::CPlus => 2.3,
            Grade::C => 2.0,
            Grade::CMinus => 1.7,
            Grade::DPlus => 1.3,
            Grade::D => 1.0,
            Grade::F => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub student_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub gpa: f64,
    #[serde(default)]
    pub enrolled_courses: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub course_code: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub credits: i64,
    #[serde(default)]
    pub faculty_id: Option<i64>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub max_enrollment: Option<i64>,
    #[serde(default)]
    pub enrollment_count: i64,
    #[serde(default)]
    pub syllabus: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacultyStatus {
    Active,
    OnLeave,
    Inactive,
}

impl FacultyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FacultyStatus::Active => "active",
            FacultyStatus::OnLeave => "on_leave",
            FacultyStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<FacultyStatus> {
        match s {
            "active" => Some(FacultyStatus::Active),
            "on_leave" => Some(FacultyStatus::OnLeave),
            "inactive" => Some(FacultyStatus::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faculty {
    pub id: i64,
    pub faculty_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    pub status: FacultyStatus,
    #[serde(default)]
    pub join_date: Option<String>,
    // Secondary representation of the faculty-courses relation; presented
    // as the deduplicated union with the join rows, never written back.
    #[serde(default)]
    pub assigned_courses: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    #[serde(default)]
    pub enrollment_date: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
}

impl Enrollment {
    pub fn parsed_grade(&self) -> Option<Grade> {
        self.grade.as_deref().and_then(Grade::parse)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyCourse {
    pub id: i64,
    pub faculty_id: i64,
    pub course_id: i64,
}

// Create/update payloads. Ids are assigned by the remote source, so drafts
// carry everything but the id.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDraft {
    pub student_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub gpa: f64,
    #[serde(default)]
    pub enrolled_courses: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    pub course_code: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub credits: i64,
    #[serde(default)]
    pub faculty_id: Option<i64>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub max_enrollment: Option<i64>,
    #[serde(default)]
    pub syllabus: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyDraft {
    pub faculty_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    pub status: FacultyStatus,
    #[serde(default)]
    pub join_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDraft {
    pub student_id: i64,
    pub course_id: i64,
    pub enrollment_date: String,
    pub grade: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyCourseDraft {
    pub faculty_id: i64,
    pub course_id: i64,
}
