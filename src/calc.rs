use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::{Course, Enrollment, Grade, Student};

/// Half-up rounding to one decimal, used for percentage display fields.
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

/// Half-up rounding to two decimals, used for GPA-style display fields.
pub fn round_off_2_decimals(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

/// Arithmetic mean of grade points over the enrollments that carry a
/// parseable grade. Ungraded enrollments are excluded from both numerator
/// and denominator; zero graded enrollments yields 0.
pub fn gpa(enrollments: &[Enrollment]) -> f64 {
    let mut sum = 0.0_f64;
    let mut graded = 0_usize;
    for e in enrollments {
        if let Some(g) = e.parsed_grade() {
            sum += g.points();
            graded += 1;
        }
    }
    if graded == 0 {
        0.0
    } else {
        sum / (graded as f64)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradeBucket {
    pub grade: String,
    pub count: usize,
    pub percentage: f64,
}

/// Count/percentage breakdown by letter grade, in ladder order, one bucket
/// per grade actually present. Percentages are over graded enrollments so
/// they sum to 100 up to rounding.
pub fn grade_distribution(enrollments: &[Enrollment]) -> Vec<GradeBucket> {
    let mut counts: HashMap<Grade, usize> = HashMap::new();
    let mut graded_total = 0_usize;
    for e in enrollments {
        if let Some(g) = e.parsed_grade() {
            *counts.entry(g).or_insert(0) += 1;
            graded_total += 1;
        }
    }

    Grade::LADDER
        .iter()
        .filter_map(|g| {
            let count = counts.get(g).copied()?;
            let percentage = if graded_total > 0 {
                round_off_1_decimal(100.0 * (count as f64) / (graded_total as f64))
            } else {
                0.0
            };
            Some(GradeBucket {
                grade: g.as_str().to_string(),
                count,
                percentage,
            })
        })
        .collect()
}

/// Stable sort by stored gpa descending, first `n`. Ties keep the input
/// order.
pub fn top_students_by_gpa(students: &[Student], n: usize) -> Vec<Student> {
    let mut ranked: Vec<Student> = students.to_vec();
    ranked.sort_by(|a, b| b.gpa.partial_cmp(&a.gpa).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(n);
    ranked
}

/// Per-course enrollment counts derived from the enrollment collection.
/// This is the authoritative count; the stored `enrollmentCount` field is
/// overridden with it on read.
pub fn enrollment_counts(enrollments: &[Enrollment]) -> HashMap<i64, i64> {
    let mut counts: HashMap<i64, i64> = HashMap::new();
    for e in enrollments {
        *counts.entry(e.course_id).or_insert(0) += 1;
    }
    counts
}

/// Courses with the derived count substituted in, preserving input order.
pub fn with_derived_counts(courses: &[Course], enrollments: &[Enrollment]) -> Vec<Course> {
    let counts = enrollment_counts(enrollments);
    courses
        .iter()
        .map(|c| {
            let mut out = c.clone();
            out.enrollment_count = counts.get(&c.id).copied().unwrap_or(0);
            out
        })
        .collect()
}

/// Students with `enrolled_courses` rebuilt as the deduplicated union of
/// the enrollment collection's course ids (first) and the stored array, so
/// a fresh enrollment is visible before the remote side updates the array.
pub fn with_derived_enrollments(students: &[Student], enrollments: &[Enrollment]) -> Vec<Student> {
    let mut by_student: HashMap<i64, Vec<i64>> = HashMap::new();
    for e in enrollments {
        by_student.entry(e.student_id).or_default().push(e.course_id);
    }
    students
        .iter()
        .map(|s| {
            let derived = by_student.get(&s.id).map(Vec::as_slice).unwrap_or(&[]);
            let mut out = s.clone();
            out.enrolled_courses = assigned_course_ids(derived, &s.enrolled_courses);
            out
        })
        .collect()
}

/// Stable sort by derived enrollment count descending, first `n`.
pub fn top_courses_by_enrollment(
    courses: &[Course],
    enrollments: &[Enrollment],
    n: usize,
) -> Vec<Course> {
    let mut ranked = with_derived_counts(courses, enrollments);
    ranked.sort_by(|a, b| b.enrollment_count.cmp(&a.enrollment_count));
    ranked.truncate(n);
    ranked
}

/// Mean grade points across one course's enrollments; 0 when none graded.
pub fn course_average_points(enrollments: &[Enrollment]) -> f64 {
    gpa(enrollments)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePerformer {
    pub student_id: i64,
    pub student_name: String,
    pub gpa: f64,
    pub grade: Option<String>,
}

/// Students enrolled in `course_id`, ranked by stored gpa descending, first
/// `n`, each carrying the letter grade from their enrollment. Enrollments
/// pointing at unknown students are skipped.
pub fn course_top_performers(
    course_id: i64,
    enrollments: &[Enrollment],
    students: &[Student],
    n: usize,
) -> Vec<CoursePerformer> {
    let by_id: HashMap<i64, &Student> = students.iter().map(|s| (s.id, s)).collect();
    let mut performers: Vec<CoursePerformer> = enrollments
        .iter()
        .filter(|e| e.course_id == course_id)
        .filter_map(|e| {
            let student = by_id.get(&e.student_id)?;
            Some(CoursePerformer {
                student_id: student.id,
                student_name: student.name.clone(),
                gpa: student.gpa,
                grade: e.grade.clone(),
            })
        })
        .collect();
    performers.sort_by(|a, b| b.gpa.partial_cmp(&a.gpa).unwrap_or(std::cmp::Ordering::Equal));
    performers.truncate(n);
    performers
}

/// Number of distinct students across a set of enrollments.
pub fn distinct_student_count(enrollments: &[Enrollment]) -> usize {
    enrollments
        .iter()
        .map(|e| e.student_id)
        .collect::<HashSet<_>>()
        .len()
}

/// Union of the join-collection course ids and the stored assignment array,
/// deduplicated, first occurrence wins. The join rows are authoritative and
/// come first.
pub fn assigned_course_ids(join_course_ids: &[i64], stored: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for id in join_course_ids.iter().chain(stored.iter()) {
        if seen.insert(*id) {
            out.push(*id);
        }
    }
    out
}

/// Mean of the stored student gpa field; 0 for an empty cohort.
pub fn mean_stored_gpa(students: &[Student]) -> f64 {
    if students.is_empty() {
        return 0.0;
    }
    students.iter().map(|s| s.gpa).sum::<f64>() / (students.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enrollment(id: i64, student_id: i64, course_id: i64, grade: Option<&str>) -> Enrollment {
        Enrollment {
            id,
            student_id,
            course_id,
            enrollment_date: None,
            grade: grade.map(|g| g.to_string()),
            semester: None,
        }
    }

    fn student(id: i64, name: &str, gpa: f64) -> Student {
        Student {
            id,
            student_id: format!("STU-{id:03}"),
            name: name.to_string(),
            email: format!("s{id}@example.edu"),
            phone: None,
            year: None,
            department: None,
            gpa,
            enrolled_courses: Vec::new(),
        }
    }

    fn course(id: i64, code: &str) -> Course {
        Course {
            id,
            course_code: code.to_string(),
            title: format!("Course {code}"),
            description: None,
            credits: 3,
            faculty_id: None,
            department: None,
            max_enrollment: None,
            enrollment_count: 0,
            syllabus: None,
        }
    }

    #[test]
    fn gpa_of_nothing_is_zero() {
        assert_eq!(gpa(&[]), 0.0);
        assert_eq!(gpa(&[enrollment(1, 1, 10, None)]), 0.0);
    }

    #[test]
    fn gpa_excludes_null_grades_from_the_denominator() {
        let es = vec![
            enrollment(1, 1, 10, Some("A")),
            enrollment(2, 1, 11, None),
        ];
        assert_eq!(gpa(&es), 4.0);
    }

    #[test]
    fn gpa_excludes_unknown_grade_strings() {
        // Unknown strings behave like null, not like zero points.
        let es = vec![
            enrollment(1, 1, 10, Some("A")),
            enrollment(2, 1, 11, Some("incomplete")),
        ];
        assert_eq!(gpa(&es), 4.0);
    }

    #[test]
    fn gpa_averages_grade_points() {
        let es = vec![
            enrollment(1, 1, 10, Some("A")),
            enrollment(2, 1, 11, Some("B")),
        ];
        assert_eq!(gpa(&es), 3.5);
    }

    #[test]
    fn distribution_orders_by_ladder_and_sums_to_100() {
        let es = vec![
            enrollment(1, 1, 10, Some("B")),
            enrollment(2, 2, 10, Some("A")),
            enrollment(3, 3, 10, Some("A")),
            enrollment(4, 4, 10, None),
            enrollment(5, 5, 10, Some("F")),
        ];
        let dist = grade_distribution(&es);
        let grades: Vec<&str> = dist.iter().map(|b| b.grade.as_str()).collect();
        assert_eq!(grades, vec!["A", "B", "F"]);
        assert_eq!(dist[0].count, 2);
        let total: f64 = dist.iter().map(|b| b.percentage).sum();
        assert!((total - 100.0).abs() < 0.2, "sum was {total}");
    }

    #[test]
    fn distribution_of_ungraded_only_is_empty() {
        let es = vec![enrollment(1, 1, 10, None), enrollment(2, 2, 10, None)];
        assert!(grade_distribution(&es).is_empty());
    }

    #[test]
    fn top_students_is_stable_under_ties() {
        let cohort = vec![
            student(1, "first", 3.2),
            student(2, "tied-a", 3.8),
            student(3, "tied-b", 3.8),
            student(4, "last", 2.1),
        ];
        let top = top_students_by_gpa(&cohort, 5);
        assert_eq!(top.len(), 4);
        assert_eq!(top[0].id, 2);
        assert_eq!(top[1].id, 3);
        assert_eq!(top[3].id, 4);

        let top2 = top_students_by_gpa(&cohort, 2);
        assert_eq!(top2.len(), 2);
    }

    #[test]
    fn derived_counts_override_the_stored_field() {
        let mut stale = course(10, "CS101");
        stale.enrollment_count = 99;
        let courses = vec![stale, course(11, "CS102")];
        let es = vec![
            enrollment(1, 1, 10, None),
            enrollment(2, 2, 10, None),
            enrollment(3, 3, 11, None),
        ];
        let derived = with_derived_counts(&courses, &es);
        assert_eq!(derived[0].enrollment_count, 2);
        assert_eq!(derived[1].enrollment_count, 1);

        let ranked = top_courses_by_enrollment(&courses, &es, 1);
        assert_eq!(ranked[0].id, 10);
    }

    #[test]
    fn derived_enrollments_union_the_stored_array() {
        let mut s = student(1, "a", 3.0);
        s.enrolled_courses = vec![11, 12];
        let cohort = vec![s, student(2, "b", 3.5)];
        let es = vec![
            enrollment(1, 1, 10, None),
            enrollment(2, 1, 11, None),
            enrollment(3, 2, 10, None),
        ];
        let derived = with_derived_enrollments(&cohort, &es);
        // Enrollment-derived ids first, stored leftovers kept, no repeats.
        assert_eq!(derived[0].enrolled_courses, vec![10, 11, 12]);
        assert_eq!(derived[1].enrolled_courses, vec![10]);
    }

    #[test]
    fn course_top_performers_skips_unknown_students() {
        let cohort = vec![student(1, "a", 3.0), student(2, "b", 3.9)];
        let es = vec![
            enrollment(1, 1, 10, Some("B")),
            enrollment(2, 2, 10, Some("A")),
            enrollment(3, 77, 10, Some("A")),
            enrollment(4, 2, 11, Some("A")),
        ];
        let top = course_top_performers(10, &es, &cohort, 5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].student_id, 2);
        assert_eq!(top[0].grade.as_deref(), Some("A"));
    }

    #[test]
    fn assigned_union_dedups_and_keeps_join_order() {
        assert_eq!(assigned_course_ids(&[3, 1], &[1, 2]), vec![3, 1, 2]);
        assert_eq!(assigned_course_ids(&[], &[]), Vec::<i64>::new());
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_off_1_decimal(3.54), 3.5);
        assert_eq!(round_off_1_decimal(3.55), 3.6);
        assert_eq!(round_off_1_decimal(35.6818), 35.7);
        assert_eq!(round_off_2_decimals(3.556), 3.56);
        assert_eq!(round_off_2_decimals(3.554), 3.55);
    }

    #[test]
    fn distinct_students_and_mean_gpa() {
        let es = vec![
            enrollment(1, 1, 10, None),
            enrollment(2, 1, 11, None),
            enrollment(3, 2, 10, None),
        ];
        assert_eq!(distinct_student_count(&es), 2);
        let cohort = vec![student(1, "a", 3.0), student(2, "b", 4.0)];
        assert_eq!(mean_stored_gpa(&cohort), 3.5);
        assert_eq!(mean_stored_gpa(&[]), 0.0);
    }
}
