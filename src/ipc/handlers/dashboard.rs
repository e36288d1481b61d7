use std::collections::BTreeMap;

use serde_json::json;

use crate::calc;
use crate::ipc::error::ok;
use crate::ipc::helpers::prime;
use crate::ipc::types::{AppState, Request};
use crate::model::Student;
use crate::store::Needs;

const TOP_N: usize = 5;

async fn handle_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let needs = Needs::students()
        .and_courses()
        .and_faculty()
        .and_enrollments();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }

    let students = state.store.students();
    let courses = state.store.courses();
    let enrollments = state.store.enrollments();

    let top_students: Vec<serde_json::Value> = calc::top_students_by_gpa(students, TOP_N)
        .iter()
        .map(|s| {
            json!({
                "id": s.id,
                "studentId": s.student_id,
                "name": s.name,
                "gpa": s.gpa,
            })
        })
        .collect();
    let top_courses: Vec<serde_json::Value> =
        calc::top_courses_by_enrollment(courses, enrollments, TOP_N)
            .iter()
            .map(|c| {
                json!({
                    "id": c.id,
                    "courseCode": c.course_code,
                    "title": c.title,
                    "enrollmentCount": c.enrollment_count,
                })
            })
            .collect();

    ok(
        &req.id,
        json!({
            "totals": {
                "students": students.len(),
                "courses": courses.len(),
                "faculty": state.store.faculty().len(),
                "enrollments": enrollments.len(),
            },
            "topStudents": top_students,
            "topCourses": top_courses,
            "gradeDistribution": calc::grade_distribution(enrollments),
        }),
    )
}

async fn handle_department_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let needs = Needs::students().and_courses().and_faculty();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }

    // BTreeMap keeps the department list in a stable order.
    let mut by_department: BTreeMap<String, (Vec<&Student>, usize, usize)> = BTreeMap::new();
    for s in state.store.students() {
        if let Some(dept) = s.department.as_deref() {
            by_department.entry(dept.to_string()).or_default().0.push(s);
        }
    }
    for c in state.store.courses() {
        if let Some(dept) = c.department.as_deref() {
            by_department.entry(dept.to_string()).or_default().1 += 1;
        }
    }
    for f in state.store.faculty() {
        if let Some(dept) = f.department.as_deref() {
            by_department.entry(dept.to_string()).or_default().2 += 1;
        }
    }

    let departments: Vec<serde_json::Value> = by_department
        .iter()
        .map(|(name, (students, courses, faculty))| {
            let cohort: Vec<Student> = students.iter().map(|s| (*s).clone()).collect();
            json!({
                "department": name,
                "students": students.len(),
                "courses": courses,
                "faculty": faculty,
                "averageGpa": calc::round_off_2_decimals(calc::mean_stored_gpa(&cohort)),
            })
        })
        .collect();

    ok(
        &req.id,
        json!({
            "departments": departments,
            "averageGpa": calc::round_off_2_decimals(calc::mean_stored_gpa(state.store.students())),
        }),
    )
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.overview" => Some(handle_overview(state, req).await),
        "dashboard.departmentStats" => Some(handle_department_stats(state, req).await),
        _ => None,
    }
}
