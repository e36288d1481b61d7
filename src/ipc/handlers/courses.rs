use std::collections::HashMap;
use std::path::Path;

use serde_json::json;

use crate::calc;
use crate::export;
use crate::filter::{filter_courses, CourseFilter};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{api_err, parse_filters, prime, required_i64, required_obj, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{Course, CourseDraft, Faculty, Student};
use crate::store::{Collection, Needs};

async fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filters: CourseFilter = match parse_filters(req) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let needs = Needs::courses().and_enrollments();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }
    let derived = calc::with_derived_counts(state.store.courses(), state.store.enrollments());
    let courses = filter_courses(&derived, &filters);
    ok(&req.id, json!({ "total": courses.len(), "courses": courses }))
}

async fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let needs = Needs::courses()
        .and_enrollments()
        .and_students()
        .and_faculty();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }

    let Some(course) = state.store.courses().iter().find(|c| c.id == id) else {
        return err(&req.id, "not_found", format!("no course {id}"), None);
    };

    let roster: Vec<_> = state
        .store
        .enrollments()
        .iter()
        .filter(|e| e.course_id == id)
        .cloned()
        .collect();
    let by_student: HashMap<i64, &Student> =
        state.store.students().iter().map(|s| (s.id, s)).collect();
    let instructor: Option<&Faculty> = course
        .faculty_id
        .and_then(|fid| state.store.faculty().iter().find(|f| f.id == fid));

    let mut course_out = course.clone();
    course_out.enrollment_count = roster.len() as i64;

    let students: Vec<serde_json::Value> = roster
        .iter()
        .filter_map(|e| {
            let student = by_student.get(&e.student_id)?;
            Some(json!({
                "enrollmentId": e.id,
                "student": student,
                "grade": e.grade,
                "semester": e.semester,
            }))
        })
        .collect();

    ok(
        &req.id,
        json!({
            "course": course_out,
            "instructor": instructor,
            "students": students,
            "gradeDistribution": calc::grade_distribution(&roster),
            "averageGradePoints": calc::round_off_2_decimals(calc::course_average_points(&roster)),
        }),
    )
}

async fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let draft: CourseDraft = match required_obj(req, "course") {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match state.api.create_course(&draft).await {
        Ok(created) => {
            state.store.invalidate(Collection::Courses);
            ok(&req.id, json!({ "course": created }))
        }
        Err(e) => api_err(req, &e),
    }
}

async fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let draft: CourseDraft = match required_obj(req, "course") {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match state.api.update_course(id, &draft).await {
        Ok(updated) => {
            state.store.invalidate(Collection::Courses);
            ok(&req.id, json!({ "course": updated }))
        }
        Err(e) => api_err(req, &e),
    }
}

async fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.api.delete_course(id).await {
        Ok(()) => {
            state.store.invalidate(Collection::Courses);
            ok(&req.id, json!({ "deleted": id }))
        }
        Err(e) => api_err(req, &e),
    }
}

fn course_row(course: &Course, faculty: &[Faculty]) -> export::Row {
    let instructor = course
        .faculty_id
        .and_then(|fid| faculty.iter().find(|f| f.id == fid))
        .map(|f| f.name.clone())
        .unwrap_or_default();
    vec![
        ("Course Code".to_string(), course.course_code.clone()),
        ("Title".to_string(), course.title.clone()),
        ("Credits".to_string(), course.credits.to_string()),
        ("Faculty".to_string(), instructor),
        (
            "Enrollment Count".to_string(),
            course.enrollment_count.to_string(),
        ),
    ]
}

async fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let filters: CourseFilter = match parse_filters(req) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let needs = Needs::courses().and_enrollments().and_faculty();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }
    let derived = calc::with_derived_counts(state.store.courses(), state.store.enrollments());
    let courses = filter_courses(&derived, &filters);
    let rows: Vec<export::Row> = courses
        .iter()
        .map(|c| course_row(c, state.store.faculty()))
        .collect();
    match export::write_csv(Path::new(&path), &rows) {
        Ok(n) => ok(&req.id, json!({ "path": path, "rows": n })),
        Err(e) => err(&req.id, "export_failed", format!("{e:#}"), None),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(handle_list(state, req).await),
        "courses.get" => Some(handle_get(state, req).await),
        "courses.create" => Some(handle_create(state, req).await),
        "courses.update" => Some(handle_update(state, req).await),
        "courses.delete" => Some(handle_delete(state, req).await),
        "courses.export" => Some(handle_export(state, req).await),
        _ => None,
    }
}
