use std::collections::HashMap;
use std::path::Path;

use serde_json::json;

use crate::calc;
use crate::export;
use crate::filter::{filter_students, StudentFilter};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{api_err, parse_filters, prime, required_i64, required_obj, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{Course, Student, StudentDraft};
use crate::store::{Collection, Needs};

fn student_row(s: &Student) -> export::Row {
    vec![
        ("Student ID".to_string(), s.student_id.clone()),
        ("Name".to_string(), s.name.clone()),
        (
            "Year".to_string(),
            s.year.map(|y| y.to_string()).unwrap_or_default(),
        ),
        ("GPA".to_string(), s.gpa.to_string()),
        ("Email".to_string(), s.email.clone()),
    ]
}

async fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filters: StudentFilter = match parse_filters(req) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let needs = Needs::students().and_enrollments();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }
    let derived =
        calc::with_derived_enrollments(state.store.students(), state.store.enrollments());
    let students = filter_students(&derived, &filters);
    ok(
        &req.id,
        json!({ "total": students.len(), "students": students }),
    )
}

async fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let needs = Needs::students().and_courses().and_enrollments();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }

    let Some(student) = state.store.students().iter().find(|s| s.id == id) else {
        return err(&req.id, "not_found", format!("no student {id}"), None);
    };

    let mine: Vec<_> = state
        .store
        .enrollments()
        .iter()
        .filter(|e| e.student_id == id)
        .cloned()
        .collect();
    let by_course: HashMap<i64, &Course> =
        state.store.courses().iter().map(|c| (c.id, c)).collect();

    let enrolled: Vec<&Course> = mine
        .iter()
        .filter_map(|e| by_course.get(&e.course_id).copied())
        .collect();
    let grades: Vec<serde_json::Value> = mine
        .iter()
        .map(|e| {
            let course = by_course.get(&e.course_id);
            json!({
                "enrollmentId": e.id,
                "courseId": e.course_id,
                "courseCode": course.map(|c| c.course_code.clone()),
                "courseTitle": course.map(|c| c.title.clone()),
                "grade": e.grade,
                "semester": e.semester,
            })
        })
        .collect();

    ok(
        &req.id,
        json!({
            "student": student,
            "courses": enrolled,
            "grades": grades,
            "gpa": {
                "stored": student.gpa,
                "computed": calc::round_off_2_decimals(calc::gpa(&mine)),
            },
        }),
    )
}

async fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let draft: StudentDraft = match required_obj(req, "student") {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match state.api.create_student(&draft).await {
        Ok(created) => {
            state.store.invalidate(Collection::Students);
            ok(&req.id, json!({ "student": created }))
        }
        Err(e) => api_err(req, &e),
    }
}

async fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let draft: StudentDraft = match required_obj(req, "student") {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match state.api.update_student(id, &draft).await {
        Ok(updated) => {
            state.store.invalidate(Collection::Students);
            ok(&req.id, json!({ "student": updated }))
        }
        Err(e) => api_err(req, &e),
    }
}

async fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.api.delete_student(id).await {
        Ok(()) => {
            state.store.invalidate(Collection::Students);
            ok(&req.id, json!({ "deleted": id }))
        }
        Err(e) => api_err(req, &e),
    }
}

async fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let filters: StudentFilter = match parse_filters(req) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let needs = Needs::students().and_enrollments();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }
    let derived =
        calc::with_derived_enrollments(state.store.students(), state.store.enrollments());
    let students = filter_students(&derived, &filters);
    let rows: Vec<export::Row> = students.iter().map(student_row).collect();
    match export::write_csv(Path::new(&path), &rows) {
        Ok(n) => ok(&req.id, json!({ "path": path, "rows": n })),
        Err(e) => err(&req.id, "export_failed", format!("{e:#}"), None),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_list(state, req).await),
        "students.get" => Some(handle_get(state, req).await),
        "students.create" => Some(handle_create(state, req).await),
        "students.update" => Some(handle_update(state, req).await),
        "students.delete" => Some(handle_delete(state, req).await),
        "students.export" => Some(handle_export(state, req).await),
        _ => None,
    }
}
