use std::path::Path;

use serde_json::json;

use crate::calc;
use crate::export;
use crate::filter::{filter_faculty, FacultyFilter};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{api_err, parse_filters, prime, required_i64, required_obj, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{Enrollment, Faculty, FacultyCourse, FacultyCourseDraft, FacultyDraft};
use crate::store::{Collection, Needs};

/// The join collection is authoritative; the stored array on the record is
/// folded in as a fallback and the result is deduplicated.
fn with_union(member: &Faculty, join: &[FacultyCourse]) -> Faculty {
    let join_ids: Vec<i64> = join
        .iter()
        .filter(|fc| fc.faculty_id == member.id)
        .map(|fc| fc.course_id)
        .collect();
    let mut out = member.clone();
    out.assigned_courses = calc::assigned_course_ids(&join_ids, &member.assigned_courses);
    out
}

fn parse_course_ids(req: &Request) -> Result<Vec<i64>, serde_json::Value> {
    let ids: Vec<i64> = match req.params.get("courseIds") {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(v) => v,
            Err(e) => {
                return Err(err(
                    &req.id,
                    "bad_params",
                    format!("bad courseIds: {e}"),
                    None,
                ))
            }
        },
    };
    Ok(calc::assigned_course_ids(&ids, &[]))
}

/// Replace the member's join rows with the submitted course list.
async fn rewrite_join_rows(
    state: &AppState,
    faculty_id: i64,
    course_ids: &[i64],
) -> Result<(), crate::api::ApiError> {
    let existing = state.api.faculty_courses_for(faculty_id).await?;
    for row in existing {
        state.api.delete_faculty_course(row.id).await?;
    }
    for course_id in course_ids {
        state
            .api
            .create_faculty_course(&FacultyCourseDraft {
                faculty_id,
                course_id: *course_id,
            })
            .await?;
    }
    Ok(())
}

async fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filters: FacultyFilter = match parse_filters(req) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let needs = Needs::faculty().and_faculty_courses();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }
    let unioned: Vec<Faculty> = state
        .store
        .faculty()
        .iter()
        .map(|f| with_union(f, state.store.faculty_courses()))
        .collect();
    let faculty = filter_faculty(&unioned, &filters);
    ok(&req.id, json!({ "total": faculty.len(), "faculty": faculty }))
}

async fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let needs = Needs::faculty()
        .and_faculty_courses()
        .and_courses()
        .and_enrollments();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }

    let Some(member) = state.store.faculty().iter().find(|f| f.id == id) else {
        return err(&req.id, "not_found", format!("no faculty member {id}"), None);
    };
    let member = with_union(member, state.store.faculty_courses());

    let mut taught: Vec<Enrollment> = Vec::new();
    let mut courses: Vec<serde_json::Value> = Vec::new();
    for course_id in &member.assigned_courses {
        let Some(course) = state.store.courses().iter().find(|c| c.id == *course_id) else {
            continue;
        };
        let roster: Vec<Enrollment> = state
            .store
            .enrollments()
            .iter()
            .filter(|e| e.course_id == *course_id)
            .cloned()
            .collect();
        let mut course_out = course.clone();
        course_out.enrollment_count = roster.len() as i64;
        courses.push(json!({
            "course": course_out,
            "averageGradePoints": calc::round_off_2_decimals(calc::course_average_points(&roster)),
        }));
        taught.extend(roster);
    }

    ok(
        &req.id,
        json!({
            "faculty": member,
            "courses": courses,
            "distinctStudents": calc::distinct_student_count(&taught),
            "averageGradePoints": calc::round_off_2_decimals(calc::course_average_points(&taught)),
        }),
    )
}

async fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let draft: FacultyDraft = match required_obj(req, "faculty") {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let course_ids = match parse_course_ids(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let member = match state.api.create_faculty(&draft).await {
        Ok(m) => m,
        Err(e) => return api_err(req, &e),
    };
    if let Err(e) = rewrite_join_rows(state, member.id, &course_ids).await {
        state.store.invalidate(Collection::Faculty);
        state.store.invalidate(Collection::FacultyCourses);
        return api_err(req, &e);
    }
    state.store.invalidate(Collection::Faculty);
    state.store.invalidate(Collection::FacultyCourses);
    ok(
        &req.id,
        json!({ "faculty": member, "assignedCourses": course_ids }),
    )
}

async fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let draft: FacultyDraft = match required_obj(req, "faculty") {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let course_ids = match parse_course_ids(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let member = match state.api.update_faculty(id, &draft).await {
        Ok(m) => m,
        Err(e) => return api_err(req, &e),
    };
    if let Err(e) = rewrite_join_rows(state, id, &course_ids).await {
        state.store.invalidate(Collection::Faculty);
        state.store.invalidate(Collection::FacultyCourses);
        return api_err(req, &e);
    }
    state.store.invalidate(Collection::Faculty);
    state.store.invalidate(Collection::FacultyCourses);
    ok(
        &req.id,
        json!({ "faculty": member, "assignedCourses": course_ids }),
    )
}

async fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_i64(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // Join rows go first so a partial failure cannot leave rows pointing at
    // a deleted member.
    if let Err(e) = rewrite_join_rows(state, id, &[]).await {
        state.store.invalidate(Collection::FacultyCourses);
        return api_err(req, &e);
    }
    match state.api.delete_faculty(id).await {
        Ok(()) => {
            state.store.invalidate(Collection::Faculty);
            state.store.invalidate(Collection::FacultyCourses);
            ok(&req.id, json!({ "deleted": id }))
        }
        Err(e) => {
            state.store.invalidate(Collection::FacultyCourses);
            api_err(req, &e)
        }
    }
}

fn faculty_row(member: &Faculty) -> export::Row {
    vec![
        ("Faculty ID".to_string(), member.faculty_id.clone()),
        ("Name".to_string(), member.name.clone()),
        ("Email".to_string(), member.email.clone()),
        (
            "Department".to_string(),
            member.department.clone().unwrap_or_default(),
        ),
        (
            "Designation".to_string(),
            member.designation.clone().unwrap_or_default(),
        ),
        (
            "Courses".to_string(),
            member.assigned_courses.len().to_string(),
        ),
        ("Status".to_string(), member.status.as_str().to_string()),
    ]
}

async fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let filters: FacultyFilter = match parse_filters(req) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let needs = Needs::faculty().and_faculty_courses();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }
    let unioned: Vec<Faculty> = state
        .store
        .faculty()
        .iter()
        .map(|f| with_union(f, state.store.faculty_courses()))
        .collect();
    let faculty = filter_faculty(&unioned, &filters);
    let rows: Vec<export::Row> = faculty.iter().map(faculty_row).collect();
    match export::write_csv(Path::new(&path), &rows) {
        Ok(n) => ok(&req.id, json!({ "path": path, "rows": n })),
        Err(e) => err(&req.id, "export_failed", format!("{e:#}"), None),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "faculty.list" => Some(handle_list(state, req).await),
        "faculty.get" => Some(handle_get(state, req).await),
        "faculty.create" => Some(handle_create(state, req).await),
        "faculty.update" => Some(handle_update(state, req).await),
        "faculty.delete" => Some(handle_delete(state, req).await),
        "faculty.export" => Some(handle_export(state, req).await),
        _ => None,
    }
}
