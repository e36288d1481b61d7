use std::collections::HashSet;

use serde::Deserialize;
use serde_json::json;

use crate::filter::EnrollmentFilter;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{api_err, parse_filters, prime, required_i64, required_obj};
use crate::ipc::types::{AppState, Request};
use crate::model::{EnrollmentDraft, Grade};
use crate::store::{Collection, Needs};

async fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let filters: EnrollmentFilter = match parse_filters(req) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let needs = Needs::enrollments().and_students().and_courses();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }

    let rows: Vec<serde_json::Value> = state
        .store
        .enrollments()
        .iter()
        .filter_map(|e| {
            let student = state.store.students().iter().find(|s| s.id == e.student_id);
            let course = state.store.courses().iter().find(|c| c.id == e.course_id);
            if !filters.matches(e, student, course) {
                return None;
            }
            Some(json!({
                "enrollmentId": e.id,
                "studentId": e.student_id,
                "studentName": student.map(|s| s.name.clone()),
                "studentCode": student.map(|s| s.student_id.clone()),
                "courseId": e.course_id,
                "courseCode": course.map(|c| c.course_code.clone()),
                "courseTitle": course.map(|c| c.title.clone()),
                "grade": e.grade,
                "semester": e.semester,
            }))
        })
        .collect();

    ok(&req.id, json!({ "total": rows.len(), "enrollments": rows }))
}

/// Batch course assignment. Pairs already present in the loaded enrollment
/// state are skipped; when every requested pair already exists the request
/// is rejected outright and nothing is written.
async fn handle_assign(state: &mut AppState, req: &Request) -> serde_json::Value {
    let course_id = match required_i64(req, "courseId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let student_ids: Vec<i64> = match required_obj(req, "studentIds") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if student_ids.is_empty() {
        return err(&req.id, "bad_params", "studentIds must be non-empty", None);
    }
    let semester = req
        .params
        .get("semester")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    if let Err(resp) = prime(state, req, Needs::enrollments()).await {
        return resp;
    }
    let existing: HashSet<(i64, i64)> = state
        .store
        .enrollments()
        .iter()
        .map(|e| (e.student_id, e.course_id))
        .collect();

    // Every submitted id lands in exactly one of the two response lists;
    // an id repeated within the request is skipped on its later occurrences.
    let mut seen = HashSet::new();
    let mut new_ids = Vec::new();
    let mut skipped = Vec::new();
    for sid in student_ids {
        if !seen.insert(sid) || existing.contains(&(sid, course_id)) {
            skipped.push(sid);
        } else {
            new_ids.push(sid);
        }
    }

    if new_ids.is_empty() {
        return err(
            &req.id,
            "already_enrolled",
            "all selected students are already enrolled in this course",
            Some(json!({ "skippedStudentIds": skipped })),
        );
    }

    let now = chrono::Utc::now().to_rfc3339();
    let mut created_ids = Vec::new();
    for sid in &new_ids {
        let draft = EnrollmentDraft {
            student_id: *sid,
            course_id,
            enrollment_date: now.clone(),
            grade: None,
            semester: semester.clone(),
        };
        match state.api.create_enrollment(&draft).await {
            Ok(created) => created_ids.push(created.id),
            Err(e) => {
                // Partial failure: tell the caller what did land.
                state.store.invalidate(Collection::Enrollments);
                return err(
                    &req.id,
                    e.code(),
                    e.to_string(),
                    Some(json!({ "createdIds": created_ids })),
                );
            }
        }
    }
    state.store.invalidate(Collection::Enrollments);

    ok(
        &req.id,
        json!({ "createdIds": created_ids, "skippedStudentIds": skipped }),
    )
}

fn validate_grade(req: &Request, grade: &Option<String>) -> Option<serde_json::Value> {
    match grade.as_deref() {
        Some(raw) if Grade::parse(raw).is_none() => Some(err(
            &req.id,
            "bad_params",
            format!("unknown grade '{raw}'"),
            None,
        )),
        _ => None,
    }
}

async fn handle_set_grade(state: &mut AppState, req: &Request) -> serde_json::Value {
    let enrollment_id = match required_i64(req, "enrollmentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let grade = match req.params.get("grade") {
        None => return err(&req.id, "bad_params", "missing grade", None),
        Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return err(&req.id, "bad_params", "grade must be a string or null", None);
        }
    };
    if let Some(resp) = validate_grade(req, &grade) {
        return resp;
    }

    match state
        .api
        .set_enrollment_grade(enrollment_id, grade.as_deref())
        .await
    {
        Ok(updated) => {
            state.store.merge_enrollment(updated.clone());
            ok(&req.id, json!({ "enrollment": updated }))
        }
        Err(e) => api_err(req, &e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GradeUpdate {
    enrollment_id: i64,
    grade: Option<String>,
}

async fn handle_save_grades(state: &mut AppState, req: &Request) -> serde_json::Value {
    let updates: Vec<GradeUpdate> = match required_obj(req, "grades") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if updates.is_empty() {
        return err(&req.id, "bad_params", "grades must be non-empty", None);
    }
    for update in &updates {
        if let Some(resp) = validate_grade(req, &update.grade) {
            return resp;
        }
    }

    let mut updated_ids = Vec::new();
    for update in &updates {
        match state
            .api
            .set_enrollment_grade(update.enrollment_id, update.grade.as_deref())
            .await
        {
            Ok(patched) => {
                updated_ids.push(patched.id);
                state.store.merge_enrollment(patched);
            }
            Err(e) => {
                return err(
                    &req.id,
                    e.code(),
                    e.to_string(),
                    Some(json!({ "updatedIds": updated_ids })),
                );
            }
        }
    }

    ok(&req.id, json!({ "updatedIds": updated_ids }))
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "enrollments.list" => Some(handle_list(state, req).await),
        "enrollments.assign" => Some(handle_assign(state, req).await),
        "enrollments.setGrade" => Some(handle_set_grade(state, req).await),
        "enrollments.saveGrades" => Some(handle_save_grades(state, req).await),
        _ => None,
    }
}
