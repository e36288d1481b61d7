use std::path::Path;

use serde_json::json;

use crate::calc::{self, CoursePerformer};
use crate::export;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{prime, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{Course, Enrollment, Student};
use crate::store::Needs;

const PERFORMERS_PER_COURSE: usize = 10;

struct PerformerBlock {
    course_id: i64,
    course_code: String,
    title: String,
    average_gpa: f64,
    performers: Vec<CoursePerformer>,
}

/// One block per course, ordered by the mean stored gpa of the enrolled
/// students descending (stable), each holding the course's top performers.
fn performer_blocks(
    courses: &[Course],
    enrollments: &[Enrollment],
    students: &[Student],
) -> Vec<PerformerBlock> {
    let mut blocks: Vec<PerformerBlock> = courses
        .iter()
        .map(|c| {
            let mut performers =
                calc::course_top_performers(c.id, enrollments, students, usize::MAX);
            let average_gpa = if performers.is_empty() {
                0.0
            } else {
                performers.iter().map(|p| p.gpa).sum::<f64>() / (performers.len() as f64)
            };
            performers.truncate(PERFORMERS_PER_COURSE);
            PerformerBlock {
                course_id: c.id,
                course_code: c.course_code.clone(),
                title: c.title.clone(),
                average_gpa,
                performers,
            }
        })
        .collect();
    blocks.sort_by(|a, b| {
        b.average_gpa
            .partial_cmp(&a.average_gpa)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    blocks
}

async fn handle_enrollment_trends(state: &mut AppState, req: &Request) -> serde_json::Value {
    let needs = Needs::courses().and_enrollments();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }
    let ranked = calc::top_courses_by_enrollment(
        state.store.courses(),
        state.store.enrollments(),
        state.store.courses().len(),
    );
    let trends: Vec<serde_json::Value> = ranked
        .iter()
        .map(|c| {
            json!({
                "courseId": c.id,
                "courseCode": c.course_code,
                "title": c.title,
                "enrollmentCount": c.enrollment_count,
            })
        })
        .collect();
    ok(&req.id, json!({ "trends": trends }))
}

async fn handle_top_performers(state: &mut AppState, req: &Request) -> serde_json::Value {
    let needs = Needs::courses().and_enrollments().and_students();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }
    let blocks = performer_blocks(
        state.store.courses(),
        state.store.enrollments(),
        state.store.students(),
    );
    let courses: Vec<serde_json::Value> = blocks
        .iter()
        .map(|b| {
            json!({
                "courseId": b.course_id,
                "courseCode": b.course_code,
                "title": b.title,
                "averageGpa": calc::round_off_2_decimals(b.average_gpa),
                "performers": b.performers,
            })
        })
        .collect();
    ok(&req.id, json!({ "courses": courses }))
}

async fn handle_export_enrollments(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let needs = Needs::courses().and_enrollments();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }
    let ranked = calc::top_courses_by_enrollment(
        state.store.courses(),
        state.store.enrollments(),
        state.store.courses().len(),
    );
    let rows: Vec<export::Row> = ranked
        .iter()
        .map(|c| {
            vec![
                ("courseName".to_string(), c.title.clone()),
                (
                    "enrollmentCount".to_string(),
                    c.enrollment_count.to_string(),
                ),
            ]
        })
        .collect();
    match export::write_csv(Path::new(&path), &rows) {
        Ok(n) => ok(&req.id, json!({ "path": path, "rows": n })),
        Err(e) => err(&req.id, "export_failed", format!("{e:#}"), None),
    }
}

async fn handle_export_top_performers(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let needs = Needs::courses().and_enrollments().and_students();
    if let Err(resp) = prime(state, req, needs).await {
        return resp;
    }
    let blocks = performer_blocks(
        state.store.courses(),
        state.store.enrollments(),
        state.store.students(),
    );
    let mut rows: Vec<export::Row> = Vec::new();
    for block in blocks {
        for p in block.performers {
            rows.push(vec![
                ("Course".to_string(), block.title.clone()),
                ("Student".to_string(), p.student_name),
                ("GPA".to_string(), p.gpa.to_string()),
                ("Grade".to_string(), p.grade.unwrap_or_default()),
            ]);
        }
    }
    match export::write_csv(Path::new(&path), &rows) {
        Ok(n) => ok(&req.id, json!({ "path": path, "rows": n })),
        Err(e) => err(&req.id, "export_failed", format!("{e:#}"), None),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.enrollmentTrends" => Some(handle_enrollment_trends(state, req).await),
        "reports.topPerformers" => Some(handle_top_performers(state, req).await),
        "reports.exportEnrollments" => Some(handle_export_enrollments(state, req).await),
        "reports.exportTopPerformers" => Some(handle_export_top_performers(state, req).await),
        _ => None,
    }
}
