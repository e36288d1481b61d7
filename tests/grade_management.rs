
use std::sync::atomic::Ordering;

use registrard::ipc::handle_request;
use serde_json::json;
use test_support::*;

fn seed() -> FakeApi {
    let api = FakeApi::new();
    api.add_student(student(1, "Ada Lovelace", 3.9));
    api.add_student(student(2, "Grace Hopper", 3.5));
    api.add_course(course(10, "CS101", "Intro to Programming", None));
    api.add_enrollment(enrollment(100, 1, 10, None));
    api.add_enrollment(enrollment(101, 2, 10, None));
    api
}

#[tokio::test]
async fn set_grade_patches_and_merges_without_a_refetch() {
    let (mut state, api) = state_with(seed());

    let list = handle_request(&mut state, request("r1", "enrollments.list", json!({}))).await;
    assert_eq!(list["ok"], json!(true));
    assert_eq!(api.enrollment_list_fetches.load(Ordering::SeqCst), 1);

    let resp = handle_request(
        &mut state,
        request(
            "r2",
            "enrollments.setGrade",
            json!({ "enrollmentId": 100, "grade": "A-" }),
        ),
    )
    .await;
    assert_eq!(resp["ok"], json!(true));
    assert_eq!(resp["result"]["enrollment"]["grade"], json!("A-"));

    // The cached list reflects the patch without another collection fetch.
    let list = handle_request(&mut state, request("r3", "enrollments.list", json!({}))).await;
    let rows = list["result"]["enrollments"].as_array().unwrap();
    let patched = rows
        .iter()
        .find(|r| r["enrollmentId"] == json!(100))
        .unwrap();
    assert_eq!(patched["grade"], json!("A-"));
    assert_eq!(api.enrollment_list_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn grade_can_be_cleared_with_null() {
    let api = seed();
    api.add_enrollment(enrollment(102, 1, 10, Some("B")));
    let (mut state, api) = state_with(api);

    let resp = handle_request(
        &mut state,
        request(
            "r1",
            "enrollments.setGrade",
            json!({ "enrollmentId": 102, "grade": null }),
        ),
    )
    .await;
    assert_eq!(resp["ok"], json!(true));
    assert_eq!(resp["result"]["enrollment"]["grade"], json!(null));
    let row = api
        .enrollment_rows()
        .into_iter()
        .find(|e| e.id == 102)
        .unwrap();
    assert!(row.grade.is_none());
}

#[tokio::test]
async fn unknown_grade_strings_are_rejected() {
    let (mut state, api) = state_with(seed());

    let resp = handle_request(
        &mut state,
        request(
            "r1",
            "enrollments.setGrade",
            json!({ "enrollmentId": 100, "grade": "A+" }),
        ),
    )
    .await;
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("bad_params"));
    let row = api
        .enrollment_rows()
        .into_iter()
        .find(|e| e.id == 100)
        .unwrap();
    assert!(row.grade.is_none());
}

#[tokio::test]
async fn missing_enrollment_maps_to_not_found() {
    let (mut state, _api) = state_with(seed());

    let resp = handle_request(
        &mut state,
        request(
            "r1",
            "enrollments.setGrade",
            json!({ "enrollmentId": 999, "grade": "B" }),
        ),
    )
    .await;
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("not_found"));
}

#[tokio::test]
async fn save_grades_patches_the_whole_batch() {
    let (mut state, api) = state_with(seed());

    let resp = handle_request(
        &mut state,
        request(
            "r1",
            "enrollments.saveGrades",
            json!({ "grades": [
                { "enrollmentId": 100, "grade": "A" },
                { "enrollmentId": 101, "grade": "C+" },
            ]}),
        ),
    )
    .await;
    assert_eq!(resp["ok"], json!(true));
    assert_eq!(resp["result"]["updatedIds"], json!([100, 101]));

    let rows = api.enrollment_rows();
    assert_eq!(
        rows.iter().find(|e| e.id == 100).unwrap().grade.as_deref(),
        Some("A")
    );
    assert_eq!(
        rows.iter().find(|e| e.id == 101).unwrap().grade.as_deref(),
        Some("C+")
    );
}

#[tokio::test]
async fn save_grades_validates_before_writing_anything() {
    let (mut state, api) = state_with(seed());

    let resp = handle_request(
        &mut state,
        request(
            "r1",
            "enrollments.saveGrades",
            json!({ "grades": [
                { "enrollmentId": 100, "grade": "A" },
                { "enrollmentId": 101, "grade": "excellent" },
            ]}),
        ),
    )
    .await;
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("bad_params"));
    assert!(api.enrollment_rows().iter().all(|e| e.grade.is_none()));
}
