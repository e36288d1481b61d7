
use registrard::ipc::handle_request;
use serde_json::json;
use test_support::*;

fn seed() -> FakeApi {
    let api = FakeApi::new();
    api.add_student(student(1, "Ada Lovelace", 3.9));
    api.add_student(student(2, "Grace Hopper", 3.5));
    api.add_student(student(3, "Alan Turing", 2.5));
    api.add_faculty(faculty_member(7, "Dr. Byrne"));
    api.add_course(course(10, "CS101", "Intro to Programming", Some(7)));
    api.add_course(course(11, "CS102", "Data Structures", None));
    api.add_enrollment(enrollment(100, 1, 10, Some("A")));
    api.add_enrollment(enrollment(101, 2, 10, Some("B")));
    api.add_enrollment(enrollment(102, 3, 10, None));
    api.add_enrollment(enrollment(103, 1, 11, Some("B+")));
    api
}

#[tokio::test]
async fn detail_joins_roster_instructor_and_distribution() {
    let (mut state, _api) = state_with(seed());

    let resp = handle_request(&mut state, request("r1", "courses.get", json!({ "id": 10 }))).await;
    assert_eq!(resp["ok"], json!(true));
    let result = &resp["result"];

    assert_eq!(result["course"]["enrollmentCount"], json!(3));
    assert_eq!(result["instructor"]["name"], json!("Dr. Byrne"));
    assert_eq!(result["students"].as_array().unwrap().len(), 3);
    assert_eq!(result["averageGradePoints"].as_f64(), Some(3.5));

    // Two graded enrollments split the percentage; the null grade is not a
    // bucket.
    let dist = result["gradeDistribution"].as_array().unwrap();
    assert_eq!(dist.len(), 2);
    assert_eq!(dist[0]["grade"], json!("A"));
    assert_eq!(dist[0]["percentage"].as_f64(), Some(50.0));
    assert_eq!(dist[1]["grade"], json!("B"));
}

#[tokio::test]
async fn list_filters_on_the_derived_enrollment_count() {
    let (mut state, _api) = state_with(seed());

    let resp = handle_request(
        &mut state,
        request(
            "r1",
            "courses.list",
            json!({ "filters": { "enrollmentRange": "2-" } }),
        ),
    )
    .await;
    assert_eq!(resp["result"]["total"], json!(1));
    assert_eq!(resp["result"]["courses"][0]["id"], json!(10));
    assert_eq!(resp["result"]["courses"][0]["enrollmentCount"], json!(3));
}

#[tokio::test]
async fn trends_rank_courses_by_derived_count() {
    let (mut state, _api) = state_with(seed());

    let resp = handle_request(
        &mut state,
        request("r1", "reports.enrollmentTrends", json!({})),
    )
    .await;
    assert_eq!(resp["ok"], json!(true));
    let trends = resp["result"]["trends"].as_array().unwrap();
    assert_eq!(trends.len(), 2);
    assert_eq!(trends[0]["courseId"], json!(10));
    assert_eq!(trends[0]["enrollmentCount"], json!(3));
    assert_eq!(trends[1]["courseId"], json!(11));
}

#[tokio::test]
async fn top_performers_rank_by_stored_gpa_per_course() {
    let (mut state, _api) = state_with(seed());

    let resp = handle_request(&mut state, request("r1", "reports.topPerformers", json!({}))).await;
    assert_eq!(resp["ok"], json!(true));
    let courses = resp["result"]["courses"].as_array().unwrap();

    // Course blocks come back ordered by the cohort's mean stored gpa:
    // CS102's only student has 3.9, CS101 averages 3.3.
    assert_eq!(courses[0]["courseId"], json!(11));
    assert_eq!(courses[0]["averageGpa"].as_f64(), Some(3.9));
    assert_eq!(courses[1]["averageGpa"].as_f64(), Some(3.3));

    let cs101 = courses
        .iter()
        .find(|c| c["courseId"] == json!(10))
        .unwrap();
    let performers = cs101["performers"].as_array().unwrap();
    assert_eq!(performers.len(), 3);
    assert_eq!(performers[0]["studentName"], json!("Ada Lovelace"));
    assert_eq!(performers[0]["grade"], json!("A"));
    assert_eq!(performers[2]["studentName"], json!("Alan Turing"));
    assert_eq!(performers[2]["grade"], json!(null));
}

#[tokio::test]
async fn export_top_performers_writes_one_row_per_performer() {
    let (mut state, _api) = state_with(seed());

    let dir = std::env::temp_dir().join("registrard-report-export");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("top_performers.csv");

    let resp = handle_request(
        &mut state,
        request(
            "r1",
            "reports.exportTopPerformers",
            json!({ "path": path.to_string_lossy() }),
        ),
    )
    .await;
    assert_eq!(resp["ok"], json!(true));
    assert_eq!(resp["result"]["rows"], json!(4));

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().next(), Some("Course,Student,GPA,Grade"));
}
