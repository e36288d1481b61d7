
use registrard::ipc::handle_request;
use serde_json::json;
use test_support::*;

fn seed() -> FakeApi {
    let api = FakeApi::new();
    api.add_student(student(1, "Ada Lovelace", 3.9));
    api.add_student(student(2, "Grace Hopper", 3.9));
    api.add_student(student(3, "Alan Turing", 2.5));
    api.add_faculty(faculty_member(7, "Dr. Byrne"));
    api.add_course(course(10, "CS101", "Intro to Programming", Some(7)));
    api.add_course(course(11, "CS102", "Data Structures", Some(7)));
    api.add_course(course(12, "CS103", "Algorithms", None));
    api.add_enrollment(enrollment(100, 1, 10, Some("A")));
    api.add_enrollment(enrollment(101, 2, 10, Some("A-")));
    api.add_enrollment(enrollment(102, 3, 10, Some("B")));
    api.add_enrollment(enrollment(103, 1, 11, None));
    api.add_enrollment(enrollment(104, 2, 11, Some("B+")));
    api
}

#[tokio::test]
async fn overview_reports_totals_rankings_and_distribution() {
    let (mut state, _api) = state_with(seed());

    let resp = handle_request(&mut state, request("r1", "dashboard.overview", json!({}))).await;
    assert_eq!(resp["ok"], json!(true));
    let result = &resp["result"];

    assert_eq!(result["totals"]["students"], json!(3));
    assert_eq!(result["totals"]["courses"], json!(3));
    assert_eq!(result["totals"]["faculty"], json!(1));
    assert_eq!(result["totals"]["enrollments"], json!(5));

    // Tied gpas keep seed order.
    let top_students = result["topStudents"].as_array().unwrap();
    assert_eq!(top_students[0]["id"], json!(1));
    assert_eq!(top_students[1]["id"], json!(2));
    assert_eq!(top_students[2]["id"], json!(3));

    // Counts come from the enrollment collection, not the stored field.
    let top_courses = result["topCourses"].as_array().unwrap();
    assert_eq!(top_courses[0]["id"], json!(10));
    assert_eq!(top_courses[0]["enrollmentCount"], json!(3));
    assert_eq!(top_courses[1]["id"], json!(11));
    assert_eq!(top_courses[1]["enrollmentCount"], json!(2));

    // Four graded enrollments, one bucket each, ladder order.
    let dist = result["gradeDistribution"].as_array().unwrap();
    let grades: Vec<&str> = dist.iter().map(|b| b["grade"].as_str().unwrap()).collect();
    assert_eq!(grades, vec!["A", "A-", "B+", "B"]);
    for bucket in dist {
        assert_eq!(bucket["count"], json!(1));
        assert_eq!(bucket["percentage"].as_f64(), Some(25.0));
    }
}

#[tokio::test]
async fn department_stats_average_the_stored_gpa() {
    let (mut state, _api) = state_with(seed());

    let resp = handle_request(
        &mut state,
        request("r1", "dashboard.departmentStats", json!({})),
    )
    .await;
    assert_eq!(resp["ok"], json!(true));
    let departments = resp["result"]["departments"].as_array().unwrap();
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0]["department"], json!("Computer Science"));
    assert_eq!(departments[0]["students"], json!(3));
    assert_eq!(departments[0]["courses"], json!(3));
    assert_eq!(departments[0]["faculty"], json!(1));
    // (3.9 + 3.9 + 2.5) / 3, half-up to two decimals.
    assert_eq!(departments[0]["averageGpa"].as_f64(), Some(3.43));
    assert_eq!(resp["result"]["averageGpa"].as_f64(), Some(3.43));
}

#[tokio::test]
async fn unknown_methods_answer_not_implemented() {
    let (mut state, _api) = state_with(FakeApi::new());

    let resp = handle_request(&mut state, request("r1", "dashboard.refresh", json!({}))).await;
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("not_implemented"));
    assert_eq!(resp["id"], json!("r1"));
}
