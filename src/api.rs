use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::config::Config;
use crate::model::{
    Course, CourseDraft, Enrollment, EnrollmentDraft, Faculty, FacultyCourse, FacultyCourseDraft,
    FacultyDraft, Student, StudentDraft,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("remote source unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("no record at {path}")]
    NotFound { path: String },
    #[error("remote source returned {status} for {path}")]
    Status { status: StatusCode, path: String },
    #[error("could not decode response from {path}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unreachable(_) => "api_unreachable",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Status { .. } | ApiError::Decode { .. } => "api_error",
        }
    }
}

/// Typed face of the remote JSON-REST source. Object safe so the daemon can
/// hold an `Arc<dyn Api>` and tests can substitute an in-memory fake.
#[async_trait]
pub trait Api: Send + Sync {
    async fn students(&self) -> Result<Vec<Student>, ApiError>;
    async fn student(&self, id: i64) -> Result<Student, ApiError>;
    async fn create_student(&self, draft: &StudentDraft) -> Result<Student, ApiError>;
    async fn update_student(&self, id: i64, draft: &StudentDraft) -> Result<Student, ApiError>;
    async fn delete_student(&self, id: i64) -> Result<(), ApiError>;

    async fn courses(&self) -> Result<Vec<Course>, ApiError>;
    async fn course(&self, id: i64) -> Result<Course, ApiError>;
    async fn courses_by_faculty(&self, faculty_id: i64) -> Result<Vec<Course>, ApiError>;
    async fn create_course(&self, draft: &CourseDraft) -> Result<Course, ApiError>;
    async fn update_course(&self, id: i64, draft: &CourseDraft) -> Result<Course, ApiError>;
    async fn delete_course(&self, id: i64) -> Result<(), ApiError>;

    async fn faculty(&self) -> Result<Vec<Faculty>, ApiError>;
    async fn faculty_member(&self, id: i64) -> Result<Faculty, ApiError>;
    async fn create_faculty(&self, draft: &FacultyDraft) -> Result<Faculty, ApiError>;
    async fn update_faculty(&self, id: i64, draft: &FacultyDraft) -> Result<Faculty, ApiError>;
    async fn delete_faculty(&self, id: i64) -> Result<(), ApiError>;

    async fn enrollments(&self) -> Result<Vec<Enrollment>, ApiError>;
    async fn enrollments_by_course(&self, course_id: i64) -> Result<Vec<Enrollment>, ApiError>;
    async fn enrollments_by_student(&self, student_id: i64) -> Result<Vec<Enrollment>, ApiError>;
    async fn create_enrollment(&self, draft: &EnrollmentDraft) -> Result<Enrollment, ApiError>;
    async fn set_enrollment_grade(
        &self,
        id: i64,
        grade: Option<&str>,
    ) -> Result<Enrollment, ApiError>;
    async fn delete_enrollment(&self, id: i64) -> Result<(), ApiError>;

    async fn faculty_courses(&self) -> Result<Vec<FacultyCourse>, ApiError>;
    async fn faculty_courses_for(&self, faculty_id: i64) -> Result<Vec<FacultyCourse>, ApiError>;
    async fn create_faculty_course(
        &self,
        draft: &FacultyCourseDraft,
    ) -> Result<FacultyCourse, ApiError>;
    async fn delete_faculty_course(&self, id: i64) -> Result<(), ApiError>;
}

/// reqwest-backed client for a json-server style REST source.
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(
        &self,
        req: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let resp = req.send().await.map_err(ApiError::Unreachable)?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            warn!(%status, path, "remote source rejected request");
            return Err(ApiError::Status {
                status,
                path: path.to_string(),
            });
        }
        Ok(resp)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        let resp = self.execute(req, path).await?;
        resp.json::<T>().await.map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(self.http.get(self.url(path)), path).await
    }

    async fn post<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.fetch(self.http.post(self.url(path)).json(body), path)
            .await
    }

    async fn put<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.fetch(self.http.put(self.url(path)).json(body), path)
            .await
    }

    async fn patch<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.fetch(self.http.patch(self.url(path)).json(body), path)
            .await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(self.http.delete(self.url(path)), path).await?;
        Ok(())
    }
}

#[async_trait]
impl Api for RestClient {
    async fn students(&self) -> Result<Vec<Student>, ApiError> {
        self.get("/students").await
    }

    async fn student(&self, id: i64) -> Result<Student, ApiError> {
        self.get(&format!("/students/{id}")).await
    }

    async fn create_student(&self, draft: &StudentDraft) -> Result<Student, ApiError> {
        self.post("/students", draft).await
    }

    async fn update_student(&self, id: i64, draft: &StudentDraft) -> Result<Student, ApiError> {
        self.put(&format!("/students/{id}"), draft).await
    }

    async fn delete_student(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/students/{id}")).await
    }

    async fn courses(&self) -> Result<Vec<Course>, ApiError> {
        self.get("/courses").await
    }

    async fn course(&self, id: i64) -> Result<Course, ApiError> {
        self.get(&format!("/courses/{id}")).await
    }

    async fn courses_by_faculty(&self, faculty_id: i64) -> Result<Vec<Course>, ApiError> {
        self.get(&format!("/courses?facultyId={faculty_id}")).await
    }

    async fn create_course(&self, draft: &CourseDraft) -> Result<Course, ApiError> {
        self.post("/courses", draft).await
    }

    async fn update_course(&self, id: i64, draft: &CourseDraft) -> Result<Course, ApiError> {
        self.put(&format!("/courses/{id}"), draft).await
    }

    async fn delete_course(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/courses/{id}")).await
    }

    async fn faculty(&self) -> Result<Vec<Faculty>, ApiError> {
        self.get("/faculty").await
    }

    async fn faculty_member(&self, id: i64) -> Result<Faculty, ApiError> {
        self.get(&format!("/faculty/{id}")).await
    }

    async fn create_faculty(&self, draft: &FacultyDraft) -> Result<Faculty, ApiError> {
        self.post("/faculty", draft).await
    }

    async fn update_faculty(&self, id: i64, draft: &FacultyDraft) -> Result<Faculty, ApiError> {
        self.put(&format!("/faculty/{id}"), draft).await
    }

    async fn delete_faculty(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/faculty/{id}")).await
    }

    async fn enrollments(&self) -> Result<Vec<Enrollment>, ApiError> {
        self.get("/enrollments").await
    }

    async fn enrollments_by_course(&self, course_id: i64) -> Result<Vec<Enrollment>, ApiError> {
        self.get(&format!("/enrollments?courseId={course_id}")).await
    }

    async fn enrollments_by_student(&self, student_id: i64) -> Result<Vec<Enrollment>, ApiError> {
        self.get(&format!("/enrollments?studentId={student_id}"))
            .await
    }

    async fn create_enrollment(&self, draft: &EnrollmentDraft) -> Result<Enrollment, ApiError> {
        self.post("/enrollments", draft).await
    }

    async fn set_enrollment_grade(
        &self,
        id: i64,
        grade: Option<&str>,
    ) -> Result<Enrollment, ApiError> {
        self.patch(
            &format!("/enrollments/{id}"),
            &serde_json::json!({ "grade": grade }),
        )
        .await
    }

    async fn delete_enrollment(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/enrollments/{id}")).await
    }

    async fn faculty_courses(&self) -> Result<Vec<FacultyCourse>, ApiError> {
        self.get("/faculty-courses").await
    }

    async fn faculty_courses_for(&self, faculty_id: i64) -> Result<Vec<FacultyCourse>, ApiError> {
        self.get(&format!("/faculty-courses?facultyId={faculty_id}"))
            .await
    }

    async fn create_faculty_course(
        &self,
        draft: &FacultyCourseDraft,
    ) -> Result<FacultyCourse, ApiError> {
        self.post("/faculty-courses", draft).await
    }

    async fn delete_faculty_course(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/faculty-courses/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_the_ipc_taxonomy() {
        let not_found = ApiError::NotFound {
            path: "/students/99".to_string(),
        };
        assert_eq!(not_found.code(), "not_found");

        let status = ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            path: "/students".to_string(),
        };
        assert_eq!(status.code(), "api_error");
    }
}
