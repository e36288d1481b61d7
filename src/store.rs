use crate::api::{Api, ApiError};
use crate::model::{Course, Enrollment, Faculty, FacultyCourse, Student};

/// Which collections a request needs primed before it can run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Needs {
    pub students: bool,
    pub courses: bool,
    pub faculty: bool,
    pub enrollments: bool,
    pub faculty_courses: bool,
}

impl Needs {
    pub fn students() -> Self {
        Needs {
            students: true,
            ..Default::default()
        }
    }

    pub fn courses() -> Self {
        Needs {
            courses: true,
            ..Default::default()
        }
    }

    pub fn faculty() -> Self {
        Needs {
            faculty: true,
            ..Default::default()
        }
    }

    pub fn enrollments() -> Self {
        Needs {
            enrollments: true,
            ..Default::default()
        }
    }

    pub fn and_students(mut self) -> Self {
        self.students = true;
        self
    }

    pub fn and_courses(mut self) -> Self {
        self.courses = true;
        self
    }

    pub fn and_faculty(mut self) -> Self {
        self.faculty = true;
        self
    }

    pub fn and_enrollments(mut self) -> Self {
        self.enrollments = true;
        self
    }

    pub fn and_faculty_courses(mut self) -> Self {
        self.faculty_courses = true;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Collection {
    Students,
    Courses,
    Faculty,
    Enrollments,
    FacultyCourses,
}

async fn maybe<T, F>(go: bool, fut: F) -> Result<Option<Vec<T>>, ApiError>
where
    F: std::future::Future<Output = Result<Vec<T>, ApiError>>,
{
    if go {
        fut.await.map(Some)
    } else {
        Ok(None)
    }
}

/// Read-through cache over the remote collections. Views recompute from the
/// cached slices; mutations invalidate what they touched.
#[derive(Default)]
pub struct Store {
    students: Option<Vec<Student>>,
    courses: Option<Vec<Course>>,
    faculty: Option<Vec<Faculty>>,
    enrollments: Option<Vec<Enrollment>>,
    faculty_courses: Option<Vec<FacultyCourse>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch every missing requested collection concurrently. All fetches
    /// settle or the join fails as a whole; nothing partial is cached on
    /// failure.
    pub async fn prime(&mut self, api: &dyn Api, needs: Needs) -> Result<(), ApiError> {
        let (students, courses, faculty, enrollments, faculty_courses) = tokio::try_join!(
            maybe(needs.students && self.students.is_none(), api.students()),
            maybe(needs.courses && self.courses.is_none(), api.courses()),
            maybe(needs.faculty && self.faculty.is_none(), api.faculty()),
            maybe(
                needs.enrollments && self.enrollments.is_none(),
                api.enrollments()
            ),
            maybe(
                needs.faculty_courses && self.faculty_courses.is_none(),
                api.faculty_courses()
            ),
        )?;
        if let Some(v) = students {
            self.students = Some(v);
        }
        if let Some(v) = courses {
            self.courses = Some(v);
        }
        if let Some(v) = faculty {
            self.faculty = Some(v);
        }
        if let Some(v) = enrollments {
            self.enrollments = Some(v);
        }
        if let Some(v) = faculty_courses {
            self.faculty_courses = Some(v);
        }
        Ok(())
    }

    // Accessors are only meaningful after a prime that requested the
    // collection; an unprimed collection reads as empty.

    pub fn students(&self) -> &[Student] {
        self.students.as_deref().unwrap_or(&[])
    }

    pub fn courses(&self) -> &[Course] {
        self.courses.as_deref().unwrap_or(&[])
    }

    pub fn faculty(&self) -> &[Faculty] {
        self.faculty.as_deref().unwrap_or(&[])
    }

    pub fn enrollments(&self) -> &[Enrollment] {
        self.enrollments.as_deref().unwrap_or(&[])
    }

    pub fn faculty_courses(&self) -> &[FacultyCourse] {
        self.faculty_courses.as_deref().unwrap_or(&[])
    }

    pub fn invalidate(&mut self, collection: Collection) {
        match collection {
            Collection::Students => self.students = None,
            Collection::Courses => self.courses = None,
            Collection::Faculty => self.faculty = None,
            Collection::Enrollments => self.enrollments = None,
            Collection::FacultyCourses => self.faculty_courses = None,
        }
    }

    /// Upsert a freshly patched enrollment into the cache instead of
    /// refetching the whole collection.
    pub fn merge_enrollment(&mut self, enrollment: Enrollment) {
        if let Some(cached) = self.enrollments.as_mut() {
            match cached.iter_mut().find(|e| e.id == enrollment.id) {
                Some(slot) => *slot = enrollment,
                None => cached.push(enrollment),
            }
        }
    }
}
