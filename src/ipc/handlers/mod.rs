pub mod core;
pub mod courses;
pub mod dashboard;
pub mod enrollments;
pub mod faculty;
pub mod reports;
pub mod students;
