//! Database fixtures built through the domain models. Every fixture is
//! unique so tests can share one database without stepping on each other.

use sqlx::PgPool;
use uuid::Uuid;

use server_core::domains::applications::{Application, NewApplication};
use server_core::domains::tuitions::{NewTuition, Tuition};
use server_core::domains::users::{NewUser, Role, User};

pub async fn create_user(pool: &PgPool, role: Role) -> User {
    let tag = Uuid::new_v4();
    User::insert(
        &NewUser {
            firebase_uid: format!("uid-{}", tag),
            email: format!("user-{}@example.test", tag),
            name: format!("Test {}", role.as_str()),
            role: Some(role),
            phone: None,
            location: Some("Dhaka".to_string()),
            bio: None,
        },
        pool,
    )
    .await
    .expect("Failed to create user fixture")
}

pub async fn create_tuition(pool: &PgPool, student: &User, salary: Option<i64>) -> Tuition {
    Tuition::insert(
        student.id,
        &NewTuition {
            title: "Need a math tutor".to_string(),
            class_level: "Class 8".to_string(),
            subject: "Mathematics".to_string(),
            location: "Dhaka".to_string(),
            budget: 5000,
            salary,
        },
        pool,
    )
    .await
    .expect("Failed to create tuition fixture")
}

pub async fn create_application(pool: &PgPool, tuition: &Tuition, tutor: &User) -> Application {
    Application::insert(
        tutor.id,
        &NewApplication {
            tuition_id: tuition.id,
            qualification: Some("BSc in Mathematics".to_string()),
            experience: Some("3 years of tutoring".to_string()),
            expected_salary: Some(4500),
        },
        pool,
    )
    .await
    .expect("Failed to create application fixture")
}
