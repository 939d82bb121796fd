pub mod applications;
pub mod auth;
pub mod payments;
pub mod tuitions;
pub mod users;
