pub mod models;

pub use models::application::{
    Application, ApplicationStatus, NewApplication, UpdateApplication,
};
