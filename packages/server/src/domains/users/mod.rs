pub mod models;

pub use models::user::{AdminUpdateUser, NewUser, PublicTutor, Role, UpdateProfile, User};
