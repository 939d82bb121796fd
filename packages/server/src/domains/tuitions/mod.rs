pub mod models;

pub use models::tuition::{
    ListingStatus, ModerationStatus, NewTuition, PublicTuition, Tuition, UpdateTuition,
};
