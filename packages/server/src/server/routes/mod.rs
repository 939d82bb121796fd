pub mod applications;
pub mod auth;
pub mod health;
pub mod payments;
pub mod tuitions;
pub mod users;

pub use applications::{
    create_application_handler, delete_application_handler, list_applications_handler,
    select_application_handler, update_application_handler,
};
pub use auth::{signup_handler, token_handler};
pub use health::health_handler;
pub use payments::{create_checkout_handler, list_payments_handler, payment_callback_handler};
pub use tuitions::{
    create_tuition_handler, delete_tuition_handler, list_tuitions_handler,
    moderate_tuition_handler, public_tuitions_handler, tuition_details_handler,
    update_tuition_handler,
};
pub use users::{
    admin_delete_user_handler, admin_update_user_handler, delete_me_handler, list_users_handler,
    me_handler, public_tutors_handler, update_me_handler,
};
