pub mod service_definition;
mod user_service_client;
mod user_service_provider;

pub use service_definition::{USER_SERVICE, User};
pub use user_service_client::UserServiceClient;
pub use user_service_provider::register_user_service;
