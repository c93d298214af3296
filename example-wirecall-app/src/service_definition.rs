mod user;

pub use user::{USER_SERVICE, User, user_methods};
