use serde::{Deserialize, Serialize};

pub const USER_SERVICE: &str = "UserService";

pub mod user_methods {
    pub const GET_USER: &str = "getUser";
    pub const GET_NUMBER: &str = "getNumber";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
