//! Account and profile models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ROLE_CUSTOMER: &str = "customer";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub email: String,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub sex: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "contactnumber")]
    pub contact_number: Option<String>,
    pub updated_at: String,
}

/// Editable profile fields, shared by registration and the profile endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileFields {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub sex: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "contactnumber")]
    pub contact_number: Option<String>,
}

impl ProfileFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.sex.is_none()
            && self.address.is_none()
            && self.contact_number.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub email: Option<String>,
    #[serde(flatten)]
    pub fields: ProfileFields,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    pub email: Option<String>,
}
