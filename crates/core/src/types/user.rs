//! User identity types.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// The authenticated shop customer, as returned by the profile endpoint and
/// persisted locally as the user snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    pub email: Email,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

impl User {
    /// Name to greet the customer with: full name when set, email otherwise.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.full_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => {
                let joined = format!("{} {}", self.first_name, self.last_name);
                let trimmed = joined.trim();
                if trimmed.is_empty() {
                    self.email.to_string()
                } else {
                    trimmed.to_owned()
                }
            }
        }
    }
}

/// Shipping and contact details attached to the customer account.
///
/// The remote API serializes absent values as empty strings, so every field
/// defaults rather than being optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub address_line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub postal_code: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserializes_profile_payload() {
        let json = r#"{
            "id": 12,
            "username": "maria@example.com",
            "email": "maria@example.com",
            "first_name": "María",
            "last_name": "López",
            "full_name": "María López",
            "profile": {
                "phone": "+502 5555-1234",
                "address": "4a Calle 12-45, Zona 10",
                "address_line2": "",
                "city": "Guatemala",
                "department": "Guatemala",
                "postal_code": "01010"
            }
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new(12));
        assert_eq!(user.display_name(), "María López");
        assert_eq!(user.profile.unwrap().city, "Guatemala");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let json = r#"{"id": 1, "email": "ana@example.com"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.display_name(), "ana@example.com");
    }
}
