//! Types for authentication and user management

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Backend identifier of a user
pub type UserId = i64;

/// User data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub id: UserId,

    /// First name
    #[serde(default)]
    pub first_name: String,

    /// Last name
    #[serde(default)]
    pub last_name: String,

    /// The user's email address
    pub email: String,

    /// The user's phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Whether the account has been verified; the backend sends `0/1` or a boolean
    #[serde(
        default,
        deserialize_with = "deserialize_flag",
        serialize_with = "serialize_flag"
    )]
    pub verified: bool,

    /// Whether the user can open the admin panel
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_admin: bool,
}

impl User {
    /// "First Last", trimmed
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Accepts `true`/`false`, `0`/`1`, `"0"`/`"1"` and `null`
pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::Number(n)) => n.as_i64().map(|n| n != 0).unwrap_or(false),
        Some(serde_json::Value::String(s)) => matches!(s.as_str(), "1" | "true" | "True"),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "invalid flag value: {}",
                other
            )))
        }
    })
}

/// The backend stores `verified` as an integer column
fn serialize_flag<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}

/// Registration form
#[derive(Debug, Clone, Serialize)]
pub struct RegisterData {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Login email, unique on the backend
    pub email: String,
    /// Plain password; hashed server-side
    pub password: String,
    /// Optional contact phone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Sign-in credentials
#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Payload of `POST /login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// The signed-in user
    #[serde(default)]
    pub user: Option<User>,
    /// Opaque bearer token
    #[serde(default)]
    pub token: Option<String>,
    /// Failure reported with a 2xx status
    #[serde(default)]
    pub error: Option<String>,
}

/// Partial user update for `PATCH /user/:id`
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    /// New given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// New email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New phone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// New password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Sent as `1`/`0`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<u8>,
}

impl UserUpdate {
    /// Mark the account verified
    pub fn verified() -> Self {
        Self {
            verified: Some(1),
            ..Default::default()
        }
    }

    /// Replace the password
    pub fn password(password: &str) -> Self {
        Self {
            password: Some(password.to_string()),
            ..Default::default()
        }
    }
}

/// One-time verification code record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthCode {
    /// Backend id of the code record
    #[serde(default)]
    pub id: Option<i64>,
    /// Owner of the code
    pub user: UserId,
    /// The six-digit code, when the backend echoes it
    #[serde(default)]
    pub token: Option<String>,
}

/// Response of the code issuance endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct AuthCodeEnvelope {
    /// Human-readable outcome
    #[serde(default)]
    pub message: Option<String>,
    /// The issued code record
    #[serde(default)]
    pub data: Option<AuthCode>,
}

/// Response of the verify call
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationResponse {
    /// Whether the code matched
    #[serde(default)]
    pub success: bool,
    /// Reason for a mismatch
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_verified_flag_accepts_int_and_bool() {
        let user: User = serde_json::from_value(json!({
            "id": 1, "first_name": "Ana", "last_name": "Pérez",
            "email": "ana@example.com", "verified": 1
        }))
        .unwrap();
        assert!(user.verified);
        assert!(!user.is_admin);

        let user: User = serde_json::from_value(json!({
            "id": 2, "email": "b@example.com", "verified": false, "is_admin": true
        }))
        .unwrap();
        assert!(!user.verified);
        assert!(user.is_admin);
    }

    #[test]
    fn test_user_serializes_verified_as_integer() {
        let user = User {
            id: 3,
            first_name: "Ana".into(),
            last_name: "".into(),
            email: "ana@example.com".into(),
            phone: None,
            verified: true,
            is_admin: false,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["verified"], json!(1));
        assert!(value.get("password").is_none());
        assert_eq!(user.full_name(), "Ana");
    }
}
