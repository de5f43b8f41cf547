//! User domain model: roles and account status.

use serde::{Deserialize, Serialize};

/// Coarse permission class gating route access.
///
/// A user's role is stamped into their session token at issuance time;
/// role changes only take effect on the next credential exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Volunteer,
    Admin,
}

impl Role {
    /// The lowercase wire name, as stored in user records and token claims.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Volunteer => "volunteer",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account status. Blocked users keep their session tokens until expiry but
/// are refused mutating donation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Blocked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "admin");
        assert_eq!(
            serde_json::from_value::<Role>(serde_json::json!("volunteer")).unwrap(),
            Role::Volunteer
        );
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(UserStatus::Blocked).unwrap(), "blocked");
    }
}
