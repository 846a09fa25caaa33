/// Device identity domain types
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Identity acquired at first-run registration.
///
/// Persisted once and treated as read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Server-assigned player identifier
    pub player_id: String,

    /// Composite bearer token, `"<player_id>:<auth_token>"`
    pub token: String,

    /// Screen this player drives
    pub screen_id: String,

    /// Agent version reported in heartbeats
    pub software_version: String,
}

impl DeviceIdentity {
    /// Build an identity from the registration response fields.
    ///
    /// # Errors
    /// Returns `InvalidInput` when the server handed back an empty player id or token.
    pub fn from_registration(
        player_id: impl Into<String>,
        auth_token: &str,
        screen_id: impl Into<String>,
        software_version: impl Into<String>,
    ) -> Result<Self> {
        let player_id = player_id.into();
        if player_id.is_empty() {
            return Err(CoreError::invalid_input("player_id is empty"));
        }
        if auth_token.is_empty() {
            return Err(CoreError::invalid_input("auth_token is empty"));
        }

        Ok(Self {
            token: format!("{}:{}", player_id, auth_token),
            player_id,
            screen_id: screen_id.into(),
            software_version: software_version.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_token() {
        let identity = DeviceIdentity::from_registration("p-42", "secret", "s-7", "1.2.0").unwrap();
        assert_eq!(identity.token, "p-42:secret");
        assert_eq!(identity.player_id, "p-42");
        assert_eq!(identity.screen_id, "s-7");
    }

    #[test]
    fn test_rejects_empty_fields() {
        assert!(DeviceIdentity::from_registration("", "secret", "s", "v").is_err());
        assert!(DeviceIdentity::from_registration("p", "", "s", "v").is_err());
    }
}
