use crate::error::{Result, SyncError};
use marquee_client::{PlayerApi, RegistrationRequest};
use marquee_core::DeviceIdentity;
use marquee_storage::{keys, PersistentStore};
use std::sync::Arc;
use tracing::{error, info};

/// Provisioning data the device presents at registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioning {
    pub serial_number: String,
    pub screen_id: String,
    pub provisioning_code: Option<String>,
    pub software_version: String,
}

impl Provisioning {
    fn request(&self) -> RegistrationRequest {
        RegistrationRequest {
            serial_number: self.serial_number.clone(),
            screen_id: self.screen_id.clone(),
            provisioning_code: self.provisioning_code.clone(),
        }
    }
}

/// First-run identity acquisition.
///
/// Registration failures are returned, never retried here: without an identity
/// the agent cannot do anything useful, so restarting is left to the process supervisor.
pub struct DeviceRegistrar {
    api: Arc<dyn PlayerApi>,
    store: PersistentStore,
}

impl DeviceRegistrar {
    pub fn new(api: Arc<dyn PlayerApi>, store: PersistentStore) -> Self {
        Self { api, store }
    }

    /// Identity persisted by an earlier registration, if any
    pub async fn current(&self) -> Option<DeviceIdentity> {
        self.store.get(keys::DEVICE_IDENTITY).await
    }

    /// Return the persisted identity, registering first if there is none.
    ///
    /// Never contacts the server while an identity exists.
    pub async fn ensure_registered(&self, provisioning: &Provisioning) -> Result<DeviceIdentity> {
        if let Some(identity) = self.current().await {
            info!(
                player_id = %identity.player_id,
                screen_id = %identity.screen_id,
                "Using persisted device identity"
            );
            return Ok(identity);
        }

        self.register(provisioning).await
    }

    /// Explicit re-registration.
    ///
    /// The stored identity is replaced only once the server accepted the new
    /// registration; on failure the previous identity stays in place.
    pub async fn reregister(&self, provisioning: &Provisioning) -> Result<DeviceIdentity> {
        if let Some(previous) = self.current().await {
            info!(player_id = %previous.player_id, "Re-registering device");
        }
        self.register(provisioning).await
    }

    async fn register(&self, provisioning: &Provisioning) -> Result<DeviceIdentity> {
        info!(
            serial_number = %provisioning.serial_number,
            screen_id = %provisioning.screen_id,
            "No device identity, registering"
        );

        let response = self
            .api
            .register(&provisioning.request())
            .await
            .map_err(|e| {
                error!(error = %e, "Device registration failed");
                SyncError::Registration(e)
            })?;

        let identity = DeviceIdentity::from_registration(
            response.player_id,
            &response.auth_token,
            response.screen_id,
            provisioning.software_version.clone(),
        )?;

        self.store.set(keys::DEVICE_IDENTITY, &identity).await?;

        info!(
            player_id = %identity.player_id,
            screen_id = %identity.screen_id,
            "Device identity persisted"
        );

        Ok(identity)
    }
}
