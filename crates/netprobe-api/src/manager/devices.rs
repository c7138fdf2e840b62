// Manager device inventory endpoint

use tracing::debug;

use crate::error::Error;
use crate::manager::client::ManagerClient;
use crate::manager::models::DeviceCollection;

pub const DEVICES_PATH: &str = "device";

impl ManagerClient {
    /// List every device the manager knows about.
    ///
    /// `GET /dataservice/device`. Anything but `200 OK` is a
    /// [`Error::Retrieval`].
    pub async fn list_devices(&self) -> Result<DeviceCollection, Error> {
        debug!("listing devices");
        let devices: DeviceCollection = self.get_json(DEVICES_PATH).await?;
        debug!(count = devices.len(), "devices received");
        Ok(devices)
    }
}
