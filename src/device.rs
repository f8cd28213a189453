//! Device context collaborator.

use url::Url;

/// Supplies the registered device URL included in metric base fields.
pub trait DeviceService: Send + Sync {
    /// URL of the device registration backing this SDK instance.
    fn device_url(&self) -> Url;
}

/// Fixed device context, for hosts that register out of band and for tests.
#[derive(Clone, Debug)]
pub struct StaticDevice {
    url: Url,
}

impl StaticDevice {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

impl DeviceService for StaticDevice {
    fn device_url(&self) -> Url {
        self.url.clone()
    }
}
