//! Provider data handed from provider configure to resources and data sources

use crate::api::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct NetbirdProviderData {
    pub client: Arc<Client>,
}

impl NetbirdProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Pull the provider data out of what configure handed over
    ///
    /// None means the provider has not been configured yet, which is not an
    /// error until an operation actually needs the client.
    pub fn from_configured(
        data: Option<std::sync::Arc<dyn std::any::Any + Send + Sync>>,
    ) -> Result<Option<Self>, tfplug::types::Diagnostic> {
        match data {
            None => Ok(None),
            Some(data) => data
                .downcast_ref::<NetbirdProviderData>()
                .cloned()
                .map(Some)
                .ok_or_else(|| {
                    tfplug::types::Diagnostic::error(
                        "Invalid provider data",
                        "Failed to extract NetbirdProviderData from provider data",
                    )
                }),
        }
    }
}
