use std::time::Duration;

use crate::engine::capabilities::{EngineCapabilities, HandlerVariant};
use crate::engine::configuration::EngineConfiguration;
use crate::engine::policy::bundle_policy::RTCBundlePolicy;
use crate::engine::policy::ice_transport_policy::RTCIceTransportPolicy;
use crate::engine::policy::rtcp_mux_policy::RTCRtcpMuxPolicy;
use crate::error::{Error, Result};
use crate::ice_transport::ice_server::RTCIceServer;

pub(crate) const DEFAULT_SIMULCAST_LAYERS: usize = 3;
pub(crate) const MIN_SIMULCAST_LAYERS: usize = 2;

/// HandlerSettings tune a negotiation session. They are fixed once the
/// session is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSettings {
    pub(crate) ice_servers: Vec<RTCIceServer>,
    pub(crate) transport_request_timeout: Option<Duration>,
    pub(crate) simulcast_layers: usize,
    pub(crate) variant: HandlerVariant,
    pub(crate) capabilities: Option<EngineCapabilities>,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        HandlerSettings {
            ice_servers: vec![],
            transport_request_timeout: None,
            simulcast_layers: DEFAULT_SIMULCAST_LAYERS,
            variant: HandlerVariant::default(),
            capabilities: None,
        }
    }
}

impl HandlerSettings {
    pub fn ice_servers(&self) -> &[RTCIceServer] {
        &self.ice_servers
    }

    /// How long a request to the transport collaborator may take. `None`
    /// waits for as long as the collaborator needs.
    pub fn transport_request_timeout(&self) -> Option<Duration> {
        self.transport_request_timeout
    }

    pub fn simulcast_layers(&self) -> usize {
        self.simulcast_layers
    }

    pub fn variant(&self) -> HandlerVariant {
        self.variant
    }

    /// capabilities returns the explicit override if one was given, and
    /// those of the configured variant otherwise.
    pub fn capabilities(&self) -> EngineCapabilities {
        self.capabilities
            .unwrap_or_else(|| self.variant.capabilities())
    }

    /// engine_configuration is the configuration the native engine has to
    /// be created with for the sessions to work on it.
    pub fn engine_configuration(&self) -> EngineConfiguration {
        EngineConfiguration {
            ice_servers: self.ice_servers.clone(),
            ice_transport_policy: RTCIceTransportPolicy::All,
            bundle_policy: RTCBundlePolicy::MaxBundle,
            rtcp_mux_policy: RTCRtcpMuxPolicy::Require,
            sdp_semantics: self.capabilities().sdp_semantics,
        }
    }
}

/// HandlerSettingsBuilder builds [`HandlerSettings`], validating them.
#[derive(Default, Debug, Clone)]
pub struct HandlerSettingsBuilder {
    settings: HandlerSettings,
}

impl HandlerSettingsBuilder {
    pub fn new() -> Self {
        HandlerSettingsBuilder::default()
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<RTCIceServer>) -> Self {
        self.settings.ice_servers = ice_servers;
        self
    }

    pub fn with_transport_request_timeout(mut self, timeout: Duration) -> Self {
        self.settings.transport_request_timeout = Some(timeout);
        self
    }

    pub fn with_simulcast_layers(mut self, layers: usize) -> Self {
        self.settings.simulcast_layers = layers;
        self
    }

    pub fn with_variant(mut self, variant: HandlerVariant) -> Self {
        self.settings.variant = variant;
        self
    }

    /// with_capabilities overrides the strategy derived from the variant.
    pub fn with_capabilities(mut self, capabilities: EngineCapabilities) -> Self {
        self.settings.capabilities = Some(capabilities);
        self
    }

    pub fn build(self) -> Result<HandlerSettings> {
        for server in &self.settings.ice_servers {
            server.validate()?;
        }
        if self.settings.simulcast_layers < MIN_SIMULCAST_LAYERS {
            return Err(Error::ErrInvalidSimulcastLayers(
                self.settings.simulcast_layers,
            ));
        }

        Ok(self.settings)
    }
}
