use std::sync::Arc;

use crate::m7cl::MeterPoint;

/// Configuration as edited by the operator: any field may be left out.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserConfig {
    pub host: Option<String>,
    pub input_host: Option<String>,
    pub resend_num: Option<u32>,
    pub auto_reconnect: Option<bool>,
    pub live_meters_enabled: Option<bool>,
    pub live_meter_point: Option<MeterPoint>,
    pub port: Option<u16>,
    pub secure: Option<bool>,
    pub close_on_disconnect: Option<bool>,
}

impl UserConfig {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Defaults shared by all transports.
mod base {
    pub const RESEND_NUM: u32 = 1;
    pub const AUTO_RECONNECT: bool = false;
    pub const LIVE_METERS_ENABLED: bool = false;
}

/// Defaults specific to a transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransportDefaults {
    pub live_meter_point: MeterPoint,
    pub port: Option<u16>,
    pub secure: bool,
    pub close_on_disconnect: bool,
}

impl Default for TransportDefaults {
    fn default() -> Self {
        Self {
            live_meter_point: MeterPoint::PreFader,
            port: None,
            secure: false,
            close_on_disconnect: false,
        }
    }
}

/// Fully resolved configuration, frozen when a connection is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: Option<Arc<str>>,
    pub input_host: Option<Arc<str>>,
    pub resend_num: u32,
    pub auto_reconnect: bool,
    pub live_meters_enabled: bool,
    pub live_meter_point: MeterPoint,
    pub port: Option<u16>,
    pub secure: bool,
    /// Close the connection when the output device goes away.
    pub close_on_disconnect: bool,
}

fn non_empty(id: &Option<String>) -> Option<Arc<str>> {
    id.as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(Arc::from)
}

impl ConnectionConfig {
    /// Merges `user` fields over the base then the transport `defaults`.
    pub fn complete(user: &UserConfig, defaults: &TransportDefaults) -> Self {
        Self {
            host: non_empty(&user.host),
            input_host: non_empty(&user.input_host),
            resend_num: user.resend_num.unwrap_or(base::RESEND_NUM),
            auto_reconnect: user.auto_reconnect.unwrap_or(base::AUTO_RECONNECT),
            live_meters_enabled: user
                .live_meters_enabled
                .unwrap_or(base::LIVE_METERS_ENABLED),
            live_meter_point: user.live_meter_point.unwrap_or(defaults.live_meter_point),
            port: user.port.or(defaults.port),
            secure: user.secure.unwrap_or(defaults.secure),
            close_on_disconnect: user
                .close_on_disconnect
                .unwrap_or(defaults.close_on_disconnect),
        }
    }

    /// The address the next connection is expected to use.
    pub fn probable_address(&self) -> String {
        let host = self.host.as_deref().unwrap_or_default();
        match self.port {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::complete(&UserConfig::default(), &TransportDefaults::default())
    }
}
