use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ice_transport::ice_connection_state::RTCIceConnectionState;

/// ConnectionState is the transport state reported to the application,
/// derived from the ICE connection state of the engine.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Unspecified,

    /// Connectivity checks are running.
    Connecting,

    /// A working candidate pair was found.
    Connected,

    /// No working candidate pair could be found.
    Failed,

    /// Connectivity was lost on a previously working pair.
    Disconnected,

    /// The engine has been closed.
    Closed,
}

const CONNECTION_STATE_CONNECTING_STR: &str = "connecting";
const CONNECTION_STATE_CONNECTED_STR: &str = "connected";
const CONNECTION_STATE_FAILED_STR: &str = "failed";
const CONNECTION_STATE_DISCONNECTED_STR: &str = "disconnected";
const CONNECTION_STATE_CLOSED_STR: &str = "closed";

impl From<&str> for ConnectionState {
    fn from(raw: &str) -> Self {
        match raw {
            CONNECTION_STATE_CONNECTING_STR => ConnectionState::Connecting,
            CONNECTION_STATE_CONNECTED_STR => ConnectionState::Connected,
            CONNECTION_STATE_FAILED_STR => ConnectionState::Failed,
            CONNECTION_STATE_DISCONNECTED_STR => ConnectionState::Disconnected,
            CONNECTION_STATE_CLOSED_STR => ConnectionState::Closed,
            _ => ConnectionState::Unspecified,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            ConnectionState::Connecting => CONNECTION_STATE_CONNECTING_STR,
            ConnectionState::Connected => CONNECTION_STATE_CONNECTED_STR,
            ConnectionState::Failed => CONNECTION_STATE_FAILED_STR,
            ConnectionState::Disconnected => CONNECTION_STATE_DISCONNECTED_STR,
            ConnectionState::Closed => CONNECTION_STATE_CLOSED_STR,
            ConnectionState::Unspecified => crate::UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

impl ConnectionState {
    /// from_ice_connection_state maps an engine ICE state onto the reported
    /// state. `new` is not reported.
    pub fn from_ice_connection_state(state: RTCIceConnectionState) -> Option<Self> {
        match state {
            RTCIceConnectionState::Checking => Some(ConnectionState::Connecting),
            RTCIceConnectionState::Connected | RTCIceConnectionState::Completed => {
                Some(ConnectionState::Connected)
            }
            RTCIceConnectionState::Failed => Some(ConnectionState::Failed),
            RTCIceConnectionState::Disconnected => Some(ConnectionState::Disconnected),
            RTCIceConnectionState::Closed => Some(ConnectionState::Closed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_connection_state_string() {
        let tests = vec![
            (ConnectionState::Unspecified, "Unspecified"),
            (ConnectionState::Connecting, "connecting"),
            (ConnectionState::Connected, "connected"),
            (ConnectionState::Failed, "failed"),
            (ConnectionState::Disconnected, "disconnected"),
            (ConnectionState::Closed, "closed"),
        ];

        for (state, expected_string) in tests {
            assert_eq!(state.to_string(), expected_string);
            assert_eq!(ConnectionState::from(expected_string), state);
        }
    }

    #[test]
    fn test_from_ice_connection_state() {
        let tests = vec![
            (RTCIceConnectionState::New, None),
            (
                RTCIceConnectionState::Checking,
                Some(ConnectionState::Connecting),
            ),
            (
                RTCIceConnectionState::Connected,
                Some(ConnectionState::Connected),
            ),
            (
                RTCIceConnectionState::Completed,
                Some(ConnectionState::Connected),
            ),
            (RTCIceConnectionState::Failed, Some(ConnectionState::Failed)),
            (
                RTCIceConnectionState::Disconnected,
                Some(ConnectionState::Disconnected),
            ),
            (RTCIceConnectionState::Closed, Some(ConnectionState::Closed)),
        ];

        for (ice_state, expected) in tests {
            assert_eq!(
                ConnectionState::from_ice_connection_state(ice_state),
                expected,
                "{ice_state}"
            );
        }
    }
}
