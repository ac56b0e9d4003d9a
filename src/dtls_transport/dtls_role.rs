use std::fmt;

use sdp::description::session::{SessionDescription, ATTR_KEY_CONNECTION_SETUP};
use sdp::util::ConnectionRole;
use serde::{Deserialize, Serialize};

/// DtlsRole indicates the role of the DTLS transport.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DTLSRole {
    #[default]
    Unspecified = 0,

    /// DTLSRoleAuto defines the DTLS role is determined based on
    /// the resolved ICE role: the ICE controlled role acts as the DTLS
    /// client and the ICE controlling role acts as the DTLS server.
    #[serde(rename = "auto")]
    Auto = 1,

    /// DTLSRoleClient defines the DTLS client role.
    #[serde(rename = "client")]
    Client = 2,

    /// DTLSRoleServer defines the DTLS server role.
    #[serde(rename = "server")]
    Server = 3,
}

impl fmt::Display for DTLSRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DTLSRole::Auto => write!(f, "auto"),
            DTLSRole::Client => write!(f, "client"),
            DTLSRole::Server => write!(f, "server"),
            _ => write!(f, "{}", crate::UNSPECIFIED_STR),
        }
    }
}

/// Iterate a SessionDescription to determine if an explicit role can be
/// determined from it. The decision is made from the first role we parse.
/// If no role can be found we return DTLSRoleAuto
impl From<&SessionDescription> for DTLSRole {
    fn from(session_description: &SessionDescription) -> Self {
        for media_section in &session_description.media_descriptions {
            for attribute in &media_section.attributes {
                if attribute.key == ATTR_KEY_CONNECTION_SETUP {
                    return match &attribute.value {
                        Some(value) => DTLSRole::from_setup(value),
                        None => DTLSRole::Auto,
                    };
                }
            }
        }

        DTLSRole::Auto
    }
}

impl DTLSRole {
    /// from_setup maps an `a=setup` value onto the role of the side that
    /// wrote it.
    pub fn from_setup(setup: &str) -> Self {
        match setup {
            "active" => DTLSRole::Client,
            "passive" => DTLSRole::Server,
            _ => DTLSRole::Auto,
        }
    }

    pub fn to_connection_role(self) -> ConnectionRole {
        match self {
            DTLSRole::Client => ConnectionRole::Active,
            DTLSRole::Server => ConnectionRole::Passive,
            DTLSRole::Auto => ConnectionRole::Actpass,
            _ => ConnectionRole::Unspecified,
        }
    }

    /// The `a=setup` the remote endpoint answers with once the local side
    /// has fixed its own role.
    pub fn to_remote_answer_role(self) -> ConnectionRole {
        match self {
            DTLSRole::Client => ConnectionRole::Passive,
            _ => ConnectionRole::Active,
        }
    }
}
