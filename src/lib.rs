#![warn(rust_2018_idioms)]

pub mod dtls_transport;
pub mod engine;
pub mod error;
pub mod handler;
pub mod ice_transport;
pub mod remote_sdp;
pub mod rtp_transceiver;
pub mod sdp;
pub mod settings;
pub mod track;
pub mod transport;
pub mod utilities;

pub use error::{Error, ErrorKind, Result};
pub use handler::recv::RecvSession;
pub use handler::send::SendSession;
pub use handler::{get_native_rtp_capabilities, SessionState};
pub use settings::{HandlerSettings, HandlerSettingsBuilder};

pub(crate) const UNSPECIFIED_STR: &str = "Unspecified";
