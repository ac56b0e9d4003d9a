/// OfferOptions structure describes the options used to control the offer
/// creation process
///
/// ## Specifications
///
/// * [W3C]
///
/// [W3C]: https://w3c.github.io/webrtc-pc/#dictionary-rtcofferoptions-members
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone)]
pub struct RTCOfferOptions {
    /// ice_restart forces the underlying ice gathering process to be restarted.
    /// When this value is true, the generated description will have ICE
    /// credentials that are different from the current credentials
    pub ice_restart: bool,

    /// Legacy switch asking the engine to offer an audio section even
    /// without any local audio track.
    pub offer_to_receive_audio: bool,

    /// Legacy switch asking the engine to offer a video section even
    /// without any local video track.
    pub offer_to_receive_video: bool,
}
