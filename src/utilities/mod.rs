use rand::{rng, Rng};

use crate::rtp_transceiver::SSRC;

const RUNES_ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// math_rand_alpha generates a mathmatical random alphabet sequence of the requested length.
pub fn math_rand_alpha(n: usize) -> String {
    let mut rng = rng();

    let rand_string: String = (0..n)
        .map(|_| {
            let idx = rng.random_range(0..RUNES_ALPHA.len());
            RUNES_ALPHA[idx] as char
        })
        .collect();

    rand_string
}

/// rand_ssrc picks an SSRC that does not collide with any of `taken`.
pub fn rand_ssrc(taken: &[SSRC]) -> SSRC {
    let mut rng = rng();
    loop {
        let ssrc = rng.random_range(1000..u32::MAX);
        if !taken.contains(&ssrc) {
            return ssrc;
        }
    }
}

/// rand_session_id returns an SDP `o=` session id, kept below 2^62 so that
/// engines parsing it as a signed 64 bit value accept it.
pub fn rand_session_id() -> u64 {
    rng().random_range(1_000_000..(1u64 << 62))
}
