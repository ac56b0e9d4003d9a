pub mod dtls_fingerprint;
pub mod dtls_parameters;
pub mod dtls_role;
