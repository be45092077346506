//! Identifier prefixes and random ID generation.
//!
//! IDs look like `usr-k3x9a0p2m`: a kind prefix, a dash, and a lowercase
//! base-36 suffix drawn from the OS random source.

use crate::errors::CoreError;

pub const PREFIX_USER: &str = "usr";
pub const PREFIX_SESSION: &str = "ses";
pub const PREFIX_DEVICE: &str = "dev";

pub const ALL_PREFIXES: &[&str] = &[PREFIX_USER, PREFIX_SESSION, PREFIX_DEVICE];

/// Suffix length of a durable user id.
pub const USER_ID_LEN: usize = 9;
/// Suffix length of a session id.
pub const SESSION_ID_LEN: usize = 12;
/// Suffix length of a device id.
pub const DEVICE_ID_LEN: usize = 8;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Largest multiple of 36 that fits in a byte; bytes at or above it are
/// rejected so every symbol is equally likely.
const REJECT_AT: u8 = 252;

/// Generate `"{prefix}-{suffix}"` with a suffix of exactly `length`
/// lowercase alphanumeric characters.
///
/// # Errors
///
/// Returns [`CoreError::Random`] if the OS random source fails.
pub fn generate_id(prefix: &str, length: usize) -> Result<String, CoreError> {
    let mut id = String::with_capacity(prefix.len() + 1 + length);
    id.push_str(prefix);
    id.push('-');
    id.push_str(&random_suffix(length)?);
    Ok(id)
}

/// Random lowercase base-36 string of exactly `length` characters.
///
/// # Errors
///
/// Returns [`CoreError::Random`] if the OS random source fails.
pub fn random_suffix(length: usize) -> Result<String, CoreError> {
    let mut out = String::with_capacity(length);
    let mut buf = [0u8; 32];

    while out.len() < length {
        getrandom::fill(&mut buf)
            .map_err(|e| CoreError::Random(format!("failed to generate id: {e}")))?;
        for &byte in &buf {
            if out.len() == length {
                break;
            }
            if byte < REJECT_AT {
                out.push(char::from(ALPHABET[usize::from(byte % 36)]));
            }
        }
    }

    Ok(out)
}
