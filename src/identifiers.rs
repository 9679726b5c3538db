//! Human-readable identifiers for charging sessions and payments
//!
//! Identifiers combine the wall-clock time in milliseconds with a short random
//! base36 suffix, e.g. `CST_1718000000000_k3j9x0q2m`. They are display labels
//! for the kiosk and receipts, not credentials.

use chrono::Utc;
use uuid::Uuid;

/// Prefix of charging session tokens
pub const SESSION_TOKEN_PREFIX: &str = "CST";

/// Prefix of payment transaction ids
pub const TRANSACTION_ID_PREFIX: &str = "TXN";

const SESSION_SUFFIX_LEN: usize = 9;
const TRANSACTION_SUFFIX_LEN: usize = 6;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// New charging session token (`CST_<millis>_<9 chars>`)
pub fn session_token() -> String {
    generate(SESSION_TOKEN_PREFIX, SESSION_SUFFIX_LEN)
}

/// New payment transaction id (`TXN_<millis>_<6 chars>`)
pub fn transaction_id() -> String {
    generate(TRANSACTION_ID_PREFIX, TRANSACTION_SUFFIX_LEN)
}

fn generate(prefix: &str, suffix_len: usize) -> String {
    let millis = Utc::now().timestamp_millis();
    format!("{prefix}_{millis}_{}", random_base36(suffix_len))
}

/// `len` base36 digits drawn from a v4 UUID (122 random bits, enough for 23 digits)
fn random_base36(len: usize) -> String {
    let mut bits = Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        out.push(char::from(BASE36[(bits % 36) as usize]));
        bits /= 36;
    }
    out
}

/// Split an identifier into `(prefix, millis, suffix)` if it is well-formed
pub fn parse(id: &str) -> Option<(&str, i64, &str)> {
    let mut parts = id.splitn(3, '_');
    let prefix = parts.next()?;
    let millis = parts.next()?.parse::<i64>().ok()?;
    let suffix = parts.next()?;
    let well_formed = !suffix.is_empty()
        && suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase());
    well_formed.then_some((prefix, millis, suffix))
}
