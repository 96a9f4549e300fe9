// ABOUTME: Expiry policy deciding whether a stored access token is still usable
// ABOUTME: Pure and total; applies a safety skew so tokens refresh before true expiry

/// Default safety margin subtracted from the expiry instant, in seconds.
///
/// Refreshing shortly before true expiry absorbs clock drift and the latency
/// of requests already in flight.
pub const DEFAULT_SKEW_SECS: i64 = 60;

/// Whether an access token must be treated as expired.
///
/// A missing `expires_at` means the token was never validated and is treated
/// as already expired. Otherwise the token expires once `now` passes
/// `expires_at - skew_secs`.
pub fn is_expired(expires_at: Option<i64>, now: i64, skew_secs: i64) -> bool {
    match expires_at {
        Some(expires_at) => now > expires_at - skew_secs,
        None => true,
    }
}
