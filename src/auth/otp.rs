//! One-time email codes.

use rand::{rngs::OsRng, Rng};
use time::{Duration, OffsetDateTime};

pub const OTP_LEN: usize = 6;

/// Six decimal digits from the OS CSPRNG, zero padded.
pub fn generate() -> String {
    let n: u32 = OsRng.gen_range(0..1_000_000);
    format!("{:06}", n)
}

pub fn is_well_formed(code: &str) -> bool {
    code.len() == OTP_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Everything issued strictly after this instant is still fresh.
pub fn cutoff(now: OffsetDateTime, ttl: Duration) -> OffsetDateTime {
    now - ttl
}

pub fn is_fresh(created_at: OffsetDateTime, now: OffsetDateTime, ttl: Duration) -> bool {
    created_at > cutoff(now, ttl)
}
