//! Configuration normalization and request-parameter parsing.
//!
//! Normalization is total: any input, including missing or garbage values,
//! produces a valid `Config`. Nothing in here returns an error.

use crate::types::{
    Config, RawConfig, DEFAULT_COUNT, DEFAULT_MAX, DEFAULT_MIN, DEFAULT_RATE_PER_SEC, MAX_COUNT,
    MAX_RATE_PER_SEC, MIN_COUNT, MIN_RATE_PER_SEC, VALUE_LIMIT,
};

// =============================================================================
// NORMALIZATION
// =============================================================================

/// Canonicalize a raw configuration.
///
/// Order matters: defaults first, then clamping, then the min/max swap, so a
/// reversed range that also exceeds the bounds still ends up ordered.
pub fn normalize(raw: &RawConfig) -> Config {
    let count = clamp_i64(
        raw.count.unwrap_or(DEFAULT_COUNT as i64),
        MIN_COUNT as i64,
        MAX_COUNT as i64,
    ) as u32;

    let mut min = clamp_i64(raw.min.unwrap_or(DEFAULT_MIN), -VALUE_LIMIT, VALUE_LIMIT);
    let mut max = clamp_i64(raw.max.unwrap_or(DEFAULT_MAX), -VALUE_LIMIT, VALUE_LIMIT);
    if min > max {
        std::mem::swap(&mut min, &mut max);
    }

    Config {
        count,
        min,
        max,
        rate_per_sec: normalize_rate(raw.rate, DEFAULT_RATE_PER_SEC),
    }
}

/// Clamp a requested rate, falling back to `fallback` when none was given.
pub fn normalize_rate(rate: Option<i64>, fallback: u32) -> u32 {
    clamp_i64(
        rate.unwrap_or(fallback as i64),
        MIN_RATE_PER_SEC as i64,
        MAX_RATE_PER_SEC as i64,
    ) as u32
}

/// Re-apply every bound to an already-built config (used when restoring state
/// that did not come through `normalize`).
pub fn renormalize(cfg: &Config) -> Config {
    normalize(&RawConfig {
        count: Some(cfg.count as i64),
        min: Some(cfg.min),
        max: Some(cfg.max),
        rate: Some(cfg.rate_per_sec as i64),
    })
}

fn clamp_i64(v: i64, lo: i64, hi: i64) -> i64 {
    v.max(lo).min(hi)
}

// =============================================================================
// PARAMETER PARSING
// =============================================================================

/// Parse the leading integer of a request parameter.
///
/// Accepts optional surrounding whitespace and a sign, then reads digits up to
/// the first non-digit (`"12abc"` -> 12, `"3.9"` -> 3). Returns `None` when no
/// digit is present. Values beyond the i64 range saturate.
pub fn parse_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut seen_digit = false;
    let mut acc: i64 = 0;
    for b in digits.bytes() {
        if !b.is_ascii_digit() {
            break;
        }
        seen_digit = true;
        let d = (b - b'0') as i64;
        acc = if negative {
            acc.saturating_mul(10).saturating_sub(d)
        } else {
            acc.saturating_mul(10).saturating_add(d)
        };
    }

    seen_digit.then_some(acc)
}

/// Parse a boolean flag parameter. Set when its leading integer is 1
/// (`"1"`, `"01"`, `"1abc"`) or it reads `"true"` in any case; a missing
/// flag yields `default`.
pub fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw {
        Some(v) => parse_int(v) == Some(1) || v.trim().eq_ignore_ascii_case("true"),
        None => default,
    }
}
