use crate::types::Config;

/// Supplier of uniformly distributed 64-bit words.
///
/// The canister feeds draws from `seed::SeedStream`; tests plug in seeded
/// generators. An error here means no valid draw can be produced and aborts
/// the tick that asked for it.
pub trait EntropySource {
    fn next_u64(&mut self) -> Result<u64, String>;
}

/// Sample `cfg.count` integers, each uniform over `[cfg.min, cfg.max]`.
pub fn draw<E: EntropySource + ?Sized>(cfg: &Config, source: &mut E) -> Result<Vec<i64>, String> {
    (0..cfg.count)
        .map(|_| sample_inclusive(cfg.min, cfg.max, source))
        .collect()
}

/// Uniform integer in `[lo, hi]` (bounds may arrive in either order).
///
/// Uses rejection sampling: words from the incomplete last bucket are thrown
/// away, so every value has exactly the same probability.
pub fn sample_inclusive<E: EntropySource + ?Sized>(lo: i64, hi: i64, source: &mut E) -> Result<i64, String> {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if lo == hi {
        return Ok(lo);
    }

    let span = match hi.abs_diff(lo).checked_add(1) {
        Some(span) => span,
        // [i64::MIN, i64::MAX]: every word maps to a distinct value
        None => return Ok(lo.wrapping_add(source.next_u64()? as i64)),
    };

    let zone = u64::MAX - (u64::MAX % span);
    loop {
        let word = source.next_u64()?;
        if word < zone {
            return Ok(lo.wrapping_add((word % span) as i64));
        }
    }
}
