use anyhow::{Context, Result, bail};
use std::collections::HashSet;

const DEFAULT_SEED: u64 = 1337;
const MAX_RANGE_SEEDS: u64 = 10_000;

/// Resolve a list of CLI seed arguments into game seeds.
///
/// Supports literal integers (negative values use their magnitude),
/// `0x` hexadecimal, and ranges written `a..b` or `a..=b`. Duplicates are
/// dropped keeping first-seen order.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut pending: Vec<u64> = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Some((start, end)) = parse_range(token)? {
            pending.extend(start..=end);
            continue;
        }

        if let Some(value) = parse_single(token) {
            pending.push(value);
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    let mut deduped: Vec<u64> = pending.into_iter().filter(|seed| seen.insert(*seed)).collect();

    if deduped.is_empty() {
        deduped.push(DEFAULT_SEED);
    }

    Ok(deduped)
}

fn parse_single(token: &str) -> Option<u64> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok();
    }
    if let Ok(value) = token.parse::<i64>() {
        return Some(value.unsigned_abs());
    }
    token.parse::<u64>().ok()
}

fn parse_range(token: &str) -> Result<Option<(u64, u64)>> {
    let (start, end, inclusive) = if let Some((start, end)) = token.split_once("..=") {
        (start, end, true)
    } else if let Some((start, end)) = token.split_once("..") {
        (start, end, false)
    } else {
        return Ok(None);
    };

    let start = parse_single(start.trim())
        .with_context(|| format!("invalid range start in seed token: {token}"))?;
    let end = parse_single(end.trim())
        .with_context(|| format!("invalid range end in seed token: {token}"))?;
    let end = if inclusive {
        end
    } else if end == 0 {
        bail!("empty seed range: {token}");
    } else {
        end - 1
    };
    if end < start {
        bail!("empty seed range: {token}");
    }
    if end - start >= MAX_RANGE_SEEDS {
        bail!("seed range {token} spans more than {MAX_RANGE_SEEDS} seeds");
    }
    Ok(Some((start, end)))
}
