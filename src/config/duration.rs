//! Unit-suffixed duration literals such as `"5m30s"` or `"1.5h"`.

use std::time::Duration;

use thiserror::Error;

const NANOS_PER_SEC: u128 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("negative durations are not supported")]
    Negative,

    #[error("missing unit after {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {0:?}")]
    UnknownUnit(String),

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("duration out of range")]
    Overflow,
}

/// Parse a duration literal.
///
/// Grammar: an optional `+`, then one or more `<decimal><unit>` groups with
/// units `ns`, `us` (`µs`, `μs`), `ms`, `s`, `m`, `h`. The bare literal `0`
/// is zero.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    if input.starts_with('-') {
        return Err(DurationError::Negative);
    }
    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(DurationError::Empty);
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_end];
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        if !number.chars().any(|c| c.is_ascii_digit()) {
            return Err(DurationError::InvalidNumber(number.to_owned()));
        }
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(number.to_owned()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit(unit.to_owned()))?;

        total = total
            .checked_add(scaled(number, scale)?)
            .ok_or(DurationError::Overflow)?;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| DurationError::Overflow)?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(nanos)
}

fn scaled(number: &str, scale: u128) -> Result<u128, DurationError> {
    let invalid = || DurationError::InvalidNumber(number.to_owned());
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if fraction.contains('.') {
        return Err(invalid());
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| DurationError::Overflow)?
    };
    let mut nanos = whole.checked_mul(scale).ok_or(DurationError::Overflow)?;

    // Digits past nanosecond precision of an hour cannot change the result.
    let fraction = &fraction[..fraction.len().min(18)];
    if !fraction.is_empty() {
        let digits: u128 = fraction.parse().map_err(|_| invalid())?;
        let denominator = 10u128.pow(fraction.len() as u32);
        nanos = nanos
            .checked_add(digits * scale / denominator)
            .ok_or(DurationError::Overflow)?;
    }
    Ok(nanos)
}

/// Render a duration the way it is written in configuration: `168h0m0s`,
/// `1m30s`, `1.5s`, `250ms`, `0s`.
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }

    let nanos = duration.as_nanos();
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format!("{}µs", decimal((nanos / 1_000) as u64, (nanos % 1_000) as u64, 3));
    }
    if nanos < NANOS_PER_SEC {
        return format!(
            "{}ms",
            decimal((nanos / 1_000_000) as u64, (nanos % 1_000_000) as u64, 6)
        );
    }

    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3_600, (secs % 3_600) / 60, secs % 60);
    let seconds = decimal(seconds, u64::from(duration.subsec_nanos()), 9);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn decimal(whole: u64, fraction: u64, width: usize) -> String {
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{fraction:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
