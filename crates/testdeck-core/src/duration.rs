//! Parsing of human-written durations.
//!
//! Runners write durations as text: `"2.5s"` for a test, `"42m 15s"` for a
//! run, `"45 min"` for a catalog estimate. All of them parse to fractional
//! seconds here. A value that cannot be parsed is a [`MalformedDuration`];
//! aggregation treats it as zero seconds and logs a warning instead of
//! failing.

use thiserror::Error;

/// A duration string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed duration: {input:?}")]
pub struct MalformedDuration {
    /// The rejected input
    pub input: String,
}

impl MalformedDuration {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

/// Parses a duration string into seconds.
///
/// Accepts one or more `<number><unit>` components separated by optional
/// whitespace. A single bare number is read as seconds. Units: `ms`,
/// `s`/`sec`/`seconds`, `m`/`min`/`minutes`, `h`/`hr`/`hours`.
pub fn parse_seconds(input: &str) -> Result<f64, MalformedDuration> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(MalformedDuration::new(input));
    }

    let mut chars = trimmed.chars().peekable();
    let mut total = 0.0_f64;
    let mut components = 0usize;
    let mut saw_bare_number = false;

    while chars.peek().is_some() {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut number = String::new();
        while let Some(c) = chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
            number.push(c);
        }
        if number.is_empty() {
            return Err(MalformedDuration::new(input));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| MalformedDuration::new(input))?;

        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut unit = String::new();
        while let Some(c) = chars.next_if(|c| c.is_ascii_alphabetic()) {
            unit.push(c.to_ascii_lowercase());
        }

        let scale = match unit.as_str() {
            "" => {
                saw_bare_number = true;
                1.0
            }
            "ms" => 0.001,
            "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
            "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
            "h" | "hr" | "hrs" | "hour" | "hours" => 3600.0,
            _ => return Err(MalformedDuration::new(input)),
        };

        total += value * scale;
        components += 1;

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    // "12 3s" is ambiguous; a unitless number is only valid on its own.
    if saw_bare_number && components > 1 {
        return Err(MalformedDuration::new(input));
    }
    if !total.is_finite() {
        return Err(MalformedDuration::new(input));
    }

    Ok(total)
}

/// Parses a duration, falling back to `0.0` seconds when it is malformed.
pub fn seconds_or_zero(input: &str) -> f64 {
    match parse_seconds(input) {
        Ok(secs) => secs,
        Err(e) => {
            tracing::warn!("{}; using 0s", e);
            0.0
        }
    }
}
