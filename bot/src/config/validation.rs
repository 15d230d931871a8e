//! Setting value validation.

use regex::Regex;
use std::sync::LazyLock;

static RE_ZONE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_]+(/[A-Za-z0-9_+\-]+)*$").unwrap());

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "SERVER_PORT" => validate_int_range(value, 1, 65535)?,
        "TIMEZONE" => {
            if !RE_ZONE_NAME.is_match(value) {
                return Err("must look like 'Area/City'".into());
            }
            value
                .parse::<chrono_tz::Tz>()
                .map_err(|_| format!("unknown time zone: {value}"))?;
        }
        "DAILY_QUEST_COUNT" => validate_int_range(value, 0, 20)?,
        "INTERACTION_COOLDOWN_SECS" | "PET_FEED_COOLDOWN_SECS" => {
            validate_int_range(value, 0, 7 * 24 * 3600)?
        }
        "AFFINITY_PER_INTERACTION" => validate_int_range(value, 1, 1000)?,
        "PET_FEED_EXP" => validate_int_range(value, 1, 10_000)?,
        "LEADERBOARD_DEFAULT_LIMIT" => validate_int_range(value, 1, 100)?,
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i64, max: i64) -> Result<(), String> {
    let v: i64 = value.parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}
