use crate::config::ALL_TRACKS_LABEL;
use log::{Level, LevelFilter, Log, Metadata, Record};
use track_replay::animation::SpeedFactor;
use track_replay::scene::TrackLayer;
use track_replay::TrackKey;

/// Generic numeric input validation
pub fn validate_numeric_input<T>(
    input: &str,
    min: Option<T>,
    max: Option<T>,
    field_name: &str,
) -> Result<T, String>
where
    T: std::str::FromStr + std::fmt::Display + PartialOrd,
{
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty", field_name));
    }

    match trimmed.parse::<T>() {
        Ok(val) => {
            if let Some(min_val) = min {
                if val < min_val {
                    return Err(format!("{} must be at least {}", field_name, min_val));
                }
            }
            if let Some(max_val) = max {
                if val > max_val {
                    return Err(format!("{} cannot exceed {}", field_name, max_val));
                }
            }
            Ok(val)
        }
        Err(_) => Err(format!("{} must be a valid number", field_name)),
    }
}

/// Parse the speed slider value. Out-of-range numbers are clamped, not rejected.
pub fn parse_speed_input(input: &str) -> Result<SpeedFactor, String> {
    let raw: f64 = validate_numeric_input(input, None, None, "Speed")?;
    Ok(SpeedFactor::new(raw))
}

/// Options for the track selector: every track first, then one per track.
pub fn track_options(tracks: &[TrackLayer]) -> Vec<(TrackKey, String)> {
    std::iter::once((TrackKey::All, ALL_TRACKS_LABEL.to_string()))
        .chain(
            tracks
                .iter()
                .enumerate()
                .map(|(i, t)| (TrackKey::Index(i), t.name.clone())),
        )
        .collect()
}

/// Compass heading for the status line, e.g. `"273°"`.
pub fn format_heading(heading: Option<f64>) -> String {
    match heading {
        Some(deg) => format!("{:.0}°", deg.round() % 360.0),
        None => "-".to_string(),
    }
}

/// Forwards `log` records to the browser console.
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        match record.level() {
            Level::Error => web_sys::console::error_1(&line.into()),
            Level::Warn => web_sys::console::warn_1(&line.into()),
            Level::Info => web_sys::console::info_1(&line.into()),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line.into()),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

pub fn init_logging(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
