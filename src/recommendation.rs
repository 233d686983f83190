use crate::forecast::types::ForecastSample;

/// How many leading samples the umbrella rule looks at. met.no steps are
/// hourly at the head of the series, so this is roughly the next 12 hours.
pub const UMBRELLA_LOOKAHEAD: usize = 12;

/// Whether any of the first [`UMBRELLA_LOOKAHEAD`] samples calls for rain.
///
/// Counts entries in series order; shorter series are checked in full.
pub fn needs_umbrella(samples: &[ForecastSample]) -> bool {
    samples
        .iter()
        .take(UMBRELLA_LOOKAHEAD)
        .any(|s| s.condition_code().is_some_and(|code| code.contains("rain")))
}
