use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::forecast::types::ForecastSample;

/// Which calendar day a view shows, relative to "now" in the display timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Today,
    Tomorrow,
}

impl Day {
    pub fn target_date<Tz: TimeZone>(self, now: DateTime<Utc>, tz: &Tz) -> NaiveDate {
        let today = now.with_timezone(tz).date_naive();
        match self {
            Day::Today => today,
            Day::Tomorrow => today + Duration::days(1),
        }
    }
}

/// Representative slots of a day, by inclusive local hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPart {
    Morning,
    Noon,
    Evening,
}

impl DayPart {
    pub fn hours(self) -> RangeInclusive<u32> {
        match self {
            DayPart::Morning => 8..=10,
            DayPart::Noon => 12..=14,
            DayPart::Evening => 18..=20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

/// First and last representable instant of `date` in `tz`:
/// 00:00:00.000 and 23:59:59.999 local time.
pub fn day_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN);
    let end = date.and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN));
    (resolve_local(tz, start, true), resolve_local(tz, end, false))
}

// Wall-clock times can be skipped or repeated around DST changes.
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime, earliest: bool) -> DateTime<Utc> {
    let mut probe = local;
    for _ in 0..4 {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(t) => return t.with_timezone(&Utc),
            LocalResult::Ambiguous(a, b) => {
                let picked = if earliest { a } else { b };
                return picked.with_timezone(&Utc);
            }
            LocalResult::None => {
                probe = if earliest {
                    probe + Duration::minutes(30)
                } else {
                    probe - Duration::minutes(30)
                };
            }
        }
    }
    Utc.from_utc_datetime(&local)
}

/// Samples falling on `date` (local calendar day, bounds inclusive), in series order.
///
/// An empty result means "no data for this day", not an error.
pub fn select_day<Tz: TimeZone>(
    samples: &[ForecastSample],
    date: NaiveDate,
    tz: &Tz,
) -> Vec<ForecastSample> {
    let (start, end) = day_bounds(date, tz);
    samples
        .iter()
        .filter(|s| s.time >= start && s.time <= end)
        .cloned()
        .collect()
}

/// First sample whose local hour lies in `hours`, else the day's first sample.
pub fn pick_representative<'a, Tz: TimeZone>(
    samples: &'a [ForecastSample],
    hours: RangeInclusive<u32>,
    tz: &Tz,
) -> Option<&'a ForecastSample> {
    samples
        .iter()
        .find(|s| hours.contains(&s.time.with_timezone(tz).hour()))
        .or_else(|| samples.first())
}

/// Min and max temperature, or `None` for an empty day.
pub fn aggregate(samples: &[ForecastSample]) -> Option<TemperatureRange> {
    let first = samples.first()?.temperature;
    Some(samples.iter().skip(1).fold(
        TemperatureRange {
            min: first,
            max: first,
        },
        |range, s| TemperatureRange {
            min: range.min.min(s.temperature),
            max: range.max.max(s.temperature),
        },
    ))
}

/// Rough chance of precipitation (percent) implied by a condition code.
///
/// Checked in order because codes overlap: showers before rain, rain before
/// drizzle, drizzle before cloud.
pub fn precipitation_likelihood(condition_code: Option<&str>) -> u8 {
    let Some(code) = condition_code else {
        return 0;
    };
    if code.contains("rain_shower") || code.contains("rainshower") {
        60
    } else if code.contains("rain") {
        80
    } else if code.contains("drizzle") {
        40
    } else if code.contains("cloud") {
        20
    } else {
        0
    }
}

/// The first `count` samples: the hourly strip. The head is the current conditions.
pub fn upcoming(samples: &[ForecastSample], count: usize) -> &[ForecastSample] {
    &samples[..samples.len().min(count)]
}

/// Everything a day view shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub first: ForecastSample,
    pub morning: ForecastSample,
    pub noon: ForecastSample,
    pub evening: ForecastSample,
    pub temperature: TemperatureRange,
    pub condition_code: Option<String>,
    pub precipitation_chance: u8,
    pub hourly: Vec<ForecastSample>,
}

/// Summarize `date`, or `None` when the series has nothing for it.
pub fn summarize_day<Tz: TimeZone>(
    samples: &[ForecastSample],
    date: NaiveDate,
    tz: &Tz,
) -> Option<DaySummary> {
    let day = select_day(samples, date, tz);
    let first = day.first()?.clone();
    let temperature = aggregate(&day)?;
    let part = |p: DayPart| {
        pick_representative(&day, p.hours(), tz)
            .cloned()
            .unwrap_or_else(|| first.clone())
    };

    let condition_code = first.period_code().map(str::to_string);
    Some(DaySummary {
        date,
        morning: part(DayPart::Morning),
        noon: part(DayPart::Noon),
        evening: part(DayPart::Evening),
        temperature,
        precipitation_chance: precipitation_likelihood(condition_code.as_deref()),
        condition_code,
        first,
        hourly: day,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Tokyo;

    fn sample_at<Tz: TimeZone>(tz: &Tz, y: i32, mo: u32, d: u32, h: u32, mi: u32, temp: f64) -> ForecastSample {
        ForecastSample {
            time: tz
                .with_ymd_and_hms(y, mo, d, h, mi, 0)
                .unwrap()
                .with_timezone(&Utc),
            temperature: temp,
            humidity: Some(60.0),
            wind_speed: Some(2.0),
            next_1h_code: Some("clearsky_day".to_string()),
            next_6h_code: Some("partlycloudy_day".to_string()),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_select_day_excludes_neighbours() {
        let samples = vec![
            sample_at(&Tokyo, 2024, 1, 1, 23, 0, 1.0),
            sample_at(&Tokyo, 2024, 1, 2, 0, 30, 2.0),
            sample_at(&Tokyo, 2024, 1, 2, 23, 30, 3.0),
            sample_at(&Tokyo, 2024, 1, 3, 0, 10, 4.0),
        ];

        let day = select_day(&samples, date(2024, 1, 2), &Tokyo);

        assert_eq!(day, vec![samples[1].clone(), samples[2].clone()]);
    }

    #[test]
    fn test_select_day_bounds_are_inclusive() {
        let (start, end) = day_bounds(date(2024, 1, 2), &Tokyo);
        assert_eq!(start, Tokyo.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap().with_timezone(&Utc));
        assert_eq!(end - start, Duration::days(1) - Duration::milliseconds(1));

        let mut at_start = sample_at(&Tokyo, 2024, 1, 2, 0, 0, 5.0);
        at_start.time = start;
        let mut at_end = sample_at(&Tokyo, 2024, 1, 2, 0, 0, 6.0);
        at_end.time = end;
        let mut past_end = sample_at(&Tokyo, 2024, 1, 2, 0, 0, 7.0);
        past_end.time = end + Duration::milliseconds(1);

        let day = select_day(&[at_start, at_end, past_end], date(2024, 1, 2), &Tokyo);
        assert_eq!(day.len(), 2);
    }

    #[test]
    fn test_select_day_empty_when_no_match() {
        let samples = vec![sample_at(&Tokyo, 2024, 1, 1, 12, 0, 1.0)];
        assert!(select_day(&samples, date(2024, 1, 5), &Tokyo).is_empty());
    }

    #[test]
    fn test_day_bounds_across_dst_gap() {
        // Clocks in New York jump from 02:00 to 03:00 on 2024-03-10.
        let tz = chrono_tz::America::New_York;
        let (start, end) = day_bounds(date(2024, 3, 10), &tz);
        assert_eq!(end - start, Duration::hours(23) - Duration::milliseconds(1));
    }

    #[test]
    fn test_pick_representative_in_range() {
        let day = vec![
            sample_at(&Tokyo, 2024, 1, 2, 6, 0, 1.0),
            sample_at(&Tokyo, 2024, 1, 2, 9, 0, 2.0),
            sample_at(&Tokyo, 2024, 1, 2, 10, 0, 3.0),
        ];
        let morning = pick_representative(&day, DayPart::Morning.hours(), &Tokyo).unwrap();
        assert_eq!(morning.temperature, 2.0);
    }

    #[test]
    fn test_pick_representative_falls_back_to_first() {
        let day = vec![
            sample_at(&Tokyo, 2024, 1, 2, 0, 0, 1.0),
            sample_at(&Tokyo, 2024, 1, 2, 6, 0, 2.0),
        ];
        let evening = pick_representative(&day, DayPart::Evening.hours(), &Tokyo).unwrap();
        assert_eq!(evening.temperature, 1.0);
        assert!(pick_representative(&[], DayPart::Noon.hours(), &Tokyo).is_none());
    }

    #[test]
    fn test_aggregate() {
        let day: Vec<_> = [10.0, 22.0, 15.0]
            .iter()
            .map(|t| sample_at(&Tokyo, 2024, 1, 2, 12, 0, *t))
            .collect();
        assert_eq!(aggregate(&day), Some(TemperatureRange { min: 10.0, max: 22.0 }));
        assert_eq!(aggregate(&[]), None);
    }

    #[test]
    fn test_precipitation_likelihood() {
        assert_eq!(precipitation_likelihood(Some("lightrainshowers_day")), 60);
        assert_eq!(precipitation_likelihood(Some("rain_showers_night")), 60);
        assert_eq!(precipitation_likelihood(Some("rain")), 80);
        assert_eq!(precipitation_likelihood(Some("heavyrainandthunder")), 80);
        assert_eq!(precipitation_likelihood(Some("drizzle")), 40);
        assert_eq!(precipitation_likelihood(Some("partlycloudy_day")), 20);
        assert_eq!(precipitation_likelihood(Some("clearsky_day")), 0);
        assert_eq!(precipitation_likelihood(None), 0);
    }

    #[test]
    fn test_upcoming_clamps() {
        let samples = vec![sample_at(&Tokyo, 2024, 1, 2, 0, 0, 1.0)];
        assert_eq!(upcoming(&samples, 24).len(), 1);
        assert!(upcoming(&[], 24).is_empty());
    }

    #[test]
    fn test_day_target_date() {
        // 2024-01-01T20:00Z is already Jan 2 in Tokyo.
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(Day::Today.target_date(now, &Tokyo), date(2024, 1, 2));
        assert_eq!(Day::Tomorrow.target_date(now, &Tokyo), date(2024, 1, 3));
    }

    #[test]
    fn test_summarize_day() {
        let mut samples: Vec<_> = (0..24)
            .map(|h| sample_at(&Tokyo, 2024, 1, 2, h, 0, h as f64))
            .collect();
        samples[0].next_6h_code = Some("lightrain".to_string());

        let summary = summarize_day(&samples, date(2024, 1, 2), &Tokyo).unwrap();

        assert_eq!(summary.first.temperature, 0.0);
        assert_eq!(summary.morning.temperature, 8.0);
        assert_eq!(summary.noon.temperature, 12.0);
        assert_eq!(summary.evening.temperature, 18.0);
        assert_eq!(summary.temperature, TemperatureRange { min: 0.0, max: 23.0 });
        assert_eq!(summary.condition_code.as_deref(), Some("lightrain"));
        assert_eq!(summary.precipitation_chance, 80);
        assert_eq!(summary.hourly.len(), 24);

        assert!(summarize_day(&samples, date(2024, 1, 3), &Tokyo).is_none());
    }
}
