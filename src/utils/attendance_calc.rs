//! Attendance arithmetic: working hours, lateness, display status and the
//! range summaries used by the reporting endpoints. Holidays never count as
//! working days, so they are excluded from every percentage denominator.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{Attendance, AttendanceStatus, DocStatus};

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `part / whole * 100` rounded to one decimal, 0 when `whole` is 0.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        0.0
    } else {
        round_to(part / whole * 100.0, 1)
    }
}

/// Hours between check-in and check-out, 2 decimals, never negative.
pub fn working_hours(in_time: Option<NaiveDateTime>, out_time: Option<NaiveDateTime>) -> Option<f64> {
    let (start, end) = (in_time?, out_time?);
    let hours = (end - start).num_seconds() as f64 / 3600.0;
    Some(if hours > 0.0 { round_to(hours, 2) } else { 0.0 })
}

pub fn is_late(in_time: NaiveDateTime, threshold: NaiveTime) -> bool {
    in_time.time() > threshold
}

pub fn late_minutes(in_time: NaiveDateTime, threshold: NaiveTime) -> i64 {
    (in_time.time() - threshold).num_minutes().max(0)
}

/// Status shown to clients: drafts with a check-in are Present, submitted
/// records keep their stored status, anything without a check-in is Absent.
pub fn display_status(docstatus: i8, status: &str, in_time: Option<NaiveDateTime>) -> String {
    if in_time.is_none() {
        return AttendanceStatus::Absent.to_string();
    }
    match DocStatus::from_i8(docstatus) {
        Some(DocStatus::Draft) => AttendanceStatus::Present.to_string(),
        _ => status.to_string(),
    }
}

/// A draft can be submitted once it has a check-out strictly after check-in.
pub fn can_submit(in_time: Option<NaiveDateTime>, out_time: Option<NaiveDateTime>) -> bool {
    matches!((in_time, out_time), (Some(i), Some(o)) if o > i)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Resolves optional bounds: no bounds means the 30 days ending `today`,
    /// a lone end means the 30 days before it, a lone start runs to `today`.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Option<Self> {
        let month = chrono::Duration::days(30);
        let (start, end) = match (start, end) {
            (Some(s), Some(e)) => (s, e),
            (Some(s), None) => (s, today),
            (None, Some(e)) => (e - month, e),
            (None, None) => (today - month, today),
        };
        Self::new(start, end)
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct SummaryStats {
    pub total_records: usize,
    pub total_working_days: usize,
    pub present_days: usize,
    pub wfh_days: usize,
    pub absent_days: usize,
    pub holiday_days: usize,
    pub late_arrivals: usize,
    pub total_working_hours: f64,
    pub avg_working_hours: f64,
    pub attendance_percentage: f64,
}

/// Summarises one employee's non-cancelled records over `range`.
pub fn summarize(
    records: &[Attendance],
    range: DateRange,
    holidays: &BTreeSet<NaiveDate>,
    late_after: NaiveTime,
) -> SummaryStats {
    let records: Vec<&Attendance> = records
        .iter()
        .filter(|r| r.docstatus != DocStatus::Cancelled.as_i8() && range.contains(r.attendance_date))
        .collect();
    let attended: BTreeSet<NaiveDate> = records.iter().map(|r| r.attendance_date).collect();

    let holiday_days = holidays.iter().filter(|d| range.contains(**d)).count();
    let mut working_days = 0;
    let mut absent_days = 0;
    for day in range.days() {
        if holidays.contains(&day) {
            continue;
        }
        working_days += 1;
        if !attended.contains(&day) {
            absent_days += 1;
        }
    }

    let status_count = |s: AttendanceStatus| records.iter().filter(|r| r.status == s.to_string()).count();
    let late_arrivals = records
        .iter()
        .filter(|r| r.in_time.is_some_and(|t| is_late(t, late_after)))
        .count();
    let total_hours: f64 = records
        .iter()
        .filter_map(|r| r.working_hours.or_else(|| working_hours(r.in_time, r.out_time)))
        .sum();

    SummaryStats {
        total_records: records.len(),
        total_working_days: working_days,
        present_days: status_count(AttendanceStatus::Present),
        wfh_days: status_count(AttendanceStatus::WorkFromHome),
        absent_days,
        holiday_days,
        late_arrivals,
        total_working_hours: round_to(total_hours, 2),
        avg_working_hours: if records.is_empty() {
            0.0
        } else {
            round_to(total_hours / records.len() as f64, 2)
        },
        attendance_percentage: percentage(records.len() as f64, working_days as f64),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

/// Compares the mean rate of the first and last seven days. Needs at least
/// two weeks of data; a change within five points is stable.
pub fn trend(daily_rates: &[f64]) -> Trend {
    if daily_rates.len() < 14 {
        return Trend::Stable;
    }
    let first = daily_rates[..7].iter().sum::<f64>() / 7.0;
    let last = daily_rates[daily_rates.len() - 7..].iter().sum::<f64>() / 7.0;
    if last > first + 5.0 {
        Trend::Improving
    } else if last < first - 5.0 {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        d(day).and_hms_opt(h, m, 0).unwrap()
    }

    fn ten_past_five() -> NaiveTime {
        NaiveTime::from_hms_opt(10, 5, 0).unwrap()
    }

    fn record(day: u32, status: AttendanceStatus, in_hm: Option<(u32, u32)>, docstatus: i8) -> Attendance {
        let in_time = in_hm.map(|(h, m)| at(day, h, m));
        Attendance {
            id: day as u64,
            employee_id: 1,
            attendance_date: d(day),
            status: status.to_string(),
            in_time,
            out_time: in_time.map(|_| at(day, 18, 0)),
            work_type: None,
            working_hours: None,
            docstatus,
            modified_at: at(day, 18, 0),
            modified_by: None,
        }
    }

    #[test]
    fn working_hours_rounds_and_clamps() {
        assert_eq!(working_hours(Some(at(2, 9, 0)), Some(at(2, 17, 20))), Some(8.33));
        assert_eq!(working_hours(Some(at(2, 18, 0)), Some(at(2, 9, 0))), Some(0.0));
        assert_eq!(working_hours(Some(at(2, 9, 0)), None), None);
        assert_eq!(working_hours(None, Some(at(2, 9, 0))), None);
    }

    #[test]
    fn lateness_is_strictly_after_threshold() {
        assert!(!is_late(at(2, 10, 5), ten_past_five()));
        assert!(is_late(at(2, 10, 6), ten_past_five()));
        assert_eq!(late_minutes(at(2, 10, 35), ten_past_five()), 30);
        assert_eq!(late_minutes(at(2, 9, 0), ten_past_five()), 0);
    }

    #[test]
    fn display_status_derivation() {
        assert_eq!(display_status(0, "Work From Home", Some(at(2, 9, 0))), "Present");
        assert_eq!(display_status(1, "Work From Home", Some(at(2, 9, 0))), "Work From Home");
        assert_eq!(display_status(1, "Present", None), "Absent");
    }

    #[test]
    fn submit_needs_checkout_after_checkin() {
        assert!(can_submit(Some(at(2, 9, 0)), Some(at(2, 9, 1))));
        assert!(!can_submit(Some(at(2, 9, 0)), Some(at(2, 9, 0))));
        assert!(!can_submit(Some(at(2, 9, 0)), None));
    }

    #[test]
    fn percentage_of_zero_is_zero() {
        assert_eq!(percentage(3.0, 0.0), 0.0);
        assert_eq!(percentage(2.0, 3.0), 66.7);
    }

    #[test]
    fn resolve_defaults_to_last_thirty_days() {
        let r = DateRange::resolve(None, None, d(31)).unwrap();
        assert_eq!(r.start, d(1));
        assert_eq!(r.num_days(), 31);
        assert!(DateRange::resolve(Some(d(5)), Some(d(4)), d(31)).is_none());
    }

    #[test]
    fn holidays_are_excluded_from_the_denominator() {
        // Mon 2 .. Fri 6 March, with Wednesday a holiday
        let range = DateRange::new(d(2), d(6)).unwrap();
        let holidays: BTreeSet<_> = [d(4)].into();
        let records = vec![
            record(2, AttendanceStatus::Present, Some((9, 0)), 1),
            record(3, AttendanceStatus::WorkFromHome, Some((10, 30)), 1),
            record(5, AttendanceStatus::Present, Some((9, 30)), 0),
            record(6, AttendanceStatus::Present, Some((9, 0)), 2),
        ];

        let s = summarize(&records, range, &holidays, ten_past_five());
        assert_eq!(s.total_records, 3);
        assert_eq!(s.total_working_days, 4);
        assert_eq!(s.holiday_days, 1);
        assert_eq!(s.absent_days, 1);
        assert_eq!(s.present_days, 2);
        assert_eq!(s.wfh_days, 1);
        assert_eq!(s.late_arrivals, 1);
        assert_eq!(s.attendance_percentage, 75.0);
    }

    #[test]
    fn all_holiday_range_has_zero_percentage() {
        let range = DateRange::new(d(7), d(8)).unwrap();
        let holidays: BTreeSet<_> = [d(7), d(8)].into();
        let s = summarize(&[], range, &holidays, ten_past_five());
        assert_eq!(s.total_working_days, 0);
        assert_eq!(s.attendance_percentage, 0.0);
    }

    #[test]
    fn trend_needs_two_weeks() {
        assert_eq!(trend(&[50.0; 13]), Trend::Stable);

        let mut rates = vec![50.0; 7];
        rates.extend([60.0; 7]);
        assert_eq!(trend(&rates), Trend::Improving);

        let mut rates = vec![80.0; 7];
        rates.extend([70.0; 7]);
        assert_eq!(trend(&rates), Trend::Declining);

        let mut rates = vec![80.0; 7];
        rates.extend([84.0; 7]);
        assert_eq!(trend(&rates), Trend::Stable);
    }
}
