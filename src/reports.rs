// Filter & aggregation engine: everything here is a pure projection over
// the filtered slices, total on empty input (sums 0, groupings empty).
use crate::types::{CountByDayRow, CountByKeyRow, RankingRow, Trip, VisitForm};
use crate::util::parse_travel_time;
use crate::window::DateWindow;
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// Trips whose date falls inside the window, bounds inclusive.
pub fn filter_trips(trips: &[Trip], window: &DateWindow) -> Vec<Trip> {
    trips
        .iter()
        .filter(|t| window.contains(t.date))
        .cloned()
        .collect()
}

/// Forms whose submission *day* falls inside the window. The time-of-day
/// component is dropped before comparing, so a form submitted at any hour
/// of a boundary day is included.
pub fn filter_forms(forms: &[VisitForm], window: &DateWindow) -> Vec<VisitForm> {
    forms
        .iter()
        .filter(|f| window.contains(f.submitted_date()))
        .cloned()
        .collect()
}

pub fn total_distance_km(trips: &[Trip]) -> f64 {
    trips.iter().map(|t| t.distance_km).sum()
}

pub fn total_trip_count(trips: &[Trip]) -> usize {
    trips.len()
}

/// Sum of parsed travel times. Unparsable entries count as zero duration
/// instead of being dropped, so this sum can understate the real total for
/// dirty data while the trip count still includes those rows.
pub fn total_travel_time(trips: &[Trip]) -> Duration {
    trips
        .iter()
        .map(|t| parse_travel_time(&t.travel_time).unwrap_or_else(Duration::zero))
        .fold(Duration::zero(), |acc, d| acc + d)
}

pub fn trips_per_day(trips: &[Trip]) -> Vec<CountByDayRow> {
    count_by_day(trips.iter().map(|t| t.date))
}

pub fn forms_per_day(forms: &[VisitForm]) -> Vec<CountByDayRow> {
    count_by_day(forms.iter().map(|f| f.submitted_date()))
}

// BTreeMap gives the date-ascending ordering both per-day views need.
fn count_by_day(dates: impl Iterator<Item = NaiveDate>) -> Vec<CountByDayRow> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in dates {
        *counts.entry(date).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(date, count)| CountByDayRow { date, count })
        .collect()
}

pub fn form_type_distribution(forms: &[VisitForm]) -> Vec<CountByKeyRow> {
    count_by_key(forms.iter().map(|f| f.form_type.as_str()))
}

pub fn forms_per_employee(forms: &[VisitForm]) -> Vec<CountByKeyRow> {
    count_by_key(forms.iter().map(|f| f.employee.as_str()))
}

// Groups in first-appearance order. That order is what makes the ranking's
// stable sort meaningful: employees tied on count keep their relative order.
fn count_by_key<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<CountByKeyRow> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<CountByKeyRow> = Vec::new();
    for key in keys {
        match index.get(key) {
            Some(&i) => rows[i].count += 1,
            None => {
                index.insert(key.to_string(), rows.len());
                rows.push(CountByKeyRow {
                    key: key.to_string(),
                    count: 1,
                });
            }
        }
    }
    rows
}

/// Employees ordered by descending form count. The sort is stable, so
/// employees with equal counts keep their first-appearance order.
pub fn employee_ranking(forms: &[VisitForm]) -> Vec<RankingRow> {
    let mut rows = forms_per_employee(forms);
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| RankingRow {
            rank: i + 1,
            employee: row.key,
            forms: row.count,
        })
        .collect()
}

/// Distinct non-empty client identifiers present in the filtered forms,
/// in first-appearance order. Feeds the detail-view selector.
pub fn distinct_clients(forms: &[VisitForm]) -> Vec<String> {
    let mut seen: HashMap<&str, ()> = HashMap::new();
    let mut out = Vec::new();
    for f in forms {
        let c = f.client.trim();
        if !c.is_empty() && seen.insert(c, ()).is_none() {
            out.push(c.to_string());
        }
    }
    out
}

/// Every form logged against the given client, in submission order.
pub fn forms_for_client<'a>(forms: &'a [VisitForm], client: &str) -> Vec<&'a VisitForm> {
    forms.iter().filter(|f| f.client == client).collect()
}
