//! crates/dairy_track_core/src/session_view.rs
//!
//! Filtering, free-text search, ordering, pagination and volume statistics
//! over the milking-session list. Everything here is a pure function of its
//! inputs; "today" and the local calendar come in through `LocalCalendar`.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use std::collections::HashSet;

use crate::context::SessionScope;
use crate::domain::{CowId, MilkingSessionRecord};
use crate::notification_view::{page_count, paginate};

/// Rows per page in the session table.
pub const SESSION_PAGE_SIZE: usize = 8;

/// Renders a volume the way every total on the page is shown.
pub fn fixed2(value: f64) -> String {
    to_fixed(value, 2)
}

/// Fixed-point rendering where an exact half rounds away from zero (12.25 -> "12.3").
///
/// `format!` alone would round such ties to even.
pub fn to_fixed(value: f64, digits: u32) -> String {
    let precision = digits as usize;
    let scale = 10f64.powi(digits as i32);
    let scaled = value * scale;
    let exact = value.mul_add(scale, -scaled) == 0.0;
    if exact && scaled.fract().abs() == 0.5 {
        let rounded = (scaled.trunc() + scaled.signum()) / scale;
        return format!("{:.*}", precision, rounded);
    }
    format!("{:.*}", precision, value)
}

//=========================================================================================
// Local calendar
//=========================================================================================

/// The viewer's local time zone and the calendar day considered "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalCalendar {
    pub offset: FixedOffset,
    pub today: NaiveDate,
}

impl LocalCalendar {
    /// Reads "today" from the clock. Call once per render; it is not refreshed at midnight.
    pub fn now(offset: FixedOffset) -> Self {
        Self::at(offset, Utc::now())
    }

    pub fn at(offset: FixedOffset, instant: DateTime<Utc>) -> Self {
        Self {
            offset,
            today: instant.with_timezone(&offset).date_naive(),
        }
    }

    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local(instant).date_naive()
    }

    pub fn is_today(&self, instant: DateTime<Utc>) -> bool {
        self.local_date(instant) == self.today
    }
}

/// Part of the day a milking happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
}

impl DayPeriod {
    pub fn label(self) -> &'static str {
        match self {
            DayPeriod::Morning => "Morning",
            DayPeriod::Afternoon => "Afternoon",
            DayPeriod::Evening => "Evening",
        }
    }
}

pub fn period_of_day(hour: u32) -> DayPeriod {
    if hour < 12 {
        DayPeriod::Morning
    } else if hour < 18 {
        DayPeriod::Afternoon
    } else {
        DayPeriod::Evening
    }
}

/// "HH:MM" in local time plus its period, as shown in the session table.
pub fn milking_time_label(calendar: &LocalCalendar, milking_time: DateTime<Utc>) -> (String, DayPeriod) {
    let local = calendar.local(milking_time);
    (local.format("%H:%M").to_string(), period_of_day(local.hour()))
}

//=========================================================================================
// Query and result types
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionFilters {
    pub search_term: String,
    pub cow_id: Option<CowId>,
    pub milker_id: Option<i64>,
    /// A local calendar day.
    pub date: Option<NaiveDate>,
}

impl SessionFilters {
    pub fn is_active(&self) -> bool {
        !self.search_term.is_empty()
            || self.cow_id.is_some()
            || self.milker_id.is_some()
            || self.date.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQuery {
    pub filters: SessionFilters,
    pub page: usize,
    pub page_size: usize,
}

impl Default for SessionQuery {
    fn default() -> Self {
        Self {
            filters: SessionFilters::default(),
            page: 1,
            page_size: SESSION_PAGE_SIZE,
        }
    }
}

/// Aggregates over one set of sessions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VolumeStats {
    pub total_volume: f64,
    pub session_count: usize,
    pub today_volume: f64,
    pub today_sessions: usize,
    pub average_volume: f64,
}

impl VolumeStats {
    pub fn from_sessions<'a, I>(sessions: I, calendar: &LocalCalendar) -> Self
    where
        I: IntoIterator<Item = &'a MilkingSessionRecord>,
    {
        let mut stats = VolumeStats::default();
        for session in sessions {
            stats.total_volume += session.volume;
            stats.session_count += 1;
            if calendar.is_today(session.milking_time) {
                stats.today_volume += session.volume;
                stats.today_sessions += 1;
            }
        }
        if stats.session_count > 0 {
            stats.average_volume = stats.total_volume / stats.session_count as f64;
        }
        stats
    }
}

/// An entry of the cow or milker filter dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionProjection {
    pub items: Vec<MilkingSessionRecord>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// Everything the caller may see.
    pub base: VolumeStats,
    /// What survives the active filters.
    pub filtered: VolumeStats,
    pub has_active_filters: bool,
    pub cow_options: Vec<FilterOption>,
    pub milker_options: Vec<FilterOption>,
}

//=========================================================================================
// Projection
//=========================================================================================

pub fn project(
    sessions: &[MilkingSessionRecord],
    scope: &SessionScope,
    query: &SessionQuery,
    calendar: &LocalCalendar,
) -> SessionProjection {
    let base: Vec<&MilkingSessionRecord> = sessions.iter().filter(|s| scope.allows(s.cow_id)).collect();

    let needle = query.filters.search_term.trim().to_lowercase();
    let mut filtered: Vec<MilkingSessionRecord> = base
        .iter()
        .filter(|s| matches_search(s, &needle, calendar))
        .filter(|s| query.filters.cow_id.map_or(true, |id| s.cow_id == id))
        .filter(|s| query.filters.milker_id.map_or(true, |id| s.milker_id == id))
        .filter(|s| query.filters.date.map_or(true, |d| calendar.local_date(s.milking_time) == d))
        .map(|s| MilkingSessionRecord::clone(s))
        .collect();

    filtered.sort_by(newest_first);

    let base_stats = VolumeStats::from_sessions(base.iter().copied(), calendar);
    let filtered_stats = VolumeStats::from_sessions(&filtered, calendar);

    let total_items = filtered.len();
    let (page, items) = paginate(&filtered, query.page, query.page_size);

    SessionProjection {
        items,
        page,
        total_pages: page_count(total_items, query.page_size),
        total_items,
        base: base_stats,
        filtered: filtered_stats,
        has_active_filters: query.filters.is_active(),
        cow_options: distinct_options(&base, |s| (s.cow_id, s.cow_name.as_deref()), "Cow"),
        milker_options: distinct_options(&base, |s| (s.milker_id, s.milker_name.as_deref()), "Milker"),
    }
}

/// Most recent first: `created_at`, then `id`, then `milking_time`, all descending.
/// Records without `created_at` sort after those that have one.
pub fn newest_first(a: &MilkingSessionRecord, b: &MilkingSessionRecord) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
        .then_with(|| b.milking_time.cmp(&a.milking_time))
}

fn distinct_options<F>(sessions: &[&MilkingSessionRecord], key: F, noun: &str) -> Vec<FilterOption>
where
    F: Fn(&MilkingSessionRecord) -> (i64, Option<&str>),
{
    let mut seen = HashSet::new();
    let mut options = Vec::new();
    for session in sessions {
        let (id, name) = key(session);
        if id == 0 || !seen.insert(id) {
            continue;
        }
        let name = match name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{} #{}", noun, id),
        };
        options.push(FilterOption { id, name });
    }
    options
}

fn matches_search(session: &MilkingSessionRecord, needle: &str, calendar: &LocalCalendar) -> bool {
    needle.is_empty() || search_fields(session, calendar).iter().any(|f| f.contains(needle))
}

/// Every lower-cased rendering of a session a user might type into the search box.
pub fn search_fields(session: &MilkingSessionRecord, calendar: &LocalCalendar) -> Vec<String> {
    let when = calendar.local(session.milking_time);
    let volume = session.volume;
    let raw_volume = volume.to_string();
    let volume_2dp = fixed2(volume);

    let mut fields = vec![
        session.cow_name.as_deref().unwrap_or_default().to_lowercase(),
        session.milker_name.as_deref().unwrap_or_default().to_lowercase(),
        session.cow_id.to_string(),
        session.milker_id.to_string(),
        session.id.to_string(),
        raw_volume.clone(),
        to_fixed(volume, 1),
        volume_2dp.clone(),
        format!("{}", volume.round()),
        session.notes.to_lowercase(),
        period_of_day(when.hour()).label().to_lowercase(),
    ];

    const DATE_FORMATS: [&str; 16] = [
        "%Y-%m-%d",
        "%H:%M",
        "%Y-%m-%d %H:%M",
        "%d/%m/%Y",
        "%m/%d/%Y",
        "%d-%m-%Y",
        "%m-%d-%Y",
        "%Y/%m/%d",
        "%B %Y",
        "%b %Y",
        "%B",
        "%b",
        "%Y",
        "%A",
        "%a",
        "%-I:%M %p",
    ];
    fields.extend(
        DATE_FORMATS
            .iter()
            .map(|fmt| when.format(fmt).to_string().to_lowercase()),
    );

    for suffix in ["l", " l", "liters", " liters", "liter", " liter"] {
        fields.push(format!("{}{}", raw_volume, suffix));
        fields.push(format!("{}{}", volume_2dp, suffix));
    }
    fields
}
