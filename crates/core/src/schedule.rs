//! Weekly availability: the per-day draft edited on the doctor form and the flat,
//! day-indexed rows persisted by the record store.
//!
//! Day names and day indices both derive from [`DayOfWeek`], so the two can never disagree.
//! Rows are always written for the whole week at once (see
//! [`RecordStore::replace_schedule`](crate::repositories::RecordStore::replace_schedule)).

use crate::constants::IN_OFFICE_SLOT_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// Monday first.
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Persisted index, Monday = 1 through Sunday = 7.
    pub const fn index(self) -> i32 {
        self as i32 + 1
    }

    pub fn from_index(index: i32) -> Option<Self> {
        index
            .checked_sub(1)
            .and_then(|position| usize::try_from(position).ok())
            .and_then(|position| Self::ALL.get(position).copied())
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    const fn position(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DayOfWeek {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|day| day.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown day of week: {s}"))
    }
}

/// How a single day of the draft should be treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayStatus {
    /// Both start and end are set.
    Complete,
    /// Neither is set; the doctor is unavailable that day.
    Off,
    /// Exactly one is set. Never valid for saving.
    HalfFilled,
}

/// One day's hours as edited on the form. Empty strings mean "not set".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlot {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

impl DaySlot {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn off() -> Self {
        Self::default()
    }

    pub fn status(&self) -> DayStatus {
        match (self.start.trim().is_empty(), self.end.trim().is_empty()) {
            (false, false) => DayStatus::Complete,
            (true, true) => DayStatus::Off,
            _ => DayStatus::HalfFilled,
        }
    }
}

/// The doctor form's weekly availability, one slot per day.
///
/// Serializes as a map keyed by day name; days missing from the input deserialize as off.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<DayOfWeek, DaySlot>",
    into = "BTreeMap<DayOfWeek, DaySlot>"
)]
pub struct ScheduleDraft {
    days: [DaySlot; 7],
}

impl ScheduleDraft {
    /// Every day off.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, day: DayOfWeek) -> &DaySlot {
        &self.days[day.position()]
    }

    pub fn set(&mut self, day: DayOfWeek, slot: DaySlot) {
        self.days[day.position()] = slot;
    }

    pub fn with_day(mut self, day: DayOfWeek, start: &str, end: &str) -> Self {
        self.set(day, DaySlot::new(start, end));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (DayOfWeek, &DaySlot)> {
        DayOfWeek::ALL.into_iter().zip(self.days.iter())
    }

    pub fn status(&self, day: DayOfWeek) -> DayStatus {
        self.get(day).status()
    }

    /// First half-filled day in Monday..Sunday order.
    pub fn first_half_filled(&self) -> Option<DayOfWeek> {
        self.iter()
            .find(|(_, slot)| slot.status() == DayStatus::HalfFilled)
            .map(|(day, _)| day)
    }
}

impl From<BTreeMap<DayOfWeek, DaySlot>> for ScheduleDraft {
    fn from(map: BTreeMap<DayOfWeek, DaySlot>) -> Self {
        let mut draft = Self::new();
        for (day, slot) in map {
            draft.set(day, slot);
        }
        draft
    }
}

impl From<ScheduleDraft> for BTreeMap<DayOfWeek, DaySlot> {
    fn from(draft: ScheduleDraft) -> Self {
        DayOfWeek::ALL.into_iter().zip(draft.days).collect()
    }
}

/// Persisted availability for one day of one owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub owner_id: String,
    /// 1 (Monday) to 7 (Sunday); other values are tolerated on read and skipped.
    pub day_index: i32,
    pub start_time: String,
    pub end_time: String,
    pub slot_type: String,
}

/// Result of decoding rows, including what had to be skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScheduleDecode {
    pub draft: ScheduleDraft,
    /// Rows for the owner whose `day_index` names no day.
    pub unrecognised: Vec<ScheduleRow>,
}

/// Flattens a draft into rows, one per complete day, Monday first.
///
/// Off days produce nothing. Half-filled days should have been rejected by step validation; if
/// one arrives here it is treated as off.
pub fn encode(draft: &ScheduleDraft, owner_id: &str) -> Vec<ScheduleRow> {
    draft
        .iter()
        .filter(|(_, slot)| slot.status() == DayStatus::Complete)
        .map(|(day, slot)| ScheduleRow {
            owner_id: owner_id.to_string(),
            day_index: day.index(),
            start_time: slot.start.clone(),
            end_time: slot.end.clone(),
            slot_type: IN_OFFICE_SLOT_TYPE.to_string(),
        })
        .collect()
}

/// Rebuilds a draft from the rows belonging to `owner_id`, reporting unrecognised day indices.
///
/// Rows for other owners are ignored. When two rows name the same day the later one wins.
pub fn decode_with_report(rows: &[ScheduleRow], owner_id: &str) -> ScheduleDecode {
    let mut decoded = ScheduleDecode::default();
    for row in rows.iter().filter(|row| row.owner_id == owner_id) {
        match DayOfWeek::from_index(row.day_index) {
            Some(day) => decoded
                .draft
                .set(day, DaySlot::new(&row.start_time, &row.end_time)),
            None => decoded.unrecognised.push(row.clone()),
        }
    }
    decoded
}

/// Rebuilds a draft from stored rows; skipped rows are logged.
pub fn decode(rows: &[ScheduleRow], owner_id: &str) -> ScheduleDraft {
    let decoded = decode_with_report(rows, owner_id);
    for row in &decoded.unrecognised {
        tracing::warn!(
            owner_id,
            day_index = row.day_index,
            "skipping schedule row with unrecognised day index"
        );
    }
    decoded.draft
}
