use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Fulfilling,
    #[default]
    Calm,
    Down,
}

impl Mood {
    pub const ALL: [Mood; 3] = [Mood::Fulfilling, Mood::Calm, Mood::Down];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Fulfilling => "fulfilling",
            Mood::Calm => "calm",
            Mood::Down => "down",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DayRecord {
    pub mood: Mood,
    #[serde(default)]
    pub reflection: String,
}

/// ISO date -> record for the signed-in user.
pub type EntryMap = BTreeMap<String, DayRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// One row as the backend stores it, minus the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub day: String,
    pub mood: Mood,
    #[serde(default)]
    pub reflection: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub ok: bool,
    pub message: String,
}

impl SyncResult {
    pub fn saved() -> Self {
        Self {
            ok: true,
            message: "Saved".to_string(),
        }
    }

    pub fn not_signed_in() -> Self {
        Self {
            ok: false,
            message: "Sign in to save".to_string(),
        }
    }

    pub fn failed() -> Self {
        Self {
            ok: false,
            message: "Save failed".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ShiftRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct MoodRequest {
    pub mood: Mood,
}

#[derive(Debug, Deserialize)]
pub struct ReflectionRequest {
    pub reflection: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SwipePoint {
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub points: Vec<SwipePoint>,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub token: String,
}

/// What the day card shows for the selected date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCard {
    pub date: String,
    pub label: String,
    pub mood: Mood,
    pub reflection: String,
    pub has_previous: bool,
    pub has_next: bool,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    pub index: u32,
    pub date: String,
    pub past: bool,
    pub mood: Option<Mood>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodTally {
    pub mood: Mood,
    pub days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridResponse {
    pub year: i32,
    pub total_days: u32,
    pub filled_dots: u32,
    pub days_left: u32,
    pub revision: u64,
    pub dots: Vec<Dot>,
    pub tallies: Vec<MoodTally>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub signed_in: bool,
    pub user_id: Option<String>,
    pub login_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressResponse {
    pub header: crate::ticker::HeaderView,
    pub day: crate::ticker::DayView,
}
