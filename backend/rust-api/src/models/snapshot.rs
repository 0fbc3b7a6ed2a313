use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical normalized view of one EduPage fetch. Not persisted server-side;
/// recomputed per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSnapshot {
    pub grades: Vec<Grade>,
    pub timeline: Vec<TimelineItem>,
    pub timetable: Vec<Lesson>,
    pub homework: Vec<HomeworkItem>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: String,
    pub subject: String,
    pub value: String,
    pub date: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineItem {
    pub id: String,
    pub kind: String,
    pub text: String,
    pub date: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub subject: String,
    pub day: i64,
    pub period: i64,
    pub start: String,
    pub end: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeworkItem {
    pub id: String,
    pub subject: String,
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub done: bool,
}

/// A record that could not be normalized at all (non-object, wrong shape).
/// Field-level gaps are filled with defaults instead and never produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub widget: &'static str,
    pub reason: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} widget: {}", self.widget, self.reason)
    }
}
