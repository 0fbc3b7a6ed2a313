use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::snapshot::{
    Grade, HomeworkItem, Lesson, ParseWarning, SchoolSnapshot, TimelineItem,
};
use crate::services::session_store::ProxySession;

/// Compatibility shim against an undocumented site; path and payload track
/// what the browser sends, not any published API.
const WIDGET_ENDPOINT: &str = "/user/?akc=getWidgets";
const LOGIN_PATH: &str = "/login/";

const WIDGET_GRADES: &str = "Grades";
const WIDGET_TIMELINE: &str = "Timeline";
const WIDGET_TIMETABLE: &str = "Timetable";
const WIDGET_HOMEWORK: &str = "Homework";

const MAX_GRADES: usize = 5;
const MAX_TIMELINE: usize = 10;

const DEFAULT_SUBJECT: &str = "Neznámy predmet";

#[derive(Debug, thiserror::Error)]
pub enum EdupageError {
    #[error("Neplatné prihlasovacie údaje.")]
    LoginFailed,

    #[error("EduPage vrátil status {0}")]
    UpstreamStatus(u16),

    #[error("EduPage požiadavka zlyhala: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Offline demo bypass: these credentials short-circuit the handshake and
/// serve the synthetic snapshot without any outbound call.
pub fn is_demo_credentials(username: &str, password: &str) -> bool {
    username == "demo" || username == "admin" || password == "demo"
}

/// Browser-emulated login handshake.
///
/// anonymous → login-attempted → authenticated, or → failed (the caller
/// discards the session on failure). Success detection is a heuristic: the
/// site reports the result through redirects, so we settle for "200 and the
/// body does not contain the substring \"error\"".
pub async fn login(
    session: &ProxySession,
    username: &str,
    password: &str,
) -> Result<(), EdupageError> {
    let login_url = format!("{}{}", session.base_url, LOGIN_PATH);

    // Primes the jar with the session cookie and anti-CSRF tokens.
    session.client.get(&login_url).send().await?;

    let response = session
        .client
        .post(&login_url)
        .form(&[("username", username), ("password", password)])
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if !login_succeeded(status, &body) {
        tracing::warn!(
            "EduPage login against {} rejected (status {})",
            session.base_url,
            status
        );
        return Err(EdupageError::LoginFailed);
    }

    tracing::info!("EduPage login succeeded against {}", session.base_url);
    Ok(())
}

/// Success heuristic for the undocumented login flow: final status 200 and
/// the body does not contain the substring "error". A 200 page that merely
/// mentions "error" elsewhere therefore counts as a failed login.
fn login_succeeded(status: reqwest::StatusCode, body: &str) -> bool {
    status == reqwest::StatusCode::OK && !body.contains("error")
}

/// Fetches the widget payload and normalizes it. No retry here; a single
/// failed POST surfaces to the caller.
pub async fn fetch_snapshot(session: &ProxySession) -> Result<SchoolSnapshot, EdupageError> {
    if session.demo {
        return Ok(demo_snapshot());
    }

    let url = format!("{}{}", session.base_url, WIDGET_ENDPOINT);

    let response = session
        .client
        .post(&url)
        .json(&json!({
            "widgets": [WIDGET_TIMELINE, WIDGET_GRADES, WIDGET_TIMETABLE, WIDGET_HOMEWORK],
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(EdupageError::UpstreamStatus(response.status().as_u16()));
    }

    let payload: Value = response.json().await?;
    Ok(transform(&payload))
}

/// Maps the raw widget payload into the canonical snapshot. A malformed or
/// partially-populated payload degrades field-by-field; only records that
/// are not objects at all are skipped, with a logged warning.
pub fn transform(payload: &Value) -> SchoolSnapshot {
    let mut warnings: Vec<ParseWarning> = Vec::new();

    let mut grades: Vec<Grade> = widget_items(payload, WIDGET_GRADES)
        .iter()
        .filter_map(|raw| collect(parse_grade(raw), &mut warnings))
        .collect();
    grades.sort_by(|a, b| b.date.cmp(&a.date));
    grades.truncate(MAX_GRADES);

    let mut timeline: Vec<TimelineItem> = widget_items(payload, WIDGET_TIMELINE)
        .iter()
        .filter_map(|raw| collect(parse_timeline_item(raw), &mut warnings))
        .collect();
    timeline.sort_by(|a, b| b.date.cmp(&a.date));
    timeline.truncate(MAX_TIMELINE);

    let timetable: Vec<Lesson> = widget_items(payload, WIDGET_TIMETABLE)
        .iter()
        .filter_map(|raw| collect(parse_lesson(raw), &mut warnings))
        .collect();

    let homework: Vec<HomeworkItem> = widget_items(payload, WIDGET_HOMEWORK)
        .iter()
        .filter_map(|raw| collect(parse_homework(raw), &mut warnings))
        .collect();

    for warning in &warnings {
        tracing::warn!("Skipped unparseable record in {}", warning);
    }

    SchoolSnapshot {
        grades,
        timeline,
        timetable,
        homework,
        fetched_at: Utc::now(),
    }
}

fn collect<T>(result: Result<T, ParseWarning>, warnings: &mut Vec<ParseWarning>) -> Option<T> {
    match result {
        Ok(entity) => Some(entity),
        Err(warning) => {
            warnings.push(warning);
            None
        }
    }
}

/// Widget records live under `widgets.<Name>`, either as a bare array or
/// wrapped in `{ "items": [...] }`.
fn widget_items(payload: &Value, widget: &str) -> Vec<Value> {
    let node = &payload["widgets"][widget];
    if let Some(items) = node.as_array() {
        return items.clone();
    }
    node["items"].as_array().cloned().unwrap_or_default()
}

fn parse_grade(raw: &Value) -> Result<Grade, ParseWarning> {
    let obj = as_object(raw, WIDGET_GRADES)?;
    Ok(Grade {
        id: str_field(obj, "id").unwrap_or_else(generated_id),
        subject: str_field(obj, "subject").unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        value: str_field(obj, "value")
            .or_else(|| str_field(obj, "grade"))
            .unwrap_or_else(|| "?".to_string()),
        date: date_field(obj, "date"),
        comment: str_field(obj, "comment"),
    })
}

fn parse_timeline_item(raw: &Value) -> Result<TimelineItem, ParseWarning> {
    let obj = as_object(raw, WIDGET_TIMELINE)?;
    Ok(TimelineItem {
        id: str_field(obj, "id").unwrap_or_else(generated_id),
        kind: str_field(obj, "type").unwrap_or_else(|| "sprava".to_string()),
        text: str_field(obj, "text").unwrap_or_default(),
        date: date_field(obj, "date"),
        author: str_field(obj, "author"),
    })
}

fn parse_lesson(raw: &Value) -> Result<Lesson, ParseWarning> {
    let obj = as_object(raw, WIDGET_TIMETABLE)?;
    Ok(Lesson {
        id: str_field(obj, "id").unwrap_or_else(generated_id),
        subject: str_field(obj, "subject").unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        day: int_field(obj, "day"),
        period: int_field(obj, "period"),
        start: str_field(obj, "start").unwrap_or_default(),
        end: str_field(obj, "end").unwrap_or_default(),
        teacher: str_field(obj, "teacher"),
        room: str_field(obj, "room"),
    })
}

fn parse_homework(raw: &Value) -> Result<HomeworkItem, ParseWarning> {
    let obj = as_object(raw, WIDGET_HOMEWORK)?;
    Ok(HomeworkItem {
        id: str_field(obj, "id").unwrap_or_else(generated_id),
        subject: str_field(obj, "subject").unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        title: str_field(obj, "title")
            .or_else(|| str_field(obj, "name"))
            .unwrap_or_default(),
        due_date: date_field(obj, "dueDate"),
        done: obj.get("done").and_then(Value::as_bool).unwrap_or(false),
    })
}

fn as_object<'a>(
    raw: &'a Value,
    widget: &'static str,
) -> Result<&'a serde_json::Map<String, Value>, ParseWarning> {
    raw.as_object().ok_or_else(|| ParseWarning {
        widget,
        reason: format!("record is not an object: {}", raw),
    })
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn int_field(obj: &serde_json::Map<String, Value>, key: &str) -> i64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn date_field(obj: &serde_json::Map<String, Value>, key: &str) -> DateTime<Utc> {
    match obj.get(key) {
        Some(Value::String(s)) => parse_date(s).unwrap_or_else(Utc::now),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .unwrap_or_else(Utc::now),
        _ => Utc::now(),
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0)?));
    }
    None
}

fn generated_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fixed sample data served to demo sessions.
pub fn demo_snapshot() -> SchoolSnapshot {
    let day = |d: u32, h: u32| {
        Utc.with_ymd_and_hms(2025, 9, d, h, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    };

    SchoolSnapshot {
        grades: vec![
            Grade {
                id: "demo-g1".to_string(),
                subject: "Matematika".to_string(),
                value: "1".to_string(),
                date: day(12, 9),
                comment: Some("Písomka: zlomky".to_string()),
            },
            Grade {
                id: "demo-g2".to_string(),
                subject: "Slovenský jazyk".to_string(),
                value: "2".to_string(),
                date: day(10, 10),
                comment: None,
            },
            Grade {
                id: "demo-g3".to_string(),
                subject: "Prírodoveda".to_string(),
                value: "1".to_string(),
                date: day(8, 11),
                comment: Some("Projekt o rastlinách".to_string()),
            },
        ],
        timeline: vec![
            TimelineItem {
                id: "demo-t1".to_string(),
                kind: "sprava".to_string(),
                text: "Zajtra si prineste cvičebný úbor.".to_string(),
                date: day(12, 14),
                author: Some("p. učiteľka Nováková".to_string()),
            },
            TimelineItem {
                id: "demo-t2".to_string(),
                kind: "oznam".to_string(),
                text: "V piatok je riaditeľské voľno.".to_string(),
                date: day(11, 8),
                author: None,
            },
        ],
        timetable: vec![
            Lesson {
                id: "demo-l1".to_string(),
                subject: "Matematika".to_string(),
                day: 1,
                period: 1,
                start: "08:00".to_string(),
                end: "08:45".to_string(),
                teacher: Some("p. učiteľka Nováková".to_string()),
                room: Some("3.A".to_string()),
            },
            Lesson {
                id: "demo-l2".to_string(),
                subject: "Slovenský jazyk".to_string(),
                day: 1,
                period: 2,
                start: "08:55".to_string(),
                end: "09:40".to_string(),
                teacher: Some("p. učiteľ Kováč".to_string()),
                room: Some("3.A".to_string()),
            },
        ],
        homework: vec![HomeworkItem {
            id: "demo-h1".to_string(),
            subject: "Matematika".to_string(),
            title: "Pracovný list: zlomky, úlohy 1–5".to_string(),
            due_date: day(15, 8),
            done: false,
        }],
        fetched_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_success_heuristic() {
        use reqwest::StatusCode;

        assert!(login_succeeded(StatusCode::OK, "<html>Vitaj, Janko!</html>"));
        assert!(!login_succeeded(
            StatusCode::OK,
            "<html>Prihlásenie zlyhalo: error</html>"
        ));
        // "error" anywhere in a 200 body counts as failure, even incidentally
        assert!(!login_succeeded(
            StatusCode::OK,
            "<script>window.errorHandler = 1</script>"
        ));
        assert!(!login_succeeded(StatusCode::FOUND, "ok"));
        assert!(!login_succeeded(StatusCode::INTERNAL_SERVER_ERROR, "ok"));
    }

    #[test]
    fn test_demo_credentials() {
        assert!(is_demo_credentials("demo", "whatever"));
        assert!(is_demo_credentials("admin", "whatever"));
        assert!(is_demo_credentials("janko", "demo"));
        assert!(!is_demo_credentials("janko", "tajneheslo"));
    }

    #[test]
    fn test_demo_snapshot_shape() {
        let snapshot = demo_snapshot();
        assert!(!snapshot.grades.is_empty());
        assert!(!snapshot.timetable.is_empty());
        assert!(snapshot.grades.len() <= 5);
        assert!(snapshot.timeline.len() <= 10);
    }

    #[test]
    fn test_transform_fills_defaults() {
        let payload = json!({
            "widgets": {
                "Grades": { "items": [
                    { "value": "3" },
                ]},
                "Homework": [ { "title": "Úloha" } ],
            }
        });

        let snapshot = transform(&payload);
        assert_eq!(snapshot.grades.len(), 1);
        assert_eq!(snapshot.grades[0].subject, "Neznámy predmet");
        assert!(!snapshot.grades[0].id.is_empty());

        assert_eq!(snapshot.homework.len(), 1);
        assert_eq!(snapshot.homework[0].title, "Úloha");
        assert!(!snapshot.homework[0].done);

        assert!(snapshot.timeline.is_empty());
        assert!(snapshot.timetable.is_empty());
    }

    #[test]
    fn test_transform_skips_non_object_records() {
        let payload = json!({
            "widgets": {
                "Grades": [ "garbage", { "subject": "Matematika", "value": "1" }, 42 ],
            }
        });

        let snapshot = transform(&payload);
        assert_eq!(snapshot.grades.len(), 1);
        assert_eq!(snapshot.grades[0].subject, "Matematika");
    }

    #[test]
    fn test_grades_capped_to_five_most_recent() {
        let items: Vec<Value> = (1..=8)
            .map(|d| {
                json!({
                    "id": format!("g{}", d),
                    "subject": "Matematika",
                    "value": "1",
                    "date": format!("2025-09-{:02} 08:00:00", d),
                })
            })
            .collect();
        let payload = json!({ "widgets": { "Grades": items } });

        let snapshot = transform(&payload);
        assert_eq!(snapshot.grades.len(), 5);
        // Newest first
        assert_eq!(snapshot.grades[0].id, "g8");
        assert_eq!(snapshot.grades[4].id, "g4");
    }

    #[test]
    fn test_timeline_capped_to_ten() {
        let items: Vec<Value> = (1..=14)
            .map(|d| json!({ "id": format!("t{}", d), "text": "oznam" }))
            .collect();
        let payload = json!({ "widgets": { "Timeline": items } });

        assert_eq!(transform(&payload).timeline.len(), 10);
    }

    #[test]
    fn test_malformed_payload_yields_empty_snapshot() {
        let snapshot = transform(&json!({ "unexpected": true }));
        assert!(snapshot.grades.is_empty());
        assert!(snapshot.homework.is_empty());
    }

    #[test]
    fn test_date_parsing_variants() {
        assert!(parse_date("2025-09-12 08:00:00").is_some());
        assert!(parse_date("2025-09-12").is_some());
        assert!(parse_date("2025-09-12T08:00:00Z").is_some());
        assert!(parse_date("dnes").is_none());
    }
}
