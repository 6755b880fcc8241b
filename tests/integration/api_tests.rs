/// HTTP round trips through the application router
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use habit_wave::api::{self, AppState};
use habit_wave::calendar::InMemoryEventStore;
use habit_wave::config::ServerConfig;
use habit_wave::text::{AssistedText, TextCapabilities, TextError, TextGenerator};
use habit_wave::{HabitTrackerServer, SqliteStorage};

/// Router over a fresh database with the local text fallback
fn test_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = ServerConfig::with_database(temp_dir.path().join("habits.db"));
    let server = HabitTrackerServer::new(config).expect("Failed to create server");
    (server.router(), temp_dir)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(body)).await
}

async fn create(app: &Router, desc: &str, priority: i64, extra: Value) -> i64 {
    let mut body = json!({
        "desc": desc,
        "priority": priority,
        "preferences": 0,
        "type": "Health",
        "time": "08:00",
        "days": ["Monday", "Wednesday"],
        "times": ["Morning", "Evening"],
    });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            body.insert(key.clone(), value.clone());
        }
    }

    let (status, habit) = post(app, "/habits", body).await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", habit);
    habit["ID"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _dir) = test_app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_create_returns_full_habit() {
    let (app, _dir) = test_app();

    let (status, habit) = post(
        &app,
        "/habits",
        json!({
            "desc": "Morning run",
            "priority": 3,
            "preferences": 1,
            "type": "Health",
            "time": "07:00",
            "days": ["Monday", "Friday"],
            "times": ["Morning"]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(habit["Desc"], "Morning run");
    assert_eq!(habit["Priority"], 3);
    assert_eq!(habit["Type"], "Health");
    assert_eq!(habit["Remarks"], Value::Null);
    assert_eq!(habit["days"], json!(["Monday", "Friday"]));
    assert_eq!(habit["times"], json!([{"time": "Morning"}]));

    let id = habit["ID"].as_i64().unwrap();
    let (status, fetched) = get(&app, &format!("/habits/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, habit);

    let (status, fetched) = post(&app, "/habits/get", json!({"habit_id": id.to_string()})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["ID"], id);
}

#[tokio::test]
async fn test_create_validation() {
    let (app, _dir) = test_app();

    let (status, body) = post(&app, "/habits", json!({"desc": "No schedule", "times": ["Morning"]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Missing"));

    let (status, _) = post(
        &app,
        "/habits",
        json!({"desc": "x", "type": "Social", "days": ["Monday"], "times": ["Morning"]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &app,
        "/habits",
        json!({"desc": "x", "days": ["Someday"], "times": ["Morning"]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_habit_is_404() {
    let (app, _dir) = test_app();

    let (status, body) = get(&app, "/habits/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Habit not found");

    let (status, _) = get(&app, "/habits/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/habits/update", json!({"habit_id": 999, "priority": 2})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_ordering_and_filter() {
    let (app, _dir) = test_app();
    for priority in [3, 1, 2] {
        create(&app, &format!("p{}", priority), priority, json!({})).await;
    }
    create(&app, "read", 0, json!({"type": "Learning"})).await;

    let (status, habits) = get(&app, "/habits").await;
    assert_eq!(status, StatusCode::OK);
    let priorities: Vec<i64> = habits
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["Priority"].as_i64().unwrap())
        .collect();
    assert_eq!(priorities, vec![3, 2, 1, 0]);

    let (_, learning) = get(&app, "/habits?type=Learning").await;
    assert_eq!(learning.as_array().unwrap().len(), 1);
    assert_eq!(learning[0]["Desc"], "read");

    let (status, health) = post(&app, "/habits/list", json!({"type": "Health"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_partial_update_round_trip() {
    let (app, _dir) = test_app();
    let id = create(&app, "Journal", 1, json!({})).await;

    let (status, body) = post(&app, "/habits/update", json!({"habit_id": id, "priority": 7})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": id, "success": true}));

    let (_, habit) = get(&app, &format!("/habits/{}", id)).await;
    assert_eq!(habit["Priority"], 7);
    assert_eq!(habit["Desc"], "Journal");
    assert_eq!(habit["Type"], "Health");
    assert_eq!(habit["Time"], "08:00");

    let (status, _) = post(
        &app,
        "/habits/update",
        json!({"habit_id": id, "days": ["Sunday"], "times": []}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, habit) = get(&app, &format!("/habits/{}", id)).await;
    assert_eq!(habit["days"], json!(["Sunday"]));
    assert_eq!(habit["times"], json!([]));

    let (status, _) = post(&app, "/habits/update", json!({"habit_id": id, "desc": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (app, _dir) = test_app();
    let id = create(&app, "Temporary", 1, json!({})).await;
    post(&app, "/completions", json!({"habit_id": id})).await;

    let (status, body) = post(&app, "/habits/delete", json!({"habit_id": id})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (status, _) = get(&app, &format!("/habits/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, completions) = get(&app, &format!("/completions/list?habit_id={}", id)).await;
    assert_eq!(completions, json!([]));

    let (status, _) = post(&app, "/habits/delete", json!({"habit_id": id})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_by_day_query() {
    let (app, _dir) = test_app();
    let morning = create(&app, "morning", 1, json!({"days": ["Tuesday"], "times": ["Morning"]})).await;
    let evening = create(&app, "evening", 2, json!({"days": ["Tuesday"], "times": ["Evening"]})).await;
    create(&app, "other day", 9, json!({"days": ["Friday"]})).await;

    let (status, habits) = get(&app, "/habits/by-day?day=Tuesday").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = habits.as_array().unwrap().iter().map(|h| h["ID"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![evening, morning]);

    let (_, habits) = get(&app, "/habits/by-day?day=Tuesday&time=Morning").await;
    assert_eq!(habits.as_array().unwrap().len(), 1);
    assert_eq!(habits[0]["ID"], morning);
    assert_eq!(habits[0]["times"], json!([{"time": "Morning"}]));

    let (status, _) = get(&app, "/habits/by-day").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_completions_stats_and_progress() {
    let (app, _dir) = test_app();
    let id = create(&app, "Read", 1, json!({})).await;

    for date in ["2024-01-10", "2024-01-09T20:15:00", "2024-01-08"] {
        let (status, body) = post(&app, "/completions", json!({"habit_id": id, "completed_at": date})).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["id"].as_i64().is_some());
    }
    // 2024-01-05 at local midnight, as epoch seconds
    let (_, parsed) = {
        let ts = habit_wave::parse_timestamp("2024-01-05").unwrap();
        post(&app, "/completions", json!({"habit_id": id, "completed_at": ts, "notes": "slow"})).await
    };
    assert!(parsed["id"].is_number());

    let (status, stats) = get(&app, &format!("/stats?id={}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({"total": 4, "streakDays": 3}));

    let (_, completions) = post(&app, "/completions/list", json!({"habit_id": id})).await;
    let completions = completions.as_array().unwrap();
    assert_eq!(completions.len(), 4);
    assert_eq!(completions[3]["notes"], "slow");
    assert!(completions[0]["completed_at"].as_i64() > completions[1]["completed_at"].as_i64());

    let (status, progress) = get(&app, &format!("/habits/{}/progress", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        progress,
        json!([
            {"time": "Morning", "completed": 4, "total": 4},
            {"time": "Evening", "completed": 4, "total": 4}
        ])
    );
}

#[tokio::test]
async fn test_completion_errors() {
    let (app, _dir) = test_app();

    let (status, _) = post(&app, "/completions", json!({"habit_id": 41})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(&app, "/completions", json!({"notes": "who?"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = create(&app, "Walk", 1, json!({})).await;
    let (status, _) = post(&app, "/completions", json!({"habit_id": id, "completed_at": "someday"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, stats) = get(&app, "/stats?id=12345").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({"total": 0, "streakDays": 0}));

    let (status, _) = get(&app, "/stats").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remarks_with_local_fallback() {
    let (app, _dir) = test_app();
    let id = create(&app, "Pushups", 1, json!({})).await;

    let (status, body) = post(&app, "/remarks", json!({"habit_id": id, "text": "did 10 pushups"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remark"], "did 10 pushups");

    let (_, body) = post(&app, "/remarks", json!({"habit_id": id, "text": "10 pushups"})).await;
    assert_eq!(body["remark"], "did 10 pushups");

    let (_, body) = post(&app, "/remarks", json!({"habit_id": id, "text": "felt easy"})).await;
    assert_eq!(body["remark"], "did 10 pushups. felt easy");

    let (_, habit) = get(&app, &format!("/habits/{}", id)).await;
    assert_eq!(habit["Remarks"], "did 10 pushups. felt easy");

    let (status, _) = post(&app, "/remarks", json!({"habit_id": 999, "text": "x"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Generator that always answers with far too many words
struct Rambling;

#[async_trait]
impl TextGenerator for Rambling {
    async fn generate(&self, _system_prompt: &str, _messages: &[String]) -> Result<String, TextError> {
        Ok(vec!["word"; 35].join(" "))
    }
}

#[tokio::test]
async fn test_assisted_remark_is_truncated() {
    let assisted = Arc::new(AssistedText::new(Rambling));
    let text = TextCapabilities {
        merger: assisted.clone(),
        profiler: assisted,
    };
    let state = AppState::new(
        Arc::new(SqliteStorage::in_memory().unwrap()),
        text,
        Arc::new(InMemoryEventStore::new()),
    );
    let app = api::router(state);

    let id = create(&app, "Stretch", 1, json!({})).await;
    let (status, body) = post(&app, "/remarks", json!({"habit_id": id, "text": "hamstrings"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remark"].as_str().unwrap().split_whitespace().count(), 20);
}

#[tokio::test]
async fn test_profile() {
    let (app, _dir) = test_app();

    let (status, _) = post(&app, "/profile", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(
        &app,
        "/profile",
        json!({"user_data": {
            "How do you usually prefer to spend your free time?": ["Socializing with friends/family"],
            "Which of the following statements best describes your approach to tasks?":
                "I like to break things into small, manageable tasks"
        }}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["profile"],
        "Based on your answers, you value social connections. \
         You prefer breaking down tasks into smaller parts."
    );
}

#[tokio::test]
async fn test_calendar_events() {
    let (app, _dir) = test_app();

    let (status, created) = post(
        &app,
        "/events/habit",
        json!({
            "summary": "Yoga",
            "start_time": "2024-06-03T07:00:00Z",
            "end_time": "2024-06-03T08:00:00Z",
            "attendees_emails": ["friend@example.com"],
            "repeat_until": "2024-12-31T00:00:00Z",
            "days": ["Monday", "Thursday"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let link = created["link"].as_str().unwrap().to_string();

    let (status, event) = get(&app, &link).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["summary"], "Yoga");
    assert_eq!(event["event_type"], "habit");
    assert_eq!(
        event["recurrence"],
        json!(["RRULE:FREQ=WEEKLY;BYDAY=MO,TH;UNTIL=20241231T000000Z"])
    );

    let (status, _) = post(
        &app,
        "/events/task",
        json!({"summary": "Dentist", "start_time": "2024-06-04T09:00:00", "end_time": "2024-06-04T10:00:00"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, moved) = post(
        &app,
        "/events/reschedule",
        json!({
            "event_name": "Dentist",
            "new_start_time": "2024-06-03T15:00:00Z",
            "new_end_time": "2024-06-03T16:00:00Z"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(moved["link"].is_string());

    let (_, day) = get(&app, "/events/today?date=2024-06-03").await;
    let summaries: Vec<&str> = day.as_array().unwrap().iter().map(|e| e["summary"].as_str().unwrap()).collect();
    assert_eq!(summaries, vec!["Yoga", "Dentist"]);

    let (status, _) = post(
        &app,
        "/events/reschedule",
        json!({
            "event_name": "Nope",
            "new_start_time": "2024-06-03T15:00:00Z",
            "new_end_time": "2024-06-03T16:00:00Z"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post(&app, "/events/clear", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "cleared"}));

    let (status, _) = get(&app, &link).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, "/events/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
