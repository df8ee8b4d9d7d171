use axum::http::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
async fn welcome_and_health() {
    let app = common::create_test_app().await;

    let (status, body) = common::get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("Micro-Learning"));

    let (status, body) = common::get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = common::get(&app, "/health/live").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = common::create_test_app().await;
    let (status, body) = common::get(&app, "/nonexistent/path").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn start_returns_session_with_first_question() {
    let app = common::create_test_app().await;

    let (status, body) = common::post_json(
        &app,
        "/start",
        json!({"user_id": "u1", "topic": "algebra", "course": "intro"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["session_id"].as_str().unwrap().starts_with("sess_"));
    assert_eq!(body["question"]["options"].as_array().unwrap().len(), 4);
    assert_eq!(body["question"]["difficulty"], "easy");
    assert_eq!(body["progress"]["answered"], 0);
    assert_eq!(body["progress"]["score"], 0);
    assert_eq!(body["progress"]["level"], "easy");
    assert_eq!(body["progress"]["total_questions"], 5);
}

#[tokio::test]
async fn start_validates_inputs() {
    let app = common::create_test_app().await;

    for num_questions in [0, 21] {
        let (status, body) = common::post_json(
            &app,
            "/start",
            json!({
                "user_id": "u1",
                "topic": "algebra",
                "course": "intro",
                "num_questions": num_questions
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    let (status, body) = common::post_json(
        &app,
        "/start",
        json!({"user_id": "  ", "topic": "algebra", "course": "intro"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn answer_unknown_session_is_404() {
    let app = common::create_test_app().await;

    let (status, body) = common::post_json(
        &app,
        "/answer",
        json!({"session_id": "sess_missing", "answer_index": 0, "time_taken": 1.0}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn out_of_range_index_is_just_incorrect() {
    let app = common::create_test_app().await;

    let (_, started) = common::post_json(
        &app,
        "/start",
        json!({"user_id": "u1", "topic": "algebra", "course": "intro"}),
    )
    .await;
    let session_id = started["session_id"].as_str().unwrap();

    let (status, body) = common::post_json(
        &app,
        "/answer",
        json!({"session_id": session_id, "answer_index": 99, "time_taken": 2.0}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["correct"], false);
}

#[tokio::test]
async fn progress_read_is_idempotent() {
    let app = common::create_test_app().await;

    let (_, started) = common::post_json(
        &app,
        "/start",
        json!({"user_id": "u1", "topic": "algebra", "course": "intro"}),
    )
    .await;
    let session_id = started["session_id"].as_str().unwrap();

    let (status, first) = common::get(&app, &format!("/progress/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = common::get(&app, &format!("/progress/{session_id}")).await;
    assert_eq!(first, second);
}

/// The end-to-end session lifecycle: two questions, one correct answer and
/// one miss on a weakened skill, then archival to history.
#[tokio::test]
async fn full_session_lifecycle_with_archival() {
    let app = common::create_test_app().await;

    let (status, started) = common::post_json(
        &app,
        "/start",
        json!({
            "user_id": "u1",
            "topic": "algebra",
            "course": "intro",
            "num_questions": 2
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["progress"]["answered"], 0);
    assert_eq!(started["progress"]["level"], "easy");
    let session_id = started["session_id"].as_str().unwrap().to_string();

    // First answer: correct.
    let correct_index = started["question"]["correct_index"].as_u64().unwrap();
    let (status, first) = common::post_json(
        &app,
        "/answer",
        json!({"session_id": session_id, "answer_index": correct_index, "time_taken": 3.5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["correct"], true);
    assert_eq!(first["progress"]["answered"], 1);
    assert_eq!(first["progress"]["score"], 10);
    assert_eq!(first["next_step"]["type"], "question");
    assert_eq!(
        first["progress"]["question_history"].as_array().unwrap().len(),
        1
    );

    // Second answer: a miss. The skill sits at 0.6 after the correct answer
    // and drops to 0.4, which is below the remediation threshold, so the
    // response carries a content step with the next question embedded.
    let next_correct = first["next_step"]["data"]["correct_index"].as_u64().unwrap();
    let wrong_index = (next_correct + 1) % 4;
    let (status, second) = common::post_json(
        &app,
        "/answer",
        json!({"session_id": session_id, "answer_index": wrong_index, "time_taken": 8.0}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["correct"], false);
    assert!(second["explanation"].as_str().unwrap().starts_with("Not quite."));
    assert_eq!(second["next_step"]["type"], "content");
    assert!(second["next_step"]["data"]["title"]
        .as_str()
        .unwrap()
        .starts_with("Reviewing: "));
    let embedded = &second["next_step"]["data"]["next_question"];
    assert_eq!(embedded["options"].as_array().unwrap().len(), 4);
    assert_eq!(second["progress"]["answered"], 2);
    assert_eq!(
        second["progress"]["question_history"].as_array().unwrap().len(),
        2
    );

    // The session completed, so it is archived: further reads and answers
    // report not-found.
    let (status, _) = common::get(&app, &format!("/progress/{session_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::post_json(
        &app,
        "/answer",
        json!({"session_id": session_id, "answer_index": 0, "time_taken": 1.0}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Exactly one history record for the user, carrying the final progress.
    let (status, history) = common::get(&app, "/history/u1").await;
    assert_eq!(status, StatusCode::OK);
    let records = history.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["session_id"], session_id.as_str());
    assert_eq!(records[0]["user_id"], "u1");
    assert_eq!(records[0]["progress"]["answered"], 2);
    assert_eq!(records[0]["progress"]["score"], 10);
}

#[tokio::test]
async fn history_for_unknown_user_is_empty() {
    let app = common::create_test_app().await;
    let (status, body) = common::get(&app, "/history/nobody").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);
}
