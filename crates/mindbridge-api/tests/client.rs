//! Client tests against an in-process axum server standing in for the
//! backend.

use axum::body::Body;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use mindbridge_api::client::ApiClient;
use mindbridge_api::error::ApiError;
use mindbridge_api::sse::StreamEvent;
use mindbridge_api::{auth, catalog, chat, children, review, session};
use mindbridge_core::models::child::NewChild;
use mindbridge_core::models::questionnaire::Audience;
use mindbridge_core::models::review::DiagnosisUpdate;
use mindbridge_core::models::session::{AnswerOutcome, ChatStreamRequest, StartRequest};
use mindbridge_core::models::user::{LoginRequest, Role};

async fn start_handler(Json(body): Json<Value>) -> Response {
    if body["tnc_accepted"] != json!(true) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "detail": "Terms and Conditions must be accepted to start the questionnaire"
            })),
        )
            .into_response();
    }
    Json(json!({
        "session_id": "session_Asha_1",
        "question": "Does Asha sleep well?",
        "options": ["Yes", "No"]
    }))
    .into_response()
}

async fn answer_handler(Json(body): Json<Value>) -> Json<Value> {
    if body["answer_index"] == json!(1) {
        Json(json!({ "is_complete": true, "results": { "score": 3 } }))
    } else {
        Json(json!({
            "is_complete": false,
            "question": "How often?",
            "options": ["Rarely", "Often"]
        }))
    }
}

async fn stream_handler() -> Response {
    let pieces = vec![
        "data: {\"chunk\": \"Tell me \", \"complete\": false}\n\n",
        "data: {\"chu",
        "nk\": \"more\", \"complete\": false}\n\n",
        "data: {broken\n\n",
        "data: {\"chunk\": \"\", \"complete\": true, \"status\": true}\n\n",
        "data: {\"chunk\": \"after end\"}\n\n",
    ];
    let stream = futures::stream::iter(
        pieces
            .into_iter()
            .map(|p| Ok::<_, std::io::Error>(p.as_bytes().to_vec())),
    );
    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(stream),
    )
        .into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn children_handler(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if bearer(&headers) != Some("tok-1") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Not authenticated" })))
            .into_response();
    }
    Json(json!({
        "children": [{
            "_id": "c1",
            "name": "Asha",
            "dob": "2015-06-01",
            "gender": "Female",
            "school": "Hillview",
            "parent_name": "Meera",
            "parent_mobile": body["mobile"],
            "age": 11
        }]
    }))
    .into_response()
}

// Echoes the raw request path as the instructions.
async fn questionnaire_handler(uri: Uri, Path(name): Path<String>) -> Json<Value> {
    Json(json!({
        "questionnaire": {
            "questionnaire": name,
            "instructions": uri.path(),
            "questions": [{ "question": "Q1", "type": 1, "options": ["Yes", "No"] }]
        }
    }))
}

async fn diagnosis_handler(Json(body): Json<Value>) -> Response {
    if body["session_id"] == json!("known") {
        Json(json!({ "message": "Diagnosis updated successfully" })).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": format!("Chat with session ID '{}' not found", body["session_id"].as_str().unwrap_or_default()) })),
        )
            .into_response()
    }
}

async fn login_handler(Json(body): Json<Value>) -> Response {
    if body["password"] != json!("secret") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Invalid credentials" })))
            .into_response();
    }
    Json(json!({
        "message": "Logged in successfully!",
        "access_token": "tok-1",
        "token_type": "bearer",
        "user": { "mobile": body["mobile"], "role": "Parent", "name": "Meera" },
        "expires_in": 86400
    }))
    .into_response()
}

async fn add_child_handler(Json(body): Json<Value>) -> Response {
    if body["teacher_mobile"].is_null() || body["school"] == json!("") {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": "missing fields" })))
            .into_response();
    }
    Json(json!({ "message": "Child added successfully", "child_id": "c-new" })).into_response()
}

async fn delete_child_handler(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "message": format!("Deleted {}", body["child_id"].as_str().unwrap_or_default()) }))
}

async fn by_school_handler(Json(body): Json<Value>) -> Response {
    if body["school"] != json!("Hillview") {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "No children found for this school" })),
        )
            .into_response();
    }
    Json(json!({
        "children": [
            { "_id": "c1", "name": "Asha", "dob": "2015-06-01", "gender": "Female", "school": "Hillview" },
            { "_id": "c2", "name": "Anil", "dob": "2014-02-11", "gender": "Male", "school": "Hillview" }
        ]
    }))
    .into_response()
}

async fn end_handler(Json(body): Json<Value>) -> Response {
    if body["feedback"].as_str().unwrap_or_default().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "detail": "Feedback is required" })))
            .into_response();
    }
    Json(json!({
        "message": format!("Feedback saved for {}", body["session_id"].as_str().unwrap_or_default())
    }))
    .into_response()
}

async fn responses_handler() -> Json<Value> {
    Json(json!({
        "responses": [
            {
                "session_id": "s-1",
                "student_name": "Asha",
                "school": "Hillview",
                "gaurdian_role": "Parent",
                "gaurdian_name": "Meera",
                "diagnosis": "Sleep disturbance"
            },
            { "session_id": "s-2", "student_name": "Ravi", "school": "Lakeside" }
        ]
    }))
}

async fn chat_record_handler(uri: Uri, Path(session_id): Path<String>) -> Json<Value> {
    Json(json!({
        "chat": {
            "session_id": session_id,
            "student_name": "Asha",
            "questionnaire_name": uri.path(),
            "conversation": [
                { "role": "bot", "message": "Does Asha sleep well?", "question_index": 0 },
                { "role": "user", "message": "Yes" },
                { "role": "bot", "message": "Tell me more", "question_index": -1 }
            ],
            "feedback": "Helpful"
        }
    }))
}

async fn set_type_handler(Json(body): Json<Value>) -> Response {
    if body["questionnaireName"].is_null() || body["type"] != json!("teacher") {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": "bad body" })))
            .into_response();
    }
    Json(json!({ "message": "Questionnaire type updated" })).into_response()
}

async fn refresh_handler(headers: HeaderMap) -> Response {
    if bearer(&headers) != Some("tok-1") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Could not validate credentials" })))
            .into_response();
    }
    Json(json!({ "access_token": "tok-2", "token_type": "bearer", "expires_in": 3600 }))
        .into_response()
}

async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/api/auth/login", post(login_handler))
        .route("/api/questionnaire/start", post(start_handler))
        .route("/api/questionnaire/answer", post(answer_handler))
        .route("/api/questionnaire/end", post(end_handler))
        .route("/api/chat/stream", post(stream_handler))
        .route("/api/parent/children", post(children_handler))
        .route("/api/teacher/add-child", post(add_child_handler))
        .route("/api/teacher/delete-child", post(delete_child_handler))
        .route("/api/psychologist/children-by-school", post(by_school_handler))
        .route("/api/psychologist/chat-responses", get(responses_handler))
        .route(
            "/api/psychologist/get-unique-schools",
            get(|| async { Json(json!({ "schools": ["Hillview", "Lakeside"] })) }),
        )
        .route("/api/psychologist/chat/{session_id}", get(chat_record_handler))
        .route("/set_questionnaire_type", post(set_type_handler))
        .route("/api/auth/refresh-token", post(refresh_handler))
        .route(
            "/api/get/ping",
            get(|| async { Json(json!({ "status": "ok", "message": "pong" })) }),
        )
        .route("/api/get/questionnaire/{name}", get(questionnaire_handler))
        .route("/api/get/models", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/api/psychologist/update-diagnosis",
            post(diagnosis_handler),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn start_request(tnc_accepted: bool) -> StartRequest {
    StartRequest {
        student_name: "Asha".to_string(),
        student_dob: "2015-06-01".to_string(),
        student_gender: "Female".to_string(),
        parent_name: Some("Meera".to_string()),
        parent_mobile: None,
        teacher_name: None,
        teacher_mobile: None,
        school: None,
        questionnaire_name: "SDQ".to_string(),
        tnc_accepted,
    }
}

#[tokio::test]
async fn start_returns_session_and_first_question() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();

    let started = session::start(&client, &start_request(true)).await.unwrap();
    assert_eq!(started.session_id, "session_Asha_1");
    assert_eq!(started.question.as_deref(), Some("Does Asha sleep well?"));
    assert_eq!(started.options, vec!["Yes", "No"]);
}

#[tokio::test]
async fn non_success_status_carries_server_detail() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();

    let err = session::start(&client, &start_request(false)).await.unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::BAD_REQUEST));
    assert_eq!(
        err.user_message(),
        "Terms and Conditions must be accepted to start the questionnaire"
    );
}

#[tokio::test]
async fn answer_reports_next_question_or_completion() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();

    let next = session::answer(&client, "s", "Yes", 0).await.unwrap();
    assert!(matches!(next, AnswerOutcome::Next { ref question, .. } if question == "How often?"));

    let done = session::answer(&client, "s", "No", 1).await.unwrap();
    assert!(done.is_complete());
}

#[tokio::test]
async fn chat_stream_yields_chunks_until_complete() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();
    let request = ChatStreamRequest {
        session_id: "s".to_string(),
        question: "/start".to_string(),
        model: "Mistral".to_string(),
        age: 11,
    };

    let mut stream = chat::chat_stream(&client, &request).await.unwrap();
    let mut events = Vec::new();
    while let Some(event) = stream.next_event().await {
        events.push(event.unwrap());
    }

    assert_eq!(
        events,
        vec![
            StreamEvent::Chunk("Tell me ".to_string()),
            StreamEvent::Chunk("more".to_string()),
            StreamEvent::Complete {
                status: true,
                error: None
            },
        ]
    );
    assert_eq!(stream.skipped(), 1);
}

#[tokio::test]
async fn protected_calls_send_bearer_token() {
    let base = spawn_backend().await;

    let anonymous = ApiClient::new(&base, None).unwrap();
    let err = children::list_children(&anonymous, Role::Parent, "9990001111")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated));

    let login = auth::login(
        &anonymous,
        &LoginRequest {
            mobile: "9990001111".to_string(),
            password: "secret".to_string(),
        },
    )
    .await
    .unwrap();
    let creds = login.into_credentials(jiff::Timestamp::now());
    assert_eq!(creds.user.role, Role::Parent);

    let client = anonymous.with_token(creds.token);
    let kids = children::list_children(&client, Role::Parent, "9990001111")
        .await
        .unwrap();
    assert_eq!(kids.len(), 1);
    assert_eq!(kids[0].parent_mobile, "9990001111");
}

#[tokio::test]
async fn bad_login_is_a_status_error() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();
    let err = auth::login(
        &client,
        &LoginRequest {
            mobile: "9990001111".to_string(),
            password: "wrong".to_string(),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
    assert_eq!(err.user_message(), "Invalid credentials");
}

#[tokio::test]
async fn questionnaire_name_is_path_encoded() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();

    let questionnaire = catalog::get_questionnaire(&client, "Child Behaviour")
        .await
        .unwrap();
    assert_eq!(questionnaire.name, "Child Behaviour");
    assert_eq!(
        questionnaire.instructions,
        "/api/get/questionnaire/Child%20Behaviour"
    );
    assert_eq!(questionnaire.questions.len(), 1);
}

#[tokio::test]
async fn model_list_falls_back_when_unavailable() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();

    assert_eq!(
        catalog::models_or_fallback(&client).await,
        vec!["Gemini", "GPT-4"]
    );
}

#[tokio::test]
async fn diagnosis_for_unknown_session_is_not_found() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();

    review::update_diagnosis(
        &client,
        &DiagnosisUpdate {
            session_id: "known".to_string(),
            diagnosis: "ADHD screen positive".to_string(),
        },
    )
    .await
    .unwrap();

    let err = review::update_diagnosis(
        &client,
        &DiagnosisUpdate {
            session_id: "ghost".to_string(),
            diagnosis: "n/a".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
    assert!(err.user_message().contains("ghost"));
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ApiClient::new("not a url", None).unwrap_err();
    assert!(matches!(err, ApiError::InvalidUrl { .. }));
}

#[test]
fn urls_join_under_base_path() {
    let client = ApiClient::new("http://example.test/backend/", None).unwrap();
    assert_eq!(
        client.url(&["api", "psychologist", "chat", "s 1"]).as_str(),
        "http://example.test/backend/api/psychologist/chat/s%201"
    );
}

fn new_child() -> NewChild {
    NewChild {
        name: "Anil".to_string(),
        dob: "2014-02-11".to_string(),
        gender: "Male".to_string(),
        school: "Hillview".to_string(),
        parent_name: String::new(),
        parent_mobile: String::new(),
        teacher_name: Some("Ms Rao".to_string()),
        teacher_mobile: Some("9990002222".to_string()),
    }
}

#[tokio::test]
async fn teacher_adds_and_deletes_child() {
    let client = ApiClient::new(&spawn_backend().await, None)
        .unwrap()
        .with_token("tok-1");

    let added = children::add_child(&client, Role::Teacher, &new_child())
        .await
        .unwrap();
    assert_eq!(added.child_id, "c-new");
    assert_eq!(added.message, "Child added successfully");

    let deleted = children::delete_child(&client, Role::Teacher, &added.child_id)
        .await
        .unwrap();
    assert_eq!(deleted.message, "Deleted c-new");
}

#[tokio::test]
async fn psychologists_have_no_child_routes() {
    let client = ApiClient::new(&spawn_backend().await, None)
        .unwrap()
        .with_token("tok-1");

    let err = children::add_child(&client, Role::Psychologist, &new_child())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotGuardian(Role::Psychologist)));
    let err = children::list_children(&client, Role::Psychologist, "9990001111")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotGuardian(Role::Psychologist)));
}

#[tokio::test]
async fn children_by_school_lists_or_reports_none() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();

    let listed = children::children_by_school(&client, Role::Psychologist, "Hillview")
        .await
        .unwrap();
    let ids: Vec<&str> = listed.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);

    let err = children::children_by_school(&client, Role::Psychologist, "Nowhere")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
    assert_eq!(err.user_message(), "No children found for this school");
}

#[tokio::test]
async fn end_returns_server_acknowledgement() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();

    let reply = session::end(&client, "s-1", "Very helpful").await.unwrap();
    assert_eq!(reply.message, "Feedback saved for s-1");

    let err = session::end(&client, "s-1", "").await.unwrap_err();
    assert_eq!(err.user_message(), "Feedback is required");
}

#[tokio::test]
async fn review_listing_decodes_envelopes() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();

    assert_eq!(
        review::unique_schools(&client).await.unwrap(),
        vec!["Hillview", "Lakeside"]
    );

    let rows = review::chat_responses(&client).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].guardian_name.as_deref(), Some("Meera"));
    assert_eq!(rows[0].guardian_role.as_deref(), Some("Parent"));
    assert!(rows[0].is_diagnosed());
    assert!(!rows[1].is_diagnosed());
}

#[tokio::test]
async fn chat_record_is_fetched_by_encoded_id() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();

    let record = review::chat_record(&client, "session Asha/1").await.unwrap();
    assert_eq!(record.session_id, "session Asha/1");
    assert_eq!(
        record.questionnaire_name.as_deref(),
        Some("/api/psychologist/chat/session%20Asha%2F1")
    );
    assert_eq!(record.conversation.len(), 3);
    assert_eq!(record.conversation[2].question_index, Some(-1));
    assert_eq!(record.feedback.as_deref(), Some("Helpful"));
}

#[tokio::test]
async fn questionnaire_type_uses_camel_case_body() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();

    let reply = catalog::set_questionnaire_type(&client, "SDQ", Audience::Teacher)
        .await
        .unwrap();
    assert_eq!(reply.message, "Questionnaire type updated");
}

#[tokio::test]
async fn refresh_token_issues_new_credentials() {
    let base = spawn_backend().await;

    let anonymous = ApiClient::new(&base, None).unwrap();
    assert!(matches!(
        auth::refresh_token(&anonymous).await.unwrap_err(),
        ApiError::Unauthenticated
    ));

    let stale = ApiClient::new(&base, None).unwrap().with_token("tok-0");
    let err = auth::refresh_token(&stale).await.unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));

    let client = ApiClient::new(&base, None).unwrap().with_token("tok-1");
    let refreshed = auth::refresh_token(&client).await.unwrap();
    let user = serde_json::from_value(json!({
        "mobile": "9990001111", "role": "Parent", "name": "Meera"
    }))
    .unwrap();
    let now = jiff::Timestamp::now();
    let creds = refreshed.into_credentials(user, now);

    assert_eq!(creds.token, "tok-2");
    assert_eq!(creds.user.name, "Meera");
    assert!(!creds.is_expired(now));
    assert!(creds.is_expired(now + jiff::SignedDuration::from_secs(3600)));
}

#[tokio::test]
async fn ping_reports_backend_status() {
    let client = ApiClient::new(&spawn_backend().await, None).unwrap();

    let pong = catalog::ping(&client).await.unwrap();
    assert_eq!(pong.status, "ok");
    assert_eq!(pong.message, "pong");
}
