// Integration tests for the HTTP surface

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::Engine;
use interpreter_relay::{
    create_router, AppState, Collaborators, Config, ConnectionId, Coordinator, EventRouter, Role,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, Arc<EventRouter>) {
    let collaborators = Collaborators::from_config(&Config::default().collaborators).unwrap();
    let router = Arc::new(EventRouter::new(Arc::new(Coordinator::new(16)), collaborators));
    (create_router(AppState::new(Arc::clone(&router))), router)
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app();
    let (status, body) = call(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_list_sessions() {
    let (app, router) = app();
    let (status, body) = call(app.clone(), get("/sessions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([]));

    router
        .coordinator()
        .sessions
        .join("S1", "p1", Role::Signer, ConnectionId::from("c1"));

    let (_, body) = call(app, get("/sessions")).await;
    let sessions: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(sessions[0]["sessionId"], "S1");
    assert_eq!(sessions[0]["participants"][0]["participantId"], "p1");
    assert_eq!(sessions[0]["participants"][0]["role"], "signer");
}

#[tokio::test]
async fn test_get_session() {
    let (app, router) = app();

    let (status, body) = call(app.clone(), get("/sessions/S1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "Session S1 not found");

    router
        .coordinator()
        .sessions
        .join("S1", "p1", Role::Listener, ConnectionId::from("c1"));

    let (status, body) = call(app, get("/sessions/S1")).await;
    assert_eq!(status, StatusCode::OK);
    let session: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(session["sessionId"], "S1");
    assert!(session["lastActivity"].is_string());
}

#[tokio::test]
async fn test_translate_text() {
    let (app, _) = app();

    let (status, body) = call(
        app.clone(),
        post_json("/translate/text-to-sign", json!({ "text": "hola" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let segments: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(segments[0]["word"], "hola");
    assert_eq!(segments[0]["type"], "exact");

    let (status, body) = call(
        app,
        post_json(
            "/translate/text-to-sign",
            json!({ "text": "hola gracias", "format": "text" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_slice::<Value>(&body).unwrap(),
        json!("hola gracias")
    );
}

#[tokio::test]
async fn test_translate_rejects_bad_input() {
    let (app, _) = app();

    let (status, _) = call(
        app.clone(),
        post_json("/translate/text-to-sign", json!({ "text": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        app,
        post_json(
            "/translate/text-to-sign",
            json!({ "text": "hola", "format": "hologram" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_synthesize_speech() {
    let (app, _) = app();

    let (status, body) = call(
        app.clone(),
        post_json("/speech/synthesize", json!({ "text": "hola", "voiceType": "slow" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(response["format"], "wav");
    let audio = base64::engine::general_purpose::STANDARD
        .decode(response["audio"].as_str().unwrap())
        .unwrap();
    assert_eq!(&audio[..4], b"RIFF");

    let (status, _) = call(app, post_json("/speech/synthesize", json!({ "text": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_synthesize_rejects_oversized_text() {
    let (app, _) = app();
    let text = "a".repeat(Config::default().collaborators.max_synthesis_chars + 1);

    let (status, body) = call(
        app,
        post_json("/speech/synthesize", json!({ "text": text, "voiceType": "slow" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "text exceeds 1000 characters");
}

#[tokio::test]
async fn test_text_to_speech_returns_wav_attachment() {
    let (app, _) = app();

    let response = app
        .oneshot(post_json("/speech/text-to-speech", json!({ "text": "hola" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "audio/wav");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..4], b"RIFF");
}

#[tokio::test]
async fn test_text_to_signs_alias() {
    let (app, _) = app();

    let (status, body) = call(
        app,
        post_json(
            "/translation/text-to-signs",
            json!({ "text": "si no", "format": "video" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let video: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(video["format"], "mp4");
    assert_eq!(video["gestures"], json!(["si", "no"]));
}

#[tokio::test]
async fn test_signs_to_text() {
    let (app, _) = app();

    let (status, body) = call(
        app.clone(),
        post_json(
            "/translation/signs-to-text",
            json!({ "signData": ["HOLA", "P", "E", "P", "E"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(result["text"], "hola pepe");
    assert_eq!(result["confidence"], 1.0);

    let (status, _) = call(
        app,
        post_json("/translation/signs-to-text", json!({ "signData": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gesture_catalogue() {
    let (app, _) = app();
    let (status, body) = call(app, get("/sign-language/gestures")).await;

    assert_eq!(status, StatusCode::OK);
    let gestures: Value = serde_json::from_slice(&body).unwrap();
    let names: Vec<&str> = gestures
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|g| g["name"].as_str())
        .collect();
    assert!(names.contains(&"gracias"));
    assert!(names.contains(&"por favor"));
}

#[tokio::test]
async fn test_sign_recognition_needs_a_live_session() {
    let (app, router) = app();
    let frame = json!({ "sessionId": "S1", "frameData": { "gesture": "SI", "endOfUtterance": true } });

    let (status, _) = call(app.clone(), post_json("/sign-language/recognize-stream", frame.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    router
        .coordinator()
        .sessions
        .join("S1", "p1", Role::Signer, ConnectionId::from("c1"));

    let (status, body) = call(app, post_json("/sign-language/recognize-stream", frame)).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(result["gestures"], json!(["SI"]));
    assert_eq!(result["isCompleteUtterance"], true);
    assert_eq!(result["accumulatedText"], "si");
}

#[tokio::test]
async fn test_speech_recognition() {
    let (app, _) = app();
    let audio = base64::engine::general_purpose::STANDARD.encode("buenos dias");

    let (status, body) = call(
        app.clone(),
        post_json("/speech/recognize-stream", json!({ "audioData": audio })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(result["text"], "buenos dias");
    assert_eq!(result["isFinal"], true);

    let (status, _) = call(
        app,
        post_json("/speech/recognize-stream", json!({ "audioData": "%%%" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
