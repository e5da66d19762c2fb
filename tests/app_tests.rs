use axum::{body::Body, http::{header, Method, Request, StatusCode}, response::Response, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use uniconnect::{app, config::Config, AppState};

fn test_app() -> Router {
    app(AppState::default(), &Config::default()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn with_json(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_file(uri: &str, name: &str, content_type: &str, data: &str) -> Request<Body> {
    let body = format!(
        "--XBOUNDARYX\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
         Content-Type: {content_type}\r\n\r\n\
         {data}\r\n\
         --XBOUNDARYX--\r\n"
    );

    Request::post(uri)
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARYX")
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn test_root_redirects_home_and_home_renders() {
    let app = test_app();

    let response = send(&app, get("/")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/home");

    let response = send(&app, get("/home")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("<h1>Welcome to UniConnect</h1>"));
}

#[tokio::test]
async fn test_view_paths_are_normalized() {
    let app = test_app();

    let response = send(&app, get("/Msg?q=bo")).await;
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(location(&response), "/msg?q=bo");

    let response = send(&app, get("/SESSION")).await;
    assert_eq!(location(&response), "/session");

    assert_eq!(send(&app, get("/sessions")).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_lifecycle() {
    let app = test_app();

    let response = send(&app, with_json(Method::POST, "/post", json!({ "content": "   " }))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, with_json(Method::POST, "/post", json!({ "content": "hello @bob check #exam" }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let post = body_json(response).await;
    let id = post["id"].as_i64().unwrap();
    assert_eq!(post["author"], "Me");
    assert_eq!(
        post["segments"],
        json!([
            { "kind": "text", "text": "hello " },
            { "kind": "mention", "text": "@bob" },
            { "kind": "text", "text": " check " },
            { "kind": "hashtag", "text": "#exam" },
        ])
    );

    let liked = body_json(send(&app, with_json(Method::POST, &format!("/post/{id}/like"), json!({}))).await).await;
    assert_eq!((liked["likes"].as_u64(), liked["liked"].as_bool()), (Some(1), Some(true)));

    let response = send(&app, with_json(Method::PUT, &format!("/post/{id}/comment"), json!({ "text": "see you there" }))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let commented = body_json(send(&app, with_json(Method::POST, &format!("/post/{id}/comments"), json!({}))).await).await;
    assert_eq!(commented["comments"], json!(["see you there"]));

    let response = send(&app, Request::delete(format!("/post/{id}")).body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::PRECONDITION_REQUIRED);

    let response = send(&app, Request::delete(format!("/post/{id}?confirm=true")).body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(body_json(send(&app, get("/post")).await).await, json!([]));
    assert_eq!(send(&app, with_json(Method::POST, &format!("/post/{id}/like"), json!({}))).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_image_upload_is_served_back() {
    let app = test_app();

    let response = send(&app, with_file("/post/image", "diagram.png", "image/png", "not really a png")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let object = body_json(response).await;
    let url = object["url"].as_str().unwrap().to_string();
    assert_eq!(object["size"], 16);

    let response = send(&app, get(&url)).await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
    assert_eq!(body_text(response).await, "not really a png");

    let response = send(&app, with_json(Method::POST, "/post", json!({ "content": "look", "image": url }))).await;
    let post = body_json(response).await;
    assert_eq!(post["image"], json!(url));

    let id = post["id"].as_i64().unwrap();
    let response = send(&app, Request::delete(format!("/post/{id}?confirm=true")).body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(send(&app, get(&url)).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_uploaded_html_is_never_rendered_inline() {
    let app = test_app();

    let response = send(&app, with_file("/msg/files", "page.html", "text/html", "<script>alert(1)</script>")).await;
    let url = body_json(response).await["file"].as_str().unwrap().to_string();

    let response = send(&app, get(&url)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "attachment");
}

#[tokio::test]
async fn test_session_scenario() {
    let app = test_app();

    let before = body_json(send(&app, get("/session")).await).await.as_array().unwrap().len();

    let response = send(&app, with_json(Method::POST, "/session", json!({
        "title": "Algorithms Workshop",
        "speaker": "Dr. Lee",
        "date": "2025-08-01",
        "time": "14:00",
        "description": "Intro to graph theory",
    }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let session = body_json(response).await;
    let id = session["id"].as_u64().unwrap();
    assert_eq!(id as usize, before + 1);
    assert_eq!(session["image"], "https://via.placeholder.com/150");

    let first = body_json(send(&app, with_json(Method::POST, &format!("/session/{id}/join"), json!({}))).await).await;
    assert_eq!(first["newly_joined"], true);
    let second = body_json(send(&app, with_json(Method::POST, &format!("/session/{id}/join"), json!({}))).await).await;
    assert_eq!(second["newly_joined"], false);

    let sessions = body_json(send(&app, get("/session")).await).await;
    assert_eq!(sessions.as_array().unwrap().len(), before + 1);
    assert_eq!(sessions[0]["id"].as_u64(), Some(id));
    assert_eq!(sessions[0]["joined"], true);
    assert_eq!(sessions[1]["joined"], false);

    let found = body_json(send(&app, get("/session?q=dr.%20lee")).await).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let response = send(&app, with_json(Method::POST, "/session", json!({ "title": "No speaker" }))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(send(&app, with_json(Method::POST, "/session/99/join", json!({}))).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_save_is_an_upsert() {
    let app = test_app();

    for (field, value) in [("name", "Mahima"), ("branch", "CSE"), ("skills", "Rust")] {
        let response = send(&app, with_json(Method::PATCH, "/profile/draft", json!({ "field": field, "value": value }))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(send(&app, with_json(Method::POST, "/profile", json!({}))).await.status(), StatusCode::CREATED);

    send(&app, with_json(Method::PATCH, "/profile/draft", json!({ "field": "skills", "value": "Rust, Axum" }))).await;
    send(&app, with_json(Method::POST, "/profile", json!({}))).await;

    let everyone = body_json(send(&app, get("/profile")).await).await;
    assert_eq!(everyone.as_array().unwrap().len(), 4);

    let found = body_json(send(&app, get("/profile?q=axum")).await).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["id"], 1);
    assert_eq!(found[0]["skills"], "Rust, Axum");

    let response = send(&app, with_json(Method::PATCH, "/profile/draft", json!({ "field": "age", "value": "20" }))).await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_messages_per_peer() {
    let app = test_app();

    let response = send(&app, with_json(Method::POST, "/msg/Bob", json!({ "text": "hi Bob" }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let message = body_json(response).await;
    assert_eq!(message["from"], "Me");
    assert_eq!(message["read"], false);

    let response = send(&app, with_json(Method::POST, "/msg/Bob", json!({ "text": "  " }))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, with_file("/msg/files", "notes.pdf", "application/pdf", "%PDF")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let attachment = body_json(response).await;
    assert_eq!(attachment["text"], "notes.pdf");
    assert!(attachment["file"].as_str().unwrap().starts_with("/files/"));

    let sonia = body_json(send(&app, get("/msg/Sonia")).await).await;
    assert_eq!(sonia["active"], "Sonia");
    assert_eq!(sonia["messages"], json!([]));

    let bob = body_json(send(&app, get("/msg/Bob")).await).await;
    let messages = bob["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m["read"] == true));

    assert_eq!(send(&app, get("/msg/Mallory")).await.status(), StatusCode::NOT_FOUND);

    let peers = body_json(send(&app, get("/msg?q=AL")).await).await;
    assert_eq!(peers["peers"], json!(["Alice"]));
}

#[tokio::test]
async fn test_appended_messages_are_pushed_live() {
    let state = AppState::default();
    let mut events = state.tx.subscribe();
    let app = app(state, &Config::default()).unwrap();

    let response = send(&app, with_json(Method::POST, "/msg/Bob", json!({ "text": "are you coming?" }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = send(&app, with_file("/msg/files", "slides.pdf", "application/pdf", "%PDF")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    send(&app, with_json(Method::POST, "/msg/Bob", json!({ "text": "   " }))).await;

    let text: Value = serde_json::from_str(&events.try_recv().unwrap()).unwrap();
    assert_eq!(text["peer"], "Bob");
    assert_eq!(text["message"]["text"], "are you coming?");
    assert_eq!(text["message"]["from"], "Me");

    let file: Value = serde_json::from_str(&events.try_recv().unwrap()).unwrap();
    assert_eq!(file["peer"], "Bob");
    assert_eq!(file["message"]["text"], "slides.pdf");
    assert!(file["message"]["file"].as_str().unwrap().starts_with("/files/"));

    // blank sends append nothing and push nothing
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_login_changes_nav_and_authorship() {
    let app = test_app();

    let signed_out = body_json(send(&app, get("/nav?path=/Post")).await).await;
    assert_eq!(signed_out["authenticated"], false);
    assert_eq!(signed_out["current"], "post");
    assert_eq!(signed_out["items"].as_array().unwrap().last().unwrap()["label"], "Login");

    let response = send(
        &app,
        Request::post("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=Mahima"))
            .unwrap(),
    ).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/home");
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let signed_in = body_json(send(&app, Request::get("/nav").header(header::COOKIE, &cookie).body(Body::empty()).unwrap()).await).await;
    assert_eq!(signed_in["authenticated"], true);
    assert_eq!(signed_in["display_name"], "Mahima");
    let labels: Vec<_> = signed_in["items"].as_array().unwrap().iter().map(|item| item["label"].clone()).collect();
    assert!(labels.contains(&json!("Profile")));
    assert!(labels.contains(&json!("Logout")));

    let mut request = with_json(Method::POST, "/post", json!({ "content": "first post" }));
    request.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());
    assert_eq!(body_json(send(&app, request).await).await["author"], "Mahima");

    let response = send(&app, Request::get("/logout?return_url=/post").header(header::COOKIE, &cookie).body(Body::empty()).unwrap()).await;
    assert_eq!(location(&response), "/post");

    let signed_out = body_json(send(&app, Request::get("/nav").header(header::COOKIE, &cookie).body(Body::empty()).unwrap()).await).await;
    assert_eq!(signed_out["authenticated"], false);
}

#[tokio::test]
async fn test_return_url_must_stay_on_site() {
    let app = test_app();

    let response = send(&app, get("/logout?return_url=/%5Cevil.example")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/home");

    let response = send(
        &app,
        Request::post("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=Mahima&return_url=%2F%0Aevil"))
            .unwrap(),
    ).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/home");

    let response = send(&app, get("/logout?return_url=/session")).await;
    assert_eq!(location(&response), "/session");
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let config = Config { max_upload_bytes: 64, ..Config::default() };
    let app = app(AppState::default(), &config).unwrap();

    let response = send(&app, with_file("/msg/files", "big.bin", "application/octet-stream", &"x".repeat(512))).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
