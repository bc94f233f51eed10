use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use seat_selection::{app, config::Config, AppState};

fn router(backend_url: &str) -> Router {
    let backend_url = backend_url.to_string();
    let config = Config::from_lookup(|key| match key {
        "BACKEND_BASE_URL" => Some(backend_url.clone()),
        "CIRCUIT_BREAKER_FAILURE_THRESHOLD" => Some("50".to_string()),
        _ => None,
    })
    .unwrap();
    app(AppState::new(config).unwrap())
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn mount_seats(server: &MockServer, bus_id: i64, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/seats/bus/{bus_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn eight_seats() -> Value {
    let seats: Vec<Value> = (1..=8)
        .map(|n| json!({ "id": n, "seatNumber": format!("A{n}"), "price": 500 + n * 10 }))
        .collect();
    json!({ "seats": seats })
}

#[tokio::test]
async fn seat_map_normalizes_and_lays_out_rows() {
    let server = MockServer::start().await;
    mount_seats(
        &server,
        5,
        json!([
            { "id": 2, "seatNumber": "A2" },
            { "id": 1, "seatNumber": "A1", "booked": true },
            { "seatId": 3, "seatNumber": "A3", "status": "reserved" },
            { "_id": "x5", "label": "A5", "fare": 700 },
            { "id": 4, "seatNumber": "A4", "status": "unknown-value" },
            42
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/bus/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "source": "Pune", "destination": "Nagpur", "baseFare": 600,
            "totalSeats": 40, "seatsLeft": 10
        })))
        .mount(&server)
        .await;

    let app = router(&server.uri());
    let (status, body) = call(&app, Method::GET, "/api/buses/5/seats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bus"]["destination"], "Nagpur");

    let numbers: Vec<&str> = body["seats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["seatNumber"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["A1", "A2", "A3", "A4", "A5"]);

    assert_eq!(body["seats"][0]["available"], false);
    assert_eq!(body["seats"][0]["type"], "Window");
    assert_eq!(body["seats"][1]["type"], "Aisle");
    assert_eq!(body["seats"][2]["available"], false);
    assert_eq!(body["seats"][3]["available"], true);
    assert_eq!(body["seats"][4]["price"], 700.0);

    assert_eq!(body["rows"].as_array().unwrap().len(), 2);
    assert_eq!(body["summary"]["available"], 3);
    assert_eq!(body["bus_summary"]["seatsAvailable"], 10);
    assert_eq!(body["bus_summary"]["percentAvailable"], 25);
}

#[tokio::test]
async fn seat_map_survives_missing_bus_details_but_not_missing_seats() {
    let server = MockServer::start().await;
    mount_seats(&server, 6, json!([{ "id": 1 }])).await;
    Mock::given(method("GET"))
        .and(path("/bus/6"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = router(&server.uri());
    let (status, body) = call(&app, Method::GET, "/api/buses/6/seats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["bus"].is_null());
    assert!(body["bus_summary"].is_null());

    let (status, body) = call(&app, Method::GET, "/api/buses/7/seats", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "LOAD_FAILURE");
}

#[tokio::test]
async fn selection_flow_through_checkout() {
    let server = MockServer::start().await;
    mount_seats(&server, 9, eight_seats()).await;
    let app = router(&server.uri());

    let (status, session) = call(&app, Method::POST, "/api/selections", Some(json!({ "bus_id": 9 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["count"], 0);
    assert_eq!(session["max"], 6);
    let id = session["id"].as_str().unwrap().to_string();
    let toggle = format!("/api/selections/{id}/toggle");

    let (status, _) = call(&app, Method::POST, &format!("/api/selections/{id}/checkout"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = call(&app, Method::PATCH, &toggle, Some(json!({ "seat_id": 3 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "selected");

    let (_, body) = call(&app, Method::PATCH, &toggle, Some(json!({ "seat_id": "1" }))).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["total"], 1040.0);

    let (status, handoff) = call(&app, Method::POST, &format!("/api/selections/{id}/checkout"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(handoff["busId"], 9);
    assert_eq!(handoff["seatIds"], json!([1, 3]));
    assert_eq!(handoff["seatNumbers"], json!(["A1", "A3"]));
    assert_eq!(handoff["totalAmount"], 1040.0);

    let (status, _) = call(&app, Method::DELETE, &format!("/api/selections/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::GET, &format!("/api/selections/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn capacity_and_booked_seats_are_advisory() {
    let server = MockServer::start().await;
    let mut seats = eight_seats();
    seats["seats"][7]["status"] = json!("sold");
    mount_seats(&server, 2, seats).await;
    let app = router(&server.uri());

    let (_, session) = call(&app, Method::POST, "/api/selections", Some(json!({ "bus_id": 2 }))).await;
    let id = session["id"].as_str().unwrap().to_string();
    let toggle = format!("/api/selections/{id}/toggle");

    let (status, body) = call(&app, Method::PATCH, &toggle, Some(json!({ "seat_id": 8 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "SEAT_UNAVAILABLE");
    assert_eq!(body["message"], "This seat is already booked and cannot be selected.");

    for n in 1..=6 {
        let (status, _) = call(&app, Method::PATCH, &toggle, Some(json!({ "seat_id": n }))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(&app, Method::PATCH, &toggle, Some(json!({ "seat_id": 7 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CAPACITY_EXCEEDED");
    assert_eq!(body["message"], "You can select up to 6 seats only.");

    let (_, body) = call(&app, Method::GET, &format!("/api/selections/{id}"), None).await;
    assert_eq!(body["count"], 6);

    let (status, body) = call(&app, Method::PATCH, &toggle, Some(json!({ "seat_id": 99 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "SEAT_NOT_FOUND");
}

#[tokio::test]
async fn reload_reconciles_against_fresh_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/seats/bus/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "seatNumber": "A1" },
            { "id": 2, "seatNumber": "A2" }
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_seats(
        &server,
        3,
        json!([
            { "id": 1, "seatNumber": "A1" },
            { "id": 2, "seatNumber": "A2", "booked": true }
        ]),
    )
    .await;
    let app = router(&server.uri());

    let (_, session) = call(&app, Method::POST, "/api/selections", Some(json!({ "bus_id": 3 }))).await;
    let id = session["id"].as_str().unwrap().to_string();
    let (_, body) = call(
        &app,
        Method::PATCH,
        &format!("/api/selections/{id}/toggle"),
        Some(json!({ "seat_id": 2 })),
    )
    .await;
    assert_eq!(body["count"], 1);

    let (status, body) = call(&app, Method::POST, &format!("/api/selections/{id}/reload"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stale"], false);
    assert_eq!(body["count"], 0);
    assert_eq!(body["selected_ids"], json!([]));
}

#[tokio::test]
async fn failed_reload_keeps_last_good_seat_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/seats/bus/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "seatNumber": "A1" },
            { "id": 2, "seatNumber": "A2" }
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/seats/bus/4"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_seats(
        &server,
        4,
        json!([
            { "id": 1, "seatNumber": "A1", "booked": true },
            { "id": 2, "seatNumber": "A2" }
        ]),
    )
    .await;
    let app = router(&server.uri());

    let (_, session) = call(&app, Method::POST, "/api/selections", Some(json!({ "bus_id": 4 }))).await;
    let id = session["id"].as_str().unwrap().to_string();
    call(
        &app,
        Method::PATCH,
        &format!("/api/selections/{id}/toggle"),
        Some(json!({ "seat_id": 1 })),
    )
    .await;

    let (status, body) = call(&app, Method::POST, &format!("/api/selections/{id}/reload"), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "LOAD_FAILURE");

    let (_, body) = call(&app, Method::GET, &format!("/api/selections/{id}"), None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["selected_ids"], json!([1]));
    assert_eq!(body["seats"][0]["available"], true);

    // Следующая загрузка новее упавшей и применяется
    let (status, body) = call(&app, Method::POST, &format!("/api/selections/{id}/reload"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stale"], false);
    assert_eq!(body["count"], 0);
    assert_eq!(body["seats"][0]["available"], false);
}

#[tokio::test]
async fn duplicate_seat_ids_are_charged_once() {
    let server = MockServer::start().await;
    mount_seats(
        &server,
        8,
        json!([
            { "id": 1, "seatNumber": "A1", "price": 500 },
            { "id": "1", "seatNumber": "A2", "price": 700 }
        ]),
    )
    .await;
    let app = router(&server.uri());

    let (_, session) = call(&app, Method::POST, "/api/selections", Some(json!({ "bus_id": 8 }))).await;
    assert_eq!(session["seats"].as_array().unwrap().len(), 1);
    let id = session["id"].as_str().unwrap().to_string();

    let (_, body) = call(
        &app,
        Method::PATCH,
        &format!("/api/selections/{id}/toggle"),
        Some(json!({ "seat_id": "1" })),
    )
    .await;
    assert_eq!(body["total"], 500.0);

    let (_, handoff) = call(&app, Method::POST, &format!("/api/selections/{id}/checkout"), None).await;
    assert_eq!(handoff["seatIds"], json!([1]));
    assert_eq!(handoff["totalAmount"], 500.0);
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let server = MockServer::start().await;
    let app = router(&server.uri());

    let (status, body) = call(&app, Method::POST, "/api/selections", Some(json!({ "bus_id": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let request = Request::builder()
        .uri("/api/buses/1/seats")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
