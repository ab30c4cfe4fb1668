// Stand-in booking service served over real HTTP
#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
pub struct FakeBookingService {
    catalog_down: Mutex<bool>,
    catalog_malformed: Mutex<bool>,
    unavailable: Mutex<Vec<String>>,
    availability_delays: Mutex<HashMap<String, Duration>>,
    create_reply: Mutex<Option<(StatusCode, Value)>>,
    availability_queries: Mutex<Vec<HashMap<String, String>>>,
    booking_posts: Mutex<Vec<Value>>,
}

impl FakeBookingService {
    pub fn fail_catalog(&self) {
        *self.catalog_down.lock() = true;
    }

    // 200 with a body that is not a list of apartments
    pub fn garble_catalog(&self) {
        *self.catalog_malformed.lock() = true;
    }

    pub fn mark_unavailable(&self, apartment_id: &str) {
        self.unavailable.lock().push(apartment_id.to_string());
    }

    pub fn delay_availability(&self, apartment_id: &str, delay: Duration) {
        self.availability_delays
            .lock()
            .insert(apartment_id.to_string(), delay);
    }

    pub fn reply_to_bookings(&self, status: StatusCode, body: Value) {
        *self.create_reply.lock() = Some((status, body));
    }

    pub fn availability_queries(&self) -> Vec<HashMap<String, String>> {
        self.availability_queries.lock().clone()
    }

    pub fn booking_posts(&self) -> Vec<Value> {
        self.booking_posts.lock().clone()
    }
}

fn apartments() -> Value {
    json!([
        {
            "id": 1,
            "name": "2 Bedroom Luxury Apartment",
            "price_per_night": "150000.00",
            "image": "/media/apartments/luxury.jpg",
            "max_occupancy": 4
        },
        {
            "id": 2,
            "name": "Deluxe Studio Apartment",
            "price_per_night": "100000.00",
            "image": null
        }
    ])
}

async fn list_apartments(State(service): State<Arc<FakeBookingService>>) -> (StatusCode, Json<Value>) {
    if *service.catalog_down.lock() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "database unavailable"})),
        );
    }
    if *service.catalog_malformed.lock() {
        return (StatusCode::OK, Json(json!({"oops": 1})));
    }
    (StatusCode::OK, Json(apartments()))
}

async fn apartment_details(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    let found = apartments()
        .as_array()
        .and_then(|list| list.iter().find(|a| a["id"].to_string() == id).cloned());
    match found {
        Some(apartment) => (StatusCode::OK, Json(apartment)),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))),
    }
}

async fn check_availability(
    State(service): State<Arc<FakeBookingService>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    service.availability_queries.lock().push(params.clone());
    let apartment_id = params.get("apartment_id").cloned().unwrap_or_default();

    let delay = service.availability_delays.lock().get(&apartment_id).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let available = !service.unavailable.lock().contains(&apartment_id);
    Json(json!({ "available": available }))
}

async fn create_booking(
    State(service): State<Arc<FakeBookingService>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    service.booking_posts.lock().push(body);
    let reply = service.create_reply.lock().clone();
    let (status, body) = reply.unwrap_or((
        StatusCode::CREATED,
        json!({"success": true, "booking_id": 1}),
    ));
    (status, Json(body))
}

// Binds an ephemeral port and returns the base URL to point the client at
pub async fn spawn(service: Arc<FakeBookingService>) -> anyhow::Result<String> {
    let app = Router::new()
        .route("/api/apartments/", get(list_apartments))
        .route("/api/apartments/{id}/", get(apartment_details))
        .route("/api/check-availability/", get(check_availability))
        .route("/api/create-booking/", post(create_booking))
        .with_state(service);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}
