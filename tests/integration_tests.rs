use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use reqwest::Method;
use serde_json::{json, Value};
use tower::ServiceExt;

use hospital_assistant::config::AppConfig;
use hospital_assistant::errors::ApiError;
use hospital_assistant::handlers;
use hospital_assistant::models::{ActionId, FlowStep, User};
use hospital_assistant::services::api::ApiClient;
use hospital_assistant::services::conversation::ChatEngine;
use hospital_assistant::state::AppState;

// ── Mock Backend ──

enum Scripted {
    Ok(Value),
    Fail(u16, Value),
}

type Call = (Method, String, Option<Value>);

/// Scripted hospital API. Unscripted routes fail like an unreachable host.
struct MockApi {
    routes: Mutex<HashMap<(Method, String), Scripted>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockApi {
    fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            calls: Arc::new(Mutex::new(vec![])),
        }
    }

    fn on(self, method: Method, path: &str, body: Value) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Scripted::Ok(body));
        self
    }

    fn fail(self, method: Method, path: &str, status: u16, body: Value) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Scripted::Fail(status, body));
        self
    }
}

#[async_trait]
impl ApiClient for MockApi {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.clone(), path.to_string(), body.cloned()));

        match self.routes.lock().unwrap().get(&(method, path.to_string())) {
            Some(Scripted::Ok(v)) => Ok(v.clone()),
            Some(Scripted::Fail(status, body)) => Err(ApiError::Http {
                status: *status,
                body: body.clone(),
            }),
            None => Err(ApiError::Transport(format!("no route for {path}"))),
        }
    }
}

// ── Helpers ──

fn doctors() -> Value {
    json!([
        { "id": 1, "name": "Arjun", "specialization": "Cardiologist", "shiftStartTime": "09:00", "shiftEndTime": "17:00" },
        { "id": 2, "name": "Meena", "specialization": "Neurology" },
        { "id": 3, "name": "Kumar", "specialization": "Orthopedics" }
    ])
}

fn patient() -> User {
    User {
        id: "u-1".to_string(),
        name: Some("Asha".to_string()),
        role: Some("PATIENT".to_string()),
    }
}

fn engine_with(api: MockApi) -> (ChatEngine, Arc<Mutex<Vec<Call>>>) {
    let calls = Arc::clone(&api.calls);
    (ChatEngine::new(Arc::new(api)), calls)
}

fn call_paths(calls: &Arc<Mutex<Vec<Call>>>) -> Vec<(Method, String)> {
    calls
        .lock()
        .unwrap()
        .iter()
        .map(|(m, p, _)| (m.clone(), p.clone()))
        .collect()
}

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        api_base_url: "http://localhost:8080".to_string(),
        api_token: "".to_string(),
        request_timeout_secs: 1,
        reply_delay_ms: 0,
        session_ttl_minutes: 30,
        assistant_name: "Kiwi".to_string(),
    }
}

fn test_state(api: MockApi) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(), Arc::new(api)))
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/chat/message", post(handlers::chat::send_message))
        .route("/api/chat/reset", post(handlers::chat::reset_session))
        .with_state(state)
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(res: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// ── Booking Flow ──

#[tokio::test]
async fn test_full_booking_flow() {
    let api = MockApi::new()
        .on(Method::GET, "/api/doctors", doctors())
        .on(Method::POST, "/api/appointments/book", json!({ "id": 99 }));
    let (mut engine, calls) = engine_with(api);
    let user = patient();

    let res = engine.process("Book Appointment", &user).await;
    assert_eq!(engine.step(), FlowStep::AwaitingDoctor);
    assert_eq!(res.options, vec!["Arjun", "Meena", "Kumar"]);

    let res = engine.process("Arjun", &user).await;
    assert_eq!(engine.step(), FlowStep::AwaitingDate);
    assert!(res.text.contains("Dr. Arjun"));
    assert_eq!(res.options.len(), 1);

    let res = engine.process("2026-05-20", &user).await;
    assert_eq!(engine.step(), FlowStep::AwaitingTime);
    assert_eq!(res.options, vec!["09:00", "10:00", "11:00", "14:00", "16:00"]);

    let res = engine.process("10:00", &user).await;
    assert_eq!(engine.step(), FlowStep::AwaitingConfirmation);
    assert_eq!(
        res.text,
        "Please confirm: Appointment with Dr. Arjun on 2026-05-20 at 10:00:00?"
    );
    assert_eq!(res.options, vec!["Yes, confirm", "Cancel"]);

    let res = engine.process("Yes, confirm", &user).await;
    assert!(res.text.starts_with("Appointment booked successfully!"));
    assert_eq!(res.options, vec!["View Appointments"]);
    assert!(engine.context().is_pristine());

    let calls = calls.lock().unwrap();
    let (method, path, body) = calls.last().unwrap();
    assert_eq!(*method, Method::POST);
    assert_eq!(path, "/api/appointments/book");
    assert_eq!(
        body.as_ref().unwrap(),
        &json!({
            "doctorId": 1,
            "appointmentDate": "2026-05-20",
            "appointmentTime": "10:00:00",
            "status": "SCHEDULED"
        })
    );
}

#[tokio::test]
async fn test_book_named_doctor_offers_today() {
    let api = MockApi::new().on(
        Method::GET,
        "/api/doctors",
        json!([{ "id": 4, "name": "Arjun", "specialization": "General Medicine" }]),
    );
    let (mut engine, _) = engine_with(api);

    let res = engine.process("Book Dr. Arjun", &patient()).await;
    assert_eq!(engine.step(), FlowStep::AwaitingDate);
    assert_eq!(engine.context().slots.doctor.as_ref().unwrap().id, 4);

    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    assert_eq!(res.options, vec![today]);
}

#[tokio::test]
async fn test_booking_with_named_doctor_skips_selection() {
    let api = MockApi::new().on(Method::GET, "/api/doctors", doctors());
    let (mut engine, _) = engine_with(api);

    let res = engine.process("book dr. meena", &patient()).await;
    assert_eq!(engine.step(), FlowStep::AwaitingDate);
    assert!(res.text.starts_with("Starting booking for Dr. Meena."));
    assert_eq!(engine.context().slots.doctor.as_ref().unwrap().id, 2);
}

#[tokio::test]
async fn test_time_shorthand_normalized_in_confirmation() {
    let api = MockApi::new().on(Method::GET, "/api/doctors", doctors());
    let (mut engine, _) = engine_with(api);
    let user = patient();

    engine.process("Book Appointment", &user).await;
    engine.process("Meena", &user).await;
    engine.process("2026-05-20", &user).await;
    let res = engine.process("930", &user).await;

    assert_eq!(engine.step(), FlowStep::AwaitingConfirmation);
    assert!(res.text.ends_with("at 09:30:00?"));
    assert_eq!(engine.context().slots.time.as_deref(), Some("09:30:00"));
}

#[tokio::test]
async fn test_invalid_date_reprompts_without_advancing() {
    let api = MockApi::new().on(Method::GET, "/api/doctors", doctors());
    let (mut engine, _) = engine_with(api);
    let user = patient();

    engine.process("Book Appointment", &user).await;
    engine.process("Arjun", &user).await;

    let res = engine.process("20-05-2026", &user).await;
    assert_eq!(engine.step(), FlowStep::AwaitingDate);
    assert!(res.text.starts_with("Please use the format YYYY-MM-DD"));

    let res = engine.process("2026-02-30", &user).await;
    assert_eq!(engine.step(), FlowStep::AwaitingDate);
    assert!(res.text.starts_with("Please use the format YYYY-MM-DD"));
}

#[tokio::test]
async fn test_failed_booking_surfaces_backend_message() {
    let api = MockApi::new()
        .on(Method::GET, "/api/doctors", doctors())
        .fail(
            Method::POST,
            "/api/appointments/book",
            409,
            json!({ "message": "Slot already taken" }),
        );
    let (mut engine, _) = engine_with(api);
    let user = patient();

    engine.process("Book Appointment", &user).await;
    engine.process("Arjun", &user).await;
    engine.process("2026-05-20", &user).await;
    engine.process("10:00", &user).await;
    let res = engine.process("yes", &user).await;

    assert_eq!(res.text, "Sorry, unable to book. (Slot already taken)");
    assert_eq!(res.options, vec!["Try Again", "Check Availability"]);
    assert!(engine.context().is_pristine());
}

#[tokio::test]
async fn test_failed_booking_without_message_uses_generic_reason() {
    let api = MockApi::new()
        .on(Method::GET, "/api/doctors", doctors())
        .fail(Method::POST, "/api/appointments/book", 500, json!({}));
    let (mut engine, _) = engine_with(api);
    let user = patient();

    engine.process("Book Appointment", &user).await;
    engine.process("Arjun", &user).await;
    engine.process("2026-05-20", &user).await;
    engine.process("14:00", &user).await;
    let res = engine.process("confirm", &user).await;

    assert!(res.text.contains("The slot might be taken or there was a system error."));
    assert_eq!(engine.step(), FlowStep::Idle);
}

#[tokio::test]
async fn test_doctor_list_failure_resets_to_idle() {
    let api = MockApi::new().fail(Method::GET, "/api/doctors", 503, json!({}));
    let (mut engine, _) = engine_with(api);

    let res = engine.process("Book Appointment", &patient()).await;
    assert_eq!(res.text, "Sorry, I can't fetch the doctor list right now.");
    assert!(engine.context().is_pristine());
}

#[tokio::test]
async fn test_decline_at_confirmation_aborts() {
    let api = MockApi::new().on(Method::GET, "/api/doctors", doctors());
    let (mut engine, calls) = engine_with(api);
    let user = patient();

    engine.process("Book Appointment", &user).await;
    engine.process("Arjun", &user).await;
    engine.process("2026-05-20", &user).await;
    engine.process("10:00", &user).await;
    let res = engine.process("no", &user).await;

    assert_eq!(res.text, "Process cancelled.");
    assert!(engine.context().is_pristine());
    assert!(call_paths(&calls)
        .iter()
        .all(|(m, _)| *m == Method::GET));
}

// ── Cancel and Reset ──

#[tokio::test]
async fn test_cancel_mid_flow_makes_no_backend_call() {
    let api = MockApi::new().on(Method::GET, "/api/doctors", doctors());
    let (mut engine, calls) = engine_with(api);
    let user = patient();

    engine.process("Book Appointment", &user).await;
    engine.process("Arjun", &user).await;
    let before = calls.lock().unwrap().len();

    let res = engine.process("Cancel", &user).await;
    assert_eq!(res.text, "Operation cancelled.");
    assert_eq!(res.options, vec!["Book Appointment", "Hospital Map"]);
    assert!(engine.context().is_pristine());
    assert_eq!(calls.lock().unwrap().len(), before);
}

#[tokio::test]
async fn test_cancel_when_idle() {
    let (mut engine, calls) = engine_with(MockApi::new());

    let res = engine.process("stop", &patient()).await;
    assert_eq!(res.text, "Booking cancelled.");
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reset_is_idempotent() {
    let api = MockApi::new().on(Method::GET, "/api/doctors", doctors());
    let (mut engine, _) = engine_with(api);

    engine.process("Book Appointment", &patient()).await;
    assert!(!engine.context().is_pristine());

    engine.reset();
    assert!(engine.context().is_pristine());
    engine.reset();
    assert!(engine.context().is_pristine());
}

// ── Context Switching ──

#[tokio::test]
async fn test_context_switch_to_billing_mid_flow() {
    let api = MockApi::new()
        .on(Method::GET, "/api/doctors", doctors())
        .on(
            Method::GET,
            "/api/patient/billing",
            json!([
                { "totalAmount": 500.0, "paidAmount": 200.0 },
                { "totalAmount": 100.0, "paidAmount": 100.0 }
            ]),
        );
    let (mut engine, _) = engine_with(api);
    let user = patient();

    engine.process("Book Appointment", &user).await;
    engine.process("Arjun", &user).await;
    assert_eq!(engine.step(), FlowStep::AwaitingDate);

    let res = engine.process("actually check my bills", &user).await;
    assert!(res.text.contains("$300.00"));
    assert_eq!(res.options, vec!["Where is Billing?", "Download Invoice"]);
    assert!(engine.context().is_pristine());
}

#[tokio::test]
async fn test_context_switch_to_location_mid_flow() {
    let api = MockApi::new().on(Method::GET, "/api/doctors", doctors());
    let (mut engine, _) = engine_with(api);
    let user = patient();

    engine.process("Book Appointment", &user).await;
    engine.process("Arjun", &user).await;

    let res = engine.process("where is the pharmacy", &user).await;
    assert_eq!(res.text, "Pharmacy is located on Ground Floor.");
    assert_eq!(engine.step(), FlowStep::Idle);
}

#[tokio::test]
async fn test_greeting_does_not_switch_context() {
    let api = MockApi::new().on(Method::GET, "/api/doctors", doctors());
    let (mut engine, _) = engine_with(api);

    engine.process("Book Appointment", &patient()).await;
    let res = engine.process("hello", &patient()).await;

    assert_eq!(engine.step(), FlowStep::AwaitingDoctor);
    assert!(res.text.starts_with("I couldn't find that doctor."));
}

#[tokio::test]
async fn test_emergency_mid_flow() {
    let api = MockApi::new().on(Method::GET, "/api/doctors", doctors());
    let (mut engine, _) = engine_with(api);

    engine.process("Book Appointment", &patient()).await;
    let res = engine.process("call an ambulance", &patient()).await;

    assert!(res.is_urgent);
    assert_eq!(res.action, Some(ActionId::CallAmbulance));
    assert_eq!(engine.step(), FlowStep::Idle);
}

// ── Symptoms and Availability ──

#[tokio::test]
async fn test_symptom_check_suggests_specialists() {
    let api = MockApi::new().on(Method::GET, "/api/doctors", doctors());
    let (mut engine, _) = engine_with(api);

    let res = engine.process("I have chest pain", &patient()).await;
    assert_eq!(
        res.text,
        "For chest, I recommend a Cardiologist. Here are the available doctors:"
    );
    assert_eq!(res.options, vec!["Book Dr. Arjun"]);
    assert_eq!(engine.step(), FlowStep::Idle);
}

#[tokio::test]
async fn test_symptom_check_ortho_family() {
    let api = MockApi::new().on(Method::GET, "/api/doctors", doctors());
    let (mut engine, _) = engine_with(api);

    let res = engine.process("my knee hurts", &patient()).await;
    assert_eq!(res.options, vec!["Book Dr. Kumar"]);
}

#[tokio::test]
async fn test_availability_for_named_doctor() {
    let api = MockApi::new().on(Method::GET, "/api/doctors", doctors());
    let (mut engine, _) = engine_with(api);

    let res = engine.process("is dr arjun available", &patient()).await;
    assert_eq!(
        res.text,
        "Dr. Arjun (Cardiologist) is available. Expected shift: 09:00 - 17:00. Would you like to book?"
    );
    assert_eq!(res.options, vec!["Book Dr. Arjun"]);
}

#[tokio::test]
async fn test_availability_by_department() {
    let api = MockApi::new().on(
        Method::GET,
        "/api/doctors/by-department/neurology",
        json!([{ "id": 2, "name": "Meena", "specialization": "Neurology" }]),
    );
    let (mut engine, calls) = engine_with(api);

    let res = engine.process("who is available in neurology", &patient()).await;
    assert_eq!(res.text, "Doctors in Neurology:");
    assert_eq!(res.options, vec!["Book Dr. Meena"]);
    assert_eq!(
        call_paths(&calls),
        vec![(Method::GET, "/api/doctors/by-department/neurology".to_string())]
    );
}

// ── Rescheduling ──

fn schedule() -> Value {
    json!([{
        "id": 42,
        "doctor": { "id": 1, "name": "Arjun", "specialization": "Cardiologist" },
        "appointmentDate": "2026-06-01",
        "appointmentTime": "09:00:00",
        "status": "SCHEDULED"
    }])
}

#[tokio::test]
async fn test_reschedule_creates_then_deletes() {
    let api = MockApi::new()
        .on(Method::GET, "/api/appointments/my-schedule", schedule())
        .on(Method::GET, "/api/doctors", doctors())
        .on(Method::POST, "/api/appointments/book", json!({ "id": 43 }))
        .on(Method::DELETE, "/api/appointments/42", Value::Null);
    let (mut engine, calls) = engine_with(api);
    let user = patient();

    let res = engine.process("Reschedule", &user).await;
    assert_eq!(engine.step(), FlowStep::AwaitingRescheduleSelection);
    assert_eq!(res.options, vec!["Dr. Arjun (2026-06-01)"]);

    let res = engine.process("Dr. Arjun (2026-06-01)", &user).await;
    assert_eq!(engine.step(), FlowStep::AwaitingDate);
    assert_eq!(
        res.text,
        "Okay, rescheduling Dr. Arjun. What is the NEW date you would like?"
    );
    assert_eq!(engine.context().slots.old_appointment_id, Some(42));

    engine.process("2026-06-10", &user).await;
    let res = engine.process("14:30", &user).await;
    assert_eq!(
        res.text,
        "Confirm moving your appointment with Dr. Arjun to 2026-06-10 at 14:30:00?"
    );

    let res = engine.process("yes", &user).await;
    assert_eq!(res.text, "Appointment successfully moved to the new time!");
    assert!(engine.context().is_pristine());

    let paths = call_paths(&calls);
    let book = paths
        .iter()
        .position(|c| *c == (Method::POST, "/api/appointments/book".to_string()))
        .unwrap();
    let delete = paths
        .iter()
        .position(|c| *c == (Method::DELETE, "/api/appointments/42".to_string()))
        .unwrap();
    assert!(book < delete);
}

#[tokio::test]
async fn test_reschedule_failed_booking_keeps_old_appointment() {
    let api = MockApi::new()
        .on(Method::GET, "/api/appointments/my-schedule", schedule())
        .on(Method::GET, "/api/doctors", doctors())
        .fail(
            Method::POST,
            "/api/appointments/book",
            409,
            json!({ "message": "Doctor unavailable" }),
        );
    let (mut engine, calls) = engine_with(api);
    let user = patient();

    engine.process("reschedule my appointment", &user).await;
    engine.process("2026-06-01", &user).await;
    engine.process("2026-06-10", &user).await;
    engine.process("11:00", &user).await;
    let res = engine.process("yes", &user).await;

    assert!(res.text.starts_with("Failed to reschedule. (Doctor unavailable)"));
    assert!(call_paths(&calls).iter().all(|(m, _)| *m != Method::DELETE));
    assert!(engine.context().is_pristine());
}

#[tokio::test]
async fn test_reschedule_old_delete_failure_still_reports_success() {
    let api = MockApi::new()
        .on(Method::GET, "/api/appointments/my-schedule", schedule())
        .on(Method::GET, "/api/doctors", doctors())
        .on(Method::POST, "/api/appointments/book", json!({ "id": 43 }))
        .fail(Method::DELETE, "/api/appointments/42", 500, json!({}));
    let (mut engine, calls) = engine_with(api);
    let user = patient();

    engine.process("Reschedule", &user).await;
    engine.process("arjun", &user).await;
    engine.process("2026-06-10", &user).await;
    engine.process("16:00", &user).await;
    let res = engine.process("yes", &user).await;

    assert_eq!(res.text, "Appointment successfully moved to the new time!");

    // attempted once, never retried
    let deletes: Vec<_> = call_paths(&calls)
        .into_iter()
        .filter(|(m, _)| *m == Method::DELETE)
        .collect();
    assert_eq!(
        deletes,
        vec![(Method::DELETE, "/api/appointments/42".to_string())]
    );
}

#[tokio::test]
async fn test_reschedule_same_doctor_moves_selected_appointment() {
    let api = MockApi::new()
        .on(
            Method::GET,
            "/api/appointments/my-schedule",
            json!([
                {
                    "id": 42,
                    "doctor": { "id": 1, "name": "Arjun", "specialization": "Cardiologist" },
                    "appointmentDate": "2026-06-01"
                },
                {
                    "id": 77,
                    "doctor": { "id": 1, "name": "Arjun", "specialization": "Cardiologist" },
                    "appointmentDate": "2026-07-15"
                }
            ]),
        )
        .on(Method::GET, "/api/doctors", doctors())
        .on(Method::POST, "/api/appointments/book", json!({ "id": 90 }))
        .on(Method::DELETE, "/api/appointments/77", Value::Null);
    let (mut engine, calls) = engine_with(api);
    let user = patient();

    let res = engine.process("Reschedule", &user).await;
    assert_eq!(
        res.options,
        vec!["Dr. Arjun (2026-06-01)", "Dr. Arjun (2026-07-15)"]
    );

    engine.process("Dr. Arjun (2026-07-15)", &user).await;
    assert_eq!(engine.context().slots.old_appointment_id, Some(77));

    engine.process("2026-07-20", &user).await;
    engine.process("10:00", &user).await;
    let res = engine.process("yes", &user).await;
    assert_eq!(res.text, "Appointment successfully moved to the new time!");

    let deletes: Vec<_> = call_paths(&calls)
        .into_iter()
        .filter(|(m, _)| *m == Method::DELETE)
        .collect();
    assert_eq!(
        deletes,
        vec![(Method::DELETE, "/api/appointments/77".to_string())]
    );
}

#[tokio::test]
async fn test_reschedule_ambiguous_doctor_name_reprompts() {
    let api = MockApi::new().on(
        Method::GET,
        "/api/appointments/my-schedule",
        json!([
            { "id": 42, "doctor": { "id": 1, "name": "Arjun" }, "appointmentDate": "2026-06-01" },
            { "id": 77, "doctor": { "id": 1, "name": "Arjun" }, "appointmentDate": "2026-07-15" }
        ]),
    );
    let (mut engine, _) = engine_with(api);
    let user = patient();

    engine.process("Reschedule", &user).await;
    let res = engine.process("arjun", &user).await;

    assert_eq!(engine.step(), FlowStep::AwaitingRescheduleSelection);
    assert!(res.text.starts_with("I didn't catch which appointment."));
    assert_eq!(engine.context().slots.old_appointment_id, None);
}

#[tokio::test]
async fn test_reschedule_with_no_appointments() {
    let api = MockApi::new().on(Method::GET, "/api/appointments/my-schedule", json!([]));
    let (mut engine, _) = engine_with(api);

    let res = engine.process("Reschedule", &patient()).await;
    assert_eq!(res.text, "You don't have any upcoming appointments to reschedule.");
    assert_eq!(engine.step(), FlowStep::Idle);
}

#[tokio::test]
async fn test_reschedule_selection_falls_back_to_embedded_doctor() {
    let api = MockApi::new()
        .on(Method::GET, "/api/appointments/my-schedule", schedule())
        .fail(Method::GET, "/api/doctors", 503, json!({}));
    let (mut engine, _) = engine_with(api);
    let user = patient();

    engine.process("Reschedule", &user).await;
    let res = engine.process("Dr. Arjun (2026-06-01)", &user).await;

    assert_eq!(engine.step(), FlowStep::AwaitingDate);
    assert!(res.text.contains("Dr. Arjun"));
}

// ── Patient Records ──

#[tokio::test]
async fn test_view_appointments_after_booking_does_not_restart_flow() {
    let api = MockApi::new()
        .on(Method::GET, "/api/doctors", doctors())
        .on(Method::POST, "/api/appointments/book", json!({ "id": 99 }))
        .on(Method::GET, "/api/appointments/my-schedule", schedule());
    let (mut engine, calls) = engine_with(api);
    let user = patient();

    engine.process("Book Appointment", &user).await;
    engine.process("Arjun", &user).await;
    engine.process("2026-05-20", &user).await;
    engine.process("10:00", &user).await;
    let res = engine.process("yes", &user).await;
    assert_eq!(res.options, vec!["View Appointments"]);

    let res = engine.process("View Appointments", &user).await;
    assert_eq!(engine.step(), FlowStep::Idle);
    assert_eq!(
        res.text,
        "Your upcoming appointments:\nDr. Arjun (2026-06-01) at 09:00:00"
    );
    assert_eq!(res.options, vec!["Reschedule", "Book Appointment"]);
    assert_eq!(
        call_paths(&calls).last().unwrap(),
        &(Method::GET, "/api/appointments/my-schedule".to_string())
    );
}

#[tokio::test]
async fn test_prescriptions_limited_to_four() {
    let api = MockApi::new().on(
        Method::GET,
        "/api/patient/visits",
        json!([
            { "prescriptions": [
                { "medicineName": "Aspirin", "dosage": "75mg" },
                { "medicineName": "Atorvastatin", "dosage": "10mg" },
                { "medicineName": "Metformin", "dosage": "500mg" }
            ]},
            { "prescriptions": [
                { "medicineName": "Paracetamol", "dosage": "650mg" },
                { "medicineName": "Cetirizine", "dosage": "10mg" }
            ]}
        ]),
    );
    let (mut engine, _) = engine_with(api);

    let res = engine.process("My Prescriptions", &patient()).await;
    assert_eq!(res.text, "Here are your recent prescriptions:");
    assert_eq!(
        res.options,
        vec![
            "Aspirin (75mg)",
            "Atorvastatin (10mg)",
            "Metformin (500mg)",
            "Paracetamol (650mg)"
        ]
    );
}

#[tokio::test]
async fn test_reports_failure_message() {
    let (mut engine, _) = engine_with(MockApi::new());

    let res = engine.process("My Reports", &patient()).await;
    assert_eq!(res.text, "I couldn't fetch your reports right now.");
}

#[tokio::test]
async fn test_next_visit_picks_earliest_future_follow_up() {
    let api = MockApi::new().on(
        Method::GET,
        "/api/patient/visits",
        json!([
            { "followUpDate": "2000-01-01", "doctor": { "user": { "name": "Old" } } },
            { "followUpDate": "2999-03-04T10:00:00", "doctor": { "user": { "name": "Later" } } },
            { "followUpDate": "2998-01-02", "doctor": { "user": { "name": "Meena" } } }
        ]),
    );
    let (mut engine, _) = engine_with(api);

    let res = engine.process("when is my next visit", &patient()).await;
    assert_eq!(
        res.text,
        "Your next scheduled visit is on 2998-01-02 with Dr. Meena."
    );
}

// ── Chat API ──

#[tokio::test]
async fn test_health() {
    let app = test_app(test_state(MockApi::new()));

    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_chat_greeting_assigns_session() {
    let app = test_app(test_state(MockApi::new()));

    let res = app
        .oneshot(json_request(
            "/api/chat/message",
            json!({ "message": "hello", "user": { "id": "u-1", "name": "Asha" } }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert!(!json["session_id"].as_str().unwrap().is_empty());
    assert_eq!(json["step"], "idle");
    assert!(json["reply"]["text"]
        .as_str()
        .unwrap()
        .starts_with("Hello Asha! I'm Kiwi."));
    assert_eq!(json["reply"]["options"][0], "Book Appointment");
}

#[tokio::test]
async fn test_chat_session_keeps_flow_between_requests() {
    let state = test_state(MockApi::new().on(Method::GET, "/api/doctors", doctors()));

    let res = test_app(state.clone())
        .oneshot(json_request(
            "/api/chat/message",
            json!({ "session_id": "s-1", "message": "Book Appointment", "user": { "id": "u-1" } }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["step"], "awaiting_doctor");

    let res = test_app(state.clone())
        .oneshot(json_request(
            "/api/chat/message",
            json!({ "session_id": "s-1", "message": "Meena", "user": { "id": "u-1" } }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["step"], "awaiting_date");

    let res = test_app(state.clone())
        .oneshot(json_request("/api/chat/reset", json!({ "session_id": "s-1" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["step"], "idle");

    assert_eq!(state.sessions.len(), 1);
}

#[tokio::test]
async fn test_chat_accepts_numeric_user_id() {
    let app = test_app(test_state(MockApi::new()));

    let res = app
        .oneshot(json_request(
            "/api/chat/message",
            json!({ "message": "hello", "user": { "id": 7, "name": "Asha", "role": "PATIENT" } }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert!(json["reply"]["text"]
        .as_str()
        .unwrap()
        .starts_with("Hello Asha!"));
}

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let app = test_app(test_state(MockApi::new()));

    let res = app
        .oneshot(json_request(
            "/api/chat/message",
            json!({ "message": "   ", "user": { "id": "u-1" } }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_unknown_session() {
    let app = test_app(test_state(MockApi::new()));

    let res = app
        .oneshot(json_request("/api/chat/reset", json!({ "session_id": "nope" })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
