//! Shared helpers for controller integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{broadcast, Semaphore};

use campus_admin::{AdminContext, AuthSession, CurrentUser, Notification, Notifier};
use campus_client::retry::RetryPolicy;
use campus_client::{
    ApiError, ApiRequest, ApiResponse, CacheEvent, Method, QueryCache, ResourceClient, Transport,
};
use campus_core::status::UserRole;

type Scripted = Result<ApiResponse, ApiError>;

/// In-memory [`Transport`] with canned responses per method and path.
///
/// Each route holds a queue; the last response repeats once the queue is
/// down to one. Unknown routes answer 404. Every request is logged before
/// the optional gate, so callers can count requests still in flight.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    calls: Mutex<Vec<ApiRequest>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, method: Method, path: &str, response: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    /// Queue a JSON response.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(
            method,
            path,
            Ok(ApiResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    /// Queue a plain-text response.
    pub fn respond_text(&self, method: Method, path: &str, status: u16, body: &str) {
        self.push(
            method,
            path,
            Ok(ApiResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    /// Queue a transport-level failure.
    pub fn fail(&self, method: Method, path: &str, error: ApiError) {
        self.push(method, path, Err(error));
    }

    /// Hold every subsequent request until permits are added to the
    /// returned semaphore.
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.calls.lock().unwrap().push(request.clone());

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&(request.method, request.path.clone())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().expect("non-empty queue"),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Ok(ApiResponse {
                status: 404,
                body: json!({"success": false, "message": format!("No route {}", request.path)})
                    .to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

pub fn department(id: &str, name: &str) -> Value {
    json!({"_id": id, "name": name, "code": id.to_uppercase(), "status": "ACTIVE"})
}

pub fn departments(range: std::ops::RangeInclusive<u32>) -> Vec<Value> {
    range
        .map(|n| department(&format!("d{n}"), &format!("Department {n}")))
        .collect()
}

pub fn course(id: &str, name: &str, department_id: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "code": id.to_uppercase(),
        "department": department_id,
        "duration": 3,
        "type": "UG",
        "status": "ACTIVE",
    })
}

pub fn session(id: &str, course_id: &str) -> Value {
    json!({
        "_id": id,
        "name": format!("Session {id}"),
        "startYear": "2023",
        "endYear": "2026",
        "course": course_id,
        "status": "ACTIVE",
    })
}

pub fn semester(id: &str, session_id: &str) -> Value {
    json!({
        "_id": id,
        "semesterName": format!("Semester {id}"),
        "semesterNumber": 1,
        "startDate": "2024-01-10",
        "endDate": "2024-05-30",
        "session": session_id,
        "status": "ACTIVE",
    })
}

pub fn faculty(id: &str, name: &str, department_id: &str) -> Value {
    json!({
        "_id": id,
        "fullName": name,
        "email": format!("{id}@uni.edu"),
        "role": "FACULTY",
        "status": "ACTIVE",
        "isVerified": false,
        "department": department_id,
    })
}

/// `{success, data: {data, pagination}}` listing envelope.
pub fn page(items: Vec<Value>, current_page: u32, limit: u32, total_items: u64) -> Value {
    let total_pages = total_items.div_ceil(u64::from(limit.max(1)));
    json!({
        "success": true,
        "message": "Fetched",
        "data": {
            "data": items,
            "pagination": {
                "currentPage": current_page,
                "totalPages": total_pages,
                "totalItems": total_items,
                "hasNext": u64::from(current_page) < total_pages,
                "hasPrev": current_page > 1,
            }
        },
        "statusCode": 200,
    })
}

/// Bare-list envelope, as returned by the option endpoints.
pub fn list(items: Vec<Value>) -> Value {
    json!({"success": true, "data": items, "statusCode": 200})
}

pub fn ok() -> Value {
    json!({"success": true, "message": "Done", "statusCode": 200})
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Notifier that records every notification, and how many cache
/// invalidations had been published when it was shown.
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
    events: Mutex<Option<broadcast::Receiver<CacheEvent>>>,
    invalidated: Mutex<usize>,
    invalidations_seen: Mutex<Vec<usize>>,
}

impl RecordingNotifier {
    pub fn watching(cache: &QueryCache) -> Arc<Self> {
        let notifier = Self::default();
        *notifier.events.lock().unwrap() = Some(cache.subscribe());
        Arc::new(notifier)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.notifications.lock().unwrap().last().cloned()
    }

    /// Running total of invalidation events at each notification.
    pub fn invalidations_seen(&self) -> Vec<usize> {
        self.invalidations_seen.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        let mut invalidated = self.invalidated.lock().unwrap();
        if let Some(rx) = self.events.lock().unwrap().as_mut() {
            while let Ok(event) = rx.try_recv() {
                if matches!(event, CacheEvent::Invalidated { .. }) {
                    *invalidated += 1;
                }
            }
        }
        self.invalidations_seen.lock().unwrap().push(*invalidated);
        self.notifications.lock().unwrap().push(notification);
    }
}

#[derive(Default)]
pub struct FakeAuth {
    logouts: AtomicUsize,
}

impl FakeAuth {
    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthSession for FakeAuth {
    fn current_user(&self) -> Option<CurrentUser> {
        Some(CurrentUser {
            id: "admin".into(),
            full_name: "Admin".into(),
            role: UserRole::Admin,
        })
    }

    async fn logout(&self) {
        self.logouts.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub notifier: Arc<RecordingNotifier>,
    pub auth: Arc<FakeAuth>,
    pub ctx: AdminContext,
}

/// Context over a scripted transport, without read retries.
pub fn harness() -> Harness {
    let transport = ScriptedTransport::new();
    let client = ResourceClient::new(transport.clone(), RetryPolicy::none());
    let cache = QueryCache::default();
    let notifier = RecordingNotifier::watching(&cache);
    let auth = Arc::new(FakeAuth::default());
    let ctx = AdminContext::new(client, cache, notifier.clone(), auth.clone()).with_page_size(5);
    Harness {
        transport,
        notifier,
        auth,
        ctx,
    }
}
