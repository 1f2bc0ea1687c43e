//! Shared helpers for client integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use campus_client::{ApiError, ApiRequest, ApiResponse, Method, Transport};

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

pub fn faculty(id: &str, name: &str, department_id: &str) -> Value {
    json!({
        "_id": id,
        "fullName": name,
        "email": format!("{id}@uni.edu"),
        "role": "FACULTY",
        "status": "ACTIVE",
        "isVerified": true,
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

pub fn single(item: Value) -> Value {
    json!({"success": true, "data": item, "statusCode": 200})
}

pub fn ok() -> Value {
    json!({"success": true, "message": "Done", "statusCode": 200})
}
