use crate::error::app_error::AppError;
use crate::models::auth::{ApiEnvelope, AuthUrlData, CallbackData};
use crate::models::pagination::{PageRequest, PaginationInfo};
use crate::models::project::{NewProject, Project, UserOption};
use crate::models::session::{SessionBundle, SessionUser, TokenBundle};
use crate::models::statistics::{TaskStats, TaskTotals};
use crate::models::task::{NewTask, Task};
use crate::upstream::api_client::{ListData, decode_envelope};
use crate::upstream::identity::{AUTH_URL_ENDPOINT, CALLBACK_ENDPOINT, IdentityProvider};
use crate::upstream::project::ProjectRepository;
use crate::upstream::statistics::StatisticsRepository;
use crate::upstream::task::TaskRepository;
use crate::{Config, build_rocket_with_upstream};
use chrono::{Duration, Utc};
use reqwest::StatusCode;
use rocket::http::Status;
use rocket::local::asynchronous::Client;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub fn sample_bundle() -> SessionBundle {
    SessionBundle {
        user: SessionUser {
            id: 42,
            name: "Ada Lovelace".to_string(),
            email: Some("ada@example.com".to_string()),
            display_name: Some("Ada".to_string()),
            profile_pic: None,
            designation: Some("Engineer".to_string()),
        },
        token: TokenBundle {
            access_token: "xoxp-access".to_string(),
            refresh_token: "xoxe-refresh".to_string(),
            expires_at: (Utc::now() + Duration::hours(1)).timestamp(),
        },
    }
}

/// Callback body for user 42, optionally without `user` or `token`.
pub fn callback_body(with_user: bool, with_token: bool) -> String {
    let expires_at = (Utc::now() + Duration::hours(1)).timestamp();
    let mut data = serde_json::Map::new();
    if with_user {
        data.insert(
            "user".to_string(),
            serde_json::json!({"id": 42, "name": "Ada Lovelace", "email": "ada@example.com", "display_name": "Ada", "designation": "Engineer"}),
        );
    }
    if with_token {
        data.insert(
            "token".to_string(),
            serde_json::json!({"access_token": "xoxp-access", "refresh_token": "xoxe-refresh", "expires_at": expires_at}),
        );
    }
    serde_json::json!({"status": 200, "success": true, "data": data}).to_string()
}

/// Identity provider answering with canned upstream bodies, decoded the same way as live ones.
pub struct MockIdentity {
    auth_url: (StatusCode, String),
    callback: (StatusCode, String),
    auth_url_calls: AtomicUsize,
    exchange_calls: AtomicUsize,
}

impl Default for MockIdentity {
    fn default() -> Self {
        Self {
            auth_url: (StatusCode::OK, r#"{"status":200,"success":true,"data":{"authUrl":"https://slack.com/oauth"}}"#.to_string()),
            callback: (StatusCode::OK, callback_body(true, true)),
            auth_url_calls: AtomicUsize::new(0),
            exchange_calls: AtomicUsize::new(0),
        }
    }
}

impl MockIdentity {
    pub fn with_auth_url(mut self, status: StatusCode, body: &str) -> Self {
        self.auth_url = (status, body.to_string());
        self
    }

    pub fn with_callback(mut self, status: StatusCode, body: &str) -> Self {
        self.callback = (status, body.to_string());
        self
    }

    pub fn auth_url_calls(&self) -> usize {
        self.auth_url_calls.load(Ordering::SeqCst)
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MockIdentity {
    async fn fetch_auth_url(&self) -> Result<ApiEnvelope<AuthUrlData>, AppError> {
        self.auth_url_calls.fetch_add(1, Ordering::SeqCst);
        decode_envelope(AUTH_URL_ENDPOINT, self.auth_url.0, self.auth_url.1.as_bytes())
    }

    async fn exchange_code(&self, _code: &str) -> Result<ApiEnvelope<CallbackData>, AppError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        decode_envelope(CALLBACK_ENDPOINT, self.callback.0, self.callback.1.as_bytes())
    }
}

pub fn project(id: i64, description: Option<&str>) -> Project {
    Project {
        id,
        title: format!("project {}", id),
        description: description.map(str::to_string),
        status: Some("active".to_string()),
        created_by: 42,
        updated_by: None,
        start_date: None,
        due_date: None,
        links: Vec::new(),
        assigned_users: vec![42],
    }
}

fn page_info(page: &PageRequest, total_records: u64) -> PaginationInfo {
    let total_pages = total_records.div_ceil(u64::from(page.page_size)) as u32;
    PaginationInfo {
        total_records,
        total_pages,
        page_size: page.page_size,
        current_page: page.page,
        next_page: (page.page < total_pages).then_some(page.page + 1),
        prev_page: (page.page > 1).then_some(page.page - 1),
    }
}

/// In-memory stand-in for the upstream data endpoints. Project 1 has a description, the rest
/// do not.
pub struct MockRepository {
    pub fail_totals: bool,
    pub total_projects: u64,
}

impl Default for MockRepository {
    fn default() -> Self {
        Self {
            fail_totals: false,
            total_projects: 2,
        }
    }
}

#[async_trait::async_trait]
impl ProjectRepository for MockRepository {
    async fn list_projects(&self, page: &PageRequest, _token: &str) -> Result<ListData<Project>, AppError> {
        let first = u64::from(page.page.saturating_sub(1)) * u64::from(page.page_size) + 1;
        let last = (u64::from(page.page) * u64::from(page.page_size)).min(self.total_projects);
        let records = (first..=last)
            .map(|id| project(id as i64, (id == 1).then_some("Relaunch")))
            .collect();

        Ok(ListData {
            records,
            pagination_info: page_info(page, self.total_projects),
        })
    }

    async fn get_project(&self, id: i64, _token: &str) -> Result<Project, AppError> {
        Ok(project(id, None))
    }

    async fn create_project(&self, new_project: &NewProject, _token: &str) -> Result<Project, AppError> {
        Ok(Project {
            title: new_project.title.clone(),
            description: new_project.description.clone(),
            created_by: new_project.created_by,
            ..project(99, None)
        })
    }

    async fn search_users(&self, _search: &str, _token: &str) -> Result<Vec<UserOption>, AppError> {
        Ok(vec![UserOption {
            id: 42,
            name: "Ada Lovelace".to_string(),
        }])
    }
}

#[async_trait::async_trait]
impl TaskRepository for MockRepository {
    async fn list_tasks(&self, page: &PageRequest, _token: &str) -> Result<ListData<Task>, AppError> {
        Ok(ListData {
            records: Vec::new(),
            pagination_info: page_info(page, 0),
        })
    }

    async fn create_task(&self, new_task: &NewTask, _token: &str) -> Result<Task, AppError> {
        Ok(Task {
            id: 7,
            title: new_task.title.clone(),
            project_id: Some(new_task.project_id),
            status: None,
            subtasks: new_task.subtasks.clone(),
        })
    }
}

#[async_trait::async_trait]
impl StatisticsRepository for MockRepository {
    async fn list_task_statistics(&self, page: &PageRequest, _token: &str) -> Result<ListData<TaskStats>, AppError> {
        Ok(ListData {
            records: Vec::new(),
            pagination_info: page_info(page, 0),
        })
    }

    async fn task_totals(&self, _token: &str) -> Result<TaskTotals, AppError> {
        if self.fail_totals {
            return Err(AppError::UpstreamStatus {
                endpoint: "/tasks/summary".to_string(),
                status: 500,
                message: None,
            });
        }
        Ok(TaskTotals {
            total: 12,
            completed: 5,
            in_progress: 4,
            pending: 3,
        })
    }
}

/// Local client already signed in as user 42, with `api` answering the data routes.
pub async fn signed_in_client(api: MockRepository) -> Client {
    let rocket = build_rocket_with_upstream(Config::default(), Arc::new(MockIdentity::default()), Arc::new(api));
    let client = Client::tracked(rocket).await.expect("valid rocket instance");

    let response = client.get("/?code=signed-in").dispatch().await;
    assert_eq!(response.status(), Status::SeeOther);
    drop(response);
    client
}

/// Serves exactly one HTTP response on a local port. Resolves to the request head it received.
pub async fn one_shot_upstream(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind local listener");
    let base_url = format!("http://{}", listener.local_addr().expect("local address"));

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept upstream connection");
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.expect("read request");
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
            if head.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.expect("write response");
        String::from_utf8_lossy(&head).into_owned()
    });

    (base_url, handle)
}
