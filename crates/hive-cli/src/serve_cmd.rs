use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use hive_core::calendar::{CalendarEvent, month_events};
use hive_core::client::{
    self, ClientDraft, ClientWithTeam, InitialPlan, advance_client_due_date,
    create_client_with_team_and_plan, list_clients_with_team,
};
use hive_core::dates::{self, DueStatus, client_status};
use hive_core::filter::{ClientQuery, SortOrder, StatusFilter};
use hive_core::rollover::{resolve_monthly_plan, save_plan};
use hive_core::team::{TeamSelection, fetch_team, set_team};
use hive_core::{HiveError, HiveStore, Month};
use hive_db::models::TeamRole;

pub type AppState = Arc<dyn HiveStore>;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl From<HiveError> for AppError {
    fn from(err: HiveError) -> Self {
        match err {
            HiveError::ClientNotFound(_) => Self::not_found(err.to_string()),
            HiveError::Store(e) => {
                tracing::error!(error = %format!("{e:#}"), "store error");
                Self::internal(e)
            }
            other if other.is_client_error() => Self::bad_request(other.to_string()),
            other => Self::internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub assignee: Option<Uuid>,
    pub role: Option<String>,
    pub sort: Option<String>,
}

impl ListParams {
    fn into_query(self) -> Result<ClientQuery, AppError> {
        fn parse<T: std::str::FromStr>(value: Option<String>) -> Result<Option<T>, AppError>
        where
            T::Err: std::fmt::Display,
        {
            value
                .filter(|v| !v.is_empty())
                .map(|v| v.parse::<T>().map_err(|e| AppError::bad_request(e.to_string())))
                .transpose()
        }

        Ok(ClientQuery {
            search: self.search,
            status: parse::<StatusFilter>(self.status)?.unwrap_or_default(),
            assignee: self.assignee,
            role: parse::<TeamRole>(self.role)?,
            sort: parse::<SortOrder>(self.sort)?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ClientSummary {
    #[serde(flatten)]
    pub entry: ClientWithTeam,
    pub due_status: DueStatus,
    pub due_label: String,
    pub days_until_due: i64,
    pub shoot_warning: bool,
}

impl ClientSummary {
    fn new(entry: ClientWithTeam, today: NaiveDate) -> Self {
        let status = client_status(&entry.client, today);
        Self {
            entry,
            due_status: status.due,
            due_label: status.label,
            days_until_due: status.days_until_due,
            shoot_warning: status.shoot_warning,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    #[serde(flatten)]
    pub client: ClientDraft,
    #[serde(default)]
    pub team: TeamSelection,
    #[serde(default)]
    pub plan: Option<InitialPlan>,
}

#[derive(Debug, Deserialize)]
pub struct PlanBody {
    pub posts_planned: i32,
    pub ads_planned: i32,
}

#[derive(Debug, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_month: bool,
    pub events: Vec<CalendarEvent>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub month: Month,
    pub days: Vec<CalendarDay>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(store: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/clients", get(list_clients).post(create_client))
        .route("/api/clients/{id}", get(get_client).delete(delete_client))
        .route("/api/clients/{id}/advance", post(advance_client))
        .route("/api/clients/{id}/team", get(get_team).put(put_team))
        .route(
            "/api/clients/{id}/plans/{month}",
            get(get_plan).put(put_plan),
        )
        .route("/api/users", get(list_users))
        .route("/api/calendar/{month}", get(get_calendar))
        .layer(CorsLayer::permissive())
        .with_state(store)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(store: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(store);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("hive serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("hive serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn parse_month(raw: &str) -> Result<Month, AppError> {
    raw.parse()
        .map_err(|e: hive_core::ValidationError| AppError::bad_request(e.to_string()))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

async fn index(State(store): State<AppState>) -> Result<axum::response::Response, AppError> {
    let clients = store.list_clients().await.map_err(AppError::internal)?;
    let today = dates::today();

    let rows = if clients.is_empty() {
        "<tr><td colspan=\"3\">No clients yet.</td></tr>".to_string()
    } else {
        clients
            .iter()
            .map(|c| {
                format!(
                    "<tr><td><a href=\"/api/clients/{id}\">{name}</a></td><td>{due}</td><td>{status}</td></tr>",
                    id = c.id,
                    name = escape_html(&c.client_name),
                    due = c.due_date,
                    status = dates::format_due_status(c.due_date, today),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let html = format!(
        "<!DOCTYPE html>\
<html><head><title>hive</title></head><body>\
<h1>hive</h1>\
<p><a href=\"/api/clients\">/api/clients</a> | <a href=\"/api/users\">/api/users</a></p>\
<table><tr><th>Client</th><th>Report due</th><th>Status</th></tr>{rows}</table>\
</body></html>"
    );

    Ok(Html(html).into_response())
}

async fn list_clients(
    State(store): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ClientSummary>>, AppError> {
    let query = params.into_query()?;
    let today = dates::today();
    let clients = list_clients_with_team(store.as_ref()).await?;

    let summaries = query
        .apply(clients, today)
        .into_iter()
        .map(|entry| ClientSummary::new(entry, today))
        .collect();
    Ok(Json(summaries))
}

async fn create_client(
    State(store): State<AppState>,
    Json(req): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientSummary>), AppError> {
    let created =
        create_client_with_team_and_plan(store.as_ref(), &req.client, &req.team, req.plan.as_ref())
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(ClientSummary::new(created, dates::today())),
    ))
}

async fn get_client(
    State(store): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClientSummary>, AppError> {
    let client = client::get_client(store.as_ref(), id).await?;
    let team = fetch_team(store.as_ref(), id).await?;
    Ok(Json(ClientSummary::new(
        ClientWithTeam { client, team },
        dates::today(),
    )))
}

async fn delete_client(
    State(store): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    client::delete_client(store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn advance_client(
    State(store): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let client = advance_client_due_date(store.as_ref(), id, Utc::now()).await?;
    Ok(Json(client).into_response())
}

async fn get_team(
    State(store): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    client::get_client(store.as_ref(), id).await?;
    let team = fetch_team(store.as_ref(), id).await?;
    Ok(Json(team).into_response())
}

async fn put_team(
    State(store): State<AppState>,
    Path(id): Path<Uuid>,
    Json(selection): Json<TeamSelection>,
) -> Result<axum::response::Response, AppError> {
    let team = set_team(store.as_ref(), id, &selection).await?;
    Ok(Json(team).into_response())
}

async fn get_plan(
    State(store): State<AppState>,
    Path((id, month)): Path<(Uuid, String)>,
) -> Result<axum::response::Response, AppError> {
    let month = parse_month(&month)?;
    let plan = resolve_monthly_plan(store.as_ref(), id, month)
        .await?
        .ok_or_else(|| AppError::not_found(format!("no content plan for {month}")))?;
    Ok(Json(plan).into_response())
}

async fn put_plan(
    State(store): State<AppState>,
    Path((id, month)): Path<(Uuid, String)>,
    Json(body): Json<PlanBody>,
) -> Result<axum::response::Response, AppError> {
    let month = parse_month(&month)?;
    let plan = save_plan(store.as_ref(), id, month, body.posts_planned, body.ads_planned).await?;
    Ok(Json(plan).into_response())
}

async fn list_users(State(store): State<AppState>) -> Result<axum::response::Response, AppError> {
    let users = store.list_users().await.map_err(AppError::internal)?;
    Ok(Json(users).into_response())
}

async fn get_calendar(
    State(store): State<AppState>,
    Path(month): Path<String>,
) -> Result<Json<CalendarResponse>, AppError> {
    let month = parse_month(&month)?;
    let clients = store.list_clients().await.map_err(AppError::internal)?;

    let days = month_events(&clients, month)
        .into_iter()
        .map(|(date, events)| CalendarDay {
            date,
            in_month: month.contains(date),
            events,
        })
        .collect();
    Ok(Json(CalendarResponse { month, days }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use chrono::{NaiveDate, TimeDelta};
    use tower::ServiceExt;

    use hive_core::client::{ClientDraft, create_client};
    use hive_core::store::{HiveStore, MemoryStore, PgStore};
    use hive_db::models::{RecurrenceConfig, RecurringInterval};
    use hive_db::queries::users::NewUser;
    use hive_test_utils::{create_test_db, drop_test_db};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send(
        store: Arc<dyn HiveStore>,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> axum::response::Response {
        let app = super::build_router(store);
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn get(store: &MemoryStore, uri: &str) -> axum::response::Response {
        send(Arc::new(store.clone()), Method::GET, uri, None).await
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn seed_client(store: &MemoryStore, name: &str, due: NaiveDate) -> uuid::Uuid {
        create_client(store, &ClientDraft::new(name, due))
            .await
            .unwrap()
            .id
    }

    async fn seed_user(store: &MemoryStore, name: &str) -> uuid::Uuid {
        store
            .insert_user(&NewUser {
                name: name.into(),
                email: format!("{}@example.com", name.to_lowercase()),
                avatar_url: None,
                role: None,
            })
            .await
            .unwrap()
            .id
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_index_returns_html() {
        let store = MemoryStore::new();
        seed_client(&store, "<Acme>", hive_core::dates::today()).await;

        let resp = get(&store, "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp
            .headers()
            .get("content-type")
            .expect("should have content-type header")
            .to_str()
            .unwrap()
            .to_owned();
        assert!(content_type.contains("text/html"), "got: {content_type}");

        let bytes = axum::body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("&lt;Acme&gt;"));
        assert!(html.contains("Due Today"));
    }

    #[tokio::test]
    async fn test_list_clients_empty() {
        let store = MemoryStore::new();
        let resp = get(&store, "/api/clients").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_list_clients_filters_and_derives_status() {
        let store = MemoryStore::new();
        let today = hive_core::dates::today();
        seed_client(&store, "Late", today - TimeDelta::days(3)).await;
        seed_client(&store, "Soon", today + TimeDelta::days(2)).await;
        seed_client(&store, "Later", today + TimeDelta::days(40)).await;

        let json = body_json(get(&store, "/api/clients?status=overdue").await).await;
        let list = json.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["client_name"], "Late");
        assert_eq!(list[0]["due_status"], "overdue");
        assert_eq!(list[0]["due_label"], "3 days overdue");
        assert_eq!(list[0]["manager"], serde_json::Value::Null);

        let json = body_json(get(&store, "/api/clients?search=SOON&sort=name").await).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_clients_rejects_unknown_filter() {
        let store = MemoryStore::new();
        let resp = get(&store, "/api/clients?status=someday").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("someday"));
    }

    #[tokio::test]
    async fn test_create_client_with_team() {
        let store = MemoryStore::new();
        let ann = seed_user(&store, "Ann").await;

        let resp = send(
            Arc::new(store.clone()),
            Method::POST,
            "/api/clients",
            Some(serde_json::json!({
                "client_name": "Acme",
                "due_date": "2025-07-01",
                "recurrence": "quarterly",
                "team": { "manager_id": ann },
                "plan": { "month": "2025-07", "posts_planned": 8, "ads_planned": 1 }
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert_eq!(json["recurrence"], "quarterly");
        assert_eq!(json["manager"]["name"], "Ann");
        assert_eq!(store.plans().await.len(), 1);
    }

    #[tokio::test]
    async fn test_get_client_not_found() {
        let store = MemoryStore::new();
        let resp = get(&store, &format!("/api/clients/{}", uuid::Uuid::new_v4())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_delete_client() {
        let store = MemoryStore::new();
        let id = seed_client(&store, "Acme", NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()).await;

        let uri = format!("/api/clients/{id}");
        let resp = send(Arc::new(store.clone()), Method::DELETE, &uri, None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(get(&store, &uri).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_advance_requires_recurrence() {
        let store = MemoryStore::new();
        let id = seed_client(&store, "Acme", NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()).await;
        let uri = format!("/api/clients/{id}/advance");

        let resp = send(Arc::new(store.clone()), Method::POST, &uri, None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let mut draft = ClientDraft::new("Monthly", NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
        draft.recurrence = RecurrenceConfig::Enabled(RecurringInterval::Monthly);
        let recurring = create_client(&store, &draft).await.unwrap();
        let uri = format!("/api/clients/{}/advance", recurring.id);
        let resp = send(Arc::new(store.clone()), Method::POST, &uri, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["due_date"], "2025-02-28");
    }

    #[tokio::test]
    async fn test_put_team_requires_manager() {
        let store = MemoryStore::new();
        let id = seed_client(&store, "Acme", NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()).await;
        let ed = seed_user(&store, "Ed").await;
        let uri = format!("/api/clients/{id}/team");

        let resp = send(
            Arc::new(store.clone()),
            Method::PUT,
            &uri,
            Some(serde_json::json!({ "editor_ids": [ed] })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "manager is required");

        let resp = send(
            Arc::new(store.clone()),
            Method::PUT,
            &uri,
            Some(serde_json::json!({ "manager_id": ed, "editor_ids": [ed] })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(get(&store, &uri).await).await;
        assert_eq!(json["manager"]["name"], "Ed");
        assert_eq!(json["editors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_plans_roll_over_and_save() {
        let store = MemoryStore::new();
        let mut draft = ClientDraft::new("Acme", NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        draft.recurrence = RecurrenceConfig::Enabled(RecurringInterval::Monthly);
        let id = create_client(&store, &draft).await.unwrap().id;

        let resp = get(&store, &format!("/api/clients/{id}/plans/2025-10")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(
            Arc::new(store.clone()),
            Method::PUT,
            &format!("/api/clients/{id}/plans/2025-09"),
            Some(serde_json::json!({ "posts_planned": 10, "ads_planned": 2 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(get(&store, &format!("/api/clients/{id}/plans/2025-10")).await).await;
        assert_eq!(json["month"], "2025-10");
        assert_eq!(json["posts_planned"], 10);
        assert_eq!(json["ads_planned"], 2);

        let resp = get(&store, &format!("/api/clients/{id}/plans/2025-13")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_calendar_month() {
        let store = MemoryStore::new();
        seed_client(&store, "Acme", NaiveDate::from_ymd_opt(2025, 6, 12).unwrap()).await;

        let json = body_json(get(&store, "/api/calendar/2025-06").await).await;
        assert_eq!(json["month"], "2025-06");
        let days = json["days"].as_array().unwrap();
        assert_eq!(days.len(), 35);
        let day = days.iter().find(|d| d["date"] == "2025-06-12").unwrap();
        assert_eq!(day["events"][0]["kind"], "report");
        assert_eq!(days.last().unwrap()["in_month"], false);
    }

    #[tokio::test]
    async fn test_list_users_from_postgres() {
        let (pool, db_name) = create_test_db().await;
        let store = PgStore::new(pool.clone());
        store
            .insert_user(&NewUser {
                name: "Ann".into(),
                email: "ann@example.com".into(),
                avatar_url: None,
                role: Some("designer".into()),
            })
            .await
            .unwrap();

        let resp = send(Arc::new(store), Method::GET, "/api/users", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json[0]["name"], "Ann");
        assert_eq!(json[0]["role"], "designer");

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
