//! Dashboard HTTP API
//!
//! - `GET /events`: Server-Sent Events. The current agent snapshot first,
//!   then every line the engine broadcasts.
//! - `GET /agents`: agents as JSON
//! - `GET /stats`: counts as JSON
//! - `POST /agents/:id/toggle`: toggle AVAIL/PAUSED, optionally forced with
//!   `{"force": "AVAIL"}` or `{"force": "PAUSED"}`
//! - `POST /agents/:id/avail`: make an agent available
//!
//! Handlers never touch call-center state directly; they send a
//! [`DashboardCommand`] to the runner and wait for its reply.

use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Json, Response,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::{Stream, StreamExt, stream};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info};

use ccpanel_call_engine::{Agent, AgentStatus, CallCenterError, CallCenterStats, ChannelBroadcaster, ToggleForce};

use crate::runner::DashboardCommand;

/// Shared state of the dashboard handlers
#[derive(Clone)]
pub struct DashboardState {
    commands: mpsc::Sender<DashboardCommand>,
    broadcaster: ChannelBroadcaster,
}

impl DashboardState {
    pub fn new(commands: mpsc::Sender<DashboardCommand>, broadcaster: ChannelBroadcaster) -> Self {
        Self { commands, broadcaster }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> DashboardCommand,
    ) -> Result<T, ApiError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| ApiError::Unavailable)?;
        rx.await.map_err(|_| ApiError::Unavailable)
    }
}

/// Errors returned by dashboard handlers
#[derive(Debug)]
pub enum ApiError {
    /// The runner is gone
    Unavailable,
    Control(CallCenterError),
}

impl From<CallCenterError> for ApiError {
    fn from(err: CallCenterError) -> Self {
        ApiError::Control(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Manager connection is not running".to_string(),
            ),
            ApiError::Control(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Optional body of `POST /agents/:id/toggle`
#[derive(Debug, Default, Deserialize)]
pub struct ToggleRequest {
    pub force: Option<ToggleForce>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub agent_id: String,
    /// New status, or `None` when nothing changed
    pub status: Option<AgentStatus>,
}

/// Build the dashboard router
pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/events", get(events))
        .route("/agents", get(list_agents))
        .route("/stats", get(stats))
        .route("/agents/:id/toggle", post(toggle_agent))
        .route("/agents/:id/avail", post(make_agent_avail))
        .with_state(state)
}

async fn events(
    State(state): State<DashboardState>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    // Subscribe before the snapshot so no change falls in between
    let updates = BroadcastStream::new(state.broadcaster.subscribe());
    let hello = state.request(|reply| DashboardCommand::Hello { reply }).await?;
    info!("Dashboard viewer connected, {} viewers", state.broadcaster.viewer_count());

    let lines = stream::iter(hello).chain(updates.filter_map(|update| async move {
        match update {
            Ok(line) => Some(line),
            Err(e) => {
                debug!("Viewer lagged: {}", e);
                None
            }
        }
    }));

    Ok(Sse::new(lines.map(|line| Ok(SseEvent::default().data(line)))).keep_alive(KeepAlive::default()))
}

async fn list_agents(State(state): State<DashboardState>) -> Result<Json<Vec<Agent>>, ApiError> {
    let agents = state.request(|reply| DashboardCommand::Agents { reply }).await?;
    Ok(Json(agents))
}

async fn stats(State(state): State<DashboardState>) -> Result<Json<CallCenterStats>, ApiError> {
    let stats = state.request(|reply| DashboardCommand::Stats { reply }).await?;
    Ok(Json(stats))
}

async fn toggle_agent(
    State(state): State<DashboardState>,
    Path(agent_id): Path<String>,
    body: Option<Json<ToggleRequest>>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let force = body.and_then(|Json(request)| request.force);
    let status = state
        .request(|reply| DashboardCommand::Toggle {
            agent_id: agent_id.clone(),
            force,
            reply,
        })
        .await??;
    Ok(Json(ToggleResponse { agent_id, status }))
}

async fn make_agent_avail(
    State(state): State<DashboardState>,
    Path(agent_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .request(|reply| DashboardCommand::SetAvail { agent_id, reply })
        .await??;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use bytes::Bytes;
    use tower::ServiceExt;

    use crate::runner::Runner;

    /// Router backed by a real runner fed with the given manager bytes
    fn app(initial: &[u8]) -> (Router, mpsc::UnboundedReceiver<Bytes>) {
        let broadcaster = ChannelBroadcaster::new(16);
        let (mut runner, outbound) = Runner::new(Arc::new(broadcaster.clone()));
        runner.handle_bytes(initial);

        let (commands, mut rx) = mpsc::channel(8);
        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                runner.handle_command(command);
            }
        });
        (router(DashboardState::new(commands, broadcaster)), outbound)
    }

    async fn body_bytes(response: Response) -> Bytes {
        axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap()
    }

    const PAUSED_100: &[u8] = b"Event: QueueMemberPause\r\nCallerIDNum: 100\r\nPaused: 1\r\n\r\n";

    #[tokio::test]
    async fn test_list_agents() {
        let (app, _outbound) = app(PAUSED_100);
        let response = app
            .oneshot(Request::builder().uri("/agents").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let agents: Vec<Agent> = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].id, "100");
        assert_eq!(agents[0].status, AgentStatus::Paused);
    }

    #[tokio::test]
    async fn test_toggle_without_body() {
        let (app, mut outbound) = app(PAUSED_100);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agents/100/toggle")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let toggled: ToggleResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(
            toggled,
            ToggleResponse {
                agent_id: "100".to_string(),
                status: Some(AgentStatus::Avail),
            }
        );
        let block = outbound.try_recv().unwrap();
        assert!(std::str::from_utf8(&block).unwrap().contains("Paused: false\r\n"));
    }

    #[tokio::test]
    async fn test_forced_toggle() {
        let (app, _outbound) = app(PAUSED_100);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agents/100/toggle")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"force":"PAUSED"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        let toggled: ToggleResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(toggled.status, Some(AgentStatus::Paused));
    }

    #[tokio::test]
    async fn test_avail_creates_agent() {
        let (app, _outbound) = app(b"");
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agents/200/avail")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let stats: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(stats["agents"], 1);
        assert_eq!(stats["available_agents"], 1);
    }

    #[tokio::test]
    async fn test_closed_transport_is_bad_gateway() {
        let (app, outbound) = app(PAUSED_100);
        drop(outbound);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agents/100/avail")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_runner_gone_is_unavailable() {
        let (commands, rx) = mpsc::channel(1);
        drop(rx);
        let app = router(DashboardState::new(commands, ChannelBroadcaster::new(4)));

        let response = app
            .oneshot(Request::builder().uri("/agents").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_events_start_with_snapshot() {
        let (app, _outbound) = app(PAUSED_100);
        let response = app
            .oneshot(Request::builder().uri("/events").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut body = response.into_body().into_data_stream();
        let first = body.next().await.unwrap().unwrap();
        assert_eq!(std::str::from_utf8(&first).unwrap(), "data: AGENT:100:PAUSED\n\n");
    }
}
