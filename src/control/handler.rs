//! Route handlers for the control surface
//!
//! Handlers hold only shared, read-only services ([`HandlerContext`]), so the
//! same table can serve every start/stop cycle of the server.

use crate::capture::{self, DisplaySource};
use crate::config::{AgentConfig, CapturePolicy};
use crate::control::api::ActionRequest;
use crate::control::dashboard;
use crate::control::router::RouteTable;
use crate::error::AgentError;
use crate::host::{InfoCollector, SystemInfoCollector};
use crate::platform::{self, ActionExecutor};
use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Liveness probe path
pub const PING_PATH: &str = "/ping";

/// Dashboard path
pub const DASHBOARD_PATH: &str = "/";

/// Host action path
pub const ACTION_PATH: &str = "/api/action";

/// Body of a successful liveness probe
pub const PING_BODY: &str = "ok";

/// Services the handlers call into
#[derive(Clone)]
pub struct HandlerContext {
    /// Performs reboot/shutdown
    pub executor: Arc<dyn ActionExecutor>,
    /// Captures attached displays
    pub displays: Arc<dyn DisplaySource>,
    /// Reads host facts
    pub info: Arc<dyn InfoCollector>,
    /// Failure policy for screenshot batches
    pub capture_policy: CapturePolicy,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl HandlerContext {
    /// Context wired to the real OS services
    pub fn system(config: &AgentConfig) -> Self {
        Self {
            executor: platform::get_executor(),
            displays: capture::default_source(),
            info: Arc::new(SystemInfoCollector::new()),
            capture_policy: config.capture.on_failure,
            max_body_bytes: config.server.max_body_bytes,
        }
    }
}

/// Register the fixed control routes
pub fn register_routes(table: &mut RouteTable, context: HandlerContext) {
    table.add(Method::GET, PING_PATH, |_req| async { ping().await });

    let ctx = context.clone();
    table.add(Method::GET, DASHBOARD_PATH, move |_req| {
        let ctx = ctx.clone();
        async move { render_dashboard(ctx).await }
    });

    let ctx = context;
    table.add(Method::POST, ACTION_PATH, move |req| {
        let ctx = ctx.clone();
        async move { handle_action(ctx, req).await }
    });
}

/// `GET /ping`
async fn ping() -> Response {
    PING_BODY.into_response()
}

/// `GET /`: collect host info and capture every display, then render
async fn render_dashboard(ctx: HandlerContext) -> Response {
    let collector = ctx.info.clone();
    let info_task = tokio::task::spawn_blocking(move || collector.collect());

    let source = ctx.displays.clone();
    let policy = ctx.capture_policy;
    let capture_task =
        tokio::task::spawn_blocking(move || capture::capture_all(source.as_ref(), policy));

    let (info, screenshots) = tokio::join!(info_task, capture_task);

    let info = info.unwrap_or_else(|e| {
        Err(AgentError::InfoCollection(format!("collector task failed: {}", e)))
    });
    let screenshots = screenshots
        .unwrap_or_else(|e| Err(AgentError::Capture(format!("capture task failed: {}", e))));

    if let Err(e) = &info {
        warn!("Rendering dashboard without host info: {}", e);
    }
    match &screenshots {
        Ok(set) => debug!("Rendering dashboard with {} screenshot(s)", set.len()),
        Err(e) => warn!("Rendering dashboard without screenshots: {}", e),
    }

    Html(dashboard::render(info.as_ref(), screenshots.as_ref())).into_response()
}

/// `POST /api/action`: parse the action code and hand it to the executor
async fn handle_action(ctx: HandlerContext, req: Request) -> Response {
    let body = match to_bytes(req.into_body(), ctx.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Rejected action body: {}", e);
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };
    let body = String::from_utf8_lossy(&body);

    let request = match ActionRequest::parse(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!("Malformed action request {:?}: {}", body, e);
            return e.to_string().into_response();
        }
    };

    let Some(kind) = request.kind() else {
        info!("Ignoring unrecognized action code {}", request.code);
        return request.raw_value.into_response();
    };

    match platform::dispatch(ctx.executor.as_ref(), kind) {
        Ok(dispatched) => {
            info!("Host action {} dispatched", dispatched.kind);
            request.raw_value.into_response()
        }
        Err(e) => {
            error!("Host action {} could not be dispatched: {}", kind, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SyntheticDisplaySource;
    use crate::host::{ClientInfo, MemoryStats};
    use crate::platform::{ActionKind, Dispatched, MockActionExecutor};
    use axum::body::Body;

    struct FixedInfo;

    impl InfoCollector for FixedInfo {
        fn collect(&self) -> crate::Result<ClientInfo> {
            Ok(ClientInfo {
                hostname: "unit-host".to_string(),
                memory: MemoryStats::from_totals(2_000_000_000, 1_000_000_000)?,
            })
        }
    }

    fn context(executor: MockActionExecutor) -> HandlerContext {
        HandlerContext {
            executor: Arc::new(executor),
            displays: Arc::new(SyntheticDisplaySource::with_displays(1, 2, 2)),
            info: Arc::new(FixedInfo),
            capture_policy: CapturePolicy::Abort,
            max_body_bytes: 64,
        }
    }

    fn post(body: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri(ACTION_PATH)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_register_routes() {
        let mut table = RouteTable::new();
        register_routes(&mut table, context(MockActionExecutor::new()));

        assert_eq!(table.len(), 3);
        assert!(table.contains(&Method::GET, PING_PATH));
        assert!(table.contains(&Method::GET, DASHBOARD_PATH));
        assert!(table.contains(&Method::POST, ACTION_PATH));
    }

    #[tokio::test]
    async fn test_action_shutdown_dispatches_once() {
        let mut executor = MockActionExecutor::new();
        executor
            .expect_shutdown()
            .times(1)
            .returning(|| Ok(Dispatched { kind: ActionKind::Shutdown }));
        executor.expect_reboot().never();

        let response = handle_action(context(executor), post("t=1")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "1");
    }

    #[tokio::test]
    async fn test_action_unknown_code_is_echoed() {
        let mut executor = MockActionExecutor::new();
        executor.expect_reboot().never();
        executor.expect_shutdown().never();

        let response = handle_action(context(executor), post("t=7")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "7");
    }

    #[tokio::test]
    async fn test_action_dispatch_failure_is_500() {
        let mut executor = MockActionExecutor::new();
        executor
            .expect_reboot()
            .times(1)
            .returning(|| Err(AgentError::Dispatch("systemctl missing".to_string())));

        let response = handle_action(context(executor), post("t=0")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("systemctl missing"));
    }

    #[tokio::test]
    async fn test_action_body_too_large() {
        let mut executor = MockActionExecutor::new();
        executor.expect_reboot().never();

        let body = format!("t=0{}", " ".repeat(128));
        let response = handle_action(context(executor), post(&body)).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_dashboard_renders_info_and_screens() {
        let response = render_dashboard(context(MockActionExecutor::new())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let page = body_text(response).await;
        assert!(page.contains("Host: unit-host"));
        assert!(page.contains("Memory: 1.0GB/2.0GB"));
        assert_eq!(page.matches("<img ").count(), 1);
    }
}
