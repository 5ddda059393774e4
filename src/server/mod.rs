use crate::error::{Error, Result};
use crate::host::{ComponentSummary, ComponentWeights};
use crate::nodes::{self, CheckpointLoaderInputs, HfCheckpointLoader, NodeInfo};
use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
	Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
	node: Arc<HfCheckpointLoader<ComponentWeights>>,
	device_name: String,
}

impl AppState {
	pub fn new(node: HfCheckpointLoader<ComponentWeights>, device_name: String) -> Self {
		Self {
			node: Arc::new(node),
			device_name,
		}
	}
}

#[derive(Serialize)]
pub struct HealthResponse {
	pub status: String,
	pub device: String,
	pub nodes: usize,
}

#[derive(Deserialize)]
pub struct ExecuteRequest {
	pub node: String,
	pub inputs: CheckpointLoaderInputs,
}

#[derive(Serialize)]
pub struct OutputSummary {
	#[serde(rename = "type")]
	pub output_type: &'static str,
	#[serde(flatten)]
	pub component: ComponentSummary,
}

#[derive(Serialize)]
pub struct ExecuteResponse {
	pub node: String,
	pub outputs: Vec<OutputSummary>,
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = match self {
			Error::NodeNotFound(_) | Error::UnknownFolderCategory(_) => StatusCode::NOT_FOUND,
			Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
			Error::DownloadFailed { .. } | Error::Hub(_) => StatusCode::BAD_GATEWAY,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		};

		let body = Json(serde_json::json!({
			"error": self.to_string(),
		}));

		(status, body).into_response()
	}
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
	Json(HealthResponse {
		status: "ok".to_string(),
		device: state.device_name.clone(),
		nodes: nodes::NODE_CLASS_MAPPINGS.len(),
	})
}

async fn object_info_handler() -> Json<BTreeMap<&'static str, NodeInfo>> {
	Json(nodes::all_node_info().into_iter().map(|info| (info.name, info)).collect())
}

async fn node_info_handler(Path(key): Path<String>) -> Result<Json<NodeInfo>> {
	let class = nodes::node_class(&key).ok_or_else(|| Error::NodeNotFound(key.clone()))?;
	Ok(Json((class.info)()))
}

async fn execute_handler(
	State(state): State<AppState>,
	Json(payload): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>> {
	if payload.node != nodes::checkpoint::NODE_KEY {
		return Err(Error::NodeNotFound(payload.node));
	}

	let node = state.node.clone();
	let inputs = payload.inputs;
	// Fetching and parsing both block.
	let loaded = tokio::task::spawn_blocking(move || node.execute(&inputs))
		.await
		.map_err(|e| Error::Internal(format!("Node execution panicked: {}", e)))??;

	let outputs = nodes::checkpoint::RETURN_TYPES
		.into_iter()
		.zip([&loaded.model, &loaded.clip, &loaded.vae])
		.map(|(output_type, weights)| OutputSummary {
			output_type,
			component: weights.summary(),
		})
		.collect();

	Ok(Json(ExecuteResponse {
		node: payload.node,
		outputs,
	}))
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/api/health", get(health_handler))
		.route("/object_info", get(object_info_handler))
		.route("/object_info/{key}", get(node_info_handler))
		.route("/api/execute", post(execute_handler))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

pub async fn serve(host: &str, port: u16, state: AppState) -> Result<()> {
	let app = create_router(state);
	let addr = format!("{}:{}", host, port);

	tracing::info!("Starting server on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.map_err(|e| Error::Config(format!("Failed to bind to {}: {}", addr, e)))?;

	axum::serve(listener, app)
		.await
		.map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

	Ok(())
}
