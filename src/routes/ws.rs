//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::logic::{list_catalog, redirect_step_for};
use crate::protocol::{
  to_result_out, to_session_out, ClientWsMessage, ServerWsMessage,
};
use crate::state::{AppState, SessionError};

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "gezicht_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "gezicht_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target = "gezicht_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error {
            message: format!("Invalid JSON: {}", e),
            redirect_to: None,
          },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "gezicht_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "gezicht_backend", "WebSocket disconnected");
}

fn error_msg(err: SessionError) -> ServerWsMessage {
  let redirect_to = redirect_step_for(&err);
  ServerWsMessage::Error { message: err.to_string(), redirect_to }
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::ListCourses { access, duration, sort } => {
      let courses =
        list_catalog(state, access.as_deref(), duration.as_deref(), sort.as_deref()).await;
      tracing::info!(target: "catalog", count = courses.len(), "WS course listing served");
      ServerWsMessage::Courses { courses }
    }

    ClientWsMessage::StartSession { module_id, target } => {
      match state.start_session(&module_id, target).await {
        Ok(session) => {
          tracing::info!(target: "exercise", session_id = %session.id, %module_id, "WS attempt started");
          ServerWsMessage::Session { session: to_session_out(&session) }
        }
        Err(e) => error_msg(e),
      }
    }

    ClientWsMessage::SetSelection { session_id, region, component_id } => {
      match state.set_selection(&session_id, region, component_id).await {
        Ok(session) => ServerWsMessage::Session { session: to_session_out(&session) },
        Err(e) => error_msg(e),
      }
    }

    ClientWsMessage::ProceedToLineup { session_id } => {
      match state.proceed_to_lineup(&session_id).await {
        Ok(session) => {
          tracing::info!(target: "exercise", %session_id, "WS attempt moved to lineup");
          ServerWsMessage::Session { session: to_session_out(&session) }
        }
        Err(e) => error_msg(e),
      }
    }

    ClientWsMessage::SubmitPick { session_id, candidate_id } => {
      match state.submit_pick(&session_id, &candidate_id).await {
        Ok(result) => {
          tracing::info!(target: "exercise", %session_id, total_points = result.total_points, "WS pick verified");
          ServerWsMessage::Result { result: to_result_out(&result) }
        }
        Err(e) => error_msg(e),
      }
    }

    ClientWsMessage::GetResult { session_id } => match state.result(&session_id).await {
      Ok(result) => ServerWsMessage::Result { result: to_result_out(&result) },
      Err(e) => error_msg(e),
    },
  }
}
