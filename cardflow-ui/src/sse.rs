//! Server-Sent Events stream and file watcher.

use std::convert::Infallible;
use std::path::Path;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use cardflow::io::init::CardflowPaths;
use futures::stream::Stream;
use notify::{Event as NotifyEvent, EventKind, PollWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::{AppState, ChangeEvent};

#[derive(Serialize)]
struct SsePayload<'a> {
    #[serde(rename = "type")]
    event_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a Path>,
}

impl<'a> From<&'a ChangeEvent> for SsePayload<'a> {
    fn from(event: &'a ChangeEvent) -> Self {
        let (event_type, path) = match event {
            ChangeEvent::PipelineChanged => ("pipeline_changed", None),
            ChangeEvent::InputsChanged => ("inputs_changed", None),
            ChangeEvent::PipelineSaved => ("pipeline_saved", None),
            ChangeEvent::RequestWritten { path } => ("request_written", Some(path.as_path())),
        };
        SsePayload { event_type, path }
    }
}

/// SSE endpoint handler.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_tx.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("{}"));

        loop {
            match rx.recv().await {
                Ok(change_event) => {
                    if let Ok(json) = serde_json::to_string(&SsePayload::from(&change_event)) {
                        yield Ok(Event::default().event("change").data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "SSE client lagged, some events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Start the file watcher in a background task.
pub fn start_file_watcher(state: AppState) {
    tokio::spawn(async move {
        if let Err(e) = run_file_watcher(state).await {
            warn!(error = %e, "file watcher failed");
        }
    });
}

async fn run_file_watcher(state: AppState) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<NotifyEvent>(100);

    let mut watcher = PollWatcher::new(
        move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.try_send(event);
            }
        },
        notify::Config::default().with_poll_interval(Duration::from_millis(100)),
    )?;

    let watch_dir = &state.paths.cardflow_dir;
    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;
    info!(path = %watch_dir.display(), "watching workspace directory");

    // Batch events so a loader rewriting both files triggers one reload.
    let mut pending_events: Vec<NotifyEvent> = Vec::new();
    let mut flush_tick = tokio::time::interval(Duration::from_millis(100));
    flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                pending_events.push(event);
            }
            _ = flush_tick.tick() => {
                if pending_events.is_empty() {
                    continue;
                }
                if inputs_touched(&state.paths, &pending_events) {
                    reload_inputs(&state).await;
                }
                pending_events.clear();
            }
        }
    }
}

/// Whether any create/modify event hit the base columns or filter files.
fn inputs_touched(paths: &CardflowPaths, events: &[NotifyEvent]) -> bool {
    events
        .iter()
        .filter(|event| matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)))
        .flat_map(|event| &event.paths)
        .any(|path| path == &paths.columns_path || path == &paths.filters_path)
}

/// Re-read columns and filters into the session and tell clients.
///
/// A half-written or malformed file leaves the previous inputs in place.
async fn reload_inputs(state: &AppState) {
    let result = state.session.write().await.reload_inputs();
    match result {
        Ok(()) => {
            debug!("broadcasting inputs change");
            state.notify(ChangeEvent::InputsChanged);
        }
        Err(err) => warn!(error = %format!("{err:#}"), "reload inputs failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardflow::core::types::ColumnDescriptor;
    use cardflow::io::columns_store::write_columns;
    use cardflow::io::init::{InitOptions, init_workspace};
    use std::path::PathBuf;

    fn modify_event(path: PathBuf) -> NotifyEvent {
        NotifyEvent {
            kind: EventKind::Modify(notify::event::ModifyKind::Any),
            paths: vec![path],
            attrs: Default::default(),
        }
    }

    #[test]
    fn only_input_files_trigger_a_reload() {
        let paths = CardflowPaths::new(Path::new("/project"));
        assert!(inputs_touched(
            &paths,
            &[modify_event(paths.columns_path.clone())]
        ));
        assert!(inputs_touched(
            &paths,
            &[modify_event(paths.filters_path.clone())]
        ));
        assert!(!inputs_touched(
            &paths,
            &[modify_event(paths.pipeline_path.clone())]
        ));

        let removed = NotifyEvent {
            kind: EventKind::Remove(notify::event::RemoveKind::File),
            paths: vec![paths.columns_path.clone()],
            attrs: Default::default(),
        };
        assert!(!inputs_touched(&paths, &[removed]));
    }

    #[test]
    fn payload_carries_request_path() {
        let event = ChangeEvent::RequestWritten {
            path: PathBuf::from("/p/.cardflow/requests/request-0001.json"),
        };
        let json = serde_json::to_value(SsePayload::from(&event)).expect("json");
        assert_eq!(
            json,
            serde_json::json!({
                "type": "request_written",
                "path": "/p/.cardflow/requests/request-0001.json"
            })
        );
        let json = serde_json::to_value(SsePayload::from(&ChangeEvent::InputsChanged))
            .expect("json");
        assert_eq!(json, serde_json::json!({"type": "inputs_changed"}));
    }

    #[tokio::test]
    async fn reload_updates_base_columns_and_notifies() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_workspace(temp.path(), &InitOptions { force: false }).expect("init");
        let state = AppState::open(temp.path()).expect("state");
        let mut rx = state.event_tx.subscribe();

        write_columns(
            &state.paths.columns_path,
            &[ColumnDescriptor::named("age")],
        )
        .expect("columns");
        reload_inputs(&state).await;

        assert_eq!(rx.try_recv().expect("event"), ChangeEvent::InputsChanged);
        let session = state.session.read().await;
        assert_eq!(
            session.pipeline().base_columns(),
            &[ColumnDescriptor::named("age")]
        );
    }

    #[tokio::test]
    async fn malformed_inputs_keep_previous_columns() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_workspace(temp.path(), &InitOptions { force: false }).expect("init");
        let state = AppState::open(temp.path()).expect("state");
        let mut rx = state.event_tx.subscribe();

        std::fs::write(&state.paths.columns_path, "{not json").expect("write");
        reload_inputs(&state).await;

        assert!(rx.try_recv().is_err());
        assert!(state.session.read().await.pipeline().base_columns().is_empty());
    }
}
