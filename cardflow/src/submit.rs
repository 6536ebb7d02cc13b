//! Build and write evaluation requests for `cardflow submit`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::error::NotReady;
use crate::core::filters::EvaluationRequest;
use crate::io::submission::{next_request_path, write_request};
use crate::session::Session;

/// Structured submission outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Request written to `path`.
    Written {
        path: PathBuf,
        request: EvaluationRequest,
    },
    /// At least one card has incomplete required fields; nothing was written.
    NotReady(NotReady),
}

/// Build the request for the session's current state.
pub fn build_request(session: &Session) -> Result<EvaluationRequest, NotReady> {
    EvaluationRequest::build(session.filters(), session.pipeline())
}

/// Build the request and write it to `out`, or to the next numbered file in
/// the workspace's requests directory.
pub fn submit_session(session: &Session, out: Option<&Path>) -> Result<SubmitOutcome> {
    let request = match build_request(session) {
        Ok(request) => request,
        Err(not_ready) => {
            tracing::warn!(incomplete = not_ready.incomplete.len(), "pipeline not ready");
            return Ok(SubmitOutcome::NotReady(not_ready));
        }
    };
    let path = match out {
        Some(path) => path.to_path_buf(),
        None => next_request_path(&session.paths().requests_dir)?,
    };
    write_request(&path, &request, session.config().submit.pretty)?;
    Ok(SubmitOutcome::Written { path, request })
}

pub fn submit_from_root(root: &Path, out: Option<&Path>) -> Result<SubmitOutcome> {
    let session = Session::open(root)?;
    submit_session(&session, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ColumnDescriptor;
    use crate::io::columns_store::write_columns;
    use crate::test_support::TestWorkspace;
    use serde_json::json;

    #[test]
    fn incomplete_pipeline_writes_nothing() {
        let workspace = TestWorkspace::new().expect("workspace");
        workspace.add_card("split").expect("add");

        let outcome = submit_from_root(workspace.root(), None).expect("submit");
        let SubmitOutcome::NotReady(not_ready) = outcome else {
            panic!("expected not ready, got {outcome:?}");
        };
        assert_eq!(not_ready.incomplete[0].fields, vec!["method", "order_by"]);

        let requests = std::fs::read_dir(&workspace.paths().requests_dir)
            .expect("requests dir")
            .count();
        assert_eq!(requests, 0);
    }

    #[test]
    fn ready_pipeline_writes_numbered_request() {
        let workspace = TestWorkspace::new().expect("workspace");
        write_columns(
            &workspace.paths().columns_path,
            &[ColumnDescriptor::named("age")],
        )
        .expect("columns");
        let id = workspace.add_card("rescale").expect("add");
        workspace.set_field(id, "method", json!("zscore")).expect("method");
        workspace.set_field(id, "columns", json!(["age"])).expect("columns");

        let outcome = submit_from_root(workspace.root(), None).expect("submit");
        let SubmitOutcome::Written { path, request } = outcome else {
            panic!("expected a written request, got {outcome:?}");
        };
        assert_eq!(path, workspace.paths().requests_dir.join("request-0001.json"));
        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(on_disk, serde_json::to_value(&request).expect("value"));
        assert_eq!(on_disk["cards"][0]["suffix"], json!("rescaled"));
    }
}
