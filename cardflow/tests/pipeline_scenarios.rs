//! Library-level scenarios over custom catalogs.
//!
//! Builds catalogs with the test-support helpers, persists them through the
//! workspace stores, and drives pipelines through the public API.

use std::sync::Arc;

use cardflow::core::catalog::Catalog;
use cardflow::core::field::{Condition, OptionsSource, OptionsTemplate, TemplateVar, Widget};
use cardflow::core::filters::{EvaluationRequest, FilterState, Interval};
use cardflow::core::output::OutputRule;
use cardflow::core::pipeline::Pipeline;
use cardflow::core::types::{CardId, ColumnDescriptor};
use cardflow::io::catalog_store::{load_catalog, write_catalog};
use cardflow::io::columns_store::{write_columns, write_filters};
use cardflow::session::Session;
use cardflow::submit::{SubmitOutcome, submit_session};
use cardflow::test_support::{TestWorkspace, card_type, field};
use cardflow::view::pipeline_view;
use serde_json::{Value, json};

/// `bin` splits one column into `count` buckets named after `name`;
/// `note` has no required fields at all.
fn custom_catalog() -> Catalog {
    let mut source = field("source", Widget::Select, Value::Null);
    source.options = Some(OptionsSource::Template(OptionsTemplate {
        var: TemplateVar::Names,
    }));
    let mode = {
        let mut mode = field("mode", Widget::Select, json!("auto"));
        mode.options = Some(OptionsSource::Fixed(vec![json!("auto"), json!("manual")]));
        mode
    };
    let mut count = field("count", Widget::Number, json!(2));
    count.bounds.max = Some(16.0);
    count.visible = Condition::when("mode", vec![json!("manual")]);
    count.required = count.visible.clone();

    let mut text = field("text", Widget::Text, json!(""));
    text.required = Condition::Never;

    Catalog::new(vec![
        card_type(
            "bin",
            vec![source, field("name", Widget::Text, json!("bin")), mode, count],
            OutputRule::new("name").with_number("count"),
        ),
        card_type("note", vec![text], OutputRule::new("text")),
    ])
}

fn names(columns: &[ColumnDescriptor]) -> Vec<&str> {
    columns.iter().map(|column| column.name.as_str()).collect()
}

#[test]
fn custom_catalog_survives_the_store() {
    let workspace = TestWorkspace::new().expect("workspace");
    write_catalog(&workspace.paths().catalog_path, &custom_catalog()).expect("write");
    let loaded = load_catalog(&workspace.paths().catalog_path).expect("load");
    assert_eq!(loaded, custom_catalog());
    assert_eq!(loaded.labels(), vec!["bin card", "note card"]);
}

#[test]
fn hidden_count_disables_expansion_until_shown() {
    let pipeline = Pipeline::new(
        Arc::new(custom_catalog()),
        vec![ColumnDescriptor::named("age")].into(),
    );
    let (p, bin) = pipeline.insert_card_after(None, "bin").expect("bin");
    let (p, note) = p.insert_card_after(Some(bin), "note").expect("note");

    // count is hidden in auto mode, so only the bare name is produced.
    assert_eq!(names(&p.available_columns(note)), vec!["age", "bin"]);

    let p = p.update_field(bin, "mode", json!("manual")).expect("mode");
    assert_eq!(
        names(&p.available_columns(note)),
        vec!["age", "bin_1", "bin_2"]
    );

    let p = p.update_field(bin, "count", json!("0")).expect("count");
    assert_eq!(names(&p.available_columns(note)), vec!["age"]);

    // Past the declared max the card blocks submission.
    let p = p.update_field(bin, "count", json!("17")).expect("count");
    let card = p.card(bin).expect("bin");
    assert!(!card.is_valid());
    assert_eq!(card.incomplete_fields(), vec!["source", "count"]);
}

#[test]
fn card_without_required_fields_is_valid_with_any_values() {
    let pipeline = Pipeline::new(Arc::new(custom_catalog()), Vec::<ColumnDescriptor>::new().into());
    let (p, note) = pipeline.insert_card_after(None, "note").expect("note");
    assert!(p.is_valid());
    let p = p.update_field(note, "text", json!(17)).expect("text");
    assert!(p.is_valid());
    // An invalid optional value is simply left out.
    assert_eq!(
        Value::Object(p.serialize().expect("ready").remove(0)),
        json!({"type": "note"})
    );
    let p = p.update_field(note, "text", json!("hello")).expect("text");
    assert_eq!(
        Value::Object(p.serialize().expect("ready").remove(0)),
        json!({"type": "note", "text": "hello"})
    );
}

#[test]
fn view_reflects_predicates_and_template_options() {
    let pipeline = Pipeline::new(
        Arc::new(custom_catalog()),
        vec![ColumnDescriptor::named("age")].into(),
    );
    let (p, first) = pipeline.insert_card_after(None, "bin").expect("first");
    let (p, _) = p.insert_card_after(Some(first), "bin").expect("second");
    let p = p.update_field(first, "source", json!("age")).expect("source");

    let view = pipeline_view(&p);
    let first_view = &view.cards[0];
    let source = &first_view.fields[0];
    assert_eq!(source.options, Some(vec![json!("age"), json!("bin")]));
    let count = &first_view.fields[3];
    assert!(!count.visible);
    assert!(first_view.valid);

    // The second card still needs a source.
    assert!(!view.cards[1].valid);
    assert!(!view.valid);
}

#[test]
fn session_submission_includes_filters() {
    let workspace = TestWorkspace::new().expect("workspace");
    let paths = workspace.paths();
    write_catalog(&paths.catalog_path, &custom_catalog()).expect("catalog");
    write_columns(&paths.columns_path, &[ColumnDescriptor::named("age")]).expect("columns");
    let mut filters = FilterState::default();
    filters
        .numerical
        .insert("age".to_string(), Some(Interval { min: 18.0, max: 65.0 }));
    filters
        .categorical
        .insert("region".to_string(), Some(vec![json!("north")]));
    write_filters(&paths.filters_path, &filters).expect("filters");

    let mut session = Session::open(workspace.root()).expect("open");
    let (pipeline, id) = session
        .pipeline()
        .insert_card_after_label(None, "bin card")
        .expect("insert");
    let pipeline = pipeline.update_field(id, "source", json!("age")).expect("source");
    session.replace_pipeline(pipeline);

    let out = workspace.root().join("request.json");
    let outcome = submit_session(&session, Some(&out)).expect("submit");
    let SubmitOutcome::Written { request, .. } = outcome else {
        panic!("expected written request");
    };
    assert_eq!(
        serde_json::to_value(&request).expect("value"),
        json!({
            "filters": [
                {"type": "interval", "colname": "age", "interval": {"min": 18.0, "max": 65.0}},
                {"type": "list", "colname": "region", "list": ["north"]}
            ],
            "cards": [{"type": "bin", "source": "age", "name": "bin", "mode": "auto"}]
        })
    );
    assert!(out.is_file());
    assert_eq!(
        EvaluationRequest::build(session.filters(), session.pipeline()).expect("ready"),
        request
    );
}

#[test]
fn stale_ids_are_rejected() {
    let pipeline = Pipeline::new(Arc::new(custom_catalog()), Vec::<ColumnDescriptor>::new().into());
    let (p, id) = pipeline.insert_card_after(None, "note").expect("note");
    let p = p.remove_card(id).expect("remove");
    assert!(p.update_field(id, "text", json!("x")).is_err());
    assert!(p.update_field(CardId(99), "text", json!("x")).is_err());
}
