use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use trailstore_core::{
    config::{ENV_INDEX_VISIBILITY, ENV_TABLE_PREFIX},
    mixin::{timestamp::modified_at, version::version},
    obs::metrics::{MetricsRecorder, TableCounters},
    prelude::*,
};

fn runs() -> Arc<RecordSchema> {
    RecordSchema::builder("runs")
        .partition_key("club_id", FieldKind::Text)
        .sort_key("run_id", FieldKind::Text)
        .field(FieldModel::required("title", FieldKind::Text))
        .field(FieldModel::optional("attendance", FieldKind::Int))
        .field(FieldModel::optional("tags", FieldKind::TextSet))
        .behavior(Timestamps)
        .behavior(Versioned)
        .behavior(Searchable::new("title", "searchable_title"))
        .build()
        .unwrap()
}

fn run(schema: &Arc<RecordSchema>, club: &str, id: &str, title: &str) -> Record {
    Record::new(
        schema,
        Some(club.into()),
        Some(id.into()),
        [("title", Value::from(title))],
    )
    .unwrap()
}

#[test]
fn full_lifecycle_against_the_memory_store() {
    let schema = runs();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2021, 6, 5, 10, 0, 0).unwrap(),
    ));
    let db = Db::new(Arc::new(MemoryAdapter::new())).with_clock(clock.clone());

    let mut record = run(&schema, "c1", "r0100", "Full Moon  Run");
    record.save(&db).unwrap();
    assert_eq!(version(&record), Some(0));

    clock.advance(Duration::minutes(5));
    record
        .add_update_action("attendance", "add", Some(12.into()))
        .unwrap();
    record
        .add_update_action("tags", "ADD", Some(Value::text_set(["wet", "dog-friendly"])))
        .unwrap();
    record
        .add_update_action("title", "set", Some("Blue Moon Run".into()))
        .unwrap();
    record.update(&db).unwrap();

    let stored = Record::load(&db, &schema, "c1", Some("r0100".into())).unwrap();
    assert_eq!(stored.get("attendance"), Some(&Value::Int(12)));
    assert_eq!(stored.get_text("searchable_title"), Some("bluemoonrun"));
    assert_eq!(version(&stored), Some(1));
    assert_eq!(modified_at(&stored), Some(db.now()));
    assert_eq!(stored, record);

    record
        .add_update_action("tags", "delete", Some(Value::text_set(["wet"])))
        .unwrap();
    record.add_update_action("attendance", "remove", None).unwrap();
    record.update(&db).unwrap();
    assert_eq!(record.get("tags"), Some(&Value::text_set(["dog-friendly"])));
    assert!(record.get("attendance").is_none());

    record.delete(&db).unwrap();
    assert!(!record.exists(&db).unwrap());
    let err = Record::load(&db, &schema, "c1", Some("r0100".into())).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn partition_query_orders_by_sort_key() {
    let schema = runs();
    let db = Db::new(Arc::new(MemoryAdapter::new()));
    for id in ["r0300", "r0100", "r0200"] {
        run(&schema, "c1", id, "Trail").save(&db).unwrap();
    }
    run(&schema, "c2", "r0150", "Trail").save(&db).unwrap();

    let ids: Vec<_> = db
        .query(&schema, &Value::from("c1"), None)
        .unwrap()
        .iter()
        .filter_map(|record| record.get_text("run_id").map(str::to_string))
        .collect();
    assert_eq!(ids, ["r0100", "r0200", "r0300"]);

    let range = KeyCondition::half_open(Some("r0150".into()), Some("r0300".into()));
    assert_eq!(db.query(&schema, &Value::from("c1"), Some(&range)).unwrap().len(), 1);

    let prefix = KeyCondition::BeginsWith("r01".to_string());
    assert_eq!(db.query(&schema, &Value::from("c2"), Some(&prefix)).unwrap().len(), 1);
}

#[test]
fn key_fields_are_never_updatable() {
    let schema = runs();
    let db = Db::new(Arc::new(MemoryAdapter::new()));
    let mut record = run(&schema, "c1", "r0100", "Trail");
    record.save(&db).unwrap();

    for field in ["club_id", "run_id"] {
        let err = record
            .add_update_action(field, "set", Some("other".into()))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.origin, ErrorOrigin::Action);
    }

    assert!(record.set("run_id", "r0200").is_err());
    assert!(record.update_actions().is_empty());
}

#[test]
fn conditional_writes_surface_condition_failed() {
    let schema = runs();
    let db = Db::new(Arc::new(MemoryAdapter::new()));
    let mut record = run(&schema, "c1", "r0100", "Trail");

    let create_only = Condition::not_exists("club_id");
    record.save_with(&db, Some(create_only.clone())).unwrap();

    let mut copy = run(&schema, "c1", "r0100", "Trail Again");
    let err = copy.save_with(&db, Some(create_only)).unwrap_err();
    assert!(err.is_condition_failed());
    assert!(!copy.is_persisted());

    let err = record
        .delete_with(&db, Some(Condition::eq("title", "Something Else")))
        .unwrap_err();
    assert!(err.is_condition_failed());
    assert!(record.exists(&db).unwrap());
}

#[test]
fn metrics_follow_lifecycle_calls() {
    let schema = runs();
    let recorder = Arc::new(MetricsRecorder::new());
    let db = Db::new(Arc::new(MemoryAdapter::new())).with_metrics_sink(recorder.clone());

    let mut record = run(&schema, "c1", "r0100", "Trail");
    record.save(&db).unwrap();
    record
        .add_update_action("attendance", "set", Some(3.into()))
        .unwrap();
    record.update(&db).unwrap();

    assert!(Record::load(&db, &schema, "c1", Some("missing".into())).is_err());
    let guard = Condition::eq("title", "nope");
    record
        .add_update_action("attendance", "add", Some(1.into()))
        .unwrap();
    assert!(record.update_with(&db, Some(guard)).is_err());
    db.query(&schema, &Value::from("c1"), None).unwrap();

    let counters = recorder.report().table("runs");
    assert_eq!(counters.saves, 1);
    assert_eq!(counters.updates, 1);
    // attendance + generated modified_at and version
    assert_eq!(counters.update_actions, 3);
    assert_eq!(counters.loads, 1);
    assert_eq!(counters.load_misses, 1);
    assert_eq!(counters.write_failures, 1);
    assert_eq!(counters.condition_failures, 1);
    assert_eq!(counters.queries, 1);
    assert_eq!(counters.rows_read, 1);

    recorder.reset();
    assert_eq!(recorder.report().table("runs"), TableCounters::default());
}

#[test]
fn config_prefix_selects_physical_tables() {
    let config = StoreConfig::from_toml_str(
        r#"
        [tables]
        prefix = "dev-"
        "#,
    )
    .unwrap();
    let (db, adapter) = Db::from_config(&config);
    let schema = runs();

    assert_eq!(db.table_ref(&schema).name, "dev-runs");
    run(&schema, "c1", "r0100", "Trail").save(&db).unwrap();
    assert_eq!(db.count(&schema).unwrap(), 1);

    let unprefixed = Db::new(adapter);
    assert_eq!(unprefixed.count(&schema).unwrap(), 0);
    assert!(Record::exists_by_key(&db, &schema, "c1", Some("r0100".into())).unwrap());
}

#[test]
fn overrides_configure_deferred_visibility() {
    let config = StoreConfig::default()
        .apply_overrides(|key| match key {
            ENV_TABLE_PREFIX => Some("test_".to_string()),
            ENV_INDEX_VISIBILITY => Some("Deferred".to_string()),
            _ => None,
        })
        .unwrap();
    let (db, adapter) = Db::from_config(&config);

    assert_eq!(db.table_prefix(), "test_");
    assert_eq!(adapter.visibility(), IndexVisibility::Deferred);

    let err: Error = StoreConfig::default()
        .apply_overrides(|key| (key == ENV_TABLE_PREFIX).then(|| "bad prefix!".to_string()))
        .unwrap_err()
        .into();
    assert!(err.is_validation());
    assert_eq!(err.origin, ErrorOrigin::Config);
}
