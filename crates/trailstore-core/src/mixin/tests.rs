use crate::{
    db::{Db, clock::ManualClock, condition::Condition, memory::MemoryAdapter},
    mixin::{
        CREATED_AT, MODIFIED_AT, Searchable, Timestamps, VERSION, Versioned,
        timestamp::{created_at, modified_at},
        version::version,
    },
    model::{FieldKind, FieldModel},
    record::{Record, schema::RecordSchema},
    value::Value,
};
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

fn clubs() -> Arc<RecordSchema> {
    RecordSchema::builder("clubs")
        .partition_key("club_id", FieldKind::Text)
        .field(FieldModel::required("name", FieldKind::Text))
        .field(FieldModel::required("acronym", FieldKind::Text))
        .behavior(Timestamps)
        .behavior(Versioned)
        .behavior(Searchable::new("name", "searchable_name"))
        .behavior(Searchable::new("acronym", "searchable_acronym"))
        .build()
        .unwrap()
}

fn db_at_start() -> (Db, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2019, 3, 2, 14, 0, 0).unwrap(),
    ));
    let db = Db::new(Arc::new(MemoryAdapter::new())).with_clock(clock.clone());

    (db, clock)
}

fn club(schema: &Arc<RecordSchema>, name: &str, acronym: &str) -> Record {
    Record::new(
        schema,
        Some("c1".into()),
        None,
        [("name", Value::from(name)), ("acronym", Value::from(acronym))],
    )
    .unwrap()
}

#[test]
fn behaviors_concatenate_hook_lists_in_order() {
    let schema = clubs();
    let hooks = schema.hooks();

    assert_eq!(
        schema.behaviors(),
        ["timestamps", "versioned", "searchable", "searchable"]
    );
    assert_eq!(
        hooks.before_save_names(),
        vec![
            "set_timestamps",
            "set_version",
            "set_searchable_value",
            "set_searchable_value",
        ]
    );
    assert_eq!(
        hooks.on_update_names(),
        vec!["generate_timestamp_update_action", "generate_version_update_action"]
    );
    assert_eq!(hooks.on_init_names().len(), 2);

    let meta: Vec<_> = schema.meta_fields().collect();
    assert_eq!(
        meta,
        vec![
            CREATED_AT,
            MODIFIED_AT,
            VERSION,
            "searchable_name",
            "searchable_acronym"
        ]
    );
}

#[test]
fn mixin_redeclaring_a_field_is_rejected() {
    let err = RecordSchema::builder("clash")
        .partition_key("id", FieldKind::Text)
        .field(FieldModel::optional("version", FieldKind::Int))
        .behavior(Versioned)
        .build()
        .unwrap_err();

    assert!(err.is_validation());
    assert!(err.message.contains("'version'"));
}

#[test]
fn searchable_fields_are_derived_at_construction() {
    let schema = clubs();
    let record = club(&schema, "Cheesy  Grits", "C G H3");

    assert_eq!(record.get_text("searchable_name"), Some("cheesygrits"));
    assert_eq!(record.get_text("searchable_acronym"), Some("cgh3"));
    assert!(!record.attributes().contains_key("searchable_name"));
}

#[test]
fn searchable_source_missing_fails_at_construction() {
    let schema = clubs();
    let err = Record::new(
        &schema,
        Some("c1".into()),
        None,
        [("acronym", Value::from("X"))],
    )
    .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.origin, crate::error::ErrorOrigin::Hook);
}

#[test]
fn first_save_sets_version_zero_and_equal_timestamps() {
    let schema = clubs();
    let (db, _) = db_at_start();
    let mut record = club(&schema, "Cheesy Grits", "CGH3");
    record.save(&db).unwrap();

    assert_eq!(version(&record), Some(0));
    assert!(created_at(&record).is_some());
    assert_eq!(created_at(&record), modified_at(&record));
}

#[test]
fn resave_keeps_created_at_and_version() {
    let schema = clubs();
    let (db, clock) = db_at_start();
    let mut record = club(&schema, "Cheesy Grits", "CGH3");
    record.save(&db).unwrap();
    let created = created_at(&record);

    record
        .add_update_action("acronym", "set", Some("CG".into()))
        .unwrap();
    record.update(&db).unwrap();

    clock.advance(Duration::seconds(30));
    record.save(&db).unwrap();

    assert_eq!(created_at(&record), created);
    assert!(modified_at(&record) > created);
    assert_eq!(version(&record), Some(1));
}

#[test]
fn update_bumps_version_and_refreshes_modified_at() {
    let schema = clubs();
    let (db, clock) = db_at_start();
    let mut record = club(&schema, "Cheesy Grits", "CGH3");
    record.save(&db).unwrap();
    let created = created_at(&record);

    for expected in 1..=3 {
        let before = modified_at(&record);
        clock.advance(Duration::seconds(1));

        record
            .add_update_action("acronym", "set", Some(format!("CG{expected}").into()))
            .unwrap();
        record.update(&db).unwrap();

        assert_eq!(version(&record), Some(expected));
        assert!(modified_at(&record) > before);
        assert_eq!(created_at(&record), created);
    }
}

#[test]
fn update_of_source_regenerates_search_field() {
    let schema = clubs();
    let (db, clock) = db_at_start();
    let mut record = club(&schema, "Cheesy Grits", "CGH3");
    record.save(&db).unwrap();
    let saved_at = modified_at(&record).unwrap();
    let created = created_at(&record);

    clock.advance(Duration::seconds(1));
    record
        .add_update_action("name", "set", Some("Soggy  Biscuits".into()))
        .unwrap();
    assert_eq!(record.update_actions().len(), 2);
    record.update(&db).unwrap();

    // one source-only update drives all three behaviors
    assert_eq!(record.get_text("name"), Some("Soggy  Biscuits"));
    assert_eq!(record.get_text("searchable_name"), Some("soggybiscuits"));
    assert_eq!(record.get_text("searchable_acronym"), Some("cgh3"));
    assert_eq!(version(&record), Some(1));
    assert_eq!(modified_at(&record), Some(saved_at + Duration::seconds(1)));
    assert_eq!(created_at(&record), created);

    let stored = Record::load(&db, &schema, "c1", None).unwrap();
    assert_eq!(stored.get_text("searchable_name"), Some("soggybiscuits"));
    assert_eq!(version(&stored), Some(1));
    assert_eq!(modified_at(&stored), modified_at(&record));
}

#[test]
fn update_that_creates_a_record_starts_at_version_zero() {
    let schema = clubs();
    let (db, _) = db_at_start();
    let mut record = club(&schema, "Cheesy Grits", "CGH3");

    record
        .add_update_action("acronym", "set", Some("CG".into()))
        .unwrap();
    record.update(&db).unwrap();

    assert_eq!(version(&record), Some(0));
    assert!(created_at(&record).is_none());
    assert!(modified_at(&record).is_some());
}

#[test]
fn expected_version_guards_against_lost_updates() {
    let schema = clubs();
    let (db, _) = db_at_start();
    let mut record = club(&schema, "Cheesy Grits", "CGH3");
    record.save(&db).unwrap();

    let mut stale = Record::load(&db, &schema, "c1", None).unwrap();
    assert_eq!(Versioned::expected(&stale), Condition::eq(VERSION, 0));

    record
        .add_update_action("acronym", "set", Some("CG".into()))
        .unwrap();
    let guard = Versioned::expected(&record);
    record.update_with(&db, Some(guard)).unwrap();

    stale
        .add_update_action("acronym", "set", Some("XX".into()))
        .unwrap();
    let guard = Versioned::expected(&stale);
    let err = stale.update_with(&db, Some(guard)).unwrap_err();

    assert!(err.is_condition_failed());
    assert_eq!(stale.update_actions().len(), 2);

    stale.refresh(&db).unwrap();
    let guard = Versioned::expected(&stale);
    stale.update_with(&db, Some(guard)).unwrap();
    assert_eq!(version(&stale), Some(2));
    assert_eq!(stale.get_text("acronym"), Some("XX"));
}

#[test]
fn expected_version_of_unversioned_record_requires_absence() {
    let schema = clubs();
    let record = club(&schema, "Cheesy Grits", "CGH3");

    assert_eq!(
        Versioned::expected(&record),
        Condition::not_exists(VERSION)
    );
}
