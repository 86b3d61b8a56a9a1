use std::sync::Arc;
use trailstore_core::prelude::*;

fn clubs() -> Arc<RecordSchema> {
    RecordSchema::builder("clubs")
        .partition_key("club_id", FieldKind::Text)
        .field(FieldModel::required("name", FieldKind::Text))
        .field(FieldModel::optional("owner", FieldKind::Text))
        .index(IndexModel::new("club_name_index", "searchable_name"))
        .behavior(Searchable::new("name", "searchable_name"))
        .constraint(UniqueConstraint::new("club_name_index").discriminated_by("owner"))
        .build()
        .unwrap()
}

fn places() -> Arc<RecordSchema> {
    RecordSchema::builder("places")
        .partition_key("place_id", FieldKind::Text)
        .field(FieldModel::required("name", FieldKind::Text))
        .field(FieldModel::required("geohash", FieldKind::Text))
        .index(IndexModel::new("place_proximity_index", "searchable_name").with_range("geohash"))
        .behavior(Searchable::new("name", "searchable_name"))
        .constraint(ProximityConstraint::new("place_proximity_index"))
        .build()
        .unwrap()
}

fn club(schema: &Arc<RecordSchema>, id: &str, name: &str, owner: Option<&str>) -> Record {
    let mut attrs = vec![("name", Value::from(name))];
    if let Some(owner) = owner {
        attrs.push(("owner", Value::from(owner)));
    }

    Record::new(schema, Some(id.into()), None, attrs).unwrap()
}

fn place(schema: &Arc<RecordSchema>, id: &str, name: &str, geohash: &str) -> Record {
    Record::new(
        schema,
        Some(id.into()),
        None,
        [("name", Value::from(name)), ("geohash", Value::from(geohash))],
    )
    .unwrap()
}

fn memory_db() -> Db {
    Db::new(Arc::new(MemoryAdapter::new()))
}

#[test]
fn unique_name_ignores_case_and_whitespace() {
    let schema = clubs();
    let db = memory_db();
    club(&schema, "c1", "Cheesy  Grits", None).save(&db).unwrap();

    let mut duplicate = club(&schema, "c2", "cheesy grits", None);
    let err = duplicate.save(&db).unwrap_err();

    assert!(err.is_already_exists());
    assert_eq!(err.origin, ErrorOrigin::Constraint);
    assert!(err.message.contains("club_name_index"));
    assert!(err.message.contains("c1"));
    assert!(!duplicate.exists(&db).unwrap());
    assert_eq!(db.count(&schema).unwrap(), 1);
}

#[test]
fn saving_the_same_record_twice_is_not_a_collision() {
    let schema = clubs();
    let db = memory_db();
    let mut record = club(&schema, "c1", "Cheesy Grits", None);

    record.save(&db).unwrap();
    record.save(&db).unwrap();

    let constraint = UniqueConstraint::new("club_name_index");
    assert!(!constraint.record_exists(&db, &record).unwrap());
    assert_eq!(
        constraint.matching_records(&db, &record, false).unwrap().len(),
        1
    );
}

#[test]
fn discriminator_lets_distinct_owners_share_a_name() {
    let schema = clubs();
    let db = memory_db();
    club(&schema, "c1", "Cheesy Grits", Some("u1")).save(&db).unwrap();

    club(&schema, "c2", "Cheesy Grits", Some("u2")).save(&db).unwrap();

    let err = club(&schema, "c3", "CHEESY GRITS", Some("u1"))
        .save(&db)
        .unwrap_err();
    assert!(err.is_already_exists());

    // present on one side only is not a match
    club(&schema, "c4", "Cheesy Grits", None).save(&db).unwrap();
    let err = club(&schema, "c5", "Cheesy Grits", None)
        .save(&db)
        .unwrap_err();
    assert!(err.is_already_exists());
}

#[test]
fn stale_index_lets_a_concurrent_duplicate_through() {
    let schema = clubs();
    let adapter = Arc::new(MemoryAdapter::with_visibility(IndexVisibility::Deferred));
    let db = Db::new(adapter.clone());

    club(&schema, "c1", "Cheesy Grits", None).save(&db).unwrap();
    club(&schema, "c2", "Cheesy Grits", None).save(&db).unwrap();
    assert_eq!(db.count(&schema).unwrap(), 2);

    adapter.publish_indexes().unwrap();
    let err = club(&schema, "c3", "Cheesy Grits", None)
        .save(&db)
        .unwrap_err();
    assert!(err.is_already_exists());
}

#[test]
fn failed_constraint_skips_the_write() {
    let schema = clubs();
    let db = memory_db();
    club(&schema, "c1", "Cheesy Grits", None).save(&db).unwrap();

    let mut renamed = club(&schema, "c1", "Soggy Biscuits", None);
    renamed.save(&db).unwrap();

    let mut clash = club(&schema, "c2", "Soggy Biscuits", None);
    assert!(clash.save(&db).is_err());
    assert!(!clash.is_persisted());

    let stored = Record::load(&db, &schema, "c1", None).unwrap();
    assert_eq!(stored.get_text("name"), Some("Soggy Biscuits"));
}

#[test]
fn unique_constraint_rejects_unknown_index_at_build() {
    let err = RecordSchema::builder("broken")
        .partition_key("id", FieldKind::Text)
        .field(FieldModel::required("name", FieldKind::Text))
        .constraint(UniqueConstraint::new("missing_index"))
        .build()
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.origin, ErrorOrigin::Schema);
}

#[test]
fn proximity_rejects_same_name_in_adjacent_cell() {
    let schema = places();
    let db = memory_db();
    place(&schema, "p1", "Bottle Tree", "dqcjqcp").save(&db).unwrap();

    let mut nearby = place(&schema, "p2", "bottle tree", "dqcjqcq");
    let constraint = ProximityConstraint::new("place_proximity_index");
    assert_eq!(constraint.count_nearby(&db, &nearby).unwrap(), 1);

    let err = nearby.save(&db).unwrap_err();
    assert!(err.is_already_exists());
    assert!(err.message.contains("p1"));
}

#[test]
fn proximity_allows_far_or_differently_named_places() {
    let schema = places();
    let db = memory_db();
    place(&schema, "p1", "Bottle Tree", "dqcjqcp").save(&db).unwrap();

    place(&schema, "p2", "Bottle Tree", "dqcjr00").save(&db).unwrap();
    place(&schema, "p3", "Other Tree", "dqcjqcq").save(&db).unwrap();

    let p1 = Record::load(&db, &schema, "p1", None).unwrap();
    let constraint = ProximityConstraint::new("place_proximity_index");
    assert!(constraint.nearby(&db, &p1).unwrap().is_empty());
}

#[test]
fn proximity_rejects_invalid_geohash() {
    let schema = places();
    let db = memory_db();

    let err = place(&schema, "p1", "Bottle Tree", "dqcjqca")
        .save(&db)
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.origin, ErrorOrigin::Geohash);
}

#[test]
fn proximity_needs_a_text_range_key() {
    let err = RecordSchema::builder("broken")
        .partition_key("id", FieldKind::Text)
        .field(FieldModel::required("name", FieldKind::Text))
        .index(IndexModel::new("name_index", "name"))
        .constraint(ProximityConstraint::new("name_index"))
        .build()
        .unwrap_err();

    assert!(err.is_validation());
    assert!(err.message.contains("geohash"));
}
