use std::sync::Arc;

use datarecord::data::Datastore;
use datarecord::filter::{
    Condition, Filter, FilterError, condition_and, condition_custom, condition_greater,
    condition_greater_equal, condition_in_filter, condition_is_set, condition_lesser,
    condition_lesser_equal, condition_like, condition_match, condition_not, condition_one_of,
    condition_or,
};
use datarecord::record::{
    Collection, CustomPredicate, FieldDefinition, FieldType, Record, RecordClass, Value,
};

// -----------------------------------------------------------------------------
// Fixtures
// -----------------------------------------------------------------------------

fn open(classes: Vec<RecordClass>) -> Arc<Datastore> {
    let mut store = Datastore::in_memory().unwrap();
    for class in classes {
        store.register_and_create(class).unwrap();
    }
    Arc::new(store)
}

fn insert(store: &Datastore, class: &str, values: &[(&str, Value)]) -> i64 {
    let class = store.class(class).unwrap();
    let mut record = Record::new(&class);
    for (field, value) in values {
        record.set(field, value.clone());
    }
    store.save(&mut record).unwrap()
}

fn filtered(store: &Arc<Datastore>, class: &str, condition: Condition) -> Filter {
    let mut filter = Filter::new(store, class).unwrap();
    filter.add_condition(condition);
    filter
}

fn all(store: &Arc<Datastore>, class: &str) -> Collection {
    Filter::new(store, class).unwrap().execute().unwrap()
}

fn names(records: &Collection) -> Vec<String> {
    records.iter().map(|r| r.get("name").to_string()).collect()
}

fn status() -> FieldType {
    FieldType::Enumeration {
        options: vec!["active".into(), "inactive".into()],
    }
}

fn contact_class() -> RecordClass {
    RecordClass::new("contact", "contacts")
        .with_field(FieldDefinition::new("name", FieldType::Text))
        .with_field(FieldDefinition::new("status", status()))
}

fn even_sql(column: &str, _: &Value) -> Option<String> {
    Some(format!("{} % 2 = 0", column))
}

fn is_even(value: &Value, _: &Value) -> bool {
    value.as_i64().is_some_and(|v| v % 2 == 0)
}

fn first_letter(record: &Record) -> Value {
    Value::from(record.get("name").to_string().chars().next().map(String::from))
}

fn person_class() -> RecordClass {
    RecordClass::new("person", "people")
        .with_field(FieldDefinition::new("name", FieldType::Text))
        .with_field(FieldDefinition::new("status", status()))
        .with_field(
            FieldDefinition::new("age", FieldType::Integer)
                .with_custom(CustomPredicate::new("even", Some(even_sql), is_even))
                .with_custom(CustomPredicate::new("even_manual", None, is_even)),
        )
        .with_field(FieldDefinition::new("nickname", FieldType::Text).in_metadata())
        .with_field(FieldDefinition::new(
            "team",
            FieldType::Reference {
                foreign_class: "team".into(),
            },
        ))
        .with_field(FieldDefinition::new(
            "tags",
            FieldType::ReferenceMulti {
                foreign_class: "tag".into(),
            },
        ))
        .with_field(
            FieldDefinition::new("position", FieldType::Float).with_subfields(&["lat", "lng"]),
        )
        .with_field(FieldDefinition::computed("initial", first_letter))
}

/// people, teams, tags and notes with a mix of NULLs
fn people() -> Arc<Datastore> {
    let store = open(vec![
        RecordClass::new("team", "teams").with_field(FieldDefinition::new("title", FieldType::Text)),
        RecordClass::new("tag", "tags").with_field(FieldDefinition::new("label", FieldType::Text)),
        person_class(),
        RecordClass::new("note", "notes")
            .with_field(FieldDefinition::new(
                "author",
                FieldType::Reference {
                    foreign_class: "person".into(),
                },
            ))
            .with_field(FieldDefinition::new("body", FieldType::Text)),
    ]);

    let core = insert(&store, "team", &[("title", "Core".into())]);
    let web = insert(&store, "team", &[("title", "Web".into())]);
    let red = insert(&store, "tag", &[("label", "red".into())]);
    let blue = insert(&store, "tag", &[("label", "blue".into())]);

    let rows: Vec<(&str, &str, Option<i64>, &str, Option<i64>, Vec<i64>)> = vec![
        ("Smith Ann", "active", Some(34), "annie", Some(core), vec![red]),
        ("Jones Bob", "active", Some(41), "bobby", Some(web), vec![red, blue]),
        ("Smith Cid", "inactive", Some(28), "", Some(core), vec![]),
        ("Dahl Dee", "active", None, "dee", None, vec![blue]),
        ("Ek Eva", "inactive", Some(52), "annie", Some(web), vec![]),
        ("Fox Fay", "active", Some(19), "fay", Some(core), vec![red]),
    ];
    for (name, status, age, nickname, team, tags) in rows {
        let mut values = vec![
            ("name", Value::from(name)),
            ("status", Value::from(status)),
            ("age", Value::from(age)),
            ("team", Value::from(team)),
            ("tags", Value::from(tags)),
            (
                "position",
                Value::from_json(&serde_json::json!({"lat": age.unwrap_or(0) as f64 / 2.0, "lng": 1.0})),
            ),
        ];
        if !nickname.is_empty() {
            values.push(("nickname", Value::from(nickname)));
        }
        insert(&store, "person", &values);
    }

    insert(&store, "note", &[("author", 1i64.into()), ("body", "ships the release".into())]);
    insert(&store, "note", &[("author", 5i64.into()), ("body", "release notes".into())]);
    insert(&store, "note", &[("author", 2i64.into()), ("body", "lunch".into())]);
    store
}

// -----------------------------------------------------------------------------
// Concrete scenarios
// -----------------------------------------------------------------------------

#[test]
fn match_with_limit_returns_first_matches_in_order() {
    let store = open(vec![contact_class()]);
    let seed = [
        ("A1", "active"),
        ("I1", "inactive"),
        ("A2", "active"),
        ("A3", "active"),
        ("I2", "inactive"),
        ("A4", "active"),
        ("I3", "inactive"),
        ("A5", "active"),
    ];
    for (name, status) in seed {
        insert(&store, "contact", &[("name", name.into()), ("status", status.into())]);
    }

    let mut filter = filtered(&store, "contact", condition_match("status", "active"));
    filter.set_result_limit(2).set_result_start(0);
    assert_eq!(names(&filter.execute().unwrap()), vec!["A1", "A2"]);
}

#[test]
fn empty_one_of_selects_nothing() {
    let store = open(vec![contact_class()]);
    insert(&store, "contact", &[("name", "A".into()), ("status", "active".into())]);

    let filter = filtered(&store, "contact", condition_one_of::<i64>("id", vec![]));
    assert_eq!(filter.get_sql_where(), "FALSE");
    assert!(filter.execute().unwrap().is_empty());
    assert_eq!(filter.execute_and_count().unwrap(), 0);
    for record in &all(&store, "contact") {
        assert!(!filter.matches(record).unwrap());
    }
}

#[test]
fn and_of_match_and_like_is_case_insensitive() {
    let store = open(vec![contact_class()]);
    for (name, status) in [("Smith A", "active"), ("Jones B", "active"), ("Smith C", "inactive")] {
        insert(&store, "contact", &[("name", name.into()), ("status", status.into())]);
    }

    let filter = filtered(
        &store,
        "contact",
        condition_and(condition_match("status", "active"), condition_like("name", "smith")),
    );
    assert_eq!(filter.execute().unwrap().ids(), vec![1]);
}

#[test]
fn in_filter_class_mismatch_is_a_validation_error() {
    let store = people();
    let tags = Filter::new(&store, "tag").unwrap();
    let mut filter = filtered(&store, "person", condition_in_filter("team", tags));

    assert!(!filter.is_valid());
    assert!(
        filter.get_errors()[0].contains("references 'team' but the sub-filter selects 'tag'"),
        "{:?}",
        filter.get_errors()
    );
    assert!(matches!(filter.execute(), Err(FilterError::Invalid(_))));
}

#[test]
fn metadata_match_falls_back_to_manual_filtering() {
    let store = people();
    let filter = filtered(&store, "person", condition_match("nickname", "annie"));

    let condition = filter.base_condition().unwrap();
    assert!(condition.no_sql());
    assert_eq!(condition.to_sql_fragment(), "TRUE");
    assert!(filter.filter_after_sql());
    assert_eq!(filter.execute().unwrap().ids(), vec![1, 5]);
}

// -----------------------------------------------------------------------------
// Reconciliation loop
// -----------------------------------------------------------------------------

#[test]
fn pagination_follows_the_logical_order_under_manual_filtering() {
    let store = open(vec![person_class()]);
    for i in 0..40i64 {
        let nickname = if (i * 7) % 3 == 0 || i % 5 == 0 { "keep" } else { "drop" };
        insert(
            &store,
            "person",
            &[("name", format!("p{}", i).into()), ("nickname", nickname.into())],
        );
    }

    let expected: Vec<i64> = all(&store, "person")
        .iter()
        .filter(|r| r.get("nickname").as_str() == Some("keep"))
        .filter_map(Record::id)
        .collect();
    let total = expected.len();
    assert!(total > 10 && total < 40);

    for start in 0..total {
        for limit in [1, 3, 7] {
            let mut filter = filtered(&store, "person", condition_match("nickname", "keep"));
            filter.set_result_start(start).set_result_limit(limit);
            let end = (start + limit).min(total);
            assert_eq!(
                filter.execute().unwrap().ids(),
                expected[start..end].to_vec(),
                "start={} limit={}",
                start,
                limit
            );
        }
    }
}

#[test]
fn window_grows_past_sparse_matches() {
    let store = open(vec![person_class()]);
    for i in 1..=1500i64 {
        let nickname = if i > 1490 { "rare" } else { "common" };
        insert(
            &store,
            "person",
            &[("id", i.into()), ("name", format!("p{}", i).into()), ("nickname", nickname.into())],
        );
    }

    let mut filter = filtered(&store, "person", condition_match("nickname", "rare"));
    filter.set_result_limit(3).set_result_start(2);
    let result = filter.execute().unwrap();
    assert_eq!(result.ids(), vec![1493, 1494, 1495]);
    assert!(!result.is_truncated());
}

#[test]
fn execute_is_idempotent_and_leaves_window_untouched() {
    let store = people();
    let mut filter = filtered(&store, "person", condition_match("nickname", "annie"));
    filter
        .add_condition_or(condition_match("status", "active"))
        .set_result_start(1)
        .set_result_limit(3);

    let first = filter.execute().unwrap();
    let second = filter.execute().unwrap();
    assert_eq!(first.ids(), second.ids());
    assert_eq!(first.len(), 3);
    assert_eq!(filter.result_start(), 1);
    assert_eq!(filter.result_limit(), Some(3));
}

#[test]
fn scan_limit_truncates_and_flags_the_result() {
    let store = open(vec![person_class()]);
    for i in 0..30i64 {
        insert(&store, "person", &[("name", format!("p{}", i).into()), ("nickname", "x".into())]);
    }

    let mut filter = filtered(&store, "person", condition_match("nickname", "never"));
    filter.set_result_limit(5).set_max_scan_rows(Some(12));
    let result = filter.execute().unwrap();
    assert!(result.is_empty());
    assert!(result.is_truncated());

    filter.set_max_scan_rows(None);
    let result = filter.execute().unwrap();
    assert!(result.is_empty());
    assert!(!result.is_truncated());
}

#[test]
fn scan_limit_equal_to_row_count_is_not_truncation() {
    let store = open(vec![person_class()]);
    for i in 0..12i64 {
        insert(&store, "person", &[("name", format!("p{}", i).into()), ("nickname", "x".into())]);
    }

    let mut filter = filtered(&store, "person", condition_match("nickname", "x"));
    filter.set_max_scan_rows(Some(12));
    let result = filter.execute().unwrap();
    assert_eq!(result.len(), 12);
    assert!(!result.is_truncated());
    assert_eq!(filter.execute_and_count().unwrap(), 12);

    filter.set_result_limit(5);
    let result = filter.execute().unwrap();
    assert_eq!(result.len(), 5);
    assert!(!result.is_truncated());

    filter.set_result_limit(0).set_max_scan_rows(Some(11));
    assert!(filter.execute().unwrap().is_truncated());
}

#[test]
fn count_reports_scan_limit_instead_of_a_partial_total() {
    let store = open(vec![person_class()]);
    for i in 0..20i64 {
        insert(&store, "person", &[("name", format!("p{}", i).into()), ("nickname", "x".into())]);
    }

    let mut filter = filtered(&store, "person", condition_match("nickname", "x"));
    filter.set_max_scan_rows(Some(5));
    assert!(matches!(
        filter.execute_and_count(),
        Err(FilterError::Truncated { counted: 5 })
    ));

    filter.set_max_scan_rows(None);
    assert_eq!(filter.execute_and_count().unwrap(), 20);
}

/// 20 red labels and one item per label
fn labelled_items() -> Arc<Datastore> {
    let store = open(vec![
        RecordClass::new("label", "labels")
            .with_field(FieldDefinition::new("color", FieldType::Text).in_metadata()),
        RecordClass::new("item", "items").with_field(FieldDefinition::new(
            "label",
            FieldType::Reference {
                foreign_class: "label".into(),
            },
        )),
    ]);
    for _ in 0..20 {
        let label = insert(&store, "label", &[("color", "red".into())]);
        insert(&store, "item", &[("label", label.into())]);
    }
    store
}

fn red_labels(store: &Arc<Datastore>, max_scan_rows: Option<usize>) -> Filter {
    let mut filter = filtered(store, "label", condition_match("color", "red"));
    filter.set_max_scan_rows(max_scan_rows);
    filter
}

#[test]
fn truncated_sub_filter_marks_the_outer_result() {
    let store = labelled_items();

    let capped = filtered(
        &store,
        "item",
        condition_in_filter("label", red_labels(&store, Some(5))),
    );
    assert!(capped.filter_after_sql());
    let result = capped.execute().unwrap();
    assert_eq!(result.len(), 5);
    assert!(result.is_truncated());
    assert!(matches!(
        capped.execute_and_count(),
        Err(FilterError::Truncated { counted: 5 })
    ));

    let full = filtered(
        &store,
        "item",
        condition_in_filter("label", red_labels(&store, None)),
    );
    let result = full.execute().unwrap();
    assert_eq!(result.len(), 20);
    assert!(!result.is_truncated());
    assert_eq!(full.execute_and_count().unwrap(), 20);
}

#[test]
fn huge_result_window_yields_nothing() {
    let store = people();
    for condition in [r#"{"type": "Match", "fieldname": "nickname", "value": "x"}"#, "null"] {
        let json = format!(
            r#"{{"base_class": "person", "base_condition": {}, "start_at_result": 18446744073709551615, "limit_results": 5}}"#,
            condition
        );
        let filter = Filter::from_json(&store, &json).unwrap();
        assert!(filter.execute().unwrap().is_empty());
    }
}

#[test]
fn access_check_applies_to_the_logical_window() {
    let mut store = Datastore::in_memory().unwrap();
    store
        .register_and_create(
            contact_class().with_access(|r| r.get("status").as_str() == Some("active")),
        )
        .unwrap();
    let store = Arc::new(store);
    for (name, status) in [("a", "active"), ("b", "inactive"), ("c", "active"), ("d", "active")] {
        insert(&store, "contact", &[("name", name.into()), ("status", status.into())]);
    }

    let mut filter = Filter::new(&store, "contact").unwrap();
    assert_eq!(filter.execute().unwrap().len(), 4);

    filter
        .set_perform_access_check(true)
        .set_result_start(1)
        .set_result_limit(2);
    assert_eq!(names(&filter.execute().unwrap()), vec!["c", "d"]);
    assert_eq!(filter.execute_and_count().unwrap(), 3);
}

// -----------------------------------------------------------------------------
// Equivalence and algebra
// -----------------------------------------------------------------------------

fn leaf_conditions() -> Vec<Condition> {
    vec![
        condition_match("status", "active"),
        condition_match("age", "41"),
        condition_match("age", Value::Null),
        condition_match("team", 1),
        condition_match("tags", 2),
        condition_like("name", "SMITH"),
        condition_like("age", "4"),
        condition_greater("age", 30),
        condition_greater_equal("age", 34),
        condition_lesser("age", 34),
        condition_lesser_equal("name", "Fox"),
        condition_one_of("status", vec!["inactive", "archived"]),
        condition_one_of("tags", vec![1]),
        condition_is_set("age"),
        condition_is_set("tags"),
        condition_is_set("team"),
        condition_custom("age", "even", Value::Null),
        condition_match("age", "not a number"),
        condition_match("age", 1e20),
        condition_match("tags", Value::Null),
        condition_one_of("tags", vec![Value::Null, Value::from(2)]),
    ]
}

#[test]
fn null_operand_on_multi_reference_selects_untagged_records() {
    let store = people();
    let filter = filtered(&store, "person", condition_match("tags", Value::Null));
    assert_eq!(filter.execute().unwrap().ids(), vec![3, 5]);
    for record in &all(&store, "person") {
        assert_eq!(
            filter.matches(record).unwrap(),
            [3, 5].contains(&record.id().unwrap())
        );
    }

    let filter = filtered(&store, "person", condition_not(condition_match("tags", Value::Null)));
    assert_eq!(filter.execute().unwrap().ids(), vec![1, 2, 4, 6]);
}

#[test]
fn sql_and_manual_matching_agree() {
    let store = people();
    let records = all(&store, "person");
    assert_eq!(records.len(), 6);

    let mut conditions = leaf_conditions();
    conditions.extend(leaf_conditions().into_iter().map(condition_not));
    for condition in conditions {
        let filter = filtered(&store, "person", condition);
        assert!(!filter.filter_after_sql(), "{}", filter.get_sql_where());

        let by_sql = filter.execute().unwrap().ids();
        let by_hand: Vec<i64> = records
            .iter()
            .filter(|r| filter.matches(r).unwrap())
            .filter_map(Record::id)
            .collect();
        assert_eq!(by_sql, by_hand, "{}", filter.get_sql_where());
    }
}

#[test]
fn composition_follows_boolean_algebra() {
    let store = people();
    let records = all(&store, "person");
    let pool = vec![
        condition_match("status", "active"),
        condition_match("nickname", "annie"),
        condition_greater("age", 30),
        condition_is_set("nickname"),
        condition_match("initial", "S"),
    ];

    let check = |condition: Condition, record: &Record| {
        filtered(&store, "person", condition)
            .matches(record)
            .unwrap()
    };

    for a in &pool {
        for b in &pool {
            for record in &records {
                let left = check(a.clone(), record);
                let right = check(b.clone(), record);
                assert_eq!(check(condition_and(a.clone(), b.clone()), record), left && right);
                assert_eq!(check(condition_or(a.clone(), b.clone()), record), left || right);
            }
        }
        for record in &records {
            assert_eq!(check(condition_not(a.clone()), record), !check(a.clone(), record));
        }
    }
}

#[test]
fn mixed_trees_execute_like_manual_evaluation() {
    let store = people();
    let records = all(&store, "person");
    let trees = vec![
        condition_and(condition_match("status", "active"), condition_match("nickname", "annie")),
        condition_or(condition_greater("age", 40), condition_match("nickname", "dee")),
        condition_not(condition_or(condition_match("nickname", "fay"), condition_like("name", "jones"))),
        condition_and(
            condition_not(condition_match("status", "inactive")),
            condition_custom("age", "even_manual", Value::Null),
        ),
        condition_match("initial", "S"),
        condition_match("position", Value::from_json(&serde_json::json!({"lat": 17.0, "lng": 1.0}))),
        condition_like("position", "20.5"),
    ];

    for tree in trees {
        let filter = filtered(&store, "person", tree);
        assert!(filter.filter_after_sql());
        let expected: Vec<i64> = records
            .iter()
            .filter(|r| filter.matches(r).unwrap())
            .filter_map(Record::id)
            .collect();
        assert!(!expected.is_empty() && expected.len() < records.len(), "{:?}", expected);
        assert_eq!(filter.execute().unwrap().ids(), expected);
        assert_eq!(filter.execute_and_count().unwrap(), expected.len());
    }
}

// -----------------------------------------------------------------------------
// InFilter
// -----------------------------------------------------------------------------

#[test]
fn in_filter_on_reference_compiles_to_subquery() {
    let store = people();
    let mut teams = Filter::new(&store, "team").unwrap();
    teams.add_condition(condition_match("title", "Core"));
    let filter = filtered(&store, "person", condition_in_filter("team", teams));

    assert_eq!(
        filter.get_sql_where(),
        "team IN (SELECT DISTINCT id FROM teams WHERE title = 'Core')"
    );
    assert_eq!(filter.execute().unwrap().ids(), vec![1, 3, 6]);
    for record in &all(&store, "person") {
        assert_eq!(filter.matches(record).unwrap(), [1, 3, 6].contains(&record.id().unwrap()));
    }
}

#[test]
fn in_filter_on_primary_key_uses_back_reference() {
    let store = people();
    let mut notes = Filter::new(&store, "note").unwrap();
    notes.add_condition(condition_like("body", "release"));
    let filter = filtered(&store, "person", condition_in_filter("id", notes));

    assert_eq!(
        filter.get_sql_where(),
        r"id IN (SELECT DISTINCT author FROM notes WHERE body ILIKE '%release%' ESCAPE '\')"
    );
    assert_eq!(filter.execute().unwrap().ids(), vec![1, 5]);
}

#[test]
fn in_filter_on_multi_reference_is_manual() {
    let store = people();
    let mut tags = Filter::new(&store, "tag").unwrap();
    tags.add_condition(condition_match("label", "blue"));
    let filter = filtered(&store, "person", condition_in_filter("tags", tags));

    assert!(filter.filter_after_sql());
    assert_eq!(filter.get_sql_where(), "TRUE");
    assert_eq!(filter.execute().unwrap().ids(), vec![2, 4]);
}

#[test]
fn in_filter_with_manual_sub_filter_is_manual() {
    let store = people();
    let mut authors = Filter::new(&store, "person").unwrap();
    authors.add_condition(condition_match("nickname", "annie"));
    let filter = filtered(&store, "note", condition_in_filter("author", authors));

    assert!(filter.filter_after_sql());
    assert_eq!(filter.execute().unwrap().ids(), vec![1, 2]);
    assert_eq!(
        filter
            .execute()
            .unwrap()
            .iter()
            .map(|r| r.get("body").to_string())
            .collect::<Vec<_>>(),
        vec!["ships the release", "release notes"]
    );
}

#[test]
fn deeply_nested_in_filters_are_rejected() {
    let store = open(vec![RecordClass::new("node", "nodes").with_field(FieldDefinition::new(
        "parent",
        FieldType::Reference {
            foreign_class: "node".into(),
        },
    ))]);

    let mut inner = Filter::new(&store, "node").unwrap();
    for _ in 0..10 {
        let mut outer = Filter::new(&store, "node").unwrap();
        outer.add_condition(condition_in_filter("parent", inner));
        inner = outer;
    }
    assert!(!inner.is_valid());
    assert!(inner.get_errors().iter().any(|e| e.contains("nested deeper than 8 levels")));
}

// -----------------------------------------------------------------------------
// Other operations
// -----------------------------------------------------------------------------

#[test]
fn get_first_returns_an_empty_sentinel() {
    let store = people();
    let found = filtered(&store, "person", condition_like("name", "dahl"))
        .execute_and_get_first()
        .unwrap();
    assert_eq!(found.id(), Some(4));
    assert!(!found.is_empty());

    let missing = filtered(&store, "person", condition_like("name", "nobody"))
        .execute_and_get_first()
        .unwrap();
    assert!(missing.is_empty());
    assert_eq!(missing.class().name, "person");
}

#[test]
fn record_operands_resolve_to_primary_keys() {
    let store = people();
    let core = filtered(&store, "team", condition_match("title", "Core"))
        .execute_and_get_first()
        .unwrap();
    let filter = filtered(&store, "person", condition_match("team", &core));
    assert_eq!(filter.get_sql_where(), "team = 1");
    assert_eq!(filter.execute().unwrap().len(), 3);
}

#[test]
fn sort_orders_by_field_then_primary_key() {
    let store = people();
    let mut filter = Filter::new(&store, "person").unwrap();
    filter.set_order_column("status", false);
    assert_eq!(filter.execute().unwrap().ids(), vec![3, 5, 1, 2, 4, 6]);

    filter.set_order_column("age", true);
    assert_eq!(filter.execute().unwrap().ids(), vec![6, 3, 1, 2, 5, 4]);
}

#[test]
fn delete_removes_matching_records() {
    let store = people();
    let filter = filtered(&store, "person", condition_match("nickname", "annie"));
    assert_eq!(filter.delete().unwrap(), 2);
    assert!(filter.execute().unwrap().is_empty());
    assert_eq!(all(&store, "person").len(), 4);
}

#[test]
fn unsupported_predicates_are_reported_together() {
    let store = people();
    let mut filter = Filter::new(&store, "person").unwrap();
    filter
        .add_condition(condition_greater("tags", 1))
        .add_condition(condition_custom("age", "odd", Value::Null))
        .add_condition(condition_is_set("ghost"));
    assert!(!filter.is_valid());
    assert_eq!(filter.get_errors().len(), 3, "{:?}", filter.get_errors());
}
