use crate::support::data;
use proptest::prelude::*;
use reactive_endpoints::hookenv::MemoryEnvironment;
use reactive_endpoints::{DataView, Endpoint, HookEnvironment};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

fn two_relation_env() -> Arc<MemoryEnvironment> {
    let env = Arc::new(MemoryEnvironment::new("local/0"));
    env.add_relation("endpoint", "endpoint:1");
    env.add_relation("endpoint", "endpoint:0");
    env.set_unit_data(
        "endpoint:1",
        "unit/1",
        data(&[("key0", "\"value0_1_1\""), ("key1", "\"value1_1_1\"")]),
    );
    env.set_unit_data(
        "endpoint:1",
        "unit/0",
        data(&[("key0", "\"value0_1_0\""), ("key1", "\"value1_1_0\"")]),
    );
    env.set_unit_data(
        "endpoint:0",
        "unit/1",
        data(&[("key0", "\"value0_0_1\""), ("key2", "\"value2_0_1\"")]),
    );
    env
}

fn endpoint(env: &Arc<MemoryEnvironment>) -> Endpoint {
    let ids = env.relation_ids("endpoint").unwrap();
    Endpoint::new(env.clone(), "endpoint", &ids)
}

#[test]
fn same_unit_resolves_to_one_instance_through_every_path() {
    let env = two_relation_env();
    let ep = endpoint(&env);

    let from_all = ep.all_units().unwrap().get_by_key("unit/1").unwrap().clone();
    let by_rel = ep
        .relations()
        .get_by_key("endpoint:0")
        .unwrap()
        .units()
        .unwrap()
        .get_by_key("unit/1")
        .unwrap()
        .clone();
    let by_index = ep.relations().get(0).unwrap().units().unwrap().get(0).unwrap().clone();

    assert!(Arc::ptr_eq(&from_all, &by_rel));
    assert!(Arc::ptr_eq(&by_rel, &by_index));
    assert_eq!(from_all.relation_id(), "endpoint:0");
}

#[test]
fn merged_data_across_relations() {
    let env = two_relation_env();
    let ep = endpoint(&env);
    let merged = ep.all_units().unwrap().received().unwrap();

    assert_eq!(merged.get("key0"), Some(json!("value0_0_1")));
    assert_eq!(merged.get("key1"), Some(json!("value1_1_0")));
    assert_eq!(merged.get("key2"), Some(json!("value2_0_1")));
}

#[test]
fn merged_data_per_relation() {
    let env = two_relation_env();
    let ep = endpoint(&env);

    let rel0 = ep.relations().get(0).unwrap().units().unwrap().received().unwrap();
    assert_eq!(rel0.get("key0"), Some(json!("value0_0_1")));
    assert_eq!(rel0.get("key1"), None);
    assert_eq!(rel0.get("key2"), Some(json!("value2_0_1")));

    let rel1 = ep.relations().get(1).unwrap().units().unwrap().received().unwrap();
    assert_eq!(rel1.get("key0"), Some(json!("value0_1_0")));
    assert_eq!(rel1.get("key1"), Some(json!("value1_1_0")));
    assert_eq!(rel1.get("key2"), None);

    let single = ep
        .relations()
        .get_by_key("endpoint:1")
        .unwrap()
        .units()
        .unwrap()
        .get_by_key("unit/1")
        .unwrap()
        .received()
        .unwrap()
        .get("key0");
    assert_eq!(single, Some(json!("value0_1_1")));
}

#[test]
fn lower_relation_wins_on_conflict() {
    let env = Arc::new(MemoryEnvironment::new("local/0"));
    env.add_relation("db", "db:1");
    env.add_relation("db", "db:2");
    env.set_unit_data("db:1", "u/0", data(&[("k0", "\"a\""), ("k1", "\"b\"")]));
    env.set_unit_data("db:2", "u2/0", data(&[("k0", "\"c\""), ("k2", "\"d\"")]));

    let ids = env.relation_ids("db").unwrap();
    let ep = Endpoint::new(env.clone(), "db", &ids);
    let merged = ep.all_units().unwrap().received().unwrap();
    assert_eq!(merged.get("k0"), Some(json!("a")));
    assert_eq!(merged.get("k1"), Some(json!("b")));
    assert_eq!(merged.get("k2"), Some(json!("d")));
}

#[test]
fn remote_data_fetched_once_per_unit() {
    let env = two_relation_env();
    let ep = endpoint(&env);

    ep.all_units().unwrap().received().unwrap();
    for relation in ep.relations() {
        for unit in relation.units().unwrap() {
            unit.received().unwrap();
            unit.received_raw().unwrap();
        }
        relation.units().unwrap().received().unwrap();
    }
    assert_eq!(env.relation_get_calls(), 3);
}

#[test]
fn missing_field_is_absent_not_null() {
    let env = Arc::new(MemoryEnvironment::new("local/0"));
    env.add_relation("db", "db:0");
    env.set_unit_data("db:0", "pg/0", data(&[("password", "null")]));
    let ids = env.relation_ids("db").unwrap();
    let ep = Endpoint::new(env.clone(), "db", &ids);
    let received = ep.all_units().unwrap().get(0).unwrap().received().unwrap();

    assert_eq!(received.get("password"), Some(serde_json::Value::Null));
    assert_eq!(received.get("host"), None);
    assert_eq!(received.get_or("host", json!("localhost")), json!("localhost"));
}

fn unit_data() -> impl Strategy<Value = BTreeMap<String, u8>> {
    prop::collection::btree_map("k[0-4]", any::<u8>(), 0..4)
}

proptest! {
    #[test]
    fn merged_value_comes_from_first_unit_in_order(
        layout in prop::collection::btree_map(
            (0u8..3, 0u8..3),
            unit_data(),
            1..6,
        )
    ) {
        let env = Arc::new(MemoryEnvironment::new("local/0"));
        for ((rel, unit), fields) in &layout {
            let rid = env.add_relation("ep", &format!("ep:{}", rel));
            let raw = fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect();
            env.set_unit_data(&rid, &format!("app/{}", unit), raw);
        }
        let ids = env.relation_ids("ep").unwrap();
        let ep = Endpoint::new(env.clone(), "ep", &ids);
        let merged = ep.all_units().unwrap().received().unwrap();

        // BTreeMap iteration order over (relation, unit) matches the view's
        // ordering since both ids are single digits.
        let mut expected: BTreeMap<String, u8> = BTreeMap::new();
        for fields in layout.values() {
            for (key, value) in fields {
                expected.entry(key.clone()).or_insert(*value);
            }
        }

        prop_assert_eq!(merged.keys().len(), expected.len());
        for (key, value) in expected {
            prop_assert_eq!(merged.get(&key), Some(json!(value)));
        }
    }
}
