use crate::support::{data, Unit};
use reactive_endpoints::{DataView, EndpointError, HookEnvironment};
use serde_json::json;

#[test]
fn modified_relations_publish_after_success() {
    let unit = Unit::new("app/0");
    let r0 = unit.env.add_relation("db", "db:0");
    let r1 = unit.env.add_relation("db", "db:1");
    let cache = unit.env.add_relation("cache", "cache:2");
    unit.env.set_local_data(&r0, data(&[("database", "\"app\"")]));

    unit.hook("db-relation-changed", &["db", "cache"], |registry| {
        let db = registry.lookup_by_name("db").unwrap().endpoint();
        db.relations()
            .get_by_key("db:1")?
            .to_publish()?
            .set("database", json!("reporting"))?;
        db.relations()
            .get_by_key("db:0")?
            .to_publish()?
            .set("extensions", json!({"pgcrypto": true, "citext": false}))?;

        // Read without writing: stays unpublished.
        let cache = registry.lookup_by_flag("endpoint.cache.joined").unwrap();
        let _publish = cache.endpoint().relations().get(0)?.to_publish()?;
        Ok(())
    })
    .unwrap();

    let writes = unit.env.writes();
    let ids: Vec<&str> = writes.iter().map(|(rid, _)| rid.as_str()).collect();
    assert_eq!(ids, vec![r0.as_str(), r1.as_str()]);
    assert_eq!(
        writes[0].1,
        data(&[
            ("database", "\"app\""),
            ("extensions", r#"{"citext": false, "pgcrypto": true}"#),
        ])
    );
    assert!(unit.env.relation_get("app/0", &cache).unwrap().is_empty());
}

#[test]
fn flushes_follow_endpoint_then_relation_order() {
    let unit = Unit::new("app/0");
    unit.env.add_relation("db", "db:1");
    unit.env.add_relation("db", "db:0");
    unit.env.add_relation("cache", "cache:2");

    // Written in the reverse of the expected publish order.
    unit.hook("update-status", &["db", "cache"], |registry| {
        let db = registry.lookup_by_name("db").unwrap().endpoint();
        for relation in db.relations().iter().rev() {
            relation.to_publish()?.set("ready", json!(true))?;
        }
        let cache = registry.lookup_by_name("cache").unwrap().endpoint();
        cache.relations().get(0)?.to_publish()?.set("ready", json!(true))?;
        Ok(())
    })
    .unwrap();

    let writes = unit.env.writes();
    let ids: Vec<&str> = writes.iter().map(|(rid, _)| rid.as_str()).collect();
    assert_eq!(ids, vec!["cache:2", "db:0", "db:1"]);
}

#[test]
fn failed_hook_publishes_nothing() {
    let unit = Unit::new("app/0");
    let rid = unit.env.add_relation("db", "db:0");

    let result = unit.hook("db-relation-changed", &["db"], |registry| {
        let db = registry.lookup_by_name("db").unwrap().endpoint();
        db.relations().get(0)?.to_publish()?.set("ready", json!(true))?;
        Err(EndpointError::Environment("handler failed".to_string()))
    });
    assert!(result.is_err());
    assert!(unit.env.writes().is_empty());
    assert!(unit.env.relation_get("app/0", &rid).unwrap().is_empty());

    // The next successful hook starts from the unmodified published data.
    unit.hook("db-relation-changed", &["db"], |registry| {
        let db = registry.lookup_by_name("db").unwrap().endpoint();
        let publish = db.relations().get(0)?.to_publish()?;
        assert_eq!(publish.get("ready"), None);
        assert!(!publish.modified());
        Ok(())
    })
    .unwrap();
    assert!(unit.env.writes().is_empty());
}

#[test]
fn remote_data_cannot_be_written() {
    let unit = Unit::new("app/0");
    let rid = unit.env.add_relation("db", "db:0");
    unit.env.set_unit_data(&rid, "postgres/0", data(&[("host", "\"a\"")]));

    let result = unit.hook("db-relation-changed", &["db"], |registry| {
        let db = registry.lookup_by_name("db").unwrap().endpoint();
        let unit = db.all_units()?.get(0)?.clone();
        let mut received = unit.received()?.clone();
        received.set("host", json!("b"))
    });
    assert!(matches!(result, Err(EndpointError::WriteNotPermitted(_))));
    assert!(unit.env.writes().is_empty());
}

#[test]
fn publish_round_trips_before_flush() {
    let unit = Unit::new("app/0");
    unit.env.add_relation("db", "db:0");

    unit.hook("db-relation-joined", &["db"], |registry| {
        let db = registry.lookup_by_name("db").unwrap().endpoint();
        let relation = db.relations().get(0)?;
        let value = json!({"replicas": [{"host": "a", "port": 1}], "primary": "a"});
        relation.to_publish()?.set("topology", value.clone())?;
        assert_eq!(relation.to_publish()?.get("topology"), Some(value));
        assert_eq!(
            relation.to_publish_raw()?.get("topology").as_deref(),
            Some(r#"{"primary": "a", "replicas": [{"host": "a", "port": 1}]}"#)
        );
        Ok(())
    })
    .unwrap();
    assert_eq!(unit.env.writes().len(), 1);
}
