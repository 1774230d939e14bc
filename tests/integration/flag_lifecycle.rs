use crate::support::{data, Unit};
use reactive_endpoints::FlagStore;

fn clear_changed(unit: &Unit) {
    for flag in unit.flags.flags() {
        if flag.starts_with("endpoint.db.changed") {
            unit.flags.clear_flag(&flag).unwrap();
        }
    }
}

#[test]
fn relation_lifecycle_drives_automatic_flags() {
    let unit = Unit::new("app/0");
    unit.env.add_relation_type("db");
    unit.hook("install", &["db"], |_| Ok(())).unwrap();
    assert!(unit.flags.flags().is_empty());

    let rid = unit.env.add_relation("db", "0");
    unit.env
        .set_unit_data(&rid, "postgres/0", data(&[("host", "\"10.0.0.5\""), ("port", "5432")]));
    unit.hook("db-relation-joined", &["db"], |_| Ok(())).unwrap();
    assert!(unit.flag("endpoint.db.joined"));
    assert!(unit.flag("endpoint.db.changed"));
    assert!(unit.flag("endpoint.db.changed.host"));
    assert!(unit.flag("endpoint.db.changed.port"));

    // Same data again: nothing new to report.
    clear_changed(&unit);
    unit.hook("db-relation-changed", &["db"], |_| Ok(())).unwrap();
    assert!(!unit.flag("endpoint.db.changed"));

    // Only the field that moved is flagged.
    unit.env
        .set_unit_data(&rid, "postgres/0", data(&[("host", "\"10.0.0.6\""), ("port", "5432")]));
    unit.hook("db-relation-changed", &["db"], |_| Ok(())).unwrap();
    assert!(unit.flag("endpoint.db.changed"));
    assert!(unit.flag("endpoint.db.changed.host"));
    assert!(!unit.flag("endpoint.db.changed.port"));

    unit.env.set_unit_data(&rid, "postgres/1", data(&[]));
    unit.hook("db-relation-departed", &["db"], |_| Ok(())).unwrap();
    assert!(unit.flag("endpoint.db.departed"));
    assert!(unit.flag("endpoint.db.joined"));

    unit.env.remove_relation(&rid);
    unit.hook("db-relation-broken", &["db"], |_| Ok(())).unwrap();
    assert!(!unit.flag("endpoint.db.joined"));
    assert!(unit.flag("endpoint.db.departed"));
}

#[test]
fn unrelated_hooks_skip_change_detection_once_joined() {
    let unit = Unit::new("app/0");
    let rid = unit.env.add_relation("db", "db:0");
    unit.env.set_unit_data(&rid, "postgres/0", data(&[("host", "\"a\"")]));
    unit.hook("db-relation-joined", &["db"], |_| Ok(())).unwrap();
    clear_changed(&unit);

    unit.env.set_unit_data(&rid, "postgres/0", data(&[("host", "\"b\"")]));
    let calls = unit.env.relation_get_calls();
    unit.hook("update-status", &["db"], |_| Ok(())).unwrap();
    assert!(!unit.flag("endpoint.db.changed"));
    assert_eq!(unit.env.relation_get_calls(), calls);

    // The change is still seen on the next relation hook.
    unit.hook("db-relation-changed", &["db"], |_| Ok(())).unwrap();
    assert!(unit.flag("endpoint.db.changed.host"));
}

#[test]
fn changes_are_tracked_per_relation_and_unit() {
    let unit = Unit::new("app/0");
    let r0 = unit.env.add_relation("db", "db:0");
    let r1 = unit.env.add_relation("db", "db:1");
    unit.env.set_unit_data(&r0, "postgres/0", data(&[("host", "\"a\"")]));
    unit.env.set_unit_data(&r1, "postgres/0", data(&[("host", "\"a\"")]));
    unit.hook("db-relation-changed", &["db"], |_| Ok(())).unwrap();
    clear_changed(&unit);

    unit.env.set_unit_data(&r1, "postgres/0", data(&[("host", "\"b\"")]));
    unit.hook("db-relation-changed", &["db"], |_| Ok(())).unwrap();
    assert!(unit.flag("endpoint.db.changed.host"));
    assert!(unit
        .changes
        .digest("endpoint.db.db:0.postgres/0.host")
        .is_some());
}

#[test]
fn unregistered_endpoints_get_no_flags() {
    let unit = Unit::new("app/0");
    let rid = unit.env.add_relation("website", "website:0");
    unit.env.set_unit_data(&rid, "haproxy/0", data(&[("port", "80")]));
    unit.hook("website-relation-joined", &["db"], |registry| {
        assert!(registry.lookup_by_name("website").is_none());
        Ok(())
    })
    .unwrap();
    assert!(unit.flags.flags().is_empty());
}
