use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use prefstore::{
    BindContext, Error, FieldDecl, HostSchema, InMemoryStore, JsonFileStore, Primitive,
    PrimitiveKind,
};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
struct Theme {
    name: String,
    accent: (u8, u8, u8),
    dark: bool,
}

fn counter_schema() -> HostSchema {
    HostSchema::new("Counters")
        .field(FieldDecl::int("intFoo1"))
        .field(FieldDecl::int("intFoo2").default_value(0).tag("abs"))
}

#[test]
fn tagged_counter_notifies_only_on_real_changes() {
    let context = BindContext::new(InMemoryStore::new());
    let prefs = context.bind(&counter_schema()).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    prefs.subscribe("abs", move |notice| {
        s.lock().unwrap().push(*notice.value::<i32>().unwrap());
        Ok(())
    });

    // Unread optional field: absent sentinel, no error through try_get.
    assert_eq!(prefs.try_get::<i32>("intFoo1").unwrap(), None);
    assert!(matches!(
        prefs.get::<i32>("intFoo1").unwrap_err(),
        Error::UnsetField { .. }
    ));

    // Writing the default onto the untouched key changes nothing.
    let outcome = prefs.set("intFoo2", 0).unwrap();
    assert!(!outcome.changed);
    assert!(seen.lock().unwrap().is_empty());

    // A real change notifies exactly once, with the new value.
    let outcome = prefs.set("intFoo2", 7).unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.notified(), 1);
    assert_eq!(*seen.lock().unwrap(), vec![7]);
    assert_eq!(prefs.get::<i32>("intFoo2").unwrap(), 7);
}

#[test]
fn fan_out_survives_a_failing_subscriber() {
    let context = BindContext::new(InMemoryStore::new());
    let prefs = context.bind(&counter_schema()).unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));

    let o = Arc::clone(&order);
    prefs.subscribe("abs", move |_| {
        o.lock().unwrap().push("first");
        Ok(())
    });
    let o = Arc::clone(&order);
    prefs.subscribe("abs", move |_| {
        o.lock().unwrap().push("second");
        Err("second subscriber broke".into())
    });
    let o = Arc::clone(&order);
    prefs.subscribe("abs", move |_| {
        o.lock().unwrap().push("third");
        Ok(())
    });

    let outcome = prefs.set("intFoo2", 7).unwrap();
    assert_eq!(outcome.notified(), 3);
    assert_eq!(outcome.failures().len(), 1);
    assert!(outcome.failures()[0]
        .error
        .to_string()
        .contains("second subscriber broke"));
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn custom_transform_roundtrips_structurally() {
    let context = BindContext::new(InMemoryStore::new());
    prefstore::register_json::<Theme>(context.registry(), "json.theme").unwrap();

    let prefs = context
        .bind(
            &HostSchema::new("Appearance").field(
                FieldDecl::string("theme")
                    .transform::<Theme>("json.theme")
                    .tag("appearance"),
            ),
        )
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    prefs.subscribe("appearance", move |notice| {
        s.lock().unwrap().push(notice.value::<Theme>().unwrap().clone());
        Ok(())
    });

    let theme = Theme {
        name: "dusk".to_string(),
        accent: (120, 40, 200),
        dark: true,
    };
    prefs.set("theme", theme.clone()).unwrap();

    // Stored as a string primitive, read back structurally equal.
    let stored = context.store().get("theme").unwrap().unwrap();
    assert_eq!(stored.kind(), PrimitiveKind::String);
    assert_eq!(prefs.get::<Theme>("theme").unwrap(), theme);
    assert_eq!(*seen.lock().unwrap(), vec![theme]);
}

#[test]
fn bindings_survive_a_store_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");

    let schema = HostSchema::new("Session")
        .field(FieldDecl::int("volume").default_value(80))
        .field(FieldDecl::long("last_seen"))
        .field(FieldDecl::float("speed"))
        .field(FieldDecl::boolean("onboarded").type_default())
        .field(FieldDecl::string("nickname"));

    {
        let context = BindContext::new(JsonFileStore::open(&path).unwrap());
        let prefs = context.bind(&schema).unwrap();
        prefs.set("volume", 40).unwrap();
        prefs.set("last_seen", 1_722_800_000i64).unwrap();
        prefs.set("speed", 1.5f32).unwrap();
        prefs.set("onboarded", true).unwrap();
        prefs.set("nickname", "alice".to_string()).unwrap();
    }

    let context = BindContext::new(JsonFileStore::open(&path).unwrap());
    let prefs = context.bind(&schema).unwrap();

    assert_eq!(prefs.get::<i32>("volume").unwrap(), 40);
    assert_eq!(prefs.get::<i64>("last_seen").unwrap(), 1_722_800_000);
    assert_eq!(prefs.get::<f32>("speed").unwrap(), 1.5);
    assert!(prefs.get::<bool>("onboarded").unwrap());
    assert_eq!(prefs.get::<String>("nickname").unwrap(), "alice");
}

#[test]
fn stored_kind_is_enforced_on_read() {
    let context = BindContext::new(InMemoryStore::new());
    let prefs = context.bind(&counter_schema()).unwrap();

    // Corrupt the key behind the bindings' back.
    context
        .store()
        .put("intFoo2", Primitive::String("seven".to_string()))
        .unwrap();

    assert!(matches!(
        prefs.get::<i32>("intFoo2").unwrap_err(),
        Error::KindMismatch {
            expected: PrimitiveKind::Int,
            found: PrimitiveKind::String,
            ..
        }
    ));
}

#[test]
fn rebinding_a_type_reuses_its_resolution() {
    let context = BindContext::new(InMemoryStore::new());

    let first = context.bind(&counter_schema()).unwrap();
    let second = context.bind(&counter_schema()).unwrap();
    assert!(Arc::ptr_eq(first.bindings(), second.bindings()));

    // Both accessors see the same store.
    first.set("intFoo2", 7).unwrap();
    assert_eq!(second.get::<i32>("intFoo2").unwrap(), 7);
}

#[test]
fn unsubscribed_handlers_stop_firing() {
    let context = BindContext::new(InMemoryStore::new());
    let prefs = context.bind(&counter_schema()).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let handle = prefs.subscribe("abs", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    prefs.set("intFoo2", 1).unwrap();
    assert!(prefs.unsubscribe(&handle));
    prefs.set("intFoo2", 2).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
