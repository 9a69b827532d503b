//! Prefstore: declarative field-to-key-value bindings.
//!
//! A host type declares typed fields once; each field is transparently
//! backed by a key-value store, optionally routed through a serialization
//! transform, and optionally wired to a tag-keyed change bus that fires when
//! a tagged value actually changes.
//!
//! This crate re-exports the whole stack: the binding engine
//! (`prefstore-core`), the storage contract (`prefstore-kv-store`), serde
//! transforms (`prefstore-serde`), and the provided backends
//! (`prefstore-json-store`).
//!
//! # Example
//!
//! ```rust
//! use prefstore::{BindContext, FieldDecl, HostSchema, InMemoryStore};
//!
//! let context = BindContext::new(InMemoryStore::new());
//! let prefs = context
//!     .bind(
//!         &HostSchema::new("PlayerSettings")
//!             .field(FieldDecl::int("volume").default_value(80).tag("audio"))
//!             .field(FieldDecl::string("nickname")),
//!     )
//!     .unwrap();
//!
//! let handle = prefs.subscribe("audio", |notice| {
//!     println!("volume is now {}", notice.stored());
//!     Ok(())
//! });
//!
//! assert_eq!(prefs.get::<i32>("volume").unwrap(), 80);
//! prefs.set("volume", 40).unwrap();
//! prefs.unsubscribe(&handle);
//! ```

pub use prefstore_core::{
    resolve, BindContext, BindingSet, ChangeBus, ChangeNotice, DefaultSpec, Error, FieldBinding,
    FieldDecl, HandlerFailure, HandlerResult, HostSchema, Prefs, PublishReport, Resolver,
    StoreHandle, SubscriptionHandle, Transform, TransformId, TransformOp, TransformRegistry,
    TransformResult, WriteOutcome,
};
pub use prefstore_json_store::{FileStoreError, InMemoryStore, JsonFileStore};
pub use prefstore_kv_store::{KeyValueStore, Primitive, PrimitiveKind, StoreError};
pub use prefstore_serde::{register_json, JsonTransform};
