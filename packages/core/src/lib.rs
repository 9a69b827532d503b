//! Prefstore core: the field-to-key-value binding engine.
//!
//! A host type declares its fields once as a [`HostSchema`]; the resolver
//! turns that description into an immutable [`BindingSet`] mapping each
//! field to a storage key, a primitive kind, an optional default, an
//! optional transform, and an optional change tag. A [`BindContext`] ties
//! the resolved bindings to a key-value store, a [`TransformRegistry`], and
//! a [`ChangeBus`]; the [`Prefs`] accessor it produces is the typed get/set
//! surface every field access goes through.
//!
//! Writes that change a tagged field's stored representation publish the new
//! value to the tag's subscribers; unchanged writes publish nothing.
//! Transforms convert between a field's value type and its stored primitive
//! and must round-trip. Stores, transforms, and subscribers are supplied by
//! the caller; this crate owns only the binding semantics between them.

mod accessor;
mod bus;
mod descriptor;
mod error;
mod registry;
mod resolver;
mod schema;
mod transform;

pub use accessor::{BindContext, Prefs, StoreHandle, WriteOutcome};
pub use bus::{
    ChangeBus, ChangeNotice, HandlerFailure, HandlerResult, PublishReport, SubscriptionHandle,
};
pub use descriptor::{BindingSet, FieldBinding};
pub use error::{Error, TransformOp};
pub use registry::TransformRegistry;
pub use resolver::{resolve, Resolver};
pub use schema::{DefaultSpec, FieldDecl, HostSchema};
pub use transform::{Transform, TransformId, TransformResult};
