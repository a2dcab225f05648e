//! Stat-block registry and the stock roster.
//!
//! Hosts with their own character data implement
//! [`CharacterProvider`](crate::session::CharacterProvider) directly; the
//! `TemplateRegistry` covers the common case of a fixed set of templates.

mod reference;
mod registry;

pub use reference::{reference_encounter, reference_party, reference_registry};
pub use registry::TemplateRegistry;
