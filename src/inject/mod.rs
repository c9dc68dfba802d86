//! Static content injection.
//!
//! Two-pass text rewrite over HTML entry documents:
//!
//! 1. The [`engine`] resolves every matching registry rule: loads its data,
//!    invokes its renderer, substitutes the fragment for the rule's opaque
//!    placeholder token.
//! 2. The [`tokens`] pass resolves generic `%%IDENT%%` tokens anywhere in
//!    the markup, including inside freshly rendered fragments.

pub mod context;
pub mod engine;
pub mod registry;
pub mod render;
pub mod tokens;

pub use context::RenderContext;
pub use engine::inject;
pub use registry::InjectionRegistry;
pub use tokens::TokenTable;
