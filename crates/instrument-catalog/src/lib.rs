//! Local instrument knowledge: synonym resolution and the symbols database.

pub mod catalog;
pub mod resolver;

pub use catalog::{
    Catalog, CatalogError, CatalogShape, InstrumentCatalog, ReloadPolicy, DEFAULT_PROMPT_LIMIT,
};
pub use resolver::{is_canonical, resolve_symbol, synonym};
