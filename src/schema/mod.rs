//! Content type and component metadata: the attribute model, the registry
//! holding it, the payload walker and the join-table DDL builder.

mod attribute;
mod builder;
mod registry;
mod visit;

pub use attribute::*;
pub use builder::*;
pub use registry::*;
pub use visit::*;

/// Surrogate primary key column present on every table.
pub const ID_COLUMN: &str = "id";

/// Column tying all localized and draft/published versions of an entry
/// together.
pub const DOCUMENT_ID_COLUMN: &str = "document_id";

/// Locale discriminator column on entry tables.
pub const LOCALE_COLUMN: &str = "locale";

/// Publication timestamp column on entry tables. NULL marks a draft.
pub const PUBLISHED_AT_COLUMN: &str = "published_at";
