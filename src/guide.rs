//! The guide's data model and the passes that build it from raw records.
//!
//! Records are first indexed per kind ([`index::EntityIndex`]), then resolved
//! into linked entities ([`resolve`]), extended with shops and arsenals, and
//! finally grouped and sorted into a [`Guide`] by [`assemble::assemble`].

pub mod arsenals;
pub mod assemble;
pub mod index;
pub mod naming;
pub mod resolve;
pub mod shops;
pub mod types;

pub use index::normalize_identifier;
pub use naming::DisplayNameNormalizer;
pub use resolve::ExtractionContext;
pub use types::{Guide, GuideLookup, RecordKind};
