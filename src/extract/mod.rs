//! Field extraction primitives shared by all spiders
//!
//! Three kinds of lookup cover every site recipe:
//! - tagged key paths over decoded JSON payloads ([`path`])
//! - script-embedded JSON located by a literal prefix convention ([`embedded`])
//! - selector helpers over parsed markup ([`html`])
//!
//! All of them resolve a missing structure to `None` rather than failing the
//! record.

pub mod embedded;
pub mod html;
pub mod path;

pub use embedded::EmbeddedJson;
pub use path::{FieldPath, Step};
