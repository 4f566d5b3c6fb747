//! Document assembly for the event management application.
//!
//! The crate turns participant data into printable artifacts: badge sheets,
//! application and roster tables, and bundles of previously uploaded
//! agreement letters (as a zip archive or one merged PDF).  The
//! [`service::DocumentAssemblyService`] facade resolves a caller-supplied
//! selection against an eligible set and dispatches to the renderers and the
//! bundler, returning a uniform [`service::Outcome`].

pub mod badges;
pub mod builder;
pub mod bundle;
pub mod error;
pub mod fonts;
pub mod material;
pub mod model;
pub mod service;
pub mod table;

pub use error::DocumentError;
pub use model::{BadgeOptions, EligibleSet, EntityId, EventRef, NameFormat, Participant};
pub use service::{AssemblyMode, AssemblyRequest, Artifact, DocumentAssemblyService, Outcome};
