//! evgraph Core Library
//!
//! Turns a flat event-log export of submit actions into a duplicate-free set
//! of user and event nodes with `raised`, `submitted_to` and `invited`
//! relationships.

pub mod batch;
pub mod error;
pub mod record;
pub mod registry;
pub mod relationship;

pub use batch::{build_batch, GraphBatch};
pub use error::{CoreResult, EvgraphError};
pub use record::model::{RawRecord, SubmitRecord};
pub use record::{normalize, NormalizeOutcome};
pub use registry::IdentityRegistry;
pub use relationship::model::{Relationship, RelationshipKind};
