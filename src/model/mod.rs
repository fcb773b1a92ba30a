//! # Event Model
//!
//! Plain data shared by every stage: batches of named per-event columns,
//! ragged arrays, particles and object-type descriptors.
//!
//! Design rule: no I/O and no conversion policy here. Sources fill these
//! types, converters read them.

pub mod particle;
pub mod jagged;
pub mod column;
pub mod batch;

pub use particle::{attribute_column, count_column, Particle, ObjectType, TypeId};
pub use jagged::Jagged;
pub use column::Column;
pub use batch::{EventBatch, CollectionView, IdSource};
