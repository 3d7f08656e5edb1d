//! # keel-codegen
//!
//! Model generation from a live database schema.
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────┐   ┌─────────┐   ┌──────────┐
//! │ Snapshot     │──▶│ Introspector │──▶│ Resolver │──▶│ Emitter │──▶│ Renderer │
//! └──────────────┘   └──────────────┘   └──────────┘   └─────────┘   └──────────┘
//! ```
//!
//! - [`SchemaSnapshot`] reads tables, columns, keys and indexes from a
//!   database catalog (implemented by the driver crates).
//! - [`Introspector`] applies naming rules and maps SQL types to Rust types.
//! - [`resolve`] orders tables so that referenced tables come first,
//!   rejecting reference cycles and foreign keys into excluded tables.
//! - [`emit`] builds [`TemplateData`] for a [`Renderer`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use keel_codegen::Generator;
//!
//! let generator = Generator::from_config("keel.toml")?;
//! let renderer = generator.default_renderer();
//! generator.generate(&mut db, &renderer)?;
//! ```

pub mod config;
pub mod emitter;
pub mod error;
pub mod filter;
pub mod generator;
pub mod introspect;
pub mod render;
pub mod resolver;
pub mod snapshot;
pub mod types;

pub use config::{DatabaseConfig, GeneratorConfig, ModelsConfig, OutputConfig};
pub use emitter::{Column, Index, Table, TemplateData, emit};
pub use error::{CodegenError, CodegenResult, ResolutionError};
pub use filter::{TableFilter, TablePattern};
pub use generator::Generator;
pub use introspect::{ColumnDescriptor, DatabaseMetadata, Introspector, Reference};
pub use render::{JsonRenderer, Renderer};
pub use resolver::{ResolvedTable, Resolver, resolve};
pub use snapshot::{
    ColumnMetadata, DatabaseKind, ForeignKeyMetadata, IndexMetadata, SchemaMetadata,
    SchemaSnapshot, SnapshotOptions, StaticSnapshot, TableMetadata,
};
pub use types::FieldType;
