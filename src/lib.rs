//! Typed builder for parameterized record-store filter expressions.
//!
//! ```
//! use pbfilter::query;
//!
//! let q = query().eq("status", "active").and().gt("age", 18).build();
//! assert_eq!(q.raw, "status={:status1} && age>{:age1}");
//! assert_eq!(q.render().unwrap(), "status='active' && age>18");
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod schema;

pub use error::{ConfigError, RenderError, SchemaError};
pub use filter::{
    Builder, DateMacro, FieldPath, FilterValue, Operator, Params, QueryBuilder, RawQuery, query,
    render, render_lossy,
};
