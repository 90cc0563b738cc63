//! Parameterized filter expressions for record-store queries.
//!
//! Syntax produced:
//!   field={:field1}            - comparison against a parameter
//!   field>=@todayStart         - comparison against a datetime macro
//!   field='' / field!=''       - null / not null
//!   expr1 && expr2             - AND
//!   expr1 || expr2             - OR
//!   (expr)                     - grouping
//!
//! Operators: = != < <= > >= ~ !~ and their "any" forms ?= ?!= ?< ?<= ?> ?>= ?~ ?!~

mod builder;
mod datetime;
mod operators;
mod params;
mod path;
mod render;
mod value;

pub use builder::{
    AcceptsCondition, Builder, Chained, Empty, Open, QueryBuilder, RawQuery, query,
};
pub use datetime::{DATETIME_MACROS, DateMacro, as_date_macro, is_date_macro};
pub use operators::Operator;
pub use params::{ParamStore, Params};
pub use path::FieldPath;
pub use render::{render, render_lossy};
pub use value::{FilterValue, format_datetime, quote};
