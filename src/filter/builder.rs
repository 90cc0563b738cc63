//! Fluent builder for filter expressions.
//!
//! A builder moves through three states, each exposing a different method set:
//!
//! - [`Empty`]: nothing appended yet; conditions, groups and `build`.
//! - [`Open`]: right after `and()`/`or()`; conditions and groups only.
//! - [`Chained`]: right after a condition; `and()`, `or()` and `build` only.
//!
//! So two connectives in a row, a trailing connective, or a condition
//! directly after another condition do not compile.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use super::datetime::as_date_macro;
use super::operators::{Operator, for_each_operator};
use super::params::{ParamStore, Params};
use super::path::FieldPath;
use super::render::render;
use super::value::FilterValue;
use crate::error::RenderError;

const AND: &str = " && ";
const OR: &str = " || ";

/// Nothing appended yet.
#[derive(Debug)]
pub struct Empty;

/// A connective was appended; a condition or group must follow.
#[derive(Debug)]
pub struct Open;

/// A condition was appended; a connective or `build` must follow.
#[derive(Debug)]
pub struct Chained;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Empty {}
    impl Sealed for super::Open {}
}

/// States in which a condition may be appended.
pub trait AcceptsCondition: sealed::Sealed {}
impl AcceptsCondition for Empty {}
impl AcceptsCondition for Open {}

/// The top-level builder owns its store; group scopes borrow the parent's.
#[derive(Debug)]
enum Store<'p> {
    Owned(ParamStore),
    Shared(&'p mut ParamStore),
}

impl Store<'_> {
    fn get(&self) -> &ParamStore {
        match self {
            Store::Owned(store) => store,
            Store::Shared(store) => &**store,
        }
    }

    fn get_mut(&mut self) -> &mut ParamStore {
        match self {
            Store::Owned(store) => store,
            Store::Shared(store) => &mut **store,
        }
    }

    fn into_params(self) -> Params {
        match self {
            Store::Owned(store) => store.into_params(),
            Store::Shared(store) => store.params().clone(),
        }
    }
}

/// Filter expression under construction.
///
/// `'p` is the scope the parameter store belongs to. It is invariant, so the
/// builder handed to a [`group`](Builder::group) closure can only be answered
/// with a builder derived from it.
///
/// Two connectives in a row do not compile:
///
/// ```compile_fail
/// let _ = pbfilter::query().eq("a", 1).and().and();
/// ```
///
/// Neither does building after a trailing connective:
///
/// ```compile_fail
/// let _ = pbfilter::query().eq("a", 1).or().build();
/// ```
///
/// Nor a condition directly after another one:
///
/// ```compile_fail
/// let _ = pbfilter::query().eq("a", 1).eq("b", 2);
/// ```
///
/// Nor an empty group:
///
/// ```compile_fail
/// let _ = pbfilter::query().group(|g| g);
/// ```
///
/// Nor a group answered with a builder from another scope:
///
/// ```compile_fail
/// let _ = pbfilter::query().group(|_| pbfilter::query().eq("a", 1));
/// ```
#[derive(Debug)]
pub struct Builder<'p, S> {
    expr: String,
    store: Store<'p>,
    _state: PhantomData<S>,
    _scope: PhantomData<fn(&'p ()) -> &'p ()>,
}

/// A fresh top-level builder.
pub type QueryBuilder = Builder<'static, Empty>;

/// Start a new filter expression.
pub fn query() -> QueryBuilder {
    QueryBuilder::new()
}

impl QueryBuilder {
    pub fn new() -> Self {
        Builder::with_store(Store::Owned(ParamStore::new()))
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Unrendered expression plus its parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuery {
    pub raw: String,
    pub values: Params,
}

impl RawQuery {
    /// Substitute the values into the expression.
    pub fn render(&self) -> Result<String, RenderError> {
        render(&self.raw, &self.values)
    }
}

impl<'p, S> Builder<'p, S> {
    fn with_store(store: Store<'p>) -> Self {
        Builder {
            expr: String::new(),
            store,
            _state: PhantomData,
            _scope: PhantomData,
        }
    }

    fn into_state<T>(self) -> Builder<'p, T> {
        Builder {
            expr: self.expr,
            store: self.store,
            _state: PhantomData,
            _scope: PhantomData,
        }
    }

    /// Expression accumulated so far in this scope.
    pub fn expression(&self) -> &str {
        &self.expr
    }

    /// Parameters saved so far, including those of enclosing scopes.
    pub fn params(&self) -> &Params {
        self.store.get().params()
    }

    fn finish(self) -> RawQuery {
        RawQuery {
            raw: self.expr,
            values: self.store.into_params(),
        }
    }

    /// Append `path<op>value`. Macros are written inline, anything else
    /// goes through the parameter store.
    fn apply(&mut self, path: &FieldPath, op: Operator, value: FilterValue) {
        self.expr.push_str(path.as_str());
        self.expr.push_str(op.symbol());

        if let Some(token) = as_date_macro(&value) {
            self.expr.push_str(token);
            return;
        }

        let name = self.store.get_mut().save(path.as_str(), value);
        self.expr.push_str("{:");
        self.expr.push_str(&name);
        self.expr.push('}');
    }

    fn apply_joined<I>(&mut self, path: &FieldPath, op: Operator, values: I, joiner: &str)
    where
        I: IntoIterator<Item = FilterValue>,
    {
        self.expr.push('(');
        for (index, value) in values.into_iter().enumerate() {
            if index > 0 {
                self.expr.push_str(joiner);
            }
            self.apply(path, op, value);
        }
        self.expr.push(')');
    }
}

macro_rules! operator_methods {
    (($lt:lifetime) $($variant:ident, $name:literal, $method:ident, $symbol:literal;)*) => {
        $(
            #[doc = concat!("Append `path", $symbol, "value`.")]
            pub fn $method(
                self,
                path: impl Into<FieldPath>,
                value: impl Into<FilterValue>,
            ) -> Builder<$lt, Chained> {
                self.condition(path, Operator::$variant, value)
            }
        )*
    };
}

impl<'p, S: AcceptsCondition> Builder<'p, S> {
    /// Append `path<op>value` for an arbitrary operator.
    pub fn condition(
        mut self,
        path: impl Into<FieldPath>,
        op: Operator,
        value: impl Into<FilterValue>,
    ) -> Builder<'p, Chained> {
        self.apply(&path.into(), op, value.into());
        self.into_state()
    }

    for_each_operator!(operator_methods, 'p);

    /// `(a~v || b~v || ...)` over every non-empty path.
    pub fn search<I, P>(mut self, paths: I, value: impl Into<FilterValue>) -> Builder<'p, Chained>
    where
        I: IntoIterator<Item = P>,
        P: Into<FieldPath>,
    {
        let value = value.into();
        let paths: Vec<FieldPath> = paths
            .into_iter()
            .map(Into::into)
            .filter(|path: &FieldPath| !path.is_empty())
            .collect();

        self.expr.push('(');
        for (index, path) in paths.iter().enumerate() {
            if index > 0 {
                self.expr.push_str(OR);
            }
            self.apply(path, Operator::Like, value.clone());
        }
        self.expr.push(')');
        self.into_state()
    }

    /// `(path=v1 || path=v2 || ...)`
    pub fn is_in<I, V>(mut self, path: impl Into<FieldPath>, values: I) -> Builder<'p, Chained>
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        let values = values.into_iter().map(Into::into);
        self.apply_joined(&path.into(), Operator::Equal, values, OR);
        self.into_state()
    }

    /// `(path!=v1 && path!=v2 && ...)`
    pub fn not_in<I, V>(mut self, path: impl Into<FieldPath>, values: I) -> Builder<'p, Chained>
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        let values = values.into_iter().map(Into::into);
        self.apply_joined(&path.into(), Operator::NotEqual, values, AND);
        self.into_state()
    }

    /// `(path>=from && path<=to)`
    pub fn between(
        mut self,
        path: impl Into<FieldPath>,
        from: impl Into<FilterValue>,
        to: impl Into<FilterValue>,
    ) -> Builder<'p, Chained> {
        let path = path.into();
        self.expr.push('(');
        self.apply(&path, Operator::GreaterThanOrEqual, from.into());
        self.expr.push_str(AND);
        self.apply(&path, Operator::LessThanOrEqual, to.into());
        self.expr.push(')');
        self.into_state()
    }

    /// `(path<from || path>to)`
    pub fn not_between(
        mut self,
        path: impl Into<FieldPath>,
        from: impl Into<FilterValue>,
        to: impl Into<FilterValue>,
    ) -> Builder<'p, Chained> {
        let path = path.into();
        self.expr.push('(');
        self.apply(&path, Operator::LessThan, from.into());
        self.expr.push_str(OR);
        self.apply(&path, Operator::GreaterThan, to.into());
        self.expr.push(')');
        self.into_state()
    }

    /// `path=''`; the store represents absent values as empty strings.
    pub fn is_null(mut self, path: impl Into<FieldPath>) -> Builder<'p, Chained> {
        self.expr.push_str(path.into().as_str());
        self.expr.push_str("=''");
        self.into_state()
    }

    /// `path!=''`
    pub fn is_not_null(mut self, path: impl Into<FieldPath>) -> Builder<'p, Chained> {
        self.expr.push_str(path.into().as_str());
        self.expr.push_str("!=''");
        self.into_state()
    }

    /// [`is_null`](Self::is_null) for a null value, [`eq`](Self::eq) otherwise.
    pub fn is(self, path: impl Into<FieldPath>, value: impl Into<FilterValue>) -> Builder<'p, Chained> {
        let value = value.into();
        if value.is_null() {
            self.is_null(path)
        } else {
            self.eq(path, value)
        }
    }

    /// Append `raw` verbatim.
    ///
    /// Nothing in `raw` is checked or escaped. Never pass untrusted input.
    pub fn custom(mut self, raw: impl AsRef<str>) -> Builder<'p, Chained> {
        self.expr.push_str(raw.as_ref());
        self.into_state()
    }

    /// Append a parenthesized sub-expression.
    ///
    /// The closure gets a fresh scope sharing this builder's parameter store
    /// and must return that scope with at least one condition in it.
    ///
    /// ```
    /// use pbfilter::query;
    ///
    /// let q = query()
    ///     .eq("status", "active")
    ///     .and()
    ///     .group(|g| g.lt("age", 18).or().gt("age", 65))
    ///     .build();
    /// assert_eq!(q.raw, "status={:status1} && (age<{:age1} || age>{:age2})");
    /// ```
    pub fn group<F>(mut self, build: F) -> Builder<'p, Chained>
    where
        F: for<'g> FnOnce(Builder<'g, Empty>) -> Builder<'g, Chained>,
    {
        let nested = Builder::with_store(Store::Shared(self.store.get_mut()));
        let inner = build(nested).expr;

        self.expr.push('(');
        self.expr.push_str(&inner);
        self.expr.push(')');
        self.into_state()
    }
}

impl<'p> Builder<'p, Empty> {
    /// Snapshot of an empty expression: `raw` is `""`, no values.
    pub fn build(self) -> RawQuery {
        self.finish()
    }

    /// Pass the (empty) expression and values to `renderer`.
    pub fn build_with<F, R>(self, renderer: F) -> R
    where
        F: FnOnce(&str, &Params) -> R,
    {
        let query = self.finish();
        renderer(&query.raw, &query.values)
    }
}

impl<'p> Builder<'p, Chained> {
    /// Append ` && `.
    pub fn and(mut self) -> Builder<'p, Open> {
        self.expr.push_str(AND);
        self.into_state()
    }

    /// Append ` || `.
    pub fn or(mut self) -> Builder<'p, Open> {
        self.expr.push_str(OR);
        self.into_state()
    }

    /// Finish the expression.
    pub fn build(self) -> RawQuery {
        self.finish()
    }

    /// Finish the expression and pass it with its values to `renderer`,
    /// typically [`render`](crate::filter::render).
    pub fn build_with<F, R>(self, renderer: F) -> R
    where
        F: FnOnce(&str, &Params) -> R,
    {
        let query = self.finish();
        renderer(&query.raw, &query.values)
    }
}
