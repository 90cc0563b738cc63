use serde::{Deserialize, Serialize};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::ConfigError;
use crate::filter::{
    AcceptsCondition, Builder, Chained, FieldPath, FilterValue, Operator, RawQuery, query,
};
use crate::schema::Schema;

/// A query file: an optional collection name plus a filter tree.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub filter: Option<FilterExpr>,
}

impl QueryConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()
            .map_err(|source| ConfigError::Load {
                path: path.to_path_buf(),
                source,
            })?;
        let query: QueryConfig = settings.try_deserialize().map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            "Query: loaded {:?} (collection: {:?})",
            path,
            query.collection
        );
        Ok(query)
    }

    /// Resolve operators, values and (with a schema) field paths.
    pub fn compile(&self, schema: Option<&Schema>) -> Result<CompiledQuery, ConfigError> {
        let scope = match schema {
            Some(schema) => {
                let collection = self
                    .collection
                    .as_deref()
                    .ok_or(ConfigError::MissingCollection)?;
                schema.collection(collection)?;
                Some((schema, collection))
            }
            None => None,
        };
        let ctx = CompileContext { scope };

        let root = self
            .filter
            .as_ref()
            .map(|filter| filter.compile(&ctx))
            .transpose()?;
        Ok(CompiledQuery { root })
    }
}

/// Filter tree as written in a query file.
///
/// `all` members are joined with `&&`, `any` members with `||`. A nested
/// `all`/`any` with more than one member is parenthesized.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FilterExpr {
    All { all: Vec<FilterExpr> },
    Any { any: Vec<FilterExpr> },
    Custom { custom: String },
    Search {
        search: Vec<String>,
        value: serde_json::Value,
    },
    Condition(ConditionConfig),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConditionConfig {
    pub field: String,
    pub op: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
    #[serde(default, rename = "type")]
    pub value_type: Option<ValueType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// RFC 3339 string converted to a datetime value.
    Datetime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

/// Validated filter tree, ready to be replayed on a builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Join {
        connective: Connective,
        first: Box<Node>,
        rest: Vec<Node>,
    },
    Custom(String),
    Search(Vec<FieldPath>, FilterValue),
    Compare(FieldPath, Operator, FilterValue),
    In(FieldPath, Vec<FilterValue>),
    NotIn(FieldPath, Vec<FilterValue>),
    Between(FieldPath, FilterValue, FilterValue),
    NotBetween(FieldPath, FilterValue, FilterValue),
    IsNull(FieldPath),
    IsNotNull(FieldPath),
    Is(FieldPath, FilterValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub root: Option<Node>,
}

impl CompiledQuery {
    pub fn build(&self) -> RawQuery {
        match &self.root {
            Some(node) => node.apply(query(), false).build(),
            None => query().build(),
        }
    }
}

struct CompileContext<'a> {
    scope: Option<(&'a Schema, &'a str)>,
}

impl CompileContext<'_> {
    fn path(&self, field: &str) -> Result<FieldPath, ConfigError> {
        match self.scope {
            Some((schema, collection)) => Ok(schema.path(collection, field)?),
            None => Ok(FieldPath::from(field)),
        }
    }
}

impl FilterExpr {
    fn compile(&self, ctx: &CompileContext<'_>) -> Result<Node, ConfigError> {
        match self {
            FilterExpr::All { all } => compile_join(Connective::And, all, ctx),
            FilterExpr::Any { any } => compile_join(Connective::Or, any, ctx),
            FilterExpr::Custom { custom } => Ok(Node::Custom(custom.clone())),
            FilterExpr::Search { search, value } => {
                let paths = search
                    .iter()
                    .filter(|field| !field.is_empty())
                    .map(|field| ctx.path(field))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::Search(paths, FilterValue::from(value.clone())))
            }
            FilterExpr::Condition(condition) => condition.compile(ctx),
        }
    }
}

fn compile_join(
    connective: Connective,
    items: &[FilterExpr],
    ctx: &CompileContext<'_>,
) -> Result<Node, ConfigError> {
    let mut nodes = items
        .iter()
        .map(|item| item.compile(ctx))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();
    let first = nodes.next().ok_or(ConfigError::EmptyGroup)?;
    Ok(Node::Join {
        connective,
        first: Box::new(first),
        rest: nodes.collect(),
    })
}

impl ConditionConfig {
    fn convert(&self, raw: &serde_json::Value) -> Result<FilterValue, ConfigError> {
        match self.value_type {
            None => Ok(FilterValue::from(raw.clone())),
            Some(ValueType::Datetime) => {
                let text = raw
                    .as_str()
                    .ok_or_else(|| ConfigError::DateTimeType(raw.clone()))?;
                OffsetDateTime::parse(text, &Rfc3339)
                    .map(FilterValue::DateTime)
                    .map_err(|source| ConfigError::DateTime {
                        value: text.to_string(),
                        source,
                    })
            }
        }
    }

    fn list(&self, expected: &'static str) -> Result<Vec<FilterValue>, ConfigError> {
        if self.values.is_empty() {
            return Err(self.arity(expected));
        }
        self.values.iter().map(|raw| self.convert(raw)).collect()
    }

    fn pair(&self) -> Result<(FilterValue, FilterValue), ConfigError> {
        match self.values.as_slice() {
            [from, to] => Ok((self.convert(from)?, self.convert(to)?)),
            _ => Err(self.arity("exactly two values")),
        }
    }

    fn arity(&self, expected: &'static str) -> ConfigError {
        ConfigError::Arity {
            op: self.op.clone(),
            field: self.field.clone(),
            expected,
        }
    }

    fn compile(&self, ctx: &CompileContext<'_>) -> Result<Node, ConfigError> {
        let path = ctx.path(&self.field)?;
        let node = match self.op.as_str() {
            "in" => Node::In(path, self.list("at least one value")?),
            "not_in" | "notIn" => Node::NotIn(path, self.list("at least one value")?),
            "between" => {
                let (from, to) = self.pair()?;
                Node::Between(path, from, to)
            }
            "not_between" | "notBetween" => {
                let (from, to) = self.pair()?;
                Node::NotBetween(path, from, to)
            }
            "is_null" | "isNull" => Node::IsNull(path),
            "is_not_null" | "isNotNull" => Node::IsNotNull(path),
            "is" => Node::Is(path, self.convert(&self.value)?),
            name => {
                let op = Operator::from_name(name)
                    .or_else(|| Operator::from_symbol(name))
                    .ok_or_else(|| ConfigError::UnknownOperator(name.to_string()))?;
                Node::Compare(path, op, self.convert(&self.value)?)
            }
        };
        Ok(node)
    }
}

impl Node {
    /// Append this node to `builder`. Nested joins are grouped.
    pub fn apply<'p, S: AcceptsCondition>(
        &self,
        builder: Builder<'p, S>,
        nested: bool,
    ) -> Builder<'p, Chained> {
        match self {
            Node::Join {
                connective,
                first,
                rest,
            } => {
                if nested && !rest.is_empty() {
                    builder.group(|g| apply_join(g, *connective, first, rest))
                } else {
                    apply_join(builder, *connective, first, rest)
                }
            }
            Node::Custom(raw) => builder.custom(raw),
            Node::Search(paths, value) => builder.search(paths, value.clone()),
            Node::Compare(path, op, value) => builder.condition(path, *op, value.clone()),
            Node::In(path, values) => builder.is_in(path, values.iter().cloned()),
            Node::NotIn(path, values) => builder.not_in(path, values.iter().cloned()),
            Node::Between(path, from, to) => builder.between(path, from.clone(), to.clone()),
            Node::NotBetween(path, from, to) => {
                builder.not_between(path, from.clone(), to.clone())
            }
            Node::IsNull(path) => builder.is_null(path),
            Node::IsNotNull(path) => builder.is_not_null(path),
            Node::Is(path, value) => builder.is(path, value.clone()),
        }
    }
}

fn apply_join<'p, S: AcceptsCondition>(
    builder: Builder<'p, S>,
    connective: Connective,
    first: &Node,
    rest: &[Node],
) -> Builder<'p, Chained> {
    let mut chained = first.apply(builder, true);
    for node in rest {
        let open = match connective {
            Connective::And => chained.and(),
            Connective::Or => chained.or(),
        };
        chained = node.apply(open, true);
    }
    chained
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldKind};

    fn parse(yaml: &str) -> QueryConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn build(yaml: &str) -> RawQuery {
        parse(yaml).compile(None).unwrap().build()
    }

    #[test]
    fn test_flat_all() {
        let q = build(
            r#"
filter:
  all:
    - { field: status, op: eq, value: active }
    - { field: age, op: greaterThan, value: 18 }
"#,
        );
        assert_eq!(q.raw, "status={:status1} && age>{:age1}");
        assert_eq!(q.render().unwrap(), "status='active' && age>18");
    }

    #[test]
    fn test_nested_groups() {
        let q = build(
            r#"
filter:
  all:
    - { field: status, op: "=", value: active }
    - any:
        - { field: age, op: lt, value: 18 }
        - { field: age, op: gt, value: 65 }
    - any:
        - { field: role, op: is_null }
"#,
        );
        assert_eq!(
            q.raw,
            "status={:status1} && (age<{:age1} || age>{:age2}) && role=''"
        );
    }

    #[test]
    fn test_set_and_range_operators() {
        let q = build(
            r#"
filter:
  any:
    - { field: role, op: in, values: [admin, editor] }
    - { field: id, op: not_in, values: [1, 2] }
    - { field: age, op: between, values: [18, 65] }
    - { field: age, op: notBetween, values: [0, 5] }
"#,
        );
        assert_eq!(
            q.raw,
            "(role={:role1} || role={:role2}) || (id!={:id1} && id!={:id2}) || \
             (age>={:age1} && age<={:age2}) || (age<{:age3} || age>{:age4})"
        );
    }

    #[test]
    fn test_search_custom_and_macros() {
        let q = build(
            r#"
filter:
  all:
    - { search: [title, body], value: rust }
    - { custom: "views>10" }
    - { field: created, op: gte, value: "@todayStart" }
"#,
        );
        assert_eq!(
            q.raw,
            "(title~{:title1} || body~{:body1}) && views>10 && created>=@todayStart"
        );
        assert_eq!(q.values.len(), 2);
    }

    #[test]
    fn test_datetime_values() {
        let q = build(
            r#"
filter: { field: created, op: lt, value: "2024-01-02T03:04:05+01:00", type: datetime }
"#,
        );
        assert_eq!(q.render().unwrap(), "created<'2024-01-02 02:04:05.000Z'");
    }

    #[test]
    fn test_is_with_null() {
        let q = build(
            r#"
filter: { field: parent, op: is, value: null }
"#,
        );
        assert_eq!(q.raw, "parent=''");
    }

    #[test]
    fn test_empty_filter() {
        let q = parse("collection: posts").compile(None).unwrap().build();
        assert_eq!(q.raw, "");
        assert!(q.values.is_empty());
    }

    #[test]
    fn test_unknown_operator() {
        let err = parse("filter: { field: a, op: approx, value: 1 }")
            .compile(None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOperator(op) if op == "approx"));
    }

    #[test]
    fn test_between_requires_two_values() {
        let err = parse("filter: { field: a, op: between, values: [1] }")
            .compile(None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Arity { .. }));
    }

    #[test]
    fn test_empty_group_is_rejected() {
        let err = parse("filter: { all: [] }").compile(None).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyGroup));
    }

    #[test]
    fn test_bad_datetime() {
        let err = parse("filter: { field: a, op: eq, value: yesterday, type: datetime }")
            .compile(None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::DateTime { .. }));
    }

    #[test]
    fn test_schema_checks_paths() {
        let schema = Schema::default()
            .with_collection(
                "posts",
                vec![
                    FieldDef::new("title", FieldKind::Text),
                    FieldDef::relation("author", "users"),
                ],
            )
            .with_collection("users", vec![FieldDef::new("name", FieldKind::Text)]);

        let ok = parse(
            r#"
collection: posts
filter: { field: author.name, op: eq, value: Ann }
"#,
        );
        assert_eq!(
            ok.compile(Some(&schema)).unwrap().build().raw,
            "author.name={:author.name1}"
        );

        let bad = parse(
            r#"
collection: posts
filter: { field: author.email, op: eq, value: x }
"#,
        );
        assert!(matches!(
            bad.compile(Some(&schema)),
            Err(ConfigError::Schema(_))
        ));

        let missing = parse("filter: { field: title, op: eq, value: x }");
        assert!(matches!(
            missing.compile(Some(&schema)),
            Err(ConfigError::MissingCollection)
        ));
    }
}
