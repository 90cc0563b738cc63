//! Comparison operators of the filter dialect.

use std::fmt;

/// Invokes `$callback!` with the operator list:
/// `(extra tokens) Variant, "camelName", method, "symbol"; ...`
///
/// Everything derived from the operator set (the [`Operator`] enum and the
/// per-operator builder methods) is generated from this one list.
macro_rules! for_each_operator {
    ($callback:ident $(, $arg:tt)*) => {
        $callback! {
            ($($arg)*)
            Equal, "equal", eq, "=";
            NotEqual, "notEqual", neq, "!=";
            LessThan, "lessThan", lt, "<";
            LessThanOrEqual, "lessThanOrEqual", lte, "<=";
            GreaterThan, "greaterThan", gt, ">";
            GreaterThanOrEqual, "greaterThanOrEqual", gte, ">=";
            Like, "like", like, "~";
            NotLike, "notLike", not_like, "!~";
            AnyEqual, "anyEqual", any_eq, "?=";
            AnyNotEqual, "anyNotEqual", any_neq, "?!=";
            AnyLessThan, "anyLessThan", any_lt, "?<";
            AnyLessThanOrEqual, "anyLessThanOrEqual", any_lte, "?<=";
            AnyGreaterThan, "anyGreaterThan", any_gt, "?>";
            AnyGreaterThanOrEqual, "anyGreaterThanOrEqual", any_gte, "?>=";
            AnyLike, "anyLike", any_like, "?~";
            AnyNotLike, "anyNotLike", any_not_like, "?!~";
        }
    };
}

pub(crate) use for_each_operator;

macro_rules! operator_table {
    (() $($variant:ident, $name:literal, $method:ident, $symbol:literal;)*) => {
        /// Comparison operator.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Operator {
            $($variant,)*
        }

        impl Operator {
            /// Every operator, in table order.
            pub const ALL: &'static [Operator] = &[$(Operator::$variant,)*];

            /// Dialect symbol, e.g. `>=`.
            pub const fn symbol(self) -> &'static str {
                match self {
                    $(Operator::$variant => $symbol,)*
                }
            }

            /// Camel-case name, e.g. `greaterThanOrEqual`.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Operator::$variant => $name,)*
                }
            }

            /// Name of the builder method, e.g. `gte`.
            pub const fn method(self) -> &'static str {
                match self {
                    $(Operator::$variant => stringify!($method),)*
                }
            }
        }
    };
}

for_each_operator!(operator_table);

impl Operator {
    /// Look up an operator by camel-case name or method name.
    pub fn from_name(name: &str) -> Option<Operator> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name() == name || op.method() == name)
    }

    /// Look up an operator by its dialect symbol.
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        Self::ALL.iter().copied().find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_core_symbols() {
        assert_eq!(Operator::Equal.symbol(), "=");
        assert_eq!(Operator::NotEqual.symbol(), "!=");
        assert_eq!(Operator::LessThan.symbol(), "<");
        assert_eq!(Operator::LessThanOrEqual.symbol(), "<=");
        assert_eq!(Operator::GreaterThan.symbol(), ">");
        assert_eq!(Operator::GreaterThanOrEqual.symbol(), ">=");
        assert_eq!(Operator::Like.symbol(), "~");
        assert_eq!(Operator::NotLike.symbol(), "!~");
    }

    #[test]
    fn test_symbols_are_unique() {
        let symbols: HashSet<_> = Operator::ALL.iter().map(|op| op.symbol()).collect();
        assert_eq!(symbols.len(), Operator::ALL.len());
    }

    #[test]
    fn test_lookup_by_name_and_method() {
        assert_eq!(
            Operator::from_name("greaterThanOrEqual"),
            Some(Operator::GreaterThanOrEqual)
        );
        assert_eq!(Operator::from_name("gte"), Some(Operator::GreaterThanOrEqual));
        assert_eq!(Operator::from_name("not_like"), Some(Operator::NotLike));
        assert_eq!(Operator::from_name("any_eq"), Some(Operator::AnyEqual));
        assert_eq!(Operator::from_name("between"), None);
    }

    #[test]
    fn test_lookup_by_symbol() {
        assert_eq!(Operator::from_symbol("?!~"), Some(Operator::AnyNotLike));
        assert_eq!(Operator::from_symbol("=="), None);
    }

    #[test]
    fn test_display_is_symbol() {
        assert_eq!(Operator::AnyGreaterThan.to_string(), "?>");
    }
}
