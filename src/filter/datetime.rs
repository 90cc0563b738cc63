//! Datetime macros.
//!
//! Macros are evaluated by the record store at query time, so they are
//! written into the expression as bare tokens instead of parameters. Only
//! tokens on [`DATETIME_MACROS`] get that treatment; any other `@`-prefixed
//! string is an ordinary, parameterized literal.

use std::fmt;

use super::value::FilterValue;

/// Recognized macro tokens.
pub const DATETIME_MACROS: &[&str] = &[
    "@now",
    "@yesterday",
    "@tomorrow",
    "@second",
    "@minute",
    "@hour",
    "@day",
    "@month",
    "@year",
    "@weekday",
    "@todayStart",
    "@todayEnd",
    "@monthStart",
    "@monthEnd",
    "@yearStart",
    "@yearEnd",
];

/// Typed form of the entries in [`DATETIME_MACROS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateMacro {
    Now,
    Yesterday,
    Tomorrow,
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
    Weekday,
    TodayStart,
    TodayEnd,
    MonthStart,
    MonthEnd,
    YearStart,
    YearEnd,
}

impl DateMacro {
    pub const ALL: &'static [DateMacro] = &[
        DateMacro::Now,
        DateMacro::Yesterday,
        DateMacro::Tomorrow,
        DateMacro::Second,
        DateMacro::Minute,
        DateMacro::Hour,
        DateMacro::Day,
        DateMacro::Month,
        DateMacro::Year,
        DateMacro::Weekday,
        DateMacro::TodayStart,
        DateMacro::TodayEnd,
        DateMacro::MonthStart,
        DateMacro::MonthEnd,
        DateMacro::YearStart,
        DateMacro::YearEnd,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            DateMacro::Now => "@now",
            DateMacro::Yesterday => "@yesterday",
            DateMacro::Tomorrow => "@tomorrow",
            DateMacro::Second => "@second",
            DateMacro::Minute => "@minute",
            DateMacro::Hour => "@hour",
            DateMacro::Day => "@day",
            DateMacro::Month => "@month",
            DateMacro::Year => "@year",
            DateMacro::Weekday => "@weekday",
            DateMacro::TodayStart => "@todayStart",
            DateMacro::TodayEnd => "@todayEnd",
            DateMacro::MonthStart => "@monthStart",
            DateMacro::MonthEnd => "@monthEnd",
            DateMacro::YearStart => "@yearStart",
            DateMacro::YearEnd => "@yearEnd",
        }
    }

    pub fn parse(token: &str) -> Option<DateMacro> {
        Self::ALL.iter().copied().find(|m| m.as_str() == token)
    }
}

impl fmt::Display for DateMacro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_macro(value: &str) -> bool {
    value.len() > 1 && value.starts_with('@')
}

/// Returns the macro token if `value` is a recognized datetime macro.
pub fn as_date_macro(value: &FilterValue) -> Option<&str> {
    match value {
        FilterValue::String(s) if is_macro(s) && DATETIME_MACROS.contains(&s.as_str()) => {
            Some(s.as_str())
        }
        _ => None,
    }
}

pub fn is_date_macro(value: &FilterValue) -> bool {
    as_date_macro(value).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_matches_enum() {
        assert_eq!(DATETIME_MACROS.len(), DateMacro::ALL.len());
        for m in DateMacro::ALL {
            assert!(DATETIME_MACROS.contains(&m.as_str()), "{m} missing");
            assert_eq!(DateMacro::parse(m.as_str()), Some(*m));
        }
    }

    #[test]
    fn test_recognized_macros() {
        assert!(is_date_macro(&FilterValue::from("@now")));
        assert!(is_date_macro(&FilterValue::from("@monthEnd")));
        assert!(is_date_macro(&FilterValue::from(DateMacro::TodayStart)));
    }

    #[test]
    fn test_unknown_macro_is_literal() {
        assert!(!is_date_macro(&FilterValue::from("@")));
        assert!(!is_date_macro(&FilterValue::from("@nope")));
        assert!(!is_date_macro(&FilterValue::from("@NOW")));
        assert!(!is_date_macro(&FilterValue::from("now")));
        assert!(!is_date_macro(&FilterValue::from(" @now")));
    }

    #[test]
    fn test_non_strings_are_never_macros() {
        assert!(!is_date_macro(&FilterValue::Null));
        assert!(!is_date_macro(&FilterValue::from(1)));
        assert!(!is_date_macro(&FilterValue::Json(serde_json::json!(["@now"]))));
    }
}
