//! Per-function tokenization policy.
//!
//! Some functions fold certain literal arguments while planning (format
//! strings, units, scales), so those arguments must stay constants. Others
//! cannot be cached by literal substitution at all.

/// Which arguments of a call are demoted to constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArgPolicy {
    /// Every argument.
    All,
    /// Arguments 0, 2, 4, ...
    Even,
    /// The listed 0-based positions.
    Positions(&'static [usize]),
}

impl ArgPolicy {
    pub(crate) fn applies_to(self, index: usize) -> bool {
        match self {
            Self::All => true,
            Self::Even => index % 2 == 0,
            Self::Positions(list) => list.contains(&index),
        }
    }
}

/// What tokenization does for a call to a given function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FunctionPolicy {
    /// Demote the selected arguments.
    Constant(ArgPolicy),
    /// The whole statement must not be cached.
    DisableCaching,
}

/// Looks up the policy of a function, by lower-cased name.
pub(crate) fn policy(name: &str) -> Option<FunctionPolicy> {
    use ArgPolicy::{All, Even, Positions};
    use FunctionPolicy::{Constant, DisableCaching};

    let policy = match name {
        "round" | "bround" | "percentile" | "trunc" | "date_format" | "from_unixtime"
        | "unix_timestamp" | "to_unix_timestamp" | "to_date" | "to_timestamp"
        | "from_utc_timestamp" | "to_utc_timestamp" | "get_json_object" | "regexp_replace"
        | "format_number" | "approx_count_distinct" | "xpath" => Constant(Positions(&[1])),
        "ntile" | "stack" | "date_trunc" | "format_string" | "printf" | "rand" | "randn" => {
            Constant(Positions(&[0]))
        }
        "regexp_extract" | "parse_url" | "sentences" => Constant(Positions(&[1, 2])),
        "window" => Constant(Positions(&[1, 2, 3])),
        "str_to_map" | "json_tuple" | "percentile_approx" => Constant(All),
        "named_struct" => Constant(Even),
        "from_json" | "schema_of_json" | "from_csv" | "schema_of_csv" | "java_method"
        | "reflect" => DisableCaching,
        _ => return None,
    };
    Some(policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions() {
        assert_eq!(
            policy("round"),
            Some(FunctionPolicy::Constant(ArgPolicy::Positions(&[1])))
        );
        assert_eq!(policy("from_json"), Some(FunctionPolicy::DisableCaching));
        assert_eq!(policy("upper"), None);
    }

    #[test]
    fn test_parity_policies() {
        assert!(ArgPolicy::Even.applies_to(0));
        assert!(!ArgPolicy::Even.applies_to(1));
        assert!(ArgPolicy::All.applies_to(7));
        assert!(ArgPolicy::Positions(&[1, 2]).applies_to(2));
        assert!(!ArgPolicy::Positions(&[1, 2]).applies_to(0));
    }
}
