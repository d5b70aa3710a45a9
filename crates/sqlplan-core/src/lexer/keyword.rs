//! Keyword registry.
//!
//! Every keyword is either reserved (never usable as an unquoted identifier)
//! or non-reserved (usable as an identifier except where the grammar asks
//! for a strict identifier, such as aliases). Quoting always turns a keyword
//! back into a plain identifier.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Classification of a word against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordClass {
    /// Never an unquoted identifier.
    Reserved,
    /// An identifier in general identifier positions, but not in strict ones.
    NonReserved,
    /// Not a keyword at all.
    Unregistered,
}

macro_rules! keywords {
    ($($variant:ident => $text:literal, $class:ident;)*) => {
        /// SQL keywords.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $(
                #[doc = $text]
                $variant,
            )*
        }

        impl Keyword {
            /// Every registered keyword.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            /// Returns the keyword as it is spelled in SQL.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }

            /// Returns whether the keyword is reserved or not.
            #[must_use]
            pub const fn class(&self) -> KeywordClass {
                match self {
                    $(Self::$variant => KeywordClass::$class,)*
                }
            }
        }
    };
}

keywords! {
    All => "ALL", Reserved;
    And => "AND", Reserved;
    Anti => "ANTI", NonReserved;
    As => "AS", Reserved;
    Asc => "ASC", NonReserved;
    Between => "BETWEEN", Reserved;
    By => "BY", Reserved;
    Cache => "CACHE", NonReserved;
    Case => "CASE", Reserved;
    Cast => "CAST", Reserved;
    Cluster => "CLUSTER", NonReserved;
    Create => "CREATE", Reserved;
    Cross => "CROSS", Reserved;
    Cube => "CUBE", NonReserved;
    Current => "CURRENT", NonReserved;
    CurrentDate => "CURRENT_DATE", Reserved;
    CurrentTimestamp => "CURRENT_TIMESTAMP", Reserved;
    Date => "DATE", NonReserved;
    Delete => "DELETE", Reserved;
    Desc => "DESC", NonReserved;
    Describe => "DESCRIBE", NonReserved;
    Distinct => "DISTINCT", Reserved;
    Distribute => "DISTRIBUTE", NonReserved;
    Drop => "DROP", Reserved;
    Else => "ELSE", Reserved;
    End => "END", Reserved;
    Escape => "ESCAPE", NonReserved;
    Except => "EXCEPT", Reserved;
    Exists => "EXISTS", Reserved;
    Explain => "EXPLAIN", NonReserved;
    Extended => "EXTENDED", NonReserved;
    False => "FALSE", Reserved;
    Fetch => "FETCH", NonReserved;
    First => "FIRST", NonReserved;
    Fn => "FN", NonReserved;
    Following => "FOLLOWING", NonReserved;
    From => "FROM", Reserved;
    Full => "FULL", Reserved;
    Group => "GROUP", Reserved;
    Grouping => "GROUPING", NonReserved;
    Having => "HAVING", Reserved;
    If => "IF", NonReserved;
    In => "IN", Reserved;
    Inner => "INNER", Reserved;
    Insert => "INSERT", Reserved;
    Intersect => "INTERSECT", Reserved;
    Interval => "INTERVAL", Reserved;
    Into => "INTO", Reserved;
    Is => "IS", Reserved;
    Join => "JOIN", Reserved;
    Last => "LAST", NonReserved;
    Lateral => "LATERAL", NonReserved;
    Lazy => "LAZY", NonReserved;
    Left => "LEFT", Reserved;
    Like => "LIKE", Reserved;
    Limit => "LIMIT", NonReserved;
    Natural => "NATURAL", Reserved;
    Not => "NOT", Reserved;
    Null => "NULL", Reserved;
    Nulls => "NULLS", NonReserved;
    On => "ON", Reserved;
    Only => "ONLY", NonReserved;
    Or => "OR", Reserved;
    Order => "ORDER", Reserved;
    Outer => "OUTER", Reserved;
    Over => "OVER", NonReserved;
    Overwrite => "OVERWRITE", NonReserved;
    Partition => "PARTITION", NonReserved;
    Preceding => "PRECEDING", NonReserved;
    Put => "PUT", Reserved;
    Range => "RANGE", NonReserved;
    Regexp => "REGEXP", NonReserved;
    Right => "RIGHT", Reserved;
    Rlike => "RLIKE", NonReserved;
    Rollup => "ROLLUP", NonReserved;
    Row => "ROW", NonReserved;
    Rows => "ROWS", NonReserved;
    Select => "SELECT", Reserved;
    Semi => "SEMI", NonReserved;
    Set => "SET", Reserved;
    Sets => "SETS", NonReserved;
    Sort => "SORT", NonReserved;
    Table => "TABLE", Reserved;
    Then => "THEN", Reserved;
    Timestamp => "TIMESTAMP", NonReserved;
    To => "TO", NonReserved;
    True => "TRUE", Reserved;
    Unbounded => "UNBOUNDED", NonReserved;
    Uncache => "UNCACHE", NonReserved;
    Union => "UNION", Reserved;
    Update => "UPDATE", Reserved;
    Using => "USING", Reserved;
    Values => "VALUES", NonReserved;
    View => "VIEW", NonReserved;
    When => "WHEN", Reserved;
    Where => "WHERE", Reserved;
    Window => "WINDOW", NonReserved;
    With => "WITH", Reserved;
}

impl Keyword {
    /// Returns true if the keyword can never be an unquoted identifier.
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        matches!(self.class(), KeywordClass::Reserved)
    }
}

/// Immutable lookup table from upper-cased spelling to keyword.
#[derive(Debug)]
pub struct KeywordRegistry {
    by_name: HashMap<&'static str, Keyword>,
}

impl KeywordRegistry {
    /// Builds the table from the keyword list.
    #[must_use]
    pub fn build() -> Self {
        let by_name = Keyword::ALL.iter().map(|kw| (kw.as_str(), *kw)).collect();
        Self { by_name }
    }

    /// Looks up a word (case-insensitive).
    #[must_use]
    pub fn lookup(&self, word: &str) -> Option<Keyword> {
        if word.bytes().all(|b| !b.is_ascii_lowercase()) {
            return self.by_name.get(word).copied();
        }
        self.by_name.get(word.to_ascii_uppercase().as_str()).copied()
    }

    /// Classifies a word.
    #[must_use]
    pub fn classify(&self, word: &str) -> KeywordClass {
        self.lookup(word)
            .map_or(KeywordClass::Unregistered, |kw| kw.class())
    }

    /// Number of registered keywords.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

static REGISTRY: LazyLock<KeywordRegistry> = LazyLock::new(KeywordRegistry::build);

/// The process-wide keyword registry, built on first use.
#[must_use]
pub fn registry() -> &'static KeywordRegistry {
    &REGISTRY
}
