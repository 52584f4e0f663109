//! Conjunctive filter expression handed to the raw executor.
//!
//! # Invariants
//! - Predicates are combined with `AND` only.
//! - An empty filter is the universal filter and renders as `1 = 1`.
//! - Column and table names come from static entity descriptors, never from
//!   caller input; values are always bound parameters.

use crate::db::UNICODE_LOWER;
use crate::model::entity::ID_COLUMN;
use rusqlite::types::Value;

/// Matching mode of a Query Template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Exact equality on every constrained field.
    Find,
    /// Case-insensitive substring on text, exact on everything else.
    Search,
}

impl MatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Find => "find",
            Self::Search => "search",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals {
        column: &'static str,
        value: Value,
    },
    NotEquals {
        column: &'static str,
        value: Value,
    },
    /// `column <= value`.
    AtMost {
        column: &'static str,
        value: Value,
    },
    /// `column >= value`.
    AtLeast {
        column: &'static str,
        value: Value,
    },
    /// Case-insensitive substring match; `needle` is the raw user text.
    /// Case is folded with Unicode rules on both sides, not SQLite's ASCII-only
    /// `LOWER()`.
    Contains {
        column: &'static str,
        needle: String,
    },
    /// `column IN (SELECT id FROM table WHERE filter)`.
    InSubquery {
        column: &'static str,
        table: &'static str,
        filter: Filter,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// Filter matching every row.
    pub fn universal() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn is_universal(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Renders the `WHERE` body and its bind values in order.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut binds = Vec::new();
        let sql = self.render(&mut binds);
        (sql, binds)
    }

    fn render(&self, binds: &mut Vec<Value>) -> String {
        if self.predicates.is_empty() {
            return "1 = 1".to_string();
        }

        let clauses = self
            .predicates
            .iter()
            .map(|predicate| render_predicate(predicate, binds))
            .collect::<Vec<_>>();
        clauses.join(" AND ")
    }
}

fn render_predicate(predicate: &Predicate, binds: &mut Vec<Value>) -> String {
    match predicate {
        Predicate::Equals { column, value } => {
            binds.push(value.clone());
            format!("{column} = ?")
        }
        Predicate::NotEquals { column, value } => {
            binds.push(value.clone());
            format!("{column} <> ?")
        }
        Predicate::AtMost { column, value } => {
            binds.push(value.clone());
            format!("{column} <= ?")
        }
        Predicate::AtLeast { column, value } => {
            binds.push(value.clone());
            format!("{column} >= ?")
        }
        Predicate::Contains { column, needle } => {
            binds.push(Value::Text(like_pattern(&needle.to_lowercase())));
            format!("{UNICODE_LOWER}({column}) LIKE ? ESCAPE '\\'")
        }
        Predicate::InSubquery {
            column,
            table,
            filter,
        } => {
            let inner = filter.render(binds);
            format!("{column} IN (SELECT {ID_COLUMN} FROM {table} WHERE {inner})")
        }
    }
}

/// Wraps `needle` in `%…%`, escaping LIKE wildcards in the user text.
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
