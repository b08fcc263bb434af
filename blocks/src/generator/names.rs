use std::collections::{HashMap, HashSet};

/// Words generated code must not use as identifiers: script keywords, the
/// intrinsic hooks and the globals the runtime provides.
pub const RESERVED_WORDS: &[&str] = &[
    "var", "function", "return", "if", "else", "while", "for", "of", "break", "continue", "true",
    "false", "undefined", "__print", "__setAnswer", "Math", "Number", "String", "NaN", "Infinity",
    "prompt", "alert", "confirm",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameCategory {
    Variable,
    Procedure,
}

/// Maps user-facing names to legal, collision-free script identifiers.
#[derive(Debug)]
pub struct NameDb {
    assigned: HashMap<(NameCategory, String), String>,
    taken: HashSet<String>,
}

impl NameDb {
    pub fn new() -> Self {
        NameDb {
            assigned: HashMap::new(),
            taken: RESERVED_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Claim a name outright (helper functions).
    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_string());
    }

    /// The identifier for a user name. Stable: the same user name in the
    /// same category always maps to the same identifier.
    pub fn get_name(&mut self, category: NameCategory, name: &str) -> String {
        let key = (category, name.to_string());
        if let Some(assigned) = self.assigned.get(&key) {
            return assigned.clone();
        }

        let mut safe = safe_name(name);
        if RESERVED_WORDS.contains(&safe.as_str()) {
            safe.push('_');
        }
        let identifier = self.distinct(&safe);
        self.assigned.insert(key, identifier.clone());
        identifier
    }

    /// A fresh identifier based on `base`: `count`, `count2`, `count3`...
    pub fn get_distinct_name(&mut self, base: &str) -> String {
        let safe = safe_name(base);
        self.distinct(&safe)
    }

    fn distinct(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut suffix = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

/// Replace characters that cannot appear in an identifier with `_`.
pub fn safe_name(name: &str) -> String {
    let mut safe: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if safe.is_empty() {
        safe.push_str("unnamed");
    } else if safe.starts_with(|c: char| c.is_ascii_digit()) {
        safe.insert_str(0, "my_");
    }
    safe
}
