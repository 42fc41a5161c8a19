//! Secret names and the parent's copy of their values
//!
//! A `SecretSet` only knows *names*. The values stay in the parent process
//! environment, untouched, so outbound authentication keeps working; the
//! sanitizer removes the names from each spawned shell instead.

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::{GuardError, GuardResult};

/// Ordered, immutable list of environment variable names that must never
/// reach a spawned subprocess
///
/// Cloning is cheap; every clone shares the same list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretSet {
    names: Arc<[String]>,
}

impl SecretSet {
    /// Build a set from variable names, keeping their order
    ///
    /// Names are spliced into shell text, so each must be a plain
    /// identifier (`[A-Za-z_][A-Za-z0-9_]*`). Duplicates are rejected.
    pub fn new<I, S>(names: I) -> GuardResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut list = Vec::new();

        for name in names {
            let name = name.into();
            if !is_valid_name(&name) {
                return Err(GuardError::InvalidSecretName(name));
            }
            if !seen.insert(name.clone()) {
                return Err(GuardError::DuplicateSecretName(name));
            }
            list.push(name);
        }

        Ok(Self { names: list.into() })
    }

    /// Parse a comma-separated list such as `"ANTHROPIC_API_KEY, GEMINI_API_KEY"`
    pub fn parse_list(list: &str) -> GuardResult<Self> {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }

    /// The names, in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Shell statement that removes every name from the running shell
    ///
    /// `unset A B 2>/dev/null; ` for a non-empty set, `""` otherwise.
    pub fn unset_clause(&self) -> String {
        if self.names.is_empty() {
            return String::new();
        }
        format!("unset {} 2>/dev/null; ", self.names.join(" "))
    }

    /// Capture the parent's values from the process environment
    ///
    /// The environment itself is left as it is.
    pub fn capture_from_env(&self) -> ParentCredentials {
        self.capture_with(|name| std::env::var(name).ok())
    }

    /// Capture values through a custom lookup
    pub fn capture_with<F>(&self, lookup: F) -> ParentCredentials
    where
        F: Fn(&str) -> Option<String>,
    {
        let values = self
            .names
            .iter()
            .filter_map(|name| lookup(name).map(|value| (name.clone(), value)))
            .collect();
        ParentCredentials { values }
    }

    /// Names that appear as `NAME=...` lines in an environment dump
    /// (the output of `env` or `/proc/self/environ` split on NUL)
    pub fn exposed_in<'a>(&'a self, env_dump: &str) -> Vec<&'a str> {
        self.names
            .iter()
            .filter(|name| {
                env_dump.split(['\n', '\0']).any(|line| {
                    line.strip_prefix(name.as_str())
                        .is_some_and(|rest| rest.starts_with('='))
                })
            })
            .map(|name| name.as_str())
            .collect()
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The parent process's own copy of the secret values
///
/// Used for outbound authentication. `Debug` never prints values.
#[derive(Clone, Default)]
pub struct ParentCredentials {
    values: Vec<(String, String)>,
}

impl ParentCredentials {
    /// Value for a secret name, if the parent had it set
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Names from `secrets` the parent does not have
    pub fn missing<'a>(&self, secrets: &'a SecretSet) -> Vec<&'a str> {
        secrets
            .names()
            .iter()
            .filter(|name| self.get(name).is_none())
            .map(|name| name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for ParentCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (name, _) in &self.values {
            map.entry(name, &"<redacted>");
        }
        map.finish()
    }
}
