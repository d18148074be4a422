//! Append-only set of custom unit tokens.
//!
//! Tokens are discovered while normalizing unit strings and stay registered
//! for the lifetime of the registry. Registering a token twice is a no-op.

use std::{
    collections::BTreeSet,
    sync::{PoisonError, RwLock},
};

use log::debug;
use once_cell::sync::Lazy;

static GLOBAL: Lazy<CustomUnitRegistry> = Lazy::new(CustomUnitRegistry::new);

#[derive(Debug, Default)]
pub struct CustomUnitRegistry {
    tokens: RwLock<BTreeSet<String>>,
}

impl CustomUnitRegistry {
    /// An empty, isolated registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static CustomUnitRegistry {
        &GLOBAL
    }

    /// Adds `token`, returning `true` if it was not already present.
    pub fn register(&self, token: &str) -> bool {
        if self.contains(token) {
            return false;
        }

        let inserted = self
            .tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.to_string());
        if inserted {
            debug!("Registered custom unit '{}'", token);
        }
        inserted
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(token)
    }

    /// Registered tokens in lexical order.
    pub fn tokens(&self) -> Vec<String> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
