//! Per-compile alias allocation.

/// Default prefix of generated table aliases.
pub const DEFAULT_ALIAS_PREFIX: &str = "__nc";

/// Hands out `__nc0`, `__nc1`, ... so traversals never collide.
///
/// One counter belongs to one compile call; it is never shared.
#[derive(Debug, Clone)]
pub struct AliasCounter {
    prefix: String,
    next: usize,
}

impl AliasCounter {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ALIAS_PREFIX)
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: 0,
        }
    }

    /// Allocate a fresh alias.
    pub fn next_alias(&mut self) -> String {
        let alias = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        log::debug!("allocated alias {}", alias);
        alias
    }

    /// Number of aliases handed out so far.
    pub fn allocated(&self) -> usize {
        self.next
    }
}

impl Default for AliasCounter {
    fn default() -> Self {
        Self::new()
    }
}
