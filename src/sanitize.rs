//! Identifier sanitization for generated C code.

use std::collections::HashSet;

/// Prefix applied when a sanitized name would start with a digit.
pub const DIGIT_PREFIX: &str = "b_";
/// Identifier used when nothing legal is left of the raw name.
pub const UNNAMED: &str = "unnamed";

/// Map an arbitrary block name to a legal C identifier.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`. Two different raw
/// names may map to the same identifier; use [`SymbolTable`] when uniqueness
/// matters.
pub fn sanitize(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() {
        return UNNAMED.to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, DIGIT_PREFIX);
    }
    out
}

/// Assigns one unique identifier per block name, in declaration order.
///
/// Names that sanitize to an identifier already taken (compared without
/// case, since some symbols are emitted upper-cased) get a `_2`, `_3`, ...
/// suffix. The first block keeps the plain identifier.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<String>,
}

impl SymbolTable {
    pub fn assign<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let bases: Vec<String> = names.into_iter().map(sanitize).collect();
        // Suffixed candidates must not steal a plain name some later block owns.
        let reserved: HashSet<String> = bases.iter().map(|b| b.to_ascii_lowercase()).collect();
        let mut taken: HashSet<String> = HashSet::new();
        let mut symbols = Vec::with_capacity(bases.len());

        for base in bases {
            let key = base.to_ascii_lowercase();
            let symbol = if taken.insert(key) {
                base
            } else {
                let mut n = 2;
                loop {
                    let candidate = format!("{}_{}", base, n);
                    let ckey = candidate.to_ascii_lowercase();
                    if !reserved.contains(&ckey) && taken.insert(ckey) {
                        tracing::debug!(symbol = %candidate, "disambiguated colliding block name");
                        break candidate;
                    }
                    n += 1;
                }
            };
            symbols.push(symbol);
        }
        Self { symbols }
    }

    /// Identifier of the block at `index` (declaration order).
    pub fn get(&self, index: usize) -> &str {
        &self.symbols[index]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
