use rdf_weave_model::{rename_pattern_variables, Bgp, Binding, Variable};
use rustc_hash::FxHashMap;

/// Remembers which binding of a bound join bucket produced which rewritten BGP.
///
/// A bound join sends the BGPs of a whole bucket as a single union to the store. To tell the
/// results apart, every variable of the BGP for bucket member `i` is renamed to `<name>_i`
/// ([RewritingTable::rewrite_bgp]). The table then recovers `i` from the variable names of a
/// result and restores the original variable names ([RewritingTable::restore]).
///
/// Keys are always parsed from the last suffix of a name, so a user variable that already ends in
/// `_<integer>` becomes `<name>_<integer>_i` and keeps its own suffix. Only suffixes that are
/// registered in the table are accepted as keys.
#[derive(Debug, Default)]
pub struct RewritingTable {
    entries: FxHashMap<usize, Binding>,
}

impl RewritingTable {
    /// Registers `binding` as the origin of the BGP rewritten with `key`.
    pub fn insert(&mut self, key: usize, binding: Binding) {
        self.entries.insert(key, binding);
    }

    pub fn get(&self, key: usize) -> Option<&Binding> {
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renames every variable of `bgp` to `<name>_<key>`.
    pub fn rewrite_bgp(bgp: &Bgp, key: usize) -> Bgp {
        let patterns = bgp
            .patterns()
            .iter()
            .map(|pattern| rename_pattern_variables(pattern, |variable| suffixed(variable, key)))
            .collect();
        bgp.with_patterns(patterns)
    }

    /// Returns the key of the first variable of `binding` whose suffix is a registered key.
    pub fn recover_key(&self, binding: &Binding) -> Option<usize> {
        binding
            .variables()
            .filter_map(|variable| parse_suffix(variable.as_str()))
            .find(|key| self.entries.contains_key(key))
    }

    /// Strips the rewriting suffix from the variables of `result` and merges it into the binding
    /// the result originates from.
    ///
    /// Returns [None] if no key can be recovered from `result`.
    pub fn restore(&self, result: &Binding) -> Option<Binding> {
        let key = self.recover_key(result)?;
        let origin = self.entries.get(&key)?;
        let suffix = format!("_{key}");
        let stripped = result.map_variables(|variable| {
            variable
                .as_str()
                .strip_suffix(suffix.as_str())
                .map_or_else(|| variable.clone(), Variable::new_unchecked)
        });
        Some(origin.union(&stripped))
    }
}

fn suffixed(variable: &Variable, key: usize) -> Variable {
    Variable::new_unchecked(format!("{}_{key}", variable.as_str()))
}

/// Parses the `_<integer>` suffix of a variable name. Only the canonical decimal form is
/// accepted such that stripping `_<key>` restores the original name.
fn parse_suffix(name: &str) -> Option<usize> {
    let (_, suffix) = name.rsplit_once('_')?;
    let key = suffix.parse::<usize>().ok()?;
    (key.to_string() == suffix).then_some(key)
}
