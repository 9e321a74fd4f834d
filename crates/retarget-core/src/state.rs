//! Mutable context of one generation run.

use crate::scope::{NamespacePath, ScopeKind, SymbolRef, SymbolTable};
use crate::types::Type;
use std::collections::{BTreeSet, HashMap};

/// Everything a generation pass mutates.
///
/// Standalone runs start from and return to the default state; chained runs
/// keep it between calls.
#[derive(Debug, Clone)]
pub struct RunState {
    namespace: NamespacePath,
    symbols: SymbolTable,
    temp_counts: HashMap<String, u32>,
    used: BTreeSet<String>,
    output: Vec<String>,
    /// Later runs may reassign anything declared now.
    chained: bool,
}

impl Default for RunState {
    fn default() -> Self {
        RunState {
            namespace: NamespacePath::root(),
            symbols: SymbolTable::new(),
            temp_counts: HashMap::new(),
            used: BTreeSet::new(),
            output: Vec::new(),
            chained: false,
        }
    }
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn namespace(&self) -> &NamespacePath {
        &self.namespace
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Enter the child scope `name`, returning the scope to restore afterwards.
    pub fn push_scope(&mut self, name: &str, kind: ScopeKind) -> NamespacePath {
        let child = self.namespace.child(name);
        self.symbols.declare_scope(child.clone(), kind);
        std::mem::replace(&mut self.namespace, child)
    }

    pub fn restore_scope(&mut self, previous: NamespacePath) {
        self.namespace = previous;
    }

    pub fn scope_kind(&self) -> Option<ScopeKind> {
        self.symbols.scope_kind(&self.namespace)
    }

    /// Nearest enclosing class namespace, if any.
    pub fn enter_context(&self) -> Option<NamespacePath> {
        self.symbols.nearest_class(&self.namespace)
    }

    pub(crate) fn set_chained(&mut self, chained: bool) {
        self.chained = chained;
    }

    /// Store access to `name`. In a chained run every new record is mutable,
    /// since code already emitted cannot see a later reassignment.
    pub fn declare_or_update(&mut self, name: &str, ty: Type) -> (SymbolRef, bool) {
        let (symbol, created) = self.symbols.declare_or_update(&self.namespace, name, ty);
        if created && self.chained {
            self.symbols.mark_mutable(&symbol);
        }
        (symbol, created)
    }

    pub fn declare_local(&mut self, name: &str, ty: Type, alias: Option<String>) -> SymbolRef {
        self.symbols.declare_local(&self.namespace, name, ty, alias)
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolRef> {
        self.symbols.lookup(&self.namespace, name)
    }

    /// Fresh identifier `{base}_{n}`; `n` counts from 1 per base name.
    pub fn temp_var(&mut self, base: &str) -> String {
        let count = self.temp_counts.entry(base.to_string()).or_insert(0);
        *count += 1;
        format!("{}_{}", base, count)
    }

    pub fn mark_used(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }

    /// Target built-ins the emitted code needs, sorted.
    pub fn used(&self) -> &BTreeSet<String> {
        &self.used
    }

    /// Rendered lines accumulated so far.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub(crate) fn push_output(&mut self, lines: Vec<String>) {
        self.output.extend(lines);
    }
}
