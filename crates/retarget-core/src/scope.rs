//! Namespaces and the symbol table.
//!
//! A namespace is a dotted path (`main.Point.__init__`). Symbols are keyed by
//! the namespace that owns them plus their name; lookups walk from the
//! current namespace up to the root.

use crate::types::Type;
use std::collections::BTreeMap;
use std::fmt;

/// Name of the top-level namespace.
pub const ROOT: &str = "main";

/// Dotted path locating a lexical scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespacePath(String);

impl NamespacePath {
    pub fn root() -> Self {
        NamespacePath(ROOT.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    /// The path with its last segment removed; `None` for the root.
    pub fn parent(&self) -> Option<NamespacePath> {
        let (parent, _) = self.0.rsplit_once('.')?;
        Some(NamespacePath(parent.to_string()))
    }

    pub fn child(&self, segment: &str) -> NamespacePath {
        NamespacePath(format!("{}.{}", self.0, segment))
    }

    /// This path, then each ancestor up to and including the root.
    pub fn ancestors(&self) -> impl Iterator<Item = NamespacePath> {
        std::iter::successors(Some(self.clone()), NamespacePath::parent)
    }

    /// Last segment: the name of the function or class the scope belongs to.
    pub fn name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
}

/// Handle to a symbol: owning namespace plus name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolRef {
    pub owner: NamespacePath,
    pub name: String,
}

/// One variable.
#[derive(Debug, Clone)]
pub struct Symbol {
    types: Vec<Type>,
    mutable: bool,
    /// Name to render instead of the source name (`self` -> `this`).
    alias: Option<String>,
}

impl Symbol {
    fn new(ty: Type) -> Self {
        Symbol {
            types: vec![ty],
            mutable: false,
            alias: None,
        }
    }

    /// Type of the latest assignment.
    pub fn current_type(&self) -> Type {
        self.types.last().cloned().unwrap_or_default()
    }

    /// Every type assigned so far, oldest first.
    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<SymbolRef, Symbol>,
    scopes: BTreeMap<NamespacePath, ScopeKind>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = SymbolTable::default();
        table.scopes.insert(NamespacePath::root(), ScopeKind::Module);
        table
    }

    pub fn declare_scope(&mut self, path: NamespacePath, kind: ScopeKind) {
        self.scopes.insert(path, kind);
    }

    pub fn scope_kind(&self, path: &NamespacePath) -> Option<ScopeKind> {
        self.scopes.get(path).copied()
    }

    /// Store access to `name` from `current`.
    ///
    /// Updates the nearest existing record (marking it mutable) or creates a
    /// new one owned by `current`. The flag is `true` when a record was
    /// created.
    pub fn declare_or_update(
        &mut self,
        current: &NamespacePath,
        name: &str,
        ty: Type,
    ) -> (SymbolRef, bool) {
        if let Some(found) = self.lookup(current, name) {
            if let Some(symbol) = self.symbols.get_mut(&found) {
                symbol.types.push(ty);
                symbol.mutable = true;
            }
            return (found, false);
        }

        let created = SymbolRef {
            owner: current.clone(),
            name: name.to_string(),
        };
        self.symbols.insert(created.clone(), Symbol::new(ty));
        (created, true)
    }

    /// Mark a record as reassigned even if it has not been yet.
    pub fn mark_mutable(&mut self, symbol: &SymbolRef) {
        if let Some(record) = self.symbols.get_mut(symbol) {
            record.mutable = true;
        }
    }

    /// Declare `name` in `current` without searching ancestors.
    ///
    /// Used for parameters, which always shadow outer names. Redeclaring
    /// replaces the record.
    pub fn declare_local(
        &mut self,
        current: &NamespacePath,
        name: &str,
        ty: Type,
        alias: Option<String>,
    ) -> SymbolRef {
        let symbol = SymbolRef {
            owner: current.clone(),
            name: name.to_string(),
        };
        let mut record = Symbol::new(ty);
        record.alias = alias;
        self.symbols.insert(symbol.clone(), record);
        symbol
    }

    /// Load access: nearest record for `name`, searching upward from `current`.
    pub fn lookup(&self, current: &NamespacePath, name: &str) -> Option<SymbolRef> {
        current.ancestors().find_map(|owner| {
            let candidate = SymbolRef {
                owner,
                name: name.to_string(),
            };
            self.symbols.contains_key(&candidate).then_some(candidate)
        })
    }

    pub fn get(&self, symbol: &SymbolRef) -> Option<&Symbol> {
        self.symbols.get(symbol)
    }

    pub fn is_mutable(&self, symbol: &SymbolRef) -> bool {
        self.get(symbol).is_some_and(Symbol::is_mutable)
    }

    /// Nearest namespace of kind `Class`, starting at `current` itself.
    pub fn nearest_class(&self, current: &NamespacePath) -> Option<NamespacePath> {
        current
            .ancestors()
            .find(|path| self.scope_kind(path) == Some(ScopeKind::Class))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> Type {
        Type::named("int")
    }

    #[test]
    fn test_paths() {
        let root = NamespacePath::root();
        let method = root.child("Point").child("move");
        assert_eq!(method.as_str(), "main.Point.move");
        assert_eq!(method.name(), "move");
        assert_eq!(method.parent(), Some(root.child("Point")));
        assert_eq!(root.parent(), None);
        let chain: Vec<_> = method.ancestors().map(|p| p.to_string()).collect();
        assert_eq!(chain, ["main.Point.move", "main.Point", "main"]);
    }

    #[test]
    fn test_inner_declaration_resolves_inside_only() {
        let mut table = SymbolTable::new();
        let root = NamespacePath::root();
        let f = root.child("f");
        let g = root.child("g");

        let (inner, created) = table.declare_or_update(&f, "x", int());
        assert!(created);
        assert_eq!(table.lookup(&f, "x"), Some(inner));
        assert_eq!(table.lookup(&g, "x"), None);
        assert_eq!(table.lookup(&root, "x"), None);
    }

    #[test]
    fn test_sibling_sees_nearest_ancestor() {
        let mut table = SymbolTable::new();
        let root = NamespacePath::root();
        let f = root.child("f");
        let (outer, _) = table.declare_or_update(&root, "x", int());
        let inner = table.declare_local(&f, "x", Type::named("str"), None);

        assert_eq!(table.lookup(&f, "x"), Some(inner));
        assert_eq!(table.lookup(&root.child("g"), "x"), Some(outer));
    }

    #[test]
    fn test_reassignment_marks_owner_mutable() {
        let mut table = SymbolTable::new();
        let root = NamespacePath::root();
        let f = root.child("f");
        let (outer, _) = table.declare_or_update(&root, "total", int());
        assert!(!table.is_mutable(&outer));

        let (updated, created) = table.declare_or_update(&f, "total", Type::named("float"));
        assert!(!created);
        assert_eq!(updated, outer);
        assert!(table.is_mutable(&outer));
        assert_eq!(table.get(&outer).unwrap().current_type(), Type::named("float"));
        assert_eq!(table.get(&outer).unwrap().types().len(), 2);
        // no record was created in the searching scope
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_nearest_class() {
        let mut table = SymbolTable::new();
        let class = NamespacePath::root().child("Point");
        table.declare_scope(class.clone(), ScopeKind::Class);
        let method = class.child("move");
        table.declare_scope(method.clone(), ScopeKind::Function);

        assert_eq!(table.nearest_class(&method), Some(class));
        assert_eq!(table.nearest_class(&NamespacePath::root()), None);
    }
}
