//! Generic lexical environment: a parent-linked chain of frames.
//!
//! Used twice with different payloads: the analyzer threads an
//! `Environment<DeclInfo>` to track which names are declared (and whether
//! they're mutable) without touching values, and the evaluator threads an
//! `Environment<Value>` for actual bindings. Frames are reference-counted so
//! [`Environment::slice`] can share frame content with its source without
//! copying, the same way the original interpreter's `Environment.Slice`
//! reuses its frame map by reference and only cuts the parent chain.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type Frame<T> = Rc<RefCell<HashMap<String, T>>>;

struct EnvNode<T> {
    frame: Frame<T>,
    parent: Option<Environment<T>>,
}

/// A lexical scope. Cloning is cheap (an `Rc` bump) and all clones observe
/// the same underlying frame.
pub struct Environment<T>(Rc<EnvNode<T>>);

impl<T> Clone for Environment<T> {
    fn clone(&self) -> Self {
        Environment(self.0.clone())
    }
}

impl<T> Environment<T> {
    /// A fresh environment with no parent.
    #[must_use]
    pub fn new() -> Self {
        Environment(Rc::new(EnvNode {
            frame: Rc::new(RefCell::new(HashMap::new())),
            parent: None,
        }))
    }

    /// A fresh child frame of `parent` (or a root frame, if `parent` is
    /// `None` — used for calls to functions that captured no closure).
    #[must_use]
    pub fn child_of(parent: Option<Environment<T>>) -> Self {
        Environment(Rc::new(EnvNode {
            frame: Rc::new(RefCell::new(HashMap::new())),
            parent,
        }))
    }

    /// Declares `name` in the innermost frame only, never consulting
    /// parents. Overwrites a prior binding of the same name in this frame.
    pub fn add(&self, name: impl Into<String>, value: T) {
        self.0.frame.borrow_mut().insert(name.into(), value);
    }

    /// `true` if `name` is declared in this exact frame.
    #[must_use]
    pub fn has_directly(&self, name: &str) -> bool {
        self.0.frame.borrow().contains_key(name)
    }

    /// `true` if `name` is declared in this frame or any ancestor.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        if self.has_directly(name) {
            return true;
        }
        match &self.0.parent {
            Some(p) => p.has(name),
            None => false,
        }
    }

    /// Sets `name` on the frame that declares it, searching outward from
    /// this one. Returns `false` (a silent no-op) if `name` is undeclared
    /// anywhere in the chain.
    pub fn set(&self, name: &str, value: T) -> bool {
        if self.has_directly(name) {
            self.0.frame.borrow_mut().insert(name.to_string(), value);
            return true;
        }
        match &self.0.parent {
            Some(p) => p.set(name, value),
            None => false,
        }
    }

    /// Truncates the parent chain to the first `n` frames (this one plus
    /// `n - 1` ancestors), sharing frame content with the source rather
    /// than deep-copying it. Never mutates `self` or any ancestor — a
    /// fresh chain of wrapper nodes is built instead. Returns `None` for
    /// `n == 0`.
    #[must_use]
    pub fn slice(&self, n: u32) -> Option<Environment<T>> {
        if n == 0 {
            return None;
        }

        let mut frames = Vec::with_capacity(n as usize);
        let mut cur = Some(self.clone());
        while frames.len() < n as usize {
            let Some(env) = cur else { break };
            frames.push(env.0.frame.clone());
            cur = env.0.parent.clone();
        }

        let mut parent: Option<Environment<T>> = None;
        for frame in frames.into_iter().rev() {
            parent = Some(Environment(Rc::new(EnvNode { frame, parent })));
        }
        parent
    }
}

impl<T: Clone> Environment<T> {
    /// Looks up `name`, walking outward through parents. `None` if
    /// undeclared anywhere in the chain.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<T> {
        if let Some(v) = self.0.frame.borrow().get(name) {
            return Some(v.clone());
        }
        self.0.parent.as_ref().and_then(|p| p.get(name))
    }
}

impl<T> Default for Environment<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_walks_parent_chain() {
        let root = Environment::<i32>::new();
        root.add("a", 1);
        let child = Environment::child_of(Some(root.clone()));
        child.add("b", 2);
        assert_eq!(child.get("a"), Some(1));
        assert_eq!(child.get("b"), Some(2));
        assert_eq!(root.get("b"), None);
    }

    #[test]
    fn set_updates_declaring_frame_and_is_visible_through_children() {
        let root = Environment::<i32>::new();
        root.add("a", 1);
        let child = Environment::child_of(Some(root.clone()));
        assert!(child.set("a", 9));
        assert_eq!(root.get("a"), Some(9));
    }

    #[test]
    fn set_on_undeclared_name_is_a_silent_no_op() {
        let root = Environment::<i32>::new();
        assert!(!root.set("missing", 1));
    }

    #[test]
    fn has_directly_vs_has() {
        let root = Environment::<i32>::new();
        root.add("a", 1);
        let child = Environment::child_of(Some(root.clone()));
        assert!(!child.has_directly("a"));
        assert!(child.has("a"));
    }

    #[test]
    fn slice_zero_returns_none() {
        let root = Environment::<i32>::new();
        assert!(root.slice(0).is_none());
    }

    #[test]
    fn slice_shares_frames_without_mutating_source() {
        let root = Environment::<i32>::new();
        root.add("a", 1);
        let mid = Environment::child_of(Some(root.clone()));
        mid.add("b", 2);
        let leaf = Environment::child_of(Some(mid.clone()));
        leaf.add("c", 3);

        let sliced = leaf.slice(2).unwrap();
        assert_eq!(sliced.get("c"), Some(3));
        assert_eq!(sliced.get("b"), Some(2));
        assert_eq!(sliced.get("a"), None); // cut off at depth 2

        // Source chain is untouched: full lookup from leaf still reaches "a".
        assert_eq!(leaf.get("a"), Some(1));

        // Mutating through the shared frame is visible on both views.
        sliced.set("c", 30);
        assert_eq!(leaf.get("c"), Some(30));
    }
}
