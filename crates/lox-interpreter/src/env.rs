use std::ops::Deref;

use gc::{Finalize, Gc, GcCell, Trace};
use lox_common::error::{Error, NameError, Result};
use lox_common::types::Span;
use rustc_hash::FxHashMap;

use crate::object::Object;

/// A scope frame. Cloning an `Env` clones the handle, not the bindings, so
/// a closure that captures a frame keeps it (and its ancestors) alive for as
/// long as the closure itself is reachable.
#[derive(Clone, Debug, Default, Finalize, Trace)]
pub struct Env(Gc<GcCell<EnvImpl>>);

impl Deref for Env {
    type Target = Gc<GcCell<EnvImpl>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Env {
    pub fn with_parent(parent: &Env) -> Self {
        let env = EnvImpl { map: FxHashMap::default(), parent: Some(parent.clone()) };
        Self(Gc::new(GcCell::new(env)))
    }

    /// Binds `name` in this frame, replacing any previous binding here.
    pub fn define(&mut self, name: &str, value: Object) {
        self.borrow_mut().map.insert(name.to_string(), value);
    }

    /// Looks `name` up in this frame, then in each enclosing frame.
    pub fn get(&self, name: &str, span: &Span) -> Result<Object> {
        let mut env = self.clone();
        loop {
            if let Some(value) = env.borrow().map.get(name) {
                return Ok(value.clone());
            }
            let parent = env.borrow().parent.clone();
            match parent {
                Some(parent) => env = parent,
                None => return Err(not_defined(name, span)),
            }
        }
    }

    /// Reads `name` from the frame exactly `depth` links outward.
    pub fn get_at(&self, name: &str, depth: usize, span: &Span) -> Result<Object> {
        let env = self.ancestor(depth, name);
        let value = env.borrow().map.get(name).cloned();
        value.ok_or_else(|| not_defined(name, span))
    }

    /// Overwrites `name` in the nearest frame that binds it.
    pub fn assign(&mut self, name: &str, value: Object, span: &Span) -> Result<()> {
        let mut env = self.clone();
        loop {
            if let Some(entry) = env.borrow_mut().map.get_mut(name) {
                *entry = value;
                return Ok(());
            }
            let parent = env.borrow().parent.clone();
            match parent {
                Some(parent) => env = parent,
                None => return Err(not_defined(name, span)),
            }
        }
    }

    /// Overwrites `name` in the frame exactly `depth` links outward.
    pub fn assign_at(&mut self, name: &str, value: Object, depth: usize, span: &Span) -> Result<()> {
        let env = self.ancestor(depth, name);
        let mut env = env.borrow_mut();
        match env.map.get_mut(name) {
            Some(entry) => {
                *entry = value;
                Ok(())
            }
            None => Err(not_defined(name, span)),
        }
    }

    fn ancestor(&self, depth: usize, name: &str) -> Env {
        let mut env = self.clone();
        for _ in 0..depth {
            let parent = env.borrow().parent.clone();
            env = parent
                .unwrap_or_else(|| unreachable!("variable pointed to invalid scope: {name:?}"));
        }
        env
    }
}

fn not_defined(name: &str, span: &Span) -> (Error, Span) {
    (Error::NameError(NameError::NotDefined { name: name.to_string() }), span.clone())
}

#[derive(Debug, Default, Finalize, Trace)]
pub struct EnvImpl {
    map: FxHashMap<String, Object>,
    parent: Option<Env>,
}
