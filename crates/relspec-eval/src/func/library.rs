//! Named collections of functions.

use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use relspec_types::ReferenceId;

use super::{Descriptor, DynDescriptor, EagerEvaluationDescriptor};

/// Functions by name.
///
/// Cloning is cheap: descriptors are shared.
pub struct Library<R: ReferenceId> {
    functions: BTreeMap<String, DynDescriptor<R>>,
}

impl<R: ReferenceId> Clone for Library<R> {
    fn clone(&self) -> Self {
        Self {
            functions: self.functions.clone(),
        }
    }
}

impl<R: ReferenceId> Default for Library<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ReferenceId> Library<R> {
    /// An empty library.
    pub fn new() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    /// The builtin functions.
    pub fn standard() -> Self {
        let mut library = Self::new();
        crate::fnlib::register_standard(&mut library);
        library
    }

    /// Add or replace a function.
    pub fn register(&mut self, name: impl Into<String>, descriptor: DynDescriptor<R>) {
        self.functions.insert(name.into(), descriptor);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, descriptor: impl Descriptor<R> + 'static) -> Self {
        self.register(name, Rc::new(descriptor));
        self
    }

    pub fn get(&self, name: &str) -> Option<&DynDescriptor<R>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Function names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// The same functions, with those that evaluate expressions resolving
    /// function names through `scope`.
    pub fn bind(&self, scope: &Weak<Library<R>>, eager: bool) -> Self {
        Self {
            functions: self
                .functions
                .iter()
                .map(|(name, descriptor)| {
                    let bound = descriptor
                        .bind_library(scope, eager)
                        .unwrap_or_else(|| Rc::clone(descriptor));
                    (name.clone(), bound)
                })
                .collect(),
        }
    }

    /// The same functions, each wrapped in an [`EagerEvaluationDescriptor`].
    pub fn eager(&self) -> Self {
        Self {
            functions: self
                .functions
                .iter()
                .map(|(name, descriptor)| {
                    let wrapped: DynDescriptor<R> =
                        Rc::new(EagerEvaluationDescriptor::new(Rc::clone(descriptor)));
                    (name.clone(), wrapped)
                })
                .collect(),
        }
    }
}
