//! Event handlers notified by informers

/// Receives notifications about changes to an informer's cache.
///
/// Handlers are called synchronously from the informer task, in event
/// order, so they should only do cheap work (typically enqueueing a key).
pub trait ResourceEventHandler<T>: Send + Sync {
    fn on_add(&self, obj: &T);

    fn on_update(&self, old: &T, new: &T);

    fn on_delete(&self, obj: &T);
}

type ObjectFn<T> = Box<dyn Fn(&T) + Send + Sync>;
type UpdateFn<T> = Box<dyn Fn(&T, &T) + Send + Sync>;

/// Handler built from optional closures. Unset closures are no-ops.
pub struct EventHandlerFuncs<T> {
    pub add: Option<ObjectFn<T>>,
    pub update: Option<UpdateFn<T>>,
    pub delete: Option<ObjectFn<T>>,
}

impl<T> Default for EventHandlerFuncs<T> {
    fn default() -> Self {
        Self {
            add: None,
            update: None,
            delete: None,
        }
    }
}

impl<T> EventHandlerFuncs<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_add(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.add = Some(Box::new(f));
        self
    }

    pub fn with_update(mut self, f: impl Fn(&T, &T) + Send + Sync + 'static) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    pub fn with_delete(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.delete = Some(Box::new(f));
        self
    }
}

impl<T> ResourceEventHandler<T> for EventHandlerFuncs<T> {
    fn on_add(&self, obj: &T) {
        if let Some(f) = &self.add {
            f(obj);
        }
    }

    fn on_update(&self, old: &T, new: &T) {
        if let Some(f) = &self.update {
            f(old, new);
        }
    }

    fn on_delete(&self, obj: &T) {
        if let Some(f) = &self.delete {
            f(obj);
        }
    }
}
