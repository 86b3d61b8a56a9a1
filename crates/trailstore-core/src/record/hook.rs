use crate::{
    action::{ActionKind, UpdateAction},
    error::Error,
    model::FieldModel,
    record::Record,
    value::Value,
};
use chrono::{DateTime, Utc};
use std::{collections::BTreeMap, fmt, sync::Arc};

///
/// HookContext
/// Per-operation inputs shared by every hook of one save or update.
/// A single `now` is sampled per operation.
///

#[derive(Clone, Copy, Debug)]
pub struct HookContext {
    pub now: DateTime<Utc>,
}

pub type InitFn = dyn Fn(&mut Record) -> Result<(), Error> + Send + Sync;
pub type SaveFn = dyn Fn(&mut Record, &HookContext) -> Result<(), Error> + Send + Sync;
pub type UpdateFn = dyn Fn(&Record, &HookContext) -> Result<Vec<UpdateAction>, Error> + Send + Sync;
pub type ActionFn = dyn Fn(&Record, Option<&Value>) -> Result<Vec<UpdateAction>, Error> + Send + Sync;

///
/// Hook
/// Named lifecycle function. The name is diagnostic only; dispatch is by
/// function value.
///

pub struct Hook<F: ?Sized> {
    pub name: &'static str,
    pub(crate) run: Arc<F>,
}

impl<F: ?Sized> Clone for Hook<F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            run: Arc::clone(&self.run),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hook").field(&self.name).finish()
    }
}

///
/// HookRegistry
///
/// Ordered, append-only hook lists for one record type. Every behavior
/// appends to the same lists, so composing behaviors is a concatenation and
/// never an override.
///

#[derive(Debug, Default)]
pub struct HookRegistry {
    pub(crate) on_init: Vec<Hook<InitFn>>,
    pub(crate) before_save: Vec<Hook<SaveFn>>,
    pub(crate) on_update: Vec<Hook<UpdateFn>>,
    pub(crate) action_hooks: BTreeMap<(ActionKind, String), Vec<Hook<ActionFn>>>,
    pub(crate) meta_fields: Vec<FieldModel>,
}

impl HookRegistry {
    /// Run after construction; derives fields from caller input.
    pub fn on_init<F>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        F: Fn(&mut Record) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.on_init.push(Hook {
            name,
            run: Arc::new(f),
        });
        self
    }

    /// Run before every full-record write, in registration order.
    pub fn before_save<F>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        F: Fn(&mut Record, &HookContext) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.before_save.push(Hook {
            name,
            run: Arc::new(f),
        });
        self
    }

    /// Contribute actions to every partial update.
    pub fn on_update<F>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        F: Fn(&Record, &HookContext) -> Result<Vec<UpdateAction>, Error> + Send + Sync + 'static,
    {
        self.on_update.push(Hook {
            name,
            run: Arc::new(f),
        });
        self
    }

    /// Generate companion actions whenever `kind` targets `field`.
    pub fn on_action<F>(
        &mut self,
        kind: ActionKind,
        field: &'static str,
        name: &'static str,
        f: F,
    ) -> &mut Self
    where
        F: Fn(&Record, Option<&Value>) -> Result<Vec<UpdateAction>, Error> + Send + Sync + 'static,
    {
        self.action_hooks
            .entry((kind, field.to_string()))
            .or_default()
            .push(Hook {
                name,
                run: Arc::new(f),
            });
        self
    }

    /// Declare a meta attribute owned by the registering behavior.
    pub fn meta_field(&mut self, field: FieldModel) -> &mut Self {
        self.meta_fields.push(FieldModel { meta: true, ..field });
        self
    }

    #[must_use]
    pub fn on_init_names(&self) -> Vec<&'static str> {
        self.on_init.iter().map(|hook| hook.name).collect()
    }

    #[must_use]
    pub fn before_save_names(&self) -> Vec<&'static str> {
        self.before_save.iter().map(|hook| hook.name).collect()
    }

    #[must_use]
    pub fn on_update_names(&self) -> Vec<&'static str> {
        self.on_update.iter().map(|hook| hook.name).collect()
    }

    pub(crate) fn action_hooks_for(&self, kind: ActionKind, field: &str) -> &[Hook<ActionFn>] {
        self.action_hooks
            .get(&(kind, field.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

///
/// Behavior
///
/// Independently authored lifecycle component (timestamps, versioning,
/// search normalization, ...). A record type is a base declaration plus an
/// ordered list of behaviors; each one only ever appends to the registry.
///

pub trait Behavior: Send + Sync {
    fn name(&self) -> &'static str;

    fn register(&self, hooks: &mut HookRegistry);
}
