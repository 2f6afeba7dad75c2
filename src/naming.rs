// src/naming.rs

//! Naming context resolution shared by resources, tasks and runners.
//!
//! Every named thing carries two [`AttrLayer`]s (its instance overrides and
//! the defaults declared for its kind) plus a set of [`Modifiers`]. Binding
//! it into a [`BindContext`] resolves each attribute independently:
//!
//! 1. instance override,
//! 2. declared default,
//! 3. inherited context value,
//! 4. `namespace` may stay absent; `trial` and `overwrite` are required.
//!
//! Modifiers are applied afterwards: `independent` drops both namespace and
//! trial, `shared_namespace` drops the namespace, `namespace_only` drops
//! the trial flag.

use tracing::trace;

use crate::errors::{BatchdagError, Result};
use crate::types::ParamValue;

/// File-name segment inserted for trial runs.
pub const TRIAL_MARKER: &str = "trial";

/// One precedence level of naming attributes. `None` means "not set here".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrLayer {
    pub namespace: Option<ParamValue>,
    pub trial: Option<bool>,
    pub overwrite: Option<bool>,
}

/// Opt-outs from the inherited naming context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub independent: bool,
    pub shared_namespace: bool,
    pub namespace_only: bool,
}

impl Modifiers {
    pub fn ignores_namespace(&self) -> bool {
        self.independent || self.shared_namespace
    }

    pub fn ignores_trial(&self) -> bool {
        self.independent || self.namespace_only
    }
}

/// Context handed down by the enclosing task or runner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindContext {
    pub namespace: Option<String>,
    pub trial: Option<bool>,
    pub overwrite: Option<bool>,
    /// Names of the enclosing nested runners, outermost first.
    pub scope: Vec<String>,
}

impl BindContext {
    /// Context of a top-level invocation, where trial and overwrite are
    /// always known.
    pub fn top_level(namespace: Option<String>, trial: bool, overwrite: bool) -> Self {
        Self {
            namespace,
            trial: Some(trial),
            overwrite: Some(overwrite),
            scope: Vec::new(),
        }
    }

    /// Context for the tasks of a nested runner called `runner`.
    pub fn entering(mut self, runner: &str) -> Self {
        self.scope.push(runner.to_string());
        self
    }

    /// `name` qualified by the enclosing runners, e.g. `first.t0`.
    pub fn qualify(&self, name: &str) -> String {
        let mut parts: Vec<&str> = self.scope.iter().map(String::as_str).collect();
        parts.push(name);
        parts.join(".")
    }
}

impl From<&Resolved> for BindContext {
    fn from(resolved: &Resolved) -> Self {
        Self {
            namespace: resolved.namespace.clone(),
            trial: Some(resolved.trial),
            overwrite: Some(resolved.overwrite),
            scope: Vec::new(),
        }
    }
}

/// Attribute values fixed by a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub namespace: Option<String>,
    pub trial: bool,
    pub overwrite: bool,
}

impl Resolved {
    /// `[namespace_][trial_]basename`.
    pub fn decorate(&self, basename: &str) -> String {
        let mut name = String::new();
        if let Some(ns) = self.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            name.push_str(ns);
            name.push('_');
        }
        if self.trial {
            name.push_str(TRIAL_MARKER);
            name.push('_');
        }
        name.push_str(basename);
        name
    }
}

/// Resolve one attribute against the three precedence levels.
pub fn resolve_attr<T: Clone>(
    instance: &Option<T>,
    declared: &Option<T>,
    inherited: &Option<T>,
) -> Option<T> {
    instance
        .clone()
        .or_else(|| declared.clone())
        .or_else(|| inherited.clone())
}

fn require<T>(value: Option<T>, attribute: &'static str, owner: &str) -> Result<T> {
    value.ok_or_else(|| BatchdagError::UnresolvedAttribute {
        attribute,
        owner: owner.to_string(),
    })
}

/// Run the full resolution ladder for `owner`.
pub fn resolve(
    owner: &str,
    instance: &AttrLayer,
    declared: &AttrLayer,
    modifiers: Modifiers,
    ctx: &BindContext,
) -> Result<Resolved> {
    let inherited_ns = ctx.namespace.clone().map(ParamValue::Str);

    let namespace = resolve_attr(&instance.namespace, &declared.namespace, &inherited_ns);
    let trial = require(
        resolve_attr(&instance.trial, &declared.trial, &ctx.trial),
        "trial",
        owner,
    )?;
    let overwrite = require(
        resolve_attr(&instance.overwrite, &declared.overwrite, &ctx.overwrite),
        "overwrite",
        owner,
    )?;

    let namespace = if modifiers.ignores_namespace() {
        None
    } else {
        namespace
    };
    let trial = trial && !modifiers.ignores_trial();

    let namespace = match namespace {
        None => None,
        Some(ParamValue::Str(s)) => Some(s),
        Some(other) => {
            return Err(BatchdagError::InvalidType {
                owner: owner.to_string(),
                found: format!("{} `{}`", other.kind(), other),
            });
        }
    };

    trace!(owner, ?namespace, trial, overwrite, "resolved naming attributes");

    Ok(Resolved {
        namespace,
        trial,
        overwrite,
    })
}

/// Naming state embedded in every resource, task and runner.
#[derive(Debug, Clone, Default)]
pub struct Naming {
    pub declared: AttrLayer,
    pub instance: AttrLayer,
    pub modifiers: Modifiers,
    resolved: Option<Resolved>,
}

impl Naming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Naming with defaults declared for a kind of resource or task.
    pub fn with_declared(declared: AttrLayer) -> Self {
        Self {
            declared,
            ..Self::default()
        }
    }

    /// Fix the resolved attributes for `owner` in `ctx`.
    ///
    /// Rebinding replaces the previous resolution.
    pub fn bind(&mut self, owner: &str, ctx: &BindContext) -> Result<&Resolved> {
        let resolved = resolve(owner, &self.instance, &self.declared, self.modifiers, ctx)?;
        Ok(self.resolved.insert(resolved))
    }

    pub fn is_bound(&self) -> bool {
        self.resolved.is_some()
    }

    pub fn resolved(&self, owner: &str) -> Result<&Resolved> {
        self.resolved
            .as_ref()
            .ok_or_else(|| BatchdagError::NotReady(owner.to_string()))
    }

    /// Resolved display name of `basename`.
    pub fn display_name(&self, owner: &str, basename: &str) -> Result<String> {
        Ok(self.resolved(owner)?.decorate(basename))
    }
}

/// Builder-style access to the naming attributes of resources, tasks and
/// runners.
pub trait NamingExt: Sized {
    fn naming_slot(&mut self) -> &mut Naming;

    /// Identity ignores both namespace and trial.
    fn independent(mut self) -> Self {
        self.naming_slot().modifiers.independent = true;
        self
    }

    /// Identity ignores the namespace but respects trial.
    fn shared_namespace(mut self) -> Self {
        self.naming_slot().modifiers.shared_namespace = true;
        self
    }

    /// Identity ignores trial but respects the namespace.
    fn namespace_only(mut self) -> Self {
        self.naming_slot().modifiers.namespace_only = true;
        self
    }

    fn with_namespace(mut self, namespace: impl Into<ParamValue>) -> Self {
        self.naming_slot().instance.namespace = Some(namespace.into());
        self
    }

    fn with_trial(mut self, trial: bool) -> Self {
        self.naming_slot().instance.trial = Some(trial);
        self
    }

    fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.naming_slot().instance.overwrite = Some(overwrite);
        self
    }

    fn with_declared(mut self, declared: AttrLayer) -> Self {
        self.naming_slot().declared = declared;
        self
    }

    fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.naming_slot().modifiers = modifiers;
        self
    }
}

impl NamingExt for Naming {
    fn naming_slot(&mut self) -> &mut Naming {
        self
    }
}
