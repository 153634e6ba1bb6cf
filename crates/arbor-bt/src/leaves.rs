//! Ready-made leaves: closure adapters and variable-driven conditions, triggers and actions.

use std::fmt;
use std::marker::PhantomData;

use arbor_core::Status;
use tracing::warn;

use crate::{Action, Condition, EvalCtx, NodeCtx, Trigger, VarValue};

/// Stateless action backed by a function.
pub struct ActionFn<C, F> {
    f: F,
    _host: PhantomData<fn(&mut C)>,
}

impl<C, F> ActionFn<C, F>
where
    F: Fn(&mut NodeCtx<'_, C>) -> Status + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _host: PhantomData,
        }
    }
}

impl<C, F> Action<C> for ActionFn<C, F>
where
    F: Fn(&mut NodeCtx<'_, C>) -> Status + Send + Sync,
{
    fn execute(&self, ctx: &mut NodeCtx<'_, C>) -> Status {
        (self.f)(ctx)
    }
}

pub struct ConditionFn<C, F> {
    f: F,
    _host: PhantomData<fn(&C)>,
}

impl<C, F> ConditionFn<C, F>
where
    F: Fn(&EvalCtx<'_, C>) -> Option<usize> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _host: PhantomData,
        }
    }
}

impl<C, F> Condition<C> for ConditionFn<C, F>
where
    F: Fn(&EvalCtx<'_, C>) -> Option<usize> + Send + Sync,
{
    fn evaluate(&self, ctx: &EvalCtx<'_, C>) -> Option<usize> {
        (self.f)(ctx)
    }
}

pub struct TriggerFn<C, F> {
    f: F,
    _host: PhantomData<fn(&C)>,
}

impl<C, F> TriggerFn<C, F>
where
    F: Fn(&EvalCtx<'_, C>) -> bool + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _host: PhantomData,
        }
    }
}

impl<C, F> Trigger<C> for TriggerFn<C, F>
where
    F: Fn(&EvalCtx<'_, C>) -> bool + Send + Sync,
{
    fn can_fire(&self, ctx: &EvalCtx<'_, C>) -> bool {
        (self.f)(ctx)
    }
}

impl<C, F> fmt::Debug for ActionFn<C, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActionFn")
    }
}

/// Two-way switch on a bool variable: child 0 while it is true, child 1 while false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSwitch {
    pub variable: String,
}

impl VariableSwitch {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl<C> Condition<C> for VariableSwitch {
    fn evaluate(&self, ctx: &EvalCtx<'_, C>) -> Option<usize> {
        ctx.bool_variable(&self.variable)
            .map(|on| if on { 0 } else { 1 })
    }
}

/// Selects the child whose index an int variable holds. Negative values select nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexVariable {
    pub variable: String,
}

impl IndexVariable {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl<C> Condition<C> for IndexVariable {
    fn evaluate(&self, ctx: &EvalCtx<'_, C>) -> Option<usize> {
        ctx.int_variable(&self.variable)
            .and_then(|index| usize::try_from(index).ok())
    }
}

/// Fires while a bool variable is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableTrigger {
    pub variable: String,
}

impl VariableTrigger {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl<C> Trigger<C> for VariableTrigger {
    fn can_fire(&self, ctx: &EvalCtx<'_, C>) -> bool {
        ctx.bool_variable(&self.variable).unwrap_or(false)
    }
}

/// Writes a tree variable of the running instance and finishes. Fails when the variable is
/// missing or holds another kind of value.
#[derive(Debug, Clone, PartialEq)]
pub struct SetVariable {
    pub variable: String,
    pub value: VarValue,
}

impl SetVariable {
    pub fn new(variable: impl Into<String>, value: impl Into<VarValue>) -> Self {
        Self {
            variable: variable.into(),
            value: value.into(),
        }
    }
}

impl<C> Action<C> for SetVariable {
    fn execute(&self, ctx: &mut NodeCtx<'_, C>) -> Status {
        match ctx.set_variable(&self.variable, self.value) {
            Ok(_) => Status::Finished,
            Err(err) => {
                warn!(node = %ctx.node(), %err, "set variable failed");
                Status::Failed
            }
        }
    }
}
