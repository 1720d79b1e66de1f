//! Callback bindings: the six ways a node can be wired to host logic.
//!
//! Every callback-carrying element (Action, Condition, Loop, Utility branch
//! scorer, transition guard) stores one [`Callback`].  The variant fixes how
//! it is invoked; the element only ever calls [`Callback::invoke`].
//!
//! The [`Generic`][Callback::Generic] variant defers to an [`Invocable`],
//! which answers with a dynamically typed [`Value`].  That is the seam for
//! hosts that resolve targets at load time (scripting bridges, reflection
//! tables) rather than at compile time.

use crate::{CallbackError, CallbackResult};

/// How a node's bound callback is invoked.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActivationMode {
    NoArgs,
    Bool,
    Int,
    Float,
    String,
    /// Opaque invocation through an [`Invocable`].
    Other,
}

/// Dynamically typed result of an [`Invocable`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i32),
    Float(f32),
    Str(String),
}

/// Conversion from a [`Value`] into a node's result type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> CallbackResult<Self>;
}

impl FromValue for () {
    /// Actions discard whatever the call returned.
    #[inline]
    fn from_value(_value: Value) -> CallbackResult<Self> {
        Ok(())
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> CallbackResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(CallbackError::unexpected(format!("expected bool, got {other:?}"))),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> CallbackResult<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f32),
            other => Err(CallbackError::unexpected(format!("expected number, got {other:?}"))),
        }
    }
}

/// Opaque, late-bound invocation target.
///
/// Closures of the shape `Fn(&mut C) -> CallbackResult<Value>` implement
/// this automatically.
pub trait Invocable<C> {
    fn invoke(&self, ctx: &mut C) -> CallbackResult<Value>;
}

impl<C, F> Invocable<C> for F
where
    F: Fn(&mut C) -> CallbackResult<Value>,
{
    #[inline]
    fn invoke(&self, ctx: &mut C) -> CallbackResult<Value> {
        self(ctx)
    }
}

type NoArgFn<C, T> = Box<dyn Fn(&mut C) -> CallbackResult<T>>;
type ArgFn<C, A, T> = Box<dyn Fn(&mut C, A) -> CallbackResult<T>>;
type StrFn<C, T> = Box<dyn Fn(&mut C, &str) -> CallbackResult<T>>;

/// A bound callback producing `T` from the host context `C`.
///
/// | Variant     | Invocation                        |
/// |-------------|-----------------------------------|
/// | `NoArgs`    | `f(ctx)`                          |
/// | `Bool`      | `f(ctx, stored_bool)`             |
/// | `Int`       | `f(ctx, stored_int)`              |
/// | `Float`     | `f(ctx, stored_float)`            |
/// | `Str`       | `f(ctx, &stored_string)`          |
/// | `Generic`   | `invocable.invoke(ctx)` → convert |
pub enum Callback<C, T> {
    NoArgs(NoArgFn<C, T>),
    Bool(ArgFn<C, bool, T>, bool),
    Int(ArgFn<C, i32, T>, i32),
    Float(ArgFn<C, f32, T>, f32),
    Str(StrFn<C, T>, String),
    Generic(Box<dyn Invocable<C>>),
}

impl<C, T> Callback<C, T> {
    pub fn no_args(f: impl Fn(&mut C) -> CallbackResult<T> + 'static) -> Self {
        Callback::NoArgs(Box::new(f))
    }

    pub fn with_bool(f: impl Fn(&mut C, bool) -> CallbackResult<T> + 'static, arg: bool) -> Self {
        Callback::Bool(Box::new(f), arg)
    }

    pub fn with_int(f: impl Fn(&mut C, i32) -> CallbackResult<T> + 'static, arg: i32) -> Self {
        Callback::Int(Box::new(f), arg)
    }

    pub fn with_float(f: impl Fn(&mut C, f32) -> CallbackResult<T> + 'static, arg: f32) -> Self {
        Callback::Float(Box::new(f), arg)
    }

    pub fn with_str(
        f: impl Fn(&mut C, &str) -> CallbackResult<T> + 'static,
        arg: impl Into<String>,
    ) -> Self {
        Callback::Str(Box::new(f), arg.into())
    }

    pub fn generic(invocable: impl Invocable<C> + 'static) -> Self {
        Callback::Generic(Box::new(invocable))
    }

    pub fn mode(&self) -> ActivationMode {
        match self {
            Callback::NoArgs(_) => ActivationMode::NoArgs,
            Callback::Bool(..) => ActivationMode::Bool,
            Callback::Int(..) => ActivationMode::Int,
            Callback::Float(..) => ActivationMode::Float,
            Callback::Str(..) => ActivationMode::String,
            Callback::Generic(_) => ActivationMode::Other,
        }
    }
}

impl<C, T: FromValue> Callback<C, T> {
    /// Invoke the callback against `ctx`.
    pub fn invoke(&self, ctx: &mut C) -> CallbackResult<T> {
        match self {
            Callback::NoArgs(f) => f(ctx),
            Callback::Bool(f, arg) => f(ctx, *arg),
            Callback::Int(f, arg) => f(ctx, *arg),
            Callback::Float(f, arg) => f(ctx, *arg),
            Callback::Str(f, arg) => f(ctx, arg),
            Callback::Generic(inv) => inv.invoke(ctx).and_then(T::from_value),
        }
    }
}
