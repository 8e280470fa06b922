//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The context that codecs see while parsing, building and measuring, and
//! the expressions evaluated against it.

use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::value::{Container, Value};

/// Tracks where a codec is operating and what it may refer to.
///
/// Like the stack of positions a decoder keeps for error messages, contexts
/// are constructed on the stack and chained by reference. Each level names
/// the field being processed and its bit position; aggregate fields
/// additionally carry the siblings decoded (or being built) so far, which is
/// what `Expr::this` reads.
///
/// A `Context` can be formatted with `Display` to show the path to the
/// current location.
#[derive(Clone)]
pub struct Context<'a> {
    /// The context of the enclosing level, if any.
    pub next: Option<&'a Context<'a>>,
    /// The name of the field or element being processed at this level.
    pub field: &'a str,
    /// The bit position at which this level started.
    pub pos: u64,
    /// The recursion depth.
    pub depth: usize,
    /// Whether this level is inside a bit-packed aggregate.
    pub bitwise: bool,
    /// The configuration in effect.
    pub config: &'a Config,
    /// Parameters supplied by the caller of `load`, `build` or `sizeof`.
    pub params: &'a Container,
    /// The sibling values visible at this level.
    pub this: Option<&'a Container>,
    /// Whether this level opened a new sibling scope.
    scope: bool,
}

impl<'a> Context<'a> {
    /// Returns a top-level context named `name`.
    pub fn top(name: &'a str, config: &'a Config, params: &'a Container)
               -> Self {
        Context {
            next: None,
            field: name,
            pos: 0,
            depth: 0,
            bitwise: false,
            config,
            params,
            this: None,
            scope: false,
        }
    }

    fn check_depth(&self) -> Result<()> {
        if self.depth >= self.config.recursion_limit {
            Err(Error::RecursionLimitExceeded(self.to_string()))
        } else {
            Ok(())
        }
    }

    /// Creates a context subordinate to this one for an array element or a
    /// wrapped codec. Sibling visibility is inherited.
    pub fn push(&'a self, field: &'a str, pos: u64) -> Result<Self> {
        self.check_depth()?;
        Ok(Context {
            next: Some(self),
            field,
            pos,
            depth: self.depth + 1,
            bitwise: self.bitwise,
            config: self.config,
            params: self.params,
            this: self.this,
            scope: false,
        })
    }

    /// Creates a context for a field of an aggregate, whose siblings are
    /// `this`. The `_` path segment from within the field refers back to the
    /// scope of `self`.
    pub fn enter(&'a self, field: &'a str, pos: u64,
                 this: Option<&'a Container>, bitwise: bool)
                 -> Result<Self> {
        self.check_depth()?;
        Ok(Context {
            next: Some(self),
            field,
            pos,
            depth: self.depth + 1,
            bitwise,
            config: self.config,
            params: self.params,
            this,
            scope: true,
        })
    }

    fn parent_scope(&self) -> Option<&Context<'a>> {
        let mut level = self;
        loop {
            if level.scope {
                return level.next;
            }
            level = level.next?;
        }
    }

    /// Resolve a dotted path such as `header.length` or `_.count`.
    ///
    /// The first segment names a sibling; if there is no such sibling it
    /// names a caller parameter instead. Each leading `_` moves out to the
    /// enclosing aggregate's siblings. Later segments index into the value
    /// found so far.
    pub fn lookup(&self, path: &str) -> Result<Value> {
        let mut segments = path.split('.');
        let mut level = self;
        let mut head = segments.next().unwrap_or("");
        while "_" == head {
            level = level.parent_scope().ok_or_else(
                || Error::ContextRequired(self.to_string(), path.to_owned()))?;
            head = segments.next().unwrap_or("");
        }

        let found = level.this.and_then(|t| t.get(head))
            .or_else(|| self.params.get(head))
            .cloned();
        let mut value = found.ok_or_else(
            || Error::ContextRequired(self.to_string(), path.to_owned()))?;

        for segment in segments {
            value = value.member(segment)?.ok_or_else(
                || Error::ContextRequired(self.to_string(), path.to_owned()))?;
        }
        Ok(value)
    }
}

impl<'a> fmt::Display for Context<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(ref next) = self.next {
            write!(f, "{}.{}{{{}}}", next, self.field, self.pos)
        } else {
            write!(f, "{}{{{}}}", self.field, self.pos)
        }
    }
}

impl<'a> fmt::Debug for Context<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Context({})", self)
    }
}

/// A value computed from the context at parse or build time.
///
/// Counts, lengths, offsets and switch keys are all expressions. They may
/// only read siblings declared before the field that uses them; declaring a
/// schema that violates this is rejected when the schema is finished.
#[derive(Clone)]
pub enum Expr {
    /// A constant.
    Const(Value),
    /// A path into the context, as understood by `Context::lookup`.
    This(String),
    /// The length of a list, byte string or text found at a path.
    Len(String),
    /// An arbitrary function of the context.
    Func(Arc<dyn Fn (&Context) -> Result<Value> + Send + Sync>),
}

/// Shorthand for `Expr::This`.
pub fn this<S : Into<String>>(path: S) -> Expr {
    Expr::This(path.into())
}

/// Shorthand for `Expr::Len`.
pub fn len_of<S : Into<String>>(path: S) -> Expr {
    Expr::Len(path.into())
}

impl Expr {
    /// Wrap a closure as an expression.
    pub fn func<F>(f: F) -> Self
    where F : Fn (&Context) -> Result<Value> + Send + Sync + 'static {
        Expr::Func(Arc::new(f))
    }

    /// Evaluate against `ctx`.
    pub fn eval(&self, ctx: &Context) -> Result<Value> {
        match *self {
            Expr::Const(ref v) => Ok(v.clone()),
            Expr::This(ref path) => ctx.lookup(path),
            Expr::Len(ref path) => {
                let n = match ctx.lookup(path)? {
                    Value::List(ref l) => l.len(),
                    Value::Bytes(ref b) => b.len(),
                    Value::Str(ref s) => s.len(),
                    Value::None => 0,
                    other => return Err(Error::Build(
                        ctx.to_string(), format!(
                            "cannot take length of {} at `{}`",
                            other.type_name(), path))),
                };
                Ok(Value::Int(n as i128))
            },
            Expr::Func(ref f) => f(ctx),
        }
    }

    /// Evaluate to a non-negative count.
    pub fn eval_usize(&self, ctx: &Context) -> Result<usize> {
        let v = self.eval(ctx)?;
        match v.as_int() {
            Some(n) if n >= 0 && n <= usize::max_value() as i128 =>
                Ok(n as usize),
            _ => Err(Error::Parse(ctx.to_string(), format!(
                "expected a non-negative count, got {:?}", v))),
        }
    }

    /// Return the first path segment of every sibling this expression
    /// reads directly, ignoring paths that start with `_`.
    pub fn sibling_refs(&self) -> Vec<&str> {
        match *self {
            Expr::This(ref path) | Expr::Len(ref path) => {
                let head = path.split('.').next().unwrap_or("");
                if "_" == head { vec![] } else { vec![head] }
            },
            _ => vec![],
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Expr::Const(ref v) => write!(f, "{:?}", v),
            Expr::This(ref p) => write!(f, "this.{}", p),
            Expr::Len(ref p) => write!(f, "len(this.{})", p),
            Expr::Func(..) => write!(f, "<fn>"),
        }
    }
}

macro_rules! expr_from {
    ($($t:ty),*) => { $(
        impl From<$t> for Expr {
            fn from(v: $t) -> Self {
                Expr::Const(v.into())
            }
        }
    )* }
}
expr_from!(i8, u8, i16, u16, i32, u32, i64, u64, usize, bool, Value);

impl<'a> From<&'a str> for Expr {
    fn from(path: &'a str) -> Self {
        this(path)
    }
}
