//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Discriminated dispatch: choosing a codec by a key computed from
//! already-decoded siblings.
//!
//! A `Switch` holds a table from `Key` to `Case`. Registering a codec under
//! a fresh key stores it as a single case; registering another under the
//! same key turns the entry into an overload, a union of every codec
//! registered under that key which is tried in registration order.
//!
//! ```
//! use bitform::{this, Native, Schema, Switch, Value};
//!
//! let payload = Switch::new("Payload", this("kind"));
//! payload.register(0, Native::U8).unwrap();
//! payload.register(1, Native::Str).unwrap();
//!
//! let packet = Schema::builder("Packet")
//!     .field("kind", Native::U8)
//!     .field("body", &payload)
//!     .finish().unwrap();
//!
//! let record = packet.positional(vec![1.into(), "hi".into()]).unwrap();
//! assert_eq!(b"\x01hi\x00".to_vec(), record.build(&Default::default())
//!            .unwrap());
//! assert_eq!(Some(&Value::from("hi")), record.get("body"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::codec::{build_first, measure_same, parse_first, Codec, Kind};
use crate::context::{Context, Expr};
use crate::error::{Error, Result};
use crate::record::{coerce, is_mismatch};
use crate::resolve::{Registry, Ty};
use crate::stream::Stream;
use crate::value::{Key, Value};

/// What a switch key maps to.
#[derive(Clone, Debug)]
pub enum Case {
    /// Exactly one codec was registered under the key.
    Single(Codec),
    /// Several codecs were registered under the key; they are tried in
    /// registration order.
    Overload(Vec<Codec>),
}

impl Case {
    /// The codecs of this case, in the order they are tried.
    pub fn codecs(&self) -> &[Codec] {
        match *self {
            Case::Single(ref c) => ::std::slice::from_ref(c),
            Case::Overload(ref alts) => alts,
        }
    }
}

struct Table {
    name: String,
    key: Expr,
    registry: Registry,
    cases: RwLock<HashMap<Key, Case>>,
    default: RwLock<Option<Codec>>,
}

/// A dispatch table. Cloning is cheap and shares the table, so cases
/// registered through one handle are seen by codecs built from another.
#[derive(Clone)]
pub struct Switch(Arc<Table>);

impl fmt::Debug for Switch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Switch({}, {:?})", self.0.name, self.0.key)
    }
}

impl Switch {
    /// Create an empty switch keyed on `key`, resolving cases against the
    /// default registry.
    pub fn new<N : Into<String>, E : Into<Expr>>(name: N, key: E) -> Self {
        Switch::with_registry(name, key, Registry::default())
    }

    /// Create an empty switch resolving cases against `registry`.
    pub fn with_registry<N : Into<String>, E : Into<Expr>>
        (name: N, key: E, registry: Registry) -> Self
    {
        Switch(Arc::new(Table {
            name: name.into(),
            key: key.into(),
            registry,
            cases: RwLock::new(HashMap::new()),
            default: RwLock::new(None),
        }))
    }

    /// The name used in error locations and debug output.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Every codec registered so far, including the default.
    pub fn codecs(&self) -> Vec<Codec> {
        let mut out: Vec<Codec> = self.0.cases.read().values()
            .flat_map(|c| c.codecs().to_vec()).collect();
        out.extend(self.0.default.read().clone());
        out
    }

    /// The expression computing the key.
    pub fn key(&self) -> &Expr {
        &self.0.key
    }

    /// Register `ty` under `key`.
    ///
    /// The descriptor is resolved immediately, so an unresolvable type fails
    /// here rather than at decode time. A second registration under the same
    /// key creates an overload; registering a union codec and then another
    /// codec appends to the union's alternatives.
    pub fn register<K : Into<Key>, T : Into<Ty>>(&self, key: K, ty: T)
                                                 -> Result<()> {
        let key = key.into();
        let codec = self.0.registry.resolve_in(
            &ty.into(), &format!("{}[{}]", self.0.name, key))?;

        let mut cases = self.0.cases.write();
        let case = match cases.remove(&key) {
            None => Case::Single(codec),
            Some(Case::Single(prev)) => {
                debug!(switch = %self.0.name, key = %key,
                       "case overloaded");
                let mut alts = match *prev.kind() {
                    Kind::Select(ref alts) => alts.clone(),
                    _ => vec![prev.clone()],
                };
                alts.push(codec);
                Case::Overload(alts)
            },
            Some(Case::Overload(mut alts)) => {
                debug!(switch = %self.0.name, key = %key,
                       alternatives = alts.len() + 1, "overload extended");
                alts.push(codec);
                Case::Overload(alts)
            },
        };
        cases.insert(key, case);
        Ok(())
    }

    /// Set the codec used when no case matches.
    pub fn set_default<T : Into<Ty>>(&self, ty: T) -> Result<()> {
        let codec = self.0.registry.resolve_in(
            &ty.into(), &format!("{}[default]", self.0.name))?;
        *self.0.default.write() = Some(codec);
        Ok(())
    }

    /// Return the case registered under `key`.
    pub fn case<K : Into<Key>>(&self, key: K) -> Option<Case> {
        self.0.cases.read().get(&key.into()).cloned()
    }

    /// The codec that dispatches through this switch.
    pub fn codec(&self) -> Codec {
        Codec::switch(self.clone())
    }

    /// Compute the key in `ctx` and look up its case, falling back to the
    /// default.
    pub fn select(&self, ctx: &Context) -> Result<Case> {
        let value = self.0.key.eval(ctx)?;
        let key = Key::from_value(&value).ok_or_else(
            || Error::Parse(ctx.to_string(), format!(
                "switch key {:?} is not hashable", value)))?;

        if let Some(case) = self.0.cases.read().get(&key) {
            return Ok(case.clone());
        }
        match *self.0.default.read() {
            Some(ref codec) => Ok(Case::Single(codec.clone())),
            None => Err(Error::NoMatchingCase(ctx.to_string(),
                                              key.to_string())),
        }
    }

    pub(crate) fn parse(&self, ctx: &Context, s: &mut Stream<&[u8]>)
                        -> Result<Value> {
        match self.select(ctx)? {
            Case::Single(codec) => codec.parse(ctx, s),
            Case::Overload(alts) => parse_first(&alts, ctx, s).map(|r| r.1),
        }
    }

    pub(crate) fn build(&self, value: &Value, ctx: &Context,
                        s: &mut Stream<Vec<u8>>) -> Result<Value> {
        match self.select(ctx)? {
            Case::Single(codec) => codec.build(value, ctx, s),
            Case::Overload(alts) => build_first(&alts, value, ctx, s),
        }
    }

    pub(crate) fn measure(&self, ctx: &Context) -> Result<u64> {
        measure_same(self.select(ctx)?.codecs(), ctx)
    }

    pub(crate) fn coerce(&self, value: Value, ctx: &Context) -> Result<Value> {
        let case = self.select(ctx)?;
        let alts = case.codecs();
        let mut last = None;
        for alt in alts {
            match coerce(alt, value.clone(), ctx) {
                Ok(v) => return Ok(v),
                Err(e) => if is_mismatch(&e) {
                    last = Some(e);
                } else {
                    return Err(e);
                },
            }
        }
        Err(match last {
            Some(e) if 1 == alts.len() => e,
            _ => Error::Construction(ctx.to_string(), format!(
                "no case of {} accepts {}", self.0.name, value.type_name())),
        })
    }
}
