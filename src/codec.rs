//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Codecs: the resolved units that measure, parse and build binary data.
//!
//! A `Codec` is a cheap, shareable handle around one `Kind`. Every kind
//! supports the same three operations:
//!
//! - `parse` reads a value from a `Stream` positioned at its start.
//! - `build` writes a value and returns the value actually written, which
//!   differs from its input for codecs that fill in or recompute values
//!   (defaults, constants, rebuilt length fields).
//! - `measure` returns the size in bits without any data, or fails with
//!   `Unsized` or `ContextRequired`.
//!
//! Sizes are bits internally because bit-packed aggregates place fields at
//! arbitrary bit offsets; the byte-oriented entry points (`sizeof`,
//! `parse_bytes`, `build_bytes`) convert at the edges.

use std::fmt;
use std::sync::Arc;

use crate::config::{Config, Encoding, Endianness};
use crate::context::{Context, Expr};
use crate::error::{Error, Result};
use crate::schema::{Forward, Schema};
use crate::stream::Stream;
use crate::switch::Switch;
use crate::value::{Container, Value};

mod aggregate;
mod compose;
mod prim;
mod symbol;

pub use self::aggregate::{Aggregate, Strategy};
pub(crate) use self::compose::{build_first, measure_same, parse_first, truth};
pub use self::prim::Prim;
pub use self::symbol::Symbols;
pub(crate) use self::symbol::coerce_flags;
pub(crate) use self::prim::narrow;

/// The number of elements of an array, or the length of a byte string.
#[derive(Clone, Debug)]
pub enum Count {
    /// A fixed number.
    Fixed(usize),
    /// A number computed from the context, usually an earlier sibling.
    Expr(Expr),
    /// As many as the input holds.
    Greedy,
}

impl From<usize> for Count {
    fn from(n: usize) -> Self {
        Count::Fixed(n)
    }
}

impl From<Expr> for Count {
    fn from(e: Expr) -> Self {
        Count::Expr(e)
    }
}

/// The stop condition of a repetition.
///
/// Called with the element just parsed or built, the elements before it and
/// the context; returns whether the repetition ends with this element.
#[derive(Clone)]
pub struct Until(Arc<dyn Fn (&Value, &[Value], &Context) -> Result<bool>
                     + Send + Sync>);

impl Until {
    /// Wrap a predicate.
    pub fn new<F>(f: F) -> Self
    where F : Fn (&Value, &[Value], &Context) -> Result<bool>
        + Send + Sync + 'static {
        Until(Arc::new(f))
    }

    /// Evaluate the predicate.
    pub fn test(&self, last: &Value, items: &[Value], ctx: &Context)
                -> Result<bool> {
        (self.0)(last, items, ctx)
    }
}

impl fmt::Debug for Until {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<fn>")
    }
}

/// Convert a byte count to bits, failing if the result cannot be addressed.
pub(crate) fn byte_bits(n: usize, ctx: &Context) -> Result<u64> {
    (n as u64).checked_mul(8).ok_or_else(|| Error::Parse(
        ctx.to_string(), format!("{} bytes is out of range", n)))
}

/// The variants of codec.
pub enum Kind {
    /// An atomic codec.
    Prim(Prim),
    /// A struct, bit struct, sequence or union over an ordered field list.
    Aggregate(Aggregate),
    /// The aggregate of a schema, producing records rather than maps.
    Record(Schema),
    /// A schema that is only known by a forward-declared handle.
    Forward(Forward),
    /// A homogeneous array.
    Array(Codec, Count),
    /// The first of several alternatives that accepts the data.
    Select(Vec<Codec>),
    /// A choice of codec keyed on a value computed from the context.
    Switch(Switch),
    /// Data preceded by its byte length, encoded by the first codec.
    Prefixed(Codec, Codec),
    /// Data padded with zero bytes to a fixed size.
    Padded(usize, Codec),
    /// Builds the given value when the value to build is absent.
    ///
    /// This is lossy: a record built without the field and loaded again has
    /// the default rather than nothing.
    Default(Codec, Value),
    /// Parses to nothing instead of failing when the data does not fit.
    Optional(Codec),
    /// Always the given value; anything else in the input is an error.
    Const(Codec, Value),
    /// Parses without consuming input; builds nothing.
    Peek(Codec),
    /// Data located at an absolute byte offset computed from the context.
    Pointer(Expr, Codec),
    /// A value that is recomputed from the context whenever it is built,
    /// such as a length field. The expression may read siblings declared
    /// after the field.
    Rebuild(Codec, Expr),
    /// A value computed from the context that occupies no space.
    Computed(Expr),
    /// Symbolic values stored as the raw values of the inner codec.
    Mapping(Codec, Symbols),
    /// Named bit flags packed into the integer of the inner codec. Parses
    /// to a map from flag name to boolean; bits without a name are dropped.
    Flags(Codec, Vec<(String, u64)>),
    /// Data followed by zero padding up to a multiple of the given number
    /// of bytes, counted from the start of the data.
    Aligned(usize, Codec),
    /// The first codec if the condition holds, otherwise the second.
    IfThenElse(Expr, Codec, Codec),
    /// Elements up to and including the first that satisfies the
    /// predicate.
    RepeatUntil(Codec, Until),
    /// Nothing; fails unless the expression evaluates to true.
    Check(Expr),
}

/// A resolved codec. Cloning is cheap.
#[derive(Clone)]
pub struct Codec(Arc<Kind>);

impl Codec {
    /// Wrap a `Kind`.
    pub fn new(kind: Kind) -> Self {
        Codec(Arc::new(kind))
    }

    /// Return what this codec is.
    pub fn kind(&self) -> &Kind {
        &self.0
    }

    /// A `width`-byte integer.
    ///
    /// Fails with `InvalidSchema` unless `width` is between 1 and 8.
    pub fn int(width: usize, signed: bool, endian: Endianness)
               -> Result<Self> {
        if width < 1 || width > 8 {
            return Err(Error::InvalidSchema("int".to_owned(), format!(
                "width of {} bytes is not between 1 and 8", width)));
        }
        Ok(Codec::new(Kind::Prim(Prim::Int { width, signed, endian })))
    }

    /// A `bits`-wide integer, most significant bit first.
    ///
    /// Fails with `InvalidSchema` unless `bits` is between 1 and 64.
    pub fn bit_int(bits: u32, signed: bool) -> Result<Self> {
        if bits < 1 || bits > 64 {
            return Err(Error::InvalidSchema("bit_int".to_owned(), format!(
                "width of {} bits is not between 1 and 64", bits)));
        }
        Ok(Codec::new(Kind::Prim(Prim::BitInt { bits, signed })))
    }

    /// An IEEE-754 float of 4 or 8 bytes.
    pub fn float(width: usize, endian: Endianness) -> Result<Self> {
        if 4 != width && 8 != width {
            return Err(Error::InvalidSchema("float".to_owned(), format!(
                "width of {} bytes is neither 4 nor 8", width)));
        }
        Ok(Codec::new(Kind::Prim(Prim::Float { width, endian })))
    }

    /// A boolean: one byte normally, one bit inside a bit struct.
    pub fn flag() -> Self {
        Codec::new(Kind::Prim(Prim::Flag))
    }

    /// A single unsigned bit.
    pub fn bit() -> Self {
        Codec::new(Kind::Prim(Prim::BitInt { bits: 1, signed: false }))
    }

    /// An unsigned 4-bit integer.
    pub fn nibble() -> Self {
        Codec::new(Kind::Prim(Prim::BitInt { bits: 4, signed: false }))
    }

    /// An unsigned 8-bit integer read bit by bit.
    pub fn octet() -> Self {
        Codec::new(Kind::Prim(Prim::BitInt { bits: 8, signed: false }))
    }

    /// Raw bytes.
    pub fn bytes<C : Into<Count>>(count: C) -> Self {
        Codec::new(Kind::Prim(Prim::Bytes(count.into())))
    }

    /// All remaining bytes.
    pub fn greedy_bytes() -> Self {
        Codec::bytes(Count::Greedy)
    }

    /// Text followed by a terminating zero code unit.
    pub fn cstring(encoding: Encoding) -> Self {
        Codec::new(Kind::Prim(Prim::CString(encoding)))
    }

    /// Text zero-padded to exactly `len` bytes.
    pub fn padded_string(len: usize, encoding: Encoding) -> Self {
        Codec::new(Kind::Prim(Prim::PaddedString(len, encoding)))
    }

    /// Text occupying the rest of the input.
    pub fn greedy_string(encoding: Encoding) -> Self {
        Codec::new(Kind::Prim(Prim::GreedyString(encoding)))
    }

    /// Nothing at all.
    pub fn pass() -> Self {
        Codec::new(Kind::Prim(Prim::Pass))
    }

    /// An anonymous aggregate.
    pub fn aggregate(aggregate: Aggregate) -> Self {
        Codec::new(Kind::Aggregate(aggregate))
    }

    /// The records of `schema`.
    pub fn record(schema: Schema) -> Self {
        Codec::new(Kind::Record(schema))
    }

    /// The records of a schema that will be defined later.
    pub fn forward(forward: Forward) -> Self {
        Codec::new(Kind::Forward(forward))
    }

    /// An array of `elem`.
    pub fn array<C : Into<Count>>(elem: Codec, count: C) -> Self {
        Codec::new(Kind::Array(elem, count.into()))
    }

    /// As many `elem` as the input holds.
    pub fn greedy_array(elem: Codec) -> Self {
        Codec::array(elem, Count::Greedy)
    }

    /// The first alternative that accepts the data.
    pub fn select(alternatives: Vec<Codec>) -> Self {
        Codec::new(Kind::Select(alternatives))
    }

    /// The codec of a switch table.
    pub fn switch(switch: Switch) -> Self {
        Codec::new(Kind::Switch(switch))
    }

    /// `inner`, preceded by its byte length encoded by `len`.
    pub fn prefixed(len: Codec, inner: Codec) -> Self {
        Codec::new(Kind::Prefixed(len, inner))
    }

    /// `inner`, zero-padded to `len` bytes.
    pub fn padded(len: usize, inner: Codec) -> Self {
        Codec::new(Kind::Padded(len, inner))
    }

    /// `inner`, building `value` when given nothing.
    pub fn with_default<V : Into<Value>>(inner: Codec, value: V) -> Self {
        Codec::new(Kind::Default(inner, value.into()))
    }

    /// `inner`, or nothing if the data does not fit it.
    pub fn optional(inner: Codec) -> Self {
        Codec::new(Kind::Optional(inner))
    }

    /// `inner`, which must always hold `value`.
    pub fn constant<V : Into<Value>>(inner: Codec, value: V) -> Self {
        Codec::new(Kind::Const(inner, value.into()))
    }

    /// `inner`, parsed without consuming input.
    pub fn peek(inner: Codec) -> Self {
        Codec::new(Kind::Peek(inner))
    }

    /// `inner`, located at the byte offset `offset`.
    pub fn pointer<E : Into<Expr>>(offset: E, inner: Codec) -> Self {
        Codec::new(Kind::Pointer(offset.into(), inner))
    }

    /// `inner`, whose value is always `expr` when built.
    pub fn rebuild(inner: Codec, expr: Expr) -> Self {
        Codec::new(Kind::Rebuild(inner, expr))
    }

    /// The value of `expr`, stored nowhere.
    pub fn computed(expr: Expr) -> Self {
        Codec::new(Kind::Computed(expr))
    }

    /// `inner`, whose raw values stand for the given symbols.
    ///
    /// Parsing a raw value with no symbol, or building a value that is not
    /// a symbol, fails.
    pub fn mapping<I, S, R>(inner: Codec, pairs: I) -> Self
    where I : IntoIterator<Item = (S, R)>, S : Into<Value>, R : Into<Value> {
        Codec::new(Kind::Mapping(inner, Symbols {
            pairs: pairs.into_iter().map(|(s, r)| (s.into(), r.into()))
                .collect(),
            open: false,
        }))
    }

    /// An integer `inner` whose values have names. Integers without a name
    /// pass through as integers.
    pub fn enumeration<I, N>(inner: Codec, members: I) -> Self
    where I : IntoIterator<Item = (N, i128)>, N : Into<String> {
        Codec::new(Kind::Mapping(inner, Symbols {
            pairs: members.into_iter()
                .map(|(n, v)| (Value::Str(n.into()), Value::Int(v)))
                .collect(),
            open: true,
        }))
    }

    /// An integer `inner` holding the named bit flags.
    pub fn flags<I, N>(inner: Codec, flags: I) -> Self
    where I : IntoIterator<Item = (N, u64)>, N : Into<String> {
        Codec::new(Kind::Flags(inner, flags.into_iter()
                               .map(|(n, b)| (n.into(), b)).collect()))
    }

    /// `inner`, zero-padded to a multiple of `modulus` bytes.
    ///
    /// Fails with `InvalidSchema` if `modulus` is zero.
    pub fn aligned(modulus: usize, inner: Codec) -> Result<Self> {
        if 0 == modulus {
            return Err(Error::InvalidSchema(
                "aligned".to_owned(), "modulus must not be zero".to_owned()));
        }
        Ok(Codec::new(Kind::Aligned(modulus, inner)))
    }

    /// `then` if `cond` holds, otherwise `otherwise`.
    pub fn if_then_else<E : Into<Expr>>(cond: E, then: Codec,
                                        otherwise: Codec) -> Self {
        Codec::new(Kind::IfThenElse(cond.into(), then, otherwise))
    }

    /// `then` if `cond` holds, otherwise nothing.
    pub fn when<E : Into<Expr>>(cond: E, then: Codec) -> Self {
        Codec::if_then_else(cond, then, Codec::pass())
    }

    /// Elements of `elem` up to and including the first for which `until`
    /// returns true.
    pub fn repeat_until<F>(elem: Codec, until: F) -> Self
    where F : Fn (&Value, &[Value], &Context) -> Result<bool>
        + Send + Sync + 'static {
        Codec::new(Kind::RepeatUntil(elem, Until::new(until)))
    }

    /// A zero-width assertion that `expr` is true.
    pub fn check<E : Into<Expr>>(expr: E) -> Self {
        Codec::new(Kind::Check(expr.into()))
    }

    /// Parse a value at the current position of `s`.
    pub fn parse(&self, ctx: &Context, s: &mut Stream<&[u8]>) -> Result<Value> {
        match *self.kind() {
            Kind::Prim(ref p) => p.parse(ctx, s),
            Kind::Aggregate(ref a) => a.parse(ctx, s),
            Kind::Record(ref schema) => compose::parse_record(schema, ctx, s),
            Kind::Forward(ref fwd) =>
                compose::parse_record(&fwd.resolve(ctx)?, ctx, s),
            Kind::Array(ref elem, ref count) =>
                compose::parse_array(elem, count, ctx, s),
            Kind::Select(ref alts) =>
                compose::parse_first(alts, ctx, s).map(|(_, v)| v),
            Kind::Switch(ref sw) => sw.parse(ctx, s),
            Kind::Prefixed(ref len, ref inner) =>
                compose::parse_prefixed(len, inner, ctx, s),
            Kind::Padded(len, ref inner) =>
                compose::parse_padded(len, inner, ctx, s),
            Kind::Default(ref inner, _) |
            Kind::Rebuild(ref inner, _) => inner.parse(ctx, s),
            Kind::Optional(ref inner) => compose::parse_optional(inner, ctx, s),
            Kind::Const(ref inner, ref expected) => {
                let v = inner.parse(ctx, s)?;
                if v == *expected {
                    Ok(v)
                } else {
                    Err(Error::Parse(ctx.to_string(), format!(
                        "expected constant {:?}, found {:?}", expected, v)))
                }
            },
            Kind::Peek(ref inner) => compose::parse_peek(inner, ctx, s),
            Kind::Pointer(ref offset, ref inner) =>
                compose::parse_pointer(offset, inner, ctx, s),
            Kind::Computed(ref expr) => expr.eval(ctx),
            Kind::Mapping(ref inner, ref symbols) =>
                symbols.parse(inner, ctx, s),
            Kind::Flags(ref inner, ref flags) =>
                symbol::parse_flags(inner, flags, ctx, s),
            Kind::Aligned(modulus, ref inner) =>
                compose::parse_aligned(modulus, inner, ctx, s),
            Kind::IfThenElse(ref cond, ref then, ref otherwise) =>
                if truth(cond, ctx)? {
                    then.parse(ctx, s)
                } else {
                    otherwise.parse(ctx, s)
                },
            Kind::RepeatUntil(ref elem, ref until) =>
                compose::parse_repeat(elem, until, ctx, s),
            Kind::Check(ref expr) => if truth(expr, ctx)? {
                Ok(Value::None)
            } else {
                Err(Error::Parse(ctx.to_string(), format!(
                    "check {:?} failed", expr)))
            },
        }
    }

    /// Write `value` at the current position of `s`, returning the value
    /// that was actually written.
    pub fn build(&self, value: &Value, ctx: &Context,
                 s: &mut Stream<Vec<u8>>) -> Result<Value> {
        match *self.kind() {
            Kind::Prim(ref p) => p.build(value, ctx, s),
            Kind::Aggregate(ref a) => a.build(value, ctx, s),
            Kind::Record(ref schema) =>
                compose::build_record(schema, value, ctx, s),
            Kind::Forward(ref fwd) =>
                compose::build_record(&fwd.resolve(ctx)?, value, ctx, s),
            Kind::Array(ref elem, ref count) =>
                compose::build_array(elem, count, value, ctx, s),
            Kind::Select(ref alts) => build_first(alts, value, ctx, s),
            Kind::Switch(ref sw) => sw.build(value, ctx, s),
            Kind::Prefixed(ref len, ref inner) =>
                compose::build_prefixed(len, inner, value, ctx, s),
            Kind::Padded(len, ref inner) =>
                compose::build_padded(len, inner, value, ctx, s),
            Kind::Default(ref inner, ref default) => if value.is_none() {
                inner.build(default, ctx, s)
            } else {
                inner.build(value, ctx, s)
            },
            Kind::Optional(ref inner) => if value.is_none() {
                Ok(Value::None)
            } else {
                inner.build(value, ctx, s)
            },
            Kind::Const(ref inner, ref expected) =>
                if value.is_none() || *value == *expected {
                    inner.build(expected, ctx, s)
                } else {
                    Err(Error::Build(ctx.to_string(), format!(
                        "expected constant {:?}, got {:?}", expected, value)))
                },
            Kind::Peek(..) => Ok(value.clone()),
            Kind::Pointer(ref offset, ref inner) =>
                compose::build_pointer(offset, inner, value, ctx, s),
            Kind::Rebuild(ref inner, ref expr) =>
                inner.build(&expr.eval(ctx)?, ctx, s),
            Kind::Computed(ref expr) => expr.eval(ctx),
            Kind::Mapping(ref inner, ref symbols) =>
                symbols.build(inner, value, ctx, s),
            Kind::Flags(ref inner, ref flags) =>
                symbol::build_flags(inner, flags, value, ctx, s),
            Kind::Aligned(modulus, ref inner) =>
                compose::build_aligned(modulus, inner, value, ctx, s),
            Kind::IfThenElse(ref cond, ref then, ref otherwise) =>
                if truth(cond, ctx)? {
                    then.build(value, ctx, s)
                } else {
                    otherwise.build(value, ctx, s)
                },
            Kind::RepeatUntil(ref elem, ref until) =>
                compose::build_repeat(elem, until, value, ctx, s),
            Kind::Check(ref expr) => if truth(expr, ctx)? {
                Ok(Value::None)
            } else {
                Err(Error::Build(ctx.to_string(), format!(
                    "check {:?} failed", expr)))
            },
        }
    }

    /// Return the size in bits of any value of this codec in `ctx`.
    pub fn measure(&self, ctx: &Context) -> Result<u64> {
        match *self.kind() {
            Kind::Prim(ref p) => p.measure(ctx),
            Kind::Aggregate(ref a) => a.measure(ctx),
            Kind::Record(ref schema) => schema.construct().measure(ctx),
            Kind::Forward(ref fwd) => fwd.resolve(ctx)?.construct().measure(ctx),
            Kind::Array(ref elem, ref count) =>
                compose::measure_array(elem, count, ctx),
            Kind::Select(ref alts) => compose::measure_same(alts, ctx),
            Kind::Switch(ref sw) => sw.measure(ctx),
            Kind::Prefixed(ref len, ref inner) =>
                Ok(len.measure(ctx)? + inner.measure(ctx)?),
            Kind::Padded(len, _) => byte_bits(len, ctx),
            Kind::Default(ref inner, _) |
            Kind::Const(ref inner, _) |
            Kind::Rebuild(ref inner, _) |
            Kind::Mapping(ref inner, _) |
            Kind::Flags(ref inner, _) => inner.measure(ctx),
            Kind::Aligned(modulus, ref inner) => {
                let unit = byte_bits(modulus, ctx)?;
                let bits = inner.measure(ctx)?;
                Ok(bits + (unit - bits % unit) % unit)
            },
            Kind::IfThenElse(ref cond, ref then, ref otherwise) =>
                if truth(cond, ctx)? {
                    then.measure(ctx)
                } else {
                    otherwise.measure(ctx)
                },
            Kind::Optional(..) | Kind::RepeatUntil(..) =>
                Err(Error::Unsized(ctx.to_string())),
            Kind::Peek(..) | Kind::Pointer(..) | Kind::Computed(..) |
            Kind::Check(..) => Ok(0),
        }
    }

    /// Return whether a record field of this codec may be left without a
    /// value, because the codec supplies or ignores one.
    pub fn accepts_absent(&self) -> bool {
        match *self.kind() {
            Kind::Prim(Prim::Pass) |
            Kind::Default(..) | Kind::Optional(..) | Kind::Const(..) |
            Kind::Peek(..) | Kind::Rebuild(..) | Kind::Computed(..) |
            Kind::Check(..) => true,
            Kind::IfThenElse(_, ref then, ref otherwise) =>
                then.accepts_absent() || otherwise.accepts_absent(),
            _ => false,
        }
    }

    /// Return the names of siblings this codec reads while parsing.
    ///
    /// Nested aggregates are not descended into since they have their own
    /// sibling scope; neither are the expressions of `Rebuild`, which are
    /// only evaluated when building. Switches contribute their key and
    /// every case registered so far.
    pub fn sibling_refs(&self) -> Vec<String> {
        fn expr(e: &Expr, out: &mut Vec<String>) {
            out.extend(e.sibling_refs().into_iter().map(str::to_owned));
        }
        fn count(c: &Count, out: &mut Vec<String>) {
            if let Count::Expr(ref e) = *c {
                expr(e, out);
            }
        }
        fn walk(codec: &Codec, out: &mut Vec<String>) {
            match *codec.kind() {
                Kind::Prim(Prim::Bytes(ref c)) => count(c, out),
                Kind::Prim(..) | Kind::Aggregate(..) | Kind::Record(..) |
                Kind::Forward(..) => (),
                Kind::Array(ref elem, ref c) => {
                    count(c, out);
                    walk(elem, out);
                },
                Kind::Select(ref alts) => for alt in alts {
                    walk(alt, out);
                },
                Kind::Switch(ref sw) => {
                    expr(sw.key(), out);
                    for codec in sw.codecs() {
                        walk(&codec, out);
                    }
                },
                Kind::Prefixed(ref len, ref inner) => {
                    walk(len, out);
                    walk(inner, out);
                },
                Kind::Pointer(ref e, ref inner) => {
                    expr(e, out);
                    walk(inner, out);
                },
                Kind::Padded(_, ref inner) | Kind::Default(ref inner, _) |
                Kind::Optional(ref inner) | Kind::Const(ref inner, _) |
                Kind::Peek(ref inner) | Kind::Rebuild(ref inner, _) |
                Kind::Mapping(ref inner, _) | Kind::Flags(ref inner, _) |
                Kind::Aligned(_, ref inner) | Kind::RepeatUntil(ref inner, _) =>
                    walk(inner, out),
                Kind::IfThenElse(ref e, ref then, ref otherwise) => {
                    expr(e, out);
                    walk(then, out);
                    walk(otherwise, out);
                },
                Kind::Computed(ref e) | Kind::Check(ref e) => expr(e, out),
            }
        }

        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// Parse a complete value from `data` with the default configuration.
    pub fn parse_bytes(&self, data: &[u8], params: &Container)
                       -> Result<Value> {
        self.parse_with(data, "", &Config::default(), params)
    }

    /// Parse a value from the start of `data`, naming the top of the
    /// context `name`.
    pub fn parse_with(&self, data: &[u8], name: &str, config: &Config,
                      params: &Container) -> Result<Value> {
        let ctx = Context::top(name, config, params);
        self.parse(&ctx, &mut Stream::new(data))
    }

    /// Build `value` into a new byte vector with the default configuration.
    pub fn build_bytes(&self, value: &Value, params: &Container)
                       -> Result<Vec<u8>> {
        self.build_with(value, "", &Config::default(), params)
    }

    /// Build `value` into a new byte vector, naming the top of the context
    /// `name`.
    pub fn build_with(&self, value: &Value, name: &str, config: &Config,
                      params: &Container) -> Result<Vec<u8>> {
        let ctx = Context::top(name, config, params);
        let mut s = Stream::writer();
        self.build(value, &ctx, &mut s)?;
        Ok(s.into_inner())
    }

    /// Return the size in bytes with the default configuration.
    pub fn sizeof(&self, params: &Container) -> Result<usize> {
        self.sizeof_with("", &Config::default(), params)
    }

    /// Return the size in bytes, rounding a partial byte up.
    pub fn sizeof_with(&self, name: &str, config: &Config,
                       params: &Container) -> Result<usize> {
        let ctx = Context::top(name, config, params);
        Ok(((self.measure(&ctx)? + 7) / 8) as usize)
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.kind() {
            Kind::Prim(ref p) => write!(f, "{:?}", p),
            Kind::Aggregate(ref a) => write!(f, "{:?}", a),
            Kind::Record(ref s) => write!(f, "Record({})", s.name()),
            Kind::Forward(ref fwd) => write!(f, "Forward({})", fwd.name()),
            Kind::Array(ref e, ref c) => write!(f, "Array({:?}, {:?})", e, c),
            Kind::Select(ref alts) =>
                f.debug_tuple("Select").field(alts).finish(),
            Kind::Switch(ref sw) => write!(f, "{:?}", sw),
            Kind::Prefixed(ref l, ref i) =>
                write!(f, "Prefixed({:?}, {:?})", l, i),
            Kind::Padded(n, ref i) => write!(f, "Padded({}, {:?})", n, i),
            Kind::Default(ref i, ref v) =>
                write!(f, "Default({:?}, {:?})", i, v),
            Kind::Optional(ref i) => write!(f, "Optional({:?})", i),
            Kind::Const(ref i, ref v) => write!(f, "Const({:?}, {:?})", i, v),
            Kind::Peek(ref i) => write!(f, "Peek({:?})", i),
            Kind::Pointer(ref e, ref i) =>
                write!(f, "Pointer({:?}, {:?})", e, i),
            Kind::Rebuild(ref i, ref e) =>
                write!(f, "Rebuild({:?}, {:?})", i, e),
            Kind::Computed(ref e) => write!(f, "Computed({:?})", e),
            Kind::Mapping(ref i, ref m) =>
                write!(f, "Mapping({:?}, {:?})", i, m.pairs),
            Kind::Flags(ref i, ref flags) =>
                write!(f, "Flags({:?}, {:?})", i, flags),
            Kind::Aligned(n, ref i) => write!(f, "Aligned({}, {:?})", n, i),
            Kind::IfThenElse(ref c, ref t, ref o) =>
                write!(f, "IfThenElse({:?}, {:?}, {:?})", c, t, o),
            Kind::RepeatUntil(ref i, ref u) =>
                write!(f, "RepeatUntil({:?}, {:?})", i, u),
            Kind::Check(ref e) => write!(f, "Check({:?})", e),
        }
    }
}
