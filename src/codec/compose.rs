//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Wrapper and container codecs: records, arrays, alternatives and the
//! positional modifiers.

use std::sync::Arc;

use quick_error::ResultExt;
use tracing::trace;

use crate::context::{Context, Expr};
use crate::error::{Error, Result};
use crate::lazy::Lazy;
use crate::record::Record;
use crate::schema::Schema;
use crate::stream::Stream;
use crate::value::Value;
use super::{byte_bits, Codec, Count, Until};

/// Parse the first of `alts` that accepts the input, returning its index.
///
/// The stream is rewound between attempts. Only structural failures move on
/// to the next alternative.
pub(crate) fn parse_first<'c, I>(alts: I, ctx: &Context,
                                 s: &mut Stream<&[u8]>)
                                 -> Result<(usize, Value)>
where I : IntoIterator<Item = &'c Codec> {
    let start = s.pos();
    let mut last = None;
    for (ix, alt) in alts.into_iter().enumerate() {
        match alt.parse(ctx, s) {
            Ok(v) => return Ok((ix, v)),
            Err(e) => if e.is_structural() {
                trace!(at = %ctx, alternative = ix, error = %e,
                       "alternative rejected");
                s.seek(start).context(ctx)?;
                last = Some(e);
            } else {
                return Err(e);
            },
        }
    }

    Err(Error::Parse(ctx.to_string(), match last {
        Some(e) => format!("no alternative matched (last: {})", e),
        None => "no alternatives to try".to_owned(),
    }))
}

/// Build `value` with the first of `alts` that accepts it.
///
/// The stream is reset to its starting mark after a rejected attempt, so a
/// rejected alternative leaves nothing behind.
pub(crate) fn build_first<'c, I>(alts: I, value: &Value, ctx: &Context,
                                 s: &mut Stream<Vec<u8>>) -> Result<Value>
where I : IntoIterator<Item = &'c Codec> {
    let mark = s.mark();
    let mut last = None;
    for (ix, alt) in alts.into_iter().enumerate() {
        match alt.build(value, ctx, s) {
            Ok(v) => return Ok(v),
            Err(e) => if e.is_structural() {
                trace!(at = %ctx, alternative = ix, error = %e,
                       "alternative rejected");
                s.reset(mark.clone());
                last = Some(e);
            } else {
                return Err(e);
            },
        }
    }

    Err(Error::Build(ctx.to_string(), match last {
        Some(e) => format!("no alternative accepts {} (last: {})",
                           value.type_name(), e),
        None => "no alternatives to try".to_owned(),
    }))
}

/// Return the common size of `alts`, or `Unsized` if they differ.
pub(crate) fn measure_same<'c, I>(alts: I, ctx: &Context) -> Result<u64>
where I : IntoIterator<Item = &'c Codec> {
    let mut size = None;
    for alt in alts {
        let n = alt.measure(ctx)?;
        match size {
            None => size = Some(n),
            Some(m) if m == n => (),
            Some(_) => return Err(Error::Unsized(ctx.to_string())),
        }
    }
    size.ok_or_else(|| Error::Unsized(ctx.to_string()))
}

pub(super) fn parse_record(schema: &Schema, ctx: &Context,
                           s: &mut Stream<&[u8]>) -> Result<Value> {
    let raw = schema.construct().parse(ctx, s)?;
    if schema.is_lazy() {
        Ok(Value::Lazy(Lazy::from_raw(schema.clone(), raw,
                                      ctx.params.clone())))
    } else {
        Ok(Value::Record(Arc::new(Record::from_raw(schema, raw)?)))
    }
}

pub(super) fn build_record(schema: &Schema, value: &Value, ctx: &Context,
                           s: &mut Stream<Vec<u8>>) -> Result<Value> {
    let built = schema.construct().build(value, ctx, s)?;
    Ok(Value::Record(Arc::new(Record::from_raw(schema, built)?)))
}

/// Evaluate a condition: booleans as themselves, integers as non-zero,
/// nothing as false.
pub(crate) fn truth(cond: &Expr, ctx: &Context) -> Result<bool> {
    match cond.eval(ctx)? {
        Value::Bool(b) => Ok(b),
        Value::Int(n) => Ok(0 != n),
        Value::None => Ok(false),
        other => Err(Error::Parse(ctx.to_string(), format!(
            "condition {:?} evaluated to {}", cond, other.type_name()))),
    }
}

fn element_count(count: &Count, ctx: &Context) -> Result<Option<usize>> {
    match *count {
        Count::Fixed(n) => Ok(Some(n)),
        Count::Expr(ref e) => e.eval_usize(ctx).map(Some),
        Count::Greedy => Ok(None),
    }
}

pub(super) fn parse_array(elem: &Codec, count: &Count, ctx: &Context,
                          s: &mut Stream<&[u8]>) -> Result<Value> {
    let mut items = Vec::new();
    match element_count(count, ctx)? {
        Some(n) => for ix in 0..n {
            let name = ix.to_string();
            let sub = ctx.push(&name, s.pos())?;
            items.push(elem.parse(&sub, s)?);
        },
        None => while s.remaining() > 0 {
            let start = s.pos();
            let name = items.len().to_string();
            let sub = ctx.push(&name, start)?;
            match elem.parse(&sub, s) {
                Ok(_) if s.pos() == start => {
                    trace!(at = %ctx, items = items.len(),
                           "greedy array stopped on an empty element");
                    break;
                },
                Ok(v) => items.push(v),
                Err(e) => if e.is_structural() {
                    trace!(at = %ctx, items = items.len(), error = %e,
                           "greedy array stopped");
                    s.seek(start).context(ctx)?;
                    break;
                } else {
                    return Err(e);
                },
            }
        },
    }
    Ok(Value::List(items))
}

pub(super) fn build_array(elem: &Codec, count: &Count, value: &Value,
                          ctx: &Context, s: &mut Stream<Vec<u8>>)
                          -> Result<Value> {
    let items = value.as_list().ok_or_else(|| Error::Build(
        ctx.to_string(), format!("expected list, got {}", value.type_name())))?;
    if let Some(n) = element_count(count, ctx)? {
        if n != items.len() {
            return Err(Error::Build(ctx.to_string(), format!(
                "expected {} elements, got {}", n, items.len())));
        }
    }

    let mut built = Vec::with_capacity(items.len());
    for (ix, item) in items.iter().enumerate() {
        let name = ix.to_string();
        let sub = ctx.push(&name, s.pos())?;
        built.push(elem.build(item, &sub, s)?);
    }
    Ok(Value::List(built))
}

pub(super) fn measure_array(elem: &Codec, count: &Count, ctx: &Context)
                            -> Result<u64> {
    match element_count(count, ctx)? {
        Some(0) => Ok(0),
        Some(n) => {
            let sub = ctx.push("0", 0)?;
            elem.measure(&sub)?.checked_mul(n as u64).ok_or_else(
                || Error::Parse(ctx.to_string(), format!(
                    "{} elements is out of range", n)))
        },
        None => Err(Error::Unsized(ctx.to_string())),
    }
}

pub(super) fn parse_prefixed(len: &Codec, inner: &Codec, ctx: &Context,
                             s: &mut Stream<&[u8]>) -> Result<Value> {
    let n = match len.parse(ctx, s)?.as_int() {
        Some(n) if n >= 0 && n <= usize::max_value() as i128 => n as usize,
        other => return Err(Error::Parse(ctx.to_string(), format!(
            "invalid length prefix {:?}", other))),
    };
    let data = s.read_bytes(n).context(ctx)?;
    inner.parse(ctx, &mut Stream::new(&data[..]))
}

pub(super) fn build_prefixed(len: &Codec, inner: &Codec, value: &Value,
                             ctx: &Context, s: &mut Stream<Vec<u8>>)
                             -> Result<Value> {
    let mut body = Stream::writer();
    let built = inner.build(value, ctx, &mut body)?;
    let data = body.into_inner();
    len.build(&Value::Int(data.len() as i128), ctx, s)?;
    s.write_bytes(&data);
    Ok(built)
}

pub(super) fn parse_padded(len: usize, inner: &Codec, ctx: &Context,
                           s: &mut Stream<&[u8]>) -> Result<Value> {
    let start = s.pos();
    let v = inner.parse(ctx, s)?;
    let used = s.pos() - start;
    let size = byte_bits(len, ctx)?;
    if used > size {
        return Err(Error::Parse(ctx.to_string(), format!(
            "padded value overran {} bytes", len)));
    }
    s.seek(start + size).context(ctx)?;
    Ok(v)
}

pub(super) fn build_padded(len: usize, inner: &Codec, value: &Value,
                           ctx: &Context, s: &mut Stream<Vec<u8>>)
                           -> Result<Value> {
    let start = s.pos();
    let built = inner.build(value, ctx, s)?;
    let used = s.pos() - start;
    let size = byte_bits(len, ctx)?;
    if used > size {
        return Err(Error::Build(ctx.to_string(), format!(
            "value needs {} bits, only {} bytes available", used, len)));
    }
    s.write_zeros(size - used);
    Ok(built)
}

pub(super) fn parse_optional(inner: &Codec, ctx: &Context,
                             s: &mut Stream<&[u8]>) -> Result<Value> {
    let start = s.pos();
    match inner.parse(ctx, s) {
        Ok(v) => Ok(v),
        Err(e) => if e.is_structural() {
            s.seek(start).context(ctx)?;
            Ok(Value::None)
        } else {
            Err(e)
        },
    }
}

pub(super) fn parse_peek(inner: &Codec, ctx: &Context,
                         s: &mut Stream<&[u8]>) -> Result<Value> {
    let start = s.pos();
    let v = inner.parse(ctx, s)?;
    s.seek(start).context(ctx)?;
    Ok(v)
}

pub(super) fn parse_pointer(offset: &Expr, inner: &Codec, ctx: &Context,
                            s: &mut Stream<&[u8]>) -> Result<Value> {
    let target = byte_bits(offset.eval_usize(ctx)?, ctx)?;
    let resume = s.pos();
    s.seek(target).context(ctx)?;
    let v = inner.parse(ctx, s)?;
    s.seek(resume).context(ctx)?;
    Ok(v)
}

pub(super) fn build_pointer(offset: &Expr, inner: &Codec, value: &Value,
                            ctx: &Context, s: &mut Stream<Vec<u8>>)
                            -> Result<Value> {
    let target = byte_bits(offset.eval_usize(ctx)?, ctx)?;
    let resume = s.pos();
    s.seek_write(target);
    let built = inner.build(value, ctx, s)?;
    s.seek_write(resume);
    Ok(built)
}

fn alignment_gap(modulus: usize, used: u64, ctx: &Context) -> Result<u64> {
    let unit = byte_bits(modulus, ctx)?;
    Ok((unit - used % unit) % unit)
}

pub(super) fn parse_aligned(modulus: usize, inner: &Codec, ctx: &Context,
                            s: &mut Stream<&[u8]>) -> Result<Value> {
    let start = s.pos();
    let v = inner.parse(ctx, s)?;
    let gap = alignment_gap(modulus, s.pos() - start, ctx)?;
    let end = s.pos() + gap;
    s.seek(end).context(ctx)?;
    Ok(v)
}

pub(super) fn build_aligned(modulus: usize, inner: &Codec, value: &Value,
                            ctx: &Context, s: &mut Stream<Vec<u8>>)
                            -> Result<Value> {
    let start = s.pos();
    let built = inner.build(value, ctx, s)?;
    let gap = alignment_gap(modulus, s.pos() - start, ctx)?;
    s.write_zeros(gap);
    Ok(built)
}

pub(super) fn parse_repeat(elem: &Codec, until: &Until, ctx: &Context,
                           s: &mut Stream<&[u8]>) -> Result<Value> {
    let mut items = Vec::new();
    loop {
        let start = s.pos();
        let v = {
            let name = items.len().to_string();
            let sub = ctx.push(&name, start)?;
            elem.parse(&sub, s)?
        };
        let done = until.test(&v, &items, ctx)?;
        items.push(v);
        if done {
            return Ok(Value::List(items));
        }
        if s.pos() == start {
            return Err(Error::Parse(ctx.to_string(), format!(
                "element {} consumed no input and did not end the \
                 repetition", items.len() - 1)));
        }
    }
}

pub(super) fn build_repeat(elem: &Codec, until: &Until, value: &Value,
                           ctx: &Context, s: &mut Stream<Vec<u8>>)
                           -> Result<Value> {
    let items = value.as_list().ok_or_else(|| Error::Build(
        ctx.to_string(), format!("expected list, got {}", value.type_name())))?;

    let mut built = Vec::with_capacity(items.len());
    for (ix, item) in items.iter().enumerate() {
        let v = {
            let name = ix.to_string();
            let sub = ctx.push(&name, s.pos())?;
            elem.build(item, &sub, s)?
        };
        let done = until.test(&v, &built, ctx)?;
        built.push(v);
        if done {
            if ix + 1 < items.len() {
                return Err(Error::Build(ctx.to_string(), format!(
                    "element {} ends the repetition, but {} more follow",
                    ix, items.len() - ix - 1)));
            }
            return Ok(Value::List(built));
        }
    }
    Err(Error::Build(ctx.to_string(),
                     "no element ends the repetition".to_owned()))
}
