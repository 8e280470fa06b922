//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Aggregate codecs over ordered field lists.

use std::borrow::Cow;
use std::fmt;

use quick_error::ResultExt;
use tracing::trace;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::stream::Stream;
use crate::value::{Container, Value};
use super::compose::measure_same;

/// How the fields of an aggregate are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Named fields, one after another, at byte granularity.
    Struct,
    /// Named fields packed at bit granularity. The whole aggregate must
    /// still cover a whole number of bytes unless it is itself nested in a
    /// bit struct.
    BitStruct,
    /// Positional fields. Values are lists rather than maps.
    Sequence,
    /// Alternative fields at the same position. Parsing keeps the first
    /// that fits; building writes the one member that has a value.
    Union,
}

/// A whole-record codec assembled from field descriptors.
#[derive(Clone)]
pub struct Aggregate {
    /// The name used in error messages.
    pub name: String,
    #[allow(missing_docs)]
    pub strategy: Strategy,
    /// The fields, in parse order.
    pub fields: Vec<Field>,
    /// Whether the input must be exhausted once this aggregate is parsed.
    pub terminated: bool,
}

impl fmt::Debug for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}({}", self.strategy, self.name)?;
        for field in &self.fields {
            write!(f, ", {}: {:?}", field.name(), field.codec())?;
        }
        write!(f, ")")
    }
}

impl Aggregate {
    fn bitwise(&self, ctx: &Context) -> bool {
        ctx.bitwise || Strategy::BitStruct == self.strategy
    }

    fn check_alignment(&self, ctx: &Context, bits: u64) -> Result<()> {
        if Strategy::BitStruct == self.strategy && !ctx.bitwise
            && 0 != bits % 8
        {
            Err(Error::Misaligned(ctx.to_string(), bits))
        } else {
            Ok(())
        }
    }

    fn finish(&self, this: Container) -> Value {
        if Strategy::Sequence == self.strategy {
            Value::List(this.0.into_iter().map(|e| e.1).collect())
        } else {
            Value::Map(this)
        }
    }

    pub(crate) fn parse(&self, ctx: &Context, s: &mut Stream<&[u8]>)
                        -> Result<Value> {
        let bitwise = self.bitwise(ctx);
        let start = s.pos();

        let this = if Strategy::Union == self.strategy {
            self.parse_union(ctx, s, bitwise)?
        } else {
            let mut this = Container::new();
            for field in &self.fields {
                let v = {
                    let sub = ctx.enter(field.name(), s.pos(), Some(&this),
                                        bitwise)?;
                    field.codec().parse(&sub, s)?
                };
                this.push(field.name(), v);
            }
            this
        };

        self.check_alignment(ctx, s.pos() - start)?;
        if self.terminated && s.remaining() > 0 {
            return Err(Error::TrailingData(ctx.to_string(), s.remaining()));
        }
        Ok(self.finish(this))
    }

    fn parse_union(&self, ctx: &Context, s: &mut Stream<&[u8]>,
                   bitwise: bool) -> Result<Container> {
        let start = s.pos();
        let empty = Container::new();
        let mut last = None;

        for (ix, field) in self.fields.iter().enumerate() {
            let attempt = {
                let sub = ctx.enter(field.name(), start, Some(&empty),
                                    bitwise)?;
                field.codec().parse(&sub, s)
            };
            match attempt {
                Ok(v) => {
                    let mut chosen = Some(v);
                    let mut this = Container::new();
                    for (jx, f) in self.fields.iter().enumerate() {
                        let v = if jx == ix { chosen.take() } else { None };
                        this.push(f.name(), v.unwrap_or(Value::None));
                    }
                    return Ok(this);
                },
                Err(e) => if e.is_structural() {
                    trace!(at = %ctx, member = field.name(), error = %e,
                           "union member rejected");
                    s.seek(start).context(ctx)?;
                    last = Some(e);
                } else {
                    return Err(e);
                },
            }
        }

        Err(Error::Parse(ctx.to_string(), match last {
            Some(e) => format!("no member of {} matched (last: {})",
                               self.name, e),
            None => format!("{} has no members", self.name),
        }))
    }

    /// Arrange `value` as a container of exactly the declared fields, in
    /// order, with `None` for anything not given.
    fn scope_for(&self, value: &Value, ctx: &Context) -> Result<Container> {
        let given: Cow<Container> = match *value {
            Value::Map(ref m) => Cow::Borrowed(m),
            Value::Record(ref r) => Cow::Borrowed(r.values()),
            Value::Lazy(ref l) => Cow::Owned(l.force()?.values().clone()),
            Value::List(ref items) => {
                if items.len() > self.fields.len() {
                    return Err(Error::Build(ctx.to_string(), format!(
                        "{} takes {} values, got {}", self.name,
                        self.fields.len(), items.len())));
                }
                return Ok(Container(self.fields.iter().enumerate().map(
                    |(ix, f)| (f.name().to_owned(),
                               items.get(ix).cloned()
                               .unwrap_or(Value::None))).collect()));
            },
            ref other => return Err(Error::Build(ctx.to_string(), format!(
                "expected a value for {}, got {}", self.name,
                other.type_name()))),
        };

        if let Some((name, _)) = given.iter().find(
            |&(name, _)| !self.fields.iter().any(|f| f.name() == name))
        {
            return Err(Error::Build(ctx.to_string(), format!(
                "{} has no field `{}`", self.name, name)));
        }

        Ok(Container(self.fields.iter().map(
            |f| (f.name().to_owned(),
                 given.get(f.name()).cloned().unwrap_or(Value::None)))
                     .collect()))
    }

    pub(crate) fn build(&self, value: &Value, ctx: &Context,
                        s: &mut Stream<Vec<u8>>) -> Result<Value> {
        let bitwise = self.bitwise(ctx);
        let start = s.pos();
        let mut this = self.scope_for(value, ctx)?;

        if Strategy::Union == self.strategy {
            let ix = this.0.iter().position(|e| !e.1.is_none()).ok_or_else(
                || Error::Build(ctx.to_string(), format!(
                    "no member of {} has a value", self.name)))?;
            let v = this.0[ix].1.clone();
            let built = {
                let field = &self.fields[ix];
                let sub = ctx.enter(field.name(), start, Some(&this),
                                    bitwise)?;
                field.codec().build(&v, &sub, s)?
            };
            this.0[ix].1 = built;
        } else {
            for (ix, field) in self.fields.iter().enumerate() {
                let v = this.0[ix].1.clone();
                let built = {
                    let sub = ctx.enter(field.name(), s.pos(), Some(&this),
                                        bitwise)?;
                    field.codec().build(&v, &sub, s)?
                };
                this.0[ix].1 = built;
            }
        }

        self.check_alignment(ctx, s.pos() - start)?;
        Ok(self.finish(this))
    }

    pub(crate) fn measure(&self, ctx: &Context) -> Result<u64> {
        let bitwise = self.bitwise(ctx);

        let bits = if Strategy::Union == self.strategy {
            let sub = ctx.enter(&self.name, 0, None, bitwise)?;
            measure_same(self.fields.iter().map(Field::codec), &sub)?
        } else {
            let mut total = 0;
            for field in &self.fields {
                let sub = ctx.enter(field.name(), total, None, bitwise)?;
                total += field.codec().measure(&sub)?;
            }
            total
        };

        self.check_alignment(ctx, bits)?;
        Ok(bits)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::Codec;
    use crate::config::{Encoding, Endianness};
    use crate::context::this;
    use crate::test_helpers::parse;

    fn agg(strategy: Strategy, fields: Vec<(&str, Codec)>) -> Codec {
        Codec::aggregate(Aggregate {
            name: "T".to_owned(),
            strategy,
            fields: fields.into_iter()
                .map(|(n, c)| Field::new(n, c)).collect(),
            terminated: false,
        })
    }

    fn u8() -> Codec {
        Codec::int(1, false, Endianness::Big).unwrap()
    }

    #[test]
    fn struct_fields_see_earlier_siblings() {
        let codec = agg(Strategy::Struct, vec![
            ("len", u8()),
            ("data", Codec::bytes(this("len"))),
        ]);
        let params = Container::new();
        let v = codec.parse_bytes(&parse("02 AA BB CC"), &params).unwrap();
        assert_eq!(Value::Map(Container::new()
                              .with("len", 2)
                              .with("data", vec![0xAAu8, 0xBB])), v);
        assert_eq!(parse("02 AA BB"), codec.build_bytes(&v, &params).unwrap());
    }

    #[test]
    fn sequences_are_lists() {
        let codec = agg(Strategy::Sequence, vec![
            ("0", u8()),
            ("1", Codec::cstring(Encoding::Utf8)),
        ]);
        let params = Container::new();
        let v = codec.parse_bytes(&parse("05 'a' 00"), &params).unwrap();
        assert_eq!(Value::List(vec![Value::Int(5), Value::from("a")]), v);
        assert_eq!(parse("05 'a' 00"), codec.build_bytes(&v, &params).unwrap());
    }

    #[test]
    fn bit_structs_pack_bits() {
        let codec = agg(Strategy::BitStruct, vec![
            ("a", Codec::flag()),
            ("b", Codec::bit_int(3, false).unwrap()),
            ("c", Codec::nibble()),
        ]);
        let params = Container::new();
        let v = codec.parse_bytes(&parse("B5"), &params).unwrap();
        assert_eq!(Value::Map(Container::new()
                              .with("a", true)
                              .with("b", 3)
                              .with("c", 5)), v);
        assert_eq!(parse("B5"), codec.build_bytes(&v, &params).unwrap());
        assert_eq!(1, codec.sizeof(&params).unwrap());
    }

    #[test]
    fn bit_struct_must_fill_bytes() {
        let codec = agg(Strategy::BitStruct, vec![
            ("a", Codec::bit_int(3, false).unwrap()),
        ]);
        match codec.sizeof(&Container::new()) {
            Ok(n) => panic!("unexpectedly succeeded: {}", n),
            Err(Error::Misaligned(_, 3)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn union_keeps_first_fit() {
        let codec = agg(Strategy::Union, vec![
            ("magic", Codec::constant(u8(), 0x7F)),
            ("text", Codec::cstring(Encoding::Utf8)),
        ]);
        let params = Container::new();
        let v = codec.parse_bytes(&parse("'x' 00"), &params).unwrap();
        assert_eq!(Value::Map(Container::new()
                              .with("magic", Value::None)
                              .with("text", "x")), v);
        assert_eq!(parse("'x' 00"), codec.build_bytes(&v, &params).unwrap());

        match codec.build_bytes(&Value::Map(Container::new()), &params) {
            Ok(b) => panic!("unexpectedly succeeded: {:?}", b),
            Err(Error::Build(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn terminated_rejects_trailing_data() {
        let codec = Codec::aggregate(Aggregate {
            name: "T".to_owned(),
            strategy: Strategy::Struct,
            fields: vec![Field::new("x", u8())],
            terminated: true,
        });
        match codec.parse_bytes(&parse("01 02"), &Container::new()) {
            Ok(v) => panic!("unexpectedly succeeded: {:?}", v),
            Err(Error::TrailingData(_, 8)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn unknown_members_rejected_on_build() {
        let codec = agg(Strategy::Struct, vec![("x", u8())]);
        let value = Value::Map(Container::new().with("x", 1).with("y", 2));
        match codec.build_bytes(&value, &Container::new()) {
            Ok(b) => panic!("unexpectedly succeeded: {:?}", b),
            Err(Error::Build(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }
}
