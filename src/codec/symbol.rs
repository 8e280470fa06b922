//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Symbolic views of raw values: mappings, enumerations and bit flags.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::stream::Stream;
use crate::value::{Container, Value};
use super::Codec;

/// A table between symbols and the raw values of a codec.
#[derive(Clone, Debug)]
pub struct Symbols {
    /// `(symbol, raw)` pairs. The first pair matching wins in either
    /// direction.
    pub pairs: Vec<(Value, Value)>,
    /// Whether raw values without a symbol pass through unchanged, as for
    /// enumerations, rather than being an error.
    pub open: bool,
}

impl Symbols {
    /// Return the symbol for `raw`, or `raw` itself if the table is open.
    pub fn decode(&self, raw: Value) -> Option<Value> {
        match self.pairs.iter().find(|p| p.1 == raw) {
            Some(&(ref symbol, _)) => Some(symbol.clone()),
            None if self.open => Some(raw),
            None => None,
        }
    }

    /// Return the raw value for `value`, which may be a symbol or, if the
    /// table is open, a raw value.
    pub fn encode(&self, value: &Value) -> Option<Value> {
        match self.pairs.iter().find(|p| p.0 == *value) {
            Some(&(_, ref raw)) => Some(raw.clone()),
            None if self.open && value.as_str().is_none() =>
                Some(value.clone()),
            None => None,
        }
    }

    pub(super) fn parse(&self, inner: &Codec, ctx: &Context,
                        s: &mut Stream<&[u8]>) -> Result<Value> {
        let raw = inner.parse(ctx, s)?;
        let shown = format!("{:?}", raw);
        self.decode(raw).ok_or_else(|| Error::Parse(ctx.to_string(), format!(
            "raw value {} has no symbol", shown)))
    }

    pub(super) fn build(&self, inner: &Codec, value: &Value, ctx: &Context,
                        s: &mut Stream<Vec<u8>>) -> Result<Value> {
        let raw = self.encode(value).ok_or_else(
            || Error::Build(ctx.to_string(), format!(
                "{:?} is not a symbol", value)))?;
        let built = inner.build(&raw, ctx, s)?;
        Ok(self.decode(built).unwrap_or_else(|| value.clone()))
    }
}

fn flag_bits(flags: &[(String, u64)], value: &Value, ctx: &Context,
             err: fn (String, String) -> Error) -> Result<u64> {
    let given = match *value {
        Value::Map(ref m) => m,
        Value::Record(ref r) => r.values(),
        ref other => return Err(err(ctx.to_string(), format!(
            "expected a map of flags, got {}", other.type_name()))),
    };

    let mut bits = 0;
    for (name, set) in given.iter() {
        let bit = flags.iter().find(|f| f.0 == name).map(|f| f.1)
            .ok_or_else(|| err(ctx.to_string(), format!(
                "no flag named `{}`", name)))?;
        match set.as_bool() {
            Some(true) => bits |= bit,
            Some(false) => (),
            None => return Err(err(ctx.to_string(), format!(
                "flag `{}` is {}, not a boolean", name, set.type_name()))),
        }
    }
    Ok(bits)
}

fn flag_map(flags: &[(String, u64)], bits: u64) -> Value {
    Value::Map(Container(flags.iter().map(
        |&(ref name, bit)| (name.clone(), Value::Bool(bit == bits & bit)))
                         .collect()))
}

pub(super) fn parse_flags(inner: &Codec, flags: &[(String, u64)],
                          ctx: &Context, s: &mut Stream<&[u8]>)
                          -> Result<Value> {
    let raw = inner.parse(ctx, s)?;
    let bits = raw.as_int().ok_or_else(|| Error::Parse(
        ctx.to_string(), format!("flags stored in {}", raw.type_name())))?;
    Ok(flag_map(flags, bits as u64))
}

pub(super) fn build_flags(inner: &Codec, flags: &[(String, u64)],
                          value: &Value, ctx: &Context,
                          s: &mut Stream<Vec<u8>>) -> Result<Value> {
    let bits = flag_bits(flags, value, ctx, Error::Build)?;
    inner.build(&Value::Int(bits as i128), ctx, s)?;
    Ok(flag_map(flags, bits))
}

/// Check and complete a map of flags given at construction.
pub(crate) fn coerce_flags(flags: &[(String, u64)], value: &Value,
                           ctx: &Context) -> Result<Value> {
    flag_bits(flags, value, ctx, Error::Construction)
        .map(|bits| flag_map(flags, bits))
}

#[cfg(test)]
mod test {
    use crate::codec::Codec;
    use crate::config::Endianness;
    use crate::error::Error;
    use crate::test_helpers::parse;
    use crate::value::{Container, Value};

    fn u8() -> Codec {
        Codec::int(1, false, Endianness::Big).unwrap()
    }

    #[test]
    fn mappings_are_strict() {
        let codec = Codec::mapping(u8(), vec![("on", 1), ("off", 0)]);
        let params = Container::new();
        assert_eq!(Value::from("on"),
                   codec.parse_bytes(&parse("01"), &params).unwrap());
        assert_eq!(parse("00"),
                   codec.build_bytes(&Value::from("off"), &params).unwrap());
        assert_eq!(1, codec.sizeof(&params).unwrap());

        match codec.parse_bytes(&parse("02"), &params) {
            Ok(v) => panic!("unexpectedly succeeded: {:?}", v),
            Err(Error::Parse(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
        match codec.build_bytes(&Value::Int(1), &params) {
            Ok(b) => panic!("unexpectedly succeeded: {:?}", b),
            Err(Error::Build(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn enumerations_pass_unknown_integers() {
        let codec = Codec::enumeration(
            u8(), vec![("ping", 1), ("pong", 2)]);
        let params = Container::new();
        assert_eq!(Value::from("pong"),
                   codec.parse_bytes(&parse("02"), &params).unwrap());
        assert_eq!(Value::Int(9),
                   codec.parse_bytes(&parse("09"), &params).unwrap());
        assert_eq!(parse("01"),
                   codec.build_bytes(&Value::from("ping"), &params).unwrap());
        assert_eq!(parse("02"),
                   codec.build_bytes(&Value::Int(2), &params).unwrap());

        match codec.build_bytes(&Value::from("pang"), &params) {
            Ok(b) => panic!("unexpectedly succeeded: {:?}", b),
            Err(Error::Build(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn flags_round_trip() {
        let codec = Codec::flags(u8(), vec![("read", 1), ("write", 2),
                                            ("exec", 4)]);
        let params = Container::new();
        let v = codec.parse_bytes(&parse("05"), &params).unwrap();
        assert_eq!(Value::Map(Container::new()
                              .with("read", true)
                              .with("write", false)
                              .with("exec", true)), v);
        assert_eq!(parse("05"), codec.build_bytes(&v, &params).unwrap());
        assert_eq!(parse("02"), codec.build_bytes(
            &Container::new().with("write", true).into(), &params).unwrap());

        match codec.build_bytes(
            &Container::new().with("sticky", true).into(), &params)
        {
            Ok(b) => panic!("unexpectedly succeeded: {:?}", b),
            Err(Error::Build(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }
}
