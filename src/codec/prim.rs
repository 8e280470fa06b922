//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Atomic codecs.

use quick_error::ResultExt;

use crate::config::{Encoding, Endianness};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::stream::Stream;
use crate::value::Value;
use crate::wire;
use super::{byte_bits, Count};

/// An atomic codec over a fixed-width number, a flag, bytes or text.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub enum Prim {
    /// A `width`-byte integer.
    Int { width: usize, signed: bool, endian: Endianness },
    /// A `bits`-wide integer, most significant bit first.
    BitInt { bits: u32, signed: bool },
    /// A 4- or 8-byte IEEE-754 float.
    Float { width: usize, endian: Endianness },
    /// A boolean. Occupies one bit inside a bit struct and one byte
    /// elsewhere; any non-zero byte parses as true.
    Flag,
    /// Raw bytes.
    Bytes(Count),
    /// Text ended by a zero code unit.
    CString(Encoding),
    /// Text zero-padded to a fixed number of bytes.
    PaddedString(usize, Encoding),
    /// Text running to the end of input.
    GreedyString(Encoding),
    /// Nothing.
    Pass,
}

fn expected(ctx: &Context, what: &str, value: &Value) -> Error {
    Error::Build(ctx.to_string(), format!(
        "expected {}, got {}", what, value.type_name()))
}

fn decode_text(ctx: &Context, data: &[u8], encoding: Encoding)
               -> Result<Value> {
    wire::decode_str(data, encoding)
        .map(Value::Str)
        .map_err(|msg| Error::Parse(ctx.to_string(), msg.to_owned()))
}

fn encode_text<'v>(ctx: &Context, value: &'v Value, encoding: Encoding)
                   -> Result<(&'v str, Vec<u8>)> {
    let text = value.as_str().ok_or_else(|| expected(ctx, "str", value))?;
    let data = wire::encode_str(text, encoding)
        .map_err(|msg| Error::Build(ctx.to_string(), msg.to_owned()))?;
    Ok((text, data))
}

/// Round `v` to the precision of a `width`-byte float.
pub(crate) fn narrow(v: f64, width: usize) -> f64 {
    if 4 == width { v as f32 as f64 } else { v }
}

fn check_range(ctx: &Context, v: i128, bits: u32, signed: bool)
               -> Result<()> {
    if wire::int_fits(v, bits, signed) {
        Ok(())
    } else {
        Err(Error::Build(ctx.to_string(), format!(
            "{} does not fit in {} {} bits", v,
            if signed { "signed" } else { "unsigned" }, bits)))
    }
}

impl Prim {
    pub(crate) fn parse(&self, ctx: &Context, s: &mut Stream<&[u8]>)
                        -> Result<Value> {
        Ok(match *self {
            Prim::Int { width, signed, endian } => Value::Int(
                wire::read_int(s, width, signed, endian).context(ctx)?),
            Prim::BitInt { bits, signed } => Value::Int(
                wire::read_bit_int(s, bits, signed).context(ctx)?),
            Prim::Float { width, endian } => Value::Float(
                wire::read_float(s, width, endian).context(ctx)?),
            Prim::Flag => Value::Bool(if ctx.bitwise {
                0 != s.read_bits(1).context(ctx)?
            } else {
                0 != s.read_bits(8).context(ctx)?
            }),
            Prim::Bytes(ref count) => Value::Bytes(match *count {
                Count::Fixed(n) => s.read_bytes(n).context(ctx)?,
                Count::Expr(ref e) =>
                    s.read_bytes(e.eval_usize(ctx)?).context(ctx)?,
                Count::Greedy => s.read_rest().context(ctx)?,
            }),
            Prim::CString(encoding) => {
                let data = s.read_terminated(encoding.unit_size())
                    .context(ctx)?;
                decode_text(ctx, &data, encoding)?
            },
            Prim::PaddedString(len, encoding) => {
                let data = s.read_bytes(len).context(ctx)?;
                decode_text(ctx, wire::strip_padding(
                    &data, encoding.unit_size()), encoding)?
            },
            Prim::GreedyString(encoding) => {
                let data = s.read_rest().context(ctx)?;
                decode_text(ctx, &data, encoding)?
            },
            Prim::Pass => Value::None,
        })
    }

    pub(crate) fn build(&self, value: &Value, ctx: &Context,
                        s: &mut Stream<Vec<u8>>) -> Result<Value> {
        match *self {
            Prim::Int { width, signed, endian } => {
                let v = value.as_int()
                    .ok_or_else(|| expected(ctx, "int", value))?;
                check_range(ctx, v, width as u32 * 8, signed)?;
                wire::write_int(s, v, width, endian);
                Ok(Value::Int(v))
            },
            Prim::BitInt { bits, signed } => {
                let v = value.as_int()
                    .ok_or_else(|| expected(ctx, "int", value))?;
                check_range(ctx, v, bits, signed)?;
                wire::write_bit_int(s, v, bits);
                Ok(Value::Int(v))
            },
            Prim::Float { width, endian } => {
                let v = value.as_f64()
                    .ok_or_else(|| expected(ctx, "float", value))?;
                wire::write_float(s, v, width, endian);
                Ok(Value::Float(narrow(v, width)))
            },
            Prim::Flag => {
                let b = value.as_bool()
                    .ok_or_else(|| expected(ctx, "bool", value))?;
                s.write_bits(b as u64, if ctx.bitwise { 1 } else { 8 });
                Ok(Value::Bool(b))
            },
            Prim::Bytes(ref count) => {
                let data = value.as_bytes()
                    .ok_or_else(|| expected(ctx, "bytes", value))?;
                let want = match *count {
                    Count::Fixed(n) => Some(n),
                    Count::Expr(ref e) => Some(e.eval_usize(ctx)?),
                    Count::Greedy => None,
                };
                if let Some(n) = want {
                    if n != data.len() {
                        return Err(Error::Build(ctx.to_string(), format!(
                            "expected {} bytes, got {}", n, data.len())));
                    }
                }
                s.write_bytes(data);
                Ok(value.clone())
            },
            Prim::CString(encoding) => {
                let unit = encoding.unit_size();
                let (_, data) = encode_text(ctx, value, encoding)?;
                if data.chunks(unit).any(|c| c.iter().all(|&b| 0 == b)) {
                    return Err(Error::Build(
                        ctx.to_string(),
                        "string contains its own terminator".to_owned()));
                }
                s.write_bytes(&data);
                s.write_zeros(unit as u64 * 8);
                Ok(value.clone())
            },
            Prim::PaddedString(len, encoding) => {
                let (_, data) = encode_text(ctx, value, encoding)?;
                if data.len() > len {
                    return Err(Error::Build(ctx.to_string(), format!(
                        "string needs {} bytes, only {} available",
                        data.len(), len)));
                }
                s.write_bytes(&data);
                s.write_zeros((len - data.len()) as u64 * 8);
                Ok(value.clone())
            },
            Prim::GreedyString(encoding) => {
                let (_, data) = encode_text(ctx, value, encoding)?;
                s.write_bytes(&data);
                Ok(value.clone())
            },
            Prim::Pass => Ok(Value::None),
        }
    }

    pub(crate) fn measure(&self, ctx: &Context) -> Result<u64> {
        match *self {
            Prim::Int { width, .. } | Prim::Float { width, .. } =>
                Ok(width as u64 * 8),
            Prim::BitInt { bits, .. } => Ok(bits as u64),
            Prim::Flag => Ok(if ctx.bitwise { 1 } else { 8 }),
            Prim::Bytes(Count::Fixed(n)) => byte_bits(n, ctx),
            Prim::Bytes(Count::Expr(ref e)) => byte_bits(e.eval_usize(ctx)?, ctx),
            Prim::PaddedString(len, _) => byte_bits(len, ctx),
            Prim::Pass => Ok(0),
            Prim::Bytes(Count::Greedy) | Prim::CString(..) |
            Prim::GreedyString(..) => Err(Error::Unsized(ctx.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::codec::Codec;
    use crate::config::{Config, Encoding, Endianness};
    use crate::context::{this, Context};
    use crate::error::Error;
    use crate::test_helpers::parse;
    use crate::value::{Container, Value};

    fn round_trip(codec: &Codec, value: Value, encoded: &str) {
        let expected = parse(encoded);
        let params = Container::new();
        assert_eq!(expected, codec.build_bytes(&value, &params).unwrap());
        assert_eq!(value, codec.parse_bytes(&expected, &params).unwrap());
    }

    #[test]
    fn integers() {
        round_trip(&Codec::int(4, true, Endianness::Big).unwrap(),
                   Value::Int(-20), "FF FF FF EC");
        round_trip(&Codec::int(2, false, Endianness::Little).unwrap(),
                   Value::Int(0x1234), "34 12");
        round_trip(&Codec::int(3, false, Endianness::Big).unwrap(),
                   Value::Int(0x010203), "01 02 03");
    }

    #[test]
    fn integer_range_checked() {
        let codec = Codec::int(1, false, Endianness::Big).unwrap();
        match codec.build_bytes(&Value::Int(256), &Container::new()) {
            Ok(b) => panic!("unexpectedly succeeded: {:?}", b),
            Err(Error::Build(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn bad_widths_rejected() {
        match Codec::int(9, false, Endianness::Big) {
            Ok(c) => panic!("unexpectedly succeeded: {:?}", c),
            Err(Error::InvalidSchema(ref wo, _)) => assert_eq!("int", wo),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
        assert!(Codec::int(0, true, Endianness::Big).is_err());
        assert!(Codec::bit_int(0, false).is_err());
        assert!(Codec::bit_int(65, true).is_err());
        assert!(Codec::float(2, Endianness::Big).is_err());
        assert!(Codec::bit_int(64, true).is_ok());
    }

    #[test]
    fn single_floats_built_at_their_precision() {
        let codec = Codec::float(4, Endianness::Big).unwrap();
        let built = {
            let config = Config::default();
            let params = Container::new();
            let ctx = Context::top("", &config, &params);
            let mut s = crate::stream::Stream::writer();
            codec.build(&Value::Float(0.1), &ctx, &mut s).unwrap()
        };
        let data = codec.build_bytes(&Value::Float(0.1), &Container::new())
            .unwrap();
        assert_eq!(parse("3D CC CC CD"), data);
        assert_eq!(built, codec.parse_bytes(&data, &Container::new())
                   .unwrap());
        assert!(Value::Float(0.1) != built);
    }

    #[test]
    fn huge_byte_count_is_an_error() {
        let codec = Codec::bytes(this("n"));
        let params = Container::new().with("n", 1u64 << 61);
        match codec.parse_bytes(&parse("01 02"), &params) {
            Ok(v) => panic!("unexpectedly succeeded: {:?}", v),
            Err(Error::Stream(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
        match codec.sizeof(&params) {
            Ok(n) => panic!("unexpectedly succeeded: {}", n),
            Err(Error::Parse(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn flag_is_byte_outside_bit_structs() {
        round_trip(&Codec::flag(), Value::Bool(true), "01");
        assert_eq!(Value::Bool(true), Codec::flag().parse_bytes(
            &parse("7F"), &Container::new()).unwrap());
        assert_eq!(1, Codec::flag().sizeof(&Container::new()).unwrap());
    }

    #[test]
    fn strings() {
        round_trip(&Codec::cstring(Encoding::Utf8),
                   Value::from("hi"), "'hi' 00");
        round_trip(&Codec::cstring(Encoding::Utf16Le),
                   Value::from("hi"), "68 00 69 00 00 00");
        round_trip(&Codec::padded_string(4, Encoding::Ascii),
                   Value::from("ab"), "'ab' 00 00");
        round_trip(&Codec::greedy_string(Encoding::Utf8),
                   Value::from("xyz"), "'xyz'");
    }

    #[test]
    fn embedded_terminator_rejected() {
        let codec = Codec::cstring(Encoding::Utf8);
        match codec.build_bytes(&Value::from("a\0b"), &Container::new()) {
            Ok(b) => panic!("unexpectedly succeeded: {:?}", b),
            Err(Error::Build(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn truncated_input_is_stream_error() {
        let codec = Codec::int(4, true, Endianness::Big).unwrap();
        match codec.parse_bytes(&parse("00 01"), &Container::new()) {
            Ok(v) => panic!("unexpectedly succeeded: {:?}", v),
            Err(Error::Stream(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn bytes_sized_by_context() {
        let codec = Codec::bytes(this("n"));
        let params = Container::new().with("n", 2);
        assert_eq!(Value::Bytes(vec![1, 2]),
                   codec.parse_bytes(&parse("01 02 03"), &params).unwrap());
        assert_eq!(2, codec.sizeof(&params).unwrap());

        match codec.sizeof(&Container::new()) {
            Ok(n) => panic!("unexpectedly succeeded: {}", n),
            Err(Error::ContextRequired(_, ref name)) => assert_eq!("n", name),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn greedy_is_unsized() {
        match Codec::greedy_bytes().sizeof(&Container::new()) {
            Ok(n) => panic!("unexpectedly succeeded: {}", n),
            Err(Error::Unsized(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn bit_ints_in_bit_context() {
        let config = Config::default();
        let params = Container::new();
        let top = Context::top("", &config, &params);
        let ctx = top.enter("x", 0, None, true).unwrap();

        assert_eq!(4, Codec::nibble().measure(&ctx).unwrap());
        assert_eq!(1, Codec::flag().measure(&ctx).unwrap());
        assert_eq!(16, Codec::int(2, false, Endianness::Big).unwrap()
                   .measure(&ctx).unwrap());
    }
}
