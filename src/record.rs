//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Records and their construction.
//!
//! A record is an instance of a schema: one value per field, in field order.
//! Records come from decoding, or from initialisers via
//! `Schema::instantiate`. Constructing a record coerces each given value
//! through the field's codec, so a nested schema field given as a map or a
//! tuple becomes a record of that schema, and out-of-range values are
//! reported at construction rather than when the record is built.

use std::fmt;
use std::ops::Index;

use crate::codec::{coerce_flags, narrow, truth, Codec, Count, Kind, Prim,
                   Strategy};
use crate::config::Encoding;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::schema::Schema;
use crate::value::{Container, Value};
use crate::wire;

/// A decoded or constructed instance of a schema.
#[derive(Clone)]
pub struct Record {
    schema: Schema,
    values: Container,
}

impl Record {
    /// The schema this record is an instance of.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Return the value of the named field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Return the value of the named field, or `UnknownField` if the schema
    /// has no such field.
    pub fn try_get(&self, name: &str) -> Result<&Value> {
        self.values.get(name).ok_or_else(|| Error::UnknownField(
            self.schema.name().to_owned(), name.to_owned()))
    }

    /// Return the value of the field at `ix`.
    pub fn at(&self, ix: usize) -> Option<&Value> {
        self.values.0.get(ix).map(|e| &e.1)
    }

    /// All field values, in field order.
    pub fn values(&self) -> &Container {
        &self.values
    }

    /// The number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the schema has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter()
    }

    /// Convert to plain maps and lists, recursively.
    pub fn to_structural(&self) -> Result<Value> {
        let values = self.values.to_structural()?;
        Ok(if Strategy::Sequence == self.schema.strategy() {
            Value::List(values.0.into_iter().map(|e| e.1).collect())
        } else {
            Value::Map(values)
        })
    }

    /// Encode this record.
    pub fn build(&self, params: &Container) -> Result<Vec<u8>> {
        self.schema.construct().build_with(
            &Value::Map(self.values.clone()), self.schema.name(),
            self.schema.config(), params)
    }

    /// Wrap the output of the schema's aggregate codec.
    pub(crate) fn from_raw(schema: &Schema, raw: Value) -> Result<Record> {
        let values = match raw {
            Value::Map(m) => m,
            Value::List(items) => Container(
                schema.field_names().into_iter().zip(items).collect()),
            other => return Err(Error::Construction(
                schema.name().to_owned(), format!(
                    "cannot wrap {} as a record", other.type_name()))),
        };
        Ok(Record { schema: schema.clone(), values })
    }

    pub(crate) fn from_named(schema: &Schema, given: Container,
                             params: &Container) -> Result<Record> {
        let ctx = Context::top(schema.name(), schema.config(), params);
        let values = coerce_fields(&schema.fields(), schema.strategy(),
                                   given, &ctx, schema.name())?;
        Ok(Record { schema: schema.clone(), values })
    }

    pub(crate) fn from_positional(schema: &Schema, items: Vec<Value>,
                                  params: &Container) -> Result<Record> {
        let given = positional(schema.name(), &schema.fields(), items)?;
        Record::from_named(schema, given, params)
    }
}

fn positional(wo: &str, fields: &[Field], items: Vec<Value>)
              -> Result<Container> {
    if items.len() > fields.len() {
        return Err(Error::Construction(wo.to_owned(), format!(
            "{} takes at most {} values, got {}",
            wo, fields.len(), items.len())));
    }
    Ok(Container(fields.iter().map(|f| f.name().to_owned())
                  .zip(items).collect()))
}

/// Records are equal when their field values are.
impl PartialEq for Record {
    fn eq(&self, other: &Record) -> bool {
        self.values == other.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = f.debug_struct(self.schema.name());
        for (name, value) in self.values.iter() {
            s.field(name, value);
        }
        s.finish()
    }
}

/// Positional access.
///
/// # Panics
///
/// Panics if `ix` is not less than `len()`; use `at` for a checked lookup.
impl Index<usize> for Record {
    type Output = Value;

    fn index(&self, ix: usize) -> &Value {
        &self.values.0[ix].1
    }
}

/// Access by field name.
///
/// # Panics
///
/// Panics if the schema has no field of that name; use `get` or `try_get`
/// for a checked lookup.
impl<'a> Index<&'a str> for Record {
    type Output = Value;

    fn index(&self, name: &'a str) -> &Value {
        match self.values.get(name) {
            Some(v) => v,
            None => panic!("{} has no field `{}`", self.schema.name(), name),
        }
    }
}

/// Whether `e` means "this value does not fit this codec", as opposed to a
/// failure that trying another codec cannot fix.
pub(crate) fn is_mismatch(e: &Error) -> bool {
    e.is_structural() || match *e {
        Error::Construction(..) | Error::MissingField(..) |
        Error::UnknownField(..) => true,
        _ => false,
    }
}

fn absent(codec: &Codec) -> Value {
    match *codec.kind() {
        Kind::Default(_, ref v) | Kind::Const(_, ref v) => v.clone(),
        _ => Value::None,
    }
}

fn mismatch(ctx: &Context, what: &str, value: &Value) -> Error {
    Error::Construction(ctx.to_string(), format!(
        "expected {}, got {}", what, value.type_name()))
}

fn coerce_int(value: Value, bits: u32, signed: bool, ctx: &Context)
              -> Result<Value> {
    let n = match value {
        Value::Int(n) => n,
        Value::Bool(b) => b as i128,
        Value::Str(ref s) if !signed && 1 == s.chars().count() =>
            s.chars().next().map_or(0, |c| c as i128),
        ref other => return Err(mismatch(ctx, "an integer", other)),
    };
    if !wire::int_fits(n, bits, signed) {
        return Err(Error::Construction(ctx.to_string(), format!(
            "{} does not fit in {} {} bits", n, bits,
            if signed { "signed" } else { "unsigned" })));
    }
    Ok(Value::Int(n))
}

fn coerce_prim(prim: &Prim, value: Value, ctx: &Context) -> Result<Value> {
    match *prim {
        Prim::Int { width, signed, .. } =>
            coerce_int(value, width as u32 * 8, signed, ctx),
        Prim::BitInt { bits, signed } => coerce_int(value, bits, signed, ctx),
        Prim::Float { width, .. } => value.as_f64()
            .map(|v| Value::Float(narrow(v, width)))
            .ok_or_else(|| mismatch(ctx, "a number", &value)),
        Prim::Flag => value.as_bool().map(Value::Bool)
            .ok_or_else(|| mismatch(ctx, "a boolean", &value)),
        Prim::Bytes(ref count) => {
            let data = match value {
                Value::Bytes(data) => data,
                Value::Str(text) => text.into_bytes(),
                ref other => return Err(mismatch(ctx, "bytes", other)),
            };
            if let Count::Fixed(n) = *count {
                if n != data.len() {
                    return Err(Error::Construction(ctx.to_string(), format!(
                        "expected {} bytes, got {}", n, data.len())));
                }
            }
            Ok(Value::Bytes(data))
        },
        Prim::CString(encoding) => {
            let text = coerce_text(value, encoding, ctx)?;
            if text.contains('\0') {
                return Err(Error::Construction(ctx.to_string(),
                    "string contains its own terminator".to_owned()));
            }
            Ok(Value::Str(text))
        },
        Prim::PaddedString(len, encoding) => {
            let text = coerce_text(value, encoding, ctx)?;
            if text.ends_with('\0') {
                return Err(Error::Construction(ctx.to_string(),
                    "trailing NUL would be read back as padding".to_owned()));
            }
            let size = encoded_len(&text, encoding);
            if size > len {
                return Err(Error::Construction(ctx.to_string(), format!(
                    "string needs {} bytes, only {} available", size, len)));
            }
            Ok(Value::Str(text))
        },
        Prim::GreedyString(encoding) =>
            coerce_text(value, encoding, ctx).map(Value::Str),
        Prim::Pass => Ok(value),
    }
}

fn coerce_text(value: Value, encoding: Encoding, ctx: &Context)
               -> Result<String> {
    let text = match value {
        Value::Str(text) => text,
        Value::Bytes(data) => String::from_utf8(data).map_err(
            |_| Error::Construction(
                ctx.to_string(), "bytes are not valid UTF-8".to_owned()))?,
        ref other => return Err(mismatch(ctx, "a string", other)),
    };
    wire::encode_str(&text, encoding).map_err(
        |msg| Error::Construction(ctx.to_string(), msg.to_owned()))?;
    Ok(text)
}

fn encoded_len(text: &str, encoding: Encoding) -> usize {
    match encoding {
        Encoding::Utf8 | Encoding::Ascii => text.len(),
        Encoding::Utf16Le | Encoding::Utf16Be =>
            2 * text.encode_utf16().count(),
    }
}

fn count_matches(count: &Count, len: usize, ctx: &Context) -> Result<()> {
    let expected = match *count {
        Count::Fixed(n) => n,
        Count::Expr(ref e) => match e.eval_usize(ctx) {
            Ok(n) => n,
            // Counts read from parameters only known at build time.
            Err(Error::ContextRequired(..)) => return Ok(()),
            Err(e) => return Err(e),
        },
        Count::Greedy => return Ok(()),
    };
    if expected != len {
        return Err(Error::Construction(ctx.to_string(), format!(
            "expected {} elements, got {}", expected, len)));
    }
    Ok(())
}

/// Convert `value` into the form `codec` builds from, checking that it can
/// be encoded.
pub(crate) fn coerce(codec: &Codec, value: Value, ctx: &Context)
                     -> Result<Value> {
    if let Kind::IfThenElse(ref cond, ref then, ref otherwise) = *codec.kind() {
        return match truth(cond, ctx) {
            Ok(true) => coerce(then, value, ctx),
            Ok(false) => coerce(otherwise, value, ctx),
            // The condition depends on something only known when building.
            Err(Error::ContextRequired(..)) => Ok(value),
            Err(e) => Err(e),
        };
    }

    if value.is_none() {
        return if codec.accepts_absent() {
            Ok(absent(codec))
        } else {
            Err(Error::MissingField(ctx.to_string()))
        };
    }

    match *codec.kind() {
        Kind::Prim(ref p) => coerce_prim(p, value, ctx),
        Kind::Aggregate(ref a) => {
            let given = match value {
                Value::Map(m) => m,
                Value::Record(r) => r.values().clone(),
                Value::Lazy(l) => l.force()?.values().clone(),
                Value::List(items) => positional(&a.name, &a.fields, items)?,
                ref other => return Err(mismatch(ctx, &a.name, other)),
            };
            let values = coerce_fields(&a.fields, a.strategy, given, ctx,
                                       &ctx.to_string())?;
            Ok(if Strategy::Sequence == a.strategy {
                Value::List(values.0.into_iter().map(|e| e.1).collect())
            } else {
                Value::Map(values)
            })
        },
        Kind::Record(ref schema) =>
            Ok(schema.instantiate_with(value, ctx.params)?.into_value()),
        Kind::Forward(ref fwd) =>
            Ok(fwd.resolve(ctx)?.instantiate_with(value, ctx.params)?
               .into_value()),
        Kind::Array(ref elem, ref count) => {
            let items = match value {
                Value::List(items) => items,
                Value::Bytes(data) => data.into_iter().map(Value::from)
                    .collect(),
                ref other => return Err(mismatch(ctx, "a list", other)),
            };
            count_matches(count, items.len(), ctx)?;
            let mut out = Vec::with_capacity(items.len());
            for (ix, item) in items.into_iter().enumerate() {
                let name = ix.to_string();
                let sub = ctx.push(&name, 0)?;
                out.push(coerce(elem, item, &sub)?);
            }
            Ok(Value::List(out))
        },
        Kind::Select(ref alts) => {
            for alt in alts {
                match coerce(alt, value.clone(), ctx) {
                    Ok(v) => return Ok(v),
                    Err(ref e) if is_mismatch(e) => (),
                    Err(e) => return Err(e),
                }
            }
            Err(mismatch(ctx, "a value accepted by some alternative", &value))
        },
        Kind::Switch(ref sw) => match sw.coerce(value.clone(), ctx) {
            // The key depends on something only known when building.
            Err(Error::ContextRequired(..)) => Ok(value),
            result => result,
        },
        Kind::Const(_, ref expected) => if value == *expected {
            Ok(value)
        } else {
            Err(Error::Construction(ctx.to_string(), format!(
                "expected constant {:?}, got {:?}", expected, value)))
        },
        Kind::Mapping(ref inner, ref symbols) => {
            let raw = symbols.encode(&value).ok_or_else(
                || Error::Construction(ctx.to_string(), format!(
                    "{:?} is not a symbol", value)))?;
            let raw = coerce(inner, raw, ctx)?;
            Ok(symbols.decode(raw).unwrap_or(value))
        },
        Kind::Flags(_, ref flags) => coerce_flags(flags, &value, ctx),
        Kind::RepeatUntil(ref elem, _) => {
            let items = match value {
                Value::List(items) => items,
                ref other => return Err(mismatch(ctx, "a list", other)),
            };
            let mut out = Vec::with_capacity(items.len());
            for (ix, item) in items.into_iter().enumerate() {
                let name = ix.to_string();
                let sub = ctx.push(&name, 0)?;
                out.push(coerce(elem, item, &sub)?);
            }
            Ok(Value::List(out))
        },
        Kind::Prefixed(_, ref inner) | Kind::Padded(_, ref inner) |
        Kind::Default(ref inner, _) | Kind::Optional(ref inner) |
        Kind::Peek(ref inner) | Kind::Pointer(_, ref inner) |
        Kind::Rebuild(ref inner, _) | Kind::Aligned(_, ref inner) =>
            coerce(inner, value, ctx),
        Kind::Computed(..) | Kind::Check(..) => Ok(value),
        Kind::IfThenElse(..) => Ok(value),
    }
}

/// Fill in and coerce the values of `fields` from `given`.
///
/// Missing values come from field defaults. Rebuilt and computed fields are
/// evaluated last, against every other field, so they may read siblings
/// declared after them.
fn coerce_fields(fields: &[Field], strategy: Strategy, mut given: Container,
                 ctx: &Context, wo: &str) -> Result<Container> {
    if let Some((name, _)) = given.iter().find(
        |&(name, _)| !fields.iter().any(|f| f.name() == name))
    {
        return Err(Error::UnknownField(wo.to_owned(), name.to_owned()));
    }

    let union = Strategy::Union == strategy;
    let mut out = Container::new();
    let mut deferred = Vec::new();
    for (ix, field) in fields.iter().enumerate() {
        let value = given.take(field.name()).unwrap_or(Value::None);
        let value = match *field.codec().kind() {
            Kind::Rebuild(..) | Kind::Computed(..) => {
                deferred.push(ix);
                value
            },
            _ if value.is_none() && field.default().is_some() =>
                field.default_value().unwrap_or(Value::None),
            _ => value,
        };

        let value = if deferred.last() == Some(&ix)
            || (union && value.is_none())
        {
            value
        } else {
            let sub = ctx.enter(field.name(), 0, Some(&out), false)?;
            coerce(field.codec(), value, &sub)?
        };
        out.push(field.name(), value);
    }

    for ix in deferred {
        let field = &fields[ix];
        let value = {
            let sub = ctx.enter(field.name(), 0, Some(&out), false)?;
            match *field.codec().kind() {
                Kind::Rebuild(_, ref expr) | Kind::Computed(ref expr) =>
                    match expr.eval(&sub) {
                        Ok(v) => Some(v),
                        Err(Error::ContextRequired(..)) => None,
                        Err(e) => return Err(e),
                    },
                _ => None,
            }
        };
        if let Some(value) = value {
            out.0[ix].1 = value;
        }
    }

    if union && out.iter().all(|(_, v)| v.is_none()) {
        return Err(Error::Construction(wo.to_owned(), format!(
            "no member of {} has a value", wo)));
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::{len_of, this, Expr};
    use crate::resolve::{Native, Ty};
    use crate::test_helpers::parse;

    fn point() -> Schema {
        Schema::builder("Point")
            .field("x", Native::I32)
            .field("y", Native::I32)
            .finish().unwrap()
    }

    #[test]
    fn positional_and_named_agree() {
        let schema = point();
        let a = schema.positional(vec![(-20).into(), 8.into()]).unwrap();
        let b = schema.named(Container::new().with("y", 8).with("x", -20))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(vec!["x", "y"],
                   b.iter().map(|(n, _)| n).collect::<Vec<_>>());
        assert_eq!(Value::Int(-20), a[0]);
        assert_eq!(Value::Int(8), a["y"]);
        assert_eq!(parse("FF FF FF EC 00 00 00 08"),
                   a.build(&Container::new()).unwrap());
    }

    #[test]
    fn checked_lookup_by_name() {
        let r = point().positional(vec![1.into(), 2.into()]).unwrap();
        assert_eq!(Value::Int(2), *r.try_get("y").unwrap());
        match r.try_get("z") {
            Ok(v) => panic!("unexpectedly succeeded: {:?}", v),
            Err(Error::UnknownField(ref wo, ref name)) => {
                assert_eq!("Point", wo);
                assert_eq!("z", name);
            },
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    #[should_panic(expected = "no field `z`")]
    fn indexing_unknown_name_panics() {
        let r = point().positional(vec![1.into(), 2.into()]).unwrap();
        let _ = &r["z"];
    }

    #[test]
    fn single_floats_narrowed_at_construction() {
        let schema = Schema::builder("S")
            .field("f", Native::F32)
            .field("d", Native::F64)
            .finish().unwrap();
        let r = schema.positional(vec![0.1.into(), 0.1.into()]).unwrap();
        assert_eq!(Value::Float(0.1f32 as f64), r["f"]);
        assert_eq!(Value::Float(0.1), r["d"]);
    }

    #[test]
    fn missing_field_without_default() {
        match point().positional(vec![1.into()]) {
            Ok(r) => panic!("unexpectedly succeeded: {:?}", r),
            Err(Error::MissingField(ref wo)) => assert!(wo.contains("y"), "{}", wo),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn too_many_positional_values() {
        match point().positional(vec![1.into(), 2.into(), 3.into()]) {
            Ok(r) => panic!("unexpectedly succeeded: {:?}", r),
            Err(Error::Construction(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn unknown_named_value() {
        match point().named(Container::new().with("x", 1).with("y", 2)
                            .with("z", 3)) {
            Ok(r) => panic!("unexpectedly succeeded: {:?}", r),
            Err(Error::UnknownField(_, ref name)) => assert_eq!("z", name),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn defaults_fill_gaps() {
        let schema = Schema::builder("Opts")
            .field("a", Native::U8).default(3)
            .field("b", Native::U8).default_factory(|| Value::Int(4))
            .field("c", Native::U8)
            .finish().unwrap();
        let r = schema.named(Container::new().with("c", 5)).unwrap();
        assert_eq!(parse("03 04 05"), r.build(&Container::new()).unwrap());
    }

    #[test]
    fn out_of_range_rejected_at_construction() {
        match Schema::builder("B").field("b", Native::U8).finish().unwrap()
            .positional(vec![256.into()])
        {
            Ok(r) => panic!("unexpectedly succeeded: {:?}", r),
            Err(Error::Construction(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn characters_cast_to_unsigned() {
        let schema = Schema::builder("C").field("c", Native::U8)
            .finish().unwrap();
        let r = schema.positional(vec!["A".into()]).unwrap();
        assert_eq!(Some(&Value::Int(65)), r.get("c"));
    }

    #[test]
    fn nested_schemas_coerced() {
        let line = Schema::builder("Line")
            .field("from", &point())
            .field("to", &point())
            .finish().unwrap();
        let r = line.positional(vec![
            vec![Value::from(1), Value::from(2)].into(),
            Container::new().with("x", 3).with("y", 4).into(),
        ]).unwrap();
        match r.get("from") {
            Some(&Value::Record(ref p)) =>
                assert_eq!(Some(&Value::Int(2)), p.get("y")),
            v => panic!("not a record: {:?}", v),
        }
        assert_eq!(16, r.build(&Container::new()).unwrap().len());
    }

    #[test]
    fn tuple_fields_coerced_to_lists() {
        let schema = Schema::builder("T")
            .field("pair", Ty::Tuple(vec![Native::U8.into(),
                                          Native::U16.into()]))
            .finish().unwrap();
        let r = schema.named(Container::new().with(
            "pair", vec![Value::from(1), Value::from(2)])).unwrap();
        assert_eq!(parse("01 00 02"), r.build(&Container::new()).unwrap());
    }

    #[test]
    fn array_length_checked() {
        let schema = Schema::builder("A")
            .field("n", Native::U8)
            .field("items", Codec::array(Codec::octet(), this("n")))
            .finish().unwrap();
        schema.positional(vec![2.into(), vec![1u8, 2].into()]).unwrap();
        match schema.positional(vec![3.into(), vec![1u8, 2].into()]) {
            Ok(r) => panic!("unexpectedly succeeded: {:?}", r),
            Err(Error::Construction(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn rebuilt_fields_read_later_siblings() {
        let schema = Schema::builder("Blob")
            .field("len", Codec::rebuild(Codec::octet(), len_of("data")))
            .field("data", Codec::bytes(this("len")))
            .finish().unwrap();
        let r = schema.named(Container::new().with("data", &b"abc"[..]))
            .unwrap();
        assert_eq!(Some(&Value::Int(3)), r.get("len"));
        assert_eq!(parse("03 'abc'"), r.build(&Container::new()).unwrap());
    }

    #[test]
    fn computed_fields_take_no_space() {
        let schema = Schema::builder("Sum")
            .field("a", Native::U8)
            .field("b", Native::U8)
            .field("sum", Codec::computed(Expr::func(|ctx| {
                Ok(Value::Int(ctx.lookup("a")?.as_int().unwrap_or(0) +
                              ctx.lookup("b")?.as_int().unwrap_or(0)))
            })))
            .finish().unwrap();
        let r = schema.load(&parse("02 03"), &Container::new()).unwrap()
            .force().unwrap();
        assert_eq!(Some(&Value::Int(5)), r.get("sum"));
        let built = schema.positional(vec![2.into(), 3.into()]).unwrap();
        assert_eq!(Some(&Value::Int(5)), built.get("sum"));
        assert_eq!(parse("02 03"), built.build(&Container::new()).unwrap());
    }

    #[test]
    fn union_needs_one_member() {
        let schema = Schema::builder("U")
            .union()
            .field("small", Native::U8)
            .field("big", Native::U16)
            .finish().unwrap();
        let r = schema.named(Container::new().with("big", 0x102)).unwrap();
        assert_eq!(parse("01 02"), r.build(&Container::new()).unwrap());
        match schema.named(Container::new()) {
            Ok(r) => panic!("unexpectedly succeeded: {:?}", r),
            Err(Error::Construction(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn structural_form() {
        let pair = Schema::builder("Pair").sequence()
            .element(Native::U8).element(&point())
            .finish().unwrap();
        let r = pair.positional(vec![1.into(), vec![
            Value::from(2), Value::from(3)].into()]).unwrap();
        assert_eq!(Value::List(vec![
            Value::Int(1),
            Container::new().with("x", 2).with("y", 3).into(),
        ]), r.to_structural().unwrap());
    }
}
