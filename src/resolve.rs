//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Type descriptors and their resolution into codecs.
//!
//! A `Ty` is what a schema author writes for a field: a native scalar, a
//! generic container over other descriptors, or something that already is a
//! codec. A `Registry` turns descriptors into codecs, consulting its table of
//! native codecs for scalars and recursing through containers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::codec::{Aggregate, Codec, Count, Kind, Prim, Strategy};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::schema::{Forward, Schema};
use crate::switch::Switch;

/// The closed set of native scalar shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Native {
    I8, U8, I16, U16, I24, U24, I32, U32, I64, U64,
    F32, F64,
    Bool,
    Str,
    Bytes,
}

/// Rust types with a natural native shape.
pub trait NativeType {
    /// The shape of `Self`.
    const NATIVE: Native;
}

macro_rules! native_type {
    ($($t:ty => $n:ident),*) => { $(
        impl NativeType for $t {
            const NATIVE: Native = Native::$n;
        }
    )* }
}
native_type!(i8 => I8, u8 => U8, i16 => I16, u16 => U16,
             i32 => I32, u32 => U32, i64 => I64, u64 => U64,
             f32 => F32, f64 => F64, bool => Bool,
             String => Str, Vec<u8> => Bytes);

/// A type descriptor.
#[derive(Clone, Debug)]
pub enum Ty {
    /// A native scalar, resolved through the registry.
    Native(Native),
    /// An already-resolved codec, used as is.
    Codec(Codec),
    /// The records of a schema.
    Schema(Schema),
    /// The records of a schema declared but not yet defined.
    Forward(Forward),
    /// A homogeneous list; without a count it extends to the end of input.
    List(Box<Ty>, Option<Count>),
    /// A fixed-arity positional group.
    Tuple(Vec<Ty>),
    /// Alternatives tried in order.
    Union(Vec<Ty>),
}

impl Ty {
    /// The descriptor of a Rust type.
    pub fn of<T : NativeType>() -> Ty {
        Ty::Native(T::NATIVE)
    }

    /// The default integer.
    pub fn int() -> Ty {
        Ty::Native(Native::I32)
    }

    /// The default float.
    pub fn float() -> Ty {
        Ty::Native(Native::F32)
    }

    /// The native string shape.
    pub fn string() -> Ty {
        Ty::Native(Native::Str)
    }

    /// A list of exactly `count` elements, either fixed or computed.
    pub fn list<T : Into<Ty>, C : Into<Count>>(elem: T, count: C) -> Ty {
        Ty::List(Box::new(elem.into()), Some(count.into()))
    }

    /// A list running to the end of input.
    pub fn greedy_list<T : Into<Ty>>(elem: T) -> Ty {
        Ty::List(Box::new(elem.into()), None)
    }
}

impl From<Native> for Ty {
    fn from(n: Native) -> Self { Ty::Native(n) }
}
impl From<Codec> for Ty {
    fn from(c: Codec) -> Self { Ty::Codec(c) }
}
impl<'a> From<&'a Codec> for Ty {
    fn from(c: &'a Codec) -> Self { Ty::Codec(c.clone()) }
}
impl From<Schema> for Ty {
    fn from(s: Schema) -> Self { Ty::Schema(s) }
}
impl<'a> From<&'a Schema> for Ty {
    fn from(s: &'a Schema) -> Self { Ty::Schema(s.clone()) }
}
impl From<Forward> for Ty {
    fn from(f: Forward) -> Self { Ty::Forward(f) }
}
impl<'a> From<&'a Forward> for Ty {
    fn from(f: &'a Forward) -> Self { Ty::Forward(f.clone()) }
}
impl From<Switch> for Ty {
    fn from(s: Switch) -> Self { Ty::Codec(s.codec()) }
}
impl<'a> From<&'a Switch> for Ty {
    fn from(s: &'a Switch) -> Self { Ty::Codec(s.codec()) }
}

#[derive(Clone)]
struct Table {
    config: Config,
    natives: HashMap<Native, Codec>,
}

/// Maps native shapes to codecs and resolves descriptors.
///
/// A registry captures a `Config` when it is created; the native codecs it
/// hands out use that configuration's byte order and encoding. Cloning is
/// cheap and shares the table.
#[derive(Clone)]
pub struct Registry(Arc<Table>);

impl Default for Registry {
    fn default() -> Self {
        Registry::new(Config::default())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Registry({:?}, {} natives)", self.0.config,
               self.0.natives.len())
    }
}

impl Registry {
    /// A registry with the standard codec for every native shape.
    pub fn new(config: Config) -> Self {
        let endian = config.endianness;
        let mut natives = HashMap::new();
        {
            let mut int = |n, width, signed| {
                natives.insert(n, Codec::new(Kind::Prim(Prim::Int {
                    width, signed, endian })));
            };
            int(Native::I8, 1, true);
            int(Native::U8, 1, false);
            int(Native::I16, 2, true);
            int(Native::U16, 2, false);
            int(Native::I24, 3, true);
            int(Native::U24, 3, false);
            int(Native::I32, 4, true);
            int(Native::U32, 4, false);
            int(Native::I64, 8, true);
            int(Native::U64, 8, false);
        }
        for &(n, width) in &[(Native::F32, 4), (Native::F64, 8)] {
            natives.insert(n, Codec::new(Kind::Prim(Prim::Float {
                width, endian })));
        }
        natives.insert(Native::Bool, Codec::flag());
        natives.insert(Native::Str, Codec::cstring(config.encoding));
        natives.insert(Native::Bytes, Codec::greedy_bytes());

        Registry(Arc::new(Table { config, natives }))
    }

    /// A registry with no native codecs at all.
    pub fn empty(config: Config) -> Self {
        Registry(Arc::new(Table { config, natives: HashMap::new() }))
    }

    /// Register `codec` for `native`, replacing any existing entry.
    ///
    /// Other clones of this registry are unaffected.
    pub fn with(mut self, native: Native, codec: Codec) -> Self {
        Arc::make_mut(&mut self.0).natives.insert(native, codec);
        self
    }

    /// The configuration captured by this registry.
    pub fn config(&self) -> &Config {
        &self.0.config
    }

    /// Look up the codec for a native shape.
    pub fn dispatch(&self, native: Native) -> Option<Codec> {
        self.0.natives.get(&native).cloned()
    }

    /// Resolve a descriptor.
    pub fn resolve(&self, ty: &Ty) -> Result<Codec> {
        self.resolve_in(ty, "type")
    }

    /// Resolve a descriptor, naming `wo` as its location in errors.
    pub(crate) fn resolve_in(&self, ty: &Ty, wo: &str) -> Result<Codec> {
        match *ty {
            Ty::Codec(ref c) => Ok(c.clone()),
            Ty::Schema(ref s) => Ok(Codec::record(s.clone())),
            Ty::Forward(ref f) => Ok(Codec::forward(f.clone())),
            Ty::Native(n) => self.dispatch(n).ok_or_else(
                || Error::Resolution(wo.to_owned(), format!(
                    "no codec registered for {:?}", n))),
            Ty::List(ref elem, ref count) => {
                let elem = self.resolve_in(elem, &format!("{}[]", wo))?;
                Ok(Codec::array(elem, count.clone().unwrap_or(Count::Greedy)))
            },
            Ty::Tuple(ref items) => {
                if items.is_empty() {
                    return Err(Error::Resolution(
                        wo.to_owned(), "tuple has no elements".to_owned()));
                }
                let mut fields = Vec::with_capacity(items.len());
                for (ix, item) in items.iter().enumerate() {
                    let name = ix.to_string();
                    let codec = self.resolve_in(
                        item, &format!("{}.{}", wo, name))?;
                    fields.push(Field::new(name, codec));
                }
                Ok(Codec::aggregate(Aggregate {
                    name: wo.to_owned(),
                    strategy: Strategy::Sequence,
                    fields,
                    terminated: false,
                }))
            },
            Ty::Union(ref alts) => {
                let mut codecs = Vec::with_capacity(alts.len());
                for (ix, alt) in alts.iter().enumerate() {
                    codecs.push(self.resolve_in(
                        alt, &format!("{}|{}", wo, ix))?);
                }
                match codecs.len() {
                    0 => Err(Error::Resolution(
                        wo.to_owned(), "union has no alternatives".to_owned())),
                    1 => Ok(codecs.remove(0)),
                    _ => Ok(Codec::select(codecs)),
                }
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::{Kind, Prim};
    use crate::config::{Endianness, Encoding};
    use crate::test_helpers::parse;
    use crate::value::{Container, Value};

    #[test]
    fn natives_follow_config() {
        let mut config = Config::default();
        config.endianness = Endianness::Little;
        config.encoding = Encoding::Utf16Le;
        let registry = Registry::new(config);
        let params = Container::new();

        let int = registry.resolve(&Ty::int()).unwrap();
        assert_eq!(parse("EC FF FF FF"),
                   int.build_bytes(&Value::Int(-20), &params).unwrap());

        let text = registry.resolve(&Ty::of::<String>()).unwrap();
        assert_eq!(parse("61 00 00 00"),
                   text.build_bytes(&Value::from("a"), &params).unwrap());
    }

    #[test]
    fn codecs_pass_through() {
        let codec = Codec::nibble();
        let resolved = Registry::default().resolve(&codec.clone().into())
            .unwrap();
        match *resolved.kind() {
            Kind::Prim(Prim::BitInt { bits: 4, signed: false }) => (),
            _ => panic!("unexpected codec {:?}", resolved),
        }
    }

    #[test]
    fn empty_registry_fails_fast() {
        match Registry::empty(Config::default()).resolve(&Ty::of::<u8>()) {
            Ok(c) => panic!("unexpectedly succeeded: {:?}", c),
            Err(Error::Resolution(ref wo, _)) => assert_eq!("type", wo),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn nested_failure_names_location() {
        let registry = Registry::empty(Config::default())
            .with(Native::U8, Codec::int(1, false, Endianness::Big).unwrap());
        let ty = Ty::Tuple(vec![Ty::of::<u8>(),
                                Ty::greedy_list(Ty::of::<u16>())]);
        match registry.resolve_in(&ty, "P.f") {
            Ok(c) => panic!("unexpectedly succeeded: {:?}", c),
            Err(Error::Resolution(ref wo, _)) => assert_eq!("P.f.1[]", wo),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn generics_resolve_recursively() {
        let registry = Registry::default();
        let params = Container::new();

        let pair = registry.resolve(&Ty::Tuple(vec![
            Ty::of::<u8>(), Ty::of::<u16>()])).unwrap();
        assert_eq!(3, pair.sizeof(&params).unwrap());
        assert_eq!(Value::List(vec![Value::Int(1), Value::Int(2)]),
                   pair.parse_bytes(&parse("01 00 02"), &params).unwrap());

        let list = registry.resolve(&Ty::list(Ty::of::<u16>(), 3usize)).unwrap();
        assert_eq!(6, list.sizeof(&params).unwrap());

        let union = registry.resolve(&Ty::Union(vec![
            Ty::of::<u8>(), Ty::of::<String>()])).unwrap();
        assert_eq!(parse("'hey' 00"), union.build_bytes(
            &Value::from("hey"), &params).unwrap());

        match registry.resolve(&Ty::Union(vec![])) {
            Ok(c) => panic!("unexpectedly succeeded: {:?}", c),
            Err(Error::Resolution(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
        match registry.resolve(&Ty::Tuple(vec![])) {
            Ok(c) => panic!("unexpectedly succeeded: {:?}", c),
            Err(Error::Resolution(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }
}
