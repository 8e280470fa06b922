//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Dynamically-shaped values flowing in and out of codecs.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::lazy::Lazy;
use crate::record::Record;

/// A decoded value, or a value about to be encoded.
///
/// Codecs produce the structural variants (`Map` for named aggregates,
/// `List` for arrays and sequences). Records and lazy proxies appear wherever
/// a field's type is a schema.
#[derive(Clone)]
pub enum Value {
    /// Absence of a value: a skipped optional, an unchosen union member, or
    /// a field left for its codec to fill in.
    None,
    #[allow(missing_docs)]
    Bool(bool),
    /// Any integer; wide enough for both `i64` and `u64`.
    Int(i128),
    #[allow(missing_docs)]
    Float(f64),
    #[allow(missing_docs)]
    Str(String),
    #[allow(missing_docs)]
    Bytes(Vec<u8>),
    /// An array or positional aggregate.
    List(Vec<Value>),
    /// A named aggregate that is not bound to a schema.
    Map(Container),
    /// A materialised record.
    Record(Arc<Record>),
    /// A record that has not been decoded yet.
    Lazy(Lazy),
}

impl Value {
    /// Return a short name for the shape of this value, for error messages.
    pub fn type_name(&self) -> &'static str {
        match *self {
            Value::None => "none",
            Value::Bool(..) => "bool",
            Value::Int(..) => "int",
            Value::Float(..) => "float",
            Value::Str(..) => "str",
            Value::Bytes(..) => "bytes",
            Value::List(..) => "list",
            Value::Map(..) => "map",
            Value::Record(..) => "record",
            Value::Lazy(..) => "lazy record",
        }
    }

    #[allow(missing_docs)]
    pub fn is_none(&self) -> bool {
        match *self {
            Value::None => true,
            _ => false,
        }
    }

    /// Return the integer value, treating booleans as 0 and 1.
    pub fn as_int(&self) -> Option<i128> {
        match *self {
            Value::Int(i) => Some(i),
            Value::Bool(b) => Some(b as i128),
            _ => None,
        }
    }

    /// Return the value as a float, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(f) => Some(f),
            Value::Int(i) => Some(i as f64),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            Value::Int(0) => Some(false),
            Value::Int(1) => Some(true),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::Str(ref s) => Some(s),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match *self {
            Value::Bytes(ref b) => Some(b),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    pub fn as_list(&self) -> Option<&[Value]> {
        match *self {
            Value::List(ref l) => Some(l),
            _ => None,
        }
    }

    /// Look up a member by name or index.
    ///
    /// Maps and records are indexed by field name, lists by decimal index.
    /// Lazy records are materialised to answer.
    pub fn member(&self, name: &str) -> Result<Option<Value>> {
        Ok(match *self {
            Value::Map(ref m) => m.get(name).cloned(),
            Value::Record(ref r) => r.get(name).cloned(),
            Value::Lazy(ref l) => l.force()?.get(name).cloned(),
            Value::List(ref l) => name.parse::<usize>().ok()
                .and_then(|ix| l.get(ix)).cloned(),
            _ => None,
        })
    }

    /// Convert to plain structural form: records become maps (or lists for
    /// sequence records), recursively, and lazy records are materialised
    /// first.
    pub fn to_structural(&self) -> Result<Value> {
        Ok(match *self {
            Value::Record(ref r) => r.to_structural()?,
            Value::Lazy(ref l) => l.force()?.to_structural()?,
            Value::List(ref l) => Value::List(
                l.iter().map(Value::to_structural)
                    .collect::<Result<Vec<_>>>()?),
            Value::Map(ref m) => Value::Map(m.to_structural()?),
            ref other => other.clone(),
        })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{:?}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Str(ref s) => write!(f, "{:?}", s),
            Value::Bytes(ref b) => write!(f, "b{:?}", b),
            Value::List(ref l) => f.debug_list().entries(l).finish(),
            Value::Map(ref m) => fmt::Debug::fmt(m, f),
            Value::Record(ref r) => fmt::Debug::fmt(&**r, f),
            Value::Lazy(ref l) => fmt::Debug::fmt(l, f),
        }
    }
}

/// Equality is structural. Records compare field by field, and lazy records
/// are materialised in order to be compared; one that fails to materialise
/// is equal to nothing.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        use self::Value::*;

        match (self, other) {
            (&None, &None) => true,
            (&Bool(a), &Bool(b)) => a == b,
            (&Int(a), &Int(b)) => a == b,
            (&Float(a), &Float(b)) => a == b,
            (&Str(ref a), &Str(ref b)) => a == b,
            (&Bytes(ref a), &Bytes(ref b)) => a == b,
            (&List(ref a), &List(ref b)) => a == b,
            (&Map(ref a), &Map(ref b)) => a == b,
            (&Record(ref a), &Record(ref b)) => a == b,
            (&Lazy(ref a), &Lazy(ref b)) => a == b,
            (&Lazy(ref a), &Record(ref b)) |
            (&Record(ref b), &Lazy(ref a)) =>
                a.force().map(|a| *a == **b).unwrap_or(false),
            _ => false,
        }
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => { $(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i128)
            }
        }
    )* }
}
value_from_int!(i8, u8, i16, u16, i32, u32, i64, u64, i128, isize, usize);

impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::Bool(v) }
}
impl From<f32> for Value {
    fn from(v: f32) -> Self { Value::Float(v as f64) }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::Float(v) }
}
impl<'a> From<&'a str> for Value {
    fn from(v: &'a str) -> Self { Value::Str(v.to_owned()) }
}
impl From<String> for Value {
    fn from(v: String) -> Self { Value::Str(v) }
}
impl<'a> From<&'a [u8]> for Value {
    fn from(v: &'a [u8]) -> Self { Value::Bytes(v.to_vec()) }
}
impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self { Value::Bytes(v) }
}
impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self { Value::List(v) }
}
impl From<Container> for Value {
    fn from(v: Container) -> Self { Value::Map(v) }
}
impl From<Record> for Value {
    fn from(v: Record) -> Self { Value::Record(Arc::new(v)) }
}
impl From<Arc<Record>> for Value {
    fn from(v: Arc<Record>) -> Self { Value::Record(v) }
}
impl From<Lazy> for Value {
    fn from(v: Lazy) -> Self { Value::Lazy(v) }
}

/// An ordered name-to-value mapping.
///
/// This is the raw result of parsing a named aggregate, the "this" scope
/// that field codecs see, and the form in which callers pass extra context
/// parameters.
#[derive(Clone, Default, PartialEq)]
pub struct Container(
    /// The entries, in declaration order.
    pub Vec<(String, Value)>);

impl Container {
    /// Return an empty container.
    pub fn new() -> Self {
        Container(Vec::new())
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|e| e.0 == name).map(|e| &e.1)
    }

    /// Return whether an entry by that name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|e| e.0 == name)
    }

    /// Append an entry without checking for an existing one.
    pub fn push<N : Into<String>, V : Into<Value>>(&mut self, name: N,
                                                    value: V) {
        self.0.push((name.into(), value.into()));
    }

    /// Replace the value of an existing entry, or append a new one.
    pub fn set<N : Into<String>, V : Into<Value>>(&mut self, name: N,
                                                   value: V) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|e| e.0 == name) {
            Some(e) => e.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Remove and return an entry.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.0.iter().position(|e| e.0 == name)
            .map(|ix| self.0.remove(ix).1)
    }

    /// Builder-style `push`.
    pub fn with<N : Into<String>, V : Into<Value>>(mut self, name: N,
                                                    value: V) -> Self {
        self.push(name, value);
        self
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|e| (&*e.0, &e.1))
    }

    pub(crate) fn to_structural(&self) -> Result<Container> {
        let mut out = Vec::with_capacity(self.0.len());
        for &(ref name, ref value) in &self.0 {
            out.push((name.clone(), value.to_structural()?));
        }
        Ok(Container(out))
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.0.iter().map(|e| (&e.0, &e.1))).finish()
    }
}

/// A hashable switch key.
///
/// Booleans are folded into integers, so a flag field can select cases
/// registered under `0` and `1`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    #[allow(missing_docs)]
    None,
    #[allow(missing_docs)]
    Int(i128),
    #[allow(missing_docs)]
    Str(String),
    #[allow(missing_docs)]
    Bytes(Vec<u8>),
}

impl Key {
    /// Convert a computed value into a key, if it is hashable.
    pub fn from_value(value: &Value) -> Option<Key> {
        match *value {
            Value::None => Some(Key::None),
            Value::Bool(b) => Some(Key::Int(b as i128)),
            Value::Int(i) => Some(Key::Int(i)),
            Value::Str(ref s) => Some(Key::Str(s.clone())),
            Value::Bytes(ref b) => Some(Key::Bytes(b.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Key::None => write!(f, "None"),
            Key::Int(i) => write!(f, "{}", i),
            Key::Str(ref s) => write!(f, "{:?}", s),
            Key::Bytes(ref b) => write!(f, "b{:?}", b),
        }
    }
}

macro_rules! key_from_int {
    ($($t:ty),*) => { $(
        impl From<$t> for Key {
            fn from(v: $t) -> Self {
                Key::Int(v as i128)
            }
        }
    )* }
}
key_from_int!(i8, u8, i16, u16, i32, u32, i64, u64, i128);

impl From<bool> for Key {
    fn from(v: bool) -> Self { Key::Int(v as i128) }
}
impl<'a> From<&'a str> for Key {
    fn from(v: &'a str) -> Self { Key::Str(v.to_owned()) }
}
impl From<String> for Key {
    fn from(v: String) -> Self { Key::Str(v) }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn container_set_and_take() {
        let mut c = Container::new().with("a", 1).with("b", "x");
        c.set("a", 2);
        c.set("c", true);
        assert_eq!(Some(&Value::Int(2)), c.get("a"));
        assert_eq!(3, c.len());
        assert_eq!(Some(Value::from("x")), c.take("b"));
        assert!(!c.contains("b"));
        assert_eq!(vec!["a", "c"],
                   c.iter().map(|(n, _)| n).collect::<Vec<_>>());
    }

    #[test]
    fn members_by_name_and_index() {
        let v = Value::List(vec![
            Value::Map(Container::new().with("x", 5)),
        ]);
        let first = v.member("0").unwrap().unwrap();
        assert_eq!(Some(Value::Int(5)), first.member("x").unwrap());
        assert_eq!(None, v.member("1").unwrap());
        assert_eq!(None, Value::Int(3).member("x").unwrap());
    }

    #[test]
    fn keys_fold_bools() {
        assert_eq!(Some(Key::Int(1)), Key::from_value(&Value::Bool(true)));
        assert_eq!(Key::from(1u8), Key::from(true));
        assert_eq!(None, Key::from_value(&Value::Float(1.0)));
        assert_eq!("\"foo\"", Key::from("foo").to_string());
    }

    #[test]
    fn mixed_variants_unequal() {
        assert!(Value::Int(1) != Value::Bool(true));
        assert!(Value::None != Value::List(vec![]));
        assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
    }
}
