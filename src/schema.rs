//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Schemas: named record declarations and their assembled codecs.
//!
//! Declaring a schema happens in two phases. A `SchemaBuilder` collects field
//! declarations, defaults and flags; `finish()` resolves every field's type
//! descriptor, checks the declaration for duplicate names and for fields
//! that read siblings declared after them, and produces an immutable
//! `Schema`. All of these errors surface at `finish()`, before any data is
//! processed.
//!
//! A schema assembles its aggregate codec on first use and memoises it.
//! `add_field` and `remove_field` invalidate the memo.
//!
//! Recursive schemas refer to themselves through a `Forward` handle, which
//! is declared before the schema is built and defined afterwards.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::codec::{Aggregate, Codec, Strategy};
use crate::config::Config;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::field::{Field, FieldDefault};
use crate::lazy::{Decoded, Lazy};
use crate::record::Record;
use crate::resolve::{Registry, Ty};
use crate::value::{Container, Value};

/// How an extending schema combines its fields with its parent's.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extend {
    /// Parent fields come first; redeclaring one is a duplicate.
    Append,
    /// A redeclared parent field is replaced in place; new fields come
    /// after the parent's.
    Override,
}

struct Inner {
    name: String,
    strategy: Strategy,
    registry: Registry,
    terminated: bool,
    cache: bool,
    lazy: bool,
    fields: RwLock<Vec<Field>>,
    memo: RwLock<Option<Codec>>,
}

/// A finished schema. Cloning is cheap and yields a handle to the same
/// schema.
#[derive(Clone)]
pub struct Schema(Arc<Inner>);

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Schema({}", self.0.name)?;
        for field in self.0.fields.read().iter() {
            write!(f, ", {}", field.name())?;
        }
        write!(f, ")")
    }
}

/// Reject fields that read a sibling at or after their own position.
fn check_order(schema: &str, strategy: Strategy, fields: &[Field])
               -> Result<()> {
    if Strategy::Union == strategy {
        return Ok(());
    }

    for (ix, field) in fields.iter().enumerate() {
        for sibling in field.codec().sibling_refs() {
            if let Some(pos) = fields.iter().position(
                |f| f.name() == sibling)
            {
                if pos >= ix {
                    return Err(Error::InvalidSchema(
                        format!("{}.{}", schema, field.name()), format!(
                            "reads sibling `{}`, which is not declared \
                             before it", sibling)));
                }
            }
        }
    }
    Ok(())
}

fn check_duplicates(schema: &str, fields: &[Field]) -> Result<()> {
    for (ix, field) in fields.iter().enumerate() {
        if fields[..ix].iter().any(|f| f.name() == field.name()) {
            return Err(Error::DuplicateField(
                schema.to_owned(), field.name().to_owned()));
        }
    }
    Ok(())
}

impl Schema {
    /// Start declaring a schema.
    pub fn builder<N : Into<String>>(name: N) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            strategy: None,
            decls: Vec::new(),
            parent: None,
            registry: None,
            terminated: None,
            lazy: None,
            cache: None,
            misuse: None,
        }
    }

    /// The name used in error locations and debug output.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// How the fields are laid out.
    pub fn strategy(&self) -> Strategy {
        self.0.strategy
    }

    /// Whether `load` defers decoding until the record is forced.
    pub fn is_lazy(&self) -> bool {
        self.0.lazy
    }

    /// Whether parsing requires the input to be exhausted afterwards.
    pub fn is_terminated(&self) -> bool {
        self.0.terminated
    }

    /// The registry field types are resolved against.
    pub fn registry(&self) -> &Registry {
        &self.0.registry
    }

    /// The configuration captured from the registry.
    pub fn config(&self) -> &Config {
        self.0.registry.config()
    }

    /// A snapshot of the current fields.
    pub fn fields(&self) -> Vec<Field> {
        self.0.fields.read().clone()
    }

    /// The names of the current fields, in order.
    pub fn field_names(&self) -> Vec<String> {
        self.0.fields.read().iter().map(|f| f.name().to_owned()).collect()
    }

    /// Return whether `self` and `other` are handles to the same schema.
    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Return the aggregate codec of this schema.
    ///
    /// The codec is assembled on first call and memoised unless caching is
    /// disabled. It parses to raw maps (or lists for sequences); to get
    /// records, use `load` or embed the schema as a field type.
    pub fn construct(&self) -> Codec {
        if self.0.cache {
            if let Some(ref codec) = *self.0.memo.read() {
                return codec.clone();
            }
        }

        // Holding the field lock while publishing keeps a concurrent
        // mutation from being overwritten by a stale codec.
        let fields = self.0.fields.read();
        debug!(schema = %self.0.name, strategy = ?self.0.strategy,
               fields = fields.len(), "assembling codec");
        let codec = Codec::aggregate(Aggregate {
            name: self.0.name.clone(),
            strategy: self.0.strategy,
            fields: fields.clone(),
            terminated: self.0.terminated,
        });
        if self.0.cache {
            *self.0.memo.write() = Some(codec.clone());
        }
        codec
    }

    /// The codec of this schema's records, for use inside other codecs.
    pub fn record_codec(&self) -> Codec {
        Codec::record(self.clone())
    }

    /// An array of exactly `count` records.
    pub fn array(&self, count: usize) -> Codec {
        Codec::array(self.record_codec(), count)
    }

    /// Decode `data`.
    ///
    /// A lazy schema only captures the input here; decoding happens when the
    /// result is forced, and errors in the data surface then.
    pub fn load(&self, data: &[u8], params: &Container) -> Result<Decoded> {
        if self.0.lazy {
            Ok(Decoded::Deferred(Lazy::from_bytes(
                self.clone(), data.to_vec(), params.clone())))
        } else {
            Ok(Decoded::Eager(Arc::new(self.decode(data, params)?)))
        }
    }

    pub(crate) fn decode(&self, data: &[u8], params: &Container)
                         -> Result<Record> {
        let raw = self.construct().parse_with(
            data, &self.0.name, self.config(), params)?;
        Record::from_raw(self, raw)
    }

    /// Return the encoded size in bytes, evaluating any context-dependent
    /// sizes against `params`.
    pub fn sizeof(&self, params: &Container) -> Result<usize> {
        self.construct().sizeof_with(&self.0.name, self.config(), params)
    }

    /// Make a record from any supported initialiser:
    ///
    /// - a record or lazy record of this schema is passed through;
    /// - a record of another schema is copied field by field;
    /// - a map supplies fields by name, with defaults for missing ones;
    /// - a list supplies fields by position;
    /// - bytes are decoded with `load`.
    ///
    /// Anything else is a `Construction` error.
    pub fn instantiate(&self, init: Value) -> Result<Decoded> {
        self.instantiate_with(init, &Container::new())
    }

    /// Like `instantiate`, with parameters for decoding bytes and evaluating
    /// context expressions.
    pub fn instantiate_with(&self, init: Value, params: &Container)
                            -> Result<Decoded> {
        match init {
            Value::Record(r) => if self.ptr_eq(r.schema()) {
                Ok(Decoded::Eager(r))
            } else {
                Ok(Decoded::Eager(Arc::new(Record::from_named(
                    self, r.values().clone(), params)?)))
            },
            Value::Lazy(l) => if self.ptr_eq(l.schema()) {
                Ok(Decoded::Deferred(l))
            } else {
                Ok(Decoded::Eager(Arc::new(Record::from_named(
                    self, l.force()?.values().clone(), params)?)))
            },
            Value::Map(m) => Ok(Decoded::Eager(Arc::new(
                Record::from_named(self, m, params)?))),
            Value::List(items) => Ok(Decoded::Eager(Arc::new(
                Record::from_positional(self, items, params)?))),
            Value::Bytes(data) => self.load(&data, params),
            other => Err(Error::Construction(
                self.0.name.clone(), format!(
                    "cannot initialize {} from type {}",
                    self.0.name, other.type_name()))),
        }
    }

    /// Make a record from values in field order.
    pub fn positional(&self, values: Vec<Value>) -> Result<Arc<Record>> {
        Ok(Arc::new(Record::from_positional(
            self, values, &Container::new())?))
    }

    /// Make a record from named values.
    pub fn named(&self, values: Container) -> Result<Arc<Record>> {
        Ok(Arc::new(Record::from_named(self, values, &Container::new())?))
    }

    /// Make a record from `init` and encode it.
    pub fn dump(&self, init: Value, params: &Container) -> Result<Vec<u8>> {
        self.instantiate_with(init, params)?.force()?.build(params)
    }

    /// Append a field after declaration.
    pub fn add_field<N : Into<String>, T : Into<Ty>>(&self, name: N, ty: T)
                                                     -> Result<()> {
        let name = name.into();
        let codec = self.0.registry.resolve_in(
            &ty.into(), &format!("{}.{}", self.0.name, name))?;

        let mut fields = self.0.fields.write();
        let name = if Strategy::Sequence == self.0.strategy {
            fields.len().to_string()
        } else {
            name
        };
        let mut next = fields.clone();
        next.push(Field::new(name.clone(), codec));
        check_duplicates(&self.0.name, &next)?;
        check_order(&self.0.name, self.0.strategy, &next)?;
        *fields = next;
        *self.0.memo.write() = None;
        debug!(schema = %self.0.name, field = %name, "field added");
        Ok(())
    }

    /// Remove a field after declaration.
    pub fn remove_field(&self, name: &str) -> Result<()> {
        let mut fields = self.0.fields.write();
        let ix = fields.iter().position(|f| f.name() == name).ok_or_else(
            || Error::UnknownField(self.0.name.clone(), name.to_owned()))?;
        fields.remove(ix);
        if Strategy::Sequence == self.0.strategy {
            let renamed = fields.drain(..).enumerate()
                .map(|(ix, f)| f.renamed(ix.to_string())).collect();
            *fields = renamed;
        }
        *self.0.memo.write() = None;
        debug!(schema = %self.0.name, field = %name, "field removed");
        Ok(())
    }
}

struct Decl {
    name: String,
    ty: Ty,
    default: Option<FieldDefault>,
    conflict: bool,
}

/// Collects a schema declaration. See `Schema::builder`.
pub struct SchemaBuilder {
    name: String,
    strategy: Option<Strategy>,
    decls: Vec<Decl>,
    parent: Option<(Schema, Extend)>,
    registry: Option<Registry>,
    terminated: Option<bool>,
    lazy: Option<bool>,
    cache: Option<bool>,
    misuse: Option<String>,
}

impl SchemaBuilder {
    /// Declare a field.
    pub fn field<N : Into<String>, T : Into<Ty>>(mut self, name: N, ty: T)
                                                 -> Self {
        self.decls.push(Decl {
            name: name.into(),
            ty: ty.into(),
            default: None,
            conflict: false,
        });
        self
    }

    /// Declare a positional field. Its name is its index.
    pub fn element<T : Into<Ty>>(self, ty: T) -> Self {
        let name = self.decls.len().to_string();
        self.field(name, ty)
    }

    fn set_default(mut self, default: FieldDefault, what: &str) -> Self {
        match self.decls.last_mut() {
            Some(decl) => {
                decl.conflict |= decl.default.is_some();
                decl.default = Some(default);
            },
            None => if self.misuse.is_none() {
                self.misuse = Some(format!("{} given before any field", what));
            },
        }
        self
    }

    /// Give the most recently declared field a default value.
    pub fn default<V : Into<Value>>(self, value: V) -> Self {
        self.set_default(FieldDefault::Value(value.into()), "default")
    }

    /// Give the most recently declared field a function producing its
    /// default value.
    pub fn default_factory<F>(self, factory: F) -> Self
    where F : Fn () -> Value + Send + Sync + 'static {
        self.set_default(FieldDefault::Factory(Arc::new(factory)),
                         "default factory")
    }

    /// Choose the layout strategy. The default is `Struct`, or the parent's
    /// when extending.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Pack the fields at bit granularity.
    pub fn bit_struct(self) -> Self {
        self.strategy(Strategy::BitStruct)
    }

    /// Make the fields positional; values become lists.
    pub fn sequence(self) -> Self {
        self.strategy(Strategy::Sequence)
    }

    /// Treat the fields as alternatives at the same position.
    pub fn union(self) -> Self {
        self.strategy(Strategy::Union)
    }

    /// Require the input to be exhausted after parsing.
    pub fn terminated(mut self) -> Self {
        self.terminated = Some(true);
        self
    }

    /// Defer decoding of loaded records until they are forced.
    pub fn lazy(mut self) -> Self {
        self.lazy = Some(true);
        self
    }

    /// Assemble the codec anew on every use instead of memoising it.
    pub fn uncached(mut self) -> Self {
        self.cache = Some(false);
        self
    }

    /// Resolve field types against `registry` instead of the default.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Inherit the fields, flags and registry of `parent`.
    pub fn extends(mut self, parent: &Schema, policy: Extend) -> Self {
        self.parent = Some((parent.clone(), policy));
        self
    }

    /// Resolve and check the declaration.
    pub fn finish(self) -> Result<Schema> {
        let name = self.name;
        if let Some(msg) = self.misuse {
            return Err(Error::InvalidSchema(name, msg));
        }

        let parent = self.parent.as_ref().map(|p| &p.0);
        let registry = self.registry
            .or_else(|| parent.map(|p| p.registry().clone()))
            .unwrap_or_default();
        let strategy = self.strategy
            .or_else(|| parent.map(Schema::strategy))
            .unwrap_or(Strategy::Struct);
        let terminated = self.terminated
            .or_else(|| parent.map(Schema::is_terminated))
            .unwrap_or(false);
        let lazy = self.lazy
            .or_else(|| parent.map(Schema::is_lazy))
            .unwrap_or(false);
        let cache = self.cache
            .or_else(|| parent.map(|p| p.0.cache))
            .unwrap_or(registry.config().cache_codecs);

        let mut own = Vec::with_capacity(self.decls.len());
        for decl in self.decls {
            let wo = format!("{}.{}", name, decl.name);
            if decl.conflict {
                return Err(Error::InvalidSchema(
                    wo, "both a default and a default factory".to_owned()));
            }
            let codec = registry.resolve_in(&decl.ty, &wo)?;
            let mut field = Field::new(decl.name, codec);
            if let Some(default) = decl.default {
                field = field.with_default(default);
            }
            own.push(field);
        }

        let mut fields = match self.parent {
            None => own,
            Some((ref parent, Extend::Append)) => {
                let mut fields = parent.fields();
                fields.extend(own);
                fields
            },
            Some((ref parent, Extend::Override)) => {
                let mut fields = parent.fields();
                for field in own {
                    match fields.iter().position(|f| f.name() == field.name()) {
                        Some(ix) => fields[ix] = field,
                        None => fields.push(field),
                    }
                }
                fields
            },
        };

        if Strategy::Sequence == strategy {
            fields = fields.into_iter().enumerate()
                .map(|(ix, f)| f.renamed(ix.to_string())).collect();
        }
        check_duplicates(&name, &fields)?;
        check_order(&name, strategy, &fields)?;

        debug!(schema = %name, strategy = ?strategy, fields = fields.len(),
               lazy, terminated, "schema finished");
        Ok(Schema(Arc::new(Inner {
            name,
            strategy,
            registry,
            terminated,
            cache,
            lazy,
            fields: RwLock::new(fields),
            memo: RwLock::new(None),
        })))
    }
}

struct Slot {
    name: String,
    target: RwLock<Option<Schema>>,
}

/// A handle to a schema that is declared before it is built, allowing a
/// schema to contain itself.
///
/// ```
/// use bitform::{Codec, Forward, Native, Schema};
///
/// let node = Forward::declare("Node");
/// let schema = Schema::builder("Node")
///     .field("value", Native::U8)
///     .field("next", Codec::optional(Codec::forward(node.clone())))
///     .finish().unwrap();
/// node.define(&schema).unwrap();
///
/// let list = schema.load(b"\x01\x02", &Default::default()).unwrap()
///     .force().unwrap();
/// assert_eq!(2, list.build(&Default::default()).unwrap().len());
/// ```
///
/// A defined forward keeps its schema alive, so a self-referential schema
/// lives for the rest of the program.
#[derive(Clone)]
pub struct Forward(Arc<Slot>);

impl fmt::Debug for Forward {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Forward({})", self.0.name)
    }
}

impl Forward {
    /// Declare a schema to be defined later.
    pub fn declare<N : Into<String>>(name: N) -> Self {
        Forward(Arc::new(Slot {
            name: name.into(),
            target: RwLock::new(None),
        }))
    }

    /// The name the forward was declared under.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Fill in the schema. A forward can only be defined once.
    pub fn define(&self, schema: &Schema) -> Result<()> {
        let mut target = self.0.target.write();
        if target.is_some() {
            return Err(Error::InvalidSchema(
                self.0.name.clone(), "forward defined twice".to_owned()));
        }
        *target = Some(schema.clone());
        Ok(())
    }

    /// The schema, if defined.
    pub fn schema(&self) -> Option<Schema> {
        self.0.target.read().clone()
    }

    pub(crate) fn resolve(&self, ctx: &Context) -> Result<Schema> {
        self.schema().ok_or_else(|| Error::Resolution(
            ctx.to_string(), format!(
                "forward `{}` used before being defined", self.0.name)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::Kind;
    use crate::config::Endianness;
    use crate::context::{len_of, this};
    use crate::resolve::Native;
    use crate::switch::Switch;
    use crate::test_helpers::parse;

    fn point() -> Schema {
        Schema::builder("Point")
            .field("x", Native::I32)
            .field("y", Native::I32)
            .finish().unwrap()
    }

    #[test]
    fn duplicate_fields_rejected() {
        match Schema::builder("P")
            .field("x", Native::U8)
            .field("x", Native::U16)
            .finish()
        {
            Ok(s) => panic!("unexpectedly succeeded: {:?}", s),
            Err(Error::DuplicateField(ref wo, ref name)) => {
                assert_eq!("P", wo);
                assert_eq!("x", name);
            },
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn default_and_factory_exclusive() {
        match Schema::builder("P")
            .field("x", Native::U8)
            .default(1)
            .default_factory(|| Value::Int(2))
            .finish()
        {
            Ok(s) => panic!("unexpectedly succeeded: {:?}", s),
            Err(Error::InvalidSchema(ref wo, _)) => assert_eq!("P.x", wo),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn default_before_field_rejected() {
        match Schema::builder("P").default(1).field("x", Native::U8).finish() {
            Ok(s) => panic!("unexpectedly succeeded: {:?}", s),
            Err(Error::InvalidSchema(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn reading_later_sibling_rejected() {
        match Schema::builder("P")
            .field("data", Codec::bytes(this("len")))
            .field("len", Native::U8)
            .finish()
        {
            Ok(s) => panic!("unexpectedly succeeded: {:?}", s),
            Err(Error::InvalidSchema(ref wo, _)) => assert_eq!("P.data", wo),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }

        // Rebuilt values may look ahead, and unknown names are parameters.
        Schema::builder("P")
            .field("len", Codec::rebuild(
                Codec::int(1, false, Endianness::Big).unwrap(), len_of("data")))
            .field("data", Codec::bytes(this("len")))
            .field("extra", Codec::bytes(this("n")))
            .finish().unwrap();
    }

    #[test]
    fn reading_later_sibling_inside_switch_rejected() {
        let body = Switch::new("Body", this("kind"));
        body.register(0, Native::U8).unwrap();
        body.register(1, Codec::bytes(this("len"))).unwrap();
        match Schema::builder("P")
            .field("kind", Native::U8)
            .field("body", &body)
            .field("len", Native::U8)
            .finish()
        {
            Ok(s) => panic!("unexpectedly succeeded: {:?}", s),
            Err(Error::InvalidSchema(ref wo, ref msg)) => {
                assert_eq!("P.body", wo);
                assert!(msg.contains("`len`"), "{}", msg);
            },
            Err(e) => panic!("failed for wrong reason: {}", e),
        }

        let other = Switch::new("Other", this("kind"));
        other.register(0, Native::U8).unwrap();
        other.set_default(Codec::bytes(this("len"))).unwrap();
        match Schema::builder("Q")
            .field("kind", Native::U8)
            .field("body", &other)
            .field("len", Native::U8)
            .finish()
        {
            Ok(s) => panic!("unexpectedly succeeded: {:?}", s),
            Err(Error::InvalidSchema(ref wo, _)) => assert_eq!("Q.body", wo),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn unresolvable_field_fails_at_finish() {
        let registry = Registry::empty(Config::default());
        match Schema::builder("P")
            .registry(registry)
            .field("x", Native::U8)
            .finish()
        {
            Ok(s) => panic!("unexpectedly succeeded: {:?}", s),
            Err(Error::Resolution(ref wo, _)) => assert_eq!("P.x", wo),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn codec_is_memoised_and_invalidated() {
        let schema = point();
        let first = schema.construct();
        let second = schema.construct();
        assert!(std::ptr::eq(first.kind(), second.kind()));

        schema.add_field("z", Native::I32).unwrap();
        let third = schema.construct();
        assert!(!std::ptr::eq(first.kind(), third.kind()));
        assert_eq!(12, schema.sizeof(&Container::new()).unwrap());

        schema.remove_field("x").unwrap();
        assert_eq!(vec!["y", "z"], schema.field_names());
        assert_eq!(8, schema.sizeof(&Container::new()).unwrap());

        match schema.remove_field("x") {
            Ok(()) => panic!("unexpectedly succeeded"),
            Err(Error::UnknownField(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
        match schema.add_field("y", Native::U8) {
            Ok(()) => panic!("unexpectedly succeeded"),
            Err(Error::DuplicateField(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn uncached_reassembles() {
        let schema = Schema::builder("P").field("x", Native::U8)
            .uncached().finish().unwrap();
        let (a, b) = (schema.construct(), schema.construct());
        assert!(!std::ptr::eq(a.kind(), b.kind()));
    }

    #[test]
    fn extension_policies() {
        let base = point();
        let appended = Schema::builder("Point3")
            .extends(&base, Extend::Append)
            .field("z", Native::I32)
            .finish().unwrap();
        assert_eq!(vec!["x", "y", "z"], appended.field_names());

        let narrowed = Schema::builder("SmallPoint")
            .extends(&base, Extend::Override)
            .field("x", Native::I8)
            .finish().unwrap();
        assert_eq!(vec!["x", "y"], narrowed.field_names());
        assert_eq!(5, narrowed.sizeof(&Container::new()).unwrap());

        // Subtypes do not share the parent's memo.
        base.construct();
        assert_eq!(8, base.sizeof(&Container::new()).unwrap());

        match Schema::builder("Bad")
            .extends(&base, Extend::Append)
            .field("x", Native::I8)
            .finish()
        {
            Ok(s) => panic!("unexpectedly succeeded: {:?}", s),
            Err(Error::DuplicateField(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn sequence_fields_are_indexed() {
        let schema = Schema::builder("Pair")
            .sequence()
            .element(Native::U8)
            .field("ignored", Native::U8)
            .finish().unwrap();
        assert_eq!(vec!["0", "1"], schema.field_names());
        match *schema.construct().kind() {
            Kind::Aggregate(ref a) => assert_eq!(Strategy::Sequence, a.strategy),
            _ => panic!("not an aggregate"),
        }
    }

    #[test]
    fn instantiate_rejects_scalars() {
        match point().instantiate(Value::Int(3)) {
            Ok(d) => panic!("unexpectedly succeeded: {:?}", d),
            Err(Error::Construction(ref wo, ref msg)) => {
                assert_eq!("Point", wo);
                assert_eq!("cannot initialize Point from type int", msg);
            },
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn instantiate_from_bytes_decodes() {
        let schema = point();
        let decoded = schema.instantiate(
            Value::Bytes(parse("00 00 00 01 00 00 00 02"))).unwrap();
        let record = decoded.force().unwrap();
        assert_eq!(Some(&Value::Int(1)), record.get("x"));
        assert_eq!(Some(&Value::Int(2)), record.get("y"));
    }

    #[test]
    fn forward_must_be_defined() {
        let fwd = Forward::declare("Later");
        let codec = Codec::forward(fwd.clone());
        match codec.parse_bytes(&parse("00"), &Container::new()) {
            Ok(v) => panic!("unexpectedly succeeded: {:?}", v),
            Err(Error::Resolution(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }

        let schema = point();
        fwd.define(&schema).unwrap();
        match fwd.define(&schema) {
            Ok(()) => panic!("unexpectedly succeeded"),
            Err(Error::InvalidSchema(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
        assert_eq!(8, codec.sizeof(&Container::new()).unwrap());
    }

    #[test]
    fn recursive_schema_round_trips() {
        let node = Forward::declare("Node");
        let schema = Schema::builder("Node")
            .field("value", Native::U8)
            .field("next", Codec::optional(Codec::forward(node.clone())))
            .finish().unwrap();
        node.define(&schema).unwrap();

        let data = parse("01 02 03");
        let head = schema.load(&data, &Container::new()).unwrap()
            .force().unwrap();
        assert_eq!(Some(&Value::Int(1)), head.get("value"));
        let second = head.get("next").and_then(|v| v.member("value").ok())
            .and_then(|v| v);
        assert_eq!(Some(Value::Int(2)), second);
        assert_eq!(data, head.build(&Container::new()).unwrap());
    }
}
