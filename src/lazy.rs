//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Deferred decoding.
//!
//! A `Lazy` record holds its input until a field is first accessed, then
//! decodes it exactly once. A failed decode is not cached; the next access
//! tries again and reports the same error.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::Result;
use crate::record::Record;
use crate::schema::Schema;
use crate::value::{Container, Value};

enum Source {
    /// Input bytes of a top-level load.
    Bytes(Vec<u8>),
    /// Output of the schema's aggregate codec, for records nested in
    /// another value.
    Raw(Value),
}

struct Inner {
    schema: Schema,
    source: Source,
    params: Container,
    cell: Mutex<Option<Arc<Record>>>,
}

/// A record whose decoding is postponed until first access.
///
/// Clones share the materialised record.
#[derive(Clone)]
pub struct Lazy(Arc<Inner>);

impl Lazy {
    pub(crate) fn from_bytes(schema: Schema, data: Vec<u8>, params: Container)
                             -> Self {
        Lazy::new(schema, Source::Bytes(data), params)
    }

    pub(crate) fn from_raw(schema: Schema, raw: Value, params: Container)
                           -> Self {
        Lazy::new(schema, Source::Raw(raw), params)
    }

    fn new(schema: Schema, source: Source, params: Container) -> Self {
        Lazy(Arc::new(Inner {
            schema, source, params,
            cell: Mutex::new(None),
        }))
    }

    #[allow(missing_docs)]
    pub fn schema(&self) -> &Schema {
        &self.0.schema
    }

    /// Whether the record has been decoded yet.
    pub fn is_materialized(&self) -> bool {
        self.0.cell.lock().is_some()
    }

    /// Decode the record if not done already, and return it.
    pub fn force(&self) -> Result<Arc<Record>> {
        let mut cell = self.0.cell.lock();
        if let Some(ref record) = *cell {
            return Ok(record.clone());
        }

        trace!(schema = %self.0.schema.name(), "materialising lazy record");
        let record = Arc::new(match self.0.source {
            Source::Bytes(ref data) =>
                self.0.schema.decode(data, &self.0.params)?,
            Source::Raw(ref raw) =>
                Record::from_raw(&self.0.schema, raw.clone())?,
        });
        *cell = Some(record.clone());
        Ok(record)
    }

    /// Return the value of the named field, decoding the record if needed.
    pub fn get(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.force()?.get(name).cloned())
    }
}

impl PartialEq for Lazy {
    fn eq(&self, other: &Lazy) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (self.force(), other.force()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0.cell.lock() {
            Some(ref record) => fmt::Debug::fmt(&**record, f),
            None => write!(f, "Lazy({})", self.0.schema.name()),
        }
    }
}

/// The result of loading or instantiating a schema.
#[derive(Clone)]
pub enum Decoded {
    /// A record decoded up front.
    Eager(Arc<Record>),
    /// A record decoded on first access.
    Deferred(Lazy),
}

impl Decoded {
    /// Return the record, decoding it first if deferred.
    pub fn force(&self) -> Result<Arc<Record>> {
        match *self {
            Decoded::Eager(ref r) => Ok(r.clone()),
            Decoded::Deferred(ref l) => l.force(),
        }
    }

    #[allow(missing_docs)]
    pub fn is_lazy(&self) -> bool {
        match *self {
            Decoded::Eager(..) => false,
            Decoded::Deferred(..) => true,
        }
    }

    /// Return the value of the named field.
    pub fn get(&self, name: &str) -> Result<Option<Value>> {
        match *self {
            Decoded::Eager(ref r) => Ok(r.get(name).cloned()),
            Decoded::Deferred(ref l) => l.get(name),
        }
    }

    /// Convert to a `Value` without forcing.
    pub fn into_value(self) -> Value {
        match self {
            Decoded::Eager(r) => Value::Record(r),
            Decoded::Deferred(l) => Value::Lazy(l),
        }
    }
}

/// Eager and deferred results compare by their decoded records.
impl PartialEq for Decoded {
    fn eq(&self, other: &Decoded) -> bool {
        match (self.force(), other.force()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Decoded::Eager(ref r) => fmt::Debug::fmt(&**r, f),
            Decoded::Deferred(ref l) => fmt::Debug::fmt(l, f),
        }
    }
}
