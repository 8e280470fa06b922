//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Field descriptors, the unit of composition of aggregates.

use std::fmt;
use std::sync::Arc;

use crate::codec::Codec;
use crate::value::Value;

/// How a field obtains a value when a record is constructed without one.
#[derive(Clone)]
pub enum FieldDefault {
    /// A fixed value, cloned into each record.
    Value(Value),
    /// A function called once per record.
    Factory(Arc<dyn Fn () -> Value + Send + Sync>),
}

impl FieldDefault {
    /// Produce the default value.
    pub fn make(&self) -> Value {
        match *self {
            FieldDefault::Value(ref v) => v.clone(),
            FieldDefault::Factory(ref f) => f(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FieldDefault::Value(ref v) => write!(f, "{:?}", v),
            FieldDefault::Factory(..) => write!(f, "<factory>"),
        }
    }
}

/// A named field paired with its resolved codec and optional default.
///
/// Field names are unique within an aggregate. Positional aggregates name
/// their fields by decimal index.
#[derive(Clone, Debug)]
pub struct Field {
    name: String,
    codec: Codec,
    default: Option<FieldDefault>,
}

impl Field {
    /// Create a field without a default.
    pub fn new<N : Into<String>>(name: N, codec: Codec) -> Self {
        Field {
            name: name.into(),
            codec,
            default: None,
        }
    }

    /// Attach a default, replacing any existing one.
    pub fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(missing_docs)]
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    #[allow(missing_docs)]
    pub fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }

    /// Produce the value a record gets when none is supplied, if there is
    /// one.
    pub fn default_value(&self) -> Option<Value> {
        self.default.as_ref().map(FieldDefault::make)
    }

    pub(crate) fn renamed<N : Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }
}
