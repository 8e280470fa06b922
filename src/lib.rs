//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Declarative binary structures.
//!
//! A `Schema` describes a record as an ordered list of named fields, each
//! with a codec. From that one description the crate derives a parser, a
//! builder and a size computation that agree with each other:
//!
//! ```
//! use bitform::{Native, Schema};
//!
//! let point = Schema::builder("Point")
//!     .field("x", Native::I32)
//!     .field("y", Native::I32)
//!     .finish().unwrap();
//!
//! let p = point.positional(vec![(-20).into(), 8.into()]).unwrap();
//! let data = p.build(&Default::default()).unwrap();
//! assert_eq!(8, data.len());
//!
//! let back = point.load(&data, &Default::default()).unwrap();
//! assert_eq!(p, back.force().unwrap());
//! ```
//!
//! # Codecs
//!
//! A `Codec` parses, builds and measures one kind of value. Atomic codecs
//! cover fixed-width integers and floats, flags, raw bytes and text; the
//! rest compose them: arrays, alternatives, length prefixes, defaults,
//! constants, pointers and so on. Field types are written as `Ty`
//! descriptors, which a `Registry` resolves to codecs when the schema is
//! finished.
//!
//! # Context
//!
//! Codecs see a `Context`: the siblings already decoded (or being built) at
//! the current level, parameters supplied by the caller, and the path to the
//! current location used in error messages. `Expr` values read the context,
//! which is how a length field sizes a later byte string or how a `Switch`
//! picks a payload codec from a discriminator.
//!
//! # Lazy decoding
//!
//! A schema may be declared lazy, in which case `load` only captures the
//! input and decoding happens when the result is forced, at most once.

#![warn(missing_docs)]
#![recursion_limit = "1024"]

#[macro_use] extern crate quick_error;

#[macro_use] mod sugar;

pub mod config;
pub mod error;
pub mod stream;
pub mod wire;
pub mod value;
pub mod context;
pub mod codec;
pub mod field;
pub mod resolve;
pub mod schema;
pub mod switch;
pub mod lazy;
pub mod record;

#[cfg(test)] mod test_helpers;

pub use crate::codec::{Aggregate, Codec, Count, Kind, Prim, Strategy, Symbols,
                       Until};
pub use crate::config::{Config, Encoding, Endianness};
pub use crate::context::{len_of, this, Context, Expr};
pub use crate::error::{Error, Result};
pub use crate::field::{Field, FieldDefault};
pub use crate::lazy::{Decoded, Lazy};
pub use crate::record::Record;
pub use crate::resolve::{Native, NativeType, Registry, Ty};
pub use crate::schema::{Extend, Forward, Schema, SchemaBuilder};
pub use crate::switch::{Case, Switch};
pub use crate::value::{Container, Key, Value};
