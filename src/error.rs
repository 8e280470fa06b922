//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The crate-wide error type.

use crate::context::Context;
use crate::stream;

quick_error! {
    /// Errors produced while declaring schemas, constructing records, and
    /// parsing, building or measuring data.
    ///
    /// Almost every variant begins with a string indicating where the error
    /// happened. For schema declaration this is the schema and field name;
    /// for data it is the path of fields and bit positions that led to the
    /// problem, as rendered by `Context`.
    #[derive(Debug)]
    pub enum Error {
        /// A type descriptor could not be mapped to a codec.
        Resolution(wo: String, msg: String) {
            description("type descriptor could not be resolved")
            display("cannot resolve type of {}: {}", wo, msg)
        }
        /// Two fields of one aggregate have the same name.
        DuplicateField(wo: String, name: String) {
            description("duplicate field name")
            display("duplicate field `{}` in {}", name, wo)
        }
        /// A schema declaration is inconsistent in some other way, such as a
        /// field that reads a sibling declared after it.
        InvalidSchema(wo: String, msg: String) {
            description("invalid schema declaration")
            display("invalid schema {}: {}", wo, msg)
        }
        /// A record was constructed from an initialiser of unsupported
        /// shape.
        Construction(wo: String, msg: String) {
            description("cannot construct record")
            display("cannot construct {}: {}", wo, msg)
        }
        /// A record was constructed without a value for a field that has no
        /// default.
        MissingField(wo: String) {
            description("missing field value")
            display("no value given for {}", wo)
        }
        /// A record was constructed from a mapping containing a name that is
        /// not a declared field.
        UnknownField(wo: String, name: String) {
            description("unknown field")
            display("{} has no field named `{}`", wo, name)
        }
        /// A context-dependent value (a size, count, offset or switch key)
        /// could not be evaluated because the named context entry is absent.
        ContextRequired(wo: String, name: String) {
            description("context value required")
            display("context value `{}` required at {}", name, wo)
        }
        /// A switch key matched no registered case and there is no default.
        NoMatchingCase(wo: String, key: String) {
            description("no matching switch case")
            display("no case for key {} at {}", key, wo)
        }
        /// The underlying stream failed, usually because input ran out.
        Stream(wo: String, err: stream::Error) {
            description("stream error")
            display("{} at {}", err, wo)
            cause(err)
            context(wo: &'a Context<'a>, err: stream::Error) ->
                (wo.to_string(), err)
        }
        /// Input bytes do not form a valid value for the codec.
        Parse(wo: String, msg: String) {
            description("malformed input")
            display("{} at {}", msg, wo)
        }
        /// A value does not have the shape the codec requires.
        Build(wo: String, msg: String) {
            description("value cannot be built")
            display("{} at {}", msg, wo)
        }
        /// A size was requested from a codec whose size depends on the data
        /// itself.
        Unsized(wo: String) {
            description("size is data-dependent")
            display("size of {} cannot be determined without data", wo)
        }
        /// A bit-packed aggregate does not cover a whole number of bytes.
        Misaligned(wo: String, bits: u64) {
            description("bit structure not byte aligned")
            display("bit structure at {} spans {} bits, which is not a \
                     whole number of bytes", wo, bits)
        }
        /// A terminated aggregate finished parsing before the end of input.
        TrailingData(wo: String, bits: u64) {
            description("trailing data after terminated aggregate")
            display("{} unconsumed bits after {}", bits, wo)
        }
        /// Parsing, building or measuring nested too deeply.
        ///
        /// See `Config::recursion_limit` to control the cut-off point.
        RecursionLimitExceeded(wo: String) {
            description("recursion limit exceeded")
            display("recursion limit exceeded at {}", wo)
        }
        /// A configuration value could not be understood.
        InvalidConfig(var: String, value: String) {
            description("invalid configuration value")
            display("invalid value {:?} for {}", value, var)
        }
    }
}

impl Error {
    /// Return whether this error means the data simply does not fit the
    /// codec that was tried.
    ///
    /// Selects, unions and overloaded switch cases treat these as "try the
    /// next alternative". Anything else, notably `ContextRequired` and
    /// `RecursionLimitExceeded`, propagates immediately.
    pub fn is_structural(&self) -> bool {
        match *self {
            Error::Stream(..) | Error::Parse(..) | Error::Build(..) |
            Error::Misaligned(..) | Error::TrailingData(..) => true,
            _ => false,
        }
    }
}

/// The general result type of this crate.
pub type Result<T> = ::std::result::Result<T, Error>;
