//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration threaded through codec resolution.
//!
//! A `Config` is captured by a `Registry` when it is created, and every
//! schema or switch resolved against that registry keeps the values it saw at
//! that point. Nothing here is global: `Config::from_env()` is only consulted
//! when the caller asks for it.

use std::env;

use crate::error::{Error, Result};

/// Byte order used by multi-byte integers and floats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endianness {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
    /// Whatever the host uses.
    Native,
}

impl Endianness {
    /// Resolve `Native` to the concrete order of the host.
    pub fn concrete(self) -> Endianness {
        match self {
            Endianness::Native => if cfg!(target_endian = "big") {
                Endianness::Big
            } else {
                Endianness::Little
            },
            other => other,
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match &*text.to_ascii_lowercase() {
            "big" | "b" | ">" => Some(Endianness::Big),
            "little" | "l" | "<" => Some(Endianness::Little),
            "native" | "n" | "=" => Some(Endianness::Native),
            _ => None,
        }
    }
}

/// Text encoding used by string codecs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    #[allow(missing_docs)]
    Utf8,
    /// 7-bit ASCII; bytes above 0x7F are rejected.
    Ascii,
    #[allow(missing_docs)]
    Utf16Le,
    #[allow(missing_docs)]
    Utf16Be,
}

impl Encoding {
    /// The size in bytes of one code unit, which is also the width of the
    /// terminator written after null-terminated strings.
    pub fn unit_size(self) -> usize {
        match self {
            Encoding::Utf8 | Encoding::Ascii => 1,
            Encoding::Utf16Le | Encoding::Utf16Be => 2,
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match &*text.to_ascii_lowercase().replace('_', "-") {
            "utf-8" | "utf8" => Some(Encoding::Utf8),
            "ascii" | "us-ascii" => Some(Encoding::Ascii),
            "utf-16le" | "utf-16-le" => Some(Encoding::Utf16Le),
            "utf-16be" | "utf-16-be" => Some(Encoding::Utf16Be),
            _ => None,
        }
    }
}

/// Environment variable consulted by `Config::from_env()` for the default
/// byte order.
pub const ENDIANNESS_VAR: &str = "BITFORM_ENDIANNESS";
/// Environment variable consulted by `Config::from_env()` for the default
/// string encoding.
pub const ENCODING_VAR: &str = "BITFORM_ENCODING";

/// Settings that affect how native types resolve and how deep decoding may
/// recurse.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Byte order of the default integer and float codecs.
    ///
    /// The default is `Big`.
    pub endianness: Endianness,
    /// Encoding of the default string codec.
    ///
    /// The default is `Utf8`.
    pub encoding: Encoding,
    /// The maximum nesting depth of fields, array elements and records during
    /// parsing, building and measuring.
    ///
    /// The default is 64.
    pub recursion_limit: usize,
    /// Whether schemas memoise their assembled codec. Individual schemas may
    /// still opt out.
    pub cache_codecs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endianness: Endianness::Big,
            encoding: Encoding::Utf8,
            recursion_limit: 64,
            cache_codecs: true,
        }
    }
}

impl Config {
    /// Build a configuration from the defaults, overridden by
    /// `BITFORM_ENDIANNESS` and `BITFORM_ENCODING` if they are set.
    ///
    /// An unrecognised value is an error rather than being ignored.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars<F : Fn (&str) -> Option<String>>(get: F) -> Result<Self> {
        let mut config = Config::default();

        if let Some(text) = get(ENDIANNESS_VAR) {
            config.endianness = Endianness::parse(&text).ok_or_else(
                || Error::InvalidConfig(ENDIANNESS_VAR.to_owned(), text))?;
        }
        if let Some(text) = get(ENCODING_VAR) {
            config.encoding = Encoding::parse(&text).ok_or_else(
                || Error::InvalidConfig(ENCODING_VAR.to_owned(), text))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn env_overrides_defaults() {
        let config = Config::from_vars(|name| match name {
            ENDIANNESS_VAR => Some("l".to_owned()),
            ENCODING_VAR => Some("UTF_16LE".to_owned()),
            _ => None,
        }).unwrap();

        assert_eq!(Endianness::Little, config.endianness);
        assert_eq!(Encoding::Utf16Le, config.encoding);
        assert_eq!(64, config.recursion_limit);
    }

    #[test]
    fn unset_env_gives_defaults() {
        assert_eq!(Config::default(), Config::from_vars(|_| None).unwrap());
    }

    #[test]
    fn bad_env_value_rejected() {
        match Config::from_vars(|name| if ENCODING_VAR == name {
            Some("ebcdic".to_owned())
        } else {
            None
        }) {
            Ok(c) => panic!("unexpectedly succeeded: {:?}", c),
            Err(Error::InvalidConfig(ref var, ref val)) => {
                assert_eq!(ENCODING_VAR, var);
                assert_eq!("ebcdic", val);
            },
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
    }

    #[test]
    fn native_is_concrete() {
        assert!(Endianness::Native.concrete() != Endianness::Native);
        assert_eq!(Endianness::Big, Endianness::Big.concrete());
    }
}
