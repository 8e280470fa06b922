//-
// Copyright 2017, Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Low-level encodings of fixed-width numbers and text.
//!
//! External code generally should not use things from this module; the
//! atomic codecs in `codec` wrap these with context-aware error reporting.

use crate::config::{Encoding, Endianness};
use crate::stream::{self, Stream};

/// Return whether `value` fits in a `bits`-wide integer of the given
/// signedness.
pub fn int_fits(value: i128, bits: u32, signed: bool) -> bool {
    if signed {
        let max = (1i128 << (bits - 1)) - 1;
        value >= -max - 1 && value <= max
    } else {
        value >= 0 && value < (1i128 << bits)
    }
}

fn sign_extend(raw: u64, bits: u32) -> i128 {
    let raw = raw as i128;
    if bits > 0 && 0 != (raw >> (bits - 1)) & 1 {
        raw - (1i128 << bits)
    } else {
        raw
    }
}

/// Read a `width`-byte integer (1 to 8 bytes).
pub fn read_int<B : AsRef<[u8]>>(s: &mut Stream<B>, width: usize,
                                 signed: bool, endian: Endianness)
                                 -> stream::Result<i128> {
    debug_assert!(width >= 1 && width <= 8);
    let bytes = s.read_bytes(width)?;
    let mut raw = 0u64;
    match endian.concrete() {
        Endianness::Little => for &b in bytes.iter().rev() {
            raw = (raw << 8) | b as u64;
        },
        _ => for &b in &bytes {
            raw = (raw << 8) | b as u64;
        },
    }

    Ok(if signed { sign_extend(raw, width as u32 * 8) } else { raw as i128 })
}

/// Write `value` as a `width`-byte integer.
///
/// The caller must already have checked the range with `int_fits`; excess
/// high bits are discarded.
pub fn write_int(s: &mut Stream<Vec<u8>>, value: i128, width: usize,
                 endian: Endianness) {
    let raw = value as u64;
    let mut bytes = Vec::with_capacity(width);
    for i in (0..width).rev() {
        bytes.push((raw >> (i * 8)) as u8);
    }
    if Endianness::Little == endian.concrete() {
        bytes.reverse();
    }
    s.write_bytes(&bytes);
}

/// Read a `bits`-wide integer, most significant bit first.
pub fn read_bit_int<B : AsRef<[u8]>>(s: &mut Stream<B>, bits: u32,
                                     signed: bool)
                                     -> stream::Result<i128> {
    let raw = s.read_bits(bits)?;
    Ok(if signed { sign_extend(raw, bits) } else { raw as i128 })
}

/// Write the low `bits` bits of `value`.
pub fn write_bit_int(s: &mut Stream<Vec<u8>>, value: i128, bits: u32) {
    let mask = if 64 == bits { !0u64 } else { (1u64 << bits) - 1 };
    s.write_bits(value as u64 & mask, bits);
}

/// Read an IEEE-754 float of 4 or 8 bytes.
pub fn read_float<B : AsRef<[u8]>>(s: &mut Stream<B>, width: usize,
                                   endian: Endianness)
                                   -> stream::Result<f64> {
    let raw = read_int(s, width, false, endian)? as u64;
    Ok(if 4 == width {
        f32::from_bits(raw as u32) as f64
    } else {
        f64::from_bits(raw)
    })
}

/// Write an IEEE-754 float of 4 or 8 bytes.
pub fn write_float(s: &mut Stream<Vec<u8>>, value: f64, width: usize,
                   endian: Endianness) {
    let raw = if 4 == width {
        (value as f32).to_bits() as u64
    } else {
        value.to_bits()
    };
    write_int(s, raw as i128, width, endian);
}

/// Encode `text` in the given encoding.
pub fn encode_str(text: &str, encoding: Encoding)
                  -> Result<Vec<u8>, &'static str> {
    match encoding {
        Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
        Encoding::Ascii => if text.is_ascii() {
            Ok(text.as_bytes().to_vec())
        } else {
            Err("string is not ASCII")
        },
        Encoding::Utf16Le => Ok(text.encode_utf16()
                                .flat_map(|u| u.to_le_bytes().to_vec())
                                .collect()),
        Encoding::Utf16Be => Ok(text.encode_utf16()
                                .flat_map(|u| u.to_be_bytes().to_vec())
                                .collect()),
    }
}

/// Decode `data` from the given encoding.
pub fn decode_str(data: &[u8], encoding: Encoding)
                  -> Result<String, &'static str> {
    fn utf16(data: &[u8], unit: fn ([u8;2]) -> u16)
             -> Result<String, &'static str> {
        if 0 != data.len() % 2 {
            return Err("odd number of bytes in UTF-16 string");
        }
        let units: Vec<u16> = data.chunks(2)
            .map(|c| unit([c[0], c[1]])).collect();
        String::from_utf16(&units).map_err(|_| "invalid UTF-16")
    }

    match encoding {
        Encoding::Utf8 => String::from_utf8(data.to_vec())
            .map_err(|_| "invalid UTF-8"),
        Encoding::Ascii => if data.is_ascii() {
            String::from_utf8(data.to_vec()).map_err(|_| "invalid ASCII")
        } else {
            Err("byte outside of ASCII range")
        },
        Encoding::Utf16Le => utf16(data, u16::from_le_bytes),
        Encoding::Utf16Be => utf16(data, u16::from_be_bytes),
    }
}

/// Strip trailing all-zero code units from fixed-size string data.
pub fn strip_padding(data: &[u8], unit: usize) -> &[u8] {
    let mut end = data.len() - data.len() % unit;
    while end >= unit && data[end - unit..end].iter().all(|&b| 0 == b) {
        end -= unit;
    }
    &data[..end]
}
