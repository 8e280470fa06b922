//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A bit-addressed cursor over an in-memory buffer.
//!
//! Codecs read from a `Stream` over any `AsRef<[u8]>` and write into a
//! `Stream<Vec<u8>>`. Positions are always counted in bits from the start of
//! the buffer; byte-oriented operations work at any bit alignment, so the same
//! primitives serve both byte-aligned structs and bit-packed ones.
//!
//! Bits within a byte are numbered from the most significant end, matching
//! the usual layout of packed protocol headers.

quick_error! {
    /// Errors produced by the low-level cursor.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Error {
        /// A read needed more bits than remained in the buffer.
        UnexpectedEof(wanted: u64, available: u64) {
            description("unexpected end of input")
            display("unexpected end of input: wanted {} bits, only {} \
                     available", wanted, available)
        }
        /// A seek targeted a position past the end of the buffer.
        SeekOutOfRange(pos: u64, len: u64) {
            description("seek out of range")
            display("seek to bit {} is beyond the end of a {}-bit buffer",
                    pos, len)
        }
        /// A terminated read never found its terminator.
        MissingTerminator(unit: usize) {
            description("missing terminator")
            display("no {}-byte terminator before end of input", unit)
        }
    }
}

/// Result type for `Stream` operations.
pub type Result<T> = ::std::result::Result<T, Error>;

/// A saved writer state, restored with `Stream::reset`.
#[derive(Debug, Clone)]
pub struct Mark {
    pos: u64,
    end: u64,
    /// The buffer from the byte holding `pos` to the end.
    tail: Vec<u8>,
}

/// Cursor over `B`, positioned at a bit offset.
///
/// Writing is only available on `Stream<Vec<u8>>`; the buffer grows as
/// needed and bits past the current end read as zero. Writing at a position
/// before the end overwrites what is there, which is how pointer codecs patch
/// data at an absolute offset.
#[derive(Debug, Clone)]
pub struct Stream<B> {
    buf: B,
    /// Current offset in bits.
    pos: u64,
    /// For writers, the number of bits considered written. Readers use the
    /// full length of the buffer.
    end: u64,
}

impl<B : AsRef<[u8]>> Stream<B> {
    /// Create a reader positioned at the start of `buf`.
    pub fn new(buf: B) -> Self {
        let end = buf.as_ref().len() as u64 * 8;
        Stream { buf, pos: 0, end }
    }

    /// Return the current position in bits.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Return the total length of the stream in bits.
    pub fn len(&self) -> u64 {
        self.end
    }

    /// Return whether the stream contains no data at all.
    pub fn is_empty(&self) -> bool {
        0 == self.end
    }

    /// Return the number of bits between the current position and the end.
    pub fn remaining(&self) -> u64 {
        self.end.saturating_sub(self.pos)
    }

    /// Return whether the current position falls on a byte boundary.
    pub fn is_aligned(&self) -> bool {
        0 == self.pos % 8
    }

    /// Move to an absolute bit position.
    ///
    /// Positions up to and including the end are valid.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.end {
            Err(Error::SeekOutOfRange(pos, self.end))
        } else {
            self.pos = pos;
            Ok(())
        }
    }

    fn require(&self, bits: u64) -> Result<()> {
        let available = self.remaining();
        if bits > available {
            Err(Error::UnexpectedEof(bits, available))
        } else {
            Ok(())
        }
    }

    #[inline]
    fn bit_at(&self, pos: u64) -> bool {
        let byte = self.buf.as_ref()[(pos / 8) as usize];
        0 != (byte >> (7 - pos % 8)) & 1
    }

    /// Read `n` bits (at most 64) as an unsigned integer, most significant
    /// bit first.
    pub fn read_bits(&mut self, n: u32) -> Result<u64> {
        debug_assert!(n <= 64);
        self.require(n as u64)?;

        let mut accum = 0u64;
        for i in 0..n as u64 {
            accum = (accum << 1) | (self.bit_at(self.pos + i) as u64);
        }
        self.pos += n as u64;
        Ok(accum)
    }

    /// Read exactly `n` bytes. At an unaligned position each byte is
    /// assembled from the next eight bits.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let bits = (n as u64).checked_mul(8).ok_or_else(
            || Error::UnexpectedEof(u64::max_value(), self.remaining()))?;
        self.require(bits)?;

        if self.is_aligned() {
            let start = (self.pos / 8) as usize;
            let data = self.buf.as_ref()[start..start + n].to_vec();
            self.pos += bits;
            Ok(data)
        } else {
            let mut data = Vec::with_capacity(n);
            for _ in 0..n {
                data.push(self.read_bits(8)? as u8);
            }
            Ok(data)
        }
    }

    /// Read all remaining whole bytes. Trailing bits that do not make up a
    /// full byte are left unread.
    pub fn read_rest(&mut self) -> Result<Vec<u8>> {
        let n = (self.remaining() / 8) as usize;
        self.read_bytes(n)
    }

    /// Read `unit`-byte code units up to and including the first all-zero
    /// unit, returning the data without the terminator.
    pub fn read_terminated(&mut self, unit: usize) -> Result<Vec<u8>> {
        let start = self.pos;
        let mut data = Vec::new();
        loop {
            if self.remaining() < unit as u64 * 8 {
                self.pos = start;
                return Err(Error::MissingTerminator(unit));
            }
            let chunk = self.read_bytes(unit)?;
            if chunk.iter().all(|&b| 0 == b) {
                return Ok(data);
            }
            data.extend_from_slice(&chunk);
        }
    }

    /// Return a reference to the underlying buffer.
    pub fn get_ref(&self) -> &B {
        &self.buf
    }
}

impl Stream<Vec<u8>> {
    /// Create an empty writer.
    pub fn writer() -> Self {
        Stream { buf: Vec::new(), pos: 0, end: 0 }
    }

    fn set_bit(&mut self, pos: u64, bit: bool) {
        let ix = (pos / 8) as usize;
        if ix >= self.buf.len() {
            self.buf.resize(ix + 1, 0);
        }
        let mask = 1u8 << (7 - pos % 8);
        if bit {
            self.buf[ix] |= mask;
        } else {
            self.buf[ix] &= !mask;
        }
    }

    fn advance(&mut self, bits: u64) {
        self.pos += bits;
        if self.pos > self.end {
            self.end = self.pos;
        }
    }

    /// Write the low `n` bits (at most 64) of `value`, most significant bit
    /// first.
    pub fn write_bits(&mut self, value: u64, n: u32) {
        debug_assert!(n <= 64);
        for i in 0..n {
            let bit = 0 != (value >> (n - 1 - i)) & 1;
            let pos = self.pos + i as u64;
            self.set_bit(pos, bit);
        }
        self.advance(n as u64);
    }

    /// Write `data` at the current position.
    pub fn write_bytes(&mut self, data: &[u8]) {
        if self.is_aligned() {
            let start = (self.pos / 8) as usize;
            let stop = start + data.len();
            if stop > self.buf.len() {
                self.buf.resize(stop, 0);
            }
            self.buf[start..stop].copy_from_slice(data);
            self.advance(data.len() as u64 * 8);
        } else {
            for &b in data {
                self.write_bits(b as u64, 8);
            }
        }
    }

    /// Write `bits` zero bits.
    pub fn write_zeros(&mut self, bits: u64) {
        for i in 0..bits {
            let pos = self.pos + i;
            self.set_bit(pos, false);
        }
        self.advance(bits);
    }

    /// Move to an absolute bit position, which may be past the written end;
    /// the gap is zero-filled.
    pub fn seek_write(&mut self, pos: u64) {
        if pos > self.end {
            self.pos = self.end;
            self.write_zeros(pos - self.end);
        } else {
            self.pos = pos;
        }
    }

    /// Save the current state so that a failed write can be undone.
    ///
    /// Only data from the current position onwards is saved, which is
    /// usually at most a partial byte. A write that seeks back before the
    /// mark is not undone by `reset`.
    pub fn mark(&self) -> Mark {
        let to = (((self.end + 7) / 8) as usize).min(self.buf.len());
        let from = ((self.pos / 8) as usize).min(to);
        Mark { pos: self.pos, end: self.end, tail: self.buf[from..to].to_vec() }
    }

    /// Return to the state saved by `mark`, discarding everything written
    /// since.
    pub fn reset(&mut self, mark: Mark) {
        let from = ((mark.pos / 8) as usize).min(self.buf.len());
        self.buf.truncate(from);
        self.buf.extend_from_slice(&mark.tail);
        self.pos = mark.pos;
        self.end = mark.end;
    }

    /// Consume the writer, returning the written bytes. A trailing partial
    /// byte is padded with zero bits.
    pub fn into_inner(mut self) -> Vec<u8> {
        let len = ((self.end + 7) / 8) as usize;
        self.buf.truncate(len);
        self.buf
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::parse;

    #[test]
    fn read_aligned_bytes() {
        let data = parse("01 02 03");
        let mut s = Stream::new(&data[..]);
        assert_eq!(vec![1, 2], s.read_bytes(2).unwrap());
        assert_eq!(16, s.pos());
        assert_eq!(8, s.remaining());
        assert_eq!(vec![3], s.read_rest().unwrap());
        assert_eq!(0, s.remaining());
    }

    #[test]
    fn read_unaligned() {
        let data = parse("A5 F0");
        let mut s = Stream::new(&data[..]);
        assert_eq!(1, s.read_bits(1).unwrap());
        assert_eq!(0, s.read_bits(1).unwrap());
        assert!(!s.is_aligned());
        // Bits 2..10 of 1010_0101 1111_0000
        assert_eq!(vec![0x97], s.read_bytes(1).unwrap());
        assert_eq!(0x30, s.read_bits(6).unwrap());
    }

    #[test]
    fn eof_reports_sizes() {
        let data = parse("FF");
        let mut s = Stream::new(&data[..]);
        s.read_bits(3).unwrap();
        assert_eq!(Err(Error::UnexpectedEof(8, 5)), s.read_bytes(1));
        // A failed read does not move the cursor.
        assert_eq!(3, s.pos());
    }

    #[test]
    fn huge_read_is_eof() {
        let data = parse("01 02");
        let mut s = Stream::new(&data[..]);
        match s.read_bytes(usize::max_value()) {
            Ok(d) => panic!("unexpectedly succeeded: {:?}", d),
            Err(Error::UnexpectedEof(_, 16)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
        match s.read_bytes(1 << 61) {
            Ok(d) => panic!("unexpectedly succeeded: {:?}", d),
            Err(Error::UnexpectedEof(..)) => (),
            Err(e) => panic!("failed for wrong reason: {}", e),
        }
        assert_eq!(0, s.pos());
    }

    #[test]
    fn terminated_reads() {
        let data = parse("'hi' 00 'x'");
        let mut s = Stream::new(&data[..]);
        assert_eq!(b"hi".to_vec(), s.read_terminated(1).unwrap());
        assert_eq!(Err(Error::MissingTerminator(1)), s.read_terminated(1));
        assert_eq!(24, s.pos());
    }

    #[test]
    fn seek_bounds() {
        let data = parse("00 00");
        let mut s = Stream::new(&data[..]);
        s.seek(16).unwrap();
        assert_eq!(Err(Error::SeekOutOfRange(17, 16)), s.seek(17));
    }

    #[test]
    fn write_bits_then_bytes() {
        let mut s = Stream::writer();
        s.write_bits(1, 1);
        s.write_bits(0, 1);
        s.write_bytes(&[0x97]);
        s.write_bits(0x30, 6);
        assert_eq!(parse("A5 F0"), s.into_inner());
    }

    #[test]
    fn partial_byte_is_padded() {
        let mut s = Stream::writer();
        s.write_bits(0b101, 3);
        assert_eq!(3, s.len());
        assert_eq!(parse("A0"), s.into_inner());
    }

    #[test]
    fn overwrite_and_extend() {
        let mut s = Stream::writer();
        s.write_bytes(&[1, 2]);
        s.seek_write(32);
        s.write_bytes(&[5]);
        s.seek_write(8);
        s.write_bytes(&[9]);
        assert_eq!(8 * 2, s.pos());
        assert_eq!(parse("01 09 00 00 05"), s.into_inner());
    }

    #[test]
    fn reset_discards_later_writes() {
        let mut s = Stream::writer();
        s.write_bits(0b101, 3);
        let mark = s.mark();
        s.write_bits(0b11111, 5);
        s.write_bytes(&[1, 2, 3]);
        s.reset(mark.clone());
        assert_eq!(3, s.pos());
        assert_eq!(3, s.len());

        s.write_bits(0, 5);
        s.write_bytes(&[7]);
        assert_eq!(parse("A0 07"), s.into_inner());

        // Data overwritten after the mark inside the written region comes
        // back too.
        let mut s = Stream::writer();
        s.write_bytes(&[1, 2, 3]);
        s.seek_write(8);
        let mark = s.mark();
        s.write_bytes(&[9, 9, 9, 9]);
        s.reset(mark);
        assert_eq!(8, s.pos());
        assert_eq!(parse("01 02 03"), s.into_inner());
    }
}
