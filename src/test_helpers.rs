//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

/// Decode a test fixture written as hex bytes and quoted text.
///
/// Whitespace separates nothing and is dropped. Hex digits pair up into
/// bytes. Text between single quotes is copied byte for byte.
///
/// `parse("01 'hi' 00")` is `[1, b'h', b'i', 0]`.
pub fn parse(text: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let mut pending: Option<u8> = None;
    let mut quoted = false;

    for c in text.chars() {
        if quoted {
            if '\'' == c {
                quoted = false;
            } else {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            continue;
        }

        match c {
            '\'' => {
                assert!(pending.is_none(), "odd hex digit before quote");
                quoted = true;
            },
            c if c.is_whitespace() => (),
            c => {
                let nybble = c.to_digit(16)
                    .unwrap_or_else(|| panic!("bad hex digit {:?}", c)) as u8;
                pending = match pending.take() {
                    None => Some(nybble),
                    Some(hi) => {
                        out.push(hi << 4 | nybble);
                        None
                    },
                };
            },
        }
    }

    assert!(!quoted, "unterminated quote in {:?}", text);
    assert!(pending.is_none(), "odd number of hex digits in {:?}", text);
    out
}

/// Decode a fixture written as binary digits, most significant first.
/// Whitespace is ignored; the digit count must be a multiple of 8.
pub fn bits(text: &str) -> Vec<u8> {
    let digits: Vec<u8> = text.chars().filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '0' => 0,
            '1' => 1,
            c => panic!("bad binary digit {:?}", c),
        }).collect();
    assert_eq!(0, digits.len() % 8, "partial byte in {:?}", text);
    digits.chunks(8)
        .map(|byte| byte.iter().fold(0, |acc, &b| acc << 1 | b))
        .collect()
}

#[test]
fn fixtures_decode() {
    assert_eq!(vec![1, b'h', b' ', b'i', 0xAB], parse("01 'h i' aB"));
    assert_eq!(vec![0xA5, 0x01], bits("1010 0101 00000001"));
}
