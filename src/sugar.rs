//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

/// Declare a schema with struct-like syntax.
///
/// Each field is `name: type`, where the type is anything convertible into
/// a `Ty`. Attributes before a field call the builder method of the same
/// name with the given argument, so `#[default = 0]` gives the field a
/// default. Attributes before the schema name call the argument-less
/// builder method of the same name, such as `#[lazy]` or `#[bit_struct]`.
///
/// The macro evaluates to the `Result<Schema>` of `SchemaBuilder::finish`.
///
/// ```
/// #[macro_use] extern crate bitform;
/// use bitform::Native;
///
/// # fn main() {
/// let flags = bitform_schema!(#[bit_struct] Flags {
///     ready: Native::Bool,
///     #[default = 0]
///     level: bitform::Codec::bit_int(7, false).unwrap(),
/// }).unwrap();
/// assert_eq!(1, flags.sizeof(&Default::default()).unwrap());
/// # }
/// ```
#[macro_export]
macro_rules! bitform_schema {
    ($(#[$flag:ident])* $name:ident {
        $($(#[$attr:ident = $val:expr])* $field:ident : $ty:expr),* $(,)*
    }) => {
        $crate::Schema::builder(stringify!($name))
            $(.$flag())*
            $(
                .field(stringify!($field), $ty)
                $(.$attr($val))*
            )*
            .finish()
    };
}
