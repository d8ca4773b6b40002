//! Lenient numeric coercion used by the numeric translators
//!
//! Numbers are cast to the target width. Anything else is parsed from its
//! text form, and text that does not parse yields zero.

use crate::value::Value;

macro_rules! coercion {
    ($($(#[$meta:meta])* $name:ident => $ty:ty;)+) => {$(
        $(#[$meta])*
        pub fn $name(value: &Value) -> $ty {
            match value {
                Value::Float(number) => *number as $ty,
                Value::Double(number) => *number as $ty,
                other => match other.as_i64() {
                    Some(number) => number as $ty,
                    None => other.to_string().parse::<$ty>().unwrap_or_default(),
                },
            }
        }
    )+};
}

coercion! {
    to_byte => i8;
    to_short => i16;
    to_int => i32;
    to_long => i64;
    to_float => f32;
    to_double => f64;
}
