//! Text and binary transcoding.
//!
//! Both codecs follow the sandbox's historical behavior rather than the
//! strictest reading of the standards: UTF-8 is produced from UTF-16 code
//! units without validation, and base64 decoding skips characters outside
//! the alphabet.

mod base64;
mod utf8;

pub use self::base64::{atob, base64_decode, base64_encode, btoa};
pub use self::utf8::{decode_utf16_units, decode_utf8, encode_utf16_units, encode_utf8};
