//! Base64 over the standard alphabet, with the sandbox's lenient decoding.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use bytes::Bytes;

use crate::ShimError;

/// Padded on encode, indifferent to padding and trailing bits on decode.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

fn is_alphabet(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'+' || byte == b'/'
}

/// Encode bytes as padded base64.
pub fn base64_encode(bytes: &[u8]) -> String {
    LENIENT.encode(bytes)
}

/// Decode base64 text.
///
/// Trailing `=` padding is stripped first. If the remaining length (in
/// UTF-16 units) is 1 modulo 4 the input is rejected with a validation
/// error; otherwise characters outside the alphabet are skipped.
pub fn base64_decode(input: &str) -> Result<Bytes, ShimError> {
    let stripped = input.trim_end_matches('=');
    if stripped.encode_utf16().count() % 4 == 1 {
        return Err(ShimError::validation(
            "'atob' failed: The string to be decoded is not correctly encoded.",
        ));
    }

    let mut sextets: Vec<u8> = stripped.bytes().filter(|b| is_alphabet(*b)).collect();
    // A lone trailing sextet carries no complete byte.
    if sextets.len() % 4 == 1 {
        sextets.pop();
    }

    LENIENT
        .decode(&sextets)
        .map(Bytes::from)
        .map_err(|e| ShimError::validation(format!("'atob' failed: {}", e)))
}

/// Encode a "binary string" (one char per byte) as base64.
///
/// Fails if any char is above U+00FF.
pub fn btoa(input: &str) -> Result<String, ShimError> {
    let bytes = input
        .chars()
        .map(|c| u8::try_from(u32::from(c)))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| ShimError::validation("'btoa' failed: Character out of range"))?;
    Ok(base64_encode(&bytes))
}

/// Decode base64 into a "binary string" (one char per byte).
pub fn atob(input: &str) -> Result<String, ShimError> {
    let bytes = base64_decode(input)?;
    Ok(bytes.iter().map(|&b| char::from(b)).collect())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let encoded = base64_encode(&bytes);
            prop_assert!(encoded.len() % 4 != 1);
            let decoded = base64_decode(&encoded).unwrap();
            prop_assert_eq!(decoded.as_ref(), &bytes[..]);
        }

        #[test]
        fn prop_binary_string_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let binary: String = bytes.iter().map(|&b| char::from(b)).collect();
            let encoded = btoa(&binary).unwrap();
            prop_assert_eq!(atob(&encoded).unwrap(), binary);
        }
    }
}
