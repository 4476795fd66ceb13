//! UTF-8 transcoding over UTF-16 code units.

use bytes::Bytes;

/// Encode a sequence of UTF-16 code units as UTF-8.
///
/// Any surrogate unit consumes the following unit as its low half. Nothing
/// is validated: a surrogate at the end of the input is paired with 0 and a
/// lone low surrogate swallows whatever unit follows it.
pub fn encode_utf16_units(units: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;

    while i < units.len() {
        let unit = units[i] as u32;

        if unit < 0x80 {
            out.push(unit as u8);
        } else if unit < 0x800 {
            out.push(0xc0 | (unit >> 6) as u8);
            out.push(0x80 | (unit & 0x3f) as u8);
        } else if !(0xd800..0xe000).contains(&unit) {
            out.push(0xe0 | (unit >> 12) as u8);
            out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
            out.push(0x80 | (unit & 0x3f) as u8);
        } else {
            i += 1;
            let low = units.get(i).copied().unwrap_or(0) as u32;
            let code_point = 0x10000 + (((unit & 0x3ff) << 10) | (low & 0x3ff));
            out.push(0xf0 | (code_point >> 18) as u8);
            out.push(0x80 | ((code_point >> 12) & 0x3f) as u8);
            out.push(0x80 | ((code_point >> 6) & 0x3f) as u8);
            out.push(0x80 | (code_point & 0x3f) as u8);
        }

        i += 1;
    }

    out
}

/// Encode text as UTF-8 by walking its UTF-16 code units.
pub fn encode_utf8(text: &str) -> Bytes {
    let units: Vec<u16> = text.encode_utf16().collect();
    Bytes::from(encode_utf16_units(&units))
}

/// Decode UTF-8 bytes into UTF-16 code units.
///
/// The sequence length comes from the lead byte alone (`< 0x80`, `< 0xe0`,
/// `< 0xf0`, otherwise 4). Continuation bytes are trusted as-is and bytes
/// missing at the end of the input read as zero. Output for malformed input
/// is unspecified.
pub fn decode_utf16_units(bytes: &[u8]) -> Vec<u16> {
    let byte_at = |i: usize| bytes.get(i).copied().unwrap_or(0) as u32;
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let lead = bytes[i] as u32;

        let code_point = if lead < 0x80 {
            i += 1;
            lead
        } else if lead < 0xe0 {
            let cp = ((lead & 0x1f) << 6) | (byte_at(i + 1) & 0x3f);
            i += 2;
            cp
        } else if lead < 0xf0 {
            let cp = ((lead & 0x0f) << 12)
                | ((byte_at(i + 1) & 0x3f) << 6)
                | (byte_at(i + 2) & 0x3f);
            i += 3;
            cp
        } else {
            let cp = ((lead & 0x07) << 18)
                | ((byte_at(i + 1) & 0x3f) << 12)
                | ((byte_at(i + 2) & 0x3f) << 6)
                | (byte_at(i + 3) & 0x3f);
            i += 4;
            cp
        };

        if code_point > 0xffff {
            let offset = code_point - 0x10000;
            units.push(((0xd800 + (offset >> 10)) & 0xffff) as u16);
            units.push((0xdc00 + (offset & 0x3ff)) as u16);
        } else {
            units.push(code_point as u16);
        }
    }

    units
}

/// Decode UTF-8 bytes into text.
///
/// Known gap: input is not validated (see [`decode_utf16_units`]). Unpaired
/// surrogates produced by malformed input are replaced with U+FFFD when the
/// units are assembled into a `String`.
pub fn decode_utf8(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&decode_utf16_units(bytes))
}
