//! `xs:base64Binary` and `xs:hexBinary` codecs.
//!
//! Decoding is strict and each malformation is reported with its own message;
//! the error code is always `FORG0001`.

use crate::engine::runtime::{ConversionResult, ValidationFailure};
use crate::util::whitespace::{is_xml_whitespace, trim_xml_whitespace};
use base64::engine::general_purpose::STANDARD;
use base64::{DecodeError, Engine as _};
use core::fmt;

/// Canonical base64 text for the given octets.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Upper-case hex text for the given octets.
pub fn encode_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(char::from(HEX[usize::from(b >> 4)]));
        out.push(char::from(HEX[usize::from(b & 0x0F)]));
    }
    out
}

/// Decodes base64 text, skipping XML whitespace.
///
/// The `=` layout is checked here so its errors read well; the alphabet,
/// length and residual bits are left to the canonical decoder.
pub fn decode_base64(text: &str) -> ConversionResult<Vec<u8>> {
    let bad = |why: &str| ValidationFailure::invalid(format!("invalid base64 value: {why}"));
    let mut compact = String::with_capacity(text.len());
    let mut eq_count = 0usize;
    for ch in text.chars().filter(|c| !is_xml_whitespace(*c)) {
        if !ch.is_ascii() {
            return Err(bad("non-ASCII character"));
        }
        if ch == '=' {
            eq_count += 1;
            if eq_count > 2 {
                return Err(bad("at most two '=' characters are allowed"));
            }
        } else if eq_count > 0 {
            return Err(bad("'=' can appear only at the end"));
        }
        compact.push(ch);
    }
    STANDARD.decode(&compact).map_err(|e| match e {
        DecodeError::InvalidByte(_, byte) => {
            bad(&format!("character '{}' is not in the base64 alphabet", char::from(byte)))
        }
        DecodeError::InvalidLength(_) => bad("length must be a multiple of four characters"),
        DecodeError::InvalidLastSymbol(_, byte) => bad(&format!(
            "'{}' before the padding carries non-zero residual bits",
            char::from(byte)
        )),
        DecodeError::InvalidPadding => bad("length must be a multiple of four characters"),
    })
}

/// Decodes hex text; both digit cases are accepted.
pub fn decode_hex(text: &str) -> ConversionResult<Vec<u8>> {
    let s = trim_xml_whitespace(text).as_bytes();
    if s.len() % 2 != 0 {
        return Err(ValidationFailure::invalid("a hexBinary value must contain an even number of characters"));
    }
    let nibble = |c: u8| -> ConversionResult<u8> {
        match c {
            b'0'..=b'9' => Ok(c - b'0'),
            b'a'..=b'f' => Ok(c - b'a' + 10),
            b'A'..=b'F' => Ok(c - b'A' + 10),
            _ => Err(ValidationFailure::invalid(format!(
                "invalid hexadecimal digit '{}'",
                char::from(c)
            ))),
        }
    };
    s.chunks(2).map(|pair| Ok((nibble(pair[0])? << 4) | nibble(pair[1])?)).collect()
}

/// `xs:base64Binary`; equality compares octets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Base64BinaryValue(Vec<u8>);

impl Base64BinaryValue {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        decode_base64(lexical).map(Self)
    }

    pub fn octets(&self) -> &[u8] {
        &self.0
    }

    pub fn into_octets(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Display for Base64BinaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_base64(&self.0))
    }
}

impl From<HexBinaryValue> for Base64BinaryValue {
    fn from(h: HexBinaryValue) -> Self {
        Self(h.0)
    }
}

/// `xs:hexBinary`; equality compares octets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HexBinaryValue(Vec<u8>);

impl HexBinaryValue {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        decode_hex(lexical).map(Self)
    }

    pub fn octets(&self) -> &[u8] {
        &self.0
    }

    pub fn into_octets(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Display for HexBinaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_hex(&self.0))
    }
}

impl From<Base64BinaryValue> for HexBinaryValue {
    fn from(b: Base64BinaryValue) -> Self {
        Self(b.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::runtime::ErrorCode;
    use rstest::rstest;

    #[test]
    fn base64_agrees_with_engine() {
        for sample in [&b""[..], b"A", b"AB", b"ABC", b"\x00\xFF\x10\x80"] {
            let text = encode_base64(sample);
            assert_eq!(decode_base64(&text).unwrap(), sample);
        }
    }

    #[test]
    fn residual_bits_checked() {
        assert!(decode_base64("QR==").is_err());
        assert!(decode_base64("QUJ=").is_err());
        assert_eq!(decode_base64("QUI=").unwrap(), b"AB");
    }

    #[rstest]
    #[case("QR==", "residual bits")]
    #[case("QQ", "multiple of four")]
    #[case("QUJ", "multiple of four")]
    #[case("QU*D", "'*' is not in the base64 alphabet")]
    #[case("QQ=A", "only at the end")]
    #[case("QQ===", "at most two")]
    fn decoder_errors_name_the_malformation(#[case] text: &str, #[case] fragment: &str) {
        let err = decode_base64(text).unwrap_err();
        assert_eq!(err.code(), ErrorCode::FORG0001);
        assert!(err.to_string().contains(fragment), "{text}: {err}");
    }

    #[test]
    fn hex_pairs() {
        assert_eq!(decode_hex("0aFf").unwrap(), vec![0x0A, 0xFF]);
        assert!(decode_hex("ABC").is_err());
        assert!(decode_hex("GG").is_err());
    }
}
