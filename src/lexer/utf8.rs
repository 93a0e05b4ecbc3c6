//! Byte-level UTF-8 decoding.
//!
//! The standard library only tells us *that* a byte slice is invalid; the
//! lexer has to point at the offending byte and reject NUL outright, so the
//! decoder is written out against the raw bit patterns. Encoding back to
//! bytes is `String::push`, which implements the same 1-4 byte rules.

/// Why a code point could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Utf8Error {
	/// A leading or continuation byte that does not fit any UTF-8 pattern,
	/// or a sequence that decodes to a surrogate or a value past U+10FFFF.
	InvalidByte(u8),
	/// NUL is never allowed in source text.
	NullByte,
}

/// Decodes the code point starting at `offset`, returning it together with
/// the number of bytes it occupies.
pub(crate) fn decode_code_point(bytes: &[u8], offset: usize) -> Result<(char, usize), Utf8Error> {
	let first = bytes[offset];
	let (mut value, extra) = if first & 0b1000_0000 == 0 {
		(u32::from(first), 0)
	} else if first & 0b1110_0000 == 0b1100_0000 {
		(u32::from(first & 0b0001_1111), 1)
	} else if first & 0b1111_0000 == 0b1110_0000 {
		(u32::from(first & 0b0000_1111), 2)
	} else if first & 0b1111_1000 == 0b1111_0000 {
		(u32::from(first & 0b0000_0111), 3)
	} else {
		return Err(Utf8Error::InvalidByte(first));
	};

	for i in 1..=extra {
		let byte = *bytes.get(offset + i).ok_or(Utf8Error::InvalidByte(first))?;
		if byte & 0b1100_0000 != 0b1000_0000 {
			return Err(Utf8Error::InvalidByte(byte));
		}
		value = (value << 6) | u32::from(byte & 0b0011_1111);
	}

	if value == 0 {
		return Err(Utf8Error::NullByte);
	}
	match char::from_u32(value) {
		Some(code_point) => Ok((code_point, extra + 1)),
		None => Err(Utf8Error::InvalidByte(first)),
	}
}
