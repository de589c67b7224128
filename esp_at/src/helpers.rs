/// Whitespace as far as the module's line protocol is concerned.
pub(crate) const WHITESPACE: &[u8] = &[b'\t', b' ', b'\r', b'\n'];

pub(crate) trait SliceExt {
    fn trim(&self, whitespaces: &[u8]) -> &Self;
    fn trim_end(&self, whitespaces: &[u8]) -> &Self;
    fn unquote(&self) -> &Self;
}

impl SliceExt for [u8] {
    fn trim(&self, whitespaces: &[u8]) -> &[u8] {
        let is_not_whitespace = |c| !whitespaces.contains(c);

        match self.iter().position(is_not_whitespace) {
            Some(first) => self[first..].trim_end(whitespaces),
            None => &[],
        }
    }

    fn trim_end(&self, whitespaces: &[u8]) -> &[u8] {
        let is_not_whitespace = |c| !whitespaces.contains(c);
        self.iter()
            .rposition(is_not_whitespace)
            .map_or(&[], |last| &self[..=last])
    }

    /// Strip one pair of surrounding double quotes, if present.
    fn unquote(&self) -> &[u8] {
        match self {
            [b'"', inner @ .., b'"'] => inner,
            _ => self,
        }
    }
}

/// Formats raw bytes as a string when they are valid UTF-8, and as a byte
/// slice otherwise.
pub struct LossyStr<'a>(pub &'a [u8]);

impl core::fmt::Debug for LossyStr<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match core::str::from_utf8(self.0) {
            Ok(s) => write!(f, "{:?}", s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LossyStr<'_> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=[u8]:a}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn trim() {
        assert_eq!(b"  hello  whatup  ".trim(WHITESPACE), b"hello  whatup");
        assert_eq!(b"OK\r\n".trim_end(WHITESPACE), b"OK");
        assert_eq!(b"AT+GMR\r\r\n".trim_end(WHITESPACE), b"AT+GMR");
        assert_eq!(b" \r\n".trim_end(WHITESPACE), b"");
        assert_eq!(
            b"  \r\n \thello  whatup  \n \t".trim(WHITESPACE),
            b"hello  whatup"
        );
    }

    #[test]
    fn unquote() {
        assert_eq!(b"\"myssid\"".unquote(), b"myssid");
        assert_eq!(b"\"\"".unquote(), b"");
        assert_eq!(b"\"".unquote(), b"\"");
        assert_eq!(b"bare".unquote(), b"bare");
    }
}
