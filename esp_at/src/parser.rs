//! Small `nom` parsers for the value lines the module replies with.

use heapless::Vec;
use nom::{
    bytes::complete::{tag, take_until},
    character::complete::{char, i32 as int32, u16 as uint16, u32 as uint32, u8 as uint8},
    combinator::{all_consuming, rest},
    sequence::{delimited, preceded, terminated},
    IResult,
};

use crate::helpers::{SliceExt, WHITESPACE};

/// `"..."`, without the quotes.
pub(crate) fn quoted(input: &[u8]) -> IResult<&[u8], &[u8]> {
    delimited(char('"'), take_until("\""), char('"'))(input)
}

/// Everything after `<tag>:`, e.g. the `1` of `+CWMODE:1`.
pub(crate) fn tagged<'a>(tag_: &str, line: &'a [u8]) -> Option<&'a [u8]> {
    let res: IResult<&[u8], &[u8]> = preceded(terminated(tag(tag_), char(':')), rest)(line);
    res.ok().map(|(_, value)| value)
}

/// Everything after the first `:` of a line, whatever the tag.
pub(crate) fn after_colon(line: &[u8]) -> Option<&[u8]> {
    let res: IResult<&[u8], &[u8]> = preceded(terminated(take_until(":"), char(':')), rest)(line);
    res.ok().map(|(_, value)| value)
}

/// A whole field as a signed decimal, surrounding whitespace ignored.
pub(crate) fn int(field: &[u8]) -> Option<i32> {
    let res: IResult<&[u8], i32> = all_consuming(int32)(field.trim(WHITESPACE));
    res.ok().map(|(_, v)| v)
}

/// A whole field as an unsigned byte.
pub(crate) fn small(field: &[u8]) -> Option<u8> {
    let res: IResult<&[u8], u8> = all_consuming(uint8)(field.trim(WHITESPACE));
    res.ok().map(|(_, v)| v)
}

/// A whole field as a port number.
pub(crate) fn port(field: &[u8]) -> Option<u16> {
    let res: IResult<&[u8], u16> = all_consuming(uint16)(field.trim(WHITESPACE));
    res.ok().map(|(_, v)| v)
}

/// `+<n>`, as answered by `AT+PING`.
pub(crate) fn plus_number(line: &[u8]) -> Option<u32> {
    let res: IResult<&[u8], u32> = all_consuming(preceded(char('+'), uint32))(line.trim(WHITESPACE));
    res.ok().map(|(_, v)| v)
}

/// Split on `,`. Returns `None` if there are more than `N` fields.
pub(crate) fn fields<const N: usize>(input: &[u8]) -> Option<Vec<&[u8], N>> {
    let mut out = Vec::new();
    for field in input.split(|&c| c == b',') {
        out.push(field).ok()?;
    }
    Some(out)
}
