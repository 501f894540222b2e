//! Decoding of C-style character and string escape sequences.
//!
//! Mirrors `original_source/ic4/string_utilities.py`: `\a \b \f \n \r \t \v`,
//! `\\ \' \" \?`, `\xH+` (one or more hex digits) and `\ooo` (one to three
//! octal digits). No terminating zero is ever appended by `decode_string` —
//! see `SPEC_FULL.md` §9 for why that resolves the distilled spec's open
//! question in favor of "no terminator".

/// Failure while decoding a `\`-escape within a character or string literal.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum EscapeError {
    #[error("dangling backslash at end of literal")]
    DanglingBackslash,
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),
    #[error("empty hex escape")]
    EmptyHexEscape,
}

fn simple_escape(c: char) -> Option<char> {
    Some(match c {
        'a' => '\u{7}',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{b}',
        '\\' => '\\',
        '\'' => '\'',
        '"' => '"',
        '?' => '?',
        _ => return None,
    })
}

/// Decodes one escape sequence body (the characters following the `\`),
/// returning the decoded code point and the number of input characters it
/// consumed (not counting the leading `\`).
fn decode_escape_body(rest: &[char]) -> Result<(i64, usize), EscapeError> {
    let first = *rest.first().ok_or(EscapeError::DanglingBackslash)?;

    if let Some(decoded) = simple_escape(first) {
        return Ok((decoded as i64, 1));
    }

    if first == 'x' || first == 'X' {
        let digits: String = rest[1..]
            .iter()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        if digits.is_empty() {
            return Err(EscapeError::EmptyHexEscape);
        }
        let value = i64::from_str_radix(&digits, 16).expect("validated hex digits");
        return Ok((value, 1 + digits.len()));
    }

    if first.is_digit(8) {
        let digits: String = rest
            .iter()
            .take(3)
            .take_while(|c| c.is_digit(8))
            .collect();
        let value = i64::from_str_radix(&digits, 8).expect("validated octal digits");
        return Ok((value, digits.len()));
    }

    Err(EscapeError::InvalidEscape(first))
}

/// Decodes the body of a single character constant (without the surrounding
/// quotes), e.g. `n` from `'\n'` or `A` from `'A'`.
pub fn decode_char(body: &str) -> Result<i64, EscapeError> {
    let chars: Vec<char> = body.chars().collect();
    match chars.as_slice() {
        [c] if *c != '\\' => Ok(*c as i64),
        ['\\', rest @ ..] => Ok(decode_escape_body(rest)?.0),
        _ => Err(EscapeError::InvalidEscape(*chars.first().unwrap_or(&'\0'))),
    }
}

/// Decodes the body of a string constant (without the surrounding quotes)
/// into its sequence of code points. No terminator is appended.
pub fn decode_string(body: &str) -> Result<Vec<i64>, EscapeError> {
    let chars: Vec<char> = body.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' {
            out.push(chars[i] as i64);
            i += 1;
            continue;
        }
        let (value, consumed) = decode_escape_body(&chars[i + 1..])?;
        out.push(value);
        i += 1 + consumed;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_characters_pass_through() {
        assert_eq!(decode_char("A").unwrap(), 'A' as i64);
        assert_eq!(decode_string("hi").unwrap(), vec!['h' as i64, 'i' as i64]);
    }

    #[test]
    fn simple_escapes_decode() {
        assert_eq!(decode_char("\\n").unwrap(), '\n' as i64);
        assert_eq!(decode_char("\\\\").unwrap(), '\\' as i64);
        assert_eq!(decode_string("a\\tb").unwrap(), vec!['a' as i64, '\t' as i64, 'b' as i64]);
    }

    #[test]
    fn hex_escape_consumes_all_following_hex_digits() {
        assert_eq!(decode_char("\\x41").unwrap(), 0x41);
        assert_eq!(decode_string("\\x41\\x42").unwrap(), vec![0x41, 0x42]);
    }

    #[test]
    fn octal_escape_consumes_up_to_three_digits() {
        assert_eq!(decode_char("\\101").unwrap(), 0o101);
        // a fourth octal digit belongs to the next literal character.
        assert_eq!(decode_string("\\1014").unwrap(), vec![0o101, '4' as i64]);
    }

    #[test]
    fn no_terminator_is_appended() {
        let decoded = decode_string("hi").unwrap();
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn dangling_backslash_fails() {
        assert_eq!(decode_string("a\\").unwrap_err(), EscapeError::DanglingBackslash);
    }

    #[test]
    fn unknown_escape_fails() {
        assert_eq!(decode_char("\\q").unwrap_err(), EscapeError::InvalidEscape('q'));
    }
}
