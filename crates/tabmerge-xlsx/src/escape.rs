//! Text escaping shared by the reader and writer

/// Decode Excel's `_xHHHH_` escape sequences.
///
/// Excel stores characters XML cannot carry (control characters, mostly
/// `_x000d_` and `_x000a_`) this way. `_x005f_` is an escaped underscore.
/// Sequences that are not exactly four hex digits between `_x` and `_` are
/// left as they are.
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        match decode_one(candidate) {
            Some(ch) => {
                out.push(ch);
                rest = &candidate[7..];
            }
            None => {
                out.push('_');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode `_xHHHH_` at the start of `s`
fn decode_one(s: &str) -> Option<char> {
    let bytes = s.as_bytes();
    if bytes.len() < 7 || bytes[6] != b'_' {
        return None;
    }
    let hex = s.get(2..6)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Escape text for an XML element body or attribute.
///
/// Control characters XML cannot carry and underscores that would read back
/// as an `_xHHHH_` sequence are written in Excel's escape form.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (idx, ch) in s.char_indices() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' => out.push(ch),
            c if (c as u32) < 0x20 => out.push_str(&format!("_x{:04X}_", c as u32)),
            '_' if decode_one(&s[idx..]).is_some() => out.push_str("_x005F_"),
            c => out.push(c),
        }
    }
    out
}
