/// Expand the escapes of a quoted string literal, quotes included.
pub fn apply_string_escapes(quoted: &str) -> Result<String, char> {
    let inner = &quoted[1..quoted.len() - 1];
    let mut res = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            res.push(c);
            continue;
        }
        match chars.next() {
            | Some('n') => res.push('\n'),
            | Some('t') => res.push('\t'),
            | Some('r') => res.push('\r'),
            | Some('"') => res.push('"'),
            | Some('\\') => res.push('\\'),
            | Some('0') => res.push('\0'),
            | Some(other) => return Err(other),
            | None => return Err('\\'),
        }
    }
    Ok(res)
}
