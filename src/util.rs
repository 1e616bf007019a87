//! Small helpers shared by the protocol and session layers.

/// Normalize a breakpoint or source path into the `file://` form DBGp
/// expects. Paths already given as URIs pass through untouched; everything
/// else is tilde-expanded and prefixed.
pub fn to_file_uri(path: &str) -> String {
    if path.starts_with("file://") {
        path.to_string()
    } else {
        format!("file://{}", shellexpand::tilde(path))
    }
}

/// Quote a command argument value for the DBGp wire format.
///
/// Values containing whitespace, `"` or `\` are wrapped in double quotes
/// with inner backslashes and quotes backslash-escaped. Everything else is
/// passed through verbatim. The empty string is quoted so it stays a single
/// token.
pub fn quote_arg(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || value.contains(char::is_whitespace)
        || value.contains('"')
        || value.contains('\\');

    if !needs_quoting {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Inverse of [`quote_arg`]. Unquoted input is returned as-is; a stray
/// trailing escape is kept literally rather than dropped.
pub fn unquote_arg(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
