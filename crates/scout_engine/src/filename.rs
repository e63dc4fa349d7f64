use percent_encoding::percent_decode_str;
use scout_core::JobId;

const MAX_NAME_CHARS: usize = 120;
const FALLBACK_EXTENSION: &str = "xlsx";

/// File-system-safe name for a downloaded artifact.
///
/// Prefers the server-suggested name; falls back to `{job_id}.xlsx`.
pub fn artifact_filename(suggested: Option<&str>, job_id: &JobId) -> String {
    suggested
        .map(|name| sanitize(last_component(name)))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| {
            let stem = sanitize(job_id.as_str());
            let stem = if stem.is_empty() { "artifact".to_string() } else { stem };
            format!("{stem}.{FALLBACK_EXTENSION}")
        })
}

/// Extracts the filename from a `Content-Disposition` header value.
///
/// An RFC 5987 `filename*` wins over a plain `filename`. Quoted values may
/// contain `;`.
pub fn content_disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for (key, value) in header_params(header) {
        match key.to_ascii_lowercase().as_str() {
            "filename*" => extended = decode_ext_value(&value),
            "filename" => plain = Some(value),
            _ => {}
        }
    }
    extended.or(plain).filter(|name| !name.trim().is_empty())
}

/// `key=value` pairs after the disposition type, with quoted-string values
/// unescaped.
fn header_params(header: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = header.chars().peekable();

    // Skip the disposition type.
    for c in chars.by_ref() {
        if c == ';' {
            break;
        }
    }

    loop {
        let key: String = chars
            .by_ref()
            .take_while(|&c| c != '=')
            .collect::<String>()
            .trim()
            .trim_start_matches(';')
            .trim()
            .to_string();
        if key.is_empty() {
            return params;
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'"').is_some() {
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => value.extend(chars.next()),
                    _ => value.push(c),
                }
            }
            // Drop anything between the closing quote and the next `;`.
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
            }
        } else {
            value = chars
                .by_ref()
                .take_while(|&c| c != ';')
                .collect::<String>()
                .trim()
                .to_string();
        }
        params.push((key, value));
    }
}

/// `UTF-8''busca_padarias.xlsx` -> `busca_padarias.xlsx`
fn decode_ext_value(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;
    if !charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }
    // Stray `%` signs that do not start an escape are kept as-is.
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|name| name.into_owned())
}

fn last_component(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

fn sanitize(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    // Collapse runs of underscores.
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    let mut name: String = compacted.chars().take(MAX_NAME_CHARS).collect();
    if is_reserved_windows_name(&name) {
        name.insert(0, '_');
    }
    name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(stem))
}
