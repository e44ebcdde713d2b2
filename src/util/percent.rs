//! Percent-encoding for text stored in rTorrent's `custom` fields.

/// Percent-encode `text` the way browsers encode a URI component.
///
/// ASCII letters, digits and `-_.!~*'()` pass through; every other
/// character is written as the `%XX` escapes of its UTF-8 bytes.
pub fn encode_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            'A'..='Z' | 'a'..='z' | '0'..='9' => out.push(ch),
            '-' | '_' | '.' | '!' | '~' | '*' | '\'' | '(' | ')' => out.push(ch),
            _ => {
                let mut buf = [0u8; 4];
                for byte in ch.encode_utf8(&mut buf).as_bytes() {
                    out.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    out
}
