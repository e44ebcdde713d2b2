//! Command addressing: building remote command names and record keys.

use std::fmt;

/// A single remote operation: `field` applied within the `prefix` namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Namespace of the addressed entity type, including the dot (`d.`, `t.`).
    pub prefix: String,
    /// Bare field name, optionally carrying literal arguments (`custom=icon`).
    pub field: String,
    /// Additional arguments appended after the field.
    pub args: Vec<String>,
}

impl Command {
    /// Build a getter command without extra arguments.
    pub fn new(prefix: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            field: field.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Fully qualified wire form of the command.
    pub fn full(&self) -> String {
        let mut out = full_command(&self.prefix, &self.field);
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 || !out.ends_with('=') {
                out.push(',');
            }
            out.push_str(arg);
        }
        out
    }

    /// Record key derived from the field name.
    pub fn key(&self) -> String {
        to_key(&self.field)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full())
    }
}

/// Join `prefix` and `field`, appending `=` unless the field already has one.
///
/// ```
/// use rtorrent_rpc::rpc::command::full_command;
/// assert_eq!(full_command("d.", "name"), "d.name=");
/// assert_eq!(full_command("d.", "custom=icon"), "d.custom=icon");
/// ```
pub fn full_command(prefix: &str, field: &str) -> String {
    if field.contains('=') {
        format!("{}{}", prefix, field)
    } else {
        format!("{}{}=", prefix, field)
    }
}

fn is_separator(ch: char) -> bool {
    matches!(ch, '.' | ',' | '_' | '=') || ch.is_whitespace()
}

/// Lower-case `field` and turn every separator run into a camel-case boundary.
///
/// ```
/// use rtorrent_rpc::rpc::command::to_key;
/// assert_eq!(to_key("down.rate"), "downRate");
/// assert_eq!(to_key("custom=icon"), "customIcon");
/// assert_eq!(to_key("is_enabled="), "isEnabled");
/// ```
pub fn to_key(field: &str) -> String {
    let mut key = String::with_capacity(field.len());
    let mut boundary = false;
    for ch in field.chars().flat_map(char::to_lowercase) {
        if is_separator(ch) {
            boundary = true;
        } else if boundary {
            key.extend(ch.to_uppercase());
            boundary = false;
        } else {
            key.push(ch);
        }
    }
    key
}

/// Strip a leading `type.` namespace (`d.`, `t.`, ...) from a method name.
pub fn strip_namespace(method: &str) -> &str {
    match method.split_once('.') {
        Some((namespace, rest))
            if !namespace.is_empty()
                && !rest.is_empty()
                && namespace.chars().all(|ch| ch.is_ascii_alphabetic()) =>
        {
            rest
        }
        _ => method,
    }
}
