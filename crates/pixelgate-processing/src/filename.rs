//! Filename inspection
//!
//! Names are reported by the host and fully attacker controlled. Suspicious content is
//! recorded as a threat rather than rejected; a cleaned name is always produced so the
//! caller never has to reuse the original.

use pixelgate_core::SecurityThreat;

const DANGEROUS_CHARACTERS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '/', '\\'];
const TRAVERSAL_SEQUENCES: &[&str] = &["../", "..\\"];
const FALLBACK_NAME: &str = "file";

fn is_disallowed(c: char) -> bool {
    DANGEROUS_CHARACTERS.contains(&c) || c.is_control()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameInspection {
    /// Length of the original name in characters
    pub length: usize,
    pub sanitized: String,
    pub threats: Vec<SecurityThreat>,
}

pub fn inspect_filename(name: &str, max_length: usize) -> FilenameInspection {
    let mut threats = Vec::new();

    let mut offending: Vec<char> = Vec::new();
    for c in name.chars().filter(|c| is_disallowed(*c)) {
        if !offending.contains(&c) {
            offending.push(c);
        }
    }
    if !offending.is_empty() {
        let characters = offending.iter().flat_map(|c| c.escape_debug()).collect();
        threats.push(SecurityThreat::DangerousCharacters { characters });
    }

    if TRAVERSAL_SEQUENCES.iter().any(|seq| name.contains(seq)) {
        threats.push(SecurityThreat::PathTraversal);
    }

    FilenameInspection {
        length: name.chars().count(),
        sanitized: sanitize_filename(name, max_length),
        threats,
    }
}

/// Strip disallowed characters and leading dots, keeping the result within `max_length`
/// characters. The extension survives truncation when it fits.
pub fn sanitize_filename(name: &str, max_length: usize) -> String {
    let stripped: String = name.chars().filter(|c| !is_disallowed(*c)).collect();
    let trimmed = stripped.trim().trim_start_matches('.').trim_start();

    if trimmed.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    if trimmed.chars().count() <= max_length {
        return trimmed.to_string();
    }

    let (stem, extension) = match trimmed.rfind('.') {
        Some(idx) if idx > 0 => (&trimmed[..idx], &trimmed[idx..]),
        _ => (trimmed, ""),
    };
    let extension_len = extension.chars().count();
    if extension_len >= max_length {
        return trimmed.chars().take(max_length).collect();
    }

    let mut truncated: String = stem.chars().take(max_length - extension_len).collect();
    truncated.push_str(extension);
    truncated
}
