//! Magic-byte signatures
//!
//! A declared MIME type is only a claim. The leading bytes of a file tell us what it
//! actually is, so the validator compares the two and the classifier can fall back to
//! sniffing when neither MIME type nor extension is usable.

use pixelgate_core::formats;

/// A leading-byte pattern identifying one container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicSignature {
    /// Normalized format name reported when this signature matches
    pub format: &'static str,
    /// MIME type reported when this signature matches
    pub mime_type: &'static str,
    pub is_raw: bool,
    /// Declared formats this signature is acceptable evidence for
    satisfies: &'static [&'static str],
    /// (offset, bytes) pairs that must all match
    parts: &'static [(usize, &'static [u8])],
}

impl MagicSignature {
    pub fn matches(&self, header: &[u8]) -> bool {
        self.parts.iter().all(|(offset, bytes)| {
            header
                .get(*offset..offset + bytes.len())
                .is_some_and(|window| window == *bytes)
        })
    }

    pub fn satisfies(&self, format: &str) -> bool {
        self.satisfies.contains(&format)
    }
}

const fn standard(
    format: &'static str,
    mime_type: &'static str,
    satisfies: &'static [&'static str],
    parts: &'static [(usize, &'static [u8])],
) -> MagicSignature {
    MagicSignature {
        format,
        mime_type,
        is_raw: false,
        satisfies,
        parts,
    }
}

const fn raw(
    format: &'static str,
    mime_type: &'static str,
    parts: &'static [(usize, &'static [u8])],
) -> MagicSignature {
    MagicSignature {
        format,
        mime_type,
        is_raw: true,
        satisfies: &[],
        parts,
    }
}

// Order matters: vendor RAW containers built on TIFF must be tried before plain TIFF.
const SIGNATURES: &[MagicSignature] = &[
    standard("jpeg", "image/jpeg", &["jpeg"], &[(0, &[0xFF, 0xD8, 0xFF])]),
    standard(
        "png",
        "image/png",
        &["png"],
        &[(0, &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])],
    ),
    standard("gif", "image/gif", &["gif"], &[(0, b"GIF87a")]),
    standard("gif", "image/gif", &["gif"], &[(0, b"GIF89a")]),
    standard("webp", "image/webp", &["webp"], &[(0, b"RIFF"), (8, b"WEBP")]),
    standard("bmp", "image/bmp", &["bmp"], &[(0, b"BM")]),
    standard("avif", "image/avif", &["avif"], &[(4, b"ftypavif")]),
    standard("avif", "image/avif", &["avif"], &[(4, b"ftypavis")]),
    standard("heic", "image/heic", &["heic", "heif"], &[(4, b"ftypheic")]),
    standard("heic", "image/heic", &["heic", "heif"], &[(4, b"ftypheix")]),
    standard("heic", "image/heic", &["heic", "heif"], &[(4, b"ftyphevc")]),
    standard("heif", "image/heif", &["heic", "heif"], &[(4, b"ftypmif1")]),
    standard("heif", "image/heif", &["heic", "heif"], &[(4, b"ftypmsf1")]),
    raw("cr3", "image/x-canon-cr3", &[(4, b"ftypcrx ")]),
    raw("cr2", "image/x-canon-cr2", &[(0, b"II*\0"), (8, b"CR")]),
    raw("orf", "image/x-olympus-orf", &[(0, b"IIRO")]),
    raw("orf", "image/x-olympus-orf", &[(0, b"IIRS")]),
    raw("orf", "image/x-olympus-orf", &[(0, b"MMOR")]),
    raw("rw2", "image/x-panasonic-rw2", &[(0, b"IIU\0")]),
    raw("raf", "image/x-fuji-raf", &[(0, b"FUJIFILMCCD-RAW")]),
    raw("x3f", "image/x-sigma-x3f", &[(0, b"FOVb")]),
    raw("mrw", "image/x-minolta-mrw", &[(0, b"\0MRM")]),
    standard("tiff", "image/tiff", &["tiff"], &[(0, b"II*\0")]),
    standard("tiff", "image/tiff", &["tiff"], &[(0, b"MM\0*")]),
];

/// Identify a file from its leading bytes.
pub fn sniff(header: &[u8]) -> Option<&'static MagicSignature> {
    SIGNATURES.iter().find(|signature| signature.matches(header))
}

/// Signatures that count as evidence for the given standard format name.
pub fn signatures_for(format: &str) -> impl Iterator<Item = &'static MagicSignature> + '_ {
    SIGNATURES.iter().filter(move |s| s.satisfies(format))
}

/// Whether the header is consistent with the declared MIME type.
///
/// Returns `None` when the declared type has no signature entry (RAW and unknown types),
/// in which case no comparison is possible.
pub fn check_declared(declared_mime: &str, header: &[u8]) -> Option<bool> {
    let format = formats::standard_by_mime(declared_mime)?;
    let mut expected = signatures_for(format.name).peekable();
    expected.peek()?;
    Some(expected.any(|signature| signature.matches(header)))
}
