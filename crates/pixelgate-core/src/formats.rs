//! Image format tables
//!
//! Static lookup tables for the standard web image formats and the RAW camera formats the
//! intake pipeline recognizes. All lookups expect lowercase input; callers normalize MIME
//! types and extensions before querying.

use std::path::Path;

/// A standard (browser-displayable) image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardFormat {
    /// Normalized format name (e.g. "jpeg")
    pub name: &'static str,
    /// Accepted MIME types; the first entry is canonical
    pub mime_types: &'static [&'static str],
    pub extensions: &'static [&'static str],
    /// Whether the native decoder can read pixels for this format
    pub decodable: bool,
}

impl StandardFormat {
    pub fn canonical_mime_type(&self) -> &'static str {
        self.mime_types[0]
    }
}

/// A vendor RAW camera format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFormat {
    pub extension: &'static str,
    pub mime_types: &'static [&'static str],
    pub vendor: &'static str,
}

impl RawFormat {
    pub fn canonical_mime_type(&self) -> &'static str {
        self.mime_types[0]
    }
}

pub const STANDARD_FORMATS: &[StandardFormat] = &[
    StandardFormat {
        name: "jpeg",
        mime_types: &["image/jpeg", "image/jpg", "image/pjpeg"],
        extensions: &["jpg", "jpeg", "jpe", "jfif"],
        decodable: true,
    },
    StandardFormat {
        name: "png",
        mime_types: &["image/png"],
        extensions: &["png"],
        decodable: true,
    },
    StandardFormat {
        name: "webp",
        mime_types: &["image/webp"],
        extensions: &["webp"],
        decodable: true,
    },
    StandardFormat {
        name: "gif",
        mime_types: &["image/gif"],
        extensions: &["gif"],
        decodable: true,
    },
    StandardFormat {
        name: "bmp",
        mime_types: &["image/bmp", "image/x-ms-bmp"],
        extensions: &["bmp"],
        decodable: true,
    },
    StandardFormat {
        name: "tiff",
        mime_types: &["image/tiff"],
        extensions: &["tif", "tiff"],
        decodable: true,
    },
    StandardFormat {
        name: "avif",
        mime_types: &["image/avif"],
        extensions: &["avif"],
        decodable: false,
    },
    StandardFormat {
        name: "heic",
        mime_types: &["image/heic", "image/heic-sequence"],
        extensions: &["heic"],
        decodable: false,
    },
    StandardFormat {
        name: "heif",
        mime_types: &["image/heif", "image/heif-sequence"],
        extensions: &["heif"],
        decodable: false,
    },
];

pub const RAW_FORMATS: &[RawFormat] = &[
    RawFormat {
        extension: "cr2",
        mime_types: &["image/x-canon-cr2"],
        vendor: "Canon",
    },
    RawFormat {
        extension: "cr3",
        mime_types: &["image/x-canon-cr3"],
        vendor: "Canon",
    },
    RawFormat {
        extension: "crw",
        mime_types: &["image/x-canon-crw"],
        vendor: "Canon",
    },
    RawFormat {
        extension: "nef",
        mime_types: &["image/x-nikon-nef"],
        vendor: "Nikon",
    },
    RawFormat {
        extension: "nrw",
        mime_types: &["image/x-nikon-nrw"],
        vendor: "Nikon",
    },
    RawFormat {
        extension: "arw",
        mime_types: &["image/x-sony-arw"],
        vendor: "Sony",
    },
    RawFormat {
        extension: "sr2",
        mime_types: &["image/x-sony-sr2"],
        vendor: "Sony",
    },
    RawFormat {
        extension: "srf",
        mime_types: &["image/x-sony-srf"],
        vendor: "Sony",
    },
    RawFormat {
        extension: "dng",
        mime_types: &["image/x-adobe-dng", "image/dng"],
        vendor: "Adobe",
    },
    RawFormat {
        extension: "raf",
        mime_types: &["image/x-fuji-raf", "image/x-fujifilm-raf"],
        vendor: "Fujifilm",
    },
    RawFormat {
        extension: "orf",
        mime_types: &["image/x-olympus-orf"],
        vendor: "Olympus",
    },
    RawFormat {
        extension: "rw2",
        mime_types: &["image/x-panasonic-rw2"],
        vendor: "Panasonic",
    },
    RawFormat {
        extension: "raw",
        mime_types: &["image/x-panasonic-raw"],
        vendor: "Panasonic",
    },
    RawFormat {
        extension: "pef",
        mime_types: &["image/x-pentax-pef"],
        vendor: "Pentax",
    },
    RawFormat {
        extension: "srw",
        mime_types: &["image/x-samsung-srw"],
        vendor: "Samsung",
    },
    RawFormat {
        extension: "x3f",
        mime_types: &["image/x-sigma-x3f"],
        vendor: "Sigma",
    },
    RawFormat {
        extension: "dcr",
        mime_types: &["image/x-kodak-dcr"],
        vendor: "Kodak",
    },
    RawFormat {
        extension: "kdc",
        mime_types: &["image/x-kodak-kdc"],
        vendor: "Kodak",
    },
    RawFormat {
        extension: "mrw",
        mime_types: &["image/x-minolta-mrw"],
        vendor: "Minolta",
    },
    RawFormat {
        extension: "3fr",
        mime_types: &["image/x-hasselblad-3fr"],
        vendor: "Hasselblad",
    },
    RawFormat {
        extension: "iiq",
        mime_types: &["image/x-phaseone-iiq"],
        vendor: "Phase One",
    },
    RawFormat {
        extension: "rwl",
        mime_types: &["image/x-leica-rwl"],
        vendor: "Leica",
    },
    RawFormat {
        extension: "erf",
        mime_types: &["image/x-epson-erf"],
        vendor: "Epson",
    },
    RawFormat {
        extension: "mef",
        mime_types: &["image/x-mamiya-mef"],
        vendor: "Mamiya",
    },
];

/// MIME types some browsers report for files they cannot identify (notably camera RAWs).
pub const GENERIC_MIME_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

pub fn standard_by_mime(mime_type: &str) -> Option<&'static StandardFormat> {
    STANDARD_FORMATS
        .iter()
        .find(|f| f.mime_types.contains(&mime_type))
}

pub fn standard_by_extension(extension: &str) -> Option<&'static StandardFormat> {
    STANDARD_FORMATS
        .iter()
        .find(|f| f.extensions.contains(&extension))
}

pub fn standard_by_name(name: &str) -> Option<&'static StandardFormat> {
    STANDARD_FORMATS.iter().find(|f| f.name == name)
}

pub fn raw_by_mime(mime_type: &str) -> Option<&'static RawFormat> {
    RAW_FORMATS.iter().find(|f| f.mime_types.contains(&mime_type))
}

pub fn raw_by_extension(extension: &str) -> Option<&'static RawFormat> {
    RAW_FORMATS.iter().find(|f| f.extension == extension)
}

pub fn is_generic_mime(mime_type: &str) -> bool {
    GENERIC_MIME_TYPES.contains(&mime_type)
}

/// Lowercased extension of a filename, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Every standard and RAW MIME type, in table order.
pub fn default_allowed_content_types() -> Vec<String> {
    STANDARD_FORMATS
        .iter()
        .flat_map(|f| f.mime_types.iter())
        .chain(RAW_FORMATS.iter().flat_map(|f| f.mime_types.iter()))
        .map(|m| m.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_lookup_by_mime_and_extension() {
        assert_eq!(standard_by_mime("image/jpg").map(|f| f.name), Some("jpeg"));
        assert_eq!(standard_by_extension("jfif").map(|f| f.name), Some("jpeg"));
        assert_eq!(standard_by_extension("tif").map(|f| f.name), Some("tiff"));
        assert!(standard_by_mime("image/svg+xml").is_none());
    }

    #[test]
    fn test_raw_lookup() {
        let dng = raw_by_mime("image/dng").unwrap();
        assert_eq!(dng.extension, "dng");
        assert_eq!(dng.vendor, "Adobe");
        assert_eq!(raw_by_extension("nef").map(|f| f.vendor), Some("Nikon"));
        assert!(raw_by_extension("jpg").is_none());
    }

    #[test]
    fn test_tables_do_not_overlap() {
        for raw in RAW_FORMATS {
            assert!(standard_by_extension(raw.extension).is_none());
            for mime in raw.mime_types {
                assert!(standard_by_mime(mime).is_none());
            }
        }
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("IMG_0001.CR2"), Some("cr2".to_string()));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(extension_of("noextension"), None);
    }

    #[test]
    fn test_default_allowed_content_types() {
        let allowed = default_allowed_content_types();
        assert!(allowed.contains(&"image/jpeg".to_string()));
        assert!(allowed.contains(&"image/x-sony-arw".to_string()));
        assert!(!allowed.contains(&"application/octet-stream".to_string()));
    }
}
