//! Content-type resolution
//!
//! Pure lookups: a canonical extension table first, a magic-byte sniff as
//! the fallback for files without a recognized extension. The consumer is
//! the outbound media-send path, which lives with the transport
//! implementation behind [`crate::traits::ChatTransport`]; nothing in the
//! notification pipeline itself needs a MIME type.

use std::path::Path;

/// Map a file extension to its canonical MIME type.
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp3" => "audio/mpeg",
        "ogg" | "opus" => "audio/ogg",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "mp4" => "video/mp4",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "doc" | "docx" => "application/msword",
        "xls" | "xlsx" => "application/vnd.ms-excel",
        _ => return None,
    };
    Some(mime)
}

/// Sniff the MIME type from leading magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
        (b"OggS", "audio/ogg"),
        (b"ID3", "audio/mpeg"),
        (b"\xff\xfb", "audio/mpeg"),
    ];

    for (magic, mime) in SIGNATURES {
        if bytes.starts_with(magic) {
            return Some(mime);
        }
    }

    // RIFF container: WAV or WebP depending on the format tag
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" {
        return match &bytes[8..12] {
            b"WAVE" => Some("audio/wav"),
            b"WEBP" => Some("image/webp"),
            _ => None,
        };
    }

    // ISO media file: ftyp box at offset 4
    if bytes.len() >= 8 && &bytes[4..8] == b"ftyp" {
        return Some("video/mp4");
    }

    None
}

/// Resolve the content type of a stored file, extension first, sniffing the
/// bytes when the extension is missing or unrecognized.
pub fn resolve_mime(path: &Path, bytes: &[u8]) -> Option<&'static str> {
    mime_from_extension(path).or_else(|| sniff_mime(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extension_table() {
        assert_eq!(mime_from_extension(Path::new("a.mp3")), Some("audio/mpeg"));
        assert_eq!(mime_from_extension(Path::new("a.JPG")), Some("image/jpeg"));
        assert_eq!(mime_from_extension(Path::new("a.opus")), Some("audio/ogg"));
        assert_eq!(mime_from_extension(Path::new("a.bin")), None);
        assert_eq!(mime_from_extension(Path::new("noext")), None);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(sniff_mime(b"\x89PNG\r\n\x1a\nrest"), Some("image/png"));
        assert_eq!(sniff_mime(b"%PDF-1.7"), Some("application/pdf"));
        assert_eq!(sniff_mime(b"RIFF\x00\x00\x00\x00WAVEfmt "), Some("audio/wav"));
        assert_eq!(sniff_mime(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_mime(b"\x00\x00\x00\x18ftypmp42"), Some("video/mp4"));
        assert_eq!(sniff_mime(b"plain text"), None);
    }

    #[test]
    fn test_resolve_prefers_extension() {
        let path = PathBuf::from("song.mp3");
        // Bytes say PNG, extension wins
        assert_eq!(
            resolve_mime(&path, b"\x89PNG\r\n\x1a\n"),
            Some("audio/mpeg")
        );
        // No extension, sniff decides
        assert_eq!(
            resolve_mime(Path::new("blob"), b"OggS\x00"),
            Some("audio/ogg")
        );
    }
}
