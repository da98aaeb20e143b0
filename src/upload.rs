//! Upload rules shared by the browser, the client and the relay.

/// Largest clip accepted for prediction (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Multipart field that carries the clip.
pub const FIELD_NAME: &str = "audio";

/// Extensions the upload zone accepts.
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["wav", "mp3"];

/// Media type for an accepted file name, or `None` if the extension is not
/// accepted. Matching is case-insensitive.
pub fn mime_for_file_name(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_extensions_map_to_mime() {
        assert_eq!(mime_for_file_name("clip.wav"), Some("audio/wav"));
        assert_eq!(mime_for_file_name("Clip.MP3"), Some("audio/mpeg"));
        assert_eq!(mime_for_file_name("archive.tar.wav"), Some("audio/wav"));
    }

    #[test]
    fn everything_else_is_rejected() {
        assert_eq!(mime_for_file_name("clip.ogg"), None);
        assert_eq!(mime_for_file_name("wav"), None);
        assert_eq!(mime_for_file_name(""), None);
    }

    #[test]
    fn accepted_list_matches_mapping() {
        for ext in ACCEPTED_EXTENSIONS {
            assert!(mime_for_file_name(&format!("x.{ext}")).is_some());
        }
    }
}
