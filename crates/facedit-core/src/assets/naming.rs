//! Asset naming.
//!
//! New identifiers are a random v4 UUID (122 random bits) followed by the
//! original file extension. Collisions are not checked for at runtime.

use uuid::Uuid;

use super::paths::validate_identifier;

/// Extension given to compositor outputs (matches the mp4 container FFmpeg writes).
pub const OUTPUT_EXTENSION: &str = ".mp4";

/// New identifier for an asset that arrived as `original_name`.
///
/// `new_identifier("x.PNG")` ends with `.PNG`; `new_identifier("x")` has no suffix.
/// An extension the path resolver would reject (`image.jpg:large`, control
/// characters, overlong) is dropped, so every generated identifier resolves.
pub fn new_identifier(original_name: &str) -> String {
    let token = Uuid::new_v4().to_string();
    let suffix = file_suffix(original_name);
    if suffix.is_empty() {
        return token;
    }

    let identifier = format!("{token}{suffix}");
    if validate_identifier(&identifier).is_ok() {
        identifier
    } else {
        tracing::debug!(original_name, "Upload extension is not a safe file name, dropping it");
        token
    }
}

/// New identifier for a watermarked output video.
pub fn new_output_identifier() -> String {
    format!("{}{}", Uuid::new_v4(), OUTPUT_EXTENSION)
}

/// Extension of the last path component including its leading dot, case preserved.
///
/// Leading dots of the name do not start an extension (`.bashrc` has none), and
/// both `/` and `\` are treated as separators since upload names come from any OS.
pub fn file_suffix(name: &str) -> &str {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let stem_start = base.len() - base.trim_start_matches('.').len();
    match base[stem_start..].rfind('.') {
        Some(i) => &base[stem_start + i..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_file_suffix() {
        assert_eq!(file_suffix("photo.PNG"), ".PNG");
        assert_eq!(file_suffix("archive.tar.gz"), ".gz");
        assert_eq!(file_suffix("no_extension"), "");
        assert_eq!(file_suffix(".bashrc"), "");
        assert_eq!(file_suffix("..hidden.jpg"), ".jpg");
        assert_eq!(file_suffix("trailing."), ".");
        assert_eq!(file_suffix("dir.d/file"), "");
        assert_eq!(file_suffix(r"C:\Users\me\face.JpEg"), ".JpEg");
        assert_eq!(file_suffix(""), "");
    }

    #[test]
    fn test_new_identifier_preserves_extension_case() {
        let id = new_identifier("x.PNG");
        assert!(id.ends_with(".PNG"));
        assert_eq!(id.len(), 36 + ".PNG".len());
    }

    #[test]
    fn test_new_identifier_without_extension() {
        let id = new_identifier("x");
        assert_eq!(id.len(), 36);
        assert!(!id.contains('.'));
    }

    #[test]
    fn test_unsafe_extension_is_dropped() {
        let long_name = format!("a.{}", "x".repeat(240));
        for name in ["image.jpg:large", "clip.mp4\u{7}", long_name.as_str()] {
            let id = new_identifier(name);
            assert_eq!(id.len(), 36, "{name:?} gave {id:?}");
            assert!(validate_identifier(&id).is_ok());
        }
    }

    #[test]
    fn test_new_output_identifier() {
        let id = new_output_identifier();
        assert!(id.ends_with(OUTPUT_EXTENSION));
        assert!(crate::assets::validate_identifier(&id).is_ok());
    }

    #[test]
    fn test_identifiers_never_repeat() {
        let ids: HashSet<String> = (0..10_000).map(|_| new_identifier("a.jpg")).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_identifiers_unique_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..1_000)
                        .map(|_| new_identifier("same.png"))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(all.insert(id), "duplicate identifier generated");
            }
        }
        assert_eq!(all.len(), 8_000);
    }
}
