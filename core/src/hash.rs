use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// SHA-256 of the script text, base64 encoded.
///
/// Line endings are normalized to `\n` first so a checkout on Windows hashes
/// the same as one on Unix. No other whitespace is touched: an added space
/// or blank line is a content change.
pub fn content_hash(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let digest = Sha256::digest(normalized.as_bytes());
    STANDARD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_for_same_text() {
        let sql = "CREATE TABLE t (id INT);\nGO\n";
        assert_eq!(content_hash(sql), content_hash(sql));
        assert_eq!(content_hash(sql).len(), 44);
    }

    #[test]
    fn any_edit_changes_hash() {
        let base = content_hash("SELECT 1;");
        assert_ne!(base, content_hash("SELECT 2;"));
        assert_ne!(base, content_hash("SELECT  1;"));
        assert_ne!(base, content_hash("SELECT 1;\n"));
    }

    #[test]
    fn crlf_and_lf_hash_alike() {
        assert_eq!(content_hash("a\r\nb\r\n"), content_hash("a\nb\n"));
        assert_ne!(content_hash("a\rb"), content_hash("a\nb"));
    }
}
