use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating storage file identifiers
    /// Drive ids are URL-safe base64; Cloudinary public ids may include their folder
    /// - Valid: "1AbC_d-Ef", "photos/photo_0190e3f1", "image.v2"
    /// - Invalid: "", "id with space", "id?x=1", "id#frag"
    pub static ref FILE_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_\-./]+$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_regex_valid() {
        assert!(FILE_ID_REGEX.is_match("1AbC_d-EfGhIjKlMnOpQrStUvWxYz0123"));
        assert!(FILE_ID_REGEX.is_match("photos/photo_0190e3f1a2b37c4d"));
        assert!(FILE_ID_REGEX.is_match("image.v2"));
    }

    #[test]
    fn test_file_id_regex_invalid() {
        assert!(!FILE_ID_REGEX.is_match(""));
        assert!(!FILE_ID_REGEX.is_match("id with space"));
        assert!(!FILE_ID_REGEX.is_match("id?x=1"));
        assert!(!FILE_ID_REGEX.is_match("id#frag"));
        assert!(!FILE_ID_REGEX.is_match("id'quote"));
    }
}
