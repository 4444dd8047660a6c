//! MailChimp addresses list members by subscriber hash, not by our local id.

use md5::{Digest, Md5};

/// Hex MD5 of the lower-cased email address.
pub fn subscriber_hash(email: &str) -> String {
    hex::encode(Md5::digest(email.to_lowercase().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(subscriber_hash(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(subscriber_hash("abc"), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(
            subscriber_hash("message digest"),
            "f96b697d7cb7938d525a2f31aaf161d0"
        );
    }

    #[test]
    fn test_hash_ignores_case() {
        assert_eq!(subscriber_hash("ABC"), subscriber_hash("abc"));
        assert_eq!(
            subscriber_hash("MrJasonEdu+3@Gmail.com"),
            subscriber_hash("mrjasonedu+3@gmail.com")
        );
    }

    #[test]
    fn test_hash_is_32_lowercase_hex() {
        let hash = subscriber_hash("a@b.com");
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }
}
