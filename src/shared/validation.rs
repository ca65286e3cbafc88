use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for professional license numbers
    /// Uppercase letters and digits in dash-separated segments
    /// - Valid: "PSY-2024-0051", "LIC889123", "A1-B2-C3"
    /// - Invalid: "psy-1", "LIC 889", "-PSY01", "PSY01-"
    pub static ref LICENSE_REGEX: Regex =
        Regex::new(r"^(?:[A-Z0-9]{1,}-)*[A-Z0-9]{1,}$").unwrap();

    /// Regex for phone numbers in loose international form
    /// Optional leading +, then 8-15 digits
    /// - Valid: "+6281234567890", "081234567890"
    /// - Invalid: "12345", "+62 812", "phone"
    pub static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9]{8,15}$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_license_valid() {
        assert!(LICENSE_REGEX.is_match("PSY-2024-0051"));
        assert!(LICENSE_REGEX.is_match("LIC889123"));
        assert!(LICENSE_REGEX.is_match("A1-B2-C3"));
    }

    #[test]
    fn test_license_invalid() {
        assert!(!LICENSE_REGEX.is_match("psy-0051")); // lowercase
        assert!(!LICENSE_REGEX.is_match("LIC 889")); // space
        assert!(!LICENSE_REGEX.is_match("-PSY001")); // starts with hyphen
        assert!(!LICENSE_REGEX.is_match("PSY001-")); // ends with hyphen
        assert!(!LICENSE_REGEX.is_match("")); // empty
    }

    #[test]
    fn test_phone_valid() {
        assert!(PHONE_REGEX.is_match("+6281234567890"));
        assert!(PHONE_REGEX.is_match("081234567890"));
    }

    #[test]
    fn test_phone_invalid() {
        assert!(!PHONE_REGEX.is_match("12345")); // too short
        assert!(!PHONE_REGEX.is_match("+62 812")); // space
        assert!(!PHONE_REGEX.is_match("phone")); // letters
    }
}
