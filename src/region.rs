//! Region derivation from availability zone names
//!
//! Three zone naming schemes are recognized:
//!
//! - standard: `us-east-1a` (three segments, zone letter on the last one)
//! - Local Zone: `us-east-1-bos-1a`
//! - Wavelength: `us-east-1-wl1-bos-wlz-1`
//!
//! Local Zone and Wavelength names both collapse to their first three segments.
//! Some Wavelength variants may not map to a billing-valid region this way; the
//! rule is kept as-is. Anything shorter than three segments is passed through.

/// Derive the region from an availability zone string
///
/// Empty input yields an empty string. Already-resolved regions such as
/// `us-east-1` come back unchanged.
pub fn region_from_az(az: &str) -> String {
    if az.is_empty() {
        return String::new();
    }

    let parts: Vec<&str> = az.split('-').collect();

    match parts.len() {
        n if n > 3 => parts[..3].join("-"),
        3 => {
            let last = parts[2];
            let last = match last.chars().last() {
                Some(c) if c.is_alphabetic() => &last[..last.len() - c.len_utf8()],
                _ => last,
            };
            format!("{}-{}-{}", parts[0], parts[1], last)
        }
        // Malformed or too short
        _ => az.to_string(),
    }
}

/// Optional form of [`region_from_az`]: absent or empty input gives `None`
pub fn resolve_region(az: Option<&str>) -> Option<String> {
    az.filter(|s| !s.is_empty()).map(region_from_az)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_zone() {
        assert_eq!(region_from_az("us-east-1a"), "us-east-1");
        assert_eq!(region_from_az("eu-central-1c"), "eu-central-1");
        assert_eq!(region_from_az("ap-northeast-2d"), "ap-northeast-2");
    }

    #[test]
    fn test_local_zone() {
        assert_eq!(region_from_az("us-east-1-bos-1a"), "us-east-1");
        assert_eq!(region_from_az("us-west-2-lax-1b"), "us-west-2");
    }

    #[test]
    fn test_wavelength_zone() {
        assert_eq!(region_from_az("us-east-1-wl1-bos-wlz-1"), "us-east-1");
    }

    #[test]
    fn test_empty_and_absent() {
        assert_eq!(region_from_az(""), "");
        assert_eq!(resolve_region(None), None);
        assert_eq!(resolve_region(Some("")), None);
        assert_eq!(resolve_region(Some("us-east-1a")), Some("us-east-1".to_string()));
    }

    #[test]
    fn test_malformed_passthrough() {
        assert_eq!(region_from_az("us"), "us");
        assert_eq!(region_from_az("us-east"), "us-east");
    }

    #[test]
    fn test_already_resolved_region_is_stable() {
        assert_eq!(region_from_az("us-east-1"), "us-east-1");
        assert_eq!(region_from_az(&region_from_az("sa-east-1b")), "sa-east-1");
    }
}
