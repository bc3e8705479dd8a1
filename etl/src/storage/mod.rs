pub mod s3;

pub use s3::{PrefixSummary, SourceInspector};

/// Splits `s3://bucket/some/prefix` into `("bucket", "some/prefix")`.
///
/// Returns `None` for locations that are not S3 URIs or have no bucket.
pub fn split_s3_location(location: &str) -> Option<(&str, &str)> {
    let rest = location.strip_prefix("s3://")?;
    let (bucket, key) = match rest.split_once('/') {
        Some((bucket, key)) => (bucket, key.trim_end_matches('/')),
        None => (rest, ""),
    };

    if bucket.is_empty() {
        return None;
    }
    Some((bucket, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_s3_location() {
        assert_eq!(
            split_s3_location("s3://udacity-dend/log_data"),
            Some(("udacity-dend", "log_data"))
        );
        assert_eq!(
            split_s3_location("s3://udacity-dend/song_data/A/"),
            Some(("udacity-dend", "song_data/A"))
        );
        assert_eq!(split_s3_location("s3://udacity-dend"), Some(("udacity-dend", "")));
    }

    #[test]
    fn test_split_rejects_other_locations() {
        assert_eq!(split_s3_location("/data/log_data"), None);
        assert_eq!(split_s3_location("s3:///log_data"), None);
        assert_eq!(split_s3_location("https://udacity-dend/log_data"), None);
    }
}
