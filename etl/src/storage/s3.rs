use super::split_s3_location;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::SdkError;
use common::config::SourceConfig;
use common::{Error, Result};
use tracing::{info, warn};

/// Objects found under one source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixSummary {
    pub location: String,
    pub objects: usize,
    pub bytes: i64,
}

/// Read-only view of the S3 sources a run loads from, using the ambient AWS credentials.
pub struct SourceInspector {
    client: S3Client,
}

impl SourceInspector {
    pub async fn new(region: &str) -> Self {
        let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: S3Client::new(&shared_config),
        }
    }

    /// Checks every configured source before anything is loaded.
    ///
    /// Fails when the event or song prefix holds no objects, or the JSONPaths file is missing.
    pub async fn inspect(&self, sources: &SourceConfig) -> Result<Vec<PrefixSummary>> {
        let mut summaries = Vec::with_capacity(3);

        for location in [&sources.log_data, &sources.song_data] {
            let summary = self.summarize(location).await?;
            if summary.objects == 0 {
                return Err(Error::Storage(format!("No objects found under {}", location)));
            }
            info!(
                "{} holds {} objects ({} bytes)",
                location, summary.objects, summary.bytes
            );
            summaries.push(summary);
        }

        let (bucket, key) = parse(&sources.log_jsonpath)?;
        if !self.check_file_exists(bucket, key).await? {
            return Err(Error::Storage(format!(
                "JSONPaths file {} not found",
                sources.log_jsonpath
            )));
        }
        summaries.push(PrefixSummary {
            location: sources.log_jsonpath.clone(),
            objects: 1,
            bytes: 0,
        });

        Ok(summaries)
    }

    /// Counts the objects and bytes under an `s3://bucket/prefix` location.
    pub async fn summarize(&self, location: &str) -> Result<PrefixSummary> {
        let (bucket, prefix) = parse(location)?;
        let mut summary = PrefixSummary {
            location: location.to_string(),
            objects: 0,
            bytes: 0,
        };
        let mut continuation_token = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);

            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request.send().await?;

            if let Some(contents) = response.contents {
                for object in contents {
                    if object.key.is_some() {
                        summary.objects += 1;
                        summary.bytes += object.size.unwrap_or(0);
                    }
                }
            }

            continuation_token = response.next_continuation_token;
            if continuation_token.is_none() {
                break;
            }
        }

        if summary.objects == 0 {
            warn!("No objects under {}", location);
        }
        Ok(summary)
    }

    async fn check_file_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(err)) if err.err().is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn parse(location: &str) -> Result<(&str, &str)> {
    split_s3_location(location)
        .ok_or_else(|| Error::InvalidUri(format!("{} is not an s3:// location", location)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Error;

    #[test]
    fn test_sdk_failures_surface_as_aws_errors() {
        let err: Error = SdkError::<ListObjectsV2Error>::timeout_error("request timed out").into();
        assert!(
            matches!(err, Error::AwsSdk(ref message) if message.contains("TimeoutError")),
            "{}",
            err
        );
    }

    #[test]
    fn test_jsonpaths_location_must_be_s3() {
        let err = parse("/tmp/log_json_path.json").unwrap_err();
        assert!(matches!(err, Error::InvalidUri(_)));
        assert_eq!(
            parse("s3://udacity-dend/log_json_path.json").unwrap(),
            ("udacity-dend", "log_json_path.json")
        );
    }
}
