//! # Config
//!
//! Deserialization of the `cloudwatch` section of a statsd configuration file
//!
//! ```json
//! {
//!     "cloudwatch": {
//!         "region": "us-east-1",
//!         "iamRole": "any",
//!         "processKeyForNamespace": true,
//!         "whitelist": ["api.requests"]
//!     }
//! }
//! ```
//!
//! A section with an `instances` list produces one backend per entry, the remaining keys of
//! the section are then ignored

use super::Error;
use serde::Deserialize;

/// Settings of a single export destination
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceConfig {
    pub namespace: Option<String>,
    pub metric_name: Option<String>,
    pub process_key_for_namespace: bool,
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// `any` for whichever role the instance profile provides, otherwise a role name
    pub iam_role: Option<String>,
}

/// How the CloudWatch client obtains credentials
#[derive(Clone, Default, PartialEq, Eq)]
pub enum CredentialSource {
    /// The AWS SDK default provider chain
    #[default]
    Default,
    Static {
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
    },
    /// Any credentials the instance metadata service hands out
    InstanceMetadataAny,
    /// Credentials of a specific IAM role from the instance metadata service
    InstanceMetadataRole(String),
}

// Keep secrets out of the logs
impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Static { access_key_id, .. } => f
                .debug_struct("Static")
                .field("access_key_id", access_key_id)
                .finish_non_exhaustive(),
            Self::InstanceMetadataAny => f.write_str("InstanceMetadataAny"),
            Self::InstanceMetadataRole(role) => f.debug_tuple("InstanceMetadataRole").field(role).finish(),
        }
    }
}

impl InstanceConfig {
    /// `iamRole` takes precedence over static keys
    pub fn credential_source(&self) -> CredentialSource {
        match (&self.iam_role, &self.access_key_id, &self.secret_access_key) {
            (Some(role), _, _) if role == "any" => CredentialSource::InstanceMetadataAny,
            (Some(role), _, _) if !role.is_empty() => CredentialSource::InstanceMetadataRole(role.clone()),
            (_, Some(access_key_id), Some(secret_access_key)) => CredentialSource::Static {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                session_token: self.session_token.clone(),
            },
            _ => CredentialSource::Default,
        }
    }
}

#[derive(Deserialize)]
struct StatsdConfig {
    #[serde(default)]
    cloudwatch: CloudWatchSection,
}

#[derive(Default, Deserialize)]
struct CloudWatchSection {
    #[serde(default)]
    instances: Option<Vec<InstanceConfig>>,
    #[serde(flatten)]
    instance: InstanceConfig,
}

/// Parse a statsd configuration document into the configured instances
pub fn instances_from_json(json: &str) -> Result<Vec<InstanceConfig>, Error> {
    let config: StatsdConfig = serde_json::from_str(json)?;
    let section = config.cloudwatch;
    Ok(section.instances.unwrap_or_else(|| vec![section.instance]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_instance() {
        let instances = instances_from_json(
            r#"{"port":8125,"backends":["statsd-cloudwatch"],"cloudwatch":{"region":"us-east-1","namespace":"MyApp","processKeyForNamespace":true,"whitelist":["a"],"blacklist":["b"]}}"#,
        )
        .unwrap();

        assert_eq!(
            instances,
            vec![InstanceConfig {
                namespace: Some("MyApp".into()),
                process_key_for_namespace: true,
                whitelist: vec!["a".into()],
                blacklist: vec!["b".into()],
                region: Some("us-east-1".into()),
                ..Default::default()
            }]
        );
    }

    #[test]
    fn multiple_instances() {
        let instances = instances_from_json(
            r#"{"cloudwatch":{"instances":[{"region":"us-east-1"},{"region":"eu-west-1","metricName":"All"}]}}"#,
        )
        .unwrap();

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].region.as_deref(), Some("us-east-1"));
        assert_eq!(instances[1].region.as_deref(), Some("eu-west-1"));
        assert_eq!(instances[1].metric_name.as_deref(), Some("All"));
    }

    #[test]
    fn missing_section() {
        assert_eq!(instances_from_json("{}").unwrap(), vec![InstanceConfig::default()]);
        assert!(instances_from_json("not json").is_err());
        assert!(instances_from_json(r#"{"cloudwatch":{"whitelist":"a"}}"#).is_err());
    }

    #[test]
    fn credential_sources() {
        let mut config = InstanceConfig::default();
        assert_eq!(config.credential_source(), CredentialSource::Default);

        config.access_key_id = Some("AKID".into());
        config.secret_access_key = Some("SECRET".into());
        assert_eq!(
            config.credential_source(),
            CredentialSource::Static {
                access_key_id: "AKID".into(),
                secret_access_key: "SECRET".into(),
                session_token: None,
            }
        );
        assert!(!format!("{:?}", config.credential_source()).contains("SECRET"));

        config.iam_role = Some("reporter".into());
        assert_eq!(
            config.credential_source(),
            CredentialSource::InstanceMetadataRole("reporter".into())
        );

        config.iam_role = Some("any".into());
        assert_eq!(config.credential_source(), CredentialSource::InstanceMetadataAny);
    }
}
