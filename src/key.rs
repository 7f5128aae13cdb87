//! # Key
//!
//! Splits hierarchical statsd keys such as `api.requests` or `db/query-time` into a
//! CloudWatch namespace and metric name

/// Characters treated as hierarchy separators in a statsd key
const SEPARATORS: [char; 3] = ['.', '/', '-'];

/// Result of [classify]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified<'a> {
    pub metric_name: &'a str,
    pub namespace: Option<String>,
}

/// Split `key` on `.`, `/` and `-`
///
/// * The last segment is the metric name
/// * Every preceding segment, joined with `/`, is the namespace
/// * A key with a single segment has no namespace
pub fn classify(key: &str) -> Classified<'_> {
    match key.rfind(SEPARATORS) {
        None => Classified {
            metric_name: key,
            namespace: None,
        },
        Some(last) => {
            let namespace = key[..last].split(SEPARATORS).collect::<Vec<_>>().join("/");
            Classified {
                // Separators are all single byte so last + 1 is a char boundary
                metric_name: &key[last + 1..],
                namespace: Some(namespace),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_segment() {
        for key in ["requests", "", "CamelCase_with_underscores"] {
            let classified = classify(key);
            assert_eq!(classified.metric_name, key);
            assert_eq!(classified.namespace, None);
        }
    }

    #[test]
    fn multiple_segments() {
        let classified = classify("api.requests");
        assert_eq!(classified.metric_name, "requests");
        assert_eq!(classified.namespace.as_deref(), Some("api"));

        let classified = classify("app/db-query.latency");
        assert_eq!(classified.metric_name, "latency");
        assert_eq!(classified.namespace.as_deref(), Some("app/db/query"));
    }

    #[test]
    fn empty_segments_are_kept() {
        let classified = classify("a..b");
        assert_eq!(classified.metric_name, "b");
        assert_eq!(classified.namespace.as_deref(), Some("a/"));

        let classified = classify("trailing.");
        assert_eq!(classified.metric_name, "");
        assert_eq!(classified.namespace.as_deref(), Some("trailing"));

        let classified = classify(".");
        assert_eq!(classified.metric_name, "");
        assert_eq!(classified.namespace.as_deref(), Some(""));
    }
}
