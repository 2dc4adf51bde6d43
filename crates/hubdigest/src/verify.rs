//! Comparing declared digests with what the registry resolves.
//!
//! [`verify`] walks every version entry, product and product version in
//! document order and checks each declared architecture. Resolution failures
//! are recorded in the report and never stop the walk.

use crate::document::ManifestDocument;
use crate::observer::CheckObserver;
use hubdigest_image::{Architecture, DigestResolver, ImageReference, DIGEST_PREFIX};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Marker recorded as the actual digest when a check could not complete
pub const ERROR_MARKER: &str = "ERROR";

/// One image/architecture pair to check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTarget {
    pub image: String,
    pub architecture: Architecture,
    /// Expected digest, hex without the `sha256:` prefix
    pub expected: String,
}

/// Result of a single check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Match,
    Mismatch { actual: String },
    Error { message: String },
}

/// Failed check, kept for the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MismatchRecord {
    pub image: String,
    pub architecture: Architecture,
    pub expected: String,
    /// Resolved digest, or [`ERROR_MARKER`]
    pub actual: String,
}

impl fmt::Display for MismatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): expected {}{}, got {}",
            self.image, self.architecture, DIGEST_PREFIX, self.expected, self.actual
        )
    }
}

/// Aggregate result of a verification run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub checked: usize,
    pub passed: usize,
    pub failures: Vec<MismatchRecord>,
}

impl VerificationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, target: &CheckTarget, outcome: &CheckOutcome) {
        self.checked += 1;
        let actual = match outcome {
            CheckOutcome::Match => {
                self.passed += 1;
                return;
            }
            CheckOutcome::Mismatch { actual } => actual.clone(),
            CheckOutcome::Error { .. } => ERROR_MARKER.to_string(),
        };
        self.failures.push(MismatchRecord {
            image: target.image.clone(),
            architecture: target.architecture,
            expected: target.expected.clone(),
            actual,
        });
    }
}

/// Compare a resolved digest with the expected hex digest
pub fn compare(expected: &str, actual: &str) -> CheckOutcome {
    match actual.strip_prefix(DIGEST_PREFIX) {
        Some(hex) if hex == expected => CheckOutcome::Match,
        _ => CheckOutcome::Mismatch {
            actual: actual.to_string(),
        },
    }
}

/// Check every declared digest in `document` against `resolver`.
///
/// Checks run one at a time in document order, amd64 before arm64 for each
/// record.
pub async fn verify<R, O>(
    document: &ManifestDocument,
    resolver: &R,
    observer: &mut O,
) -> VerificationReport
where
    R: DigestResolver + ?Sized,
    O: CheckObserver + ?Sized,
{
    let mut report = VerificationReport::default();

    for version in &document.versions {
        for (product, versions) in version.matrix.iter() {
            for (product_version, details) in versions.iter() {
                debug!(
                    "Checking {} {} ({})",
                    product,
                    product_version,
                    details.image()
                );

                for (architecture, expected) in details.expected_digests() {
                    let target = CheckTarget {
                        image: details.image().to_string(),
                        architecture,
                        expected: expected.to_string(),
                    };

                    observer.on_check_start(&target);
                    let outcome = check(resolver, &target).await;
                    observer.on_check_finished(&target, &outcome);
                    report.record(&target, &outcome);
                }
            }
        }
    }

    debug!(
        "Verification finished: {} checked, {} passed, {} failed",
        report.checked,
        report.passed,
        report.failures.len()
    );
    report
}

async fn check<R>(resolver: &R, target: &CheckTarget) -> CheckOutcome
where
    R: DigestResolver + ?Sized,
{
    let resolved = match ImageReference::parse(&target.image) {
        Ok(image) => resolver.resolve(&image, target.architecture).await,
        Err(e) => Err(e),
    };

    match resolved {
        Ok(actual) => compare(&target.expected, &actual),
        Err(e) => {
            debug!(
                "Could not resolve {} ({}): {}",
                target.image, target.architecture, e
            );
            CheckOutcome::Error {
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubdigest_image::error::Result as ResolveResult;
    use hubdigest_image::ResolveError;
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    /// Canned digests keyed by (image, architecture); unknown pairs fail
    #[derive(Default)]
    struct StubResolver {
        digests: HashMap<(String, Architecture), String>,
        calls: Mutex<Vec<(String, Architecture)>>,
    }

    impl StubResolver {
        fn with(mut self, image: &str, arch: Architecture, digest: &str) -> Self {
            self.digests
                .insert((image.to_string(), arch), digest.to_string());
            self
        }

        fn calls(&self) -> Vec<(String, Architecture)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl DigestResolver for StubResolver {
        fn resolve<'a>(
            &'a self,
            image: &'a ImageReference,
            architecture: Architecture,
        ) -> Pin<Box<dyn Future<Output = ResolveResult<String>> + Send + 'a>> {
            Box::pin(async move {
                let key = (image.to_string(), architecture);
                self.calls.lock().unwrap().push(key.clone());
                self.digests
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| ResolveError::auth(&image.repository, "stub has no digest"))
            })
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        started: Vec<CheckTarget>,
        finished: Vec<(CheckTarget, CheckOutcome)>,
    }

    impl CheckObserver for RecordingObserver {
        fn on_check_start(&mut self, target: &CheckTarget) {
            self.started.push(target.clone());
        }

        fn on_check_finished(&mut self, target: &CheckTarget, outcome: &CheckOutcome) {
            self.finished.push((target.clone(), outcome.clone()));
        }
    }

    fn document(json: &str) -> ManifestDocument {
        ManifestDocument::from_json(json).unwrap()
    }

    const SINGLE: &str =
        r#"{"versions":[{"matrix":{"p":{"v1":{"image_path":"lib/x:1.0","image_hash":"abc123"}}}}]}"#;

    #[tokio::test]
    async fn test_matching_digest_passes() {
        let resolver =
            StubResolver::default().with("lib/x:1.0", Architecture::Amd64, "sha256:abc123");
        let mut observer = RecordingObserver::default();

        let report = verify(&document(SINGLE), &resolver, &mut observer).await;

        assert!(report.is_success());
        assert_eq!(report.checked, 1);
        assert_eq!(report.passed, 1);
        assert_eq!(observer.finished.len(), 1);
        assert_eq!(observer.finished[0].1, CheckOutcome::Match);
    }

    #[tokio::test]
    async fn test_only_amd64_checked_when_arm64_absent() {
        let resolver =
            StubResolver::default().with("lib/x:1.0", Architecture::Amd64, "sha256:abc123");
        let mut observer = RecordingObserver::default();

        verify(&document(SINGLE), &resolver, &mut observer).await;

        assert_eq!(
            resolver.calls(),
            vec![("lib/x:1.0".to_string(), Architecture::Amd64)]
        );
    }

    #[tokio::test]
    async fn test_mismatch_records_literal_values() {
        let resolver =
            StubResolver::default().with("lib/x:1.0", Architecture::Amd64, "sha256:def456");
        let mut observer = RecordingObserver::default();

        let report = verify(&document(SINGLE), &resolver, &mut observer).await;

        assert!(!report.is_success());
        assert_eq!(
            report.failures,
            vec![MismatchRecord {
                image: "lib/x:1.0".to_string(),
                architecture: Architecture::Amd64,
                expected: "abc123".to_string(),
                actual: "sha256:def456".to_string(),
            }]
        );
        assert_eq!(
            report.failures[0].to_string(),
            "lib/x:1.0 (amd64): expected sha256:abc123, got sha256:def456"
        );
    }

    #[tokio::test]
    async fn test_error_recorded_and_processing_continues() {
        let json = r#"{"versions":[
            {"matrix":{"p":{
                "v1":{"image_path":"lib/x:1.0","image_hash":"aaa","image_hash_arm64":"bbb"},
                "v2":{"image_path":"lib/y:2.0","image_hash":"ccc"}
            }}},
            {"matrix":{"q":{"v3":{"image_path":"lib/z:3.0","image_hash_arm64":"ddd"}}}}
        ]}"#;
        // lib/x arm64 has no canned digest and fails
        let resolver = StubResolver::default()
            .with("lib/x:1.0", Architecture::Amd64, "sha256:aaa")
            .with("lib/y:2.0", Architecture::Amd64, "sha256:ccc")
            .with("lib/z:3.0", Architecture::Arm64, "sha256:ddd");
        let mut observer = RecordingObserver::default();

        let report = verify(&document(json), &resolver, &mut observer).await;

        assert_eq!(report.checked, 4);
        assert_eq!(report.passed, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].image, "lib/x:1.0");
        assert_eq!(report.failures[0].architecture, Architecture::Arm64);
        assert_eq!(report.failures[0].actual, ERROR_MARKER);
        assert!(matches!(observer.finished[1].1, CheckOutcome::Error { .. }));

        // Document order, amd64 before arm64
        assert_eq!(
            resolver.calls(),
            vec![
                ("lib/x:1.0".to_string(), Architecture::Amd64),
                ("lib/x:1.0".to_string(), Architecture::Arm64),
                ("lib/y:2.0".to_string(), Architecture::Amd64),
                ("lib/z:3.0".to_string(), Architecture::Arm64),
            ]
        );
        let started: Vec<_> = observer.started.iter().map(|t| t.image.as_str()).collect();
        assert_eq!(started, vec!["lib/x:1.0", "lib/x:1.0", "lib/y:2.0", "lib/z:3.0"]);
    }

    #[tokio::test]
    async fn test_both_architectures_checked_independently() {
        let json = r#"{"versions":[{"matrix":{"p":{"v1":
            {"image_path":"lib/x:1.0","image_hash":"aaa","image_hash_arm64":"bbb"}}}}]}"#;
        // amd64 mismatches, arm64 still runs and passes
        let resolver = StubResolver::default()
            .with("lib/x:1.0", Architecture::Amd64, "sha256:zzz")
            .with("lib/x:1.0", Architecture::Arm64, "sha256:bbb");
        let mut observer = RecordingObserver::default();

        let report = verify(&document(json), &resolver, &mut observer).await;

        assert_eq!(report.checked, 2);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failures[0].architecture, Architecture::Amd64);
        assert_eq!(observer.finished[1].1, CheckOutcome::Match);
    }

    #[tokio::test]
    async fn test_malformed_reference_is_an_error_entry() {
        let json =
            r#"{"versions":[{"matrix":{"p":{"v1":{"image_path":"lib/x","image_hash":"aaa"}}}}]}"#;
        let resolver = StubResolver::default();
        let mut observer = RecordingObserver::default();

        let report = verify(&document(json), &resolver, &mut observer).await;

        assert!(resolver.calls().is_empty());
        assert_eq!(report.failures[0].actual, ERROR_MARKER);
        match &observer.finished[0].1 {
            CheckOutcome::Error { message } => assert!(message.contains("Malformed")),
            other => panic!("expected error outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_record_without_image_path() {
        let json = r#"{"versions":[{"matrix":{"p":{
            "v1":{"image_path":null},
            "v2":{"image_hash":"aaa"},
            "v3":{"image_path":"lib/x:1.0","image_hash":"bbb"}
        }}}]}"#;
        let resolver =
            StubResolver::default().with("lib/x:1.0", Architecture::Amd64, "sha256:bbb");
        let mut observer = RecordingObserver::default();

        let report = verify(&document(json), &resolver, &mut observer).await;

        // v1 declares nothing to check; v2 fails without stopping v3
        assert_eq!(report.checked, 2);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failures[0].image, "");
        assert_eq!(report.failures[0].actual, ERROR_MARKER);
        assert_eq!(
            resolver.calls(),
            vec![("lib/x:1.0".to_string(), Architecture::Amd64)]
        );
    }

    #[tokio::test]
    async fn test_empty_hashes_run_no_checks() {
        let json = r#"{"versions":[{"matrix":{"p":{"v1":
            {"image_path":"lib/x:1.0","image_hash":"","image_hash_arm64":null}}}}]}"#;
        let resolver = StubResolver::default();
        let mut observer = RecordingObserver::default();

        let report = verify(&document(json), &resolver, &mut observer).await;

        assert!(report.is_success());
        assert_eq!(report.checked, 0);
        assert!(observer.started.is_empty());
    }

    #[test]
    fn test_compare_requires_prefix() {
        assert_eq!(compare("abc", "sha256:abc"), CheckOutcome::Match);
        assert_eq!(
            compare("abc", "abc"),
            CheckOutcome::Mismatch {
                actual: "abc".to_string()
            }
        );
        assert_eq!(
            compare("abc", "sha512:abc"),
            CheckOutcome::Mismatch {
                actual: "sha512:abc".to_string()
            }
        );
    }

    #[test]
    fn test_report_serializes() {
        let report = VerificationReport {
            checked: 1,
            passed: 0,
            failures: vec![MismatchRecord {
                image: "lib/x:1.0".to_string(),
                architecture: Architecture::Arm64,
                expected: "abc".to_string(),
                actual: ERROR_MARKER.to_string(),
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failures"][0]["architecture"], "arm64");
        assert_eq!(json["failures"][0]["actual"], "ERROR");
    }
}
