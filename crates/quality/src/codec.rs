//! Document decoding.
//!
//! Encoding lives on the entities themselves (`to_document`). Decoding needs
//! the registry to map type tags back to kinds, and the blob store to reopen
//! the target's files.

use std::collections::HashMap;
use std::sync::Arc;

use dcqc_core::{QcError, Result, TargetDocument, TestDocument};
use dcqc_storage::BlobStore;

use crate::qc_test::QcTest;
use crate::registry::Registry;
use crate::target::QcTarget;

/// Rebuilds targets and tests from their documents.
///
/// Targets are cached by uri, so tests decoded by the same decoder share one
/// target instance when their embedded target documents agree.
pub struct Decoder<'a> {
    registry: &'a Registry,
    store: Arc<dyn BlobStore>,
    targets: HashMap<String, Arc<QcTarget>>,
}

impl<'a> Decoder<'a> {
    /// Create a decoder over `registry`.
    pub fn new(registry: &'a Registry, store: Arc<dyn BlobStore>) -> Self {
        Self {
            registry,
            store,
            targets: HashMap::new(),
        }
    }

    /// Decode a target document.
    pub async fn target(&mut self, doc: &TargetDocument) -> Result<Arc<QcTarget>> {
        let kind = self.registry.target_kind(&doc.kind)?;
        for file in doc.files.iter().flatten() {
            self.registry.file_kind(&file.kind)?;
        }

        if let Some(cached) = self.targets.get(&doc.uri) {
            if cached.kind() == kind && cached.metadata() == &doc.metadata {
                return Ok(Arc::clone(cached));
            }
        }

        let target = Arc::new(
            QcTarget::open(kind, doc.uri.clone(), doc.metadata.clone(), Arc::clone(&self.store))
                .await?,
        );
        self.targets.insert(doc.uri.clone(), Arc::clone(&target));
        Ok(target)
    }

    /// Decode a test document with its embedded target.
    pub async fn test(&mut self, doc: &TestDocument) -> Result<QcTest> {
        // Resolve the tag first so unknown types fail before any storage access
        self.registry.check(&doc.kind)?;
        let target_doc = doc.target.as_ref().ok_or_else(|| {
            QcError::Validation(format!("{} document has no embedded target", doc.kind))
        })?;
        let target = self.target(target_doc).await?;
        self.test_for(doc, target)
    }

    /// Decode a test document against an already known target.
    pub fn test_for(&self, doc: &TestDocument, target: Arc<QcTarget>) -> Result<QcTest> {
        let check = self.registry.check(&doc.kind)?;
        if let Some(tier) = doc.tier.filter(|t| *t != check.tier()) {
            tracing::debug!(
                "{} document records tier {}, registry says {}",
                doc.kind,
                tier,
                check.tier()
            );
        }

        let mut test = QcTest::new(check, target, doc.config.clone())?;
        test.set_status(doc.status.unwrap_or_default());
        Ok(test)
    }

    /// Decode a raw JSON test document.
    pub async fn test_value(&mut self, value: serde_json::Value) -> Result<QcTest> {
        let doc: TestDocument = serde_json::from_value(value)?;
        self.test(&doc).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{FILE_EXTENSION, FILE_EXTENSIONS_KEY, LIB_TIFF_INFO, MD5_CHECKSUM};
    use crate::testutil::{to_metadata, Fixture};
    use dcqc_core::TestStatus;
    use serde_json::json;

    #[tokio::test]
    async fn test_target_round_trip() {
        let fixture = Fixture::new().await;
        let registry = Registry::builtin();
        let target = fixture
            .target("syn5", "a.ome.tif", b"x", json!({"file_type": "ome.tif", "batch": 7, "note": null}))
            .await;

        for expanded in [false, true] {
            let doc = target.to_document(expanded);
            let json = serde_json::to_string(&doc).unwrap();
            let parsed: TargetDocument = serde_json::from_str(&json).unwrap();

            let mut decoder = Decoder::new(&registry, fixture.store());
            let decoded = decoder.target(&parsed).await.unwrap();
            assert_eq!(decoded.uri(), target.uri());
            assert_eq!(decoded.name(), target.name());
            assert_eq!(decoded.metadata(), target.metadata());
            assert_eq!(decoded.file().filename(), "a.ome.tif");
        }
    }

    #[tokio::test]
    async fn test_test_round_trip_every_variant() {
        let fixture = Fixture::new().await;
        let registry = Registry::builtin();
        let target = fixture.target("syn5", "a.tif", b"x", json!({"file_type": "tif"})).await;

        for (i, name) in registry.check_names().into_iter().enumerate() {
            let config = if name == FILE_EXTENSION {
                to_metadata(json!({ FILE_EXTENSIONS_KEY: [".tif"] }))
            } else {
                to_metadata(json!({}))
            };
            let mut test = QcTest::new(registry.check(name).unwrap(), target.clone(), config).unwrap();
            let status = [TestStatus::Unknown, TestStatus::Pass, TestStatus::Fail][i % 3];
            test.set_status(status);

            let value = serde_json::to_value(test.to_document(true, true)).unwrap();
            let mut decoder = Decoder::new(&registry, fixture.store());
            let decoded = decoder.test_value(value).await.unwrap();

            assert_eq!(decoded.name(), name);
            assert_eq!(decoded.tier(), test.tier());
            assert_eq!(decoded.config(), test.config());
            assert_eq!(decoded.status(), status);
            assert_eq!(decoded.target().uri(), "syn://syn5");
            assert_eq!(decoded.target().metadata(), target.metadata());
        }
    }

    #[tokio::test]
    async fn test_absent_status_decodes_unknown() {
        let fixture = Fixture::new().await;
        fixture.put("syn5", "a.tif", b"x").await;
        let registry = Registry::builtin();

        let mut decoder = Decoder::new(&registry, fixture.store());
        let test = decoder
            .test_value(json!({
                "type": MD5_CHECKSUM,
                "config": {},
                "target": {"type": "FileQcTarget", "uri": "syn://syn5", "metadata": {}},
            }))
            .await
            .unwrap();
        assert_eq!(test.status(), TestStatus::Unknown);
        assert!(test.is_internal());
    }

    #[tokio::test]
    async fn test_unknown_tags_rejected() {
        let fixture = Fixture::new().await;
        fixture.put("syn5", "a.tif", b"x").await;
        let registry = Registry::builtin();
        let mut decoder = Decoder::new(&registry, fixture.store());

        let err = decoder
            .test_value(json!({
                "type": "JpegQcTest",
                "config": {},
                "target": {"type": "FileQcTarget", "uri": "syn://syn5", "metadata": {}},
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, QcError::UnknownType(_)));

        let err = decoder
            .test_value(json!({
                "type": LIB_TIFF_INFO,
                "config": {},
                "target": {"type": "FolderQcTarget", "uri": "syn://syn5", "metadata": {}},
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, QcError::UnknownType(_)));
    }

    #[tokio::test]
    async fn test_missing_target_rejected() {
        let fixture = Fixture::new().await;
        let registry = Registry::builtin();
        let mut decoder = Decoder::new(&registry, fixture.store());

        let err = decoder
            .test_value(json!({"type": LIB_TIFF_INFO, "config": {}}))
            .await
            .unwrap_err();
        assert!(matches!(err, QcError::Validation(_)));
    }

    #[tokio::test]
    async fn test_tests_share_decoded_target() {
        let fixture = Fixture::new().await;
        let registry = Registry::builtin();
        let target = fixture.target("syn5", "a.tif", b"x", json!({"file_type": "tif"})).await;
        let first = QcTest::new(registry.check(MD5_CHECKSUM).unwrap(), target.clone(), to_metadata(json!({}))).unwrap();
        let second = QcTest::new(registry.check(LIB_TIFF_INFO).unwrap(), target, to_metadata(json!({}))).unwrap();

        let mut decoder = Decoder::new(&registry, fixture.store());
        let a = decoder.test(&first.to_document(true, true)).await.unwrap();
        let b = decoder.test(&second.to_document(true, true)).await.unwrap();
        assert!(Arc::ptr_eq(a.target(), b.target()));
    }
}
