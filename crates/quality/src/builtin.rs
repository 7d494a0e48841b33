//! Built-in checks (file extension, MD5 checksum, TIFF and OME validators).

use std::path::Path;

use async_trait::async_trait;
use dcqc_core::{CommandDocument, Metadata, QcConfig, QcError, Result};
use md5::{Digest, Md5};
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::checks::{Check, CheckSpec, ExternalCheck, InternalCheck};
use crate::target::QcTarget;

/// Tag of [`FileExtensionCheck`].
pub const FILE_EXTENSION: &str = "FileExtensionQcTest";
/// Tag of [`Md5ChecksumCheck`].
pub const MD5_CHECKSUM: &str = "Md5ChecksumQcTest";
/// Tag of [`LibTiffInfoCheck`].
pub const LIB_TIFF_INFO: &str = "LibTiffInfoQcTest";
/// Tag of [`BioFormatsInfoCheck`].
pub const BIO_FORMATS_INFO: &str = "BioFormatsInfoQcTest";
/// Tag of [`OmeXmlSchemaCheck`].
pub const OME_XML_SCHEMA: &str = "OmeXmlSchemaQcTest";

/// Config key listing accepted filename suffixes.
pub const FILE_EXTENSIONS_KEY: &str = "file_extensions";
/// Metadata key holding the expected MD5 digest.
pub const MD5_CHECKSUM_KEY: &str = "md5_checksum";

const CHUNK_SIZE: usize = 4096;
const LIBTIFF_IMAGE: &str = "autamus/libtiff:4.4.0";
const BFTOOLS_IMAGE: &str = "openmicroscopy/bftools:latest";
const BFTOOLS_PATH: &str = r#"export PATH="/opt/bftools:$PATH";"#;

/// Every built-in check.
pub fn builtin_checks() -> Vec<Check> {
    vec![
        Check::internal(FileExtensionCheck),
        Check::internal(Md5ChecksumCheck),
        Check::external(LibTiffInfoCheck),
        Check::external(BioFormatsInfoCheck),
        Check::external(OmeXmlSchemaCheck),
    ]
}

/// Filename ends with one of the configured suffixes.
pub struct FileExtensionCheck;

impl FileExtensionCheck {
    fn extensions(config: &Metadata) -> Result<Vec<&str>> {
        let missing = || {
            QcError::Configuration(format!(
                "Configure {} with a non-empty `{}` list",
                FILE_EXTENSION, FILE_EXTENSIONS_KEY
            ))
        };
        let values = config
            .get(FILE_EXTENSIONS_KEY)
            .and_then(|v| v.as_array())
            .ok_or_else(missing)?;

        let extensions = values
            .iter()
            .map(|v| v.as_str().filter(|s| !s.is_empty()))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(missing)?;
        if extensions.is_empty() {
            return Err(missing());
        }
        Ok(extensions)
    }
}

impl CheckSpec for FileExtensionCheck {
    fn name(&self) -> &'static str {
        FILE_EXTENSION
    }

    fn tier(&self) -> u32 {
        1
    }

    fn validate_config(&self, config: &Metadata) -> Result<()> {
        Self::extensions(config).map(|_| ())
    }
}

#[async_trait]
impl InternalCheck for FileExtensionCheck {
    async fn run(&self, target: &QcTarget, config: &Metadata, _settings: &QcConfig) -> Result<bool> {
        let extensions = Self::extensions(config)?;
        let filename = target.file().filename();
        Ok(extensions.iter().any(|ext| filename.ends_with(ext)))
    }
}

/// Staged bytes hash to the digest recorded in the target metadata.
pub struct Md5ChecksumCheck;

impl CheckSpec for Md5ChecksumCheck {
    fn name(&self) -> &'static str {
        MD5_CHECKSUM
    }

    fn tier(&self) -> u32 {
        1
    }
}

#[async_trait]
impl InternalCheck for Md5ChecksumCheck {
    async fn run(&self, target: &QcTarget, _config: &Metadata, settings: &QcConfig) -> Result<bool> {
        let staged = target.file().stage(&settings.staging_dir).await?;
        let actual = md5_hex(&staged).await?;

        let Some(expected) = target.get_metadata(MD5_CHECKSUM_KEY).and_then(|v| v.as_str()) else {
            tracing::warn!("Target {} has no `{}`; failing checksum", target.name(), MD5_CHECKSUM_KEY);
            return Ok(false);
        };

        tracing::debug!("MD5 of {}: expected {}, actual {}", staged.display(), expected, actual);
        Ok(actual == expected)
    }
}

/// Lowercase hex MD5 of a file, read in fixed-size blocks.
pub async fn md5_hex(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// `tiffinfo` accepts the file.
pub struct LibTiffInfoCheck;

impl CheckSpec for LibTiffInfoCheck {
    fn name(&self) -> &'static str {
        LIB_TIFF_INFO
    }

    fn tier(&self) -> u32 {
        2
    }
}

impl ExternalCheck for LibTiffInfoCheck {
    fn prepare(&self, target: &QcTarget, _config: &Metadata) -> Result<CommandDocument> {
        Ok(CommandDocument {
            execution_environment: LIBTIFF_IMAGE.to_string(),
            command_string: format!("tiffinfo {}", quoted(target.file().filename())),
        })
    }
}

/// Bio-Formats `showinf` can read the file metadata.
pub struct BioFormatsInfoCheck;

impl CheckSpec for BioFormatsInfoCheck {
    fn name(&self) -> &'static str {
        BIO_FORMATS_INFO
    }

    fn tier(&self) -> u32 {
        2
    }
}

impl ExternalCheck for BioFormatsInfoCheck {
    fn prepare(&self, target: &QcTarget, _config: &Metadata) -> Result<CommandDocument> {
        Ok(CommandDocument {
            execution_environment: BFTOOLS_IMAGE.to_string(),
            command_string: format!(
                "{} showinf -nopix -novalid -nocore {}",
                BFTOOLS_PATH,
                quoted(target.file().filename())
            ),
        })
    }
}

/// Embedded OME-XML validates against its schema.
pub struct OmeXmlSchemaCheck;

impl CheckSpec for OmeXmlSchemaCheck {
    fn name(&self) -> &'static str {
        OME_XML_SCHEMA
    }

    fn tier(&self) -> u32 {
        2
    }
}

impl ExternalCheck for OmeXmlSchemaCheck {
    fn prepare(&self, target: &QcTarget, _config: &Metadata) -> Result<CommandDocument> {
        Ok(CommandDocument {
            execution_environment: BFTOOLS_IMAGE.to_string(),
            command_string: format!("{} xmlvalid {}", BFTOOLS_PATH, quoted(target.file().filename())),
        })
    }
}

/// Double-quote a word for a POSIX shell.
fn quoted(word: &str) -> String {
    let mut out = String::with_capacity(word.len() + 2);
    out.push('"');
    for c in word.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CommandLogs;
    use crate::testutil::{to_metadata, Fixture};
    use serde_json::json;

    fn extensions(list: &[&str]) -> Metadata {
        to_metadata(json!({ FILE_EXTENSIONS_KEY: list }))
    }

    #[tokio::test]
    async fn test_extension_match() {
        let fixture = Fixture::new().await;
        let config = extensions(&[".tif", ".tiff"]);

        let target = fixture.target("syn1", "a.ome.tiff", b"x", json!({})).await;
        let passed = FileExtensionCheck.run(&target, &config, &fixture.config()).await.unwrap();
        assert!(passed);

        let target = fixture.target("syn2", "a.png", b"x", json!({})).await;
        let passed = FileExtensionCheck.run(&target, &config, &fixture.config()).await.unwrap();
        assert!(!passed);
    }

    #[tokio::test]
    async fn test_extension_is_case_sensitive() {
        let fixture = Fixture::new().await;
        let target = fixture.target("syn1", "A.TIF", b"x", json!({})).await;
        let passed = FileExtensionCheck
            .run(&target, &extensions(&[".tif"]), &fixture.config())
            .await
            .unwrap();
        assert!(!passed);
    }

    #[test]
    fn test_extension_config_required() {
        assert!(matches!(
            FileExtensionCheck.validate_config(&Metadata::new()),
            Err(QcError::Configuration(_))
        ));
        assert!(matches!(
            FileExtensionCheck.validate_config(&extensions(&[])),
            Err(QcError::Configuration(_))
        ));
        assert!(matches!(
            FileExtensionCheck.validate_config(&to_metadata(json!({ FILE_EXTENSIONS_KEY: ".tif" }))),
            Err(QcError::Configuration(_))
        ));
        assert!(FileExtensionCheck.validate_config(&extensions(&[".txt"])).is_ok());
    }

    #[tokio::test]
    async fn test_md5_hex_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello world").await.unwrap();
        assert_eq!(md5_hex(&path).await.unwrap(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[tokio::test]
    async fn test_md5_hex_spans_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zeros.bin");
        fs::write(&path, vec![0u8; CHUNK_SIZE * 2 + 17]).await.unwrap();

        let mut hasher = Md5::new();
        hasher.update(vec![0u8; CHUNK_SIZE * 2 + 17]);
        assert_eq!(md5_hex(&path).await.unwrap(), format!("{:x}", hasher.finalize()));
    }

    #[tokio::test]
    async fn test_checksum_pass_and_corruption() {
        let fixture = Fixture::new().await;
        let good = fixture
            .target(
                "syn1",
                "hello.txt",
                b"hello world",
                json!({ MD5_CHECKSUM_KEY: "5eb63bbbe01eeed093cb22bb8f5acdc3" }),
            )
            .await;
        let passed = Md5ChecksumCheck.run(&good, &Metadata::new(), &fixture.config()).await.unwrap();
        assert!(passed);
        assert!(fixture.staging().join("hello.txt").exists());

        let corrupted = fixture
            .target(
                "syn2",
                "hello2.txt",
                b"hello world",
                json!({ MD5_CHECKSUM_KEY: "5eb63bbbe01eeed093cb22bb8f5acdc4" }),
            )
            .await;
        let passed = Md5ChecksumCheck.run(&corrupted, &Metadata::new(), &fixture.config()).await.unwrap();
        assert!(!passed);
    }

    #[tokio::test]
    async fn test_checksum_without_expected_digest_fails() {
        let fixture = Fixture::new().await;
        let target = fixture.target("syn1", "hello.txt", b"hello world", json!({})).await;
        let passed = Md5ChecksumCheck.run(&target, &Metadata::new(), &fixture.config()).await.unwrap();
        assert!(!passed);
    }

    #[tokio::test]
    async fn test_external_commands() {
        let fixture = Fixture::new().await;
        let target = fixture.target("syn1", "cells.ome.tif", b"x", json!({})).await;

        let cmd = LibTiffInfoCheck.prepare(&target, &Metadata::new()).unwrap();
        assert_eq!(cmd.execution_environment, "autamus/libtiff:4.4.0");
        assert_eq!(cmd.command_string, r#"tiffinfo "cells.ome.tif""#);

        let cmd = BioFormatsInfoCheck.prepare(&target, &Metadata::new()).unwrap();
        assert_eq!(cmd.execution_environment, "openmicroscopy/bftools:latest");
        assert_eq!(
            cmd.command_string,
            r#"export PATH="/opt/bftools:$PATH"; showinf -nopix -novalid -nocore "cells.ome.tif""#
        );

        let cmd = OmeXmlSchemaCheck.prepare(&target, &Metadata::new()).unwrap();
        assert_eq!(
            cmd.command_string,
            r#"export PATH="/opt/bftools:$PATH"; xmlvalid "cells.ome.tif""#
        );
    }

    #[test]
    fn test_quoted_escapes_shell_specials() {
        assert_eq!(quoted("plain.tif"), r#""plain.tif""#);
        assert_eq!(quoted(r#"a"$b`.tif"#), r#""a\"\$b\`.tif""#);
    }

    #[test]
    fn test_interpret_by_exit_code() {
        let logs = |code: &str| CommandLogs {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: code.to_string(),
        };
        assert!(LibTiffInfoCheck.interpret(&logs("0\n")));
        assert!(!LibTiffInfoCheck.interpret(&logs("1")));
        assert!(!OmeXmlSchemaCheck.interpret(&logs("not a number")));
    }

    #[test]
    fn test_builtin_tiers() {
        let checks = builtin_checks();
        let tiers: Vec<_> = checks.iter().map(|c| (c.name(), c.tier(), c.is_internal())).collect();
        assert_eq!(
            tiers,
            vec![
                (FILE_EXTENSION, 1, true),
                (MD5_CHECKSUM, 1, true),
                (LIB_TIFF_INFO, 2, false),
                (BIO_FORMATS_INFO, 2, false),
                (OME_XML_SCHEMA, 2, false),
            ]
        );
    }
}
