use crate::domain::ports::CarrierSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Reads a saved companion API `/fleetcarrier` response from disk.
#[derive(Debug, Clone)]
pub struct FileCarrierSource {
    path: PathBuf,
}

impl FileCarrierSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CarrierSource for FileCarrierSource {
    async fn fetch(&self) -> Result<serde_json::Value> {
        let data = tokio::fs::read(&self.path).await?;
        let payload = serde_json::from_slice(&data)?;
        Ok(payload)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::CargoError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_fetch_reads_json_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(br#"{"name": {"callsign": "K7Q-BQL"}, "cargo": []}"#)
            .unwrap();

        let source = FileCarrierSource::new(temp_file.path());
        let payload = tokio_test::block_on(source.fetch()).unwrap();

        assert_eq!(payload["name"]["callsign"], "K7Q-BQL");
    }

    #[test]
    fn test_fetch_reports_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"{ not json").unwrap();

        let source = FileCarrierSource::new(temp_file.path());
        let err = tokio_test::block_on(source.fetch()).unwrap_err();

        assert!(matches!(err, CargoError::SerializationError(_)));
    }

    #[test]
    fn test_fetch_reports_missing_file() {
        let source = FileCarrierSource::new("/definitely/not/here.json");
        let err = tokio_test::block_on(source.fetch()).unwrap_err();
        assert!(matches!(err, CargoError::IoError(_)));
    }
}
