use crate::core::Storage;
use crate::utils::error::Result;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(".".to_string())
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        // 絕對路徑 join 後會直接取代 base_path
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_relative_and_absolute() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{}").unwrap();

        let dir = file.path().parent().unwrap().to_str().unwrap().to_string();
        let name = file.path().file_name().unwrap().to_str().unwrap().to_string();

        let storage = LocalStorage::new(dir);
        let data = tokio_test::block_on(storage.read_file(&name)).unwrap();
        assert_eq!(data, b"{}");

        let absolute = file.path().to_str().unwrap().to_string();
        let data = tokio_test::block_on(LocalStorage::default().read_file(&absolute)).unwrap();
        assert_eq!(data, b"{}");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let storage = LocalStorage::new("/definitely/not/here".to_string());
        let err = storage.read_file("pipeline.json").await.unwrap_err();
        assert!(matches!(err, crate::utils::error::RiskError::IoError(_)));
    }
}
