use crate::error::ClientError;
use schema::ImageMediaType;
use std::{fs, path::Path};

/// A file picked for upload, with the media type the user (or its extension) declares.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    /// Read `path`. Without an explicit `declared` type, guess it from the extension.
    pub fn from_path(path: &Path, declared: Option<&str>) -> Result<Self, ClientError> {
        let bytes = fs::read(path).map_err(|source| ClientError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let media_type = match declared {
            Some(declared) => declared.to_string(),
            None => mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        };

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self {
            filename,
            media_type,
            bytes,
        })
    }

    /// Only JPEG and PNG leave the client.
    pub fn validate(&self) -> Result<ImageMediaType, ClientError> {
        ImageMediaType::from_declared(&self.media_type)
            .ok_or_else(|| ClientError::InvalidFileType(self.media_type.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        fs::File::create(&path).unwrap().write_all(contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_type_guessed_from_extension() {
        let (_dir, path) = write_temp("cat.JPG", b"\xFF\xD8\xFF");

        let upload = UploadedImage::from_path(&path, None).unwrap();

        assert_eq!(upload.filename, "cat.JPG");
        assert_eq!(upload.media_type, "image/jpeg");
        assert_eq!(upload.validate().unwrap(), ImageMediaType::Jpeg);
    }

    #[test]
    fn test_declared_type_wins() {
        let (_dir, path) = write_temp("scan.png", b"not really");

        let upload = UploadedImage::from_path(&path, Some("image/gif")).unwrap();

        assert_eq!(upload.media_type, "image/gif");
        assert!(matches!(
            upload.validate(),
            Err(ClientError::InvalidFileType(t)) if t == "image/gif"
        ));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let (_dir, path) = write_temp("notes.txt", b"hello");

        let upload = UploadedImage::from_path(&path, None).unwrap();

        assert_eq!(upload.media_type, "text/plain");
        assert!(upload.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = UploadedImage::from_path(Path::new("/definitely/not/here.png"), None).unwrap_err();
        assert!(matches!(err, ClientError::Read { .. }));
    }
}
