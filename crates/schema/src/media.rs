/// The only media types either side accepts for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMediaType {
    Jpeg,
    Png,
}

impl ImageMediaType {
    /// Match a declared media type exactly. The bytes are never sniffed, so a
    /// PNG declared as `text/plain` is rejected and garbage declared as
    /// `image/png` is accepted here and fails later at decode time.
    pub fn from_declared(declared: &str) -> Option<Self> {
        match declared {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_exact_jpeg_and_png() {
        assert_eq!(
            ImageMediaType::from_declared("image/jpeg"),
            Some(ImageMediaType::Jpeg)
        );
        assert_eq!(
            ImageMediaType::from_declared("image/png"),
            Some(ImageMediaType::Png)
        );
    }

    #[test]
    fn test_rejects_everything_else() {
        for declared in [
            "text/plain",
            "image/jpg",
            "image/gif",
            "IMAGE/JPEG",
            "image/png; charset=binary",
            " image/png",
            "",
        ] {
            assert_eq!(
                ImageMediaType::from_declared(declared),
                None,
                "{declared:?} should be rejected"
            );
        }
    }
}
