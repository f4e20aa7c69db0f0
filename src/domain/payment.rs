use super::errors::DomainError;

/// Largest accepted payment proof, 8 MiB.
pub const MAX_PROOF_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    pub fn from_mime(mime: &str) -> Result<Self, DomainError> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(ImageKind::Jpeg),
            "image/png" => Ok(ImageKind::Png),
            "image/webp" => Ok(ImageKind::Webp),
            _ => Err(DomainError::UnsupportedProofType(mime.to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Webp => "webp",
        }
    }
}

/// Uploaded evidence of a mobile-money transfer.
#[derive(Debug, Clone)]
pub struct ProofImage {
    pub kind: ImageKind,
    pub bytes: Vec<u8>,
}

impl ProofImage {
    pub fn new(content_type: &str, bytes: Vec<u8>) -> Result<Self, DomainError> {
        let kind = ImageKind::from_mime(content_type)?;
        if bytes.is_empty() {
            return Err(DomainError::InvalidInput(
                "please select an image to upload".to_string(),
            ));
        }
        if bytes.len() > MAX_PROOF_BYTES {
            return Err(DomainError::ProofTooLarge {
                max: MAX_PROOF_BYTES,
            });
        }
        Ok(Self { kind, bytes })
    }
}
