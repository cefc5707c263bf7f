use crate::SchemaError;
use base64::{Engine, engine::general_purpose::STANDARD};

const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Wrap JPEG bytes as `data:image/jpeg;base64,...`.
pub fn encode_jpeg_data_uri(jpeg: &[u8]) -> String {
    let mut uri = String::with_capacity(JPEG_DATA_URI_PREFIX.len() + jpeg.len().div_ceil(3) * 4);
    uri.push_str(JPEG_DATA_URI_PREFIX);
    STANDARD.encode_string(jpeg, &mut uri);
    uri
}

/// Extract the binary payload of a base64 data URI. The declared media type is
/// not checked; callers decode the bytes and find out.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, SchemaError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or(SchemaError::MissingDataPrefix)?;
    let (header, payload) = rest.split_once(',').ok_or(SchemaError::MissingPayload)?;

    if !header.ends_with(";base64") {
        return Err(SchemaError::NotBase64(format!("data:{header}")));
    }

    Ok(STANDARD.decode(payload.trim())?)
}
