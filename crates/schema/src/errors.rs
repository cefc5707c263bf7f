use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Data URI must start with `data:`")]
    MissingDataPrefix,

    #[error("Data URI has no `,` separating header and payload")]
    MissingPayload,

    #[error("Data URI payload is not base64 encoded (header `{0}`)")]
    NotBase64(String),

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}
