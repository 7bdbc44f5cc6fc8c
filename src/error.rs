use thiserror::Error;

use crate::search::filters::MultiFieldKind;

/// Failures talking to the question catalog API.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{procedure} returned HTTP {status}: {body}")]
    Http {
        procedure: String,
        status: u16,
        body: String,
    },

    #[error("request to {procedure} failed: {source}")]
    Transport {
        procedure: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not encode {procedure} input: {source}")]
    Encode {
        procedure: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not decode {procedure} response: {source}")]
    Decode {
        procedure: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{procedure} failed: {message}")]
    Procedure { procedure: String, message: String },
}

/// A filter action that names an option outside the field's domain.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("unknown {field} option: {token:?}")]
    UnknownOption { field: MultiFieldKind, token: String },
}
