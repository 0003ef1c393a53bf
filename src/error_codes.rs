use std::fmt;

use anyhow::Error;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodedErrorKind {
    Usage,
    Format,
    UnsupportedPaletteSize,
    Decode,
    Geometry,
}

impl CodedErrorKind {
    /// Process exit status for a fatal error of this kind.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Usage | Self::UnsupportedPaletteSize => 2,
            Self::Format | Self::Decode | Self::Geometry => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CodedError {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
    pub kind: CodedErrorKind,
}

impl CodedError {
    fn new(kind: CodedErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            kind,
        }
    }

    pub fn usage(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(CodedErrorKind::Usage, code, message)
    }

    pub fn format(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(CodedErrorKind::Format, code, message)
    }

    pub fn unsupported_palette_size(message: impl Into<String>) -> Self {
        Self::new(
            CodedErrorKind::UnsupportedPaletteSize,
            "UNSUPPORTED_PALETTE_SIZE",
            message,
        )
    }

    pub fn decode(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(CodedErrorKind::Decode, code, message)
    }

    pub fn geometry(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(CodedErrorKind::Geometry, code, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            ok: false,
            error: ErrorEnvelopeBody {
                code: self.code.to_owned(),
                kind: self.kind,
                message: self.message.clone(),
                details: self.details.clone(),
            },
        }
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CodedError {}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: ErrorEnvelopeBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelopeBody {
    pub code: String,
    pub kind: CodedErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

pub fn find_coded_error(error: &Error) -> Option<&CodedError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<CodedError>())
}
