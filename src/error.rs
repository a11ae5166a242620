//! Error types and status codes for DIRECT optimization.
//!
//! Status codes follow Gablonsky's DIRECT 2.0.4 convention: negative values are
//! fatal errors, positive values name the criterion that ended a successful run.

use thiserror::Error;

/// Return codes of a DIRECT run.
///
/// Negative values indicate errors, positive values indicate successful termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectReturnCode {
    /// Invalid bounds (lower >= upper for some dimension)
    InvalidBounds = -1,
    /// maxf exceeds the internal evaluation capacity
    MaxFevalTooBig = -2,
    /// Initialization failed
    InitFailed = -3,
    /// Sample points creation failed
    SamplePointsFailed = -4,
    /// Function evaluation failed
    SampleFailed = -5,
    /// Every selectable rectangle is at maximal division depth
    MaxDepthReached = -6,
    /// maxT exceeds the internal iteration capacity
    MaxIterTooBig = -7,
    /// Rectangle storage capacity exhausted
    OutOfMemory = -100,
    /// Invalid arguments
    InvalidArgs = -101,

    /// Maximum function evaluations reached
    MaxFevalExceeded = 1,
    /// Maximum iterations reached
    MaxIterExceeded = 2,
    /// Best value within fglper percent of the known global minimum
    GlobalFound = 3,
    /// Volume tolerance reached
    VolTol = 4,
    /// Sigma (measure) tolerance reached
    SigmaTol = 5,
}

impl DirectReturnCode {
    /// Returns true if this is a successful termination (positive code).
    pub fn is_success(&self) -> bool {
        (*self as i32) > 0
    }

    /// Returns true if this is an error (negative code).
    pub fn is_error(&self) -> bool {
        (*self as i32) < 0
    }

    /// Convert from the integer status code.
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::InvalidBounds),
            -2 => Some(Self::MaxFevalTooBig),
            -3 => Some(Self::InitFailed),
            -4 => Some(Self::SamplePointsFailed),
            -5 => Some(Self::SampleFailed),
            -6 => Some(Self::MaxDepthReached),
            -7 => Some(Self::MaxIterTooBig),
            -100 => Some(Self::OutOfMemory),
            -101 => Some(Self::InvalidArgs),
            1 => Some(Self::MaxFevalExceeded),
            2 => Some(Self::MaxIterExceeded),
            3 => Some(Self::GlobalFound),
            4 => Some(Self::VolTol),
            5 => Some(Self::SigmaTol),
            _ => None,
        }
    }
}

/// Errors that abort a DIRECT run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectError {
    #[error("Invalid bounds: lower bound >= upper bound in dimension {dim}")]
    InvalidBounds { dim: usize },

    #[error("Maximum function evaluations ({requested}) exceeds the limit of {limit}")]
    MaxFevalTooBig { requested: usize, limit: usize },

    #[error("Maximum iterations ({requested}) exceeds the limit of {limit}")]
    MaxIterTooBig { requested: usize, limit: usize },

    #[error("Initialization failed: {0}")]
    InitFailed(String),

    #[error("Sample points creation failed: {0}")]
    SamplePointsFailed(String),

    #[error("Function evaluation failed: {0}")]
    SampleFailed(String),

    #[error("Maximum number of levels has been reached")]
    MaxDepthReached,

    #[error("Out of memory: rectangle storage capacity of {0} exhausted")]
    OutOfMemory(usize),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),
}

impl DirectError {
    /// The negative status code corresponding to this error.
    pub fn code(&self) -> DirectReturnCode {
        match self {
            DirectError::InvalidBounds { .. } => DirectReturnCode::InvalidBounds,
            DirectError::MaxFevalTooBig { .. } => DirectReturnCode::MaxFevalTooBig,
            DirectError::MaxIterTooBig { .. } => DirectReturnCode::MaxIterTooBig,
            DirectError::InitFailed(_) => DirectReturnCode::InitFailed,
            DirectError::SamplePointsFailed(_) => DirectReturnCode::SamplePointsFailed,
            DirectError::SampleFailed(_) => DirectReturnCode::SampleFailed,
            DirectError::MaxDepthReached => DirectReturnCode::MaxDepthReached,
            DirectError::OutOfMemory(_) => DirectReturnCode::OutOfMemory,
            DirectError::InvalidArgs(_) => DirectReturnCode::InvalidArgs,
        }
    }
}

/// Result type alias for DIRECT operations.
pub type Result<T> = std::result::Result<T, DirectError>;
