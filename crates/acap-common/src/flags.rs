//! Baseline platform flags.
//!
//! Baseline flags are cheap, already-known booleans describing coarse platform
//! capabilities. They are checked before any probe runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One baseline flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineFlag {
    /// The runtime offers asynchronous completion primitives.
    Promises,
    /// The runtime offers typed sample arrays.
    TypedArrays,
    /// An audio API is present at all.
    WebAudio,
}

impl BaselineFlag {
    /// All flags in evaluation order.
    pub const ALL: [BaselineFlag; 3] = [
        BaselineFlag::Promises,
        BaselineFlag::TypedArrays,
        BaselineFlag::WebAudio,
    ];
}

impl fmt::Display for BaselineFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineFlag::Promises => write!(f, "promises"),
            BaselineFlag::TypedArrays => write!(f, "typed_arrays"),
            BaselineFlag::WebAudio => write!(f, "web_audio"),
        }
    }
}

/// Snapshot of all baseline flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineFlags {
    pub promises: bool,
    pub typed_arrays: bool,
    pub web_audio: bool,
}

impl BaselineFlags {
    /// Every baseline capability present.
    pub fn all_present() -> Self {
        BaselineFlags {
            promises: true,
            typed_arrays: true,
            web_audio: true,
        }
    }

    /// Value of a single flag.
    pub fn get(&self, flag: BaselineFlag) -> bool {
        match flag {
            BaselineFlag::Promises => self.promises,
            BaselineFlag::TypedArrays => self.typed_arrays,
            BaselineFlag::WebAudio => self.web_audio,
        }
    }

    /// First flag (in evaluation order) that is false, if any.
    pub fn first_missing(&self) -> Option<BaselineFlag> {
        BaselineFlag::ALL.into_iter().find(|flag| !self.get(*flag))
    }

    /// Logical AND of all flags.
    pub fn all(&self) -> bool {
        self.first_missing().is_none()
    }
}

impl Default for BaselineFlags {
    fn default() -> Self {
        Self::all_present()
    }
}

/// Supplier of baseline flags.
///
/// Implementations must be cheap and synchronous; the engine reads them
/// exactly once per evaluation, before any probe runs.
pub trait FeatureFlagSource: Send + Sync {
    fn baseline(&self) -> BaselineFlags;
}

impl FeatureFlagSource for BaselineFlags {
    fn baseline(&self) -> BaselineFlags {
        *self
    }
}
