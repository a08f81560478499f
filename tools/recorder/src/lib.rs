//! Record/replay verification for test doubles.
//!
//! Arrange expectations by calling a mock while it records, then exercise the
//! real code path: every call made during replay is checked, in order,
//! against what was recorded.
//!
//! ```
//! use recorder::{Recorder, RecorderError};
//! use serde_json::json;
//!
//! let r = Recorder::named("f");
//! let ret = r.record_with(|r| r.call(vec![json!(1), json!(2), json!(3)]))?;
//! assert_eq!(r.call(vec![json!(1), json!(2), json!(3)])?, ret);
//!
//! r.record_with(|r| r.call(vec![json!(1), json!(2), json!(3)]))?;
//! let err = r.call(vec![json!(2), json!(3), json!(4)]).unwrap_err();
//! assert_eq!(err.to_string(), "Expected call: f(1, 2, 3)\nActual call: f(2, 3, 4)");
//! # Ok::<(), RecorderError>(())
//! ```

pub mod config;
pub mod errors;
pub mod logging;
pub mod mock;
pub mod recorder;
pub mod runtime;
pub mod scope;
pub mod signature;
pub mod transcript;
pub mod types;

pub use config::{load_config, parse_config, RecorderConfig};
pub use errors::RecorderError;
pub use mock::{Mock, MockPrimitive};
pub use recorder::{Recorder, Returned};
pub use scope::RecordScope;
pub use signature::{Param, Signature};
pub use transcript::Transcript;
pub use types::{Call, CallKey, Kwargs, Mode};
