//! Scoped record/replay helpers.
//!
//! `RecordScope` stops the tree when dropped, so a panic inside a recorded
//! block still leaves every node replaying.

use crate::errors::RecorderError;
use crate::mock::MockPrimitive;
use crate::recorder::Recorder;
use std::ops::Deref;

#[must_use = "the tree switches to replay as soon as the scope is dropped"]
pub struct RecordScope<'a, M: MockPrimitive> {
    recorder: &'a Recorder<M>,
}

impl<M: MockPrimitive> Deref for RecordScope<'_, M> {
    type Target = Recorder<M>;

    fn deref(&self) -> &Self::Target {
        self.recorder
    }
}

impl<M: MockPrimitive> Drop for RecordScope<'_, M> {
    fn drop(&mut self) {
        self.recorder.stop();
    }
}

impl<M: MockPrimitive> Recorder<M> {
    pub fn recording(&self) -> RecordScope<'_, M> {
        self.record();
        RecordScope { recorder: self }
    }

    pub fn record_with<T>(&self, f: impl FnOnce(&Self) -> T) -> T {
        let _scope = self.recording();
        f(self)
    }

    /// Run `f` against a replaying tree, then require that every recorded
    /// call was consumed. An error from `f` is returned before the
    /// completion check runs.
    pub fn replay_with<T>(
        &self,
        f: impl FnOnce(&Self) -> Result<T, RecorderError>,
    ) -> Result<T, RecorderError> {
        if self.is_recording() {
            return Err(RecorderError::Usage(format!(
                "replay_with on `{}` while it is still recording",
                self.name()
            )));
        }
        let value = f(self)?;
        self.check_missing_calls()?;
        Ok(value)
    }
}
