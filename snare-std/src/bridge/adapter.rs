//! Adaptation of author callbacks into the engine's callback shape.
//!
//! Every fault raised by an author callback stops here: the frame is put
//! back the way it was before the callback ran, the failure is reported,
//! and the intercepted call carries on as if that callback did not exist.

use snare_core::{
    BoxError, CallFrame, FailureCause, FailureReporter, HookCallback, HookError, HookFailure,
    HookMode, NativeCallback, ResolvedMember, Stage,
};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

/// A [`HookCallback`] bound to one member, as handed to the engine.
pub(crate) struct CallbackAdapter {
    callback: HookCallback,
    member: ResolvedMember,
    identity: Option<String>,
    reporter: Arc<dyn FailureReporter>,
}

impl CallbackAdapter {
    pub(crate) fn new(
        callback: HookCallback,
        member: ResolvedMember,
        identity: Option<String>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        Self {
            callback,
            member,
            identity,
            reporter,
        }
    }

    /// Run `f` on `frame`, undoing its effects if it fails.
    fn guarded<T>(
        &self,
        stage: Stage,
        frame: &mut CallFrame,
        f: impl FnOnce(&mut CallFrame) -> Result<T, BoxError>,
    ) -> Option<T> {
        let snapshot = frame.snapshot();
        let error = match panic::catch_unwind(AssertUnwindSafe(|| f(&mut *frame))) {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(e)) => HookError::Custom(e),
            Err(payload) => HookError::from_panic(payload),
        };
        frame.restore(snapshot);
        self.reporter.report(HookFailure {
            stage,
            member: Some(self.member.clone()),
            identity: self.identity.clone(),
            cause: FailureCause::Callback(error),
        });
        None
    }
}

impl NativeCallback for CallbackAdapter {
    fn before(&self, frame: &mut CallFrame) {
        match self.callback.mode() {
            HookMode::Before(f) => {
                self.guarded(Stage::Before, frame, |frame| f(frame));
            }
            HookMode::Replace(f) => {
                // A higher priority replacement or Before already produced the result.
                if frame.is_returned_early() {
                    return;
                }
                if let Some(value) = self.guarded(Stage::Replace, frame, |frame| f(frame)) {
                    frame.set_result(value);
                }
            }
            HookMode::After(_) => {}
        }
    }

    fn after(&self, frame: &mut CallFrame) {
        if let HookMode::After(f) = self.callback.mode() {
            self.guarded(Stage::After, frame, |frame| f(frame));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingReporter;
    use snare_core::{MemberId, Modifiers, TypeRef, Value};

    fn member() -> ResolvedMember {
        ResolvedMember::method(
            TypeRef::new("com.example.Foo"),
            "greet",
            vec![TypeRef::new("java.lang.String")],
            TypeRef::new("java.lang.String"),
            Modifiers::PUBLIC,
            MemberId(1),
        )
    }

    fn adapter(callback: HookCallback, reporter: &RecordingReporter) -> CallbackAdapter {
        CallbackAdapter::new(
            callback,
            member(),
            Some("app.example".into()),
            Arc::new(reporter.clone()),
        )
    }

    #[test]
    fn failing_before_restores_frame() {
        let reporter = RecordingReporter::new();
        let adapter = adapter(
            HookCallback::before(|frame| {
                frame.set_arg(0, "tampered");
                frame.set_result("forced");
                Err("bad input".into())
            }),
            &reporter,
        );
        let mut frame = CallFrame::new(member(), None, vec!["world".into()]);
        adapter.before(&mut frame);

        assert_eq!(frame.arg(0).and_then(Value::as_str), Some("world"));
        assert!(!frame.is_returned_early());
        assert_eq!(reporter.stages(), vec![Stage::Before]);
    }

    #[test]
    fn panicking_after_is_contained() {
        let reporter = RecordingReporter::new();
        let adapter = adapter(HookCallback::after(|_| panic!("after exploded")), &reporter);
        let mut frame = CallFrame::new(member(), None, vec![]);
        frame.complete("original".into());
        adapter.after(&mut frame);

        assert_eq!(frame.result().as_str(), Some("original"));
        assert_eq!(reporter.count(), 1);
        assert!(reporter.messages()[0].contains("after exploded"));
    }

    #[test]
    fn replace_skips_when_result_already_forced() {
        let reporter = RecordingReporter::new();
        let adapter = adapter(HookCallback::replace_with("mine"), &reporter);
        let mut frame = CallFrame::new(member(), None, vec![]);
        frame.set_result("theirs");
        adapter.before(&mut frame);
        assert_eq!(frame.result().as_str(), Some("theirs"));

        let mut fresh = CallFrame::new(member(), None, vec![]);
        adapter.before(&mut fresh);
        assert_eq!(fresh.result().as_str(), Some("mine"));
        assert!(fresh.is_returned_early());
        assert_eq!(reporter.count(), 0);
    }
}
