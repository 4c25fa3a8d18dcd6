//! Default failure reporter.

use snare_core::{FailureCause, FailureReporter, HookFailure};

/// A reporter that logs failures through `tracing`.
///
/// Engine refusals are logged at `warn`, callback faults at `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, failure: HookFailure) {
        let member = failure.member.as_ref().map(ToString::to_string);
        let identity = failure.identity.as_deref();
        match &failure.cause {
            FailureCause::Attach(error) => tracing::warn!(
                stage = %failure.stage,
                member = member.as_deref(),
                identity,
                %error,
                "hook not attached"
            ),
            FailureCause::Callback(error) => tracing::error!(
                stage = %failure.stage,
                member = member.as_deref(),
                identity,
                %error,
                "hook callback failed"
            ),
        }
    }
}
