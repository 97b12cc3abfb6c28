//! Scenario and step declarations

use futures_util::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::common::Result;

use super::context::StepContext;
use super::log::Annotation;

/// Step body: called once per run, may be called again when a scenario is retried
pub type StepBody = Arc<dyn Fn(StepContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Evaluated before the body; `Some(reason)` skips the step
pub type SkipPredicate = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// A named step with its optional skip predicate and timeout
#[derive(Clone)]
pub struct StepSpec {
    pub name: String,
    pub timeout: Option<Duration>,
    skip: Option<SkipPredicate>,
    body: StepBody,
}

impl StepSpec {
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            timeout: None,
            skip: None,
            body: Arc::new(move |ctx| body(ctx).boxed()),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Skip the step whenever `predicate` returns a reason
    pub fn skip_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(predicate));
        self
    }

    /// Skip the step when `condition` is true
    pub fn skip_when(self, condition: bool, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        self.skip_if(move || condition.then(|| reason.clone()))
    }

    pub(crate) fn skip_reason(&self) -> Option<String> {
        self.skip.as_ref().and_then(|predicate| predicate())
    }

    pub(crate) fn start(&self, ctx: StepContext) -> BoxFuture<'static, Result<()>> {
        (self.body)(ctx)
    }
}

impl fmt::Debug for StepSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepSpec")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("skip", &self.skip.is_some())
            .finish_non_exhaustive()
    }
}

/// An ordered list of steps plus scenario-level metadata
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub steps: Vec<StepSpec>,
    /// Applies to steps without their own timeout
    pub default_step_timeout: Option<Duration>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            steps: Vec::new(),
            default_step_timeout: None,
        }
    }

    pub fn step(mut self, step: StepSpec) -> Self {
        self.steps.push(step);
        self
    }

    pub fn annotate(mut self, kind: impl Into<String>, description: impl Into<String>) -> Self {
        self.annotations.push(Annotation {
            kind: kind.into(),
            description: description.into(),
        });
        self
    }

    pub fn default_step_timeout(mut self, timeout: Duration) -> Self {
        self.default_step_timeout = Some(timeout);
        self
    }
}

/// Independent scenarios run one after another
#[derive(Debug, Clone)]
pub struct Suite {
    pub name: String,
    pub scenarios: Vec<Scenario>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
        }
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_when() {
        let skipped = StepSpec::new("dark mode", |_| async { Ok(()) })
            .skip_when(true, "Dark mode is not enabled");
        assert_eq!(
            skipped.skip_reason().as_deref(),
            Some("Dark mode is not enabled")
        );

        let kept = StepSpec::new("base page", |_| async { Ok(()) }).skip_when(false, "never");
        assert!(kept.skip_reason().is_none());
    }

    #[test]
    fn test_builder() {
        let scenario = Scenario::new("builder")
            .annotate("feature", "login")
            .default_step_timeout(Duration::from_secs(5))
            .step(StepSpec::new("one", |_| async { Ok(()) }))
            .step(StepSpec::new("two", |_| async { Ok(()) }).timeout(Duration::from_millis(10)));

        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(scenario.steps[1].timeout, Some(Duration::from_millis(10)));
        assert_eq!(scenario.annotations[0].kind, "feature");
        assert!(format!("{:?}", scenario.steps[0]).contains("one"));
    }
}
