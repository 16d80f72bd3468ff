use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pathway_core::Clock;
use pathway_core::model::{CourseDescriptor, CourseId};
use pathway_core::template::{mock_completion, parse_course};

use crate::error::GenerationError;

/// Simulated generation latency used by the app.
pub const DEFAULT_GENERATION_LATENCY: Duration = Duration::from_millis(3000);

/// Produces the raw course template for a prompt.
#[async_trait]
pub trait CourseSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `GenerationError::Source` if no completion can be produced.
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Offline source that renders the built-in eight-week template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateCourseSource;

#[async_trait]
impl CourseSource for TemplateCourseSource {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        Ok(mock_completion(prompt))
    }
}

/// Turns prompts into course descriptors, one generation at a time.
#[derive(Clone)]
pub struct CourseGenerator {
    clock: Clock,
    source: Arc<dyn CourseSource>,
    latency: Duration,
    in_flight: Arc<AtomicBool>,
}

impl CourseGenerator {
    #[must_use]
    pub fn new(clock: Clock, source: Arc<dyn CourseSource>) -> Self {
        Self {
            clock,
            source,
            latency: DEFAULT_GENERATION_LATENCY,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Accept a request for `prompt` and return the placeholder descriptor
    /// shown until the modules arrive. The course id is fixed here.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::EmptyPrompt` for a blank prompt.
    pub fn prepare(&self, prompt: &str) -> Result<CourseDescriptor, GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        let course_id = CourseId::derive(prompt, self.clock.now())?;
        Ok(CourseDescriptor::placeholder(prompt, course_id)?)
    }

    /// Generate a course for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::EmptyPrompt` for a blank prompt,
    /// `GenerationError::InFlight` while another generation is running, and
    /// source or validation errors otherwise.
    pub async fn generate(&self, prompt: &str) -> Result<CourseDescriptor, GenerationError> {
        let pending = self.prepare(prompt)?;
        self.fill(pending).await
    }

    /// Fill a placeholder from `prepare` with its modules, keeping its course id.
    /// Once started, a generation always runs to completion.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::InFlight` while another generation is
    /// running, and source or validation errors otherwise.
    pub async fn fill(&self, pending: CourseDescriptor) -> Result<CourseDescriptor, GenerationError> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        let CourseDescriptor {
            prompt, course_id, ..
        } = pending;
        tracing::info!(%course_id, "generating course");

        tokio::time::sleep(self.latency).await;
        let completion = self.source.complete(&prompt).await?;
        let parsed = parse_course(&prompt, &completion);

        let course = CourseDescriptor::new(
            prompt,
            course_id,
            parsed.title,
            parsed.duration,
            parsed.modules,
        )?;
        tracing::debug!(course_id = %course.course_id, modules = course.module_count(), "course generated");
        Ok(course)
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, GenerationError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| GenerationError::InFlight)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_core::time::fixed_clock;

    fn generator() -> CourseGenerator {
        CourseGenerator::new(fixed_clock(), Arc::new(TemplateCourseSource))
    }

    struct FailingSource;

    #[async_trait]
    impl CourseSource for FailingSource {
        async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::Source("offline".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn generates_eight_week_course() {
        let course = generator().generate("  Rust ").await.unwrap();

        assert_eq!(course.prompt, "Rust");
        assert_eq!(course.course_id.as_str(), "Rust1700000000000");
        assert_eq!(course.title, "Rust Masterclass");
        assert_eq!(course.duration, "8 weeks");
        assert_eq!(course.module_count(), 8);
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected() {
        let err = generator().generate("   ").await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyPrompt));
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_generation_is_rejected() {
        let svc = generator();
        let (first, second) = tokio::join!(svc.generate("Rust"), svc.generate("Go"));

        assert!(first.is_ok());
        assert!(matches!(second, Err(GenerationError::InFlight)));
        assert!(!svc.is_generating());

        assert!(svc.generate("Go").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn source_failure_releases_the_slot() {
        let svc = CourseGenerator::new(fixed_clock(), Arc::new(FailingSource))
            .with_latency(Duration::from_millis(10));

        assert!(matches!(svc.generate("Rust").await, Err(GenerationError::Source(_))));
        assert!(!svc.is_generating());
    }

    #[tokio::test(start_paused = true)]
    async fn placeholder_keeps_its_id_through_generation() {
        let svc = generator();
        let pending = svc.prepare(" Data  Science ").unwrap();
        assert_eq!(pending.title, "Data  Science");
        assert_eq!(pending.duration, "8 weeks");
        assert_eq!(pending.module_count(), 0);
        assert!(!svc.is_generating());

        let course = svc.fill(pending.clone()).await.unwrap();
        assert_eq!(course.course_id, pending.course_id);
        assert_eq!(course.title, "Data  Science Masterclass");
        assert_eq!(course.module_count(), 8);
    }
}
