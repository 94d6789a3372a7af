use crate::easing::{self, EasingFn};
use crate::error::MorphError;
use crate::interpolate::{self, StoredHandles};
use crate::params::MorphParams;
use crate::shape::Shape;

/// Timed n → n+1 transition, driven by an external clock.
///
/// `Idle → Active → Idle`. The only way back to idle other than reaching
/// `progress == 1` is [`MorphAnimation::cancel`], which abandons the shape
/// wherever it is.
#[derive(Debug, Clone)]
pub struct MorphAnimation {
    active: bool,
    start_time: f64,
    from_shape: Option<Shape>,
    to_shape: Option<Shape>,
    progress: f64,
    params: MorphParams,
    stored: StoredHandles,
    easing: EasingFn,
}

impl Default for MorphAnimation {
    fn default() -> Self {
        Self {
            active: false,
            start_time: 0.0,
            from_shape: None,
            to_shape: None,
            progress: 0.0,
            params: MorphParams::default(),
            stored: StoredHandles::default(),
            easing: easing::ease_in_out_power,
        }
    }
}

impl MorphAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap the easing curve. Takes effect on the next `update`.
    pub fn with_easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// `from` is cloned so the caller's shape never changes under it.
    /// `now` is the clock value (ms) that corresponds to progress 0.
    pub fn start(&mut self, from: &Shape, to: Shape, params: MorphParams, now: f64) -> Result<(), MorphError> {
        if self.active {
            return Err(MorphError::AlreadyActive);
        }

        if from.len() < 3 {
            return Err(MorphError::TooFewAnchors(from.len()));
        }

        if to.len() != from.len() + 1 {
            return Err(MorphError::SideCountMismatch {
                from: from.len(),
                to: to.len(),
            });
        }

        if !(params.duration.is_finite() && params.duration > 0.0) {
            return Err(MorphError::InvalidDuration(params.duration));
        }

        tracing::info!(
            from = from.len(),
            to = to.len(),
            duration = params.duration,
            easing_power = params.easing_power,
            "morph started"
        );

        self.from_shape = Some(from.clone());
        self.to_shape = Some(to);
        self.params = params;
        self.stored.clear();
        self.start_time = now;
        self.progress = 0.0;
        self.active = true;

        Ok(())
    }

    /// Current shape, or `None` when no morph is in flight.
    pub fn update(&mut self, timestamp: f64) -> Option<Shape> {
        if !self.active {
            return None;
        }

        let (from, to) = (self.from_shape.as_ref()?, self.to_shape.as_ref()?);

        let raw = ((timestamp - self.start_time) / self.params.duration).clamp(0.0, 1.0);
        self.progress = raw.max(self.progress);

        let eased = (self.easing)(self.progress, self.params.easing_power);
        let shape = interpolate::interpolate(from, to, eased, &self.params, &mut self.stored);

        tracing::trace!(progress = self.progress, eased, anchors = shape.len(), "morph step");

        if self.progress >= 1.0 {
            self.active = false;
            self.stored.clear();
            tracing::info!(sides = shape.len(), "morph complete");
        }

        Some(shape)
    }

    /// Stop without rollback. The last produced shape is neither the start
    /// nor the end configuration in general.
    pub fn cancel(&mut self) {
        if self.active {
            tracing::debug!(progress = self.progress, "morph cancelled");
        }

        self.active = false;
        self.stored.clear();
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn params(&self) -> &MorphParams {
        &self.params
    }

    pub fn from_shape(&self) -> Option<&Shape> {
        self.from_shape.as_ref()
    }

    pub fn to_shape(&self) -> Option<&Shape> {
        self.to_shape.as_ref()
    }

    pub fn stored_handles(&self) -> &StoredHandles {
        &self.stored
    }
}
