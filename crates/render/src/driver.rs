use lightfield_kernel::{BoxField, RegimeCounts, SceneConfig};

use crate::clock::{FrameClock, FrameSource, MAX_FRAME_DELTA};
use crate::surface::{LightState, RenderError, RenderSurface};

/// Outcome of one driven frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Zero-based index of this frame.
    pub frame: u64,
    /// Delta fed to the motion rule, after clamping.
    pub dt: f32,
    pub regenerated: bool,
    /// `None` when animation is paused.
    pub regimes: Option<RegimeCounts>,
    /// Number of transforms written to the surface.
    pub uploaded: usize,
}

/// Drives the field and a surface once per frame.
///
/// Order within a frame: advance the clock, apply a pending regeneration,
/// step every instance, move the light to its configured position, upload
/// transforms, draw. The light moves after the step, so instances react to
/// where the light was when the previous frame was drawn.
#[derive(Debug)]
pub struct FrameDriver<C> {
    clock: C,
    frames_drawn: u64,
    uploaded_generation: Option<u64>,
}

impl<C: FrameClock> FrameDriver<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            frames_drawn: 0,
            uploaded_generation: None,
        }
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Run one frame.
    pub fn frame<S: RenderSurface + ?Sized>(
        &mut self,
        field: &mut BoxField,
        config: &SceneConfig,
        surface: &mut S,
    ) -> Result<FrameReport, RenderError> {
        let dt = self.clock.delta().clamp(0.0, MAX_FRAME_DELTA);

        let regenerated = field.take_regenerate_request();
        if regenerated {
            field.regenerate(config);
        }

        let regimes = config
            .looping()
            .animate
            .then(|| field.step(dt, config));

        field.sync_light(config);

        let uploaded = self.upload(field, surface)?;
        surface.set_light(&LightState::new(config.light(), field.light().position()))?;
        surface.draw()?;

        let report = FrameReport {
            frame: self.frames_drawn,
            dt,
            regenerated,
            regimes,
            uploaded,
        };
        self.frames_drawn += 1;
        tracing::debug!(
            frame = report.frame,
            dt = report.dt,
            uploaded = report.uploaded,
            regenerated = report.regenerated,
            "frame drawn"
        );
        Ok(report)
    }

    /// Drive frames until `frames` says stop, then dispose the surface.
    /// Returns the number of frames drawn by this call.
    pub fn run<S, F>(
        &mut self,
        field: &mut BoxField,
        config: &mut SceneConfig,
        surface: &mut S,
        frames: &mut F,
    ) -> Result<u64, RenderError>
    where
        S: RenderSurface + ?Sized,
        F: FrameSource + ?Sized,
    {
        let start = self.frames_drawn;
        let result = loop {
            if !frames.next_frame(self.frames_drawn - start, config) {
                break Ok(());
            }
            if let Err(e) = self.frame(field, config, surface) {
                tracing::error!("frame failed: {e}");
                break Err(e);
            }
        };
        self.shutdown(surface);
        result.map(|()| self.frames_drawn - start)
    }

    /// Release the surface. The next frame re-creates the batch.
    pub fn shutdown<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        surface.dispose();
        self.uploaded_generation = None;
        tracing::info!(frames = self.frames_drawn, "render driver stopped");
    }

    fn upload<S: RenderSurface + ?Sized>(
        &mut self,
        field: &mut BoxField,
        surface: &mut S,
    ) -> Result<usize, RenderError> {
        let batch = field.batch();
        let generation = batch.generation();

        if self.uploaded_generation != Some(generation) {
            surface.create_instanced_batch(batch.len())?;
            self.uploaded_generation = Some(generation);
            tracing::trace!(generation, count = batch.len(), "created surface batch");
        } else if !batch.is_dirty() {
            return Ok(0);
        }

        for (index, transform) in batch.transforms().iter().enumerate() {
            surface.set_transform_at(index, transform)?;
        }
        let written = batch.len();
        field.batch_mut().mark_clean();
        Ok(written)
    }
}
