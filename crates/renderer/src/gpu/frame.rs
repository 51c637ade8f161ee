use winit::dpi::PhysicalSize;

/// Compute shader tile width/height; dispatches round up to cover the image.
pub(crate) const WORKGROUP_SIZE: u32 = 16;

/// The draw is a single full-screen triangle with no vertex buffer.
pub(crate) const FULLSCREEN_VERTEX_COUNT: u32 = 3;

/// Images whose access state the frame contract tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ImageRole {
    Backbuffer,
    PatternImage,
}

/// Logical GPU-visibility state of an image.
///
/// The underlying barriers are wgpu's problem; this models the protocol the
/// frame must follow so it can be checked and journaled without a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ImageAccess {
    Undefined,
    RenderTarget,
    ComputeWrite,
    Sampled,
    Present,
}

/// One recorded access-state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Transition {
    pub role: ImageRole,
    pub from: ImageAccess,
    pub to: ImageAccess,
}

/// State-tagged wrapper around an image's logical access.
///
/// `transition` is the only mutator; every use of the image must go through
/// it so the journal sees the full barrier sequence.
#[derive(Debug)]
pub(crate) struct AccessTracker {
    role: ImageRole,
    access: ImageAccess,
}

impl AccessTracker {
    pub(crate) fn new(role: ImageRole) -> Self {
        Self {
            role,
            access: ImageAccess::Undefined,
        }
    }

    #[cfg(test)]
    pub(crate) fn access(&self) -> ImageAccess {
        self.access
    }

    pub(crate) fn transition(&mut self, to: ImageAccess) -> Transition {
        let from = std::mem::replace(&mut self.access, to);
        Transition {
            role: self.role,
            from,
            to,
        }
    }
}

/// One step of the per-frame command sequence, in submission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FrameStep {
    Transition { role: ImageRole, to: ImageAccess },
    DispatchPattern { groups: (u32, u32, u32) },
    DrawFullscreen { vertices: u32 },
}

/// Workgroup counts covering `size` with 16x16 tiles, rounding up.
pub(crate) fn dispatch_groups(size: PhysicalSize<u32>) -> (u32, u32, u32) {
    (
        size.width.div_ceil(WORKGROUP_SIZE),
        size.height.div_ceil(WORKGROUP_SIZE),
        1,
    )
}

/// The fixed logical sequence recorded for every rendered frame.
///
/// Pure in the resolution, so the contract can be asserted over in tests and
/// replayed against real encoders by `GpuState::render_frame`.
pub(crate) fn frame_plan(resolution: PhysicalSize<u32>) -> Vec<FrameStep> {
    vec![
        FrameStep::Transition {
            role: ImageRole::Backbuffer,
            to: ImageAccess::RenderTarget,
        },
        FrameStep::Transition {
            role: ImageRole::PatternImage,
            to: ImageAccess::ComputeWrite,
        },
        FrameStep::DispatchPattern {
            groups: dispatch_groups(resolution),
        },
        FrameStep::Transition {
            role: ImageRole::PatternImage,
            to: ImageAccess::Sampled,
        },
        FrameStep::DrawFullscreen {
            vertices: FULLSCREEN_VERTEX_COUNT,
        },
        FrameStep::Transition {
            role: ImageRole::Backbuffer,
            to: ImageAccess::Present,
        },
    ]
}

/// Events observed during one frame, plus run-wide bookkeeping counters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FrameEvent {
    FrameBegin,
    Barrier(Transition),
    Dispatch { groups: (u32, u32, u32) },
    Draw { vertices: u32 },
    Submitted,
    Presented,
    FrameSkipped,
    FrameEnd,
    SurfaceReconfigured { width: u32, height: u32 },
    DeviceWaited,
}

/// Per-frame event log.
///
/// Events of the current frame are kept for tracing and tests; counters
/// accumulate across the whole run so begin/end symmetry and dispatch/draw
/// totals stay observable after the per-frame buffer is cleared.
#[derive(Debug, Default)]
pub(crate) struct FrameJournal {
    events: Vec<FrameEvent>,
    frames_begun: u64,
    frames_ended: u64,
    total_dispatches: u64,
    total_draws: u64,
}

impl FrameJournal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin_frame(&mut self) {
        self.events.clear();
        self.frames_begun += 1;
        self.record(FrameEvent::FrameBegin);
    }

    pub(crate) fn end_frame(&mut self) {
        self.frames_ended += 1;
        self.record(FrameEvent::FrameEnd);
    }

    pub(crate) fn record(&mut self, event: FrameEvent) {
        tracing::trace!(?event, "frame event");
        match event {
            FrameEvent::Dispatch { .. } => self.total_dispatches += 1,
            FrameEvent::Draw { .. } => self.total_draws += 1,
            _ => {}
        }
        self.events.push(event);
    }

    #[cfg(test)]
    pub(crate) fn events(&self) -> &[FrameEvent] {
        &self.events
    }

    #[cfg(test)]
    pub(crate) fn frames_begun(&self) -> u64 {
        self.frames_begun
    }

    pub(crate) fn frames_ended(&self) -> u64 {
        self.frames_ended
    }

    pub(crate) fn total_dispatches(&self) -> u64 {
        self.total_dispatches
    }

    pub(crate) fn total_draws(&self) -> u64 {
        self.total_draws
    }
}

/// Swapchain availability state machine.
///
/// A frame either presents or is skipped (zero-sized window, acquire
/// failure, suboptimal present). Reconfiguration is deferred until the
/// window reports a usable size again.
#[derive(Debug)]
pub(crate) struct FrameCycle {
    presented_last_frame: bool,
}

impl FrameCycle {
    pub(crate) fn new() -> Self {
        Self {
            presented_last_frame: true,
        }
    }

    pub(crate) fn after_frame(&mut self, presented: bool) {
        self.presented_last_frame = presented;
    }

    pub(crate) fn needs_reconfigure(&self, window_size: PhysicalSize<u32>) -> bool {
        !self.presented_last_frame && window_size.width != 0 && window_size.height != 0
    }

    pub(crate) fn reconfigured(&mut self) {
        self.presented_last_frame = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_plan(
        journal: &mut FrameJournal,
        backbuffer: &mut AccessTracker,
        pattern: &mut AccessTracker,
        resolution: PhysicalSize<u32>,
    ) {
        journal.begin_frame();
        for step in frame_plan(resolution) {
            match step {
                FrameStep::Transition { role, to } => {
                    let tracker = match role {
                        ImageRole::Backbuffer => &mut *backbuffer,
                        ImageRole::PatternImage => &mut *pattern,
                    };
                    let transition = tracker.transition(to);
                    journal.record(FrameEvent::Barrier(transition));
                }
                FrameStep::DispatchPattern { groups } => {
                    journal.record(FrameEvent::Dispatch { groups });
                }
                FrameStep::DrawFullscreen { vertices } => {
                    journal.record(FrameEvent::Draw { vertices });
                }
            }
        }
        journal.record(FrameEvent::Submitted);
        journal.record(FrameEvent::Presented);
        journal.end_frame();
    }

    #[test]
    fn dispatch_groups_round_up() {
        assert_eq!(dispatch_groups(PhysicalSize::new(1280, 720)), (80, 45, 1));
        assert_eq!(dispatch_groups(PhysicalSize::new(1281, 721)), (81, 46, 1));
        assert_eq!(dispatch_groups(PhysicalSize::new(16, 16)), (1, 1, 1));
        assert_eq!(dispatch_groups(PhysicalSize::new(1, 1)), (1, 1, 1));
    }

    #[test]
    fn frame_plan_follows_documented_barrier_order() {
        let plan = frame_plan(PhysicalSize::new(1280, 720));
        assert_eq!(
            plan,
            vec![
                FrameStep::Transition {
                    role: ImageRole::Backbuffer,
                    to: ImageAccess::RenderTarget,
                },
                FrameStep::Transition {
                    role: ImageRole::PatternImage,
                    to: ImageAccess::ComputeWrite,
                },
                FrameStep::DispatchPattern {
                    groups: (80, 45, 1),
                },
                FrameStep::Transition {
                    role: ImageRole::PatternImage,
                    to: ImageAccess::Sampled,
                },
                FrameStep::DrawFullscreen { vertices: 3 },
                FrameStep::Transition {
                    role: ImageRole::Backbuffer,
                    to: ImageAccess::Present,
                },
            ]
        );
    }

    #[test]
    fn tracker_transition_is_the_only_state_change() {
        let mut pattern = AccessTracker::new(ImageRole::PatternImage);
        assert_eq!(pattern.access(), ImageAccess::Undefined);

        let first = pattern.transition(ImageAccess::ComputeWrite);
        assert_eq!(first.from, ImageAccess::Undefined);
        assert_eq!(first.to, ImageAccess::ComputeWrite);

        let second = pattern.transition(ImageAccess::Sampled);
        assert_eq!(second.from, ImageAccess::ComputeWrite);
        assert_eq!(pattern.access(), ImageAccess::Sampled);
    }

    #[test]
    fn three_simulated_frames_record_three_dispatches_and_draws() {
        let resolution = PhysicalSize::new(1280, 720);
        let mut journal = FrameJournal::new();
        let mut pattern = AccessTracker::new(ImageRole::PatternImage);

        for _ in 0..3 {
            // The backbuffer is a fresh swapchain image every frame.
            let mut backbuffer = AccessTracker::new(ImageRole::Backbuffer);
            run_plan(&mut journal, &mut backbuffer, &mut pattern, resolution);
            assert_eq!(backbuffer.access(), ImageAccess::Present);
        }

        assert_eq!(journal.total_dispatches(), 3);
        assert_eq!(journal.total_draws(), 3);
        assert_eq!(journal.frames_begun(), 3);
        assert_eq!(journal.frames_ended(), 3);

        // Last frame's event log shows the full documented sequence.
        let events = journal.events();
        assert_eq!(events[0], FrameEvent::FrameBegin);
        assert!(matches!(
            events[1],
            FrameEvent::Barrier(Transition {
                role: ImageRole::Backbuffer,
                to: ImageAccess::RenderTarget,
                ..
            })
        ));
        assert!(matches!(
            events[3],
            FrameEvent::Dispatch {
                groups: (80, 45, 1)
            }
        ));
        assert!(matches!(events[5], FrameEvent::Draw { vertices: 3 }));
        assert!(matches!(
            events[6],
            FrameEvent::Barrier(Transition {
                role: ImageRole::Backbuffer,
                to: ImageAccess::Present,
                ..
            })
        ));
        assert_eq!(events[events.len() - 1], FrameEvent::FrameEnd);
    }

    #[test]
    fn skipped_frames_keep_begin_end_symmetric_without_work() {
        let mut journal = FrameJournal::new();
        for _ in 0..5 {
            journal.begin_frame();
            journal.record(FrameEvent::FrameSkipped);
            journal.end_frame();
        }
        assert_eq!(journal.frames_begun(), journal.frames_ended());
        assert_eq!(journal.total_dispatches(), 0);
        assert_eq!(journal.total_draws(), 0);
    }

    #[test]
    fn device_wait_is_journaled_after_the_last_frame() {
        let resolution = PhysicalSize::new(1280, 720);
        let mut journal = FrameJournal::new();
        let mut pattern = AccessTracker::new(ImageRole::PatternImage);
        let mut backbuffer = AccessTracker::new(ImageRole::Backbuffer);
        run_plan(&mut journal, &mut backbuffer, &mut pattern, resolution);

        journal.record(FrameEvent::DeviceWaited);

        let events = journal.events();
        let end = events
            .iter()
            .position(|event| *event == FrameEvent::FrameEnd)
            .expect("frame end recorded");
        let waited = events
            .iter()
            .position(|event| *event == FrameEvent::DeviceWaited)
            .expect("device wait recorded");
        assert!(waited > end);
    }

    #[test]
    fn reconfigure_waits_for_nonzero_window() {
        let mut cycle = FrameCycle::new();
        assert!(!cycle.needs_reconfigure(PhysicalSize::new(1280, 720)));

        cycle.after_frame(false);
        assert!(!cycle.needs_reconfigure(PhysicalSize::new(0, 0)));
        assert!(!cycle.needs_reconfigure(PhysicalSize::new(1280, 0)));
        assert!(cycle.needs_reconfigure(PhysicalSize::new(1280, 720)));

        cycle.reconfigured();
        assert!(!cycle.needs_reconfigure(PhysicalSize::new(1280, 720)));

        cycle.after_frame(true);
        assert!(!cycle.needs_reconfigure(PhysicalSize::new(1280, 720)));
    }
}
