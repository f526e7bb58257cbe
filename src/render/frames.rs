use crate::state::session::Pad;

/// Timing constants that shape the watch-phase animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchTiming {
    /// Frames per second of the produced video.
    pub frame_rate: u32,
    /// Blank lead-in before the first pad lights up.
    pub initial_delay_ms: u64,
    /// How long each pad stays lit.
    pub lit_ms: u64,
    /// Blank gap between two lit pads.
    pub off_ms: u64,
}

impl WatchTiming {
    /// Number of frames covering the given duration, rounded to nearest.
    fn frames_for(&self, duration_ms: u64) -> usize {
        ((duration_ms * u64::from(self.frame_rate) + 500) / 1000) as usize
    }

    /// Blank frames shown before the first pad.
    pub fn initial_delay_frames(&self) -> usize {
        self.frames_for(self.initial_delay_ms)
    }

    /// Frames each pad stays lit.
    pub fn lit_frames(&self) -> usize {
        self.frames_for(self.lit_ms)
    }

    /// Blank frames between two pads.
    pub fn off_frames(&self) -> usize {
        self.frames_for(self.off_ms)
    }

    /// Total frame count for a sequence of the given length:
    /// `initial_delay_frames + len * (lit_frames + off_frames)`.
    pub fn plan_len(&self, sequence_len: usize) -> usize {
        self.initial_delay_frames() + sequence_len * (self.lit_frames() + self.off_frames())
    }
}

/// One step of the watch-phase animation: which pad, if any, is lit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescriptor {
    /// Pad highlighted in this frame; `None` renders all pads idle.
    pub lit: Option<Pad>,
}

/// Expand a canonical sequence into its ordered watch-phase frames: the
/// initial blank delay, then for each pad a lit stretch followed by an off
/// gap. Pure and deterministic; the rasterizer turns each descriptor into
/// one image.
pub fn watch_plan(sequence: &[Pad], timing: &WatchTiming) -> Vec<FrameDescriptor> {
    let mut plan = Vec::with_capacity(timing.plan_len(sequence.len()));

    for _ in 0..timing.initial_delay_frames() {
        plan.push(FrameDescriptor { lit: None });
    }

    for &pad in sequence {
        for _ in 0..timing.lit_frames() {
            plan.push(FrameDescriptor { lit: Some(pad) });
        }
        for _ in 0..timing.off_frames() {
            plan.push(FrameDescriptor { lit: None });
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_timing() -> WatchTiming {
        WatchTiming {
            frame_rate: 10,
            initial_delay_ms: 1000,
            lit_ms: 400,
            off_ms: 200,
        }
    }

    #[test]
    fn frame_counts_round_to_nearest() {
        let timing = default_timing();
        assert_eq!(timing.initial_delay_frames(), 10);
        assert_eq!(timing.lit_frames(), 4);
        assert_eq!(timing.off_frames(), 2);
    }

    #[test]
    fn two_pad_sequence_yields_twenty_two_frames() {
        let timing = default_timing();
        let plan = watch_plan(&[Pad::Green, Pad::Blue], &timing);
        assert_eq!(plan.len(), 22);
        assert_eq!(plan.len(), timing.plan_len(2));
    }

    #[test]
    fn plan_length_matches_formula_for_all_lengths() {
        let timing = default_timing();
        for len in 1..=12 {
            let sequence = vec![Pad::Red; len];
            assert_eq!(
                watch_plan(&sequence, &timing).len(),
                timing.initial_delay_frames()
                    + len * (timing.lit_frames() + timing.off_frames())
            );
        }
    }

    #[test]
    fn plan_interleaves_lit_and_off_stretches() {
        let timing = WatchTiming {
            frame_rate: 10,
            initial_delay_ms: 100,
            lit_ms: 200,
            off_ms: 100,
        };
        let plan = watch_plan(&[Pad::Yellow], &timing);
        let lit: Vec<Option<Pad>> = plan.iter().map(|frame| frame.lit).collect();
        assert_eq!(
            lit,
            vec![None, Some(Pad::Yellow), Some(Pad::Yellow), None]
        );
    }
}
