use super::progress::{create_phase_progress, create_status_spinner, PHASE_STEPS_PER_BEAT};
use crate::timeline::TimelineSnapshot;
use crate::transport::TransportState;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};

/// One line of human-readable timeline state
pub fn render_status_line(snapshot: &TimelineSnapshot, state: TransportState) -> String {
    format!(
        "tempo: {:.2} | beats: {:.3} | phase: {:.3} | transport: {}",
        snapshot.tempo, snapshot.beat, snapshot.phase, state
    )
}

pub struct StatusDisplay {
    _multi_progress: MultiProgress,
    phase_pb: ProgressBar,
    status_pb: ProgressBar,
}

impl StatusDisplay {
    pub fn new(quantum: f64, visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let multi_progress = MultiProgress::with_draw_target(target);
        let phase_pb = multi_progress.add(create_phase_progress(quantum));
        let status_pb = multi_progress.add(create_status_spinner());

        Self {
            _multi_progress: multi_progress,
            phase_pb,
            status_pb,
        }
    }

    pub fn render(&self, snapshot: &TimelineSnapshot, state: TransportState) {
        let position = (snapshot.phase * PHASE_STEPS_PER_BEAT as f64).max(0.0) as u64;
        self.phase_pb.set_position(position);
        self.phase_pb.set_message(format!("{:.2}", snapshot.phase));

        self.status_pb
            .set_message(render_status_line(snapshot, state));
        self.status_pb.tick();
    }

    pub fn finish(&self) {
        self.phase_pb.abandon();
        self.status_pb.abandon();
    }
}
