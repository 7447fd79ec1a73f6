use indicatif::{ProgressBar, ProgressStyle};

/// Resolution of the phase bar
pub const PHASE_STEPS_PER_BEAT: u64 = 16;

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

pub fn create_phase_progress(quantum: f64) -> ProgressBar {
    let steps = (quantum * PHASE_STEPS_PER_BEAT as f64).ceil().max(1.0) as u64;
    let pb = ProgressBar::new(steps);
    pb.set_style(
        style("{prefix:.bold} [{bar:40.cyan}] {msg}").progress_chars("⣀⣤⣦⣶⣷⣿ "),
    );
    pb.set_prefix("Phase");
    pb
}

pub fn create_status_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix("Timeline");
    pb
}
