use std::fmt;

/// Formats remaining seconds as `MM:SS`. Minutes are not wrapped into hours,
/// so a full hour reads `60:00`.
pub fn format_countdown(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Integer percentage of `score` out of `total`, rounding half up.
/// An empty exam scores 0%.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = u64::from(score) * 200 + u64::from(total);
    (scaled / (2 * u64::from(total))) as u32
}

/// Percent of the exam reached when viewing question `index` (zero based).
pub fn progress_percent(index: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    percentage((index + 1) as u32, total as u32)
}

/// Rating shown next to the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceBadge {
    Excellent,
    Good,
    Average,
    KeepTrying,
}

impl PerformanceBadge {
    pub fn for_percentage(percent: u32) -> Self {
        match percent {
            80.. => PerformanceBadge::Excellent,
            60..=79 => PerformanceBadge::Good,
            40..=59 => PerformanceBadge::Average,
            _ => PerformanceBadge::KeepTrying,
        }
    }
}

impl fmt::Display for PerformanceBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PerformanceBadge::Excellent => "Excellent!",
            PerformanceBadge::Good => "Good!",
            PerformanceBadge::Average => "Average",
            PerformanceBadge::KeepTrying => "Keep Trying!",
        };
        f.write_str(label)
    }
}
