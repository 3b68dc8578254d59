use serde::Serialize;

use crate::common::types::GuildId;

/// Formats whole seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_time(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `01:05 ─────●────────── 03:00`. Unknown durations pin the marker to the start.
pub fn progress_bar(elapsed_secs: u64, duration_secs: Option<u64>, width: usize) -> String {
    let elapsed = duration_secs.map_or(elapsed_secs, |total| elapsed_secs.min(total));
    let (filled, total) = match duration_secs {
        Some(total) if total > 0 => ((width as u64 * elapsed / total) as usize, format_time(total)),
        Some(_) => (0, format_time(0)),
        None => (0, "--:--".to_string()),
    };

    format!(
        "{} {}●{} {}",
        format_time(elapsed),
        "─".repeat(filled),
        "─".repeat(width - filled),
        total
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlayingCard {
    pub guild_id: GuildId,
    pub title: String,
    pub requester: String,
    pub progress: String,
    pub elapsed_secs: u64,
    pub duration_secs: Option<u64>,
    pub paused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub title: String,
    pub requester: String,
    pub duration_secs: Option<u64>,
}

/// Read-only snapshot of a session: what plays now and what comes next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueView {
    pub guild_id: GuildId,
    pub now_playing: Option<QueueEntry>,
    pub upcoming: Vec<QueueEntry>,
}

impl QueueView {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.upcoming.len() + 2);
        if let Some(current) = &self.now_playing {
            lines.push(format!("Now playing: {} / {}", current.title, current.requester));
        }
        if self.upcoming.is_empty() {
            lines.push("The queue is empty.".to_string());
        }
        for (i, entry) in self.upcoming.iter().enumerate() {
            lines.push(format!("#{} {} / {}", i + 1, entry.title, entry.requester));
        }
        lines
    }
}

/// Something the notifier renders into a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Content {
    NowPlaying(NowPlayingCard),
    Queue(QueueView),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_is_zero_padded() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(3_725), "62:05");
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(progress_bar(0, Some(200), 10), "00:00 ●────────── 03:20");
        assert_eq!(progress_bar(100, Some(200), 10), "01:40 ─────●───── 03:20");
        assert_eq!(progress_bar(200, Some(200), 10), "03:20 ──────────● 03:20");
    }

    #[test]
    fn bar_clamps_overrun_and_handles_unknown_length() {
        assert_eq!(progress_bar(500, Some(200), 4), "03:20 ────● 03:20");
        assert_eq!(progress_bar(42, None, 4), "00:42 ●──── --:--");
        assert_eq!(progress_bar(42, Some(0), 4), "00:00 ●──── 00:00");
    }

    #[test]
    fn queue_lines_number_upcoming_entries() {
        let entry = |title: &str| QueueEntry {
            title: title.into(),
            requester: "<@7>".into(),
            duration_secs: None,
        };
        let view = QueueView {
            guild_id: GuildId(1),
            now_playing: Some(entry("A")),
            upcoming: vec![entry("B"), entry("C")],
        };
        assert_eq!(
            view.lines(),
            ["Now playing: A / <@7>", "#1 B / <@7>", "#2 C / <@7>"]
        );

        let idle = QueueView {
            guild_id: GuildId(1),
            now_playing: None,
            upcoming: Vec::new(),
        };
        assert_eq!(idle.lines(), ["The queue is empty."]);
    }
}
