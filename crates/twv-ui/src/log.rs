//! Scrolling log of tunnel events.

use std::collections::VecDeque;
use twv_tunnel::TunnelEvent;

/// Bounded list of log lines, always scrolled to the latest.
#[derive(Debug, Clone)]
pub struct LogView {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogView {
    /// Create a log keeping at most `capacity` lines
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(256)),
            capacity,
        }
    }

    /// Append a line, evicting the oldest when full.
    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// Append the lines describing `event`. Returns how many were added.
    pub fn record(&mut self, event: &TunnelEvent) -> usize {
        match event {
            TunnelEvent::AvailableEgressRegions(regions) => {
                for region in regions {
                    self.push(format!("available egress region: {}", region));
                }
                regions.len()
            }
            TunnelEvent::BytesTransferred { sent, received } => {
                self.push(format!("bytes sent: {}", sent));
                self.push(format!("bytes received: {}", received));
                2
            }
            other => {
                self.push(other.to_string());
                1
            }
        }
    }

    /// All retained lines, oldest first
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Most recent line
    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    /// Index of the selected (last) line
    pub fn selection(&self) -> Option<usize> {
        self.lines.len().checked_sub(1)
    }

    /// Number of retained lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if no line is retained
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
