// ABOUTME: Display colors for concurrent rollout workers.
// ABOUTME: Purely cosmetic; the index never affects scheduling.

use colored::{Color, Colorize};

use crate::types::ServiceId;

pub const PALETTE: [Color; 4] = [Color::Blue, Color::Magenta, Color::White, Color::Cyan];

/// Color for the worker at `index` in topology order.
pub fn color_for(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

/// `[service]` prefix rendered in the worker's color.
pub fn service_label(service: &ServiceId, color: Color) -> String {
    format!("[{service}]").color(color).to_string()
}
