//! CLI output formatting

use crate::core::StepEvent;
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format a step event for display
pub fn format_step_event(event: &StepEvent) -> String {
    match event {
        StepEvent::Started {
            index,
            total,
            title,
        } => format!(
            "{} [{}/{}] {}",
            ROCKET,
            index + 1,
            total,
            style(title).bold()
        ),
        StepEvent::Skipped { title } => {
            format!("{} {} {}", SKIP, style(title).dim(), style("(skipped)").dim())
        }
        StepEvent::Completed { title, elapsed_ms } => format!(
            "{} {} {}",
            CHECK,
            title,
            style(format!("({}ms)", elapsed_ms)).dim()
        ),
        StepEvent::Failed { title, error } => {
            format!("{} {}\n  {}", CROSS, style(title).bold(), style(error).red())
        }
    }
}
