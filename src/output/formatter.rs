//! Output formatting

use crate::output::human::format_human;
use crate::output::json::format_json;
use crate::workload::{MemoryReport, ScheduleReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Anything the command-line tool prints
#[derive(Debug, Clone)]
pub enum Report {
    Schedule(ScheduleReport),
    Memory(MemoryReport),
}

impl Report {
    /// Whether the workload behind the report checked out
    pub fn passed(&self) -> bool {
        match self {
            Report::Schedule(report) => report.round_robin,
            Report::Memory(report) => report.consistent,
        }
    }
}

pub fn format_output(report: &Report, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_human(report),
        OutputFormat::Json => format_json(report),
    }
}
