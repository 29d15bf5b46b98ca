//! Human-readable output formatting

use bytesize::ByteSize;

use crate::output::formatter::Report;
use crate::unit::ActorId;
use crate::workload::{MemoryReport, ScheduleReport};

pub fn format_human(report: &Report) -> String {
    match report {
        Report::Schedule(info) => format_schedule(info),
        Report::Memory(info) => format_memory(info),
    }
}

fn format_schedule(info: &ScheduleReport) -> String {
    let mut output = format!(
        "Schedule Workload\n\
         -----------------\n\
         Started:     {}\n\
         Elapsed:     {} ms\n\
         Threads:     {}\n\
         Turns:       {}\n\
         Round-robin: {}\n",
        info.started_at.format("%Y-%m-%d %H:%M:%S"),
        info.elapsed_ms,
        info.threads,
        info.total_turns,
        if info.round_robin { "yes" } else { "NO" }
    );

    for container in &info.containers {
        output.push_str(&format!(
            "\nContainer {}\n  Units: {} | Turns: {} | Out of turn: {} | Overlaps: {}\n  Order: {}\n",
            container.container,
            container.units,
            container.turns,
            container.out_of_turn,
            container.overlaps,
            join_ids(&container.sample)
        ));
    }
    output
}

fn format_memory(info: &MemoryReport) -> String {
    let mut output = format!(
        "Memory Workload\n\
         ---------------\n\
         Started:     {}\n\
         Elapsed:     {} ms\n\
         Threads:     {}\n\
         Mappings:    {}\n\
         Resident:    {}\n\
         Consistent:  {}{}\n",
        info.started_at.format("%Y-%m-%d %H:%M:%S"),
        info.elapsed_ms,
        info.threads,
        info.mappings,
        ByteSize(info.resident_bytes as u64),
        if info.consistent { "yes" } else { "NO" },
        if info.interrupted { " (interrupted)" } else { "" }
    );

    for container in &info.containers {
        output.push_str(&format!("\nContainer {}\n", container.container));
        for object in &container.objects {
            let mark = if object.expected == object.observed { "" } else { "  <-- mismatch" };
            output.push_str(&format!(
                "  Object {}: expected {} | observed {}{}\n",
                object.object, object.expected, object.observed, mark
            ));
        }
    }

    output.push_str(&format!(
        "\nTeardown\n  Containers: {} | Objects: {} | Released: {} | Locks retired: {}\n",
        info.teardown.containers,
        info.teardown.objects,
        ByteSize(info.teardown.bytes_released as u64),
        info.teardown.locks_retired
    ));
    output
}

fn join_ids(ids: &[ActorId]) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_ids() {
        assert_eq!(join_ids(&[]), "-");
        assert_eq!(
            join_ids(&[ActorId::new(1), ActorId::new(2)]),
            "1 -> 2"
        );
    }
}
