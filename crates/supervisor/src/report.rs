//! Pipeline run report

use std::time::Duration;

use dispatcher::DispatcherReport;
use ingestion::RouterReport;

/// Terminal state and counters of every router and dispatcher of one run
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Sorted by topic
    pub routers: Vec<RouterReport>,
    /// Sorted by target
    pub dispatchers: Vec<DispatcherReport>,
    /// Whether every queue drained before the dispatchers were cancelled
    pub drained: bool,
    /// Whether the run was stopped by an external shutdown
    pub interrupted: bool,
    /// Tasks that panicked or were aborted
    pub task_failures: usize,
    pub duration: Duration,
}

impl PipelineReport {
    pub fn messages_received(&self) -> u64 {
        self.routers.iter().map(|r| r.counters.received).sum()
    }

    pub fn packets_published(&self) -> u64 {
        self.routers.iter().map(|r| r.counters.published).sum()
    }

    pub fn messages_dropped(&self) -> u64 {
        self.routers.iter().map(|r| r.counters.dropped()).sum()
    }

    pub fn packets_sent(&self) -> u64 {
        self.dispatchers.iter().map(|d| d.counters.sent).sum()
    }

    /// Faulted routers and dispatchers, plus failed tasks
    pub fn fault_count(&self) -> usize {
        self.routers.iter().filter(|r| r.outcome.is_fault()).count()
            + self
                .dispatchers
                .iter()
                .filter(|d| d.outcome.is_fault())
                .count()
            + self.task_failures
    }

    /// Whether anything faulted
    pub fn is_clean(&self) -> bool {
        self.fault_count() == 0
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Pipeline Summary                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Messages received: {}", self.messages_received());
        println!("   ├─ Messages dropped: {}", self.messages_dropped());
        println!("   ├─ Packets published: {}", self.packets_published());
        println!("   ├─ Packets sent: {}", self.packets_sent());
        println!("   ├─ Queues drained: {}", if self.drained { "yes" } else { "no" });
        println!("   └─ Interrupted: {}", if self.interrupted { "yes" } else { "no" });

        if !self.routers.is_empty() {
            println!("\nRouters");
            for (idx, router) in self.routers.iter().enumerate() {
                let branch = if idx + 1 == self.routers.len() { "└─" } else { "├─" };
                let c = &router.counters;
                println!(
                    "   {} {} → {}: {:?} (received {}, published {}, dropped {}: decode {}, extract {}, position {}, encode {})",
                    branch,
                    router.topic,
                    router.target,
                    router.outcome,
                    c.received,
                    c.published,
                    c.dropped(),
                    c.dropped_decode,
                    c.dropped_extract,
                    c.dropped_position,
                    c.dropped_encode
                );
            }
        }

        if !self.dispatchers.is_empty() {
            println!("\nOutputs");
            for (idx, output) in self.dispatchers.iter().enumerate() {
                let branch = if idx + 1 == self.dispatchers.len() { "└─" } else { "├─" };
                let c = &output.counters;
                println!(
                    "   {} {} ({}): {:?} (sent {}, failed {}, discarded {})",
                    branch,
                    output.target,
                    output.sender,
                    output.outcome,
                    c.sent,
                    c.failed,
                    c.discarded
                );
            }
        }

        if self.task_failures > 0 {
            println!("\nFailed tasks: {}", self.task_failures);
        }

        println!();
    }
}
