//! Console and JSON renderings of a trace.

use std::io::{self, Write};
use std::time::Duration;
use tracert_core::{
    HopRecord, ProbeOutcome, TraceObserver, TraceSession, TraceStatus, TraceTarget,
};
use tracing::warn;

/// Prints each probe as it completes, in the classic `tracert` layout.
pub struct ConsoleDisplay<W: Write> {
    out: W,
}

impl ConsoleDisplay<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: std::fmt::Arguments<'_>) {
        let result = self.out.write_fmt(text).and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!(error = %e, "failed to write trace output");
        }
    }
}

fn format_rtt(rtt: Duration) -> String {
    let ms = rtt.as_millis();
    if ms == 0 {
        "<1 ms".to_string()
    } else {
        format!("{} ms", ms)
    }
}

fn format_node(addr: impl std::fmt::Display, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{} [{}]", name, addr),
        None => addr.to_string(),
    }
}

impl<W: Write> TraceObserver for ConsoleDisplay<W> {
    fn on_start(&mut self, target: &TraceTarget, max_hops: u8) {
        let node = match &target.reverse_dns {
            Some(name) => format_node(target.addr, Some(name.as_str())),
            None if target.name != target.addr.to_string() => {
                format_node(target.addr, Some(target.name.as_str()))
            }
            None => target.addr.to_string(),
        };
        self.emit(format_args!(
            "\nTracing route to {}\nover a maximum of {} hops:\n\n",
            node, max_hops
        ));
    }

    fn on_probe(&mut self, ttl: u8, index: usize, outcome: &ProbeOutcome) {
        if index == 0 {
            self.emit(format_args!("{:>3}", ttl));
        }
        match outcome.rtt() {
            Some(rtt) => self.emit(format_args!("\t{}", format_rtt(rtt))),
            None => self.emit(format_args!("\t*")),
        }
    }

    fn on_hop(&mut self, hop: &HopRecord) {
        if hop.probes.is_empty() {
            return;
        }
        match (hop.responder, hop.probes.last()) {
            (Some(addr), _) => {
                let node = format_node(addr, hop.reverse_dns.as_deref());
                self.emit(format_args!("\t{}\n", node));
            }
            (None, Some(ProbeOutcome::Failed { message })) => {
                self.emit(format_args!("\t{}.\n", message));
            }
            (None, _) => self.emit(format_args!("\tRequest timed out.\n")),
        }
    }

    fn on_finish(&mut self, session: &TraceSession) {
        match &session.status {
            TraceStatus::Completed | TraceStatus::Exhausted => {
                self.emit(format_args!("\nTrace complete.\n"))
            }
            TraceStatus::Aborted { message } => {
                self.emit(format_args!("\nTrace aborted: {}.\n", message))
            }
        }
    }
}

/// Prints only the finished session, as pretty JSON.
pub struct JsonDisplay<W: Write> {
    out: W,
}

impl JsonDisplay<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TraceObserver for JsonDisplay<W> {
    fn on_finish(&mut self, session: &TraceSession) {
        let json = match session.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize trace session");
                return;
            }
        };
        if let Err(e) = writeln!(self.out, "{}", json).and_then(|_| self.out.flush()) {
            warn!(error = %e, "failed to write trace output");
        }
    }
}
