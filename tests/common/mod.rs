//! Shared test support: a scripted bridge runner
//!
//! Rules match on a substring of the joined command line and are checked
//! in insertion order, so file-specific rules go before generic ones.
//! Each rule's responses are consumed front-to-back; the last response
//! repeats once the queue drains.

#![allow(dead_code)]

use droidsync::bridge::{BridgeOutput, CommandRunner};
use droidsync::types::SyncError;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Response {
    Output(BridgeOutput),
    Timeout,
}

impl Response {
    fn into_result(self, command: String) -> Result<BridgeOutput, SyncError> {
        match self {
            Response::Output(output) => Ok(output),
            Response::Timeout => Err(SyncError::BridgeTimeout { command, secs: 30 }),
        }
    }
}

/// Canned exit-zero response with the given stdout
pub fn ok(stdout: &str) -> Response {
    Response::Output(BridgeOutput {
        status: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

/// Canned response with an explicit exit code and streams
pub fn exit(code: i32, stdout: &str, stderr: &str) -> Response {
    Response::Output(BridgeOutput {
        status: Some(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    })
}

/// A push response carrying the bridge's transfer summary on stderr
pub fn push_ok() -> Response {
    exit(0, "", "1 file pushed. 4.1 MB/s (500 bytes in 0.001s)")
}

/// A push that exits cleanly but prints no transfer summary
pub fn push_no_summary() -> Response {
    exit(0, "", "")
}

/// A `devices -l` listing with every serial in the ready state
pub fn device_listing(serials: &[&str]) -> String {
    let mut listing = String::from("List of devices attached\n");
    for serial in serials {
        listing.push_str(serial);
        listing.push_str("\tdevice product:x model:y device:z\n");
    }
    listing
}

struct Rule {
    pattern: String,
    responses: Vec<Response>,
}

/// Bridge fake driven by substring-matched response queues
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Append a rule; earlier rules win, so add specific patterns first
    pub fn rule(self, pattern: &str, responses: Vec<Response>) -> Self {
        self.rules.lock().expect("lock rules").push(Rule {
            pattern: pattern.to_string(),
            responses,
        });
        self
    }

    /// Every command line this runner has seen, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock calls").clone()
    }

    /// Number of recorded command lines containing `pattern`
    pub fn calls_matching(&self, pattern: &str) -> usize {
        self.calls()
            .iter()
            .filter(|line| line.contains(pattern))
            .count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, args: &[String], _timeout: Duration) -> Result<BridgeOutput, SyncError> {
        let line = args.join(" ");
        self.calls.lock().expect("lock calls").push(line.clone());

        let mut rules = self.rules.lock().expect("lock rules");
        for rule in rules.iter_mut() {
            if line.contains(&rule.pattern) {
                let response = if rule.responses.len() > 1 {
                    rule.responses.remove(0)
                } else {
                    rule.responses[0].clone()
                };
                return response.into_result(line);
            }
        }
        panic!("no scripted response for bridge command: {line}");
    }
}
