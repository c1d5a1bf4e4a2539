//! Rendering of a tracked operation's call history

use std::fmt;

use crate::backend::KvStore;
use crate::error::Result;
use crate::tracker::{read_log, OperationId};

/// Call history of one operation, oldest call first
#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    id: OperationId,
    calls: Vec<(String, String)>,
}

/// Read both logs of `id` and pair them up by position
///
/// If the logs have diverged (a call failed, or calls overlapped), pairing
/// stops at the shorter log.
pub fn replay(store: &dyn KvStore, id: &OperationId) -> Result<Replay> {
    let inputs = read_log(store, &id.inputs_key())?;
    let outputs = read_log(store, &id.outputs_key())?;

    Ok(Replay {
        id: id.clone(),
        calls: inputs.into_iter().zip(outputs).collect(),
    })
}

impl Replay {
    /// Replayed operation
    pub fn identity(&self) -> &OperationId {
        &self.id
    }

    /// Number of paired calls
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Check if no calls were recorded
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// `(input, output)` pairs in call order
    pub fn calls(&self) -> &[(String, String)] {
        &self.calls
    }

    /// Summary line followed by one line per call
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.calls.len() + 1);
        lines.push(format!("{} was called {} times:", self.id, self.calls.len()));
        lines.extend(
            self.calls
                .iter()
                .map(|(input, output)| format!("{}(*{}) -> {}", self.id, input, output)),
        );
        lines
    }
}

impl fmt::Display for Replay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
