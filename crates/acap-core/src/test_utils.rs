//! Test utilities for acap-core.
//!
//! This module provides test infrastructure including:
//! - Scripted probes with configurable outcomes
//! - A shared journal recording probe start/finish order
//! - Common assertions

use crate::probe::{Probe, ProbeError, ProbeResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Macros
// ============================================================================

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Assert that a Result is Err.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?}", val),
            Err(_) => {}
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Ok(val) => panic!("{}: got Ok({:?})", $msg, val),
            Err(_) => {}
        }
    };
}

// ============================================================================
// Call journal
// ============================================================================

/// One entry in a [`CallJournal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEvent {
    Started(String),
    Finished(String),
}

/// Ordered record of probe invocations, shared by clones.
#[derive(Debug, Clone, Default)]
pub struct CallJournal {
    events: Arc<Mutex<Vec<JournalEvent>>>,
}

impl CallJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: JournalEvent) {
        self.events.lock().unwrap().push(event);
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<JournalEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Names of started probes, in start order.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                JournalEvent::Started(name) => Some(name),
                JournalEvent::Finished(_) => None,
            })
            .collect()
    }

    /// How many times `name` was started.
    pub fn invocations(&self, name: &str) -> usize {
        self.started().iter().filter(|started| *started == name).count()
    }

    pub fn was_invoked(&self, name: &str) -> bool {
        self.invocations(name) > 0
    }

    /// Position of the first event matching `event`.
    pub fn position(&self, event: &JournalEvent) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

// ============================================================================
// Scripted probe
// ============================================================================

/// What a [`ScriptedProbe`] does when tested.
#[derive(Debug, Clone)]
pub enum Script {
    /// Resolve immediately.
    Resolve(bool),
    /// Resolve after sleeping on the tokio timer.
    ResolveAfter(bool, Duration),
    /// Return a probe error.
    Fail(String),
    /// Panic inside the probe.
    Panic(String),
    /// Never settle.
    Stall,
}

/// Probe with a fixed script that journals every invocation.
pub struct ScriptedProbe {
    name: String,
    script: Script,
    journal: CallJournal,
}

impl ScriptedProbe {
    pub fn new(name: impl Into<String>, script: Script, journal: &CallJournal) -> Self {
        ScriptedProbe {
            name: name.into(),
            script,
            journal: journal.clone(),
        }
    }

    pub fn passing(name: impl Into<String>, journal: &CallJournal) -> Self {
        Self::new(name, Script::Resolve(true), journal)
    }

    pub fn failing(name: impl Into<String>, journal: &CallJournal) -> Self {
        Self::new(name, Script::Resolve(false), journal)
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn test(&self) -> ProbeResult {
        self.journal.record(JournalEvent::Started(self.name.clone()));
        let result = match &self.script {
            Script::Resolve(value) => Ok(*value),
            Script::ResolveAfter(value, delay) => {
                tokio::time::sleep(*delay).await;
                Ok(*value)
            }
            Script::Fail(message) => Err(ProbeError::Failed(message.clone())),
            Script::Panic(message) => panic!("{}", message),
            Script::Stall => futures::future::pending().await,
        };
        self.journal.record(JournalEvent::Finished(self.name.clone()));
        result
    }
}
