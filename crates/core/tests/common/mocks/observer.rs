use simbus_core::bus::observer::{
    ArbitrationEvent, BusObserver, CompletionEvent, DirectEvent, SubmitEvent, UnitEvent,
};
use simbus_core::bus::ArbitrationRule;
use std::sync::{Arc, Mutex};

/// One event reported by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Submit(SubmitEvent),
    Arbitration(ArbitrationEvent),
    Unit(UnitEvent),
    Complete(CompletionEvent),
    Direct(DirectEvent),
}

/// Shared view of the events recorded so far.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Recorded>>>);

impl EventLog {
    pub fn events(&self) -> Vec<Recorded> {
        self.0.lock().unwrap().clone()
    }

    pub fn arbitrations(&self) -> Vec<ArbitrationEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Arbitration(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    pub fn rules(&self) -> Vec<ArbitrationRule> {
        self.arbitrations().iter().map(|a| a.rule).collect()
    }

    pub fn completions(&self) -> Vec<CompletionEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Complete(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn directs(&self) -> Vec<DirectEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Direct(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Recorded) {
        self.0.lock().unwrap().push(event);
    }
}

/// Observer appending every event to an [`EventLog`].
#[derive(Debug, Default)]
pub struct RecordingObserver {
    log: EventLog,
}

impl RecordingObserver {
    pub fn log(&self) -> EventLog {
        self.log.clone()
    }
}

impl BusObserver for RecordingObserver {
    fn on_submit(&mut self, event: &SubmitEvent) {
        self.log.push(Recorded::Submit(*event));
    }

    fn on_arbitration(&mut self, event: &ArbitrationEvent) {
        self.log.push(Recorded::Arbitration(*event));
    }

    fn on_unit(&mut self, event: &UnitEvent) {
        self.log.push(Recorded::Unit(*event));
    }

    fn on_complete(&mut self, event: &CompletionEvent) {
        self.log.push(Recorded::Complete(*event));
    }

    fn on_direct(&mut self, event: &DirectEvent) {
        self.log.push(Recorded::Direct(*event));
    }
}
