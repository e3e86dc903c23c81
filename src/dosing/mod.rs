use crate::config::DosingRegimen;
use crate::error::SimResult;

#[derive(Debug, Clone, Copy)]
pub struct DoseEvent {
    pub time: f64,
    pub amount: f64,
}

/// Repeated-bolus schedule expanded from a regimen over a fixed horizon.
#[derive(Debug, Clone)]
pub struct DoseSchedule {
    events: Vec<DoseEvent>,
}

impl DoseSchedule {
    /// Doses fire at 0, interval, 2*interval, ... while the dose time stays
    /// strictly below the horizon.
    pub fn from_regimen(regimen: &DosingRegimen, horizon_hours: f64) -> SimResult<Self> {
        regimen.validate()?;

        let mut events = Vec::new();
        let mut time = 0.0;
        while time < horizon_hours {
            events.push(DoseEvent {
                time,
                amount: regimen.dose_mg,
            });
            time += regimen.interval_hours;
        }

        Ok(Self { events })
    }

    /// Schedule from explicit dose events, sorted by time.
    pub fn from_events(mut events: Vec<DoseEvent>) -> Self {
        events.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { events }
    }

    pub fn events(&self) -> &[DoseEvent] {
        &self.events
    }

    /// Doses already administered at `time`, i.e. fired at or before it.
    /// Events are sorted by construction.
    pub fn events_before(&self, time: f64) -> &[DoseEvent] {
        let end = self.events.partition_point(|event| event.time <= time);
        &self.events[..end]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
