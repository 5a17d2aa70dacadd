//! Mock hardware shared by the integration tests.
//!
//! The sensor and the output append to one event log so tests can check the
//! order of reads and valve commands.

#![allow(dead_code)]

use {
    anyhow::{anyhow, Result},
    chrono::Utc,
    co2_valve::{
        outputs::{AnalogChannel, AnalogOutput},
        sensors::{Measurement, Sensor},
    },
    std::{cell::RefCell, collections::VecDeque, rc::Rc},
};

pub const OPEN_VOLTS: f64 = 5.0;
pub const CLOSED_VOLTS: f64 = 0.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Read,
    Write(f64),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Ppm(u32),
    Nothing,
    LinkDown,
}

/// Plays back scripted replies, then reports nothing.
pub struct ScriptedSensor {
    replies: VecDeque<Reply>,
    log: EventLog,
}

impl ScriptedSensor {
    pub fn new(replies: &[Reply], log: &EventLog) -> Self {
        Self {
            replies: replies.iter().copied().collect(),
            log: log.clone(),
        }
    }
}

impl Sensor for ScriptedSensor {
    async fn measure(&mut self) -> Result<Option<Measurement>> {
        self.log.borrow_mut().push(Event::Read);
        match self.replies.pop_front().unwrap_or(Reply::Nothing) {
            Reply::Ppm(co2_ppm) => Ok(Some(Measurement {
                time: Utc::now(),
                co2_ppm,
            })),
            Reply::Nothing => Ok(None),
            Reply::LinkDown => Err(anyhow!("serial link down")),
        }
    }
}

pub struct RecordingOutput {
    log: EventLog,
    fail: bool,
}

impl RecordingOutput {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail: false,
        }
    }

    pub fn failing(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail: true,
        }
    }
}

impl AnalogOutput for RecordingOutput {
    fn write_voltage(&mut self, _channel: &AnalogChannel, volts: f64) -> Result<()> {
        self.log.borrow_mut().push(Event::Write(volts));
        if self.fail {
            return Err(anyhow!("DAQ device not found"));
        }
        Ok(())
    }
}

pub fn channel() -> AnalogChannel {
    AnalogChannel {
        name: "Dev1/ao1".to_string(),
        min_volts: 0.0,
        max_volts: 5.0,
    }
}

pub fn writes(log: &EventLog) -> Vec<f64> {
    log.borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Write(v) => Some(*v),
            Event::Read => None,
        })
        .collect()
}
