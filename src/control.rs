use {
    crate::{
        outputs::AnalogOutput,
        sensors::Sensor,
        valve::{Valve, ValveState},
    },
    anyhow::Result,
    log::{debug, error, info, warn},
    std::{convert::Infallible, future::Future, time::Duration},
    tokio::time::{self, MissedTickBehavior},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ControlSettings {
    pub threshold_ppm: u32,
    pub poll_interval: Duration,
    /// Close the valve after this many consecutive cycles without a reading.
    pub fail_safe_after: Option<u32>,
}

pub struct Controller<S, O> {
    sensor: S,
    valve: Valve<O>,
    settings: ControlSettings,
    missed: u32,
}

impl<S: Sensor, O: AnalogOutput> Controller<S, O> {
    pub fn new(sensor: S, valve: Valve<O>, settings: ControlSettings) -> Self {
        Self {
            sensor,
            valve,
            settings,
            missed: 0,
        }
    }

    /// One read-decide-actuate cycle. A cycle without a reading leaves the
    /// valve untouched unless the fail-safe limit has been reached.
    pub async fn step(&mut self) -> Result<()> {
        match self.sensor.measure().await? {
            Some(measurement) => {
                self.missed = 0;
                let state =
                    ValveState::for_concentration(measurement.co2_ppm, self.settings.threshold_ppm);
                debug!(
                    "{} ppm read at {}, valve {}",
                    measurement.co2_ppm,
                    measurement.time.format("%H:%M:%S%.3f"),
                    state
                );
                self.valve.set(state)?;
            }
            None => {
                self.missed = self.missed.saturating_add(1);
                if let Some(limit) = self.settings.fail_safe_after {
                    if self.missed >= limit {
                        warn!("No reading for {} cycles, closing valve", self.missed);
                        self.valve.close()?;
                    }
                }
            }
        }

        Ok(())
    }

    async fn poll(&mut self) -> Result<Infallible> {
        let mut ticker = time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.step().await?;
        }
    }

    /// Closes the valve, then polls until `shutdown` resolves or a cycle fails.
    /// Either way the valve is closed once more before returning.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let outcome = match self.valve.close() {
            Ok(()) => tokio::select! {
                _ = shutdown => {
                    info!("Program interrupted by user");
                    Ok(())
                }
                res = self.poll() => match res {
                    Ok(never) => match never {},
                    Err(e) => Err(e),
                },
            },
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            error!("Error occurred: {:#}", e);
        }

        let closed = self.valve.close();
        if let Err(e) = &closed {
            error!("Failed to close valve during shutdown: {:#}", e);
        }

        outcome.and(closed)
    }
}
