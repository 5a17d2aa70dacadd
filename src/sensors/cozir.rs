use {
    crate::sensors::{parse_reply, Measurement, ReplyError, Sensor},
    anyhow::{Context, Result},
    chrono::Utc,
    log::{debug, info, warn},
    serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits},
    std::{
        io::{self, ErrorKind, Read, Write},
        str,
        time::Duration,
    },
    tokio::time,
};

const QUERY: &[u8] = b"Z\r\n";

/// Byte stream to the sensor that can report how much input is buffered.
pub trait SerialLink: Read + Write {
    fn bytes_waiting(&mut self) -> io::Result<usize>;
}

impl SerialLink for Box<dyn SerialPort> {
    fn bytes_waiting(&mut self) -> io::Result<usize> {
        Ok(self.bytes_to_read()? as usize)
    }
}

/// CO2 sensor answering `Z\r\n` queries with `Z <ppm>`.
pub struct Cozir<L> {
    link: L,
    response_delay: Duration,
}

impl Cozir<Box<dyn SerialPort>> {
    /// Opens `port` at 8N1, no flow control, with non-blocking reads.
    pub fn open(port: &str, baud: u32, response_delay: Duration) -> Result<Self> {
        let link = serialport::new(port, baud)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(Duration::ZERO)
            .open()
            .with_context(|| format!("Failed to open serial port {}", port))?;

        info!("Opened {} at {} baud", port, baud);

        Ok(Self::new(link, response_delay))
    }
}

impl<L: SerialLink> Cozir<L> {
    pub fn new(link: L, response_delay: Duration) -> Self {
        Self {
            link,
            response_delay,
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    fn read_buffered(&mut self) -> Result<Vec<u8>> {
        let waiting = self
            .link
            .bytes_waiting()
            .context("Failed to poll sensor input buffer")?;

        let mut buf = vec![0; waiting];
        let mut filled = 0;
        while filled < waiting {
            match self.link.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => break,
                Err(e) => return Err(e).context("Failed to read from sensor"),
            }
        }
        buf.truncate(filled);

        Ok(buf)
    }
}

impl<L: SerialLink> Sensor for Cozir<L> {
    async fn measure(&mut self) -> Result<Option<Measurement>> {
        self.link
            .write_all(QUERY)
            .context("Failed to send query to sensor")?;

        time::sleep(self.response_delay).await;

        let raw = self.read_buffered()?;
        if raw.is_empty() {
            debug!("No reply from sensor");
            return Ok(None);
        }

        let parsed = str::from_utf8(&raw)
            .map_err(|_| ReplyError::NotUtf8)
            .and_then(|reply| {
                debug!("Raw data: {:?}", reply);
                parse_reply(reply)
            });

        match parsed {
            Ok(co2_ppm) => {
                info!("CO2 concentration: {} ppm", co2_ppm);
                Ok(Some(Measurement {
                    time: Utc::now(),
                    co2_ppm,
                }))
            }
            Err(e) => {
                warn!(
                    "Failed to parse sensor reply {:?}: {}",
                    String::from_utf8_lossy(&raw),
                    e
                );
                Ok(None)
            }
        }
    }
}
