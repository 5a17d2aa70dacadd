use {
    crate::outputs::{AnalogChannel, AnalogOutput},
    anyhow::{anyhow, Context, Result},
    log::{debug, warn},
    std::{
        ffi::{c_char, c_void, CStr, CString},
        ptr,
    },
};

type TaskHandle = *mut c_void;

const DAQMX_VAL_VOLTS: i32 = 10348;
const WRITE_TIMEOUT_SECS: f64 = 10.0;

#[cfg_attr(windows, link(name = "NIDAQmx"))]
#[cfg_attr(not(windows), link(name = "nidaqmx"))]
extern "C" {
    fn DAQmxCreateTask(task_name: *const c_char, task: *mut TaskHandle) -> i32;
    fn DAQmxCreateAOVoltageChan(
        task: TaskHandle,
        physical_channel: *const c_char,
        name_to_assign: *const c_char,
        min_val: f64,
        max_val: f64,
        units: i32,
        custom_scale_name: *const c_char,
    ) -> i32;
    fn DAQmxWriteAnalogScalarF64(
        task: TaskHandle,
        auto_start: u32,
        timeout: f64,
        value: f64,
        reserved: *mut u32,
    ) -> i32;
    fn DAQmxClearTask(task: TaskHandle) -> i32;
    fn DAQmxGetExtendedErrorInfo(error_string: *mut c_char, buffer_size: u32) -> i32;
}

/// Analog output through the NI-DAQmx C driver.
///
/// Every write creates a task, adds the voltage channel, writes one sample and
/// clears the task again.
#[derive(Debug, Default)]
pub struct NiDaqmx;

impl AnalogOutput for NiDaqmx {
    fn write_voltage(&mut self, channel: &AnalogChannel, volts: f64) -> Result<()> {
        let physical = CString::new(channel.name.as_str())
            .with_context(|| format!("Invalid channel name {:?}", channel.name))?;

        let task = Task::create()?;
        // SAFETY: task is live until dropped, strings outlive the call.
        check("DAQmxCreateAOVoltageChan", unsafe {
            DAQmxCreateAOVoltageChan(
                task.0,
                physical.as_ptr(),
                c"".as_ptr(),
                channel.min_volts,
                channel.max_volts,
                DAQMX_VAL_VOLTS,
                ptr::null(),
            )
        })?;

        debug!("DAQmx write {} V to {}", volts, channel.name);
        // SAFETY: task is live; reserved must be null.
        check("DAQmxWriteAnalogScalarF64", unsafe {
            DAQmxWriteAnalogScalarF64(task.0, 1, WRITE_TIMEOUT_SECS, volts, ptr::null_mut())
        })?;

        Ok(())
    }
}

/// Owned DAQmx task, cleared on drop.
struct Task(TaskHandle);

impl Task {
    fn create() -> Result<Self> {
        let mut handle: TaskHandle = ptr::null_mut();
        // SAFETY: the driver writes the new handle into `handle`.
        check("DAQmxCreateTask", unsafe {
            DAQmxCreateTask(c"".as_ptr(), &mut handle)
        })?;
        Ok(Self(handle))
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        // SAFETY: handle came from DAQmxCreateTask and is cleared once.
        let status = unsafe { DAQmxClearTask(self.0) };
        if status < 0 {
            warn!("DAQmxClearTask failed: {}", extended_error_info());
        }
    }
}

fn check(call: &str, status: i32) -> Result<()> {
    if status < 0 {
        return Err(anyhow!(
            "{} failed ({}): {}",
            call,
            status,
            extended_error_info()
        ));
    }
    if status > 0 {
        warn!("{} warning ({}): {}", call, status, extended_error_info());
    }
    Ok(())
}

fn extended_error_info() -> String {
    let mut buf = [0 as c_char; 2048];
    // SAFETY: the driver writes a NUL-terminated string of at most buf.len() bytes.
    let status = unsafe { DAQmxGetExtendedErrorInfo(buf.as_mut_ptr(), buf.len() as u32) };
    if status < 0 {
        return "no error information available".to_string();
    }
    // SAFETY: buf is NUL-terminated by the driver or by its zero initialisation.
    unsafe { CStr::from_ptr(buf.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}
