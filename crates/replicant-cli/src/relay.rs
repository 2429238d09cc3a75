//! The line loop: one call per line of input, one line of output per call.

use std::io::{BufRead, Write};
use std::time::Duration;

use replicant_client::{Call, RequestDriver, Transport, Wait};
use tracing::debug;

use crate::AppError;

const RELAY_TARGET: &str = "replicant_cli::relay";

/// Wait applied to each call. A deadline is measured from the moment the
/// call is submitted, not from program start.
pub(crate) fn wait_for(timeout_ms: Option<u64>) -> Wait {
    match timeout_ms {
        None => Wait::Forever,
        Some(0) => Wait::Poll,
        Some(millis) => Wait::within(Duration::from_millis(millis)),
    }
}

/// Sends every line of `input` through `driver` and writes each result to
/// `output`. Stops at the first failure. Returns the number of completed
/// calls once `input` is exhausted.
pub(crate) fn relay_lines<R, W, T>(
    input: &mut R,
    output: &mut W,
    driver: &mut RequestDriver<T>,
    template: &Call,
    timeout_ms: Option<u64>,
) -> Result<usize, AppError>
where
    R: BufRead,
    W: Write,
    T: Transport,
{
    let mut line: Vec<u8> = Vec::new();
    let mut completed = 0usize;
    loop {
        line.clear();
        if input
            .read_until(b'\n', &mut line)
            .map_err(AppError::ReadInput)?
            == 0
        {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        line.push(0);

        let call = template.with_payload(line.as_slice());
        let result = driver.execute_within(&call, wait_for(timeout_ms))?;
        write_result(output, &result)?;
        completed += 1;
    }
    debug!(target: RELAY_TARGET, completed, "input exhausted");
    Ok(completed)
}

/// Writes the result bytes unchanged, NULs included, followed by a newline.
fn write_result<W: Write>(output: &mut W, result: &[u8]) -> Result<(), AppError> {
    output
        .write_all(result)
        .and_then(|()| output.write_all(b"\n"))
        .and_then(|()| output.flush())
        .map_err(AppError::WriteOutput)
}
