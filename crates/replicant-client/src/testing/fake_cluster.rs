use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use replicant_config::SocketEndpoint;

use crate::wire::{ClientFrame, ServerFrame, write_frame};
use crate::{RequestId, StatusCode};

const ACCEPT_DEADLINE: Duration = Duration::from_secs(2);
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// How the fake cluster answers one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Succeed with the payload, minus a trailing NUL terminator.
    Echo,
    /// Succeed with the given output.
    Output(Vec<u8>),
    /// Fail with `status` and an optional diagnostic message.
    Fail {
        /// Completion status.
        status: StatusCode,
        /// Diagnostic attached to the completion.
        message: Option<String>,
    },
    /// Echo, but report the completion under a different identifier.
    Renumber(i64),
    /// Answer with a line that is not a frame.
    Malformed,
    /// Send nothing.
    Silent,
    /// Close the connection without answering.
    HangUp,
}

/// A call as the fake cluster received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Identifier assigned by the client.
    pub nonce: RequestId,
    /// Target object.
    pub object: String,
    /// Target function.
    pub function: String,
    /// Argument bytes.
    pub payload: Vec<u8>,
}

/// Cluster stand-in that accepts one connection on an ephemeral TCP port.
///
/// Replies are consumed in order, one per call; calls beyond the script are
/// echoed. The server stops when the client closes the connection, when a
/// [`Reply::HangUp`] is reached, or when nobody connects within two seconds.
pub struct FakeCluster {
    port: u16,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    outcome: Arc<Mutex<Option<io::Result<()>>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeCluster {
    /// Binds a listener and starts serving in the background.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the listener cannot be bound.
    pub fn spawn(replies: Vec<Reply>) -> io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        listener.set_nonblocking(true)?;
        let port = listener.local_addr()?.port();
        let calls: Arc<Mutex<Vec<RecordedCall>>> = Arc::new(Mutex::new(Vec::new()));
        let outcome: Arc<Mutex<Option<io::Result<()>>>> = Arc::new(Mutex::new(None));
        let calls_clone = Arc::clone(&calls);
        let outcome_clone = Arc::clone(&outcome);
        let handle = thread::spawn(move || {
            let result = serve(&listener, replies.into(), &calls_clone);
            *outcome_clone.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
        });
        Ok(Self {
            port,
            calls,
            outcome,
            handle: Some(handle),
        })
    }

    /// Endpoint clients should connect to.
    #[must_use]
    pub fn endpoint(&self) -> SocketEndpoint {
        SocketEndpoint::tcp("127.0.0.1", self.port)
    }

    /// Waits for the server to stop and returns the calls it received.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the server, if any.
    pub fn take_calls(&mut self) -> io::Result<Vec<RecordedCall>> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| io::Error::other("fake cluster thread panicked"))?;
        }
        if let Some(result) = self
            .outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            result?;
        }
        Ok(self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

impl Drop for FakeCluster {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("fake cluster thread panicked");
        }
    }
}

fn serve(
    listener: &TcpListener,
    mut replies: VecDeque<Reply>,
    calls: &Mutex<Vec<RecordedCall>>,
) -> io::Result<()> {
    let Some(stream) = accept_before_deadline(listener)? else {
        return Ok(());
    };
    stream.set_nonblocking(false)?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let frame: ClientFrame<'static> =
            serde_json::from_str(&line).map_err(io::Error::from)?;
        let ClientFrame::Call {
            nonce,
            object,
            function,
            payload,
        } = frame;
        let recorded = RecordedCall {
            nonce,
            object: object.into_owned(),
            function: function.into_owned(),
            payload: payload.into_owned(),
        };
        let reply = replies.pop_front().unwrap_or(Reply::Echo);
        let response = answer(&recorded, reply);
        calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(recorded);
        match response {
            Answer::Frame(frame) => write_frame(&mut writer, &frame)?,
            Answer::Raw(text) => {
                writer.write_all(text.as_bytes())?;
                writer.write_all(b"\n")?;
                writer.flush()?;
            }
            Answer::Nothing => {}
            Answer::HangUp => return Ok(()),
        }
    }
}

enum Answer {
    Frame(ServerFrame),
    Raw(&'static str),
    Nothing,
    HangUp,
}

fn answer(call: &RecordedCall, reply: Reply) -> Answer {
    let echoed = || {
        let payload = call.payload.strip_suffix(b"\0").unwrap_or(&call.payload);
        Some(payload.to_vec())
    };
    let success = |nonce, output| {
        Answer::Frame(ServerFrame::Completion {
            nonce,
            status: StatusCode::Success,
            output,
            message: None,
        })
    };
    match reply {
        Reply::Echo => success(call.nonce, echoed()),
        Reply::Output(bytes) => success(call.nonce, Some(bytes)),
        Reply::Renumber(nonce) => success(RequestId::new(nonce), echoed()),
        Reply::Fail { status, message } => Answer::Frame(ServerFrame::Completion {
            nonce: call.nonce,
            status,
            output: None,
            message,
        }),
        Reply::Malformed => Answer::Raw("this is not a frame"),
        Reply::Silent => Answer::Nothing,
        Reply::HangUp => Answer::HangUp,
    }
}

fn accept_before_deadline(listener: &TcpListener) -> io::Result<Option<TcpStream>> {
    let deadline = Instant::now() + ACCEPT_DEADLINE;
    loop {
        match listener.accept() {
            Ok((stream, _)) => return Ok(Some(stream)),
            Err(ref error)
                if error.kind() == io::ErrorKind::WouldBlock && Instant::now() < deadline =>
            {
                thread::sleep(ACCEPT_BACKOFF);
            }
            // Nobody connected; the client gave up before dialling.
            Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(None),
            Err(error) => return Err(error),
        }
    }
}
