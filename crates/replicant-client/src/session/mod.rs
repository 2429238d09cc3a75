//! Live connection to a cluster member.
//!
//! A [`Session`] writes call frames on the socket from the caller's thread. A
//! dedicated reader thread owns a clone of the socket, decodes completion
//! frames, and pushes them into a single-consumer channel. Waiting for a
//! completion is therefore a blocking channel receive with an optional
//! deadline.

use std::collections::HashSet;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use replicant_config::SocketEndpoint;
use tracing::{debug, info, warn};

#[cfg(unix)]
use std::os::fd::OwnedFd;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use crate::buffer::BufferLedger;
use crate::error::{ConnectError, DisconnectError};
use crate::transport::{Completion, Transport, Wait};
use crate::wire::{ClientFrame, ServerFrame, write_frame};
use crate::{Call, RequestId, StatusCode};

const SESSION_TARGET: &str = "replicant_client::session";

/// Upper bound on establishing the socket connection.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Connection {
    fn try_clone(&self) -> io::Result<Self> {
        match self {
            Self::Tcp(stream) => stream.try_clone().map(Self::Tcp),
            #[cfg(unix)]
            Self::Unix(stream) => stream.try_clone().map(Self::Unix),
        }
    }

    fn shutdown(&self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Self::Unix(stream) => stream.shutdown(Shutdown::Both),
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

enum Incoming {
    Frame(ServerFrame),
    Malformed(String),
}

/// Connection to a cluster member; implements [`Transport`].
pub struct Session {
    endpoint: SocketEndpoint,
    connection: Connection,
    completions: Receiver<Incoming>,
    reader: Option<JoinHandle<()>>,
    next_nonce: i64,
    outstanding: HashSet<RequestId>,
    ledger: Arc<BufferLedger>,
    last_error: Option<(StatusCode, String)>,
}

impl Session {
    /// Connects to `endpoint` and starts the completion reader. No retry is
    /// attempted.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] when the address does not resolve, the socket
    /// cannot be connected, or the reader thread cannot be spawned.
    pub fn connect(endpoint: &SocketEndpoint) -> Result<Self, ConnectError> {
        let connection = open(endpoint)?;
        let spawn_error = |source| ConnectError::Spawn {
            endpoint: endpoint.to_string(),
            source,
        };
        let read_half = connection.try_clone().map_err(spawn_error)?;
        let (sender, completions) = mpsc::channel();
        let reader = thread::Builder::new()
            .name(String::from("replicant-completions"))
            .spawn(move || read_completions(read_half, &sender))
            .map_err(spawn_error)?;
        info!(target: SESSION_TARGET, endpoint = %endpoint, "connected to cluster");
        Ok(Self {
            endpoint: endpoint.clone(),
            connection,
            completions,
            reader: Some(reader),
            next_nonce: 1,
            outstanding: HashSet::new(),
            ledger: BufferLedger::new(),
            last_error: None,
        })
    }

    /// Endpoint this session is connected to.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Number of admitted calls whose completion has not been consumed.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Ledger accounting for the result buffers this session has issued.
    #[must_use]
    pub fn buffers(&self) -> &BufferLedger {
        &self.ledger
    }

    /// Closes the connection. Consumes the session, so teardown runs once.
    ///
    /// # Errors
    ///
    /// Returns [`DisconnectError`] when the socket cannot be shut down or the
    /// completion reader terminated abnormally.
    pub fn disconnect(mut self) -> Result<(), DisconnectError> {
        if !self.outstanding.is_empty() {
            warn!(
                target: SESSION_TARGET,
                outstanding = self.outstanding.len(),
                "disconnecting with calls still outstanding"
            );
        }
        let shutdown = match self.connection.shutdown() {
            Err(error) if error.kind() != io::ErrorKind::NotConnected => Err(DisconnectError {
                status: StatusCode::CommFailed,
                description: format!("failed to close connection: {error}"),
            }),
            _ => Ok(()),
        };
        let joined = match self.reader.take().map(JoinHandle::join) {
            Some(Err(_)) => Err(DisconnectError {
                status: StatusCode::Internal,
                description: String::from("completion reader panicked"),
            }),
            _ => Ok(()),
        };
        shutdown.and(joined)?;
        info!(target: SESSION_TARGET, endpoint = %self.endpoint, "disconnected from cluster");
        Ok(())
    }

    fn fail(&mut self, status: StatusCode, description: String) -> StatusCode {
        debug!(target: SESSION_TARGET, %status, %description, "session error");
        self.last_error = Some((status, description));
        status
    }

    fn receive(&self, wait: Wait) -> Result<Incoming, RecvTimeoutError> {
        match wait {
            Wait::Forever => self
                .completions
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
            Wait::Poll => self.completions.try_recv().map_err(|error| match error {
                TryRecvError::Empty => RecvTimeoutError::Timeout,
                TryRecvError::Disconnected => RecvTimeoutError::Disconnected,
            }),
            Wait::Until(deadline) => self
                .completions
                .recv_timeout(deadline.saturating_duration_since(Instant::now())),
        }
    }

    fn complete(&mut self, frame: ServerFrame) -> Completion {
        let ServerFrame::Completion {
            nonce,
            status,
            output,
            message,
        } = frame;
        if !self.outstanding.remove(&nonce) {
            warn!(target: SESSION_TARGET, request = %nonce, "completion for a call that is not outstanding");
        }
        debug!(target: SESSION_TARGET, request = %nonce, %status, "call completed");
        if status.is_success() {
            let buffer = self.ledger.issue(output.unwrap_or_default());
            return Completion {
                id: nonce,
                status,
                output: Some(buffer),
            };
        }
        let description = message.unwrap_or_else(|| status.description().to_owned());
        self.last_error = Some((status, description));
        Completion {
            id: nonce,
            status,
            output: None,
        }
    }
}

impl Transport for Session {
    fn submit(&mut self, call: &Call) -> Result<RequestId, StatusCode> {
        let nonce = RequestId::new(self.next_nonce);
        if let Err(error) = write_frame(&mut self.connection, &ClientFrame::call(nonce, call)) {
            return Err(self.fail(
                StatusCode::CommFailed,
                format!("failed to send call to {}: {error}", self.endpoint),
            ));
        }
        self.next_nonce += 1;
        self.outstanding.insert(nonce);
        debug!(
            target: SESSION_TARGET,
            request = %nonce,
            object = call.object(),
            function = call.function(),
            payload_len = call.payload().len(),
            "call submitted"
        );
        Ok(nonce)
    }

    fn await_completion(&mut self, wait: Wait) -> Result<Completion, StatusCode> {
        if self.outstanding.is_empty() {
            return Err(self.fail(
                StatusCode::NonePending,
                StatusCode::NonePending.description().to_owned(),
            ));
        }
        match self.receive(wait) {
            Ok(Incoming::Frame(frame)) => Ok(self.complete(frame)),
            Ok(Incoming::Malformed(detail)) => Err(self.fail(
                StatusCode::Garbage,
                format!("malformed completion from cluster: {detail}"),
            )),
            Err(RecvTimeoutError::Timeout) => Err(self.fail(
                StatusCode::Timeout,
                StatusCode::Timeout.description().to_owned(),
            )),
            Err(RecvTimeoutError::Disconnected) => Err(self.fail(
                StatusCode::CommFailed,
                format!("connection to {} was lost", self.endpoint),
            )),
        }
    }

    fn describe(&self, status: StatusCode) -> String {
        match &self.last_error {
            Some((recorded, description)) if *recorded == status => description.clone(),
            _ => status.description().to_owned(),
        }
    }

    fn abandon(&mut self, id: RequestId) {
        if self.outstanding.remove(&id) {
            debug!(target: SESSION_TARGET, request = %id, "abandoned call");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Unblock the reader when the session is abandoned without disconnect.
        if self.reader.take().is_some()
            && let Err(error) = self.connection.shutdown()
        {
            debug!(target: SESSION_TARGET, %error, "failed to shut down abandoned session");
        }
    }
}

fn read_completions(connection: Connection, sender: &Sender<Incoming>) {
    let mut reader = BufReader::new(connection);
    let mut line: Vec<u8> = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) if line.trim_ascii().is_empty() => continue,
            Ok(_) => {
                let incoming = match serde_json::from_slice::<ServerFrame>(&line) {
                    Ok(frame) => Incoming::Frame(frame),
                    Err(error) => Incoming::Malformed(error.to_string()),
                };
                if sender.send(incoming).is_err() {
                    break;
                }
            }
            Err(error) => {
                debug!(target: SESSION_TARGET, %error, "completion reader stopped");
                break;
            }
        }
    }
}

fn open(endpoint: &SocketEndpoint) -> Result<Connection, ConnectError> {
    match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            let address = resolve_tcp_address(host, *port).map_err(|source| {
                ConnectError::Resolve {
                    endpoint: endpoint.to_string(),
                    source,
                }
            })?;
            let stream = TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT).map_err(
                |source| ConnectError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                },
            )?;
            if let Err(error) = stream.set_nodelay(true) {
                debug!(target: SESSION_TARGET, %error, "could not disable Nagle's algorithm");
            }
            Ok(Connection::Tcp(stream))
        }
        SocketEndpoint::Unix { path } => {
            #[cfg(unix)]
            {
                connect_unix(path.as_str()).map_err(|source| ConnectError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })
            }

            #[cfg(not(unix))]
            {
                let _ = path;
                Err(ConnectError::UnsupportedUnixTransport(endpoint.to_string()))
            }
        }
    }
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

#[cfg(unix)]
fn connect_unix(path: &str) -> io::Result<Connection> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, CONNECTION_TIMEOUT)?;
    let stream = UnixStream::from(OwnedFd::from(socket));
    Ok(Connection::Unix(stream))
}
