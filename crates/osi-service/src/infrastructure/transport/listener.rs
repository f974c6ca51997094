//! Platform endpoint: a named pipe on Windows, a Unix domain socket elsewhere.
//!
//! Both variants expose the same shape: [`EndpointListener::new`] only records
//! the endpoint, and [`EndpointListener::accept`] (re)creates whatever OS
//! object is needed and waits for one peer. A failed accept leaves the
//! listener ready to try again after the caller's cooldown.

#[cfg(target_os = "windows")]
pub use pipe::EndpointListener;

#[cfg(not(target_os = "windows"))]
pub use socket::EndpointListener;

#[cfg(target_os = "windows")]
mod pipe {
    use std::io;

    use tokio::net::windows::named_pipe::{NamedPipeServer, ServerOptions};
    use tracing::debug;

    /// Creates one pipe instance per connection.
    #[derive(Debug)]
    pub struct EndpointListener {
        name: String,
        first_instance: bool,
    }

    impl EndpointListener {
        pub fn new(endpoint: &str) -> Self {
            Self {
                name: endpoint.to_string(),
                first_instance: true,
            }
        }

        pub fn endpoint(&self) -> &str {
            &self.name
        }

        /// Creates a fresh pipe instance and waits for a client.
        pub async fn accept(&mut self) -> io::Result<NamedPipeServer> {
            let server = ServerOptions::new()
                .first_pipe_instance(self.first_instance)
                .max_instances(1)
                .create(&self.name)?;
            self.first_instance = false;
            debug!(pipe = %self.name, "waiting for controller");
            server.connect().await?;
            Ok(server)
        }
    }
}

#[cfg(not(target_os = "windows"))]
mod socket {
    use std::io;
    use std::path::PathBuf;

    use tokio::net::{UnixListener, UnixStream};
    use tracing::{debug, warn};

    /// Binds lazily and keeps the socket bound across connections.
    #[derive(Debug)]
    pub struct EndpointListener {
        path: PathBuf,
        listener: Option<UnixListener>,
    }

    impl EndpointListener {
        pub fn new(endpoint: &str) -> Self {
            Self {
                path: PathBuf::from(endpoint),
                listener: None,
            }
        }

        pub fn endpoint(&self) -> &str {
            self.path.to_str().unwrap_or_default()
        }

        /// Waits for a client, binding the socket first if needed.
        pub async fn accept(&mut self) -> io::Result<UnixStream> {
            if self.listener.is_none() {
                self.listener = Some(self.bind()?);
            }
            let Some(listener) = self.listener.as_ref() else {
                return Err(io::Error::other("listener is not bound"));
            };
            match listener.accept().await {
                Ok((stream, _addr)) => Ok(stream),
                Err(e) => {
                    // Rebind on the next attempt.
                    self.listener = None;
                    Err(e)
                }
            }
        }

        fn bind(&self) -> io::Result<UnixListener> {
            match std::fs::remove_file(&self.path) {
                Ok(()) => debug!(path = %self.path.display(), "removed stale socket"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %self.path.display(), "could not remove stale socket: {e}"),
            }
            UnixListener::bind(&self.path)
        }
    }

    impl Drop for EndpointListener {
        fn drop(&mut self) {
            if self.listener.take().is_some() {
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }
}
