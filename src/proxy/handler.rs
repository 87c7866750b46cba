//! Request Handler
//!
//! The per-connection pipeline run by workers: parse the request, answer
//! from the cache when possible, otherwise relay the upstream response and
//! admit it into the cache if it is small enough.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use crate::cache::{Admission, SharedCache};
use crate::error::{ProxyError, Result};
use crate::logging::Logger;
use crate::proxy::request::{build_upstream_request, RequestHead, Target};
use crate::proxy::response::error_page_for;
use crate::proxy::Connection;
use crate::tasks::ConnectionHandler;

const TAG: &str = "handler";

/// Read size when relaying upstream bytes
const CHUNK_SIZE: usize = 8192;

// == Proxy Handler ==
/// Caching relay shared by every worker.
#[derive(Debug, Clone)]
pub struct ProxyHandler {
    cache: SharedCache,
    logger: Logger,
    /// Largest body that is buffered for caching
    max_object_size: usize,
}

impl ProxyHandler {
    pub fn new(cache: SharedCache, logger: Logger, max_object_size: usize) -> Self {
        Self {
            cache,
            logger,
            max_object_size,
        }
    }

    // == Serve ==
    /// Serves one request read from `reader`, answering on `writer`.
    pub async fn serve<R, W>(&self, reader: R, writer: &mut W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let head = match RequestHead::read_from(&mut reader).await {
            Ok(head) => head,
            Err(err) => return Err(reject(writer, err).await),
        };

        if !head.is_get() {
            return Err(reject(writer, ProxyError::NotImplemented(head.method)).await);
        }

        if let Some(payload) = self.cache.try_get(&head.uri).await {
            self.logger
                .log(TAG, format!("Cache hit! --> {}, {} bytes.", head.uri, payload.len()))
                .await;
            writer.write_all(&payload).await?;
            writer.flush().await?;
            return Ok(());
        }

        self.logger.log(TAG, format!("cache miss --> {}", head.uri)).await;

        let target = match Target::parse(&head.uri) {
            Ok(target) => target,
            Err(err) => return Err(reject(writer, err).await),
        };
        let request = build_upstream_request(&head, &target);

        let mut upstream = match TcpStream::connect((target.host.as_str(), target.port)).await {
            Ok(stream) => stream,
            Err(source) => {
                self.logger
                    .log(
                        TAG,
                        format!("Server connection failed --> {}:{} ({})", target.host, target.port, source),
                    )
                    .await;
                return Err(ProxyError::Upstream {
                    host: target.host,
                    port: target.port,
                    source,
                });
            }
        };
        debug!(host = %target.host, port = target.port, "Connected upstream");

        upstream.write_all(request.as_bytes()).await?;

        let relayed = relay(&mut upstream, writer, self.max_object_size).await?;
        self.logger
            .log(TAG, format!("Bytes received: {}", relayed.received))
            .await;

        match relayed.body {
            Some(body) => self.store(head.uri, body).await,
            None => {
                self.logger
                    .log(
                        TAG,
                        format!("Object too large to cache --> {}, {} bytes.", head.uri, relayed.received),
                    )
                    .await;
            }
        }

        Ok(())
    }

    // == Store ==
    async fn store(&self, uri: String, body: Vec<u8>) {
        match self.cache.admit(uri.clone(), body).await {
            Admission::Admitted { evicted, total_size } => {
                for eviction in evicted {
                    self.logger
                        .log(
                            TAG,
                            format!(
                                "Evicted {} ({} bytes), cache size after evicting --> {}.",
                                eviction.key, eviction.size, eviction.total_size_after
                            ),
                        )
                        .await;
                }
                self.logger
                    .log(TAG, format!("Cache size after adding {} --> {}.", uri, total_size))
                    .await;
            }
            Admission::TooLarge { size } => {
                self.logger
                    .log(TAG, format!("Object too large to cache --> {}, {} bytes.", uri, size))
                    .await;
            }
        }
    }
}

impl ConnectionHandler<Connection> for ProxyHandler {
    async fn handle(&self, conn: Connection) -> Result<()> {
        let Connection { mut stream, peer } = conn;
        debug!(%peer, "Serving connection");

        let (reader, mut writer) = stream.split();
        self.serve(reader, &mut writer).await
    }
}

// == Reject ==
/// Sends the error page for `err` (if it has one) and hands the error back.
async fn reject<W>(writer: &mut W, err: ProxyError) -> ProxyError
where
    W: AsyncWrite + Unpin,
{
    if let Some(page) = error_page_for(&err) {
        // The client may already be gone; the error is reported either way
        let _ = writer.write_all(page.as_bytes()).await;
        let _ = writer.flush().await;
    }
    err
}

// == Relay ==
/// Outcome of streaming an upstream response to the client.
#[derive(Debug)]
struct Relayed {
    /// Total bytes received from upstream
    received: usize,
    /// Complete body, if it fit under the per-object ceiling
    body: Option<Vec<u8>>,
}

/// Copies `upstream` to `client` until EOF, keeping a copy of the bytes
/// while the running total stays within `max_object_size`.
async fn relay<R, W>(upstream: &mut R, client: &mut W, max_object_size: usize) -> Result<Relayed>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut body = Vec::new();
    let mut received = 0usize;

    loop {
        let n = upstream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        received += n;
        if received <= max_object_size {
            body.extend_from_slice(&chunk[..n]);
        } else if !body.is_empty() {
            body = Vec::new();
        }
        client.write_all(&chunk[..n]).await?;
    }
    client.flush().await?;

    Ok(Relayed {
        received,
        body: (received <= max_object_size).then_some(body),
    })
}
