//! Log Consumer Task
//!
//! Single task that drains the log queue and appends each record to the
//! log sink, flushing after every line.

use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::logging::LogQueue;

// == Open Log File ==
/// Creates (or truncates) the log file.
pub async fn open_log_file(path: impl AsRef<Path>) -> io::Result<File> {
    File::create(path).await
}

// == Spawn Log Consumer ==
/// Spawns the log consumer over `sink`.
///
/// The task exits once the queue has been closed and drained, handing the
/// sink back through the join handle. Write failures are reported through
/// `tracing` and do not stop the consumer.
///
/// # Example
/// ```ignore
/// let queue = Arc::new(LogQueue::new(100));
/// let file = open_log_file("proxy.log").await?;
/// let consumer = spawn_log_consumer(queue.clone(), file);
/// // Later, during shutdown:
/// queue.close();
/// consumer.await?;
/// ```
pub fn spawn_log_consumer<W>(queue: Arc<LogQueue>, sink: W) -> JoinHandle<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut sink = sink;
        let mut written: u64 = 0;
        info!("Log consumer started");

        while let Ok(record) = queue.remove().await {
            match write_line(&mut sink, &record.format()).await {
                Ok(()) => written += 1,
                Err(err) => warn!("Failed to write log record: {}", err),
            }
        }

        debug!(records = written, "Log consumer stopped: log queue closed");
        sink
    })
}

async fn write_line<W>(sink: &mut W, line: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    sink.write_all(line.as_bytes()).await?;
    sink.write_all(b"\n").await?;
    sink.flush().await
}
