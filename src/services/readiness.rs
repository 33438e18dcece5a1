use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::time::{self, Instant};

pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(100);

/// 被监视进程的输出
#[allow(async_fn_in_trait)]
pub trait OutputSource {
    /// 读取下一行；输出关闭时返回 None
    ///
    /// 必须是 cancel safe 的：超时取消后再次调用不能丢数据
    async fn next_line(&mut self) -> io::Result<Option<String>>;

    /// 进程是否已退出
    fn has_exited(&mut self) -> bool;
}

/// 按行读取，非 UTF-8 字节按替换字符处理
pub struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
        }
    }

    /// read_until 被取消时已读字节留在 buf 中，下次调用继续追加
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        let n = self.reader.read_until(b'\n', &mut self.buf).await?;
        if n == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&self.buf)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        self.buf.clear();
        Ok(Some(line))
    }
}

enum Stream {
    Stdout,
    Stderr,
}

/// stdout + stderr 合并为一个行流
pub struct MergedOutput<O, E> {
    stdout: Option<LineReader<O>>,
    stderr: Option<LineReader<E>>,
}

impl<O, E> MergedOutput<O, E>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    pub fn new(stdout: Option<O>, stderr: Option<E>) -> Self {
        Self {
            stdout: stdout.map(LineReader::new),
            stderr: stderr.map(LineReader::new),
        }
    }

    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            let (stream, line) = match (self.stdout.as_mut(), self.stderr.as_mut()) {
                (None, None) => return Ok(None),
                (Some(out), None) => (Stream::Stdout, out.next_line().await?),
                (None, Some(err)) => (Stream::Stderr, err.next_line().await?),
                (Some(out), Some(err)) => tokio::select! {
                    line = out.next_line() => (Stream::Stdout, line?),
                    line = err.next_line() => (Stream::Stderr, line?),
                },
            };

            match (line, stream) {
                (Some(line), _) => return Ok(Some(line)),
                (None, Stream::Stdout) => self.stdout = None,
                (None, Stream::Stderr) => self.stderr = None,
            }
        }
    }
}

/// 就绪检测：扫描输出直到出现就绪信号
#[derive(Debug, Clone, Copy)]
pub struct ReadinessMonitor {
    pub timeout: Duration,
    /// 单次等待上限，到期后检查截止时间和进程状态
    pub idle_backoff: Duration,
}

impl Default for ReadinessMonitor {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_READY_TIMEOUT,
            idle_backoff: DEFAULT_IDLE_BACKOFF,
        }
    }
}

impl ReadinessMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// 出现信号返回 true；进程退出、输出关闭或超时返回 false
    pub async fn await_ready<S: OutputSource>(&self, source: &mut S, signal: &str) -> bool {
        let needle = signal.to_lowercase();
        let deadline = Instant::now() + self.timeout;

        loop {
            let now = Instant::now();
            if now >= deadline {
                log::warn!("No '{}' within {}s", signal, self.timeout.as_secs());
                return false;
            }

            let wait = self.idle_backoff.min(deadline - now);
            match time::timeout(wait, source.next_line()).await {
                Ok(Ok(Some(line))) => {
                    log::debug!("  > {}", line);
                    if line.to_lowercase().contains(&needle) {
                        return true;
                    }
                }
                Ok(Ok(None)) => {
                    log::warn!("Output closed before '{}' appeared", signal);
                    return false;
                }
                Ok(Err(e)) => {
                    log::warn!("Failed to read process output: {}", e);
                    return false;
                }
                Err(_) => {
                    if source.has_exited() {
                        log::warn!("Process exited before '{}' appeared", signal);
                        return false;
                    }
                }
            }
        }
    }
}
