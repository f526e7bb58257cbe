//! Bridge between rasterized frames and the external video encoder.
//!
//! One invocation owns one `ffmpeg` child process: raw RGB frames are fed
//! into its standard input one at a time (kernel pipe backpressure, no
//! unbounded queueing) while the encoded WebM bytes coming out of its
//! standard output are relayed into a bounded channel consumed by the HTTP
//! response body. Teardown is guaranteed on every exit path: a consumer
//! that goes away mid-stream surfaces as a failed channel send, which kills
//! and reaps the child and aborts the feeder; `kill_on_drop` backstops the
//! remaining paths.

use std::process::Stdio;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error};
use utoipa::ToSchema;

/// Bounded number of encoded chunks buffered between the encoder and a slow
/// consumer before the whole pipeline stalls.
const OUTPUT_CHANNEL_CAPACITY: usize = 8;
/// Read granularity on the encoder's standard output.
const READ_CHUNK: usize = 16 * 1024;

/// Interchangeable real-time codec profiles of the WebM container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// libvpx with the realtime deadline.
    Vp8,
    /// libvpx-vp9 with row multithreading and speed-first settings.
    #[default]
    Vp9,
}

impl Codec {
    fn encoder_args(self) -> &'static [&'static str] {
        match self {
            Codec::Vp8 => &[
                "-c:v",
                "libvpx",
                "-deadline",
                "realtime",
                "-cpu-used",
                "8",
                "-pix_fmt",
                "yuv420p",
            ],
            Codec::Vp9 => &[
                "-c:v",
                "libvpx-vp9",
                "-row-mt",
                "1",
                "-speed",
                "8",
                "-tile-columns",
                "2",
                "-pix_fmt",
                "yuv420p",
                "-auto-alt-ref",
                "1",
                "-lag-in-frames",
                "25",
            ],
        }
    }
}

/// Build the encoder invocation: raw RGB24 square frames on stdin, a WebM
/// stream on stdout, rate-control tuned for live delivery over quality.
pub fn encoder_command(ffmpeg: &str, codec: Codec, size: u32, frame_rate: u32) -> Command {
    let mut command = Command::new(ffmpeg);
    command.args([
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgb24",
        "-video_size",
        &format!("{size}x{size}"),
        "-framerate",
        &frame_rate.to_string(),
        "-i",
        "pipe:0",
    ]);
    command.args(codec.encoder_args());
    command.args(["-b:v", "0", "-crf", "32", "-an", "-f", "webm", "pipe:1"]);
    command
}

/// Terminal failures of one streaming attempt. None of these are retried,
/// and none touch the underlying game session.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// The encoder binary could not be spawned.
    #[error("failed to launch encoder `{program}`")]
    Launch {
        /// Program path that failed to start.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },
    /// A pipe to or from the encoder failed mid-stream.
    #[error("encoder pipe failed")]
    Write(#[source] std::io::Error),
    /// The encoder terminated unsuccessfully.
    #[error("encoder exited with {0}")]
    NonZeroExit(std::process::ExitStatus),
    /// The consumer of the encoded stream went away.
    #[error("output sink closed before the stream completed")]
    SinkClosed,
}

/// One chunk of the encoded bitstream, or the failure that ended it.
pub type VideoChunk = Result<Vec<u8>, EncoderError>;

/// A launched encoder child with both pipes captured.
pub struct EncoderProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
}

impl EncoderProcess {
    /// Spawn the encoder with piped stdio. `kill_on_drop` guarantees the
    /// child cannot outlive the pipeline that owns it.
    pub fn launch(mut command: Command) -> Result<Self, EncoderError> {
        let program = command
            .as_std()
            .get_program()
            .to_string_lossy()
            .into_owned();

        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| EncoderError::Launch {
            program: program.clone(),
            source,
        })?;

        let stdin = child.stdin.take().ok_or_else(|| EncoderError::Launch {
            program: program.clone(),
            source: std::io::Error::other("encoder stdin was not captured"),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| EncoderError::Launch {
            program,
            source: std::io::Error::other("encoder stdout was not captured"),
        })?;

        Ok(Self {
            child,
            stdin,
            stdout,
        })
    }

    /// Drive the full pipeline: feed every frame, relay the encoded output
    /// into `output`, then reap the child.
    ///
    /// Returns once the child has exited (or been killed); no partially
    /// written process is ever left behind.
    pub async fn run(
        self,
        frames: Vec<Arc<Vec<u8>>>,
        output: &mpsc::Sender<VideoChunk>,
    ) -> Result<(), EncoderError> {
        let EncoderProcess {
            mut child,
            stdin,
            mut stdout,
        } = self;

        let feeder = tokio::spawn(feed_frames(stdin, frames));

        match relay_output(&mut stdout, output).await {
            Ok(()) => {
                let status = child.wait().await.map_err(EncoderError::Write)?;
                let fed = feeder.await;
                if !status.success() {
                    return Err(EncoderError::NonZeroExit(status));
                }
                match fed {
                    Ok(result) => result,
                    // The feeder was cancelled; the stream itself completed.
                    Err(_) => Ok(()),
                }
            }
            Err(err) => {
                feeder.abort();
                let _ = child.start_kill();
                let _ = child.wait().await;
                Err(err)
            }
        }
    }
}

/// Write frames one at a time, then close stdin to signal end-of-stream.
/// `write_all` on the pipe is the backpressure point: a stalled encoder
/// stalls the feeder, never an in-memory queue.
async fn feed_frames(
    mut stdin: ChildStdin,
    frames: Vec<Arc<Vec<u8>>>,
) -> Result<(), EncoderError> {
    for frame in frames {
        stdin.write_all(&frame).await.map_err(EncoderError::Write)?;
    }
    stdin.shutdown().await.map_err(EncoderError::Write)?;
    Ok(())
}

/// Relay encoded chunks into the bounded output channel. A failed send
/// means the consumer dropped the stream.
async fn relay_output(
    stdout: &mut ChildStdout,
    output: &mpsc::Sender<VideoChunk>,
) -> Result<(), EncoderError> {
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let read = stdout.read(&mut chunk).await.map_err(EncoderError::Write)?;
        if read == 0 {
            return Ok(());
        }
        if output.send(Ok(chunk[..read].to_vec())).await.is_err() {
            return Err(EncoderError::SinkClosed);
        }
    }
}

/// Run the pipeline in the background and hand back the stream of encoded
/// chunks for the response body. Failures after the first byte can only be
/// signalled by aborting the stream; they are logged here.
pub fn stream(process: EncoderProcess, frames: Vec<Arc<Vec<u8>>>) -> ReceiverStream<VideoChunk> {
    let (tx, rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        match process.run(frames, &tx).await {
            Ok(()) => debug!("sequence video stream completed"),
            Err(EncoderError::SinkClosed) => {
                debug!("client went away mid-stream; encoder terminated");
            }
            Err(err) => {
                error!(error = %err, "sequence video encoding failed");
                let _ = tx.send(Err(err)).await;
            }
        }
    });

    ReceiverStream::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(chunks: &[&[u8]]) -> Vec<Arc<Vec<u8>>> {
        chunks
            .iter()
            .map(|chunk| Arc::new(chunk.to_vec()))
            .collect()
    }

    #[test]
    fn vp8_and_vp9_profiles_select_their_codecs() {
        let vp8 = encoder_command("ffmpeg", Codec::Vp8, 300, 10);
        let args: Vec<String> = vp8
            .as_std()
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"libvpx".to_string()));
        assert!(args.contains(&"realtime".to_string()));
        assert!(args.contains(&"300x300".to_string()));

        let vp9 = encoder_command("ffmpeg", Codec::Vp9, 512, 10);
        let args: Vec<String> = vp9
            .as_std()
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"libvpx-vp9".to_string()));
        assert!(args.contains(&"512x512".to_string()));
        assert!(args.ends_with(&["pipe:1".to_string()]));
    }

    #[tokio::test]
    async fn relays_child_output_in_order() {
        // `cat` echoes the fed frames back, standing in for the encoder.
        let process = EncoderProcess::launch(Command::new("cat")).expect("spawn cat");
        let (tx, mut rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);

        let runner = tokio::spawn(async move {
            process
                .run(frames(&[b"hello " as &[u8], b"world"]), &tx)
                .await
        });

        let mut collected = Vec::new();
        while let Some(chunk) = rx.recv().await {
            collected.extend(chunk.expect("clean chunk"));
        }

        assert_eq!(collected, b"hello world");
        runner.await.expect("join").expect("pipeline");
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported() {
        let process = EncoderProcess::launch(Command::new("false")).expect("spawn false");
        let (tx, _rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);

        let outcome = process.run(frames(&[b"frame" as &[u8]]), &tx).await;
        assert!(matches!(outcome, Err(EncoderError::NonZeroExit(_))));
    }

    #[tokio::test]
    async fn dropped_sink_terminates_the_pipeline() {
        let process = EncoderProcess::launch(Command::new("cat")).expect("spawn cat");
        let (tx, rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        drop(rx);

        let outcome = process.run(frames(&[b"some bytes" as &[u8]]), &tx).await;
        assert!(matches!(outcome, Err(EncoderError::SinkClosed)));
    }

    #[tokio::test]
    async fn missing_binary_fails_at_launch() {
        let outcome = EncoderProcess::launch(Command::new("/nonexistent/encoder-binary"));
        assert!(matches!(outcome, Err(EncoderError::Launch { .. })));
    }
}
