//! A terminal stand-in for the robot.
//!
//! Lines the robot would speak are printed, gestures and audio are shown in
//! brackets, and answers are typed on stdin. Typing `#N` shows the answer
//! card with marker ID `N`.

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use quizbot_engine::{Actor, Label, QuizError, Reply, Result, Vocabulary};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// Plays a session in the terminal.
pub struct ConsoleActor<R, W> {
    input: Lines<R>,
    output: W,
    answer_timeout: Duration,
    pauses: bool,
}

impl<R, W> ConsoleActor<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Creates a console actor reading answers from `input`.
    #[must_use]
    pub fn new(input: R, output: W, answer_timeout: Duration) -> Self {
        Self {
            input: input.lines(),
            output,
            answer_timeout,
            pauses: true,
        }
    }

    /// Skips every pause.
    #[must_use]
    pub const fn without_pauses(mut self) -> Self {
        self.pauses = false;
        self
    }

    fn emit(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{line}")
            .and_then(|()| self.output.flush())
            .map_err(|e| QuizError::actor_unavailable(format!("console output failed: {e}")))
    }
}

#[async_trait]
impl<R, W> Actor for ConsoleActor<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    async fn say(&mut self, text: &str) -> Result<()> {
        tracing::debug!(text, "say");
        self.emit(&format!("Robot: {text}"))
    }

    async fn ask(&mut self, question: &str, answers: &Vocabulary) -> Result<Reply> {
        tracing::debug!(question, "ask");
        let labels: Vec<&str> = answers.labels().map(Label::as_str).collect();
        self.emit(&format!("Robot: {question}"))?;
        self.emit(&format!("  [answers: {}]", labels.join(", ")))?;
        write!(self.output, "> ")
            .and_then(|()| self.output.flush())
            .map_err(|e| QuizError::actor_unavailable(format!("console output failed: {e}")))?;

        match tokio::time::timeout(self.answer_timeout, self.input.next_line()).await {
            Err(_) => {
                tracing::debug!(timeout = ?self.answer_timeout, "No answer before timeout");
                self.emit("")?;
                Ok(Reply::Unrecognized)
            }
            Ok(Ok(Some(line))) => Ok(parse_reply(&line)),
            Ok(Ok(None)) => Err(QuizError::actor_unavailable("input closed")),
            Ok(Err(e)) => Err(QuizError::actor_unavailable(format!(
                "failed to read answer: {e}"
            ))),
        }
    }

    async fn play_behavior(&mut self, name: &str) -> Result<()> {
        tracing::debug!(name, "play_behavior");
        self.emit(&format!("  *{name}*"))
    }

    async fn stream_audio(&mut self, resource: &str, blocking: bool) -> Result<()> {
        tracing::debug!(resource, blocking, "stream_audio");
        self.emit(&format!("  [audio] {resource}"))
    }

    async fn pause(&mut self, duration: Duration) -> Result<()> {
        if self.pauses && !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
        Ok(())
    }

    async fn end_session(&mut self) -> Result<()> {
        tracing::debug!("end_session");
        self.emit("  [session ended]")
    }
}

/// Reads a typed line: blank is unrecognized and `#N` is a marker card.
fn parse_reply(line: &str) -> Reply {
    let line = line.trim();
    if line.is_empty() {
        return Reply::Unrecognized;
    }
    match line.strip_prefix('#').map(|id| id.trim().parse::<u32>()) {
        Some(Ok(marker)) => Reply::Marker(marker),
        Some(Err(_)) => Reply::Unrecognized,
        None => Reply::heard(line),
    }
}
