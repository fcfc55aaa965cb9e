use crate::domain::model::PAYMENT_EVENT;
use crate::domain::ports::EventWaiter;
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Reads payment confirmations line by line, one event per non-empty line.
///
/// A line `EventName: payload` raises that event; any other line is taken as
/// a `PaymentResponse` payload. At end of input the waiter parks forever.
pub struct StdinEventWaiter<R: AsyncBufRead + Unpin + Send = BufReader<Stdin>> {
    lines: Lines<R>,
    closed: bool,
}

impl StdinEventWaiter {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> StdinEventWaiter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            closed: false,
        }
    }
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once(':') {
        Some((name, payload)) if !name.trim().is_empty() && !name.contains(char::is_whitespace) => {
            Some((name.trim(), payload.trim()))
        }
        _ => Some((PAYMENT_EVENT, line)),
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventWaiter for StdinEventWaiter<R> {
    async fn wait_for_event(&mut self, name: &str) -> Result<String> {
        loop {
            if self.closed {
                std::future::pending::<()>().await;
            }

            match self.lines.next_line().await? {
                Some(line) => match parse_line(&line) {
                    Some((event, payload)) if event == name => return Ok(payload.to_string()),
                    Some((event, _)) => tracing::debug!("Ignoring event '{}' from stdin", event),
                    None => {}
                },
                None => {
                    tracing::debug!("stdin closed, no more payment events");
                    self.closed = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("paid"), Some((PAYMENT_EVENT, "paid")));
        assert_eq!(
            parse_line("PaymentResponse: receipt 42"),
            Some((PAYMENT_EVENT, "receipt 42"))
        );
        assert_eq!(parse_line("Other: x"), Some(("Other", "x")));
        assert_eq!(parse_line("paid in full: thanks"), Some((PAYMENT_EVENT, "paid in full: thanks")));
        assert_eq!(parse_line("   "), None);
    }

    #[tokio::test]
    async fn test_reads_payment_from_lines() {
        let input: &[u8] = b"\nOther: nope\nPaymentResponse: done\n";
        let mut waiter = StdinEventWaiter::new(BufReader::new(input));

        assert_eq!(waiter.wait_for_event(PAYMENT_EVENT).await.unwrap(), "done");
    }

    #[tokio::test(start_paused = true)]
    async fn test_parks_at_end_of_input() {
        let input: &[u8] = b"";
        let mut waiter = StdinEventWaiter::new(BufReader::new(input));

        let waited =
            tokio::time::timeout(Duration::from_secs(600), waiter.wait_for_event(PAYMENT_EVENT))
                .await;
        assert!(waited.is_err());
    }
}
