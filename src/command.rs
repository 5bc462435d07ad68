//! Operator commands.
//!
//! Commands are line-oriented and arrive on stdin. A reader thread parses
//! them and forwards them to the frame loop over a channel, which drains it
//! once per frame without blocking.

use std::io::BufRead;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::Sender;

use crate::geometry::PixelPoint;

#[derive(Clone, Debug, PartialEq)]
pub enum OperatorCommand {
    /// Pointer click at pixel coordinates of the current frame.
    AddPoint(PixelPoint),
    UndoPoint,
    /// Close the draft polygon, optionally naming the zone.
    Commit(Option<String>),
    Quit,
    ResetAlertCount,
    ToggleAudio,
}

impl OperatorCommand {
    /// Parse one input line. Blank lines and `#` comments yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let cmd = match word.to_ascii_lowercase().as_str() {
            "point" | "p" => {
                let mut coords = rest.split_whitespace();
                let (Some(x), Some(y), None) = (coords.next(), coords.next(), coords.next())
                else {
                    return Err(anyhow!("usage: point <x> <y>"));
                };
                let x: f32 = x
                    .parse()
                    .map_err(|_| anyhow!("point x must be a number, got '{}'", x))?;
                let y: f32 = y
                    .parse()
                    .map_err(|_| anyhow!("point y must be a number, got '{}'", y))?;
                OperatorCommand::AddPoint(PixelPoint::new(x, y))
            }
            "undo" | "u" => OperatorCommand::UndoPoint,
            "commit" | "d" => {
                OperatorCommand::Commit((!rest.is_empty()).then(|| rest.to_string()))
            }
            "quit" | "q" => OperatorCommand::Quit,
            "reset" | "r" => OperatorCommand::ResetAlertCount,
            "audio" | "m" => OperatorCommand::ToggleAudio,
            other => return Err(anyhow!("unknown command '{}'", other)),
        };
        if !rest.is_empty()
            && !matches!(
                cmd,
                OperatorCommand::AddPoint(_) | OperatorCommand::Commit(_)
            )
        {
            return Err(anyhow!("'{}' takes no arguments", word));
        }
        Ok(Some(cmd))
    }
}

/// Read commands from `reader` until EOF, forwarding them to `tx`.
///
/// Bad lines are logged and skipped. Returns when the input ends or the
/// receiving side hangs up.
pub fn forward_commands<R: BufRead>(reader: R, tx: &Sender<OperatorCommand>) -> Result<()> {
    for line in reader.lines() {
        let line = line.context("failed to read operator input")?;
        match OperatorCommand::parse(&line) {
            Ok(Some(cmd)) => {
                if tx.send(cmd).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => log::warn!("ignoring operator input: {}", err),
        }
    }
    Ok(())
}

/// Spawn the stdin reader thread.
pub fn spawn_stdin_reader(tx: Sender<OperatorCommand>) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("operator_input".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            if let Err(err) = forward_commands(stdin.lock(), &tx) {
                log::warn!("operator input closed: {}", err);
            }
        })?;
    Ok(handle)
}

/// Map Ctrl-C to `Quit` so shutdown goes through the normal path.
pub fn install_interrupt_handler(tx: Sender<OperatorCommand>) -> Result<()> {
    ctrlc::set_handler(move || {
        let _ = tx.send(OperatorCommand::Quit);
    })
    .context("error setting Ctrl-C handler")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn parses_commands_and_aliases() {
        let cases = [
            ("point 320 240", OperatorCommand::AddPoint(PixelPoint::new(320.0, 240.0))),
            ("  p 1.5 2 ", OperatorCommand::AddPoint(PixelPoint::new(1.5, 2.0))),
            ("undo", OperatorCommand::UndoPoint),
            ("u", OperatorCommand::UndoPoint),
            ("commit", OperatorCommand::Commit(None)),
            ("d", OperatorCommand::Commit(None)),
            (
                "commit loading bay",
                OperatorCommand::Commit(Some("loading bay".into())),
            ),
            ("QUIT", OperatorCommand::Quit),
            ("q", OperatorCommand::Quit),
            ("r", OperatorCommand::ResetAlertCount),
            ("audio", OperatorCommand::ToggleAudio),
            ("m", OperatorCommand::ToggleAudio),
        ];
        for (line, expected) in cases {
            assert_eq!(OperatorCommand::parse(line).unwrap(), Some(expected), "{}", line);
        }
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(OperatorCommand::parse("").unwrap(), None);
        assert_eq!(OperatorCommand::parse("   # note").unwrap(), None);
    }

    #[test]
    fn rejects_malformed_input() {
        for line in ["point 1", "point a b", "point 1 2 3", "jump", "quit now"] {
            assert!(OperatorCommand::parse(line).is_err(), "{}", line);
        }
    }

    #[test]
    fn forwards_valid_lines_in_order() -> Result<()> {
        let (tx, rx) = unbounded();
        let input = "point 10 10\nbogus\n\ncommit\nq\n";
        forward_commands(input.as_bytes(), &tx)?;
        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                OperatorCommand::AddPoint(PixelPoint::new(10.0, 10.0)),
                OperatorCommand::Commit(None),
                OperatorCommand::Quit,
            ]
        );
        Ok(())
    }
}
