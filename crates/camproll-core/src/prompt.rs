//! Operator input for room counts.

use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::allocation::RoomCounts;
use crate::error::{CampError, Result};

/// Source of the male/female room counts.
pub trait RoomCountProvider {
    fn room_counts(&mut self) -> Result<RoomCounts>;
}

/// Counts fixed up front, from flags or tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoomCounts(pub RoomCounts);

impl RoomCountProvider for FixedRoomCounts {
    fn room_counts(&mut self) -> Result<RoomCounts> {
        self.0.validate()?;
        Ok(self.0)
    }
}

/// Asks the operator on a line-oriented channel, re-asking until a positive
/// integer is given. Blocks for as long as the operator takes.
pub struct InteractivePrompt<R, W> {
    input: R,
    output: W,
}

impl InteractivePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> InteractivePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Result<usize> {
        loop {
            write!(self.output, "{} ", question)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(CampError::PromptClosed);
            }

            match line.trim().parse::<usize>() {
                Ok(n) if n > 0 => return Ok(n),
                _ => {
                    warn!(input = %line.trim(), "Room count must be a positive whole number");
                    writeln!(self.output, "Please enter a positive whole number.")?;
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> RoomCountProvider for InteractivePrompt<R, W> {
    fn room_counts(&mut self) -> Result<RoomCounts> {
        let male = self.ask("Enter the number of rooms for boys:")?;
        let female = self.ask("Enter the number of rooms for girls:")?;
        Ok(RoomCounts::new(male, female))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_prompt_reads_two_counts() {
        let mut out = Vec::new();
        let counts = InteractivePrompt::new(Cursor::new("3\n2\n"), &mut out)
            .room_counts()
            .unwrap();
        assert_eq!(counts, RoomCounts::new(3, 2));

        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("rooms for boys"));
        assert!(shown.contains("rooms for girls"));
    }

    #[test]
    fn test_prompt_reasks_on_invalid_input() {
        let mut out = Vec::new();
        let counts = InteractivePrompt::new(Cursor::new("abc\n0\n 4 \n1\n"), &mut out)
            .room_counts()
            .unwrap();
        assert_eq!(counts, RoomCounts::new(4, 1));
        let shown = String::from_utf8(out).unwrap();
        assert_eq!(shown.matches("positive whole number").count(), 2);
    }

    #[test]
    fn test_prompt_fails_on_end_of_input() {
        let err = InteractivePrompt::new(Cursor::new("2\n"), Vec::new())
            .room_counts()
            .unwrap_err();
        assert!(matches!(err, CampError::PromptClosed));
    }

    #[test]
    fn test_fixed_counts_are_validated() {
        assert!(FixedRoomCounts(RoomCounts::new(2, 2)).room_counts().is_ok());
        assert!(FixedRoomCounts(RoomCounts::new(2, 0)).room_counts().is_err());
    }
}
