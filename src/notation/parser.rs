//! Recursive-descent parser for sheet notation
//!
//! Format:
//! ```text
//! #: set tempo 120          # directives, only before the first note
//! C4.10 E4.10 (G4.5 P.5)    # notes, pauses and groups play in sequence
//! C4.20-E4.20-G4.20         # `-` starts the next sibling at the same tick
//! ```
//!
//! Notes are `<pitch>[#|b]<octave>.<duration>`; pauses are `P.<duration>`.

use super::lexer::{LexError, Lexer, Token};
use super::note::Note;
use std::fmt;

/// Parser options that can be changed by `#: set` directives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    /// Informational only; timing is decided when arranging
    pub tempo: u32,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self { tempo: 250 }
    }
}

impl SheetConfig {
    fn set(&mut self, key: &str, value: &str, position: usize) -> Result<(), ParseError> {
        match key {
            "tempo" | "temp" => {
                self.tempo = value.parse().map_err(|_| ParseError::InvalidParameterValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    position,
                })?;
                Ok(())
            }
            _ => Err(ParseError::UnknownParameter {
                key: key.to_string(),
                position,
            }),
        }
    }
}

/// A note placed at a tick offset from the start of the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub tick: u64,
    pub note: Note,
}

/// Result of parsing a sheet
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Pitched notes sorted by tick; pauses are never included
    pub schedule: Vec<ScheduleEntry>,
    /// Furthest tick the cursor reached
    pub end_tick: u64,
    pub config: SheetConfig,
}

/// Parse errors
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    Lex(LexError),
    UnexpectedToken { found: String, position: usize },
    UnmatchedBracket { position: usize },
    DanglingStack { position: usize },
    TrailingContent { found: String, position: usize },
    UnknownDirective { command: String, position: usize },
    MalformedDirective { text: String, position: usize },
    UnknownParameter { key: String, position: usize },
    InvalidParameterValue { key: String, value: String, position: usize },
    /// The tick cursor or a group duration no longer fits in a `u64`
    TickOverflow { position: usize },
    NestingTooDeep { position: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex(e) => write!(f, "{}", e),
            ParseError::UnexpectedToken { found, position } => {
                write!(f, "Unexpected '{}' at position {}", found, position)
            }
            ParseError::UnmatchedBracket { position } => {
                write!(f, "Unmatched '(' opened at position {}", position)
            }
            ParseError::DanglingStack { position } => {
                write!(f, "'-' at position {} is not followed by a note or group", position)
            }
            ParseError::TrailingContent { found, position } => {
                write!(f, "Trailing '{}' at position {}", found, position)
            }
            ParseError::UnknownDirective { command, position } => {
                write!(f, "Unknown directive '{}' at position {}", command, position)
            }
            ParseError::MalformedDirective { text, position } => {
                write!(f, "Malformed directive '{}' at position {}", text, position)
            }
            ParseError::UnknownParameter { key, position } => {
                write!(f, "Unknown parameter '{}' at position {}", key, position)
            }
            ParseError::InvalidParameterValue { key, value, position } => write!(
                f,
                "Invalid value '{}' for parameter '{}' at position {}",
                value, key, position
            ),
            ParseError::TickOverflow { position } => {
                write!(f, "Sheet too long: tick overflow at position {}", position)
            }
            ParseError::NestingTooDeep { position } => write!(
                f,
                "Brackets nested deeper than {} at position {}",
                MAX_NESTING, position
            ),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Lex(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError::Lex(e)
    }
}

const CONTROL_PREFIX: &str = "#:";

/// Deepest bracket nesting accepted before the parse is aborted
pub const MAX_NESTING: usize = 256;

/// Sheet parser holding the tick cursor and the schedule built so far
pub struct Parser {
    lexer: Lexer,
    current: Token,
    /// Start position of `current`
    current_position: usize,
    tick: u64,
    end_tick: u64,
    /// Number of currently open brackets
    depth: usize,
    config: SheetConfig,
    schedule: Vec<ScheduleEntry>,
}

impl Parser {
    pub fn new(input: &str, config: SheetConfig) -> Self {
        Self {
            lexer: Lexer::new(input),
            current: Token::End,
            current_position: 0,
            tick: 0,
            end_tick: 0,
            depth: 0,
            config,
            schedule: Vec::new(),
        }
    }

    fn next_token(&mut self) -> Result<(), ParseError> {
        self.current_position = self.lexer.position();
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn is_ignorable(&self) -> bool {
        matches!(self.current, Token::Whitespace | Token::Comment(_))
    }

    /// Parse the whole input into a sorted schedule
    pub fn parse(mut self) -> Result<Sheet, ParseError> {
        self.next_token()?;
        self.parse_control_comments()?;
        self.parse_sheet()?;

        match self.current {
            Token::End => {}
            ref other => {
                return Err(ParseError::TrailingContent {
                    found: other.to_string(),
                    position: self.current_position,
                });
            }
        }

        self.schedule.sort_by_key(|entry| entry.tick);
        Ok(Sheet {
            schedule: self.schedule,
            end_tick: self.end_tick,
            config: self.config,
        })
    }

    /// Apply `#: set <key> <value>` directives found before the first note
    fn parse_control_comments(&mut self) -> Result<(), ParseError> {
        while self.is_ignorable() {
            if let Token::Comment(text) = &self.current {
                if let Some(directive) = text.strip_prefix(CONTROL_PREFIX) {
                    let directive = directive.trim().to_string();
                    self.apply_directive(&directive)?;
                }
            }
            self.next_token()?;
        }
        Ok(())
    }

    fn apply_directive(&mut self, directive: &str) -> Result<(), ParseError> {
        let position = self.current_position;
        let malformed = || ParseError::MalformedDirective {
            text: directive.to_string(),
            position,
        };

        let (command, args) = directive.split_once(' ').ok_or_else(malformed)?;
        match command {
            "set" => {
                let (key, value) = args.trim().split_once(' ').ok_or_else(malformed)?;
                self.config.set(key, value.trim(), position)
            }
            _ => Err(ParseError::UnknownDirective {
                command: command.to_string(),
                position,
            }),
        }
    }

    /// Parse a sequence of notes and groups
    ///
    /// Returns the sum of the tick durations of the direct children.
    fn parse_sheet(&mut self) -> Result<u64, ParseError> {
        let mut duration = 0;
        let mut pending_stack: Option<usize> = None;

        loop {
            match self.current {
                Token::Note(_) | Token::BracketOpen => {
                    let position = self.current_position;
                    let (consumed, stack) = self.parse_element()?;
                    duration = checked_ticks(duration, consumed, position)?;
                    pending_stack = stack;
                }
                Token::Whitespace | Token::Comment(_) => self.next_token()?,
                _ => break,
            }
        }

        if let Some(position) = pending_stack {
            return Err(ParseError::DanglingStack { position });
        }
        Ok(duration)
    }

    /// Parse one note or bracketed group and an optional trailing `-`
    ///
    /// Returns the element's duration and the position of the `-` if one
    /// was consumed.
    fn parse_element(&mut self) -> Result<(u64, Option<usize>), ParseError> {
        let start_tick = self.tick;

        let duration = match self.current {
            Token::Note(note) => {
                if !note.is_pause() {
                    self.schedule.push(ScheduleEntry {
                        tick: self.tick,
                        note,
                    });
                }
                self.tick = checked_ticks(self.tick, note.duration, self.current_position)?;
                self.end_tick = self.end_tick.max(self.tick);
                note.duration
            }
            Token::BracketOpen => {
                let open_position = self.current_position;
                if self.depth >= MAX_NESTING {
                    return Err(ParseError::NestingTooDeep {
                        position: open_position,
                    });
                }
                self.depth += 1;
                self.next_token()?;
                let duration = self.parse_sheet()?;
                self.depth -= 1;
                match self.current {
                    Token::BracketClose => {}
                    Token::End => {
                        return Err(ParseError::UnmatchedBracket {
                            position: open_position,
                        });
                    }
                    ref other => {
                        return Err(ParseError::UnexpectedToken {
                            found: other.to_string(),
                            position: self.current_position,
                        });
                    }
                }
                duration
            }
            ref other => {
                return Err(ParseError::UnexpectedToken {
                    found: other.to_string(),
                    position: self.current_position,
                });
            }
        };
        self.next_token()?;

        if self.current == Token::Stack {
            let stack_position = self.current_position;
            self.next_token()?;
            self.tick = start_tick;
            return Ok((duration, Some(stack_position)));
        }
        Ok((duration, None))
    }
}

fn checked_ticks(a: u64, b: u64, position: usize) -> Result<u64, ParseError> {
    a.checked_add(b).ok_or(ParseError::TickOverflow { position })
}

/// Parse sheet notation with the default configuration
pub fn parse_sheet(input: &str) -> Result<Sheet, ParseError> {
    Parser::new(input, SheetConfig::default()).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::lexer::LexErrorKind;
    use crate::notation::note::PitchClass;

    fn ticks(sheet: &Sheet) -> Vec<(u64, PitchClass, u64)> {
        sheet
            .schedule
            .iter()
            .map(|e| (e.tick, e.note.pitch, e.note.duration))
            .collect()
    }

    #[test]
    fn test_sequence() {
        let sheet = parse_sheet("C4.10 E4.10").unwrap();
        assert_eq!(
            ticks(&sheet),
            vec![(0, PitchClass::C, 10), (10, PitchClass::E, 10)]
        );
        assert_eq!(sheet.end_tick, 20);
    }

    #[test]
    fn test_stack_places_chord() {
        let sheet = parse_sheet("C4.10-E4.10").unwrap();
        assert_eq!(
            ticks(&sheet),
            vec![(0, PitchClass::C, 10), (0, PitchClass::E, 10)]
        );
        assert_eq!(sheet.end_tick, 10);
    }

    #[test]
    fn test_triad_then_melody() {
        let sheet = parse_sheet("C4.20-E4.20-G4.20 A4.5").unwrap();
        assert_eq!(
            ticks(&sheet),
            vec![
                (0, PitchClass::C, 20),
                (0, PitchClass::E, 20),
                (0, PitchClass::G, 20),
                (20, PitchClass::A, 5),
            ]
        );
    }

    #[test]
    fn test_group_duration_is_sum() {
        let sheet = parse_sheet("(C4.10 E4.10) G4.5").unwrap();
        assert_eq!(
            ticks(&sheet),
            vec![
                (0, PitchClass::C, 10),
                (10, PitchClass::E, 10),
                (20, PitchClass::G, 5),
            ]
        );
    }

    #[test]
    fn test_stacked_groups() {
        // Melody and bass line starting together
        let sheet = parse_sheet("(E4.5 D4.5 C4.10)-(C3.20) G3.4").unwrap();
        let bass: Vec<_> = sheet
            .schedule
            .iter()
            .filter(|e| e.note.octave == 3)
            .map(|e| e.tick)
            .collect();
        assert_eq!(bass, vec![0, 20]);
        assert_eq!(sheet.end_tick, 24);
    }

    #[test]
    fn test_schedule_is_sorted() {
        let sheet = parse_sheet("(C4.10 D4.10 E4.10)-(G3.5 A3.5) B3.1").unwrap();
        assert!(sheet.schedule.windows(2).all(|w| w[0].tick <= w[1].tick));
        assert_eq!(sheet.schedule.len(), 6);
    }

    #[test]
    fn test_pause_advances_without_entry() {
        let sheet = parse_sheet("P.8 A4.2 p.3 B4.1").unwrap();
        assert_eq!(
            ticks(&sheet),
            vec![(8, PitchClass::A, 2), (13, PitchClass::B, 1)]
        );
        assert!(sheet.schedule.iter().all(|e| !e.note.is_pause()));
    }

    #[test]
    fn test_comments_and_whitespace_only() {
        let sheet = parse_sheet("  # nothing here\n\t# still nothing\r\n").unwrap();
        assert!(sheet.schedule.is_empty());
        assert_eq!(sheet.end_tick, 0);
    }

    #[test]
    fn test_set_directive() {
        let sheet = parse_sheet("#: set tempo 120\n# plain comment\nC4.1").unwrap();
        assert_eq!(sheet.config.tempo, 120);

        let sheet = parse_sheet("#:set temp 90\nC4.1").unwrap();
        assert_eq!(sheet.config.tempo, 90);
    }

    #[test]
    fn test_directive_after_notes_is_plain_comment() {
        let sheet = parse_sheet("C4.1\n#: set tempo 120\n#: bogus\nD4.1").unwrap();
        assert_eq!(sheet.config.tempo, 250);
        assert_eq!(sheet.schedule.len(), 2);
    }

    #[test]
    fn test_directive_errors() {
        assert!(matches!(
            parse_sheet("#: set volume 3"),
            Err(ParseError::UnknownParameter { .. })
        ));
        assert!(matches!(
            parse_sheet("#: set tempo fast"),
            Err(ParseError::InvalidParameterValue { .. })
        ));
        assert!(matches!(
            parse_sheet("#: unset tempo 1"),
            Err(ParseError::UnknownDirective { .. })
        ));
        assert!(matches!(
            parse_sheet("#: set tempo"),
            Err(ParseError::MalformedDirective { .. })
        ));
    }

    #[test]
    fn test_lex_failures_propagate() {
        for input in ["H4.10", "C0.10", "C4,10"] {
            assert!(
                matches!(parse_sheet(input), Err(ParseError::Lex(_))),
                "{} should fail",
                input
            );
        }
        match parse_sheet("C0.10") {
            Err(ParseError::Lex(e)) => assert_eq!(e.kind, LexErrorKind::InvalidOctave),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unmatched_brackets() {
        assert_eq!(
            parse_sheet("(C4.10"),
            Err(ParseError::UnmatchedBracket { position: 0 })
        );
        assert!(matches!(
            parse_sheet("C4.10)"),
            Err(ParseError::TrailingContent { .. })
        ));
        assert!(matches!(
            parse_sheet("((C4.1)"),
            Err(ParseError::UnmatchedBracket { .. })
        ));
    }

    #[test]
    fn test_dangling_stack() {
        assert!(parse_sheet("A4.4410 -").is_err());
        assert!(matches!(
            parse_sheet("A4.4410-"),
            Err(ParseError::DanglingStack { position: 7 })
        ));
        assert!(matches!(
            parse_sheet("(C4.1-)"),
            Err(ParseError::DanglingStack { .. })
        ));
    }

    #[test]
    fn test_tick_overflow_is_an_error() {
        assert_eq!(
            parse_sheet("C4.18446744073709551615 D4.1"),
            Err(ParseError::TickOverflow { position: 24 })
        );
        assert!(matches!(
            parse_sheet("P.18446744073709551615 (P.1)"),
            Err(ParseError::TickOverflow { .. })
        ));

        // The cursor may reach u64::MAX exactly
        let sheet = parse_sheet("P.18446744073709551614 C4.1").unwrap();
        assert_eq!(sheet.end_tick, u64::MAX);
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| {
            format!("{}C4.1{}", "(".repeat(depth), ")".repeat(depth))
        };

        let sheet = parse_sheet(&nested(MAX_NESTING)).unwrap();
        assert_eq!(sheet.schedule.len(), 1);

        assert_eq!(
            parse_sheet(&nested(MAX_NESTING + 1)),
            Err(ParseError::NestingTooDeep {
                position: MAX_NESTING
            })
        );
        assert!(matches!(
            parse_sheet(&nested(100_000)),
            Err(ParseError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn test_sibling_groups_do_not_accumulate_depth() {
        let groups = "(C4.1) ".repeat(MAX_NESTING + 10);
        let sheet = parse_sheet(&groups).unwrap();
        assert_eq!(sheet.schedule.len(), MAX_NESTING + 10);
    }

    #[test]
    fn test_stack_allows_whitespace_before_sibling() {
        let sheet = parse_sheet("C4.10- E4.10").unwrap();
        assert_eq!(sheet.schedule[1].tick, 0);
    }
}
