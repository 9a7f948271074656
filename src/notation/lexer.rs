use super::note::{Accidental, Note, PitchClass};
use std::fmt;

/// Lexical units of the sheet notation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Synthetic terminator after the last character
    End,
    /// Space, tab, CR or LF
    Whitespace,
    Note(Note),
    BracketOpen,
    BracketClose,
    /// `-`, places the next sibling at the same tick
    Stack,
    /// `#` up to the end of the line, leading `#` included
    Comment(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::End => write!(f, "end of input"),
            Token::Whitespace => write!(f, "whitespace"),
            Token::Note(note) => write!(f, "{}", note),
            Token::BracketOpen => write!(f, "("),
            Token::BracketClose => write!(f, ")"),
            Token::Stack => write!(f, "-"),
            Token::Comment(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// A note must start with A-G or P
    InvalidPitch(char),
    /// Pauses take neither accidental nor octave
    AccidentalOnPause,
    /// Pitched notes need an octave greater than zero
    InvalidOctave,
    /// The `.` between octave and duration is missing
    MissingSeparator(Option<char>),
    NumberTooLarge,
    /// The cursor moved beyond the terminator
    ReadPastEnd,
}

/// A lexing failure at a character position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: usize,
}

impl LexError {
    pub fn new(kind: LexErrorKind, position: usize) -> Self {
        Self { kind, position }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LexErrorKind::InvalidPitch(c) => {
                write!(f, "Invalid pitch '{}' at position {}", c, self.position)
            }
            LexErrorKind::AccidentalOnPause => {
                write!(f, "Pause with accidental at position {}", self.position)
            }
            LexErrorKind::InvalidOctave => {
                write!(f, "Octave must be positive at position {}", self.position)
            }
            LexErrorKind::MissingSeparator(Some(c)) => {
                write!(f, "Expected '.' but found '{}' at position {}", c, self.position)
            }
            LexErrorKind::MissingSeparator(None) => {
                write!(f, "Expected '.' but input ended at position {}", self.position)
            }
            LexErrorKind::NumberTooLarge => {
                write!(f, "Number too large at position {}", self.position)
            }
            LexErrorKind::ReadPastEnd => {
                write!(f, "Read past end of input at position {}", self.position)
            }
        }
    }
}

impl std::error::Error for LexError {}

/// Tokenizes sheet notation one unit at a time
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Current cursor position (in characters)
    pub fn position(&self) -> usize {
        self.position
    }

    /// Character under the cursor, `None` at the terminator
    fn current(&self) -> Result<Option<char>, LexError> {
        if self.position > self.input.len() {
            return Err(LexError::new(LexErrorKind::ReadPastEnd, self.position));
        }
        Ok(self.input.get(self.position).copied())
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Consume the next lexical unit
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let ch = match self.current()? {
            None => {
                self.advance();
                return Ok(Token::End);
            }
            Some(ch) => ch,
        };

        let token = match ch {
            ' ' | '\t' | '\r' | '\n' => Token::Whitespace,
            '(' => Token::BracketOpen,
            ')' => Token::BracketClose,
            '-' => Token::Stack,
            '#' => return Ok(Token::Comment(self.read_comment()?)),
            _ => return Ok(Token::Note(self.read_note()?)),
        };
        self.advance();
        Ok(token)
    }

    fn read_comment(&mut self) -> Result<String, LexError> {
        let mut text = String::new();
        while let Some(ch) = self.current()? {
            if ch == '\r' || ch == '\n' {
                break;
            }
            text.push(ch);
            self.advance();
        }
        Ok(text)
    }

    /// Read a run of decimal digits, `None` if there are none
    fn read_number(&mut self) -> Result<Option<u64>, LexError> {
        let start = self.position;
        let mut value: Option<u64> = None;
        while let Some(ch) = self.current()? {
            let Some(digit) = ch.to_digit(10) else {
                break;
            };
            value = value
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit as u64))
                .map(Some)
                .ok_or_else(|| LexError::new(LexErrorKind::NumberTooLarge, start))?;
            self.advance();
        }
        Ok(value)
    }

    fn read_note(&mut self) -> Result<Note, LexError> {
        let start = self.position;
        let letter = self.current()?.unwrap_or('\0');
        let pitch = PitchClass::from_letter(letter.to_ascii_uppercase())
            .ok_or_else(|| LexError::new(LexErrorKind::InvalidPitch(letter), start))?;
        self.advance();

        let mut accidental = None;
        if let Some(symbol) = self.current()? {
            if let Some(acc) = Accidental::from_symbol(symbol) {
                if pitch == PitchClass::Pause {
                    return Err(LexError::new(LexErrorKind::AccidentalOnPause, self.position));
                }
                accidental = Some(acc);
                self.advance();
            }
        }

        let mut octave = 0u32;
        if pitch != PitchClass::Pause {
            let octave_start = self.position;
            octave = match self.read_number()? {
                Some(0) | None => {
                    return Err(LexError::new(LexErrorKind::InvalidOctave, octave_start));
                }
                Some(value) => u32::try_from(value)
                    .map_err(|_| LexError::new(LexErrorKind::NumberTooLarge, octave_start))?,
            };
        }

        match self.current()? {
            Some('.') => self.advance(),
            found => {
                return Err(LexError::new(
                    LexErrorKind::MissingSeparator(found),
                    self.position,
                ));
            }
        }

        let duration = self.read_number()?.unwrap_or(0);
        Ok(Note::new(pitch, accidental, octave, duration))
    }

    /// Tokenize the entire input, terminator included
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_end = token == Token::End;
            tokens.push(token);
            if is_end {
                break;
            }
        }
        Ok(tokens)
    }
}
