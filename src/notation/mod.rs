//! Sheet notation
//!
//! - Lexer: splits text into notes, brackets, stacks, whitespace and comments
//! - Parser: builds a tick schedule from the token stream

pub mod lexer;
pub mod note;
pub mod parser;

pub use lexer::{LexError, LexErrorKind, Lexer, Token};
pub use note::{Accidental, Note, PitchClass};
pub use parser::{parse_sheet, ParseError, Parser, ScheduleEntry, Sheet, SheetConfig};
