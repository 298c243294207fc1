pub mod error;

mod command;
mod expression;
mod script;

pub use error::ParseError;

use crate::command::ExCommand;
use crate::expression::Expr;
use crate::script::Script;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source into a complete Script.
    pub fn parse(&self) -> Result<Script, Vec<ParseError>> {
        script::parse_script(&self.source, self.file_id)
    }
}

/// Parse a standalone expression (trailing tokens are an error).
pub fn parse_expression(source: &str, file_id: usize) -> Result<Expr, ParseError> {
    expression::parse_expression_at(source, 0, file_id)
}

/// Parse a whitespace-separated expression sequence, as `:echo` and
/// `:execute` arguments are written.
pub fn parse_expression_list(source: &str, file_id: usize) -> Result<Vec<Expr>, ParseError> {
    expression::parse_expression_list_at(source, 0, file_id)
}

/// Parse a single Ex command line.
pub fn parse_command_line(line: &str, file_id: usize) -> Result<ExCommand, ParseError> {
    command::parse_command_line(line, 0, file_id)
}
