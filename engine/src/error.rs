use std::fmt;

use viml::parser::ParseError;

use crate::regex::{MatchError, RegexCompileError};

/// Errors raised while evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    UndefinedVariable(String),
    UndefinedFunction(String),
    TooManyArguments(String),
    NotEnoughArguments(String),
    /// A value of this type where a Number is required.
    NumberRequired(&'static str),
    /// A value of this type where a String is required.
    StringRequired(&'static str),
    /// Relational comparison between types with no ordering rule.
    CannotCompare(&'static str, &'static str),
    DivisionByZero,
    ListIndexOutOfRange(i64),
    KeyNotPresent(String),
    ListRequired(&'static str),
    DictRequired(&'static str),
    CannotIndex(&'static str),
    UnknownOption(String),
    InvalidPattern(String),
    FunctionCallDepth,
    BreakWithoutLoop,
    ContinueWithoutLoop,
    ReturnOutsideFunction,
    NoSuchVariable(String),
    FunctionExists(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UndefinedVariable(name) => {
                write!(f, "E121: Undefined variable: {}", name)
            }
            EvalError::UndefinedFunction(name) => {
                write!(f, "E117: Unknown function: {}", name)
            }
            EvalError::TooManyArguments(name) => {
                write!(f, "E118: Too many arguments for function: {}", name)
            }
            EvalError::NotEnoughArguments(name) => {
                write!(f, "E119: Not enough arguments for function: {}", name)
            }
            EvalError::NumberRequired(type_name) => {
                let code = match *type_name {
                    "Float" => "E805",
                    "Dictionary" => "E728",
                    "Funcref" => "E703",
                    _ => "E745",
                };
                write!(f, "{}: Using a {} as a Number", code, type_name)
            }
            EvalError::StringRequired(type_name) => {
                let code = match *type_name {
                    "Float" => "E806",
                    "Dictionary" => "E731",
                    "Funcref" => "E729",
                    _ => "E730",
                };
                write!(f, "{}: Using a {} as a String", code, type_name)
            }
            EvalError::CannotCompare(left, right) => {
                write!(f, "E691: Cannot compare {} with {}", left, right)
            }
            EvalError::DivisionByZero => write!(f, "E1154: Divide by zero"),
            EvalError::ListIndexOutOfRange(index) => {
                write!(f, "E684: List index out of range: {}", index)
            }
            EvalError::KeyNotPresent(key) => {
                write!(f, "E716: Key not present in Dictionary: {}", key)
            }
            EvalError::ListRequired(type_name) => {
                write!(f, "E714: List required, got {}", type_name)
            }
            EvalError::DictRequired(type_name) => {
                write!(f, "E715: Dictionary required, got {}", type_name)
            }
            EvalError::CannotIndex(type_name) => {
                write!(f, "E689: Cannot index a {}", type_name)
            }
            EvalError::UnknownOption(name) => write!(f, "E113: Unknown option: {}", name),
            EvalError::InvalidPattern(message) => {
                write!(f, "E383: Invalid pattern: {}", message)
            }
            EvalError::FunctionCallDepth => {
                write!(f, "E132: Function call depth is higher than 'maxfuncdepth'")
            }
            EvalError::BreakWithoutLoop => write!(f, "E587: :break without :while or :for"),
            EvalError::ContinueWithoutLoop => {
                write!(f, "E586: :continue without :while or :for")
            }
            EvalError::ReturnOutsideFunction => {
                write!(f, "E133: :return not inside a function")
            }
            EvalError::NoSuchVariable(name) => write!(f, "E108: No such variable: {}", name),
            EvalError::FunctionExists(name) => {
                write!(f, "E122: Function {} already exists, add ! to replace it", name)
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// Errors raised by the command dispatcher or a command handler.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    NotAnEditorCommand(String),
    NoRangeAllowed,
    ArgumentRequired,
    TrailingCharacters,
    NoSuchUserCommand(String),
    UserCommandExists(String),
    AmbiguousUserCommand(String),
    MustStartWithUppercase,
    PatternNotFound(String),
    NoPreviousPattern,
    InvalidRange,
    MarkNotSet(char),
    FunctionCallRequired,
    ReadOnly,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::NotAnEditorCommand(name) => {
                write!(f, "E492: Not an editor command: {}", name)
            }
            CommandError::NoRangeAllowed => write!(f, "E481: No range allowed"),
            CommandError::ArgumentRequired => write!(f, "E471: Argument required"),
            CommandError::TrailingCharacters => write!(f, "E488: Trailing characters"),
            CommandError::NoSuchUserCommand(name) => {
                write!(f, "E184: No such user-defined command: {}", name)
            }
            CommandError::UserCommandExists(name) => {
                write!(f, "E174: Command already exists: add ! to replace it: {}", name)
            }
            CommandError::AmbiguousUserCommand(name) => {
                write!(f, "E464: Ambiguous use of user-defined command: {}", name)
            }
            CommandError::MustStartWithUppercase => {
                write!(f, "E183: User defined commands must start with an uppercase letter")
            }
            CommandError::PatternNotFound(pattern) => {
                write!(f, "E486: Pattern not found: {}", pattern)
            }
            CommandError::NoPreviousPattern => {
                write!(f, "E35: No previous regular expression")
            }
            CommandError::InvalidRange => write!(f, "E16: Invalid range"),
            CommandError::MarkNotSet(mark) => write!(f, "E20: Mark not set: {}", mark),
            CommandError::FunctionCallRequired => write!(f, "E129: Function name required"),
            CommandError::ReadOnly => write!(f, "E45: 'readonly' option is set"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Any failure surfaced while executing a script. Scripts stop at the
/// first of these; the message reaches the user via the message log.
#[derive(Debug, Clone)]
pub enum EngineError {
    Eval(EvalError),
    Command(CommandError),
    Parse(ParseError),
    RegexCompile(RegexCompileError),
    MatchAborted(MatchError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Eval(e) => e.fmt(f),
            EngineError::Command(e) => e.fmt(f),
            EngineError::Parse(e) => write!(f, "E15: Invalid expression: {}", e),
            EngineError::RegexCompile(e) => e.fmt(f),
            EngineError::MatchAborted(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<EvalError> for EngineError {
    fn from(e: EvalError) -> Self {
        EngineError::Eval(e)
    }
}

impl From<CommandError> for EngineError {
    fn from(e: CommandError) -> Self {
        EngineError::Command(e)
    }
}

impl From<ParseError> for EngineError {
    fn from(e: ParseError) -> Self {
        EngineError::Parse(e)
    }
}

impl From<RegexCompileError> for EngineError {
    fn from(e: RegexCompileError) -> Self {
        EngineError::RegexCompile(e)
    }
}

impl From<MatchError> for EngineError {
    fn from(e: MatchError) -> Self {
        EngineError::MatchAborted(e)
    }
}
