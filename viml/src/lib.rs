pub mod command;
pub mod expression;
pub mod parser;
pub mod script;

pub use command::{Address, ExCommand, RangeEntry, RangeSpec};
pub use expression::{BinaryOp, CaseMode, Expr, ScopePrefix, UnaryOp, VarName};
pub use script::{LetOp, LetTarget, Script, Statement};
