//! Operator selectors decided by the front end

use rcs_codegen::{Cond, FCond};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary arithmetic, bitwise and comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        self.cond().is_some()
    }

    /// Integer condition under which the comparison holds
    pub fn cond(self) -> Option<Cond> {
        match self {
            BinaryOp::Lt => Some(Cond::Less),
            BinaryOp::Le => Some(Cond::LessEqual),
            BinaryOp::Gt => Some(Cond::Greater),
            BinaryOp::Ge => Some(Cond::GreaterEqual),
            BinaryOp::Eq => Some(Cond::Equal),
            BinaryOp::Ne => Some(Cond::NotEqual),
            _ => None,
        }
    }

    /// Float condition under which the comparison holds
    pub fn fcond(self) -> Option<FCond> {
        match self {
            BinaryOp::Lt => Some(FCond::Less),
            BinaryOp::Le => Some(FCond::LessEqual),
            BinaryOp::Gt => Some(FCond::Greater),
            BinaryOp::Ge => Some(FCond::GreaterEqual),
            BinaryOp::Eq => Some(FCond::Equal),
            BinaryOp::Ne => Some(FCond::NotEqual),
            _ => None,
        }
    }

    /// Runtime routine for operators SPARC V8 has no instruction for
    pub fn runtime_routine(self) -> Option<&'static str> {
        match self {
            BinaryOp::Mul => Some(".mul"),
            BinaryOp::Div => Some(".div"),
            BinaryOp::Mod => Some(".rem"),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        };
        write!(f, "{symbol}")
    }
}

/// Short-circuit logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    /// Branch taken on the left operand when the result is already known
    pub fn short_circuit(self) -> Cond {
        match self {
            LogicalOp::And => Cond::Equal,
            LogicalOp::Or => Cond::NotEqual,
        }
    }

    /// Result when the right operand is evaluated and does not short-circuit
    pub fn fallthrough_value(self) -> i32 {
        match self {
            LogicalOp::And => 1,
            LogicalOp::Or => 0,
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "&&"),
            LogicalOp::Or => write!(f, "||"),
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

/// Pre/post increment and decrement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncDec {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl IncDec {
    pub fn is_prefix(self) -> bool {
        matches!(self, IncDec::PreInc | IncDec::PreDec)
    }

    pub fn is_increment(self) -> bool {
        matches!(self, IncDec::PreInc | IncDec::PostInc)
    }
}

impl fmt::Display for IncDec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = if self.is_increment() { "++" } else { "--" };
        write!(f, "{symbol}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_conditions() {
        assert!(BinaryOp::Lt.is_comparison());
        assert!(!BinaryOp::Add.is_comparison());
        assert_eq!(BinaryOp::Ge.cond(), Some(Cond::GreaterEqual));
        assert_eq!(BinaryOp::Ne.fcond(), Some(FCond::NotEqual));
        assert_eq!(BinaryOp::Mod.runtime_routine(), Some(".rem"));
        assert_eq!(BinaryOp::Add.runtime_routine(), None);
    }

    #[test]
    fn test_logical_short_circuit() {
        assert_eq!(LogicalOp::And.short_circuit(), Cond::Equal);
        assert_eq!(LogicalOp::Or.short_circuit(), Cond::NotEqual);
        assert_eq!(LogicalOp::And.fallthrough_value(), 1);
        assert_eq!(LogicalOp::Or.fallthrough_value(), 0);
    }

    #[test]
    fn test_inc_dec_kinds() {
        assert!(IncDec::PreInc.is_prefix());
        assert!(!IncDec::PostDec.is_prefix());
        assert!(IncDec::PostInc.is_increment());
        assert_eq!(IncDec::PreDec.to_string(), "--");
    }
}
