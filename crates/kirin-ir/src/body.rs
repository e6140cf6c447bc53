//! Function bodies and initializers.
//!
//! The middle-end never interprets bodies; it only needs them to carry symbol
//! references across serialization so the linker discovers what a body
//! depends on.

use crate::ids::SymbolId;

#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Null,
    Unit,
    Boolean(bool),
    Int(i64),
    String(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Const(ConstValue),
    Call {
        callee: SymbolId,
        receiver: Option<Box<Expr>>,
        arguments: Vec<Expr>,
    },
    GetValue(SymbolId),
    SetValue {
        target: SymbolId,
        value: Box<Expr>,
    },
    Block(Vec<Expr>),
    Return {
        target: SymbolId,
        value: Box<Expr>,
    },
    /// Placeholder for a body that was not read.
    Error(String),
}

impl Expr {
    /// Collect every symbol this expression refers to, in visit order.
    pub fn collect_symbols(&self, out: &mut Vec<SymbolId>) {
        match self {
            Expr::Const(_) | Expr::Error(_) => {}
            Expr::Call {
                callee,
                receiver,
                arguments,
            } => {
                out.push(*callee);
                if let Some(receiver) = receiver {
                    receiver.collect_symbols(out);
                }
                for argument in arguments {
                    argument.collect_symbols(out);
                }
            }
            Expr::GetValue(symbol) => out.push(*symbol),
            Expr::SetValue { target, value } | Expr::Return { target, value } => {
                out.push(*target);
                value.collect_symbols(out);
            }
            Expr::Block(statements) => {
                for statement in statements {
                    statement.collect_symbols(out);
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Statement body of a function.
    Block(Vec<Expr>),
    /// Expression body (field initializers, expression-bodied functions).
    Expression(Expr),
}

impl Body {
    pub const EXPRESSION_NOT_DESERIALIZED: &'static str = "Expression body is not deserialized yet";
    pub const STATEMENT_NOT_DESERIALIZED: &'static str = "Statement body is not deserialized yet";

    pub fn symbols(&self) -> Vec<SymbolId> {
        let mut out = Vec::new();
        match self {
            Body::Block(statements) => {
                for statement in statements {
                    statement.collect_symbols(&mut out);
                }
            }
            Body::Expression(expr) => expr.collect_symbols(&mut out),
        }
        out
    }

    /// Whether the body is a placeholder left by header-only deserialization.
    pub fn is_placeholder(&self) -> bool {
        match self {
            Body::Block(statements) => matches!(statements.as_slice(), [Expr::Error(_)]),
            Body::Expression(expr) => matches!(expr, Expr::Error(_)),
        }
    }
}
