//! Schema model: nodes, expressions, bindings, actions, document root.

pub mod action;
pub mod binding;
pub mod document;
pub mod expr;
pub mod node;

pub use action::{ActionDef, ActionHandler, ActionTrigger, ActionType};
pub use binding::{Binding, TransformFn};
pub use document::{Document, SchemaError};
pub use expr::{EvalError, Expr, ExprFn};
pub use node::{Column, Component, Conditions, Container, I18n, LayoutNode, Repeat, Row};
