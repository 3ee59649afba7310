//! Syntactic kinds for nodes in the object model and the semantic regions
//! attached to them.
//!
//! The original tooling this crate stands in for switches on a `DomType`
//! enumeration at run time. Here the switch becomes a closed sum type with
//! one variant per syntactic kind, matched exhaustively wherever dispatch is
//! needed (see `qml-completion`'s context dispatch table).

use serde::{Deserialize, Serialize};

/// The syntactic kind of a [`crate::DomItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// The file root.
    File,
    /// A `pragma` statement (e.g. `pragma Singleton`).
    Pragma,
    /// An `import` statement.
    Import,
    /// An object instantiation (`Rectangle { ... }`).
    QmlObject,
    /// A `property` declaration.
    PropertyDefinition,
    /// A `name: expression` binding.
    Binding,
    /// A `signal` declaration.
    SignalDefinition,
    /// A `function` declaration.
    FunctionDefinition,
    /// An `enum` declaration.
    EnumDefinition,
    /// A `component { ... }` inline component.
    InlineComponent,
    /// A brace-delimited JS statement block.
    JsBlock,
    /// A bare JS identifier reference.
    JsIdentifier,
    /// A `a.b` member expression.
    JsMemberExpression,
    /// A `f(...)` call expression.
    JsCallExpression,
    /// A `for (...)` statement.
    JsForStatement,
    /// A `while (...)` statement.
    JsWhileStatement,
    /// An `if (...)` statement.
    JsIfStatement,
    /// A `switch (...)` statement.
    JsSwitchStatement,
    /// A `case`/`default` clause inside a switch body.
    JsCaseClause,
    /// A `return` statement.
    JsReturnStatement,
    /// A `throw` statement.
    JsThrowStatement,
    /// A ternary conditional expression.
    JsConditionalExpression,
    /// A unary expression (`!x`, `-x`, `typeof x`, …).
    JsUnaryExpression,
    /// A postfix expression (`x++`, `x--`).
    JsPostfixExpression,
    /// A parenthesized expression.
    JsParenthesizedExpression,
    /// A `break` statement.
    JsBreakStatement,
    /// A `continue` statement.
    JsContinueStatement,
    /// A labelled statement (`label: stmt`).
    JsLabelledStatement,
    /// A `let`/`var`/`const` declaration.
    JsVariableDeclaration,
}

impl NodeKind {
    /// Whether this kind introduces a new JS lexical scope boundary at the
    /// object level (the completion algorithm stops walking the JS scope
    /// chain here).
    pub fn is_object_scope_boundary(self) -> bool {
        matches!(self, NodeKind::QmlObject | NodeKind::InlineComponent | NodeKind::File)
    }

    /// Whether this kind can host `case`/`default`/`break`/`continue` as
    /// legal completions directly beneath it.
    pub fn is_loop_or_switch(self) -> bool {
        matches!(
            self,
            NodeKind::JsForStatement | NodeKind::JsWhileStatement | NodeKind::JsSwitchStatement
        )
    }
}

/// A named semantic region within a node's source span, as recorded in the
/// file-location tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    /// The node's own identifier token, if any.
    Identifier,
    /// The full source span of the node.
    FullRegion,
    /// The `{` token.
    LeftBrace,
    /// The `}` token.
    RightBrace,
    /// The `(` token.
    LeftParenthesis,
    /// The `)` token.
    RightParenthesis,
    /// A keyword token identifying the node's construct (`property`,
    /// `function`, `signal`, `enum`, `component`, `readonly`, `required`,
    /// `default`, `import`, `as`, `pragma`).
    KeywordToken,
    /// The first `;` in a `for (...)` head.
    FirstSemicolon,
    /// The second `;` in a `for (...)` head.
    SecondSemicolon,
    /// The `case`/`default` keyword of a switch clause.
    CaseKeyword,
    /// A `:` separating a binding name from its value, or a case label from
    /// its body, or a ternary's second arm.
    ColonToken,
    /// A binary/unary operator token.
    OperatorToken,
    /// The `in`/`of` token of a `for` head.
    InOfToken,
}
