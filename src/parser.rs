// File: src/parser.rs
//
// Recursive descent parser for the Soutk programming language.
// Transforms a sequence of tokens into an Abstract Syntax Tree (AST).
//
// Soutk is line-oriented: one statement per line, with brace-delimited
// blocks for loop/conditional/function/class bodies. The parser implements
// a traditional recursive descent strategy with one production per
// statement keyword and operator precedence for expressions. Function and
// class bodies are parsed once and stored as AST fragments, never
// re-parsed per call.
//
// The parser uses a single-token lookahead and advances through the token
// stream as it builds the AST. Malformed statement shapes (a for header
// without exactly three clauses, an unmatched brace) are hard parse errors;
// parsing does not continue past them.

use crate::ast::{AssignTarget, BinOp, ContainerKind, Expr, FuncDef, Stmt, StmtKind};
use crate::errors::SoutkError;
use crate::lexer::{Token, TokenKind};

/// Container commands recognized in statement position, with the method they
/// desugar to and how many expression arguments follow the container name.
fn container_command(word: &str) -> Option<(&'static str, usize)> {
    match word {
        "push" => Some(("push", 1)),
        "pop" => Some(("pop", 0)),
        "peek" => Some(("peek", 0)),
        "showstack" => Some(("show", 0)),
        "enqueue" => Some(("enqueue", 1)),
        "dequeue" => Some(("dequeue", 0)),
        "front" => Some(("front", 0)),
        "showqueue" => Some(("show", 0)),
        "link" => Some(("link", 1)),
        "unlink" => Some(("unlink", 1)),
        "insertafter" => Some(("insertafter", 2)),
        "traverse" => Some(("traverse", 0)),
        "isempty" => Some(("isempty", 0)),
        _ => None,
    }
}

/// Parser maintains position in token stream and provides methods to parse
/// statements and expressions
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Creates a new parser from a vector of tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    /// Peek at the current token without consuming it
    fn peek(&self) -> &TokenKind {
        self.tokens.get(self.pos).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens.get(self.pos + offset).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    /// Line of the current token (for error messages and Stmt tagging)
    fn line(&self) -> usize {
        self.tokens.get(self.pos).map(|t| t.line).unwrap_or_else(|| {
            self.tokens.last().map(|t| t.line).unwrap_or(1)
        })
    }

    /// Consume and return the current token, then advance to the next
    fn advance(&mut self) -> TokenKind {
        let tok = self.tokens.get(self.pos).map(|t| t.kind.clone()).unwrap_or(TokenKind::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check_punct(&self, c: char) -> bool {
        matches!(self.peek(), TokenKind::Punct(p) if *p == c)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.check_punct(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_op(&self, op: &str) -> bool {
        matches!(self.peek(), TokenKind::Operator(o) if o == op)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.check_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), TokenKind::Keyword(k) if k == kw)
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), TokenKind::Newline) || self.check_punct(';') {
            self.advance();
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.peek(), TokenKind::Newline | TokenKind::Eof)
            || self.check_punct(';')
            || self.check_punct('}')
    }

    fn parse_error(&self, message: impl Into<String>) -> SoutkError {
        SoutkError::parse_error(message.into(), self.line())
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String, SoutkError> {
        match self.peek() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.parse_error(format!("Expected {}, found {:?}", what, other))),
        }
    }

    fn expect_punct(&mut self, c: char, ctx: &str) -> Result<(), SoutkError> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.parse_error(format!("Expected '{}' {}", c, ctx)))
        }
    }

    fn expect_keyword(&mut self, kw: &str, ctx: &str) -> Result<(), SoutkError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.parse_error(format!("Expected '{}' {}", kw, ctx)))
        }
    }

    fn expect_string(&mut self, what: &str) -> Result<String, SoutkError> {
        match self.peek() {
            TokenKind::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            other => Err(self.parse_error(format!("Expected {} (a string literal), found {:?}", what, other))),
        }
    }

    /// Parse the entire token stream into a program
    pub fn parse(&mut self) -> Result<Vec<Stmt>, SoutkError> {
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if matches!(self.peek(), TokenKind::Eof) {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, SoutkError> {
        let line = self.line();
        let kind = match self.peek().clone() {
            TokenKind::Keyword(k) => match k.as_str() {
                "summon" => self.parse_summon()?,
                "chant" => self.parse_chant()?,
                "if" => self.parse_if()?,
                "while" => self.parse_while()?,
                "do" => self.parse_do_while()?,
                "for" => self.parse_for()?,
                "stride" | "loop" => self.parse_range_loop(&k)?,
                "spell" => StmtKind::FunctionDecl(self.parse_spell()?),
                "forge" => self.parse_forge()?,
                "cast" => self.parse_cast()?,
                "enchant" => self.parse_enchant()?,
                "conjure" => {
                    return Err(self.parse_error(
                        "'conjure' may only appear on the right side of an assignment",
                    ))
                }
                "ward" => self.parse_ward()?,
                "rescue" => {
                    return Err(self.parse_error("'rescue' without a preceding 'ward' block"))
                }
                "return" => {
                    self.advance();
                    let expr =
                        if self.at_statement_end() { None } else { Some(self.parse_expr()?) };
                    StmtKind::Return(expr)
                }
                "break" => {
                    self.advance();
                    StmtKind::Break
                }
                "continue" => {
                    self.advance();
                    StmtKind::Continue
                }
                "scroll" => self.parse_scroll()?,
                "inscribe" => self.parse_file_write(false)?,
                "append" => self.parse_file_write(true)?,
                "invoke" => self.parse_invoke()?,
                other => {
                    return Err(self.parse_error(format!("Unexpected keyword '{}'", other)))
                }
            },
            TokenKind::Identifier(name) => self.parse_identifier_stmt(&name)?,
            _ => StmtKind::Expr(self.parse_expr()?),
        };

        // Optional trailing semicolon; the statement must end at the line
        self.eat_punct(';');
        if !self.at_statement_end() {
            return Err(self.parse_error(format!(
                "Unexpected {:?} after end of statement",
                self.peek()
            )));
        }
        Ok(Stmt { kind, line })
    }

    /// `summon x`, `summon x = expr`, `summon x = conjure Class(args)`
    fn parse_summon(&mut self) -> Result<StmtKind, SoutkError> {
        self.advance(); // summon
        let name = self.expect_identifier("a variable name after 'summon'")?;
        if !self.eat_op("=") {
            return Ok(StmtKind::VarDecl { name, value: None });
        }
        if self.check_keyword("conjure") {
            let (class, args) = self.parse_conjure()?;
            return Ok(StmtKind::ObjectNew { var: name, class, args });
        }
        let value = self.parse_expr()?;
        Ok(StmtKind::VarDecl { name, value: Some(value) })
    }

    fn parse_chant(&mut self) -> Result<StmtKind, SoutkError> {
        self.advance(); // chant
        Ok(StmtKind::Print(self.parse_expr()?))
    }

    /// `conjure Class(args)` - caller has checked for the keyword
    fn parse_conjure(&mut self) -> Result<(String, Vec<Expr>), SoutkError> {
        self.advance(); // conjure
        let class = self.expect_identifier("a class name after 'conjure'")?;
        let args = if self.check_punct('(') { self.parse_args()? } else { Vec::new() };
        Ok((class, args))
    }

    /// Statements that begin with a plain identifier: container commands,
    /// assignments (including multi-assignment and `bind`), and expression
    /// statements.
    fn parse_identifier_stmt(&mut self, first: &str) -> Result<StmtKind, SoutkError> {
        // Container command: `push s expr`, `pop s`, ... - only when the
        // command word is followed by another identifier.
        if let Some((method, argc)) = container_command(first) {
            if matches!(self.peek_at(1), TokenKind::Identifier(_)) {
                self.advance(); // command word
                let target = self.expect_identifier("a container name")?;
                let mut args = Vec::new();
                for _ in 0..argc {
                    args.push(self.parse_expr()?);
                }
                return Ok(StmtKind::Expr(Expr::MethodCall {
                    object: Box::new(Expr::Identifier(target)),
                    method: method.to_string(),
                    args,
                }));
            }
        }

        // `bind grim[key] = value`
        if first == "bind" {
            if let (TokenKind::Identifier(_), TokenKind::Punct('[')) =
                (self.peek_at(1), self.peek_at(2))
            {
                self.advance(); // bind
                let name = self.expect_identifier("a grimoire name after 'bind'")?;
                self.expect_punct('[', "after the grimoire name")?;
                let index = self.parse_expr()?;
                self.expect_punct(']', "after the grimoire key")?;
                if !self.eat_op("=") {
                    return Err(self.parse_error("Expected '=' in bind statement"));
                }
                let value = self.parse_expr()?;
                return Ok(StmtKind::Assign {
                    target: AssignTarget::Index { name, index },
                    value,
                });
            }
        }

        // Multi-assignment: `a, b = expr, expr`
        if matches!(self.peek_at(1), TokenKind::Punct(',')) {
            let save = self.pos;
            if let Ok(stmt) = self.parse_multi_assign() {
                return Ok(stmt);
            }
            self.pos = save;
        }

        // Everything else: parse an expression, then look for `=`
        let expr = self.parse_expr()?;
        if self.eat_op("=") {
            let target = match expr {
                Expr::Identifier(name) => AssignTarget::Name(name),
                Expr::Index { target, index } => match *target {
                    Expr::Identifier(name) => AssignTarget::Index { name, index: *index },
                    _ => return Err(self.parse_error("Invalid indexed assignment target")),
                },
                Expr::Attribute { object, name } => match *object {
                    Expr::Identifier(obj) => AssignTarget::Attribute { object: obj, attr: name },
                    _ => return Err(self.parse_error("Invalid attribute assignment target")),
                },
                _ => return Err(self.parse_error("Invalid assignment target")),
            };
            if self.check_keyword("conjure") {
                let var = match target {
                    AssignTarget::Name(name) => name,
                    _ => {
                        return Err(
                            self.parse_error("'conjure' result must be bound to a plain variable")
                        )
                    }
                };
                let (class, args) = self.parse_conjure()?;
                return Ok(StmtKind::ObjectNew { var, class, args });
            }
            let value = self.parse_expr()?;
            return Ok(StmtKind::Assign { target, value });
        }
        Ok(StmtKind::Expr(expr))
    }

    fn parse_multi_assign(&mut self) -> Result<StmtKind, SoutkError> {
        let mut names = vec![self.expect_identifier("a variable name")?];
        while self.eat_punct(',') {
            names.push(self.expect_identifier("a variable name after ','")?);
        }
        if !self.eat_op("=") {
            return Err(self.parse_error("Expected '=' in multiple assignment"));
        }
        let mut values = vec![self.parse_expr()?];
        while self.eat_punct(',') {
            values.push(self.parse_expr()?);
        }
        if names.len() != values.len() {
            return Err(self.parse_error(format!(
                "Mismatch in assignment: {} variables, {} values",
                names.len(),
                values.len()
            )));
        }
        Ok(StmtKind::MultiAssign { names, values })
    }

    /// Condition head for if/while/do-while: parenthesized or bare,
    /// optionally terminated by ':'
    fn parse_condition(&mut self) -> Result<Expr, SoutkError> {
        let cond = if self.eat_punct('(') {
            let cond = self.parse_expr()?;
            self.expect_punct(')', "after condition")?;
            cond
        } else {
            self.parse_expr()?
        };
        self.eat_punct(':');
        Ok(cond)
    }

    /// A loop/conditional body: either a brace-delimited block, or the
    /// single-statement form that binds exactly the next line.
    fn parse_body(&mut self, ctx: &str) -> Result<Vec<Stmt>, SoutkError> {
        let save = self.pos;
        self.skip_newlines();
        if self.check_punct('{') {
            self.pos = save;
            return self.parse_block(ctx);
        }
        self.pos = save;
        self.skip_newlines();
        if matches!(self.peek(), TokenKind::Eof) {
            return Err(self.parse_error(format!("Missing body for {}", ctx)));
        }
        let stmt = self.parse_stmt()?;
        Ok(vec![stmt])
    }

    /// A brace-delimited block. An unmatched `{` is a parse error rather
    /// than a silently truncated body.
    fn parse_block(&mut self, ctx: &str) -> Result<Vec<Stmt>, SoutkError> {
        self.skip_newlines();
        self.expect_punct('{', &format!("to open the {} body", ctx))?;
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat_punct('}') {
                break;
            }
            if matches!(self.peek(), TokenKind::Eof) {
                return Err(self.parse_error(format!("Unmatched '{{' in {}", ctx)));
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_if(&mut self) -> Result<StmtKind, SoutkError> {
        self.advance(); // if
        let cond = self.parse_condition()?;
        let then_block = self.parse_body("if")?;

        // An `else` may follow, possibly on its own line
        let save = self.pos;
        self.skip_newlines();
        if self.eat_keyword("else") {
            self.eat_punct(':');
            let else_block = self.parse_body("else")?;
            return Ok(StmtKind::If { cond, then_block, else_block: Some(else_block) });
        }
        self.pos = save;
        Ok(StmtKind::If { cond, then_block, else_block: None })
    }

    fn parse_while(&mut self) -> Result<StmtKind, SoutkError> {
        self.advance(); // while
        let cond = self.parse_condition()?;
        let body = self.parse_body("while loop")?;
        Ok(StmtKind::While { cond, body })
    }

    /// `do: { .. } while (cond)` - the condition line follows the block
    fn parse_do_while(&mut self) -> Result<StmtKind, SoutkError> {
        self.advance(); // do
        self.eat_punct(':');
        let body = self.parse_block("do-while loop")?;
        self.skip_newlines();
        self.expect_keyword("while", "after the do-while body")?;
        let cond = self.parse_condition()?;
        Ok(StmtKind::DoWhile { body, cond })
    }

    /// `for (init; cond; step): { .. }` - exactly three ';'-separated clauses
    fn parse_for(&mut self) -> Result<StmtKind, SoutkError> {
        self.advance(); // for
        let parenthesized = self.eat_punct('(');

        let init = Box::new(self.parse_for_clause()?);
        if !self.eat_punct(';') {
            return Err(self
                .parse_error("for loop expects exactly three clauses (init; condition; step)"));
        }
        let cond = self.parse_expr()?;
        if !self.eat_punct(';') {
            return Err(self
                .parse_error("for loop expects exactly three clauses (init; condition; step)"));
        }
        let step = Box::new(self.parse_for_clause()?);
        if self.check_punct(';') {
            return Err(self
                .parse_error("for loop expects exactly three clauses (init; condition; step)"));
        }
        if parenthesized {
            self.expect_punct(')', "after the for loop header")?;
        }
        self.eat_punct(':');
        let body = self.parse_body("for loop")?;
        Ok(StmtKind::ForClassic { init, cond, step, body })
    }

    /// One clause of a classic for header: a summon declaration or an
    /// assignment (`i = i + 1`).
    fn parse_for_clause(&mut self) -> Result<Stmt, SoutkError> {
        let line = self.line();
        let kind = if self.check_keyword("summon") {
            self.parse_summon()?
        } else {
            let name = self.expect_identifier("a variable name in for clause")?;
            if !self.eat_op("=") {
                return Err(self.parse_error("Expected '=' in for clause"));
            }
            let value = self.parse_expr()?;
            StmtKind::Assign { target: AssignTarget::Name(name), value }
        };
        Ok(Stmt { kind, line })
    }

    /// `stride i from a to b:` and its `loop i from a to b` alias.
    /// Bounds are inclusive and the induction variable is unbound (or
    /// restored) when the loop exits.
    fn parse_range_loop(&mut self, keyword: &str) -> Result<StmtKind, SoutkError> {
        self.advance(); // stride / loop
        let var = self
            .expect_identifier(&format!("an induction variable after '{}'", keyword))?;
        self.expect_keyword("from", &format!("in {} loop", keyword))?;
        let start = self.parse_expr()?;
        self.expect_keyword("to", &format!("in {} loop", keyword))?;
        let end = self.parse_expr()?;
        self.eat_punct(':');
        let body = self.parse_body("range loop")?;
        Ok(StmtKind::RangeLoop { var, start, end, body })
    }

    /// `spell name(params):` with the body parsed once and stored
    fn parse_spell(&mut self) -> Result<FuncDef, SoutkError> {
        self.advance(); // spell
        let name = self.expect_identifier("a spell name")?;
        let params = self.parse_params()?;
        self.eat_punct(':');
        let body = self.parse_block(&format!("spell '{}'", name))?;
        Ok(FuncDef { name, params, body })
    }

    fn parse_params(&mut self) -> Result<Vec<String>, SoutkError> {
        self.expect_punct('(', "to open the parameter list")?;
        let mut params = Vec::new();
        if !self.check_punct(')') {
            loop {
                params.push(self.expect_identifier("a parameter name")?);
                if !self.eat_punct(',') {
                    break;
                }
            }
        }
        self.expect_punct(')', "to close the parameter list")?;
        Ok(params)
    }

    /// `forge spell name(..)` defines a function; `forge <kind> <name>`
    /// creates a container.
    fn parse_forge(&mut self) -> Result<StmtKind, SoutkError> {
        self.advance(); // forge
        if self.check_keyword("spell") {
            return Ok(StmtKind::FunctionDecl(self.parse_spell()?));
        }
        let kind_name = self.expect_identifier("a container kind after 'forge'")?;
        let kind = match kind_name.as_str() {
            "stack" => ContainerKind::Stack,
            "queue" => ContainerKind::Queue,
            "linklist" => ContainerKind::LinkedList,
            "grimoire" => ContainerKind::Grimoire,
            other => {
                return Err(self.parse_error(format!("Unknown data structure type: {}", other)))
            }
        };
        let name = self.expect_identifier("a container name")?;
        Ok(StmtKind::Forge { kind, name })
    }

    /// `cast f(args)` - a call in statement position
    fn parse_cast(&mut self) -> Result<StmtKind, SoutkError> {
        self.advance(); // cast
        let name = self.expect_identifier("a spell name after 'cast'")?;
        let args = self.parse_args()?;
        Ok(StmtKind::Expr(Expr::Call { name, args }))
    }

    /// `enchant Name:` class definition containing `spell construct` and
    /// `spell` methods
    fn parse_enchant(&mut self) -> Result<StmtKind, SoutkError> {
        self.advance(); // enchant
        let name = self.expect_identifier("a class name after 'enchant'")?;
        self.eat_punct(':');
        self.skip_newlines();
        self.expect_punct('{', "to open the enchant body")?;

        let mut constructor = None;
        let mut methods = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat_punct('}') {
                break;
            }
            if matches!(self.peek(), TokenKind::Eof) {
                return Err(self.parse_error(format!("Unmatched '{{' in enchant '{}'", name)));
            }
            if !self.check_keyword("spell") {
                return Err(self.parse_error(format!(
                    "Only spell definitions are allowed inside enchant '{}'",
                    name
                )));
            }
            let func = self.parse_spell()?;
            if func.name == "construct" {
                constructor = Some(func);
            } else {
                methods.push(func);
            }
        }
        Ok(StmtKind::ClassDecl { name, constructor, methods })
    }

    /// `ward:` guarded block with an optional `rescue [name]:` handler
    fn parse_ward(&mut self) -> Result<StmtKind, SoutkError> {
        self.advance(); // ward
        self.eat_punct(':');
        let try_block = self.parse_block("ward")?;

        let save = self.pos;
        self.skip_newlines();
        if self.eat_keyword("rescue") {
            let error_var = match self.peek() {
                TokenKind::Identifier(name) => {
                    let name = name.clone();
                    self.advance();
                    name
                }
                _ => "error".to_string(),
            };
            self.eat_punct(':');
            let rescue_block = self.parse_block("rescue")?;
            return Ok(StmtKind::TryRescue { try_block, error_var, rescue_block: Some(rescue_block) });
        }
        self.pos = save;
        Ok(StmtKind::TryRescue {
            try_block,
            error_var: "error".to_string(),
            rescue_block: None,
        })
    }

    /// `scroll "path" into var`
    fn parse_scroll(&mut self) -> Result<StmtKind, SoutkError> {
        self.advance(); // scroll
        let path = self.expect_string("a file path after 'scroll'")?;
        self.expect_keyword("into", "in scroll statement")?;
        let var = self.expect_identifier("a variable name after 'into'")?;
        Ok(StmtKind::FileRead { path, var })
    }

    /// `inscribe "path" with expr` / `append "path" with expr`
    fn parse_file_write(&mut self, appending: bool) -> Result<StmtKind, SoutkError> {
        let keyword = if appending { "append" } else { "inscribe" };
        self.advance();
        let path = self.expect_string(&format!("a file path after '{}'", keyword))?;
        self.expect_keyword("with", &format!("in {} statement", keyword))?;
        let value = self.parse_expr()?;
        if appending {
            Ok(StmtKind::FileAppend { path, value })
        } else {
            Ok(StmtKind::FileWrite { path, value })
        }
    }

    /// `invoke "path" as alias` imports a module; `invoke f(args)` calls a
    /// spell in statement position.
    fn parse_invoke(&mut self) -> Result<StmtKind, SoutkError> {
        self.advance(); // invoke
        if matches!(self.peek(), TokenKind::Str(_)) {
            let path = self.expect_string("a module path")?;
            let alias = if self.eat_keyword("as") {
                Some(self.expect_identifier("an alias after 'as'")?)
            } else {
                None
            };
            return Ok(StmtKind::ModuleImport { path, alias });
        }
        let name = self.expect_identifier("a spell name or module path after 'invoke'")?;
        let args = self.parse_args()?;
        Ok(StmtKind::Expr(Expr::Call { name, args }))
    }

    // ------------------------------------------------------------------
    // Expressions, precedence climbing: || < && < == != < < > <= >= <
    // additive < multiplicative < unary < postfix < primary
    // ------------------------------------------------------------------

    pub fn parse_expr(&mut self) -> Result<Expr, SoutkError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, SoutkError> {
        let mut left = self.parse_and()?;
        while self.eat_op("||") {
            let right = self.parse_and()?;
            left = Expr::Binary { op: BinOp::Or, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, SoutkError> {
        let mut left = self.parse_equality()?;
        while self.eat_op("&&") {
            let right = self.parse_equality()?;
            left = Expr::Binary { op: BinOp::And, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, SoutkError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = if self.eat_op("==") {
                BinOp::Eq
            } else if self.eat_op("!=") {
                BinOp::Ne
            } else {
                break;
            };
            let right = self.parse_comparison()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, SoutkError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = if self.eat_op("<=") {
                BinOp::Le
            } else if self.eat_op(">=") {
                BinOp::Ge
            } else if self.eat_op("<") {
                BinOp::Lt
            } else if self.eat_op(">") {
                BinOp::Gt
            } else {
                break;
            };
            let right = self.parse_additive()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    /// `+` chains collect into a Concat node so the add-or-join decision is
    /// made once per chain from the combined operand types. `-` keeps its
    /// binary shape.
    fn parse_additive(&mut self) -> Result<Expr, SoutkError> {
        let mut parts = vec![self.parse_multiplicative()?];
        loop {
            if self.eat_op("+") {
                parts.push(self.parse_multiplicative()?);
            } else if self.eat_op("-") {
                let left = Self::collapse_chain(parts);
                let right = self.parse_multiplicative()?;
                parts = vec![Expr::Binary {
                    op: BinOp::Sub,
                    left: Box::new(left),
                    right: Box::new(right),
                }];
            } else {
                break;
            }
        }
        Ok(Self::collapse_chain(parts))
    }

    fn collapse_chain(mut parts: Vec<Expr>) -> Expr {
        if parts.len() == 1 {
            parts.pop().unwrap()
        } else {
            Expr::Concat(parts)
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, SoutkError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.eat_op("*") {
                BinOp::Mul
            } else if self.eat_op("/") {
                BinOp::Div
            } else if self.eat_op("%") {
                BinOp::Mod
            } else {
                break;
            };
            let right = self.parse_unary()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SoutkError> {
        if self.eat_op("-") {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { operand: Box::new(operand) });
        }
        if self.eat_op("!") || self.eat_keyword("not") {
            let operand = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, SoutkError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check_punct('(') {
                // Only a bare name can head a call
                if let Expr::Identifier(name) = expr {
                    let args = self.parse_args()?;
                    expr = Expr::Call { name, args };
                    continue;
                }
                return Err(self.parse_error("Only named spells can be called"));
            }
            if self.eat_punct('[') {
                let index = self.parse_expr()?;
                self.expect_punct(']', "after index expression")?;
                expr = Expr::Index { target: Box::new(expr), index: Box::new(index) };
                continue;
            }
            if self.check_punct('.') {
                self.advance();
                let name = self.expect_identifier("an attribute or method name after '.'")?;
                if self.check_punct('(') {
                    let args = self.parse_args()?;
                    expr = Expr::MethodCall { object: Box::new(expr), method: name, args };
                } else {
                    expr = Expr::Attribute { object: Box::new(expr), name };
                }
                continue;
            }
            break;
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, SoutkError> {
        self.expect_punct('(', "to open the argument list")?;
        let mut args = Vec::new();
        if !self.check_punct(')') {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat_punct(',') {
                    break;
                }
            }
        }
        self.expect_punct(')', "to close the argument list")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, SoutkError> {
        match self.peek().clone() {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::Int(n))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Expr::Float(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::Bool(b) => {
                self.advance();
                Ok(Expr::Bool(b))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::Identifier(name))
            }
            TokenKind::Punct('(') => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect_punct(')', "to close the grouping")?;
                Ok(expr)
            }
            TokenKind::Punct('[') => {
                self.advance();
                let mut items = Vec::new();
                self.skip_newlines();
                if !self.check_punct(']') {
                    loop {
                        items.push(self.parse_expr()?);
                        self.skip_newlines();
                        if !self.eat_punct(',') {
                            break;
                        }
                        self.skip_newlines();
                    }
                }
                self.expect_punct(']', "to close the array literal")?;
                Ok(Expr::ArrayLiteral(items))
            }
            other => Err(self.parse_error(format!("Unexpected {:?} in expression", other))),
        }
    }
}
