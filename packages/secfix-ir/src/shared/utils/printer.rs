//! Debug source printer
//!
//! Renders a tree as Java-like text for diagnostics and tests. Formatting is
//! fixed (four-space indent, one statement per line); it is not a formatter.

use std::fmt::Write as _;

use crate::shared::models::{
    Block, ClassDecl, CompilationUnit, ExprKind, Expression, Literal, MethodDecl, Modifier,
    Statement, VariableDecls,
};

const INDENT: &str = "    ";

pub fn print_compilation_unit(cu: &CompilationUnit) -> String {
    let mut p = Printer::default();
    if let Some(pkg) = &cu.package {
        p.line(&format!("package {};", pkg));
        p.blank();
    }
    for import in &cu.imports {
        let keyword = if import.is_static { "import static" } else { "import" };
        p.line(&format!("{} {};", keyword, import.qualified_name));
    }
    if !cu.imports.is_empty() {
        p.blank();
    }
    for class in &cu.classes {
        p.class(class);
    }
    p.out
}

pub fn print_block(block: &Block) -> String {
    let mut p = Printer::default();
    p.block_body(block);
    p.out
}

pub fn print_statement(statement: &Statement) -> String {
    let mut p = Printer::default();
    p.statement(statement);
    p.out
}

pub fn print_expression(expr: &Expression) -> String {
    let mut s = String::new();
    write_expression(&mut s, expr);
    s
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn block_body(&mut self, block: &Block) {
        for statement in &block.statements {
            self.statement(statement);
        }
    }

    fn braced(&mut self, header: &str, block: &Block) {
        self.line(&format!("{} {{", header));
        self.nested(|p| p.block_body(block));
        self.line("}");
    }

    fn class(&mut self, class: &ClassDecl) {
        let header = format!("{}class {}", modifiers(&class.modifiers), class.name);
        self.braced(&header, &class.body);
    }

    fn method(&mut self, method: &MethodDecl) {
        let params = method
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.type_name, p.name))
            .collect::<Vec<_>>()
            .join(", ");
        let mut header = modifiers(&method.modifiers);
        if let Some(ret) = &method.return_type_name {
            header.push_str(ret);
            header.push(' ');
        }
        let _ = write!(header, "{}({})", method.name, params);
        if !method.throws.is_empty() {
            let thrown = method
                .throws
                .iter()
                .filter_map(|t| t.simple_name())
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(header, " throws {}", thrown);
        }
        match &method.body {
            Some(body) => self.braced(&header, body),
            None => self.line(&format!("{};", header)),
        }
    }

    /// Print a branch body: blocks inline with the header, others indented
    fn branch(&mut self, header: &str, body: &Statement) {
        match body {
            Statement::Block(b) => self.braced(header, b),
            other => {
                self.line(header);
                self.nested(|p| p.statement(other));
            }
        }
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::VarDecl(decls) => self.line(&format!("{};", var_decls(decls))),
            Statement::Expr(e) => self.line(&format!("{};", print_expression(e))),
            Statement::If(i) => {
                let header = format!("if ({})", print_expression(&i.condition));
                match &i.else_branch {
                    None => self.branch(&header, &i.then_branch),
                    // `} else` continues on the closing line of a block branch
                    Some(else_branch) => match i.then_branch.as_ref() {
                        Statement::Block(b) => {
                            self.line(&format!("{} {{", header));
                            self.nested(|p| p.block_body(b));
                            self.branch("} else", else_branch);
                        }
                        _ => {
                            self.branch(&header, &i.then_branch);
                            self.branch("else", else_branch);
                        }
                    },
                }
            }
            Statement::While(w) => {
                let header = format!("while ({})", print_expression(&w.condition));
                self.branch(&header, &w.body);
            }
            Statement::For(f) => {
                let init = f
                    .init
                    .iter()
                    .map(|s| match s.as_ref() {
                        Statement::VarDecl(d) => var_decls(d),
                        Statement::Expr(e) => print_expression(e),
                        _ => String::new(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let condition = f.condition.as_ref().map(|c| print_expression(c)).unwrap_or_default();
                let update = f
                    .update
                    .iter()
                    .map(|u| print_expression(u))
                    .collect::<Vec<_>>()
                    .join(", ");
                let header = format!("for ({}; {}; {})", init, condition, update);
                self.branch(&header, &f.body);
            }
            Statement::ForEach(f) => {
                let header = format!(
                    "for ({} {} : {})",
                    f.type_name,
                    f.variable.name,
                    print_expression(&f.iterable)
                );
                self.branch(&header, &f.body);
            }
            Statement::Try(t) => {
                let header = if t.resources.is_empty() {
                    "try".to_string()
                } else {
                    let resources = t.resources.iter().map(var_decls).collect::<Vec<_>>().join("; ");
                    format!("try ({})", resources)
                };
                self.line(&format!("{} {{", header));
                self.nested(|p| p.block_body(&t.body));
                for catch in &t.catches {
                    self.line(&format!(
                        "}} catch ({} {}) {{",
                        catch.type_names.join(" | "),
                        catch.parameter.name
                    ));
                    self.nested(|p| p.block_body(&catch.body));
                }
                if let Some(finally) = &t.finally {
                    self.line("} finally {");
                    self.nested(|p| p.block_body(finally));
                }
                self.line("}");
            }
            Statement::Block(b) => {
                self.line(if b.is_static { "static {" } else { "{" });
                self.nested(|p| p.block_body(b));
                self.line("}");
            }
            Statement::Return(None) => self.line("return;"),
            Statement::Return(Some(e)) => self.line(&format!("return {};", print_expression(e))),
            Statement::Throw(e) => self.line(&format!("throw {};", print_expression(e))),
            Statement::Break => self.line("break;"),
            Statement::Continue => self.line("continue;"),
            Statement::MethodDecl(m) => self.method(m),
            Statement::ClassDecl(c) => self.class(c),
        }
    }
}

fn modifiers(modifiers: &[Modifier]) -> String {
    modifiers
        .iter()
        .map(|m| format!("{} ", m.keyword()))
        .collect()
}

fn var_decls(decls: &VariableDecls) -> String {
    let vars = decls
        .variables
        .iter()
        .map(|v| match &v.initializer {
            Some(init) => format!("{} = {}", v.name, print_expression(init)),
            None => v.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}{} {}", modifiers(&decls.modifiers), decls.type_name, vars)
}

fn write_args(out: &mut String, args: &[std::sync::Arc<Expression>]) {
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expression(out, arg);
    }
    out.push(')');
}

fn write_expression(out: &mut String, expr: &Expression) {
    match &expr.kind {
        ExprKind::Identifier(i) => out.push_str(&i.name),
        ExprKind::Literal(lit) => match lit {
            Literal::String(s) => {
                let _ = write!(out, "\"{}\"", escape(s, '"'));
            }
            Literal::Char(c) => {
                let _ = write!(out, "'{}'", escape(&c.to_string(), '\''));
            }
            Literal::Int(n) => {
                let _ = write!(out, "{}", n);
            }
            Literal::Long(n) => {
                let _ = write!(out, "{}L", n);
            }
            Literal::Boolean(b) => {
                let _ = write!(out, "{}", b);
            }
            Literal::Null => out.push_str("null"),
        },
        ExprKind::FieldAccess(f) => {
            write_expression(out, &f.target);
            out.push('.');
            out.push_str(&f.name);
        }
        ExprKind::MethodInvocation(m) => {
            if let Some(select) = &m.select {
                write_expression(out, select);
                out.push('.');
            }
            out.push_str(&m.name);
            write_args(out, &m.arguments);
        }
        ExprKind::NewClass(n) => {
            out.push_str("new ");
            out.push_str(&n.class_name);
            write_args(out, &n.arguments);
        }
        ExprKind::NewArray(a) => {
            let _ = write!(out, "new {}[", a.element_type_name);
            write_expression(out, &a.dimension);
            out.push(']');
        }
        ExprKind::Binary(b) => {
            write_expression(out, &b.left);
            let _ = write!(out, " {} ", b.operator.symbol());
            write_expression(out, &b.right);
        }
        ExprKind::Unary(u) => {
            out.push_str(u.operator.symbol());
            write_expression(out, &u.operand);
        }
        ExprKind::Assignment(a) => {
            write_expression(out, &a.target);
            match a.operator {
                Some(op) => {
                    let _ = write!(out, " {}= ", op.symbol());
                }
                None => out.push_str(" = "),
            }
            write_expression(out, &a.value);
        }
        ExprKind::Parens(inner) => {
            out.push('(');
            write_expression(out, inner);
            out.push(')');
        }
        ExprKind::TypeCast(c) => {
            let _ = write!(out, "({}) ", c.type_name);
            write_expression(out, &c.expression);
        }
        ExprKind::Ternary(t) => {
            write_expression(out, &t.condition);
            out.push_str(" ? ");
            write_expression(out, &t.then_expr);
            out.push_str(" : ");
            write_expression(out, &t.else_expr);
        }
    }
}

/// Escape `s` for a literal delimited by `quote`
fn escape(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}
