/*
 * Local Flow Engine
 *
 * Forward, path-sensitive walk of one method or initializer body, starting
 * from a source expression. No control-flow graph is built: statements are
 * interpreted in order over a FlowState per path.
 *
 * - Branches: each arm starts from the state refined by the guard polarity
 *   it runs under; arms that complete abruptly do not reach the join.
 * - Loops: the body is re-walked until the head state is stable or
 *   FlowConfig::max_loop_iterations is reached.
 * - Locals: last write wins. Assigning a clean value stops the flow.
 * - Nested method and class declarations are separate scopes and skipped.
 *
 * Example:
 *   String name = entry.getName();          // source
 *   File f = new File(dir, name);           // `name` read: Value sink candidate
 *   if (!f.toPath().normalize().startsWith(dir.toPath().normalize()))
 *       throw new IOException("Bad zip entry");
 *   new FileOutputStream(f);                // `f` sanitized on this path
 */

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::debug;

use super::super::domain::{FlowKind, FlowNode, FlowState, Guard, SinkFlow};
use super::super::ports::FlowSpec;
use crate::config::FlowConfig;
use crate::features::traversal::TreePath;
use crate::shared::models::{
    node_id, Assignment, BinaryOp, Block, ExprKind, Expression, ForEach, If, Statement, Try,
    TreeRef, UnaryOp, VariableDecls,
};

/// Flow query rooted at one expression
#[derive(Debug, Clone)]
pub struct LocalFlow {
    start: TreePath,
    config: FlowConfig,
}

impl LocalFlow {
    /// Query starting at the expression at the end of `start`
    pub fn starting_at(start: TreePath) -> Self {
        Self {
            start,
            config: FlowConfig::default(),
        }
    }

    /// Builder: Set walk limits
    pub fn with_config(mut self, config: FlowConfig) -> Self {
        self.config = config;
        self
    }

    /// All sinks reachable from the start without crossing a sanitizer guard
    pub fn find_sinks<S: FlowSpec + ?Sized>(&self, spec: &S) -> SinkFlow {
        self.run(spec, false)
    }

    /// `true` as soon as one sink is reached
    pub fn any_local_flow<S: FlowSpec + ?Sized>(&self, spec: &S) -> bool {
        !self.run(spec, true).is_empty()
    }

    fn run<S: FlowSpec + ?Sized>(&self, spec: &S, stop_at_first: bool) -> SinkFlow {
        let Some(source) = self.start.value().and_then(TreeRef::as_expression).cloned() else {
            return SinkFlow::empty(self.start.clone());
        };
        if !spec.is_source(&FlowNode::new(source.clone(), self.start.clone())) {
            return SinkFlow::empty(self.start.clone());
        }
        let Some((index, block)) = self.start.find_outer_executable_block() else {
            debug!("source outside any executable block");
            return SinkFlow::empty(self.start.clone());
        };

        let mut walker = Walker {
            spec,
            source,
            config: &self.config,
            stack: self.start.prefix(index + 1).nodes().to_vec(),
            loops: Vec::new(),
            sinks: Vec::new(),
            seen: FxHashSet::default(),
            stop_at_first,
            depth: 0,
        };
        walker.exec_block(block, FlowState::new());

        debug!(
            kind = ?spec.kind(),
            sinks = walker.sinks.len(),
            "local flow query finished"
        );
        SinkFlow {
            source: self.start.clone(),
            sinks: walker.sinks,
        }
    }
}

/// States leaving a loop body through `break` and `continue`
#[derive(Debug, Default)]
struct LoopFrame {
    breaks: Option<FlowState>,
    continues: Option<FlowState>,
}

struct Walker<'a, S: FlowSpec + ?Sized> {
    spec: &'a S,
    source: Arc<Expression>,
    config: &'a FlowConfig,

    /// Root-to-current nodes, kept in step with the walk
    stack: Vec<TreeRef>,
    loops: Vec<LoopFrame>,
    sinks: Vec<FlowNode>,

    /// Expressions already offered to the sink predicate
    seen: FxHashSet<usize>,
    stop_at_first: bool,
    depth: usize,
}

impl<S: FlowSpec + ?Sized> Walker<'_, S> {
    fn done(&self) -> bool {
        self.stop_at_first && !self.sinks.is_empty()
    }

    fn is_taint(&self) -> bool {
        self.spec.kind() == FlowKind::Taint
    }

    fn path(&self) -> TreePath {
        TreePath::from_nodes(self.stack.clone())
    }

    fn within<T>(&mut self, node: TreeRef, f: impl FnOnce(&mut Self) -> T) -> T {
        self.stack.push(node);
        let out = f(self);
        self.stack.pop();
        out
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════════

    /// Statements of a block already on the stack; `None` when control cannot
    /// leave the block normally
    fn exec_block(&mut self, block: &Arc<Block>, state: FlowState) -> Option<FlowState> {
        let mut current = Some(state);
        for statement in &block.statements {
            let state = current?;
            if self.done() {
                return Some(state);
            }
            current = self.exec_child(statement, state);
        }
        current
    }

    fn exec_child(&mut self, statement: &Arc<Statement>, state: FlowState) -> Option<FlowState> {
        self.within(TreeRef::Statement(statement.clone()), |w| {
            w.exec_statement(statement, state)
        })
    }

    fn exec_nested_block(&mut self, block: &Arc<Block>, state: FlowState) -> Option<FlowState> {
        self.within(TreeRef::Block(block.clone()), |w| w.exec_block(block, state))
    }

    fn exec_statement(&mut self, statement: &Arc<Statement>, state: FlowState) -> Option<FlowState> {
        if self.done() || self.depth >= self.config.max_depth {
            return Some(state);
        }
        self.depth += 1;
        let out = self.exec_statement_kind(statement, state);
        self.depth -= 1;
        out
    }

    fn exec_statement_kind(
        &mut self,
        statement: &Arc<Statement>,
        mut state: FlowState,
    ) -> Option<FlowState> {
        match statement.as_ref() {
            Statement::VarDecl(decls) => {
                self.declare(decls, &mut state);
                Some(state)
            }
            Statement::Expr(e) => {
                self.eval(e, &mut state);
                Some(state)
            }
            Statement::If(i) => self.exec_if(i, state),
            Statement::While(w) => self.exec_loop(Some(&w.condition), &w.body, &[], state),
            Statement::For(f) => {
                let mut current = Some(state);
                for init in &f.init {
                    let s = current?;
                    current = self.exec_child(init, s);
                }
                self.exec_loop(f.condition.as_ref(), &f.body, &f.update, current?)
            }
            Statement::ForEach(f) => self.exec_for_each(f, state),
            Statement::Try(t) => self.exec_try(t, state),
            Statement::Block(b) => self.exec_nested_block(b, state),
            Statement::Return(value) => {
                if let Some(value) = value {
                    self.eval(value, &mut state);
                }
                None
            }
            Statement::Throw(e) => {
                self.eval(e, &mut state);
                None
            }
            Statement::Break => {
                if let Some(frame) = self.loops.last_mut() {
                    frame.breaks = FlowState::merge(frame.breaks.take(), Some(state));
                }
                None
            }
            Statement::Continue => {
                if let Some(frame) = self.loops.last_mut() {
                    frame.continues = FlowState::merge(frame.continues.take(), Some(state));
                }
                None
            }
            Statement::MethodDecl(_) | Statement::ClassDecl(_) => Some(state),
        }
    }

    fn declare(&mut self, decls: &VariableDecls, state: &mut FlowState) {
        for variable in &decls.variables {
            self.within(TreeRef::Variable(variable.clone()), |w| {
                let tainted = variable
                    .initializer
                    .as_ref()
                    .map(|init| w.eval(init, state))
                    .unwrap_or(false);
                state.assign(&variable.name, tainted);
            });
        }
    }

    fn exec_if(&mut self, stmt: &If, mut state: FlowState) -> Option<FlowState> {
        self.eval(&stmt.condition, &mut state);

        let mut then_state = state.clone();
        self.apply_guard(&stmt.condition, true, &mut then_state);
        let then_out = self.exec_child(&stmt.then_branch, then_state);

        let mut else_state = state;
        self.apply_guard(&stmt.condition, false, &mut else_state);
        let else_out = match &stmt.else_branch {
            Some(else_branch) => self.exec_child(else_branch, else_state),
            None => Some(else_state),
        };

        FlowState::merge(then_out, else_out)
    }

    fn exec_loop(
        &mut self,
        condition: Option<&Arc<Expression>>,
        body: &Arc<Statement>,
        update: &[Arc<Expression>],
        state: FlowState,
    ) -> Option<FlowState> {
        let mut head = state;
        let mut exit: Option<FlowState> = None;

        for _ in 0..self.config.max_loop_iterations {
            let mut at_condition = head.clone();
            let body_in = match condition {
                Some(c) => {
                    self.eval(c, &mut at_condition);
                    let mut body_in = at_condition.clone();
                    self.apply_guard(c, true, &mut body_in);
                    let mut leave = at_condition;
                    self.apply_guard(c, false, &mut leave);
                    exit = FlowState::merge(exit, Some(leave));
                    body_in
                }
                None => at_condition,
            };

            self.loops.push(LoopFrame::default());
            let body_out = self.exec_child(body, body_in);
            let frame = self.loops.pop().unwrap_or_default();
            exit = FlowState::merge(exit, frame.breaks);

            let mut back = FlowState::merge(body_out, frame.continues);
            if let Some(back) = back.as_mut() {
                for u in update {
                    self.eval(u, back);
                }
            }

            let next = match &back {
                Some(back) => head.join(back),
                None => head.clone(),
            };
            if next == head || self.done() {
                break;
            }
            head = next;
        }

        exit
    }

    fn exec_for_each(&mut self, stmt: &ForEach, mut state: FlowState) -> Option<FlowState> {
        let element_tainted = self.eval(&stmt.iterable, &mut state);
        let mut head = state;
        let mut exit = Some(head.clone());

        for _ in 0..self.config.max_loop_iterations {
            let mut body_in = head.clone();
            body_in.assign(&stmt.variable.name, element_tainted);

            self.loops.push(LoopFrame::default());
            let body_out = self.exec_child(&stmt.body, body_in);
            let frame = self.loops.pop().unwrap_or_default();
            exit = FlowState::merge(exit, frame.breaks);

            let back = FlowState::merge(body_out, frame.continues);
            exit = FlowState::merge(exit, back.clone());

            let next = match &back {
                Some(back) => head.join(back),
                None => head.clone(),
            };
            if next == head || self.done() {
                break;
            }
            head = next;
        }

        exit
    }

    fn exec_try(&mut self, stmt: &Try, mut state: FlowState) -> Option<FlowState> {
        for resource in &stmt.resources {
            self.declare(resource, &mut state);
        }
        let before = state.clone();
        let body_out = self.exec_nested_block(&stmt.body, state);

        // A handler may be entered from any point of the body
        let handler_in = FlowState::merge(Some(before), body_out.clone());
        let mut out = body_out;
        for catch in &stmt.catches {
            if let Some(mut s) = handler_in.clone() {
                s.clear(&catch.parameter.name);
                let caught = self.exec_nested_block(&catch.body, s);
                out = FlowState::merge(out, caught);
            }
        }

        let Some(finally) = &stmt.finally else {
            return out;
        };
        match out {
            Some(s) => self.exec_nested_block(finally, s),
            None => {
                if let Some(s) = handler_in {
                    self.exec_nested_block(finally, s);
                }
                None
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Guards
    // ═══════════════════════════════════════════════════════════════════════

    /// Refine `state` for the paths on which `condition` evaluated to `branch`
    fn apply_guard(&mut self, condition: &Arc<Expression>, branch: bool, state: &mut FlowState) {
        self.within(TreeRef::Expression(condition.clone()), |w| match &condition.kind {
            ExprKind::Parens(inner) => w.apply_guard(inner, branch, state),
            ExprKind::Unary(u) if u.operator == UnaryOp::Not => {
                w.apply_guard(&u.operand, !branch, state)
            }
            ExprKind::Binary(b)
                if (b.operator == BinaryOp::And && branch)
                    || (b.operator == BinaryOp::Or && !branch) =>
            {
                w.apply_guard(&b.left, branch, state);
                w.apply_guard(&b.right, branch, state);
            }
            _ => {
                if state.live_count() == 0 {
                    return;
                }
                let guard = Guard {
                    expression: condition.clone(),
                    path: w.path(),
                };
                if w.spec.is_sanitizer_guard(&guard, branch) {
                    for name in condition.local_reads() {
                        state.sanitize(name);
                    }
                }
            }
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════════

    /// Walk `expr` in evaluation order; `true` when its value carries the flow
    fn eval(&mut self, expr: &Arc<Expression>, state: &mut FlowState) -> bool {
        if self.done() {
            return false;
        }
        self.stack.push(TreeRef::Expression(expr.clone()));
        let derived = self.eval_kind(expr, state);
        let tainted = derived || Arc::ptr_eq(expr, &self.source);
        if tainted {
            self.check_sink(expr);
        }
        self.stack.pop();
        tainted
    }

    fn eval_kind(&mut self, expr: &Arc<Expression>, state: &mut FlowState) -> bool {
        let taint = self.is_taint();
        match &expr.kind {
            ExprKind::Identifier(_) => expr.local_name().map(|n| state.is_live(n)).unwrap_or(false),
            ExprKind::Literal(_) => false,
            ExprKind::FieldAccess(f) => {
                let target = self.eval(&f.target, state);
                taint && target
            }
            ExprKind::MethodInvocation(m) => {
                let mut any = false;
                if let Some(select) = &m.select {
                    any |= self.eval(select, state);
                }
                for arg in &m.arguments {
                    any |= self.eval(arg, state);
                }
                taint && any
            }
            ExprKind::NewClass(n) => {
                let mut any = false;
                for arg in &n.arguments {
                    any |= self.eval(arg, state);
                }
                taint && any
            }
            ExprKind::NewArray(a) => {
                self.eval(&a.dimension, state);
                false
            }
            ExprKind::Binary(b) => {
                let left = self.eval(&b.left, state);
                let right = self.eval(&b.right, state);
                taint && b.operator == BinaryOp::Add && expr.ty.is_string() && (left || right)
            }
            ExprKind::Unary(u) => {
                self.eval(&u.operand, state);
                false
            }
            ExprKind::Assignment(a) => self.eval_assignment(a, state),
            ExprKind::Parens(inner) => self.eval(inner, state),
            ExprKind::TypeCast(c) => self.eval(&c.expression, state),
            ExprKind::Ternary(t) => {
                self.eval(&t.condition, state);

                let mut then_state = state.clone();
                self.apply_guard(&t.condition, true, &mut then_state);
                let then_tainted = self.eval(&t.then_expr, &mut then_state);

                let mut else_state = state.clone();
                self.apply_guard(&t.condition, false, &mut else_state);
                let else_tainted = self.eval(&t.else_expr, &mut else_state);

                *state = then_state.join(&else_state);
                then_tainted || else_tainted
            }
        }
    }

    fn eval_assignment(&mut self, assignment: &Assignment, state: &mut FlowState) -> bool {
        let Some(name) = assignment.target.local_name() else {
            self.eval(&assignment.target, state);
            return self.eval(&assignment.value, state);
        };

        let was_live = state.is_live(name);
        let value = self.eval(&assignment.value, state);
        let result = match assignment.operator {
            None => value,
            Some(_) => self.is_taint() && (was_live || value),
        };
        state.assign(name, result);
        result
    }

    fn check_sink(&mut self, expr: &Arc<Expression>) {
        if !self.seen.insert(node_id(expr)) {
            return;
        }
        let node = FlowNode::new(expr.clone(), self.path());
        if self.spec.is_sink(&node) {
            debug!(depth = node.path.len(), "flow reached sink");
            self.sinks.push(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::matching::{MethodSignature, ShapeMatcher, SignatureMatcher, CREATE_FILE_SINKS};
    use crate::features::taint_analysis::ports::FnFlowSpec;
    use crate::shared::models::build::{self, jdk};
    use crate::shared::models::{fqn, JavaType};

    fn zip_entry() -> JavaType {
        JavaType::class(fqn::ZIP_ENTRY)
    }

    fn get_name() -> Arc<Expression> {
        build::call(build::ident("entry", zip_entry()), jdk::zip_entry_get_name(), vec![])
    }

    fn body_path(statements: Vec<Arc<Statement>>, target: &Arc<Expression>) -> TreePath {
        let method = build::method(
            "extract",
            vec![build::param(zip_entry(), "entry"), build::param(JavaType::file(), "dir")],
            build::block(statements),
        );
        let cu = build::compilation_unit(None, &[], vec![build::class("Extractor", vec![method])]);
        TreePath::locate(TreeRef::CompilationUnit(cu), &TreeRef::Expression(target.clone()))
            .expect("target is in the tree")
    }

    fn file_ctor_arg(path: &TreePath) -> bool {
        let sig = MethodSignature::parse("java.io.File <constructor>(.., java.lang.String)").unwrap();
        SignatureMatcher.is_argument_of(path, &sig, 1)
    }

    fn value_to_file_ctor(source: &Arc<Expression>) -> FnFlowSpec<'_> {
        FnFlowSpec::value(move |n| n.is(source), |n| file_ctor_arg(&n.path))
    }

    fn new_file(name: Arc<Expression>) -> Arc<Expression> {
        build::new_instance(
            jdk::file_of_parent_and_child(),
            vec![build::ident("dir", JavaType::file()), name],
        )
    }

    fn name() -> Arc<Expression> {
        build::ident("name", JavaType::string())
    }

    fn normalized_starts_with(file: &str) -> Arc<Expression> {
        let normalized = |e| build::call(build::call(e, jdk::file_to_path(), vec![]), jdk::path_normalize(), vec![]);
        build::call(
            normalized(build::ident(file, JavaType::file())),
            jdk::path_starts_with_path(),
            vec![normalized(build::ident("dir", JavaType::file()))],
        )
    }

    fn starts_with_guard(guard: &Guard, branch: bool) -> bool {
        branch
            && guard.expression.method_type().map(|m| m.name == "startsWith").unwrap_or(false)
    }

    #[test]
    fn test_value_flow_through_local() {
        let source = get_name();
        let sink_read = name();
        let statements = vec![
            build::var_decl(JavaType::string(), "name", Some(source.clone())),
            build::var_decl(JavaType::file(), "f", Some(new_file(sink_read.clone()))),
        ];
        let flow = LocalFlow::starting_at(body_path(statements, &source)).find_sinks(&value_to_file_ctor(&source));
        assert_eq!(flow.sinks.len(), 1);
        assert!(flow.sinks[0].is(&sink_read));
    }

    #[test]
    fn test_reassignment_stops_flow() {
        let source = get_name();
        let statements = vec![
            build::var_decl(JavaType::string(), "name", Some(source.clone())),
            build::expr_stmt(build::assign(name(), build::string_lit("safe"))),
            build::var_decl(JavaType::file(), "f", Some(new_file(name()))),
        ];
        let flow = LocalFlow::starting_at(body_path(statements, &source)).find_sinks(&value_to_file_ctor(&source));
        assert!(flow.is_empty());
    }

    #[test]
    fn test_value_flow_ignores_concatenation() {
        let source = get_name();
        let statements = vec![
            build::var_decl(JavaType::string(), "name", Some(build::add(build::string_lit("x"), source.clone()))),
            build::var_decl(JavaType::file(), "f", Some(new_file(name()))),
        ];
        let path = body_path(statements, &source);
        assert!(LocalFlow::starting_at(path.clone()).find_sinks(&value_to_file_ctor(&source)).is_empty());

        let taint = FnFlowSpec::taint(|n| n.is(&source), |n| file_ctor_arg(&n.path));
        assert!(LocalFlow::starting_at(path).any_local_flow(&taint));
    }

    fn create_file_spec(source: &Arc<Expression>) -> FnFlowSpec<'_> {
        FnFlowSpec::taint(move |n| n.is(source), |n| SignatureMatcher.is_sink_of(&n.path, &CREATE_FILE_SINKS))
            .sanitized_by(starts_with_guard)
    }

    fn fos(file: &str) -> Arc<Statement> {
        build::var_decl(
            JavaType::class("java.io.FileOutputStream"),
            "out",
            Some(build::new_instance(jdk::file_output_stream_of_file(), vec![build::ident(file, JavaType::file())])),
        )
    }

    #[test]
    fn test_guard_after_declaration_sanitizes() {
        let source = new_file(get_name());
        let unguarded = vec![build::var_decl(JavaType::file(), "f", Some(source.clone())), fos("f")];
        let flow = LocalFlow::starting_at(body_path(unguarded, &source)).find_sinks(&create_file_spec(&source));
        assert_eq!(flow.sinks.len(), 1);

        let source = new_file(get_name());
        let guarded = vec![
            build::var_decl(JavaType::file(), "f", Some(source.clone())),
            build::if_stmt(
                build::not(normalized_starts_with("f")),
                build::block_stmt(vec![build::throw_runtime("Bad zip entry")]),
                None,
            ),
            fos("f"),
        ];
        let flow = LocalFlow::starting_at(body_path(guarded, &source)).find_sinks(&create_file_spec(&source));
        assert!(flow.is_empty());
    }

    #[test]
    fn test_guard_polarity() {
        let source = new_file(get_name());
        let statements = vec![
            build::var_decl(JavaType::file(), "f", Some(source.clone())),
            build::if_stmt(
                normalized_starts_with("f"),
                build::block_stmt(vec![build::expr_stmt(build::string_lit("ok"))]),
                Some(build::block_stmt(vec![fos("f")])),
            ),
        ];
        let flow = LocalFlow::starting_at(body_path(statements, &source)).find_sinks(&create_file_spec(&source));
        assert_eq!(flow.sinks.len(), 1);
    }

    #[test]
    fn test_conjunction_guard_on_true_branch() {
        let source = new_file(get_name());
        let statements = vec![
            build::var_decl(JavaType::file(), "f", Some(source.clone())),
            build::if_stmt(
                build::and(build::ident("enabled", JavaType::boolean()), build::parens(normalized_starts_with("f"))),
                build::block_stmt(vec![fos("f")]),
                None,
            ),
        ];
        let flow = LocalFlow::starting_at(body_path(statements, &source)).find_sinks(&create_file_spec(&source));
        assert!(flow.is_empty());
    }

    #[test]
    fn test_loop_carried_flow() {
        let source = get_name();
        let sink_read = name();
        let statements = vec![
            build::var_decl(JavaType::string(), "name", Some(build::string_lit("a"))),
            build::while_stmt(
                build::ident("more", JavaType::boolean()),
                build::block_stmt(vec![
                    build::expr_stmt(new_file(sink_read.clone())),
                    build::expr_stmt(build::assign(name(), source.clone())),
                ]),
            ),
        ];
        let flow = LocalFlow::starting_at(body_path(statements, &source)).find_sinks(&value_to_file_ctor(&source));
        assert_eq!(flow.sinks.len(), 1);
        assert!(flow.sinks[0].is(&sink_read));
    }

    #[test]
    fn test_unreachable_after_return() {
        let source = get_name();
        let statements = vec![
            build::var_decl(JavaType::string(), "name", Some(source.clone())),
            build::return_stmt(None),
            build::expr_stmt(new_file(name())),
        ];
        let flow = LocalFlow::starting_at(body_path(statements, &source)).find_sinks(&value_to_file_ctor(&source));
        assert!(flow.is_empty());
    }

    #[test]
    fn test_for_each_element_carries_value() {
        let source = build::ident("names", JavaType::class("java.util.List"));
        let sink_read = build::ident("n", JavaType::string());
        let statements = vec![build::for_each(
            JavaType::string(),
            "n",
            source.clone(),
            build::block_stmt(vec![build::expr_stmt(new_file(sink_read.clone()))]),
        )];
        let flow = LocalFlow::starting_at(body_path(statements, &source)).find_sinks(&value_to_file_ctor(&source));
        assert!(flow.sinks.iter().any(|s| s.is(&sink_read)));
    }

    #[test]
    fn test_non_source_start_is_empty() {
        let source = get_name();
        let statements = vec![
            build::var_decl(JavaType::string(), "name", Some(source.clone())),
            build::expr_stmt(new_file(name())),
        ];
        let spec = FnFlowSpec::value(|_| false, |_| true);
        assert!(LocalFlow::starting_at(body_path(statements, &source)).find_sinks(&spec).is_empty());
    }

    #[test]
    fn test_field_initializer_has_no_scope() {
        let source = get_name();
        let field = build::var_decl(JavaType::string(), "name", Some(source.clone()));
        let cu = build::compilation_unit(None, &[], vec![build::class("A", vec![field])]);
        let path = TreePath::locate(TreeRef::CompilationUnit(cu), &TreeRef::Expression(source.clone())).unwrap();
        let spec = FnFlowSpec::value(|_| true, |_| true);
        assert!(LocalFlow::starting_at(path).find_sinks(&spec).is_empty());
    }

    #[test]
    fn test_depth_limit_truncates() {
        let source = get_name();
        let mut nested = build::expr_stmt(new_file(name()));
        for _ in 0..4 {
            nested = build::block_stmt(vec![nested]);
        }
        let statements = vec![build::var_decl(JavaType::string(), "name", Some(source.clone())), nested];
        let path = body_path(statements, &source);

        let shallow = FlowConfig::default().max_depth(3);
        assert!(LocalFlow::starting_at(path.clone())
            .with_config(shallow)
            .find_sinks(&value_to_file_ctor(&source))
            .is_empty());
        assert!(LocalFlow::starting_at(path).any_local_flow(&value_to_file_ctor(&source)));
    }

    #[test]
    fn test_try_catch_sees_body_assignments() {
        let source = get_name();
        let sink_read = name();
        let statements = vec![
            build::var_decl(JavaType::string(), "name", Some(build::string_lit("a"))),
            build::try_stmt(
                build::block(vec![build::expr_stmt(build::assign(name(), source.clone()))]),
                vec![build::catch_clause(
                    JavaType::class(fqn::IO_EXCEPTION),
                    "e",
                    build::block(vec![build::expr_stmt(new_file(sink_read.clone()))]),
                )],
                None,
            ),
        ];
        let flow = LocalFlow::starting_at(body_path(statements, &source)).find_sinks(&value_to_file_ctor(&source));
        assert!(flow.sinks.iter().any(|s| s.is(&sink_read)));
    }
}
