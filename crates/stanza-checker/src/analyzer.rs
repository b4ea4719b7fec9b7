//! Per-file analysis coordination.
//!
//! Drives the verification engine over every function-like in a file:
//! nested closures first (in source order), then the enclosing
//! function/method itself, then the docblock-vs-signature check. Assumes
//! the codebase has been fully scanned and linked.

use crate::manipulation::{ManipulationBuffer, SignatureEdit};
use crate::return_type::{FunctionLikeNode, ReturnTypeVerifier, Verdict};
use stanza_codebase::{Codebase, StorageError};
use stanza_common::{Issue, IssueBuffer};
use stanza_parser::{ClosureExpr, Declaration, Expr, FileAst, Stmt};

/// Everything one file's analysis produced. `issues` are ordered by source
/// offset; cross-file ordering is the caller's concern.
#[derive(Debug)]
pub struct AnalysisResult {
    pub file_path: String,
    pub issues: Vec<Issue>,
    pub edits: Vec<SignatureEdit>,
}

pub struct FileAnalyzer<'a> {
    codebase: &'a Codebase,
    alter_code: bool,
}

impl<'a> FileAnalyzer<'a> {
    pub fn new(codebase: &'a Codebase) -> Self {
        Self {
            codebase,
            alter_code: !codebase.config.issues_to_fix.is_empty(),
        }
    }

    pub fn analyze(&self, ast: &FileAst) -> Result<AnalysisResult, StorageError> {
        let _span = tracing::debug_span!("analyze_file", path = %ast.path).entered();

        let mut issues = IssueBuffer::new();
        let mut manipulations = ManipulationBuffer::new();

        {
            let mut verifier = ReturnTypeVerifier {
                codebase: self.codebase,
                config: &self.codebase.config,
                alter_code: self.alter_code,
                issues: &mut issues,
                manipulations: &mut manipulations,
            };

            for declaration in &ast.declarations {
                match declaration {
                    Declaration::Function(function) => {
                        let storage = self.codebase.functions.get_storage(
                            &self.codebase.files,
                            &function.name,
                            &ast.path,
                            &ast.path,
                        )?;

                        if let Some(body) = &function.body {
                            verify_closures(&mut verifier, body, &ast.path, None)?;
                        }

                        let node = FunctionLikeNode::Function(function);
                        let verdict =
                            verifier.verify_return_type(node, Some(&storage), &ast.path, None)?;
                        if verdict == Verdict::Continue {
                            verifier.check_return_type(node, &storage, None)?;
                        }
                    }
                    Declaration::ClassLike(class) => {
                        for method in &class.methods {
                            let storage =
                                self.codebase.get_method_storage(&class.name, &method.name)?;

                            if let Some(body) = &method.body {
                                verify_closures(&mut verifier, body, &ast.path, Some(&class.name))?;
                            }

                            let node = FunctionLikeNode::Method {
                                decl: method,
                                class: &class.name,
                            };
                            let verdict = verifier.verify_return_type(
                                node,
                                Some(&storage),
                                &ast.path,
                                Some(&class.name),
                            )?;
                            if verdict == Verdict::Continue {
                                verifier.check_return_type(node, &storage, Some(&class.name))?;
                            }
                        }
                    }
                }
            }
        }

        let mut issues = issues.into_issues();
        issues.sort_by_key(|issue| issue.location.span.start);

        Ok(AnalysisResult {
            file_path: ast.path.clone(),
            issues,
            edits: manipulations.into_edits(),
        })
    }
}

fn verify_closures(
    verifier: &mut ReturnTypeVerifier<'_, '_>,
    stmts: &[Stmt],
    file_path: &str,
    fq_class_name: Option<&str>,
) -> Result<(), StorageError> {
    let mut closures = Vec::new();
    collect_closures_in_stmts(stmts, &mut closures);

    for closure in closures {
        verifier.verify_return_type(
            FunctionLikeNode::Closure(closure),
            None,
            file_path,
            fq_class_name,
        )?;
    }
    Ok(())
}

fn collect_closures_in_stmts<'ast>(stmts: &'ast [Stmt], out: &mut Vec<&'ast ClosureExpr>) {
    for stmt in stmts {
        match stmt {
            Stmt::Return { expr, .. } => {
                if let Some(expr) = expr {
                    collect_closures_in_expr(expr, out);
                }
            }
            Stmt::Throw { expr, .. } | Stmt::Expression(expr) => {
                collect_closures_in_expr(expr, out);
            }
            Stmt::If {
                cond,
                then,
                elseifs,
                r#else,
                ..
            } => {
                collect_closures_in_expr(cond, out);
                collect_closures_in_stmts(then, out);
                for (elseif_cond, elseif_body) in elseifs {
                    collect_closures_in_expr(elseif_cond, out);
                    collect_closures_in_stmts(elseif_body, out);
                }
                if let Some(else_body) = r#else {
                    collect_closures_in_stmts(else_body, out);
                }
            }
            Stmt::While { cond, body, .. } | Stmt::DoWhile { body, cond, .. } => {
                collect_closures_in_expr(cond, out);
                collect_closures_in_stmts(body, out);
            }
            Stmt::Switch { subject, cases, .. } => {
                collect_closures_in_expr(subject, out);
                for case in cases {
                    if let Some(test) = &case.test {
                        collect_closures_in_expr(test, out);
                    }
                    collect_closures_in_stmts(&case.body, out);
                }
            }
            Stmt::Try {
                body,
                catches,
                finally,
                ..
            } => {
                collect_closures_in_stmts(body, out);
                for catch in catches {
                    collect_closures_in_stmts(&catch.body, out);
                }
                if let Some(finally_body) = finally {
                    collect_closures_in_stmts(finally_body, out);
                }
            }
            Stmt::Break { .. } | Stmt::Continue { .. } => {}
        }
    }
}

fn collect_closures_in_expr<'ast>(expr: &'ast Expr, out: &mut Vec<&'ast ClosureExpr>) {
    match expr {
        Expr::Closure(closure) => {
            out.push(closure);
            // Nested closures are verified in their own right.
            collect_closures_in_stmts(&closure.body, out);
        }
        Expr::Assign { value, .. } => collect_closures_in_expr(value, out),
        Expr::Binary { lhs, rhs, .. } => {
            collect_closures_in_expr(lhs, out);
            collect_closures_in_expr(rhs, out);
        }
        Expr::Unary { expr, .. } => collect_closures_in_expr(expr, out),
        Expr::Ternary {
            cond, then, r#else, ..
        } => {
            collect_closures_in_expr(cond, out);
            if let Some(then) = then {
                collect_closures_in_expr(then, out);
            }
            collect_closures_in_expr(r#else, out);
        }
        Expr::MethodCall { target, args, .. } => {
            collect_closures_in_expr(target, out);
            for arg in args {
                collect_closures_in_expr(arg, out);
            }
        }
        Expr::FunctionCall { args, .. } | Expr::New { args, .. } => {
            for arg in args {
                collect_closures_in_expr(arg, out);
            }
        }
        Expr::PropertyFetch { target, .. } => collect_closures_in_expr(target, out),
        Expr::Yield { value, .. } => {
            if let Some(value) = value {
                collect_closures_in_expr(value, out);
            }
        }
        _ => {}
    }
}
