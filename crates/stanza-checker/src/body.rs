//! Function-body walking: return/yield part collection.
//!
//! Walks all statements reachable under normal control flow, inferring the
//! type of every `return` and `yield` expression. Closure bodies are not
//! descended into — their returns belong to the closure.

use crate::expression::InferenceScope;
use smallvec::SmallVec;
use stanza_codebase::StorageError;
use stanza_parser::{Expr, Stmt};
use stanza_types::{Atomic, AtomicKind};

#[derive(Debug, Default)]
pub struct CollectedReturns {
    pub return_parts: SmallVec<[Atomic; 4]>,
    pub yield_parts: SmallVec<[Atomic; 4]>,
    pub ignore_nullable_issues: bool,
    pub ignore_falsable_issues: bool,
}

/// Collect the atomic return and yield types of a function body.
pub fn collect_return_types(
    stmts: &[Stmt],
    scope: &mut InferenceScope<'_>,
) -> Result<CollectedReturns, StorageError> {
    let mut collected = CollectedReturns::default();
    walk_statements(stmts, scope, &mut collected)?;
    Ok(collected)
}

fn walk_statements(
    stmts: &[Stmt],
    scope: &mut InferenceScope<'_>,
    collected: &mut CollectedReturns,
) -> Result<(), StorageError> {
    for stmt in stmts {
        match stmt {
            Stmt::Return { expr, span: _ } => match expr {
                Some(expr) => {
                    let ty = scope.infer_expr(expr)?;
                    if ty.ignore_nullable_issues {
                        collected.ignore_nullable_issues = true;
                    }
                    if ty.ignore_falsable_issues {
                        collected.ignore_falsable_issues = true;
                    }
                    collected.return_parts.extend(ty.parts);
                }
                None => collected.return_parts.push(Atomic::new(AtomicKind::Void)),
            },

            Stmt::Expression(expr) => {
                collect_yields(expr, scope, collected)?;
                scope.infer_expr(expr)?;
            }

            Stmt::Throw { expr, .. } => {
                scope.infer_expr(expr)?;
            }

            Stmt::If {
                cond,
                then,
                elseifs,
                r#else,
                ..
            } => {
                scope.infer_expr(cond)?;

                let saved = scope.vars.clone();
                walk_statements(then, scope, collected)?;
                let then_vars = std::mem::replace(&mut scope.vars, saved.clone());
                scope.merge_vars(then_vars);

                for (elseif_cond, elseif_body) in elseifs {
                    scope.infer_expr(elseif_cond)?;
                    let before = scope.vars.clone();
                    walk_statements(elseif_body, scope, collected)?;
                    let branch_vars = std::mem::replace(&mut scope.vars, before);
                    scope.merge_vars(branch_vars);
                }

                if let Some(else_body) = r#else {
                    let before = scope.vars.clone();
                    walk_statements(else_body, scope, collected)?;
                    let branch_vars = std::mem::replace(&mut scope.vars, before);
                    scope.merge_vars(branch_vars);
                }
            }

            Stmt::While { cond, body, .. } => {
                scope.infer_expr(cond)?;
                walk_statements(body, scope, collected)?;
            }

            Stmt::DoWhile { body, cond, .. } => {
                walk_statements(body, scope, collected)?;
                scope.infer_expr(cond)?;
            }

            Stmt::Switch { subject, cases, .. } => {
                scope.infer_expr(subject)?;
                for case in cases {
                    if let Some(test) = &case.test {
                        scope.infer_expr(test)?;
                    }
                    let before = scope.vars.clone();
                    walk_statements(&case.body, scope, collected)?;
                    let branch_vars = std::mem::replace(&mut scope.vars, before);
                    scope.merge_vars(branch_vars);
                }
            }

            Stmt::Try {
                body,
                catches,
                finally,
                ..
            } => {
                walk_statements(body, scope, collected)?;
                for catch in catches {
                    let before = scope.vars.clone();
                    if let Some(var) = &catch.var {
                        scope.vars.insert(
                            var.clone(),
                            stanza_types::Union::new([Atomic::named_object(&catch.class)]),
                        );
                    }
                    walk_statements(&catch.body, scope, collected)?;
                    let branch_vars = std::mem::replace(&mut scope.vars, before);
                    scope.merge_vars(branch_vars);
                }
                if let Some(finally_body) = finally {
                    walk_statements(finally_body, scope, collected)?;
                }
            }

            Stmt::Break { .. } | Stmt::Continue { .. } => {}
        }
    }

    Ok(())
}

fn collect_yields(
    expr: &Expr,
    scope: &mut InferenceScope<'_>,
    collected: &mut CollectedReturns,
) -> Result<(), StorageError> {
    match expr {
        Expr::Yield { value, .. } => match value {
            Some(value) => {
                collect_yields(value, scope, collected)?;
                let ty = scope.infer_expr(value)?;
                collected.yield_parts.extend(ty.parts);
            }
            // A bare `yield;` yields null.
            None => collected.yield_parts.push(Atomic::new(AtomicKind::Null)),
        },
        Expr::Assign { value, .. } => collect_yields(value, scope, collected)?,
        Expr::Binary { lhs, rhs, .. } => {
            collect_yields(lhs, scope, collected)?;
            collect_yields(rhs, scope, collected)?;
        }
        Expr::Unary { expr, .. } => collect_yields(expr, scope, collected)?,
        Expr::Ternary {
            cond, then, r#else, ..
        } => {
            collect_yields(cond, scope, collected)?;
            if let Some(then) = then {
                collect_yields(then, scope, collected)?;
            }
            collect_yields(r#else, scope, collected)?;
        }
        Expr::MethodCall { target, args, .. } => {
            collect_yields(target, scope, collected)?;
            for arg in args {
                collect_yields(arg, scope, collected)?;
            }
        }
        Expr::FunctionCall { args, .. } | Expr::New { args, .. } => {
            for arg in args {
                collect_yields(arg, scope, collected)?;
            }
        }
        Expr::PropertyFetch { target, .. } => collect_yields(target, scope, collected)?,
        // Closure bodies keep their yields to themselves.
        Expr::Closure(_) => {}
        _ => {}
    }
    Ok(())
}
