//! Final-control-action classification.
//!
//! Classifies how a statement list can leave its enclosing function: every
//! path accounted for by `End` means the function always terminates there.
//! The `return_is_terminal` switch exists for the `never` declared-type
//! check, where an explicit `return` must surface as its own action instead
//! of counting as a clean ending.

use rustc_hash::FxHashSet;
use stanza_parser::{Expr, Stmt, SwitchCase};
use std::collections::BTreeSet;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ControlAction {
    /// The path terminates the function: return (when terminal), throw,
    /// terminal call, or an inescapable loop.
    End,
    /// An explicit return, tracked separately when `return_is_terminal` is
    /// off.
    Return,
    Break,
    Continue,
    /// Control can fall past the end of the list.
    None,
}

pub type ActionSet = BTreeSet<ControlAction>;

/// The set containing only `End`: every path terminates.
pub fn terminal_set() -> ActionSet {
    BTreeSet::from([ControlAction::End])
}

/// Classify the possible final control actions of a statement list.
pub fn final_control_actions(
    stmts: &[Stmt],
    terminal_functions: &FxHashSet<String>,
    return_is_terminal: bool,
) -> ActionSet {
    let mut actions = ActionSet::new();

    for stmt in stmts {
        match stmt {
            Stmt::Return { .. } => {
                actions.insert(if return_is_terminal {
                    ControlAction::End
                } else {
                    ControlAction::Return
                });
                return actions;
            }
            Stmt::Throw { .. } => {
                actions.insert(ControlAction::End);
                return actions;
            }
            Stmt::Break { .. } => {
                actions.insert(ControlAction::Break);
                return actions;
            }
            Stmt::Continue { .. } => {
                actions.insert(ControlAction::Continue);
                return actions;
            }
            Stmt::Expression(expr) => {
                if is_terminal_call(expr, terminal_functions) {
                    actions.insert(ControlAction::End);
                    return actions;
                }
            }
            Stmt::If {
                then,
                elseifs,
                r#else,
                ..
            } => {
                let mut branch_actions = final_control_actions(
                    then,
                    terminal_functions,
                    return_is_terminal,
                );
                for (_, elseif_body) in elseifs {
                    branch_actions.extend(final_control_actions(
                        elseif_body,
                        terminal_functions,
                        return_is_terminal,
                    ));
                }
                match r#else {
                    Some(else_body) => {
                        branch_actions.extend(final_control_actions(
                            else_body,
                            terminal_functions,
                            return_is_terminal,
                        ));
                    }
                    // No else: the condition may be false and skip the
                    // statement entirely.
                    None => {
                        branch_actions.insert(ControlAction::None);
                    }
                }

                if !branch_actions.contains(&ControlAction::None) {
                    actions.extend(branch_actions);
                    return actions;
                }
                branch_actions.remove(&ControlAction::None);
                actions.extend(branch_actions);
            }
            Stmt::While { cond, body, .. } | Stmt::DoWhile { body, cond, .. } => {
                let body_actions =
                    final_control_actions(body, terminal_functions, return_is_terminal);
                let has_break = body_actions.contains(&ControlAction::Break)
                    || contains_break(body);

                if is_always_true(cond) && !has_break {
                    actions.insert(ControlAction::End);
                    return actions;
                }

                for action in body_actions {
                    if matches!(action, ControlAction::End | ControlAction::Return) {
                        actions.insert(action);
                    }
                }
            }
            Stmt::Switch { cases, .. } => {
                let mut case_actions = ActionSet::new();
                let mut has_default = false;

                for SwitchCase { test, body, .. } in cases {
                    if test.is_none() {
                        has_default = true;
                    }
                    for action in
                        final_control_actions(body, terminal_functions, return_is_terminal)
                    {
                        // A break leaves the switch and falls through to the
                        // following statement.
                        case_actions.insert(match action {
                            ControlAction::Break => ControlAction::None,
                            other => other,
                        });
                    }
                    // An empty or non-terminating clause falls into the next
                    // one; conservatively treat the switch as passable then.
                }

                if !has_default {
                    case_actions.insert(ControlAction::None);
                }

                if !case_actions.contains(&ControlAction::None) && !case_actions.is_empty() {
                    actions.extend(case_actions);
                    return actions;
                }
                case_actions.remove(&ControlAction::None);
                actions.extend(case_actions);
            }
            Stmt::Try {
                body,
                catches,
                finally,
                ..
            } => {
                let mut try_actions =
                    final_control_actions(body, terminal_functions, return_is_terminal);
                for catch in catches {
                    try_actions.extend(final_control_actions(
                        &catch.body,
                        terminal_functions,
                        return_is_terminal,
                    ));
                }

                if let Some(finally_body) = finally {
                    let finally_actions = final_control_actions(
                        finally_body,
                        terminal_functions,
                        return_is_terminal,
                    );
                    // A terminating finally overrides whatever try/catch did.
                    if !finally_actions.contains(&ControlAction::None) {
                        actions.extend(finally_actions);
                        return actions;
                    }
                }

                if !try_actions.contains(&ControlAction::None) && !try_actions.is_empty() {
                    actions.extend(try_actions);
                    return actions;
                }
                try_actions.remove(&ControlAction::None);
                actions.extend(try_actions);
            }
        }
    }

    actions.insert(ControlAction::None);
    actions
}

/// Whether a function body consists solely of throw statements and terminal
/// calls — the shape of a deliberate "not implemented" stub.
pub fn only_throws_or_exits(stmts: &[Stmt], terminal_functions: &FxHashSet<String>) -> bool {
    if stmts.is_empty() {
        return false;
    }
    stmts.iter().all(|stmt| match stmt {
        Stmt::Throw { .. } => true,
        Stmt::Expression(expr) => is_terminal_call(expr, terminal_functions),
        _ => false,
    })
}

fn is_terminal_call(expr: &Expr, terminal_functions: &FxHashSet<String>) -> bool {
    match expr {
        Expr::FunctionCall { name, .. } => terminal_functions.contains(&name.to_lowercase()),
        _ => false,
    }
}

fn is_always_true(cond: &Expr) -> bool {
    matches!(cond, Expr::BoolLit(true, _))
}

fn contains_break(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::Break { .. } => true,
        Stmt::If {
            then,
            elseifs,
            r#else,
            ..
        } => {
            contains_break(then)
                || elseifs.iter().any(|(_, body)| contains_break(body))
                || r#else.as_deref().is_some_and(contains_break)
        }
        Stmt::Try {
            body,
            catches,
            finally,
            ..
        } => {
            contains_break(body)
                || catches.iter().any(|catch| contains_break(&catch.body))
                || finally.as_deref().is_some_and(contains_break)
        }
        // Breaks inside nested loops and switches bind to those, not to the
        // enclosing loop.
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stanza_parser::{parse_file, Declaration};

    fn body_of(source: &str) -> Vec<Stmt> {
        let ast = parse_file("t.php", source).unwrap();
        match ast.declarations.into_iter().next().unwrap() {
            Declaration::Function(func) => func.body.unwrap(),
            _ => panic!("expected function"),
        }
    }

    fn terminals() -> FxHashSet<String> {
        ["exit".to_string(), "die".to_string()].into_iter().collect()
    }

    #[test]
    fn plain_return_is_terminal() {
        let body = body_of("function f() { return 1; }");
        assert_eq!(final_control_actions(&body, &terminals(), true), terminal_set());
    }

    #[test]
    fn return_counts_separately_for_never_check() {
        let body = body_of("function f() { return 1; }");
        let actions = final_control_actions(&body, &terminals(), false);
        assert_eq!(actions, BTreeSet::from([ControlAction::Return]));
    }

    #[test]
    fn if_without_else_can_fall_through() {
        let body = body_of("function f($x) { if ($x) { return 1; } }");
        let actions = final_control_actions(&body, &terminals(), true);
        assert!(actions.contains(&ControlAction::None));
    }

    #[test]
    fn exhaustive_if_else_is_terminal() {
        let body = body_of("function f($x) { if ($x) { return 1; } else { throw new E('x'); } }");
        assert_eq!(final_control_actions(&body, &terminals(), true), terminal_set());
    }

    #[test]
    fn infinite_loop_without_break_is_terminal() {
        let body = body_of("function f() { while (true) { $x = 1; } }");
        assert_eq!(final_control_actions(&body, &terminals(), true), terminal_set());
    }

    #[test]
    fn infinite_loop_with_break_falls_through() {
        let body = body_of("function f() { while (true) { break; } }");
        let actions = final_control_actions(&body, &terminals(), true);
        assert!(actions.contains(&ControlAction::None));
    }

    #[test]
    fn exit_call_is_terminal() {
        let body = body_of("function f() { exit(1); }");
        assert_eq!(final_control_actions(&body, &terminals(), true), terminal_set());
    }

    #[test]
    fn switch_with_terminal_default_is_terminal() {
        let body = body_of(
            "function f($x) { switch ($x) { case 1: return 1; default: return 2; } }",
        );
        assert_eq!(final_control_actions(&body, &terminals(), true), terminal_set());
    }

    #[test]
    fn switch_without_default_falls_through() {
        let body = body_of("function f($x) { switch ($x) { case 1: return 1; } }");
        let actions = final_control_actions(&body, &terminals(), true);
        assert!(actions.contains(&ControlAction::None));
    }

    #[test]
    fn terminating_finally_overrides_try() {
        let body = body_of(
            "function f() { try { $x = 1; } finally { throw new E('always'); } }",
        );
        assert_eq!(final_control_actions(&body, &terminals(), true), terminal_set());
    }

    #[test]
    fn only_throws_recognizes_stub_bodies() {
        let body = body_of("function f() { throw new LogicException('unimplemented'); }");
        assert!(only_throws_or_exits(&body, &terminals()));

        let body = body_of("function f() { $x = 1; throw new E('x'); }");
        assert!(!only_throws_or_exits(&body, &terminals()));

        let body = body_of("function f() {}");
        assert!(!only_throws_or_exits(&body, &terminals()));
    }
}
