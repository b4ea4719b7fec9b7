//! Expression type inference.
//!
//! A deliberately shallow forward pass: literals, variables, calls resolved
//! through the codebase, property fetches through the property resolver.
//! Anything it cannot see through infers as `mixed` — the verification
//! engine treats `mixed` as "cannot verify", never as a match.

use rustc_hash::FxHashMap;
use stanza_codebase::{Codebase, Referencer, StorageError};
use stanza_parser::{BinaryOp, Expr, UnaryOp};
use stanza_types::{combine_types, Atomic, AtomicKind, Union};

/// Per-function inference state: the variable environment plus the context
/// needed for symbol resolution and reference-edge attribution.
pub struct InferenceScope<'a> {
    pub codebase: &'a Codebase,
    pub file_path: &'a str,
    pub self_class: Option<&'a str>,
    /// Method id or file path, recorded on reference edges.
    pub referencer: String,
    pub vars: FxHashMap<String, Union>,
}

impl<'a> InferenceScope<'a> {
    pub fn new(
        codebase: &'a Codebase,
        file_path: &'a str,
        self_class: Option<&'a str>,
        referencer: String,
    ) -> Self {
        Self {
            codebase,
            file_path,
            self_class,
            referencer,
            vars: FxHashMap::default(),
        }
    }

    pub fn infer_expr(&mut self, expr: &Expr) -> Result<Union, StorageError> {
        let ty = match expr {
            Expr::IntLit(..) => Union::of(AtomicKind::Int),
            Expr::FloatLit(..) => Union::of(AtomicKind::Float),
            Expr::StringLit(..) => Union::of(AtomicKind::String_),
            Expr::BoolLit(true, _) => Union::of(AtomicKind::True),
            Expr::BoolLit(false, _) => Union::of(AtomicKind::False),
            Expr::NullLit(_) => Union::of(AtomicKind::Null),

            Expr::Variable(name, _) => {
                if name == "this" {
                    match self.self_class {
                        Some(class) => Union::new([Atomic::named_object(class)]),
                        None => Union::mixed(),
                    }
                } else {
                    self.vars.get(name).cloned().unwrap_or_else(Union::mixed)
                }
            }

            Expr::Assign { target, value, .. } => {
                let ty = self.infer_expr(value)?;
                match target.as_ref() {
                    Expr::Variable(name, _) if name != "this" => {
                        self.vars.insert(name.clone(), ty.clone());
                    }
                    Expr::PropertyFetch {
                        target: object,
                        name,
                        ..
                    } => {
                        // Resolve in write mode so the reference index sees
                        // the edge even without a read.
                        let object_type = self.infer_expr(object)?;
                        if let Some(class_name) = named_object(&object_type) {
                            if self.codebase.classlikes.has(&class_name) {
                                let property_id = format!("{class_name}::${name}");
                                self.codebase.properties.property_exists(
                                    &self.codebase.classlikes,
                                    &self.codebase.references,
                                    &property_id,
                                    false,
                                    Referencer::Method(&self.referencer),
                                )?;
                            }
                        }
                    }
                    _ => {}
                }
                ty
            }

            Expr::Ternary {
                cond,
                then,
                r#else,
                ..
            } => {
                let cond_type = self.infer_expr(cond)?;
                let then_type = match then {
                    Some(then) => self.infer_expr(then)?,
                    // Short ternary: the condition value itself.
                    None => cond_type,
                };
                let else_type = self.infer_expr(r#else)?;
                combine_types(
                    then_type
                        .parts
                        .into_iter()
                        .chain(else_type.parts.into_iter()),
                )
            }

            Expr::Binary { op, lhs, rhs, .. } => {
                let lhs_type = self.infer_expr(lhs)?;
                let rhs_type = self.infer_expr(rhs)?;
                self.infer_binary(*op, &lhs_type, &rhs_type)
            }

            Expr::Unary { op, expr, .. } => {
                let operand = self.infer_expr(expr)?;
                match op {
                    UnaryOp::Not => Union::of(AtomicKind::Bool),
                    UnaryOp::Neg => {
                        if operand.has(&AtomicKind::Float) {
                            Union::of(AtomicKind::Float)
                        } else {
                            Union::of(AtomicKind::Int)
                        }
                    }
                }
            }

            Expr::FunctionCall { name, args, .. } => {
                for arg in args {
                    self.infer_expr(arg)?;
                }
                self.infer_function_call(name)?
            }

            Expr::MethodCall {
                target, name, args, ..
            } => {
                for arg in args {
                    self.infer_expr(arg)?;
                }
                let target_type = self.infer_expr(target)?;
                self.infer_method_call(&target_type, name)
            }

            Expr::PropertyFetch { target, name, .. } => {
                let target_type = self.infer_expr(target)?;
                self.infer_property_fetch(&target_type, name)?
            }

            Expr::New { class, args, .. } => {
                for arg in args {
                    self.infer_expr(arg)?;
                }
                Union::new([Atomic::named_object(class)])
            }

            Expr::Closure(_) => Union::of(AtomicKind::Closure),

            // What a `yield` expression evaluates to is whatever the caller
            // sends back in.
            Expr::Yield { .. } => Union::mixed(),
        };

        Ok(ty)
    }

    fn infer_binary(&self, op: BinaryOp, lhs: &Union, rhs: &Union) -> Union {
        match op {
            BinaryOp::Concat => Union::string(),
            BinaryOp::And
            | BinaryOp::Or
            | BinaryOp::Eq
            | BinaryOp::Identical
            | BinaryOp::NotEq
            | BinaryOp::NotIdentical
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::LtEq
            | BinaryOp::GtEq => Union::of(AtomicKind::Bool),
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
                if lhs.has(&AtomicKind::Float) || rhs.has(&AtomicKind::Float) {
                    Union::of(AtomicKind::Float)
                } else {
                    Union::of(AtomicKind::Int)
                }
            }
            BinaryOp::Div => combine_types([
                Atomic::new(AtomicKind::Int),
                Atomic::new(AtomicKind::Float),
            ]),
        }
    }

    fn infer_function_call(&self, name: &str) -> Result<Union, StorageError> {
        let functions = &self.codebase.functions;

        if let Some(ty) = functions.return_type_provider.get_return_type(name) {
            return Ok(ty);
        }

        if !functions.function_exists(
            &self.codebase.files,
            &self.codebase.config,
            self.file_path,
            name,
        ) {
            return Ok(Union::mixed());
        }

        let storage =
            functions.get_storage(&self.codebase.files, name, self.file_path, self.file_path)?;
        Ok(storage.return_type.clone().unwrap_or_else(Union::mixed))
    }

    fn infer_method_call(&self, target_type: &Union, method_name: &str) -> Union {
        let Some(class_name) = named_object(target_type) else {
            return Union::mixed();
        };

        match self.codebase.get_method_storage(&class_name, method_name) {
            Ok(storage) => {
                let parent = self
                    .codebase
                    .classlikes
                    .try_get(&class_name)
                    .and_then(|storage| storage.parent_class.clone());
                storage
                    .return_type
                    .clone()
                    .map(|ty| {
                        ty.substitute_class_context(
                            storage.owning_class.as_deref(),
                            Some(&class_name),
                            parent.as_deref(),
                        )
                    })
                    .unwrap_or_else(Union::mixed)
            }
            Err(_) => Union::mixed(),
        }
    }

    fn infer_property_fetch(
        &self,
        target_type: &Union,
        property_name: &str,
    ) -> Result<Union, StorageError> {
        let Some(class_name) = named_object(target_type) else {
            return Ok(Union::mixed());
        };
        if !self.codebase.classlikes.has(&class_name) {
            return Ok(Union::mixed());
        }

        let property_id = format!("{class_name}::${property_name}");
        let exists = self.codebase.properties.property_exists(
            &self.codebase.classlikes,
            &self.codebase.references,
            &property_id,
            true,
            Referencer::Method(&self.referencer),
        )?;

        if !exists {
            return Ok(Union::mixed());
        }

        Ok(self
            .codebase
            .properties
            .get_property_type(&self.codebase.classlikes, &property_id, false)?
            .unwrap_or_else(Union::mixed))
    }

    /// Merge a branch environment back into this scope, combining types for
    /// variables both sides know about.
    pub fn merge_vars(&mut self, branch_vars: FxHashMap<String, Union>) {
        for (name, branch_type) in branch_vars {
            match self.vars.remove(&name) {
                Some(existing) if existing != branch_type => {
                    let combined = combine_types(
                        existing
                            .parts
                            .into_iter()
                            .chain(branch_type.parts.into_iter()),
                    );
                    self.vars.insert(name, combined);
                }
                Some(existing) => {
                    self.vars.insert(name, existing);
                }
                None => {
                    self.vars.insert(name, branch_type);
                }
            }
        }
    }
}

fn named_object(ty: &Union) -> Option<String> {
    if ty.parts.len() != 1 {
        return None;
    }
    match &ty.parts[0].kind {
        AtomicKind::NamedObject(name) => Some(name.clone()),
        _ => None,
    }
}
