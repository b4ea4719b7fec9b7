//! Return-type verification.
//!
//! [`ReturnTypeVerifier::verify_return_type`] reconciles a function's
//! declared return type against what its body's reachable `return`/`yield`
//! statements produce. [`ReturnTypeVerifier::check_return_type`] separately
//! validates a docblock declared type against the native signature type.
//!
//! Every violation funnels through the issue gate; auto-fix branches queue
//! a signature edit and return early instead of reporting.

use crate::body::{collect_return_types, CollectedReturns};
use crate::control_flow::{final_control_actions, only_throws_or_exits, terminal_set};
use crate::expression::InferenceScope;
use crate::manipulation::{can_express_natively, render_native, ManipulationBuffer, SignatureEdit};
use stanza_codebase::{Codebase, FunctionLikeStorage, StorageError};
use stanza_common::{CodeLocation, Config, Issue, IssueBuffer, IssueKind, Span};
use stanza_parser::{ClosureExpr, FunctionDecl, Stmt};
use stanza_types::{combine_types, union_contained_by, Atomic, AtomicKind, Union};

/// What the caller should do after a verification pass: carry on, or abort
/// this function's analysis because an accepted issue was fatal. Silent
/// skips surface as `Continue`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Stop,
}

/// The function-like being verified.
#[derive(Copy, Clone)]
pub enum FunctionLikeNode<'a> {
    Function(&'a FunctionDecl),
    Method {
        decl: &'a FunctionDecl,
        class: &'a str,
    },
    Closure(&'a ClosureExpr),
}

impl<'a> FunctionLikeNode<'a> {
    pub fn body(&self) -> Option<&'a [Stmt]> {
        match self {
            FunctionLikeNode::Function(decl) | FunctionLikeNode::Method { decl, .. } => {
                decl.body.as_deref()
            }
            FunctionLikeNode::Closure(closure) => Some(&closure.body),
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        match self {
            FunctionLikeNode::Function(decl) | FunctionLikeNode::Method { decl, .. } => {
                Some(&decl.name)
            }
            FunctionLikeNode::Closure(_) => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            FunctionLikeNode::Function(decl) | FunctionLikeNode::Method { decl, .. } => decl.span,
            FunctionLikeNode::Closure(closure) => closure.span,
        }
    }

    pub fn name_span(&self) -> Span {
        match self {
            FunctionLikeNode::Function(decl) | FunctionLikeNode::Method { decl, .. } => {
                decl.name_span
            }
            FunctionLikeNode::Closure(closure) => closure.span,
        }
    }

    fn is_closure(&self) -> bool {
        matches!(self, FunctionLikeNode::Closure(_))
    }

    fn is_method(&self) -> bool {
        matches!(self, FunctionLikeNode::Method { .. })
    }

    fn is_private(&self) -> bool {
        match self {
            FunctionLikeNode::Method { decl, .. } => {
                decl.visibility == stanza_parser::Visibility::Private
            }
            _ => false,
        }
    }

    fn is_abstract(&self) -> bool {
        match self {
            FunctionLikeNode::Function(decl) | FunctionLikeNode::Method { decl, .. } => {
                decl.is_abstract
            }
            FunctionLikeNode::Closure(_) => false,
        }
    }
}

pub struct ReturnTypeVerifier<'a, 'b> {
    pub codebase: &'a Codebase,
    pub config: &'a Config,
    /// Auto-fix mode: issues in `config.issues_to_fix` queue edits instead
    /// of reporting.
    pub alter_code: bool,
    pub issues: &'b mut IssueBuffer,
    pub manipulations: &'b mut ManipulationBuffer,
}

impl<'a, 'b> ReturnTypeVerifier<'a, 'b> {
    /// Infer the function's effective return type from its body and verify
    /// it against the declared type.
    pub fn verify_return_type(
        &mut self,
        node: FunctionLikeNode<'_>,
        storage: Option<&FunctionLikeStorage>,
        file_path: &str,
        fq_class_name: Option<&str>,
    ) -> Result<Verdict, StorageError> {
        let body = node.body();

        // Abstract and interface methods have nothing to verify.
        if body.is_none() && node.is_method() && node.is_abstract() {
            return Ok(Verdict::Continue);
        }
        let Some(body) = body else {
            return Ok(Verdict::Continue);
        };

        let declared_return_type: Option<Union> = match &node {
            FunctionLikeNode::Closure(closure) => closure.return_type.clone(),
            _ => storage.and_then(|s| s.return_type.clone()),
        };

        let is_to_string = node.is_method()
            && node
                .name()
                .is_some_and(|name| name.eq_ignore_ascii_case("__tostring"));

        // Do not check __construct, __set, __get, __call etc.
        if node.is_method()
            && node.name().is_some_and(|name| name.starts_with("__"))
            && !is_to_string
            && declared_return_type.is_none()
        {
            return Ok(Verdict::Continue);
        }

        let cased_id = match storage {
            Some(storage) => storage.cased_name.clone(),
            None => "{closure}".to_string(),
        };

        let suppressed: Vec<String> = storage
            .map(|s| s.suppressed_issues.clone())
            .unwrap_or_default();

        let return_type_location = storage
            .and_then(|s| s.return_type_location.clone())
            .or_else(|| match &node {
                FunctionLikeNode::Closure(closure) => closure
                    .return_type_span
                    .map(|span| CodeLocation::new(file_path, span)),
                _ => None,
            })
            .unwrap_or_else(|| CodeLocation::new(file_path, node.name_span()));

        let mut scope = InferenceScope::new(self.codebase, file_path, fq_class_name, cased_id.clone());
        if let Some(storage) = storage {
            for param in &storage.params {
                scope.vars.insert(
                    param.name.clone(),
                    param.ty.clone().unwrap_or_else(Union::mixed),
                );
            }
        } else if let FunctionLikeNode::Closure(closure) = &node {
            for param in &closure.params {
                scope.vars.insert(
                    param.name.clone(),
                    param.ty.clone().unwrap_or_else(Union::mixed),
                );
            }
        }

        let CollectedReturns {
            mut return_parts,
            yield_parts,
            ignore_nullable_issues,
            ignore_falsable_issues,
        } = collect_return_types(body, &mut scope)?;

        let terminal_functions = &self.config.terminal_functions;

        // Control can fall off the end: model the implicit null return,
        // soft so auto-fixes know it was inferred.
        if declared_return_type
            .as_ref()
            .is_none_or(|ty| ty.from_docblock)
            && final_control_actions(body, terminal_functions, true) != terminal_set()
            && yield_parts.is_empty()
            && !return_parts.is_empty()
            && return_parts.iter().any(|part| part.kind != AtomicKind::Void)
        {
            return_parts.push(Atomic::docblock(AtomicKind::Null));
        }

        if let Some(declared) = &declared_return_type {
            if !declared.from_docblock
                && !declared.is_void()
                && yield_parts.is_empty()
                && final_control_actions(body, terminal_functions, true) != terminal_set()
            {
                if self.accepts(
                    IssueKind::InvalidReturnType,
                    format!(
                        "Not all code paths of {cased_id} end in a return statement, \
                         return type {declared} expected"
                    ),
                    return_type_location.clone(),
                    &suppressed,
                ) {
                    return Ok(Verdict::Stop);
                }
                return Ok(Verdict::Continue);
            }

            if declared.is_never()
                && yield_parts.is_empty()
                && final_control_actions(body, terminal_functions, false) != terminal_set()
            {
                if self.accepts(
                    IssueKind::InvalidReturnType,
                    format!(
                        "{cased_id} is not expected to return any values but it does, \
                         either implicitly or explicitly"
                    ),
                    return_type_location.clone(),
                    &suppressed,
                ) {
                    return Ok(Verdict::Stop);
                }
                return Ok(Verdict::Continue);
            }
        }

        let had_return_parts = !return_parts.is_empty();
        let mut inferred_return_type = if had_return_parts {
            combine_types(return_parts.iter().cloned())
        } else {
            Union::void()
        };
        inferred_return_type.ignore_nullable_issues = ignore_nullable_issues;
        inferred_return_type.ignore_falsable_issues = ignore_falsable_issues;

        if !yield_parts.is_empty() {
            // Generator semantics: the yielded values are the authoritative
            // inferred signal.
            inferred_return_type = combine_types(yield_parts.iter().cloned());
        }

        if declared_return_type.is_none()
            && !self.config.add_void_docblocks
            && inferred_return_type.is_void()
        {
            return Ok(Verdict::Continue);
        }

        // A nullable inferred type that includes void cannot be written as a
        // native typehint.
        let mut unsafe_return_type = false;
        if self.alter_code && inferred_return_type.is_nullable() && yield_parts.is_empty() {
            if return_parts.iter().any(|part| part.kind == AtomicKind::Void) {
                unsafe_return_type = true;
            }
        }

        let parent_class = fq_class_name
            .and_then(|class| self.codebase.classlikes.try_get(class))
            .and_then(|storage| storage.parent_class.clone());

        let inferred_return_type = inferred_return_type.substitute_class_context(
            fq_class_name,
            fq_class_name,
            parent_class.as_deref(),
        );

        if is_to_string {
            let comparison = union_contained_by(
                &inferred_return_type,
                &Union::string(),
                inferred_return_type.ignore_nullable_issues,
                inferred_return_type.ignore_falsable_issues,
                &self.codebase.classlikes,
            );
            if !inferred_return_type.has_mixed() && !comparison.contained {
                if self.accepts(
                    IssueKind::InvalidToString,
                    format!("__toString methods must return a string, {inferred_return_type} returned"),
                    return_type_location,
                    &suppressed,
                ) {
                    return Ok(Verdict::Stop);
                }
            }
            return Ok(Verdict::Continue);
        }

        let Some(declared_return_type) = declared_return_type else {
            return self.handle_missing_declared_type(
                node,
                file_path,
                &cased_id,
                &inferred_return_type,
                unsafe_return_type,
                &suppressed,
            );
        };

        let declared_return_type = declared_return_type.substitute_class_context(
            fq_class_name,
            fq_class_name,
            parent_class.as_deref(),
        );

        if !had_return_parts && yield_parts.is_empty() {
            if declared_return_type.is_void() || declared_return_type.is_never() {
                return Ok(Verdict::Continue);
            }

            // A body that only throws or exits is presumably an exception
            // saying this method is not to be used.
            if only_throws_or_exits(body, terminal_functions) {
                return Ok(Verdict::Continue);
            }

            if self.fixing(IssueKind::InvalidReturnType, &suppressed) {
                self.add_or_update_return_type(
                    node,
                    file_path,
                    &cased_id,
                    &Union::void(),
                    false,
                );
                return Ok(Verdict::Continue);
            }

            // A docblock-sourced nullable declared type is already
            // permissive enough to stay silent.
            if !declared_return_type.from_docblock || !declared_return_type.is_nullable() {
                if self.accepts(
                    IssueKind::InvalidReturnType,
                    format!(
                        "No return statements were found for method {cased_id} \
                         but return type '{declared_return_type}' was expected"
                    ),
                    return_type_location,
                    &suppressed,
                ) {
                    return Ok(Verdict::Stop);
                }
            }
            return Ok(Verdict::Continue);
        }

        if declared_return_type.has_mixed() {
            return Ok(Verdict::Continue);
        }

        if inferred_return_type.is_void() && declared_return_type.is_void() {
            return Ok(Verdict::Continue);
        }

        if inferred_return_type.has_mixed() || inferred_return_type.is_empty() {
            if self.accepts(
                IssueKind::MixedInferredReturnType,
                format!("Could not verify return type '{declared_return_type}' for {cased_id}"),
                return_type_location,
                &suppressed,
            ) {
                return Ok(Verdict::Stop);
            }
            return Ok(Verdict::Continue);
        }

        let comparison = union_contained_by(
            &inferred_return_type,
            &declared_return_type,
            true,
            true,
            &self.codebase.classlikes,
        );

        if !comparison.contained {
            if comparison.type_coerced {
                // The declared return type is more specific than the
                // inferred one.
                let kind = if comparison.type_coerced_from_mixed {
                    IssueKind::MixedReturnTypeCoercion
                } else {
                    IssueKind::MoreSpecificReturnType
                };
                if self.accepts(
                    kind,
                    format!(
                        "The declared return type '{}' for {cased_id} is more specific than \
                         the inferred return type '{}'",
                        declared_return_type.id(),
                        inferred_return_type.id()
                    ),
                    return_type_location,
                    &suppressed,
                ) {
                    return Ok(Verdict::Stop);
                }
                return Ok(Verdict::Continue);
            }

            if self.fixing(IssueKind::InvalidReturnType, &suppressed) {
                self.add_or_update_return_type(
                    node,
                    file_path,
                    &cased_id,
                    &inferred_return_type,
                    (self.config.only_replace_php_types_with_non_docblock_types
                        || unsafe_return_type)
                        && inferred_return_type.from_docblock,
                );
                return Ok(Verdict::Continue);
            }

            if self.accepts(
                IssueKind::InvalidReturnType,
                format!(
                    "The declared return type '{declared_return_type}' for {cased_id} \
                     is incorrect, got '{inferred_return_type}'"
                ),
                return_type_location,
                &suppressed,
            ) {
                return Ok(Verdict::Stop);
            }
            return Ok(Verdict::Continue);
        }

        if self.fixing(IssueKind::LessSpecificReturnType, &suppressed) {
            let reverse = union_contained_by(
                &declared_return_type,
                &inferred_return_type,
                false,
                false,
                &self.codebase.classlikes,
            );
            if !reverse.contained {
                self.add_or_update_return_type(
                    node,
                    file_path,
                    &cased_id,
                    &inferred_return_type,
                    (self.config.only_replace_php_types_with_non_docblock_types
                        || unsafe_return_type)
                        && inferred_return_type.from_docblock,
                );
                return Ok(Verdict::Continue);
            }
        } else if (!inferred_return_type.is_nullable() && declared_return_type.is_nullable())
            || (!inferred_return_type.is_falsable() && declared_return_type.is_falsable())
        {
            // Narrowing a non-final public contract is unsafe: a subclass
            // may rely on the wider declared type.
            let check_for_less_specific_type = if !node.is_method() || node.is_private() {
                true
            } else {
                storage.is_some_and(|s| !s.overridden_somewhere)
            };

            if check_for_less_specific_type {
                if self.accepts(
                    IssueKind::LessSpecificReturnType,
                    format!(
                        "The inferred return type '{inferred_return_type}' for {cased_id} \
                         is more specific than the declared return type '{declared_return_type}'"
                    ),
                    return_type_location.clone(),
                    &suppressed,
                ) {
                    return Ok(Verdict::Stop);
                }
            }
        }

        if !ignore_nullable_issues
            && inferred_return_type.is_nullable()
            && !declared_return_type.is_nullable()
            && !declared_return_type.is_void()
        {
            if self.fixing(IssueKind::InvalidNullableReturnType, &suppressed)
                && !inferred_return_type.is_null()
            {
                self.add_or_update_return_type(
                    node,
                    file_path,
                    &cased_id,
                    &inferred_return_type,
                    (self.config.only_replace_php_types_with_non_docblock_types
                        || unsafe_return_type)
                        && inferred_return_type.from_docblock,
                );
                return Ok(Verdict::Continue);
            }

            if self.accepts(
                IssueKind::InvalidNullableReturnType,
                format!(
                    "The declared return type '{declared_return_type}' for {cased_id} \
                     is not nullable, but '{inferred_return_type}' contains null"
                ),
                return_type_location.clone(),
                &suppressed,
            ) {
                return Ok(Verdict::Stop);
            }
        }

        if !ignore_falsable_issues
            && inferred_return_type.is_falsable()
            && !declared_return_type.is_falsable()
            && !declared_return_type.has_bool()
            && !declared_return_type.has_scalar()
        {
            if self.fixing(IssueKind::InvalidFalsableReturnType, &suppressed) {
                self.add_or_update_return_type(
                    node,
                    file_path,
                    &cased_id,
                    &inferred_return_type,
                    (self.config.only_replace_php_types_with_non_docblock_types
                        || unsafe_return_type)
                        && inferred_return_type.from_docblock,
                );
                return Ok(Verdict::Continue);
            }

            if self.accepts(
                IssueKind::InvalidFalsableReturnType,
                format!(
                    "The declared return type '{declared_return_type}' for {cased_id} \
                     does not allow false, but '{inferred_return_type}' contains false"
                ),
                return_type_location,
                &suppressed,
            ) {
                return Ok(Verdict::Stop);
            }
        }

        Ok(Verdict::Continue)
    }

    /// Validate the docblock declared return type against the native
    /// signature type, when the two differ.
    pub fn check_return_type(
        &mut self,
        node: FunctionLikeNode<'_>,
        storage: &FunctionLikeStorage,
        context_self: Option<&str>,
    ) -> Result<Verdict, StorageError> {
        let (Some(return_type), Some(return_type_location)) =
            (&storage.return_type, &storage.return_type_location)
        else {
            return Ok(Verdict::Continue);
        };

        let class_storage = context_self.and_then(|class| self.codebase.classlikes.try_get(class));
        let parent_class = class_storage.and_then(|storage| storage.parent_class.clone());

        let Some(signature_return_type) = &storage.signature_return_type else {
            return Ok(Verdict::Continue);
        };
        if signature_return_type == return_type {
            return Ok(Verdict::Continue);
        }

        let fleshed_out_signature_type = signature_return_type.substitute_class_context(
            context_self,
            context_self,
            parent_class.as_deref(),
        );

        if node.is_closure() {
            return Ok(Verdict::Continue);
        }

        let mut fleshed_out_return_type = return_type.substitute_class_context(
            context_self,
            context_self,
            parent_class.as_deref(),
        );

        // Class template parameters have no binding here; compare against
        // mixed standins.
        if let Some(class_storage) = class_storage {
            if !class_storage.template_types.is_empty() {
                for part in &mut fleshed_out_return_type.parts {
                    if let AtomicKind::NamedObject(name) = &part.kind {
                        if class_storage.template_types.iter().any(|t| t == name) {
                            part.kind = AtomicKind::Mixed;
                        }
                    }
                }
            }
        }

        let comparison = union_contained_by(
            &fleshed_out_return_type,
            &fleshed_out_signature_type,
            false,
            false,
            &self.codebase.classlikes,
        );

        if !comparison.contained {
            if self.fixing(IssueKind::MismatchingDocblockReturnType, &storage.suppressed_issues) {
                self.add_or_update_return_type(
                    node,
                    &return_type_location.file_path,
                    &storage.cased_name,
                    signature_return_type,
                    true,
                );
                return Ok(Verdict::Continue);
            }

            if self.accepts(
                IssueKind::MismatchingDocblockReturnType,
                format!(
                    "Docblock has incorrect return type '{}', should be '{}'",
                    return_type.id(),
                    signature_return_type.id()
                ),
                return_type_location.clone(),
                &storage.suppressed_issues,
            ) {
                return Ok(Verdict::Stop);
            }
        }

        Ok(Verdict::Continue)
    }

    fn handle_missing_declared_type(
        &mut self,
        node: FunctionLikeNode<'_>,
        file_path: &str,
        cased_id: &str,
        inferred_return_type: &Union,
        unsafe_return_type: bool,
        suppressed: &[String],
    ) -> Result<Verdict, StorageError> {
        if node.is_closure() {
            if self.fixing(IssueKind::MissingClosureReturnType, suppressed) {
                if inferred_return_type.has_mixed() || inferred_return_type.is_null() {
                    return Ok(Verdict::Continue);
                }
                self.add_or_update_return_type(
                    node,
                    file_path,
                    cased_id,
                    inferred_return_type,
                    (self.config.only_replace_php_types_with_non_docblock_types
                        || unsafe_return_type)
                        && inferred_return_type.from_docblock,
                );
                return Ok(Verdict::Continue);
            }

            self.accepts(
                IssueKind::MissingClosureReturnType,
                format!("Closure does not have a return type, expecting {inferred_return_type}"),
                CodeLocation::new(file_path, node.span()),
                suppressed,
            );
            return Ok(Verdict::Continue);
        }

        if self.fixing(IssueKind::MissingReturnType, suppressed) {
            if inferred_return_type.has_mixed() || inferred_return_type.is_null() {
                return Ok(Verdict::Continue);
            }
            let docblock_only = (self.config.only_replace_php_types_with_non_docblock_types
                || unsafe_return_type)
                && inferred_return_type.from_docblock;
            self.add_or_update_return_type(
                node,
                file_path,
                cased_id,
                inferred_return_type,
                docblock_only,
            );
            return Ok(Verdict::Continue);
        }

        let expecting = if inferred_return_type.has_mixed() {
            String::new()
        } else {
            format!(", expecting {inferred_return_type}")
        };
        self.accepts(
            IssueKind::MissingReturnType,
            format!("Method {cased_id} does not have a return type{expecting}"),
            CodeLocation::new(file_path, node.name_span()),
            suppressed,
        );
        Ok(Verdict::Continue)
    }

    fn accepts(
        &mut self,
        kind: IssueKind,
        message: String,
        location: CodeLocation,
        suppressed: &[String],
    ) -> bool {
        self.issues
            .accepts(Issue::new(kind, message, location), self.config, suppressed)
    }

    fn fixing(&self, kind: IssueKind, suppressed: &[String]) -> bool {
        self.alter_code
            && self.config.fixing(kind.as_str())
            && !suppressed.iter().any(|name| name == kind.as_str())
    }

    fn add_or_update_return_type(
        &mut self,
        node: FunctionLikeNode<'_>,
        file_path: &str,
        cased_id: &str,
        inferred_return_type: &Union,
        docblock_only: bool,
    ) {
        let is_final = match &node {
            FunctionLikeNode::Method { decl, class } => {
                decl.is_final
                    || self
                        .codebase
                        .classlikes
                        .try_get(class)
                        .is_some_and(|storage| storage.is_final)
            }
            _ => true,
        };

        let allow_native_type = !docblock_only
            && (self.config.allow_backwards_incompatible_changes
                || is_final
                || !node.is_method());

        let native_type = (allow_native_type && can_express_natively(inferred_return_type))
            .then(|| render_native(inferred_return_type));

        self.manipulations.set_return_type(SignatureEdit {
            file_path: file_path.to_string(),
            function_span: node.span(),
            cased_id: cased_id.to_string(),
            native_type,
            docblock_type: inferred_return_type.to_string(),
        });
    }
}
