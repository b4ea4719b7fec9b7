//! The scan pass: ASTs → storages, plus inheritance linking.
//!
//! Scanning is per-file and produces a self-contained [`FileStorage`].
//! Linking runs once after every file is scanned (and before any analysis
//! or worker spawn) and builds the declaring/appearing/overridden member
//! maps by walking parents root-first — ancestor chains are acyclic, so a
//! single parent merge per class sees a fully linked parent.

use crate::storage::{
    ClassLikeStorage, FileStorage, FunctionLikeStorage, ParamStorage, PropertyStorage,
};
use crate::provider::ClassLikeStorageProvider;
use rustc_hash::FxHashSet;
use stanza_common::CodeLocation;
use stanza_parser::{ClassDecl, ClassLikeKind, Declaration, FileAst, FunctionDecl, Visibility};
use std::sync::Arc;

/// Build the file storage for one parsed file.
pub fn scan_file(ast: &FileAst) -> FileStorage {
    let _span = tracing::debug_span!("scan_file", path = %ast.path).entered();
    let mut file_storage = FileStorage::new(&ast.path);

    for declaration in &ast.declarations {
        match declaration {
            Declaration::Function(function) => {
                let storage = function_storage(function, None, &ast.path);
                let id = function.name.to_lowercase();
                file_storage
                    .declaring_function_ids
                    .insert(id.clone(), ast.path.clone());
                file_storage.functions.insert(id, Arc::new(storage));
            }
            Declaration::ClassLike(class) => {
                let storage = class_storage(class, &ast.path);
                file_storage.classlikes.push(storage.name.to_lowercase());
                file_storage.classlike_storages.push(storage);
            }
        }
    }

    file_storage
}

fn function_storage(
    decl: &FunctionDecl,
    owning_class: Option<&str>,
    file_path: &str,
) -> FunctionLikeStorage {
    let cased_name = match owning_class {
        Some(class) => format!("{class}::{}", decl.name),
        None => decl.name.clone(),
    };

    let docblock_return = decl
        .docblock
        .as_ref()
        .and_then(|docblock| docblock.return_type.clone());

    let signature_location = decl
        .return_type_span
        .map(|span| CodeLocation::new(file_path, span));
    let name_location = CodeLocation::new(file_path, decl.name_span);

    let return_type_location = if docblock_return.is_some() {
        Some(name_location.clone())
    } else {
        signature_location.clone()
    };

    FunctionLikeStorage {
        cased_name,
        params: decl
            .params
            .iter()
            .map(|param| ParamStorage {
                name: param.name.clone(),
                ty: param.ty.clone(),
                variadic: param.variadic,
            })
            .collect(),
        return_type: docblock_return.or_else(|| decl.return_type.clone()),
        return_type_location,
        signature_return_type: decl.return_type.clone(),
        signature_return_type_location: signature_location,
        suppressed_issues: decl
            .docblock
            .as_ref()
            .map(|docblock| docblock.suppressed.clone())
            .unwrap_or_default(),
        variadic: decl.variadic,
        is_final: decl.is_final,
        is_abstract: decl.is_abstract,
        is_static: decl.is_static,
        is_private: decl.visibility == Visibility::Private,
        overridden_somewhere: false,
        owning_class: owning_class.map(str::to_string),
        location: Some(name_location),
    }
}

fn class_storage(decl: &ClassDecl, file_path: &str) -> ClassLikeStorage {
    let mut storage = ClassLikeStorage::new(&decl.name);
    storage.parent_class = decl.parent.clone();
    storage.is_final = decl.is_final;
    storage.is_abstract = decl.is_abstract;
    storage.is_interface = decl.kind == ClassLikeKind::Interface;
    storage.is_trait = decl.kind == ClassLikeKind::Trait;
    storage.used_traits = decl.uses.clone();
    storage.location = Some(CodeLocation::new(file_path, decl.span));

    if let Some(docblock) = &decl.docblock {
        storage.template_types = docblock.templates.clone();
        for (name, ty) in &docblock.property_read_types {
            storage
                .pseudo_property_get_types
                .insert(name.clone(), ty.clone());
        }
        for (name, ty) in &docblock.property_write_types {
            storage
                .pseudo_property_set_types
                .insert(name.clone(), ty.clone());
        }
    }

    for property in &decl.properties {
        storage.properties.insert(
            property.name.clone(),
            PropertyStorage {
                ty: property.ty.clone(),
                is_static: property.is_static,
                is_private: property.visibility == Visibility::Private,
                location: Some(CodeLocation::new(file_path, property.span)),
            },
        );
        storage
            .declaring_property_ids
            .insert(property.name.clone(), decl.name.clone());
        let property_id = storage.property_id(&property.name);
        storage
            .appearing_property_ids
            .insert(property.name.clone(), property_id);
    }

    for method in &decl.methods {
        let method_key = method.name.to_lowercase();
        storage.methods.insert(
            method_key.clone(),
            Arc::new(function_storage(method, Some(&decl.name), file_path)),
        );
        storage
            .declaring_method_ids
            .insert(method_key.clone(), decl.name.clone());
        storage
            .appearing_method_ids
            .insert(method_key.clone(), format!("{}::{}", decl.name, method_key));
    }

    storage
}

/// Build inherited member maps for every registered class.
pub fn link_codebase(classes: &mut ClassLikeStorageProvider) {
    let _span = tracing::debug_span!("link_codebase").entered();

    for name in topological_order(classes) {
        link_class(classes, &name);
    }
}

fn topological_order(classes: &ClassLikeStorageProvider) -> Vec<String> {
    let names: Vec<String> = classes.names().map(str::to_string).collect();
    let mut done = FxHashSet::default();
    let mut order = Vec::with_capacity(names.len());

    for name in names {
        let mut chain = Vec::new();
        let mut current = Some(name);
        while let Some(class_name) = current {
            if done.contains(&class_name) || chain.contains(&class_name) {
                break;
            }
            current = classes
                .try_get(&class_name)
                .and_then(|storage| storage.parent_class.as_ref())
                .map(|parent| parent.to_lowercase());
            chain.push(class_name);
        }
        // Parents first.
        for class_name in chain.into_iter().rev() {
            if done.insert(class_name.clone()) {
                order.push(class_name);
            }
        }
    }

    order
}

fn link_class(classes: &mut ClassLikeStorageProvider, name: &str) {
    let Some(storage) = classes.try_get(name) else {
        return;
    };
    let used_traits = storage.used_traits.clone();
    let parent_class = storage.parent_class.clone();

    // Trait members: declared in the trait, appearing on the using class.
    for trait_name in used_traits {
        let Some(trait_storage) = classes.try_get(&trait_name) else {
            continue;
        };
        let trait_properties = trait_storage.declaring_property_ids.clone();
        let trait_methods = trait_storage.declaring_method_ids.clone();
        let class_name = classes.try_get(name).map(|s| s.name.clone()).unwrap_or_default();

        let Some(class) = classes.get_mut(name) else {
            return;
        };
        for (property_name, declaring_class) in trait_properties {
            if !class.declaring_property_ids.contains_key(&property_name) {
                class
                    .appearing_property_ids
                    .insert(property_name.clone(), format!("{class_name}::${property_name}"));
                class
                    .declaring_property_ids
                    .insert(property_name, declaring_class);
            }
        }
        for (method_name, declaring_class) in trait_methods {
            if !class.declaring_method_ids.contains_key(&method_name) {
                class
                    .appearing_method_ids
                    .insert(method_name.clone(), format!("{class_name}::{method_name}"));
                class.declaring_method_ids.insert(method_name, declaring_class);
            }
        }
    }

    let Some(parent_name) = parent_class else {
        return;
    };
    let Some(parent) = classes.try_get(&parent_name) else {
        return;
    };

    let parent_declaring_properties = parent.declaring_property_ids.clone();
    let parent_appearing_properties = parent.appearing_property_ids.clone();
    let parent_overridden_properties = parent.overridden_property_ids.clone();
    let parent_declaring_methods = parent.declaring_method_ids.clone();
    let parent_appearing_methods = parent.appearing_method_ids.clone();

    let mut overridden_method_marks: Vec<(String, String)> = Vec::new();

    {
        let Some(class) = classes.get_mut(name) else {
            return;
        };

        for (property_name, parent_declaring) in &parent_declaring_properties {
            if class.properties.contains_key(property_name) {
                // Re-declared: record the ancestor chain, nearest first.
                let mut chain = vec![format!("{parent_declaring}::${property_name}")];
                if let Some(parent_chain) = parent_overridden_properties.get(property_name) {
                    chain.extend(parent_chain.iter().cloned());
                }
                chain.dedup();
                class
                    .overridden_property_ids
                    .insert(property_name.clone(), chain);
            } else if !class.declaring_property_ids.contains_key(property_name) {
                class
                    .declaring_property_ids
                    .insert(property_name.clone(), parent_declaring.clone());
                if let Some(appearing) = parent_appearing_properties.get(property_name) {
                    class
                        .appearing_property_ids
                        .insert(property_name.clone(), appearing.clone());
                }
            }
        }

        for (method_name, parent_declaring) in &parent_declaring_methods {
            if class.methods.contains_key(method_name) {
                overridden_method_marks.push((parent_declaring.clone(), method_name.clone()));
            } else if !class.declaring_method_ids.contains_key(method_name) {
                class
                    .declaring_method_ids
                    .insert(method_name.clone(), parent_declaring.clone());
                if let Some(appearing) = parent_appearing_methods.get(method_name) {
                    class
                        .appearing_method_ids
                        .insert(method_name.clone(), appearing.clone());
                }
            }
        }
    }

    // A subclass re-declared these; narrowing their declared return types is
    // no longer safe.
    for (declaring_class, method_name) in overridden_method_marks {
        if let Some(ancestor) = classes.get_mut(&declaring_class) {
            if let Some(method) = ancestor.methods.get_mut(&method_name) {
                Arc::make_mut(method).overridden_somewhere = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stanza_parser::parse_file;

    fn provider_from(source: &str) -> ClassLikeStorageProvider {
        let ast = parse_file("/src/a.php", source).unwrap();
        let file_storage = scan_file(&ast);
        let mut classes = ClassLikeStorageProvider::new();
        for storage in file_storage.classlike_storages {
            classes.insert(storage);
        }
        link_codebase(&mut classes);
        classes
    }

    #[test]
    fn docblock_return_wins_over_signature() {
        let ast = parse_file(
            "/src/a.php",
            "/** @return ?int */\nfunction f(): int { return 1; }",
        )
        .unwrap();
        let storage = scan_file(&ast);
        let function = &storage.functions["f"];
        assert_eq!(function.return_type.as_ref().unwrap().to_string(), "?int");
        assert!(function.return_type.as_ref().unwrap().from_docblock);
        assert_eq!(
            function.signature_return_type.as_ref().unwrap().to_string(),
            "int"
        );
    }

    #[test]
    fn trait_member_declares_in_trait_appears_in_class() {
        let classes = provider_from(
            r#"
            trait Haystack { /** @var int */ public $needle; }
            class Finder { use Haystack; }
            "#,
        );

        let finder = classes.get("Finder").unwrap();
        assert_eq!(finder.declaring_property_ids["needle"], "Haystack");
        assert_eq!(finder.appearing_property_ids["needle"], "Finder::$needle");
    }

    #[test]
    fn inherited_member_keeps_ancestor_appearing_class() {
        let classes = provider_from(
            r#"
            class Base { /** @var string */ public $label; }
            class Leaf extends Base {}
            "#,
        );

        let leaf = classes.get("Leaf").unwrap();
        assert_eq!(leaf.declaring_property_ids["label"], "Base");
        assert_eq!(leaf.appearing_property_ids["label"], "Base::$label");
    }

    #[test]
    fn redeclared_property_builds_ordered_override_chain() {
        let classes = provider_from(
            r#"
            class A { /** @var int */ public $x; }
            class B extends A { public $x; }
            class C extends B { public $x; }
            "#,
        );

        let c = classes.get("C").unwrap();
        assert_eq!(
            c.overridden_property_ids["x"],
            vec!["B::$x".to_string(), "A::$x".to_string()]
        );
    }

    #[test]
    fn overriding_method_marks_ancestor() {
        let classes = provider_from(
            r#"
            class Base { public function run(): int { return 1; } }
            class Leaf extends Base { public function run(): int { return 2; } }
            "#,
        );

        let base = classes.get("Base").unwrap();
        assert!(base.methods["run"].overridden_somewhere);
        let leaf = classes.get("Leaf").unwrap();
        assert!(!leaf.methods["run"].overridden_somewhere);
    }

    #[test]
    fn hierarchy_resolver_walks_parent_chain() {
        use stanza_types::HierarchyResolver;
        let classes = provider_from(
            r#"
            class A {}
            class B extends A {}
            class C extends B {}
            "#,
        );
        assert!(classes.is_descendant_of("C", "A"));
        assert!(!classes.is_descendant_of("A", "C"));
    }
}
