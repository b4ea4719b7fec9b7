//! Resolution of property references to their authoritative storage.

use crate::error::StorageError;
use crate::provider::{
    ClassLikeStorageProvider, PropertyExistenceProvider, PropertyTypeProvider, ReferenceIndex,
};
use crate::storage::PropertyStorage;
use stanza_types::Union;

/// Resolver for class properties.
///
/// Hook providers are consulted before static storage; every existence check
/// records a reference edge into the reference index (hits point at the
/// declaring member, misses at the missing member id) for reverse-dependency
/// lookups during incremental invalidation.
pub struct Properties {
    pub existence_provider: PropertyExistenceProvider,
    pub type_provider: PropertyTypeProvider,
}

/// Who is asking, for reference-edge attribution.
#[derive(Clone, Copy, Debug)]
pub enum Referencer<'a> {
    Method(&'a str),
    File(&'a str),
    None,
}

fn split_property_id(property_id: &str) -> Result<(&str, &str), StorageError> {
    let trimmed = property_id.trim_start_matches('\\');
    trimmed
        .split_once("::$")
        .ok_or_else(|| StorageError::MalformedPropertyId {
            id: property_id.to_string(),
        })
}

impl Properties {
    pub fn new() -> Self {
        Self {
            existence_provider: PropertyExistenceProvider::new(),
            type_provider: PropertyTypeProvider::new(),
        }
    }

    /// Whether the given `Class::$name` property exists.
    pub fn property_exists(
        &self,
        classes: &ClassLikeStorageProvider,
        references: &ReferenceIndex,
        property_id: &str,
        read_mode: bool,
        referencer: Referencer<'_>,
    ) -> Result<bool, StorageError> {
        let (fq_class_name, property_name) = split_property_id(property_id)?;

        if self.existence_provider.has(fq_class_name) {
            if let Some(exists) =
                self.existence_provider
                    .does_property_exist(fq_class_name, property_name, read_mode)
            {
                return Ok(exists);
            }
        }

        let class_storage = classes.get(fq_class_name)?;

        if let Some(declaring_class) = class_storage.declaring_property_ids.get(property_name) {
            let member_id = format!("{}::${}", declaring_class.to_lowercase(), property_name);
            match referencer {
                Referencer::Method(id) | Referencer::File(id) => {
                    references.add_member_reference(id, &member_id);
                }
                Referencer::None => {}
            }
            return Ok(true);
        }

        let missing_id = format!("{}::${}", fq_class_name.to_lowercase(), property_name);
        match referencer {
            Referencer::Method(id) | Referencer::File(id) => {
                references.add_missing_member_reference(id, &missing_id);
            }
            Referencer::None => {}
        }

        Ok(false)
    }

    pub fn get_declaring_class_for_property(
        &self,
        classes: &ClassLikeStorageProvider,
        property_id: &str,
        read_mode: bool,
    ) -> Result<Option<String>, StorageError> {
        let (fq_class_name, property_name) = split_property_id(property_id)?;

        if self.existence_provider.has(fq_class_name)
            && self
                .existence_provider
                .does_property_exist(fq_class_name, property_name, read_mode)
                == Some(true)
        {
            return Ok(Some(fq_class_name.to_string()));
        }

        let class_storage = classes.get(fq_class_name)?;
        Ok(class_storage.declaring_property_ids.get(property_name).cloned())
    }

    /// The class this property appears in, which may differ from the
    /// declaring class when the member comes from a trait.
    pub fn get_appearing_class_for_property(
        &self,
        classes: &ClassLikeStorageProvider,
        property_id: &str,
        read_mode: bool,
    ) -> Result<Option<String>, StorageError> {
        let (fq_class_name, property_name) = split_property_id(property_id)?;

        if self.existence_provider.has(fq_class_name)
            && self
                .existence_provider
                .does_property_exist(fq_class_name, property_name, read_mode)
                == Some(true)
        {
            return Ok(Some(fq_class_name.to_string()));
        }

        let class_storage = classes.get(fq_class_name)?;
        Ok(class_storage
            .appearing_property_ids
            .get(property_name)
            .and_then(|appearing_id| appearing_id.split("::$").next())
            .map(str::to_string))
    }

    pub fn get_storage<'a>(
        &self,
        classes: &'a ClassLikeStorageProvider,
        property_id: &str,
    ) -> Result<&'a PropertyStorage, StorageError> {
        let (fq_class_name, property_name) = split_property_id(property_id)?;

        let class_storage = classes.get(fq_class_name)?;

        if let Some(declaring_class) = class_storage.declaring_property_ids.get(property_name) {
            let declaring_storage = classes.get(declaring_class)?;
            if let Some(property) = declaring_storage.properties.get(property_name) {
                return Ok(property);
            }
        }

        Err(StorageError::MissingProperty {
            id: property_id.to_string(),
        })
    }

    /// The effective type of a property access.
    ///
    /// Write accesses prefer `@property-write` pseudo types, reads prefer
    /// `@property-read`; otherwise the declared member type, else the first
    /// typed ancestor in the overridden-property chain.
    pub fn get_property_type(
        &self,
        classes: &ClassLikeStorageProvider,
        property_id: &str,
        property_set: bool,
    ) -> Result<Option<Union>, StorageError> {
        let (fq_class_name, property_name) = split_property_id(property_id)?;

        if self.type_provider.has(fq_class_name) {
            if let Some(property_type) =
                self.type_provider
                    .get_property_type(fq_class_name, property_name, !property_set)
            {
                return Ok(Some(property_type));
            }
        }

        let class_storage = classes.get(fq_class_name)?;

        let Some(declaring_class) = class_storage.declaring_property_ids.get(property_name) else {
            return Err(StorageError::MissingProperty {
                id: property_id.to_string(),
            });
        };
        let declaring_storage = classes.get(declaring_class)?;
        let Some(storage) = declaring_storage.properties.get(property_name) else {
            return Err(StorageError::MissingProperty {
                id: property_id.to_string(),
            });
        };

        if storage.ty.is_some() {
            let pseudo = if property_set {
                class_storage.pseudo_property_set_types.get(property_name)
            } else {
                class_storage.pseudo_property_get_types.get(property_name)
            };
            return Ok(pseudo.or(storage.ty.as_ref()).cloned());
        }

        let Some(overridden) = class_storage.overridden_property_ids.get(property_name) else {
            return Ok(None);
        };

        for overridden_property_id in overridden {
            let overridden_storage = self.get_storage(classes, overridden_property_id)?;
            if overridden_storage.ty.is_some() {
                return Ok(overridden_storage.ty.clone());
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ClassLikeStorage;
    use stanza_types::AtomicKind;

    fn class_with_property(name: &str, property: &str, ty: Option<Union>) -> ClassLikeStorage {
        let mut storage = ClassLikeStorage::new(name);
        storage.properties.insert(
            property.to_string(),
            PropertyStorage {
                ty,
                ..PropertyStorage::default()
            },
        );
        storage
            .declaring_property_ids
            .insert(property.to_string(), name.to_string());
        storage
            .appearing_property_ids
            .insert(property.to_string(), format!("{name}::${property}"));
        storage
    }

    #[test]
    fn existing_property_records_reference_edge() {
        let mut classes = ClassLikeStorageProvider::new();
        classes.insert(class_with_property("Foo", "bar", None));
        let references = ReferenceIndex::new();
        let properties = Properties::new();

        let exists = properties
            .property_exists(
                &classes,
                &references,
                "\\Foo::$bar",
                true,
                Referencer::Method("Caller::m"),
            )
            .unwrap();

        assert!(exists);
        assert!(references.referencers_of("foo::$bar").contains("Caller::m"));
    }

    #[test]
    fn missing_property_records_missing_edge() {
        let mut classes = ClassLikeStorageProvider::new();
        classes.insert(ClassLikeStorage::new("Foo"));
        let references = ReferenceIndex::new();
        let properties = Properties::new();

        let exists = properties
            .property_exists(
                &classes,
                &references,
                "Foo::$nope",
                true,
                Referencer::File("/src/a.php"),
            )
            .unwrap();

        assert!(!exists);
        assert!(
            references
                .referencers_of_missing("foo::$nope")
                .contains("/src/a.php")
        );
    }

    #[test]
    fn property_type_falls_back_to_typed_ancestor() {
        let mut classes = ClassLikeStorageProvider::new();
        classes.insert(class_with_property(
            "Base",
            "x",
            Some(Union::of(AtomicKind::Int)),
        ));

        // Child re-declares $x without a type; the ancestor chain supplies it.
        let mut child = class_with_property("Child", "x", None);
        child.parent_class = Some("Base".to_string());
        child
            .overridden_property_ids
            .insert("x".to_string(), vec!["Base::$x".to_string()]);
        classes.insert(child);

        let properties = Properties::new();
        let ty = properties
            .get_property_type(&classes, "Child::$x", false)
            .unwrap();
        assert_eq!(ty.unwrap().to_string(), "int");
    }

    #[test]
    fn pseudo_types_model_read_write_asymmetry() {
        let mut classes = ClassLikeStorageProvider::new();
        let mut storage =
            class_with_property("Magic", "attr", Some(Union::of(AtomicKind::String_)));
        storage
            .pseudo_property_get_types
            .insert("attr".to_string(), Union::nullable(AtomicKind::String_));
        classes.insert(storage);

        let properties = Properties::new();

        let read = properties
            .get_property_type(&classes, "Magic::$attr", false)
            .unwrap();
        assert_eq!(read.unwrap().to_string(), "?string");

        let write = properties
            .get_property_type(&classes, "Magic::$attr", true)
            .unwrap();
        assert_eq!(write.unwrap().to_string(), "string");
    }

    #[test]
    fn unknown_class_is_internal_error() {
        let classes = ClassLikeStorageProvider::new();
        let properties = Properties::new();
        let result = properties.get_property_type(&classes, "Ghost::$x", false);
        assert!(matches!(result, Err(StorageError::MissingClassLike { .. })));
    }
}
