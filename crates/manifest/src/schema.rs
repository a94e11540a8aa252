//! Merging of independently maintained GraphQL schema documents.
//!
//! Each market family keeps its own `<family>.graphql` document and shared
//! fragments are copied between them. The merged document keeps every named
//! definition exactly once, in first-seen order, and refuses to merge two
//! definitions of the same name that differ in shape.

use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
};

use graphql_parser::schema::{
    self as s, Definition, Document, ObjectType, TypeDefinition, TypeExtension,
};

use crate::{SchemaConflictError, SchemaError};

/// Marker heading every generated schema artifact.
pub const AUTOGEN_NOTICE: &str =
    "# @generated THIS FILE IS AUTOMATICALLY GENERATED BY THE DEPLOY SCRIPT. DO NOT EDIT.\n\n";

/// Directive marking object types stored by the indexer.
const ENTITY_DIRECTIVE: &str = "entity";

type Def = Definition<'static, String>;
type Field = s::Field<'static, String>;

/// A schema document to merge, along with a name used in diagnostics.
#[derive(Debug, Clone)]
pub struct SchemaSource {
    pub name: String,
    pub text: String,
}

impl SchemaSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Read a schema document from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// The merged schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaDocument {
    definitions: Vec<Def>,
}

impl SchemaDocument {
    /// Merge `sources` in order.
    pub fn merge(sources: impl IntoIterator<Item = SchemaSource>) -> Result<Self, SchemaError> {
        let mut merger = Merger::default();

        for source in sources {
            let document = graphql_parser::parse_schema::<String>(&source.text)
                .map_err(|err| SchemaError::Parse {
                    source_name: source.name.clone(),
                    message: err.to_string(),
                })?
                .into_static();

            tracing::debug!(
                source = source.name,
                definitions = document.definitions.len(),
                "Merging schema document"
            );

            for definition in document.definitions {
                merger.add(definition)?;
            }
        }

        merger.finish()
    }

    /// Read and merge the documents at `paths`.
    pub fn merge_files<P: AsRef<Path>>(
        paths: impl IntoIterator<Item = P>,
    ) -> Result<Self, SchemaError> {
        let sources = paths
            .into_iter()
            .map(SchemaSource::read)
            .collect::<Result<Vec<_>, _>>()?;
        Self::merge(sources)
    }

    /// Names of all definitions, in output order.
    pub fn names(&self) -> Vec<String> {
        self.definitions.iter().map(definition_key).collect()
    }

    /// Names of the object types annotated with `@entity`.
    pub fn entity_names(&self) -> BTreeSet<String> {
        self.definitions
            .iter()
            .filter_map(|definition| match definition {
                Definition::TypeDefinition(TypeDefinition::Object(object))
                    if object
                        .directives
                        .iter()
                        .any(|directive| directive.name == ENTITY_DIRECTIVE) =>
                {
                    Some(object.name.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// The artifact text: the generated marker followed by the printed document.
    pub fn print(&self) -> String {
        let document = Document {
            definitions: self.definitions.clone(),
        };
        format!("{AUTOGEN_NOTICE}{document}")
    }

    /// Write the artifact to `path`, returning its SHA-256 digest.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<String, SchemaError> {
        let path = path.as_ref();
        crate::artifact::write_artifact(path, &self.print()).map_err(|source| SchemaError::Write {
            path: PathBuf::from(path),
            source,
        })
    }
}

#[derive(Default)]
struct Merger {
    definitions: Vec<Def>,
    index: HashMap<String, usize>,
    extensions: Vec<TypeExtension<'static, String>>,
}

impl Merger {
    fn add(&mut self, definition: Def) -> Result<(), SchemaConflictError> {
        if let Definition::TypeExtension(extension) = definition {
            self.extensions.push(extension);
            return Ok(());
        }

        let key = definition_key(&definition);
        match self.index.get(&key) {
            Some(&position) => same_or_conflict(&key, &self.definitions[position], &definition),
            None => {
                self.index.insert(key, self.definitions.len());
                self.definitions.push(definition);
                Ok(())
            }
        }
    }

    /// Fold extensions into their base types, then emit.
    ///
    /// Extensions of a type missing from the merged set are folded into one
    /// another and emitted once, as a single extension, after the definitions.
    fn finish(mut self) -> Result<SchemaDocument, SchemaError> {
        let mut orphans: Vec<TypeDefinition<'static, String>> = Vec::new();
        let mut orphan_index: HashMap<String, usize> = HashMap::new();

        for extension in std::mem::take(&mut self.extensions) {
            let name = extension_name(&extension).to_string();

            if let Some(&position) = self.index.get(&name) {
                match &mut self.definitions[position] {
                    Definition::TypeDefinition(base) => extend_type(base, extension)?,
                    other => {
                        return Err(SchemaConflictError {
                            name,
                            first: print_definition(other),
                            second: extension.to_string(),
                        }
                        .into());
                    }
                }
                continue;
            }

            match orphan_index.get(&name) {
                Some(&position) => extend_type(&mut orphans[position], extension)?,
                None => {
                    tracing::debug!(name = %name, "Schema extension has no base type");
                    orphan_index.insert(name, orphans.len());
                    orphans.push(into_definition(extension));
                }
            }
        }

        self.definitions.extend(
            orphans
                .into_iter()
                .map(|orphan| Definition::TypeExtension(into_extension(orphan))),
        );

        Ok(SchemaDocument {
            definitions: self.definitions,
        })
    }
}

/// A named part of a type: a field, an enum value or a directive.
trait Member {
    /// Separates the owning type from the member in conflict names.
    const SEPARATOR: &'static str;

    fn member_name(&self) -> &str;

    fn printed(&self) -> String;
}

impl Member for Field {
    const SEPARATOR: &'static str = ".";

    fn member_name(&self) -> &str {
        &self.name
    }

    fn printed(&self) -> String {
        self.to_string()
    }
}

impl Member for s::InputValue<'static, String> {
    const SEPARATOR: &'static str = ".";

    fn member_name(&self) -> &str {
        &self.name
    }

    fn printed(&self) -> String {
        self.to_string()
    }
}

impl Member for s::EnumValue<'static, String> {
    const SEPARATOR: &'static str = ".";

    fn member_name(&self) -> &str {
        &self.name
    }

    fn printed(&self) -> String {
        let mut holder = s::EnumType::new(String::new());
        holder.values.push(self.clone());
        TypeDefinition::Enum(holder).to_string()
    }
}

impl Member for s::Directive<'static, String> {
    const SEPARATOR: &'static str = "@";

    fn member_name(&self) -> &str {
        &self.name
    }

    fn printed(&self) -> String {
        self.to_string()
    }
}

/// Add `incoming` members to `existing`. A member already present must print
/// identically, arguments and types included.
fn fold_members<M: Member>(
    owner: &str,
    existing: &mut Vec<M>,
    incoming: Vec<M>,
) -> Result<(), SchemaConflictError> {
    for member in incoming {
        match existing
            .iter()
            .find(|current| current.member_name() == member.member_name())
        {
            Some(current) => {
                let (first, second) = (current.printed(), member.printed());
                if first != second {
                    return Err(SchemaConflictError {
                        name: format!("{owner}{}{}", M::SEPARATOR, member.member_name()),
                        first,
                        second,
                    });
                }
            }
            None => existing.push(member),
        }
    }
    Ok(())
}

fn fold_names(existing: &mut Vec<String>, incoming: Vec<String>) {
    for name in incoming {
        if !existing.contains(&name) {
            existing.push(name);
        }
    }
}

/// Fold `extension` into `base`. Extending a type of another kind conflicts.
fn extend_type(
    base: &mut TypeDefinition<'static, String>,
    extension: TypeExtension<'static, String>,
) -> Result<(), SchemaConflictError> {
    match (base, extension) {
        (TypeDefinition::Scalar(t), TypeExtension::Scalar(e)) => {
            fold_members(&t.name, &mut t.directives, e.directives)
        }
        (TypeDefinition::Object(t), TypeExtension::Object(e)) => {
            fold_members(&t.name, &mut t.fields, e.fields)?;
            fold_names(&mut t.implements_interfaces, e.implements_interfaces);
            fold_members(&t.name, &mut t.directives, e.directives)
        }
        (TypeDefinition::Interface(t), TypeExtension::Interface(e)) => {
            fold_members(&t.name, &mut t.fields, e.fields)?;
            fold_names(&mut t.implements_interfaces, e.implements_interfaces);
            fold_members(&t.name, &mut t.directives, e.directives)
        }
        (TypeDefinition::Union(t), TypeExtension::Union(e)) => {
            fold_names(&mut t.types, e.types);
            fold_members(&t.name, &mut t.directives, e.directives)
        }
        (TypeDefinition::Enum(t), TypeExtension::Enum(e)) => {
            fold_members(&t.name, &mut t.values, e.values)?;
            fold_members(&t.name, &mut t.directives, e.directives)
        }
        (TypeDefinition::InputObject(t), TypeExtension::InputObject(e)) => {
            fold_members(&t.name, &mut t.fields, e.fields)?;
            fold_members(&t.name, &mut t.directives, e.directives)
        }
        (base, extension) => Err(SchemaConflictError {
            name: extension_name(&extension).to_string(),
            first: base.to_string(),
            second: extension.to_string(),
        }),
    }
}

fn into_definition(extension: TypeExtension<'static, String>) -> TypeDefinition<'static, String> {
    match extension {
        TypeExtension::Scalar(e) => TypeDefinition::Scalar(s::ScalarType {
            position: e.position,
            description: None,
            name: e.name,
            directives: e.directives,
        }),
        TypeExtension::Object(e) => TypeDefinition::Object(ObjectType {
            position: e.position,
            description: None,
            name: e.name,
            implements_interfaces: e.implements_interfaces,
            directives: e.directives,
            fields: e.fields,
        }),
        TypeExtension::Interface(e) => TypeDefinition::Interface(s::InterfaceType {
            position: e.position,
            description: None,
            name: e.name,
            implements_interfaces: e.implements_interfaces,
            directives: e.directives,
            fields: e.fields,
        }),
        TypeExtension::Union(e) => TypeDefinition::Union(s::UnionType {
            position: e.position,
            description: None,
            name: e.name,
            directives: e.directives,
            types: e.types,
        }),
        TypeExtension::Enum(e) => TypeDefinition::Enum(s::EnumType {
            position: e.position,
            description: None,
            name: e.name,
            directives: e.directives,
            values: e.values,
        }),
        TypeExtension::InputObject(e) => TypeDefinition::InputObject(s::InputObjectType {
            position: e.position,
            description: None,
            name: e.name,
            directives: e.directives,
            fields: e.fields,
        }),
    }
}

fn into_extension(definition: TypeDefinition<'static, String>) -> TypeExtension<'static, String> {
    match definition {
        TypeDefinition::Scalar(t) => TypeExtension::Scalar(s::ScalarTypeExtension {
            position: t.position,
            name: t.name,
            directives: t.directives,
        }),
        TypeDefinition::Object(t) => TypeExtension::Object(s::ObjectTypeExtension {
            position: t.position,
            name: t.name,
            implements_interfaces: t.implements_interfaces,
            directives: t.directives,
            fields: t.fields,
        }),
        TypeDefinition::Interface(t) => TypeExtension::Interface(s::InterfaceTypeExtension {
            position: t.position,
            name: t.name,
            implements_interfaces: t.implements_interfaces,
            directives: t.directives,
            fields: t.fields,
        }),
        TypeDefinition::Union(t) => TypeExtension::Union(s::UnionTypeExtension {
            position: t.position,
            name: t.name,
            directives: t.directives,
            types: t.types,
        }),
        TypeDefinition::Enum(t) => TypeExtension::Enum(s::EnumTypeExtension {
            position: t.position,
            name: t.name,
            directives: t.directives,
            values: t.values,
        }),
        TypeDefinition::InputObject(t) => TypeExtension::InputObject(s::InputObjectTypeExtension {
            position: t.position,
            name: t.name,
            directives: t.directives,
            fields: t.fields,
        }),
    }
}

fn same_or_conflict(key: &str, existing: &Def, incoming: &Def) -> Result<(), SchemaConflictError> {
    let (first, second) = (print_definition(existing), print_definition(incoming));
    if first == second {
        tracing::trace!(name = key, "Skipping duplicate schema definition");
        Ok(())
    } else {
        Err(SchemaConflictError {
            name: key.to_string(),
            first,
            second,
        })
    }
}

/// The name a definition is merged under.
fn definition_key(definition: &Def) -> String {
    match definition {
        Definition::SchemaDefinition(_) => "schema".to_string(),
        Definition::TypeDefinition(definition) => type_definition_name(definition).to_string(),
        Definition::TypeExtension(extension) => format!("extend {}", extension_name(extension)),
        Definition::DirectiveDefinition(directive) => format!("@{}", directive.name),
    }
}

fn type_definition_name<'a>(definition: &'a TypeDefinition<'static, String>) -> &'a str {
    match definition {
        TypeDefinition::Scalar(t) => &t.name,
        TypeDefinition::Object(t) => &t.name,
        TypeDefinition::Interface(t) => &t.name,
        TypeDefinition::Union(t) => &t.name,
        TypeDefinition::Enum(t) => &t.name,
        TypeDefinition::InputObject(t) => &t.name,
    }
}

fn extension_name<'a>(extension: &'a TypeExtension<'static, String>) -> &'a str {
    match extension {
        TypeExtension::Scalar(t) => &t.name,
        TypeExtension::Object(t) => &t.name,
        TypeExtension::Interface(t) => &t.name,
        TypeExtension::Union(t) => &t.name,
        TypeExtension::Enum(t) => &t.name,
        TypeExtension::InputObject(t) => &t.name,
    }
}

/// Printed form of a definition. Source positions do not take part in it.
fn print_definition(definition: &Def) -> String {
    Document {
        definitions: vec![definition.clone()],
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHARED: &str = r#"
type FuturesMarket @entity {
  id: ID!
  asset: Bytes!
  isActive: Boolean!
}
"#;

    const FUTURES: &str = r#"
type FuturesPosition @entity {
  id: ID!
  market: Bytes!
  size: BigInt!
}

type FuturesMarket @entity {
  id: ID!
  asset: Bytes!
  isActive: Boolean!
}
"#;

    #[test]
    fn test_duplicate_fragment_appears_once() {
        let merged = SchemaDocument::merge([
            SchemaSource::new("shared", SHARED),
            SchemaSource::new("futures", FUTURES),
            SchemaSource::new("shared-again", SHARED),
        ])
        .unwrap();

        assert_eq!(merged.names(), ["FuturesMarket", "FuturesPosition"]);
        assert_eq!(merged.print().matches("type FuturesMarket").count(), 1);
    }

    #[test]
    fn test_whitespace_and_layout_do_not_count_as_conflicts() {
        let compact = "type FuturesMarket @entity { id: ID! asset: Bytes! isActive: Boolean! }";
        let merged = SchemaDocument::merge([
            SchemaSource::new("a", SHARED),
            SchemaSource::new("b", compact),
        ])
        .unwrap();
        assert_eq!(merged.names(), ["FuturesMarket"]);
    }

    #[test]
    fn test_conflicting_redefinition_names_the_type() {
        let other = "type FuturesMarket @entity { id: ID! asset: String! }";
        let err = SchemaDocument::merge([
            SchemaSource::new("a", SHARED),
            SchemaSource::new("b", other),
        ])
        .unwrap_err();

        match err {
            SchemaError::Conflict(conflict) => {
                assert_eq!(conflict.name, "FuturesMarket");
                assert!(conflict.first.contains("isActive"));
                assert!(conflict.second.contains("String!"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extensions_fold_into_base_type() {
        let extension = r#"
extend type FuturesMarket {
  isActive: Boolean!
  marketKey: Bytes
}
"#;
        let merged = SchemaDocument::merge([
            SchemaSource::new("a", SHARED),
            SchemaSource::new("b", extension),
            SchemaSource::new("c", extension),
        ])
        .unwrap();

        let printed = merged.print();
        assert!(!printed.contains("extend type"));
        assert_eq!(printed.matches("marketKey").count(), 1);
        assert_eq!(printed.matches("isActive").count(), 1);
    }

    #[test]
    fn test_conflicting_extension_field_names_the_field() {
        let extension = "extend type FuturesMarket { isActive: String }";
        let err = SchemaDocument::merge([
            SchemaSource::new("a", SHARED),
            SchemaSource::new("b", extension),
        ])
        .unwrap_err();

        assert!(matches!(err, SchemaError::Conflict(c) if c.name == "FuturesMarket.isActive"));
    }

    #[test]
    fn test_extension_directive_arguments_must_match() {
        let base = "type FuturesMarket @entity { id: ID! }";

        let same = "extend type FuturesMarket @entity";
        let merged = SchemaDocument::merge([
            SchemaSource::new("a", base),
            SchemaSource::new("b", same),
        ])
        .unwrap();
        assert_eq!(merged.print().matches("@entity").count(), 1);

        let immutable = "extend type FuturesMarket @entity(immutable: true)";
        let err = SchemaDocument::merge([
            SchemaSource::new("a", base),
            SchemaSource::new("b", immutable),
        ])
        .unwrap_err();
        match err {
            SchemaError::Conflict(conflict) => {
                assert_eq!(conflict.name, "FuturesMarket@entity");
                assert!(conflict.second.contains("immutable: true"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extensions_without_base_are_folded_together() {
        let merged = SchemaDocument::merge([
            SchemaSource::new("a", "extend type Trader { id: ID! }"),
            SchemaSource::new("b", "extend type Trader { id: ID! margin: BigInt! }"),
        ])
        .unwrap();
        let printed = merged.print();
        assert_eq!(printed.matches("extend type Trader").count(), 1);
        assert_eq!(printed.matches("margin").count(), 1);

        let err = SchemaDocument::merge([
            SchemaSource::new("a", "extend type Trader { margin: Int }"),
            SchemaSource::new("b", "extend type Trader { margin: String }"),
        ])
        .unwrap_err();
        assert!(matches!(err, SchemaError::Conflict(c) if c.name == "Trader.margin"));
    }

    #[test]
    fn test_enum_and_interface_extensions_fold_into_base() {
        let base = r#"
enum Side { LONG }

interface Position { id: ID! }
"#;
        let extensions = r#"
extend enum Side { SHORT }

extend interface Position { size: BigInt! }
"#;
        let merged = SchemaDocument::merge([
            SchemaSource::new("a", base),
            SchemaSource::new("b", extensions),
        ])
        .unwrap();

        let printed = merged.print();
        assert!(!printed.contains("extend"));
        assert!(printed.contains("SHORT"));
        assert!(printed.contains("size: BigInt!"));
        assert_eq!(merged.names(), ["Side", "Position"]);
    }

    #[test]
    fn test_extension_of_another_kind_conflicts() {
        let err = SchemaDocument::merge([
            SchemaSource::new("a", "enum Side { LONG SHORT }"),
            SchemaSource::new("b", "extend type Side { id: ID! }"),
        ])
        .unwrap_err();
        assert!(matches!(err, SchemaError::Conflict(c) if c.name == "Side"));
    }

    #[test]
    fn test_print_is_marked_and_deterministic() {
        let merge = || {
            SchemaDocument::merge([
                SchemaSource::new("futures", FUTURES),
                SchemaSource::new("shared", SHARED),
            ])
            .unwrap()
            .print()
        };

        let printed = merge();
        assert!(printed.starts_with(AUTOGEN_NOTICE));
        assert_eq!(printed, merge());
    }

    #[test]
    fn test_entity_names_only_include_entities() {
        let text = r#"
type FuturesTrade @entity { id: ID! }
type Helper { id: ID! }
enum Side { LONG SHORT }
"#;
        let merged = SchemaDocument::merge([SchemaSource::new("a", text)]).unwrap();
        assert_eq!(
            merged.entity_names().into_iter().collect::<Vec<_>>(),
            ["FuturesTrade"]
        );
    }

    #[test]
    fn test_parse_errors_name_the_source() {
        let err = SchemaDocument::merge([SchemaSource::new("broken.graphql", "type {")]).unwrap_err();
        assert!(matches!(err, SchemaError::Parse { source_name, .. } if source_name == "broken.graphql"));
    }
}
