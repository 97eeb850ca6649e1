//! Rust source emission for the static mirror.
//!
//! `render_schema_module` writes the key-partition tables of every resource as
//! constants; `render_output_type` writes serde types that accept exactly the
//! projected output of one selection.

use std::collections::HashSet;
use std::fmt::Write;

use convert_case::{Case, Casing};

use crate::mirror::{ShapeField, StaticSchema, TypeShape};
use crate::types::ValueType;

const HEADER: &str = "// Generated by resource-projection. Do not edit.\n";

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "do", "dyn", "else",
    "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in", "let", "loop", "macro",
    "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return", "static", "struct",
    "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use", "virtual", "where",
    "while", "yield",
];

/// Render one module per resource holding its key tables.
pub fn render_schema_module(schema: &StaticSchema) -> String {
    let mut out = String::from(HEADER);

    for (identifier, resource) in &schema.resources {
        let _ = writeln!(out, "\npub mod {} {{", field_ident(identifier));
        let _ = writeln!(out, "    pub const IDENTIFIER: &str = {:?};", identifier);
        let _ = writeln!(out, "    pub const EMBEDDED: bool = {};", resource.embedded);
        write_keys(
            &mut out,
            "ATTRIBUTES",
            resource.attributes.iter().map(|f| f.name.as_str()),
        );
        write_keys(
            &mut out,
            "CALCULATIONS",
            resource.calculations.iter().map(|f| f.name.as_str()),
        );
        write_keys(
            &mut out,
            "AGGREGATES",
            resource.aggregates.iter().map(|f| f.name.as_str()),
        );
        write_keys(
            &mut out,
            "RELATIONSHIPS",
            resource.relationships.iter().map(|f| f.name.as_str()),
        );
        write_keys(
            &mut out,
            "EMBEDS",
            resource.embeds.iter().map(|f| f.name.as_str()),
        );
        write_keys(
            &mut out,
            "UNIONS",
            resource.unions.iter().map(|f| f.name.as_str()),
        );
        out.push_str("}\n");
    }

    out
}

fn write_keys<'a>(out: &mut String, name: &str, keys: impl Iterator<Item = &'a str>) {
    let keys: Vec<String> = keys.map(|k| format!("{:?}", k)).collect();
    let _ = writeln!(out, "    pub const {}: &[&str] = &[{}];", name, keys.join(", "));
}

/// Render the serde types for one selection's output, rooted at `name`.
///
/// Nested objects and unions get their own items named after their path
/// (`Post` -> `PostOwner` -> `PostOwnerPosts`). A path name already taken by
/// another item gets a numeric suffix (`PostOwnerPosts2`).
pub fn render_output_type(shape: &TypeShape, name: &str) -> String {
    let mut emitter = Emitter::default();
    let root_name = type_name(name);

    let mut out = String::from(HEADER);
    out.push_str("\nuse serde::{Deserialize, Serialize};\n");

    if matches!(shape, TypeShape::Object { .. }) {
        emitter.type_expr(shape, &root_name);
    } else {
        // A root that is not an object (lists of records) gets an alias.
        let alias = emitter.claim(&root_name);
        let root = emitter.type_expr(shape, &format!("{}Item", root_name));
        let _ = writeln!(out, "\npub type {} = {};", alias, root);
    }
    for item in emitter.items {
        out.push('\n');
        out.push_str(&item);
    }
    out
}

/// Item definitions in emission order, and the type names they use.
#[derive(Default)]
struct Emitter {
    items: Vec<String>,
    names: HashSet<String>,
}

impl Emitter {
    /// Reserve `base`, or the first free `base2`, `base3`, ...
    fn claim(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 2;
        while !self.names.insert(name.clone()) {
            name = format!("{}{}", base, n);
            n += 1;
        }
        name
    }

    /// Rust type expression for `shape`, pushing any item definitions it needs.
    fn type_expr(&mut self, shape: &TypeShape, name: &str) -> String {
        let inner = match shape {
            TypeShape::Scalar { value_type, .. } => scalar_type(value_type),
            TypeShape::Object { fields, .. } => {
                let name = self.claim(name);
                let item = self.render_struct(fields, &name);
                self.items.push(item);
                name
            }
            TypeShape::List { item, .. } => format!("Vec<{}>", self.type_expr(item, name)),
            TypeShape::Union { variants, .. } => {
                let name = self.claim(name);
                let item = self.render_enum(variants, &name);
                self.items.push(item);
                name
            }
        };

        if shape.nullable() {
            format!("Option<{}>", inner)
        } else {
            inner
        }
    }

    fn render_struct(&mut self, fields: &[ShapeField], name: &str) -> String {
        let mut out = String::new();
        out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        out.push_str("#[serde(deny_unknown_fields)]\n");
        let _ = writeln!(out, "pub struct {} {{", name);
        for field in fields {
            let ident = field_ident(&field.key);
            let ty = self.type_expr(&field.shape, &format!("{}{}", name, type_name(&field.key)));
            if ident.trim_start_matches("r#") != field.key {
                let _ = writeln!(out, "    #[serde(rename = {:?})]", field.key);
            }
            let _ = writeln!(out, "    pub {}: {},", ident, ty);
        }
        out.push_str("}\n");
        out
    }

    fn render_enum(&mut self, variants: &[ShapeField], name: &str) -> String {
        let mut out = String::new();
        out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        let _ = writeln!(out, "pub enum {} {{", name);
        for variant in variants {
            let variant_name = type_name(&variant.key);
            let ty = self.type_expr(&variant.shape, &format!("{}{}", name, variant_name));
            let _ = writeln!(out, "    #[serde(rename = {:?})]", variant.key);
            let _ = writeln!(out, "    {}({}),", variant_name, ty);
        }
        out.push_str("}\n");
        out
    }
}

fn scalar_type(value_type: &ValueType) -> String {
    match value_type {
        ValueType::String
        | ValueType::Date
        | ValueType::Time
        | ValueType::DateTime
        | ValueType::Uuid => "String".to_string(),
        ValueType::Integer => "i64".to_string(),
        ValueType::Float => "f64".to_string(),
        ValueType::Boolean => "bool".to_string(),
        // String or number on the wire.
        ValueType::Decimal => "serde_json::Value".to_string(),
        ValueType::Map => "serde_json::Map<String, serde_json::Value>".to_string(),
        ValueType::Array(inner) => format!("Vec<{}>", scalar_type(inner)),
    }
}

fn type_name(key: &str) -> String {
    key.to_case(Case::Pascal)
}

fn field_ident(key: &str) -> String {
    let ident = key.to_case(Case::Snake);
    if KEYWORDS.contains(&ident.as_str()) {
        format!("r#{}", ident)
    } else {
        ident
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::output_type;
    use crate::naming::NamingConvention;
    use crate::registry::Registry;
    use crate::selection::SelectionSyntax;
    use serde_json::json;

    fn schema() -> StaticSchema {
        let registry =
            Registry::from_json_str(include_str!("../tests/fixtures/blog.json")).unwrap();
        StaticSchema::from_registry(&registry)
    }

    #[test]
    fn schema_module_lists_partitions() {
        let source = render_schema_module(&schema());
        assert!(source.starts_with(HEADER));
        assert!(source.contains("pub mod post {"));
        assert!(source.contains(
            "pub const ATTRIBUTES: &[&str] = &[\"id\", \"title\", \"status\", \"tags\", \"published_at\"];"
        ));
        assert!(source.contains("pub const AGGREGATES: &[&str] = &[\"comment_count\", \"total_likes\"];"));
        assert!(source.contains("pub const EMBEDDED: bool = true;"));
    }

    #[test]
    fn output_type_structs() {
        let shape = output_type(
            &schema(),
            "post",
            &json!(["id", "title", "status", { "owner": ["name"] }, "commentCount"]),
            &NamingConvention::camel_case(),
            &SelectionSyntax::default(),
        )
        .unwrap();
        let source = render_output_type(&shape, "post");

        assert!(source.contains("#[serde(deny_unknown_fields)]\npub struct Post {"));
        assert!(source.contains("    pub id: String,"));
        assert!(source.contains("    pub status: Option<String>,"));
        assert!(source.contains("    pub owner: Option<PostOwner>,"));
        assert!(source.contains("pub struct PostOwner {\n    pub name: String,\n}"));
        assert!(source.contains("    #[serde(rename = \"commentCount\")]\n    pub comment_count: i64,"));
    }

    #[test]
    fn output_type_unions_and_lists() {
        let shape = output_type(
            &schema(),
            "post",
            &json!([{ "content": ["note", { "text": ["wordCount"] }] }, { "comments": ["likes"] }]),
            &NamingConvention::camel_case(),
            &SelectionSyntax::default(),
        )
        .unwrap();
        let source = render_output_type(&shape, "post");

        assert!(source.contains("    pub content: Option<PostContent>,"));
        assert!(source.contains("pub enum PostContent {"));
        assert!(source.contains("    #[serde(rename = \"note\")]\n    Note(String),"));
        assert!(source.contains("    Text(PostContentText),"));
        assert!(source.contains("    pub comments: Option<Vec<PostComments>>,"));
    }

    #[test]
    fn colliding_path_names_get_distinct_items() {
        let registry = Registry::from_json_str(
            r#"{"resources":[
                {"identifier":"post","primary_key":["id"],"fields":[
                    {"kind":"attribute","name":"id","type":"uuid","nullable":false},
                    {"kind":"relationship","name":"owner","resource":"user"},
                    {"kind":"relationship","name":"owner_posts","resource":"post"}]},
                {"identifier":"user","primary_key":["id"],"fields":[
                    {"kind":"attribute","name":"name","type":"string"},
                    {"kind":"relationship","name":"posts","resource":"post","cardinality":"many"}]}]}"#,
        )
        .unwrap();
        let shape = output_type(
            &StaticSchema::from_registry(&registry),
            "post",
            &json!([{ "owner": [{ "posts": ["id"] }] }, { "ownerPosts": [{ "owner": ["name"] }] }]),
            &NamingConvention::camel_case(),
            &SelectionSyntax::default(),
        )
        .unwrap();
        let source = render_output_type(&shape, "post");

        let names: Vec<&str> = source
            .lines()
            .filter_map(|l| {
                l.strip_prefix("pub struct ")
                    .or_else(|| l.strip_prefix("pub enum "))
            })
            .map(|l| l.trim_end_matches(" {"))
            .collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len(), "duplicate items in {:?}", names);

        assert!(source.contains("    pub posts: Option<Vec<PostOwnerPosts>>,"));
        assert!(source.contains("    pub owner_posts: Option<PostOwnerPosts2>,"));
        assert!(source.contains("pub struct PostOwnerPosts2 {\n    pub owner: Option<PostOwnerPosts2Owner>,\n}"));
    }

    #[test]
    fn keywords_are_escaped() {
        assert_eq!(field_ident("type"), "r#type");
        assert_eq!(field_ident("wordCount"), "word_count");
        assert_eq!(type_name("post_metadata"), "PostMetadata");
    }
}
