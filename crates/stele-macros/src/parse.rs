//! Parsing utilities for the annotation derive.
//!
//! This module parses the container-level `#[annotation(...)]` attribute and
//! the field-level `#[attribute(...)]` attributes.

use proc_macro2::Span;
use syn::{
    punctuated::Punctuated, spanned::Spanned, Attribute, Data, DeriveInput, Expr, ExprLit, Fields,
    Ident, Lit, Meta, Token, Type,
};

/// Parsed `#[annotation(...)]` attributes.
#[derive(Debug)]
pub struct AnnotationAttrs {
    /// Fully qualified annotation type name.
    pub name: String,
    /// Whether the annotation is inherited by subclasses.
    pub inherited: bool,
    /// Names of the meta-annotations, in declaration order.
    pub meta: Vec<String>,
}

impl AnnotationAttrs {
    fn parse(attrs: &[Attribute], span: Span) -> syn::Result<Self> {
        let mut name = None;
        let mut inherited = false;
        let mut meta = Vec::new();

        for attr in attrs.iter().filter(|a| a.path().is_ident("annotation")) {
            for item in attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)? {
                match item {
                    Meta::Path(path) if path.is_ident("inherited") => inherited = true,
                    Meta::NameValue(nv) => {
                        let ident = ident_of(&nv.path)?;
                        let value = string_literal(&nv.value)?;
                        match ident.as_str() {
                            "name" => name = Some(value),
                            "meta" => meta.push(value),
                            _ => {
                                return Err(syn::Error::new(
                                    nv.path.span(),
                                    format!("unknown annotation attribute: {ident}"),
                                ))
                            }
                        }
                    }
                    other => {
                        return Err(syn::Error::new(
                            other.span(),
                            "expected `name = \"...\"`, `meta = \"...\"` or `inherited`",
                        ))
                    }
                }
            }
        }

        let name = name.ok_or_else(|| {
            syn::Error::new(span, "missing required attribute: #[annotation(name = \"...\")]")
        })?;

        Ok(Self {
            name,
            inherited,
            meta,
        })
    }
}

/// Parsed `#[attribute(...)]` attributes of one field.
#[derive(Debug, Default)]
pub struct AttributeAttrs {
    /// Attribute name override.
    pub name: Option<String>,
    /// Aliased attribute.
    pub alias_for: Option<String>,
    /// Meta-annotation holding the aliased attribute.
    pub annotation: Option<String>,
    /// Default value expression.
    pub default: Option<Expr>,
}

impl AttributeAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("attribute")) {
            for item in attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)? {
                let nv = match item {
                    Meta::NameValue(nv) => nv,
                    other => return Err(syn::Error::new(other.span(), "expected name = value")),
                };
                let ident = ident_of(&nv.path)?;
                match ident.as_str() {
                    "name" => parsed.name = Some(string_literal(&nv.value)?),
                    "alias_for" => parsed.alias_for = Some(string_literal(&nv.value)?),
                    "annotation" => parsed.annotation = Some(string_literal(&nv.value)?),
                    "default" => parsed.default = Some(nv.value),
                    _ => {
                        return Err(syn::Error::new(
                            nv.path.span(),
                            format!("unknown attribute option: {ident}"),
                        ))
                    }
                }
            }
        }

        Ok(parsed)
    }
}

/// A field of the derived struct.
#[derive(Debug)]
pub struct AnnotationField {
    /// The Rust field name.
    pub ident: Ident,
    /// The field type.
    pub ty: Type,
    /// Field-level options.
    pub attrs: AttributeAttrs,
}

impl AnnotationField {
    /// Returns the attribute name: the override, or the field name.
    pub fn attribute_name(&self) -> String {
        self.attrs
            .name
            .clone()
            .unwrap_or_else(|| self.ident.to_string().trim_start_matches("r#").to_string())
    }
}

/// Parsed derive input.
#[derive(Debug)]
pub struct AnnotationStruct {
    /// The struct name.
    pub ident: Ident,
    /// Container-level options.
    pub attrs: AnnotationAttrs,
    /// The named fields, in declaration order.
    pub fields: Vec<AnnotationField>,
}

impl AnnotationStruct {
    /// Parses a `DeriveInput` into an `AnnotationStruct`.
    pub fn parse(input: &DeriveInput) -> syn::Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(syn::Error::new(
                input.generics.span(),
                "annotation schemas cannot be generic",
            ));
        }

        let Data::Struct(data) = &input.data else {
            return Err(syn::Error::new(
                input.ident.span(),
                "#[derive(Annotation)] is only supported on structs",
            ));
        };

        let fields = match &data.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .map(|field| {
                    Ok(AnnotationField {
                        ident: field
                            .ident
                            .clone()
                            .ok_or_else(|| syn::Error::new(field.span(), "expected named field"))?,
                        ty: field.ty.clone(),
                        attrs: AttributeAttrs::parse(&field.attrs)?,
                    })
                })
                .collect::<syn::Result<Vec<_>>>()?,
            Fields::Unit => Vec::new(),
            Fields::Unnamed(unnamed) => {
                return Err(syn::Error::new(
                    unnamed.span(),
                    "annotation schemas need named fields",
                ))
            }
        };

        Ok(Self {
            ident: input.ident.clone(),
            attrs: AnnotationAttrs::parse(&input.attrs, input.ident.span())?,
            fields,
        })
    }
}

fn ident_of(path: &syn::Path) -> syn::Result<String> {
    path.get_ident()
        .map(ToString::to_string)
        .ok_or_else(|| syn::Error::new(path.span(), "expected identifier"))
}

fn string_literal(expr: &Expr) -> syn::Result<String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        _ => Err(syn::Error::new(expr.span(), "expected string literal")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_parse_annotation_attrs() {
        let input: DeriveInput = parse_quote! {
            #[annotation(name = "web.Route", inherited, meta = "web.Mapping")]
            struct Route {
                #[attribute(alias_for = "path", default = "")]
                value: String,
                #[attribute(annotation = "web.Mapping", default = 3)]
                timeout: i64,
                required: String,
            }
        };
        let parsed = AnnotationStruct::parse(&input).unwrap();
        assert_eq!(parsed.attrs.name, "web.Route");
        assert!(parsed.attrs.inherited);
        assert_eq!(parsed.attrs.meta, vec!["web.Mapping".to_string()]);
        assert_eq!(parsed.fields.len(), 3);
        assert_eq!(parsed.fields[0].attrs.alias_for.as_deref(), Some("path"));
        assert_eq!(parsed.fields[1].attrs.annotation.as_deref(), Some("web.Mapping"));
        assert!(parsed.fields[1].attrs.default.is_some());
        assert!(parsed.fields[2].attrs.default.is_none());
    }

    #[test]
    fn test_attribute_rename() {
        let input: DeriveInput = parse_quote! {
            #[annotation(name = "test.Config")]
            struct Config {
                #[attribute(name = "xml_file")]
                r#xml: String,
                r#type: String,
            }
        };
        let parsed = AnnotationStruct::parse(&input).unwrap();
        assert_eq!(parsed.fields[0].attribute_name(), "xml_file");
        assert_eq!(parsed.fields[1].attribute_name(), "type");
    }

    #[test]
    fn test_missing_name_rejected() {
        let input: DeriveInput = parse_quote! {
            #[annotation(inherited)]
            struct Anonymous;
        };
        assert!(AnnotationStruct::parse(&input).is_err());
    }

    #[test]
    fn test_tuple_struct_rejected() {
        let input: DeriveInput = parse_quote! {
            #[annotation(name = "test.Tuple")]
            struct Tuple(String);
        };
        assert!(AnnotationStruct::parse(&input).is_err());
    }

    #[test]
    fn test_unknown_option_rejected() {
        let input: DeriveInput = parse_quote! {
            #[annotation(name = "test.Odd")]
            struct Odd {
                #[attribute(required = "yes")]
                value: String,
            }
        };
        assert!(AnnotationStruct::parse(&input).is_err());
    }
}
