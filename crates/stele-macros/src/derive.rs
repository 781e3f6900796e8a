//! `#[derive(Annotation)]` implementation.
//!
//! The derive emits four impls for the struct:
//! 1. `AnnotationSchema`, registering the annotation type and reading a merged store
//! 2. `AttributeKind`, so the struct can be a nested attribute type
//! 3. `FromAttributeValue`, so nested stores and instances convert back
//! 4. `From<Self> for AttributeValue`, so the struct can be used as a value

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::parse::{AnnotationField, AnnotationStruct};

/// Expands `#[derive(Annotation)]`.
pub fn expand_annotation(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let schema = AnnotationStruct::parse(&input)?;
    Ok(generate(&schema))
}

fn generate(schema: &AnnotationStruct) -> TokenStream {
    let ident = &schema.ident;
    let name = &schema.attrs.name;

    let meta = schema.attrs.meta.iter().map(|meta| {
        quote! { .meta_annotation(::stele_core::Annotation::new(#meta)) }
    });
    let inherited = schema.attrs.inherited.then(|| quote! { .inherited() });
    let attributes = schema.fields.iter().map(attribute_method);
    let reads = schema.fields.iter().map(field_read);
    let writes = schema.fields.iter().map(|field| {
        let field_ident = &field.ident;
        let attribute = field.attribute_name();
        quote! { .with(#attribute, value.#field_ident) }
    });

    quote! {
        impl ::stele_core::AnnotationSchema for #ident {
            const NAME: &'static str = #name;

            fn annotation_type() -> ::stele_core::AnnotationType {
                ::stele_core::AnnotationType::new(#name)
                    #inherited
                    #(#meta)*
                    #(.attribute(#attributes))*
            }

            fn from_attributes(
                attributes: &::stele_core::AnnotationAttributes,
            ) -> ::stele_core::SteleResult<Self> {
                ::core::result::Result::Ok(Self {
                    #(#reads,)*
                })
            }
        }

        impl ::stele_core::AttributeKind for #ident {
            fn attribute_type() -> ::stele_core::AttributeType {
                ::stele_core::AttributeType::Annotation(::std::string::String::from(#name))
            }
        }

        impl ::stele_core::FromAttributeValue for #ident {
            fn expected_type() -> ::std::string::String {
                ::std::string::String::from(#name)
            }

            fn from_attribute_value(value: &::stele_core::AttributeValue) -> ::core::option::Option<Self> {
                let attributes = match value {
                    ::stele_core::AttributeValue::Attributes(attributes) => attributes.clone(),
                    ::stele_core::AttributeValue::Annotation(annotation) => {
                        ::stele_core::AnnotationAttributes::from_annotation(annotation)
                    }
                    _ => return ::core::option::Option::None,
                };
                <Self as ::stele_core::AnnotationSchema>::from_attributes(&attributes).ok()
            }
        }

        impl ::core::convert::From<#ident> for ::stele_core::AttributeValue {
            fn from(value: #ident) -> Self {
                ::stele_core::AttributeValue::Annotation(
                    ::stele_core::Annotation::new(#name)
                        #(#writes)*
                )
            }
        }
    }
}

/// Builds the `AttributeMethod` of one field.
fn attribute_method(field: &AnnotationField) -> TokenStream {
    let ty = &field.ty;
    let attribute = field.attribute_name();

    let default = field.attrs.default.as_ref().map(|expr| {
        quote! {
            .default_value(::stele_core::AttributeValue::from(
                ::core::convert::Into::<#ty>::into(#expr),
            ))
        }
    });

    let alias = match (&field.attrs.annotation, &field.attrs.alias_for) {
        (Some(annotation), Some(target)) => Some(quote! {
            .alias_for(::stele_core::AliasFor::meta_attribute(#annotation, #target))
        }),
        (Some(annotation), None) => Some(quote! {
            .alias_for(::stele_core::AliasFor::meta(#annotation))
        }),
        (None, Some(target)) => Some(quote! {
            .alias_for(::stele_core::AliasFor::attribute(#target))
        }),
        (None, None) => None,
    };

    quote! {
        ::stele_core::AttributeMethod::new(
            #attribute,
            <#ty as ::stele_core::AttributeKind>::attribute_type(),
        )
        #default
        #alias
    }
}

/// Reads one field from `attributes`, falling back to its default.
fn field_read(field: &AnnotationField) -> TokenStream {
    let ident = &field.ident;
    let ty = &field.ty;
    let attribute = field.attribute_name();

    match &field.attrs.default {
        Some(expr) => quote! {
            #ident: attributes
                .get_optional::<#ty>(#attribute)?
                .unwrap_or_else(|| ::core::convert::Into::<#ty>::into(#expr))
        },
        None => quote! {
            #ident: attributes.get_required::<#ty>(#attribute)?
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(input: TokenStream) -> String {
        compact(&expand_annotation(input).unwrap())
    }

    fn compact(tokens: &TokenStream) -> String {
        tokens.to_string().replace(' ', "")
    }

    #[test]
    fn test_expands_all_impls() {
        let output = expand(quote! {
            #[annotation(name = "web.Route", meta = "web.Mapping")]
            struct Route {
                #[attribute(annotation = "web.Mapping", default = "")]
                path: String,
            }
        });
        assert!(output.contains("AnnotationSchemaforRoute"));
        assert!(output.contains("AttributeKindforRoute"));
        assert!(output.contains("FromAttributeValueforRoute"));
        assert!(output.contains("From<Route>for::stele_core::AttributeValue"));
        assert!(output.contains("\"web.Route\""));
    }

    #[test]
    fn test_alias_forms() {
        let same: AnnotationStruct = AnnotationStruct::parse(&parse_quote! {
            #[annotation(name = "test.Pair")]
            struct Pair {
                #[attribute(alias_for = "path", default = "")]
                value: String,
                #[attribute(alias_for = "value", default = "")]
                path: String,
            }
        })
        .unwrap();
        let method = compact(&attribute_method(&same.fields[0]));
        assert!(method.contains("AliasFor::attribute(\"path\")"), "{method}");

        let meta: AnnotationStruct = AnnotationStruct::parse(&parse_quote! {
            #[annotation(name = "test.Xml", meta = "test.Config")]
            struct Xml {
                #[attribute(annotation = "test.Config", alias_for = "locations", default = "")]
                xml: String,
            }
        })
        .unwrap();
        let method = compact(&attribute_method(&meta.fields[0]));
        assert!(method.contains("AliasFor::meta_attribute(\"test.Config\",\"locations\")"), "{method}");
    }

    #[test]
    fn test_required_field_read() {
        let parsed: AnnotationStruct = AnnotationStruct::parse(&parse_quote! {
            #[annotation(name = "test.Header")]
            struct Header {
                name: String,
            }
        })
        .unwrap();
        let read = compact(&field_read(&parsed.fields[0]));
        assert!(read.contains("get_required"), "{read}");
    }

    #[test]
    fn test_enum_rejected() {
        assert!(expand_annotation(quote! {
            #[annotation(name = "test.Kind")]
            enum Kind { A }
        })
        .is_err());
    }
}
