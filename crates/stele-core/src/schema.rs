//! Typed annotation schemas.
//!
//! [`AnnotationSchema`] ties a Rust type to a registered [`AnnotationType`].
//! It is normally derived with `#[derive(Annotation)]`, which also implements
//! [`AttributeKind`] and [`FromAttributeValue`] so schemas can nest.

use crate::attributes::AnnotationAttributes;
use crate::error::SteleResult;
use crate::registry::AnnotationType;
use crate::synthesis::SynthesizedAnnotation;
use crate::value::{AttributeType, ClassRef};

/// A Rust type describing an annotation type.
pub trait AnnotationSchema: Sized {
    /// Fully qualified annotation type name.
    const NAME: &'static str;

    /// Returns the annotation type to register.
    fn annotation_type() -> AnnotationType;

    /// Builds the typed value from a merged attribute store.
    fn from_attributes(attributes: &AnnotationAttributes) -> SteleResult<Self>;

    /// Builds the typed value from a synthesized view.
    fn from_synthesized(annotation: &SynthesizedAnnotation) -> SteleResult<Self> {
        Self::from_attributes(&annotation.to_attributes()?)
    }
}

/// Maps a Rust type onto the attribute type it is declared with.
pub trait AttributeKind {
    /// Returns the declared attribute type.
    fn attribute_type() -> AttributeType;
}

macro_rules! attribute_kind {
    ($($ty:ty => $kind:expr),* $(,)?) => {
        $(
            impl AttributeKind for $ty {
                fn attribute_type() -> AttributeType {
                    $kind
                }
            }
        )*
    };
}

attribute_kind! {
    String => AttributeType::String,
    bool => AttributeType::Bool,
    i64 => AttributeType::Int,
    i32 => AttributeType::Int,
    f64 => AttributeType::Float,
    ClassRef => AttributeType::Class,
}

impl<T: AttributeKind> AttributeKind for Vec<T> {
    fn attribute_type() -> AttributeType {
        AttributeType::array(T::attribute_type())
    }
}
