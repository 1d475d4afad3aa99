use crate::info::Typed;

/// Creates a [`TypeTrait`] for the type `T`.
///
/// Used by `#[derive(Graph)]` to fill the trait table of the generated
/// [`TypeMeta`].
///
/// # Example
///
/// ```
/// # use og_model::registry::{TypeMeta, TypeTraitDefault, FromType};
/// let mut meta = TypeMeta::of::<String>();
///
/// meta.insert_trait::<TypeTraitDefault>(FromType::<String>::from_type());
/// ```
///
/// [`TypeTrait`]: crate::registry::TypeTrait
/// [`TypeMeta`]: crate::registry::TypeMeta
pub trait FromType<T: Typed> {
    fn from_type() -> Self;
}
