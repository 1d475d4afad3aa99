//! Built-in [`Graph`](crate::Graph) implementations.
//!
//! ## Implemented Menu
//!
//! - scalars: `bool`, `i8`-`i128`, `u8`-`u128`, `isize`, `usize`, `f32`, `f64`, `char`
//! - [`Decimal`](crate::value::Decimal), `core::time::Duration`, `std::time::SystemTime`
//! - `String`
//! - `Vec<T>`, `Option<T>`
//! - [`Shared<T>`] and [`SharedDyn`]

// -----------------------------------------------------------------------------
// Modules

mod option;
mod scalar;
mod shared;
mod string;
mod vec;

// -----------------------------------------------------------------------------
// Exports

pub use shared::{Shared, SharedDyn, SharedSlot};
pub use vec::VecBuilder;

/// Concatenates string slices into one allocation.
///
/// Used to build the names of generic types.
///
/// ```
/// use og_model::impls;
///
/// let s = impls::concat(&["Vec", "<", "i32", ">"]);
/// assert_eq!(s, "Vec<i32>");
/// assert_eq!(s.capacity(), 8);
/// ```
#[inline(never)]
pub fn concat(arr: &[&str]) -> alloc::string::String {
    let len = arr.iter().map(|s| s.len()).sum();
    let mut res = alloc::string::String::with_capacity(len);
    for &item in arr {
        res.push_str(item);
    }
    res
}
