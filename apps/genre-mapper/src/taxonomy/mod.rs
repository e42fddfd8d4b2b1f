// Closed-world taxonomy: the only source of valid classification answers.

pub mod category;
pub mod index;

pub use category::MappedCategory;
pub use index::TaxonomyIndex;
