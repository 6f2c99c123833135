pub mod scorer;
pub mod searcher;

pub use scorer::Scorer;
pub use searcher::HomologySearch;
