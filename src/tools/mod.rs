//! External service adapters
//!
//! The research core only knows the [`SearchProvider`](crate::research::SearchProvider)
//! and [`ContentEnricher`](crate::research::ContentEnricher) traits. This module
//! provides the implementations the binary wires in.
//!
//! # Module Structure
//!
//! - [`search`](crate::tools::search) - DuckDuckGo (daedra), Serper.dev, page fetch
//!
//! ```ignore
//! use juris::tools::search::DaedraSearch;
//! use juris::research::SearchProvider;
//!
//! let hits = DaedraSearch::new().search("usucapion site:gov.co", 5).await?;
//! for hit in hits {
//!     println!("{}: {}", hit.title, hit.url);
//! }
//! ```

/// Web search and page fetch adapters.
pub mod search;
