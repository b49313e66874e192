//! Hidden Ledger Sources
//!
//! External services the correlation pipeline reads from:
//! - **Explorer**: paginated transaction history from an Insight block explorer
//! - **Dark web**: mention discovery against the Webhose dark web index, with
//!   exclusion-based refinement in place of real pagination
//!
//! Both services sit behind traits ([`TransactionSource`], [`MentionSearch`])
//! so the pipeline can run against in-memory doubles.

pub mod traits;
pub mod explorer;
pub mod darkweb;

pub use traits::*;
pub use explorer::*;
pub use darkweb::*;
