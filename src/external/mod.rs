pub mod anthropic;
pub mod lemonsqueezy;
pub mod locationiq;
pub mod perplexity;
pub mod prokerala;

pub use anthropic::*;
pub use lemonsqueezy::*;
pub use locationiq::*;
pub use perplexity::*;
pub use prokerala::*;
